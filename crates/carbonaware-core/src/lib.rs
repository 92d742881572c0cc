//! # CarbonAware Core
//!
//! Shared vocabulary for carbon-aware task deferral.
//!
//! ## Architecture
//! ```text
//! CarbonAwareOperator (phase 1)
//!   ├── ZoneDetector        → candidate zones (when none configured)
//!   ├── SchedulerClient     → ScheduleRequest → ScheduleResponse.ideal.time
//!   └── Clock               → "now"
//!        │
//!        ├── optimal <= now → Deferral::Proceed
//!        └── optimal >  now → Deferral::Suspend(SuspendRequest)
//!                                 └── host timer fires → execute_complete (phase 2)
//! ```

pub mod clock;
pub mod config;
pub mod error;
pub mod provider;
pub mod traits;
pub mod types;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{CarbonAwareConfig, HostConfig, OperatorConfig, SchedulerConfig};
pub use error::{CarbonAwareError, Result};
pub use provider::{ProviderInfo, provider_info};
pub use traits::{NoZoneDetector, SchedulerClient, ZoneDetector};
pub use types::*;
