//! # CarbonAware Client
//! Concrete collaborators for the operator.
//!
//! | Type | Implements | Backed by |
//! |------|------------|-----------|
//! | `HttpSchedulerClient` | `SchedulerClient` | `POST {base_url}/v0/schedule/` |
//! | `EnvZoneDetector` | `ZoneDetector` | cloud environment variables |

pub mod detect;
pub mod http;

pub use detect::EnvZoneDetector;
pub use http::HttpSchedulerClient;
