//! Capability traits for the collaborators the operator talks to.

pub mod scheduler;
pub mod zone;

pub use scheduler::SchedulerClient;
pub use zone::{NoZoneDetector, ZoneDetector};
