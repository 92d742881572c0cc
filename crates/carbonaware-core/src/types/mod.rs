//! Shared data model.

pub mod deferral;
pub mod schedule;
pub mod zone;

pub use deferral::{
    Deferral, DeferralPhase, DeferralState, RESUME_METHOD, SuspendRequest, Trigger, TriggerEvent,
};
pub use schedule::{ScheduleOption, ScheduleRequest, ScheduleResponse, TimeWindow, iso8601_minutes};
pub use zone::{Zone, ZoneSpec};
