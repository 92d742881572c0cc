//! Scheduler trait — the carbon-intensity scheduling service.

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{ScheduleRequest, ScheduleResponse};

/// The external `schedule.create` call.
#[async_trait]
pub trait SchedulerClient: Send + Sync {
    /// Client name for logs.
    fn name(&self) -> &str;

    /// Submit a request and return the service's recommendation.
    /// One call per invocation: implementations must not retry.
    async fn create_schedule(&self, request: &ScheduleRequest) -> Result<ScheduleResponse>;
}
