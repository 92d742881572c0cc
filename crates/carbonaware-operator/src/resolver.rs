//! Optimal-time resolution — one query to the scheduler per call.

use carbonaware_core::clock::{Clock, SystemClock};
use carbonaware_core::error::Result;
use carbonaware_core::traits::{SchedulerClient, ZoneDetector};
use carbonaware_core::types::{ScheduleRequest, Zone, ZoneSpec};
use chrono::{DateTime, FixedOffset, Utc};
use std::sync::Arc;

pub struct OptimalTimeResolver {
    scheduler: Arc<dyn SchedulerClient>,
    detector: Arc<dyn ZoneDetector>,
    clock: Arc<dyn Clock>,
}

impl OptimalTimeResolver {
    pub fn new(scheduler: Arc<dyn SchedulerClient>, detector: Arc<dyn ZoneDetector>) -> Self {
        Self {
            scheduler,
            detector,
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Explicit zones verbatim; otherwise whatever the detector reports.
    pub async fn resolve_zones(&self, zone: Option<&ZoneSpec>) -> Result<Vec<Zone>> {
        match zone {
            Some(spec) => Ok(spec.to_zones()),
            None => {
                let detected = self.detector.detect().await?;
                if detected.is_empty() {
                    tracing::info!("No zone configured or detected, scheduling without geographic constraint");
                }
                Ok(detected)
            }
        }
    }

    pub async fn build_request(
        &self,
        duration_minutes: u32,
        window_minutes: u32,
        zone: Option<&ZoneSpec>,
    ) -> Result<ScheduleRequest> {
        let zones = self.resolve_zones(zone).await?;
        ScheduleRequest::single_window(duration_minutes, window_minutes, self.clock.now(), zones)
    }

    /// Recommended start time, returned with whatever offset the scheduler used.
    pub async fn find_optimal_time(
        &self,
        duration_minutes: u32,
        window_minutes: u32,
        zone: Option<&ZoneSpec>,
    ) -> Result<DateTime<FixedOffset>> {
        let request = self.build_request(duration_minutes, window_minutes, zone).await?;
        let window = &request.windows[0];
        tracing::debug!(
            "Querying {} for {} in [{}, {}] across {} zone(s)",
            self.scheduler.name(),
            request.duration,
            window.start,
            window.end,
            request.zones.len()
        );

        let response = self.scheduler.create_schedule(&request).await?;
        response.ideal_time()
    }
}
