//! Recording doubles for the scheduler and zone detector.

use async_trait::async_trait;
use carbonaware_core::error::{CarbonAwareError, Result};
use carbonaware_core::traits::{SchedulerClient, ZoneDetector};
use carbonaware_core::types::{ScheduleRequest, ScheduleResponse, Zone};
use chrono::{DateTime, FixedOffset};
use std::sync::Mutex;

enum Reply {
    Ideal(DateTime<FixedOffset>),
    NoIdeal,
    Fail(String),
}

pub struct MockScheduler {
    reply: Reply,
    requests: Mutex<Vec<ScheduleRequest>>,
}

impl MockScheduler {
    pub fn returning(time: DateTime<FixedOffset>) -> Self {
        Self::with_reply(Reply::Ideal(time))
    }

    pub fn without_ideal() -> Self {
        Self::with_reply(Reply::NoIdeal)
    }

    pub fn failing(msg: &str) -> Self {
        Self::with_reply(Reply::Fail(msg.into()))
    }

    fn with_reply(reply: Reply) -> Self {
        Self { reply, requests: Mutex::new(vec![]) }
    }

    pub fn requests(&self) -> Vec<ScheduleRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl SchedulerClient for MockScheduler {
    fn name(&self) -> &str { "mock" }

    async fn create_schedule(&self, request: &ScheduleRequest) -> Result<ScheduleResponse> {
        self.requests.lock().unwrap().push(request.clone());
        match &self.reply {
            Reply::Ideal(time) => Ok(ScheduleResponse::with_ideal(*time)),
            Reply::NoIdeal => Ok(ScheduleResponse { ideal: None, options: vec![] }),
            Reply::Fail(msg) => Err(CarbonAwareError::scheduling(msg.clone())),
        }
    }
}

pub struct MockDetector {
    zones: Vec<Zone>,
    calls: Mutex<usize>,
}

impl MockDetector {
    pub fn returning(zones: Vec<Zone>) -> Self {
        Self { zones, calls: Mutex::new(0) }
    }

    pub fn calls(&self) -> usize {
        *self.calls.lock().unwrap()
    }
}

#[async_trait]
impl ZoneDetector for MockDetector {
    async fn detect(&self) -> Result<Vec<Zone>> {
        *self.calls.lock().unwrap() += 1;
        Ok(self.zones.clone())
    }
}
