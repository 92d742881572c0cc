//! Scheduler request/response wire types.

use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};

use super::zone::Zone;
use crate::error::{CarbonAwareError, Result};

/// ISO-8601 duration for a whole number of minutes: 30 → `PT30M`.
pub fn iso8601_minutes(minutes: u32) -> String {
    format!("PT{minutes}M")
}

/// A candidate execution window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

/// Body of a `schedule.create` call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleRequest {
    pub duration: String,
    pub windows: Vec<TimeWindow>,
    pub zones: Vec<Zone>,
}

impl ScheduleRequest {
    /// One window from `now` to `now + window_minutes`.
    pub fn single_window(
        duration_minutes: u32,
        window_minutes: u32,
        now: DateTime<Utc>,
        zones: Vec<Zone>,
    ) -> Result<Self> {
        if duration_minutes == 0 {
            return Err(CarbonAwareError::config("task duration must be positive"));
        }
        if window_minutes == 0 {
            return Err(CarbonAwareError::config("execution window must be positive"));
        }
        let end = now + chrono::Duration::minutes(i64::from(window_minutes));
        Ok(Self {
            duration: iso8601_minutes(duration_minutes),
            windows: vec![TimeWindow { start: now, end }],
            zones,
        })
    }
}

/// One scheduling option returned by the service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleOption {
    #[serde(default)]
    pub time: Option<DateTime<FixedOffset>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zone: Option<Zone>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub co2_intensity: Option<f64>,
}

impl ScheduleOption {
    pub fn at(time: DateTime<FixedOffset>) -> Self {
        Self { time: Some(time), zone: None, co2_intensity: None }
    }
}

/// Response of a `schedule.create` call. Only `ideal.time` is consumed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleResponse {
    #[serde(default)]
    pub ideal: Option<ScheduleOption>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<ScheduleOption>,
}

impl ScheduleResponse {
    pub fn with_ideal(time: DateTime<FixedOffset>) -> Self {
        Self { ideal: Some(ScheduleOption::at(time)), options: vec![] }
    }

    /// Recommended start time, offset exactly as the service returned it.
    pub fn ideal_time(&self) -> Result<DateTime<FixedOffset>> {
        let ideal = self
            .ideal
            .as_ref()
            .ok_or_else(|| CarbonAwareError::scheduling("response has no ideal option"))?;
        ideal
            .time
            .ok_or_else(|| CarbonAwareError::scheduling("ideal option has no time"))
    }
}
