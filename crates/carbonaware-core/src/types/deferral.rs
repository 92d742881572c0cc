//! The deferral signal emitted by phase 1 and the state carried across suspension.

use chrono::{DateTime, FixedOffset, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{CarbonAwareError, Result};

/// Entry point the host re-invokes once the wake condition fires.
pub const RESUME_METHOD: &str = "execute_complete";

/// Wake condition attached to a suspend request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum Trigger {
    /// One-shot timer keyed to an absolute timestamp.
    #[serde(rename = "DateTimeTrigger")]
    DateTime { moment: DateTime<FixedOffset> },
}

impl Trigger {
    pub fn name(&self) -> &'static str {
        match self {
            Trigger::DateTime { .. } => "DateTimeTrigger",
        }
    }

    pub fn wake_at(&self) -> DateTime<FixedOffset> {
        match self {
            Trigger::DateTime { moment } => *moment,
        }
    }

    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.wake_at() <= now
    }
}

/// What the timer hands back to the resume entry point when it fires.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriggerEvent {
    pub fired_at: DateTime<Utc>,
}

/// Everything phase 2 needs, in a form that survives the host's persistence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeferralState {
    pub optimal_time: String,
}

impl DeferralState {
    pub fn new(optimal_time: &DateTime<FixedOffset>) -> Self {
        Self {
            optimal_time: optimal_time.to_rfc3339_opts(SecondsFormat::AutoSi, false),
        }
    }

    /// Recover a state from an untyped payload as persisted by a host.
    pub fn from_value(payload: serde_json::Value) -> Result<Self> {
        serde_json::from_value(payload)
            .map_err(|e| CarbonAwareError::suspend_protocol(format!("invalid resume payload: {e}")))
    }

    pub fn optimal_time(&self) -> Result<DateTime<FixedOffset>> {
        if self.optimal_time.is_empty() {
            return Err(CarbonAwareError::suspend_protocol("optimal_time is missing"));
        }
        DateTime::parse_from_rfc3339(&self.optimal_time).map_err(|e| {
            CarbonAwareError::suspend_protocol(format!(
                "optimal_time '{}' is not an ISO-8601 timestamp: {e}",
                self.optimal_time
            ))
        })
    }
}

/// A request to suspend the task until `trigger` fires, then call `method_name`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuspendRequest {
    pub trigger: Trigger,
    pub method_name: String,
    pub kwargs: DeferralState,
}

impl SuspendRequest {
    pub fn until(optimal_time: DateTime<FixedOffset>) -> Self {
        Self {
            trigger: Trigger::DateTime { moment: optimal_time },
            method_name: RESUME_METHOD.into(),
            kwargs: DeferralState::new(&optimal_time),
        }
    }

    pub fn wake_at(&self) -> DateTime<FixedOffset> {
        self.trigger.wake_at()
    }
}

/// Outcome of phase 1.
#[must_use]
#[derive(Debug, Clone, PartialEq)]
pub enum Deferral {
    /// Best time is now (or already passed): downstream work may run.
    Proceed,
    /// Release the slot and resume later.
    Suspend(SuspendRequest),
}

impl Deferral {
    pub fn is_proceed(&self) -> bool {
        matches!(self, Deferral::Proceed)
    }

    pub fn suspend_request(&self) -> Option<&SuspendRequest> {
        match self {
            Deferral::Suspend(req) => Some(req),
            Deferral::Proceed => None,
        }
    }
}

/// Lifecycle of a single deferred task attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeferralPhase {
    Initial,
    Suspended,
    ResumedRunning,
    Done,
}

impl DeferralPhase {
    pub fn can_transition_to(self, next: DeferralPhase) -> bool {
        use DeferralPhase::*;
        matches!(
            (self, next),
            (Initial, Done) | (Initial, Suspended) | (Suspended, ResumedRunning) | (ResumedRunning, Done)
        )
    }
}

impl std::fmt::Display for DeferralPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeferralPhase::Initial => write!(f, "initial"),
            DeferralPhase::Suspended => write!(f, "suspended"),
            DeferralPhase::ResumedRunning => write!(f, "resumed_running"),
            DeferralPhase::Done => write!(f, "done"),
        }
    }
}
