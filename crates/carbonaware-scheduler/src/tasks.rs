//! Task records as the host persists them.

use carbonaware_core::config::OperatorConfig;
use carbonaware_core::error::{CarbonAwareError, Result};
use carbonaware_core::types::{DeferralPhase, SuspendRequest};
use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    Deferred,
    Resuming,
    Completed,
    Failed,
    Cancelled,
}

impl TaskStatus {
    /// Position in the deferral lifecycle; `None` for failed/cancelled.
    pub fn phase(self) -> Option<DeferralPhase> {
        match self {
            TaskStatus::Pending => Some(DeferralPhase::Initial),
            TaskStatus::Deferred => Some(DeferralPhase::Suspended),
            TaskStatus::Resuming => Some(DeferralPhase::ResumedRunning),
            TaskStatus::Completed => Some(DeferralPhase::Done),
            TaskStatus::Failed | TaskStatus::Cancelled => None,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, TaskStatus::Completed | TaskStatus::Failed | TaskStatus::Cancelled)
    }

    pub fn can_transition_to(self, next: TaskStatus) -> bool {
        match (self, next) {
            (TaskStatus::Pending | TaskStatus::Resuming, TaskStatus::Failed) => true,
            (TaskStatus::Deferred, TaskStatus::Cancelled) => true,
            _ => match (self.phase(), next.phase()) {
                (Some(from), Some(to)) => from.can_transition_to(to),
                _ => false,
            },
        }
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TaskStatus::Pending => write!(f, "pending"),
            TaskStatus::Deferred => write!(f, "deferred"),
            TaskStatus::Resuming => write!(f, "resuming"),
            TaskStatus::Completed => write!(f, "completed"),
            TaskStatus::Failed => write!(f, "failed"),
            TaskStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// One task attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub operator: OperatorConfig,
    pub status: TaskStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suspend: Option<SuspendRequest>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}

impl Task {
    pub fn new(operator: OperatorConfig, now: DateTime<Utc>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            operator,
            status: TaskStatus::Pending,
            suspend: None,
            created_at: now,
            updated_at: now,
            last_error: None,
        }
    }

    pub fn set_status(&mut self, next: TaskStatus, now: DateTime<Utc>) -> Result<()> {
        if !self.status.can_transition_to(next) {
            return Err(CarbonAwareError::InvalidTransition(format!(
                "task {}: {} -> {}",
                self.id, self.status, next
            )));
        }
        self.status = next;
        self.updated_at = now;
        Ok(())
    }

    pub fn fail(&mut self, error: &CarbonAwareError, now: DateTime<Utc>) -> Result<()> {
        self.set_status(TaskStatus::Failed, now)?;
        self.last_error = Some(error.to_string());
        Ok(())
    }

    pub fn wake_at(&self) -> Option<DateTime<FixedOffset>> {
        self.suspend.as_ref().map(SuspendRequest::wake_at)
    }

    /// Deferred and its wake condition has passed.
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.status == TaskStatus::Deferred
            && self.suspend.as_ref().is_some_and(|s| s.trigger.is_due(now))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn task() -> Task {
        Task::new(OperatorConfig::new("t", 60, 30, None).unwrap(), Utc::now())
    }

    #[test]
    fn test_new_task_is_pending() {
        let t = task();
        assert_eq!(t.status, TaskStatus::Pending);
        assert!(t.suspend.is_none());
        assert!(!t.id.is_empty());
    }

    #[test]
    fn test_allowed_transitions() {
        use TaskStatus::*;
        assert!(Pending.can_transition_to(Completed));
        assert!(Pending.can_transition_to(Deferred));
        assert!(Pending.can_transition_to(Failed));
        assert!(Deferred.can_transition_to(Resuming));
        assert!(Deferred.can_transition_to(Cancelled));
        assert!(Resuming.can_transition_to(Completed));
        assert!(Resuming.can_transition_to(Failed));
    }

    #[test]
    fn test_rejected_transitions() {
        use TaskStatus::*;
        assert!(!Deferred.can_transition_to(Completed));
        assert!(!Resuming.can_transition_to(Resuming));
        assert!(!Completed.can_transition_to(Resuming));
        assert!(!Cancelled.can_transition_to(Resuming));
        assert!(!Pending.can_transition_to(Cancelled));

        let mut t = task();
        t.set_status(Completed, Utc::now()).unwrap();
        assert!(matches!(
            t.set_status(Resuming, Utc::now()),
            Err(CarbonAwareError::InvalidTransition(_))
        ));
    }

    #[test]
    fn test_due_only_when_deferred_and_elapsed() {
        let now = Utc::now();
        let mut t = task();
        t.suspend = Some(SuspendRequest::until((now + Duration::minutes(10)).fixed_offset()));
        assert!(!t.is_due(now + Duration::minutes(20)));

        t.set_status(TaskStatus::Deferred, now).unwrap();
        assert!(!t.is_due(now));
        assert!(t.is_due(now + Duration::minutes(10)));

        t.set_status(TaskStatus::Cancelled, now).unwrap();
        assert!(!t.is_due(now + Duration::minutes(20)));
    }

    #[test]
    fn test_terminal_states() {
        assert!(TaskStatus::Completed.is_terminal());
        assert!(TaskStatus::Failed.is_terminal());
        assert!(TaskStatus::Cancelled.is_terminal());
        assert!(!TaskStatus::Deferred.is_terminal());
        assert!(!TaskStatus::Resuming.is_terminal());
    }
}
