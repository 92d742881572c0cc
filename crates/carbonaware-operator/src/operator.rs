//! The carbon-aware operator — decide once in `execute`, land once in `execute_complete`.

use carbonaware_core::config::OperatorConfig;
use carbonaware_core::error::{CarbonAwareError, Result};
use carbonaware_core::types::{Deferral, DeferralState, SuspendRequest, TriggerEvent};

use crate::resolver::OptimalTimeResolver;

pub struct CarbonAwareOperator {
    config: OperatorConfig,
    resolver: OptimalTimeResolver,
}

impl CarbonAwareOperator {
    /// Rejects non-positive durations/windows and windows shorter than the task.
    pub fn new(config: OperatorConfig, resolver: OptimalTimeResolver) -> Result<Self> {
        config.validate()?;
        Ok(Self { config, resolver })
    }

    pub fn config(&self) -> &OperatorConfig {
        &self.config
    }

    pub fn task_id(&self) -> &str {
        &self.config.task_id
    }

    /// Phase 1: query the scheduler and either proceed or suspend until the optimal time.
    pub async fn execute(&self) -> Result<Deferral> {
        let optimal_time = self
            .resolver
            .find_optimal_time(
                self.config.task_duration_minutes,
                self.config.execution_window_minutes,
                self.config.zone.as_ref(),
            )
            .await?;

        let now = self.resolver.now();
        if optimal_time <= now {
            tracing::info!("[{}] Optimal time {optimal_time} has arrived, proceeding now", self.task_id());
            return Ok(Deferral::Proceed);
        }

        tracing::info!(
            "[{}] Deferring until {optimal_time} ({} min from now)",
            self.task_id(),
            (optimal_time.to_utc() - now).num_minutes()
        );
        Ok(Deferral::Suspend(SuspendRequest::until(optimal_time)))
    }

    /// Phase 2: the resume target. Never re-queries the scheduler.
    pub fn execute_complete(
        &self,
        state: Option<&DeferralState>,
        event: Option<&TriggerEvent>,
    ) -> Result<()> {
        let state = state.ok_or_else(|| {
            CarbonAwareError::suspend_protocol(format!("[{}] resumed without deferral state", self.task_id()))
        })?;
        let optimal_time = state.optimal_time()?;

        match event {
            Some(ev) => tracing::info!(
                "[{}] Resumed at {} for optimal time {optimal_time}, proceeding",
                self.task_id(),
                ev.fired_at
            ),
            None => tracing::info!("[{}] Resumed for optimal time {optimal_time}, proceeding", self.task_id()),
        }
        Ok(())
    }
}
