//! Scheduler engine — runs phase 1 on submit, wakes deferred tasks on time.

use carbonaware_core::clock::Clock;
use carbonaware_core::config::OperatorConfig;
use carbonaware_core::error::{CarbonAwareError, Result};
use carbonaware_core::traits::{SchedulerClient, ZoneDetector};
use carbonaware_core::types::{Deferral, TriggerEvent};
use carbonaware_operator::{CarbonAwareOperator, OptimalTimeResolver};
use std::sync::Arc;
use std::time::Duration;

use crate::store::TaskStore;
use crate::tasks::{Task, TaskStatus};

pub struct SchedulerEngine {
    store: TaskStore,
    scheduler: Arc<dyn SchedulerClient>,
    detector: Arc<dyn ZoneDetector>,
    clock: Arc<dyn Clock>,
    poll_interval: Duration,
}

impl SchedulerEngine {
    pub fn new(
        store: TaskStore,
        scheduler: Arc<dyn SchedulerClient>,
        detector: Arc<dyn ZoneDetector>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            scheduler,
            detector,
            clock,
            poll_interval: Duration::from_secs(30),
        }
    }

    /// Longest single sleep; bounds how late an external change to the store is noticed.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn store(&self) -> &TaskStore {
        &self.store
    }

    fn operator_for(&self, config: &OperatorConfig) -> Result<CarbonAwareOperator> {
        let resolver = OptimalTimeResolver::new(self.scheduler.clone(), self.detector.clone())
            .with_clock(self.clock.clone());
        CarbonAwareOperator::new(config.clone(), resolver)
    }

    /// Run phase 1 for a new task. Invalid configs are rejected before anything is stored.
    pub async fn submit(&mut self, config: OperatorConfig) -> Result<Task> {
        let operator = self.operator_for(&config)?;
        let mut task = Task::new(config, self.clock.now());

        match operator.execute().await {
            Ok(Deferral::Proceed) => {
                task.set_status(TaskStatus::Completed, self.clock.now())?;
            }
            Ok(Deferral::Suspend(request)) => {
                tracing::info!("⏸️ Task {} ({}) deferred until {}", task.id, operator.task_id(), request.wake_at());
                task.suspend = Some(request);
                task.set_status(TaskStatus::Deferred, self.clock.now())?;
            }
            Err(e) => {
                tracing::error!("❌ Task {} ({}) failed: {e}", task.id, operator.task_id());
                task.fail(&e, self.clock.now())?;
                self.store.upsert(task)?;
                return Err(e);
            }
        }

        self.store.upsert(task.clone())?;
        Ok(task)
    }

    /// Resume every deferred task whose wake time has passed. Returns the tasks settled.
    pub async fn run_due(&mut self) -> Result<Vec<Task>> {
        self.store.reload()?;
        let now = self.clock.now();
        let mut settled = vec![];

        for id in self.store.due(now) {
            // Claimed under the store lock; a crash after this point must never re-enter phase 2.
            let Some(mut task) = self.store.claim(&id, now)? else {
                tracing::debug!("Task {id} already claimed or cancelled elsewhere");
                continue;
            };

            let event = TriggerEvent { fired_at: self.clock.now() };
            let outcome = self
                .operator_for(&task.operator)
                .and_then(|op| op.execute_complete(task.suspend.as_ref().map(|s| &s.kwargs), Some(&event)));

            match outcome {
                Ok(()) => {
                    task.set_status(TaskStatus::Completed, self.clock.now())?;
                    tracing::info!("▶️ Task {} ({}) resumed and completed", task.id, task.operator.task_id);
                }
                Err(e) => {
                    tracing::error!("❌ Task {} ({}) failed on resume: {e}", task.id, task.operator.task_id);
                    task.fail(&e, self.clock.now())?;
                }
            }
            self.store.upsert(task.clone())?;
            settled.push(task);
        }
        Ok(settled)
    }

    /// Retract a deferred task's timer. Phase 2 will not run for it.
    pub fn cancel(&mut self, id: &str) -> Result<Task> {
        let now = self.clock.now();
        let task = self.store.update(id, |t| t.set_status(TaskStatus::Cancelled, now))?;
        tracing::info!("🚫 Task {} cancelled", task.id);
        Ok(task)
    }

    /// Remove finished tasks from the store.
    pub fn prune(&mut self) -> Result<Vec<Task>> {
        let pruned = self.store.prune()?;
        tracing::info!("🧹 Pruned {} finished task(s)", pruned.len());
        Ok(pruned)
    }

    /// How long to sleep before the next due task, capped by the poll interval.
    pub fn next_sleep(&self) -> Option<Duration> {
        let wake = self.store.next_wake()?;
        let until = (wake.to_utc() - self.clock.now()).to_std().unwrap_or(Duration::ZERO);
        Some(until.min(self.poll_interval))
    }

    /// Keep resuming until no deferred tasks remain.
    pub async fn run_until_idle(&mut self) -> Result<Vec<Task>> {
        let mut settled = self.run_due().await?;
        while let Some(sleep) = self.next_sleep() {
            tokio::time::sleep(sleep).await;
            settled.extend(self.run_due().await?);
        }
        Ok(settled)
    }

    /// Drive the engine until task `id` reaches a terminal status, including
    /// when another host is the one resuming it.
    pub async fn wait_for(&mut self, id: &str) -> Result<Task> {
        loop {
            self.run_due().await?;
            let task = self
                .store
                .get(id)
                .cloned()
                .ok_or_else(|| CarbonAwareError::TaskNotFound(id.into()))?;
            if task.status.is_terminal() {
                return Ok(task);
            }
            let sleep = match task.status {
                TaskStatus::Resuming => self.poll_interval,
                _ => self.next_sleep().unwrap_or(self.poll_interval),
            };
            tokio::time::sleep(sleep).await;
        }
    }
}
