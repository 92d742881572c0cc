//! # CarbonAware Scheduler
//!
//! Minimal host for carbon-aware tasks: parks suspended tasks on disk and
//! re-enters them when their wake time arrives.
//!
//! ## Design Principles
//! - No external dependencies (no Redis, no database)
//! - File-based persistence (JSON) — human-readable state
//! - Tokio timers only — zero overhead when idle
//! - A task's resume entry point runs at most once
//!
//! ## Architecture
//! ```text
//! SchedulerEngine
//!   ├── submit(OperatorConfig) → execute()
//!   │     ├── Proceed  → Completed
//!   │     └── Suspend  → Deferred (TaskStore, tasks.json)
//!   └── run_due() / run_until_idle()
//!         └── wake_at <= now → Resuming (persisted) → execute_complete() → Completed
//! ```

pub mod engine;
pub mod exec;
pub mod store;
pub mod tasks;

pub use engine::SchedulerEngine;
pub use exec::{CommandOutput, run_downstream};
pub use store::TaskStore;
pub use tasks::{Task, TaskStatus};
