//! # CarbonAware Operator
//!
//! Phase 1 (`execute`) asks the scheduler for the greenest start time inside
//! the task's window and either proceeds or returns a suspend request.
//! Phase 2 (`execute_complete`) is the re-entry point the host calls once the
//! wake time has passed.

pub mod operator;
pub mod resolver;

#[cfg(test)]
mod mock;

pub use operator::CarbonAwareOperator;
pub use resolver::OptimalTimeResolver;
