//! Unified error types for CarbonAware.

use thiserror::Error;

/// Result type alias using CarbonAwareError.
pub type Result<T> = std::result::Result<T, CarbonAwareError>;

#[derive(Error, Debug)]
pub enum CarbonAwareError {
    // Operator construction errors
    #[error("Configuration error: {0}")]
    Config(String),

    // Scheduling service errors
    #[error("Scheduling service error: {0}")]
    SchedulingService(String),

    #[error("HTTP error: {0}")]
    Http(String),

    // Resume protocol errors
    #[error("Suspend protocol violation: {0}")]
    SuspendProtocol(String),

    // Host errors
    #[error("Task store error: {0}")]
    Store(String),

    #[error("Task not found: {0}")]
    TaskNotFound(String),

    #[error("Invalid state transition: {0}")]
    InvalidTransition(String),

    // General errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
}

impl CarbonAwareError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn scheduling(msg: impl Into<String>) -> Self {
        Self::SchedulingService(msg.into())
    }

    pub fn suspend_protocol(msg: impl Into<String>) -> Self {
        Self::SuspendProtocol(msg.into())
    }

    pub fn store(msg: impl Into<String>) -> Self {
        Self::Store(msg.into())
    }

    /// Failure reaching or interpreting the external scheduler.
    pub fn is_scheduling_failure(&self) -> bool {
        matches!(self, Self::SchedulingService(_) | Self::Http(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = CarbonAwareError::SchedulingService("missing ideal".into());
        assert!(err.to_string().contains("missing ideal"));
    }

    #[test]
    fn test_error_constructors() {
        let e1 = CarbonAwareError::config("test");
        assert!(matches!(e1, CarbonAwareError::Config(_)));

        let e2 = CarbonAwareError::scheduling("test");
        assert!(matches!(e2, CarbonAwareError::SchedulingService(_)));

        let e3 = CarbonAwareError::suspend_protocol("test");
        assert!(matches!(e3, CarbonAwareError::SuspendProtocol(_)));

        let e4 = CarbonAwareError::store("test");
        assert!(matches!(e4, CarbonAwareError::Store(_)));
    }

    #[test]
    fn test_scheduling_failure_grouping() {
        assert!(CarbonAwareError::Http("refused".into()).is_scheduling_failure());
        assert!(CarbonAwareError::scheduling("500").is_scheduling_failure());
        assert!(!CarbonAwareError::config("bad").is_scheduling_failure());
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: CarbonAwareError = io_err.into();
        assert!(matches!(err, CarbonAwareError::Io(_)));
    }
}
