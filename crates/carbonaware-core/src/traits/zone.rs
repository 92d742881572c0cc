//! Zone auto-detection trait.

use async_trait::async_trait;

use crate::error::Result;
use crate::types::Zone;

/// Best-guess cloud zone(s) for the environment the task runs in.
#[async_trait]
pub trait ZoneDetector: Send + Sync {
    /// An empty list is a valid answer: it means "no geographic constraint".
    async fn detect(&self) -> Result<Vec<Zone>>;
}

/// A detector that never finds anything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoZoneDetector;

#[async_trait]
impl ZoneDetector for NoZoneDetector {
    async fn detect(&self) -> Result<Vec<Zone>> {
        Ok(vec![])
    }
}
