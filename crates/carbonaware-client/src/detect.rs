//! Zone detection from the cloud environment the process runs in.

use async_trait::async_trait;
use carbonaware_core::error::Result;
use carbonaware_core::traits::ZoneDetector;
use carbonaware_core::types::Zone;

/// Provider name and the variables that carry its region, in priority order.
const PROVIDER_VARS: &[(&str, &[&str])] = &[
    ("aws", &["AWS_REGION", "AWS_DEFAULT_REGION"]),
    ("gcp", &["GOOGLE_CLOUD_REGION", "CLOUDSDK_COMPUTE_REGION", "FUNCTION_REGION"]),
    ("azure", &["AZURE_REGION", "REGION_NAME"]),
];

type Lookup = Box<dyn Fn(&str) -> Option<String> + Send + Sync>;

/// Looks for well-known region variables and reports one zone per provider found.
pub struct EnvZoneDetector {
    lookup: Lookup,
}

impl EnvZoneDetector {
    pub fn new() -> Self {
        Self::with_lookup(|key| std::env::var(key).ok())
    }

    pub fn with_lookup(lookup: impl Fn(&str) -> Option<String> + Send + Sync + 'static) -> Self {
        Self { lookup: Box::new(lookup) }
    }

    fn scan(&self) -> Vec<Zone> {
        PROVIDER_VARS
            .iter()
            .filter_map(|(provider, vars)| {
                vars.iter()
                    .filter_map(|var| (self.lookup)(*var))
                    .map(|region| region.trim().to_string())
                    .find(|region| !region.is_empty())
                    .map(|region| Zone::new(*provider, region))
            })
            .collect()
    }
}

impl Default for EnvZoneDetector {
    fn default() -> Self { Self::new() }
}

#[async_trait]
impl ZoneDetector for EnvZoneDetector {
    async fn detect(&self) -> Result<Vec<Zone>> {
        let zones = self.scan();
        if zones.is_empty() {
            tracing::debug!("No cloud zone detected from environment");
        } else {
            tracing::debug!("Detected {} cloud zone(s) from environment", zones.len());
        }
        Ok(zones)
    }
}
