//! Zone descriptors — opaque provider/region mappings passed through to the scheduler.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// An opaque zone descriptor such as `{"provider": "aws", "region": "us-east-1"}`.
///
/// The operator never looks inside; it is forwarded to the scheduler verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Zone(Map<String, Value>);

impl Zone {
    pub fn new(provider: impl Into<String>, region: impl Into<String>) -> Self {
        let mut fields = Map::new();
        fields.insert("provider".into(), Value::String(provider.into()));
        fields.insert("region".into(), Value::String(region.into()));
        Self(fields)
    }
}

impl std::fmt::Display for Zone {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", Value::Object(self.0.clone()))
    }
}

/// Zone selection as configured on an operator: one descriptor or several.
///
/// Absence (`Option::None` on the operator) means "auto-detect".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ZoneSpec {
    One(Zone),
    Many(Vec<Zone>),
}

impl ZoneSpec {
    /// Zones to submit, in order.
    pub fn to_zones(&self) -> Vec<Zone> {
        match self {
            ZoneSpec::One(zone) => vec![zone.clone()],
            ZoneSpec::Many(zones) => zones.clone(),
        }
    }
}

impl From<Zone> for ZoneSpec {
    fn from(zone: Zone) -> Self {
        ZoneSpec::One(zone)
    }
}

impl From<Vec<Zone>> for ZoneSpec {
    fn from(zones: Vec<Zone>) -> Self {
        ZoneSpec::Many(zones)
    }
}
