//! Provider metadata advertised to workflow hosts.

use serde::Serialize;

/// Standalone Rust package, not an Airflow distribution, so no `airflow-` prefix.
pub const PACKAGE_NAME: &str = "carbonaware-provider";
pub const CONNECTION_TYPE: &str = "carbon-aware";

/// Connection type a host can register for the scheduler API.
#[derive(Debug, Clone, Serialize)]
pub struct ConnectionType {
    pub connection_type: String,
    pub client: String,
}

/// Package-level metadata: what this provider is and how hosts connect it.
#[derive(Debug, Clone, Serialize)]
pub struct ProviderInfo {
    pub package_name: String,
    pub name: String,
    pub description: String,
    pub connection_types: Vec<ConnectionType>,
    pub versions: Vec<String>,
}

pub fn provider_info() -> ProviderInfo {
    ProviderInfo {
        package_name: PACKAGE_NAME.into(),
        name: "CarbonAware".into(),
        description: "Carbon-aware deferral of workflow tasks. Standalone host-agnostic package; \
                      no web-UI extra links are advertised."
            .into(),
        connection_types: vec![ConnectionType {
            connection_type: CONNECTION_TYPE.into(),
            client: "carbonaware_client::HttpSchedulerClient".into(),
        }],
        versions: vec![env!("CARGO_PKG_VERSION").into()],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_info_fields() {
        let info = provider_info();
        assert_eq!(info.package_name, PACKAGE_NAME);
        assert_eq!(info.connection_types[0].connection_type, "carbon-aware");
        assert_eq!(info.versions, vec![env!("CARGO_PKG_VERSION").to_string()]);
        assert!(info.description.contains("no web-UI extra links"));
    }
}
