//! HTTP scheduler client — the carbon-aware scheduling API.

use async_trait::async_trait;
use carbonaware_core::config::SchedulerConfig;
use carbonaware_core::error::{CarbonAwareError, Result};
use carbonaware_core::traits::SchedulerClient;
use carbonaware_core::types::{ScheduleRequest, ScheduleResponse};
use std::time::Duration;

const SCHEDULE_PATH: &str = "/v0/schedule/";

pub struct HttpSchedulerClient {
    base_url: String,
    api_key: Option<String>,
    client: reqwest::Client,
}

impl HttpSchedulerClient {
    pub fn new(config: &SchedulerConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| CarbonAwareError::Http(format!("client build failed: {e}")))?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.resolved_api_key(),
            client,
        })
    }

    pub fn endpoint(&self) -> String {
        format!("{}{}", self.base_url, SCHEDULE_PATH)
    }
}

#[async_trait]
impl SchedulerClient for HttpSchedulerClient {
    fn name(&self) -> &str { "carbonaware-http" }

    async fn create_schedule(&self, request: &ScheduleRequest) -> Result<ScheduleResponse> {
        let url = self.endpoint();
        tracing::debug!(
            "POST {url} duration={} windows={} zones={}",
            request.duration,
            request.windows.len(),
            request.zones.len()
        );

        let mut builder = self.client
            .post(&url)
            .header("Content-Type", "application/json")
            .json(request);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }

        let resp = builder
            .send()
            .await
            .map_err(|e| CarbonAwareError::Http(format!("scheduler unreachable ({}): {e}", self.base_url)))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            return Err(CarbonAwareError::scheduling(format!("scheduler API error {status}: {text}")));
        }

        let body = resp.text().await
            .map_err(|e| CarbonAwareError::Http(e.to_string()))?;
        serde_json::from_str(&body)
            .map_err(|e| CarbonAwareError::scheduling(format!("malformed schedule response: {e}")))
    }
}
