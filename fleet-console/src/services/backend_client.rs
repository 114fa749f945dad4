use async_trait::async_trait;
use fleet_core::models::DriverList;
use fleet_core::{BackendError, DriverStat, FeedbackAck, FeedbackSubmission, SentimentBackend};
use reqwest::Client;
use serde_json::Value;

use crate::config::BackendSettings;
use crate::observability::TracedClientExt;

/// Text of an error body's `detail`: either a plain string or a list of
/// validation errors each carrying `msg`.
pub fn extract_detail(body: &Value) -> Option<String> {
    match body.get("detail")? {
        Value::String(detail) if !detail.trim().is_empty() => Some(detail.clone()),
        Value::Array(items) => {
            let messages: Vec<&str> = items
                .iter()
                .filter_map(|item| item.get("msg").and_then(Value::as_str))
                .collect();
            (!messages.is_empty()).then(|| messages.join("; "))
        }
        _ => None,
    }
}

pub struct BackendClient {
    client: Client,
    settings: BackendSettings,
}

impl BackendClient {
    pub fn new(settings: BackendSettings) -> Self {
        Self {
            client: Client::new(),
            settings,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.settings.url.trim_end_matches('/'), path)
    }
}

#[async_trait]
impl SentimentBackend for BackendClient {
    async fn list_drivers(&self) -> Result<Vec<DriverStat>, BackendError> {
        let url = self.url("/drivers");
        let response = self
            .client
            .traced_get(&url)
            .timeout(self.settings.timeout())
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Failed to send GET request to {}: {}", url, e);
                BackendError::Connectivity(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(BackendError::Connectivity(format!(
                "driver feed returned {status}"
            )));
        }

        let list: DriverList = response.json().await.map_err(|e| {
            tracing::error!(error = %e, "Unreadable driver feed");
            BackendError::Connectivity(format!("unreadable driver feed: {e}"))
        })?;
        Ok(list.into_valid())
    }

    async fn submit_feedback(
        &self,
        submission: &FeedbackSubmission,
    ) -> Result<FeedbackAck, BackendError> {
        let url = self.url("/feedback");
        let response = self
            .client
            .traced_post(&url)
            .timeout(self.settings.timeout())
            .json(submission)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Failed to send POST request to {}: {}", url, e);
                BackendError::Connectivity(e.to_string())
            })?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();

        if status.is_success() {
            return Ok(serde_json::from_str(&body).unwrap_or_else(|e| {
                tracing::warn!(error = %e, "Feedback accepted with unreadable body");
                FeedbackAck::accepted()
            }));
        }

        let detail = serde_json::from_str::<Value>(&body)
            .ok()
            .as_ref()
            .and_then(extract_detail);
        match detail {
            Some(detail) => Err(BackendError::Rejected(detail)),
            None => Err(BackendError::Connectivity(format!(
                "feedback endpoint returned {status}"
            ))),
        }
    }
}
