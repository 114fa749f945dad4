use async_trait::async_trait;
use fleet_core::{ProfileRecord, ProfileStore, ProviderError};
use reqwest::Client;
use secrecy::ExposeSecret;
use std::sync::Arc;

use crate::config::IdentitySettings;
use crate::observability::TracedClientExt;
use crate::services::gotrue_client::GoTrueClient;

/// Reads the `role` column of the profiles table over PostgREST.
pub struct ProfileClient {
    client: Client,
    settings: IdentitySettings,
    tokens: Arc<GoTrueClient>,
}

impl ProfileClient {
    pub fn new(settings: IdentitySettings, tokens: Arc<GoTrueClient>) -> Self {
        Self {
            client: Client::new(),
            settings,
            tokens,
        }
    }
}

#[async_trait]
impl ProfileStore for ProfileClient {
    async fn get_role(&self, user_id: &str) -> Result<ProfileRecord, ProviderError> {
        let url = format!(
            "{}/rest/v1/{}",
            self.settings.url.trim_end_matches('/'),
            self.settings.profile_table
        );
        let api_key = self.settings.api_key.expose_secret();
        // Row-level security scopes the row to the signed-in user.
        let bearer = self.tokens.access_token().unwrap_or_else(|| api_key.clone());
        let id_filter = format!("eq.{user_id}");

        let response = self
            .client
            .traced_get(&url)
            .query(&[("id", id_filter.as_str()), ("select", "role")])
            .header("apikey", api_key)
            .bearer_auth(bearer)
            .timeout(self.settings.timeout())
            .send()
            .await
            .map_err(|e| ProviderError::Connection(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ProviderError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        let rows: Vec<ProfileRecord> = response
            .json()
            .await
            .map_err(|e| ProviderError::Malformed(e.to_string()))?;
        rows.into_iter().next().ok_or(ProviderError::NotFound)
    }
}
