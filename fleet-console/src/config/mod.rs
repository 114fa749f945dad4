use fleet_core::models::account::DEFAULT_MIN_PASSWORD_LENGTH;
use fleet_core::ScoringConfig;
use secrecy::Secret;
use serde::Deserialize;
use std::time::Duration;

#[derive(Deserialize, Clone)]
pub struct Settings {
    pub server: ServerSettings,
    pub identity: IdentitySettings,
    pub backend: BackendSettings,
    #[serde(default)]
    pub scoring: ScoringConfig,
    #[serde(default)]
    pub notices: NoticeSettings,
    #[serde(default)]
    pub observability: ObservabilitySettings,
}

#[derive(Deserialize, Clone)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

#[derive(Deserialize, Clone)]
pub struct IdentitySettings {
    /// Base URL of the identity project (GoTrue under `/auth/v1`, PostgREST
    /// under `/rest/v1`).
    pub url: String,
    /// Public project key, sent as the `apikey` header.
    pub api_key: Secret<String>,
    #[serde(default = "default_min_password_length")]
    pub min_password_length: usize,
    #[serde(default = "default_profile_table")]
    pub profile_table: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl IdentitySettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn default_min_password_length() -> usize {
    DEFAULT_MIN_PASSWORD_LENGTH
}

fn default_profile_table() -> String {
    "profiles".to_string()
}

#[derive(Deserialize, Clone)]
pub struct BackendSettings {
    pub url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    10
}

impl BackendSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Deserialize, Clone)]
pub struct NoticeSettings {
    pub ttl_ms: u64,
}

impl Default for NoticeSettings {
    fn default() -> Self {
        Self { ttl_ms: 4_000 }
    }
}

impl NoticeSettings {
    pub fn ttl(&self) -> Duration {
        Duration::from_millis(self.ttl_ms)
    }
}

#[derive(Deserialize, Clone)]
pub struct ObservabilitySettings {
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// OTLP collector (e.g. `http://tempo:4317`). Spans are only exported
    /// when this is set.
    #[serde(default)]
    pub otlp_endpoint: Option<String>,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ObservabilitySettings {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            otlp_endpoint: None,
        }
    }
}

pub fn get_configuration() -> Result<Settings, config::ConfigError> {
    let base_path =
        std::env::current_dir().map_err(|e| config::ConfigError::Foreign(Box::new(e)))?;

    // Running from the workspace root or from inside fleet-console
    let configuration_directory = if base_path.ends_with("fleet-console") {
        base_path.join("config")
    } else {
        base_path.join("fleet-console").join("config")
    };

    let settings = config::Config::builder()
        .add_source(config::File::from(configuration_directory.join("base.yaml")).required(true))
        .add_source(
            config::Environment::with_prefix("APP")
                .prefix_separator("_")
                .separator("__"),
        )
        .build()?;

    settings.try_deserialize::<Settings>()
}
