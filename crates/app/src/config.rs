use std::fmt;

use orrery_core::CoreError;

/// Sync endpoint credentials loaded once at startup.
///
/// | Env Var               | Description                         |
/// |-----------------------|-------------------------------------|
/// | `ORRERY_ENDPOINT_URL` | Sync endpoint host, without scheme  |
/// | `ORRERY_APP_ID`       | Application id                      |
/// | `ORRERY_AUTH_TOKEN`   | Playground authentication token     |
///
/// All three are required; there are no defaults.
#[derive(Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub endpoint_url: String,
    pub app_id: String,
    pub auth_token: String,
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, CoreError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through `lookup`. Blank values count as missing.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, CoreError> {
        let required = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .ok_or_else(|| CoreError::ConfigurationMissing(format!("{key} must be set")))
        };

        Ok(Self {
            endpoint_url: required("ORRERY_ENDPOINT_URL")?,
            app_id: required("ORRERY_APP_ID")?,
            auth_token: required("ORRERY_AUTH_TOKEN")?,
        })
    }

    /// Authentication URL for the endpoint.
    pub fn auth_url(&self) -> String {
        format!("https://{}", self.endpoint_url)
    }

    /// Websocket URL the sync transport connects to.
    pub fn websocket_url(&self) -> String {
        format!("wss://{}", self.endpoint_url)
    }
}

impl fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppConfig")
            .field("endpoint_url", &self.endpoint_url)
            .field("app_id", &self.app_id)
            .field("auth_token", &"<redacted>")
            .finish()
    }
}
