//! # Backend Configuration
//!
//! Where the product/trade API lives and how long to wait for it.
//!
//! ```toml
//! # [backend] table of terminal.toml
//! base_url = "http://localhost:8000/"
//! timeout_secs = 10
//! ```
//!
//! Environment overrides: `SCANPOS_API_URL`, `SCANPOS_API_TIMEOUT_SECS`.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use url::Url;

use crate::error::{ClientError, ClientResult};

fn default_base_url() -> String {
    "http://localhost:8000/".to_string()
}

fn default_timeout_secs() -> u64 {
    10
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        BackendConfig {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl BackendConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        BackendConfig {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    pub fn validate(&self) -> ClientResult<()> {
        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(ClientError::InvalidUrl(format!(
                "Backend URL must start with http:// or https://, got: {}",
                self.base_url
            )));
        }
        Url::parse(&self.base_url)?;

        if self.timeout_secs == 0 {
            return Err(ClientError::InvalidConfig(
                "timeout_secs must be greater than 0".into(),
            ));
        }
        Ok(())
    }

    pub fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var("SCANPOS_API_URL") {
            debug!(url = %url, "Overriding backend URL from environment");
            self.base_url = url;
        }

        if let Ok(secs) = std::env::var("SCANPOS_API_TIMEOUT_SECS") {
            match secs.parse() {
                Ok(secs) => self.timeout_secs = secs,
                Err(_) => warn!(value = %secs, "Ignoring invalid SCANPOS_API_TIMEOUT_SECS"),
            }
        }
    }

    /// Base URL with a guaranteed trailing slash, so relative joins keep
    /// any path prefix.
    pub fn base(&self) -> ClientResult<Url> {
        let mut raw = self.base_url.clone();
        if !raw.ends_with('/') {
            raw.push('/');
        }
        Ok(Url::parse(&raw)?)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}
