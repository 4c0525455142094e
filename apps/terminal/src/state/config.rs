//! # Terminal Configuration
//!
//! Who is selling where, and which backend to talk to.
//!
//! ## Configuration Sources (Priority Order)
//! 1. Environment variables (`SCANPOS_EMP_CD`, `SCANPOS_STORE_CD`,
//!    `SCANPOS_POS_NO`, `SCANPOS_API_URL`, `SCANPOS_API_TIMEOUT_SECS`)
//! 2. `terminal.toml` in the config directory
//! 3. Defaults (`E001` / `S001` / `P01`, local backend)
//!
//! ```toml
//! emp_cd = "E001"
//! store_cd = "S001"
//! pos_no = "P01"
//!
//! [backend]
//! base_url = "https://pos.example.com/"
//! timeout_secs = 10
//! ```

use std::path::{Path, PathBuf};

use scanpos_client::BackendConfig;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::ApiError;

pub const TERMINAL_CONFIG_FILE: &str = "terminal.toml";

fn default_emp_cd() -> String {
    "E001".to_string()
}

fn default_store_cd() -> String {
    "S001".to_string()
}

fn default_pos_no() -> String {
    "P01".to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TerminalConfig {
    /// Employee code of the operator
    #[serde(default = "default_emp_cd")]
    pub emp_cd: String,

    #[serde(default = "default_store_cd")]
    pub store_cd: String,

    #[serde(default = "default_pos_no")]
    pub pos_no: String,

    #[serde(default)]
    pub backend: BackendConfig,
}

impl Default for TerminalConfig {
    fn default() -> Self {
        TerminalConfig {
            emp_cd: default_emp_cd(),
            store_cd: default_store_cd(),
            pos_no: default_pos_no(),
            backend: BackendConfig::default(),
        }
    }
}

impl TerminalConfig {
    /// Loads `terminal.toml` from `dir` (or the platform config dir), then
    /// applies environment overrides and validates.
    pub fn load(dir: Option<&Path>) -> Result<Self, ApiError> {
        let path = dir
            .map(|d| d.join(TERMINAL_CONFIG_FILE))
            .or_else(Self::default_config_path);

        let mut config = match path {
            Some(path) if path.exists() => {
                info!(?path, "Loading terminal config from file");
                let contents = std::fs::read_to_string(&path)
                    .map_err(|e| ApiError::config(format!("{}: {}", path.display(), e)))?;
                toml::from_str(&contents)
                    .map_err(|e| ApiError::config(format!("{}: {}", path.display(), e)))?
            }
            _ => {
                debug!("No terminal config file, using defaults");
                Self::default()
            }
        };

        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ApiError> {
        for (field, value) in [
            ("emp_cd", &self.emp_cd),
            ("store_cd", &self.store_cd),
            ("pos_no", &self.pos_no),
        ] {
            if value.trim().is_empty() {
                return Err(ApiError::config(format!("{} must not be empty", field)));
            }
        }

        self.backend.validate()?;
        Ok(())
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(emp) = std::env::var("SCANPOS_EMP_CD") {
            debug!(emp_cd = %emp, "Overriding employee code from environment");
            self.emp_cd = emp;
        }
        if let Ok(store) = std::env::var("SCANPOS_STORE_CD") {
            self.store_cd = store;
        }
        if let Ok(pos) = std::env::var("SCANPOS_POS_NO") {
            self.pos_no = pos;
        }

        self.backend.apply_env_overrides();
    }

    /// Platform config directory shared with `scanner.toml`.
    pub fn default_config_dir() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "scanpos", "terminal")
            .map(|dirs| dirs.config_dir().to_path_buf())
    }

    fn default_config_path() -> Option<PathBuf> {
        Self::default_config_dir().map(|dir| dir.join(TERMINAL_CONFIG_FILE))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = TerminalConfig::default();
        assert_eq!(config.emp_cd, "E001");
        assert_eq!(config.store_cd, "S001");
        assert_eq!(config.pos_no, "P01");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(TERMINAL_CONFIG_FILE),
            "pos_no = \"P07\"\n[backend]\nbase_url = \"https://pos.example.com/\"\n",
        )
        .unwrap();

        let config = TerminalConfig::load(Some(dir.path())).unwrap();
        assert_eq!(config.pos_no, "P07");
        assert_eq!(config.emp_cd, "E001");
        assert_eq!(config.backend.timeout_secs, 10);
    }

    #[test]
    fn test_blank_code_rejected() {
        let config = TerminalConfig {
            store_cd: "  ".into(),
            ..TerminalConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
