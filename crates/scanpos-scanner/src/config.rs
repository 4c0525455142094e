//! # Scanner Configuration
//!
//! Configuration management for the scanning engine.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     SCANPOS_DETECTION_MODE=continuous                                  │
//! │     SCANPOS_FORMATS=ean_13,ean_8                                       │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     ~/.config/scanpos/scanner.toml (Linux)                             │
//! │     ~/Library/Application Support/com.scanpos.terminal/scanner.toml    │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! │     single-shot, EAN-13/EAN-8/Code-128, 2 s first-frame timeout        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! # scanner.toml
//! detection_mode = "single_shot"   # single_shot | continuous
//! formats = ["ean_13", "ean_8", "code_128"]
//! frame_timeout_ms = 2000
//! frame_interval_ms = 16
//! prefer_native = true
//! restart_on_orientation_change = true
//! software_max_dimension = 640
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::error::{ScanError, ScanResult};
use crate::platform::Symbology;

/// File name of the scanner config inside the config directory.
pub const SCANNER_CONFIG_FILE: &str = "scanner.toml";

// =============================================================================
// Detection Mode
// =============================================================================

/// What happens after the first successful detection.
///
/// ```text
/// SINGLE_SHOT (Default)               CONTINUOUS
/// ─────────────────────               ──────────
/// decode ──► teardown ──► on_detect   decode ──► on_detect ──► keep polling
/// camera released before callback     repeats suppressed by de-duplication
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectionMode {
    #[default]
    SingleShot,
    Continuous,
}

impl std::fmt::Display for DetectionMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DetectionMode::SingleShot => write!(f, "single_shot"),
            DetectionMode::Continuous => write!(f, "continuous"),
        }
    }
}

impl std::str::FromStr for DetectionMode {
    type Err = ScanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "single_shot" | "single" | "once" => Ok(DetectionMode::SingleShot),
            "continuous" | "loop" => Ok(DetectionMode::Continuous),
            other => Err(ScanError::InvalidConfig(format!(
                "Unknown detection mode: '{}'. Valid options: single_shot, continuous",
                other
            ))),
        }
    }
}

// =============================================================================
// Scanner Configuration
// =============================================================================

/// Complete scanner configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScannerConfig {
    #[serde(default)]
    pub detection_mode: DetectionMode,

    /// Symbology allow-list.
    #[serde(default = "default_formats")]
    pub formats: Vec<Symbology>,

    /// Bounded wait for the first rendered frame.
    #[serde(default = "default_frame_timeout")]
    pub frame_timeout_ms: u64,

    /// Poll cadence (one animation frame at 60 Hz).
    #[serde(default = "default_frame_interval")]
    pub frame_interval_ms: u64,

    /// Use the platform detector when the host offers one.
    #[serde(default = "default_true")]
    pub prefer_native: bool,

    #[serde(default = "default_true")]
    pub restart_on_orientation_change: bool,

    /// Frames are downscaled to this before software decoding.
    #[serde(default = "default_max_dimension")]
    pub software_max_dimension: u32,
}

fn default_formats() -> Vec<Symbology> {
    Symbology::DEFAULT_FORMATS.to_vec()
}

fn default_frame_timeout() -> u64 {
    2000
}

fn default_frame_interval() -> u64 {
    16
}

fn default_true() -> bool {
    true
}

fn default_max_dimension() -> u32 {
    640
}

impl Default for ScannerConfig {
    fn default() -> Self {
        ScannerConfig {
            detection_mode: DetectionMode::default(),
            formats: default_formats(),
            frame_timeout_ms: default_frame_timeout(),
            frame_interval_ms: default_frame_interval(),
            prefer_native: true,
            restart_on_orientation_change: true,
            software_max_dimension: default_max_dimension(),
        }
    }
}

impl ScannerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (scanner.toml)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> ScanResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading scanner config from file");
                let contents = std::fs::read_to_string(&path)?;
                config = toml::from_str(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Loads `scanner.toml` from a directory (the CLI's `--config`).
    pub fn load_from_dir(dir: &Path) -> ScanResult<Self> {
        Self::load(Some(dir.join(SCANNER_CONFIG_FILE)))
    }

    /// Loads config or returns default if load fails.
    pub fn load_or_default(config_path: Option<PathBuf>) -> Self {
        Self::load(config_path).unwrap_or_else(|e| {
            warn!("Failed to load scanner config: {}. Using defaults.", e);
            Self::default()
        })
    }

    /// Saves configuration to file.
    pub fn save(&self, config_path: Option<PathBuf>) -> ScanResult<()> {
        let path = config_path
            .or_else(Self::default_config_path)
            .ok_or_else(|| ScanError::ConfigSaveFailed("No config path available".into()))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| ScanError::ConfigSaveFailed(e.to_string()))?;
        }

        let contents = toml::to_string_pretty(self)?;
        std::fs::write(&path, contents).map_err(|e| ScanError::ConfigSaveFailed(e.to_string()))?;

        info!(?path, "Scanner config saved");
        Ok(())
    }

    /// Validates the configuration.
    pub fn validate(&self) -> ScanResult<()> {
        if self.formats.is_empty() {
            return Err(ScanError::InvalidConfig(
                "formats must list at least one symbology".into(),
            ));
        }

        if self.frame_timeout_ms == 0 {
            return Err(ScanError::InvalidConfig(
                "frame_timeout_ms must be greater than 0".into(),
            ));
        }

        if self.frame_interval_ms == 0 {
            return Err(ScanError::InvalidConfig(
                "frame_interval_ms must be greater than 0".into(),
            ));
        }

        if self.software_max_dimension < 64 {
            return Err(ScanError::InvalidConfig(
                "software_max_dimension must be at least 64".into(),
            ));
        }

        Ok(())
    }

    /// Applies environment variable overrides.
    fn apply_env_overrides(&mut self) {
        if let Ok(mode) = std::env::var("SCANPOS_DETECTION_MODE") {
            match mode.parse() {
                Ok(parsed) => {
                    debug!(mode = %mode, "Overriding detection mode from environment");
                    self.detection_mode = parsed;
                }
                Err(_) => warn!(mode = %mode, "Unknown detection mode in environment"),
            }
        }

        if let Ok(timeout) = std::env::var("SCANPOS_FRAME_TIMEOUT_MS") {
            if let Ok(ms) = timeout.parse::<u64>() {
                self.frame_timeout_ms = ms;
            }
        }

        if let Ok(interval) = std::env::var("SCANPOS_FRAME_INTERVAL_MS") {
            if let Ok(ms) = interval.parse::<u64>() {
                self.frame_interval_ms = ms;
            }
        }

        if let Ok(prefer) = std::env::var("SCANPOS_PREFER_NATIVE") {
            match prefer.to_lowercase().as_str() {
                "1" | "true" | "yes" => self.prefer_native = true,
                "0" | "false" | "no" => self.prefer_native = false,
                _ => warn!(value = %prefer, "Invalid SCANPOS_PREFER_NATIVE"),
            }
        }

        if let Ok(formats) = std::env::var("SCANPOS_FORMATS") {
            let parsed: Result<Vec<Symbology>, _> = formats
                .split(',')
                .filter(|s| !s.trim().is_empty())
                .map(str::parse)
                .collect();
            match parsed {
                Ok(list) => {
                    debug!(formats = %formats, "Overriding formats from environment");
                    self.formats = list;
                }
                Err(e) => warn!(error = %e, "Ignoring SCANPOS_FORMATS"),
            }
        }
    }

    /// Returns the default config file path.
    fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "scanpos", "terminal")
            .map(|dirs| dirs.config_dir().join(SCANNER_CONFIG_FILE))
    }

    // =========================================================================
    // Convenience Methods
    // =========================================================================

    pub fn frame_timeout(&self) -> Duration {
        Duration::from_millis(self.frame_timeout_ms)
    }

    pub fn frame_interval(&self) -> Duration {
        Duration::from_millis(self.frame_interval_ms)
    }

    pub fn is_continuous(&self) -> bool {
        self.detection_mode == DetectionMode::Continuous
    }
}
