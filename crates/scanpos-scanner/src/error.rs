//! # Scanner Error Types
//!
//! Error types for camera acquisition and barcode detection.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Scanner Error Categories                           │
//! │                                                                         │
//! │  ┌─────────────────┐  ┌──────────────────────┐  ┌────────────────────┐ │
//! │  │  Environment    │  │   Acquisition        │  │  Pipeline          │ │
//! │  │                 │  │                      │  │                    │ │
//! │  │ InsecureContext │  │ PermissionDenied     │  │ NoFramesTimeout    │ │
//! │  │ CameraUnavail.  │  │ NoDeviceMatches...   │  │ VideoSurfaceNot... │ │
//! │  │                 │  │                      │  │ DecoderUnavailable │ │
//! │  └─────────────────┘  └──────────────────────┘  └────────────────────┘ │
//! │                                                                         │
//! │  ┌─────────────────┐  ┌──────────────────────┐                         │
//! │  │  Configuration  │  │   Lifecycle          │                         │
//! │  │ InvalidConfig   │  │ Cancelled            │                         │
//! │  │ ConfigLoad/Save │  │ (superseded start)   │                         │
//! │  └─────────────────┘  └──────────────────────┘                         │
//! │                                                                         │
//! │  Platform failures arrive as MediaError and are mapped onto ScanError   │
//! │  together with the constraint candidate that produced them.             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Per-frame decode misses are NOT errors and never appear here.

use thiserror::Error;

/// Result type alias for scanner operations.
pub type ScanResult<T> = Result<T, ScanError>;

// =============================================================================
// Media Error (platform level)
// =============================================================================

/// Failure reported by the host camera / media platform.
///
/// Mirrors the `DOMException` names a browser raises from `getUserMedia`
/// and `HTMLMediaElement.play()`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MediaError {
    /// The user or the platform refused camera access.
    #[error("NotAllowedError: {0}")]
    NotAllowed(String),

    /// No camera device exists.
    #[error("NotFoundError: {0}")]
    NotFound(String),

    /// Devices exist but none satisfies the requested constraints.
    #[error("OverconstrainedError: {0}")]
    Overconstrained(String),

    /// The device exists but could not be opened (in use, hardware fault).
    #[error("NotReadableError: {0}")]
    NotReadable(String),

    /// The requested API is not available on this host.
    #[error("NotSupportedError: {0}")]
    Unsupported(String),

    #[error("{0}")]
    Other(String),
}

// =============================================================================
// Scan Error
// =============================================================================

/// Scanner error covering every way `start()` can fail.
///
/// ## Design Principles
/// - Every variant is recoverable: the caller may simply call `start()` again
/// - Acquisition errors carry the constraint candidate that produced them
/// - All errors are `Send + Sync` for async compatibility
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScanError {
    // =========================================================================
    // Environment Errors
    // =========================================================================
    /// Camera access requires HTTPS or localhost.
    #[error("Camera access requires a secure context (HTTPS or localhost)")]
    InsecureContext,

    /// The host has no usable camera API or the device could not be opened.
    #[error("Camera unavailable: {reason}")]
    CameraUnavailable {
        reason: String,
        constraint: Option<String>,
    },

    // =========================================================================
    // Acquisition Errors
    // =========================================================================
    /// Camera permission was refused.
    #[error("Camera permission denied: {reason}")]
    PermissionDenied {
        reason: String,
        constraint: Option<String>,
    },

    /// No camera satisfied any constraint candidate.
    #[error("No camera matches the requested constraints: {reason}")]
    NoDeviceMatchesConstraints {
        reason: String,
        constraint: Option<String>,
    },

    // =========================================================================
    // Pipeline Errors
    // =========================================================================
    /// The surface never rendered a frame with nonzero dimensions.
    #[error("No video frames within {timeout_ms} ms")]
    NoFramesTimeout { timeout_ms: u64 },

    /// No surface is mounted, or playback could not be started.
    #[error("Video surface not ready: {0}")]
    VideoSurfaceNotReady(String),

    /// Neither a native detector nor the software decoder is available.
    #[error("No barcode decoder available")]
    DecoderUnavailable,

    // =========================================================================
    // Lifecycle
    // =========================================================================
    /// The start was superseded by `stop()` or a newer `start()`.
    #[error("Scan start was cancelled")]
    Cancelled,

    // =========================================================================
    // Configuration Errors
    // =========================================================================
    #[error("Invalid scanner configuration: {0}")]
    InvalidConfig(String),

    #[error("Failed to load scanner config: {0}")]
    ConfigLoadFailed(String),

    #[error("Failed to save scanner config: {0}")]
    ConfigSaveFailed(String),
}

// =============================================================================
// Error Conversions
// =============================================================================

impl ScanError {
    /// Maps a platform failure from `getUserMedia` onto the scanner taxonomy,
    /// tagging it with the constraint that was requested.
    pub fn from_media(err: MediaError, constraint: impl Into<String>) -> Self {
        let constraint = Some(constraint.into());
        match err {
            MediaError::NotAllowed(reason) => ScanError::PermissionDenied { reason, constraint },
            MediaError::NotFound(reason) | MediaError::Overconstrained(reason) => {
                ScanError::NoDeviceMatchesConstraints { reason, constraint }
            }
            MediaError::NotReadable(reason)
            | MediaError::Unsupported(reason)
            | MediaError::Other(reason) => ScanError::CameraUnavailable { reason, constraint },
        }
    }

    /// The constraint candidate that produced this error, if any.
    pub fn constraint(&self) -> Option<&str> {
        match self {
            ScanError::CameraUnavailable { constraint, .. }
            | ScanError::PermissionDenied { constraint, .. }
            | ScanError::NoDeviceMatchesConstraints { constraint, .. } => constraint.as_deref(),
            _ => None,
        }
    }
}

impl From<std::io::Error> for ScanError {
    fn from(err: std::io::Error) -> Self {
        ScanError::ConfigLoadFailed(err.to_string())
    }
}

impl From<toml::de::Error> for ScanError {
    fn from(err: toml::de::Error) -> Self {
        ScanError::ConfigLoadFailed(err.to_string())
    }
}

impl From<toml::ser::Error> for ScanError {
    fn from(err: toml::ser::Error) -> Self {
        ScanError::ConfigSaveFailed(err.to_string())
    }
}

// =============================================================================
// Error Categorization
// =============================================================================

impl ScanError {
    /// Returns true if trying the next constraint candidate may help.
    ///
    /// ## Retryable Errors
    /// - NoFramesTimeout (a different resolution / device may render)
    ///
    /// Everything else is surfaced to the caller directly.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ScanError::NoFramesTimeout { .. })
    }

    /// Returns true if this error indicates a configuration problem.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            ScanError::InvalidConfig(_)
                | ScanError::ConfigLoadFailed(_)
                | ScanError::ConfigSaveFailed(_)
        )
    }
}
