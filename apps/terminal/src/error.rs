//! # API Error Type
//!
//! Unified error type for terminal commands.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  ScanError ───┐                                                         │
//! │  CoreError ───┼──► ApiError { code, message } ──► stderr (JSON)        │
//! │  ClientError ─┘                                                         │
//! │                                                                         │
//! │  {"code":"PERMISSION_DENIED","message":"Camera permission denied ..."}  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use scanpos_client::ClientError;
use scanpos_core::CoreError;
use scanpos_scanner::ScanError;
use serde::Serialize;

/// Error returned from terminal commands.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    /// Machine-readable error code
    pub code: ErrorCode,

    /// Human-readable error message
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Unregistered product (lookup 404)
    NotFound,

    /// Input validation failed
    ValidationError,

    /// Cart rule violated (size, empty cart, nothing pending)
    CartError,

    /// Camera access refused
    PermissionDenied,

    /// No usable camera, insecure context, or no decoder
    CameraUnavailable,

    /// Camera opened but the scan did not complete
    ScannerError,

    /// Scan cancelled by a newer request
    Cancelled,

    /// Backend unreachable or rejected the request
    BackendError,

    /// Configuration invalid or unreadable
    ConfigError,

    Internal,
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            code,
            message: message.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::ValidationError, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Internal, message)
    }

    pub fn config(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::ConfigError, message)
    }

    /// Renders the error as the JSON the CLI prints.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self)
            .unwrap_or_else(|_| format!("{{\"code\":\"INTERNAL\",\"message\":{:?}}}", self.message))
    }
}

// =============================================================================
// Error Conversions
// =============================================================================

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        let code = match &err {
            CoreError::Validation(_) => ErrorCode::ValidationError,
            CoreError::CartTooLarge { .. }
            | CoreError::EmptyCart
            | CoreError::NoPendingProduct => ErrorCode::CartError,
        };
        ApiError::new(code, err.to_string())
    }
}

impl From<ScanError> for ApiError {
    fn from(err: ScanError) -> Self {
        let code = match &err {
            ScanError::PermissionDenied { .. } => ErrorCode::PermissionDenied,
            ScanError::InsecureContext
            | ScanError::CameraUnavailable { .. }
            | ScanError::NoDeviceMatchesConstraints { .. }
            | ScanError::DecoderUnavailable => ErrorCode::CameraUnavailable,
            ScanError::NoFramesTimeout { .. } | ScanError::VideoSurfaceNotReady(_) => {
                ErrorCode::ScannerError
            }
            ScanError::Cancelled => ErrorCode::Cancelled,
            ScanError::InvalidConfig(_)
            | ScanError::ConfigLoadFailed(_)
            | ScanError::ConfigSaveFailed(_) => ErrorCode::ConfigError,
        };
        ApiError::new(code, err.to_string())
    }
}

impl From<ClientError> for ApiError {
    fn from(err: ClientError) -> Self {
        let code = match &err {
            ClientError::ProductNotFound { .. } => ErrorCode::NotFound,
            ClientError::InvalidProductCode(_) => ErrorCode::ValidationError,
            ClientError::Rejected { status, .. } if *status < 500 => ErrorCode::ValidationError,
            ClientError::InvalidConfig(_)
            | ClientError::InvalidUrl(_)
            | ClientError::CatalogLoadFailed(_) => ErrorCode::ConfigError,
            _ => {
                tracing::error!(error = %err, "Backend call failed");
                ErrorCode::BackendError
            }
        };
        ApiError::new(code, err.to_string())
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:?}] {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_code() {
        let err: ApiError = ClientError::ProductNotFound {
            code: "4900000000000".into(),
        }
        .into();
        assert_eq!(err.code, ErrorCode::NotFound);
        assert_eq!(
            err.to_json(),
            r#"{"code":"NOT_FOUND","message":"Unregistered product: 4900000000000"}"#
        );
    }

    #[test]
    fn test_scan_error_codes() {
        let err: ApiError = ScanError::PermissionDenied {
            reason: "dismissed".into(),
            constraint: None,
        }
        .into();
        assert_eq!(err.code, ErrorCode::PermissionDenied);

        let err: ApiError = ScanError::InsecureContext.into();
        assert_eq!(err.code, ErrorCode::CameraUnavailable);

        let err: ApiError = ScanError::NoFramesTimeout { timeout_ms: 2000 }.into();
        assert_eq!(err.code, ErrorCode::ScannerError);
    }

    #[test]
    fn test_empty_cart_is_cart_error() {
        let err: ApiError = CoreError::EmptyCart.into();
        assert_eq!(err.code, ErrorCode::CartError);
    }
}
