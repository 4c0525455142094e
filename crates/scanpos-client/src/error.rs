//! # Client Error Types
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Client Error Categories                            │
//! │                                                                         │
//! │  ┌─────────────────┐  ┌─────────────────┐  ┌─────────────────────────┐ │
//! │  │  Configuration  │  │   Transport     │  │     Backend answers     │ │
//! │  │                 │  │                 │  │                         │ │
//! │  │  InvalidConfig  │  │  Connection     │  │  ProductNotFound (404)  │ │
//! │  │  InvalidUrl     │  │  Timeout        │  │  Rejected {status, ..}  │ │
//! │  │  CatalogLoad    │  │  Deserialize    │  │  InvalidProductCode     │ │
//! │  └─────────────────┘  └─────────────────┘  └─────────────────────────┘ │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use scanpos_core::{ErrorResponse, ValidationError};
use thiserror::Error;

pub type ClientResult<T> = Result<T, ClientError>;

#[derive(Debug, Error)]
pub enum ClientError {
    // =========================================================================
    // Configuration Errors
    // =========================================================================
    #[error("Invalid backend configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid backend URL: {0}")]
    InvalidUrl(String),

    #[error("Failed to load product catalog: {0}")]
    CatalogLoadFailed(String),

    // =========================================================================
    // Transport Errors
    // =========================================================================
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Request timed out after {0} seconds")]
    Timeout(u64),

    #[error("Unexpected response body: {0}")]
    DeserializationFailed(String),

    // =========================================================================
    // Backend Answers
    // =========================================================================
    /// Lookup answered 404.
    #[error("Unregistered product: {code}")]
    ProductNotFound { code: String },

    /// The code was rejected locally before any request.
    #[error("Invalid product code: {0}")]
    InvalidProductCode(#[from] ValidationError),

    /// Any other non-success status.
    #[error("Backend rejected request ({status}): {message}")]
    Rejected {
        status: u16,
        error: String,
        message: String,
        details: Option<Vec<serde_json::Value>>,
    },
}

impl ClientError {
    /// Builds the error for a non-success response.
    ///
    /// `lookup_code` is the product code for lookups; a 404 then becomes
    /// [`ClientError::ProductNotFound`].
    pub fn from_response(status: u16, body: &str, lookup_code: Option<&str>) -> Self {
        if status == 404 {
            if let Some(code) = lookup_code {
                return ClientError::ProductNotFound {
                    code: code.to_string(),
                };
            }
        }

        match serde_json::from_str::<ErrorResponse>(body) {
            Ok(resp) => ClientError::Rejected {
                status,
                error: resp.error,
                message: resp.message,
                details: resp.details,
            },
            Err(_) => ClientError::Rejected {
                status,
                error: "http_error".to_string(),
                message: if body.trim().is_empty() {
                    format!("HTTP {}", status)
                } else {
                    body.trim().to_string()
                },
                details: None,
            },
        }
    }

    /// Worth retrying the same request later.
    pub fn is_retryable(&self) -> bool {
        match self {
            ClientError::ConnectionFailed(_) | ClientError::Timeout(_) => true,
            ClientError::Rejected { status, .. } => *status >= 500,
            _ => false,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ClientError::ProductNotFound { .. })
    }

    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            ClientError::InvalidConfig(_)
                | ClientError::InvalidUrl(_)
                | ClientError::CatalogLoadFailed(_)
        )
    }
}

// =============================================================================
// Error Conversions
// =============================================================================

impl From<url::ParseError> for ClientError {
    fn from(err: url::ParseError) -> Self {
        ClientError::InvalidUrl(err.to_string())
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ClientError::DeserializationFailed(err.to_string())
        } else {
            ClientError::ConnectionFailed(err.to_string())
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
