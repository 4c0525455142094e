//! # Validation Module
//!
//! Input validation utilities for ScanPOS.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Terminal command (manual code entry, quantity edits)         │
//! │  └── THIS MODULE: format and range checks                              │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: TradeStore                                                    │
//! │  └── Cart limits (line count, per-line quantity)                       │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Backend API                                                   │
//! │  └── Product existence, trade validation                               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use scanpos_core::validation::{validate_product_code, validate_quantity};
//!
//! validate_product_code("4901234567894").unwrap();
//! validate_quantity(5).unwrap();
//! ```

use crate::error::ValidationError;
use crate::MAX_ITEM_QUANTITY;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Longest code accepted from manual entry.
pub const MAX_PRODUCT_CODE_LEN: usize = 26;

/// Validates a manually entered product code.
///
/// ## Rules
/// - Must not be empty (surrounding whitespace is ignored)
/// - Digits only, at most [`MAX_PRODUCT_CODE_LEN`] of them
/// - Must be greater than zero (`"000"` is rejected)
///
/// ## Example
/// ```rust
/// use scanpos_core::validation::validate_product_code;
///
/// assert!(validate_product_code("4901234567894").is_ok());
/// assert!(validate_product_code("0").is_err());
/// assert!(validate_product_code("49-01").is_err());
/// ```
pub fn validate_product_code(code: &str) -> ValidationResult<()> {
    let code = code.trim();

    if code.is_empty() {
        return Err(ValidationError::Required {
            field: "code".to_string(),
        });
    }

    if code.len() > MAX_PRODUCT_CODE_LEN {
        return Err(ValidationError::TooLong {
            field: "code".to_string(),
            max: MAX_PRODUCT_CODE_LEN,
        });
    }

    if !code.chars().all(|c| c.is_ascii_digit()) {
        return Err(ValidationError::InvalidFormat {
            field: "code".to_string(),
            reason: "must be numeric".to_string(),
        });
    }

    if code.chars().all(|c| c == '0') {
        return Err(ValidationError::MustBePositive {
            field: "code".to_string(),
        });
    }

    Ok(())
}

/// Validates a cart line quantity.
///
/// ## Rules
/// - Must be positive (> 0)
/// - Must not exceed MAX_ITEM_QUANTITY (999)
pub fn validate_quantity(quantity: i64) -> ValidationResult<()> {
    if quantity <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if quantity > MAX_ITEM_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_ITEM_QUANTITY,
        });
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
