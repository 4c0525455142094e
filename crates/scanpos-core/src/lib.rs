//! # scanpos-core: Pure Business Logic for ScanPOS
//!
//! This crate holds the cart and tax rules of the terminal as pure functions
//! with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        ScanPOS Architecture                             │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                  apps/terminal (`scanpos` CLI)                  │   │
//! │  │    scan ──► lookup ──► pending ──► cart ──► purchase            │   │
//! │  └───────────┬───────────────────────────────────┬─────────────────┘   │
//! │              │                                   │                      │
//! │  ┌───────────▼───────────┐           ┌───────────▼───────────┐         │
//! │  │   scanpos-scanner     │           │    scanpos-client     │         │
//! │  │ camera + decode loop  │           │  product / trade API  │         │
//! │  └───────────────────────┘           └───────────┬───────────┘         │
//! │                                                  │                      │
//! │  ┌───────────────────────────────────────────────▼─────────────────┐   │
//! │  │               ★ scanpos-core (THIS CRATE) ★                     │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │   money   │  │   trade   │  │ validation│  │   │
//! │  │   │  Product  │  │   Money   │  │TradeStore │  │   rules   │  │   │
//! │  │   │  TaxCode  │  │  ¥1,078   │  │TradeTotal │  │  checks   │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO CAMERA • NO NETWORK • PURE FUNCTIONS             │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Product, TradeItem, TaxCode, API DTOs)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`trade`] - The cart: line merging, tax buckets, trade request building
//! - [`error`] - Domain error types
//! - [`validation`] - Business rule validation
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: Every function is deterministic - same input = same output
//! 2. **No I/O**: Camera, network, file system access is FORBIDDEN here
//! 3. **Integer Money**: All monetary values are whole yen (i64)
//! 4. **Per-line Floor**: Tax is floored per cart line, then summed
//!
//! ## Example Usage
//!
//! ```rust
//! use scanpos_core::trade::calculate_line_amounts;
//! use scanpos_core::TaxCode;
//!
//! let line = calculate_line_amounts(333, 3, TaxCode::Reduced8);
//! assert_eq!(line.subtotal, 999);
//! assert_eq!(line.tax, 79); // floor(999 × 0.08)
//! assert_eq!(line.total, 1078);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod money;
pub mod trade;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use trade::{TradeStore, TradeTotal};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum distinct lines allowed in a single cart
///
/// ## Business Reason
/// Prevents runaway carts and keeps trade requests a reasonable size.
pub const MAX_CART_ITEMS: usize = 100;

/// Maximum quantity of a single line in the cart
///
/// ## Business Reason
/// Prevents accidental over-ordering (e.g., typing 1000 instead of 10)
pub const MAX_ITEM_QUANTITY: i64 = 999;
