//! # Domain Types
//!
//! Core domain types used throughout ScanPOS.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  Backend DTOs (snake_case on the wire)                                  │
//! │  ┌─────────────────┐   ┌──────────────────────┐   ┌─────────────────┐  │
//! │  │    Product      │   │  TradeCreateRequest  │   │  TradeResponse  │  │
//! │  │  prd_id, code   │   │  emp_cd, store_cd    │   │  trade_id       │  │
//! │  │  name, price    │   │  pos_no, trade_lines │   │  total_amt      │  │
//! │  │  tax_cd         │   └──────────────────────┘   │  tax_amt        │  │
//! │  └─────────────────┘                              └─────────────────┘  │
//! │                                                                         │
//! │  Cart types                                                             │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │   TradeItem     │   │    TaxCode      │   │    TaxRate      │       │
//! │  │  id (UUID)      │   │  "10" → 10%     │   │  bps (u32)      │       │
//! │  │  product_id     │   │  "8"  → 8%      │   │  800 = 8%       │       │
//! │  │  quantity       │   │  else → exempt  │   └─────────────────┘       │
//! │  └─────────────────┘   └─────────────────┘                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Dual-Key Identity Pattern
//! A cart line has:
//! - `id`: UUID v4, unique per cart line, used by quantity/remove operations
//! - `product_id`: backend product key, used to merge repeat scans

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;

// =============================================================================
// Tax Rate
// =============================================================================

/// Tax rate represented in basis points (bps).
///
/// 1 basis point = 0.01%, so 800 bps = 8% (reduced rate).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TaxRate(u32);

impl TaxRate {
    /// Creates a tax rate from basis points.
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        TaxRate(bps)
    }

    /// Returns the rate in basis points.
    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// Zero tax rate.
    #[inline]
    pub const fn zero() -> Self {
        TaxRate(0)
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

impl Default for TaxRate {
    fn default() -> Self {
        TaxRate::zero()
    }
}

// =============================================================================
// Tax Code
// =============================================================================

/// Consumption-tax bucket of a product.
///
/// ## Wire Format
/// The backend sends `tax_cd` as a string. `"10"` and `"8"` select the
/// standard and reduced rates; every other value lands in the exempt bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, TS)]
#[ts(export)]
pub enum TaxCode {
    /// 10% standard rate.
    #[serde(rename = "10")]
    Standard10,
    /// 8% reduced rate (food, newspapers).
    #[serde(rename = "8")]
    Reduced8,
    /// 0% / unknown code.
    #[serde(rename = "0")]
    Exempt,
}

impl<'de> Deserialize<'de> for TaxCode {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Ok(TaxCode::from_code(&raw))
    }
}

impl TaxCode {
    /// Maps a raw `tax_cd` string onto a bucket. Never fails.
    pub fn from_code(code: &str) -> Self {
        match code.trim() {
            "10" => TaxCode::Standard10,
            "8" => TaxCode::Reduced8,
            _ => TaxCode::Exempt,
        }
    }

    /// The code as sent to / received from the backend.
    pub const fn as_code(&self) -> &'static str {
        match self {
            TaxCode::Standard10 => "10",
            TaxCode::Reduced8 => "8",
            TaxCode::Exempt => "0",
        }
    }

    /// Rate applied to the line subtotal.
    pub const fn rate(&self) -> TaxRate {
        match self {
            TaxCode::Standard10 => TaxRate::from_bps(1000),
            TaxCode::Reduced8 => TaxRate::from_bps(800),
            TaxCode::Exempt => TaxRate::zero(),
        }
    }

    /// Label shown next to a cart line.
    pub const fn display_name(&self) -> &'static str {
        match self {
            TaxCode::Standard10 => "10%",
            TaxCode::Reduced8 => "8%",
            TaxCode::Exempt => "exempt",
        }
    }
}

impl fmt::Display for TaxCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_code())
    }
}

impl FromStr for TaxCode {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(TaxCode::from_code(s))
    }
}

// =============================================================================
// Product
// =============================================================================

/// A product as returned by the backend lookup API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Product {
    /// Backend primary key.
    pub prd_id: i64,

    /// Barcode / product code (EAN-13, EAN-8, ...).
    pub code: String,

    /// Display name shown to the cashier.
    pub name: String,

    /// Tax-exclusive unit price in yen.
    pub price: i64,

    /// Raw tax code (`"10"`, `"8"`, `"0"`).
    pub tax_cd: String,
}

impl Product {
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_yen(self.price)
    }

    #[inline]
    pub fn tax_code(&self) -> TaxCode {
        TaxCode::from_code(&self.tax_cd)
    }
}

// =============================================================================
// Trade Item (cart line)
// =============================================================================

/// One line in the cart.
///
/// Owned by [`TradeStore`](crate::trade::TradeStore); callers only ever see
/// clones.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct TradeItem {
    /// Unique per cart line (UUID v4).
    pub id: String,
    pub product_id: i64,
    pub code: String,
    pub name: String,
    /// Tax-exclusive unit price in yen.
    pub price: i64,
    pub tax_code: TaxCode,
    /// Always >= 1.
    pub quantity: i64,
}

/// A cart line before it has been assigned an id.
///
/// Passed to `TradeStore::add_item`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct NewTradeItem {
    pub product_id: i64,
    pub code: String,
    pub name: String,
    pub price: i64,
    pub tax_code: TaxCode,
    pub quantity: i64,
}

impl NewTradeItem {
    /// Builds a line for `product` with the given quantity.
    pub fn from_product(product: &Product, quantity: i64) -> Self {
        NewTradeItem {
            product_id: product.prd_id,
            code: product.code.clone(),
            name: product.name.clone(),
            price: product.price,
            tax_code: product.tax_code(),
            quantity,
        }
    }
}

// =============================================================================
// Trade API DTOs
// =============================================================================

/// One line of a trade submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TradeLineRequest {
    pub prd_id: i64,
    pub qty: i64,
}

/// Body of `POST /trades`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TradeCreateRequest {
    /// Employee code of the operator.
    pub emp_cd: String,
    pub store_cd: String,
    pub pos_no: String,
    pub trade_lines: Vec<TradeLineRequest>,
}

/// Backend response to a successful trade submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TradeResponse {
    pub trade_id: i64,
    pub total_amt: i64,
    pub tax_amt: i64,
    /// RFC 3339, or a naive timestamp taken as UTC.
    #[ts(as = "String")]
    #[serde(deserialize_with = "backend_timestamp::deserialize")]
    pub created_at: DateTime<Utc>,
}

/// Backend timestamps arrive with or without an offset.
mod backend_timestamp {
    use chrono::{DateTime, NaiveDateTime, Utc};
    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        if let Ok(at) = DateTime::parse_from_rfc3339(&raw) {
            return Ok(at.with_timezone(&Utc));
        }

        raw.parse::<NaiveDateTime>()
            .or_else(|_| NaiveDateTime::parse_from_str(&raw, "%Y-%m-%d %H:%M:%S%.f"))
            .map(|naive| naive.and_utc())
            .map_err(|e| serde::de::Error::custom(format!("invalid created_at {raw:?}: {e}")))
    }
}

/// Error body returned by the backend: `{error, message, details?}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(type = "Array<unknown> | null")]
    pub details: Option<Vec<serde_json::Value>>,
}

// =============================================================================
// Unit Tests
// =============================================================================
