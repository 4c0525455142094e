//! # scanpos-client: Backend Collaborators for ScanPOS
//!
//! Product lookup and trade submission, as traits the terminal depends on.
//!
//! ## Implementations
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   apps/terminal ──► Arc<dyn ProductCatalog> + Arc<dyn TradeGateway>    │
//! │                              │                                          │
//! │              ┌───────────────┴────────────────┐                         │
//! │              ▼                                ▼                         │
//! │   ┌──────────────────────┐        ┌──────────────────────────┐         │
//! │   │ HttpBackend          │        │ StaticCatalog            │         │
//! │   │ GET  products/{code} │        │ products.json            │         │
//! │   │ POST trades          │        │ trades priced locally    │         │
//! │   │ 404 → ProductNotFound│        │                          │         │
//! │   └──────────────────────┘        └──────────────────────────┘         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod error;
pub mod http;
pub mod static_catalog;

pub use config::BackendConfig;
pub use error::{ClientError, ClientResult};
pub use http::HttpBackend;
pub use static_catalog::StaticCatalog;

use async_trait::async_trait;
use scanpos_core::{Product, TradeCreateRequest, TradeResponse};

/// Resolves a scanned or typed product code.
#[async_trait]
pub trait ProductCatalog: Send + Sync {
    /// ## Errors
    /// [`ClientError::ProductNotFound`] for an unregistered code,
    /// [`ClientError::InvalidProductCode`] for a malformed one.
    async fn get_product_by_code(&self, code: &str) -> ClientResult<Product>;
}

/// Registers a completed sale.
#[async_trait]
pub trait TradeGateway: Send + Sync {
    async fn create_trade(&self, request: &TradeCreateRequest) -> ClientResult<TradeResponse>;
}
