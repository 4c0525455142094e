//! # Commands
//!
//! Each command declares only the state it needs:
//! ```rust,ignore
//! // Only needs the cart
//! fn get_cart(cart: &CartState) -> CartResponse
//!
//! // Needs the backend and the cart
//! async fn add_product(catalog: &dyn ProductCatalog, cart: &CartState, ...)
//!
//! // Needs scanner, backend and cart
//! async fn scan_product(scanner: &ScannerController, catalog: &dyn ProductCatalog, cart: &CartState, ...)
//! ```

pub mod cart;
pub mod product;
pub mod trade;
