//! # Cart Commands

use scanpos_client::ProductCatalog;
use scanpos_core::NewTradeItem;
use tracing::{debug, info};

use crate::commands::product::lookup_product;
use crate::error::ApiError;
use crate::state::{CartResponse, CartState};

pub fn get_cart(cart: &CartState) -> CartResponse {
    cart.snapshot()
}

/// Confirms the pending product with quantity 1.
pub fn add_pending(cart: &CartState) -> Result<CartResponse, ApiError> {
    let id = cart.with_cart_mut(|c| c.add_pending_to_cart())?;
    debug!(line = %id, "Pending product added");
    Ok(cart.snapshot())
}

/// Manual entry: look up `code` and add `quantity` of it.
pub async fn add_product(
    catalog: &dyn ProductCatalog,
    cart: &CartState,
    code: &str,
    quantity: i64,
) -> Result<CartResponse, ApiError> {
    let product = lookup_product(catalog, code).await?;
    let id = cart.with_cart_mut(|c| c.add_item(NewTradeItem::from_product(&product, quantity)))?;
    info!(line = %id, code, quantity, "Product added to cart");
    Ok(cart.snapshot())
}

/// Sets a line's quantity; values below 1 leave the line unchanged.
pub fn update_quantity(cart: &CartState, id: &str, quantity: i64) -> Result<CartResponse, ApiError> {
    cart.with_cart_mut(|c| c.update_quantity(id, quantity))?;
    Ok(cart.snapshot())
}

pub fn remove_item(cart: &CartState, id: &str) -> CartResponse {
    cart.with_cart_mut(|c| c.remove_item(id));
    cart.snapshot()
}

pub fn clear_cart(cart: &CartState) -> CartResponse {
    cart.with_cart_mut(|c| c.clear_items());
    cart.snapshot()
}
