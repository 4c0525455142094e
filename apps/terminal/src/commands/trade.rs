//! # Trade Commands
//!
//! ```text
//! cart ──► TradeCreateRequest ──► gateway.create_trade()
//!                                    │ ok: clear cart
//!                                    │ err: cart kept for retry
//! ```

use scanpos_client::TradeGateway;
use scanpos_core::TradeResponse;
use tracing::{info, warn};

use crate::error::ApiError;
use crate::state::{CartState, TerminalConfig};

/// Submits the cart as one trade.
pub async fn submit_trade(
    cart: &CartState,
    gateway: &dyn TradeGateway,
    config: &TerminalConfig,
) -> Result<TradeResponse, ApiError> {
    let request = cart.with_cart(|c| {
        c.to_create_request(&config.emp_cd, &config.store_cd, &config.pos_no)
    })?;

    match gateway.create_trade(&request).await {
        Ok(trade) => {
            cart.with_cart_mut(|c| c.clear_items());
            info!(trade_id = trade.trade_id, total_amt = trade.total_amt, "Purchase completed");
            Ok(trade)
        }
        Err(e) => {
            warn!(error = %e, "Purchase failed, cart kept");
            Err(e.into())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use scanpos_client::StaticCatalog;
    use scanpos_core::{NewTradeItem, Product};

    fn product(prd_id: i64) -> Product {
        Product {
            prd_id,
            code: format!("49000000000{:02}", prd_id),
            name: format!("Item {}", prd_id),
            price: 100,
            tax_cd: "10".into(),
        }
    }

    #[tokio::test]
    async fn test_success_clears_cart() {
        let gateway = StaticCatalog::new(vec![product(1)]);
        let cart = CartState::new();
        cart.with_cart_mut(|c| c.add_item(NewTradeItem::from_product(&product(1), 2)))
            .unwrap();

        let trade = submit_trade(&cart, &gateway, &TerminalConfig::default())
            .await
            .unwrap();
        assert_eq!(trade.total_amt, 220);
        assert_eq!(trade.tax_amt, 20);
        assert!(cart.snapshot().items.is_empty());
    }

    #[tokio::test]
    async fn test_failure_keeps_cart() {
        let gateway = StaticCatalog::new(vec![]);
        let cart = CartState::new();
        cart.with_cart_mut(|c| c.add_item(NewTradeItem::from_product(&product(7), 1)))
            .unwrap();

        let err = submit_trade(&cart, &gateway, &TerminalConfig::default())
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
        assert_eq!(cart.snapshot().items.len(), 1);
    }

    #[tokio::test]
    async fn test_empty_cart_rejected_locally() {
        let gateway = StaticCatalog::new(vec![product(1)]);
        let err = submit_trade(&CartState::new(), &gateway, &TerminalConfig::default())
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::CartError);
    }
}
