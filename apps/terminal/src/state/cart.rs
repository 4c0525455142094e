//! # Cart State
//!
//! The terminal's single cart, shared between commands.
//!
//! ## Cart Operations Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Cart State Operations                                │
//! │                                                                         │
//! │  Action                   Command                 TradeStore change     │
//! │  ──────                   ───────                 ─────────────────     │
//! │                                                                         │
//! │  Barcode scanned ────────► scan_product() ──────► set_pending(product) │
//! │                                                                         │
//! │  Confirm ────────────────► add_pending() ───────► add_item(qty 1)      │
//! │                                                                         │
//! │  Change quantity ────────► update_quantity() ───► items[i].qty = n     │
//! │                                                                         │
//! │  Remove ─────────────────► remove_item() ───────► items.remove(i)      │
//! │                                                                         │
//! │  Purchase succeeded ─────► submit_trade() ──────► clear_items()        │
//! │                                                                         │
//! │  NOTE: every access takes the Mutex; totals are recomputed inside       │
//! │        TradeStore on each mutation.                                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::{Arc, Mutex, MutexGuard};

use scanpos_core::{Money, Product, TradeItem, TradeStore, TradeTotal};
use serde::Serialize;

/// Snapshot of the cart for display.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartResponse {
    pub items: Vec<TradeItem>,
    pub totals: TradeTotal,
    pub pending: Option<Product>,
}

impl From<&TradeStore> for CartResponse {
    fn from(store: &TradeStore) -> Self {
        CartResponse {
            items: store.items().to_vec(),
            totals: store.total(),
            pending: store.pending().cloned(),
        }
    }
}

impl CartResponse {
    /// Receipt-style text rendering.
    pub fn render(&self) -> String {
        let mut out = String::new();

        for item in &self.items {
            let line = scanpos_core::trade::calculate_line_amounts(
                item.price,
                item.quantity,
                item.tax_code,
            );
            out.push_str(&format!(
                "{:<24} {:>4} x {:>8} {:>10}  ({})\n",
                item.name,
                item.quantity,
                Money::from_yen(item.price).to_string(),
                Money::from_yen(line.subtotal).to_string(),
                item.tax_code.display_name(),
            ));
        }
        if let Some(pending) = &self.pending {
            out.push_str(&format!(
                "pending: {} {} ({})\n",
                pending.name,
                pending.price(),
                pending.tax_code().display_name()
            ));
        }

        let t = &self.totals;
        out.push_str(&format!("{:<40} {:>10}\n", "subtotal", Money::from_yen(t.subtotal).to_string()));
        out.push_str(&format!("{:<40} {:>10}\n", "tax 10%", Money::from_yen(t.tax10).to_string()));
        out.push_str(&format!("{:<40} {:>10}\n", "tax 8%", Money::from_yen(t.tax8).to_string()));
        out.push_str(&format!("{:<40} {:>10}\n", "total", Money::from_yen(t.total).to_string()));
        out
    }
}

/// Cart state shared by commands.
#[derive(Clone, Default)]
pub struct CartState {
    store: Arc<Mutex<TradeStore>>,
}

impl CartState {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, TradeStore> {
        self.store.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Runs `f` with read access to the cart.
    pub fn with_cart<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&TradeStore) -> R,
    {
        f(&self.lock())
    }

    /// Runs `f` with write access to the cart.
    pub fn with_cart_mut<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&mut TradeStore) -> R,
    {
        f(&mut self.lock())
    }

    pub fn snapshot(&self) -> CartResponse {
        self.with_cart(|store| CartResponse::from(store))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scanpos_core::NewTradeItem;

    fn tea() -> Product {
        Product {
            prd_id: 1,
            code: "4901234567894".into(),
            name: "Green Tea".into(),
            price: 150,
            tax_cd: "8".into(),
        }
    }

    #[test]
    fn test_snapshot_reflects_mutations() {
        let cart = CartState::new();
        let clone = cart.clone();

        clone
            .with_cart_mut(|c| c.add_item(NewTradeItem::from_product(&tea(), 2)))
            .unwrap();

        let snapshot = cart.snapshot();
        assert_eq!(snapshot.items.len(), 1);
        assert_eq!(snapshot.totals.total, 324);
    }

    #[test]
    fn test_render_lists_lines_and_totals() {
        let cart = CartState::new();
        cart.with_cart_mut(|c| c.add_item(NewTradeItem::from_product(&tea(), 2)))
            .unwrap();

        let text = cart.snapshot().render();
        assert!(text.contains("Green Tea"));
        assert!(text.contains("¥324"));
        assert!(text.contains("(8%)"));
    }
}
