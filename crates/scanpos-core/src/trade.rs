//! # Trade Module
//!
//! The cart: lines the cashier has selected, a pending (scanned but not yet
//! added) product, and the derived tax totals.
//!
//! ## Cart Operations Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    TradeStore Operations                                │
//! │                                                                         │
//! │  Scan / lookup ──────► set_pending(product)                             │
//! │                                │                                        │
//! │  Press "Add" ────────► add_pending_to_cart() ──► add_item(qty 1)       │
//! │                                                                         │
//! │  Change quantity ────► update_quantity(id, n)   (n <= 0 is a no-op)    │
//! │  Press remove ───────► remove_item(id)                                  │
//! │  Purchase OK ────────► clear_items()            (also clears pending)  │
//! │                                                                         │
//! │  EVERY mutation ends with calculate_total()                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Rounding Policy
//! Tax is floored per line and then summed into its bucket. Flooring the
//! summed subtotal instead can differ by a yen per line and would disagree
//! with the settlement backend.

use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::{NewTradeItem, Product, TaxCode, TradeCreateRequest, TradeItem, TradeLineRequest};
use crate::validation::validate_quantity;
use crate::MAX_CART_ITEMS;

// =============================================================================
// Totals
// =============================================================================

/// Derived cart totals.
///
/// ## Invariants
/// - `total == subtotal + tax`
/// - `tax == tax10 + tax8 + tax0`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TradeTotal {
    pub subtotal: i64,
    pub tax: i64,
    pub total: i64,
    pub tax10: i64,
    pub tax8: i64,
    pub tax0: i64,
}

/// Amounts for a single cart line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct LineAmounts {
    pub subtotal: i64,
    pub tax: i64,
    pub total: i64,
}

/// Computes subtotal, floored tax and total for one line.
///
/// ```rust
/// use scanpos_core::trade::calculate_line_amounts;
/// use scanpos_core::TaxCode;
///
/// let line = calculate_line_amounts(150, 2, TaxCode::Standard10);
/// assert_eq!((line.subtotal, line.tax, line.total), (300, 30, 330));
/// ```
pub fn calculate_line_amounts(price: i64, quantity: i64, tax_code: TaxCode) -> LineAmounts {
    let subtotal = Money::from_yen(price).multiply_quantity(quantity);
    let tax = subtotal.floor_tax(tax_code.rate());

    LineAmounts {
        subtotal: subtotal.yen(),
        tax: tax.yen(),
        total: (subtotal + tax).yen(),
    }
}

/// Sums the lines into the three tax buckets.
pub fn calculate_trade_total(items: &[TradeItem]) -> TradeTotal {
    let mut total = TradeTotal::default();

    for item in items {
        let line = calculate_line_amounts(item.price, item.quantity, item.tax_code);
        total.subtotal += line.subtotal;

        match item.tax_code {
            TaxCode::Standard10 => total.tax10 += line.tax,
            TaxCode::Reduced8 => total.tax8 += line.tax,
            TaxCode::Exempt => total.tax0 += line.tax,
        }
    }

    total.tax = total.tax10 + total.tax8 + total.tax0;
    total.total = total.subtotal + total.tax;
    total
}

// =============================================================================
// Trade Store
// =============================================================================

/// Cart state owned by a single terminal.
///
/// ## Invariants
/// - Lines are unique by `product_id` (adding the same product sums quantity)
/// - Every quantity is >= 1
/// - `total()` always matches `items()`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TradeStore {
    items: Vec<TradeItem>,
    total: TradeTotal,
    pending: Option<Product>,
}

impl TradeStore {
    /// Creates an empty cart.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn items(&self) -> &[TradeItem] {
        &self.items
    }

    pub fn total(&self) -> TradeTotal {
        self.total
    }

    pub fn pending(&self) -> Option<&Product> {
        self.pending.as_ref()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Adds a line, or merges into the existing line for the same product.
    ///
    /// ## Returns
    /// The id of the line that now holds the product.
    ///
    /// ## Errors
    /// - `Validation` if `quantity` is not positive or the merged quantity
    ///   would pass the per-line maximum
    /// - `CartTooLarge` if a new line would pass the line limit
    pub fn add_item(&mut self, item: NewTradeItem) -> CoreResult<String> {
        validate_quantity(item.quantity)?;

        if let Some(existing) = self
            .items
            .iter_mut()
            .find(|line| line.product_id == item.product_id)
        {
            let merged = existing.quantity + item.quantity;
            validate_quantity(merged)?;
            existing.quantity = merged;
            let id = existing.id.clone();
            self.calculate_total();
            return Ok(id);
        }

        if self.items.len() >= MAX_CART_ITEMS {
            return Err(CoreError::CartTooLarge {
                max: MAX_CART_ITEMS,
            });
        }

        let id = Uuid::new_v4().to_string();
        self.items.push(TradeItem {
            id: id.clone(),
            product_id: item.product_id,
            code: item.code,
            name: item.name,
            price: item.price,
            tax_code: item.tax_code,
            quantity: item.quantity,
        });
        self.calculate_total();
        Ok(id)
    }

    /// Deletes the line with `id`. Unknown ids are ignored.
    pub fn remove_item(&mut self, id: &str) {
        self.items.retain(|line| line.id != id);
        self.calculate_total();
    }

    /// Sets the quantity of line `id`.
    ///
    /// A quantity <= 0 is a silent no-op; callers enforce the floor of 1.
    /// Unknown ids are ignored.
    ///
    /// ## Errors
    /// `Validation` if `quantity` passes the per-line maximum.
    pub fn update_quantity(&mut self, id: &str, quantity: i64) -> CoreResult<()> {
        if quantity <= 0 {
            return Ok(());
        }
        validate_quantity(quantity)?;

        if let Some(line) = self.items.iter_mut().find(|line| line.id == id) {
            line.quantity = quantity;
        }
        self.calculate_total();
        Ok(())
    }

    /// Empties the cart and drops any pending product.
    pub fn clear_items(&mut self) {
        self.items.clear();
        self.pending = None;
        self.total = TradeTotal::default();
    }

    /// Recomputes `total` from `items`.
    pub fn calculate_total(&mut self) {
        self.total = calculate_trade_total(&self.items);
    }

    /// Stores a scanned/looked-up product awaiting confirmation.
    pub fn set_pending(&mut self, product: Option<Product>) {
        self.pending = product;
    }

    /// Moves the pending product into the cart with quantity 1.
    ///
    /// ## Errors
    /// - `NoPendingProduct` when nothing is pending
    /// - Anything `add_item` returns; pending is kept in that case
    pub fn add_pending_to_cart(&mut self) -> CoreResult<String> {
        let product = self.pending.as_ref().ok_or(CoreError::NoPendingProduct)?;
        let id = self.add_item(NewTradeItem::from_product(product, 1))?;
        self.pending = None;
        Ok(id)
    }

    /// Builds the backend submission for the current lines.
    ///
    /// ## Errors
    /// `EmptyCart` if there is nothing to sell.
    pub fn to_create_request(
        &self,
        emp_cd: &str,
        store_cd: &str,
        pos_no: &str,
    ) -> CoreResult<TradeCreateRequest> {
        if self.items.is_empty() {
            return Err(CoreError::EmptyCart);
        }

        Ok(TradeCreateRequest {
            emp_cd: emp_cd.to_string(),
            store_cd: store_cd.to_string(),
            pos_no: pos_no.to_string(),
            trade_lines: self
                .items
                .iter()
                .map(|line| TradeLineRequest {
                    prd_id: line.product_id,
                    qty: line.quantity,
                })
                .collect(),
        })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn new_item(product_id: i64, price: i64, tax_code: TaxCode, quantity: i64) -> NewTradeItem {
        NewTradeItem {
            product_id,
            code: format!("49{product_id:011}"),
            name: format!("Product {product_id}"),
            price,
            tax_code,
            quantity,
        }
    }

    fn product(prd_id: i64, price: i64, tax_cd: &str) -> Product {
        Product {
            prd_id,
            code: format!("{prd_id}"),
            name: format!("Product {prd_id}"),
            price,
            tax_cd: tax_cd.to_string(),
        }
    }

    #[test]
    fn test_reduced_rate_floors_per_line() {
        let mut store = TradeStore::new();
        store
            .add_item(new_item(1, 333, TaxCode::Reduced8, 3))
            .unwrap();

        let total = store.total();
        assert_eq!(total.subtotal, 999);
        assert_eq!(total.tax8, 79);
        assert_eq!(total.tax, 79);
        assert_eq!(total.total, 1078);
    }

    #[test]
    fn test_per_line_floor_differs_from_floor_of_sum() {
        // Two lines of ¥999 @ 8%: per-line 79 + 79 = 158,
        // floor(1998 × 0.08) would be 159.
        let mut store = TradeStore::new();
        store.add_item(new_item(1, 333, TaxCode::Reduced8, 3)).unwrap();
        store.add_item(new_item(2, 999, TaxCode::Reduced8, 1)).unwrap();

        let total = store.total();
        let floor_of_sum = Money::from_yen(total.subtotal)
            .floor_tax(TaxCode::Reduced8.rate())
            .yen();
        assert_eq!(total.tax8, 158);
        assert_eq!(floor_of_sum, 159);
        assert_ne!(total.tax8, floor_of_sum);
    }

    #[test]
    fn test_same_product_merges() {
        let mut store = TradeStore::new();
        let first = store.add_item(new_item(7, 100, TaxCode::Standard10, 1)).unwrap();
        let second = store.add_item(new_item(7, 100, TaxCode::Standard10, 1)).unwrap();

        assert_eq!(first, second);
        assert_eq!(store.items().len(), 1);
        assert_eq!(store.items()[0].quantity, 2);
        assert_eq!(store.total().total, 220);
    }

    #[test]
    fn test_distinct_products_get_distinct_ids() {
        let mut store = TradeStore::new();
        let a = store.add_item(new_item(1, 100, TaxCode::Exempt, 1)).unwrap();
        let b = store.add_item(new_item(2, 100, TaxCode::Exempt, 1)).unwrap();
        assert_ne!(a, b);
        assert_eq!(store.total().tax0, 0);
        assert_eq!(store.total().total, 200);
    }

    #[test]
    fn test_add_rejects_non_positive_quantity() {
        let mut store = TradeStore::new();
        let err = store
            .add_item(new_item(1, 100, TaxCode::Standard10, 0))
            .unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));
        assert!(store.is_empty());
    }

    #[test]
    fn test_update_quantity_ignores_non_positive() {
        let mut store = TradeStore::new();
        let id = store.add_item(new_item(1, 100, TaxCode::Standard10, 2)).unwrap();

        store.update_quantity(&id, 0).unwrap();
        store.update_quantity(&id, -3).unwrap();
        assert_eq!(store.items()[0].quantity, 2);

        store.update_quantity(&id, 5).unwrap();
        assert_eq!(store.items()[0].quantity, 5);
        assert_eq!(store.total().subtotal, 500);
        assert_eq!(store.total().tax10, 50);
    }

    #[test]
    fn test_update_quantity_over_max() {
        let mut store = TradeStore::new();
        let id = store.add_item(new_item(1, 100, TaxCode::Standard10, 1)).unwrap();
        assert!(store.update_quantity(&id, 1000).is_err());
        assert_eq!(store.items()[0].quantity, 1);
    }

    #[test]
    fn test_remove_item_recomputes() {
        let mut store = TradeStore::new();
        let id = store.add_item(new_item(1, 100, TaxCode::Standard10, 1)).unwrap();
        store.add_item(new_item(2, 200, TaxCode::Reduced8, 1)).unwrap();

        store.remove_item(&id);
        assert_eq!(store.items().len(), 1);
        assert_eq!(store.total().tax10, 0);
        assert_eq!(store.total().tax8, 16);
        assert_eq!(store.total().total, 216);
    }

    #[test]
    fn test_cart_line_limit() {
        let mut store = TradeStore::new();
        for id in 0..MAX_CART_ITEMS as i64 {
            store.add_item(new_item(id, 10, TaxCode::Exempt, 1)).unwrap();
        }
        let err = store
            .add_item(new_item(MAX_CART_ITEMS as i64, 10, TaxCode::Exempt, 1))
            .unwrap_err();
        assert!(matches!(err, CoreError::CartTooLarge { .. }));

        // Merging into an existing line is still allowed.
        store.add_item(new_item(0, 10, TaxCode::Exempt, 1)).unwrap();
    }

    #[test]
    fn test_pending_flow() {
        let mut store = TradeStore::new();
        assert!(matches!(
            store.add_pending_to_cart(),
            Err(CoreError::NoPendingProduct)
        ));

        store.set_pending(Some(product(9, 150, "8")));
        store.add_pending_to_cart().unwrap();
        assert!(store.pending().is_none());
        assert_eq!(store.items()[0].quantity, 1);
        assert_eq!(store.items()[0].tax_code, TaxCode::Reduced8);
        assert_eq!(store.total().total, 162);
    }

    #[test]
    fn test_clear_items_clears_pending() {
        let mut store = TradeStore::new();
        store.add_item(new_item(1, 100, TaxCode::Standard10, 1)).unwrap();
        store.set_pending(Some(product(2, 100, "10")));

        store.clear_items();
        assert!(store.is_empty());
        assert!(store.pending().is_none());
        assert_eq!(store.total(), TradeTotal::default());
    }

    #[test]
    fn test_create_request() {
        let mut store = TradeStore::new();
        assert!(matches!(
            store.to_create_request("E001", "S001", "P01"),
            Err(CoreError::EmptyCart)
        ));

        store.add_item(new_item(3, 100, TaxCode::Standard10, 2)).unwrap();
        let request = store.to_create_request("E001", "S001", "P01").unwrap();
        assert_eq!(request.emp_cd, "E001");
        assert_eq!(
            request.trade_lines,
            vec![TradeLineRequest { prd_id: 3, qty: 2 }]
        );
    }

    fn arb_tax_code() -> impl Strategy<Value = TaxCode> {
        prop_oneof![
            Just(TaxCode::Standard10),
            Just(TaxCode::Reduced8),
            Just(TaxCode::Exempt),
        ]
    }

    proptest! {
        #[test]
        fn prop_totals_stay_consistent(
            lines in proptest::collection::vec((0i64..20, 0i64..100_000, arb_tax_code(), 1i64..50), 0..30)
        ) {
            let mut store = TradeStore::new();
            for (product_id, price, tax_code, qty) in lines {
                let _ = store.add_item(new_item(product_id, price, tax_code, qty));
            }

            let total = store.total();
            prop_assert_eq!(total.total, total.subtotal + total.tax);
            prop_assert_eq!(total.tax, total.tax10 + total.tax8 + total.tax0);
            prop_assert_eq!(total, calculate_trade_total(store.items()));
        }

        #[test]
        fn prop_per_line_floor_never_exceeds_floor_of_sum(
            lines in proptest::collection::vec((0i64..100_000, 1i64..50), 1..30)
        ) {
            let mut store = TradeStore::new();
            for (product_id, (price, qty)) in lines.into_iter().enumerate() {
                let _ = store.add_item(new_item(product_id as i64, price, TaxCode::Standard10, qty));
            }

            let total = store.total();
            let floor_of_sum = Money::from_yen(total.subtotal)
                .floor_tax(TaxCode::Standard10.rate())
                .yen();
            prop_assert!(total.tax10 <= floor_of_sum);
        }
    }
}
