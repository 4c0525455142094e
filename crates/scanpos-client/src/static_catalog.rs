//! # Static Catalog
//!
//! Offline stand-in for the backend: products come from a JSON file and
//! trades are priced locally with the same per-line rules the cart uses.
//!
//! ```json
//! [
//!   { "prd_id": 1, "code": "4901234567894", "name": "Green Tea", "price": 150, "tax_cd": "8" }
//! ]
//! ```

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use scanpos_core::trade::calculate_line_amounts;
use scanpos_core::validation::validate_product_code;
use scanpos_core::{Product, TradeCreateRequest, TradeResponse};
use serde_json::json;
use tracing::{debug, info};

use crate::error::{ClientError, ClientResult};
use crate::{ProductCatalog, TradeGateway};

pub struct StaticCatalog {
    by_code: HashMap<String, Product>,
    by_id: HashMap<i64, Product>,
    next_trade_id: AtomicI64,
}

impl StaticCatalog {
    pub fn new(products: Vec<Product>) -> Self {
        let by_id = products.iter().map(|p| (p.prd_id, p.clone())).collect();
        let by_code = products.into_iter().map(|p| (p.code.clone(), p)).collect();

        StaticCatalog {
            by_code,
            by_id,
            next_trade_id: AtomicI64::new(1),
        }
    }

    pub fn from_json(json: &str) -> ClientResult<Self> {
        let products: Vec<Product> = serde_json::from_str(json)
            .map_err(|e| ClientError::CatalogLoadFailed(e.to_string()))?;
        Ok(Self::new(products))
    }

    pub fn load(path: &Path) -> ClientResult<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ClientError::CatalogLoadFailed(format!("{}: {}", path.display(), e)))?;
        let catalog = Self::from_json(&contents)?;
        info!(path = %path.display(), products = catalog.len(), "Product catalog loaded");
        Ok(catalog)
    }

    pub fn len(&self) -> usize {
        self.by_code.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_code.is_empty()
    }

    fn validation_error(message: &str, details: Vec<serde_json::Value>) -> ClientError {
        ClientError::Rejected {
            status: 400,
            error: "validation_error".to_string(),
            message: message.to_string(),
            details: Some(details),
        }
    }
}

#[async_trait]
impl ProductCatalog for StaticCatalog {
    async fn get_product_by_code(&self, code: &str) -> ClientResult<Product> {
        let code = code.trim();
        validate_product_code(code)?;

        self.by_code
            .get(code)
            .cloned()
            .ok_or_else(|| ClientError::ProductNotFound {
                code: code.to_string(),
            })
    }
}

#[async_trait]
impl TradeGateway for StaticCatalog {
    async fn create_trade(&self, request: &TradeCreateRequest) -> ClientResult<TradeResponse> {
        if request.trade_lines.is_empty() {
            return Err(Self::validation_error(
                "trade_lines must not be empty",
                vec![json!({ "field": "trade_lines", "message": "empty" })],
            ));
        }

        let mut missing: Vec<i64> = request
            .trade_lines
            .iter()
            .map(|line| line.prd_id)
            .filter(|id| !self.by_id.contains_key(id))
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();
        if !missing.is_empty() {
            missing.sort_unstable();
            return Err(Self::validation_error(
                "unknown products in trade",
                vec![json!({ "missing_ids": missing })],
            ));
        }

        if let Some(line) = request.trade_lines.iter().find(|l| l.qty <= 0) {
            return Err(Self::validation_error(
                "qty must be positive",
                vec![json!({ "field": "qty", "prd_id": line.prd_id })],
            ));
        }

        let (total_amt, tax_amt) = request
            .trade_lines
            .iter()
            .filter_map(|line| {
                let product = self.by_id.get(&line.prd_id)?;
                Some(calculate_line_amounts(product.price, line.qty, product.tax_code()))
            })
            .fold((0, 0), |(total, tax), line| (total + line.total, tax + line.tax));

        let trade_id = self.next_trade_id.fetch_add(1, Ordering::SeqCst);
        debug!(trade_id, total_amt, tax_amt, "Offline trade recorded");

        Ok(TradeResponse {
            trade_id,
            total_amt,
            tax_amt,
            created_at: Utc::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scanpos_core::TradeLineRequest;

    const CATALOG: &str = r#"[
        {"prd_id": 1, "code": "4901234567894", "name": "Green Tea", "price": 150, "tax_cd": "8"},
        {"prd_id": 2, "code": "4987654321098", "name": "Batteries", "price": 333, "tax_cd": "10"}
    ]"#;

    fn request(lines: &[(i64, i64)]) -> TradeCreateRequest {
        TradeCreateRequest {
            emp_cd: "E001".into(),
            store_cd: "S001".into(),
            pos_no: "P01".into(),
            trade_lines: lines
                .iter()
                .map(|&(prd_id, qty)| TradeLineRequest { prd_id, qty })
                .collect(),
        }
    }

    #[tokio::test]
    async fn test_lookup() {
        let catalog = StaticCatalog::from_json(CATALOG).unwrap();
        assert_eq!(catalog.len(), 2);

        let product = catalog.get_product_by_code(" 4901234567894 ").await.unwrap();
        assert_eq!(product.name, "Green Tea");

        let err = catalog.get_product_by_code("4900000000000").await.unwrap_err();
        assert!(err.is_not_found());

        let err = catalog.get_product_by_code("abc").await.unwrap_err();
        assert!(matches!(err, ClientError::InvalidProductCode(_)));
    }

    #[tokio::test]
    async fn test_trade_is_priced_per_line() {
        let catalog = StaticCatalog::from_json(CATALOG).unwrap();

        // 150×2 @8% = 300 + 24; 333×3 @10% = 999 + 99
        let trade = catalog.create_trade(&request(&[(1, 2), (2, 3)])).await.unwrap();
        assert_eq!(trade.tax_amt, 24 + 99);
        assert_eq!(trade.total_amt, 324 + 1098);
        assert_eq!(trade.trade_id, 1);

        let next = catalog.create_trade(&request(&[(1, 1)])).await.unwrap();
        assert_eq!(next.trade_id, 2);
    }

    #[tokio::test]
    async fn test_trade_validation() {
        let catalog = StaticCatalog::from_json(CATALOG).unwrap();

        let err = catalog.create_trade(&request(&[])).await.unwrap_err();
        assert!(matches!(err, ClientError::Rejected { status: 400, .. }));

        match catalog.create_trade(&request(&[(1, 1), (9, 1)])).await.unwrap_err() {
            ClientError::Rejected { details, .. } => {
                assert_eq!(details.unwrap()[0]["missing_ids"], json!([9]));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("products.json");
        std::fs::write(&path, CATALOG).unwrap();
        assert_eq!(StaticCatalog::load(&path).unwrap().len(), 2);

        let err = StaticCatalog::load(&dir.path().join("missing.json")).err().unwrap();
        assert!(err.is_config_error());
    }

    #[test]
    fn test_bad_json() {
        let err = StaticCatalog::from_json("{").err().unwrap();
        assert!(err.is_config_error());
    }
}
