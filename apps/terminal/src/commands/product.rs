//! # Product Commands
//!
//! Scanning and looking up products.
//!
//! ## Product Search Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Product Search Flow                                  │
//! │                                                                         │
//! │  clear_last() ──► start(on_detect) ──► wait for first payload           │
//! │                                              │                          │
//! │                                              ▼                          │
//! │                                   catalog.get_product_by_code(code)     │
//! │                                     │ ok                 │ err          │
//! │                                     ▼                    ▼              │
//! │                           set_pending(product)      (cart untouched)    │
//! │                                     │                    │              │
//! │                                     └──────► stop() ◄────┘              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::time::Duration;

use scanpos_client::ProductCatalog;
use scanpos_core::Product;
use scanpos_scanner::ScannerController;
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::error::{ApiError, ErrorCode};
use crate::state::CartState;

/// Looks up a typed or scanned code.
pub async fn lookup_product(catalog: &dyn ProductCatalog, code: &str) -> Result<Product, ApiError> {
    let product = catalog.get_product_by_code(code).await?;
    debug!(code, prd_id = product.prd_id, "Product resolved");
    Ok(product)
}

/// Starts the scanner and returns the channel payloads arrive on.
async fn start_scanner(
    scanner: &ScannerController,
) -> Result<mpsc::UnboundedReceiver<String>, ApiError> {
    let (tx, rx) = mpsc::unbounded_channel();
    scanner.clear_last();
    scanner
        .start(move |code| {
            let _ = tx.send(code);
        })
        .await?;
    Ok(rx)
}

async fn first_code(
    rx: &mut mpsc::UnboundedReceiver<String>,
    timeout: Duration,
) -> Result<String, ApiError> {
    match tokio::time::timeout(timeout, rx.recv()).await {
        Ok(Some(code)) => Ok(code),
        Ok(None) => Err(ApiError::new(ErrorCode::ScannerError, "scanner stopped")),
        Err(_) => Err(ApiError::new(
            ErrorCode::ScannerError,
            format!("no barcode within {} s", timeout.as_secs()),
        )),
    }
}

/// Scans a single code. The scanner is stopped on return.
pub async fn scan_code(scanner: &ScannerController, timeout: Duration) -> Result<String, ApiError> {
    let mut rx = start_scanner(scanner).await?;
    let result = first_code(&mut rx, timeout).await;
    scanner.stop().await;
    result
}

/// Collects every code reported during `window`.
pub async fn scan_codes(
    scanner: &ScannerController,
    window: Duration,
) -> Result<Vec<String>, ApiError> {
    let mut rx = start_scanner(scanner).await?;
    let mut codes = Vec::new();

    let deadline = tokio::time::sleep(window);
    tokio::pin!(deadline);
    loop {
        tokio::select! {
            _ = &mut deadline => break,
            code = rx.recv() => match code {
                Some(code) => codes.push(code),
                None => break,
            },
        }
    }

    scanner.stop().await;
    while let Ok(code) = rx.try_recv() {
        codes.push(code);
    }
    Ok(codes)
}

/// Scan, look up, hold as pending. Scanning stops on every path.
pub async fn scan_product(
    scanner: &ScannerController,
    catalog: &dyn ProductCatalog,
    cart: &CartState,
    timeout: Duration,
) -> Result<Product, ApiError> {
    let mut rx = start_scanner(scanner).await?;

    let code = match first_code(&mut rx, timeout).await {
        Ok(code) => code,
        Err(e) => {
            scanner.stop().await;
            return Err(e);
        }
    };

    let looked_up = lookup_product(catalog, &code).await;
    scanner.stop().await;

    let product = looked_up?;
    info!(code = %code, name = %product.name, price = %product.price(), "Product scanned");
    cart.with_cart_mut(|c| c.set_pending(Some(product.clone())));
    Ok(product)
}
