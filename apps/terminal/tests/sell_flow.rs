//! Scan → lookup → cart → purchase, against the virtual camera and an
//! offline catalog.

use std::sync::Arc;
use std::time::Duration;

use scanpos_client::StaticCatalog;
use scanpos_scanner::virtual_camera::{ScriptedDetector, VirtualCameraHost, VirtualDevice};
use scanpos_scanner::{DetectionMode, ScannerConfig, ScannerController};
use scanpos_terminal::commands::{cart, product, trade};
use scanpos_terminal::error::ErrorCode;
use scanpos_terminal::state::{CartState, TerminalConfig};

const CATALOG: &str = r#"[
    {"prd_id": 1, "code": "4901234567894", "name": "Green Tea", "price": 150, "tax_cd": "8"},
    {"prd_id": 2, "code": "4987654321098", "name": "Batteries", "price": 333, "tax_cd": "10"}
]"#;

struct Terminal {
    host: VirtualCameraHost,
    detector: Arc<ScriptedDetector>,
    scanner: ScannerController,
    catalog: StaticCatalog,
    cart: CartState,
}

fn terminal(mode: DetectionMode) -> Terminal {
    let detector = Arc::new(ScriptedDetector::new(Vec::<Option<&str>>::new()));
    let host = VirtualCameraHost::builder()
        .device(VirtualDevice::rear("rear-0"))
        .native_detector(detector.clone())
        .build();
    host.feed().set(image::RgbaImage::new(16, 16));

    let config = ScannerConfig {
        detection_mode: mode,
        ..ScannerConfig::default()
    };
    let scanner = ScannerController::new(config, Arc::new(host.clone()));
    scanner.attach_surface(host.create_surface());

    Terminal {
        host,
        detector,
        scanner,
        catalog: StaticCatalog::from_json(CATALOG).unwrap(),
        cart: CartState::new(),
    }
}

const TIMEOUT: Duration = Duration::from_secs(5);

#[tokio::test(start_paused = true)]
async fn test_scan_two_products_and_purchase() {
    let t = terminal(DetectionMode::SingleShot);

    t.detector.push("4901234567894");
    let tea = product::scan_product(&t.scanner, &t.catalog, &t.cart, TIMEOUT)
        .await
        .unwrap();
    assert_eq!(tea.name, "Green Tea");
    assert_eq!(t.host.live_track_count(), 0);
    cart::add_pending(&t.cart).unwrap();

    t.detector.push("4987654321098");
    product::scan_product(&t.scanner, &t.catalog, &t.cart, TIMEOUT)
        .await
        .unwrap();
    let snapshot = cart::add_pending(&t.cart).unwrap();
    let batteries = snapshot.items[1].id.clone();
    let snapshot = cart::update_quantity(&t.cart, &batteries, 3).unwrap();

    // 150 @8% = 150 + 12; 333×3 @10% = 999 + 99
    assert_eq!(snapshot.totals.tax8, 12);
    assert_eq!(snapshot.totals.tax10, 99);
    assert_eq!(snapshot.totals.total, 162 + 1098);
    assert!(snapshot.pending.is_none());

    let receipt = snapshot.render();
    assert!(receipt.contains("Green Tea"));
    assert!(receipt.contains("¥1,260"));

    let done = trade::submit_trade(&t.cart, &t.catalog, &TerminalConfig::default())
        .await
        .unwrap();
    assert_eq!(done.total_amt, 1260);
    assert_eq!(done.tax_amt, 111);
    assert!(cart::get_cart(&t.cart).items.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_unregistered_code_leaves_cart_untouched() {
    let t = terminal(DetectionMode::SingleShot);

    t.detector.push("4900000000000");
    let err = product::scan_product(&t.scanner, &t.catalog, &t.cart, TIMEOUT)
        .await
        .unwrap_err();

    assert_eq!(err.code, ErrorCode::NotFound);
    assert!(cart::get_cart(&t.cart).pending.is_none());
    assert!(!t.scanner.is_scanning());
    assert_eq!(t.host.live_track_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_scan_timeout_releases_camera() {
    let t = terminal(DetectionMode::SingleShot);

    let err = product::scan_code(&t.scanner, Duration::from_millis(500))
        .await
        .unwrap_err();

    assert_eq!(err.code, ErrorCode::ScannerError);
    assert!(!t.scanner.is_scanning());
    assert_eq!(t.host.live_track_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_continuous_scan_collects_distinct_codes() {
    let t = terminal(DetectionMode::Continuous);
    for code in ["4901234567894", "4901234567894", "4987654321098"] {
        t.detector.push(code);
    }

    let codes = product::scan_codes(&t.scanner, Duration::from_secs(1)).await.unwrap();

    assert_eq!(codes, vec!["4901234567894", "4987654321098"]);
    assert_eq!(t.host.live_track_count(), 0);
}

#[tokio::test]
async fn test_empty_cart_purchase_is_rejected() {
    let catalog = StaticCatalog::from_json(CATALOG).unwrap();
    let err = trade::submit_trade(&CartState::new(), &catalog, &TerminalConfig::default())
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::CartError);
}
