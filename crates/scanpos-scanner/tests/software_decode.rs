//! Software decoder against rendered barcodes.

#![cfg(feature = "software-decoder")]

use std::sync::Arc;
use std::time::Duration;

use image::{Rgba, RgbaImage};
use rxing::{BarcodeFormat, MultiFormatWriter, Writer};
use scanpos_scanner::decoder::decode_image;
use scanpos_scanner::virtual_camera::{FrameFeed, VirtualCameraHost};
use scanpos_scanner::{DecoderKind, ScannerConfig, ScannerController, Symbology};

const EAN: &str = "4901234567894";

/// Renders `contents` with a white quiet zone around it.
fn render(contents: &str, format: BarcodeFormat, width: u32, height: u32) -> RgbaImage {
    let matrix = MultiFormatWriter::default()
        .encode(contents, &format, width as i32, height as i32)
        .unwrap();

    let pad = 40;
    let mut image = RgbaImage::from_pixel(
        matrix.getWidth() + pad * 2,
        matrix.getHeight() + pad * 2,
        Rgba([255, 255, 255, 255]),
    );
    for y in 0..matrix.getHeight() {
        for x in 0..matrix.getWidth() {
            if matrix.get(x, y) {
                image.put_pixel(x + pad, y + pad, Rgba([0, 0, 0, 255]));
            }
        }
    }
    image
}

#[test]
fn test_decodes_ean13() {
    let image = render(EAN, BarcodeFormat::EAN_13, 400, 160);
    let result = decode_image(&image, &Symbology::DEFAULT_FORMATS, 640).unwrap();
    assert_eq!(result.payload, EAN);
    assert_eq!(result.symbology, Some(Symbology::Ean13));
}

#[test]
fn test_decodes_code128() {
    let image = render("SKU-00042", BarcodeFormat::CODE_128, 480, 160);
    let result = decode_image(&image, &Symbology::DEFAULT_FORMATS, 640).unwrap();
    assert_eq!(result.payload, "SKU-00042");
    assert_eq!(result.symbology, Some(Symbology::Code128));
}

#[test]
fn test_large_frame_is_downscaled_and_still_decodes() {
    let image = render(EAN, BarcodeFormat::EAN_13, 1600, 600);
    assert!(image.width() > 640);
    let result = decode_image(&image, &Symbology::DEFAULT_FORMATS, 640).unwrap();
    assert_eq!(result.payload, EAN);
}

#[test]
fn test_format_outside_allow_list_is_ignored() {
    let image = render(EAN, BarcodeFormat::EAN_13, 400, 160);
    assert!(decode_image(&image, &[Symbology::Code128], 640).is_none());
}

#[test]
fn test_qr_in_same_frame_does_not_hide_ean() {
    let qr = render("https://example.com/promo", BarcodeFormat::QR_CODE, 200, 200);
    let ean = render(EAN, BarcodeFormat::EAN_13, 400, 160);

    let mut frame = RgbaImage::from_pixel(
        qr.width() + ean.width(),
        qr.height().max(ean.height()),
        Rgba([255, 255, 255, 255]),
    );
    image::imageops::overlay(&mut frame, &qr, 0, 0);
    image::imageops::overlay(&mut frame, &ean, qr.width() as i64, 0);

    let result = decode_image(&frame, &Symbology::DEFAULT_FORMATS, 1024).unwrap();
    assert_eq!(result.payload, EAN);
    assert_eq!(result.symbology, Some(Symbology::Ean13));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_scanner_reads_still_image_without_native_detector() {
    let feed = FrameFeed::new();
    feed.set(render(EAN, BarcodeFormat::EAN_13, 400, 160));
    let host = VirtualCameraHost::with_feed(feed);

    let scanner = ScannerController::new(ScannerConfig::default(), Arc::new(host.clone()));
    scanner.attach_surface(host.create_surface());

    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
    scanner
        .start(move |code| {
            let _ = tx.send(code);
        })
        .await
        .unwrap();
    assert_eq!(scanner.status().decoder, Some(DecoderKind::Software));

    let code = tokio::time::timeout(Duration::from_secs(10), rx.recv())
        .await
        .unwrap();
    assert_eq!(code.as_deref(), Some(EAN));
    assert!(!scanner.is_scanning());
    assert_eq!(host.live_track_count(), 0);
}
