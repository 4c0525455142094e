//! Software fallback decoder backed by rxing.
//!
//! Frames are converted to grayscale and downscaled before decoding; the
//! decode itself runs on the blocking pool so the frame cadence is never
//! held up by a slow frame.

use std::collections::{HashMap, HashSet};
use std::time::Instant;

use async_trait::async_trait;
use image::imageops::{self, FilterType};
use image::{GrayImage, RgbaImage};
use rxing::{BarcodeFormat, DecodeHintType, DecodeHintValue, DecodingHintDictionary};
use tracing::{trace, warn};

use super::{Decoder, DecoderKind, DetectionResult};
use crate::platform::{Symbology, VideoSurface};

/// Decoder instance scoped to one scan session.
pub struct SoftwareDecoder {
    formats: Vec<Symbology>,
    max_dimension: u32,
}

impl SoftwareDecoder {
    pub fn new(formats: Vec<Symbology>, max_dimension: u32) -> Self {
        SoftwareDecoder {
            formats,
            max_dimension,
        }
    }
}

#[async_trait]
impl Decoder for SoftwareDecoder {
    fn kind(&self) -> DecoderKind {
        DecoderKind::Software
    }

    async fn poll_once(&mut self, surface: &dyn VideoSurface) -> Option<DetectionResult> {
        let frame = surface.current_frame()?;
        let formats = self.formats.clone();
        let max_dimension = self.max_dimension;

        tokio::task::spawn_blocking(move || decode_image(frame.image(), &formats, max_dimension))
            .await
            .unwrap_or_else(|e| {
                warn!(error = %e, "Barcode decode task panicked");
                None
            })
    }
}

/// Decodes a still RGBA image. `None` when no allowed barcode is found.
pub fn decode_image(
    image: &RgbaImage,
    formats: &[Symbology],
    max_dimension: u32,
) -> Option<DetectionResult> {
    let start = Instant::now();
    let gray = prepare_luma(image, max_dimension);
    let (width, height) = gray.dimensions();
    let mut hints = decode_hints(formats);

    let result = match rxing::helpers::detect_in_luma_with_hints(
        gray.into_raw(),
        width,
        height,
        None,
        &mut hints,
    ) {
        Ok(result) => result,
        Err(e) => {
            trace!(
                width,
                height,
                elapsed_ms = start.elapsed().as_millis(),
                error = %e,
                "No barcode in frame"
            );
            return None;
        }
    };

    let symbology = symbology_of(result.getBarcodeFormat())?;
    if !formats.contains(&symbology) {
        trace!(%symbology, "Ignoring barcode outside allow-list");
        return None;
    }

    let payload = result.getText().to_string();
    if payload.is_empty() {
        return None;
    }

    trace!(
        %symbology,
        elapsed_ms = start.elapsed().as_millis(),
        "Software decoder found barcode"
    );
    Some(DetectionResult {
        payload,
        symbology: Some(symbology),
    })
}

/// Restricts rxing to the allowed symbologies so an off-list code in the
/// same frame cannot shadow an allowed one.
fn decode_hints(formats: &[Symbology]) -> DecodingHintDictionary {
    let possible: HashSet<BarcodeFormat> = formats.iter().copied().map(format_of).collect();

    let mut hints = HashMap::new();
    hints.insert(
        DecodeHintType::POSSIBLE_FORMATS,
        DecodeHintValue::PossibleFormats(possible),
    );
    hints.insert(DecodeHintType::TRY_HARDER, DecodeHintValue::TryHarder(true));
    hints
}

/// Grayscale, then shrink so the longer side is at most `max_dimension`.
fn prepare_luma(image: &RgbaImage, max_dimension: u32) -> GrayImage {
    let gray = imageops::grayscale(image);
    let (width, height) = gray.dimensions();

    if width <= max_dimension && height <= max_dimension {
        return gray;
    }

    let scale = (width as f32 / max_dimension as f32).max(height as f32 / max_dimension as f32);
    let new_width = ((width as f32 / scale) as u32).max(1);
    let new_height = ((height as f32 / scale) as u32).max(1);
    imageops::resize(&gray, new_width, new_height, FilterType::Triangle)
}

fn format_of(symbology: Symbology) -> BarcodeFormat {
    match symbology {
        Symbology::Ean13 => BarcodeFormat::EAN_13,
        Symbology::Ean8 => BarcodeFormat::EAN_8,
        Symbology::Code128 => BarcodeFormat::CODE_128,
        Symbology::UpcA => BarcodeFormat::UPC_A,
        Symbology::UpcE => BarcodeFormat::UPC_E,
        Symbology::Code39 => BarcodeFormat::CODE_39,
        Symbology::Itf => BarcodeFormat::ITF,
        Symbology::QrCode => BarcodeFormat::QR_CODE,
    }
}

fn symbology_of(format: &BarcodeFormat) -> Option<Symbology> {
    match format {
        BarcodeFormat::EAN_13 => Some(Symbology::Ean13),
        BarcodeFormat::EAN_8 => Some(Symbology::Ean8),
        BarcodeFormat::CODE_128 => Some(Symbology::Code128),
        BarcodeFormat::UPC_A => Some(Symbology::UpcA),
        BarcodeFormat::UPC_E => Some(Symbology::UpcE),
        BarcodeFormat::CODE_39 => Some(Symbology::Code39),
        BarcodeFormat::ITF => Some(Symbology::Itf),
        BarcodeFormat::QR_CODE => Some(Symbology::QrCode),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn test_blank_frame_is_not_an_error() {
        let blank = RgbaImage::from_pixel(320, 240, Rgba([255, 255, 255, 255]));
        assert!(decode_image(&blank, &Symbology::DEFAULT_FORMATS, 640).is_none());
    }

    #[test]
    fn test_hints_follow_allow_list() {
        let hints = decode_hints(&[Symbology::Ean13, Symbology::Code128]);
        match hints.get(&DecodeHintType::POSSIBLE_FORMATS) {
            Some(DecodeHintValue::PossibleFormats(formats)) => {
                assert_eq!(formats.len(), 2);
                assert!(formats.contains(&BarcodeFormat::EAN_13));
                assert!(formats.contains(&BarcodeFormat::CODE_128));
                assert!(!formats.contains(&BarcodeFormat::QR_CODE));
            }
            _ => panic!("POSSIBLE_FORMATS hint missing"),
        }
    }

    #[test]
    fn test_prepare_luma_downscales_long_side() {
        let big = RgbaImage::from_pixel(1280, 720, Rgba([0, 0, 0, 255]));
        let gray = prepare_luma(&big, 640);
        assert_eq!(gray.dimensions(), (640, 360));

        let small = RgbaImage::from_pixel(320, 240, Rgba([0, 0, 0, 255]));
        assert_eq!(prepare_luma(&small, 640).dimensions(), (320, 240));
    }
}
