//! Fast path: the host's own barcode detector.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::trace;

use super::{Decoder, DecoderKind, DetectionResult};
use crate::platform::{NativeBarcodeDetector, Symbology, VideoSurface};

pub struct NativeDecoder {
    detector: Arc<dyn NativeBarcodeDetector>,
    formats: Vec<Symbology>,
}

impl NativeDecoder {
    pub fn new(detector: Arc<dyn NativeBarcodeDetector>, formats: Vec<Symbology>) -> Self {
        NativeDecoder { detector, formats }
    }
}

#[async_trait]
impl Decoder for NativeDecoder {
    fn kind(&self) -> DecoderKind {
        DecoderKind::Native
    }

    async fn poll_once(&mut self, surface: &dyn VideoSurface) -> Option<DetectionResult> {
        let frame = surface.current_frame()?;

        let barcodes = match self.detector.detect(&frame).await {
            Ok(barcodes) => barcodes,
            Err(e) => {
                trace!(error = %e, "Native detect failed for this frame");
                return None;
            }
        };

        barcodes
            .into_iter()
            .find(|b| !b.raw_value.is_empty() && self.formats.contains(&b.format))
            .map(|b| DetectionResult {
                payload: b.raw_value,
                symbology: Some(b.format),
            })
    }
}
