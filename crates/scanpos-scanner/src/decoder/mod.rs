//! # Decoder
//!
//! Polls the video surface for barcodes.
//!
//! ## Selection Policy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │            select_decoder()  (once per session, never per frame)        │
//! │                                                                         │
//! │  prefer_native && host.native_detector(formats) ──Some──► NativeDecoder │
//! │        │ None                                                           │
//! │        ▼                                                                │
//! │  feature "software-decoder" ──on──► SoftwareDecoder (rxing)             │
//! │        │ off                                                            │
//! │        ▼                                                                │
//! │  DecoderUnavailable                                                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A frame with no barcode yields `None`. That is the steady state, not an
//! error.

mod dedup;
mod native;
#[cfg(feature = "software-decoder")]
mod software;

pub use dedup::Deduplicator;
pub use native::NativeDecoder;
#[cfg(feature = "software-decoder")]
pub use software::{decode_image, SoftwareDecoder};

use async_trait::async_trait;
use tracing::{debug, info};

use crate::config::ScannerConfig;
use crate::error::ScanResult;
use crate::platform::{CameraHost, Symbology, VideoSurface};

/// A decoded payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetectionResult {
    pub payload: String,
    pub symbology: Option<Symbology>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecoderKind {
    Native,
    Software,
}

/// One decoding strategy, owned by a single scan session.
#[async_trait]
pub trait Decoder: Send {
    fn kind(&self) -> DecoderKind;

    /// Inspects the current frame. `None` when nothing was found.
    async fn poll_once(&mut self, surface: &dyn VideoSurface) -> Option<DetectionResult>;
}

/// Picks the decoder for a new session.
pub fn select_decoder(
    host: &dyn CameraHost,
    config: &ScannerConfig,
) -> ScanResult<Box<dyn Decoder>> {
    if config.prefer_native {
        if let Some(detector) = host.native_detector(&config.formats) {
            info!("Using native barcode detector");
            return Ok(Box::new(NativeDecoder::new(detector, config.formats.clone())));
        }
        debug!("No native barcode detector on this host");
    }

    software_fallback(config)
}

#[cfg(feature = "software-decoder")]
fn software_fallback(config: &ScannerConfig) -> ScanResult<Box<dyn Decoder>> {
    info!("Using software barcode decoder");
    Ok(Box::new(SoftwareDecoder::new(
        config.formats.clone(),
        config.software_max_dimension,
    )))
}

#[cfg(not(feature = "software-decoder"))]
fn software_fallback(_config: &ScannerConfig) -> ScanResult<Box<dyn Decoder>> {
    Err(crate::error::ScanError::DecoderUnavailable)
}
