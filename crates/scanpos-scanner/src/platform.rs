//! # Platform Seams
//!
//! Traits the scanner drives to reach the camera, the video surface and an
//! optional platform barcode detector.
//!
//! ## Mapping onto a browser host
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Trait                    Browser counterpart                           │
//! │  ───────────────────────  ───────────────────────────────────────────   │
//! │  CameraHost               window.isSecureContext, navigator.mediaDevices│
//! │                           navigator.permissions, BarcodeDetector        │
//! │  MediaStream / MediaTrack MediaStream / MediaStreamTrack                │
//! │  VideoSurface             <video> element (srcObject, play, events)     │
//! │  NativeBarcodeDetector    BarcodeDetector.detect(video)                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! [`VirtualCameraHost`](crate::virtual_camera::VirtualCameraHost) implements
//! every trait in-process.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use image::RgbaImage;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::constraints::{ConstraintCandidate, FacingMode};
use crate::error::{MediaError, ScanError};

// =============================================================================
// Symbology
// =============================================================================

/// Barcode encoding standard.
///
/// Names follow the `BarcodeDetector` format strings so a config file can
/// list them verbatim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Symbology {
    #[serde(rename = "ean_13")]
    Ean13,
    #[serde(rename = "ean_8")]
    Ean8,
    #[serde(rename = "code_128")]
    Code128,
    #[serde(rename = "upc_a")]
    UpcA,
    #[serde(rename = "upc_e")]
    UpcE,
    #[serde(rename = "code_39")]
    Code39,
    #[serde(rename = "itf")]
    Itf,
    #[serde(rename = "qr_code")]
    QrCode,
}

impl Symbology {
    /// The retail allow-list scanned by default.
    pub const DEFAULT_FORMATS: [Symbology; 3] =
        [Symbology::Ean13, Symbology::Ean8, Symbology::Code128];

    pub const fn as_str(&self) -> &'static str {
        match self {
            Symbology::Ean13 => "ean_13",
            Symbology::Ean8 => "ean_8",
            Symbology::Code128 => "code_128",
            Symbology::UpcA => "upc_a",
            Symbology::UpcE => "upc_e",
            Symbology::Code39 => "code_39",
            Symbology::Itf => "itf",
            Symbology::QrCode => "qr_code",
        }
    }
}

impl fmt::Display for Symbology {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Symbology {
    type Err = ScanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "ean_13" | "ean13" => Ok(Symbology::Ean13),
            "ean_8" | "ean8" => Ok(Symbology::Ean8),
            "code_128" | "code128" => Ok(Symbology::Code128),
            "upc_a" | "upca" => Ok(Symbology::UpcA),
            "upc_e" | "upce" => Ok(Symbology::UpcE),
            "code_39" | "code39" => Ok(Symbology::Code39),
            "itf" => Ok(Symbology::Itf),
            "qr_code" | "qr" => Ok(Symbology::QrCode),
            other => Err(ScanError::InvalidConfig(format!(
                "Unknown barcode format: '{}'",
                other
            ))),
        }
    }
}

// =============================================================================
// Media Types
// =============================================================================

/// Answer of the optional permissions API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionState {
    Granted,
    Denied,
    Prompt,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackKind {
    Video,
    Audio,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackState {
    Live,
    Ended,
}

/// Settings the platform actually applied to a track.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrackSettings {
    pub device_id: Option<String>,
    pub facing_mode: Option<FacingMode>,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

/// One decoded RGBA frame grabbed from the surface.
#[derive(Debug, Clone)]
pub struct VideoFrame {
    image: Arc<RgbaImage>,
}

impl VideoFrame {
    pub fn new(image: Arc<RgbaImage>) -> Self {
        VideoFrame { image }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }
}

/// Events a video surface reports after a stream is attached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceEvent {
    /// Dimensions are known; real frames may still be missing.
    LoadedMetadata { width: u32, height: u32 },
    /// A frame was painted.
    FrameRendered { width: u32, height: u32 },
}

/// Attributes that let playback start without a user gesture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaybackAttributes {
    pub muted: bool,
    pub plays_inline: bool,
    pub autoplay: bool,
}

impl PlaybackAttributes {
    /// muted + inline + autoplay.
    pub const AUTOPLAY_SAFE: PlaybackAttributes = PlaybackAttributes {
        muted: true,
        plays_inline: true,
        autoplay: true,
    };
}

/// A barcode returned by a native detector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetectedBarcode {
    pub raw_value: String,
    pub format: Symbology,
}

// =============================================================================
// Traits
// =============================================================================

pub trait MediaTrack: Send + Sync {
    fn id(&self) -> &str;
    fn kind(&self) -> TrackKind;
    fn label(&self) -> String;
    fn settings(&self) -> TrackSettings;
    fn ready_state(&self) -> TrackState;
    /// Releases the device. Idempotent.
    fn stop(&self);
}

pub trait MediaStream: Send + Sync {
    fn id(&self) -> &str;
    fn tracks(&self) -> Vec<Arc<dyn MediaTrack>>;

    fn video_tracks(&self) -> Vec<Arc<dyn MediaTrack>> {
        self.tracks()
            .into_iter()
            .filter(|track| track.kind() == TrackKind::Video)
            .collect()
    }

    /// Stops every track of the stream.
    fn stop_all(&self) {
        for track in self.tracks() {
            track.stop();
        }
    }
}

/// Renderable surface the stream is bound to (a `<video>` element).
#[async_trait]
pub trait VideoSurface: Send + Sync {
    /// False once the owning view has been torn down.
    fn is_mounted(&self) -> bool;

    fn apply_playback_attributes(&self, attrs: PlaybackAttributes);

    fn attach_stream(&self, stream: Arc<dyn MediaStream>);

    fn detach_stream(&self);

    /// Id of the stream currently attached, if any.
    fn attached_stream_id(&self) -> Option<String>;

    /// Starts playback. Autoplay policies may reject this.
    async fn play(&self) -> Result<(), MediaError>;

    fn pause(&self);

    fn is_paused(&self) -> bool;

    /// Subscribes to metadata / frame events.
    fn subscribe(&self) -> broadcast::Receiver<SurfaceEvent>;

    fn set_mirrored(&self, mirrored: bool);

    fn is_mirrored(&self) -> bool;

    /// The frame currently on screen, if any.
    fn current_frame(&self) -> Option<VideoFrame>;
}

#[async_trait]
pub trait NativeBarcodeDetector: Send + Sync {
    async fn detect(&self, frame: &VideoFrame) -> Result<Vec<DetectedBarcode>, MediaError>;
}

/// Entry point to the host's camera facilities.
#[async_trait]
pub trait CameraHost: Send + Sync {
    /// HTTPS or localhost.
    fn is_secure_context(&self) -> bool;

    /// Whether a media-device API exists at all.
    fn supports_user_media(&self) -> bool {
        true
    }

    /// Queries the optional permissions API.
    async fn query_camera_permission(&self) -> Result<PermissionState, MediaError>;

    async fn get_user_media(
        &self,
        constraints: &ConstraintCandidate,
    ) -> Result<Arc<dyn MediaStream>, MediaError>;

    /// Capability check for a platform detector supporting `formats`.
    fn native_detector(&self, formats: &[Symbology]) -> Option<Arc<dyn NativeBarcodeDetector>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_symbology_parsing() {
        assert_eq!("ean_13".parse::<Symbology>().unwrap(), Symbology::Ean13);
        assert_eq!("EAN-8".parse::<Symbology>().unwrap(), Symbology::Ean8);
        assert_eq!("code128".parse::<Symbology>().unwrap(), Symbology::Code128);
        assert!("pdf417".parse::<Symbology>().is_err());
    }

    #[test]
    fn test_symbology_serde_names() {
        let json = serde_json::to_string(&Symbology::DEFAULT_FORMATS).unwrap();
        assert_eq!(json, r#"["ean_13","ean_8","code_128"]"#);
    }
}
