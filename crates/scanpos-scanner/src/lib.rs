//! # scanpos-scanner: Camera Barcode Scanning Engine for ScanPOS
//!
//! Opens the camera, proves the preview is painting real frames, polls those
//! frames for retail barcodes and reports each new payload exactly once.
//!
//! ## Pipeline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Scanner Pipeline                                 │
//! │                                                                         │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │                    ScannerController                             │  │
//! │  │  start(on_detect) / stop() / clear_last() / status()            │  │
//! │  │  generation token fences every async continuation               │  │
//! │  └────────────────────────────┬─────────────────────────────────────┘  │
//! │                               │                                         │
//! │         ┌─────────────────────┼─────────────────────┐                  │
//! │         ▼                     ▼                     ▼                   │
//! │  ┌────────────────┐  ┌────────────────┐  ┌────────────────────────┐    │
//! │  │ StreamAcquirer │  │VideoSinkCtrl   │  │      Decoder           │    │
//! │  │                │  │                │  │                        │    │
//! │  │ secure context │  │ autoplay attrs │  │ native detector, else  │    │
//! │  │ constraint     │  │ play()         │  │ rxing software decode  │    │
//! │  │ ladder         │  │ first frame    │  │ consecutive de-dup     │    │
//! │  └────────────────┘  └────────────────┘  └────────────────────────┘    │
//! │                                                                         │
//! │  Platform seams (platform.rs): CameraHost, MediaStream, MediaTrack,    │
//! │  VideoSurface, NativeBarcodeDetector                                   │
//! │  In-process host (virtual_camera.rs): still images, scripted failures │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```rust,no_run
//! use scanpos_scanner::virtual_camera::{FrameFeed, VirtualCameraHost};
//! use scanpos_scanner::{ScannerConfig, ScannerController};
//! use std::sync::Arc;
//!
//! # async fn demo() -> scanpos_scanner::ScanResult<()> {
//! let feed = FrameFeed::from_path("receipt.png".as_ref())?;
//! let host = VirtualCameraHost::with_feed(feed);
//! let scanner = ScannerController::new(ScannerConfig::default(), Arc::new(host.clone()));
//! scanner.attach_surface(host.create_surface());
//!
//! scanner.start(|code| println!("scanned {code}")).await?;
//! scanner.stop().await;
//! # Ok(())
//! # }
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod acquire;
pub mod config;
pub mod constraints;
pub mod controller;
pub mod decoder;
pub mod error;
pub mod platform;
pub mod sink;
pub mod virtual_camera;

// =============================================================================
// Re-exports
// =============================================================================

pub use acquire::{AcquiredStream, StreamAcquirer};
pub use config::{DetectionMode, ScannerConfig};
pub use constraints::{candidates_for, ConstraintCandidate, FacingMode, Orientation};
pub use controller::{DetectCallback, ScannerController, ScannerPhase, ScannerStatus};
pub use decoder::{DecoderKind, DetectionResult};
pub use error::{MediaError, ScanError, ScanResult};
pub use platform::{CameraHost, Symbology, VideoSurface};
pub use sink::{BoundSurface, VideoSinkController};
