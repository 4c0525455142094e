//! # Video Sink Controller
//!
//! Binds a stream to the video surface and returns only once the surface is
//! painting real frames.
//!
//! ## Bind Sequence
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  1. muted + playsInline + autoplay     (autoplay policies need these)   │
//! │  2. subscribe to surface events        (before attach: no lost events)  │
//! │  3. attach stream (srcObject = stream)                                  │
//! │  4. play()                             rejected ──► VideoSurfaceNotReady│
//! │  5. wait for FrameRendered w>0 && h>0  LoadedMetadata alone is ignored  │
//! │        │                               timeout ──► NoFramesTimeout      │
//! │        ▼                                                                │
//! │  6. mirror if the track is front-facing                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, trace};

use crate::constraints::FacingMode;
use crate::error::{ScanError, ScanResult};
use crate::platform::{MediaStream, PlaybackAttributes, SurfaceEvent, VideoSurface};

/// Dimensions of the first real frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundSurface {
    pub width: u32,
    pub height: u32,
    pub mirrored: bool,
}

pub struct VideoSinkController {
    frame_timeout: Duration,
}

impl VideoSinkController {
    pub fn new(frame_timeout: Duration) -> Self {
        VideoSinkController { frame_timeout }
    }

    /// Attaches `stream` to `surface` and waits for a decodable frame.
    ///
    /// The stream stays attached on failure; the caller owns teardown.
    pub async fn bind(
        &self,
        surface: &Arc<dyn VideoSurface>,
        stream: Arc<dyn MediaStream>,
    ) -> ScanResult<BoundSurface> {
        if !surface.is_mounted() {
            return Err(ScanError::VideoSurfaceNotReady(
                "video surface is not mounted".into(),
            ));
        }

        surface.apply_playback_attributes(PlaybackAttributes::AUTOPLAY_SAFE);
        let mut events = surface.subscribe();
        surface.attach_stream(stream.clone());

        surface
            .play()
            .await
            .map_err(|e| ScanError::VideoSurfaceNotReady(format!("playback rejected: {e}")))?;

        let wait_for_frame = async {
            loop {
                match events.recv().await {
                    Ok(SurfaceEvent::FrameRendered { width, height }) if width > 0 && height > 0 => {
                        return Ok((width, height));
                    }
                    Ok(SurfaceEvent::FrameRendered { .. }) => {
                        trace!("Ignoring empty frame");
                    }
                    Ok(SurfaceEvent::LoadedMetadata { width, height }) => {
                        debug!(width, height, "Video metadata loaded");
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        trace!(skipped, "Surface events lagged");
                    }
                    Err(RecvError::Closed) => {
                        return Err(ScanError::VideoSurfaceNotReady(
                            "video surface closed before rendering".into(),
                        ));
                    }
                }
            }
        };

        let (width, height) = tokio::time::timeout(self.frame_timeout, wait_for_frame)
            .await
            .map_err(|_| ScanError::NoFramesTimeout {
                timeout_ms: self.frame_timeout.as_millis() as u64,
            })??;

        let mirrored = stream
            .video_tracks()
            .first()
            .and_then(|track| track.settings().facing_mode)
            == Some(FacingMode::User);
        surface.set_mirrored(mirrored);

        debug!(width, height, mirrored, "Video surface producing frames");
        Ok(BoundSurface {
            width,
            height,
            mirrored,
        })
    }
}
