//! # Virtual Camera
//!
//! In-process [`CameraHost`] whose "camera" shows a still image (or nothing).
//! Used by the terminal to scan image files and by the test suite to script
//! hostile environments: insecure origins, denied permission, missing rear
//! cameras, streams that never paint a frame, slow devices.
//!
//! ```rust
//! use scanpos_scanner::virtual_camera::{VirtualCameraHost, VirtualDevice};
//!
//! let host = VirtualCameraHost::builder()
//!     .device(VirtualDevice::rear("rear-0"))
//!     .build();
//! assert_eq!(host.live_track_count(), 0);
//! ```

use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use image::RgbaImage;
use tokio::sync::broadcast;
use tracing::debug;
use uuid::Uuid;

use crate::constraints::{ConstraintCandidate, FacingMode, Requirement};
use crate::error::{MediaError, ScanError, ScanResult};
use crate::platform::{
    CameraHost, DetectedBarcode, MediaStream, MediaTrack, NativeBarcodeDetector,
    PermissionState, PlaybackAttributes, SurfaceEvent, Symbology, TrackKind, TrackSettings,
    TrackState, VideoFrame, VideoSurface,
};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

// =============================================================================
// Frame Feed
// =============================================================================

/// The image every virtual camera currently "sees".
#[derive(Clone, Default)]
pub struct FrameFeed {
    frame: Arc<RwLock<Option<Arc<RgbaImage>>>>,
}

impl FrameFeed {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads a still image from disk.
    pub fn from_path(path: &Path) -> ScanResult<Self> {
        let feed = Self::new();
        feed.load(path)?;
        Ok(feed)
    }

    pub fn load(&self, path: &Path) -> ScanResult<()> {
        let image = image::open(path)
            .map_err(|e| ScanError::CameraUnavailable {
                reason: format!("cannot read image {}: {}", path.display(), e),
                constraint: None,
            })?
            .to_rgba8();
        self.set(image);
        Ok(())
    }

    pub fn set(&self, image: RgbaImage) {
        if let Ok(mut frame) = self.frame.write() {
            *frame = Some(Arc::new(image));
        }
    }

    pub fn clear(&self) {
        if let Ok(mut frame) = self.frame.write() {
            *frame = None;
        }
    }

    fn current(&self) -> Option<Arc<RgbaImage>> {
        self.frame.read().ok().and_then(|frame| frame.clone())
    }
}

// =============================================================================
// Devices, Tracks, Streams
// =============================================================================

/// A camera attached to the virtual host.
#[derive(Debug, Clone)]
pub struct VirtualDevice {
    pub id: String,
    pub facing: FacingMode,
    /// False simulates a device that opens but never paints a frame.
    pub renders: bool,
    pub width: u32,
    pub height: u32,
}

impl VirtualDevice {
    pub fn rear(id: &str) -> Self {
        VirtualDevice {
            id: id.to_string(),
            facing: FacingMode::Environment,
            renders: true,
            width: 1280,
            height: 720,
        }
    }

    pub fn front(id: &str) -> Self {
        VirtualDevice {
            facing: FacingMode::User,
            ..Self::rear(id)
        }
    }

    pub fn without_frames(mut self) -> Self {
        self.renders = false;
        self
    }
}

struct VirtualTrack {
    id: String,
    device: VirtualDevice,
    live: AtomicBool,
}

impl MediaTrack for VirtualTrack {
    fn id(&self) -> &str {
        &self.id
    }

    fn kind(&self) -> TrackKind {
        TrackKind::Video
    }

    fn label(&self) -> String {
        format!("virtual camera {}", self.device.id)
    }

    fn settings(&self) -> TrackSettings {
        TrackSettings {
            device_id: Some(self.device.id.clone()),
            facing_mode: Some(self.device.facing),
            width: Some(self.device.width),
            height: Some(self.device.height),
        }
    }

    fn ready_state(&self) -> TrackState {
        if self.live.load(Ordering::SeqCst) {
            TrackState::Live
        } else {
            TrackState::Ended
        }
    }

    fn stop(&self) {
        if self.live.swap(false, Ordering::SeqCst) {
            debug!(track = %self.id, "Virtual track stopped");
        }
    }
}

struct VirtualStream {
    id: String,
    track: Arc<VirtualTrack>,
}

impl VirtualStream {
    fn is_live(&self) -> bool {
        self.track.ready_state() == TrackState::Live
    }

    fn renders(&self) -> bool {
        self.track.device.renders
    }
}

impl MediaStream for VirtualStream {
    fn id(&self) -> &str {
        &self.id
    }

    fn tracks(&self) -> Vec<Arc<dyn MediaTrack>> {
        vec![self.track.clone()]
    }
}

// =============================================================================
// Host
// =============================================================================

struct HostState {
    secure: bool,
    media_api: bool,
    permission: Option<PermissionState>,
    devices: Vec<VirtualDevice>,
    rejections: HashMap<&'static str, MediaError>,
    acquire_delay: Duration,
    detector: Option<Arc<dyn NativeBarcodeDetector>>,
    feed: FrameFeed,
    /// Streams that may still be live; ended ones are pruned on the next
    /// acquisition.
    streams: Mutex<HashMap<String, Arc<VirtualStream>>>,
    issued: AtomicUsize,
    requests: Mutex<Vec<&'static str>>,
}

/// In-process camera host.
#[derive(Clone)]
pub struct VirtualCameraHost {
    state: Arc<HostState>,
}

impl VirtualCameraHost {
    pub fn builder() -> VirtualCameraBuilder {
        VirtualCameraBuilder::default()
    }

    /// A secure host with one rear camera looking at `feed`.
    pub fn with_feed(feed: FrameFeed) -> Self {
        Self::builder()
            .device(VirtualDevice::rear("rear-0"))
            .feed(feed)
            .build()
    }

    pub fn feed(&self) -> &FrameFeed {
        &self.state.feed
    }

    /// A fresh `<video>`-like surface bound to this host.
    pub fn create_surface(&self) -> Arc<VirtualSurface> {
        Arc::new(VirtualSurface::new(self.state.clone()))
    }

    /// Tracks not yet stopped, across every stream ever issued.
    pub fn live_track_count(&self) -> usize {
        lock(&self.state.streams)
            .values()
            .filter(|s| s.is_live())
            .count()
    }

    /// Streams issued so far.
    pub fn issued_stream_count(&self) -> usize {
        self.state.issued.load(Ordering::SeqCst)
    }

    /// Candidate labels requested, in order.
    pub fn requested_candidates(&self) -> Vec<&'static str> {
        lock(&self.state.requests).clone()
    }

    fn pick_device(&self, candidate: &ConstraintCandidate) -> Result<VirtualDevice, MediaError> {
        let devices = &self.state.devices;
        if devices.is_empty() {
            return Err(MediaError::NotFound("Requested device not found".into()));
        }

        let Some(facing) = candidate.facing else {
            return Ok(devices[0].clone());
        };

        let matching = devices.iter().find(|d| d.facing == facing.mode);
        match (matching, facing.requirement) {
            (Some(device), _) => Ok(device.clone()),
            (None, Requirement::Ideal) => Ok(devices[0].clone()),
            (None, Requirement::Exact) => Err(MediaError::Overconstrained(format!(
                "no {} camera",
                facing.mode.as_str()
            ))),
        }
    }
}

#[async_trait]
impl CameraHost for VirtualCameraHost {
    fn is_secure_context(&self) -> bool {
        self.state.secure
    }

    fn supports_user_media(&self) -> bool {
        self.state.media_api
    }

    async fn query_camera_permission(&self) -> Result<PermissionState, MediaError> {
        self.state
            .permission
            .ok_or_else(|| MediaError::Unsupported("permissions API not available".into()))
    }

    async fn get_user_media(
        &self,
        constraints: &ConstraintCandidate,
    ) -> Result<Arc<dyn MediaStream>, MediaError> {
        lock(&self.state.requests).push(constraints.label);

        if !self.state.acquire_delay.is_zero() {
            tokio::time::sleep(self.state.acquire_delay).await;
        }

        if let Some(err) = self.state.rejections.get(constraints.label) {
            return Err(err.clone());
        }
        if self.state.permission == Some(PermissionState::Denied) {
            return Err(MediaError::NotAllowed("Permission denied".into()));
        }

        let device = self.pick_device(constraints)?;
        let track = Arc::new(VirtualTrack {
            id: Uuid::new_v4().to_string(),
            device,
            live: AtomicBool::new(true),
        });
        let stream = Arc::new(VirtualStream {
            id: Uuid::new_v4().to_string(),
            track,
        });

        let mut streams = lock(&self.state.streams);
        streams.retain(|_, s| s.is_live());
        streams.insert(stream.id.clone(), stream.clone());
        self.state.issued.fetch_add(1, Ordering::SeqCst);
        Ok(stream)
    }

    fn native_detector(&self, formats: &[Symbology]) -> Option<Arc<dyn NativeBarcodeDetector>> {
        if formats.is_empty() {
            return None;
        }
        self.state.detector.clone()
    }
}

/// Builder for [`VirtualCameraHost`].
pub struct VirtualCameraBuilder {
    secure: bool,
    media_api: bool,
    permission: Option<PermissionState>,
    devices: Vec<VirtualDevice>,
    rejections: HashMap<&'static str, MediaError>,
    acquire_delay: Duration,
    detector: Option<Arc<dyn NativeBarcodeDetector>>,
    feed: FrameFeed,
}

impl Default for VirtualCameraBuilder {
    fn default() -> Self {
        VirtualCameraBuilder {
            secure: true,
            media_api: true,
            permission: Some(PermissionState::Granted),
            devices: Vec::new(),
            rejections: HashMap::new(),
            acquire_delay: Duration::ZERO,
            detector: None,
            feed: FrameFeed::new(),
        }
    }
}

impl VirtualCameraBuilder {
    /// Plain-HTTP origin.
    pub fn insecure(mut self) -> Self {
        self.secure = false;
        self
    }

    pub fn without_media_api(mut self) -> Self {
        self.media_api = false;
        self
    }

    /// `None` simulates a host without the permissions API.
    pub fn permission(mut self, permission: Option<PermissionState>) -> Self {
        self.permission = permission;
        self
    }

    pub fn device(mut self, device: VirtualDevice) -> Self {
        self.devices.push(device);
        self
    }

    /// Fails every request for the candidate labelled `label`.
    pub fn reject(mut self, label: &'static str, error: MediaError) -> Self {
        self.rejections.insert(label, error);
        self
    }

    pub fn acquire_delay(mut self, delay: Duration) -> Self {
        self.acquire_delay = delay;
        self
    }

    pub fn native_detector(mut self, detector: Arc<dyn NativeBarcodeDetector>) -> Self {
        self.detector = Some(detector);
        self
    }

    pub fn feed(mut self, feed: FrameFeed) -> Self {
        self.feed = feed;
        self
    }

    pub fn build(self) -> VirtualCameraHost {
        VirtualCameraHost {
            state: Arc::new(HostState {
                secure: self.secure,
                media_api: self.media_api,
                permission: self.permission,
                devices: self.devices,
                rejections: self.rejections,
                acquire_delay: self.acquire_delay,
                detector: self.detector,
                feed: self.feed,
                streams: Mutex::new(HashMap::new()),
                issued: AtomicUsize::new(0),
                requests: Mutex::new(Vec::new()),
            }),
        }
    }
}

// =============================================================================
// Surface
// =============================================================================

#[derive(Default)]
struct SurfaceState {
    attrs: Option<PlaybackAttributes>,
    attached: Option<Arc<VirtualStream>>,
    playing: bool,
    mirrored: bool,
}

/// In-process video surface.
pub struct VirtualSurface {
    host: Arc<HostState>,
    mounted: AtomicBool,
    state: Mutex<SurfaceState>,
    events: broadcast::Sender<SurfaceEvent>,
}

impl VirtualSurface {
    fn new(host: Arc<HostState>) -> Self {
        let (events, _) = broadcast::channel(16);
        VirtualSurface {
            host,
            mounted: AtomicBool::new(true),
            state: Mutex::new(SurfaceState::default()),
            events,
        }
    }

    /// Simulates the owning view going away.
    pub fn unmount(&self) {
        self.mounted.store(false, Ordering::SeqCst);
    }

    pub fn playback_attributes(&self) -> Option<PlaybackAttributes> {
        lock(&self.state).attrs
    }
}

#[async_trait]
impl VideoSurface for VirtualSurface {
    fn is_mounted(&self) -> bool {
        self.mounted.load(Ordering::SeqCst)
    }

    fn apply_playback_attributes(&self, attrs: PlaybackAttributes) {
        lock(&self.state).attrs = Some(attrs);
    }

    fn attach_stream(&self, stream: Arc<dyn MediaStream>) {
        let stream = lock(&self.host.streams).get(stream.id()).cloned();
        let mut state = lock(&self.state);
        state.attached = stream;
        state.playing = false;
    }

    fn detach_stream(&self) {
        let mut state = lock(&self.state);
        state.attached = None;
        state.playing = false;
    }

    fn attached_stream_id(&self) -> Option<String> {
        lock(&self.state).attached.as_ref().map(|s| s.id.clone())
    }

    async fn play(&self) -> Result<(), MediaError> {
        let stream = {
            let mut state = lock(&self.state);
            let autoplay_ok = state.attrs.map(|a| a.muted).unwrap_or(false);
            if !autoplay_ok {
                return Err(MediaError::NotAllowed(
                    "play() requires a user gesture".into(),
                ));
            }
            let Some(stream) = state.attached.clone() else {
                return Err(MediaError::Other("no stream attached".into()));
            };
            state.playing = true;
            stream
        };

        let (width, height) = (stream.track.device.width, stream.track.device.height);
        let _ = self.events.send(SurfaceEvent::LoadedMetadata { width, height });
        if stream.renders() && stream.is_live() {
            let _ = self.events.send(SurfaceEvent::FrameRendered { width, height });
        }
        Ok(())
    }

    fn pause(&self) {
        lock(&self.state).playing = false;
    }

    fn is_paused(&self) -> bool {
        !lock(&self.state).playing
    }

    fn subscribe(&self) -> broadcast::Receiver<SurfaceEvent> {
        self.events.subscribe()
    }

    fn set_mirrored(&self, mirrored: bool) {
        lock(&self.state).mirrored = mirrored;
    }

    fn is_mirrored(&self) -> bool {
        lock(&self.state).mirrored
    }

    fn current_frame(&self) -> Option<VideoFrame> {
        let state = lock(&self.state);
        let stream = state.attached.as_ref()?;
        if !state.playing || !stream.renders() || !stream.is_live() {
            return None;
        }
        self.host.feed.current().map(VideoFrame::new)
    }
}

// =============================================================================
// Scripted Detector
// =============================================================================

/// Native detector that replays a fixed script, one entry per frame.
///
/// `None` entries are frames without a barcode; an exhausted script finds
/// nothing.
pub struct ScriptedDetector {
    script: Mutex<std::collections::VecDeque<Option<DetectedBarcode>>>,
}

impl ScriptedDetector {
    pub fn new<I, S>(payloads: I) -> Self
    where
        I: IntoIterator<Item = Option<S>>,
        S: Into<String>,
    {
        let script = payloads
            .into_iter()
            .map(|p| {
                p.map(|raw| DetectedBarcode {
                    raw_value: raw.into(),
                    format: Symbology::Ean13,
                })
            })
            .collect();
        ScriptedDetector {
            script: Mutex::new(script),
        }
    }

    /// Appends one frame containing `payload`.
    pub fn push(&self, payload: &str) {
        lock(&self.script).push_back(Some(DetectedBarcode {
            raw_value: payload.to_string(),
            format: Symbology::Ean13,
        }));
    }

    pub fn remaining(&self) -> usize {
        lock(&self.script).len()
    }
}

#[async_trait]
impl NativeBarcodeDetector for ScriptedDetector {
    async fn detect(&self, _frame: &VideoFrame) -> Result<Vec<DetectedBarcode>, MediaError> {
        Ok(lock(&self.script)
            .pop_front()
            .flatten()
            .into_iter()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constraints::PORTRAIT_CANDIDATES;
    use image::Rgba;

    #[tokio::test]
    async fn test_exact_environment_rejected_without_rear_camera() {
        let host = VirtualCameraHost::builder()
            .device(VirtualDevice::front("front-0"))
            .build();

        let err = host.get_user_media(&PORTRAIT_CANDIDATES[0]).await.err();
        assert!(matches!(err, Some(MediaError::Overconstrained(_))));

        let stream = host.get_user_media(&PORTRAIT_CANDIDATES[1]).await.unwrap();
        assert_eq!(
            stream.video_tracks()[0].settings().facing_mode,
            Some(FacingMode::User)
        );
        assert_eq!(host.live_track_count(), 1);

        stream.stop_all();
        assert_eq!(host.live_track_count(), 0);
    }

    #[tokio::test]
    async fn test_stopped_streams_are_pruned() {
        let host = VirtualCameraHost::with_feed(FrameFeed::new());

        for _ in 0..5 {
            let stream = host.get_user_media(&ConstraintCandidate::any()).await.unwrap();
            stream.stop_all();
        }
        let live = host.get_user_media(&ConstraintCandidate::any()).await.unwrap();

        assert_eq!(host.issued_stream_count(), 6);
        assert_eq!(host.live_track_count(), 1);
        assert_eq!(lock(&host.state.streams).len(), 1);

        live.stop_all();
        assert_eq!(host.live_track_count(), 0);
    }

    #[tokio::test]
    async fn test_surface_serves_frames_only_while_playing() {
        let feed = FrameFeed::new();
        feed.set(RgbaImage::from_pixel(8, 8, Rgba([255, 255, 255, 255])));
        let host = VirtualCameraHost::with_feed(feed);
        let surface = host.create_surface();

        let stream = host.get_user_media(&ConstraintCandidate::any()).await.unwrap();
        surface.attach_stream(stream.clone());
        assert!(surface.current_frame().is_none());

        // No autoplay attributes yet.
        assert!(surface.play().await.is_err());

        surface.apply_playback_attributes(PlaybackAttributes::AUTOPLAY_SAFE);
        surface.play().await.unwrap();
        assert!(surface.current_frame().is_some());

        stream.stop_all();
        assert!(surface.current_frame().is_none());
    }

    #[tokio::test]
    async fn test_scripted_detector_replays_in_order() {
        let detector = ScriptedDetector::new([Some("A"), None, Some("B")]);
        let frame = VideoFrame::new(Arc::new(RgbaImage::new(1, 1)));

        assert_eq!(detector.detect(&frame).await.unwrap()[0].raw_value, "A");
        assert!(detector.detect(&frame).await.unwrap().is_empty());
        assert_eq!(detector.detect(&frame).await.unwrap()[0].raw_value, "B");
        assert!(detector.detect(&frame).await.unwrap().is_empty());
        assert_eq!(detector.remaining(), 0);
    }
}
