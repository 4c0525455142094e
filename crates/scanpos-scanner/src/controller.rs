//! # Scanner Lifecycle Controller
//!
//! Orchestrates start/stop, owns every resource a scan session acquires and
//! publishes `{is_scanning, error}` to callers.
//!
//! ## State Machine
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │            start()                 stream + frames + decoder            │
//! │   ┌──────┐ ──────► ┌──────────┐ ───────────────────────► ┌──────────┐  │
//! │   │ Idle │         │ Starting │                          │ Scanning │  │
//! │   └──────┘ ◄────── └──────────┘                          └──────────┘  │
//! │      ▲   superseded     │ failure (teardown first)          │    │     │
//! │      │                  ▼                                   │    │     │
//! │      │             ┌─────────┐   start() again              │    │     │
//! │      │             │  Error  │ ─────────► Starting          │    │     │
//! │      │             └─────────┘                              │    │     │
//! │      └──────────── stop() / drop / single-shot detection ◄──┘    │     │
//! │                                                                  │     │
//! │                      continuous detection (stays Scanning) ◄─────┘     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Generation Token
//! Every `start()` and `stop()` bumps a generation counter, the same fencing
//! idea as an election term. Each async continuation compares its captured
//! generation with the current one before touching shared state or calling
//! `on_detect`; a stale continuation releases what it holds and returns
//! [`ScanError::Cancelled`].
//!
//! ## Teardown Contract (idempotent)
//! 1. Cancel the detection loop (drops the decoder instance)
//! 2. Stop every track of the stream
//! 3. Pause the surface and detach the stream
//! 4. Forget the last detected payload

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, trace, warn};

use crate::acquire::{AcquiredStream, StreamAcquirer};
use crate::config::{DetectionMode, ScannerConfig};
use crate::constraints::{candidates_for, Orientation};
use crate::decoder::{select_decoder, Decoder, DecoderKind, Deduplicator};
use crate::error::{ScanError, ScanResult};
use crate::platform::{CameraHost, MediaStream, VideoSurface};
use crate::sink::VideoSinkController;

/// Caller-supplied detection callback.
pub type DetectCallback = Arc<dyn Fn(String) + Send + Sync>;

// =============================================================================
// Scanner Status
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScannerPhase {
    Idle,
    Starting,
    Scanning,
    Error,
}

/// Observable scanner state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScannerStatus {
    pub phase: ScannerPhase,
    pub is_scanning: bool,
    pub error: Option<String>,
    pub decoder: Option<DecoderKind>,
}

impl Default for ScannerStatus {
    fn default() -> Self {
        ScannerStatus {
            phase: ScannerPhase::Idle,
            is_scanning: false,
            error: None,
            decoder: None,
        }
    }
}

// =============================================================================
// Session + Shared State
// =============================================================================

/// Resources owned by one active scan.
struct ScanSession {
    generation: u64,
    stream: Arc<dyn MediaStream>,
    surface: Arc<dyn VideoSurface>,
    loop_task: Option<JoinHandle<()>>,
    on_detect: DetectCallback,
}

struct Shared {
    generation: AtomicU64,
    session: Mutex<Option<ScanSession>>,
    dedup: Mutex<Deduplicator>,
    status: watch::Sender<ScannerStatus>,
    /// Loop of a single-shot session that ended itself and may still be
    /// inside `on_detect`.
    finishing: Mutex<Option<JoinHandle<()>>>,
}

/// Recover the guard from a poisoned lock; scanner state stays usable after
/// a panicking `on_detect`.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl Shared {
    fn is_current(&self, generation: u64) -> bool {
        self.generation.load(Ordering::SeqCst) == generation
    }

    fn ensure_current(&self, generation: u64) -> ScanResult<()> {
        if self.is_current(generation) {
            Ok(())
        } else {
            Err(ScanError::Cancelled)
        }
    }

    /// Invalidates every in-flight continuation.
    fn bump_generation(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn set_status(&self, f: impl FnOnce(&mut ScannerStatus)) {
        self.status.send_modify(f);
    }

    /// Releases a session's resources. Returns the loop task so an async
    /// caller can wait for it to wind down.
    fn release(&self, mut session: ScanSession, abort_loop: bool) -> Option<JoinHandle<()>> {
        let task = session.loop_task.take();
        if abort_loop {
            if let Some(task) = &task {
                task.abort();
            }
        }

        session.stream.stop_all();
        release_surface(&session.surface, session.stream.id());
        lock(&self.dedup).clear();

        debug!(generation = session.generation, "Scan session torn down");
        task
    }

    /// Takes and releases the active session, if any. Returns every loop
    /// task that may still be running.
    fn teardown(&self) -> Vec<JoinHandle<()>> {
        let session = lock(&self.session).take();
        let mut tasks: Vec<_> = session.and_then(|s| self.release(s, true)).into_iter().collect();
        tasks.extend(lock(&self.finishing).take());

        self.set_status(|s| {
            s.phase = match s.phase {
                ScannerPhase::Error => ScannerPhase::Error,
                _ => ScannerPhase::Idle,
            };
            s.is_scanning = false;
            s.decoder = None;
        });
        tasks
    }

    /// Ends a single-shot session from inside its own loop.
    ///
    /// Returns false if the session was already superseded, in which case
    /// the detection must not be reported.
    fn finish_single_shot(&self, generation: u64, payload: &str) -> bool {
        let mut slot = lock(&self.session);
        if !self.is_current(generation)
            || slot.as_ref().map(|s| s.generation) != Some(generation)
        {
            return false;
        }
        if !lock(&self.dedup).accept(payload) {
            return false;
        }

        self.bump_generation();
        if let Some(session) = slot.take() {
            // The loop is the caller; it exits on its own once on_detect returns.
            *lock(&self.finishing) = self.release(session, false);
        }
        drop(slot);

        self.set_status(|s| {
            s.phase = ScannerPhase::Idle;
            s.is_scanning = false;
            s.decoder = None;
        });
        true
    }
}

/// Pauses the surface and detaches `stream_id` if it is still the one shown.
fn release_surface(surface: &Arc<dyn VideoSurface>, stream_id: &str) {
    if surface.attached_stream_id().as_deref() == Some(stream_id) {
        surface.pause();
        surface.detach_stream();
        surface.set_mirrored(false);
    }
}

/// Stops the stream's tracks on drop unless disarmed.
struct StreamGuard {
    stream: Option<Arc<dyn MediaStream>>,
    surface: Arc<dyn VideoSurface>,
}

impl StreamGuard {
    fn new(stream: Arc<dyn MediaStream>, surface: Arc<dyn VideoSurface>) -> Self {
        StreamGuard {
            stream: Some(stream),
            surface,
        }
    }

    fn disarm(mut self) -> Option<Arc<dyn MediaStream>> {
        self.stream.take()
    }
}

impl Drop for StreamGuard {
    fn drop(&mut self) {
        if let Some(stream) = self.stream.take() {
            debug!(stream = stream.id(), "Releasing unclaimed camera stream");
            stream.stop_all();
            release_surface(&self.surface, stream.id());
        }
    }
}

// =============================================================================
// Scanner Controller
// =============================================================================

/// Owns the scanning pipeline for one video surface.
///
/// Dropping the controller tears the active session down (the "unmount"
/// path).
pub struct ScannerController {
    config: Arc<ScannerConfig>,
    host: Arc<dyn CameraHost>,
    surface: Mutex<Option<Arc<dyn VideoSurface>>>,
    orientation: Mutex<Orientation>,
    shared: Arc<Shared>,
}

impl ScannerController {
    pub fn new(config: ScannerConfig, host: Arc<dyn CameraHost>) -> Self {
        let (status, _) = watch::channel(ScannerStatus::default());

        ScannerController {
            config: Arc::new(config),
            host,
            surface: Mutex::new(None),
            orientation: Mutex::new(Orientation::default()),
            shared: Arc::new(Shared {
                generation: AtomicU64::new(0),
                session: Mutex::new(None),
                dedup: Mutex::new(Deduplicator::new()),
                status,
                finishing: Mutex::new(None),
            }),
        }
    }

    /// Sets the surface frames are rendered to and read from.
    pub fn attach_surface(&self, surface: Arc<dyn VideoSurface>) {
        *lock(&self.surface) = Some(surface);
    }

    pub fn set_orientation(&self, orientation: Orientation) {
        *lock(&self.orientation) = orientation;
    }

    pub fn orientation(&self) -> Orientation {
        *lock(&self.orientation)
    }

    pub fn config(&self) -> &ScannerConfig {
        &self.config
    }

    /// Snapshot of the observable state.
    pub fn status(&self) -> ScannerStatus {
        self.shared.status.borrow().clone()
    }

    pub fn is_scanning(&self) -> bool {
        self.status().is_scanning
    }

    pub fn error(&self) -> Option<String> {
        self.status().error
    }

    /// Receiver notified on every status change.
    pub fn subscribe(&self) -> watch::Receiver<ScannerStatus> {
        self.shared.status.subscribe()
    }

    /// Forgets the last reported payload so it can be reported again.
    pub fn clear_last(&self) {
        lock(&self.shared.dedup).clear();
    }

    /// Starts scanning; `on_detect` receives each reported payload.
    pub async fn start<F>(&self, on_detect: F) -> ScanResult<()>
    where
        F: Fn(String) + Send + Sync + 'static,
    {
        self.start_with(Arc::new(on_detect)).await
    }

    /// [`start`](Self::start) with an already shared callback.
    pub async fn start_with(&self, on_detect: DetectCallback) -> ScanResult<()> {
        // Any previous session is fully stopped first.
        self.stop().await;

        let generation = self.shared.bump_generation();
        lock(&self.shared.dedup).clear();
        self.shared.set_status(|s| {
            *s = ScannerStatus {
                phase: ScannerPhase::Starting,
                ..ScannerStatus::default()
            }
        });
        info!(generation, mode = %self.config.detection_mode, "Scanner starting");

        match self.run_start(generation, on_detect).await {
            Ok(kind) => {
                info!(generation, decoder = ?kind, "Scanner running");
                Ok(())
            }
            Err(ScanError::Cancelled) => {
                debug!(generation, "Scanner start superseded");
                Err(ScanError::Cancelled)
            }
            Err(e) => {
                if self.shared.is_current(generation) {
                    warn!(generation, error = %e, constraint = ?e.constraint(), "Scanner start failed");
                    self.shared.set_status(|s| {
                        s.phase = ScannerPhase::Error;
                        s.is_scanning = false;
                        s.error = Some(e.to_string());
                        s.decoder = None;
                    });
                    Err(e)
                } else {
                    Err(ScanError::Cancelled)
                }
            }
        }
    }

    async fn run_start(&self, generation: u64, on_detect: DetectCallback) -> ScanResult<DecoderKind> {
        self.config.validate()?;

        let surface = lock(&self.surface)
            .clone()
            .filter(|s| s.is_mounted())
            .ok_or_else(|| ScanError::VideoSurfaceNotReady("no video surface mounted".into()))?;

        let acquirer = StreamAcquirer::new(self.host.clone());
        acquirer.check_environment()?;

        let decoder = select_decoder(self.host.as_ref(), &self.config)?;
        let kind = decoder.kind();

        acquirer.probe_permission().await;
        self.shared.ensure_current(generation)?;

        let guard = self.acquire_and_bind(generation, &acquirer, &surface).await?;

        // Register under the lock so a concurrent stop() either sees the
        // session or has already invalidated this generation.
        let mut slot = lock(&self.shared.session);
        self.shared.ensure_current(generation)?;
        let stream = guard.disarm().ok_or(ScanError::Cancelled)?;

        self.shared.set_status(|s| {
            s.phase = ScannerPhase::Scanning;
            s.is_scanning = true;
            s.error = None;
            s.decoder = Some(kind);
        });

        let loop_task = tokio::spawn(detection_loop(
            self.shared.clone(),
            generation,
            decoder,
            surface.clone(),
            on_detect.clone(),
            self.config.detection_mode,
            self.config.frame_interval(),
        ));

        *slot = Some(ScanSession {
            generation,
            stream,
            surface,
            loop_task: Some(loop_task),
            on_detect,
        });
        Ok(kind)
    }

    /// Walks the ladder; a candidate whose stream never renders is released
    /// and the next candidate is tried.
    async fn acquire_and_bind(
        &self,
        generation: u64,
        acquirer: &StreamAcquirer,
        surface: &Arc<dyn VideoSurface>,
    ) -> ScanResult<StreamGuard> {
        let candidates = candidates_for(self.orientation());
        let sink = VideoSinkController::new(self.config.frame_timeout());
        let mut next = 0;

        loop {
            let AcquiredStream {
                stream,
                candidate_index,
                candidate,
            } = acquirer.acquire_from(candidates, next).await?;
            let guard = StreamGuard::new(stream.clone(), surface.clone());
            self.shared.ensure_current(generation)?;

            match sink.bind(surface, stream).await {
                Ok(bound) => {
                    self.shared.ensure_current(generation)?;
                    debug!(
                        candidate = candidate.label,
                        width = bound.width,
                        height = bound.height,
                        "Stream bound to surface"
                    );
                    return Ok(guard);
                }
                Err(e) if e.is_retryable() && candidate_index + 1 < candidates.len() => {
                    debug!(candidate = candidate.label, error = %e, "Trying next candidate");
                    drop(guard);
                    self.shared.ensure_current(generation)?;
                    next = candidate_index + 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Stops scanning and releases every resource. Always succeeds.
    pub async fn stop(&self) {
        self.shared.bump_generation();
        for task in self.shared.teardown() {
            // Wait until the loop can no longer call on_detect.
            let _ = task.await;
        }
    }

    /// Re-runs the pipeline with the same callback when the viewport
    /// orientation changes mid-scan.
    ///
    /// Returns true if a restart happened.
    pub async fn handle_orientation_change(&self, orientation: Orientation) -> ScanResult<bool> {
        let previous = std::mem::replace(&mut *lock(&self.orientation), orientation);
        if previous == orientation || !self.config.restart_on_orientation_change {
            return Ok(false);
        }

        let callback = lock(&self.shared.session)
            .as_ref()
            .map(|s| s.on_detect.clone());
        let Some(callback) = callback else {
            return Ok(false);
        };

        info!(?previous, ?orientation, "Orientation changed, restarting scanner");
        self.start_with(callback).await?;
        Ok(true)
    }
}

impl Drop for ScannerController {
    fn drop(&mut self) {
        self.shared.bump_generation();
        self.shared.teardown();
    }
}

// =============================================================================
// Detection Loop
// =============================================================================

/// Polls once per frame interval until superseded or (single-shot) a code
/// is reported.
async fn detection_loop(
    shared: Arc<Shared>,
    generation: u64,
    mut decoder: Box<dyn Decoder>,
    surface: Arc<dyn VideoSurface>,
    on_detect: DetectCallback,
    mode: DetectionMode,
    interval: Duration,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        ticker.tick().await;
        if !shared.is_current(generation) {
            break;
        }

        let Some(result) = decoder.poll_once(surface.as_ref()).await else {
            trace!("No barcode this frame");
            continue;
        };

        match mode {
            DetectionMode::SingleShot => {
                if shared.finish_single_shot(generation, &result.payload) {
                    info!(payload = %result.payload, symbology = ?result.symbology, "Barcode detected");
                    on_detect(result.payload);
                }
                break;
            }
            DetectionMode::Continuous => {
                if !shared.is_current(generation) {
                    break;
                }
                if lock(&shared.dedup).accept(&result.payload) {
                    info!(payload = %result.payload, symbology = ?result.symbology, "Barcode detected");
                    on_detect(result.payload);
                }
            }
        }
    }

    trace!(generation, "Detection loop exited");
}
