//! # Stream Acquirer
//!
//! Obtains a camera stream by walking the constraint ladder.
//!
//! ## Acquisition Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  secure context? ──no──► InsecureContext (no device access attempted)  │
//! │        │ yes                                                            │
//! │        ▼                                                                │
//! │  media API present? ──no──► CameraUnavailable                           │
//! │        │ yes                                                            │
//! │        ▼                                                                │
//! │  probe permission (logged, never fails)                                 │
//! │        │                                                                │
//! │        ▼                                                                │
//! │  candidate[0] ──fail──► candidate[1] ──fail──► ... ──fail──► last error │
//! │        │ ok                                                  (tagged)   │
//! │        ▼                                                                │
//! │  AcquiredStream { stream, candidate_index }                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::Arc;

use tracing::{debug, info};

use crate::constraints::ConstraintCandidate;
use crate::error::{ScanError, ScanResult};
use crate::platform::{CameraHost, MediaStream, PermissionState};

/// A stream together with the candidate that produced it.
pub struct AcquiredStream {
    pub stream: Arc<dyn MediaStream>,
    /// Position in the ladder; the controller resumes after it on retry.
    pub candidate_index: usize,
    pub candidate: ConstraintCandidate,
}

impl std::fmt::Debug for AcquiredStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AcquiredStream")
            .field("stream", &self.stream.id())
            .field("candidate_index", &self.candidate_index)
            .field("candidate", &self.candidate.label)
            .finish()
    }
}

/// Walks the constraint ladder against a [`CameraHost`].
pub struct StreamAcquirer {
    host: Arc<dyn CameraHost>,
}

impl StreamAcquirer {
    pub fn new(host: Arc<dyn CameraHost>) -> Self {
        StreamAcquirer { host }
    }

    /// Fails fast when the environment cannot grant a camera at all.
    pub fn check_environment(&self) -> ScanResult<()> {
        if !self.host.is_secure_context() {
            return Err(ScanError::InsecureContext);
        }

        if !self.host.supports_user_media() {
            return Err(ScanError::CameraUnavailable {
                reason: "media devices API is not available".into(),
                constraint: None,
            });
        }

        Ok(())
    }

    /// Consults the permissions API if there is one.
    ///
    /// Purely diagnostic: an unavailable API or a `Denied` answer does not
    /// stop acquisition, `get_user_media` is the authority.
    pub async fn probe_permission(&self) -> Option<PermissionState> {
        match self.host.query_camera_permission().await {
            Ok(state) => {
                debug!(?state, "Camera permission state");
                Some(state)
            }
            Err(e) => {
                debug!(error = %e, "Permissions API unavailable");
                None
            }
        }
    }

    /// Tries `candidates[start..]` in order and returns the first stream.
    ///
    /// ## Errors
    /// The LAST candidate's failure, mapped and tagged with that candidate.
    pub async fn acquire_from(
        &self,
        candidates: &[ConstraintCandidate],
        start: usize,
    ) -> ScanResult<AcquiredStream> {
        let mut last_error = None;

        for (index, candidate) in candidates.iter().enumerate().skip(start) {
            debug!(index, candidate = %candidate, "Requesting camera");

            match self.host.get_user_media(candidate).await {
                Ok(stream) => {
                    info!(
                        index,
                        candidate = candidate.label,
                        stream = stream.id(),
                        "Camera stream acquired"
                    );
                    return Ok(AcquiredStream {
                        stream,
                        candidate_index: index,
                        candidate: *candidate,
                    });
                }
                Err(e) => {
                    debug!(index, candidate = candidate.label, error = %e, "Candidate rejected");
                    last_error = Some(ScanError::from_media(e, candidate.to_string()));
                }
            }
        }

        Err(last_error.unwrap_or_else(|| ScanError::NoDeviceMatchesConstraints {
            reason: "no constraint candidates left to try".into(),
            constraint: None,
        }))
    }

    /// Environment check followed by the full ladder.
    pub async fn get_stream(&self, candidates: &[ConstraintCandidate]) -> ScanResult<AcquiredStream> {
        self.check_environment()?;
        self.probe_permission().await;
        self.acquire_from(candidates, 0).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constraints::PORTRAIT_CANDIDATES;
    use crate::error::MediaError;
    use crate::virtual_camera::{VirtualCameraHost, VirtualDevice};

    fn acquirer(host: &VirtualCameraHost) -> StreamAcquirer {
        StreamAcquirer::new(Arc::new(host.clone()))
    }

    #[tokio::test]
    async fn test_insecure_context_makes_no_request() {
        let host = VirtualCameraHost::builder()
            .insecure()
            .device(VirtualDevice::rear("rear-0"))
            .build();

        let err = acquirer(&host).get_stream(&PORTRAIT_CANDIDATES).await.unwrap_err();
        assert_eq!(err, ScanError::InsecureContext);
        assert!(host.requested_candidates().is_empty());
    }

    #[tokio::test]
    async fn test_missing_media_api() {
        let host = VirtualCameraHost::builder().without_media_api().build();
        let err = acquirer(&host).check_environment().unwrap_err();
        assert!(matches!(err, ScanError::CameraUnavailable { .. }));
    }

    #[tokio::test]
    async fn test_falls_back_to_ideal_on_laptop() {
        let host = VirtualCameraHost::builder()
            .device(VirtualDevice::front("webcam"))
            .build();

        let acquired = acquirer(&host)
            .get_stream(&PORTRAIT_CANDIDATES)
            .await
            .unwrap();
        assert_eq!(acquired.candidate_index, 1);
        assert_eq!(host.requested_candidates().len(), 2);
        assert_eq!(host.live_track_count(), 1);
    }

    #[tokio::test]
    async fn test_all_candidates_fail_reports_last_cause() {
        let host = VirtualCameraHost::builder()
            .device(VirtualDevice::rear("rear-0"))
            .reject(
                "exact environment + resolution",
                MediaError::Overconstrained("width".into()),
            )
            .reject(
                "ideal environment + resolution",
                MediaError::NotReadable("busy".into()),
            )
            .reject("ideal environment", MediaError::NotReadable("busy".into()))
            .reject("any camera", MediaError::NotAllowed("dismissed".into()))
            .build();

        let err = acquirer(&host)
            .get_stream(&PORTRAIT_CANDIDATES)
            .await
            .unwrap_err();
        assert!(matches!(err, ScanError::PermissionDenied { .. }));
        assert_eq!(err.constraint(), Some(PORTRAIT_CANDIDATES[3].to_string().as_str()));
        assert_eq!(host.requested_candidates().len(), 4);
        assert_eq!(host.live_track_count(), 0);
    }

    #[tokio::test]
    async fn test_permission_probe_is_advisory() {
        let host = VirtualCameraHost::builder()
            .permission(None)
            .device(VirtualDevice::rear("rear-0"))
            .build();

        let acquirer = acquirer(&host);
        assert_eq!(acquirer.probe_permission().await, None);
        assert!(acquirer.get_stream(&PORTRAIT_CANDIDATES).await.is_ok());
    }

    #[tokio::test]
    async fn test_no_camera_at_all() {
        let host = VirtualCameraHost::builder().build();
        let err = acquirer(&host)
            .get_stream(&PORTRAIT_CANDIDATES)
            .await
            .unwrap_err();
        assert!(matches!(err, ScanError::NoDeviceMatchesConstraints { .. }));
    }

    #[tokio::test]
    async fn test_resume_after_index() {
        let host = VirtualCameraHost::builder()
            .device(VirtualDevice::rear("rear-0"))
            .build();

        let acquired = acquirer(&host)
            .acquire_from(&PORTRAIT_CANDIDATES, 2)
            .await
            .unwrap();
        assert_eq!(acquired.candidate_index, 2);
        assert_eq!(host.requested_candidates(), vec!["ideal environment"]);

        let err = acquirer(&host)
            .acquire_from(&PORTRAIT_CANDIDATES, 4)
            .await
            .unwrap_err();
        assert!(matches!(err, ScanError::NoDeviceMatchesConstraints { .. }));
    }
}
