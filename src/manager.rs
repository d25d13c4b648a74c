use std::path::{Path, PathBuf};
use tracing::{error, warn};

use crate::encoder::VideoFrame;
use crate::session::{
    RecordingSession, RecordingSummary, SessionError, SessionOptions, SessionStats,
};

/// Thin façade over a single recording session.
///
/// This is the only surface a host/bridge layer talks to: every mutation of
/// session state goes through one of the five operations here, so the
/// lifecycle invariants are enforced in one place and callers never touch
/// sampler or encoder internals. One long-lived manager is reused across
/// recordings via `reset`.
///
/// Failures on the boolean-returning calls are logged rather than thrown
/// across the boundary; after observing a failed session the host is
/// expected to call `reset` before reuse.
#[derive(Clone)]
pub struct SessionManager {
    session: RecordingSession,
}

impl SessionManager {
    pub fn new() -> Self {
        Self {
            session: RecordingSession::new(),
        }
    }

    /// Return to Idle, abandoning any partial output. Always succeeds.
    pub fn reset(&self) {
        self.session.reset();
    }

    /// Validate the destination and stage the session configuration.
    /// Returns false (and logs why) when the destination or options are
    /// rejected.
    pub fn prepare_for_recording(&self, destination: &Path, options: SessionOptions) -> bool {
        match self.session.prepare(destination, options) {
            Ok(()) => true,
            Err(e) => {
                warn!("prepare_for_recording rejected: {}", e);
                false
            }
        }
    }

    /// Offer one captured frame; true iff it was kept and forwarded to the
    /// encoder. A no-op returning false outside the recording window.
    pub fn process_frame(&self, frame: VideoFrame) -> bool {
        self.session.process_frame(frame)
    }

    /// Begin recording. Side effect only: errors are logged and surface
    /// through `is_recording` staying false.
    pub async fn start_recording(&self) {
        if let Err(e) = self.session.start().await {
            error!("start_recording failed: {}", e);
        }
    }

    /// Stop recording and wait for the output asset to be sealed. Resolves
    /// exactly once per recording with the summary, or `None` when there was
    /// no active recording or the session failed.
    pub async fn stop_recording(&self) -> Option<RecordingSummary> {
        match self.session.stop().await {
            Ok(summary) => Some(summary),
            Err(SessionError::NoActiveRecording) => {
                warn!("stop_recording called with no active recording");
                None
            }
            Err(e) => {
                error!("stop_recording failed: {}", e);
                None
            }
        }
    }

    /// Completion-handler variant of `stop_recording`: the callback is
    /// invoked exactly once, off the session lock, when the asset is durable
    /// (or with `None` on failure).
    pub fn stop_recording_with<F>(&self, completion: F)
    where
        F: FnOnce(Option<RecordingSummary>) + Send + 'static,
    {
        let session = self.session.clone();
        tokio::spawn(async move {
            let summary = match session.stop().await {
                Ok(summary) => Some(summary),
                Err(SessionError::NoActiveRecording) => {
                    warn!("stop_recording called with no active recording");
                    None
                }
                Err(e) => {
                    error!("stop_recording failed: {}", e);
                    None
                }
            };
            completion(summary);
        });
    }

    /// Whether frames are currently being accepted
    pub fn is_recording(&self) -> bool {
        self.session.is_recording()
    }

    /// Output destination, valid once prepared and stable until reset
    pub fn output_url(&self) -> Option<PathBuf> {
        self.session.output_path()
    }

    /// Current session statistics
    pub fn stats(&self) -> SessionStats {
        self.session.stats()
    }
}

impl Default for SessionManager {
    fn default() -> Self {
        Self::new()
    }
}
