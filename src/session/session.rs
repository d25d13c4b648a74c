use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use super::error::SessionError;
use super::options::SessionOptions;
use super::state::SessionState;
use super::stats::{RecordingSummary, SessionStats};
use crate::encoder::{EncoderError, EncoderFactory, EncoderSink, VideoFrame};
use crate::sampler::FrameSampler;

/// Everything mutable about the session lives behind one lock. `process_frame`
/// only does a state check, a sampling decision, and a non-blocking queue send
/// under it; the encoder never runs while the lock is held.
struct SessionInner {
    state: SessionState,
    destination: Option<PathBuf>,
    options: Option<SessionOptions>,
    sampler: Option<FrameSampler>,
    started_at: Option<DateTime<Utc>>,
    frames_seen: u64,
    frames_kept: u64,
    frame_tx: Option<mpsc::Sender<VideoFrame>>,
    writer: Option<JoinHandle<Result<(), EncoderError>>>,
    abort: Option<Arc<AtomicBool>>,
}

impl SessionInner {
    fn new() -> Self {
        Self {
            state: SessionState::Idle,
            destination: None,
            options: None,
            sampler: None,
            started_at: None,
            frames_seen: 0,
            frames_kept: 0,
            frame_tx: None,
            writer: None,
            abort: None,
        }
    }

    fn clear(&mut self) {
        *self = Self::new();
    }
}

/// The recording session state machine.
///
/// Lifecycle: Idle, prepare to Prepared, start to Recording, stop through
/// Stopping to Finalized. `reset` returns to Idle from anywhere; Failed is
/// reachable on a fatal encoder error. Kept frames flow through a bounded
/// queue into a writer task that owns the encoder sink; `stop` resolves once
/// the sink has sealed the output asset.
///
/// Clones share the same session; frame delivery may race start/stop/reset
/// from other tasks or threads.
#[derive(Clone)]
pub struct RecordingSession {
    inner: Arc<Mutex<SessionInner>>,
}

impl RecordingSession {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(SessionInner::new())),
        }
    }

    /// Validate the destination and store the session configuration.
    ///
    /// Fails with `InvalidDestination` when the path cannot be written,
    /// `AlreadyActive` when a session is already underway, and
    /// `SessionFailed` until a failed session is reset.
    pub fn prepare(&self, destination: &Path, options: SessionOptions) -> Result<(), SessionError> {
        let mut inner = self.inner.lock();

        match inner.state {
            SessionState::Idle => {}
            SessionState::Failed => return Err(SessionError::SessionFailed),
            _ => return Err(SessionError::AlreadyActive),
        }

        validate_destination(destination)?;

        info!(
            "Session {} prepared: {:?} ({:?})",
            options.session_id, destination, options.sampling
        );

        inner.destination = Some(destination.to_path_buf());
        inner.sampler = Some(FrameSampler::new(options.sampling));
        inner.options = Some(options);
        inner.state = SessionState::Prepared;

        Ok(())
    }

    /// Open the encoder sink and begin accepting frames.
    ///
    /// A sink that fails to open moves the session to Failed; callers observe
    /// this through `is_recording` staying false.
    pub async fn start(&self) -> Result<(), SessionError> {
        // Snapshot under the lock; opening the sink must not hold the boundary
        let (destination, options) = {
            let inner = self.inner.lock();
            match inner.state {
                SessionState::Prepared => {}
                SessionState::Failed => return Err(SessionError::SessionFailed),
                _ => return Err(SessionError::NotPrepared),
            }
            let destination = inner.destination.clone().ok_or(SessionError::NotPrepared)?;
            let options = inner.options.clone().ok_or(SessionError::NotPrepared)?;
            (destination, options)
        };

        let mut sink = EncoderFactory::create(options.encoder);
        if let Err(e) = sink.open(&destination, &options.encoder_config()).await {
            error!("Failed to open {} sink: {}", sink.name(), e);
            self.inner.lock().state = SessionState::Failed;
            return Err(SessionError::Encoding(e));
        }

        let (frame_tx, frame_rx) = mpsc::channel(options.queue_capacity.max(1));
        let abort = Arc::new(AtomicBool::new(false));
        let writer = tokio::spawn(run_writer(
            sink,
            frame_rx,
            Arc::clone(&abort),
            Arc::clone(&self.inner),
            destination.clone(),
        ));

        let mut inner = self.inner.lock();

        // A reset may have slipped in while the sink was opening
        if inner.state != SessionState::Prepared {
            warn!("Session reset while starting, discarding output");
            abort.store(true, Ordering::SeqCst);
            drop(frame_tx); // writer wakes up and removes the partial file
            drop(inner);
            let _detached = writer;
            return Err(SessionError::NotPrepared);
        }

        inner.frame_tx = Some(frame_tx);
        inner.writer = Some(writer);
        inner.abort = Some(abort);
        inner.started_at = Some(Utc::now());
        inner.state = SessionState::Recording;

        info!("Recording started: {:?}", destination);
        Ok(())
    }

    /// Evaluate one incoming frame; returns true iff it was admitted to the
    /// encoder.
    ///
    /// Outside Recording this is a no-op returning false; capture pipelines
    /// routinely deliver frames slightly before start and after stop.
    pub fn process_frame(&self, frame: VideoFrame) -> bool {
        let mut inner = self.inner.lock();

        if inner.state != SessionState::Recording {
            return false;
        }

        inner.frames_seen += 1;
        let timestamp_ms = frame.timestamp_ms;

        let keep = inner
            .sampler
            .as_ref()
            .map(|s| s.evaluate(timestamp_ms))
            .unwrap_or(false);

        let mut kept = false;
        let mut writer_gone = false;
        if keep {
            if let Some(tx) = inner.frame_tx.as_ref() {
                match tx.try_send(frame) {
                    Ok(()) => kept = true,
                    Err(mpsc::error::TrySendError::Full(_)) => {
                        // Never stall the capture source: drop instead
                        warn!("Writer queue full, dropping frame at {}ms", timestamp_ms);
                    }
                    Err(mpsc::error::TrySendError::Closed(_)) => writer_gone = true,
                }
            }
        }
        if writer_gone {
            inner.state = SessionState::Failed;
            inner.frame_tx = None;
        }

        if let Some(sampler) = inner.sampler.as_mut() {
            sampler.record(timestamp_ms, kept);
        }
        if kept {
            inner.frames_kept += 1;
        }

        kept
    }

    /// Stop accepting frames, wait for the encoder to seal the asset, and
    /// return the recording summary. Resolves exactly once per recording:
    /// only the caller that observes Recording takes the writer handle.
    ///
    /// Safe to call from any state; outside Recording it is a no-op failing
    /// with `NoActiveRecording` (or `SessionFailed`).
    pub async fn stop(&self) -> Result<RecordingSummary, SessionError> {
        let (writer, abort, session_id, destination) = {
            let mut inner = self.inner.lock();
            match inner.state {
                SessionState::Recording => {}
                SessionState::Failed => return Err(SessionError::SessionFailed),
                _ => return Err(SessionError::NoActiveRecording),
            }

            inner.state = SessionState::Stopping;
            // Closing the queue lets the writer drain and finalize
            inner.frame_tx = None;
            let writer = inner.writer.take().ok_or(SessionError::NoActiveRecording)?;
            let abort = inner.abort.clone();
            let session_id = inner
                .options
                .as_ref()
                .map(|o| o.session_id.clone())
                .unwrap_or_default();
            let destination = inner.destination.clone().ok_or(SessionError::NoActiveRecording)?;
            (writer, abort, session_id, destination)
        };

        info!("Stopping session {}, waiting for encoder", session_id);

        let result = writer.await;

        let aborted = abort
            .as_ref()
            .map(|a| a.load(Ordering::SeqCst))
            .unwrap_or(false);

        let mut inner = self.inner.lock();
        match result {
            Ok(Ok(())) => {
                // A reset that raced the stop may have made the writer
                // discard the asset; never report a summary for it
                if aborted || inner.state != SessionState::Stopping {
                    warn!("Session reset while stopping, no asset to report");
                    return Err(SessionError::NoActiveRecording);
                }
                inner.state = SessionState::Finalized;
                let started_at = inner.started_at.unwrap_or_else(Utc::now);
                let summary = RecordingSummary {
                    session_id,
                    destination,
                    started_at,
                    duration_secs: (Utc::now() - started_at).num_milliseconds() as f64 / 1000.0,
                    frames_seen: inner.frames_seen,
                    frames_kept: inner.frames_kept,
                };
                info!(
                    "Recording finalized: {:?} ({}/{} frames kept, {:.1}s)",
                    summary.destination, summary.frames_kept, summary.frames_seen, summary.duration_secs
                );
                Ok(summary)
            }
            Ok(Err(e)) => {
                error!("Encoder failed during stop: {}", e);
                if inner.state == SessionState::Stopping {
                    inner.state = SessionState::Failed;
                }
                Err(SessionError::Encoding(e))
            }
            Err(e) => {
                error!("Writer task panicked: {}", e);
                if inner.state == SessionState::Stopping {
                    inner.state = SessionState::Failed;
                }
                Err(SessionError::Encoding(EncoderError::Process(format!(
                    "writer task panicked: {}",
                    e
                ))))
            }
        }
    }

    /// Return to Idle from any state. Always succeeds. Any in-progress output
    /// is abandoned: the writer task discards the partial file instead of
    /// finalizing it.
    pub fn reset(&self) {
        let mut inner = self.inner.lock();

        if inner.state != SessionState::Idle {
            info!("Resetting session from {:?}", inner.state);
        }

        if let Some(abort) = &inner.abort {
            abort.store(true, Ordering::SeqCst);
        }
        // Closing the queue wakes the writer, which sees the abort flag and
        // deletes the partial output; the handle is dropped detached.
        inner.frame_tx = None;
        let _detached = inner.writer.take();

        inner.clear();
    }

    pub fn state(&self) -> SessionState {
        self.inner.lock().state
    }

    pub fn is_recording(&self) -> bool {
        self.inner.lock().state == SessionState::Recording
    }

    /// Output destination, valid once Prepared and stable until reset.
    pub fn output_path(&self) -> Option<PathBuf> {
        self.inner.lock().destination.clone()
    }

    /// Current session statistics
    pub fn stats(&self) -> SessionStats {
        let inner = self.inner.lock();
        let duration_secs = inner
            .started_at
            .map(|t| (Utc::now() - t).num_milliseconds() as f64 / 1000.0)
            .unwrap_or(0.0);

        SessionStats {
            state: inner.state,
            is_recording: inner.state == SessionState::Recording,
            started_at: inner.started_at,
            duration_secs,
            frames_seen: inner.frames_seen,
            frames_kept: inner.frames_kept,
        }
    }
}

impl Default for RecordingSession {
    fn default() -> Self {
        Self::new()
    }
}

/// Writer task: owns the sink, drains the frame queue, finalizes on a clean
/// close and discards on abort. On an append failure the session is marked
/// Failed and the partial asset removed; a timelapse with a gap in its frame
/// sequence is corrupt, so there is no retry.
async fn run_writer(
    mut sink: Box<dyn EncoderSink>,
    mut frame_rx: mpsc::Receiver<VideoFrame>,
    abort: Arc<AtomicBool>,
    inner: Arc<Mutex<SessionInner>>,
    destination: PathBuf,
) -> Result<(), EncoderError> {
    while let Some(frame) = frame_rx.recv().await {
        if abort.load(Ordering::SeqCst) {
            break;
        }

        if let Err(e) = sink.append(frame).await {
            error!("Encoder append failed, marking session failed: {}", e);
            {
                let mut guard = inner.lock();
                guard.state = SessionState::Failed;
                guard.frame_tx = None;
            }
            // Drain anything still queued so senders are not left hanging
            frame_rx.close();
            while frame_rx.recv().await.is_some() {}
            discard(sink, &destination);
            return Err(e);
        }
    }

    if abort.load(Ordering::SeqCst) {
        info!("Recording aborted, discarding partial output {:?}", destination);
        discard(sink, &destination);
        return Ok(());
    }

    match sink.finalize().await {
        Ok(()) => Ok(()),
        Err(e) => {
            if destination.exists() {
                let _ = std::fs::remove_file(&destination);
            }
            Err(e)
        }
    }
}

/// Drop the sink without sealing the asset and remove the partial file.
fn discard(sink: Box<dyn EncoderSink>, destination: &Path) {
    drop(sink);
    if destination.exists() {
        if let Err(e) = std::fs::remove_file(destination) {
            warn!("Failed to remove partial output {:?}: {}", destination, e);
        }
    }
}

fn validate_destination(destination: &Path) -> Result<(), SessionError> {
    if destination.as_os_str().is_empty() {
        return Err(SessionError::InvalidDestination("empty path".to_string()));
    }

    if destination.is_dir() {
        return Err(SessionError::InvalidDestination(format!(
            "{:?} is a directory",
            destination
        )));
    }

    let parent = match destination.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    if !parent.is_dir() {
        return Err(SessionError::InvalidDestination(format!(
            "parent directory {:?} does not exist",
            parent
        )));
    }

    Ok(())
}
