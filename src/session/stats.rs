use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::state::SessionState;

/// Point-in-time view of a session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionStats {
    /// Current lifecycle state
    pub state: SessionState,

    /// Whether frames are currently being accepted
    pub is_recording: bool,

    /// When recording started, if it has
    pub started_at: Option<DateTime<Utc>>,

    /// Seconds since recording started
    pub duration_secs: f64,

    /// Frames delivered while recording
    pub frames_seen: u64,

    /// Frames admitted to the encoder
    pub frames_kept: u64,
}

/// Completion payload for a successful stop
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordingSummary {
    /// Session identifier from the prepare-time options
    pub session_id: String,

    /// The sealed, playable output asset
    pub destination: PathBuf,

    /// When recording started
    pub started_at: DateTime<Utc>,

    /// Wall-clock duration of the recording in seconds
    pub duration_secs: f64,

    /// Frames delivered while recording
    pub frames_seen: u64,

    /// Frames written to the output asset
    pub frames_kept: u64,
}
