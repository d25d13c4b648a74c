use serde::{Deserialize, Serialize};

use crate::encoder::{EncoderConfig, EncoderKind};
use crate::sampler::SamplingPolicy;

/// Prepare-time configuration for a recording session
///
/// Immutable once the session is prepared; a new recording takes a fresh
/// set of options.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionOptions {
    /// Unique session identifier (e.g., "timelapse-2026-08-25-balcony")
    pub session_id: String,

    /// Which incoming frames are retained
    pub sampling: SamplingPolicy,

    /// Capture frame width in pixels
    pub width: u32,

    /// Capture frame height in pixels
    pub height: u32,

    /// Nominal playback frame rate of the finished timelapse
    pub frame_rate_hint: f64,

    /// Sink implementation used for the output asset
    pub encoder: EncoderKind,

    /// Bounded writer queue depth; a full queue drops frames rather than
    /// stalling the capture source
    pub queue_capacity: usize,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            session_id: format!("timelapse-{}", uuid::Uuid::new_v4()),
            sampling: SamplingPolicy::default(),
            width: 1280,
            height: 720,
            frame_rate_hint: 30.0,
            encoder: EncoderKind::default(),
            queue_capacity: 64,
        }
    }
}

impl SessionOptions {
    /// Capture properties forwarded to the encoder at start.
    pub fn encoder_config(&self) -> EncoderConfig {
        EncoderConfig {
            width: self.width,
            height: self.height,
            frame_rate_hint: self.frame_rate_hint,
        }
    }
}
