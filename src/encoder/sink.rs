use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// A single captured video frame (RGBA, row-major).
///
/// Frames are externally owned and transient: the core never holds one
/// beyond the admission path and the bounded writer queue.
#[derive(Debug, Clone)]
pub struct VideoFrame {
    /// Raw RGBA pixel data (width * height * 4 bytes)
    pub data: Vec<u8>,
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// Presentation timestamp in milliseconds since capture started
    pub timestamp_ms: u64,
}

impl VideoFrame {
    /// Expected byte length for the frame's dimensions.
    pub fn expected_len(&self) -> usize {
        self.width as usize * self.height as usize * 4
    }
}

/// Capture properties forwarded to the encoder when the container is opened.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncoderConfig {
    /// Frame width in pixels
    pub width: u32,
    /// Frame height in pixels
    pub height: u32,
    /// Nominal playback frame rate of the finished timelapse
    pub frame_rate_hint: f64,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
            frame_rate_hint: 30.0,
        }
    }
}

/// Errors surfaced by an encoder sink. A single failure is fatal for the
/// owning session; appends are never retried.
#[derive(Error, Debug)]
pub enum EncoderError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("encoder process error: {0}")]
    Process(String),

    #[error("frame size {actual} does not match configured {expected} bytes")]
    FrameMismatch { expected: usize, actual: usize },

    #[error("sink has not been opened")]
    NotOpen,

    #[error("sink is already finalized")]
    AlreadyFinalized,
}

/// Encoder/muxer sink trait
///
/// Abstracts the external encoder the session writes kept frames to.
/// Lifecycle per session: `open` exactly once, any number of `append`s,
/// then `finalize` at most once to seal the container into a playable
/// asset. A sink dropped before `finalize` must not leave a finalized
/// asset behind.
#[async_trait::async_trait]
pub trait EncoderSink: Send {
    /// Allocate the output container at `destination`.
    async fn open(&mut self, destination: &Path, config: &EncoderConfig) -> Result<(), EncoderError>;

    /// Admit one frame. Returns once the frame is accepted; heavy encode
    /// work may continue internally.
    async fn append(&mut self, frame: VideoFrame) -> Result<(), EncoderError>;

    /// Seal the container so it is independently playable. No appends are
    /// accepted afterwards.
    async fn finalize(&mut self) -> Result<(), EncoderError>;

    /// Sink name for logging
    fn name(&self) -> &str;
}

/// Available sink implementations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EncoderKind {
    /// H.264/MP4 via an ffmpeg child process
    Ffmpeg,
    /// Raw frame stream with a JSON sidecar (headless/testing)
    Raw,
}

impl Default for EncoderKind {
    fn default() -> Self {
        Self::Ffmpeg
    }
}

/// Encoder sink factory
pub struct EncoderFactory;

impl EncoderFactory {
    /// Create an unopened sink of the requested kind.
    pub fn create(kind: EncoderKind) -> Box<dyn EncoderSink> {
        match kind {
            EncoderKind::Ffmpeg => Box::new(super::ffmpeg::FfmpegSink::new()),
            EncoderKind::Raw => Box::new(super::raw::RawSink::new()),
        }
    }
}
