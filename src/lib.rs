pub mod config;
pub mod encoder;
pub mod manager;
pub mod sampler;
pub mod session;

pub use config::Config;
pub use encoder::{
    EncoderConfig, EncoderError, EncoderFactory, EncoderKind, EncoderSink, FfmpegSink, RawSink,
    RawStreamMeta, VideoFrame,
};
pub use manager::SessionManager;
pub use sampler::{FrameSampler, SamplingPolicy};
pub use session::{
    RecordingSession, RecordingSummary, SessionError, SessionOptions, SessionResult, SessionState,
    SessionStats,
};
