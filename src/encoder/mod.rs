pub mod ffmpeg;
pub mod raw;
pub mod sink;

pub use ffmpeg::FfmpegSink;
pub use raw::{RawSink, RawStreamMeta};
pub use sink::{EncoderConfig, EncoderError, EncoderFactory, EncoderKind, EncoderSink, VideoFrame};
