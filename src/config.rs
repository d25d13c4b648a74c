use anyhow::Result;
use serde::Deserialize;
use std::path::PathBuf;

use crate::encoder::EncoderKind;
use crate::sampler::SamplingPolicy;

#[derive(Debug, Deserialize)]
pub struct Config {
    pub recording: RecordingConfig,
    pub video: VideoConfig,
    pub encoder: EncoderSettings,
}

#[derive(Debug, Deserialize)]
pub struct RecordingConfig {
    pub output_dir: PathBuf,
    pub sampling: SamplingPolicy,
    pub queue_capacity: usize,
}

#[derive(Debug, Deserialize)]
pub struct VideoConfig {
    pub width: u32,
    pub height: u32,
    pub frame_rate: f64,
}

#[derive(Debug, Deserialize)]
pub struct EncoderSettings {
    pub kind: EncoderKind,
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path))
            .build()?;

        Ok(settings.try_deserialize()?)
    }
}
