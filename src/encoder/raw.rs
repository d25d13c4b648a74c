use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use super::sink::{EncoderConfig, EncoderError, EncoderSink, VideoFrame};

const RAW_MAGIC: &[u8; 8] = b"TLRAWV1\0";

/// Sidecar metadata written when a raw stream is sealed. Its presence is
/// the finalize marker: a stream without it is a partial recording.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawStreamMeta {
    pub width: u32,
    pub height: u32,
    pub frame_rate_hint: f64,
    pub frame_count: u64,
    pub first_timestamp_ms: Option<u64>,
    pub last_timestamp_ms: Option<u64>,
    pub finalized_at: DateTime<Utc>,
}

/// Container-less sink writing a length-prefixed RGBA frame stream.
///
/// Used where no encoder toolchain is available (headless hosts, tests).
/// Layout: 8-byte magic, then per frame a little-endian u64 presentation
/// timestamp, u32 payload length, and the payload bytes. `finalize` flushes
/// the stream and writes the `.meta.json` sidecar next to it.
pub struct RawSink {
    writer: Option<BufWriter<File>>,
    destination: Option<PathBuf>,
    meta: Option<RawStreamMeta>,
    finalized: bool,
}

impl RawSink {
    pub fn new() -> Self {
        Self {
            writer: None,
            destination: None,
            meta: None,
            finalized: false,
        }
    }

    /// Sidecar path for a given stream destination.
    pub fn meta_path(destination: &Path) -> PathBuf {
        let mut name = destination.as_os_str().to_os_string();
        name.push(".meta.json");
        PathBuf::from(name)
    }
}

impl Default for RawSink {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl EncoderSink for RawSink {
    async fn open(&mut self, destination: &Path, config: &EncoderConfig) -> Result<(), EncoderError> {
        let file = File::create(destination)?;
        let mut writer = BufWriter::new(file);
        writer.write_all(RAW_MAGIC)?;

        self.writer = Some(writer);
        self.destination = Some(destination.to_path_buf());
        self.meta = Some(RawStreamMeta {
            width: config.width,
            height: config.height,
            frame_rate_hint: config.frame_rate_hint,
            frame_count: 0,
            first_timestamp_ms: None,
            last_timestamp_ms: None,
            finalized_at: Utc::now(),
        });

        info!("Raw sink opened: {:?}", destination);
        Ok(())
    }

    async fn append(&mut self, frame: VideoFrame) -> Result<(), EncoderError> {
        if self.finalized {
            return Err(EncoderError::AlreadyFinalized);
        }

        let writer = self.writer.as_mut().ok_or(EncoderError::NotOpen)?;

        if frame.data.len() != frame.expected_len() {
            return Err(EncoderError::FrameMismatch {
                expected: frame.expected_len(),
                actual: frame.data.len(),
            });
        }

        writer.write_all(&frame.timestamp_ms.to_le_bytes())?;
        writer.write_all(&(frame.data.len() as u32).to_le_bytes())?;
        writer.write_all(&frame.data)?;

        if let Some(meta) = &mut self.meta {
            meta.frame_count += 1;
            meta.first_timestamp_ms.get_or_insert(frame.timestamp_ms);
            meta.last_timestamp_ms = Some(frame.timestamp_ms);
        }

        Ok(())
    }

    async fn finalize(&mut self) -> Result<(), EncoderError> {
        if self.finalized {
            return Err(EncoderError::AlreadyFinalized);
        }

        let mut writer = self.writer.take().ok_or(EncoderError::NotOpen)?;
        writer.flush()?;
        drop(writer);

        let destination = self.destination.as_ref().ok_or(EncoderError::NotOpen)?;
        let mut meta = self.meta.take().ok_or(EncoderError::NotOpen)?;
        meta.finalized_at = Utc::now();

        let sidecar = Self::meta_path(destination);
        let json = serde_json::to_vec_pretty(&meta)
            .map_err(|e| EncoderError::Process(format!("Failed to encode sidecar: {}", e)))?;
        std::fs::write(&sidecar, json)?;

        self.finalized = true;
        info!(
            "Raw sink finalized: {} frames -> {:?}",
            meta.frame_count, destination
        );

        Ok(())
    }

    fn name(&self) -> &str {
        "raw"
    }
}

impl Drop for RawSink {
    fn drop(&mut self) {
        // No sidecar on drop: an unsealed stream must stay recognizably partial
        if !self.finalized && self.writer.is_some() {
            warn!("Raw sink dropped before finalize: {:?}", self.destination);
        }
    }
}
