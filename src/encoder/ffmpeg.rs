use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::{Child, ChildStdin, Command};
use tracing::{info, warn};

use super::sink::{EncoderConfig, EncoderError, EncoderSink, VideoFrame};

/// H.264/MP4 sink backed by an ffmpeg child process.
///
/// Raw RGBA frames are piped into ffmpeg's stdin; ffmpeg owns the container
/// until `finalize` waits for it to flush the moov atom. The child is
/// spawned with kill-on-drop, so a sink dropped before finalize leaves no
/// sealed asset behind for an abandoned recording.
pub struct FfmpegSink {
    process: Option<Child>,
    stdin: Option<ChildStdin>,
    destination: Option<PathBuf>,
    frame_len: usize,
    frames_written: u64,
    finalized: bool,
}

impl FfmpegSink {
    pub fn new() -> Self {
        Self {
            process: None,
            stdin: None,
            destination: None,
            frame_len: 0,
            frames_written: 0,
            finalized: false,
        }
    }
}

impl Default for FfmpegSink {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl EncoderSink for FfmpegSink {
    async fn open(&mut self, destination: &Path, config: &EncoderConfig) -> Result<(), EncoderError> {
        let args = [
            "-y".to_string(),
            "-f".to_string(),
            "rawvideo".to_string(),
            "-pix_fmt".to_string(),
            "rgba".to_string(),
            "-s".to_string(),
            format!("{}x{}", config.width, config.height),
            "-r".to_string(),
            config.frame_rate_hint.to_string(),
            "-i".to_string(),
            "-".to_string(), // stdin for video frames
            "-c:v".to_string(),
            "libx264".to_string(),
            "-preset".to_string(),
            "veryfast".to_string(),
            "-crf".to_string(),
            "23".to_string(),
            "-pix_fmt".to_string(),
            "yuv420p".to_string(),
            "-movflags".to_string(),
            "+faststart".to_string(),
            destination.to_string_lossy().to_string(),
        ];

        info!("Starting ffmpeg sink: {:?}", args);

        let mut process = Command::new("ffmpeg")
            .args(&args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| EncoderError::Process(format!("Failed to start ffmpeg: {}", e)))?;

        let stdin = process
            .stdin
            .take()
            .ok_or_else(|| EncoderError::Process("Failed to capture ffmpeg stdin".to_string()))?;

        self.process = Some(process);
        self.stdin = Some(stdin);
        self.destination = Some(destination.to_path_buf());
        self.frame_len = config.width as usize * config.height as usize * 4;

        Ok(())
    }

    async fn append(&mut self, frame: VideoFrame) -> Result<(), EncoderError> {
        if self.finalized {
            return Err(EncoderError::AlreadyFinalized);
        }

        let stdin = self.stdin.as_mut().ok_or(EncoderError::NotOpen)?;

        if frame.data.len() != self.frame_len {
            return Err(EncoderError::FrameMismatch {
                expected: self.frame_len,
                actual: frame.data.len(),
            });
        }

        stdin.write_all(&frame.data).await?;
        self.frames_written += 1;

        Ok(())
    }

    async fn finalize(&mut self) -> Result<(), EncoderError> {
        if self.finalized {
            return Err(EncoderError::AlreadyFinalized);
        }

        // Close stdin so ffmpeg drains its queue and writes the container trailer
        let mut stdin = self.stdin.take().ok_or(EncoderError::NotOpen)?;
        stdin.shutdown().await?;
        drop(stdin);

        let mut process = self.process.take().ok_or(EncoderError::NotOpen)?;
        let status = process.wait().await?;

        if !status.success() {
            return Err(EncoderError::Process(format!(
                "ffmpeg exited with status {}",
                status
            )));
        }

        self.finalized = true;
        info!(
            "ffmpeg sink finalized: {} frames -> {:?}",
            self.frames_written, self.destination
        );

        Ok(())
    }

    fn name(&self) -> &str {
        "ffmpeg"
    }
}

impl Drop for FfmpegSink {
    fn drop(&mut self) {
        // kill_on_drop reaps the child; this is just the audit trail
        if self.process.is_some() {
            warn!(
                "ffmpeg sink dropped before finalize, killing encoder for {:?}",
                self.destination
            );
        }
    }
}
