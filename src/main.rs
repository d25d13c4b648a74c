use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use timelapse_recorder::{Config, EncoderKind, SessionManager, SessionOptions, VideoFrame};
use tracing::info;

/// Record a synthetic capture stream into a timelapse file.
#[derive(Parser, Debug)]
#[command(name = "timelapse-recorder", version)]
struct Args {
    /// Config file name, without extension
    #[arg(long, default_value = "config/timelapse")]
    config: String,

    /// Output file; defaults to <output_dir>/<session-id>.<ext>
    #[arg(long)]
    output: Option<PathBuf>,

    /// Simulated capture length in seconds
    #[arg(long, default_value_t = 30)]
    seconds: u64,

    /// Simulated capture frame rate
    #[arg(long, default_value_t = 30)]
    fps: u32,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let args = Args::parse();
    let cfg = Config::load(&args.config)?;

    let options = SessionOptions {
        sampling: cfg.recording.sampling,
        width: cfg.video.width,
        height: cfg.video.height,
        frame_rate_hint: cfg.video.frame_rate,
        encoder: cfg.encoder.kind,
        queue_capacity: cfg.recording.queue_capacity,
        ..Default::default()
    };

    let extension = match cfg.encoder.kind {
        EncoderKind::Ffmpeg => "mp4",
        EncoderKind::Raw => "raw",
    };
    std::fs::create_dir_all(&cfg.recording.output_dir)?;
    let destination = args.output.unwrap_or_else(|| {
        cfg.recording
            .output_dir
            .join(format!("{}.{}", options.session_id, extension))
    });

    info!("Timelapse Recorder v0.1.0");
    info!(
        "Recording {}s of synthetic {}fps capture to {:?}",
        args.seconds, args.fps, destination
    );

    let manager = SessionManager::new();
    anyhow::ensure!(
        manager.prepare_for_recording(&destination, options),
        "failed to prepare recording at {:?}",
        destination
    );

    manager.start_recording().await;
    anyhow::ensure!(manager.is_recording(), "recording failed to start");

    let width = cfg.video.width;
    let height = cfg.video.height;
    let frame_interval_ms = 1000 / args.fps.max(1) as u64;
    let total_frames = args.seconds * args.fps.max(1) as u64;

    let mut kept = 0u64;
    for i in 0..total_frames {
        let frame = synthetic_frame(width, height, i * frame_interval_ms);
        if manager.process_frame(frame) {
            kept += 1;
        }
    }

    info!("Delivered {} frames, {} admitted", total_frames, kept);

    match manager.stop_recording().await {
        Some(summary) => {
            info!(
                "Timelapse complete: {:?} ({}/{} frames kept)",
                summary.destination, summary.frames_kept, summary.frames_seen
            );
            Ok(())
        }
        None => anyhow::bail!("recording failed; see log for details"),
    }
}

/// Moving horizontal gradient so consecutive kept frames are visibly distinct.
fn synthetic_frame(width: u32, height: u32, timestamp_ms: u64) -> VideoFrame {
    let mut data = Vec::with_capacity((width * height * 4) as usize);
    let phase = (timestamp_ms / 10) as u32;

    for y in 0..height {
        for x in 0..width {
            data.push(((x + phase) % 256) as u8);
            data.push((y % 256) as u8);
            data.push((phase % 256) as u8);
            data.push(255);
        }
    }

    VideoFrame {
        data,
        width,
        height,
        timestamp_ms,
    }
}
