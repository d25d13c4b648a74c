// Integration tests for the SessionManager façade
//
// The façade is what a host/bridge layer calls: booleans instead of typed
// errors, logging instead of panics, and a completion callback that fires
// exactly once per stop.

use anyhow::Result;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tempfile::TempDir;
use timelapse_recorder::{
    EncoderKind, SamplingPolicy, SessionManager, SessionOptions, VideoFrame,
};
use tokio::time::{sleep, timeout, Duration};

const WIDTH: u32 = 4;
const HEIGHT: u32 = 4;

fn options() -> SessionOptions {
    SessionOptions {
        sampling: SamplingPolicy::EveryNth { n: 2 },
        width: WIDTH,
        height: HEIGHT,
        frame_rate_hint: 30.0,
        encoder: EncoderKind::Raw,
        ..Default::default()
    }
}

fn frame(timestamp_ms: u64) -> VideoFrame {
    VideoFrame {
        data: vec![0u8; (WIDTH * HEIGHT * 4) as usize],
        width: WIDTH,
        height: HEIGHT,
        timestamp_ms,
    }
}

#[tokio::test]
async fn test_full_lifecycle_through_the_facade() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let dest = temp_dir.path().join("facade.raw");

    let manager = SessionManager::new();
    assert!(!manager.is_recording());
    assert!(manager.output_url().is_none());

    assert!(manager.prepare_for_recording(&dest, options()));
    assert_eq!(manager.output_url().as_deref(), Some(dest.as_path()));
    assert!(!manager.is_recording(), "prepared is not yet recording");

    manager.start_recording().await;
    assert!(manager.is_recording());

    let mut kept = 0;
    for i in 0..10u64 {
        if manager.process_frame(frame(i * 100)) {
            kept += 1;
        }
    }
    assert_eq!(kept, 5, "everyNth=2 keeps indices 0,2,4,6,8");

    let summary = manager.stop_recording().await.expect("stop should succeed");
    assert!(!manager.is_recording());
    assert_eq!(summary.frames_seen, 10);
    assert_eq!(summary.frames_kept, 5);
    assert!(dest.exists());

    // Output URL stays stable until reset
    assert_eq!(manager.output_url().as_deref(), Some(dest.as_path()));

    Ok(())
}

#[tokio::test]
async fn test_prepare_returns_false_for_bad_destination() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let manager = SessionManager::new();

    let bad = temp_dir.path().join("nope").join("out.raw");
    assert!(!manager.prepare_for_recording(&bad, options()));
    assert!(manager.output_url().is_none());

    // Manager remains usable
    assert!(manager.prepare_for_recording(&temp_dir.path().join("ok.raw"), options()));

    Ok(())
}

#[tokio::test]
async fn test_start_without_prepare_observable_via_is_recording() {
    let manager = SessionManager::new();
    manager.start_recording().await;
    assert!(!manager.is_recording());
}

#[tokio::test]
async fn test_stop_without_recording_returns_none() {
    let manager = SessionManager::new();
    assert!(manager.stop_recording().await.is_none());
}

#[tokio::test]
async fn test_completion_callback_fires_exactly_once() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let dest = temp_dir.path().join("callback.raw");

    let manager = SessionManager::new();
    assert!(manager.prepare_for_recording(&dest, options()));
    manager.start_recording().await;
    for i in 0..6u64 {
        manager.process_frame(frame(i * 100));
    }

    let fired = Arc::new(AtomicUsize::new(0));
    let (tx, rx) = tokio::sync::oneshot::channel();
    {
        let fired = Arc::clone(&fired);
        manager.stop_recording_with(move |summary| {
            fired.fetch_add(1, Ordering::SeqCst);
            let _ = tx.send(summary);
        });
    }

    let summary = timeout(Duration::from_secs(5), rx).await??;
    let summary = summary.expect("completion should carry the summary");
    assert_eq!(summary.frames_kept, 3);

    // Give any erroneous double-invocation a chance to show up
    sleep(Duration::from_millis(100)).await;
    assert_eq!(fired.load(Ordering::SeqCst), 1);
    assert!(dest.exists());

    Ok(())
}

#[tokio::test]
async fn test_manager_reused_across_recordings_after_reset() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let manager = SessionManager::new();

    let first = temp_dir.path().join("one.raw");
    assert!(manager.prepare_for_recording(&first, options()));
    manager.start_recording().await;
    manager.process_frame(frame(0));
    assert!(manager.stop_recording().await.is_some());

    // A finalized session must be reset before the instance is reused
    assert!(!manager.prepare_for_recording(&temp_dir.path().join("blocked.raw"), options()));
    manager.reset();
    assert!(manager.output_url().is_none());

    let second = temp_dir.path().join("two.raw");
    assert!(manager.prepare_for_recording(&second, options()));
    manager.start_recording().await;
    manager.process_frame(frame(0));
    let summary = manager.stop_recording().await.expect("second recording");
    assert_eq!(summary.destination, second);

    assert!(first.exists(), "first asset untouched by the second recording");
    assert!(second.exists());

    Ok(())
}
