// Unit tests for the frame sampling policies
//
// These tests verify the compression-ratio property of everyNth sampling
// and the spacing property of intervalSeconds sampling.

use timelapse_recorder::{FrameSampler, SamplingPolicy};

fn kept_count(policy: SamplingPolicy, timestamps_ms: &[u64]) -> usize {
    let mut sampler = FrameSampler::new(policy);
    timestamps_ms
        .iter()
        .filter(|&&ts| {
            let keep = sampler.evaluate(ts);
            sampler.record(ts, keep);
            keep
        })
        .count()
}

#[test]
fn test_every_nth_compression_ratio() {
    // P1: kept == floor(seen / N) within one frame at the boundary
    for n in [2u32, 3, 5, 7] {
        for seen in [1usize, 10, 30, 100, 101] {
            let ts: Vec<u64> = (0..seen as u64).map(|i| i * 33).collect();
            let kept = kept_count(SamplingPolicy::EveryNth { n }, &ts);
            let expected = seen / n as usize;
            assert!(
                kept == expected || kept == expected + 1,
                "n={} seen={} kept={} expected~{}",
                n,
                seen,
                kept,
                expected
            );
        }
    }
}

#[test]
fn test_every_nth_one_keeps_everything() {
    let ts: Vec<u64> = (0..25).map(|i| i * 40).collect();
    assert_eq!(kept_count(SamplingPolicy::EveryNth { n: 1 }, &ts), 25);
}

#[test]
fn test_interval_spacing_under_jittered_input() {
    // P2: consecutive kept timestamps differ by at least the interval, even
    // when the input frame rate wobbles
    let mut ts = Vec::new();
    let mut now = 0u64;
    for i in 0..200u64 {
        // Alternate between ~20ms and ~80ms frame gaps
        now += if i % 3 == 0 { 80 } else { 20 };
        ts.push(now);
    }

    let mut sampler = FrameSampler::new(SamplingPolicy::IntervalSeconds { seconds: 0.5 });
    let mut kept_ts = Vec::new();
    for &t in &ts {
        let keep = sampler.evaluate(t);
        sampler.record(t, keep);
        if keep {
            kept_ts.push(t);
        }
    }

    assert!(kept_ts.len() >= 2, "expected multiple kept frames");
    for pair in kept_ts.windows(2) {
        assert!(
            pair[1] - pair[0] >= 500,
            "kept frames {}ms apart, expected >= 500ms",
            pair[1] - pair[0]
        );
    }
}

#[test]
fn test_degenerate_parameters_keep_every_frame() {
    let ts: Vec<u64> = (0..12).map(|i| i * 10).collect();

    assert_eq!(kept_count(SamplingPolicy::EveryNth { n: 0 }, &ts), ts.len());
    assert_eq!(
        kept_count(SamplingPolicy::IntervalSeconds { seconds: 0.0 }, &ts),
        ts.len()
    );
    assert_eq!(
        kept_count(SamplingPolicy::IntervalSeconds { seconds: -2.5 }, &ts),
        ts.len()
    );
}

#[test]
fn test_policy_round_trips_through_serde() {
    let policy = SamplingPolicy::IntervalSeconds { seconds: 1.5 };
    let json = serde_json::to_string(&policy).unwrap();
    assert!(json.contains("intervalSeconds"), "got {}", json);

    let parsed: SamplingPolicy = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed, policy);

    let parsed: SamplingPolicy =
        serde_json::from_str(r#"{"mode":"everyNth","n":4}"#).unwrap();
    assert_eq!(parsed, SamplingPolicy::EveryNth { n: 4 });
}
