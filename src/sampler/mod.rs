use serde::{Deserialize, Serialize};
use tracing::warn;

/// Rule determining which incoming frames are retained.
///
/// Kept as a tagged enum so further modes can be added without touching
/// the session machinery.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "camelCase")]
pub enum SamplingPolicy {
    /// Keep every Nth frame by arrival index. Deterministic compression
    /// ratio under a stable input frame rate.
    EveryNth { n: u32 },

    /// Keep a frame once at least `seconds` of source time has passed since
    /// the last kept frame. Preferred when the capture frame rate is not
    /// guaranteed stable: output spacing stays monotone in source time.
    IntervalSeconds { seconds: f64 },
}

impl Default for SamplingPolicy {
    fn default() -> Self {
        Self::IntervalSeconds { seconds: 1.0 }
    }
}

impl SamplingPolicy {
    /// A non-positive parameter degrades to "keep everything" rather than
    /// failing or silently dropping all frames.
    pub fn keeps_everything(&self) -> bool {
        match *self {
            Self::EveryNth { n } => n <= 1,
            Self::IntervalSeconds { seconds } => !(seconds > 0.0),
        }
    }
}

/// Per-frame keep/discard decision for one recording.
///
/// `evaluate` is a pure function of the sampler's cursor; `record` advances
/// the cursor afterwards. The split lets the session report a frame as
/// dropped (e.g. writer queue full) without the interval cursor pretending
/// it was kept.
#[derive(Debug, Clone)]
pub struct FrameSampler {
    policy: SamplingPolicy,
    frame_index: u64,
    last_kept_ms: Option<u64>,
}

impl FrameSampler {
    pub fn new(policy: SamplingPolicy) -> Self {
        if policy.keeps_everything() {
            warn!("Degenerate sampling policy {:?}: every frame will be kept", policy);
        }

        Self {
            policy,
            frame_index: 0,
            last_kept_ms: None,
        }
    }

    pub fn policy(&self) -> SamplingPolicy {
        self.policy
    }

    /// Decide whether the frame arriving at `timestamp_ms` should be kept.
    /// Does not mutate the sampler.
    pub fn evaluate(&self, timestamp_ms: u64) -> bool {
        if self.policy.keeps_everything() {
            return true;
        }

        match self.policy {
            SamplingPolicy::EveryNth { n } => self.frame_index % n as u64 == 0,
            SamplingPolicy::IntervalSeconds { seconds } => match self.last_kept_ms {
                // First frame is always kept
                None => true,
                Some(last) => {
                    let elapsed_ms = timestamp_ms.saturating_sub(last);
                    elapsed_ms as f64 >= seconds * 1000.0
                }
            },
        }
    }

    /// Advance past the frame at `timestamp_ms`. `kept` must reflect whether
    /// the frame actually reached the encoder.
    pub fn record(&mut self, timestamp_ms: u64, kept: bool) {
        self.frame_index += 1;
        if kept {
            self.last_kept_ms = Some(timestamp_ms);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(policy: SamplingPolicy, timestamps_ms: &[u64]) -> Vec<bool> {
        let mut sampler = FrameSampler::new(policy);
        timestamps_ms
            .iter()
            .map(|&ts| {
                let keep = sampler.evaluate(ts);
                sampler.record(ts, keep);
                keep
            })
            .collect()
    }

    #[test]
    fn every_nth_keeps_multiples_of_n() {
        let ts: Vec<u64> = (0..9).map(|i| i * 33).collect();
        let kept = run(SamplingPolicy::EveryNth { n: 3 }, &ts);
        assert_eq!(kept, vec![true, false, false, true, false, false, true, false, false]);
    }

    #[test]
    fn every_nth_zero_keeps_all() {
        let ts: Vec<u64> = (0..5).map(|i| i * 33).collect();
        let kept = run(SamplingPolicy::EveryNth { n: 0 }, &ts);
        assert!(kept.iter().all(|&k| k));
    }

    #[test]
    fn interval_first_frame_always_kept() {
        let kept = run(SamplingPolicy::IntervalSeconds { seconds: 10.0 }, &[12345]);
        assert_eq!(kept, vec![true]);
    }

    #[test]
    fn interval_spacing_is_at_least_the_interval() {
        // 30fps input, keep one frame per second
        let ts: Vec<u64> = (0..90).map(|i| i * 33).collect();
        let kept = run(SamplingPolicy::IntervalSeconds { seconds: 1.0 }, &ts);

        let kept_ts: Vec<u64> = ts
            .iter()
            .zip(&kept)
            .filter(|(_, &k)| k)
            .map(|(&t, _)| t)
            .collect();
        assert!(kept_ts.len() > 1);
        for pair in kept_ts.windows(2) {
            assert!(pair[1] - pair[0] >= 1000, "spacing {} < 1000ms", pair[1] - pair[0]);
        }
    }

    #[test]
    fn interval_zero_keeps_all() {
        let ts: Vec<u64> = (0..10).map(|i| i * 7).collect();
        let kept = run(SamplingPolicy::IntervalSeconds { seconds: 0.0 }, &ts);
        assert!(kept.iter().all(|&k| k));
    }

    #[test]
    fn dropped_frame_does_not_advance_interval_cursor() {
        let mut sampler = FrameSampler::new(SamplingPolicy::IntervalSeconds { seconds: 1.0 });

        assert!(sampler.evaluate(0));
        // Writer queue was full: the frame never reached the encoder
        sampler.record(0, false);

        // The next frame is still the "first kept" candidate
        assert!(sampler.evaluate(100));
        sampler.record(100, true);

        assert!(!sampler.evaluate(600));
    }
}
