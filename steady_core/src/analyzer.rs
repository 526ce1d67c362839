//! Stability analyzer: turns a raw centroid stream into a readiness verdict.
//!
//! Per tick the analyzer measures how far the subject moved since the last
//! detection and records a stable/unstable flag in a bounded window. The
//! score is the share of stable flags in a full window; an unstable tick
//! decays the score linearly instead of zeroing it, so one jittery frame does
//! not flip the readiness lamp. `Ready` additionally needs the subject to
//! have stayed within the threshold continuously for `time_threshold`.
//!
//! Timestamps are milliseconds since the owning monitor's epoch.

use crate::config::{AnalyzerCfg, SensitivityProfile};
use crate::status::Verdict;
use crate::window::RingBuffer;
use std::time::Duration;
use steady_traits::Centroid;

/// Minimum score for `Ready`.
pub const READY_SCORE: f64 = 80.0;
/// Score lost per unstable tick.
pub const DECAY_PER_UNSTABLE_TICK: f64 = 10.0;
pub const MAX_SCORE: f64 = 100.0;

/// Lifetime counters, reset only by `reset()`/`reconfigure()`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AnalyzerStats {
    /// Ticks on which movement was evaluated.
    pub total_ticks: u64,
    pub stable_ticks: u64,
    /// Largest finite per-tick movement seen (pixels).
    pub max_movement: f64,
    /// Movement measured on the most recent evaluated tick.
    pub last_movement: Option<f64>,
}

#[derive(Debug, Clone)]
pub struct StabilityAnalyzer {
    cfg: AnalyzerCfg,
    time_threshold_ms: u64,
    last_position: Option<Centroid>,
    flags: RingBuffer<bool>,
    positions: RingBuffer<Centroid>,
    stable_since_ms: Option<u64>,
    score: f64,
    stats: AnalyzerStats,
    verdict: Verdict,
}

impl StabilityAnalyzer {
    pub fn new(cfg: AnalyzerCfg) -> Self {
        let flags = RingBuffer::with_capacity(cfg.profile.min_detections as usize);
        let positions = RingBuffer::with_capacity(cfg.position_history);
        let time_threshold_ms = duration_ms(cfg.time_threshold);
        Self {
            cfg,
            time_threshold_ms,
            last_position: None,
            flags,
            positions,
            stable_since_ms: None,
            score: 0.0,
            stats: AnalyzerStats::default(),
            verdict: Verdict::Searching,
        }
    }

    /// Feed one tick's observation. `None` means no detection.
    pub fn ingest(&mut self, sample: Option<Centroid>, now_ms: u64) -> Verdict {
        let verdict = match sample {
            None => {
                // Detection loss costs dwell progress, not score.
                self.stable_since_ms = None;
                self.last_position = None;
                Verdict::Searching
            }
            Some(c) if c.is_degenerate() => {
                tracing::warn!(x = c.x, y = c.y, "degenerate centroid treated as unstable");
                self.stats.last_movement = None;
                self.unstable_tick()
            }
            Some(c) => {
                self.positions.push(c);
                match self.last_position.replace(c) {
                    None => {
                        // Nothing to measure against yet.
                        if self.flags.is_empty() {
                            Verdict::Searching
                        } else {
                            Verdict::Stabilizing
                        }
                    }
                    Some(prev) => {
                        let movement = c.distance_to(&prev);
                        self.stats.last_movement = Some(movement);
                        if movement.is_finite() {
                            self.stats.max_movement = self.stats.max_movement.max(movement);
                        }
                        // NaN compares false, so it lands on the unstable side.
                        if movement <= f64::from(self.cfg.profile.threshold_px) {
                            self.stable_tick(now_ms)
                        } else {
                            self.unstable_tick()
                        }
                    }
                }
            }
        };
        if verdict != self.verdict {
            tracing::debug!(
                from = self.verdict.name(),
                to = verdict.name(),
                score = self.score,
                "verdict change"
            );
        }
        self.verdict = verdict;
        verdict
    }

    fn stable_tick(&mut self, now_ms: u64) -> Verdict {
        self.flags.push(true);
        self.stats.total_ticks += 1;
        self.stats.stable_ticks += 1;
        let since = *self.stable_since_ms.get_or_insert(now_ms);

        // Only trust a new score once the window is full.
        let min = self.cfg.profile.min_detections.max(1) as usize;
        if self.flags.len() >= min {
            self.score = MAX_SCORE * (self.flags.count_true() as f64) / (min as f64);
        }

        let dwell_ms = now_ms.saturating_sub(since);
        if dwell_ms >= self.time_threshold_ms && self.score >= READY_SCORE {
            Verdict::Ready
        } else {
            Verdict::Stabilizing
        }
    }

    fn unstable_tick(&mut self) -> Verdict {
        self.flags.push(false);
        self.stats.total_ticks += 1;
        self.stable_since_ms = None;
        self.score = (self.score - DECAY_PER_UNSTABLE_TICK).max(0.0);
        Verdict::Unstable
    }

    /// Return to the freshly constructed state. Idempotent.
    pub fn reset(&mut self) {
        self.last_position = None;
        self.flags.clear();
        self.positions.clear();
        self.stable_since_ms = None;
        self.score = 0.0;
        self.stats = AnalyzerStats::default();
        self.verdict = Verdict::Searching;
    }

    /// Swap the sensitivity profile. Always resets: historical flags were
    /// judged against the old threshold.
    pub fn reconfigure(&mut self, profile: SensitivityProfile) {
        self.cfg.profile = profile;
        self.flags = RingBuffer::with_capacity(profile.min_detections as usize);
        self.reset();
        tracing::info!(
            threshold_px = profile.threshold_px,
            min_detections = profile.min_detections,
            "analyzer reconfigured"
        );
    }

    /// Change the dwell requirement. Flags and score stay valid, so no reset.
    pub fn set_time_threshold(&mut self, time_threshold: Duration) {
        self.cfg.time_threshold = time_threshold;
        self.time_threshold_ms = duration_ms(time_threshold);
    }

    /// Latest verdict (as returned by the last `ingest`).
    #[inline]
    pub fn verdict(&self) -> Verdict {
        self.verdict
    }

    #[inline]
    pub fn score(&self) -> f64 {
        self.score
    }

    #[inline]
    pub fn stable_since_ms(&self) -> Option<u64> {
        self.stable_since_ms
    }

    /// Continuous stable time at `now_ms`; zero when not stable.
    pub fn dwell(&self, now_ms: u64) -> Duration {
        self.stable_since_ms
            .map_or(Duration::ZERO, |since| Duration::from_millis(now_ms.saturating_sub(since)))
    }

    #[inline]
    pub fn stats(&self) -> AnalyzerStats {
        self.stats
    }

    pub fn stability_percentage(&self) -> f64 {
        (self.stats.stable_ticks as f64) / (self.stats.total_ticks.max(1) as f64) * 100.0
    }

    /// Largest distance from the latest position to any position in history.
    pub fn position_spread(&self) -> f64 {
        let Some(latest) = self.positions.latest() else {
            return 0.0;
        };
        self.positions
            .iter()
            .map(|p| p.distance_to(&latest))
            .filter(|d| d.is_finite())
            .fold(0.0, f64::max)
    }

    #[inline]
    pub fn last_position(&self) -> Option<Centroid> {
        self.last_position
    }

    /// Stability flags, most recent first.
    pub fn flags(&self) -> impl Iterator<Item = bool> + '_ {
        self.flags.iter()
    }

    #[inline]
    pub fn profile(&self) -> SensitivityProfile {
        self.cfg.profile
    }

    #[inline]
    pub fn time_threshold(&self) -> Duration {
        self.cfg.time_threshold
    }
}

#[inline]
fn duration_ms(d: Duration) -> u64 {
    d.as_millis().min(u128::from(u64::MAX)) as u64
}
