//! Readiness verdict and the pull-style status snapshot.

use crate::session::SessionState;
use std::time::Duration;

/// Per-tick readiness classification. Derived on every ingestion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Verdict {
    /// No subject detected.
    #[default]
    Searching,
    /// Subject moved beyond the threshold.
    Unstable,
    /// Subject still, but dwell or score not yet sufficient.
    Stabilizing,
    /// Dwell and score both satisfied.
    Ready,
}

impl Verdict {
    pub const fn name(self) -> &'static str {
        match self {
            Verdict::Searching => "searching",
            Verdict::Unstable => "unstable",
            Verdict::Stabilizing => "stabilizing",
            Verdict::Ready => "ready",
        }
    }

    #[inline]
    pub const fn is_ready(self) -> bool {
        matches!(self, Verdict::Ready)
    }
}

/// Point-in-time view of analyzer and session, for reporting collaborators.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusSnapshot {
    pub verdict: Verdict,
    pub score: f64,
    /// Continuous stable time so far (zero when not stable).
    pub dwell: Duration,
    pub total_ticks: u64,
    pub stable_ticks: u64,
    /// stable_ticks / total_ticks in percent.
    pub stability_percentage: f64,
    pub max_movement: f64,
    /// Largest distance between the latest position and any position in
    /// the history window.
    pub position_spread: f64,
    pub threshold_px: u32,
    pub min_detections: u32,
    pub time_threshold: Duration,
    pub session: SessionState,
    /// Running time of an active session.
    pub session_elapsed: Option<Duration>,
}
