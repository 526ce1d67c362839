//! `From` implementations bridging `steady_config` types to `steady_core` types.

use crate::config::{AnalyzerCfg, MonitorCfg, SensitivityProfile};
use std::time::Duration;

// ── SensitivityProfile ───────────────────────────────────────────────────────

impl From<steady_config::Sensitivity> for SensitivityProfile {
    fn from(s: steady_config::Sensitivity) -> Self {
        Self {
            threshold_px: s.threshold_px(),
            min_detections: s.min_detections(),
        }
    }
}

impl From<&steady_config::Effective> for SensitivityProfile {
    fn from(e: &steady_config::Effective) -> Self {
        Self {
            threshold_px: e.threshold_px,
            min_detections: e.min_detections,
        }
    }
}

// ── AnalyzerCfg ──────────────────────────────────────────────────────────────

impl From<&steady_config::Effective> for AnalyzerCfg {
    fn from(e: &steady_config::Effective) -> Self {
        Self {
            profile: e.into(),
            time_threshold: secs_to_duration(e.time_threshold_s),
            position_history: e.position_history,
        }
    }
}

// ── MonitorCfg ───────────────────────────────────────────────────────────────

impl From<&steady_config::Effective> for MonitorCfg {
    fn from(e: &steady_config::Effective) -> Self {
        Self {
            announce_interval: secs_to_duration(e.announce_interval_s),
        }
    }
}

/// Seconds to `Duration`; non-finite or negative input maps to zero.
pub fn secs_to_duration(secs: f64) -> Duration {
    Duration::try_from_secs_f64(secs).unwrap_or(Duration::ZERO)
}
