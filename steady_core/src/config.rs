//! Runtime configuration types for the stability monitor.
//!
//! These are the structs the analyzer and monitor consume. They are separate
//! from the TOML-deserialized config in `steady_config`; see `conversions`.

use std::time::Duration;

/// Movement threshold and scoring window bundled by a sensitivity preset.
///
/// Immutable once handed to an analyzer; changing it goes through
/// `StabilityAnalyzer::reconfigure`, which resets all accumulated state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SensitivityProfile {
    /// Max centroid movement per tick still counted as stable (pixels).
    pub threshold_px: u32,
    /// Stability-flag window length; also the sample count required before
    /// the score is recomputed.
    pub min_detections: u32,
}

impl Default for SensitivityProfile {
    fn default() -> Self {
        steady_config::Sensitivity::Medium.into()
    }
}

/// Analyzer configuration.
#[derive(Debug, Clone)]
pub struct AnalyzerCfg {
    pub profile: SensitivityProfile,
    /// Required continuous dwell before `Ready`.
    pub time_threshold: Duration,
    /// Number of recent positions kept for movement statistics.
    pub position_history: usize,
}

impl Default for AnalyzerCfg {
    fn default() -> Self {
        Self {
            profile: SensitivityProfile::default(),
            time_threshold: Duration::from_secs(3),
            position_history: 30,
        }
    }
}

/// Monitor-level knobs that are not part of the analyzer.
#[derive(Debug, Clone)]
pub struct MonitorCfg {
    /// Minimum spacing of ready/holding reminders. Zero disables them.
    pub announce_interval: Duration,
}

impl Default for MonitorCfg {
    fn default() -> Self {
        Self {
            announce_interval: Duration::from_secs(10),
        }
    }
}
