#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
//! Config schema, presets and trace loading for the head-stability monitor.
//!
//! - `Config` and its sections are deserialized from TOML and validated.
//! - `presets` holds the sensitivity table and per-procedure defaults.
//! - `trace` loads recorded `t_ms,x,y` CSV traces for replay.
use serde::Deserialize;

pub mod presets;
pub mod trace;

pub use presets::{
    Criticality, POPULATIONS, PROCEDURES, PopulationPreset, ProcedurePreset, ResolvedProcedure,
    Sensitivity, resolve_procedure,
};
pub use trace::{TraceSample, load_trace_csv, read_trace};

/// Default dwell requirement when neither config nor procedure sets one.
pub const DEFAULT_TIME_THRESHOLD_S: f64 = 3.0;
/// Default reminder interval when neither config nor population sets one.
pub const DEFAULT_ANNOUNCE_INTERVAL_S: f64 = 10.0;
/// Upper bound for `time_threshold_s`; anything longer is a typo.
pub const MAX_TIME_THRESHOLD_S: f64 = 300.0;

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct AnalyzerCfg {
    pub sensitivity: Sensitivity,
    /// Required continuous dwell (seconds). Falls back to the procedure
    /// preset, then to `DEFAULT_TIME_THRESHOLD_S`.
    pub time_threshold_s: Option<f64>,
    /// Number of recent positions kept for movement statistics.
    pub position_history: usize,
    /// Explicit movement threshold override (pixels); wins over presets.
    pub threshold_px: Option<u32>,
}

impl Default for AnalyzerCfg {
    fn default() -> Self {
        Self {
            sensitivity: Sensitivity::Medium,
            time_threshold_s: None,
            position_history: 30,
            threshold_px: None,
        }
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct ProcedureCfg {
    /// Procedure preset id, e.g. "mri-skull".
    pub kind: Option<String>,
    /// Population modifier id, e.g. "pediatric". Defaults to "standard".
    pub population: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct RunnerCfg {
    /// Capture rate the ingestion loop is paced at.
    pub sample_rate_hz: u32,
    /// Seconds between repeated ready/holding reminders (0 disables).
    pub announce_interval_s: Option<f64>,
}

impl Default for RunnerCfg {
    fn default() -> Self {
        Self {
            sample_rate_hz: 30,
            announce_interval_s: None,
        }
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Logging {
    pub file: Option<String>,  // path to .log (JSON lines)
    pub level: Option<String>, // "info","debug"
    /// Log rotation policy: "never" | "daily" | "hourly" (default: never)
    pub rotation: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub analyzer: AnalyzerCfg,
    pub procedure: ProcedureCfg,
    pub runner: RunnerCfg,
    pub logging: Logging,
}

/// Fully resolved settings: presets applied, overrides merged, defaults filled.
#[derive(Debug, Clone, PartialEq)]
pub struct Effective {
    pub sensitivity: Sensitivity,
    pub threshold_px: u32,
    pub min_detections: u32,
    pub time_threshold_s: f64,
    pub position_history: usize,
    pub sample_rate_hz: u32,
    pub announce_interval_s: f64,
    pub procedure: Option<ResolvedProcedure>,
}

pub fn load_toml(s: &str) -> Result<Config, toml::de::Error> {
    toml::from_str::<Config>(s)
}

impl Config {
    pub fn validate(&self) -> eyre::Result<()> {
        // Analyzer
        if let Some(t) = self.analyzer.time_threshold_s {
            if !t.is_finite() || t <= 0.0 {
                eyre::bail!("analyzer.time_threshold_s must be > 0");
            }
            if t > MAX_TIME_THRESHOLD_S {
                eyre::bail!("analyzer.time_threshold_s is unreasonably large (>5min)");
            }
        }
        if self.analyzer.position_history < 2 {
            eyre::bail!("analyzer.position_history must be >= 2");
        }
        if self.analyzer.threshold_px == Some(0) {
            eyre::bail!("analyzer.threshold_px must be > 0");
        }

        // Procedure
        if let Some(kind) = &self.procedure.kind {
            resolve_procedure(kind, self.procedure.population.as_deref())?;
        } else if let Some(pop) = &self.procedure.population
            && presets::find_population(pop).is_none()
        {
            eyre::bail!("unknown population '{pop}'");
        }

        // Runner
        if self.runner.sample_rate_hz == 0 {
            eyre::bail!("runner.sample_rate_hz must be > 0");
        }
        if let Some(a) = self.runner.announce_interval_s
            && (!a.is_finite() || a < 0.0)
        {
            eyre::bail!("runner.announce_interval_s must be >= 0");
        }

        // Logging
        if let Some(rot) = &self.logging.rotation
            && !matches!(rot.as_str(), "never" | "daily" | "hourly")
        {
            eyre::bail!("logging.rotation must be one of never|daily|hourly");
        }

        Ok(())
    }

    /// Merge presets and explicit values. Precedence, highest first:
    /// explicit `[analyzer]`/`[runner]` values, procedure/population preset,
    /// sensitivity table and built-in defaults.
    pub fn effective(&self) -> eyre::Result<Effective> {
        let procedure = match &self.procedure.kind {
            Some(kind) => Some(resolve_procedure(kind, self.procedure.population.as_deref())?),
            None => None,
        };

        let sensitivity = procedure
            .as_ref()
            .map_or(self.analyzer.sensitivity, |p| p.sensitivity);
        let threshold_px = self
            .analyzer
            .threshold_px
            .or_else(|| procedure.as_ref().map(|p| p.threshold_px))
            .unwrap_or_else(|| sensitivity.threshold_px());
        let time_threshold_s = self
            .analyzer
            .time_threshold_s
            .or_else(|| procedure.as_ref().map(|p| p.time_threshold_s))
            .unwrap_or(DEFAULT_TIME_THRESHOLD_S);
        let announce_interval_s = self
            .runner
            .announce_interval_s
            .or_else(|| procedure.as_ref().map(|p| p.announce_interval_s))
            .unwrap_or(DEFAULT_ANNOUNCE_INTERVAL_S);

        Ok(Effective {
            sensitivity,
            threshold_px,
            min_detections: sensitivity.min_detections(),
            time_threshold_s,
            position_history: self.analyzer.position_history,
            sample_rate_hz: self.runner.sample_rate_hz,
            announce_interval_s,
            procedure,
        })
    }
}
