#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::missing_errors_doc,
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation
)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//! Head-stability monitoring core (camera-agnostic).
//!
//! This crate turns a stream of per-tick subject centroids into a readiness
//! verdict and arbitrates procedure start/stop against it. Capture goes
//! through `steady_traits::PositionSource`; nothing here touches a camera,
//! a detector or a speaker.
//!
//! ## Architecture
//!
//! - **Window**: fixed-capacity ring buffer (`window` module)
//! - **Analyzer**: movement flags, decaying score, dwell timing (`analyzer`)
//! - **Session**: Idle/Active/Completed with risk tiers (`session`)
//! - **Monitor**: analyzer + session behind one lock, events, snapshots (`monitor`)
//! - **Runtime**: paced capture thread and ingestion loop (`sampler`, `runner`)
//!
//! ## Time
//!
//! All timestamps are `u64` milliseconds since the monitor's epoch, taken
//! from an injectable `Clock`. Durations derived from them saturate at zero.

pub mod analyzer;
pub mod config;
pub mod conversions;
pub mod error;
pub mod events;
pub mod monitor;
pub mod runner;
pub mod sampler;
pub mod session;
pub mod status;
pub mod util;
pub mod window;

pub use analyzer::{AnalyzerStats, StabilityAnalyzer};
pub use config::{AnalyzerCfg, MonitorCfg, SensitivityProfile};
pub use error::{BuildError, IntentError, Result};
pub use events::{Event, Notifier};
pub use monitor::{Monitor, MonitorBuilder, SharedMonitor, Tick};
pub use runner::{RunParams, RunReport};
pub use session::{ProcedureSession, SessionState, StartOutcome, Tier};
pub use status::{StatusSnapshot, Verdict};
pub use steady_traits::{Centroid, Detection};

/// Build a monitor from fully resolved TOML settings.
pub fn build_monitor(eff: &steady_config::Effective) -> Result<Monitor> {
    Monitor::builder().with_settings(eff).build()
}
