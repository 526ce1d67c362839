//! CLI argument definitions and shared statics.

use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::sync::OnceLock;
use steady_config::Sensitivity;

pub static FILE_GUARD: OnceLock<tracing_appender::non_blocking::WorkerGuard> = OnceLock::new();
/// Whether the user asked for JSON output (controls structured error output).
pub static JSON_MODE: OnceLock<bool> = OnceLock::new();

#[derive(Parser, Debug)]
#[command(name = "steady", version, about = "Head-stability monitor CLI")]
pub struct Cli {
    /// Path to config TOML (typed); built-in defaults when omitted
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Print events and summaries as JSON lines instead of text
    #[arg(long, action = ArgAction::SetTrue)]
    pub json: bool,

    /// Console log level (error|warn|info|debug|trace); RUST_LOG wins when set
    #[arg(long = "log-level", value_name = "LEVEL", default_value = "info")]
    pub log_level: String,

    #[command(flatten)]
    pub overrides: Overrides,

    /// Command to execute
    #[command(subcommand)]
    pub cmd: Commands,
}

/// Settings that take precedence over the config file.
#[derive(Args, Debug, Default, Clone)]
pub struct Overrides {
    /// Sensitivity preset; ignored when --procedure selects one
    #[arg(long, value_enum, global = true)]
    pub sensitivity: Option<SensitivityArg>,

    /// Required continuous dwell before ready, in seconds
    #[arg(long = "time-threshold", value_name = "SECS", global = true)]
    pub time_threshold: Option<f64>,

    /// Procedure preset id (see `steady presets`)
    #[arg(long, value_name = "ID", global = true)]
    pub procedure: Option<String>,

    /// Population modifier id (see `steady presets`)
    #[arg(long, value_name = "ID", global = true)]
    pub population: Option<String>,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum SensitivityArg {
    /// 5 px, 20 samples
    High,
    /// 10 px, 15 samples
    Medium,
    /// 20 px, 10 samples
    Low,
}

impl From<SensitivityArg> for Sensitivity {
    fn from(s: SensitivityArg) -> Self {
        match s {
            SensitivityArg::High => Sensitivity::High,
            SensitivityArg::Medium => Sensitivity::Medium,
            SensitivityArg::Low => Sensitivity::Low,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Replay a recorded `t_ms,x,y` trace through the monitor
    Replay {
        /// Trace CSV (strict header t_ms,x,y; empty x/y = no detection)
        #[arg(long, value_name = "FILE")]
        trace: PathBuf,
        /// Request a procedure start once the trace reaches this time
        #[arg(long, value_name = "MS")]
        start_at_ms: Option<u64>,
        /// Request a procedure stop once the trace reaches this time
        #[arg(long, value_name = "MS")]
        stop_at_ms: Option<u64>,
        /// Confirm the start even when the subject is not ready
        #[arg(long, action = ArgAction::SetTrue)]
        force_start: bool,
    },
    /// Monitor a simulated, jittering subject in real time
    Simulate {
        /// Run time in seconds (Ctrl-C stops early)
        #[arg(long, value_name = "SECS", default_value_t = 10.0)]
        seconds: f64,
        /// Per-axis jitter amplitude in pixels
        #[arg(long = "jitter-px", value_name = "PX", default_value_t = 1.0)]
        jitter_px: f64,
        /// Horizontal drift per frame in pixels
        #[arg(long = "drift-px", value_name = "PX", default_value_t = 0.0)]
        drift_px: f64,
        /// Drop every n-th frame (0 = never)
        #[arg(long, value_name = "N", default_value_t = 0)]
        dropout_every: u64,
        /// PRNG seed for the jitter
        #[arg(long, value_name = "SEED", default_value_t = 1)]
        seed: u32,
        /// Start the procedure as soon as the subject is ready
        #[arg(long, action = ArgAction::SetTrue)]
        auto_start: bool,
    },
    /// List sensitivity, procedure and population presets
    Presets,
    /// Validate config and exercise the analyzer offline
    SelfCheck,
    /// Health check for operational monitoring
    Health,
}
