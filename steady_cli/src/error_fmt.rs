//! Human-readable error descriptions and structured JSON error formatting.

use crate::config::InputError;
use steady_core::error::{BuildError, IntentError};
use steady_sim::error::SimError;

/// Map an eyre::Report to a human-readable explanation with likely causes and fix hints.
pub fn humanize(err: &eyre::Report) -> String {
    // Typed matches first
    if let Some(ie) = err.downcast_ref::<IntentError>() {
        return match ie {
            IntentError::AlreadyActive => {
                "What happened: A procedure is already active.\nLikely causes: The start time was reached twice or a previous session was never stopped.\nHow to fix: Stop the running procedure before starting another.".to_string()
            }
            IntentError::NotActive => {
                "What happened: Stop was requested but no procedure is active.\nLikely causes: --stop-at-ms falls before --start-at-ms, or the start needed confirmation and was not forced.\nHow to fix: Order the intents correctly or pass --force-start.".to_string()
            }
        };
    }

    if let Some(ie) = err.downcast_ref::<InputError>() {
        return match ie {
            InputError::ReadConfig { path, source } => format!(
                "What happened: Could not read config file {}.\nLikely causes: Wrong path or missing permissions ({source}).\nHow to fix: Check the --config path, or omit it to use built-in defaults.",
                path.display()
            ),
            InputError::InvalidConfig(msg) => format!(
                "What happened: Invalid configuration ({msg}).\nLikely causes: Missing or out-of-range values in the TOML, or an unknown preset id.\nHow to fix: Edit the config file or overrides, then rerun. `steady presets` lists valid ids."
            ),
            InputError::InvalidTrace(msg) => format!(
                "What happened: The trace could not be loaded ({msg}).\nLikely causes: Wrong header, non-numeric cells, or timestamps going backwards.\nHow to fix: Use a CSV with header t_ms,x,y and non-decreasing t_ms; leave x and y empty for frames without a detection."
            ),
        };
    }

    if let Some(BuildError::InvalidConfig(msg)) = err.downcast_ref::<BuildError>() {
        return format!(
            "What happened: Monitor settings were rejected ({msg}).\nLikely causes: A zero threshold, dwell or rate reached the monitor.\nHow to fix: Use positive values in the config or overrides."
        );
    }

    if let Some(se) = err.downcast_ref::<SimError>() {
        return format!(
            "What happened: The simulated source could not be built ({se}).\nLikely causes: Negative or non-finite --jitter-px or --drift-px.\nHow to fix: Pass finite, non-negative amplitudes."
        );
    }

    // Generic fallback
    let msg = err.to_string();
    let mut cause = String::new();
    if let Some(src) = err.source() {
        cause = format!(" Cause: {src}");
    }
    format!(
        "Something went wrong.{cause}\nHow to fix: Re-run with --log-level=debug for details. Original: {msg}"
    )
}

/// Stable exit codes: 3 for a rejected intent, 4 for bad input, 1 otherwise.
/// Clap exits with 2 on usage errors before we get here.
pub fn exit_code_for_error(err: &eyre::Report) -> i32 {
    if err.downcast_ref::<IntentError>().is_some() {
        return 3;
    }
    if err.downcast_ref::<InputError>().is_some()
        || err.downcast_ref::<BuildError>().is_some()
        || err.downcast_ref::<SimError>().is_some()
    {
        return 4;
    }
    1
}

fn reason_name(err: &eyre::Report) -> &'static str {
    if let Some(ie) = err.downcast_ref::<IntentError>() {
        return match ie {
            IntentError::AlreadyActive => "AlreadyActive",
            IntentError::NotActive => "NotActive",
        };
    }
    if let Some(ie) = err.downcast_ref::<InputError>() {
        return match ie {
            InputError::ReadConfig { .. } => "ReadConfig",
            InputError::InvalidConfig(_) => "InvalidConfig",
            InputError::InvalidTrace(_) => "InvalidTrace",
        };
    }
    if err.downcast_ref::<BuildError>().is_some() {
        return "InvalidConfig";
    }
    if err.downcast_ref::<SimError>().is_some() {
        return "InvalidSimulation";
    }
    "Error"
}

/// Structured JSON for errors when --json is enabled.
pub fn format_error_json(err: &eyre::Report) -> String {
    serde_json::json!({ "reason": reason_name(err), "message": humanize(err) }).to_string()
}
