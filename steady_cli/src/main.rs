#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
#![allow(
    clippy::module_name_repetitions,
    clippy::cast_possible_truncation,
    clippy::cast_precision_loss,
    clippy::cast_sign_loss,
    clippy::missing_errors_doc
)]

mod cli;
mod commands;
mod config;
mod error_fmt;
mod notify;

use clap::Parser;
use cli::{Cli, Commands, FILE_GUARD, JSON_MODE};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use steady_config::Logging;
use tracing_subscriber::{EnvFilter, Layer, Registry, layer::SubscriberExt, util::SubscriberInitExt};

fn main() {
    let cli = Cli::parse();
    let _ = JSON_MODE.set(cli.json);
    let _ = color_eyre::install();

    if let Err(err) = run(cli) {
        let code = error_fmt::exit_code_for_error(&err);
        tracing::error!(code, error = %format!("{err:#}"), "command failed");
        if JSON_MODE.get().copied().unwrap_or(false) {
            println!("{}", error_fmt::format_error_json(&err));
        } else {
            eprintln!("{}", error_fmt::humanize(&err));
        }
        std::process::exit(code);
    }
}

fn run(cli: Cli) -> eyre::Result<()> {
    // Commands that need no configuration at all.
    match cli.cmd {
        Commands::Health => {
            commands::health(cli.json);
            return Ok(());
        }
        Commands::Presets => {
            commands::presets(cli.json);
            return Ok(());
        }
        _ => {}
    }

    let cfg = config::load_config(cli.config.as_deref(), &cli.overrides)?;
    init_tracing(&cfg.logging, &cli.log_level, cli.json)?;
    tracing::debug!(?cfg, "configuration loaded");

    match cli.cmd {
        Commands::Replay {
            trace,
            start_at_ms,
            stop_at_ms,
            force_start,
        } => commands::replay(&cfg, &trace, start_at_ms, stop_at_ms, force_start, cli.json),
        Commands::Simulate {
            seconds,
            jitter_px,
            drift_px,
            dropout_every,
            seed,
            auto_start,
        } => {
            let shutdown = Arc::new(AtomicBool::new(false));
            {
                let flag = Arc::clone(&shutdown);
                ctrlc::set_handler(move || flag.store(true, Ordering::Relaxed))?;
            }
            commands::simulate(
                &cfg,
                seconds,
                jitter_px,
                drift_px,
                dropout_every,
                seed,
                auto_start,
                cli.json,
                &shutdown,
            )
        }
        Commands::SelfCheck => commands::self_check(&cfg, cli.json),
        Commands::Health | Commands::Presets => Ok(()),
    }
}

/// Console logs go to stderr so stdout stays machine-readable. `RUST_LOG`
/// takes precedence over `--log-level`.
fn init_tracing(logging: &Logging, cli_level: &str, json: bool) -> eyre::Result<()> {
    let console_filter =
        EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(cli_level))?;
    let mut layers: Vec<Box<dyn Layer<Registry> + Send + Sync>> = Vec::new();

    let console = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false);
    if json {
        layers.push(console.json().with_filter(console_filter).boxed());
    } else {
        layers.push(console.with_filter(console_filter).boxed());
    }

    if let Some(path) = &logging.file {
        let path = std::path::Path::new(path);
        let dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| std::path::Path::new("."));
        let name = path
            .file_name()
            .ok_or_else(|| eyre::eyre!("logging.file has no file name"))?;
        let appender = match logging.rotation.as_deref() {
            Some("daily") => tracing_appender::rolling::daily(dir, name),
            Some("hourly") => tracing_appender::rolling::hourly(dir, name),
            _ => tracing_appender::rolling::never(dir, name),
        };
        let (writer, guard) = tracing_appender::non_blocking(appender);
        let _ = FILE_GUARD.set(guard);
        let file_filter = EnvFilter::try_new(logging.level.as_deref().unwrap_or("info"))?;
        layers.push(
            tracing_subscriber::fmt::layer()
                .json()
                .with_ansi(false)
                .with_writer(writer)
                .with_filter(file_filter)
                .boxed(),
        );
    }

    // A second init (tests) is harmless.
    let _ = tracing_subscriber::registry().with(layers).try_init();
    Ok(())
}
