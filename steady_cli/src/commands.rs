//! Subcommand implementations.

use crate::config::InputError;
use crate::notify::{ConsoleNotifier, print_event, print_summary, snapshot_json};
use eyre::WrapErr;
use serde_json::json;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::time::Duration;
use steady_config::{Config, Effective, POPULATIONS, PROCEDURES, Sensitivity};
use steady_core::runner::RunParams;
use steady_core::{Centroid, Event, Monitor, SharedMonitor, StartOutcome, Verdict};
use steady_sim::DriftSource;
use steady_traits::ManualClock;

/// Replay a recorded trace on the trace's own clock.
pub fn replay(
    cfg: &Config,
    trace: &Path,
    start_at_ms: Option<u64>,
    stop_at_ms: Option<u64>,
    force_start: bool,
    json: bool,
) -> eyre::Result<()> {
    let eff = cfg.effective()?;
    let samples = steady_config::load_trace_csv(trace)
        .map_err(|e| InputError::InvalidTrace(format!("{e:#}")))?;

    let clock = ManualClock::new();
    let mut monitor = Monitor::builder()
        .with_settings(&eff)
        .with_clock(Box::new(clock.clone()))
        .build()?;
    tracing::info!(
        trace = %trace.display(),
        samples = samples.len(),
        threshold_px = eff.threshold_px,
        time_threshold_s = eff.time_threshold_s,
        "replay start"
    );

    let mut start_pending = start_at_ms;
    let mut stop_pending = stop_at_ms;
    for s in &samples {
        clock.set_ms(s.t_ms);
        let tick = monitor.ingest(s.centroid);
        for e in &tick.events {
            print_event(e, Some(s.t_ms), json);
        }

        if start_pending.is_some_and(|at| s.t_ms >= at) {
            start_pending = None;
            let outcome = monitor.request_start(force_start)?;
            print_event(&outcome.into(), Some(s.t_ms), json);
        }
        if stop_pending.is_some_and(|at| s.t_ms >= at) {
            stop_pending = None;
            let tier = monitor.session().tier();
            let duration = monitor.request_stop()?;
            if let Some(tier) = tier {
                print_event(&Event::SessionStopped { tier, duration }, Some(s.t_ms), json);
            }
        }
    }
    if start_pending.is_some() || stop_pending.is_some() {
        tracing::warn!("trace ended before every requested intent was reached");
    }

    print_summary(&monitor.snapshot(), json);
    Ok(())
}

/// Run the monitor against a simulated subject in real time.
#[allow(clippy::too_many_arguments)]
pub fn simulate(
    cfg: &Config,
    seconds: f64,
    jitter_px: f64,
    drift_px: f64,
    dropout_every: u64,
    seed: u32,
    auto_start: bool,
    json: bool,
    shutdown: &Arc<AtomicBool>,
) -> eyre::Result<()> {
    let eff = cfg.effective()?;
    let max_duration = Duration::try_from_secs_f64(seconds)
        .ok()
        .filter(|d| !d.is_zero())
        .ok_or_else(|| InputError::InvalidConfig("--seconds must be > 0".into()))?;
    let source = DriftSource::new(Centroid::new(320.0, 240.0), jitter_px)?
        .with_drift(drift_px, 0.0)?
        .with_dropout_every(dropout_every)
        .with_seed(seed);

    let monitor: SharedMonitor = Monitor::builder()
        .with_settings(&eff)
        .with_notifier(ConsoleNotifier { json })
        .build()?
        .into();
    let params = RunParams {
        sample_rate_hz: eff.sample_rate_hz,
        max_duration: Some(max_duration),
        auto_start,
    };
    let report = steady_core::runner::run(source, &monitor, &params, shutdown)?;

    if json {
        let mut summary = snapshot_json(&report.final_snapshot);
        summary["ticks"] = json!(report.ticks);
        summary["stalls"] = json!(report.stalls);
        summary["capture_errors"] = json!(report.capture_errors);
        summary["session_duration_ms"] =
            json!(report.session_duration.map(|d| d.as_millis() as u64));
        println!("{}", json!({ "summary": summary }));
    } else {
        print_summary(&report.final_snapshot, false);
        println!(
            "Frames: {} (stalls {}, capture errors {})",
            report.ticks, report.stalls, report.capture_errors
        );
    }
    Ok(())
}

pub fn presets(json: bool) {
    if json {
        let sens: Vec<_> = Sensitivity::ALL
            .iter()
            .map(|s| {
                json!({
                    "id": s.name(),
                    "threshold_px": s.threshold_px(),
                    "min_detections": s.min_detections(),
                })
            })
            .collect();
        let procs: Vec<_> = PROCEDURES
            .iter()
            .map(|p| {
                json!({
                    "id": p.id,
                    "name": p.name,
                    "sensitivity": p.sensitivity.name(),
                    "threshold_px": p.threshold_px,
                    "time_threshold_s": p.time_threshold_s,
                    "criticality": p.criticality.name(),
                    "typical_duration": p.typical_duration,
                })
            })
            .collect();
        let pops: Vec<_> = POPULATIONS
            .iter()
            .map(|p| {
                json!({
                    "id": p.id,
                    "name": p.name,
                    "threshold_modifier": p.threshold_modifier,
                    "time_modifier": p.time_modifier,
                    "announce_interval_s": p.announce_interval_s,
                })
            })
            .collect();
        println!(
            "{}",
            json!({ "sensitivities": sens, "procedures": procs, "populations": pops })
        );
        return;
    }

    println!("Sensitivities:");
    for s in Sensitivity::ALL {
        println!(
            "  {:<8} {:>3} px  {:>3} samples",
            s.name(),
            s.threshold_px(),
            s.min_detections()
        );
    }
    println!("Procedures:");
    for p in PROCEDURES {
        println!(
            "  {:<24} {:>3} px  {:>4.1} s  {:<6}  {:<8}  {}",
            p.id,
            p.threshold_px,
            p.time_threshold_s,
            p.sensitivity.name(),
            p.criticality.name(),
            p.name
        );
    }
    println!("Populations:");
    for p in POPULATIONS {
        println!(
            "  {:<13} threshold x{:.1}  time x{:.1}  remind every {:.0} s",
            p.id, p.threshold_modifier, p.time_modifier, p.announce_interval_s
        );
    }
}

/// Validate config and confirm a perfectly still subject reaches ready.
pub fn self_check(cfg: &Config, json: bool) -> eyre::Result<()> {
    let eff = cfg.effective()?;
    let verdict = offline_probe(&eff).wrap_err("offline analyzer probe")?;
    if verdict != Verdict::Ready {
        eyre::bail!(
            "self-check failed: stationary subject ended {} instead of ready",
            verdict.name()
        );
    }
    if json {
        println!(
            "{}",
            json!({
                "status": "ok",
                "threshold_px": eff.threshold_px,
                "min_detections": eff.min_detections,
                "time_threshold_s": eff.time_threshold_s,
                "procedure": eff.procedure.as_ref().map(|p| p.id),
            })
        );
    } else {
        println!(
            "OK: {} px over {} samples, hold {:.1} s",
            eff.threshold_px, eff.min_detections, eff.time_threshold_s
        );
    }
    Ok(())
}

/// Feed a stationary subject at the configured rate until the dwell
/// requirement is comfortably covered.
fn offline_probe(eff: &Effective) -> eyre::Result<Verdict> {
    let clock = ManualClock::new();
    let mut m = Monitor::builder()
        .with_settings(eff)
        .with_clock(Box::new(clock.clone()))
        .build()?;
    let period_ms = steady_core::util::period_ms(eff.sample_rate_hz);
    let dwell_ticks = (eff.time_threshold_s * 1000.0 / period_ms as f64).ceil() as u64;
    let ticks = dwell_ticks.max(u64::from(eff.min_detections)) + 5;
    let mut verdict = Verdict::Searching;
    for i in 0..=ticks {
        clock.set_ms(i * period_ms);
        verdict = m.ingest(Some(Centroid::new(320.0, 240.0))).verdict;
    }
    // Intents must be accepted on a ready subject.
    match m.request_start(false)? {
        StartOutcome::Started { .. } => {
            m.request_stop()?;
        }
        StartOutcome::NeedsConfirmation { .. } => {
            eyre::bail!("start was not authorized on a ready subject")
        }
    }
    Ok(verdict)
}

pub fn health(json: bool) {
    if json {
        println!(
            "{}",
            json!({ "status": "ok", "version": env!("CARGO_PKG_VERSION") })
        );
    } else {
        println!("ok");
    }
}
