//! Operator-facing rendering of monitor events.
//!
//! Stands in for the voice channel: every event becomes one announcement
//! line on stdout (or one JSON object) plus a structured log record.

use serde_json::{Value, json};
use std::time::Duration;
use steady_core::{Event, StatusSnapshot, Tier};

/// Text an operator would hear for `event`.
pub fn announcement(event: &Event) -> String {
    match event {
        Event::BecameReady => "Patient is stable. Ready to begin.".to_string(),
        Event::LostReady => "Patient moved. Please hold still.".to_string(),
        Event::SessionStarted { tier, warning } => match (*tier, *warning) {
            (_, true) => "Procedure started despite movement. Watch the patient closely.".to_string(),
            (Tier::Yellow, _) => "Procedure started before the hold time was reached.".to_string(),
            _ => "Procedure started.".to_string(),
        },
        Event::SessionStopped { duration, .. } => {
            format!("Procedure complete after {}.", human_duration(*duration))
        }
        Event::NeedsConfirmation { tier } => match tier {
            Tier::Yellow => "Patient still settling. Confirm to start anyway.".to_string(),
            _ => "Patient is not stable. Confirm to start anyway.".to_string(),
        },
        Event::AnalysisReset => "Analysis reset.".to_string(),
        Event::SensitivityChanged { profile } => format!(
            "Sensitivity changed to {} px over {} samples.",
            profile.threshold_px, profile.min_detections
        ),
        Event::TimeThresholdChanged { time_threshold } => format!(
            "Hold time changed to {}.",
            human_duration(*time_threshold)
        ),
        Event::ReadyReminder => "Patient remains ready.".to_string(),
        Event::HoldingReminder => "Holding position, please stay still.".to_string(),
    }
}

fn human_duration(d: Duration) -> String {
    let secs = d.as_secs_f64();
    if secs < 60.0 {
        format!("{secs:.1} seconds")
    } else {
        format!("{:.0} min {:.0} s", (secs / 60.0).floor(), secs % 60.0)
    }
}

pub fn event_json(event: &Event, t_ms: Option<u64>) -> Value {
    let mut v = json!({
        "event": event.name(),
        "message": announcement(event),
    });
    if let Some(t) = t_ms {
        v["t_ms"] = json!(t);
    }
    match event {
        Event::SessionStarted { tier, warning } => {
            v["tier"] = json!(tier.name());
            v["warning"] = json!(warning);
        }
        Event::SessionStopped { tier, duration } => {
            v["tier"] = json!(tier.name());
            v["duration_ms"] = json!(duration.as_millis() as u64);
        }
        Event::NeedsConfirmation { tier } => v["tier"] = json!(tier.name()),
        Event::SensitivityChanged { profile } => {
            v["threshold_px"] = json!(profile.threshold_px);
            v["min_detections"] = json!(profile.min_detections);
        }
        Event::TimeThresholdChanged { time_threshold } => {
            v["time_threshold_ms"] = json!(time_threshold.as_millis() as u64);
        }
        _ => {}
    }
    v
}

pub fn snapshot_json(s: &StatusSnapshot) -> Value {
    json!({
        "verdict": s.verdict.name(),
        "score": s.score,
        "dwell_ms": s.dwell.as_millis() as u64,
        "total_ticks": s.total_ticks,
        "stable_ticks": s.stable_ticks,
        "stability_percentage": s.stability_percentage,
        "max_movement": s.max_movement,
        "position_spread": s.position_spread,
        "threshold_px": s.threshold_px,
        "min_detections": s.min_detections,
        "time_threshold_ms": s.time_threshold.as_millis() as u64,
        "session": s.session.name(),
        "session_elapsed_ms": s.session_elapsed.map(|d| d.as_millis() as u64),
    })
}

/// Print one event, prefixed with its trace time when known.
pub fn print_event(event: &Event, t_ms: Option<u64>, json: bool) {
    tracing::info!(event = event.name(), t_ms, "announce");
    if json {
        println!("{}", event_json(event, t_ms));
    } else {
        match t_ms {
            Some(t) => println!("[{t:>8} ms] {:<20} {}", event.name(), announcement(event)),
            None => println!("{:<20} {}", event.name(), announcement(event)),
        }
    }
}

pub fn print_summary(s: &StatusSnapshot, json: bool) {
    if json {
        println!("{}", json!({ "summary": snapshot_json(s) }));
        return;
    }
    println!("--- Stability summary ---");
    println!("Verdict: {} (score {:.0})", s.verdict.name(), s.score);
    println!(
        "Ticks: {} stable / {} total ({:.1}%)",
        s.stable_ticks, s.total_ticks, s.stability_percentage
    );
    println!(
        "Max movement: {:.1} px, spread {:.1} px (threshold {} px)",
        s.max_movement, s.position_spread, s.threshold_px
    );
    println!(
        "Dwell: {} of {}",
        human_duration(s.dwell),
        human_duration(s.time_threshold)
    );
    match s.session_elapsed {
        Some(e) => println!("Session: {} ({})", s.session.name(), human_duration(e)),
        None => println!("Session: {}", s.session.name()),
    }
}

/// `Notifier` that prints live events; used where no trace time exists.
pub struct ConsoleNotifier {
    pub json: bool,
}

impl steady_core::Notifier for ConsoleNotifier {
    fn notify(&mut self, event: &Event) {
        print_event(event, None, self.json);
    }
}
