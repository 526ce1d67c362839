//! Discrete events handed to the notification collaborator.
//!
//! The core only emits values; rendering them as speech or UI text is up to
//! the `Notifier`.

use crate::config::SensitivityProfile;
use crate::session::{StartOutcome, Tier};
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    /// Verdict entered `Ready`.
    BecameReady,
    /// Verdict left `Ready`.
    LostReady,
    SessionStarted { tier: Tier, warning: bool },
    SessionStopped { tier: Tier, duration: Duration },
    NeedsConfirmation { tier: Tier },
    /// Analyzer and session were reset by the operator.
    AnalysisReset,
    SensitivityChanged { profile: SensitivityProfile },
    TimeThresholdChanged { time_threshold: Duration },
    /// Periodic reminder: ready and waiting for the operator.
    ReadyReminder,
    /// Periodic reminder: subject in position, dwell accruing.
    HoldingReminder,
}

impl Event {
    /// Stable identifier for structured output.
    pub const fn name(&self) -> &'static str {
        match self {
            Event::BecameReady => "BecameReady",
            Event::LostReady => "LostReady",
            Event::SessionStarted { .. } => "SessionStarted",
            Event::SessionStopped { .. } => "SessionStopped",
            Event::NeedsConfirmation { .. } => "NeedsConfirmation",
            Event::AnalysisReset => "AnalysisReset",
            Event::SensitivityChanged { .. } => "SensitivityChanged",
            Event::TimeThresholdChanged { .. } => "TimeThresholdChanged",
            Event::ReadyReminder => "ReadyReminder",
            Event::HoldingReminder => "HoldingReminder",
        }
    }
}

impl From<StartOutcome> for Event {
    fn from(o: StartOutcome) -> Self {
        match o {
            StartOutcome::Started { tier, warning } => Event::SessionStarted { tier, warning },
            StartOutcome::NeedsConfirmation { tier } => Event::NeedsConfirmation { tier },
        }
    }
}

/// Receives every event the monitor emits, in emission order.
pub trait Notifier {
    fn notify(&mut self, event: &Event);
}

impl<F> Notifier for F
where
    F: FnMut(&Event),
{
    fn notify(&mut self, event: &Event) {
        self(event)
    }
}
