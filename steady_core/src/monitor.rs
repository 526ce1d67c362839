//! The analyzer + session pair for one monitoring session.
//!
//! `Monitor` owns both halves plus the clock that timestamps ticks and
//! intents. `SharedMonitor` puts a `Monitor` behind one mutex so the
//! ingestion loop and independently scheduled intent handlers are
//! serialized: a session decision always sees the verdict of the most
//! recently completed ingestion.

use crate::analyzer::StabilityAnalyzer;
use crate::config::{AnalyzerCfg, MonitorCfg, SensitivityProfile};
use crate::error::{BuildError, IntentError, Result};
use crate::events::{Event, Notifier};
use crate::session::{ProcedureSession, SessionState, StartOutcome};
use crate::status::{StatusSnapshot, Verdict};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};
use steady_traits::Centroid;
use steady_traits::clock::{Clock, MonotonicClock};

/// Result of one ingestion.
#[derive(Debug, Clone, PartialEq)]
pub struct Tick {
    pub verdict: Verdict,
    pub events: Vec<Event>,
}

pub struct Monitor {
    analyzer: StabilityAnalyzer,
    session: ProcedureSession,
    clock: Arc<dyn Clock + Send + Sync>,
    epoch: Instant,
    announce_interval_ms: u64,
    last_reminder_ms: Option<u64>,
    notifier: Option<Box<dyn Notifier + Send>>,
}

impl core::fmt::Debug for Monitor {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Monitor")
            .field("verdict", &self.analyzer.verdict())
            .field("score", &self.analyzer.score())
            .field("session", &self.session.state())
            .finish()
    }
}

impl Monitor {
    pub fn builder() -> MonitorBuilder {
        MonitorBuilder::default()
    }

    /// Milliseconds since this monitor was built.
    #[inline]
    pub fn now_ms(&self) -> u64 {
        self.clock.ms_since(self.epoch)
    }

    /// Feed one tick's observation, timestamped with the monitor clock.
    pub fn ingest(&mut self, sample: Option<Centroid>) -> Tick {
        let now = self.now_ms();
        self.ingest_at(sample, now)
    }

    /// Feed one observation with an explicit timestamp (ms since epoch),
    /// e.g. when replaying a recorded trace.
    pub fn ingest_at(&mut self, sample: Option<Centroid>, now: u64) -> Tick {
        let was_ready = self.analyzer.verdict().is_ready();
        let verdict = self.analyzer.ingest(sample, now);

        let mut events = Vec::new();
        match (was_ready, verdict.is_ready()) {
            (false, true) => {
                events.push(Event::BecameReady);
                // The edge itself is the announcement.
                self.last_reminder_ms = Some(now);
            }
            (true, false) => {
                events.push(Event::LostReady);
                self.remind(verdict, now, &mut events);
            }
            _ => self.remind(verdict, now, &mut events),
        }
        self.dispatch(&events);
        Tick { verdict, events }
    }

    fn remind(&mut self, verdict: Verdict, now: u64, events: &mut Vec<Event>) {
        match verdict {
            Verdict::Ready | Verdict::Stabilizing => {
                if self.announce_interval_ms == 0 || self.session.is_active() {
                    return;
                }
                let due = self
                    .last_reminder_ms
                    .is_none_or(|t| now.saturating_sub(t) >= self.announce_interval_ms);
                if due {
                    events.push(if verdict.is_ready() {
                        Event::ReadyReminder
                    } else {
                        Event::HoldingReminder
                    });
                    self.last_reminder_ms = Some(now);
                }
            }
            // Losing the subject re-arms the reminder.
            Verdict::Unstable | Verdict::Searching => self.last_reminder_ms = None,
        }
    }

    fn dispatch(&mut self, events: &[Event]) {
        if let Some(n) = self.notifier.as_mut() {
            for e in events {
                n.notify(e);
            }
        }
    }

    /// Operator asks to start the procedure; see `ProcedureSession`.
    pub fn request_start(&mut self, force: bool) -> std::result::Result<StartOutcome, IntentError> {
        let now = self.now_ms();
        let verdict = self.analyzer.verdict();
        match self.session.request_start(force, verdict, now) {
            Ok(outcome) => {
                match outcome {
                    StartOutcome::Started { tier, warning } => tracing::info!(
                        tier = tier.name(),
                        warning,
                        verdict = verdict.name(),
                        score = self.analyzer.score(),
                        "procedure started"
                    ),
                    StartOutcome::NeedsConfirmation { tier } => tracing::info!(
                        tier = tier.name(),
                        verdict = verdict.name(),
                        "start needs confirmation"
                    ),
                }
                self.dispatch(&[outcome.into()]);
                Ok(outcome)
            }
            Err(e) => {
                tracing::debug!(error = %e, "start rejected");
                Err(e)
            }
        }
    }

    /// Operator stops the active procedure.
    pub fn request_stop(&mut self) -> std::result::Result<Duration, IntentError> {
        let now = self.now_ms();
        let tier = self.session.tier();
        match self.session.request_stop(now) {
            Ok(duration) => {
                tracing::info!(duration_ms = duration.as_millis() as u64, "procedure stopped");
                if let Some(tier) = tier {
                    self.dispatch(&[Event::SessionStopped { tier, duration }]);
                }
                Ok(duration)
            }
            Err(e) => {
                tracing::debug!(error = %e, "stop rejected");
                Err(e)
            }
        }
    }

    /// Reset session and analyzer. Always legal.
    pub fn reset(&mut self) -> Vec<Event> {
        if self.session.is_active() {
            tracing::warn!("reset while a procedure is active");
        }
        let mut events = Vec::new();
        if self.analyzer.verdict().is_ready() {
            events.push(Event::LostReady);
        }
        self.session.reset();
        self.analyzer.reset();
        self.last_reminder_ms = None;
        events.push(Event::AnalysisReset);
        self.dispatch(&events);
        events
    }

    /// Swap the sensitivity profile; resets the analyzer, not the session.
    pub fn set_sensitivity(&mut self, profile: SensitivityProfile) -> Result<Vec<Event>> {
        validate_profile(&profile)?;
        let mut events = Vec::new();
        if self.analyzer.verdict().is_ready() {
            events.push(Event::LostReady);
        }
        self.analyzer.reconfigure(profile);
        self.last_reminder_ms = None;
        events.push(Event::SensitivityChanged { profile });
        self.dispatch(&events);
        Ok(events)
    }

    /// Change the dwell requirement without resetting the analyzer.
    pub fn set_time_threshold(&mut self, time_threshold: Duration) -> Result<Vec<Event>> {
        if time_threshold.is_zero() {
            return Err(eyre::Report::new(BuildError::InvalidConfig(
                "time_threshold must be > 0",
            )));
        }
        self.analyzer.set_time_threshold(time_threshold);
        tracing::info!(
            time_threshold_ms = time_threshold.as_millis() as u64,
            "time threshold changed"
        );
        let events = vec![Event::TimeThresholdChanged { time_threshold }];
        self.dispatch(&events);
        Ok(events)
    }

    #[inline]
    pub fn verdict(&self) -> Verdict {
        self.analyzer.verdict()
    }

    #[inline]
    pub fn session_state(&self) -> SessionState {
        self.session.state()
    }

    #[inline]
    pub fn session(&self) -> &ProcedureSession {
        &self.session
    }

    /// Read-only access for reporting; mutation goes through the monitor.
    #[inline]
    pub fn analyzer(&self) -> &StabilityAnalyzer {
        &self.analyzer
    }

    pub fn snapshot(&self) -> StatusSnapshot {
        let now = self.now_ms();
        let stats = self.analyzer.stats();
        let profile = self.analyzer.profile();
        StatusSnapshot {
            verdict: self.analyzer.verdict(),
            score: self.analyzer.score(),
            dwell: self.analyzer.dwell(now),
            total_ticks: stats.total_ticks,
            stable_ticks: stats.stable_ticks,
            stability_percentage: self.analyzer.stability_percentage(),
            max_movement: stats.max_movement,
            position_spread: self.analyzer.position_spread(),
            threshold_px: profile.threshold_px,
            min_detections: profile.min_detections,
            time_threshold: self.analyzer.time_threshold(),
            session: self.session.state(),
            session_elapsed: self.session.elapsed(now),
        }
    }
}

fn validate_profile(profile: &SensitivityProfile) -> Result<()> {
    if profile.threshold_px == 0 {
        return Err(eyre::Report::new(BuildError::InvalidConfig(
            "threshold_px must be > 0",
        )));
    }
    if profile.min_detections == 0 {
        return Err(eyre::Report::new(BuildError::InvalidConfig(
            "min_detections must be > 0",
        )));
    }
    Ok(())
}

/// Builder for `Monitor`. All fields are validated on `build()`.
#[derive(Default)]
pub struct MonitorBuilder {
    analyzer: Option<AnalyzerCfg>,
    monitor: Option<MonitorCfg>,
    clock: Option<Box<dyn Clock + Send + Sync>>,
    notifier: Option<Box<dyn Notifier + Send>>,
}

impl MonitorBuilder {
    pub fn with_analyzer(mut self, cfg: AnalyzerCfg) -> Self {
        self.analyzer = Some(cfg);
        self
    }
    pub fn with_profile(mut self, profile: SensitivityProfile) -> Self {
        let mut a = self.analyzer.unwrap_or_default();
        a.profile = profile;
        self.analyzer = Some(a);
        self
    }
    pub fn with_time_threshold(mut self, time_threshold: Duration) -> Self {
        let mut a = self.analyzer.unwrap_or_default();
        a.time_threshold = time_threshold;
        self.analyzer = Some(a);
        self
    }
    pub fn with_position_history(mut self, n: usize) -> Self {
        let mut a = self.analyzer.unwrap_or_default();
        a.position_history = n;
        self.analyzer = Some(a);
        self
    }
    pub fn with_monitor(mut self, cfg: MonitorCfg) -> Self {
        self.monitor = Some(cfg);
        self
    }
    pub fn with_announce_interval(mut self, interval: Duration) -> Self {
        self.monitor = Some(MonitorCfg {
            announce_interval: interval,
        });
        self
    }
    /// Provide a custom clock implementation; defaults to MonotonicClock when not provided.
    pub fn with_clock(mut self, clock: Box<dyn Clock + Send + Sync>) -> Self {
        self.clock = Some(clock);
        self
    }
    pub fn with_notifier(mut self, notifier: impl Notifier + Send + 'static) -> Self {
        self.notifier = Some(Box::new(notifier));
        self
    }

    /// Apply resolved TOML settings (profile, dwell, history, reminders).
    pub fn with_settings(self, eff: &steady_config::Effective) -> Self {
        self.with_analyzer(eff.into()).with_monitor(eff.into())
    }

    pub fn build(self) -> Result<Monitor> {
        let MonitorBuilder {
            analyzer,
            monitor,
            clock,
            notifier,
        } = self;
        let analyzer = analyzer.unwrap_or_default();
        let monitor = monitor.unwrap_or_default();

        validate_profile(&analyzer.profile)?;
        if analyzer.time_threshold.is_zero() {
            return Err(eyre::Report::new(BuildError::InvalidConfig(
                "time_threshold must be > 0",
            )));
        }
        if analyzer.position_history < 2 {
            return Err(eyre::Report::new(BuildError::InvalidConfig(
                "position_history must be >= 2",
            )));
        }

        let clock: Arc<dyn Clock + Send + Sync> = match clock {
            Some(b) => Arc::from(b),
            None => Arc::new(MonotonicClock::new()),
        };
        let epoch = clock.now();
        let announce_interval_ms = monitor.announce_interval.as_millis().min(u128::from(u64::MAX)) as u64;

        Ok(Monitor {
            analyzer: StabilityAnalyzer::new(analyzer),
            session: ProcedureSession::new(),
            clock,
            epoch,
            announce_interval_ms,
            last_reminder_ms: None,
            notifier,
        })
    }
}

/// A `Monitor` behind a single lock, shared by the ingestion loop and
/// intent handlers.
#[derive(Clone)]
pub struct SharedMonitor {
    inner: Arc<Mutex<Monitor>>,
}

impl core::fmt::Debug for SharedMonitor {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        self.lock().fmt(f)
    }
}

impl From<Monitor> for SharedMonitor {
    fn from(m: Monitor) -> Self {
        Self::new(m)
    }
}

impl SharedMonitor {
    pub fn new(monitor: Monitor) -> Self {
        Self {
            inner: Arc::new(Mutex::new(monitor)),
        }
    }

    /// A panic elsewhere must not stop monitoring: recover poisoned locks.
    fn lock(&self) -> MutexGuard<'_, Monitor> {
        self.inner.lock().unwrap_or_else(|poisoned| {
            tracing::warn!("monitor lock poisoned; recovering");
            poisoned.into_inner()
        })
    }

    /// Run `f` with exclusive access, for multi-step operations that must
    /// observe one consistent state.
    pub fn with<R>(&self, f: impl FnOnce(&mut Monitor) -> R) -> R {
        f(&mut self.lock())
    }

    pub fn ingest(&self, sample: Option<Centroid>) -> Tick {
        self.lock().ingest(sample)
    }

    pub fn request_start(&self, force: bool) -> std::result::Result<StartOutcome, IntentError> {
        self.lock().request_start(force)
    }

    pub fn request_stop(&self) -> std::result::Result<Duration, IntentError> {
        self.lock().request_stop()
    }

    pub fn reset(&self) -> Vec<Event> {
        self.lock().reset()
    }

    pub fn set_sensitivity(&self, profile: SensitivityProfile) -> Result<Vec<Event>> {
        self.lock().set_sensitivity(profile)
    }

    pub fn set_time_threshold(&self, time_threshold: Duration) -> Result<Vec<Event>> {
        self.lock().set_time_threshold(time_threshold)
    }

    pub fn verdict(&self) -> Verdict {
        self.lock().verdict()
    }

    pub fn snapshot(&self) -> StatusSnapshot {
        self.lock().snapshot()
    }
}
