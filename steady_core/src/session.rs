//! Procedure session: start/stop arbitration gated by the stability verdict.
//!
//! ```text
//! Idle --start, Ready--------------------> Active{Green}
//! Idle --start, Stabilizing--------------> Idle (NeedsConfirmation{Yellow})
//! Idle --start{force}, Stabilizing-------> Active{Yellow}
//! Idle --start, Unstable|Searching-------> Idle (NeedsConfirmation{Red})
//! Idle --start{force}, Unstable|Searching> Active{Red} + warning
//! Active --stop--------------------------> Completed{duration}
//! Completed --start----------------------> Idle, then evaluated as above
//! any --reset----------------------------> Idle
//! ```
//!
//! The session never aborts an active procedure on its own; a degrading
//! verdict is only reported.

use crate::error::IntentError;
use crate::status::Verdict;
use std::time::Duration;

/// Risk tier recorded when a procedure starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tier {
    /// Fully authorized.
    Green,
    /// Authorized with acknowledged reduced dwell confidence.
    Yellow,
    /// Authorized with acknowledged instability risk.
    Red,
}

impl Tier {
    pub const fn for_verdict(verdict: Verdict) -> Self {
        match verdict {
            Verdict::Ready => Tier::Green,
            Verdict::Stabilizing => Tier::Yellow,
            Verdict::Unstable | Verdict::Searching => Tier::Red,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Tier::Green => "green",
            Tier::Yellow => "yellow",
            Tier::Red => "red",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    Idle,
    Active { tier: Tier, started_at_ms: u64 },
    /// Terminal display state; left on the next start or reset.
    Completed { tier: Tier, duration: Duration },
}

impl SessionState {
    pub const fn name(&self) -> &'static str {
        match self {
            SessionState::Idle => "idle",
            SessionState::Active { .. } => "active",
            SessionState::Completed { .. } => "completed",
        }
    }
}

/// Reply to an accepted start request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    /// The procedure is now active. `warning` is set for a forced red start.
    Started { tier: Tier, warning: bool },
    /// Nothing changed; the operator must repeat the request with `force`.
    NeedsConfirmation { tier: Tier },
}

#[derive(Debug, Clone, Default)]
pub struct ProcedureSession {
    state: SessionState,
}

impl ProcedureSession {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn state(&self) -> SessionState {
        self.state
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        matches!(self.state, SessionState::Active { .. })
    }

    /// Tier of the active or last completed procedure.
    pub fn tier(&self) -> Option<Tier> {
        match self.state {
            SessionState::Idle => None,
            SessionState::Active { tier, .. } | SessionState::Completed { tier, .. } => Some(tier),
        }
    }

    /// Running time of an active procedure at `now_ms`.
    pub fn elapsed(&self, now_ms: u64) -> Option<Duration> {
        match self.state {
            SessionState::Active { started_at_ms, .. } => {
                Some(Duration::from_millis(now_ms.saturating_sub(started_at_ms)))
            }
            _ => None,
        }
    }

    pub fn request_start(
        &mut self,
        force: bool,
        verdict: Verdict,
        now_ms: u64,
    ) -> Result<StartOutcome, IntentError> {
        match self.state {
            SessionState::Active { .. } => return Err(IntentError::AlreadyActive),
            SessionState::Completed { .. } => self.state = SessionState::Idle,
            SessionState::Idle => {}
        }

        let tier = Tier::for_verdict(verdict);
        if tier == Tier::Green || force {
            self.state = SessionState::Active {
                tier,
                started_at_ms: now_ms,
            };
            Ok(StartOutcome::Started {
                tier,
                warning: tier == Tier::Red,
            })
        } else {
            Ok(StartOutcome::NeedsConfirmation { tier })
        }
    }

    /// Stop the active procedure and return its duration. Clock skew clamps
    /// the duration to zero.
    pub fn request_stop(&mut self, now_ms: u64) -> Result<Duration, IntentError> {
        let SessionState::Active {
            tier,
            started_at_ms,
        } = self.state
        else {
            return Err(IntentError::NotActive);
        };
        let duration = Duration::from_millis(now_ms.saturating_sub(started_at_ms));
        self.state = SessionState::Completed { tier, duration };
        Ok(duration)
    }

    /// Always legal.
    pub fn reset(&mut self) {
        self.state = SessionState::Idle;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forced_yellow_start_records_tier() {
        let mut s = ProcedureSession::new();
        let out = s.request_start(true, Verdict::Stabilizing, 10).unwrap();
        assert_eq!(
            out,
            StartOutcome::Started {
                tier: Tier::Yellow,
                warning: false
            }
        );
        assert_eq!(s.tier(), Some(Tier::Yellow));
        assert_eq!(s.elapsed(1010), Some(Duration::from_secs(1)));
    }

    #[test]
    fn completed_reverts_to_idle_on_unconfirmed_start() {
        let mut s = ProcedureSession::new();
        s.request_start(false, Verdict::Ready, 0).unwrap();
        s.request_stop(500).unwrap();
        let out = s.request_start(false, Verdict::Unstable, 600).unwrap();
        assert_eq!(out, StartOutcome::NeedsConfirmation { tier: Tier::Red });
        assert_eq!(s.state(), SessionState::Idle);
    }

    #[test]
    fn stop_duration_clamps_on_skew() {
        let mut s = ProcedureSession::new();
        s.request_start(false, Verdict::Ready, 1000).unwrap();
        assert_eq!(s.request_stop(400), Ok(Duration::ZERO));
    }

    #[test]
    fn reset_is_always_legal() {
        let mut s = ProcedureSession::new();
        s.reset();
        assert_eq!(s.state(), SessionState::Idle);
        s.request_start(true, Verdict::Searching, 0).unwrap();
        s.reset();
        assert_eq!(s.state(), SessionState::Idle);
        assert_eq!(s.tier(), None);
    }
}
