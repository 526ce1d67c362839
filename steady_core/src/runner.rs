use crate::error::{BuildError, Result};
use crate::events::Event;
use crate::monitor::SharedMonitor;
use crate::sampler::Sampler;
use crate::session::StartOutcome;
use crate::status::StatusSnapshot;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use steady_traits::PositionSource;
use steady_traits::clock::{Clock, MonotonicClock};

/// How long and how the ingestion loop runs.
#[derive(Debug, Clone)]
pub struct RunParams {
    pub sample_rate_hz: u32,
    /// Hard cap; `None` runs until `shutdown` is raised.
    pub max_duration: Option<Duration>,
    /// Start the procedure on the first `BecameReady` and stop it at exit.
    pub auto_start: bool,
}

impl Default for RunParams {
    fn default() -> Self {
        Self {
            sample_rate_hz: 30,
            max_duration: None,
            auto_start: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RunReport {
    /// Observations handed to the monitor, stall ticks included.
    pub ticks: u64,
    /// Times the source stopped delivering for longer than the stall threshold.
    pub stalls: u64,
    pub capture_errors: u64,
    /// Every event emitted during the run, in order.
    pub events: Vec<Event>,
    /// Duration of the procedure closed at exit (auto-start only).
    pub session_duration: Option<Duration>,
    pub final_snapshot: StatusSnapshot,
}

/// Stall threshold in milliseconds.
///
/// Four sampling periods, so a couple of late frames do not count as a stall,
/// kept strictly below the run cap so the stall can still be reported.
#[inline]
fn compute_stall_threshold_ms(period_ms: u64, max_run_ms: Option<u64>) -> u64 {
    let t = four_periods_ms(period_ms);
    match max_run_ms {
        Some(max) => cap_below_max_run(t, max),
        None => t.max(1),
    }
}

#[inline]
fn four_periods_ms(period_ms: u64) -> u64 {
    period_ms.saturating_mul(4)
}

/// Cap a threshold to be strictly below `max_run_ms` and at least 1ms.
#[inline]
fn cap_below_max_run(threshold: u64, max_run_ms: u64) -> u64 {
    threshold.min(max_run_ms.saturating_sub(1)).max(1)
}

/// Drive ingestion from `source` until `shutdown` or `max_duration`.
pub fn run<P>(
    source: P,
    monitor: &SharedMonitor,
    params: &RunParams,
    shutdown: &AtomicBool,
) -> Result<RunReport>
where
    P: PositionSource + Send + 'static,
{
    run_with_clock(source, monitor, params, shutdown, Arc::new(MonotonicClock::new()))
}

/// As `run`, pacing the sampler and measuring the run with `clock`.
pub fn run_with_clock<P>(
    source: P,
    monitor: &SharedMonitor,
    params: &RunParams,
    shutdown: &AtomicBool,
    clock: Arc<dyn Clock + Send + Sync>,
) -> Result<RunReport>
where
    P: PositionSource + Send + 'static,
{
    if params.sample_rate_hz == 0 {
        return Err(eyre::Report::new(BuildError::InvalidConfig(
            "sample_rate_hz must be > 0",
        )));
    }
    let period_ms = crate::util::period_ms(params.sample_rate_hz);
    let period = Duration::from_millis(period_ms);
    let max_run_ms = params
        .max_duration
        .map(|d| d.as_millis().min(u128::from(u64::MAX)) as u64);
    let stall_threshold_ms = compute_stall_threshold_ms(period_ms, max_run_ms);

    let epoch = clock.now();
    let sampler = Sampler::spawn_shared(source, params.sample_rate_hz, clock.clone());
    tracing::info!(
        hz = params.sample_rate_hz,
        max_run_ms,
        auto_start = params.auto_start,
        "monitoring start"
    );

    let mut ticks = 0u64;
    let mut stalls = 0u64;
    let mut stalled = false;
    let mut events = Vec::new();

    loop {
        if shutdown.load(Ordering::Relaxed) {
            tracing::info!("shutdown requested");
            break;
        }
        if max_run_ms.is_some_and(|max| clock.ms_since(epoch) >= max) {
            break;
        }

        let tick = if let Some(sample) = sampler.recv_timeout(period) {
            stalled = false;
            monitor.ingest(sample.detection.map(|d| d.centroid))
        } else if !stalled && sampler.stalled_for_now() > stall_threshold_ms {
            // The camera went quiet: report the subject as lost rather than
            // letting the last verdict stand.
            stalled = true;
            stalls += 1;
            tracing::warn!(stall_threshold_ms, "position source stalled");
            monitor.ingest(None)
        } else {
            continue;
        };
        ticks += 1;

        let became_ready = tick.events.contains(&Event::BecameReady);
        events.extend(tick.events);
        if params.auto_start && became_ready {
            auto_start(monitor, &mut events);
        }
    }

    let mut session_duration = None;
    if params.auto_start {
        let stopped = monitor.with(|m| {
            let tier = m.session().tier()?;
            m.request_stop().ok().map(|duration| (tier, duration))
        });
        if let Some((tier, duration)) = stopped {
            session_duration = Some(duration);
            events.push(Event::SessionStopped { tier, duration });
        }
    }

    let final_snapshot = monitor.snapshot();
    let capture_errors = sampler.errors();
    drop(sampler);
    tracing::info!(
        ticks,
        stalls,
        capture_errors,
        verdict = final_snapshot.verdict.name(),
        "monitoring end"
    );

    Ok(RunReport {
        ticks,
        stalls,
        capture_errors,
        events,
        session_duration,
        final_snapshot,
    })
}

fn auto_start(monitor: &SharedMonitor, events: &mut Vec<Event>) {
    match monitor.request_start(false) {
        Ok(outcome @ StartOutcome::Started { .. }) => events.push(outcome.into()),
        // Ready can be lost between the tick and the request.
        Ok(outcome @ StartOutcome::NeedsConfirmation { .. }) => {
            tracing::debug!(?outcome, "auto start deferred");
        }
        Err(e) => tracing::debug!(error = %e, "auto start skipped"),
    }
}

#[cfg(test)]
mod tests {
    use super::{cap_below_max_run, compute_stall_threshold_ms, four_periods_ms};

    #[test]
    fn four_periods_is_quadruple_period() {
        assert_eq!(four_periods_ms(1), 4);
        assert_eq!(four_periods_ms(33), 132);
    }

    #[test]
    fn cap_below_max_run_enforces_bounds() {
        assert_eq!(cap_below_max_run(5000, 100), 99);
        assert_eq!(cap_below_max_run(10, 1), 1);
        assert_eq!(cap_below_max_run(5, 100), 5);
    }

    #[test]
    fn stall_threshold_without_cap() {
        assert_eq!(compute_stall_threshold_ms(33, None), 132);
    }

    #[test]
    fn stall_threshold_stays_below_short_run() {
        assert_eq!(compute_stall_threshold_ms(100, Some(250)), 249);
        assert_eq!(compute_stall_threshold_ms(100, Some(1)), 1);
    }
}
