use rstest::rstest;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use steady_core::error::BuildError;
use steady_core::{
    Centroid, Event, IntentError, Monitor, SensitivityProfile, SessionState, StartOutcome, Tier,
    Verdict,
};
use steady_traits::ManualClock;

const HOME: Centroid = Centroid::new(320.0, 240.0);

fn monitor(clock: &ManualClock, time_threshold_ms: u64) -> Monitor {
    Monitor::builder()
        .with_profile(SensitivityProfile {
            threshold_px: 10,
            min_detections: 5,
        })
        .with_time_threshold(Duration::from_millis(time_threshold_ms))
        .with_announce_interval(Duration::ZERO)
        .with_clock(Box::new(clock.clone()))
        .build()
        .unwrap()
}

fn feed(m: &mut Monitor, clock: &ManualClock, t_ms: u64, c: Option<Centroid>) -> steady_core::Tick {
    clock.set_ms(t_ms);
    m.ingest(c)
}

/// Drive a fresh monitor until it reports `target`.
fn monitor_in(target: Verdict) -> (Monitor, ManualClock) {
    let clock = ManualClock::new();
    let mut m = monitor(&clock, 1000);
    match target {
        Verdict::Searching => {}
        Verdict::Unstable => {
            feed(&mut m, &clock, 0, Some(HOME));
            feed(&mut m, &clock, 100, Some(Centroid::new(400.0, 240.0)));
        }
        Verdict::Stabilizing => {
            feed(&mut m, &clock, 0, Some(HOME));
            feed(&mut m, &clock, 100, Some(HOME));
        }
        Verdict::Ready => {
            for t in 0..=10 {
                feed(&mut m, &clock, t * 200, Some(HOME));
            }
        }
    }
    assert_eq!(m.verdict(), target);
    (m, clock)
}

#[test]
fn one_tick_per_second_scenario() {
    let clock = ManualClock::new();
    let mut m = monitor(&clock, 3000);

    // The first detection only seeds the reference position.
    assert_eq!(feed(&mut m, &clock, 0, Some(HOME)).verdict, Verdict::Searching);
    for t in 1..=4 {
        assert_eq!(
            feed(&mut m, &clock, t * 1000, Some(HOME)).verdict,
            Verdict::Stabilizing
        );
    }
    assert_eq!(m.analyzer().stable_since_ms(), Some(1000));
    // Dwell is already 3s at t=4, but the flag window is not full yet.
    assert_eq!(m.analyzer().score(), 0.0);

    let tick = feed(&mut m, &clock, 5000, Some(HOME));
    assert_eq!(tick.verdict, Verdict::Ready);
    assert_eq!(tick.events, vec![Event::BecameReady]);
    assert_eq!(m.analyzer().score(), 100.0);

    let tick = feed(&mut m, &clock, 6000, Some(Centroid::new(370.0, 240.0)));
    assert_eq!(tick.verdict, Verdict::Unstable);
    assert_eq!(tick.events, vec![Event::LostReady]);
    assert_eq!(m.analyzer().score(), 90.0);
    assert_eq!(m.analyzer().stable_since_ms(), None);
}

#[rstest]
#[case(Verdict::Ready, false, StartOutcome::Started { tier: Tier::Green, warning: false })]
#[case(Verdict::Ready, true, StartOutcome::Started { tier: Tier::Green, warning: false })]
#[case(Verdict::Stabilizing, false, StartOutcome::NeedsConfirmation { tier: Tier::Yellow })]
#[case(Verdict::Stabilizing, true, StartOutcome::Started { tier: Tier::Yellow, warning: false })]
#[case(Verdict::Unstable, false, StartOutcome::NeedsConfirmation { tier: Tier::Red })]
#[case(Verdict::Unstable, true, StartOutcome::Started { tier: Tier::Red, warning: true })]
#[case(Verdict::Searching, false, StartOutcome::NeedsConfirmation { tier: Tier::Red })]
#[case(Verdict::Searching, true, StartOutcome::Started { tier: Tier::Red, warning: true })]
fn start_is_gated_by_verdict(
    #[case] verdict: Verdict,
    #[case] force: bool,
    #[case] expected: StartOutcome,
) {
    let (mut m, _clock) = monitor_in(verdict);
    assert_eq!(m.request_start(force), Ok(expected));
    match expected {
        StartOutcome::Started { tier, .. } => assert!(matches!(
            m.session_state(),
            SessionState::Active { tier: t, .. } if t == tier
        )),
        StartOutcome::NeedsConfirmation { .. } => {
            assert_eq!(m.session_state(), SessionState::Idle);
        }
    }
}

#[test]
fn invalid_intents_are_rejected_without_transition() {
    let (mut m, clock) = monitor_in(Verdict::Ready);
    assert_eq!(m.request_stop(), Err(IntentError::NotActive));
    assert_eq!(m.session_state(), SessionState::Idle);

    m.request_start(false).unwrap();
    let before = m.session_state();
    clock.advance(Duration::from_millis(500));
    assert_eq!(m.request_start(true), Err(IntentError::AlreadyActive));
    assert_eq!(m.session_state(), before);

    m.request_stop().unwrap();
    assert_eq!(m.request_stop(), Err(IntentError::NotActive));
}

#[test]
fn stop_reports_elapsed_time_and_keeps_tier() {
    let (mut m, clock) = monitor_in(Verdict::Unstable);
    m.request_start(true).unwrap();
    clock.advance(Duration::from_millis(2_500));
    assert_eq!(m.snapshot().session_elapsed, Some(Duration::from_millis(2_500)));
    let d = m.request_stop().unwrap();
    assert_eq!(d, Duration::from_millis(2_500));
    assert_eq!(
        m.session_state(),
        SessionState::Completed {
            tier: Tier::Red,
            duration: d
        }
    );
}

#[test]
fn active_session_is_not_aborted_by_instability() {
    let (mut m, clock) = monitor_in(Verdict::Ready);
    m.request_start(false).unwrap();
    let tick = feed(&mut m, &clock, 5_000, Some(Centroid::new(10.0, 10.0)));
    assert_eq!(tick.verdict, Verdict::Unstable);
    assert_eq!(tick.events, vec![Event::LostReady]);
    assert!(m.session().is_active());
    assert_eq!(m.session().tier(), Some(Tier::Green));
}

#[test]
fn completed_session_restarts_from_idle() {
    let (mut m, _clock) = monitor_in(Verdict::Ready);
    m.request_start(false).unwrap();
    m.request_stop().unwrap();
    assert_eq!(
        m.request_start(false),
        Ok(StartOutcome::Started {
            tier: Tier::Green,
            warning: false
        })
    );
}

#[test]
fn reset_returns_everything_to_idle() {
    let (mut m, _clock) = monitor_in(Verdict::Ready);
    m.request_start(false).unwrap();
    let events = m.reset();
    assert_eq!(events, vec![Event::LostReady, Event::AnalysisReset]);
    assert_eq!(m.session_state(), SessionState::Idle);
    let snap = m.snapshot();
    assert_eq!(snap.verdict, Verdict::Searching);
    assert_eq!(snap.score, 0.0);
    assert_eq!(snap.total_ticks, 0);
    assert_eq!(snap.dwell, Duration::ZERO);
}

#[test]
fn sensitivity_change_resets_analyzer_but_not_session() {
    let (mut m, _clock) = monitor_in(Verdict::Ready);
    m.request_start(false).unwrap();
    let profile = SensitivityProfile {
        threshold_px: 5,
        min_detections: 20,
    };
    let events = m.set_sensitivity(profile).unwrap();
    assert_eq!(
        events,
        vec![Event::LostReady, Event::SensitivityChanged { profile }]
    );
    assert!(m.session().is_active());
    assert_eq!(m.verdict(), Verdict::Searching);
    assert_eq!(m.snapshot().min_detections, 20);
}

#[test]
fn time_threshold_change_is_reported() {
    let (mut m, _clock) = monitor_in(Verdict::Stabilizing);
    let events = m.set_time_threshold(Duration::from_secs(5)).unwrap();
    assert_eq!(
        events,
        vec![Event::TimeThresholdChanged {
            time_threshold: Duration::from_secs(5)
        }]
    );
    assert_eq!(m.verdict(), Verdict::Stabilizing);
    assert!(m.set_time_threshold(Duration::ZERO).is_err());
}

#[test]
fn reminders_are_rate_limited_and_silent_while_active() {
    let clock = ManualClock::new();
    let mut m = Monitor::builder()
        .with_profile(SensitivityProfile {
            threshold_px: 10,
            min_detections: 3,
        })
        .with_time_threshold(Duration::from_secs(60))
        .with_announce_interval(Duration::from_secs(2))
        .with_clock(Box::new(clock.clone()))
        .build()
        .unwrap();

    let mut holding = Vec::new();
    for t in 0..=10 {
        let tick = feed(&mut m, &clock, t * 500, Some(HOME));
        if tick.events.contains(&Event::HoldingReminder) {
            holding.push(t * 500);
        }
    }
    assert_eq!(holding, vec![500, 2500, 4500]);

    // Movement re-arms the reminder.
    feed(&mut m, &clock, 5_500, Some(Centroid::new(100.0, 100.0)));
    let tick = feed(&mut m, &clock, 6_000, Some(Centroid::new(100.0, 100.0)));
    assert_eq!(tick.events, vec![Event::HoldingReminder]);

    m.request_start(true).unwrap();
    for t in 13..20 {
        assert!(feed(&mut m, &clock, t * 500, Some(Centroid::new(100.0, 100.0)))
            .events
            .is_empty());
    }
}

#[test]
fn notifier_sees_every_event_in_order() {
    let clock = ManualClock::new();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    let mut m = Monitor::builder()
        .with_profile(SensitivityProfile {
            threshold_px: 10,
            min_detections: 2,
        })
        .with_time_threshold(Duration::from_millis(100))
        .with_announce_interval(Duration::ZERO)
        .with_clock(Box::new(clock.clone()))
        .with_notifier(move |e: &Event| sink.lock().unwrap().push(*e))
        .build()
        .unwrap();

    for t in 0..4 {
        feed(&mut m, &clock, t * 100, Some(HOME));
    }
    m.request_start(false).unwrap();
    clock.advance(Duration::from_secs(1));
    m.request_stop().unwrap();
    m.request_start(false).unwrap();
    assert_eq!(m.request_start(false), Err(IntentError::AlreadyActive));
    m.reset();

    assert_eq!(
        *seen.lock().unwrap(),
        vec![
            Event::BecameReady,
            Event::SessionStarted {
                tier: Tier::Green,
                warning: false
            },
            Event::SessionStopped {
                tier: Tier::Green,
                duration: Duration::from_secs(1)
            },
            Event::SessionStarted {
                tier: Tier::Green,
                warning: false
            },
            Event::LostReady,
            Event::AnalysisReset,
        ]
    );
}

#[rstest]
#[case(0, 5, 1000, 30)]
#[case(10, 0, 1000, 30)]
#[case(10, 5, 0, 30)]
#[case(10, 5, 1000, 1)]
fn builder_rejects_invalid_settings(
    #[case] threshold_px: u32,
    #[case] min_detections: u32,
    #[case] time_threshold_ms: u64,
    #[case] position_history: usize,
) {
    let err = Monitor::builder()
        .with_profile(SensitivityProfile {
            threshold_px,
            min_detections,
        })
        .with_time_threshold(Duration::from_millis(time_threshold_ms))
        .with_position_history(position_history)
        .build()
        .expect_err("should reject");
    assert!(matches!(
        err.downcast_ref::<BuildError>(),
        Some(BuildError::InvalidConfig(_))
    ));
}

#[test]
fn builder_applies_resolved_toml_settings() {
    let cfg = steady_config::load_toml(
        "[procedure]\nkind = \"mri-skull\"\npopulation = \"pediatric\"\n",
    )
    .unwrap();
    cfg.validate().unwrap();
    let m = steady_core::build_monitor(&cfg.effective().unwrap()).unwrap();
    let snap = m.snapshot();
    assert_eq!(snap.threshold_px, 4);
    assert_eq!(snap.min_detections, 20);
    assert!((snap.time_threshold.as_secs_f64() - 3.5).abs() < 1e-6);
}

#[test]
fn snapshot_reports_movement_statistics() {
    let clock = ManualClock::new();
    let mut m = monitor(&clock, 1000);
    feed(&mut m, &clock, 0, Some(Centroid::new(0.0, 0.0)));
    feed(&mut m, &clock, 100, Some(Centroid::new(3.0, 4.0)));
    feed(&mut m, &clock, 200, Some(Centroid::new(33.0, 44.0)));
    clock.set_ms(250);
    let snap = m.snapshot();
    assert_eq!(snap.verdict, Verdict::Unstable);
    assert_eq!(snap.total_ticks, 2);
    assert_eq!(snap.stable_ticks, 1);
    assert_eq!(snap.max_movement, 50.0);
    assert_eq!(snap.stability_percentage, 50.0);
    assert_eq!(snap.dwell, Duration::ZERO);
    assert_eq!(snap.session, SessionState::Idle);
    assert_eq!(snap.session_elapsed, None);
}
