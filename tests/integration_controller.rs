use assert_matches::assert_matches;
use sweetspot::config::Settings;
use sweetspot::{
    classify, Classification, HoldError, KeyResponse, OutcomeEvent, SessionController, SubKind,
    HISTORY_CAPACITY,
};

fn hold(controller: &mut SessionController, start: f64, duration: f64) -> OutcomeEvent {
    controller.on_key_down("Numpad5", start).unwrap();
    match controller.on_key_up("Numpad5", start + duration) {
        Ok(KeyResponse::Recorded(event)) => event,
        other => panic!("expected a recorded attempt, got {other:?}"),
    }
}

#[test]
fn classification_bands_sampled_finely() {
    let mut d = 0.0;
    while d <= 1_000.0 {
        let (class, sub) = classify(d);
        if (500.0..=550.0).contains(&d) {
            assert_eq!((class, sub), (Classification::Perfect, SubKind::None), "{d}");
        } else if (480.0..500.0).contains(&d) {
            assert_eq!((class, sub), (Classification::Close, SubKind::CloseFast), "{d}");
        } else if d > 550.0 && d <= 570.0 {
            assert_eq!((class, sub), (Classification::Close, SubKind::CloseSlow), "{d}");
        } else if d < 480.0 {
            assert_eq!((class, sub), (Classification::Fail, SubKind::TooFast), "{d}");
        } else {
            assert_eq!((class, sub), (Classification::Fail, SubKind::TooSlow), "{d}");
        }
        d += 0.25;
    }
}

#[test]
fn perfect_hold_end_to_end() {
    let mut controller = SessionController::new(Settings::default());
    let event = hold(&mut controller, 0.0, 520.0);

    assert_eq!(event.attempt.duration, 520.0);
    assert_eq!(event.attempt.classification, Classification::Perfect);
    assert_eq!(event.stats.total_attempts, 1);
    assert_eq!(event.stats.successful_attempts, 1);
    assert_eq!(event.stats.current_streak, 1);
    assert_eq!(event.stats.best_streak, 1);
    assert!(event.attempt.timestamp > 0);
}

#[test]
fn close_hold_end_to_end() {
    let mut controller = SessionController::new(Settings::default());
    hold(&mut controller, 0.0, 520.0);
    let event = hold(&mut controller, 1_000.0, 490.0);

    assert_eq!(event.attempt.duration, 490.0);
    assert_eq!(event.attempt.classification, Classification::Close);
    assert_eq!(event.attempt.sub_kind, SubKind::CloseFast);
    assert_eq!(event.stats.current_streak, 0);
}

#[test]
fn success_rate_and_streaks() {
    let mut controller = SessionController::new(Settings::default());
    let durations = [520.0, 505.0, 300.0, 549.0];
    let mut last = None;
    for (i, d) in durations.iter().enumerate() {
        last = Some(hold(&mut controller, i as f64 * 2_000.0, *d));
    }
    let stats = last.unwrap().stats;
    assert_eq!(stats.current_streak, 1);
    assert_eq!(stats.best_streak, 2);
    assert_eq!(stats.success_rate, 75);

    let mut controller = SessionController::new(Settings::default());
    for (i, d) in [520.0, 530.0, 100.0].iter().enumerate() {
        hold(&mut controller, i as f64 * 2_000.0, *d);
    }
    assert_eq!(controller.statistics().success_rate, 67);
}

#[test]
fn ledger_keeps_latest_ten() {
    let mut controller = SessionController::new(Settings::default());
    for i in 0..11 {
        hold(&mut controller, i as f64 * 2_000.0, 300.0 + i as f64);
    }
    let history = controller.history().snapshot();
    assert_eq!(history.len(), HISTORY_CAPACITY);
    assert!(history.iter().all(|a| a.duration != 300.0));
    assert_eq!(history.last().map(|a| a.duration), Some(310.0));
    assert_eq!(controller.statistics().total_attempts, 11);
}

#[test]
fn clear_is_all_or_nothing() {
    let mut controller = SessionController::new(Settings::default());
    hold(&mut controller, 0.0, 520.0);
    hold(&mut controller, 2_000.0, 525.0);

    controller.clear();
    let stats = controller.statistics();
    assert_eq!(stats.total_attempts, 0);
    assert_eq!(stats.successful_attempts, 0);
    assert_eq!(stats.current_streak, 0);
    assert_eq!(stats.best_streak, 0);
    assert!(controller.history().is_empty());
}

#[test]
fn release_without_press_changes_nothing() {
    let mut controller = SessionController::new(Settings::default());
    assert_matches!(controller.on_key_up("Numpad5", 10.0), Err(HoldError::NotActive));
    assert!(controller.history().is_empty());
    assert_eq!(controller.statistics().total_attempts, 0);
}

#[test]
fn backwards_clock_is_reported_not_recorded() {
    let mut controller = SessionController::new(Settings::default());
    controller.on_key_down("Numpad5", 5_000.0).unwrap();
    assert_matches!(
        controller.on_key_up("Numpad5", 4_000.0),
        Err(HoldError::NonMonotonicClock { started_at, now }) if started_at == 5_000.0 && now == 4_000.0
    );
    assert!(controller.history().is_empty());

    // the controller is usable again straight away
    let event = hold(&mut controller, 6_000.0, 540.0);
    assert_eq!(event.stats.total_attempts, 1);
}
