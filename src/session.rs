//! The hold-timing state machine.
//!
//! ```text
//! Idle  --key down (bound key)-->  Armed
//! Armed --key up (bound key)---->  Idle   (attempt recorded, outcome emitted)
//! Armed --cancel---------------->  Idle   (nothing recorded)
//! ```
//!
//! Events for other keys, a second key down while armed and a key up while
//! idle leave the state untouched. `clear` works in either state and never
//! touches an armed session.

use serde::Serialize;

use crate::classifier::{classify, Classification, SubKind};
use crate::config::Settings;
use crate::error::{HoldError, Result};
use crate::history::{Attempt, HistoryLedger};
use crate::keys::KeyBinding;
use crate::stats::{Statistics, StatsSnapshot};
use crate::timing::TimingSession;
use crate::Millis;

/// Source of wall-clock timestamps stamped onto attempts.
pub trait WallClock {
    fn epoch_ms(&self) -> i64;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl WallClock for SystemClock {
    fn epoch_ms(&self) -> i64 {
        chrono::Utc::now().timestamp_millis()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, strum_macros::Display)]
pub enum ControllerState {
    Idle,
    Armed,
}

/// Immutable record emitted once per completed attempt.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutcomeEvent {
    pub attempt: Attempt,
    pub stats: StatsSnapshot,
    pub history: Vec<Attempt>,
}

impl OutcomeEvent {
    pub fn duration(&self) -> Millis {
        self.attempt.duration
    }

    pub fn classification(&self) -> Classification {
        self.attempt.classification
    }

    pub fn sub_kind(&self) -> SubKind {
        self.attempt.sub_kind
    }
}

/// Read-only sample of the running hold, for a live timer display.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimerSample {
    pub elapsed: Millis,
}

/// What a key event did to the controller.
#[derive(Debug, Clone, PartialEq)]
pub enum KeyResponse {
    Armed,
    Recorded(OutcomeEvent),
    Ignored,
}

/// Presentation hook. Subscribers observe; they cannot influence grading.
pub trait OutcomeSubscriber {
    fn on_outcome(&mut self, event: &OutcomeEvent);

    fn on_clear(&mut self, _stats: &StatsSnapshot) {}
}

pub struct SessionController<C: WallClock = SystemClock> {
    settings: Settings,
    binding: Option<KeyBinding>,
    timing: TimingSession,
    ledger: HistoryLedger,
    stats: Statistics,
    subscribers: Vec<Box<dyn OutcomeSubscriber>>,
    clock: C,
}

impl SessionController<SystemClock> {
    pub fn new(settings: Settings) -> Self {
        Self::with_clock(settings, SystemClock)
    }
}

impl<C: WallClock> SessionController<C> {
    pub fn with_clock(settings: Settings, clock: C) -> Self {
        let binding = validate_binding(&settings.key_binding);
        Self {
            settings,
            binding,
            timing: TimingSession::new(),
            ledger: HistoryLedger::new(),
            stats: Statistics::new(),
            subscribers: Vec::new(),
            clock,
        }
    }

    pub fn subscribe(&mut self, subscriber: Box<dyn OutcomeSubscriber>) {
        self.subscribers.push(subscriber);
    }

    pub fn state(&self) -> ControllerState {
        if self.timing.is_active() {
            ControllerState::Armed
        } else {
            ControllerState::Idle
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Replaces the settings supplied by the outside world.
    ///
    /// An armed session keeps running; its release is matched against the
    /// new binding.
    pub fn apply_settings(&mut self, settings: Settings) {
        self.binding = validate_binding(&settings.key_binding);
        self.settings = settings;
    }

    /// The active binding, or `None` while the configured one is invalid.
    pub fn binding(&self) -> Option<&KeyBinding> {
        self.binding.as_ref()
    }

    pub fn history(&self) -> &HistoryLedger {
        &self.ledger
    }

    pub fn statistics(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    fn is_bound(&self, code: &str) -> bool {
        self.binding.as_ref().is_some_and(|b| b.matches(code))
    }

    pub fn on_key_down(&mut self, code: &str, now: Millis) -> Result<KeyResponse> {
        if !self.is_bound(code) {
            log::trace!("key down {code:?} ignored");
            return Ok(KeyResponse::Ignored);
        }
        self.timing.start(now)?;
        log::debug!("armed at {now} ms");
        Ok(KeyResponse::Armed)
    }

    pub fn on_key_up(&mut self, code: &str, now: Millis) -> Result<KeyResponse> {
        if !self.is_bound(code) {
            log::trace!("key up {code:?} ignored");
            return Ok(KeyResponse::Ignored);
        }
        let duration = self.timing.stop(now).inspect_err(|e| match e {
            HoldError::NonMonotonicClock { .. } => log::warn!("attempt rejected: {e}"),
            _ => log::debug!("key up while idle: {e}"),
        })?;

        let (classification, sub_kind) = classify(duration);
        let attempt = Attempt {
            duration,
            classification,
            sub_kind,
            timestamp: self.clock.epoch_ms(),
        };
        self.ledger.append(attempt);
        self.stats.observe(&attempt);

        let event = OutcomeEvent {
            attempt,
            stats: self.stats.snapshot(),
            history: self.ledger.snapshot(),
        };
        log::info!(
            "{classification} ({sub_kind}) after {duration:.1} ms, streak {} best {} rate {}%",
            event.stats.current_streak,
            event.stats.best_streak,
            event.stats.success_rate,
        );
        for subscriber in self.subscribers.iter_mut() {
            subscriber.on_outcome(&event);
        }
        Ok(KeyResponse::Recorded(event))
    }

    /// Drops an armed session without recording anything.
    pub fn cancel(&mut self) -> Result<()> {
        self.timing.cancel()?;
        log::debug!("armed session cancelled");
        Ok(())
    }

    /// Empties the ledger and zeroes the statistics together.
    pub fn clear(&mut self) {
        self.ledger.clear();
        self.stats.reset();
        let stats = self.stats.snapshot();
        log::info!("history and statistics cleared");
        for subscriber in self.subscribers.iter_mut() {
            subscriber.on_clear(&stats);
        }
    }

    /// Elapsed time of the running hold, if armed and the live timer is on.
    pub fn timer_sample(&self, now: Millis) -> Option<TimerSample> {
        if !self.settings.live_timer {
            return None;
        }
        self.timing.elapsed(now).map(|elapsed| TimerSample { elapsed })
    }
}

fn validate_binding(code: &str) -> Option<KeyBinding> {
    code.parse::<KeyBinding>()
        .inspect_err(|e| log::warn!("{e}; key events will be ignored until it is corrected"))
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Clone, Copy)]
    struct FixedClock(i64);

    impl WallClock for FixedClock {
        fn epoch_ms(&self) -> i64 {
            self.0
        }
    }

    #[derive(Default)]
    struct Recorder {
        outcomes: Vec<OutcomeEvent>,
        clears: Vec<StatsSnapshot>,
    }

    struct SharedRecorder(Rc<RefCell<Recorder>>);

    impl OutcomeSubscriber for SharedRecorder {
        fn on_outcome(&mut self, event: &OutcomeEvent) {
            self.0.borrow_mut().outcomes.push(event.clone());
        }

        fn on_clear(&mut self, stats: &StatsSnapshot) {
            self.0.borrow_mut().clears.push(*stats);
        }
    }

    fn controller() -> SessionController<FixedClock> {
        SessionController::with_clock(Settings::default(), FixedClock(1_700_000_000_000))
    }

    fn hold(c: &mut SessionController<FixedClock>, start: Millis, end: Millis) -> OutcomeEvent {
        assert_eq!(c.on_key_down("Numpad5", start), Ok(KeyResponse::Armed));
        match c.on_key_up("Numpad5", end) {
            Ok(KeyResponse::Recorded(event)) => event,
            other => panic!("expected a recorded attempt, got {other:?}"),
        }
    }

    #[test]
    fn test_perfect_hold_end_to_end() {
        let mut c = controller();
        let event = hold(&mut c, 0.0, 520.0);

        assert_eq!(event.duration(), 520.0);
        assert_eq!(event.classification(), Classification::Perfect);
        assert_eq!(event.sub_kind(), SubKind::None);
        assert_eq!(event.attempt.timestamp, 1_700_000_000_000);
        assert_eq!(event.stats.total_attempts, 1);
        assert_eq!(event.stats.successful_attempts, 1);
        assert_eq!(event.stats.current_streak, 1);
        assert_eq!(event.stats.best_streak, 1);
        assert_eq!(event.stats.success_rate, 100);
        assert_eq!(event.history, vec![event.attempt]);
        assert_eq!(c.state(), ControllerState::Idle);
    }

    #[test]
    fn test_close_hold_resets_streak() {
        let mut c = controller();
        hold(&mut c, 0.0, 520.0);
        let event = hold(&mut c, 1_000.0, 1_490.0);

        assert_eq!(event.duration(), 490.0);
        assert_eq!(event.classification(), Classification::Close);
        assert_eq!(event.sub_kind(), SubKind::CloseFast);
        assert_eq!(event.stats.current_streak, 0);
        assert_eq!(event.stats.best_streak, 1);
    }

    #[test]
    fn test_unbound_keys_are_ignored() {
        let mut c = controller();
        assert_eq!(c.on_key_down("Space", 0.0), Ok(KeyResponse::Ignored));
        assert_eq!(c.state(), ControllerState::Idle);

        c.on_key_down("Numpad5", 0.0).unwrap();
        assert_eq!(c.on_key_up("Space", 10.0), Ok(KeyResponse::Ignored));
        assert_eq!(c.state(), ControllerState::Armed);
    }

    #[test]
    fn test_repeat_key_down_keeps_first_press() {
        let mut c = controller();
        c.on_key_down("Numpad5", 0.0).unwrap();
        assert_matches!(c.on_key_down("Numpad5", 200.0), Err(HoldError::AlreadyActive));
        assert_matches!(
            c.on_key_up("Numpad5", 530.0),
            Ok(KeyResponse::Recorded(e)) if e.duration() == 530.0
        );
    }

    #[test]
    fn test_key_up_while_idle_changes_nothing() {
        let mut c = controller();
        assert_matches!(c.on_key_up("Numpad5", 10.0), Err(HoldError::NotActive));
        assert!(c.history().is_empty());
        assert_eq!(c.statistics(), StatsSnapshot::default());
    }

    #[test]
    fn test_backwards_clock_is_rejected_and_returns_to_idle() {
        let mut c = controller();
        c.on_key_down("Numpad5", 1_000.0).unwrap();
        assert_matches!(
            c.on_key_up("Numpad5", 900.0),
            Err(HoldError::NonMonotonicClock { .. })
        );
        assert_eq!(c.state(), ControllerState::Idle);
        assert!(c.history().is_empty());
        assert_eq!(c.statistics().total_attempts, 0);
    }

    #[test]
    fn test_invalid_binding_ignores_everything() {
        let settings = Settings {
            key_binding: String::new(),
            ..Settings::default()
        };
        let mut c = SessionController::with_clock(settings, FixedClock(0));
        assert!(c.binding().is_none());
        assert_eq!(c.on_key_down("", 0.0), Ok(KeyResponse::Ignored));
        assert_eq!(c.on_key_down("Numpad5", 0.0), Ok(KeyResponse::Ignored));
        assert_eq!(c.state(), ControllerState::Idle);

        c.apply_settings(Settings::default());
        assert_eq!(c.on_key_down("Numpad5", 0.0), Ok(KeyResponse::Armed));
    }

    #[test]
    fn test_cancel() {
        let mut c = controller();
        assert_matches!(c.cancel(), Err(HoldError::NotActive));

        c.on_key_down("Numpad5", 0.0).unwrap();
        c.cancel().unwrap();
        assert_eq!(c.state(), ControllerState::Idle);
        assert_matches!(c.on_key_up("Numpad5", 520.0), Err(HoldError::NotActive));
        assert!(c.history().is_empty());
        assert_eq!(c.statistics().total_attempts, 0);
    }

    #[test]
    fn test_clear_resets_everything_but_keeps_armed_session() {
        let mut c = controller();
        hold(&mut c, 0.0, 520.0);
        hold(&mut c, 1_000.0, 1_300.0);

        c.on_key_down("Numpad5", 2_000.0).unwrap();
        c.clear();
        assert_eq!(c.statistics(), StatsSnapshot::default());
        assert!(c.history().is_empty());
        assert_eq!(c.state(), ControllerState::Armed);

        let event = match c.on_key_up("Numpad5", 2_510.0) {
            Ok(KeyResponse::Recorded(event)) => event,
            other => panic!("unexpected {other:?}"),
        };
        assert_eq!(event.stats.total_attempts, 1);
        assert_eq!(event.history.len(), 1);
    }

    #[test]
    fn test_subscribers_see_outcomes_and_clears() {
        let recorder = Rc::new(RefCell::new(Recorder::default()));
        let mut c = controller();
        c.subscribe(Box::new(SharedRecorder(recorder.clone())));

        let event = hold(&mut c, 0.0, 600.0);
        c.clear();

        let seen = recorder.borrow();
        assert_eq!(seen.outcomes, vec![event]);
        assert_eq!(seen.outcomes[0].sub_kind(), SubKind::TooSlow);
        assert_eq!(seen.clears, vec![StatsSnapshot::default()]);
    }

    #[test]
    fn test_no_outcome_for_rejected_attempt() {
        let recorder = Rc::new(RefCell::new(Recorder::default()));
        let mut c = controller();
        c.subscribe(Box::new(SharedRecorder(recorder.clone())));

        c.on_key_down("Numpad5", 50.0).unwrap();
        let _ = c.on_key_up("Numpad5", 10.0);
        let _ = c.on_key_up("Numpad5", 60.0);
        assert!(recorder.borrow().outcomes.is_empty());
    }

    #[test]
    fn test_timer_sample_respects_toggle() {
        let mut c = controller();
        assert_eq!(c.timer_sample(100.0), None);

        c.on_key_down("Numpad5", 100.0).unwrap();
        assert_eq!(c.timer_sample(350.0), Some(TimerSample { elapsed: 250.0 }));
        assert_eq!(c.state(), ControllerState::Armed);

        c.apply_settings(Settings {
            live_timer: false,
            ..Settings::default()
        });
        assert_eq!(c.timer_sample(360.0), None);
        assert_eq!(c.state(), ControllerState::Armed);
    }

    #[test]
    fn test_rebinding_while_armed() {
        let mut c = controller();
        c.on_key_down("Numpad5", 0.0).unwrap();
        c.apply_settings(Settings {
            key_binding: "Space".into(),
            ..Settings::default()
        });
        assert_eq!(c.on_key_up("Numpad5", 520.0), Ok(KeyResponse::Ignored));
        assert_matches!(c.on_key_up("Space", 520.0), Ok(KeyResponse::Recorded(_)));
    }

    #[test]
    fn test_history_capped_through_controller() {
        let mut c = controller();
        let mut first = None;
        for i in 0..11 {
            let start = i as f64 * 1_000.0;
            let event = hold(&mut c, start, start + 400.0 + i as f64);
            first.get_or_insert(event.attempt);
        }
        let history = c.history().snapshot();
        assert_eq!(history.len(), 10);
        assert_eq!(history[0].duration, 401.0);
        assert_eq!(history[9].duration, 410.0);
        assert_ne!(first.map(|a| a.duration), Some(history[0].duration));
    }
}
