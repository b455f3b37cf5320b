use std::cell::RefCell;
use std::rc::Rc;
use std::time::{Duration, Instant};

use crate::classifier::{Classification, SubKind};
use crate::history::Attempt;
use crate::session::{OutcomeEvent, OutcomeSubscriber};
use crate::stats::StatsSnapshot;
use crate::util::round_ms;

/// How long a result stays highlighted
pub const HIGHLIGHT_DURATION: Duration = Duration::from_millis(2000);
/// Minimum gap between two miss bells
pub const BELL_COOLDOWN: Duration = Duration::from_millis(100);

/// Text shown for a finished attempt.
pub fn result_message(attempt: &Attempt) -> String {
    let ms = round_ms(attempt.duration);
    match attempt.sub_kind {
        SubKind::None => format!("PERFECT COMBO! {ms} ms"),
        SubKind::CloseFast => format!("CLOSE - A BIT FAST: {ms} ms"),
        SubKind::CloseSlow => format!("CLOSE - A BIT SLOW: {ms} ms"),
        SubKind::TooFast => format!("TOO FAST: {ms} ms"),
        SubKind::TooSlow => format!("TOO SLOW: {ms} ms"),
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Banner {
    pub text: String,
    pub classification: Classification,
    pub shown_at: Instant,
}

/// Presentation state driven by outcome events.
///
/// Timestamps come from the host through [`Feedback::advance`], so the
/// highlight and flash windows run on the same clock as the frame that
/// draws them.
#[derive(Debug)]
pub struct Feedback {
    pub sound_effects: bool,
    pub flash_effects: bool,
    banner: Option<Banner>,
    pending_bell: Option<Classification>,
    last_miss_bell: Option<Instant>,
    now: Instant,
}

impl Feedback {
    pub fn new(sound_effects: bool, flash_effects: bool) -> Self {
        Self {
            sound_effects,
            flash_effects,
            banner: None,
            pending_bell: None,
            last_miss_bell: None,
            now: Instant::now(),
        }
    }

    /// Moves the presentation clock; outcomes are stamped with the latest value
    pub fn advance(&mut self, now: Instant) {
        self.now = now;
    }

    pub fn shared(sound_effects: bool, flash_effects: bool) -> Rc<RefCell<Self>> {
        Rc::new(RefCell::new(Self::new(sound_effects, flash_effects)))
    }

    pub fn banner(&self) -> Option<&Banner> {
        self.banner.as_ref()
    }

    pub fn record(&mut self, attempt: &Attempt, now: Instant) {
        self.banner = Some(Banner {
            text: result_message(attempt),
            classification: attempt.classification,
            shown_at: now,
        });
        if self.sound_effects {
            self.pending_bell = Some(attempt.classification);
        }
    }

    /// Whether the latest result is still inside its highlight window
    pub fn is_highlighted(&self, now: Instant) -> bool {
        self.banner
            .as_ref()
            .is_some_and(|b| now.saturating_duration_since(b.shown_at) < HIGHLIGHT_DURATION)
    }

    /// Whether a perfect result should currently flash the frame
    pub fn is_flashing(&self, now: Instant) -> bool {
        self.flash_effects
            && self.is_highlighted(now)
            && self
                .banner
                .as_ref()
                .is_some_and(|b| b.classification == Classification::Perfect)
    }

    /// Consumes a pending bell.
    ///
    /// A perfect hold always rings; close and failed holds are rate limited
    /// by [`BELL_COOLDOWN`].
    pub fn take_bell(&mut self, now: Instant) -> bool {
        let Some(classification) = self.pending_bell.take() else {
            return false;
        };
        if !self.sound_effects {
            return false;
        }
        if classification == Classification::Perfect {
            return true;
        }
        if self
            .last_miss_bell
            .is_some_and(|last| now.saturating_duration_since(last) < BELL_COOLDOWN)
        {
            return false;
        }
        self.last_miss_bell = Some(now);
        true
    }

    pub fn reset(&mut self) {
        self.banner = None;
        self.pending_bell = None;
    }
}

impl OutcomeSubscriber for Rc<RefCell<Feedback>> {
    fn on_outcome(&mut self, event: &OutcomeEvent) {
        let mut feedback = self.borrow_mut();
        let now = feedback.now;
        feedback.record(&event.attempt, now);
    }

    fn on_clear(&mut self, _stats: &StatsSnapshot) {
        self.borrow_mut().reset();
    }
}
