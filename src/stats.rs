use serde::{Deserialize, Serialize};

use crate::history::Attempt;
use crate::util::percent;

/// Running counters over every attempt since the last clear.
///
/// Only `observe` and `reset` move the counters, so `successful_attempts`
/// never exceeds `total_attempts` and `best_streak` never trails
/// `current_streak`. Read them through [`Statistics::snapshot`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Statistics {
    total_attempts: u32,
    successful_attempts: u32,
    current_streak: u32,
    best_streak: u32,
}

impl Statistics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one attempt into the counters
    pub fn observe(&mut self, attempt: &Attempt) {
        self.total_attempts += 1;
        if attempt.is_perfect() {
            self.successful_attempts += 1;
            self.current_streak += 1;
            self.best_streak = self.best_streak.max(self.current_streak);
        } else {
            self.current_streak = 0;
        }
    }

    /// Share of perfect attempts as a whole percent, rounded half-up
    pub fn success_rate(&self) -> u32 {
        percent(self.successful_attempts, self.total_attempts)
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            total_attempts: self.total_attempts,
            successful_attempts: self.successful_attempts,
            current_streak: self.current_streak,
            best_streak: self.best_streak,
            success_rate: self.success_rate(),
        }
    }
}

/// Counters plus the derived success rate, as handed to presentation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsSnapshot {
    pub total_attempts: u32,
    pub successful_attempts: u32,
    pub current_streak: u32,
    pub best_streak: u32,
    pub success_rate: u32,
}
