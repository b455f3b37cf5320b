use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::classifier::{classify, Classification, SubKind};
use crate::Millis;

/// Number of attempts kept in the ledger.
pub const HISTORY_CAPACITY: usize = 10;

/// One complete press/release cycle.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Attempt {
    pub duration: Millis,
    pub classification: Classification,
    pub sub_kind: SubKind,
    /// Wall-clock time of the release, epoch milliseconds.
    pub timestamp: i64,
}

impl Attempt {
    pub fn new(duration: Millis, timestamp: i64) -> Self {
        let (classification, sub_kind) = classify(duration);
        Self {
            duration,
            classification,
            sub_kind,
            timestamp,
        }
    }

    pub fn is_perfect(&self) -> bool {
        self.classification == Classification::Perfect
    }
}

/// Fixed-capacity FIFO of recent attempts, oldest first.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryLedger {
    attempts: VecDeque<Attempt>,
}

impl HistoryLedger {
    pub fn new() -> Self {
        Self {
            attempts: VecDeque::with_capacity(HISTORY_CAPACITY),
        }
    }

    pub fn append(&mut self, attempt: Attempt) {
        if self.attempts.len() == HISTORY_CAPACITY {
            self.attempts.pop_front();
        }
        self.attempts.push_back(attempt);
    }

    pub fn clear(&mut self) {
        self.attempts.clear();
    }

    pub fn snapshot(&self) -> Vec<Attempt> {
        self.attempts.iter().copied().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Attempt> {
        self.attempts.iter()
    }

    pub fn latest(&self) -> Option<&Attempt> {
        self.attempts.back()
    }

    pub fn len(&self) -> usize {
        self.attempts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attempts.is_empty()
    }
}

impl Default for HistoryLedger {
    fn default() -> Self {
        Self::new()
    }
}
