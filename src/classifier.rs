use serde::{Deserialize, Serialize};

use crate::Millis;

/// Inclusive lower edge of the perfect window.
pub const PERFECT_MIN_MS: Millis = 500.0;
/// Inclusive upper edge of the perfect window.
pub const PERFECT_MAX_MS: Millis = 550.0;
/// Inclusive lower edge of the close band.
pub const CLOSE_MIN_MS: Millis = 480.0;
/// Inclusive upper edge of the close band.
pub const CLOSE_MAX_MS: Millis = 570.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, strum_macros::Display)]
pub enum Classification {
    Perfect,
    Close,
    Fail,
}

/// Which side of the perfect window a non-perfect hold landed on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, strum_macros::Display)]
pub enum SubKind {
    None,
    TooFast,
    TooSlow,
    CloseFast,
    CloseSlow,
}

/// Grades a held duration against the fixed tolerance bands.
///
/// Every edge is inclusive: 500 and 550 are perfect, 480 and 570 are close.
pub fn classify(duration: Millis) -> (Classification, SubKind) {
    if (PERFECT_MIN_MS..=PERFECT_MAX_MS).contains(&duration) {
        (Classification::Perfect, SubKind::None)
    } else if (CLOSE_MIN_MS..=CLOSE_MAX_MS).contains(&duration) {
        if duration < PERFECT_MIN_MS {
            (Classification::Close, SubKind::CloseFast)
        } else {
            (Classification::Close, SubKind::CloseSlow)
        }
    } else if duration < CLOSE_MIN_MS {
        (Classification::Fail, SubKind::TooFast)
    } else {
        (Classification::Fail, SubKind::TooSlow)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_perfect_window_is_inclusive() {
        for d in [500.0, 500.0001, 525.0, 549.999, 550.0] {
            assert_eq!(classify(d), (Classification::Perfect, SubKind::None), "{d}");
        }
    }

    #[test]
    fn test_close_fast_band() {
        for d in [480.0, 480.5, 499.0, 499.9999] {
            assert_eq!(
                classify(d),
                (Classification::Close, SubKind::CloseFast),
                "{d}"
            );
        }
    }

    #[test]
    fn test_close_slow_band() {
        for d in [550.0001, 551.0, 569.5, 570.0] {
            assert_eq!(
                classify(d),
                (Classification::Close, SubKind::CloseSlow),
                "{d}"
            );
        }
    }

    #[test]
    fn test_fail_bands() {
        for d in [0.0, 1.0, 250.0, 479.9999] {
            assert_eq!(classify(d), (Classification::Fail, SubKind::TooFast), "{d}");
        }
        for d in [570.0001, 600.0, 10_000.0] {
            assert_eq!(classify(d), (Classification::Fail, SubKind::TooSlow), "{d}");
        }
    }

    #[test]
    fn test_exact_close_edges_are_not_fail() {
        assert_eq!(classify(480.0).0, Classification::Close);
        assert_eq!(classify(570.0).0, Classification::Close);
        assert_eq!(classify(479.99).0, Classification::Fail);
        assert_eq!(classify(570.01).0, Classification::Fail);
    }

    #[test]
    fn test_classification_display() {
        assert_eq!(Classification::Perfect.to_string(), "Perfect");
        assert_eq!(SubKind::CloseFast.to_string(), "CloseFast");
    }
}
