// Library surface for headless/integration tests and reuse.
// Keep this lean to avoid coupling to bin-only types in main.rs.
pub mod app_dirs;
pub mod classifier;
pub mod config;
pub mod error;
pub mod feedback;
pub mod history;
pub mod keys;
pub mod runtime;
pub mod session;
pub mod stats;
pub mod timing;
pub mod util;

/// Milliseconds from a monotonic clock.
pub type Millis = f64;

/// Live timer sampling interval
pub const TICK_RATE_MS: u64 = 10;

pub use classifier::{classify, Classification, SubKind};
pub use error::HoldError;
pub use history::{Attempt, HistoryLedger, HISTORY_CAPACITY};
pub use session::{ControllerState, KeyResponse, OutcomeEvent, OutcomeSubscriber, SessionController};
pub use stats::{Statistics, StatsSnapshot};
