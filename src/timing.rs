use crate::error::{HoldError, Result};
use crate::Millis;

/// Tracks a single held key between press and release.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TimingSession {
    started_at: Option<Millis>,
}

impl TimingSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self) -> bool {
        self.started_at.is_some()
    }

    pub fn started_at(&self) -> Option<Millis> {
        self.started_at
    }

    pub fn start(&mut self, now: Millis) -> Result<()> {
        if self.is_active() {
            return Err(HoldError::AlreadyActive);
        }
        self.started_at = Some(now);
        Ok(())
    }

    /// Ends the session and returns the held duration.
    ///
    /// The session is deactivated even when the clock turns out to have gone
    /// backwards; the negative interval is reported, never clamped.
    pub fn stop(&mut self, now: Millis) -> Result<Millis> {
        let started_at = self.started_at.take().ok_or(HoldError::NotActive)?;
        let duration = now - started_at;
        if duration < 0.0 {
            return Err(HoldError::NonMonotonicClock { started_at, now });
        }
        Ok(duration)
    }

    pub fn cancel(&mut self) -> Result<()> {
        self.started_at.take().map(|_| ()).ok_or(HoldError::NotActive)
    }

    /// Read-only elapsed time for live display.
    pub fn elapsed(&self, now: Millis) -> Option<Millis> {
        self.started_at.map(|start| (now - start).max(0.0))
    }
}
