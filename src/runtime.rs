use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::time::Duration;

use crossterm::event::{self, Event as CtEvent, KeyEvent, MouseEvent, MouseEventKind};

/// Everything that can move a hold forward or back.
///
/// Key and mouse events carry press/release; `FocusLost` aborts an armed
/// hold; `Tick` drives the live timer and the rebind timeout.
#[derive(Clone, Debug)]
pub enum HoldEvent {
    Key(KeyEvent),
    Mouse(MouseEvent),
    FocusLost,
    Resize,
    Tick,
}

impl HoldEvent {
    /// Keeps the terminal events a hold cares about. Pastes, focus gained
    /// and mouse motion never touch the timer.
    pub fn from_terminal(event: CtEvent) -> Option<Self> {
        match event {
            CtEvent::Key(key) => Some(HoldEvent::Key(key)),
            CtEvent::Mouse(mouse) if is_button(&mouse) => Some(HoldEvent::Mouse(mouse)),
            CtEvent::FocusLost => Some(HoldEvent::FocusLost),
            CtEvent::Resize(_, _) => Some(HoldEvent::Resize),
            _ => None,
        }
    }
}

fn is_button(mouse: &MouseEvent) -> bool {
    matches!(mouse.kind, MouseEventKind::Down(_) | MouseEventKind::Up(_))
}

/// Source of hold events
pub trait HoldEventSource: Send + 'static {
    /// Waits up to `timeout` for the next event; `Err(Timeout)` means a tick is due.
    fn recv_timeout(&self, timeout: Duration) -> Result<HoldEvent, RecvTimeoutError>;
}

/// Reads the terminal on a background thread. Key releases only arrive when
/// the terminal has keyboard enhancement flags pushed.
pub struct CrosstermEventSource {
    rx: Receiver<HoldEvent>,
}

impl CrosstermEventSource {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();

        std::thread::spawn(move || loop {
            let evt = match event::read() {
                Ok(raw) => match HoldEvent::from_terminal(raw) {
                    Some(evt) => evt,
                    None => continue,
                },
                Err(e) => {
                    log::error!("terminal event stream closed: {e}");
                    break;
                }
            };
            if tx.send(evt).is_err() {
                break;
            }
        });

        Self { rx }
    }
}

impl Default for CrosstermEventSource {
    fn default() -> Self {
        Self::new()
    }
}

impl HoldEventSource for CrosstermEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<HoldEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// How often the runner wakes up without input
pub trait Ticker: Send + Sync + 'static {
    fn interval(&self) -> Duration;
}

/// Constant tick, `TICK_RATE_MS` in the app so the live timer reads in 10 ms steps
#[derive(Clone, Copy, Debug)]
pub struct FixedTicker {
    interval: Duration,
}

impl FixedTicker {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }
}

impl Ticker for FixedTicker {
    fn interval(&self) -> Duration {
        self.interval
    }
}

/// Replays hold events fed through a channel, for headless runs
pub struct TestEventSource {
    rx: Receiver<HoldEvent>,
}

impl TestEventSource {
    pub fn new(rx: Receiver<HoldEvent>) -> Self {
        Self { rx }
    }
}

impl HoldEventSource for TestEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<HoldEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// Pulls one hold event at a time, substituting `Tick` while the source is quiet
pub struct Runner<E: HoldEventSource, T: Ticker> {
    event_source: E,
    ticker: T,
}

impl<E: HoldEventSource, T: Ticker> Runner<E, T> {
    pub fn new(event_source: E, ticker: T) -> Self {
        Self {
            event_source,
            ticker,
        }
    }

    /// A closed source keeps ticking so an armed hold can still be sampled
    pub fn step(&self) -> HoldEvent {
        match self.event_source.recv_timeout(self.ticker.interval()) {
            Ok(ev) => ev,
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => HoldEvent::Tick,
        }
    }
}
