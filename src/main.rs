mod ui;

use std::{
    cell::RefCell,
    error::Error,
    fs::{self, OpenOptions},
    io::{self, stdin},
    path::PathBuf,
    rc::Rc,
    time::{Duration, Instant},
};

use clap::{error::ErrorKind, CommandFactory, Parser};
use crossterm::{
    event::{
        DisableFocusChange, DisableMouseCapture, EnableFocusChange, EnableMouseCapture, KeyCode,
        KeyEvent, KeyEventKind, KeyModifiers, KeyboardEnhancementFlags, MouseButton, MouseEvent,
        MouseEventKind, PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
    },
    execute,
    style::Print,
    terminal::{
        disable_raw_mode, enable_raw_mode, supports_keyboard_enhancement, EnterAlternateScreen,
        LeaveAlternateScreen,
    },
    tty::IsTty,
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Frame, Terminal,
};
use sweetspot::{
    app_dirs::AppDirs,
    config::{ConfigStore, FileConfigStore, Settings},
    feedback::Feedback,
    keys::{code_for, KeyBinding},
    runtime::{CrosstermEventSource, FixedTicker, HoldEvent, Runner},
    ControllerState, HoldError, KeyResponse, Millis, SessionController, TICK_RATE_MS,
};

/// Rebinding gives up after this long without a key press
const REBIND_TIMEOUT: Duration = Duration::from_secs(10);

/// hold a key for exactly 500-550ms
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "A reaction-timing minigame: hold the bound key for 500-550ms. Holds within 20ms of the window count as close, anything else fails. Tracks your success rate, current streak and best streak for this run."
)]
pub struct Cli {
    /// key to hold, as a physical key code (Numpad5, Space, KeyM, Digit5, Enter, F6..F12, ...)
    #[clap(short = 'k', long)]
    key: Option<KeyBinding>,

    /// hide the running duration while the key is held
    #[clap(long)]
    no_live_timer: bool,

    /// never ring the terminal bell
    #[clap(long)]
    no_sound: bool,

    /// do not flash the frame on a perfect hold
    #[clap(long)]
    no_flash: bool,

    /// settings file to use instead of the default location
    #[clap(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// write a log file (defaults to the state directory when PATH is omitted)
    #[clap(long, value_name = "PATH", num_args = 0..=1)]
    log_file: Option<Option<PathBuf>>,
}

impl Cli {
    /// Layer command line flags over stored settings
    fn apply(&self, mut settings: Settings) -> Settings {
        if let Some(key) = &self.key {
            settings.key_binding = key.code().to_string();
        }
        if self.no_live_timer {
            settings.live_timer = false;
        }
        if self.no_sound {
            settings.sound_effects = false;
        }
        if self.no_flash {
            settings.flash_effects = false;
        }
        settings
    }

    fn config_store(&self) -> FileConfigStore {
        match &self.config {
            Some(path) => FileConfigStore::with_path(path),
            None => FileConfigStore::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AppState {
    Playing,
    Rebinding { since: Instant },
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Flow {
    Continue,
    Quit,
}

pub struct App {
    pub controller: SessionController,
    pub feedback: Rc<RefCell<Feedback>>,
    pub state: AppState,
    /// Whether the terminal reports key releases; without them the bound key toggles
    pub key_release_events: bool,
    pub last_error: Option<HoldError>,
    pub now: Instant,
    epoch: Instant,
    store: Box<dyn ConfigStore>,
}

impl App {
    pub fn new(settings: Settings, store: Box<dyn ConfigStore>, key_release_events: bool) -> Self {
        let feedback = Feedback::shared(settings.sound_effects, settings.flash_effects);
        let mut controller = SessionController::new(settings);
        controller.subscribe(Box::new(feedback.clone()));
        let now = Instant::now();

        Self {
            controller,
            feedback,
            state: AppState::Playing,
            key_release_events,
            last_error: None,
            now,
            epoch: now,
            store,
        }
    }

    /// Monotonic milliseconds since the app started
    fn millis(&self, at: Instant) -> Millis {
        at.saturating_duration_since(self.epoch).as_micros() as Millis / 1000.0
    }

    pub fn now_ms(&self) -> Millis {
        self.millis(self.now)
    }

    fn handle_event(&mut self, event: HoldEvent, at: Instant) -> Flow {
        self.now = at;
        self.feedback.borrow_mut().advance(at);
        match event {
            HoldEvent::Key(key) => return self.handle_key(key, at),
            HoldEvent::Mouse(mouse) => self.handle_mouse(mouse, at),
            HoldEvent::FocusLost => self.cancel_hold("terminal lost focus"),
            HoldEvent::Tick => self.on_tick(at),
            HoldEvent::Resize => {}
        }
        Flow::Continue
    }

    fn on_tick(&mut self, at: Instant) {
        if let AppState::Rebinding { since } = self.state {
            if at.saturating_duration_since(since) >= REBIND_TIMEOUT {
                log::info!("rebinding timed out");
                self.state = AppState::Playing;
            }
        }
    }

    fn handle_key(&mut self, key: KeyEvent, at: Instant) -> Flow {
        if key.kind == KeyEventKind::Press
            && key.modifiers.contains(KeyModifiers::CONTROL)
            && key.code == KeyCode::Char('c')
        {
            return Flow::Quit;
        }

        if let AppState::Rebinding { .. } = self.state {
            match key.kind {
                KeyEventKind::Press => self.finish_rebind(&key),
                // a hold that started before rebinding still ends normally
                KeyEventKind::Release => self.release_bound_key(&key, at),
                KeyEventKind::Repeat => {}
            }
            return Flow::Continue;
        }

        let now = self.millis(at);
        if let Some(code) = code_for(&key) {
            if self.controller.binding().is_some_and(|b| b.matches(&code)) {
                let armed = self.controller.state() == ControllerState::Armed;
                let result = match key.kind {
                    KeyEventKind::Release => self.controller.on_key_up(&code, now),
                    KeyEventKind::Press if armed && !self.key_release_events => {
                        self.controller.on_key_up(&code, now)
                    }
                    KeyEventKind::Press => self.controller.on_key_down(&code, now),
                    KeyEventKind::Repeat => return Flow::Continue,
                };
                self.note(result);
                return Flow::Continue;
            }
        }

        if key.kind != KeyEventKind::Press {
            return Flow::Continue;
        }
        match key.code {
            KeyCode::Esc => return Flow::Quit,
            KeyCode::Delete => {
                self.controller.clear();
                self.last_error = None;
            }
            KeyCode::F(2) => self.start_rebind(at),
            KeyCode::F(3) => self.update_settings(|s| s.live_timer = !s.live_timer),
            KeyCode::F(4) => self.update_settings(|s| s.sound_effects = !s.sound_effects),
            KeyCode::F(5) => self.update_settings(|s| s.flash_effects = !s.flash_effects),
            _ => {}
        }
        Flow::Continue
    }

    /// Left mouse button stands in for the bound key
    fn handle_mouse(&mut self, mouse: MouseEvent, at: Instant) {
        let Some(code) = self.controller.binding().map(|b| b.code().to_string()) else {
            return;
        };
        let now = self.millis(at);
        let result = match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) => self.controller.on_key_down(&code, now),
            MouseEventKind::Up(MouseButton::Left) => self.controller.on_key_up(&code, now),
            _ => return,
        };
        self.note(result);
    }

    fn release_bound_key(&mut self, key: &KeyEvent, at: Instant) {
        let Some(code) = code_for(key) else {
            return;
        };
        if self.controller.binding().is_some_and(|b| b.matches(&code)) {
            let result = self.controller.on_key_up(&code, self.millis(at));
            self.note(result);
        }
    }

    fn cancel_hold(&mut self, reason: &str) {
        if self.controller.state() == ControllerState::Armed && self.controller.cancel().is_ok() {
            log::info!("hold cancelled: {reason}");
        }
    }

    fn start_rebind(&mut self, at: Instant) {
        // without release events the next press of the key would be captured
        // as the new binding, leaving the toggle hold armed
        if !self.key_release_events {
            self.cancel_hold("rebinding");
        }
        self.state = AppState::Rebinding { since: at };
    }

    fn note(&mut self, result: Result<KeyResponse, HoldError>) {
        match result {
            Ok(KeyResponse::Recorded(_)) => self.last_error = None,
            Ok(_) => {}
            Err(e @ HoldError::NonMonotonicClock { .. }) => self.last_error = Some(e),
            Err(e) => log::debug!("key event had no effect: {e}"),
        }
    }

    fn finish_rebind(&mut self, key: &KeyEvent) {
        self.state = AppState::Playing;
        if key.code == KeyCode::Esc {
            return;
        }
        let Some(code) = code_for(key) else {
            log::info!("{:?} cannot be bound", key.code);
            return;
        };
        match code.parse::<KeyBinding>() {
            Ok(binding) => {
                log::info!("rebinding to {binding}");
                self.update_settings(|s| s.key_binding = binding.code().to_string());
            }
            Err(e) => log::warn!("keeping current binding: {e}"),
        }
    }

    fn update_settings(&mut self, change: impl FnOnce(&mut Settings)) {
        let mut settings = self.controller.settings().clone();
        change(&mut settings);
        {
            let mut feedback = self.feedback.borrow_mut();
            feedback.sound_effects = settings.sound_effects;
            feedback.flash_effects = settings.flash_effects;
        }
        if let Err(e) = self.store.save(&settings) {
            log::warn!("could not save settings: {e}");
        }
        self.controller.apply_settings(settings);
    }

    fn take_bell(&mut self) -> bool {
        self.feedback.borrow_mut().take_bell(self.now)
    }
}

fn init_logging(cli: &Cli) -> Result<(), Box<dyn Error>> {
    let Some(path) = &cli.log_file else {
        return Ok(());
    };
    let path = path
        .clone()
        .or_else(AppDirs::log_path)
        .ok_or("no location available for the log file")?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let file = OpenOptions::new().create(true).append(true).open(&path)?;
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Pipe(Box::new(file)))
        .init();
    Ok(())
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    init_logging(&cli)?;

    let store = cli.config_store();
    let settings = cli.apply(store.load());

    enable_raw_mode()?;
    let key_release_events = supports_keyboard_enhancement().unwrap_or(false);
    log::info!("key release reporting: {key_release_events}");

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture, EnableFocusChange)?;
    if key_release_events {
        execute!(
            stdout,
            PushKeyboardEnhancementFlags(
                KeyboardEnhancementFlags::DISAMBIGUATE_ESCAPE_CODES
                    | KeyboardEnhancementFlags::REPORT_EVENT_TYPES
            )
        )?;
    }
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(settings, Box::new(store), key_release_events);
    let outcome = start_tui(&mut terminal, &mut app);

    if key_release_events {
        execute!(terminal.backend_mut(), PopKeyboardEnhancementFlags)?;
    }
    execute!(
        terminal.backend_mut(),
        DisableFocusChange,
        DisableMouseCapture,
        LeaveAlternateScreen,
    )?;
    disable_raw_mode()?;
    terminal.show_cursor()?;

    outcome
}

fn start_tui<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> Result<(), Box<dyn Error>> {
    let runner = Runner::new(
        CrosstermEventSource::new(),
        FixedTicker::new(Duration::from_millis(TICK_RATE_MS)),
    );

    loop {
        terminal.draw(|f| ui(app, f))?;

        let event = runner.step();
        let flow = app.handle_event(event, Instant::now());

        if app.take_bell() {
            execute!(io::stdout(), Print('\x07'))?;
        }
        if flow == Flow::Quit {
            break;
        }
    }

    Ok(())
}

fn ui(app: &App, f: &mut Frame) {
    f.render_widget(app, f.area());
}
