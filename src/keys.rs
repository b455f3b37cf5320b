use std::fmt;
use std::str::FromStr;

use crossterm::event::{KeyCode, KeyEvent, KeyEventState};

use crate::error::HoldError;

const NAMED_CODES: &[&str] = &[
    "Space",
    "Enter",
    "NumpadEnter",
    "Tab",
    "Backspace",
    "Insert",
    "Home",
    "End",
    "PageUp",
    "PageDown",
    "ArrowUp",
    "ArrowDown",
    "ArrowLeft",
    "ArrowRight",
];

/// Function keys kept for the app's own controls (rebind and the toggles)
pub const RESERVED_CODES: &[&str] = &["F2", "F3", "F4", "F5"];

/// A validated physical key code such as `Numpad5`, `Space` or `KeyM`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct KeyBinding(String);

impl KeyBinding {
    pub fn code(&self) -> &str {
        &self.0
    }

    pub fn matches(&self, code: &str) -> bool {
        self.0 == code
    }

    /// Short label shown to the player
    pub fn friendly_name(&self) -> String {
        match self.0.as_str() {
            "Numpad5" => "Num5".to_string(),
            "NumpadEnter" => "Num Enter".to_string(),
            code => code.replace("Key", "").replace("Digit", ""),
        }
    }
}

impl FromStr for KeyBinding {
    type Err = HoldError;

    fn from_str(code: &str) -> Result<Self, Self::Err> {
        if is_known_code(code) {
            Ok(Self(code.to_string()))
        } else {
            Err(HoldError::InvalidBinding(code.to_string()))
        }
    }
}

impl fmt::Display for KeyBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn is_known_code(code: &str) -> bool {
    if RESERVED_CODES.contains(&code) {
        return false;
    }
    if NAMED_CODES.contains(&code) {
        return true;
    }
    let single = |rest: &str, pred: fn(char) -> bool| {
        let mut chars = rest.chars();
        matches!((chars.next(), chars.next()), (Some(c), None) if pred(c))
    };
    if let Some(rest) = code.strip_prefix("Key") {
        return single(rest, |c| c.is_ascii_uppercase());
    }
    if let Some(rest) = code.strip_prefix("Digit") {
        return single(rest, |c| c.is_ascii_digit());
    }
    if let Some(rest) = code.strip_prefix("Numpad") {
        return single(rest, |c| c.is_ascii_digit());
    }
    if let Some(rest) = code.strip_prefix('F') {
        return matches!(rest.parse::<u8>(), Ok(1..=12));
    }
    false
}

/// Maps a terminal key event to the physical code it stands for.
///
/// Keypad digits are only told apart from the top row when the terminal
/// reports `KeyEventState::KEYPAD`.
pub fn code_for(event: &KeyEvent) -> Option<String> {
    let keypad = event.state.contains(KeyEventState::KEYPAD);
    let code = match event.code {
        KeyCode::Char(' ') => "Space".to_string(),
        KeyCode::Char(c) if c.is_ascii_alphabetic() => format!("Key{}", c.to_ascii_uppercase()),
        KeyCode::Char(c) if c.is_ascii_digit() && keypad => format!("Numpad{c}"),
        KeyCode::Char(c) if c.is_ascii_digit() => format!("Digit{c}"),
        KeyCode::KeypadBegin => "Numpad5".to_string(),
        KeyCode::Enter if keypad => "NumpadEnter".to_string(),
        KeyCode::Enter => "Enter".to_string(),
        KeyCode::Tab => "Tab".to_string(),
        KeyCode::Backspace => "Backspace".to_string(),
        KeyCode::Insert => "Insert".to_string(),
        KeyCode::Home => "Home".to_string(),
        KeyCode::End => "End".to_string(),
        KeyCode::PageUp => "PageUp".to_string(),
        KeyCode::PageDown => "PageDown".to_string(),
        KeyCode::Up => "ArrowUp".to_string(),
        KeyCode::Down => "ArrowDown".to_string(),
        KeyCode::Left => "ArrowLeft".to_string(),
        KeyCode::Right => "ArrowRight".to_string(),
        KeyCode::F(n @ 1..=12) => format!("F{n}"),
        _ => return None,
    };
    Some(code)
}
