//! Navigation key codes offered to the core before native handling.

use crate::event::Modifiers;

/// The nine codes a key callback can receive.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyCode {
    Tab = 0,
    Untab = 1,
    Newline = 2,
    AltNewline = 3,
    Escape = 4,
    Left = 5,
    Right = 6,
    Down = 7,
    Up = 8,
}

impl KeyCode {
    pub fn from_raw(raw: u8) -> Option<Self> {
        Some(match raw {
            0 => KeyCode::Tab,
            1 => KeyCode::Untab,
            2 => KeyCode::Newline,
            3 => KeyCode::AltNewline,
            4 => KeyCode::Escape,
            5 => KeyCode::Left,
            6 => KeyCode::Right,
            7 => KeyCode::Down,
            8 => KeyCode::Up,
            _ => return None,
        })
    }

    pub fn as_raw(self) -> u8 {
        self as u8
    }

    /// Page step for focus traversal, if this code moves focus.
    pub fn page_step(self) -> Option<i32> {
        match self {
            KeyCode::Tab => Some(1),
            KeyCode::Untab => Some(-1),
            _ => None,
        }
    }
}

/// Physical keys the backends intercept, before modifiers are applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NavKey {
    Tab,
    Return,
    Escape,
    Left,
    Right,
    Down,
    Up,
}

/// Combine a physical key with the held modifiers.
///
/// Only Shift changes the code: Shift+Tab is untab and Shift+Return is the
/// alternate newline. Other modifiers leave the base code untouched.
pub fn classify(key: NavKey, modifiers: Modifiers) -> KeyCode {
    let shift = modifiers.contains(Modifiers::SHIFT);
    match key {
        NavKey::Tab if shift => KeyCode::Untab,
        NavKey::Tab => KeyCode::Tab,
        NavKey::Return if shift => KeyCode::AltNewline,
        NavKey::Return => KeyCode::Newline,
        NavKey::Escape => KeyCode::Escape,
        NavKey::Left => KeyCode::Left,
        NavKey::Right => KeyCode::Right,
        NavKey::Down => KeyCode::Down,
        NavKey::Up => KeyCode::Up,
    }
}

/// What a backend should do after offering a key to the core.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyDisposition {
    /// The key callback consumed the key.
    Handled,
    /// Unhandled escape: keyboard focus was released.
    FocusReleased,
    /// Unhandled tab/untab on a paged widget: focus moved to this page.
    FocusMoved(i32),
    /// Let the toolkit run its own handling.
    NativeDefault,
}

impl KeyDisposition {
    pub fn suppresses_default(self) -> bool {
        !matches!(self, KeyDisposition::NativeDefault)
    }
}
