//! GDK input values reduced to toolkit-neutral ones.
//!
//! Modifier mapping:
//!
//! | GDK mask       | canonical bit |
//! |----------------|---------------|
//! | `CONTROL_MASK` | `CONTROL`     |
//! | `SUPER_MASK`   | `META`        |
//! | `META_MASK`    | `META`        |
//! | `SHIFT_MASK`   | `SHIFT`       |
//! | `ALT_MASK`     | `ALT_OPTION`  |
//!
//! GDK has no Fn mask; `FN` is never set.

use gtk4::gdk;
use std::collections::HashSet;
use weft_native_core::{CursorKind, Modifiers, NavKey, PointerButton};

pub fn modifiers(state: gdk::ModifierType) -> Modifiers {
    let mut out = Modifiers::empty();
    if state.contains(gdk::ModifierType::CONTROL_MASK) {
        out |= Modifiers::CONTROL;
    }
    if state.intersects(gdk::ModifierType::SUPER_MASK | gdk::ModifierType::META_MASK) {
        out |= Modifiers::META;
    }
    if state.contains(gdk::ModifierType::SHIFT_MASK) {
        out |= Modifiers::SHIFT;
    }
    if state.contains(gdk::ModifierType::ALT_MASK) {
        out |= Modifiers::ALT_OPTION;
    }
    out
}

/// Navigation keys offered to the key callback. Keypad variants count.
pub fn nav_key(key: gdk::Key) -> Option<NavKey> {
    Some(match key {
        gdk::Key::Tab | gdk::Key::KP_Tab | gdk::Key::ISO_Left_Tab => NavKey::Tab,
        gdk::Key::Return | gdk::Key::KP_Enter | gdk::Key::ISO_Enter => NavKey::Return,
        gdk::Key::Escape => NavKey::Escape,
        gdk::Key::Left | gdk::Key::KP_Left => NavKey::Left,
        gdk::Key::Right | gdk::Key::KP_Right => NavKey::Right,
        gdk::Key::Down | gdk::Key::KP_Down => NavKey::Down,
        gdk::Key::Up | gdk::Key::KP_Up => NavKey::Up,
        _ => return None,
    })
}

/// Printable text for a key, empty for control keys.
pub fn key_text(key: gdk::Key) -> String {
    key.to_unicode()
        .filter(|c| !c.is_control())
        .map(String::from)
        .unwrap_or_default()
}

/// Hardware keycodes currently held down.
///
/// GDK delivers auto-repeat as further presses with no release in between,
/// so a press of a key that is already held is a repeat.
#[derive(Debug, Default)]
pub struct HeldKeys {
    down: HashSet<u32>,
}

impl HeldKeys {
    /// Record a press; returns `true` when it is an auto-repeat.
    pub fn press(&mut self, keycode: u32) -> bool {
        !self.down.insert(keycode)
    }

    pub fn release(&mut self, keycode: u32) {
        self.down.remove(&keycode);
    }

    /// Focus left the window; releases will not arrive.
    pub fn clear(&mut self) {
        self.down.clear();
    }
}

/// GDK button numbers: 1 primary, 2 middle, 3 secondary.
pub fn pointer_button(button: u32) -> PointerButton {
    match button {
        1 => PointerButton::Left,
        2 => PointerButton::Middle,
        3 => PointerButton::Right,
        other => PointerButton::Other(u16::try_from(other).unwrap_or(u16::MAX)),
    }
}

/// CSS cursor names understood by `gtk_widget_set_cursor_from_name`.
pub fn cursor_name(kind: CursorKind) -> &'static str {
    match kind {
        CursorKind::Arrow => "default",
        CursorKind::Pointer => "pointer",
        CursorKind::IBeam => "text",
        CursorKind::HorizontalResize => "ew-resize",
        CursorKind::VerticalResize => "ns-resize",
    }
}
