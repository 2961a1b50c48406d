//! winit input values reduced to toolkit-neutral ones.
//!
//! Modifier mapping:
//!
//! | winit `ModifiersState` | canonical bit |
//! |------------------------|---------------|
//! | `control_key()`        | `CONTROL`     |
//! | `super_key()`          | `META`        |
//! | `shift_key()`          | `SHIFT`       |
//! | `alt_key()`            | `ALT_OPTION`  |
//!
//! winit does not report Fn; `FN` is never set. On macOS `super_key()` is
//! Command, so Command lands on `META` like the Windows/Super key elsewhere.

use crate::editor::{EditAction, EditorKey};
use weft_native_core::{CursorKind, Modifiers, NavKey, PointerButton};
use winit::dpi::PhysicalPosition;
use winit::event::{MouseButton, MouseScrollDelta};
use winit::keyboard::{Key, ModifiersState, NamedKey};
use winit::window::CursorIcon;

pub fn modifiers(state: ModifiersState) -> Modifiers {
    let mut out = Modifiers::empty();
    out.set(Modifiers::CONTROL, state.control_key());
    out.set(Modifiers::META, state.super_key());
    out.set(Modifiers::SHIFT, state.shift_key());
    out.set(Modifiers::ALT_OPTION, state.alt_key());
    out
}

pub fn nav_key(key: &Key) -> Option<NavKey> {
    let Key::Named(named) = key else {
        return None;
    };
    Some(match named {
        NamedKey::Tab => NavKey::Tab,
        NamedKey::Enter => NavKey::Return,
        NamedKey::Escape => NavKey::Escape,
        NamedKey::ArrowLeft => NavKey::Left,
        NamedKey::ArrowRight => NavKey::Right,
        NamedKey::ArrowDown => NavKey::Down,
        NamedKey::ArrowUp => NavKey::Up,
        _ => return None,
    })
}

/// Text a key event produced, without control characters.
pub fn printable(text: Option<&str>) -> &str {
    match text {
        Some(text) if !text.chars().any(char::is_control) => text,
        _ => "",
    }
}

/// What a pressed key means to a focused editor.
pub fn editor_key(key: &Key, text: Option<&str>, modifiers: Modifiers) -> Option<EditorKey> {
    if let Some(nav) = nav_key(key) {
        return Some(EditorKey::Nav(nav));
    }
    match key {
        Key::Named(NamedKey::Backspace) => return Some(EditorKey::Action(EditAction::Backspace)),
        Key::Named(NamedKey::Delete) => return Some(EditorKey::Action(EditAction::Delete)),
        _ => {}
    }

    if modifiers.intersects(Modifiers::CONTROL | Modifiers::META) {
        let Key::Character(c) = key else {
            return None;
        };
        let action = match c.to_lowercase().as_str() {
            "a" => EditAction::SelectAll,
            "c" => EditAction::Copy,
            "x" => EditAction::Cut,
            "v" => EditAction::Paste,
            _ => return None,
        };
        return Some(EditorKey::Action(action));
    }

    let text = printable(text);
    (!text.is_empty()).then(|| EditorKey::Action(EditAction::Insert(text.to_string())))
}

pub fn pointer_button(button: MouseButton) -> PointerButton {
    match button {
        MouseButton::Left => PointerButton::Left,
        MouseButton::Right => PointerButton::Right,
        MouseButton::Middle => PointerButton::Middle,
        MouseButton::Back => PointerButton::Other(4),
        MouseButton::Forward => PointerButton::Other(5),
        MouseButton::Other(n) => PointerButton::Other(n),
    }
}

/// Scroll delta in logical pixels, positive towards the end of the content.
///
/// winit's sign is the direction the content moves, the opposite of GTK's.
pub fn scroll_delta(delta: MouseScrollDelta, line_height: f64, scale_factor: f64) -> (f64, f64) {
    match delta {
        MouseScrollDelta::LineDelta(x, y) => (-f64::from(x) * line_height, -f64::from(y) * line_height),
        MouseScrollDelta::PixelDelta(PhysicalPosition { x, y }) => {
            let scale = if scale_factor > 0.0 { scale_factor } else { 1.0 };
            (-x / scale, -y / scale)
        }
    }
}

pub fn cursor_icon(kind: CursorKind) -> CursorIcon {
    match kind {
        CursorKind::Arrow => CursorIcon::Default,
        CursorKind::Pointer => CursorIcon::Pointer,
        CursorKind::IBeam => CursorIcon::Text,
        CursorKind::HorizontalResize => CursorIcon::EwResize,
        CursorKind::VerticalResize => CursorIcon::NsResize,
    }
}
