//! Canonical event model
//!
//! Every backend reduces its toolkit events to a [`CanonicalEvent`] before the
//! UI core sees them. The struct is `#[repr(C)]` so a core that lives on the
//! far side of a C boundary reads the same layout.

use bitflags::bitflags;
use std::ffi::c_void;
use std::fmt;

/// Size of the inline key text buffer, NUL terminator included.
pub const KEY_CHARACTERS_CAPACITY: usize = 64;

/// Opaque pointer to the toolkit event a canonical event was built from.
///
/// Kept only so the core can hand it back to the toolkit; never dereferenced
/// on this side of the boundary.
pub type NativeEventRef = *mut c_void;

bitflags! {
    /// Modifier keys held while an event was produced.
    ///
    /// The bit assignment follows the Qt-style header:
    ///
    /// | bit | canonical    | GTK 4 (`gdk::ModifierType`) | winit (`ModifiersState`) | macOS header     |
    /// |-----|--------------|-----------------------------|--------------------------|------------------|
    /// | 1   | `CONTROL`    | `CONTROL_MASK`              | `control_key()`          | `COMMAND` (⌘)    |
    /// | 2   | `META`       | `SUPER_MASK`, `META_MASK`   | `super_key()`            | `CONTROL` (⌃)    |
    /// | 4   | `SHIFT`      | `SHIFT_MASK`                | `shift_key()`            | `SHIFT`          |
    /// | 8   | `FN`         | never reported              | never reported           | `FN`             |
    /// | 16  | `ALT_OPTION` | `ALT_MASK`                  | `alt_key()`              | `ALT_OPTION` (⌥) |
    ///
    /// The macOS column records that platform's own header, which swaps the
    /// meaning of the two low bits. A Cocoa backend must translate into the
    /// canonical column rather than pass its header values through.
    #[repr(transparent)]
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Modifiers: u8 {
        const CONTROL = 1;
        const META = 2;
        const SHIFT = 4;
        const FN = 8;
        const ALT_OPTION = 16;
    }
}

/// Pointer shapes a collaborator may request for a window region.
#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CursorKind {
    #[default]
    Arrow = 0,
    Pointer = 1,
    IBeam = 2,
    HorizontalResize = 3,
    VerticalResize = 4,
}

impl CursorKind {
    pub fn from_raw(raw: i32) -> Option<Self> {
        match raw {
            0 => Some(CursorKind::Arrow),
            1 => Some(CursorKind::Pointer),
            2 => Some(CursorKind::IBeam),
            3 => Some(CursorKind::HorizontalResize),
            4 => Some(CursorKind::VerticalResize),
            _ => None,
        }
    }
}

/// One normalized input occurrence.
#[repr(C)]
#[derive(Clone, Copy)]
pub struct CanonicalEvent {
    pub is_mouse: bool,
    pub is_scroll: bool,
    pub is_up: bool,
    pub is_down: bool,
    pub is_left_button: bool,
    pub is_right_button: bool,
    pub modifiers: Modifiers,
    pub cursor_x: f64,
    pub cursor_y: f64,
    /// Pointer movement since the previous pointer event, or the scroll delta.
    pub delta_x: f64,
    pub delta_y: f64,
    /// NUL-terminated UTF-8 key text.
    pub key_characters: [u8; KEY_CHARACTERS_CAPACITY],
    pub native_event: NativeEventRef,
}

impl Default for CanonicalEvent {
    fn default() -> Self {
        Self {
            is_mouse: false,
            is_scroll: false,
            is_up: false,
            is_down: false,
            is_left_button: false,
            is_right_button: false,
            modifiers: Modifiers::empty(),
            cursor_x: 0.0,
            cursor_y: 0.0,
            delta_x: 0.0,
            delta_y: 0.0,
            key_characters: [0; KEY_CHARACTERS_CAPACITY],
            native_event: std::ptr::null_mut(),
        }
    }
}

impl CanonicalEvent {
    /// Copy `text` into the inline buffer.
    ///
    /// Text longer than `KEY_CHARACTERS_CAPACITY - 1` bytes is cut at the last
    /// character boundary that fits. Returns `false` when truncation happened.
    pub fn set_key_characters(&mut self, text: &str) -> bool {
        let limit = KEY_CHARACTERS_CAPACITY - 1;
        let mut len = text.len().min(limit);
        while len > 0 && !text.is_char_boundary(len) {
            len -= 1;
        }

        self.key_characters = [0; KEY_CHARACTERS_CAPACITY];
        self.key_characters[..len].copy_from_slice(&text.as_bytes()[..len]);
        len == text.len()
    }

    /// Key text up to the terminator.
    pub fn key_characters(&self) -> &str {
        let end = self
            .key_characters
            .iter()
            .position(|&b| b == 0)
            .unwrap_or(KEY_CHARACTERS_CAPACITY);
        let bytes = &self.key_characters[..end];
        match std::str::from_utf8(bytes) {
            Ok(text) => text,
            Err(e) => std::str::from_utf8(&bytes[..e.valid_up_to()]).unwrap_or_default(),
        }
    }

    pub fn is_key(&self) -> bool {
        !self.is_mouse && !self.is_scroll
    }
}

impl fmt::Debug for CanonicalEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CanonicalEvent")
            .field("is_mouse", &self.is_mouse)
            .field("is_scroll", &self.is_scroll)
            .field("is_up", &self.is_up)
            .field("is_down", &self.is_down)
            .field("is_left_button", &self.is_left_button)
            .field("is_right_button", &self.is_right_button)
            .field("modifiers", &self.modifiers)
            .field("cursor", &(self.cursor_x, self.cursor_y))
            .field("delta", &(self.delta_x, self.delta_y))
            .field("key_characters", &self.key_characters())
            .finish_non_exhaustive()
    }
}
