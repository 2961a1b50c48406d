//! Event translator
//!
//! Backends hand the translator a [`RawEvent`], already stripped of toolkit
//! types, and get back a [`CanonicalEvent`]. The translator owns the per-window
//! [`PointerLatch`] because move events from GTK and winit do not say which
//! buttons are held.

use crate::event::{CanonicalEvent, Modifiers, NativeEventRef};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerButton {
    Left,
    Right,
    Middle,
    Other(u16),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyPhase {
    Down,
    Up,
}

/// Toolkit-neutral view of one native input event.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RawEvent<'a> {
    Key {
        phase: KeyPhase,
        repeat: bool,
        text: &'a str,
        modifiers: Modifiers,
    },
    Button {
        button: PointerButton,
        pressed: bool,
        x: f64,
        y: f64,
        modifiers: Modifiers,
    },
    Motion {
        x: f64,
        y: f64,
        modifiers: Modifiers,
    },
    Scroll {
        delta_x: f64,
        delta_y: f64,
        /// Some toolkits (GTK) do not attach a position to scroll events.
        position: Option<(f64, f64)>,
        modifiers: Modifiers,
    },
}

/// Button and position state remembered between pointer events.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PointerLatch {
    pub left_down: bool,
    pub right_down: bool,
    pub last_position: Option<(f64, f64)>,
}

#[derive(Debug, Default)]
pub struct EventTranslator {
    latch: PointerLatch,
}

impl EventTranslator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn latch(&self) -> PointerLatch {
        self.latch
    }

    /// Forget held buttons, e.g. after the window lost pointer grab.
    pub fn reset_buttons(&mut self) {
        self.latch.left_down = false;
        self.latch.right_down = false;
    }

    pub fn translate(&mut self, raw: &RawEvent<'_>, native: NativeEventRef) -> CanonicalEvent {
        let mut event = CanonicalEvent {
            native_event: native,
            ..CanonicalEvent::default()
        };

        match *raw {
            RawEvent::Key { phase, repeat, text, modifiers } => {
                event.modifiers = modifiers;
                match phase {
                    KeyPhase::Down => event.is_down = !repeat,
                    KeyPhase::Up => event.is_up = true,
                }
                if !event.set_key_characters(text) {
                    log::debug!("key text truncated from {} bytes", text.len());
                }
                if let Some((x, y)) = self.latch.last_position {
                    event.cursor_x = x;
                    event.cursor_y = y;
                }
            }

            RawEvent::Button { button, pressed, x, y, modifiers } => {
                event.is_mouse = true;
                event.modifiers = modifiers;
                event.is_left_button = button == PointerButton::Left;
                event.is_right_button = button == PointerButton::Right;
                if pressed {
                    event.is_down = true;
                } else {
                    event.is_up = true;
                }
                match button {
                    PointerButton::Left => self.latch.left_down = pressed,
                    PointerButton::Right => self.latch.right_down = pressed,
                    _ => {}
                }
                self.track_position(x, y, &mut event);
            }

            RawEvent::Motion { x, y, modifiers } => {
                event.is_mouse = true;
                event.modifiers = modifiers;
                event.is_left_button = self.latch.left_down;
                event.is_right_button = self.latch.right_down;
                self.track_position(x, y, &mut event);
            }

            RawEvent::Scroll { delta_x, delta_y, position, modifiers } => {
                event.is_scroll = true;
                event.modifiers = modifiers;
                event.delta_x = delta_x;
                event.delta_y = delta_y;
                match position {
                    Some((x, y)) => {
                        self.latch.last_position = Some((x, y));
                        event.cursor_x = x;
                        event.cursor_y = y;
                    }
                    None => {
                        if let Some((x, y)) = self.latch.last_position {
                            event.cursor_x = x;
                            event.cursor_y = y;
                        }
                    }
                }
            }
        }

        event
    }

    /// Translate `raw` and hand it to the core's dispatch entry point.
    ///
    /// Returns what the core returned: `false` means the toolkit should run
    /// its own default handling as well.
    pub fn translate_and_dispatch(
        &mut self,
        raw: &RawEvent<'_>,
        native: NativeEventRef,
        dispatch: impl FnOnce(&CanonicalEvent) -> bool,
    ) -> bool {
        let event = self.translate(raw, native);
        dispatch(&event)
    }

    fn track_position(&mut self, x: f64, y: f64, event: &mut CanonicalEvent) {
        let (last_x, last_y) = self.latch.last_position.unwrap_or((x, y));
        event.cursor_x = x;
        event.cursor_y = y;
        event.delta_x = x - last_x;
        event.delta_y = y - last_y;
        self.latch.last_position = Some((x, y));
    }
}
