//! GTK window wiring: event controllers feed the window shell.

use crate::input;
use crate::schedule::IdleScheduler;
use gtk4::prelude::*;
use gtk4::gdk::ScrollUnit;
use gtk4::EventControllerScrollFlags;
use std::cell::RefCell;
use std::rc::Rc;
use weft_native_core::{KeyPhase, NativeEventRef, RawEvent, WindowShell};

fn native_event(controller: &impl IsA<gtk4::EventController>) -> NativeEventRef {
    controller
        .current_event()
        .map(|event| event.as_ptr().cast())
        .unwrap_or(std::ptr::null_mut())
}

fn propagation(consumed: bool) -> glib::Propagation {
    if consumed {
        glib::Propagation::Stop
    } else {
        glib::Propagation::Proceed
    }
}

/// Scroll deltas arrive in lines for wheels and in pixels for touchpads.
pub fn scroll_delta(delta: f64, unit: ScrollUnit, line_height: f64) -> f64 {
    match unit {
        ScrollUnit::Wheel => delta * line_height,
        _ => delta,
    }
}

/// Route input, resize, fullscreen and close signals of `window` into
/// `shell`. `on_destroy` runs after the deferred destroy.
pub fn attach(
    window: &gtk4::ApplicationWindow,
    shell: &WindowShell,
    scroll_line_height: f64,
    on_destroy: impl Fn() + 'static,
) {
    // ---- keys ----
    let keys = gtk4::EventControllerKey::new();
    let held = Rc::new(RefCell::new(input::HeldKeys::default()));
    let s = shell.clone();
    let h = held.clone();
    keys.connect_key_pressed(move |controller, key, keycode, state| {
        let text = input::key_text(key);
        let raw = RawEvent::Key {
            phase: KeyPhase::Down,
            repeat: h.borrow_mut().press(keycode),
            text: &text,
            modifiers: input::modifiers(state),
        };
        propagation(s.translate_and_dispatch(&raw, native_event(controller)))
    });
    let s = shell.clone();
    let h = held.clone();
    keys.connect_key_released(move |controller, key, keycode, state| {
        h.borrow_mut().release(keycode);
        let text = input::key_text(key);
        let raw = RawEvent::Key {
            phase: KeyPhase::Up,
            repeat: false,
            text: &text,
            modifiers: input::modifiers(state),
        };
        s.translate_and_dispatch(&raw, native_event(controller));
    });
    window.connect_is_active_notify(move |window| {
        if !window.is_active() {
            held.borrow_mut().clear();
        }
    });
    window.add_controller(keys);

    // ---- buttons ----
    let click = gtk4::GestureClick::new();
    click.set_button(0);
    let s = shell.clone();
    click.connect_pressed(move |gesture, _, x, y| {
        let raw = RawEvent::Button {
            button: input::pointer_button(gesture.current_button()),
            pressed: true,
            x,
            y,
            modifiers: input::modifiers(gesture.current_event_state()),
        };
        s.translate_and_dispatch(&raw, native_event(gesture));
    });
    let s = shell.clone();
    click.connect_released(move |gesture, _, x, y| {
        let raw = RawEvent::Button {
            button: input::pointer_button(gesture.current_button()),
            pressed: false,
            x,
            y,
            modifiers: input::modifiers(gesture.current_event_state()),
        };
        s.translate_and_dispatch(&raw, native_event(gesture));
    });
    window.add_controller(click);

    // ---- motion ----
    let motion = gtk4::EventControllerMotion::new();
    let s = shell.clone();
    motion.connect_motion(move |controller, x, y| {
        let raw = RawEvent::Motion {
            x,
            y,
            modifiers: input::modifiers(controller.current_event_state()),
        };
        s.translate_and_dispatch(&raw, native_event(controller));
    });
    let s = shell.clone();
    motion.connect_leave(move |_| s.reset_pointer());
    window.add_controller(motion);

    // ---- scroll ----
    let scroll = gtk4::EventControllerScroll::new(EventControllerScrollFlags::BOTH_AXES);
    let s = shell.clone();
    scroll.connect_scroll(move |controller, dx, dy| {
        let unit = controller.unit();
        let raw = RawEvent::Scroll {
            delta_x: scroll_delta(dx, unit, scroll_line_height),
            delta_y: scroll_delta(dy, unit, scroll_line_height),
            position: None,
            modifiers: input::modifiers(controller.current_event_state()),
        };
        propagation(s.translate_and_dispatch(&raw, native_event(controller)))
    });
    window.add_controller(scroll);

    // ---- layout ----
    let s = shell.clone();
    window.connect_default_width_notify(move |window| {
        s.request_layout(
            f64::from(window.default_width()),
            f64::from(window.default_height()),
            &IdleScheduler,
        );
    });
    let s = shell.clone();
    window.connect_default_height_notify(move |window| {
        s.request_layout(
            f64::from(window.default_width()),
            f64::from(window.default_height()),
            &IdleScheduler,
        );
    });

    let s = shell.clone();
    window.connect_fullscreened_notify(move |window| s.notify_fullscreen(window.is_fullscreen()));

    // ---- close ----
    // GTK's own close is always stopped; the shell destroys the window on a
    // later turn once the delegate has agreed.
    let s = shell.clone();
    let on_destroy = Rc::new(on_destroy);
    window.connect_close_request(move |window| {
        let window = window.clone();
        let on_destroy = on_destroy.clone();
        s.request_close(&IdleScheduler, move || {
            window.destroy();
            on_destroy();
        });
        glib::Propagation::Stop
    });
}
