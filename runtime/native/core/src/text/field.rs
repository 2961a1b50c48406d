//! Single-line text fields
//!
//! A [`TextField`] keeps one native entry in step with a core string. The
//! core pushes text and style through the setters, each guarded like the
//! [`TextView`](super::TextView) setters. The user's edits come back as whole
//! strings through the text binding, focus as tokens through the focus
//! binding, and Return through the action callback.

use super::attributes::TextStyle;
use super::widget::NativeTextField;
use crate::focus::{FocusToken, FocusTracker};
use crate::guard::ApplyFlag;
use crate::handle::{ActionCallback, Slot, TextBinding, TokenBinding};
use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

/// Fixed at construction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct FieldOptions {
    /// No border or background; the field draws as plain text.
    pub unstyled: bool,
    /// Mask the content, as for a password.
    pub secure: bool,
}

struct FieldInner<W> {
    widget: W,
    options: FieldOptions,
    flag: ApplyFlag,
    text: RefCell<String>,
    style: Cell<Option<TextStyle>>,
    bound: Cell<bool>,
    text_binding: Slot<TextBinding>,
    token: Slot<TokenBinding>,
    action: Slot<ActionCallback>,
    focus: Cell<FocusTracker>,
}

pub struct TextField<W: NativeTextField> {
    inner: Rc<FieldInner<W>>,
}

impl<W: NativeTextField> Clone for TextField<W> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

pub struct WeakTextField<W: NativeTextField> {
    inner: Weak<FieldInner<W>>,
}

impl<W: NativeTextField> Clone for WeakTextField<W> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<W: NativeTextField> WeakTextField<W> {
    pub fn upgrade(&self) -> Option<TextField<W>> {
        self.inner.upgrade().map(|inner| TextField { inner })
    }
}

impl<W: NativeTextField> TextField<W> {
    pub fn new(widget: W, options: FieldOptions) -> Self {
        let field = Self {
            inner: Rc::new(FieldInner {
                widget,
                options,
                flag: ApplyFlag::new(),
                text: RefCell::new(String::new()),
                style: Cell::new(None),
                bound: Cell::new(false),
                text_binding: Slot::new(),
                token: Slot::new(),
                action: Slot::new(),
                focus: Cell::new(FocusTracker::new()),
            }),
        };
        {
            let _guard = field.inner.flag.acquire();
            field.inner.widget.configure(options);
        }
        field
    }

    pub fn downgrade(&self) -> WeakTextField<W> {
        WeakTextField {
            inner: Rc::downgrade(&self.inner),
        }
    }

    pub fn widget(&self) -> &W {
        &self.inner.widget
    }

    pub fn options(&self) -> FieldOptions {
        self.inner.options
    }

    pub fn is_bound(&self) -> bool {
        self.inner.bound.get()
    }

    pub fn is_applying_external(&self) -> bool {
        self.inner.flag.is_applying()
    }

    /// Last text both sides agreed on.
    pub fn text(&self) -> String {
        self.inner.text.borrow().clone()
    }

    /// Token announced when the field gains focus.
    pub fn token(&self) -> Option<i32> {
        self.inner.focus.get().page()
    }

    // ========================================================================
    // Core → native
    // ========================================================================

    /// Install the three capability handles and the initial text. Handles
    /// from a previous bind are released first.
    pub fn bind(
        &self,
        text: &str,
        text_binding: Box<TextBinding>,
        focused: Box<TokenBinding>,
        action: Box<ActionCallback>,
        token: i32,
    ) {
        self.inner.text_binding.bind(text_binding);
        self.inner.token.bind(focused);
        self.inner.action.bind(action);

        let mut tracker = self.inner.focus.get();
        tracker.set_page(Some(token));
        self.inner.focus.set(tracker);

        self.inner.bound.set(true);
        self.apply_text(text);
        self.sync_focus_silently();
        log::debug!("text field bound with token {}", token);
    }

    /// Bring the field in line with the core. Only what differs from the
    /// last update reaches the widget, so an unchanged update keeps the
    /// user's caret.
    pub fn update(&self, text: &str, style: TextStyle) {
        if self.inner.style.get() != Some(style) {
            self.inner.style.set(Some(style));
            let _guard = self.inner.flag.acquire();
            self.inner.widget.set_style(&style);
        }
        self.apply_text(text);
    }

    pub fn set_text(&self, text: &str) {
        self.apply_text(text);
    }

    pub fn set_font(&self, font: &W::Font) {
        let _guard = self.inner.flag.acquire();
        self.inner.widget.set_font(font);
    }

    /// Give the field keyboard focus without emitting a token.
    pub fn focus(&self) {
        {
            let _guard = self.inner.flag.acquire();
            self.inner.widget.focus();
        }
        self.sync_focus_silently();
    }

    /// Take keyboard focus away without emitting a token.
    pub fn unfocus(&self) {
        {
            let _guard = self.inner.flag.acquire();
            self.inner.widget.unfocus();
        }
        self.sync_focus_silently();
    }

    // Edits from these come back through `native_text_changed`.

    pub fn select_all(&self) {
        self.inner.widget.select_all();
    }

    pub fn cut(&self) {
        self.inner.widget.cut();
    }

    pub fn copy(&self) {
        self.inner.widget.copy();
    }

    pub fn paste(&self) {
        self.inner.widget.paste();
    }

    /// Size within the given bounds. A finite width is always used in full;
    /// fields stretch horizontally.
    pub fn size(&self, max_width: f64, max_height: f64) -> (f64, f64) {
        let (width, height) = self.inner.widget.measure(max_width, max_height);
        let width = if max_width.is_finite() { max_width } else { width };
        (width.max(0.0), height.min(max_height).max(0.0))
    }

    /// Release every capability handle. Safe to call more than once.
    pub fn teardown(&self) {
        let released = [
            self.inner.text_binding.release(),
            self.inner.token.release(),
            self.inner.action.release(),
        ];
        if self.inner.bound.replace(false) || released.iter().any(|&r| r) {
            log::debug!("text field torn down");
        }
    }

    // ========================================================================
    // Native → core
    // ========================================================================

    /// The user changed the field's text to `text`.
    pub fn native_text_changed(&self, text: &str) {
        if self.inner.flag.is_applying() {
            log::debug!("text field echo swallowed");
            return;
        }
        {
            let mut mirror = self.inner.text.borrow_mut();
            if *mirror == text {
                return;
            }
            mirror.clear();
            mirror.push_str(text);
        }
        self.inner.text_binding.invoke(|binding| binding(text));
    }

    pub fn native_focus_changed(&self, focused: bool) {
        let mut tracker = self.inner.focus.get();
        if self.inner.flag.is_applying() {
            log::debug!("text field focus echo swallowed");
            tracker.sync_silently(focused);
            self.inner.focus.set(tracker);
            return;
        }

        let token = if focused { tracker.gained() } else { tracker.lost() };
        self.inner.focus.set(tracker);
        if let Some(token) = token {
            self.emit_token(token);
        }
    }

    /// The user pressed Return in the field.
    pub fn native_submit(&self) {
        if self.inner.action.invoke(|action| action()).is_none() {
            log::debug!("text field submitted with no action bound");
        }
    }

    // ========================================================================
    // Helpers
    // ========================================================================

    fn apply_text(&self, text: &str) {
        if !self.inner.bound.get() {
            log::debug!("set_text ignored: text field is detached");
            return;
        }
        if *self.inner.text.borrow() == text && self.inner.widget.text() == text {
            return;
        }
        *self.inner.text.borrow_mut() = text.to_owned();
        let _guard = self.inner.flag.acquire();
        self.inner.widget.set_text(text);
    }

    fn sync_focus_silently(&self) {
        let mut tracker = self.inner.focus.get();
        tracker.sync_silently(self.inner.widget.has_focus());
        self.inner.focus.set(tracker);
    }

    fn emit_token(&self, token: FocusToken) {
        if self.inner.token.invoke(|binding| binding(token)).is_none() {
            log::debug!("focus token {:?} dropped: no binding", token);
        }
    }
}

impl<W: NativeTextField> fmt::Debug for TextField<W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TextField")
            .field("bound", &self.inner.bound.get())
            .field("options", &self.inner.options)
            .field("len", &self.inner.text.borrow().len())
            .finish_non_exhaustive()
    }
}
