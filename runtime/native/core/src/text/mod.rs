//! Text synchronization engine
//!
//! A [`TextView`] sits between the UI core and one native editable widget.
//! Two paths mutate the widget:
//!
//! - core → native: the setters on `TextView`. Each runs the native call
//!   under an [`ApplyGuard`](crate::guard::ApplyGuard) so the widget's echo
//!   signals are swallowed;
//! - native → core: the `native_*` entry points, called by the backend from
//!   toolkit signals. They update the mirror [`Document`] and forward to the
//!   core's capability handles.
//!
//! The core speaks UTF-8 byte offsets; the widget speaks its own unit. All
//! translation goes through the mirror's content, so both sides always agree
//! on what an offset means.

pub mod attributes;
pub mod document;
pub mod field;
pub mod label;
pub mod offsets;
pub mod widget;

pub use attributes::{CharAttributes, Color, Justification, LineAttributes, TextStyle};
pub use document::Document;
pub use field::{FieldOptions, TextField, WeakTextField};
pub use label::TextLabel;
pub use offsets::PositionUnit;
pub use widget::{NativeLabel, NativeTextField, NativeTextView};

use crate::focus::{FocusToken, FocusTracker};
use crate::guard::ApplyFlag;
use crate::handle::{DocumentSink, KeyCallback, Slot, TokenBinding};
use crate::keys::{KeyCode, KeyDisposition};
use offsets::{byte_range_to_unit, clamp_range, clamp_span, unit_range_to_byte, unit_to_byte};
use std::cell::{Cell, RefCell};
use std::fmt;
use std::ops::Range;
use std::rc::{Rc, Weak};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    /// No document bound; content setters are ignored.
    Detached,
    Bound,
    /// A core setter is writing into the widget.
    ApplyingExternal,
}

struct Inner<W> {
    widget: W,
    flag: ApplyFlag,
    document: RefCell<Document>,
    bound: Cell<bool>,
    sink: Slot<dyn DocumentSink>,
    token: Slot<TokenBinding>,
    key_callback: Slot<KeyCallback>,
    focus: Cell<FocusTracker>,
}

pub struct TextView<W: NativeTextView> {
    inner: Rc<Inner<W>>,
}

impl<W: NativeTextView> Clone for TextView<W> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

/// Non-owning reference for toolkit signal handlers.
pub struct WeakTextView<W: NativeTextView> {
    inner: Weak<Inner<W>>,
}

impl<W: NativeTextView> Clone for WeakTextView<W> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<W: NativeTextView> WeakTextView<W> {
    pub fn upgrade(&self) -> Option<TextView<W>> {
        self.inner.upgrade().map(|inner| TextView { inner })
    }
}

impl<W: NativeTextView> TextView<W> {
    pub fn new(widget: W) -> Self {
        Self {
            inner: Rc::new(Inner {
                widget,
                flag: ApplyFlag::new(),
                document: RefCell::new(Document::default()),
                bound: Cell::new(false),
                sink: Slot::new(),
                token: Slot::new(),
                key_callback: Slot::new(),
                focus: Cell::new(FocusTracker::new()),
            }),
        }
    }

    pub fn downgrade(&self) -> WeakTextView<W> {
        WeakTextView {
            inner: Rc::downgrade(&self.inner),
        }
    }

    pub fn widget(&self) -> &W {
        &self.inner.widget
    }

    pub fn sync_state(&self) -> SyncState {
        if self.inner.flag.is_applying() {
            SyncState::ApplyingExternal
        } else if self.inner.bound.get() {
            SyncState::Bound
        } else {
            SyncState::Detached
        }
    }

    pub fn is_applying_external(&self) -> bool {
        self.inner.flag.is_applying()
    }

    /// Snapshot of the mirrored content.
    pub fn content(&self) -> String {
        self.inner.document.borrow().content().to_owned()
    }

    /// Snapshot of the whole mirror, attributes included.
    pub fn document(&self) -> Document {
        self.inner.document.borrow().clone()
    }

    pub fn page_id(&self) -> Option<i32> {
        self.inner.focus.get().page()
    }

    // ========================================================================
    // Core → native
    // ========================================================================

    /// Attach a document: replace all content, reset attributes and install
    /// the three capability handles. Handles from a previous bind are
    /// released before anything else happens.
    pub fn bind(
        &self,
        content: &str,
        sink: Box<dyn DocumentSink>,
        token: Box<TokenBinding>,
        key_callback: Box<KeyCallback>,
    ) {
        self.inner.sink.bind(sink);
        self.inner.token.bind(token);
        self.inner.key_callback.bind(key_callback);

        {
            let _guard = self.inner.flag.acquire();
            self.inner.widget.set_content(content);
        }
        self.inner.document.borrow_mut().reset(content);
        self.inner.bound.set(true);
        self.resync_selection();
        log::debug!("text view bound ({} bytes)", content.len());
    }

    /// Splice `text` over `[start, start + len)` (byte offsets).
    pub fn replace(&self, start: usize, len: usize, text: &str) {
        if !self.require_bound("replace") {
            return;
        }

        let (range, native) = {
            let document = self.inner.document.borrow();
            let (range, adjusted) = clamp_span(document.content(), start, len);
            if adjusted {
                log::warn!(
                    "replace({}, {}) clamped to {:?} (len {})",
                    start,
                    len,
                    range,
                    document.len()
                );
            }
            let native = byte_range_to_unit(document.content(), range.clone(), self.unit());
            (range, native)
        };

        {
            let _guard = self.inner.flag.acquire();
            self.inner.widget.replace(native, text);
        }
        self.inner.document.borrow_mut().replace(range, text);
        self.resync_selection();
    }

    /// Select `[start, start + len)` (byte offsets).
    pub fn set_selection(&self, start: usize, len: usize) {
        if !self.require_bound("set_selection") {
            return;
        }

        let native = {
            let mut document = self.inner.document.borrow_mut();
            document.set_selection(start, start.saturating_add(len));
            byte_range_to_unit(document.content(), document.selection(), self.unit())
        };

        let _guard = self.inner.flag.acquire();
        self.inner.widget.set_selection(native);
    }

    pub fn set_char_attributes(&self, start: usize, end: usize, attributes: CharAttributes) {
        if !self.require_bound("set_char_attributes") {
            return;
        }

        let (range, native) = {
            let document = self.inner.document.borrow();
            let (range, adjusted) = clamp_range(document.content(), start, end);
            if adjusted {
                log::warn!("char attributes {}..{} clamped to {:?}", start, end, range);
            }
            let native = byte_range_to_unit(document.content(), range.clone(), self.unit());
            (range, native)
        };

        {
            let _guard = self.inner.flag.acquire();
            self.inner.widget.set_char_attributes(native, &attributes);
        }
        self.inner.document.borrow_mut().set_char_attributes(range, attributes);
    }

    /// Style line `line`, whose text occupies `[start, end)`.
    pub fn set_line_attributes(
        &self,
        line: usize,
        start: usize,
        end: usize,
        attributes: LineAttributes,
    ) {
        if !self.require_bound("set_line_attributes") {
            return;
        }

        let native = {
            let mut document = self.inner.document.borrow_mut();
            if !document.set_line_attributes(line, attributes) {
                log::warn!(
                    "line {} out of range ({} lines); attributes ignored",
                    line,
                    document.line_count()
                );
                return;
            }
            let (range, adjusted) = clamp_range(document.content(), start, end);
            if adjusted {
                log::warn!("line {} range {}..{} clamped to {:?}", line, start, end, range);
            }
            byte_range_to_unit(document.content(), range, self.unit())
        };

        let _guard = self.inner.flag.acquire();
        self.inner.widget.set_line_attributes(native, &attributes);
    }

    pub fn set_editing_state(&self, editing: bool) {
        self.inner.document.borrow_mut().set_editing(editing);
        self.inner.widget.set_editable(editing);
    }

    pub fn set_page_id(&self, page: Option<i32>) {
        let mut tracker = self.inner.focus.get();
        tracker.set_page(page);
        self.inner.focus.set(tracker);
    }

    pub fn set_font(&self, font: &W::Font) {
        let _guard = self.inner.flag.acquire();
        self.inner.widget.set_font(font);
    }

    /// Give the widget keyboard focus without emitting a token.
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

    // Clipboard and select-all act like the user did them, so their edits
    // flow back through the native entry points unguarded.

    pub fn copy(&self) {
        self.inner.widget.copy();
    }

    pub fn cut(&self) {
        self.inner.widget.cut();
    }

    pub fn paste(&self) {
        self.inner.widget.paste();
    }

    pub fn select_all(&self) {
        self.inner.widget.select_all();
    }

    /// Current native selection as a byte range.
    pub fn selection(&self) -> Range<usize> {
        let native = self.inner.widget.selection();
        let document = self.inner.document.borrow();
        unit_range_to_byte(document.content(), native, self.unit())
    }

    pub fn line_height(&self, line: usize, start: usize, end: usize, width: f64) -> f64 {
        let native = {
            let document = self.inner.document.borrow();
            let (range, adjusted) = clamp_range(document.content(), start, end);
            if adjusted {
                log::warn!("line {} range {}..{} clamped to {:?}", line, start, end, range);
            }
            byte_range_to_unit(document.content(), range, self.unit())
        };
        self.inner.widget.line_height(native, width)
    }

    pub fn cursor_position(&self) -> (f64, f64) {
        self.inner.widget.cursor_position()
    }

    /// Release every capability handle. Safe to call more than once.
    pub fn teardown(&self) {
        let released = [
            self.inner.sink.release(),
            self.inner.token.release(),
            self.inner.key_callback.release(),
        ];
        if self.inner.bound.replace(false) || released.iter().any(|&r| r) {
            log::debug!("text view torn down");
        }
    }

    // ========================================================================
    // Native → core
    // ========================================================================

    /// The user replaced `removed` units at `position` with `inserted`.
    ///
    /// The mirror selection follows the edit. When that moves it, the core
    /// hears the new selection right after the edit, so a later native
    /// selection notice that lands on the same range is not lost.
    pub fn native_edited(&self, position: usize, removed: usize, inserted: &str) {
        if self.inner.flag.is_applying() {
            log::debug!("edit echo swallowed at {}", position);
            return;
        }

        let (range, before) = {
            let mut document = self.inner.document.borrow_mut();
            let unit = self.unit();
            let start = unit_to_byte(document.content(), position, unit);
            let end = unit_to_byte(document.content(), position.saturating_add(removed), unit);
            let before = document.selection();
            document.replace(start..end, inserted);
            (start..end, before)
        };

        self.inner
            .sink
            .invoke(|sink| sink.replace_range(range.start, range.len(), inserted));

        let after = self.inner.document.borrow().selection();
        if after != before {
            self.inner
                .sink
                .invoke(|sink| sink.set_selection(after.start, after.len()));
        }
    }

    /// The native selection moved to `[start, end)` in widget units.
    pub fn native_selection_changed(&self, start: usize, end: usize) {
        if self.inner.flag.is_applying() {
            log::debug!("selection echo swallowed");
            return;
        }

        let changed = {
            let mut document = self.inner.document.borrow_mut();
            let range = unit_range_to_byte(document.content(), start..end, self.unit());
            document
                .set_selection(range.start, range.end)
                .then(|| document.selection())
        };

        if let Some(range) = changed {
            self.inner
                .sink
                .invoke(|sink| sink.set_selection(range.start, range.len()));
        }
    }

    pub fn native_focus_changed(&self, focused: bool) {
        if self.inner.flag.is_applying() {
            log::debug!("focus echo swallowed");
            let mut tracker = self.inner.focus.get();
            tracker.sync_silently(focused);
            self.inner.focus.set(tracker);
            return;
        }

        let mut tracker = self.inner.focus.get();
        let token = if focused { tracker.gained() } else { tracker.lost() };
        self.inner.focus.set(tracker);

        if let Some(token) = token {
            self.emit_token(token);
        }
    }

    /// Offer a navigation key to the core before native handling.
    pub fn native_key(&self, code: KeyCode) -> KeyDisposition {
        let handled = self
            .inner
            .key_callback
            .invoke(|callback| callback(code))
            .unwrap_or(false);
        if handled {
            return KeyDisposition::Handled;
        }

        match code {
            KeyCode::Escape => {
                self.release_focus();
                KeyDisposition::FocusReleased
            }
            KeyCode::Tab | KeyCode::Untab => {
                let tracker = self.inner.focus.get();
                let next = code
                    .page_step()
                    .and_then(|step| tracker.step(step))
                    .filter(|_| tracker.is_focused());
                match next {
                    Some(page) => {
                        self.release_focus();
                        self.emit_token(Some(page));
                        KeyDisposition::FocusMoved(page)
                    }
                    None => KeyDisposition::NativeDefault,
                }
            }
            _ => KeyDisposition::NativeDefault,
        }
    }

    // ========================================================================
    // Helpers
    // ========================================================================

    fn unit(&self) -> PositionUnit {
        self.inner.widget.unit()
    }

    fn require_bound(&self, op: &str) -> bool {
        if self.inner.bound.get() {
            return true;
        }
        log::debug!("{} ignored: text view is detached", op);
        false
    }

    /// Unguarded: the widget's focus-out signal reports the loss. Toolkits
    /// that defer that signal are covered by reporting it here.
    fn release_focus(&self) {
        self.inner.widget.unfocus();
        if self.inner.focus.get().is_focused() {
            self.native_focus_changed(false);
        }
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

    fn resync_selection(&self) {
        let native = self.inner.widget.selection();
        let mut document = self.inner.document.borrow_mut();
        let range = unit_range_to_byte(document.content(), native, self.unit());
        document.set_selection(range.start, range.end);
    }
}

impl<W: NativeTextView> fmt::Debug for TextView<W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TextView")
            .field("state", &self.sync_state())
            .field("len", &self.inner.document.try_borrow().map(|d| d.len()).ok())
            .field("focus", &self.inner.focus.get())
            .finish_non_exhaustive()
    }
}
