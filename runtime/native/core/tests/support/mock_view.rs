use std::cell::{Cell, RefCell};
use std::ops::Range;
use weft_native_core::text::offsets::{
    byte_range_to_unit, byte_to_unit, unit_len, unit_range_to_byte,
};
use weft_native_core::{
    classify, CharAttributes, KeyDisposition, LineAttributes, Modifiers, NativeTextView, NavKey,
    PositionUnit, TextView, WeakTextView,
};

pub const LINE_HEIGHT: f64 = 10.0;
pub const GLYPH_WIDTH: f64 = 7.0;

#[derive(Default)]
struct MockState {
    content: String,
    /// Byte range.
    selection: Range<usize>,
    focused: bool,
    editable: bool,
    font: Option<String>,
    clipboard: Option<String>,
    char_calls: Vec<(Range<usize>, CharAttributes)>,
    line_calls: Vec<(Range<usize>, LineAttributes)>,
    native_defaults: Vec<NavKey>,
}

/// In-memory widget that fires change notifications the way a toolkit does:
/// synchronously, from inside the mutating call, whoever caused it.
pub struct MockTextView {
    unit: PositionUnit,
    state: RefCell<MockState>,
    owner: RefCell<Option<WeakTextView<MockTextView>>>,
    echoes: Cell<usize>,
    forwarded: Cell<usize>,
}

impl MockTextView {
    pub fn new(unit: PositionUnit) -> Self {
        Self {
            unit,
            state: RefCell::new(MockState { editable: true, ..MockState::default() }),
            owner: RefCell::new(None),
            echoes: Cell::new(0),
            forwarded: Cell::new(0),
        }
    }

    /// Build a text view over a mock and wire its notifications back.
    pub fn text_view(unit: PositionUnit) -> TextView<MockTextView> {
        let view = TextView::new(MockTextView::new(unit));
        *view.widget().owner.borrow_mut() = Some(view.downgrade());
        view
    }

    pub fn content(&self) -> String {
        self.state.borrow().content.clone()
    }

    pub fn byte_selection(&self) -> Range<usize> {
        self.state.borrow().selection.clone()
    }

    pub fn is_editable(&self) -> bool {
        self.state.borrow().editable
    }

    pub fn font(&self) -> Option<String> {
        self.state.borrow().font.clone()
    }

    pub fn char_calls(&self) -> Vec<(Range<usize>, CharAttributes)> {
        self.state.borrow().char_calls.clone()
    }

    pub fn line_calls(&self) -> Vec<(Range<usize>, LineAttributes)> {
        self.state.borrow().line_calls.clone()
    }

    pub fn native_defaults(&self) -> Vec<NavKey> {
        self.state.borrow().native_defaults.clone()
    }

    /// Notifications fired while the owner was applying a core setter.
    pub fn echoes(&self) -> usize {
        self.echoes.get()
    }

    /// Notifications fired outside any core setter.
    pub fn forwarded(&self) -> usize {
        self.forwarded.get()
    }

    // ------------------------------------------------------------------
    // User actions
    // ------------------------------------------------------------------

    /// Type `text` over the current selection.
    pub fn type_text(&self, text: &str) {
        let range = self.byte_selection();
        self.splice_bytes(range, text);
    }

    /// Replace a range given in native units, as an input method would.
    pub fn user_replace(&self, native: Range<usize>, text: &str) {
        let range = {
            let state = self.state.borrow();
            unit_range_to_byte(&state.content, native, self.unit)
        };
        self.splice_bytes(range, text);
    }

    pub fn user_select_bytes(&self, start: usize, end: usize) {
        self.state.borrow_mut().selection = start..end;
        self.emit_selection();
    }

    pub fn user_focus(&self) {
        self.set_focused(true);
    }

    pub fn user_blur(&self) {
        self.set_focused(false);
    }

    /// Press a navigation key while the widget has focus.
    pub fn press(&self, key: NavKey, modifiers: Modifiers) -> KeyDisposition {
        let code = classify(key, modifiers);
        let disposition = match self.owner() {
            Some(view) => view.native_key(code),
            None => KeyDisposition::NativeDefault,
        };
        if !disposition.suppresses_default() {
            self.state.borrow_mut().native_defaults.push(key);
        }
        disposition
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    fn owner(&self) -> Option<TextView<MockTextView>> {
        self.owner.borrow().as_ref().and_then(|weak| weak.upgrade())
    }

    fn note(&self, view: &TextView<MockTextView>) {
        if view.is_applying_external() {
            self.echoes.set(self.echoes.get() + 1);
        } else {
            self.forwarded.set(self.forwarded.get() + 1);
        }
    }

    fn splice_bytes(&self, range: Range<usize>, text: &str) {
        let (native_start, native_removed) = {
            let mut state = self.state.borrow_mut();
            let native = byte_range_to_unit(&state.content, range.clone(), self.unit);
            state.content.replace_range(range.clone(), text);
            let caret = range.start + text.len();
            state.selection = caret..caret;
            (native.start, native.end - native.start)
        };
        if let Some(view) = self.owner() {
            self.note(&view);
            view.native_edited(native_start, native_removed, text);
        }
        self.emit_selection();
    }

    fn emit_selection(&self) {
        let native = {
            let state = self.state.borrow();
            byte_range_to_unit(&state.content, state.selection.clone(), self.unit)
        };
        if let Some(view) = self.owner() {
            self.note(&view);
            view.native_selection_changed(native.start, native.end);
        }
    }

    fn set_focused(&self, focused: bool) {
        let changed = {
            let mut state = self.state.borrow_mut();
            std::mem::replace(&mut state.focused, focused) != focused
        };
        if changed {
            if let Some(view) = self.owner() {
                self.note(&view);
                view.native_focus_changed(focused);
            }
        }
    }
}

impl NativeTextView for MockTextView {
    type Font = String;

    fn unit(&self) -> PositionUnit {
        self.unit
    }

    fn set_content(&self, text: &str) {
        let removed = {
            let mut state = self.state.borrow_mut();
            let removed = unit_len(&state.content, self.unit);
            state.content = text.to_owned();
            state.selection = 0..0;
            state.char_calls.clear();
            state.line_calls.clear();
            removed
        };
        if let Some(view) = self.owner() {
            self.note(&view);
            view.native_edited(0, removed, text);
        }
        self.emit_selection();
    }

    fn replace(&self, range: Range<usize>, text: &str) {
        let range = {
            let state = self.state.borrow();
            unit_range_to_byte(&state.content, range, self.unit)
        };
        self.splice_bytes(range, text);
    }

    fn set_selection(&self, range: Range<usize>) {
        let bytes = {
            let state = self.state.borrow();
            unit_range_to_byte(&state.content, range, self.unit)
        };
        self.user_select_bytes(bytes.start, bytes.end);
    }

    fn selection(&self) -> Range<usize> {
        let state = self.state.borrow();
        byte_range_to_unit(&state.content, state.selection.clone(), self.unit)
    }

    fn set_char_attributes(&self, range: Range<usize>, attributes: &CharAttributes) {
        self.state.borrow_mut().char_calls.push((range, *attributes));
    }

    fn set_line_attributes(&self, range: Range<usize>, attributes: &LineAttributes) {
        self.state.borrow_mut().line_calls.push((range, *attributes));
    }

    fn set_editable(&self, editable: bool) {
        self.state.borrow_mut().editable = editable;
    }

    fn set_font(&self, font: &String) {
        self.state.borrow_mut().font = Some(font.clone());
    }

    fn focus(&self) {
        self.set_focused(true);
    }

    fn unfocus(&self) {
        self.set_focused(false);
    }

    fn has_focus(&self) -> bool {
        self.state.borrow().focused
    }

    fn copy(&self) {
        let mut state = self.state.borrow_mut();
        let selected = state.content[state.selection.clone()].to_owned();
        state.clipboard = Some(selected);
    }

    fn cut(&self) {
        self.copy();
        let range = self.byte_selection();
        if !range.is_empty() {
            self.splice_bytes(range, "");
        }
    }

    fn paste(&self) {
        let clip = self.state.borrow().clipboard.clone();
        if let Some(text) = clip {
            self.type_text(&text);
        }
    }

    fn select_all(&self) {
        let len = self.state.borrow().content.len();
        self.user_select_bytes(0, len);
    }

    fn line_height(&self, range: Range<usize>, _width: f64) -> f64 {
        let state = self.state.borrow();
        let bytes = unit_range_to_byte(&state.content, range, self.unit);
        let lines = state.content[bytes].matches('\n').count() + 1;
        lines as f64 * LINE_HEIGHT
    }

    fn cursor_position(&self) -> (f64, f64) {
        let state = self.state.borrow();
        let caret = state.selection.end;
        let line_start = state.content[..caret].rfind('\n').map(|i| i + 1).unwrap_or(0);
        let column = byte_to_unit(&state.content[line_start..], caret - line_start, PositionUnit::Scalar);
        let line = state.content[..caret].matches('\n').count();
        (column as f64 * GLYPH_WIDTH, line as f64 * LINE_HEIGHT)
    }
}
