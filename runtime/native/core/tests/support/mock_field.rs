use super::mock_view::{GLYPH_WIDTH, LINE_HEIGHT};
use std::cell::{Cell, RefCell};
use std::ops::Range;
use weft_native_core::{
    FieldOptions, NativeLabel, NativeTextField, TextField, TextStyle, WeakTextField,
};

#[derive(Default)]
struct FieldState {
    text: String,
    /// Byte range.
    selection: Range<usize>,
    focused: bool,
    options: Option<FieldOptions>,
    style: Option<TextStyle>,
    font: Option<String>,
    clipboard: Option<String>,
    text_writes: usize,
}

/// In-memory entry that fires its change signals synchronously, like
/// [`MockTextView`](super::mock_view::MockTextView).
#[derive(Default)]
pub struct MockTextField {
    state: RefCell<FieldState>,
    owner: RefCell<Option<WeakTextField<MockTextField>>>,
}

impl MockTextField {
    pub fn text_field(options: FieldOptions) -> TextField<MockTextField> {
        let field = TextField::new(MockTextField::default(), options);
        *field.widget().owner.borrow_mut() = Some(field.downgrade());
        field
    }

    pub fn options(&self) -> Option<FieldOptions> {
        self.state.borrow().options
    }

    pub fn style(&self) -> Option<TextStyle> {
        self.state.borrow().style
    }

    pub fn font(&self) -> Option<String> {
        self.state.borrow().font.clone()
    }

    pub fn clipboard(&self) -> Option<String> {
        self.state.borrow().clipboard.clone()
    }

    /// How many times the core wrote the text.
    pub fn text_writes(&self) -> usize {
        self.state.borrow().text_writes
    }

    /// What the user sees.
    pub fn displayed(&self) -> String {
        let state = self.state.borrow();
        if state.options.is_some_and(|options| options.secure) {
            "•".repeat(state.text.chars().count())
        } else {
            state.text.clone()
        }
    }

    // ------------------------------------------------------------------
    // User actions
    // ------------------------------------------------------------------

    pub fn type_text(&self, text: &str) {
        let range = self.state.borrow().selection.clone();
        self.splice(range, text);
    }

    pub fn backspace(&self) {
        let range = {
            let state = self.state.borrow();
            if state.selection.is_empty() {
                let head = state.selection.start;
                let previous = state.text[..head]
                    .char_indices()
                    .last()
                    .map_or(head, |(at, _)| at);
                previous..head
            } else {
                state.selection.clone()
            }
        };
        if !range.is_empty() {
            self.splice(range, "");
        }
    }

    pub fn press_return(&self) {
        if let Some(field) = self.owner() {
            field.native_submit();
        }
    }

    pub fn user_focus(&self) {
        self.set_focused(true);
    }

    pub fn user_blur(&self) {
        self.set_focused(false);
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    fn owner(&self) -> Option<TextField<MockTextField>> {
        self.owner.borrow().as_ref().and_then(WeakTextField::upgrade)
    }

    fn splice(&self, range: Range<usize>, text: &str) {
        {
            let mut state = self.state.borrow_mut();
            state.text.replace_range(range.clone(), text);
            let caret = range.start + text.len();
            state.selection = caret..caret;
        }
        self.emit_changed();
    }

    fn emit_changed(&self) {
        let text = self.state.borrow().text.clone();
        if let Some(field) = self.owner() {
            field.native_text_changed(&text);
        }
    }

    fn set_focused(&self, focused: bool) {
        let changed = std::mem::replace(&mut self.state.borrow_mut().focused, focused) != focused;
        if changed {
            if let Some(field) = self.owner() {
                field.native_focus_changed(focused);
            }
        }
    }
}

impl NativeTextField for MockTextField {
    type Font = String;

    fn configure(&self, options: FieldOptions) {
        self.state.borrow_mut().options = Some(options);
    }

    fn set_text(&self, text: &str) {
        {
            let mut state = self.state.borrow_mut();
            state.text = text.to_owned();
            state.selection = text.len()..text.len();
            state.text_writes += 1;
        }
        self.emit_changed();
    }

    fn text(&self) -> String {
        self.state.borrow().text.clone()
    }

    fn set_style(&self, style: &TextStyle) {
        self.state.borrow_mut().style = Some(*style);
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
        if state.options.is_some_and(|options| options.secure) {
            return;
        }
        let selected = state.text[state.selection.clone()].to_owned();
        state.clipboard = Some(selected);
    }

    fn cut(&self) {
        let range = self.state.borrow().selection.clone();
        if range.is_empty() {
            return;
        }
        self.copy();
        self.splice(range, "");
    }

    fn paste(&self) {
        let Some(text) = self.clipboard() else {
            return;
        };
        self.type_text(&text);
    }

    fn select_all(&self) {
        let mut state = self.state.borrow_mut();
        state.selection = 0..state.text.len();
    }

    fn measure(&self, max_width: f64, max_height: f64) -> (f64, f64) {
        let state = self.state.borrow();
        let glyphs = state.text.chars().count().max(1) as f64;
        let width = (glyphs * GLYPH_WIDTH).min(max_width);
        (width, LINE_HEIGHT.min(max_height))
    }
}

#[derive(Default)]
struct LabelState {
    text: String,
    style: TextStyle,
    font: Option<String>,
    writes: usize,
}

/// Label measured on a fixed glyph grid, wrapping at the width bound.
#[derive(Default)]
pub struct MockLabel {
    state: RefCell<LabelState>,
    measures: Cell<usize>,
}

impl MockLabel {
    pub fn text(&self) -> String {
        self.state.borrow().text.clone()
    }

    pub fn style(&self) -> TextStyle {
        self.state.borrow().style
    }

    pub fn font(&self) -> Option<String> {
        self.state.borrow().font.clone()
    }

    /// Text and style writes from the core.
    pub fn writes(&self) -> usize {
        self.state.borrow().writes
    }

    pub fn measures(&self) -> usize {
        self.measures.get()
    }
}

impl NativeLabel for MockLabel {
    type Font = String;

    fn set_text(&self, text: &str) {
        let mut state = self.state.borrow_mut();
        state.text = text.to_owned();
        state.writes += 1;
    }

    fn set_style(&self, style: &TextStyle) {
        let mut state = self.state.borrow_mut();
        state.style = *style;
        state.writes += 1;
    }

    fn set_font(&self, font: &String) {
        self.state.borrow_mut().font = Some(font.clone());
    }

    fn measure(&self, max_width: f64, _max_height: f64) -> (f64, f64) {
        self.measures.set(self.measures.get() + 1);
        let state = self.state.borrow();
        let per_line = if max_width.is_finite() {
            ((max_width / GLYPH_WIDTH).floor() as usize).max(1)
        } else {
            usize::MAX
        };

        let mut lines = 0usize;
        let mut widest = 0usize;
        for line in state.text.split('\n') {
            let glyphs = line.chars().count();
            let wrapped = glyphs.div_ceil(per_line).max(1);
            lines += wrapped;
            widest = widest.max(glyphs.min(per_line));
        }
        if state.style.max_lines > 0 {
            lines = lines.min(state.style.max_lines as usize);
        }
        (widest as f64 * GLYPH_WIDTH, lines as f64 * LINE_HEIGHT)
    }
}
