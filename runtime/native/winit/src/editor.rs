//! Editable text for the winit backend.
//!
//! winit has no text widget, so [`EditorView`] keeps the text model itself
//! and lays it out with cosmic-text. Positions are UTF-8 byte offsets. Like a
//! toolkit widget it reports every change to its owning
//! [`TextView`](weft_native_core::TextView) synchronously, whoever caused it;
//! echo suppression is the sync engine's job.

use crate::clipboard::Clipboard;
use crate::focus::{FocusRing, Holder};
use crate::fonts::{self, styled, CosmicFont, FONT_SYSTEM};
use cosmic_text::{Align, AttrsList, Buffer, Shaping};
use std::cell::RefCell;
use std::ops::Range;
use std::rc::Rc;
use weft_native_core::text::attributes::RunMap;
use weft_native_core::text::offsets::{clamp_range, next_char_boundary, prev_char_boundary};
use weft_native_core::{
    classify, CharAttributes, Justification, LineAttributes, Modifiers, NativeTextView, NavKey,
    PositionUnit, TextView, WeakTextView,
};

/// Default editing behavior for a key the core did not take.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditAction {
    Insert(String),
    Backspace,
    Delete,
    Move { key: NavKey, extend: bool },
    SelectAll,
    Copy,
    Cut,
    Paste,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditorKey {
    /// Offered to the core first.
    Nav(NavKey),
    Action(EditAction),
}

struct EditorState {
    text: String,
    anchor: usize,
    head: usize,
    editable: bool,
    focused: bool,
    chars: RunMap<CharAttributes>,
    lines: RunMap<LineAttributes>,
    font: CosmicFont,
    width: f32,
}

impl EditorState {
    fn selection(&self) -> Range<usize> {
        self.anchor.min(self.head)..self.anchor.max(self.head)
    }

    fn splice(&mut self, range: Range<usize>, text: &str) {
        let removed = range.len();
        self.text.replace_range(range.clone(), text);
        self.chars.splice(range.start, removed, text.len());
        self.lines.splice(range.start, removed, text.len());

        let map = |p: usize| -> usize {
            if p <= range.start {
                p
            } else if p >= range.end {
                p - removed + text.len()
            } else {
                range.start + text.len()
            }
        };
        self.anchor = map(self.anchor);
        self.head = map(self.head);
    }
}

pub struct EditorView {
    state: RefCell<EditorState>,
    owner: RefCell<Option<WeakTextView<EditorView>>>,
    clipboard: Rc<RefCell<Clipboard>>,
    ring: FocusRing,
}

impl EditorView {
    pub fn new(font: CosmicFont, clipboard: Rc<RefCell<Clipboard>>, ring: FocusRing) -> Self {
        Self {
            state: RefCell::new(EditorState {
                text: String::new(),
                anchor: 0,
                head: 0,
                editable: false,
                focused: false,
                chars: RunMap::new(0, CharAttributes::default()),
                lines: RunMap::new(0, LineAttributes::default()),
                font,
                width: f32::MAX,
            }),
            owner: RefCell::new(None),
            clipboard,
            ring,
        }
    }

    /// Build a sync engine over a new editor and route its notifications
    /// back to it.
    pub fn text_view(
        font: CosmicFont,
        clipboard: Rc<RefCell<Clipboard>>,
        ring: FocusRing,
    ) -> TextView<EditorView> {
        let view = TextView::new(EditorView::new(font, clipboard, ring));
        *view.widget().owner.borrow_mut() = Some(view.downgrade());
        view
    }

    pub fn content(&self) -> String {
        self.state.borrow().text.clone()
    }

    pub fn is_editable(&self) -> bool {
        self.state.borrow().editable
    }

    pub fn font(&self) -> CosmicFont {
        self.state.borrow().font.clone()
    }

    /// Wrap width in logical pixels, set by whoever lays the editor out.
    pub fn set_width(&self, width: f32) {
        self.state.borrow_mut().width = width.max(1.0);
    }

    pub fn char_attributes_at(&self, index: usize) -> CharAttributes {
        *self.state.borrow().chars.at(index)
    }

    pub fn line_attributes_at(&self, index: usize) -> LineAttributes {
        *self.state.borrow().lines.at(index)
    }

    fn owner(&self) -> Option<TextView<EditorView>> {
        self.owner.borrow().as_ref().and_then(WeakTextView::upgrade)
    }

    // =========================================================================
    // Mutation + notification
    // =========================================================================

    fn edit(&self, range: Range<usize>, text: &str, caret_after: bool) {
        let (start, removed, selection_moved) = {
            let mut state = self.state.borrow_mut();
            let (range, adjusted) = clamp_range(&state.text, range.start, range.end);
            if adjusted {
                log::warn!("editor edit clamped to {:?}", range);
            }
            let before = state.selection();
            state.splice(range.clone(), text);
            if caret_after {
                let caret = range.start + text.len();
                state.anchor = caret;
                state.head = caret;
            }
            (range.start, range.len(), state.selection() != before)
        };

        if let Some(owner) = self.owner() {
            owner.native_edited(start, removed, text);
            if selection_moved {
                let selection = self.selection();
                owner.native_selection_changed(selection.start, selection.end);
            }
        }
    }

    fn select(&self, anchor: usize, head: usize) {
        let changed = {
            let mut state = self.state.borrow_mut();
            let before = (state.anchor, state.head);
            let len = state.text.len();
            state.anchor = anchor.min(len);
            state.head = head.min(len);
            before != (state.anchor, state.head)
        };
        if changed {
            if let Some(owner) = self.owner() {
                let selection = self.selection();
                owner.native_selection_changed(selection.start, selection.end);
            }
        }
    }

    pub(crate) fn set_focused(&self, focused: bool) {
        let changed = std::mem::replace(&mut self.state.borrow_mut().focused, focused) != focused;
        if changed {
            if let Some(owner) = self.owner() {
                owner.native_focus_changed(focused);
            }
        }
    }

    // =========================================================================
    // User editing
    // =========================================================================

    /// Run a user action against the editor.
    pub fn apply(&self, action: EditAction) {
        let (selection, head, editable) = {
            let state = self.state.borrow();
            (state.selection(), state.head, state.editable)
        };

        match action {
            EditAction::Insert(text) => {
                if editable {
                    self.edit(selection, &text, true);
                } else {
                    log::debug!("insert ignored: editor is read-only");
                }
            }
            EditAction::Backspace | EditAction::Delete if !editable => {
                log::debug!("delete ignored: editor is read-only");
            }
            EditAction::Backspace => {
                let range = if selection.is_empty() {
                    prev_char_boundary(&self.content(), head)..head
                } else {
                    selection
                };
                if !range.is_empty() {
                    self.edit(range, "", true);
                }
            }
            EditAction::Delete => {
                let range = if selection.is_empty() {
                    head..next_char_boundary(&self.content(), head)
                } else {
                    selection
                };
                if !range.is_empty() {
                    self.edit(range, "", true);
                }
            }
            EditAction::Move { key, extend } => self.move_caret(key, extend),
            EditAction::SelectAll => self.select_all(),
            EditAction::Copy => self.copy(),
            EditAction::Cut => self.cut(),
            EditAction::Paste => self.paste(),
        }
    }

    /// Native handling of a navigation key the core left alone.
    pub fn apply_default(&self, key: NavKey, modifiers: Modifiers) {
        let extend = modifiers.contains(Modifiers::SHIFT);
        match key {
            NavKey::Tab => self.apply(EditAction::Insert("\t".to_string())),
            NavKey::Return => self.apply(EditAction::Insert("\n".to_string())),
            NavKey::Escape => {}
            NavKey::Left | NavKey::Right | NavKey::Up | NavKey::Down => {
                self.apply(EditAction::Move { key, extend })
            }
        }
    }

    fn move_caret(&self, key: NavKey, extend: bool) {
        let (anchor, head) = {
            let state = self.state.borrow();
            let selection = state.selection();
            let text = state.text.as_str();
            let head = match key {
                NavKey::Left if !extend && !selection.is_empty() => selection.start,
                NavKey::Right if !extend && !selection.is_empty() => selection.end,
                NavKey::Left => prev_char_boundary(text, state.head),
                NavKey::Right => next_char_boundary(text, state.head),
                NavKey::Up => vertical(text, state.head, false),
                NavKey::Down => vertical(text, state.head, true),
                _ => state.head,
            };
            (if extend { state.anchor } else { head }, head)
        };
        self.select(anchor, head);
    }

    // =========================================================================
    // Layout
    // =========================================================================

    fn shape<R>(&self, f: impl FnOnce(&Buffer, &EditorState) -> R) -> R {
        let state = self.state.borrow();
        let base = state.font.attrs();
        let mut font_system = FONT_SYSTEM.lock();
        let mut buffer = Buffer::new(&mut font_system, state.font.metrics());
        buffer.set_size(&mut font_system, Some(state.width), None);
        buffer.set_text(&mut font_system, &state.text, base, Shaping::Advanced);

        let mut line_start = 0;
        for (index, line_text) in state.text.split('\n').enumerate() {
            let line_end = line_start + line_text.len();
            if let Some(line) = buffer.lines.get_mut(index) {
                let mut list = AttrsList::new(base);
                for run in state.chars.runs() {
                    let start = run.range.start.max(line_start);
                    let end = run.range.end.min(line_end);
                    if start < end && run.value != CharAttributes::default() {
                        list.add_span(start - line_start..end - line_start, styled(base, &run.value));
                    }
                }
                line.set_attrs_list(list);
                line.set_align(Some(align(state.lines.at(line_start).justification)));
            }
            line_start = line_end + 1;
        }

        buffer.shape_until_scroll(&mut font_system, false);
        f(&buffer, &state)
    }
}

fn align(justification: Justification) -> Align {
    match justification {
        Justification::Left => Align::Left,
        Justification::Center => Align::Center,
        Justification::Right => Align::Right,
    }
}

/// Caret one line up or down, keeping the column in characters.
fn vertical(text: &str, head: usize, down: bool) -> usize {
    let line_start = text[..head].rfind('\n').map_or(0, |i| i + 1);
    let column = text[line_start..head].chars().count();

    let (start, end) = if down {
        let Some(newline) = text[head..].find('\n') else {
            return text.len();
        };
        let start = head + newline + 1;
        let end = text[start..].find('\n').map_or(text.len(), |i| start + i);
        (start, end)
    } else {
        if line_start == 0 {
            return 0;
        }
        let end = line_start - 1;
        let start = text[..end].rfind('\n').map_or(0, |i| i + 1);
        (start, end)
    };

    text[start..end]
        .char_indices()
        .nth(column)
        .map_or(end, |(i, _)| start + i)
}

/// Logical line index of `byte` and its offset within that line.
fn line_position(text: &str, byte: usize) -> (usize, usize) {
    let before = &text[..byte];
    let line = before.matches('\n').count();
    let start = before.rfind('\n').map_or(0, |i| i + 1);
    (line, byte - start)
}

impl NativeTextView for EditorView {
    type Font = CosmicFont;

    fn unit(&self) -> PositionUnit {
        PositionUnit::Utf8
    }

    fn set_content(&self, text: &str) {
        let removed = {
            let mut state = self.state.borrow_mut();
            let removed = state.text.len();
            state.text = text.to_string();
            state.anchor = 0;
            state.head = 0;
            state.chars.reset(text.len());
            state.lines.reset(text.len());
            removed
        };
        if let Some(owner) = self.owner() {
            owner.native_edited(0, removed, text);
        }
    }

    fn replace(&self, range: Range<usize>, text: &str) {
        self.edit(range, text, false);
    }

    fn set_selection(&self, range: Range<usize>) {
        self.select(range.start, range.end);
    }

    fn selection(&self) -> Range<usize> {
        self.state.borrow().selection()
    }

    fn set_char_attributes(&self, range: Range<usize>, attributes: &CharAttributes) {
        self.state.borrow_mut().chars.set(range, *attributes);
    }

    fn set_line_attributes(&self, range: Range<usize>, attributes: &LineAttributes) {
        let mut state = self.state.borrow_mut();
        // Include the newline so an empty line still owns a position.
        let end = next_char_boundary(&state.text, range.end);
        state.lines.set(range.start..end, *attributes);
    }

    fn set_editable(&self, editable: bool) {
        self.state.borrow_mut().editable = editable;
    }

    fn set_font(&self, font: &CosmicFont) {
        self.state.borrow_mut().font = font.clone();
    }

    fn focus(&self) {
        let me = self.owner.borrow().clone();
        if let Some(me) = me {
            self.ring.claim(Holder::Editor(me));
        }
        self.set_focused(true);
    }

    fn unfocus(&self) {
        self.ring.release(self as *const EditorView as usize);
        self.set_focused(false);
    }

    fn has_focus(&self) -> bool {
        self.state.borrow().focused
    }

    fn copy(&self) {
        let selected = {
            let state = self.state.borrow();
            state.text[state.selection()].to_string()
        };
        if !selected.is_empty() {
            self.clipboard.borrow_mut().set_text(&selected);
        }
    }

    fn cut(&self) {
        let (selection, editable) = {
            let state = self.state.borrow();
            (state.selection(), state.editable)
        };
        if selection.is_empty() {
            return;
        }
        self.copy();
        if editable {
            self.edit(selection, "", true);
        }
    }

    fn paste(&self) {
        if !self.is_editable() {
            log::debug!("paste ignored: editor is read-only");
            return;
        }
        let text = self.clipboard.borrow_mut().text();
        if let Some(text) = text {
            let selection = self.selection();
            self.edit(selection, &text, true);
        }
    }

    fn select_all(&self) {
        let len = self.state.borrow().text.len();
        self.select(0, len);
    }

    fn line_height(&self, range: Range<usize>, width: f64) -> f64 {
        let (font, text) = {
            let state = self.state.borrow();
            let (range, _) = clamp_range(&state.text, range.start, range.end);
            (state.font.clone(), state.text[range].to_string())
        };
        f64::from(fonts::measure_height(&font, &text, width as f32))
    }

    fn cursor_position(&self) -> (f64, f64) {
        let (x, y) = self.shape(|buffer, state| {
            let (line, column) = line_position(&state.text, state.head);
            let line_height = state.font.metrics().line_height;
            let mut position = (0.0, line as f32 * line_height);
            for (visual, run) in buffer.layout_runs().enumerate() {
                if run.line_i != line {
                    continue;
                }
                let y = visual as f32 * line_height;
                if let Some(glyph) = run.glyphs.iter().find(|g| g.start <= column && column < g.end) {
                    return (glyph.x, y);
                }
                position = match run.glyphs.last() {
                    Some(last) if column >= last.end => (last.x + last.w, y),
                    Some(_) => position,
                    None => (0.0, y),
                };
            }
            position
        });
        (f64::from(x), f64::from(y))
    }
}

/// Route a pressed key to a focused editor: navigation keys go through the
/// core's key dispatch first, everything else edits directly.
pub fn handle_key(view: &TextView<EditorView>, key: EditorKey, modifiers: Modifiers) {
    match key {
        EditorKey::Nav(nav) => {
            let disposition = view.native_key(classify(nav, modifiers));
            if !disposition.suppresses_default() {
                view.widget().apply_default(nav, modifiers);
            }
        }
        EditorKey::Action(action) => view.widget().apply(action),
    }
}
