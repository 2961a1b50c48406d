//! Single-line text fields for the winit backend.
//!
//! [`FieldView`] keeps its own one-line text model, like
//! [`EditorView`](crate::editor::EditorView), and reports every change of text
//! or focus to its owning [`TextField`] as it happens. Newlines never enter
//! the text; Return submits instead.

use crate::clipboard::Clipboard;
use crate::editor::{EditAction, EditorKey};
use crate::focus::{FocusRing, Holder};
use crate::fonts::{self, CosmicFont};
use std::cell::RefCell;
use std::ops::Range;
use std::rc::Rc;
use weft_native_core::text::offsets::{clamp_range, next_char_boundary, prev_char_boundary};
use weft_native_core::{
    FieldOptions, Modifiers, NativeTextField, NavKey, TextField, TextStyle, WeakTextField,
};

/// Shown in place of each character of a secure field.
const MASK: char = '•';

struct FieldState {
    text: String,
    anchor: usize,
    head: usize,
    focused: bool,
    options: FieldOptions,
    style: TextStyle,
    font: CosmicFont,
}

impl FieldState {
    fn selection(&self) -> Range<usize> {
        self.anchor.min(self.head)..self.anchor.max(self.head)
    }
}

pub struct FieldView {
    state: RefCell<FieldState>,
    owner: RefCell<Option<WeakTextField<FieldView>>>,
    clipboard: Rc<RefCell<Clipboard>>,
    ring: FocusRing,
}

impl FieldView {
    pub fn new(font: CosmicFont, clipboard: Rc<RefCell<Clipboard>>, ring: FocusRing) -> Self {
        Self {
            state: RefCell::new(FieldState {
                text: String::new(),
                anchor: 0,
                head: 0,
                focused: false,
                options: FieldOptions::default(),
                style: TextStyle::default(),
                font,
            }),
            owner: RefCell::new(None),
            clipboard,
            ring,
        }
    }

    /// Build a field over a new entry and route its notifications back to
    /// it.
    pub fn text_field(
        font: CosmicFont,
        clipboard: Rc<RefCell<Clipboard>>,
        ring: FocusRing,
        options: FieldOptions,
    ) -> TextField<FieldView> {
        let field = TextField::new(FieldView::new(font, clipboard, ring), options);
        *field.widget().owner.borrow_mut() = Some(field.downgrade());
        field
    }

    pub fn options(&self) -> FieldOptions {
        self.state.borrow().options
    }

    pub fn style(&self) -> TextStyle {
        self.state.borrow().style
    }

    pub fn font(&self) -> CosmicFont {
        self.state.borrow().font.clone()
    }

    pub fn selection(&self) -> Range<usize> {
        self.state.borrow().selection()
    }

    /// What gets drawn: the text, or one mask per character when secure.
    pub fn displayed(&self) -> String {
        let state = self.state.borrow();
        if state.options.secure {
            std::iter::repeat(MASK).take(state.text.chars().count()).collect()
        } else {
            state.text.clone()
        }
    }

    fn owner(&self) -> Option<TextField<FieldView>> {
        self.owner.borrow().as_ref().and_then(WeakTextField::upgrade)
    }

    fn is_secure(&self) -> bool {
        self.state.borrow().options.secure
    }

    // =========================================================================
    // Mutation + notification
    // =========================================================================

    fn edit(&self, range: Range<usize>, text: &str) {
        let text = single_line(text);
        let changed = {
            let mut state = self.state.borrow_mut();
            let (range, adjusted) = clamp_range(&state.text, range.start, range.end);
            if adjusted {
                log::warn!("field edit clamped to {:?}", range);
            }
            if range.is_empty() && text.is_empty() {
                false
            } else {
                state.text.replace_range(range.clone(), &text);
                let caret = range.start + text.len();
                state.anchor = caret;
                state.head = caret;
                true
            }
        };
        if changed {
            self.emit_changed();
        }
    }

    fn emit_changed(&self) {
        let text = self.state.borrow().text.clone();
        if let Some(owner) = self.owner() {
            owner.native_text_changed(&text);
        }
    }

    fn select(&self, anchor: usize, head: usize) {
        let mut state = self.state.borrow_mut();
        let len = state.text.len();
        state.anchor = anchor.min(len);
        state.head = head.min(len);
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

    /// Run a user action against the field.
    pub fn apply(&self, action: EditAction) {
        let (selection, head) = {
            let state = self.state.borrow();
            (state.selection(), state.head)
        };

        match action {
            EditAction::Insert(text) => self.edit(selection, &text),
            EditAction::Backspace => {
                let range = if selection.is_empty() {
                    prev_char_boundary(&self.text(), head)..head
                } else {
                    selection
                };
                if !range.is_empty() {
                    self.edit(range, "");
                }
            }
            EditAction::Delete => {
                let range = if selection.is_empty() {
                    head..next_char_boundary(&self.text(), head)
                } else {
                    selection
                };
                if !range.is_empty() {
                    self.edit(range, "");
                }
            }
            EditAction::Move { key, extend } => self.move_caret(key, extend),
            EditAction::SelectAll => self.select_all(),
            EditAction::Copy => self.copy(),
            EditAction::Cut => self.cut(),
            EditAction::Paste => self.paste(),
        }
    }

    /// The user dismissed the field.
    pub fn blur(&self) {
        self.ring.release(self as *const FieldView as usize);
        self.set_focused(false);
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
                NavKey::Up => 0,
                NavKey::Down => text.len(),
                _ => state.head,
            };
            (if extend { state.anchor } else { head }, head)
        };
        self.select(anchor, head);
    }
}

/// `text` with line breaks removed.
fn single_line(text: &str) -> String {
    text.chars().filter(|c| !matches!(c, '\n' | '\r')).collect()
}

impl NativeTextField for FieldView {
    type Font = CosmicFont;

    fn configure(&self, options: FieldOptions) {
        self.state.borrow_mut().options = options;
    }

    fn set_text(&self, text: &str) {
        {
            let mut state = self.state.borrow_mut();
            state.text = single_line(text);
            let end = state.text.len();
            state.anchor = end;
            state.head = end;
        }
        self.emit_changed();
    }

    fn text(&self) -> String {
        self.state.borrow().text.clone()
    }

    fn set_style(&self, style: &TextStyle) {
        self.state.borrow_mut().style = *style;
    }

    fn set_font(&self, font: &CosmicFont) {
        self.state.borrow_mut().font = font.clone();
    }

    fn focus(&self) {
        let me = self.owner.borrow().clone();
        if let Some(me) = me {
            self.ring.claim(Holder::Field(me));
        }
        self.set_focused(true);
    }

    fn unfocus(&self) {
        self.blur();
    }

    fn has_focus(&self) -> bool {
        self.state.borrow().focused
    }

    fn copy(&self) {
        if self.is_secure() {
            log::debug!("copy refused: field is secure");
            return;
        }
        let selected = {
            let state = self.state.borrow();
            state.text[state.selection()].to_string()
        };
        if !selected.is_empty() {
            self.clipboard.borrow_mut().set_text(&selected);
        }
    }

    fn cut(&self) {
        if self.is_secure() {
            log::debug!("cut refused: field is secure");
            return;
        }
        let selection = self.selection();
        if selection.is_empty() {
            return;
        }
        self.copy();
        self.edit(selection, "");
    }

    fn paste(&self) {
        let text = self.clipboard.borrow_mut().text();
        if let Some(text) = text {
            let selection = self.selection();
            self.edit(selection, &text);
        }
    }

    fn select_all(&self) {
        let len = self.state.borrow().text.len();
        self.select(0, len);
    }

    fn measure(&self, max_width: f64, max_height: f64) -> (f64, f64) {
        let (font, attributes) = {
            let state = self.state.borrow();
            (state.font.clone(), state.style.attributes)
        };
        let (width, height) = fonts::measure(&font, &attributes, &self.displayed(), None, 1);
        (
            f64::from(width).min(max_width),
            f64::from(height).min(max_height),
        )
    }
}

/// Route a pressed key to a focused field. Return submits and Escape gives
/// up focus; the rest edits the line.
pub fn handle_key(field: &TextField<FieldView>, key: EditorKey, modifiers: Modifiers) {
    match key {
        EditorKey::Nav(NavKey::Return) => field.native_submit(),
        EditorKey::Nav(NavKey::Escape) => field.widget().blur(),
        EditorKey::Nav(NavKey::Tab) => log::trace!("tab ignored by text field"),
        EditorKey::Nav(nav) => field.widget().apply(EditAction::Move {
            key: nav,
            extend: modifiers.contains(Modifiers::SHIFT),
        }),
        EditorKey::Action(action) => field.widget().apply(action),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editor::EditorView;
    use weft_native_core::{DocumentUpdate, KeyCode, NativeTextView};

    #[derive(Debug, Clone, PartialEq)]
    enum Seen {
        Text(String),
        Token(Option<i32>),
        Action,
    }

    type Log = Rc<RefCell<Vec<Seen>>>;

    fn field(text: &str, options: FieldOptions, ring: &FocusRing) -> (TextField<FieldView>, Log) {
        let clipboard = Rc::new(RefCell::new(Clipboard::local()));
        let field = FieldView::text_field(
            CosmicFont { family: None, size: 12.0 },
            clipboard,
            ring.clone(),
            options,
        );
        let log: Log = Rc::default();
        let (text_log, token_log, action_log) = (log.clone(), log.clone(), log.clone());
        field.bind(
            text,
            Box::new(move |text: &str| text_log.borrow_mut().push(Seen::Text(text.to_owned()))),
            Box::new(move |token: Option<i32>| token_log.borrow_mut().push(Seen::Token(token))),
            Box::new(move || action_log.borrow_mut().push(Seen::Action)),
            1,
        );
        (field, log)
    }

    fn type_text(field: &TextField<FieldView>, text: &str) {
        handle_key(field, EditorKey::Action(EditAction::Insert(text.into())), Modifiers::empty());
    }

    fn press(field: &TextField<FieldView>, key: NavKey, modifiers: Modifiers) {
        handle_key(field, EditorKey::Nav(key), modifiers);
    }

    #[test]
    fn typing_reports_the_whole_line() {
        let (field, log) = field("ab", FieldOptions::default(), &FocusRing::new());
        type_text(&field, "c");
        handle_key(&field, EditorKey::Action(EditAction::Backspace), Modifiers::empty());

        assert_eq!(*log.borrow(), vec![Seen::Text("abc".into()), Seen::Text("ab".into())]);
        assert_eq!(field.text(), "ab");
    }

    #[test]
    fn core_text_is_silent() {
        let (field, log) = field("", FieldOptions::default(), &FocusRing::new());
        field.set_text("from core");

        assert_eq!(field.widget().text(), "from core");
        assert_eq!(field.widget().selection(), 9..9);
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn newlines_never_enter_the_line() {
        let (field, log) = field("", FieldOptions::default(), &FocusRing::new());
        type_text(&field, "one\ntwo\r\n");
        assert_eq!(field.widget().text(), "onetwo");
        assert_eq!(*log.borrow(), vec![Seen::Text("onetwo".into())]);

        type_text(&field, "\n");
        assert_eq!(log.borrow().len(), 1);
    }

    #[test]
    fn return_submits_without_editing() {
        let (field, log) = field("go", FieldOptions::default(), &FocusRing::new());
        press(&field, NavKey::Return, Modifiers::empty());
        press(&field, NavKey::Return, Modifiers::SHIFT);

        assert_eq!(*log.borrow(), vec![Seen::Action, Seen::Action]);
        assert_eq!(field.widget().text(), "go");
    }

    #[test]
    fn arrows_move_within_the_line() {
        let (field, _) = field("héllo", FieldOptions::default(), &FocusRing::new());
        press(&field, NavKey::Up, Modifiers::empty());
        assert_eq!(field.widget().selection(), 0..0);

        press(&field, NavKey::Right, Modifiers::empty());
        press(&field, NavKey::Right, Modifiers::SHIFT);
        assert_eq!(field.widget().selection(), 1..3);

        press(&field, NavKey::Down, Modifiers::empty());
        assert_eq!(field.widget().selection(), 6..6);
    }

    #[test]
    fn forward_delete_removes_whole_characters() {
        let (field, log) = field("a€b", FieldOptions::default(), &FocusRing::new());
        press(&field, NavKey::Up, Modifiers::empty());
        press(&field, NavKey::Right, Modifiers::empty());
        handle_key(&field, EditorKey::Action(EditAction::Delete), Modifiers::empty());

        assert_eq!(*log.borrow(), vec![Seen::Text("ab".into())]);
        assert_eq!(field.widget().selection(), 1..1);
    }

    #[test]
    fn cut_and_paste_use_the_clipboard() {
        let (field, log) = field("one two", FieldOptions::default(), &FocusRing::new());
        field.select_all();
        field.cut();
        field.paste();
        field.paste();

        assert_eq!(
            *log.borrow(),
            vec![
                Seen::Text(String::new()),
                Seen::Text("one two".into()),
                Seen::Text("one twoone two".into()),
            ]
        );
    }

    #[test]
    fn secure_fields_mask_and_keep_the_clipboard_empty() {
        let options = FieldOptions { secure: true, ..FieldOptions::default() };
        let (field, log) = field("", options, &FocusRing::new());
        type_text(&field, "pw");
        assert_eq!(field.widget().displayed(), "••");

        field.select_all();
        field.copy();
        field.cut();
        assert_eq!(field.widget().clipboard.borrow_mut().text(), None);
        assert_eq!(field.widget().text(), "pw");
        assert_eq!(*log.borrow(), vec![Seen::Text("pw".into())]);
    }

    #[test]
    fn user_focus_reports_the_token_and_escape_gives_it_up() {
        let ring = FocusRing::new();
        let (field, log) = field("", FieldOptions::default(), &ring);
        field.widget().focus();
        assert!(ring.focused_field().is_some());

        press(&field, NavKey::Escape, Modifiers::empty());
        assert!(!field.widget().has_focus());
        assert!(ring.focused_field().is_none());
        assert_eq!(*log.borrow(), vec![Seen::Token(Some(1)), Seen::Token(None)]);
    }

    #[test]
    fn core_focus_is_silent() {
        let (field, log) = field("", FieldOptions::default(), &FocusRing::new());
        field.focus();
        assert!(field.widget().has_focus());
        field.unfocus();
        assert!(!field.widget().has_focus());
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn fields_and_editors_share_one_ring() {
        let ring = FocusRing::new();
        let (field, _) = field("", FieldOptions::default(), &ring);
        let clipboard = Rc::new(RefCell::new(Clipboard::local()));
        let view = EditorView::text_view(CosmicFont { family: None, size: 12.0 }, clipboard, ring.clone());
        view.bind(
            "",
            Box::new(|_: DocumentUpdate<'_>| {}),
            Box::new(|_: Option<i32>| {}),
            Box::new(|_: KeyCode| false),
        );

        view.widget().focus();
        field.widget().focus();
        assert!(!view.widget().has_focus());
        assert!(ring.focused().is_none());
        assert!(ring.focused_field().is_some());

        view.widget().focus();
        assert!(!field.widget().has_focus());
        assert!(ring.focused_field().is_none());
    }

    #[test]
    #[serial_test::serial]
    fn measured_width_grows_with_the_text() {
        let (field, _) = field("ab", FieldOptions::default(), &FocusRing::new());
        let (short, height) = field.widget().measure(f64::INFINITY, f64::INFINITY);
        field.set_text("abcdefgh");
        let (long, _) = field.widget().measure(f64::INFINITY, f64::INFINITY);

        assert!(long > short);
        assert!(height > 0.0);
        assert_eq!(field.widget().measure(10.0, 5.0), (10.0_f64.min(long), 5.0));
    }
}
