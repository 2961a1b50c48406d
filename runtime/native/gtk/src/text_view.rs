//! `GtkTextView` behind the text synchronization engine.
//!
//! Buffer offsets are character counts, so the widget speaks
//! [`PositionUnit::Scalar`]. Edits are recorded in `insert-text` /
//! `delete-range`, before the buffer changes, and reported from `changed`,
//! once GTK has revalidated its iterators.

use crate::fonts::{FontStyle, GtkFont};
use crate::input;
use gtk4::prelude::*;
use gtk4::{gdk, pango};
use std::cell::RefCell;
use std::ops::Range;
use weft_native_core::{
    classify, CharAttributes, Color, Justification, LineAttributes, NativeTextView, PositionUnit,
    TextView, WeakTextView,
};

const CHAR_TAG_PREFIX: &str = "weft-char-";
const LINE_TAG_PREFIX: &str = "weft-line-";

#[derive(Debug, Clone, PartialEq, Eq)]
struct PendingEdit {
    position: usize,
    removed: usize,
    inserted: String,
}

pub struct GtkTextWidget {
    view: gtk4::TextView,
    buffer: gtk4::TextBuffer,
    font: FontStyle,
    pending: RefCell<Option<PendingEdit>>,
}

impl GtkTextWidget {
    /// Build the widget. `name` becomes the CSS name fonts are applied to.
    pub fn new(name: &str) -> Self {
        let buffer = gtk4::TextBuffer::new(None);
        let view = gtk4::TextView::with_buffer(&buffer);
        view.set_widget_name(name);
        view.set_wrap_mode(gtk4::WrapMode::WordChar);
        view.set_editable(false);
        view.set_cursor_visible(false);

        Self {
            view,
            buffer,
            font: FontStyle::new(name),
            pending: RefCell::new(None),
        }
    }

    /// The GTK widget, for packing into a window.
    pub fn view(&self) -> &gtk4::TextView {
        &self.view
    }

    pub fn buffer(&self) -> &gtk4::TextBuffer {
        &self.buffer
    }

    fn iter_at(&self, offset: usize) -> gtk4::TextIter {
        self.buffer
            .iter_at_offset(i32::try_from(offset).unwrap_or(i32::MAX))
    }

    fn record(&self, edit: PendingEdit) -> Option<PendingEdit> {
        self.pending.replace(Some(edit))
    }

    fn take_pending(&self) -> Option<PendingEdit> {
        self.pending.take()
    }

    fn tag(&self, name: &str, build: impl FnOnce(&str) -> gtk4::TextTag) -> gtk4::TextTag {
        let table = self.buffer.tag_table();
        if let Some(tag) = table.lookup(name) {
            return tag;
        }
        let tag = build(name);
        if !table.add(&tag) {
            log::warn!("text tag {} could not be registered", name);
        }
        tag
    }

    fn remove_tags_with_prefix(&self, prefix: &str, start: &gtk4::TextIter, end: &gtk4::TextIter) {
        let mut doomed = Vec::new();
        self.buffer.tag_table().foreach(|tag| {
            let name = tag.property::<Option<String>>("name");
            if name.is_some_and(|name| name.starts_with(prefix)) {
                doomed.push(tag.clone());
            }
        });
        for tag in doomed {
            self.buffer.remove_tag(&tag, start, end);
        }
    }

    fn char_tags(&self, attributes: &CharAttributes) -> Vec<gtk4::TextTag> {
        let mut tags = Vec::new();
        if attributes.bold {
            tags.push(self.tag(&format!("{}bold", CHAR_TAG_PREFIX), |name| {
                gtk4::TextTag::builder().name(name).weight(700).build()
            }));
        }
        if attributes.italic {
            tags.push(self.tag(&format!("{}italic", CHAR_TAG_PREFIX), |name| {
                gtk4::TextTag::builder()
                    .name(name)
                    .style(pango::Style::Italic)
                    .build()
            }));
        }
        if attributes.underline {
            tags.push(self.tag(&format!("{}underline", CHAR_TAG_PREFIX), |name| {
                gtk4::TextTag::builder()
                    .name(name)
                    .underline(pango::Underline::Single)
                    .build()
            }));
        }
        if attributes.strikethrough {
            tags.push(self.tag(&format!("{}strikethrough", CHAR_TAG_PREFIX), |name| {
                gtk4::TextTag::builder().name(name).strikethrough(true).build()
            }));
        }
        if let Some(color) = attributes.background {
            tags.push(self.tag(&format!("{}bg-{}", CHAR_TAG_PREFIX, color.hex()), |name| {
                gtk4::TextTag::builder()
                    .name(name)
                    .background_rgba(&rgba(color))
                    .build()
            }));
        }
        if let Some(color) = attributes.foreground {
            tags.push(self.tag(&format!("{}fg-{}", CHAR_TAG_PREFIX, color.hex()), |name| {
                gtk4::TextTag::builder()
                    .name(name)
                    .foreground_rgba(&rgba(color))
                    .build()
            }));
        }
        tags
    }

    fn line_tag(&self, attributes: &LineAttributes) -> gtk4::TextTag {
        let left = attributes.leading.round() as i32;
        let right = attributes.trailing.round() as i32;
        let name = format!(
            "{}{}-{}-{}",
            LINE_TAG_PREFIX,
            attributes.justification.sign(),
            left,
            right
        );
        self.tag(&name, |name| {
            gtk4::TextTag::builder()
                .name(name)
                .justification(justification(attributes.justification))
                .left_margin(left)
                .right_margin(right)
                .build()
        })
    }
}

fn rgba(color: Color) -> gdk::RGBA {
    let [r, g, b, a] = color.to_f64();
    gdk::RGBA::new(r as f32, g as f32, b as f32, a as f32)
}

fn justification(justification: Justification) -> gtk4::Justification {
    match justification {
        Justification::Left => gtk4::Justification::Left,
        Justification::Center => gtk4::Justification::Center,
        Justification::Right => gtk4::Justification::Right,
    }
}

fn offset(iter: &gtk4::TextIter) -> usize {
    usize::try_from(iter.offset()).unwrap_or(0)
}

impl NativeTextView for GtkTextWidget {
    type Font = GtkFont;

    fn unit(&self) -> PositionUnit {
        PositionUnit::Scalar
    }

    fn set_content(&self, text: &str) {
        let (start, end) = self.buffer.bounds();
        self.buffer.remove_all_tags(&start, &end);
        self.buffer.set_text(text);
    }

    fn replace(&self, range: Range<usize>, text: &str) {
        let mut start = self.iter_at(range.start);
        let mut end = self.iter_at(range.end);
        if range.start != range.end {
            self.buffer.delete(&mut start, &mut end);
        }
        if !text.is_empty() {
            self.buffer.insert(&mut start, text);
        }
    }

    fn set_selection(&self, range: Range<usize>) {
        let start = self.iter_at(range.start);
        let end = self.iter_at(range.end);
        self.buffer.select_range(&start, &end);
    }

    fn selection(&self) -> Range<usize> {
        match self.buffer.selection_bounds() {
            Some((start, end)) => offset(&start)..offset(&end),
            None => {
                let cursor = offset(&self.buffer.iter_at_mark(&self.buffer.get_insert()));
                cursor..cursor
            }
        }
    }

    fn set_char_attributes(&self, range: Range<usize>, attributes: &CharAttributes) {
        let start = self.iter_at(range.start);
        let end = self.iter_at(range.end);
        self.remove_tags_with_prefix(CHAR_TAG_PREFIX, &start, &end);
        for tag in self.char_tags(attributes) {
            self.buffer.apply_tag(&tag, &start, &end);
        }
    }

    fn set_line_attributes(&self, range: Range<usize>, attributes: &LineAttributes) {
        let start = self.iter_at(range.start);
        let mut end = self.iter_at(range.end);
        // Cover the newline so empty lines take the tag too.
        if !end.is_end() {
            let _ = end.forward_char();
        }
        self.remove_tags_with_prefix(LINE_TAG_PREFIX, &start, &end);
        self.buffer.apply_tag(&self.line_tag(attributes), &start, &end);
    }

    fn set_editable(&self, editable: bool) {
        self.view.set_editable(editable);
        self.view.set_cursor_visible(editable);
    }

    fn set_font(&self, font: &GtkFont) {
        self.font.apply(&self.view, font);
    }

    fn focus(&self) {
        self.view.grab_focus();
    }

    fn unfocus(&self) {
        if let Some(root) = self.view.root() {
            root.set_focus(None::<&gtk4::Widget>);
        }
    }

    fn has_focus(&self) -> bool {
        self.view.has_focus()
    }

    fn copy(&self) {
        self.buffer.copy_clipboard(&self.view.clipboard());
    }

    fn cut(&self) {
        self.buffer
            .cut_clipboard(&self.view.clipboard(), self.view.is_editable());
    }

    fn paste(&self) {
        self.buffer
            .paste_clipboard(&self.view.clipboard(), None, self.view.is_editable());
    }

    fn select_all(&self) {
        let (start, end) = self.buffer.bounds();
        self.buffer.select_range(&start, &end);
    }

    fn line_height(&self, range: Range<usize>, width: f64) -> f64 {
        let text = self
            .buffer
            .text(&self.iter_at(range.start), &self.iter_at(range.end), false);
        let layout = self.view.create_pango_layout(Some(text.as_str()));
        layout.set_wrap(pango::WrapMode::WordChar);
        layout.set_width((width.max(0.0) * f64::from(pango::SCALE)) as i32);
        let (_, height) = layout.pixel_size();
        f64::from(height)
    }

    fn cursor_position(&self) -> (f64, f64) {
        let cursor = self.buffer.iter_at_mark(&self.buffer.get_insert());
        let location = self.view.iter_location(&cursor);
        let (x, y) = self.view.buffer_to_window_coords(
            gtk4::TextWindowType::Widget,
            location.x(),
            location.y(),
        );
        (f64::from(x), f64::from(y))
    }
}

// =============================================================================
// Signal wiring
// =============================================================================

/// Connect buffer, focus and key signals to `view`. Handlers hold a weak
/// reference, so the widget may outlive the sync engine.
pub fn connect(view: &TextView<GtkTextWidget>) {
    let widget = view.widget();

    let weak = view.downgrade();
    widget.buffer.connect_insert_text(move |_, iter, text| {
        with_view(&weak, |view| {
            let edit = PendingEdit {
                position: offset(iter),
                removed: 0,
                inserted: text.to_string(),
            };
            if let Some(previous) = view.widget().record(edit) {
                report(view, previous);
            }
        });
    });

    let weak = view.downgrade();
    widget.buffer.connect_delete_range(move |_, start, end| {
        with_view(&weak, |view| {
            let (start, end) = (offset(start), offset(end));
            let edit = PendingEdit {
                position: start.min(end),
                removed: start.abs_diff(end),
                inserted: String::new(),
            };
            if let Some(previous) = view.widget().record(edit) {
                report(view, previous);
            }
        });
    });

    let weak = view.downgrade();
    widget.buffer.connect_changed(move |_| {
        with_view(&weak, flush);
    });

    let weak = view.downgrade();
    widget.buffer.connect_mark_set(move |buffer, _, mark| {
        let moved_selection = *mark == buffer.get_insert() || *mark == buffer.selection_bound();
        if !moved_selection {
            return;
        }
        with_view(&weak, |view| {
            flush(view);
            let range = view.widget().selection();
            view.native_selection_changed(range.start, range.end);
        });
    });

    let focus = gtk4::EventControllerFocus::new();
    let weak = view.downgrade();
    focus.connect_enter(move |_| with_view(&weak, |view| view.native_focus_changed(true)));
    let weak = view.downgrade();
    focus.connect_leave(move |_| with_view(&weak, |view| view.native_focus_changed(false)));
    widget.view.add_controller(focus);

    let keys = gtk4::EventControllerKey::new();
    keys.set_propagation_phase(gtk4::PropagationPhase::Capture);
    let weak = view.downgrade();
    keys.connect_key_pressed(move |_, key, _, state| {
        let Some(nav) = input::nav_key(key) else {
            return glib::Propagation::Proceed;
        };
        let code = classify(nav, input::modifiers(state));
        let suppress = weak
            .upgrade()
            .map(|view| view.native_key(code).suppresses_default())
            .unwrap_or(false);
        if suppress {
            glib::Propagation::Stop
        } else {
            glib::Propagation::Proceed
        }
    });
    widget.view.add_controller(keys);
}

fn with_view(weak: &WeakTextView<GtkTextWidget>, f: impl FnOnce(&TextView<GtkTextWidget>)) {
    if let Some(view) = weak.upgrade() {
        f(&view);
    }
}

fn flush(view: &TextView<GtkTextWidget>) {
    if let Some(edit) = view.widget().take_pending() {
        report(view, edit);
    }
}

fn report(view: &TextView<GtkTextWidget>, edit: PendingEdit) {
    view.native_edited(edit.position, edit.removed, &edit.inserted);
}
