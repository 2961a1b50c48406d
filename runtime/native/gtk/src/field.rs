//! `GtkEntry` behind [`TextField`].
//!
//! The entry reports its whole text from `changed`, Return from `activate`
//! and focus through an `EventControllerFocus`. Clipboard commands run the
//! `clipboard.*` actions of the entry's inner text widget, which already
//! refuses to copy out of an invisible entry.

use crate::fonts::{FontStyle, GtkFont};
use crate::label::attr_list;
use gtk4::prelude::*;
use weft_native_core::{FieldOptions, NativeTextField, TextField, TextStyle, WeakTextField};

pub struct GtkFieldWidget {
    entry: gtk4::Entry,
    font: FontStyle,
}

impl GtkFieldWidget {
    /// Build the widget. `name` becomes the CSS name fonts are applied to.
    pub fn new(name: &str) -> Self {
        let entry = gtk4::Entry::new();
        entry.set_widget_name(name);
        Self {
            entry,
            font: FontStyle::new(name),
        }
    }

    /// The GTK widget, for packing into a window.
    pub fn entry(&self) -> &gtk4::Entry {
        &self.entry
    }

    fn run_clipboard_action(&self, action: &str) {
        let Some(text) = self.entry.delegate() else {
            log::debug!("{} skipped: entry has no text delegate", action);
            return;
        };
        if let Err(e) = text.activate_action(action, None) {
            log::warn!("{} failed: {}", action, e);
        }
    }
}

fn input_purpose(options: FieldOptions) -> gtk4::InputPurpose {
    if options.secure {
        gtk4::InputPurpose::Password
    } else {
        gtk4::InputPurpose::FreeForm
    }
}

impl NativeTextField for GtkFieldWidget {
    type Font = GtkFont;

    fn configure(&self, options: FieldOptions) {
        self.entry.set_visibility(!options.secure);
        self.entry.set_input_purpose(input_purpose(options));
        self.entry.set_has_frame(!options.unstyled);
    }

    fn set_text(&self, text: &str) {
        self.entry.set_text(text);
    }

    fn text(&self) -> String {
        self.entry.text().to_string()
    }

    fn set_style(&self, style: &TextStyle) {
        self.entry.set_attributes(&attr_list(&style.attributes));
    }

    fn set_font(&self, font: &GtkFont) {
        self.font.apply(&self.entry, font);
    }

    fn focus(&self) {
        self.entry.grab_focus();
    }

    fn unfocus(&self) {
        if let Some(root) = self.entry.root() {
            root.set_focus(None::<&gtk4::Widget>);
        }
    }

    fn has_focus(&self) -> bool {
        // Focus sits on the entry's inner text widget.
        self.entry
            .state_flags()
            .contains(gtk4::StateFlags::FOCUS_WITHIN)
    }

    fn copy(&self) {
        self.run_clipboard_action("clipboard.copy");
    }

    fn cut(&self) {
        self.run_clipboard_action("clipboard.cut");
    }

    fn paste(&self) {
        self.run_clipboard_action("clipboard.paste");
    }

    fn select_all(&self) {
        self.entry.select_region(0, -1);
    }

    fn measure(&self, max_width: f64, max_height: f64) -> (f64, f64) {
        let (_, width, _, _) = self.entry.measure(gtk4::Orientation::Horizontal, -1);
        let for_width = if max_width.is_finite() {
            max_width.max(0.0) as i32
        } else {
            -1
        };
        let (_, height, _, _) = self.entry.measure(gtk4::Orientation::Vertical, for_width);
        (
            f64::from(width).min(max_width),
            f64::from(height).min(max_height),
        )
    }
}

// =============================================================================
// Signal wiring
// =============================================================================

/// Connect text, activation and focus signals to `field`. Handlers hold a
/// weak reference.
pub fn connect(field: &TextField<GtkFieldWidget>) {
    let entry = &field.widget().entry;

    let weak = field.downgrade();
    entry.connect_changed(move |entry| {
        with_field(&weak, |field| field.native_text_changed(entry.text().as_str()));
    });

    let weak = field.downgrade();
    entry.connect_activate(move |_| with_field(&weak, TextField::native_submit));

    let focus = gtk4::EventControllerFocus::new();
    let weak = field.downgrade();
    focus.connect_enter(move |_| with_field(&weak, |field| field.native_focus_changed(true)));
    let weak = field.downgrade();
    focus.connect_leave(move |_| with_field(&weak, |field| field.native_focus_changed(false)));
    entry.add_controller(focus);
}

fn with_field(weak: &WeakTextField<GtkFieldWidget>, f: impl FnOnce(&TextField<GtkFieldWidget>)) {
    if let Some(field) = weak.upgrade() {
        f(&field);
    }
}
