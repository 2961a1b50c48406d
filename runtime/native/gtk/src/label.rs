//! `GtkLabel` behind [`TextLabel`](weft_native_core::TextLabel).

use crate::fonts::{FontStyle, GtkFont};
use gtk4::pango;
use gtk4::prelude::*;
use std::cell::Cell;
use weft_native_core::{CharAttributes, Color, NativeLabel, TextStyle};

pub struct GtkLabelWidget {
    label: gtk4::Label,
    font: FontStyle,
    style: Cell<TextStyle>,
}

impl GtkLabelWidget {
    /// Build the widget. `name` becomes the CSS name fonts are applied to.
    pub fn new(name: &str) -> Self {
        let label = gtk4::Label::new(None);
        label.set_widget_name(name);
        label.set_wrap(true);
        label.set_wrap_mode(pango::WrapMode::WordChar);
        label.set_xalign(0.0);

        let widget = Self {
            label,
            font: FontStyle::new(name),
            style: Cell::new(TextStyle::default()),
        };
        widget.set_style(&TextStyle::default());
        widget
    }

    /// The GTK widget, for packing into a window.
    pub fn label(&self) -> &gtk4::Label {
        &self.label
    }
}

/// Pango attributes covering the whole text.
pub(crate) fn attr_list(attributes: &CharAttributes) -> pango::AttrList {
    let list = pango::AttrList::new();
    if attributes.bold {
        list.insert(pango::AttrInt::new_weight(pango::Weight::Bold));
    }
    if attributes.italic {
        list.insert(pango::AttrInt::new_style(pango::Style::Italic));
    }
    if attributes.underline {
        list.insert(pango::AttrInt::new_underline(pango::Underline::Single));
    }
    if attributes.strikethrough {
        list.insert(pango::AttrInt::new_strikethrough(true));
    }
    if let Some(color) = attributes.foreground {
        let [r, g, b, a] = color16(color);
        list.insert(pango::AttrColor::new_foreground(r, g, b));
        list.insert(pango::AttrInt::new_foreground_alpha(a));
    }
    if let Some(color) = attributes.background {
        let [r, g, b, a] = color16(color);
        list.insert(pango::AttrColor::new_background(r, g, b));
        list.insert(pango::AttrInt::new_background_alpha(a));
    }
    list
}

/// Channels widened to pango's 16-bit range.
fn color16(color: Color) -> [u16; 4] {
    [color.r, color.g, color.b, color.a].map(|channel| u16::from(channel) * 257)
}

/// Pango line limit: negative heights count lines, -1 is unlimited.
fn layout_height(max_lines: u32) -> i32 {
    if max_lines == 0 {
        -1
    } else {
        -i32::try_from(max_lines).unwrap_or(i32::MAX)
    }
}

impl NativeLabel for GtkLabelWidget {
    type Font = GtkFont;

    fn set_text(&self, text: &str) {
        self.label.set_text(text);
    }

    fn set_style(&self, style: &TextStyle) {
        self.style.set(*style);
        self.label.set_attributes(Some(&attr_list(&style.attributes)));
        if style.max_lines > 0 {
            self.label.set_lines(i32::try_from(style.max_lines).unwrap_or(i32::MAX));
            self.label.set_ellipsize(pango::EllipsizeMode::End);
        } else {
            self.label.set_lines(-1);
            self.label.set_ellipsize(pango::EllipsizeMode::None);
        }
    }

    fn set_font(&self, font: &GtkFont) {
        self.font.apply(&self.label, font);
    }

    fn measure(&self, max_width: f64, max_height: f64) -> (f64, f64) {
        let style = self.style.get();
        let text = self.label.text();
        let layout = self.label.create_pango_layout(Some(text.as_str()));
        layout.set_attributes(Some(&attr_list(&style.attributes)));
        layout.set_wrap(pango::WrapMode::WordChar);
        if max_width.is_finite() {
            layout.set_width((max_width.max(0.0) * f64::from(pango::SCALE)) as i32);
        }
        layout.set_height(layout_height(style.max_lines));
        if style.max_lines > 0 {
            layout.set_ellipsize(pango::EllipsizeMode::End);
        }
        let (width, height) = layout.pixel_size();
        (
            f64::from(width).min(max_width),
            f64::from(height).min(max_height),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channels_fill_the_pango_range() {
        assert_eq!(color16(Color::rgba(255, 0, 128, 255)), [65535, 0, 32896, 65535]);
    }

    #[test]
    fn zero_lines_is_unlimited() {
        assert_eq!(layout_height(0), -1);
        assert_eq!(layout_height(1), -1);
        assert_eq!(layout_height(3), -3);
    }
}
