use super::attributes::{CharAttributes, LineAttributes, TextStyle};
use super::field::FieldOptions;
use super::offsets::PositionUnit;
use std::ops::Range;

/// The native editable text widget behind a [`TextView`](super::TextView).
///
/// Every range and position is in the widget's own [`PositionUnit`]. Methods
/// take `&self` because toolkits fire change signals from inside these calls,
/// and those signals reach back into the same widget.
///
/// Implementations report user-driven changes by calling the `native_*`
/// entry points of the owning `TextView`; they never filter echoes
/// themselves.
pub trait NativeTextView {
    type Font;

    fn unit(&self) -> PositionUnit;

    /// Replace all content and drop every attribute.
    fn set_content(&self, text: &str);
    fn replace(&self, range: Range<usize>, text: &str);

    fn set_selection(&self, range: Range<usize>);
    fn selection(&self) -> Range<usize>;

    fn set_char_attributes(&self, range: Range<usize>, attributes: &CharAttributes);
    /// `range` covers the line's text without its newline.
    fn set_line_attributes(&self, range: Range<usize>, attributes: &LineAttributes);

    fn set_editable(&self, editable: bool);
    fn set_font(&self, font: &Self::Font);

    fn focus(&self);
    fn unfocus(&self);
    fn has_focus(&self) -> bool;

    fn copy(&self);
    fn cut(&self);
    fn paste(&self);
    fn select_all(&self);

    /// Height the text in `range` needs when wrapped to `width`.
    fn line_height(&self, range: Range<usize>, width: f64) -> f64;
    /// Caret position in widget coordinates.
    fn cursor_position(&self) -> (f64, f64);
}

/// The native single-line entry behind a [`TextField`](super::TextField).
///
/// Like [`NativeTextView`], change signals fire synchronously from inside the
/// mutating calls. Implementations report user edits, focus changes and
/// submission through the `native_*` entry points of the owning field.
pub trait NativeTextField {
    type Font;

    /// Apply construction options. Called once, before anything else.
    fn configure(&self, options: FieldOptions);

    fn set_text(&self, text: &str);
    fn text(&self) -> String;

    fn set_style(&self, style: &TextStyle);
    fn set_font(&self, font: &Self::Font);

    fn focus(&self);
    fn unfocus(&self);
    fn has_focus(&self) -> bool;

    fn copy(&self);
    fn cut(&self);
    fn paste(&self);
    fn select_all(&self);

    /// Size the field needs within the given bounds. Infinite bounds are
    /// unconstrained.
    fn measure(&self, max_width: f64, max_height: f64) -> (f64, f64);
}

/// A native read-only label.
pub trait NativeLabel {
    type Font;

    fn set_text(&self, text: &str);
    fn set_style(&self, style: &TextStyle);
    fn set_font(&self, font: &Self::Font);

    /// Size the text needs within the given bounds. Infinite bounds are
    /// unconstrained.
    fn measure(&self, max_width: f64, max_height: f64) -> (f64, f64);
}
