//! Read-only labels.

use super::attributes::TextStyle;
use super::widget::NativeLabel;
use std::cell::{Cell, RefCell};

/// A native label with its measured size cached.
///
/// Labels never report back to the core, so there is no guard and no
/// capability handle; the label only keeps the widget from being rewritten
/// with what it already shows.
#[derive(Debug)]
pub struct TextLabel<W: NativeLabel> {
    widget: W,
    text: RefCell<String>,
    style: Cell<Option<TextStyle>>,
    intrinsic: Cell<Option<(f64, f64)>>,
}

impl<W: NativeLabel> TextLabel<W> {
    pub fn new(widget: W) -> Self {
        Self {
            widget,
            text: RefCell::new(String::new()),
            style: Cell::new(None),
            intrinsic: Cell::new(None),
        }
    }

    pub fn widget(&self) -> &W {
        &self.widget
    }

    pub fn text(&self) -> String {
        self.text.borrow().clone()
    }

    pub fn style(&self) -> TextStyle {
        self.style.get().unwrap_or_default()
    }

    pub fn update(&self, text: &str, style: TextStyle) {
        let mut changed = false;
        if self.style.get() != Some(style) {
            self.style.set(Some(style));
            self.widget.set_style(&style);
            changed = true;
        }
        if *self.text.borrow() != text {
            *self.text.borrow_mut() = text.to_owned();
            self.widget.set_text(text);
            changed = true;
        }
        if changed {
            self.intrinsic.set(None);
        }
    }

    pub fn set_font(&self, font: &W::Font) {
        self.widget.set_font(font);
        self.intrinsic.set(None);
    }

    /// Unconstrained size of the current text.
    pub fn intrinsic_size(&self) -> (f64, f64) {
        if let Some(size) = self.intrinsic.get() {
            return size;
        }
        let size = self.widget.measure(f64::INFINITY, f64::INFINITY);
        self.intrinsic.set(Some(size));
        size
    }

    /// Size within the given bounds, never larger than them.
    pub fn size(&self, max_width: f64, max_height: f64) -> (f64, f64) {
        let (width, height) = self.widget.measure(max_width.max(0.0), max_height.max(0.0));
        (width.min(max_width).max(0.0), height.min(max_height).max(0.0))
    }
}
