//! Read-only labels, measured with cosmic-text.

use crate::fonts::{self, CosmicFont};
use std::cell::RefCell;
use weft_native_core::{NativeLabel, TextLabel, TextStyle};

struct LabelState {
    text: String,
    style: TextStyle,
    font: CosmicFont,
}

pub struct LabelView {
    state: RefCell<LabelState>,
}

impl LabelView {
    pub fn new(font: CosmicFont) -> Self {
        Self {
            state: RefCell::new(LabelState {
                text: String::new(),
                style: TextStyle::default(),
                font,
            }),
        }
    }

    pub fn text_label(font: CosmicFont) -> TextLabel<LabelView> {
        TextLabel::new(LabelView::new(font))
    }

    pub fn text(&self) -> String {
        self.state.borrow().text.clone()
    }

    pub fn style(&self) -> TextStyle {
        self.state.borrow().style
    }

    pub fn font(&self) -> CosmicFont {
        self.state.borrow().font.clone()
    }
}

impl std::fmt::Debug for LabelView {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.borrow();
        f.debug_struct("LabelView")
            .field("len", &state.text.len())
            .field("style", &state.style)
            .field("font", &state.font)
            .finish()
    }
}

impl NativeLabel for LabelView {
    type Font = CosmicFont;

    fn set_text(&self, text: &str) {
        self.state.borrow_mut().text = text.to_string();
    }

    fn set_style(&self, style: &TextStyle) {
        self.state.borrow_mut().style = *style;
    }

    fn set_font(&self, font: &CosmicFont) {
        self.state.borrow_mut().font = font.clone();
    }

    fn measure(&self, max_width: f64, max_height: f64) -> (f64, f64) {
        let state = self.state.borrow();
        let wrap = max_width.is_finite().then_some(max_width as f32);
        let (width, height) = fonts::measure(
            &state.font,
            &state.style.attributes,
            &state.text,
            wrap,
            state.style.max_lines as usize,
        );
        (
            f64::from(width).min(max_width),
            f64::from(height).min(max_height),
        )
    }
}
