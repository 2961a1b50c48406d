//! Fonts for GTK text widgets.
//!
//! GTK resolves families through fontconfig, so a font file stands for the
//! family named by its file stem. The loader only checks that the file is a
//! font; installing it is left to fontconfig configuration. Widgets take
//! their font through a CSS provider keyed on their widget name.

use gtk4::gdk;
use gtk4::prelude::*;
use std::cell::RefCell;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use weft_native_core::{FontError, FontLoader};

#[derive(Debug, Clone, PartialEq)]
pub struct GtkFont {
    /// `None` keeps the theme's family.
    pub family: Option<String>,
    pub size: f32,
}

impl GtkFont {
    /// CSS declarations for a selector.
    pub fn css(&self, selector: &str) -> String {
        match &self.family {
            Some(family) => format!(
                "{} {{ font-family: \"{}\"; font-size: {}pt; }}",
                selector,
                family.replace('"', ""),
                self.size
            ),
            None => format!("{} {{ font-size: {}pt; }}", selector, self.size),
        }
    }
}

/// One widget's font, installed as a display-wide CSS provider that matches
/// only that widget's name. The provider is removed on drop.
pub struct FontStyle {
    css: gtk4::CssProvider,
    selector: String,
    display: RefCell<Option<gdk::Display>>,
}

impl FontStyle {
    pub fn new(name: &str) -> Self {
        Self {
            css: gtk4::CssProvider::new(),
            selector: format!("#{}", name),
            display: RefCell::new(None),
        }
    }

    pub fn apply(&self, widget: &impl IsA<gtk4::Widget>, font: &GtkFont) {
        self.css.load_from_data(&font.css(&self.selector));
        if self.display.borrow().is_none() {
            let display = widget.display();
            gtk4::style_context_add_provider_for_display(
                &display,
                &self.css,
                gtk4::STYLE_PROVIDER_PRIORITY_APPLICATION,
            );
            *self.display.borrow_mut() = Some(display);
        }
    }
}

impl Drop for FontStyle {
    fn drop(&mut self) {
        if let Some(display) = self.display.take() {
            gtk4::style_context_remove_provider_for_display(&display, &self.css);
        }
    }
}

impl std::fmt::Debug for FontStyle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FontStyle")
            .field("selector", &self.selector)
            .field("installed", &self.display.borrow().is_some())
            .finish()
    }
}

const FONT_MAGIC: [[u8; 4]; 5] = [
    [0x00, 0x01, 0x00, 0x00],
    *b"OTTO",
    *b"true",
    *b"ttcf",
    *b"wOFF",
];

#[derive(Debug, Default)]
pub struct GtkFontLoader;

impl FontLoader for GtkFontLoader {
    type Font = GtkFont;

    fn load(&mut self, path: &Path, size: f32) -> Result<GtkFont, FontError> {
        let io_error = |source| FontError::Io {
            path: path.to_path_buf(),
            source,
        };
        let mut magic = [0u8; 4];
        File::open(path)
            .and_then(|mut file| file.read_exact(&mut magic))
            .map_err(io_error)?;
        if !FONT_MAGIC.contains(&magic) {
            return Err(FontError::NoFaces(path.to_path_buf()));
        }

        let family = path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .ok_or_else(|| FontError::NoFaces(path.to_path_buf()))?;
        Ok(GtkFont {
            family: Some(family.to_string()),
            size,
        })
    }

    fn fallback(&mut self, size: f32) -> GtkFont {
        GtkFont { family: None, size }
    }
}
