//! Fonts and the shared cosmic-text font system.

use cosmic_text::{Attrs, Buffer, Family, FontSystem, Metrics, Shaping, Style, Weight};
use once_cell::sync::Lazy;
use parking_lot::Mutex;
use std::path::Path;
use weft_native_core::{CharAttributes, FontError, FontLoader};

// =============================================================================
// Global State
// =============================================================================

/// Font database and shaping caches, shared by every editor.
pub static FONT_SYSTEM: Lazy<Mutex<FontSystem>> = Lazy::new(|| Mutex::new(FontSystem::new()));

/// Line height as a multiple of the font size.
pub const LINE_SPACING: f32 = 1.2;

#[derive(Debug, Clone, PartialEq)]
pub struct CosmicFont {
    /// Family registered in [`FONT_SYSTEM`]; `None` is the sans-serif default.
    pub family: Option<String>,
    pub size: f32,
}

impl CosmicFont {
    pub fn metrics(&self) -> Metrics {
        Metrics::new(self.size, self.size * LINE_SPACING)
    }

    pub fn attrs(&self) -> Attrs<'_> {
        match &self.family {
            Some(name) => Attrs::new().family(Family::Name(name)),
            None => Attrs::new().family(Family::SansSerif),
        }
    }
}

/// Height of `text` wrapped to `width`, one line minimum.
pub fn measure_height(font: &CosmicFont, text: &str, width: f32) -> f32 {
    let metrics = font.metrics();
    let mut font_system = FONT_SYSTEM.lock();
    let mut buffer = Buffer::new(&mut font_system, metrics);
    buffer.set_size(&mut font_system, Some(width.max(1.0)), None);
    buffer.set_text(&mut font_system, text, font.attrs(), Shaping::Advanced);
    buffer.shape_until_scroll(&mut font_system, false);

    let lines = buffer.layout_runs().count().max(1);
    lines as f32 * metrics.line_height
}

/// Size of `text` in `attributes`, wrapped to `max_width` when given and cut
/// to `max_lines` visual lines when that is non-zero. Never less than one
/// line tall.
pub fn measure(
    font: &CosmicFont,
    attributes: &CharAttributes,
    text: &str,
    max_width: Option<f32>,
    max_lines: usize,
) -> (f32, f32) {
    let metrics = font.metrics();
    let mut font_system = FONT_SYSTEM.lock();
    let mut buffer = Buffer::new(&mut font_system, metrics);
    buffer.set_size(&mut font_system, max_width.map(|width| width.max(1.0)), None);
    buffer.set_text(&mut font_system, text, styled(font.attrs(), attributes), Shaping::Advanced);
    buffer.shape_until_scroll(&mut font_system, false);

    let mut lines = 0usize;
    let mut width = 0.0f32;
    for run in buffer.layout_runs() {
        if max_lines > 0 && lines == max_lines {
            break;
        }
        lines += 1;
        width = width.max(run.line_w);
    }
    (width, lines.max(1) as f32 * metrics.line_height)
}

/// `base` with the weight, slant and color of `attributes`.
pub(crate) fn styled<'a>(base: Attrs<'a>, attributes: &CharAttributes) -> Attrs<'a> {
    let mut attrs = base;
    if attributes.bold {
        attrs = attrs.weight(Weight::BOLD);
    }
    if attributes.italic {
        attrs = attrs.style(Style::Italic);
    }
    if let Some(color) = attributes.foreground {
        attrs = attrs.color(cosmic_text::Color::rgba(color.r, color.g, color.b, color.a));
    }
    attrs
}

/// Registers font files with [`FONT_SYSTEM`].
#[derive(Debug, Default)]
pub struct CosmicFontLoader;

impl FontLoader for CosmicFontLoader {
    type Font = CosmicFont;

    fn load(&mut self, path: &Path, size: f32) -> Result<CosmicFont, FontError> {
        let data = std::fs::read(path).map_err(|source| FontError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let mut font_system = FONT_SYSTEM.lock();
        let db = font_system.db_mut();
        let before = db.len();
        db.load_font_data(data);
        let family = db
            .faces()
            .skip(before)
            .find_map(|face| face.families.first().map(|(name, _)| name.clone()))
            .ok_or_else(|| FontError::NoFaces(path.to_path_buf()))?;

        log::debug!("loaded {} from {}", family, path.display());
        Ok(CosmicFont {
            family: Some(family),
            size,
        })
    }

    fn fallback(&mut self, size: f32) -> CosmicFont {
        CosmicFont { family: None, size }
    }
}
