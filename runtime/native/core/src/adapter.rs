//! The toolkit adapter seam: configuration, errors, font cache and the
//! [`NativeAdapter`] trait each backend implements.

use crate::event::CursorKind;
use crate::schedule::{MainThreadSender, UiScheduler};
use crate::text::{
    FieldOptions, NativeLabel, NativeTextField, NativeTextView, TextField, TextLabel, TextView,
};
use crate::window::{WindowDelegate, WindowShell};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

// ============================================================================
// Configuration
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct AdapterConfig {
    pub application_id: String,
    /// Point size used when the core asks for a font without a size.
    pub default_font_size: f32,
    /// Font file used when the core asks for a font without a path.
    pub default_font_path: Option<PathBuf>,
    /// Pixels per wheel "line" for toolkits that report line deltas.
    pub scroll_line_height: f64,
    /// Logical size of newly created windows.
    pub initial_window_size: (f64, f64),
}

impl Default for AdapterConfig {
    fn default() -> Self {
        Self {
            application_id: "org.weft.app".to_string(),
            default_font_size: 13.0,
            default_font_path: None,
            scroll_line_height: 20.0,
            initial_window_size: (800.0, 600.0),
        }
    }
}

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug, Error)]
pub enum FontError {
    #[error("failed to read font {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("no usable font face in {0}")]
    NoFaces(PathBuf),
}

#[derive(Debug, Error)]
pub enum AdapterError {
    #[error("toolkit initialization failed: {0}")]
    Init(String),
    #[error("failed to create {widget}: {reason}")]
    Construction {
        widget: &'static str,
        reason: String,
    },
    #[error("window has been destroyed")]
    WindowGone,
    #[error(transparent)]
    Font(#[from] FontError),
}

// ============================================================================
// Font cache
// ============================================================================

/// Loads toolkit fonts for a [`FontCache`].
pub trait FontLoader {
    type Font: Clone;

    fn load(&mut self, path: &Path, size: f32) -> Result<Self::Font, FontError>;
    /// Toolkit default face at `size`. Never fails.
    fn fallback(&mut self, size: f32) -> Self::Font;
}

/// Fonts keyed by (path, size). Lives as long as the adapter and is never
/// invalidated. A path that fails to load is cached as the fallback, so the
/// warning is logged once per (path, size).
pub struct FontCache<L: FontLoader> {
    loader: L,
    entries: HashMap<(PathBuf, u32), L::Font>,
}

impl<L: FontLoader> FontCache<L> {
    pub fn new(loader: L) -> Self {
        Self {
            loader,
            entries: HashMap::new(),
        }
    }

    pub fn loader(&self) -> &L {
        &self.loader
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn resolve(&mut self, path: Option<&Path>, size: f32) -> L::Font {
        let Some(path) = path else {
            return self.loader.fallback(size);
        };

        let key = (path.to_path_buf(), size.to_bits());
        if let Some(font) = self.entries.get(&key) {
            return font.clone();
        }

        let font = match self.loader.load(path, size) {
            Ok(font) => font,
            Err(e) => {
                log::warn!("{}; using default font", e);
                self.loader.fallback(size)
            }
        };
        self.entries.insert(key, font.clone());
        font
    }
}

impl<L: FontLoader> std::fmt::Debug for FontCache<L> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FontCache")
            .field("entries", &self.entries.len())
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Adapter
// ============================================================================

pub type FontOf<A> = <<A as NativeAdapter>::View as NativeTextView>::Font;

/// One native toolkit behind the UI core.
pub trait NativeAdapter {
    type View: NativeTextView;
    type Field: NativeTextField<Font = <Self::View as NativeTextView>::Font>;
    type Label: NativeLabel<Font = <Self::View as NativeTextView>::Font>;

    fn config(&self) -> &AdapterConfig;

    fn create_text_view(&mut self) -> Result<TextView<Self::View>, AdapterError>;

    fn create_text_field(
        &mut self,
        options: FieldOptions,
    ) -> Result<TextField<Self::Field>, AdapterError>;

    fn create_label(&mut self) -> Result<TextLabel<Self::Label>, AdapterError>;

    fn create_window(
        &mut self,
        title: &str,
        delegate: Box<dyn WindowDelegate>,
    ) -> Result<WindowShell, AdapterError>;

    fn set_cursor(&mut self, window: &WindowShell, cursor: CursorKind);

    /// Resolve through the adapter's font cache. `None` path or size use the
    /// configured defaults.
    fn resolve_font(&mut self, path: Option<&Path>, size: Option<f32>) -> FontOf<Self>;

    fn scheduler(&self) -> &dyn UiScheduler;

    /// Handle for other threads to run work on the UI thread.
    fn main_thread(&self) -> MainThreadSender;

    /// Boundary form of [`create_text_view`](Self::create_text_view): failure
    /// is logged and becomes `None`.
    fn text_view(&mut self) -> Option<TextView<Self::View>> {
        match self.create_text_view() {
            Ok(view) => Some(view),
            Err(e) => {
                log::error!("{}", e);
                None
            }
        }
    }

    /// Boundary form of [`create_text_field`](Self::create_text_field).
    fn text_field(&mut self, options: FieldOptions) -> Option<TextField<Self::Field>> {
        match self.create_text_field(options) {
            Ok(field) => Some(field),
            Err(e) => {
                log::error!("{}", e);
                None
            }
        }
    }

    /// Boundary form of [`create_label`](Self::create_label).
    fn label(&mut self) -> Option<TextLabel<Self::Label>> {
        match self.create_label() {
            Ok(label) => Some(label),
            Err(e) => {
                log::error!("{}", e);
                None
            }
        }
    }

    /// Boundary form of [`create_window`](Self::create_window).
    fn window(&mut self, title: &str, delegate: Box<dyn WindowDelegate>) -> Option<WindowShell> {
        match self.create_window(title, delegate) {
            Ok(window) => Some(window),
            Err(e) => {
                log::error!("{}", e);
                None
            }
        }
    }

    /// Resolve the font and apply it to `view`.
    fn apply_font(&mut self, view: &TextView<Self::View>, path: Option<&Path>, size: Option<f32>) {
        let font = self.resolve_font(path, size);
        view.set_font(&font);
    }
}

/// Fill in configured defaults for a font request.
pub fn font_request<'a>(
    config: &'a AdapterConfig,
    path: Option<&'a Path>,
    size: Option<f32>,
) -> (Option<&'a Path>, f32) {
    (
        path.or(config.default_font_path.as_deref()),
        size.unwrap_or(config.default_font_size),
    )
}
