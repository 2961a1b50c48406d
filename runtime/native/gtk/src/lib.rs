//! GTK4 Native Backend for Weft
//!
//! Implements [`NativeAdapter`] on top of GTK 4: text views over
//! `GtkTextView`, text fields over `GtkEntry` and labels over `GtkLabel`.
//!
//! # Architecture
//!
//! ```text
//! UI core → NativeAdapter → This Crate → GTK4 → Native Window
//! ```
//!
//! Everything here runs on the GTK main thread. Deferred work goes through
//! GLib idle sources; other threads reach the UI thread through
//! [`NativeAdapter::main_thread`], which wakes the default main context.
//!
//! # Usage
//!
//! ```no_run
//! use weft_native_core::{AdapterConfig, NativeAdapter};
//! use weft_native_gtk::GtkAdapter;
//!
//! let adapter = GtkAdapter::new(AdapterConfig::default()).expect("GTK init");
//! adapter.run(|adapter| {
//!     let _view = adapter.text_view();
//! });
//! ```

pub mod field;
pub mod fonts;
pub mod input;
pub mod label;
pub mod schedule;
pub mod text_view;
pub mod window;

use field::GtkFieldWidget;
use fonts::GtkFontLoader;
use gtk4::gio;
use gtk4::prelude::*;
use schedule::IdleScheduler;
use label::GtkLabelWidget;
use std::cell::RefCell;
use std::collections::HashMap;
use std::path::Path;
use std::rc::Rc;
use std::sync::atomic::{AtomicUsize, Ordering};
use text_view::GtkTextWidget;
use weft_native_core::adapter::{font_request, FontOf};
use weft_native_core::{
    AdapterConfig, AdapterError, CursorKind, FieldOptions, FontCache, MainThreadQueue,
    MainThreadSender, NativeAdapter, TextField, TextLabel, TextView, UiScheduler, WindowDelegate,
    WindowShell,
};

pub use fonts::GtkFont;

// =============================================================================
// Global State
// =============================================================================

/// Next handle ID
static NEXT_HANDLE: AtomicUsize = AtomicUsize::new(1);

fn allocate_handle() -> usize {
    NEXT_HANDLE.fetch_add(1, Ordering::Relaxed)
}

struct WindowEntry {
    shell: WindowShell,
    window: gtk4::ApplicationWindow,
}

type WindowRegistry = Rc<RefCell<HashMap<usize, WindowEntry>>>;

fn require_gtk(widget: &'static str) -> Result<(), AdapterError> {
    if gtk4::is_initialized_main_thread() {
        Ok(())
    } else {
        Err(AdapterError::Construction {
            widget,
            reason: "GTK is not initialized on this thread".to_string(),
        })
    }
}

// =============================================================================
// Adapter
// =============================================================================

pub struct GtkAdapter {
    config: AdapterConfig,
    app: gtk4::Application,
    fonts: FontCache<GtkFontLoader>,
    windows: WindowRegistry,
    main_queue: MainThreadQueue,
}

impl GtkAdapter {
    /// Initialize GTK on the calling thread, which becomes the UI thread.
    pub fn new(config: AdapterConfig) -> Result<Self, AdapterError> {
        if !gio::Application::id_is_valid(&config.application_id) {
            return Err(AdapterError::Init(format!(
                "invalid application id {:?}",
                config.application_id
            )));
        }
        gtk4::init().map_err(|e| AdapterError::Init(e.to_string()))?;

        let app = gtk4::Application::builder()
            .application_id(config.application_id.as_str())
            .build();
        log::debug!("GTK adapter ready for {}", config.application_id);

        Ok(Self {
            config,
            app,
            fonts: FontCache::new(GtkFontLoader),
            windows: Rc::new(RefCell::new(HashMap::new())),
            main_queue: MainThreadQueue::new(),
        })
    }

    /// Run the application. `activate` is called on every activation, once
    /// the application is registered and windows can join it.
    pub fn run(self, activate: impl Fn(&mut GtkAdapter) + 'static) -> glib::ExitCode {
        let app = self.app.clone();
        let adapter = Rc::new(RefCell::new(self));
        app.connect_activate(move |_| activate(&mut adapter.borrow_mut()));
        app.run_with_args::<&str>(&[])
    }

    pub fn application(&self) -> &gtk4::Application {
        &self.app
    }

    /// The GTK window behind `shell`, for installing content.
    pub fn native_window(&self, shell: &WindowShell) -> Option<gtk4::ApplicationWindow> {
        self.windows
            .borrow()
            .values()
            .find(|entry| entry.shell.ptr_eq(shell))
            .map(|entry| entry.window.clone())
    }

    pub fn window_count(&self) -> usize {
        self.windows.borrow().len()
    }
}

impl NativeAdapter for GtkAdapter {
    type View = GtkTextWidget;
    type Field = GtkFieldWidget;
    type Label = GtkLabelWidget;

    fn config(&self) -> &AdapterConfig {
        &self.config
    }

    fn create_text_view(&mut self) -> Result<TextView<GtkTextWidget>, AdapterError> {
        require_gtk("text view")?;
        let name = format!("weft-text-{}", allocate_handle());
        let view = TextView::new(GtkTextWidget::new(&name));
        text_view::connect(&view);
        Ok(view)
    }

    fn create_text_field(&mut self, options: FieldOptions) -> Result<TextField<GtkFieldWidget>, AdapterError> {
        require_gtk("text field")?;
        let name = format!("weft-field-{}", allocate_handle());
        let field = TextField::new(GtkFieldWidget::new(&name), options);
        field::connect(&field);
        Ok(field)
    }

    fn create_label(&mut self) -> Result<TextLabel<GtkLabelWidget>, AdapterError> {
        require_gtk("label")?;
        let name = format!("weft-label-{}", allocate_handle());
        Ok(TextLabel::new(GtkLabelWidget::new(&name)))
    }

    fn create_window(
        &mut self,
        title: &str,
        delegate: Box<dyn WindowDelegate>,
    ) -> Result<WindowShell, AdapterError> {
        require_gtk("window")?;
        let (width, height) = self.config.initial_window_size;
        let window = gtk4::ApplicationWindow::builder()
            .title(title)
            .default_width(width as i32)
            .default_height(height as i32)
            .build();
        if self.app.is_registered() {
            window.set_application(Some(&self.app));
        } else {
            log::debug!("window {:?} created before activation; not tracked by the application", title);
        }

        let shell = WindowShell::new(delegate);
        let handle = allocate_handle();
        let registry = Rc::downgrade(&self.windows);
        window::attach(&window, &shell, self.config.scroll_line_height, move || {
            if let Some(registry) = registry.upgrade() {
                registry.borrow_mut().remove(&handle);
            }
            log::debug!("window {} destroyed", handle);
        });

        self.windows.borrow_mut().insert(
            handle,
            WindowEntry {
                shell: shell.clone(),
                window: window.clone(),
            },
        );
        shell.request_layout(width, height, &IdleScheduler);
        window.present();
        Ok(shell)
    }

    fn set_cursor(&mut self, window: &WindowShell, cursor: CursorKind) {
        match self.native_window(window) {
            Some(native) => native.set_cursor_from_name(Some(input::cursor_name(cursor))),
            None => log::debug!("set_cursor on an unknown window"),
        }
    }

    fn resolve_font(&mut self, path: Option<&Path>, size: Option<f32>) -> FontOf<Self> {
        let (path, size) = font_request(&self.config, path, size);
        self.fonts.resolve(path, size)
    }

    fn scheduler(&self) -> &dyn UiScheduler {
        &IdleScheduler
    }

    fn main_thread(&self) -> MainThreadSender {
        schedule::main_thread_sender(&self.main_queue)
    }
}
