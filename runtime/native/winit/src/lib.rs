//! winit Native Backend for Weft
//!
//! Implements [`NativeAdapter`] on top of winit, with cosmic-text for text
//! measurement. Text views, fields and labels keep their own text models;
//! one focus ring per adapter decides which of them receives keys.
//!
//! # Architecture
//!
//! ```text
//! UI core → NativeAdapter → This Crate → winit event loop → Native Window
//!                                ↓
//!                          cosmic-text (layout)
//! ```
//!
//! winit only creates windows from inside a running event loop, so
//! [`create_window`](NativeAdapter::create_window) hands out a
//! [`WindowShell`] at once and the native window follows on the next loop
//! turn. Deferred work runs from a [`LocalQueue`] drained in
//! `about_to_wait`; other threads wake the loop with a user event.
//!
//! # Usage
//!
//! ```no_run
//! use weft_native_core::{AdapterConfig, NativeAdapter};
//! use weft_native_winit::WinitAdapter;
//!
//! let adapter = WinitAdapter::new(AdapterConfig::default()).expect("config");
//! adapter
//!     .run(|adapter| {
//!         let _view = adapter.text_view();
//!     })
//!     .expect("event loop");
//! ```

pub mod clipboard;
pub mod editor;
pub mod field;
pub mod focus;
pub mod fonts;
pub mod input;
pub mod label;

use clipboard::Clipboard;
use editor::EditorView;
use field::FieldView;
use focus::FocusRing;
use label::LabelView;
use fonts::CosmicFontLoader;
use parking_lot::Mutex;
use std::cell::RefCell;
use std::collections::HashMap;
use std::path::Path;
use std::rc::Rc;
use std::sync::Arc;
use weft_native_core::adapter::{font_request, FontOf};
use weft_native_core::{
    AdapterConfig, AdapterError, CursorKind, FieldOptions, FontCache, KeyPhase, LocalQueue,
    MainThreadQueue, MainThreadSender, Modifiers, NativeAdapter, NativeEventRef, RawEvent,
    TextField, TextLabel, TextView, UiScheduler, WeakTextField, WeakTextView, WindowDelegate,
    WindowPhase, WindowShell,
};
use winit::application::ApplicationHandler;
use winit::dpi::LogicalSize;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop, EventLoopProxy};
use winit::window::{Fullscreen, Window, WindowId};

pub use fonts::CosmicFont;

/// Events the adapter posts to its own loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserEvent {
    /// Work is waiting in the main-thread queue.
    Wake,
}

type SharedProxy = Arc<Mutex<Option<EventLoopProxy<UserEvent>>>>;

struct WindowEntry {
    shell: WindowShell,
    title: String,
    /// `None` until the event loop creates it.
    window: Option<Window>,
    cursor: CursorKind,
    fullscreen: bool,
    /// Last pointer position in logical pixels.
    pointer: (f64, f64),
    editors: Vec<WeakTextView<EditorView>>,
    fields: Vec<WeakTextField<FieldView>>,
}

impl WindowEntry {
    fn prune_editors(&mut self) {
        self.editors.retain(|weak| weak.upgrade().is_some());
    }

    fn prune_fields(&mut self) {
        self.fields.retain(|weak| weak.upgrade().is_some());
    }
}

// =============================================================================
// Adapter
// =============================================================================

pub struct WinitAdapter {
    config: AdapterConfig,
    fonts: FontCache<CosmicFontLoader>,
    windows: HashMap<usize, WindowEntry>,
    next_handle: usize,
    queue: LocalQueue,
    main_queue: MainThreadQueue,
    proxy: SharedProxy,
    clipboard: Rc<RefCell<Clipboard>>,
    ring: FocusRing,
    modifiers: Modifiers,
}

impl WinitAdapter {
    pub fn new(config: AdapterConfig) -> Result<Self, AdapterError> {
        Self::with_clipboard(config, Clipboard::system())
    }

    pub fn with_clipboard(config: AdapterConfig, clipboard: Clipboard) -> Result<Self, AdapterError> {
        let (width, height) = config.initial_window_size;
        if !(width > 0.0 && height > 0.0) {
            return Err(AdapterError::Init(format!(
                "invalid initial window size {}x{}",
                width, height
            )));
        }
        log::debug!("winit adapter ready for {}", config.application_id);

        Ok(Self {
            config,
            fonts: FontCache::new(CosmicFontLoader),
            windows: HashMap::new(),
            next_handle: 1,
            queue: LocalQueue::new(),
            main_queue: MainThreadQueue::new(),
            proxy: Arc::new(Mutex::new(None)),
            clipboard: Rc::new(RefCell::new(clipboard)),
            ring: FocusRing::new(),
            modifiers: Modifiers::empty(),
        })
    }

    /// Run the event loop until the last window closes. `activate` runs once,
    /// when the loop first resumes.
    pub fn run(self, activate: impl FnOnce(&mut WinitAdapter) + 'static) -> Result<(), AdapterError> {
        let event_loop = EventLoop::<UserEvent>::with_user_event()
            .build()
            .map_err(|e| AdapterError::Init(e.to_string()))?;
        *self.proxy.lock() = Some(event_loop.create_proxy());

        let mut app = App {
            adapter: self,
            activate: Some(Box::new(activate)),
            ids: HashMap::new(),
        };
        let result = event_loop
            .run_app(&mut app)
            .map_err(|e| AdapterError::Init(e.to_string()));
        *app.adapter.proxy.lock() = None;
        result
    }

    pub fn window_count(&self) -> usize {
        self.windows.len()
    }

    /// Cursor last requested for `shell`.
    pub fn cursor(&self, shell: &WindowShell) -> Option<CursorKind> {
        self.entry(shell).map(|(_, entry)| entry.cursor)
    }

    pub fn is_fullscreen(&self, shell: &WindowShell) -> bool {
        self.entry(shell).is_some_and(|(_, entry)| entry.fullscreen)
    }

    /// Place `view` in `shell`: keys pressed in that window reach the view
    /// while it holds focus, and resizes set its wrap width.
    pub fn attach_text_view(&mut self, shell: &WindowShell, view: &TextView<EditorView>) {
        match self.entry_mut(shell) {
            Some(entry) => {
                entry.prune_editors();
                entry.editors.push(view.downgrade());
            }
            None => log::debug!("attach_text_view on an unknown window"),
        }
    }

    /// Place `field` in `shell` so keys pressed there reach it while it holds
    /// focus.
    pub fn attach_text_field(&mut self, shell: &WindowShell, field: &TextField<FieldView>) {
        match self.entry_mut(shell) {
            Some(entry) => {
                entry.prune_fields();
                entry.fields.push(field.downgrade());
            }
            None => log::debug!("attach_text_field on an unknown window"),
        }
    }

    /// Live text views attached to `shell`.
    pub fn editor_count(&self, shell: &WindowShell) -> usize {
        self.entry(shell).map_or(0, |(_, entry)| {
            entry.editors.iter().filter(|weak| weak.upgrade().is_some()).count()
        })
    }

    pub fn set_fullscreen(&mut self, shell: &WindowShell, entering: bool) {
        let Some(entry) = self.entry_mut(shell) else {
            log::debug!("set_fullscreen on an unknown window");
            return;
        };
        if entry.fullscreen == entering {
            return;
        }
        entry.shell.notify_fullscreen(entering);
        entry.fullscreen = entering;
        if let Some(window) = &entry.window {
            window.set_fullscreen(entering.then_some(Fullscreen::Borderless(None)));
        }
    }

    /// First phase of closing `shell`; the window goes away on a later
    /// [`pump`](Self::pump).
    pub fn request_close(&self, shell: &WindowShell) -> bool {
        shell.request_close(&self.queue, || log::debug!("window destroyed"))
    }

    /// Focused editor of the window behind `shell`, if any.
    pub fn focused_editor(&self, shell: &WindowShell) -> Option<TextView<EditorView>> {
        let (handle, _) = self.entry(shell)?;
        self.focused_editor_in(handle)
    }

    /// Focused text field of the window behind `shell`, if any.
    pub fn focused_field(&self, shell: &WindowShell) -> Option<TextField<FieldView>> {
        let (handle, _) = self.entry(shell)?;
        self.focused_field_in(handle)
    }

    /// One loop turn of deferred work: run queued tasks, drain the
    /// main-thread queue and drop destroyed windows. Returns how many windows
    /// were dropped.
    pub fn pump(&mut self) -> usize {
        let ran = self.queue.run_pending() + self.main_queue.drain();
        if ran > 0 {
            log::trace!("ran {} deferred tasks", ran);
        }

        let before = self.windows.len();
        self.windows.retain(|handle, entry| {
            let alive = entry.shell.phase() != WindowPhase::Destroyed;
            if !alive {
                log::debug!("dropping window {}", handle);
            }
            alive
        });
        before - self.windows.len()
    }

    fn entry(&self, shell: &WindowShell) -> Option<(usize, &WindowEntry)> {
        self.windows
            .iter()
            .find(|(_, entry)| entry.shell.ptr_eq(shell))
            .map(|(handle, entry)| (*handle, entry))
    }

    fn entry_mut(&mut self, shell: &WindowShell) -> Option<&mut WindowEntry> {
        self.windows.values_mut().find(|entry| entry.shell.ptr_eq(shell))
    }

    fn focused_editor_in(&self, handle: usize) -> Option<TextView<EditorView>> {
        let focused = self.ring.focused()?;
        let entry = self.windows.get(&handle)?;
        entry
            .editors
            .iter()
            .filter_map(WeakTextView::upgrade)
            .any(|view| std::ptr::eq(view.widget(), focused.widget()))
            .then_some(focused)
    }

    fn focused_field_in(&self, handle: usize) -> Option<TextField<FieldView>> {
        let focused = self.ring.focused_field()?;
        let entry = self.windows.get(&handle)?;
        entry
            .fields
            .iter()
            .filter_map(WeakTextField::upgrade)
            .any(|field| std::ptr::eq(field.widget(), focused.widget()))
            .then_some(focused)
    }

    fn create_pending(&mut self, event_loop: &ActiveEventLoop, ids: &mut HashMap<WindowId, usize>) {
        let (width, height) = self.config.initial_window_size;
        for (handle, entry) in self.windows.iter_mut() {
            if entry.window.is_some() || !entry.shell.is_open() {
                continue;
            }
            let attributes = Window::default_attributes()
                .with_title(entry.title.as_str())
                .with_inner_size(LogicalSize::new(width, height));

            match event_loop.create_window(attributes) {
                Ok(window) => {
                    window.set_cursor(input::cursor_icon(entry.cursor));
                    if entry.fullscreen {
                        window.set_fullscreen(Some(Fullscreen::Borderless(None)));
                    }
                    ids.insert(window.id(), *handle);
                    entry.window = Some(window);
                    log::debug!("window {} created", handle);
                }
                Err(e) => {
                    log::error!("window creation failed: {}", e);
                    entry.shell.destroy();
                }
            }
        }
    }
}

impl NativeAdapter for WinitAdapter {
    type View = EditorView;
    type Field = FieldView;
    type Label = LabelView;

    fn config(&self) -> &AdapterConfig {
        &self.config
    }

    fn create_text_view(&mut self) -> Result<TextView<EditorView>, AdapterError> {
        let font = self.resolve_font(None, None);
        Ok(EditorView::text_view(
            font,
            self.clipboard.clone(),
            self.ring.clone(),
        ))
    }

    fn create_text_field(&mut self, options: FieldOptions) -> Result<TextField<FieldView>, AdapterError> {
        let font = self.resolve_font(None, None);
        Ok(FieldView::text_field(
            font,
            self.clipboard.clone(),
            self.ring.clone(),
            options,
        ))
    }

    fn create_label(&mut self) -> Result<TextLabel<LabelView>, AdapterError> {
        let font = self.resolve_font(None, None);
        Ok(LabelView::text_label(font))
    }

    fn create_window(
        &mut self,
        title: &str,
        delegate: Box<dyn WindowDelegate>,
    ) -> Result<WindowShell, AdapterError> {
        let handle = self.next_handle;
        self.next_handle += 1;

        let shell = WindowShell::new(delegate);
        self.windows.insert(
            handle,
            WindowEntry {
                shell: shell.clone(),
                title: title.to_string(),
                window: None,
                cursor: CursorKind::Arrow,
                fullscreen: false,
                pointer: (0.0, 0.0),
                editors: Vec::new(),
                fields: Vec::new(),
            },
        );

        let (width, height) = self.config.initial_window_size;
        shell.request_layout(width, height, &self.queue);
        Ok(shell)
    }

    fn set_cursor(&mut self, window: &WindowShell, cursor: CursorKind) {
        let Some(entry) = self.entry_mut(window) else {
            log::debug!("set_cursor on an unknown window");
            return;
        };
        entry.cursor = cursor;
        if let Some(native) = &entry.window {
            native.set_cursor(input::cursor_icon(cursor));
        }
    }

    fn resolve_font(&mut self, path: Option<&Path>, size: Option<f32>) -> FontOf<Self> {
        let (path, size) = font_request(&self.config, path, size);
        self.fonts.resolve(path, size)
    }

    fn scheduler(&self) -> &dyn UiScheduler {
        &self.queue
    }

    fn main_thread(&self) -> MainThreadSender {
        let proxy = self.proxy.clone();
        MainThreadSender::new(self.main_queue.clone(), move || {
            if let Some(proxy) = proxy.lock().as_ref() {
                if proxy.send_event(UserEvent::Wake).is_err() {
                    log::debug!("wake dropped: event loop has exited");
                }
            }
        })
    }
}

// =============================================================================
// Event loop
// =============================================================================

struct App {
    adapter: WinitAdapter,
    activate: Option<Box<dyn FnOnce(&mut WinitAdapter)>>,
    ids: HashMap<WindowId, usize>,
}

impl App {
    fn dispatch_key(&mut self, handle: usize, event: &winit::event::KeyEvent, native: NativeEventRef) {
        let Some(entry) = self.adapter.windows.get(&handle) else {
            return;
        };
        let modifiers = self.adapter.modifiers;
        let pressed = event.state.is_pressed();
        let raw = RawEvent::Key {
            phase: if pressed { KeyPhase::Down } else { KeyPhase::Up },
            repeat: event.repeat,
            text: input::printable(event.text.as_deref()),
            modifiers,
        };
        if entry.shell.translate_and_dispatch(&raw, native) || !pressed {
            return;
        }

        let Some(key) = input::editor_key(&event.logical_key, event.text.as_deref(), modifiers) else {
            return;
        };
        if let Some(view) = self.adapter.focused_editor_in(handle) {
            editor::handle_key(&view, key, modifiers);
        } else if let Some(field) = self.adapter.focused_field_in(handle) {
            field::handle_key(&field, key, modifiers);
        }
    }
}

impl ApplicationHandler<UserEvent> for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if let Some(activate) = self.activate.take() {
            activate(&mut self.adapter);
        }
        self.adapter.create_pending(event_loop, &mut self.ids);
    }

    fn user_event(&mut self, _event_loop: &ActiveEventLoop, event: UserEvent) {
        match event {
            UserEvent::Wake => {
                self.adapter.main_queue.drain();
            }
        }
    }

    fn window_event(&mut self, _event_loop: &ActiveEventLoop, window_id: WindowId, event: WindowEvent) {
        let Some(&handle) = self.ids.get(&window_id) else {
            return;
        };
        let native: NativeEventRef = (&event as *const WindowEvent).cast_mut().cast();
        let adapter = &mut self.adapter;
        let line_height = adapter.config.scroll_line_height;
        let modifiers = adapter.modifiers;
        let Some(entry) = adapter.windows.get_mut(&handle) else {
            return;
        };
        let scale = entry.window.as_ref().map_or(1.0, |w| w.scale_factor());

        match &event {
            WindowEvent::CloseRequested => {
                entry
                    .shell
                    .request_close(&adapter.queue, move || log::debug!("window {} destroyed", handle));
            }

            WindowEvent::Resized(size) => {
                let logical = size.to_logical::<f64>(scale);
                entry.prune_editors();
                entry.prune_fields();
                for view in entry.editors.iter().filter_map(WeakTextView::upgrade) {
                    view.widget().set_width(logical.width as f32);
                }
                entry
                    .shell
                    .request_layout(logical.width, logical.height, &adapter.queue);
            }

            WindowEvent::ModifiersChanged(state) => {
                adapter.modifiers = input::modifiers(state.state());
            }

            WindowEvent::CursorMoved { position, .. } => {
                let logical = position.to_logical::<f64>(scale);
                entry.pointer = (logical.x, logical.y);
                entry.shell.translate_and_dispatch(
                    &RawEvent::Motion {
                        x: logical.x,
                        y: logical.y,
                        modifiers,
                    },
                    native,
                );
            }

            WindowEvent::CursorLeft { .. } => entry.shell.reset_pointer(),

            WindowEvent::MouseInput { state, button, .. } => {
                let (x, y) = entry.pointer;
                entry.shell.translate_and_dispatch(
                    &RawEvent::Button {
                        button: input::pointer_button(*button),
                        pressed: state.is_pressed(),
                        x,
                        y,
                        modifiers,
                    },
                    native,
                );
            }

            WindowEvent::MouseWheel { delta, .. } => {
                let (delta_x, delta_y) = input::scroll_delta(*delta, line_height, scale);
                entry.shell.translate_and_dispatch(
                    &RawEvent::Scroll {
                        delta_x,
                        delta_y,
                        position: Some(entry.pointer),
                        modifiers,
                    },
                    native,
                );
            }

            WindowEvent::KeyboardInput { event: key, .. } => self.dispatch_key(handle, key, native),

            _ => {}
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        self.adapter.create_pending(event_loop, &mut self.ids);

        let dropped = self.adapter.pump();
        if dropped > 0 {
            let windows = &self.adapter.windows;
            self.ids.retain(|_, handle| windows.contains_key(handle));
            if windows.is_empty() {
                log::debug!("last window closed");
                event_loop.exit();
                return;
            }
        }

        event_loop.set_control_flow(if self.adapter.queue.is_empty() {
            ControlFlow::Wait
        } else {
            ControlFlow::Poll
        });
    }
}
