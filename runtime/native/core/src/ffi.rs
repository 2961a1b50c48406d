//! C-ABI capability handles
//!
//! A core that is not written in Rust passes its handles as a context
//! pointer plus function pointers. These types convert them into the owned
//! boxed forms the rest of the crate uses. The `release` function runs
//! exactly once, when the boxed form is dropped.

use crate::event::CanonicalEvent;
use crate::focus::{encode, FocusToken};
use crate::handle::{ActionCallback, DocumentSink, KeyCallback, TextBinding, TokenBinding};
use crate::keys::KeyCode;
use crate::window::WindowDelegate;
use std::ffi::c_void;

pub type ReleaseFn = unsafe extern "C" fn(context: *mut c_void);

/// Owns a foreign context and releases it on drop.
struct ForeignContext {
    context: *mut c_void,
    release: Option<ReleaseFn>,
}

impl ForeignContext {
    fn get(&self) -> *mut c_void {
        self.context
    }
}

impl Drop for ForeignContext {
    fn drop(&mut self) {
        if let Some(release) = self.release.take() {
            // SAFETY: the creator of the handle promised `release` accepts
            // `context`; `take` guarantees a single call.
            unsafe { release(self.context) };
        }
    }
}

// ============================================================================
// Key callback
// ============================================================================

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct ForeignKeyCallback {
    pub context: *mut c_void,
    /// Returns non-zero when the key was handled.
    pub invoke: Option<unsafe extern "C" fn(context: *mut c_void, key_code: u8) -> u8>,
    pub release: Option<ReleaseFn>,
}

impl ForeignKeyCallback {
    /// Take ownership of the handle. Returns `None` if `invoke` is null; the
    /// context is still released in that case.
    ///
    /// # Safety
    ///
    /// `invoke` and `release` must accept `context` on the UI thread until
    /// `release` has run, and nothing else may release `context`.
    pub unsafe fn into_boxed(self) -> Option<Box<KeyCallback>> {
        let context = ForeignContext { context: self.context, release: self.release };
        let Some(invoke) = self.invoke else {
            log::error!("key callback handle has no invoke function");
            return None;
        };
        Some(Box::new(move |code: KeyCode| {
            // SAFETY: upheld by the caller of `into_boxed`.
            unsafe { invoke(context.get(), code.as_raw()) != 0 }
        }))
    }
}

// ============================================================================
// Token binding
// ============================================================================

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct ForeignTokenBinding {
    pub context: *mut c_void,
    pub set: Option<unsafe extern "C" fn(context: *mut c_void, has_value: u8, value: i32)>,
    pub release: Option<ReleaseFn>,
}

impl ForeignTokenBinding {
    /// # Safety
    ///
    /// Same contract as [`ForeignKeyCallback::into_boxed`].
    pub unsafe fn into_boxed(self) -> Option<Box<TokenBinding>> {
        let context = ForeignContext { context: self.context, release: self.release };
        let Some(set) = self.set else {
            log::error!("token binding handle has no set function");
            return None;
        };
        Some(Box::new(move |token: FocusToken| {
            let (has_value, value) = encode(token);
            // SAFETY: upheld by the caller of `into_boxed`.
            unsafe { set(context.get(), u8::from(has_value), value) }
        }))
    }
}

// ============================================================================
// Text binding
// ============================================================================

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct ForeignTextBinding {
    pub context: *mut c_void,
    /// `text` points at `text_len` bytes of UTF-8, valid for the call only.
    pub set: Option<unsafe extern "C" fn(context: *mut c_void, text: *const u8, text_len: usize)>,
    pub release: Option<ReleaseFn>,
}

impl ForeignTextBinding {
    /// # Safety
    ///
    /// Same contract as [`ForeignKeyCallback::into_boxed`].
    pub unsafe fn into_boxed(self) -> Option<Box<TextBinding>> {
        let context = ForeignContext { context: self.context, release: self.release };
        let Some(set) = self.set else {
            log::error!("text binding handle has no set function");
            return None;
        };
        Some(Box::new(move |text: &str| {
            // SAFETY: upheld by the caller of `into_boxed`.
            unsafe { set(context.get(), text.as_ptr(), text.len()) }
        }))
    }
}

// ============================================================================
// Action
// ============================================================================

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct ForeignAction {
    pub context: *mut c_void,
    pub invoke: Option<unsafe extern "C" fn(context: *mut c_void)>,
    pub release: Option<ReleaseFn>,
}

impl ForeignAction {
    /// # Safety
    ///
    /// Same contract as [`ForeignKeyCallback::into_boxed`].
    pub unsafe fn into_boxed(self) -> Option<Box<ActionCallback>> {
        let context = ForeignContext { context: self.context, release: self.release };
        let Some(invoke) = self.invoke else {
            log::error!("action handle has no invoke function");
            return None;
        };
        Some(Box::new(move || {
            // SAFETY: upheld by the caller of `into_boxed`.
            unsafe { invoke(context.get()) }
        }))
    }
}

// ============================================================================
// Document sink
// ============================================================================

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct ForeignDocumentSink {
    pub context: *mut c_void,
    /// `text` points at `text_len` bytes of UTF-8, valid for the call only.
    pub replace_range: Option<
        unsafe extern "C" fn(
            context: *mut c_void,
            start: usize,
            len: usize,
            text: *const u8,
            text_len: usize,
        ),
    >,
    pub set_selection: Option<unsafe extern "C" fn(context: *mut c_void, start: usize, len: usize)>,
    pub release: Option<ReleaseFn>,
}

struct ForeignDocument {
    context: ForeignContext,
    replace_range: unsafe extern "C" fn(*mut c_void, usize, usize, *const u8, usize),
    set_selection: unsafe extern "C" fn(*mut c_void, usize, usize),
}

impl DocumentSink for ForeignDocument {
    fn replace_range(&mut self, start: usize, len: usize, text: &str) {
        // SAFETY: contract of `ForeignDocumentSink::into_boxed`.
        unsafe { (self.replace_range)(self.context.get(), start, len, text.as_ptr(), text.len()) }
    }

    fn set_selection(&mut self, start: usize, len: usize) {
        // SAFETY: contract of `ForeignDocumentSink::into_boxed`.
        unsafe { (self.set_selection)(self.context.get(), start, len) }
    }
}

impl ForeignDocumentSink {
    /// # Safety
    ///
    /// Same contract as [`ForeignKeyCallback::into_boxed`].
    pub unsafe fn into_boxed(self) -> Option<Box<dyn DocumentSink>> {
        let context = ForeignContext { context: self.context, release: self.release };
        match (self.replace_range, self.set_selection) {
            (Some(replace_range), Some(set_selection)) => Some(Box::new(ForeignDocument {
                context,
                replace_range,
                set_selection,
            })),
            _ => {
                log::error!("document handle is missing a function pointer");
                None
            }
        }
    }
}

// ============================================================================
// Window delegate
// ============================================================================

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct ForeignWindowDelegate {
    pub context: *mut c_void,
    pub dispatch_event:
        Option<unsafe extern "C" fn(context: *mut c_void, event: *const CanonicalEvent) -> u8>,
    pub should_close: Option<unsafe extern "C" fn(context: *mut c_void) -> u8>,
    pub layout: Option<unsafe extern "C" fn(context: *mut c_void, width: f64, height: f64)>,
    /// Optional.
    pub will_fullscreen: Option<unsafe extern "C" fn(context: *mut c_void, entering: u8)>,
    pub release: Option<ReleaseFn>,
}

struct ForeignWindow {
    context: ForeignContext,
    dispatch_event: unsafe extern "C" fn(*mut c_void, *const CanonicalEvent) -> u8,
    should_close: unsafe extern "C" fn(*mut c_void) -> u8,
    layout: unsafe extern "C" fn(*mut c_void, f64, f64),
    will_fullscreen: Option<unsafe extern "C" fn(*mut c_void, u8)>,
}

impl WindowDelegate for ForeignWindow {
    fn dispatch_event(&mut self, event: &CanonicalEvent) -> bool {
        // SAFETY: contract of `ForeignWindowDelegate::into_boxed`; `event`
        // outlives the call.
        unsafe { (self.dispatch_event)(self.context.get(), event) != 0 }
    }

    fn should_close(&mut self) -> bool {
        // SAFETY: as above.
        unsafe { (self.should_close)(self.context.get()) != 0 }
    }

    fn layout(&mut self, width: f64, height: f64) {
        // SAFETY: as above.
        unsafe { (self.layout)(self.context.get(), width, height) }
    }

    fn will_fullscreen(&mut self, entering: bool) {
        if let Some(will_fullscreen) = self.will_fullscreen {
            // SAFETY: as above.
            unsafe { will_fullscreen(self.context.get(), u8::from(entering)) }
        }
    }
}

impl ForeignWindowDelegate {
    /// # Safety
    ///
    /// Same contract as [`ForeignKeyCallback::into_boxed`].
    pub unsafe fn into_boxed(self) -> Option<Box<dyn WindowDelegate>> {
        let context = ForeignContext { context: self.context, release: self.release };
        match (self.dispatch_event, self.should_close, self.layout) {
            (Some(dispatch_event), Some(should_close), Some(layout)) => Some(Box::new(ForeignWindow {
                context,
                dispatch_event,
                should_close,
                layout,
                will_fullscreen: self.will_fullscreen,
            })),
            _ => {
                log::error!("window delegate handle is missing a function pointer");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::{Cell, RefCell};

    #[derive(Default)]
    struct Witness {
        released: Cell<u32>,
        calls: RefCell<Vec<String>>,
    }

    fn ctx(witness: &Witness) -> *mut c_void {
        witness as *const Witness as *mut c_void
    }

    unsafe fn witness<'a>(context: *mut c_void) -> &'a Witness {
        &*(context as *const Witness)
    }

    unsafe extern "C" fn release(context: *mut c_void) {
        let witness = witness(context);
        witness.released.set(witness.released.get() + 1);
    }

    unsafe extern "C" fn key(context: *mut c_void, code: u8) -> u8 {
        witness(context).calls.borrow_mut().push(format!("key {}", code));
        u8::from(code == KeyCode::Escape.as_raw())
    }

    unsafe extern "C" fn token(context: *mut c_void, has_value: u8, value: i32) {
        witness(context)
            .calls
            .borrow_mut()
            .push(format!("token {} {}", has_value, value));
    }

    unsafe extern "C" fn replace(
        context: *mut c_void,
        start: usize,
        len: usize,
        text: *const u8,
        text_len: usize,
    ) {
        let bytes = std::slice::from_raw_parts(text, text_len);
        let text = std::str::from_utf8(bytes).unwrap();
        witness(context)
            .calls
            .borrow_mut()
            .push(format!("replace {} {} {}", start, len, text));
    }

    unsafe extern "C" fn select(context: *mut c_void, start: usize, len: usize) {
        witness(context)
            .calls
            .borrow_mut()
            .push(format!("select {} {}", start, len));
    }

    unsafe extern "C" fn text(context: *mut c_void, text: *const u8, text_len: usize) {
        let bytes = std::slice::from_raw_parts(text, text_len);
        let text = std::str::from_utf8(bytes).unwrap();
        witness(context).calls.borrow_mut().push(format!("text {}", text));
    }

    unsafe extern "C" fn action(context: *mut c_void) {
        witness(context).calls.borrow_mut().push("action".to_string());
    }

    #[test]
    fn key_callback_invokes_and_releases_once() {
        let witness = Witness::default();
        let handle = ForeignKeyCallback {
            context: ctx(&witness),
            invoke: Some(key),
            release: Some(release),
        };
        let mut callback = unsafe { handle.into_boxed() }.unwrap();
        assert!(callback(KeyCode::Escape));
        assert!(!callback(KeyCode::Tab));
        assert_eq!(witness.released.get(), 0);

        drop(callback);
        assert_eq!(witness.released.get(), 1);
        assert_eq!(*witness.calls.borrow(), vec!["key 4", "key 0"]);
    }

    #[test]
    fn missing_invoke_still_releases() {
        let witness = Witness::default();
        let handle = ForeignKeyCallback {
            context: ctx(&witness),
            invoke: None,
            release: Some(release),
        };
        assert!(unsafe { handle.into_boxed() }.is_none());
        assert_eq!(witness.released.get(), 1);
    }

    #[test]
    fn token_binding_encodes_wire_pair() {
        let witness = Witness::default();
        let handle = ForeignTokenBinding {
            context: ctx(&witness),
            set: Some(token),
            release: Some(release),
        };
        let mut binding = unsafe { handle.into_boxed() }.unwrap();
        binding(Some(3));
        binding(None);
        drop(binding);
        assert_eq!(*witness.calls.borrow(), vec!["token 1 3", "token 0 0"]);
        assert_eq!(witness.released.get(), 1);
    }

    #[test]
    fn document_sink_passes_text_slices() {
        let witness = Witness::default();
        let handle = ForeignDocumentSink {
            context: ctx(&witness),
            replace_range: Some(replace),
            set_selection: Some(select),
            release: None,
        };
        let mut sink = unsafe { handle.into_boxed() }.unwrap();
        sink.replace_range(2, 1, "é");
        sink.set_selection(4, 0);
        assert_eq!(*witness.calls.borrow(), vec!["replace 2 1 é", "select 4 0"]);
    }

    #[test]
    fn text_binding_passes_whole_strings() {
        let witness = Witness::default();
        let handle = ForeignTextBinding {
            context: ctx(&witness),
            set: Some(text),
            release: Some(release),
        };
        let mut binding = unsafe { handle.into_boxed() }.unwrap();
        binding("né");
        binding("");
        drop(binding);
        assert_eq!(*witness.calls.borrow(), vec!["text né", "text "]);
        assert_eq!(witness.released.get(), 1);
    }

    #[test]
    fn action_runs_each_time_and_releases_once() {
        let witness = Witness::default();
        let handle = ForeignAction {
            context: ctx(&witness),
            invoke: Some(action),
            release: Some(release),
        };
        let mut callback = unsafe { handle.into_boxed() }.unwrap();
        callback();
        callback();
        drop(callback);
        assert_eq!(*witness.calls.borrow(), vec!["action", "action"]);
        assert_eq!(witness.released.get(), 1);

        let missing = ForeignAction {
            context: ctx(&witness),
            invoke: None,
            release: Some(release),
        };
        assert!(unsafe { missing.into_boxed() }.is_none());
        assert_eq!(witness.released.get(), 2);
    }
}
