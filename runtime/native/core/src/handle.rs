//! Capability slots
//!
//! The UI core hands the adapter owned closures ("capabilities"). A widget
//! stores each one in a [`Slot`], which guarantees:
//!
//! - the handle is dropped exactly once, on release, rebind or slot drop;
//! - rebinding drops the previous handle before installing the new one;
//! - a handle is never dropped while its own invocation is on the stack.
//!   Release during invocation takes effect when the call returns.

use crate::keys::KeyCode;
use std::cell::{Cell, RefCell};
use std::fmt;

/// Offered first refusal on navigation keys. Returns `true` when handled.
pub type KeyCallback = dyn FnMut(KeyCode) -> bool;

/// Receives focus tokens: `Some(page)` on focus gain, `None` on loss.
pub type TokenBinding = dyn FnMut(Option<i32>);

/// Receives the full text of a field after each user edit.
pub type TextBinding = dyn FnMut(&str);

/// Runs when the user submits a field.
pub type ActionCallback = dyn FnMut();

/// Core-side document handle fed by native edits.
///
/// Offsets are UTF-8 byte offsets into the document content.
pub trait DocumentSink {
    fn replace_range(&mut self, start: usize, len: usize, text: &str);
    fn set_selection(&mut self, start: usize, len: usize);
}

impl<F> DocumentSink for F
where
    F: FnMut(DocumentUpdate<'_>),
{
    fn replace_range(&mut self, start: usize, len: usize, text: &str) {
        self(DocumentUpdate::Replace { start, len, text });
    }

    fn set_selection(&mut self, start: usize, len: usize) {
        self(DocumentUpdate::Selection { start, len });
    }
}

/// Closure form of [`DocumentSink`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentUpdate<'a> {
    Replace { start: usize, len: usize, text: &'a str },
    Selection { start: usize, len: usize },
}

pub struct Slot<T: ?Sized> {
    handle: RefCell<Option<Box<T>>>,
    generation: Cell<u64>,
    in_flight: Cell<bool>,
}

impl<T: ?Sized> Default for Slot<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: ?Sized> Slot<T> {
    pub fn new() -> Self {
        Self {
            handle: RefCell::new(None),
            generation: Cell::new(0),
            in_flight: Cell::new(false),
        }
    }

    pub fn is_bound(&self) -> bool {
        self.handle.borrow().is_some() || self.in_flight.get()
    }

    /// Install `handle`, dropping any previous one first.
    pub fn bind(&self, handle: Box<T>) {
        self.release();
        *self.handle.borrow_mut() = Some(handle);
    }

    /// Drop the current handle. Returns whether one was bound.
    ///
    /// Calling this again, or on an empty slot, is a no-op.
    pub fn release(&self) -> bool {
        self.generation.set(self.generation.get().wrapping_add(1));
        let previous = self.handle.borrow_mut().take();
        let had_handle = previous.is_some() || self.in_flight.get();
        drop(previous);
        had_handle
    }

    /// Run `f` against the bound handle.
    ///
    /// Returns `None` when the slot is empty, and also when the handle is
    /// already being invoked further up the stack.
    pub fn invoke<R>(&self, f: impl FnOnce(&mut T) -> R) -> Option<R> {
        let handle = self.handle.borrow_mut().take()?;
        let mut restore = Restore {
            slot: self,
            handle: Some(handle),
            generation: self.generation.get(),
        };
        self.in_flight.set(true);
        let result = restore.handle.as_deref_mut().map(f);
        drop(restore);
        result
    }
}

impl<T: ?Sized> fmt::Debug for Slot<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Slot")
            .field("bound", &self.is_bound())
            .field("in_flight", &self.in_flight.get())
            .finish()
    }
}

/// Puts an invoked handle back, or drops it if the slot was released or
/// rebound meanwhile.
struct Restore<'a, T: ?Sized> {
    slot: &'a Slot<T>,
    handle: Option<Box<T>>,
    generation: u64,
}

impl<T: ?Sized> Drop for Restore<'_, T> {
    fn drop(&mut self) {
        self.slot.in_flight.set(false);
        if let Some(handle) = self.handle.take() {
            if self.slot.generation.get() == self.generation {
                *self.slot.handle.borrow_mut() = Some(handle);
            } else {
                log::debug!("dropping capability released during its own invocation");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;

    struct DropNotice {
        name: &'static str,
        log: Rc<RefCell<Vec<String>>>,
    }

    impl Drop for DropNotice {
        fn drop(&mut self) {
            self.log.borrow_mut().push(format!("drop {}", self.name));
        }
    }

    fn noted_callback(name: &'static str, log: &Rc<RefCell<Vec<String>>>) -> Box<KeyCallback> {
        let notice = DropNotice { name, log: log.clone() };
        let log = log.clone();
        Box::new(move |code: KeyCode| {
            let _keep = &notice;
            log.borrow_mut().push(format!("{} {:?}", name, code));
            true
        })
    }

    #[test]
    fn empty_slot_invokes_nothing() {
        let slot: Slot<KeyCallback> = Slot::new();
        assert!(!slot.is_bound());
        assert_eq!(slot.invoke(|cb| cb(KeyCode::Tab)), None);
    }

    #[test]
    fn release_is_idempotent() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let slot: Slot<KeyCallback> = Slot::new();
        slot.bind(noted_callback("a", &log));

        assert!(slot.release());
        assert!(!slot.release());
        assert_eq!(*log.borrow(), vec!["drop a".to_string()]);
        assert_eq!(slot.invoke(|cb| cb(KeyCode::Tab)), None);
    }

    #[test]
    fn rebind_drops_previous_first() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let slot: Slot<KeyCallback> = Slot::new();
        slot.bind(noted_callback("a", &log));
        slot.bind(noted_callback("b", &log));
        assert_eq!(slot.invoke(|cb| cb(KeyCode::Escape)), Some(true));

        assert_eq!(
            *log.borrow(),
            vec!["drop a".to_string(), "b Escape".to_string()]
        );
    }

    #[test]
    fn release_during_invocation_is_deferred() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let slot: Rc<Slot<KeyCallback>> = Rc::new(Slot::new());
        let notice = DropNotice { name: "self", log: log.clone() };

        let inner_slot = Rc::downgrade(&slot);
        let inner_log = log.clone();
        slot.bind(Box::new(move |_code: KeyCode| {
            let _keep = &notice;
            if let Some(slot) = inner_slot.upgrade() {
                slot.release();
            }
            inner_log.borrow_mut().push("still running".to_string());
            true
        }));

        assert_eq!(slot.invoke(|cb| cb(KeyCode::Up)), Some(true));
        assert_eq!(
            *log.borrow(),
            vec!["still running".to_string(), "drop self".to_string()]
        );
        assert!(!slot.is_bound());
    }

    #[test]
    fn nested_invocation_of_same_handle_is_refused() {
        let slot: Rc<Slot<KeyCallback>> = Rc::new(Slot::new());
        let nested = Rc::new(Cell::new(None));

        let inner_slot = Rc::downgrade(&slot);
        let inner_nested = nested.clone();
        slot.bind(Box::new(move |_code: KeyCode| {
            if let Some(slot) = inner_slot.upgrade() {
                inner_nested.set(Some(slot.invoke(|cb| cb(KeyCode::Down)).is_none()));
            }
            false
        }));

        assert!(slot.is_bound());
        assert_eq!(slot.invoke(|cb| cb(KeyCode::Down)), Some(false));
        assert_eq!(nested.get(), Some(true));
        assert!(slot.is_bound());
    }

    #[test]
    fn closure_document_sink_receives_updates() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink_seen = seen.clone();
        let slot: Slot<dyn DocumentSink> = Slot::new();
        slot.bind(Box::new(move |update: DocumentUpdate<'_>| {
            sink_seen.borrow_mut().push(format!("{:?}", update));
        }));

        slot.invoke(|sink| sink.replace_range(1, 2, "xy"));
        slot.invoke(|sink| sink.set_selection(3, 0));
        assert_eq!(seen.borrow().len(), 2);
        assert!(seen.borrow()[0].contains("Replace"));
    }
}
