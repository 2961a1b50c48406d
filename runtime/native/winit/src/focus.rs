//! Keyboard focus across the editors and fields of one adapter.

use crate::editor::EditorView;
use crate::field::FieldView;
use std::cell::RefCell;
use std::rc::Rc;
use weft_native_core::{TextField, TextView, WeakTextField, WeakTextView};

/// A widget that can hold the ring.
#[derive(Clone)]
pub(crate) enum Holder {
    Editor(WeakTextView<EditorView>),
    Field(WeakTextField<FieldView>),
}

impl Holder {
    /// Address of the live widget, for identity checks.
    fn widget_addr(&self) -> Option<usize> {
        match self {
            Holder::Editor(weak) => weak
                .upgrade()
                .map(|view| view.widget() as *const EditorView as usize),
            Holder::Field(weak) => weak
                .upgrade()
                .map(|field| field.widget() as *const FieldView as usize),
        }
    }

    fn blur(&self) {
        match self {
            Holder::Editor(weak) => {
                if let Some(view) = weak.upgrade() {
                    view.widget().set_focused(false);
                }
            }
            Holder::Field(weak) => {
                if let Some(field) = weak.upgrade() {
                    field.widget().set_focused(false);
                }
            }
        }
    }
}

/// Which widget of an adapter holds keyboard focus. At most one does.
#[derive(Clone, Default)]
pub struct FocusRing {
    current: Rc<RefCell<Option<Holder>>>,
}

impl FocusRing {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn focused(&self) -> Option<TextView<EditorView>> {
        match self.current.borrow().as_ref()? {
            Holder::Editor(weak) => weak.upgrade(),
            Holder::Field(_) => None,
        }
    }

    pub fn focused_field(&self) -> Option<TextField<FieldView>> {
        match self.current.borrow().as_ref()? {
            Holder::Field(weak) => weak.upgrade(),
            Holder::Editor(_) => None,
        }
    }

    /// Hand the ring to `next`. A different previous holder loses focus.
    pub(crate) fn claim(&self, next: Holder) {
        let next_addr = next.widget_addr();
        let previous = self.current.replace(Some(next));
        if let Some(previous) = previous {
            if previous.widget_addr() != next_addr {
                previous.blur();
            }
        }
    }

    /// Empty the ring if the widget at `addr` holds it.
    pub(crate) fn release(&self, addr: usize) {
        let holds = self
            .current
            .borrow()
            .as_ref()
            .and_then(Holder::widget_addr)
            .is_some_and(|current| current == addr);
        if holds {
            self.current.replace(None);
        }
    }
}
