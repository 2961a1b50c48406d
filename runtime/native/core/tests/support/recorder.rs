use std::cell::{Cell, RefCell};
use std::rc::Rc;
use weft_native_core::{
    ActionCallback, DocumentSink, KeyCallback, KeyCode, TextBinding, TokenBinding,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoreCall {
    Replace { start: usize, len: usize, text: String },
    Selection { start: usize, len: usize },
    Token(Option<i32>),
    Key(KeyCode),
    Text(String),
    Action,
}

/// Stands in for the UI core: records what the adapter tells it.
#[derive(Clone, Default)]
pub struct Recorder {
    calls: Rc<RefCell<Vec<CoreCall>>>,
    released: Rc<Cell<usize>>,
}

struct ReleaseCounter(Rc<Cell<usize>>);

impl Drop for ReleaseCounter {
    fn drop(&mut self) {
        self.0.set(self.0.get() + 1);
    }
}

struct RecordingSink {
    calls: Rc<RefCell<Vec<CoreCall>>>,
    _release: ReleaseCounter,
}

impl DocumentSink for RecordingSink {
    fn replace_range(&mut self, start: usize, len: usize, text: &str) {
        self.calls.borrow_mut().push(CoreCall::Replace {
            start,
            len,
            text: text.to_owned(),
        });
    }

    fn set_selection(&mut self, start: usize, len: usize) {
        self.calls.borrow_mut().push(CoreCall::Selection { start, len });
    }
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sink(&self) -> Box<dyn DocumentSink> {
        Box::new(RecordingSink {
            calls: self.calls.clone(),
            _release: ReleaseCounter(self.released.clone()),
        })
    }

    pub fn token(&self) -> Box<TokenBinding> {
        let calls = self.calls.clone();
        let release = ReleaseCounter(self.released.clone());
        Box::new(move |token: Option<i32>| {
            let _keep = &release;
            calls.borrow_mut().push(CoreCall::Token(token));
        })
    }

    /// Key callback that handles the codes `handles` accepts.
    pub fn key_callback(&self, handles: impl Fn(KeyCode) -> bool + 'static) -> Box<KeyCallback> {
        let calls = self.calls.clone();
        let release = ReleaseCounter(self.released.clone());
        Box::new(move |code: KeyCode| {
            let _keep = &release;
            calls.borrow_mut().push(CoreCall::Key(code));
            handles(code)
        })
    }

    pub fn text_binding(&self) -> Box<TextBinding> {
        let calls = self.calls.clone();
        let release = ReleaseCounter(self.released.clone());
        Box::new(move |text: &str| {
            let _keep = &release;
            calls.borrow_mut().push(CoreCall::Text(text.to_owned()));
        })
    }

    pub fn action(&self) -> Box<ActionCallback> {
        let calls = self.calls.clone();
        let release = ReleaseCounter(self.released.clone());
        Box::new(move || {
            let _keep = &release;
            calls.borrow_mut().push(CoreCall::Action);
        })
    }

    pub fn calls(&self) -> Vec<CoreCall> {
        self.calls.borrow().clone()
    }

    pub fn tokens(&self) -> Vec<Option<i32>> {
        self.calls
            .borrow()
            .iter()
            .filter_map(|call| match call {
                CoreCall::Token(token) => Some(*token),
                _ => None,
            })
            .collect()
    }

    pub fn texts(&self) -> Vec<String> {
        self.calls
            .borrow()
            .iter()
            .filter_map(|call| match call {
                CoreCall::Text(text) => Some(text.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn edits(&self) -> Vec<CoreCall> {
        self.calls
            .borrow()
            .iter()
            .filter(|call| matches!(call, CoreCall::Replace { .. }))
            .cloned()
            .collect()
    }

    pub fn selections(&self) -> Vec<CoreCall> {
        self.calls
            .borrow()
            .iter()
            .filter(|call| matches!(call, CoreCall::Selection { .. }))
            .cloned()
            .collect()
    }

    pub fn clear(&self) {
        self.calls.borrow_mut().clear();
    }

    /// How many handles created by this recorder have been dropped.
    pub fn released(&self) -> usize {
        self.released.get()
    }
}
