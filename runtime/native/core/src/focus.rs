//! Focus token protocol
//!
//! A focusable widget reports focus changes to the core as a token:
//! `Some(page)` when it gains focus and `None` when it loses it. On the wire
//! the token is a `(has_value, value)` pair, see [`encode`].

/// `Some(page)` on focus gain, `None` on loss.
pub type FocusToken = Option<i32>;

pub fn encode(token: FocusToken) -> (bool, i32) {
    match token {
        Some(page) => (true, page),
        None => (false, 0),
    }
}

pub fn decode(has_value: bool, value: i32) -> FocusToken {
    has_value.then_some(value)
}

/// Tracks native focus for one widget and decides which tokens to emit.
///
/// A widget without a page id takes part in focus but has no token to
/// announce, so its gains are silent. A loss is only reported after a gain
/// was, which keeps every `None` paired with an earlier `Some`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FocusTracker {
    page: Option<i32>,
    focused: bool,
    announced: bool,
}

impl FocusTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(&self) -> Option<i32> {
        self.page
    }

    pub fn set_page(&mut self, page: Option<i32>) {
        self.page = page;
    }

    pub fn is_focused(&self) -> bool {
        self.focused
    }

    /// Record a focus gain; returns the token to emit, if any.
    pub fn gained(&mut self) -> Option<FocusToken> {
        if self.focused {
            return None;
        }
        self.focused = true;
        let page = self.page?;
        self.announced = true;
        Some(Some(page))
    }

    /// Record a focus loss; returns the token to emit, if any.
    pub fn lost(&mut self) -> Option<FocusToken> {
        if !self.focused {
            return None;
        }
        self.focused = false;
        if std::mem::take(&mut self.announced) {
            Some(None)
        } else {
            None
        }
    }

    /// Page that focus traversal by `step` lands on.
    pub fn step(&self, step: i32) -> Option<i32> {
        self.page.map(|page| page.saturating_add(step))
    }

    /// Update focus state without producing tokens, for changes the core
    /// issued itself.
    pub fn sync_silently(&mut self, focused: bool) {
        self.focused = focused;
        self.announced = focused && self.page.is_some();
    }
}
