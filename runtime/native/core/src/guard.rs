//! Reentrancy guard for core-issued widget mutations.
//!
//! While a setter from the UI core is writing into a native widget, the
//! widget's own change signals fire synchronously. Those echoes must not be
//! forwarded back to the core, so every setter holds an [`ApplyGuard`] for
//! the duration of the native call and every notification path checks
//! [`ApplyFlag::is_applying`] first.

use std::cell::Cell;

#[derive(Debug, Default)]
pub struct ApplyFlag {
    applying: Cell<bool>,
}

impl ApplyFlag {
    pub const fn new() -> Self {
        Self {
            applying: Cell::new(false),
        }
    }

    pub fn is_applying(&self) -> bool {
        self.applying.get()
    }

    /// Set the flag until the returned guard is dropped.
    ///
    /// Guards nest: dropping an inner guard restores the value the outer one
    /// installed.
    pub fn acquire(&self) -> ApplyGuard<'_> {
        let previous = self.applying.replace(true);
        ApplyGuard {
            flag: self,
            previous,
        }
    }
}

#[must_use = "the flag is cleared as soon as the guard is dropped"]
#[derive(Debug)]
pub struct ApplyGuard<'a> {
    flag: &'a ApplyFlag,
    previous: bool,
}

impl Drop for ApplyGuard<'_> {
    fn drop(&mut self) {
        self.flag.applying.set(self.previous);
    }
}
