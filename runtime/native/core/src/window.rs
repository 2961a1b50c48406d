//! Window shell
//!
//! Toolkit-independent half of a native window: owns the event translator and
//! the core's window delegate, coalesces layout requests and runs the
//! two-phase close.

use crate::event::{CanonicalEvent, NativeEventRef};
use crate::handle::Slot;
use crate::schedule::{Coalescer, UiScheduler};
use crate::translate::{EventTranslator, RawEvent};
use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

/// Core-side window handle.
pub trait WindowDelegate {
    /// Returns `true` when the core consumed the event.
    fn dispatch_event(&mut self, event: &CanonicalEvent) -> bool;
    fn should_close(&mut self) -> bool;
    fn layout(&mut self, width: f64, height: f64);
    fn will_fullscreen(&mut self, _entering: bool) {}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowPhase {
    Open,
    /// Close accepted; the destroy runs on a later loop turn.
    Closing,
    Destroyed,
}

struct ShellInner {
    translator: RefCell<EventTranslator>,
    delegate: Slot<dyn WindowDelegate>,
    phase: Cell<WindowPhase>,
    layout: Coalescer,
    pending_size: Cell<Option<(f64, f64)>>,
}

#[derive(Clone)]
pub struct WindowShell {
    inner: Rc<ShellInner>,
}

impl WindowShell {
    pub fn new(delegate: Box<dyn WindowDelegate>) -> Self {
        let shell = Self {
            inner: Rc::new(ShellInner {
                translator: RefCell::new(EventTranslator::new()),
                delegate: Slot::new(),
                phase: Cell::new(WindowPhase::Open),
                layout: Coalescer::new(),
                pending_size: Cell::new(None),
            }),
        };
        shell.inner.delegate.bind(delegate);
        shell
    }

    pub fn phase(&self) -> WindowPhase {
        self.inner.phase.get()
    }

    pub fn is_open(&self) -> bool {
        self.phase() == WindowPhase::Open
    }

    /// Whether both handles refer to the same window.
    pub fn ptr_eq(&self, other: &WindowShell) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    /// Translate a native event and hand it to the delegate.
    ///
    /// `false` tells the toolkit to run its default handling.
    pub fn translate_and_dispatch(&self, raw: &RawEvent<'_>, native: NativeEventRef) -> bool {
        if !self.is_open() {
            log::debug!("event dropped: window is {:?}", self.phase());
            return false;
        }
        let event = self.inner.translator.borrow_mut().translate(raw, native);
        self.inner
            .delegate
            .invoke(|delegate| delegate.dispatch_event(&event))
            .unwrap_or(false)
    }

    /// Forget held pointer buttons, e.g. on pointer leave.
    pub fn reset_pointer(&self) {
        self.inner.translator.borrow_mut().reset_buttons();
    }

    /// Ask for a layout pass at the given size. Requests made before the pass
    /// runs collapse into one, using the latest size.
    pub fn request_layout(&self, width: f64, height: f64, scheduler: &dyn UiScheduler) {
        self.inner.pending_size.set(Some((width, height)));
        let weak = Rc::downgrade(&self.inner);
        self.inner.layout.schedule(scheduler, move || run_layout(&weak));
    }

    pub fn notify_fullscreen(&self, entering: bool) {
        if self.is_open() {
            self.inner
                .delegate
                .invoke(|delegate| delegate.will_fullscreen(entering));
        }
    }

    /// First phase of closing: consult the delegate.
    ///
    /// When the delegate agrees, the shell moves to [`WindowPhase::Closing`]
    /// and schedules [`destroy`](Self::destroy) followed by `on_destroy` for a
    /// later turn. Returns whether the close was accepted. The native window
    /// must stay alive until `on_destroy` runs.
    pub fn request_close(
        &self,
        scheduler: &dyn UiScheduler,
        on_destroy: impl FnOnce() + 'static,
    ) -> bool {
        if !self.is_open() {
            return false;
        }
        match self.inner.delegate.invoke(|delegate| delegate.should_close()) {
            Some(true) => {}
            Some(false) => {
                log::debug!("close vetoed by delegate");
                return false;
            }
            None => {
                // The delegate is mid-call; a close it did not answer is refused.
                log::debug!("close requested while the delegate was busy");
                return false;
            }
        }

        self.inner.phase.set(WindowPhase::Closing);
        let shell = self.clone();
        scheduler.defer(Box::new(move || {
            if shell.destroy() {
                on_destroy();
            }
        }));
        true
    }

    /// Second phase: release the delegate. Idempotent; returns `false` if the
    /// window was already destroyed.
    pub fn destroy(&self) -> bool {
        if self.inner.phase.replace(WindowPhase::Destroyed) == WindowPhase::Destroyed {
            return false;
        }
        self.inner.delegate.release();
        true
    }
}

fn run_layout(weak: &Weak<ShellInner>) {
    let Some(inner) = weak.upgrade() else {
        return;
    };
    let Some((width, height)) = inner.pending_size.take() else {
        return;
    };
    if inner.phase.get() == WindowPhase::Open {
        inner.delegate.invoke(|delegate| delegate.layout(width, height));
    }
}

impl fmt::Debug for WindowShell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WindowShell")
            .field("phase", &self.phase())
            .field("layout_pending", &self.inner.layout.is_scheduled())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::Modifiers;
    use crate::schedule::LocalQueue;
    use std::ptr;

    #[derive(Default)]
    struct Log {
        events: Vec<CanonicalEvent>,
        layouts: Vec<(f64, f64)>,
        fullscreen: Vec<bool>,
        released: bool,
    }

    struct Delegate {
        log: Rc<RefCell<Log>>,
        allow_close: bool,
        consume: bool,
    }

    impl WindowDelegate for Delegate {
        fn dispatch_event(&mut self, event: &CanonicalEvent) -> bool {
            self.log.borrow_mut().events.push(*event);
            self.consume
        }

        fn should_close(&mut self) -> bool {
            self.allow_close
        }

        fn layout(&mut self, width: f64, height: f64) {
            self.log.borrow_mut().layouts.push((width, height));
        }

        fn will_fullscreen(&mut self, entering: bool) {
            self.log.borrow_mut().fullscreen.push(entering);
        }
    }

    impl Drop for Delegate {
        fn drop(&mut self) {
            self.log.borrow_mut().released = true;
        }
    }

    fn shell(allow_close: bool) -> (WindowShell, Rc<RefCell<Log>>) {
        let log = Rc::new(RefCell::new(Log::default()));
        let shell = WindowShell::new(Box::new(Delegate {
            log: log.clone(),
            allow_close,
            consume: true,
        }));
        (shell, log)
    }

    #[test]
    fn events_reach_delegate() {
        let (shell, log) = shell(true);
        let consumed = shell.translate_and_dispatch(
            &RawEvent::Motion { x: 3.0, y: 4.0, modifiers: Modifiers::empty() },
            ptr::null_mut(),
        );
        assert!(consumed);
        assert_eq!(log.borrow().events.len(), 1);
        assert_eq!(log.borrow().events[0].cursor_x, 3.0);
    }

    #[test]
    fn layout_requests_coalesce_to_latest_size() {
        let (shell, log) = shell(true);
        let queue = LocalQueue::new();
        shell.request_layout(100.0, 50.0, &queue);
        shell.request_layout(120.0, 60.0, &queue);
        shell.request_layout(140.0, 70.0, &queue);
        assert!(log.borrow().layouts.is_empty());

        queue.run_pending();
        assert_eq!(log.borrow().layouts, vec![(140.0, 70.0)]);
    }

    #[test]
    fn close_is_two_phase() {
        let (shell, log) = shell(true);
        let queue = LocalQueue::new();
        let destroyed = Rc::new(Cell::new(false));
        let flag = destroyed.clone();

        assert!(shell.request_close(&queue, move || flag.set(true)));
        assert_eq!(shell.phase(), WindowPhase::Closing);
        assert!(!log.borrow().released);
        assert!(!destroyed.get());

        // Further events are not delivered while closing.
        assert!(!shell.translate_and_dispatch(
            &RawEvent::Motion { x: 0.0, y: 0.0, modifiers: Modifiers::empty() },
            ptr::null_mut(),
        ));

        queue.run_pending();
        assert_eq!(shell.phase(), WindowPhase::Destroyed);
        assert!(log.borrow().released);
        assert!(destroyed.get());
        assert!(!shell.destroy());
    }

    #[test]
    fn vetoed_close_keeps_window_open() {
        let (shell, log) = shell(false);
        let queue = LocalQueue::new();
        assert!(!shell.request_close(&queue, || {}));
        assert!(shell.is_open());
        assert!(queue.is_empty());
        assert!(!log.borrow().released);
    }

    struct ReentrantDelegate {
        shell: Rc<RefCell<Option<WindowShell>>>,
        queue: Rc<LocalQueue>,
        inner_result: Rc<Cell<Option<bool>>>,
    }

    impl WindowDelegate for ReentrantDelegate {
        fn dispatch_event(&mut self, _event: &CanonicalEvent) -> bool {
            false
        }

        fn should_close(&mut self) -> bool {
            let shell = self.shell.borrow().clone();
            if let Some(shell) = shell {
                self.inner_result.set(Some(shell.request_close(&*self.queue, || {})));
            }
            false
        }

        fn layout(&mut self, _width: f64, _height: f64) {}
    }

    #[test]
    fn close_from_inside_should_close_is_refused() {
        let handle = Rc::new(RefCell::new(None));
        let queue = Rc::new(LocalQueue::new());
        let inner_result = Rc::new(Cell::new(None));
        let shell = WindowShell::new(Box::new(ReentrantDelegate {
            shell: handle.clone(),
            queue: queue.clone(),
            inner_result: inner_result.clone(),
        }));
        *handle.borrow_mut() = Some(shell.clone());

        assert!(!shell.request_close(&*queue, || {}));
        assert_eq!(inner_result.get(), Some(false));
        assert!(shell.is_open());
        assert!(queue.is_empty());

        // Break the shell -> delegate -> shell cycle.
        handle.borrow_mut().take();
    }

    #[test]
    fn layout_after_destroy_is_dropped() {
        let (shell, log) = shell(true);
        let queue = LocalQueue::new();
        shell.request_layout(10.0, 10.0, &queue);
        shell.destroy();
        queue.run_pending();
        assert!(log.borrow().layouts.is_empty());
    }

    #[test]
    fn clones_share_identity() {
        let (a, _) = shell(true);
        let (b, _) = shell(true);
        assert!(a.ptr_eq(&a.clone()));
        assert!(!a.ptr_eq(&b));
    }

    #[test]
    fn fullscreen_notifications_forwarded() {
        let (shell, log) = shell(true);
        shell.notify_fullscreen(true);
        shell.notify_fullscreen(false);
        assert_eq!(log.borrow().fullscreen, vec![true, false]);
    }
}
