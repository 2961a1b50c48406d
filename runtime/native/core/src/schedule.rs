//! UI-thread scheduling
//!
//! All widget state lives on the UI thread. Work that must not run inside the
//! current call stack is deferred through a [`UiScheduler`]; work produced on
//! another thread goes through a [`MainThreadSender`].

use parking_lot::Mutex;
use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;
use std::sync::Arc;

pub type Task = Box<dyn FnOnce()>;
pub type SendTask = Box<dyn FnOnce() + Send>;

/// Runs a task on a later turn of the UI event loop.
pub trait UiScheduler {
    fn defer(&self, task: Task);
}

/// Deferred tasks for event loops that drain a queue once per turn.
#[derive(Clone, Default)]
pub struct LocalQueue {
    tasks: Rc<RefCell<VecDeque<Task>>>,
}

impl LocalQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.borrow().is_empty()
    }

    pub fn len(&self) -> usize {
        self.tasks.borrow().len()
    }

    /// Run the tasks queued before this call.
    ///
    /// Tasks deferred while draining wait for the next turn. Returns how many
    /// tasks ran.
    pub fn run_pending(&self) -> usize {
        let batch: Vec<Task> = self.tasks.borrow_mut().drain(..).collect();
        let count = batch.len();
        for task in batch {
            task();
        }
        count
    }
}

impl UiScheduler for LocalQueue {
    fn defer(&self, task: Task) {
        self.tasks.borrow_mut().push_back(task);
    }
}

impl std::fmt::Debug for LocalQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalQueue").field("pending", &self.len()).finish()
    }
}

/// At most one pending deferred task per owner.
#[derive(Debug, Clone, Default)]
pub struct Coalescer {
    scheduled: Rc<Cell<bool>>,
}

impl Coalescer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_scheduled(&self) -> bool {
        self.scheduled.get()
    }

    /// Defer `task` unless one is already pending. Returns whether it was
    /// scheduled.
    pub fn schedule(&self, scheduler: &dyn UiScheduler, task: impl FnOnce() + 'static) -> bool {
        if self.scheduled.replace(true) {
            return false;
        }
        let scheduled = self.scheduled.clone();
        scheduler.defer(Box::new(move || {
            scheduled.set(false);
            task();
        }));
        true
    }
}

/// Lock-protected task queue drained on the UI thread.
#[derive(Clone, Default)]
pub struct MainThreadQueue {
    tasks: Arc<Mutex<VecDeque<SendTask>>>,
}

impl MainThreadQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a task. Returns `true` when the queue was empty, i.e. the UI
    /// thread needs a wake-up.
    pub fn push(&self, task: SendTask) -> bool {
        let mut tasks = self.tasks.lock();
        let was_empty = tasks.is_empty();
        tasks.push_back(task);
        was_empty
    }

    /// Run every queued task. Must be called on the UI thread.
    pub fn drain(&self) -> usize {
        let batch: Vec<SendTask> = self.tasks.lock().drain(..).collect();
        let count = batch.len();
        for task in batch {
            task();
        }
        count
    }

    pub fn len(&self) -> usize {
        self.tasks.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.lock().is_empty()
    }
}

impl std::fmt::Debug for MainThreadQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MainThreadQueue").field("pending", &self.len()).finish()
    }
}

/// Send side of a [`MainThreadQueue`], paired with the toolkit wake-up.
#[derive(Clone)]
pub struct MainThreadSender {
    queue: MainThreadQueue,
    wake: Arc<dyn Fn() + Send + Sync>,
}

impl MainThreadSender {
    pub fn new(queue: MainThreadQueue, wake: impl Fn() + Send + Sync + 'static) -> Self {
        Self {
            queue,
            wake: Arc::new(wake),
        }
    }

    /// Run `task` on the UI thread during a later loop turn.
    pub fn run_on_main(&self, task: impl FnOnce() + Send + 'static) {
        if self.queue.push(Box::new(task)) {
            (self.wake)();
        }
    }
}

impl std::fmt::Debug for MainThreadSender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MainThreadSender")
            .field("queue", &self.queue)
            .finish_non_exhaustive()
    }
}
