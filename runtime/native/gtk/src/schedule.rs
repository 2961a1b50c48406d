//! GLib main loop scheduling.

use weft_native_core::schedule::Task;
use weft_native_core::{MainThreadQueue, MainThreadSender, UiScheduler};

/// Defers tasks to an idle source on the thread-default main context.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdleScheduler;

impl UiScheduler for IdleScheduler {
    fn defer(&self, task: Task) {
        glib::idle_add_local_once(task);
    }
}

/// Sender whose wake-up drains `queue` from the default main context.
pub fn main_thread_sender(queue: &MainThreadQueue) -> MainThreadSender {
    let context = glib::MainContext::default();
    let drained = queue.clone();
    MainThreadSender::new(queue.clone(), move || {
        let queue = drained.clone();
        context.invoke(move || {
            let ran = queue.drain();
            log::debug!("ran {} main-thread tasks", ran);
        });
    })
}
