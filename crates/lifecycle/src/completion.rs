//! Single-assignment completion signal.

use std::fmt;
use std::sync::OnceLock;

use tokio::sync::Notify;

/// A value that is set at most once and can be awaited by any number of
/// tasks. Every waiter observes the same value.
pub(crate) struct Completion<T> {
    value: OnceLock<T>,
    notify: Notify,
}

impl<T: Clone> Completion<T> {
    pub(crate) fn new() -> Self {
        Self {
            value: OnceLock::new(),
            notify: Notify::new(),
        }
    }

    /// Sets the value. Returns `false` if it had already been set, in which
    /// case the earlier value is kept.
    pub(crate) fn complete(&self, value: T) -> bool {
        let set = self.value.set(value).is_ok();
        if set {
            self.notify.notify_waiters();
        }
        set
    }

    pub(crate) fn get(&self) -> Option<T> {
        self.value.get().cloned()
    }

    pub(crate) async fn wait(&self) -> T {
        loop {
            let notified = self.notify.notified();
            tokio::pin!(notified);
            // Register before checking so a concurrent `complete` can't be missed.
            notified.as_mut().enable();

            if let Some(value) = self.value.get() {
                return value.clone();
            }

            notified.await;
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Completion<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Completion")
            .field("value", &self.value.get())
            .finish_non_exhaustive()
    }
}
