//! Observable value with explicit subscription handles.
//!
//! DESIGN
//! ======
//! Wraps a `tokio::sync::watch` channel: readers get the latest value
//! synchronously, subscribers are woken after every mutation and always read
//! the newest value (intermediate values may be skipped when a subscriber
//! falls behind). A [`Subscription`] detaches when dropped or when
//! [`Subscription::unsubscribe`] is called.
//!
//! A subscription may project the held value through a function, so several
//! views of one value are published together and never disagree. A
//! projected subscription wakes on every change of the source value.

#[cfg(test)]
#[path = "observable_test.rs"]
mod observable_test;

use tokio::sync::watch;

/// Holder of a value that notifies subscribers on every change.
#[derive(Debug)]
pub struct Observable<T> {
    tx: watch::Sender<T>,
}

impl<T: Clone> Observable<T> {
    #[must_use]
    pub fn new(initial: T) -> Self {
        let (tx, _) = watch::channel(initial);
        Self { tx }
    }

    /// Clone of the current value.
    #[must_use]
    pub fn get(&self) -> T {
        self.tx.borrow().clone()
    }

    /// Read the current value without cloning it.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.tx.borrow())
    }

    /// Replace the value and notify subscribers.
    pub fn set(&self, value: T) {
        self.tx.send_replace(value);
    }

    /// Mutate the value in place. Subscribers are notified only when `f`
    /// reports a change; the return value is that report.
    pub fn update(&self, f: impl FnOnce(&mut T) -> bool) -> bool {
        self.tx.send_if_modified(f)
    }

    /// Attach a new subscriber. The current value counts as already seen.
    #[must_use]
    pub fn subscribe(&self) -> Subscription<T> {
        self.subscribe_map(T::clone)
    }

    /// Attach a subscriber that sees `project(value)` instead of the value.
    #[must_use]
    pub fn subscribe_map<U>(&self, project: fn(&T) -> U) -> Subscription<U, T> {
        Subscription { rx: self.tx.subscribe(), project }
    }

    /// Number of live subscriptions.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl<T: Clone + Default> Default for Observable<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

/// Handle for one subscriber of an [`Observable<S>`], yielding `T` views.
#[derive(Debug)]
pub struct Subscription<T, S = T> {
    rx: watch::Receiver<S>,
    project: fn(&S) -> T,
}

impl<T, S> Subscription<T, S> {
    /// Latest published value.
    #[must_use]
    pub fn current(&self) -> T {
        (self.project)(&self.rx.borrow())
    }

    /// Wait for the next change and return the new value. `None` once the
    /// observable is gone.
    pub async fn changed(&mut self) -> Option<T> {
        self.rx.changed().await.ok()?;
        Some((self.project)(&self.rx.borrow_and_update()))
    }

    /// Detach from the observable.
    pub fn unsubscribe(self) {}
}
