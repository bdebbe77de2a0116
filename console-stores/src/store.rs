//! Snapshot container shared by both stores.
//!
//! A [`Store`] owns one state value and the snapshot it started from. Every write is a
//! single commit observed atomically by readers and subscribers.

#[cfg(test)]
#[path = "store_test.rs"]
mod store_test;

use tokio::sync::watch;

/// A single mutable state snapshot with whole-commit writes and change notification.
#[derive(Debug)]
pub struct Store<S> {
    state: watch::Sender<S>,
    initial: S,
}

impl<S> Store<S>
where
    S: Clone,
{
    /// Creates a store whose current and reset snapshot is `initial`.
    #[must_use]
    pub fn new(initial: S) -> Self {
        let (state, _) = watch::channel(initial.clone());
        Self { state, initial }
    }

    /// A copy of the current snapshot.
    #[must_use]
    pub fn get_state(&self) -> S {
        self.state.borrow().clone()
    }

    /// Reads the current snapshot without copying it.
    ///
    /// The closure must not call back into the store.
    #[must_use]
    pub fn with_state<R>(&self, read: impl FnOnce(&S) -> R) -> R {
        read(&self.state.borrow())
    }

    /// Applies a partial update and commits it as one write.
    pub fn set_state(&self, update: impl FnOnce(&mut S)) {
        self.state.send_modify(update);
    }

    /// Replaces the whole snapshot.
    pub fn replace_state(&self, state: S) {
        self.state.send_replace(state);
    }

    /// Atomic check-and-set. `update` returns whether it changed anything; the commit
    /// (and change notification) only happens when it did.
    pub fn try_begin(&self, update: impl FnOnce(&mut S) -> bool) -> bool {
        self.state.send_if_modified(update)
    }

    /// Restores the snapshot captured at construction.
    pub fn reset(&self) {
        self.state.send_replace(self.initial.clone());
    }

    /// The snapshot [`Store::reset`] restores.
    #[must_use]
    pub fn initial_state(&self) -> &S {
        &self.initial
    }

    /// A receiver notified after every commit.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<S> {
        self.state.subscribe()
    }
}

impl<S> Default for Store<S>
where
    S: Clone + Default,
{
    fn default() -> Self {
        Self::new(S::default())
    }
}
