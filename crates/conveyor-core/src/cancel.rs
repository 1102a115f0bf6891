//! External cancellation for blocked queue calls.
//!
//! A `CancelToken` is a shared flag plus a list of listeners. Queues register
//! themselves as listeners before they block; `cancel()` sets the flag first
//! and then interrupts every live listener. A listener's `interrupt` must take
//! the same lock its waiters check the flag under, so a waiter either sees the
//! flag before it sleeps or is woken after it sleeps.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError, Weak};

/// Something blocked waiters can be woken out of.
pub trait Interrupt: Send + Sync {
    /// Wake every waiter so it re-checks its cancellation flag.
    fn interrupt(&self);
}

#[derive(Default)]
struct CancelInner {
    cancelled: AtomicBool,
    listeners: Mutex<Vec<Weak<dyn Interrupt>>>,
}

/// Cloneable cancellation signal. All clones share one flag.
#[derive(Clone, Default)]
pub struct CancelToken {
    inner: Arc<CancelInner>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fire the token. Idempotent; only the first call interrupts listeners.
    pub fn cancel(&self) {
        if self.inner.cancelled.swap(true, Ordering::SeqCst) {
            return;
        }
        // Listeners are interrupted outside our own lock: `interrupt` takes
        // the queue lock, and waiters hold the queue lock only after
        // registering.
        let listeners = std::mem::take(&mut *self.lock_listeners());
        for listener in listeners {
            if let Some(listener) = listener.upgrade() {
                listener.interrupt();
            }
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::SeqCst)
    }

    /// Register a listener to be interrupted on `cancel()`.
    ///
    /// Registering the same listener twice is a no-op. Registering after the
    /// token fired is also a no-op: callers must check `is_cancelled()` under
    /// their own lock after registering.
    pub fn register(&self, listener: Weak<dyn Interrupt>) {
        let mut listeners = self.lock_listeners();
        if self.is_cancelled() {
            return;
        }
        listeners.retain(|l| l.strong_count() > 0);
        if !listeners.iter().any(|l| Weak::ptr_eq(l, &listener)) {
            listeners.push(listener);
        }
    }

    /// Number of live registered listeners (advisory).
    pub fn listener_count(&self) -> usize {
        self.lock_listeners()
            .iter()
            .filter(|l| l.strong_count() > 0)
            .count()
    }

    fn lock_listeners(&self) -> std::sync::MutexGuard<'_, Vec<Weak<dyn Interrupt>>> {
        self.inner
            .listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for CancelToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CancelToken")
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[derive(Default)]
    struct Counter(AtomicUsize);

    impl Interrupt for Counter {
        fn interrupt(&self) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn cancel_interrupts_each_listener_once() {
        let token = CancelToken::new();
        let counter = Arc::new(Counter::default());
        let listener: Arc<dyn Interrupt> = counter.clone();

        token.register(Arc::downgrade(&listener));
        token.register(Arc::downgrade(&listener));
        assert_eq!(token.listener_count(), 1);

        token.cancel();
        token.cancel();
        assert!(token.is_cancelled());
        assert_eq!(counter.0.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn clones_share_the_flag() {
        let token = CancelToken::new();
        let clone = token.clone();
        assert!(!clone.is_cancelled());
        token.cancel();
        assert!(clone.is_cancelled());
    }

    #[test]
    fn dropped_listeners_are_skipped() {
        let token = CancelToken::new();
        let listener: Arc<dyn Interrupt> = Arc::new(Counter::default());
        token.register(Arc::downgrade(&listener));
        drop(listener);
        assert_eq!(token.listener_count(), 0);
        token.cancel();
    }
}
