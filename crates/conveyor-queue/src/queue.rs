//! Bounded blocking queue.
//!
//! All mutable state (`State`) lives behind a single mutex. Waiters park on
//! one of two condition variables, `not_full` for `put` and `not_empty` for
//! `take`, and always re-check their predicate after waking. Every
//! successful insert broadcasts on `not_empty`; every successful removal
//! broadcasts on `not_full`.

use std::collections::VecDeque;
use std::fmt;
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError, Weak};
use std::time::{Duration, Instant};

use conveyor_core::cancel::{CancelToken, Interrupt};
use conveyor_core::error::{Error, Result};
use conveyor_core::item::Item;

use crate::tracking::{QueueCounters, QueueStats};

/// Upper bound on storage reserved up front; larger queues grow on demand.
const PREALLOC_LIMIT: usize = 1024;

struct State<T> {
    items: VecDeque<Item<T>>,
    closed: bool,
}

struct Shared<T> {
    capacity: usize,
    state: Mutex<State<T>>,
    not_full: Condvar,
    not_empty: Condvar,
    counters: QueueCounters,
}

impl<T> Shared<T> {
    // Critical sections leave `State` consistent before anything that can
    // panic, so a poisoned lock still guards valid data.
    fn lock(&self) -> MutexGuard<'_, State<T>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Suspend on `cv` until woken or until `deadline` passes.
    fn wait<'a>(
        &self,
        cv: &Condvar,
        guard: MutexGuard<'a, State<T>>,
        deadline: Option<Instant>,
    ) -> Result<MutexGuard<'a, State<T>>> {
        match deadline {
            None => Ok(cv.wait(guard).unwrap_or_else(PoisonError::into_inner)),
            Some(deadline) => {
                let now = Instant::now();
                if now >= deadline {
                    return Err(Error::Timeout);
                }
                let (guard, _) = cv
                    .wait_timeout(guard, deadline - now)
                    .unwrap_or_else(PoisonError::into_inner);
                Ok(guard)
            }
        }
    }
}

impl<T: Send> Interrupt for Shared<T> {
    fn interrupt(&self) {
        // Holding the lock orders this wake after any waiter's flag check.
        let _state = self.lock();
        self.not_full.notify_all();
        self.not_empty.notify_all();
    }
}

/// Fixed-capacity FIFO shared between threads.
///
/// Cloning the handle is cheap; all clones refer to the same queue.
pub struct BoundedQueue<T> {
    shared: Arc<Shared<T>>,
}

impl<T> Clone for BoundedQueue<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<T> BoundedQueue<T> {
    /// Create a queue holding at most `capacity` items.
    ///
    /// Fails with `Error::InvalidCapacity` when `capacity <= 0`; the value is
    /// never clamped.
    pub fn new(capacity: i64) -> Result<Self> {
        let invalid = Error::InvalidCapacity {
            requested: capacity,
        };
        if capacity <= 0 {
            return Err(invalid);
        }
        let capacity = usize::try_from(capacity).map_err(|_| invalid)?;

        #[cfg(feature = "tracing")]
        tracing::debug!(capacity, "bounded queue created");

        Ok(Self {
            shared: Arc::new(Shared {
                capacity,
                state: Mutex::new(State {
                    items: VecDeque::with_capacity(capacity.min(PREALLOC_LIMIT)),
                    closed: false,
                }),
                not_full: Condvar::new(),
                not_empty: Condvar::new(),
                counters: QueueCounters::default(),
            }),
        })
    }

    /// Fixed construction-time capacity.
    pub fn capacity(&self) -> usize {
        self.shared.capacity
    }

    /// Current occupancy, read under the lock.
    pub fn size(&self) -> usize {
        self.shared.lock().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shared.lock().items.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.shared.lock().items.len() == self.shared.capacity
    }

    pub fn is_closed(&self) -> bool {
        self.shared.lock().closed
    }

    pub fn stats(&self) -> QueueStats {
        self.shared.counters.snapshot()
    }

    /// Append `item`, blocking while the queue is full.
    pub fn put(&self, item: Item<T>) -> Result<()> {
        self.put_inner(item, None, None)
    }

    /// Remove the head item, blocking while the queue is empty.
    ///
    /// On a closed queue, buffered items are still returned in order; once
    /// they run out every caller gets `Item::EndOfStream`.
    pub fn take(&self) -> Result<Item<T>> {
        self.take_inner(None, None)
    }

    /// Like `put`, but gives up with `Error::Timeout` after `timeout`.
    pub fn put_timeout(&self, item: Item<T>, timeout: Duration) -> Result<()> {
        self.put_inner(item, None, Instant::now().checked_add(timeout))
    }

    /// Like `take`, but gives up with `Error::Timeout` after `timeout`.
    pub fn take_timeout(&self, timeout: Duration) -> Result<Item<T>> {
        self.take_inner(None, Instant::now().checked_add(timeout))
    }

    /// Non-blocking `put`. Hands the item back when full or closed.
    pub fn try_put(&self, item: Item<T>) -> std::result::Result<(), TryPutError<T>> {
        let shared = &*self.shared;
        let mut state = shared.lock();
        if state.closed {
            return Err(TryPutError::Closed(item));
        }
        if state.items.len() >= shared.capacity {
            return Err(TryPutError::Full(item));
        }
        Self::push(shared, &mut state, item);
        Ok(())
    }

    /// Non-blocking `take`. `None` means empty and still open.
    pub fn try_take(&self) -> Option<Item<T>> {
        let shared = &*self.shared;
        let mut state = shared.lock();
        match Self::pop(shared, &mut state) {
            Some(item) => Some(item),
            None if state.closed => Some(Item::EndOfStream),
            None => None,
        }
    }

    /// Remove every buffered item at once, waking blocked putters.
    pub fn drain(&self) -> Vec<Item<T>> {
        let shared = &*self.shared;
        let mut state = shared.lock();
        let drained: Vec<_> = state.items.drain(..).collect();
        if !drained.is_empty() {
            shared.counters.record_taken(drained.len(), 0);
            shared.not_full.notify_all();
        }
        drained
    }

    /// Close the queue.
    ///
    /// Pending and future `put` calls fail with `Error::Closed`. `take` keeps
    /// returning buffered items, then `Item::EndOfStream` to every caller.
    /// Idempotent.
    pub fn close(&self) {
        let shared = &*self.shared;
        let mut state = shared.lock();
        if state.closed {
            return;
        }
        state.closed = true;
        shared.not_full.notify_all();
        shared.not_empty.notify_all();

        #[cfg(feature = "tracing")]
        tracing::debug!(buffered = state.items.len(), "bounded queue closed");
    }

    fn put_inner(
        &self,
        item: Item<T>,
        cancel: Option<&CancelToken>,
        deadline: Option<Instant>,
    ) -> Result<()> {
        let shared = &*self.shared;
        let mut state = shared.lock();
        loop {
            if cancel.is_some_and(CancelToken::is_cancelled) {
                return Err(Error::Cancelled);
            }
            if state.closed {
                return Err(Error::Closed);
            }
            if state.items.len() < shared.capacity {
                break;
            }
            state = shared.wait(&shared.not_full, state, deadline)?;
        }
        Self::push(shared, &mut state, item);
        Ok(())
    }

    fn take_inner(
        &self,
        cancel: Option<&CancelToken>,
        deadline: Option<Instant>,
    ) -> Result<Item<T>> {
        let shared = &*self.shared;
        let mut state = shared.lock();
        loop {
            if cancel.is_some_and(CancelToken::is_cancelled) {
                return Err(Error::Cancelled);
            }
            if let Some(item) = Self::pop(shared, &mut state) {
                return Ok(item);
            }
            if state.closed {
                return Ok(Item::EndOfStream);
            }
            state = shared.wait(&shared.not_empty, state, deadline)?;
        }
    }

    fn push(shared: &Shared<T>, state: &mut State<T>, item: Item<T>) {
        state.items.push_back(item);
        shared.counters.record_put(state.items.len());
        shared.not_empty.notify_all();
    }

    fn pop(shared: &Shared<T>, state: &mut State<T>) -> Option<Item<T>> {
        let item = state.items.pop_front()?;
        shared.counters.record_taken(1, state.items.len());
        shared.not_full.notify_all();
        Some(item)
    }
}

impl<T: Send + 'static> BoundedQueue<T> {
    /// Like `put`, but returns `Error::Cancelled` without mutating the queue
    /// if `cancel` fires before room frees up (or had already fired).
    pub fn put_with(&self, item: Item<T>, cancel: &CancelToken) -> Result<()> {
        self.put_with_deadline(item, Some(cancel), None)
    }

    /// Like `take`, but returns `Error::Cancelled` without mutating the queue
    /// if `cancel` fires before an item arrives (or had already fired).
    pub fn take_with(&self, cancel: &CancelToken) -> Result<Item<T>> {
        self.take_with_deadline(Some(cancel), None)
    }

    /// General blocking `put`: optional cancellation, optional deadline.
    pub fn put_with_deadline(
        &self,
        item: Item<T>,
        cancel: Option<&CancelToken>,
        deadline: Option<Instant>,
    ) -> Result<()> {
        match cancel {
            Some(cancel) => self.watch(cancel).put(item, deadline),
            None => self.put_inner(item, None, deadline),
        }
    }

    /// General blocking `take`: optional cancellation, optional deadline.
    pub fn take_with_deadline(
        &self,
        cancel: Option<&CancelToken>,
        deadline: Option<Instant>,
    ) -> Result<Item<T>> {
        match cancel {
            Some(cancel) => self.watch(cancel).take(deadline),
            None => self.take_inner(None, deadline),
        }
    }

    /// Register this queue with `cancel` once and return a handle whose
    /// calls observe the token without registering again.
    ///
    /// Loops that move many items under one token should hold a `Watched`
    /// for their whole run.
    pub fn watch<'a>(&'a self, cancel: &'a CancelToken) -> Watched<'a, T> {
        cancel.register(self.listener());
        Watched {
            queue: self,
            cancel,
        }
    }

    fn listener(&self) -> Weak<dyn Interrupt> {
        let weak: Weak<Shared<T>> = Arc::downgrade(&self.shared);
        weak
    }
}

/// A queue already registered with a `CancelToken`.
///
/// Every `put`/`take` fails with `Error::Cancelled`, without mutating the
/// queue, once the token fires.
pub struct Watched<'a, T> {
    queue: &'a BoundedQueue<T>,
    cancel: &'a CancelToken,
}

impl<T> Watched<'_, T> {
    /// Blocking `put`, bounded by `deadline` when given.
    pub fn put(&self, item: Item<T>, deadline: Option<Instant>) -> Result<()> {
        self.queue.put_inner(item, Some(self.cancel), deadline)
    }

    /// Blocking `take`, bounded by `deadline` when given.
    pub fn take(&self, deadline: Option<Instant>) -> Result<Item<T>> {
        self.queue.take_inner(Some(self.cancel), deadline)
    }

    pub fn queue(&self) -> &BoundedQueue<T> {
        self.queue
    }
}

impl<T> fmt::Debug for BoundedQueue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.shared.lock();
        f.debug_struct("BoundedQueue")
            .field("capacity", &self.shared.capacity)
            .field("size", &state.items.len())
            .field("closed", &state.closed)
            .finish()
    }
}

/// Rejected `try_put`; carries the item back to the caller.
#[derive(Debug)]
pub enum TryPutError<T> {
    Full(Item<T>),
    Closed(Item<T>),
}

impl<T> TryPutError<T> {
    pub fn into_inner(self) -> Item<T> {
        match self {
            TryPutError::Full(item) | TryPutError::Closed(item) => item,
        }
    }

    pub fn is_full(&self) -> bool {
        matches!(self, TryPutError::Full(_))
    }
}

impl<T> fmt::Display for TryPutError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TryPutError::Full(_) => f.write_str("queue is full"),
            TryPutError::Closed(_) => f.write_str("queue is closed"),
        }
    }
}

impl<T: fmt::Debug> std::error::Error for TryPutError<T> {}
