//! Producer: feeds a finite source through the queue, then the marker.

use std::time::{Duration, Instant};

use conveyor_core::prelude::{CancelToken, Error, Item, Result};
use conveyor_queue::BoundedQueue;

use crate::report::{ProducerReport, RoleStatus};

/// Delivers every element of `source`, in order, followed by exactly one
/// `Item::EndOfStream`.
///
/// If a `put` fails (cancelled, timed out or closed) the producer stops at
/// once, does not enqueue the marker and reports the failure as its status.
pub struct Producer<T, I> {
    source: I,
    queue: BoundedQueue<T>,
    cancel: CancelToken,
    put_timeout: Option<Duration>,
}

impl<T, I> Producer<T, I>
where
    T: Send + 'static,
    I: IntoIterator<Item = T>,
{
    pub fn new(source: I, queue: BoundedQueue<T>) -> Self {
        Self {
            source,
            queue,
            cancel: CancelToken::new(),
            put_timeout: None,
        }
    }

    /// Stop waiting (with `Cancelled`) once `cancel` fires.
    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Bound every individual `put` by `timeout`.
    pub fn with_put_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.put_timeout = timeout;
        self
    }

    pub fn run(self) -> ProducerReport {
        let Self {
            source,
            queue,
            cancel,
            put_timeout,
        } = self;
        let watched = queue.watch(&cancel);
        let put = |item: Item<T>| -> Result<()> {
            let deadline = put_timeout.and_then(|t| Instant::now().checked_add(t));
            watched.put(item, deadline)
        };

        #[cfg(feature = "tracing")]
        tracing::debug!(capacity = queue.capacity(), "producer started");

        let mut produced = 0;
        for value in source {
            if let Err(e) = put(Item::Value(value)) {
                return stopped(produced, e);
            }
            produced += 1;
        }
        if let Err(e) = put(Item::EndOfStream) {
            return stopped(produced, e);
        }

        #[cfg(feature = "tracing")]
        tracing::debug!(produced, "producer finished");

        ProducerReport {
            status: RoleStatus::Completed,
            produced,
        }
    }
}

fn stopped(produced: usize, err: Error) -> ProducerReport {
    #[cfg(feature = "tracing")]
    tracing::warn!(produced, error = %err, "producer stopped");
    ProducerReport {
        status: RoleStatus::Stopped(err),
        produced,
    }
}
