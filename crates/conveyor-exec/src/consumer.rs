//! Consumer: drains the queue into a destination until end-of-stream.

use std::time::{Duration, Instant};

use conveyor_core::cancel::CancelToken;
use conveyor_core::item::Item;
use conveyor_queue::BoundedQueue;

use crate::report::{ConsumerReport, RoleStatus};

/// Appends every `Item::Value` to `destination` in arrival order and stops
/// on `Item::EndOfStream` without appending anything for it.
///
/// If a `take` fails the loop stops and whatever was appended so far stays
/// in the destination.
pub struct Consumer<'d, T, D> {
    queue: BoundedQueue<T>,
    destination: &'d mut D,
    cancel: CancelToken,
    take_timeout: Option<Duration>,
}

impl<'d, T, D> Consumer<'d, T, D>
where
    T: Send + 'static,
    D: Extend<T>,
{
    pub fn new(queue: BoundedQueue<T>, destination: &'d mut D) -> Self {
        Self {
            queue,
            destination,
            cancel: CancelToken::new(),
            take_timeout: None,
        }
    }

    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Bound every individual `take` by `timeout`.
    pub fn with_take_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.take_timeout = timeout;
        self
    }

    pub fn run(mut self) -> ConsumerReport {
        #[cfg(feature = "tracing")]
        tracing::debug!(capacity = self.queue.capacity(), "consumer started");

        let watched = self.queue.watch(&self.cancel);
        let mut consumed = 0;
        loop {
            let deadline = self
                .take_timeout
                .and_then(|t| Instant::now().checked_add(t));
            match watched.take(deadline) {
                Ok(Item::Value(value)) => {
                    self.destination.extend(std::iter::once(value));
                    consumed += 1;
                }
                Ok(Item::EndOfStream) => break,
                Err(e) => {
                    #[cfg(feature = "tracing")]
                    tracing::warn!(consumed, error = %e, "consumer stopped");
                    return ConsumerReport {
                        status: RoleStatus::Stopped(e),
                        consumed,
                    };
                }
            }
        }

        #[cfg(feature = "tracing")]
        tracing::debug!(consumed, "consumer finished");

        ConsumerReport {
            status: RoleStatus::Completed,
            consumed,
        }
    }
}
