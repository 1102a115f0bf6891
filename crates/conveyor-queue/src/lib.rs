#![forbid(unsafe_code)]
//! conveyor-queue: bounded blocking FIFO queue.
//!
//! `BoundedQueue<T>` holds at most `capacity` items behind one mutex and two
//! condition variables. `put` suspends while the queue is full, `take` while
//! it is empty. Both can be interrupted by a `CancelToken` or a deadline, and
//! an interrupted call never mutates the queue.

pub mod queue;
pub mod tracking;

pub use queue::{BoundedQueue, TryPutError, Watched};
pub use tracking::{PeakTracker, QueueStats};
