use thiserror::Error;

/// Canonical result for core and the queue.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// Construction-time failure; no queue was created.
    #[error("capacity must be positive, but was {requested}")]
    InvalidCapacity { requested: i64 },

    /// A blocking call stopped waiting because its `CancelToken` fired.
    /// The queue was not mutated.
    #[error("blocking queue operation cancelled")]
    Cancelled,

    /// A bounded wait elapsed. The queue was not mutated.
    #[error("timed out waiting on queue")]
    Timeout,

    /// `put` on a queue that has been closed.
    #[error("queue is closed")]
    Closed,

    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Config(e.to_string())
    }
}
