#![forbid(unsafe_code)]
//! conveyor-exec: producer/consumer roles and the pipeline driver.
//!
//! A `Pipeline` builds a `BoundedQueue`, runs one `Producer` and one
//! `Consumer` on their own threads, joins both and returns the destination
//! with a `PipelineReport`. The roles never call each other; the queue is
//! their only channel.

pub mod consumer;
pub mod metrics;
pub mod producer;
pub mod report;
pub mod runtime;

pub use consumer::Consumer;
pub use producer::Producer;
pub use report::{ConsumerReport, PipelineReport, ProducerReport, Role, RoleStatus};
pub use runtime::{ExecError, Pipeline, PipelineRun};
