#![forbid(unsafe_code)]
//! conveyor: a bounded blocking queue and the single-producer/single-consumer
//! pipeline built on it.
//!
//! This facade re-exports the member crates so integration tests, benches and
//! downstream users can depend on one name.

pub use conveyor_core::{CancelToken, Error, Interrupt, Item, PipelineConfig, Result};
pub use conveyor_exec::{
    Consumer, ConsumerReport, ExecError, Pipeline, PipelineReport, PipelineRun, Producer,
    ProducerReport, Role, RoleStatus,
};
pub use conveyor_queue::{BoundedQueue, QueueStats, TryPutError, Watched};
