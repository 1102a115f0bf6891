#![forbid(unsafe_code)]
//! conveyor-core: shared vocabulary for the queue and the pipeline roles.
//!
//! Responsibilities:
//! - The tagged `Item<T>` that keeps end-of-stream out of the payload type.
//! - The error taxonomy every blocking call reports through.
//! - `CancelToken`, the external signal that interrupts blocked waits.
//! - `PipelineConfig`, serializable and loadable from the environment.
//!
//! **No threads, no locks on payloads** here. The queue crate owns all shared state.

pub mod cancel;
pub mod config;
pub mod error;
pub mod item;
pub mod prelude;

pub use cancel::{CancelToken, Interrupt};
pub use config::PipelineConfig;
pub use error::{Error, Result};
pub use item::Item;
