//! Convenient re-exports for downstream crates.

pub use crate::cancel::{CancelToken, Interrupt};
pub use crate::config::PipelineConfig;
pub use crate::error::{Error, Result};
pub use crate::item::Item;
