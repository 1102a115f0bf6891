//! Runtime: run one producer and one consumer over a fresh bounded queue.
//!
//! Behavior:
//! - Validates the `PipelineConfig` and builds the queue before any thread
//!   starts, so construction errors surface synchronously.
//! - Spawns two named scoped threads and joins both.
//! - A role that stops early (or panics) closes the queue so the other
//!   role cannot stay blocked on it.
//! - Returns the destination contents with a `PipelineReport`.

use std::thread;
use std::time::Instant;

use thiserror::Error;

use conveyor_core::cancel::CancelToken;
use conveyor_core::config::PipelineConfig;
use conveyor_queue::BoundedQueue;

use crate::consumer::Consumer;
use crate::metrics::emit_span;
use crate::producer::Producer;
use crate::report::{ConsumerReport, PipelineReport, ProducerReport, Role};

#[derive(Debug, Error)]
pub enum ExecError {
    #[error("queue: {0}")]
    Queue(#[from] conveyor_core::Error),
    #[error("failed to spawn {role} thread: {source}")]
    Spawn {
        role: Role,
        #[source]
        source: std::io::Error,
    },
    #[error("{0} thread panicked")]
    Panicked(Role),
}

/// Destination contents plus the run report.
#[derive(Debug)]
pub struct PipelineRun<T> {
    pub destination: Vec<T>,
    pub report: PipelineReport,
}

/// Driver for a single-producer/single-consumer run.
pub struct Pipeline {
    cfg: PipelineConfig,
}

impl Pipeline {
    pub fn new(cfg: PipelineConfig) -> Self {
        Self { cfg }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.cfg
    }

    /// Move every element of `source` into a new `Vec` through the queue.
    pub fn run<T, I>(&self, source: I) -> Result<PipelineRun<T>, ExecError>
    where
        T: Send + 'static,
        I: IntoIterator<Item = T> + Send,
    {
        self.run_with_cancel(source, &CancelToken::new())
    }

    /// Like `run`, but both roles stop waiting once `cancel` fires.
    pub fn run_with_cancel<T, I>(
        &self,
        source: I,
        cancel: &CancelToken,
    ) -> Result<PipelineRun<T>, ExecError>
    where
        T: Send + 'static,
        I: IntoIterator<Item = T> + Send,
    {
        let mut destination = Vec::new();
        let report = self.run_into(source, &mut destination, cancel)?;
        Ok(PipelineRun {
            destination,
            report,
        })
    }

    /// Run the pipeline, appending to a caller-owned destination.
    ///
    /// On cancellation the destination keeps whatever arrived before the
    /// consumer stopped.
    pub fn run_into<T, I, D>(
        &self,
        source: I,
        destination: &mut D,
        cancel: &CancelToken,
    ) -> Result<PipelineReport, ExecError>
    where
        T: Send + 'static,
        I: IntoIterator<Item = T> + Send,
        D: Extend<T> + Send,
    {
        self.cfg.validate()?;
        let queue = BoundedQueue::<T>::new(self.cfg.capacity)?;
        let started = Instant::now();

        let producer = Producer::new(source, queue.clone())
            .with_cancel(cancel.clone())
            .with_put_timeout(self.cfg.put_timeout());
        let consumer = Consumer::new(queue.clone(), destination)
            .with_cancel(cancel.clone())
            .with_take_timeout(self.cfg.take_timeout());

        let (producer, consumer) = thread::scope(
            |s| -> Result<(ProducerReport, ConsumerReport), ExecError> {
                let prefix = &self.cfg.thread_name_prefix;

                let producer_queue = queue.clone();
                let producer = thread::Builder::new()
                    .name(format!("{prefix}-producer"))
                    .spawn_scoped(s, move || {
                        let _guard = CloseOnPanic(&producer_queue);
                        let report = producer.run();
                        if !report.status.is_completed() {
                            producer_queue.close();
                        }
                        report
                    })
                    .map_err(|source| ExecError::Spawn {
                        role: Role::Producer,
                        source,
                    })?;

                let consumer_queue = queue.clone();
                let consumer = match thread::Builder::new()
                    .name(format!("{prefix}-consumer"))
                    .spawn_scoped(s, move || {
                        let _guard = CloseOnPanic(&consumer_queue);
                        let report = consumer.run();
                        if !report.status.is_completed() {
                            consumer_queue.close();
                        }
                        report
                    }) {
                    Ok(handle) => handle,
                    Err(source) => {
                        // Nobody will drain the queue; unblock the producer.
                        queue.close();
                        let _ = producer.join();
                        return Err(ExecError::Spawn {
                            role: Role::Consumer,
                            source,
                        });
                    }
                };

                let producer = producer
                    .join()
                    .map_err(|_| ExecError::Panicked(Role::Producer));
                let consumer = consumer
                    .join()
                    .map_err(|_| ExecError::Panicked(Role::Consumer));
                Ok((producer?, consumer?))
            },
        )?;

        let report = PipelineReport {
            producer,
            consumer,
            queue: queue.stats(),
            elapsed: started.elapsed(),
        };

        emit_span(
            "pipeline_run",
            &[
                ("capacity", queue.capacity().to_string()),
                ("produced", report.producer.produced.to_string()),
                ("consumed", report.consumer.consumed.to_string()),
                ("producer_status", report.producer.status.to_string()),
                ("consumer_status", report.consumer.status.to_string()),
                ("peak_occupancy", report.queue.peak_occupancy.to_string()),
                ("elapsed_us", report.elapsed.as_micros().to_string()),
            ],
        );

        Ok(report)
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new(PipelineConfig::default())
    }
}

/// Closes the queue if the owning thread unwinds, so the peer role wakes up.
struct CloseOnPanic<'a, T>(&'a BoundedQueue<T>);

impl<T> Drop for CloseOnPanic<'_, T> {
    fn drop(&mut self) {
        if thread::panicking() {
            self.0.close();
        }
    }
}
