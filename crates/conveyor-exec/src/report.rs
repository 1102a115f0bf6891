//! Outcome reports for the two roles and the whole run.

use std::fmt;
use std::time::Duration;

use conveyor_core::error::Error;
use conveyor_queue::QueueStats;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Producer,
    Consumer,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Producer => f.write_str("producer"),
            Role::Consumer => f.write_str("consumer"),
        }
    }
}

/// How a role's loop ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoleStatus {
    /// Producer enqueued every item plus the marker; consumer saw the marker.
    Completed,
    /// The loop stopped early because a queue call failed
    /// (`Cancelled`, `Timeout` or `Closed`).
    Stopped(Error),
}

impl RoleStatus {
    pub fn is_completed(&self) -> bool {
        matches!(self, RoleStatus::Completed)
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, RoleStatus::Stopped(Error::Cancelled))
    }

    pub fn is_timed_out(&self) -> bool {
        matches!(self, RoleStatus::Stopped(Error::Timeout))
    }
}

impl fmt::Display for RoleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoleStatus::Completed => f.write_str("completed"),
            RoleStatus::Stopped(e) => write!(f, "stopped ({e})"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProducerReport {
    pub status: RoleStatus,
    /// Payload items enqueued (the end-of-stream marker is not counted).
    pub produced: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsumerReport {
    pub status: RoleStatus,
    /// Payload items appended to the destination.
    pub consumed: usize,
}

#[derive(Debug, Clone)]
pub struct PipelineReport {
    pub producer: ProducerReport,
    pub consumer: ConsumerReport,
    pub queue: QueueStats,
    pub elapsed: Duration,
}

impl PipelineReport {
    pub fn is_completed(&self) -> bool {
        self.producer.status.is_completed() && self.consumer.status.is_completed()
    }

    pub fn is_cancelled(&self) -> bool {
        self.producer.status.is_cancelled() || self.consumer.status.is_cancelled()
    }
}
