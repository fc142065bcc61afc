use thiserror::Error;

use rowcast_core::Record;

/// Fatal runtime error. Cloneable so both ports can report the same cause.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StreamError {
    #[error("stream aborted: {0}")]
    Aborted(String),

    #[error("upstream failed: {0}")]
    Upstream(String),

    #[error("downstream failed: {0}")]
    Downstream(String),

    #[error("line was dropped without being acknowledged")]
    Unacknowledged,

    #[error("the other port is closed")]
    Closed,
}

/// Failure of the non-suspending [`crate::RecordSink::write`]. The record is
/// handed back whenever it was not enqueued because of flow control.
#[derive(Debug, Error)]
pub enum TryWriteError {
    #[error("input queue is at its high-water mark")]
    Full(Record),

    #[error("output port is closed")]
    Closed(Record),

    #[error(transparent)]
    Aborted(#[from] StreamError),
}

impl TryWriteError {
    /// Recover the record that was not enqueued, if any.
    pub fn into_record(self) -> Option<Record> {
        match self {
            TryWriteError::Full(r) | TryWriteError::Closed(r) => Some(r),
            TryWriteError::Aborted(_) => None,
        }
    }
}
