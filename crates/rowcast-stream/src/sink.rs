//! Input port: accepts records by direct call or by draining an upstream stream.

use std::fmt::Display;

use futures::{Stream, StreamExt};
use tokio::sync::mpsc::{self, error::TrySendError};

use rowcast_core::Record;

use crate::bridge::AbortSignal;
use crate::error::{StreamError, TryWriteError};
use crate::metrics::emit_span;

/// Flow-control hint returned by [`RecordSink::write`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteStatus {
    /// Keep writing.
    Ready,
    /// The queue reached its high-water mark; wait for [`RecordSink::ready`].
    Pause,
}

/// Record-consuming half of the bridge.
///
/// Cloning gives another producer handle on the same queue. Input is closed
/// once every handle has been closed or dropped.
#[derive(Debug, Clone)]
pub struct RecordSink {
    tx: mpsc::Sender<Record>,
    abort: AbortSignal,
}

impl RecordSink {
    pub(crate) fn new(tx: mpsc::Sender<Record>, abort: AbortSignal) -> Self {
        Self { tx, abort }
    }

    /// Enqueue one record, suspending while the queue is at its high-water mark.
    pub async fn accept(&self, record: Record) -> Result<(), StreamError> {
        if let Some(err) = self.abort.current() {
            return Err(err);
        }
        tokio::select! {
            biased;
            err = self.abort.triggered() => Err(err),
            res = self.tx.send(record) => res.map_err(|_| self.closed_error()),
        }
    }

    /// Enqueue one record without suspending.
    ///
    /// A full queue hands the record back in [`TryWriteError::Full`]; after a
    /// successful write, [`WriteStatus::Pause`] says the queue just filled up.
    pub fn write(&self, record: Record) -> Result<WriteStatus, TryWriteError> {
        if let Some(err) = self.abort.current() {
            return Err(TryWriteError::Aborted(err));
        }
        match self.tx.try_send(record) {
            Ok(()) if self.tx.capacity() == 0 => {
                emit_span("pause", &[("queued", self.queued().to_string())]);
                Ok(WriteStatus::Pause)
            }
            Ok(()) => Ok(WriteStatus::Ready),
            Err(TrySendError::Full(r)) => Err(TryWriteError::Full(r)),
            Err(TrySendError::Closed(r)) => match self.abort.current() {
                Some(err) => Err(TryWriteError::Aborted(err)),
                None => Err(TryWriteError::Closed(r)),
            },
        }
    }

    /// Resume signal: completes once the queue has room for another record.
    pub async fn ready(&self) -> Result<(), StreamError> {
        if let Some(err) = self.abort.current() {
            return Err(err);
        }
        tokio::select! {
            biased;
            err = self.abort.triggered() => Err(err),
            res = self.tx.reserve() => res.map(drop).map_err(|_| self.closed_error()),
        }
    }

    /// Records currently waiting to be formatted.
    pub fn queued(&self) -> usize {
        self.tx.max_capacity() - self.tx.capacity()
    }

    pub fn high_water_mark(&self) -> usize {
        self.tx.max_capacity()
    }

    /// True once the output port is gone (finished, failed or dropped).
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    /// Drain `upstream` into this port, then close this handle.
    ///
    /// `upstream` is only polled when the queue has room, so a slow consumer
    /// pauses the upstream producer. An upstream error aborts the bridge.
    pub async fn pipe_from<S, E>(self, upstream: S) -> Result<u64, StreamError>
    where
        S: Stream<Item = Result<Record, E>>,
        E: Display,
    {
        futures::pin_mut!(upstream);
        let mut accepted = 0u64;
        while let Some(item) = upstream.next().await {
            match item {
                Ok(record) => {
                    self.accept(record).await?;
                    accepted += 1;
                }
                Err(e) => {
                    let err = StreamError::Upstream(e.to_string());
                    self.abort.trigger(err.clone());
                    return Err(err);
                }
            }
        }
        self.close();
        Ok(accepted)
    }

    /// End of input from this handle.
    pub fn close(self) {
        emit_span("input_closed", &[("queued", self.queued().to_string())]);
    }

    /// Fatal cancellation; both ports stop and no further line is emitted.
    pub fn abort(&self, reason: impl Into<String>) {
        self.abort.trigger(StreamError::Aborted(reason.into()));
    }

    fn closed_error(&self) -> StreamError {
        self.abort.current().unwrap_or(StreamError::Closed)
    }
}
