//! Bridge factory and the abort state shared by both ports.
//!
//! The two ports are joined by one bounded `tokio::sync::mpsc` queue of
//! records sized by `high_water_mark`. Formatting happens lazily on the
//! output side, one record per requested line, so the queue is the only
//! buffer in the bridge and a slow consumer fills it, which in turn
//! suspends (or pauses) the producer.

use std::sync::Arc;

use tokio::sync::{mpsc, watch};

use rowcast_core::{ExportConfig, LineAssembler};

use crate::error::StreamError;
use crate::metrics::emit_span;
use crate::sink::RecordSink;
use crate::source::LineSource;

/// Validate `config` and open a connected input/output port pair.
///
/// Configuration errors are returned here, before any record is accepted.
pub fn open(config: ExportConfig) -> rowcast_core::Result<(RecordSink, LineSource)> {
    let schema = Arc::new(config.validate()?);
    let assembler = LineAssembler::new(schema, &config);
    let (tx, rx) = mpsc::channel(config.high_water_mark);
    let abort = AbortSignal::new();

    emit_span(
        "open",
        &[
            ("columns", config.columns.len().to_string()),
            ("high_water_mark", config.high_water_mark.to_string()),
            ("show_headers", config.show_headers.to_string()),
        ],
    );

    Ok((
        RecordSink::new(tx, abort.clone()),
        LineSource::new(rx, assembler, abort),
    ))
}

/// First-error-wins terminal state visible to both ports.
#[derive(Debug, Clone)]
pub(crate) struct AbortSignal {
    tx: Arc<watch::Sender<Option<StreamError>>>,
}

impl AbortSignal {
    pub(crate) fn new() -> Self {
        let (tx, _rx) = watch::channel(None);
        Self { tx: Arc::new(tx) }
    }

    /// Record `err` as the terminal error. Returns false if one was already set.
    pub(crate) fn trigger(&self, err: StreamError) -> bool {
        let mut err = Some(err);
        let set = self.tx.send_if_modified(|slot| {
            if slot.is_none() {
                *slot = err.take();
                true
            } else {
                false
            }
        });
        if set {
            let reason = self.current().map(|e| e.to_string()).unwrap_or_default();
            emit_span("abort", &[("reason", reason)]);
        }
        set
    }

    pub(crate) fn current(&self) -> Option<StreamError> {
        self.tx.borrow().clone()
    }

    /// Resolves once an error has been triggered.
    pub(crate) async fn triggered(&self) -> StreamError {
        let mut rx = self.tx.subscribe();
        loop {
            let current = rx.borrow_and_update().clone();
            if let Some(err) = current {
                return err;
            }
            if rx.changed().await.is_err() {
                return StreamError::Closed;
            }
        }
    }
}
