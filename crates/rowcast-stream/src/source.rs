//! Output port: pull lines, pipe them into a sink, or hand them to a callback
//! that acknowledges each one.

use std::fmt::Display;

use futures::future::{poll_fn, BoxFuture};
use futures::stream::BoxStream;
use futures::{FutureExt, Sink, SinkExt, Stream, StreamExt};
use tokio::sync::{mpsc, oneshot};

use rowcast_core::{LineAssembler, Record};

use crate::bridge::AbortSignal;
use crate::error::StreamError;
use crate::metrics::emit_span;

/// "Finished" signal: input closed and every line delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Completion {
    /// Data records formatted.
    pub records: u64,
    /// Lines delivered, header included.
    pub lines: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Open,
    /// Input closed and drained; delivery not yet confirmed.
    Drained,
    Finished,
    Failed,
}

/// Acknowledgment token handed to a callback with each line.
///
/// The next line is not formatted until [`Ack::ack`] is called. Dropping the
/// token without acknowledging aborts the stream.
#[derive(Debug)]
pub struct Ack {
    tx: oneshot::Sender<()>,
}

impl Ack {
    fn pair() -> (Self, oneshot::Receiver<()>) {
        let (tx, rx) = oneshot::channel();
        (Self { tx }, rx)
    }

    pub fn ack(self) {
        let _ = self.tx.send(());
    }
}

/// Result of [`LineSource::get_output`].
pub enum Output {
    /// Pipeable mode: a stream of lines.
    Pipe(BoxStream<'static, Result<String, StreamError>>),
    /// Callback mode: drive this future to completion.
    Callback(BoxFuture<'static, Result<Completion, StreamError>>),
}

/// Line-producing half of the bridge.
#[derive(Debug)]
pub struct LineSource {
    rx: mpsc::Receiver<Record>,
    assembler: LineAssembler,
    abort: AbortSignal,
    state: State,
    records: u64,
    lines: u64,
}

impl LineSource {
    pub(crate) fn new(
        rx: mpsc::Receiver<Record>,
        assembler: LineAssembler,
        abort: AbortSignal,
    ) -> Self {
        Self {
            rx,
            assembler,
            abort,
            state: State::Open,
            records: 0,
            lines: 0,
        }
    }

    /// Pull the next line, waiting for input if the queue is empty.
    ///
    /// The header (when enabled) comes first. Returns `None` once input is
    /// closed and drained, and after the first error.
    pub async fn next_line(&mut self) -> Option<Result<String, StreamError>> {
        let item = self.pull().await;
        if item.is_none() {
            self.finish();
        }
        item
    }

    async fn pull(&mut self) -> Option<Result<String, StreamError>> {
        if self.state != State::Open {
            return None;
        }
        if let Some(err) = self.abort.current() {
            return Some(Err(self.fail(err)));
        }
        if let Some(header) = self.assembler.take_header() {
            self.lines += 1;
            return Some(Ok(header));
        }

        let next = tokio::select! {
            biased;
            err = self.abort.triggered() => Err(err),
            record = self.rx.recv() => Ok(record),
        };

        match next {
            Err(err) => Some(Err(self.fail(err))),
            Ok(Some(record)) => {
                let line = self.assembler.assemble(&record);
                self.records += 1;
                self.lines += 1;
                #[cfg(feature = "tracing")]
                tracing::trace!(record = self.records, bytes = line.len(), "line formatted");
                Some(Ok(line))
            }
            Ok(None) => {
                self.state = State::Drained;
                None
            }
        }
    }

    /// Pipeable mode as a `Stream`; lines are formatted only when polled.
    pub fn into_stream(self) -> impl Stream<Item = Result<String, StreamError>> + Send {
        futures::stream::unfold(self, |mut source| async move {
            source.next_line().await.map(|item| (item, source))
        })
    }

    /// Pipeable mode into any sink of lines.
    ///
    /// A line is formatted only after the sink reports readiness, so a sink
    /// that stops accepting eventually stalls the input port. Waiting on the
    /// sink still observes an abort. The sink is closed (flushed) on normal
    /// completion.
    pub async fn pipe_to<S>(mut self, sink: S) -> Result<Completion, StreamError>
    where
        S: Sink<String> + Unpin,
        S::Error: Display,
    {
        self.drive_into(sink).await
    }

    async fn drive_into<S>(&mut self, mut sink: S) -> Result<Completion, StreamError>
    where
        S: Sink<String> + Unpin,
        S::Error: Display,
    {
        loop {
            let ready = tokio::select! {
                biased;
                err = self.abort.triggered() => Err(err),
                res = poll_fn(|cx| sink.poll_ready_unpin(cx)) => res.map_err(downstream),
            };
            if let Err(err) = ready {
                return Err(self.fail(err));
            }

            let line = match self.pull().await {
                Some(item) => item?,
                None => break,
            };
            if let Err(e) = sink.start_send_unpin(line) {
                return Err(self.fail(downstream(e)));
            }

            let flushed = tokio::select! {
                biased;
                err = self.abort.triggered() => Err(err),
                res = sink.flush() => res.map_err(downstream),
            };
            if let Err(err) = flushed {
                return Err(self.fail(err));
            }
        }
        if let Err(e) = sink.close().await {
            return Err(self.fail(downstream(e)));
        }
        self.finish();
        Ok(self.completion())
    }

    /// Callback mode: `callback(line, ack)` per line, one line in flight.
    pub async fn subscribe<F>(mut self, mut callback: F) -> Result<Completion, StreamError>
    where
        F: FnMut(String, Ack),
    {
        while let Some(item) = self.pull().await {
            let line = item?;
            let (ack, acked) = Ack::pair();
            callback(line, ack);

            let outcome = tokio::select! {
                biased;
                err = self.abort.triggered() => Err(err),
                res = acked => res.map_err(|_| StreamError::Unacknowledged),
            };
            if let Err(err) = outcome {
                return Err(self.fail(err));
            }
        }
        self.finish();
        Ok(self.completion())
    }

    /// Single entry point: callback mode when `callback` is given, pipeable otherwise.
    pub fn get_output<F>(self, callback: Option<F>) -> Output
    where
        F: FnMut(String, Ack) + Send + 'static,
    {
        match callback {
            Some(cb) => Output::Callback(self.subscribe(cb).boxed()),
            None => Output::Pipe(self.into_stream().boxed()),
        }
    }

    /// Fatal cancellation from the output side.
    pub fn abort(&self, reason: impl Into<String>) {
        self.abort.trigger(StreamError::Aborted(reason.into()));
    }

    pub fn is_finished(&self) -> bool {
        self.state == State::Finished
    }

    pub fn completion(&self) -> Completion {
        Completion {
            records: self.records,
            lines: self.lines,
        }
    }

    /// Report "finish" once, and only after every line was delivered.
    fn finish(&mut self) {
        if self.state != State::Drained {
            return;
        }
        self.state = State::Finished;
        emit_span(
            "finish",
            &[
                ("records", self.records.to_string()),
                ("lines", self.lines.to_string()),
            ],
        );
    }

    fn fail(&mut self, err: StreamError) -> StreamError {
        self.abort.trigger(err.clone());
        self.state = State::Failed;
        // Queued records are discarded; producers now see a closed port.
        self.rx.close();
        err
    }
}

fn downstream<E: Display>(e: E) -> StreamError {
    StreamError::Downstream(e.to_string())
}
