#![forbid(unsafe_code)]
//! rowcast-stream: the record-in / line-out streaming bridge.
//!
//! [`open`] validates an [`ExportConfig`](rowcast_core::ExportConfig) and
//! returns two ports joined by a bounded queue:
//! - [`RecordSink`]: `accept`/`write`/`ready`/`pipe_from`/`close`/`abort`
//! - [`LineSource`]: `next_line`/`into_stream`/`pipe_to`/`subscribe`/`get_output`
//!
//! Scheduling is cooperative: no task is spawned, and both ports only make
//! progress when their owners poll them. Lines come out in the order records
//! were accepted.

pub mod bridge;
pub mod error;
pub mod metrics;
pub mod sink;
pub mod source;

pub use bridge::open;
pub use error::{StreamError, TryWriteError};
pub use sink::{RecordSink, WriteStatus};
pub use source::{Ack, Completion, LineSource, Output};
