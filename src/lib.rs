#![forbid(unsafe_code)]
//! rowcast: schema-driven export of loosely-typed records to delimited text
//! lines, behind a backpressure-aware input/output port pair.
//!
//! ```no_run
//! use rowcast::prelude::*;
//!
//! # async fn run() -> std::result::Result<(), Box<dyn std::error::Error>> {
//! let config = ExportConfig::new(vec![
//!     ColumnDescriptor::new("id", ColumnType::Number),
//!     ColumnDescriptor::new("name", ColumnType::String),
//! ]);
//! let (sink, source) = rowcast::open(config)?;
//!
//! let produce = async move {
//!     sink.accept(Record::new().with("id", 1).with("name", "a")).await?;
//!     sink.close();
//!     Ok::<_, StreamError>(())
//! };
//! let consume = source.subscribe(|line, ack| {
//!     print!("{line}");
//!     ack.ack();
//! });
//! let (produced, done) = tokio::join!(produce, consume);
//! produced?;
//! done?;
//! # Ok(())
//! # }
//! ```

pub use rowcast_core::{
    config, format, line, schema, types, ColumnDescriptor, ColumnType, Error, ExportConfig,
    FieldRef, LineAssembler, Record, Result, Schema, Value,
};
pub use rowcast_stream::{
    open, Ack, Completion, LineSource, Output, RecordSink, StreamError, TryWriteError,
    WriteStatus,
};

pub mod prelude {
    //! Everything needed to configure, feed and drain an export.
    pub use rowcast_core::prelude::*;
    pub use rowcast_stream::{
        open, Ack, Completion, LineSource, Output, RecordSink, StreamError, TryWriteError,
        WriteStatus,
    };
}
