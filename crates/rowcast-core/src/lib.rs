#![forbid(unsafe_code)]
//! rowcast-core: column schema, record values, field formatting and line assembly.
//!
//! Everything here is synchronous and free of I/O. The streaming ports live in
//! `rowcast-stream` and drive a [`line::LineAssembler`] one record at a time.

pub mod config;
pub mod error;
pub mod format;
pub mod line;
pub mod prelude;
pub mod schema;
pub mod types;

pub use config::ExportConfig;
pub use error::{Error, Result};
pub use line::LineAssembler;
pub use schema::{ColumnDescriptor, ColumnType, Schema};
pub use types::{FieldRef, Record, Value};
