//! Convenient re-exports for downstream crates.

pub use crate::config::ExportConfig;
pub use crate::error::{Error, Result};
pub use crate::format::{canonical_date, format_field};
pub use crate::line::{render_all, LineAssembler};
pub use crate::schema::{ColumnDescriptor, ColumnType, Schema};
pub use crate::types::{FieldRef, Record, Value};
