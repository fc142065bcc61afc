//! Line assembler: records (and the optional header) -> delimited lines.
//!
//! Every line carries exactly `schema.len()` fields and ends with exactly one
//! row delimiter. The only state is the "header already emitted" flag.

use std::sync::Arc;

use crate::config::ExportConfig;
use crate::error::Result;
use crate::format::write_field;
use crate::schema::Schema;
use crate::types::Record;

#[derive(Debug, Clone)]
pub struct LineAssembler {
    schema: Arc<Schema>,
    column_delimiter: String,
    row_delimiter: String,
    show_headers: bool,
    header_emitted: bool,
}

impl LineAssembler {
    pub fn new(schema: Arc<Schema>, config: &ExportConfig) -> Self {
        Self {
            schema,
            column_delimiter: config.column_delimiter.clone(),
            row_delimiter: config.row_delimiter.clone(),
            show_headers: config.show_headers,
            header_emitted: false,
        }
    }

    /// Validate `config` and build an assembler over its schema.
    pub fn from_config(config: &ExportConfig) -> Result<Self> {
        let schema = Arc::new(config.validate()?);
        Ok(Self::new(schema, config))
    }

    /// Column names joined by the column delimiter, terminated by the row delimiter.
    pub fn header_line(&self) -> String {
        let mut line = String::new();
        for (i, name) in self.schema.names().enumerate() {
            if i > 0 {
                line.push_str(&self.column_delimiter);
            }
            line.push_str(name);
        }
        line.push_str(&self.row_delimiter);
        line
    }

    /// The header, at most once per assembler and only when headers are on.
    pub fn take_header(&mut self) -> Option<String> {
        if !self.show_headers || self.header_emitted {
            return None;
        }
        self.header_emitted = true;
        Some(self.header_line())
    }

    pub fn header_emitted(&self) -> bool {
        self.header_emitted
    }

    /// Format one record in schema column order.
    pub fn assemble(&self, record: &Record) -> String {
        let mut line = String::with_capacity(self.schema.len() * 8);
        for (i, column) in self.schema.columns().iter().enumerate() {
            if i > 0 {
                line.push_str(&self.column_delimiter);
            }
            write_field(&mut line, record.get(&column.name), column);
        }
        line.push_str(&self.row_delimiter);
        line
    }
}

/// Format a whole batch in one go, header first when enabled.
pub fn render_all<'a, I>(config: &ExportConfig, records: I) -> Result<String>
where
    I: IntoIterator<Item = &'a Record>,
{
    let mut assembler = LineAssembler::from_config(config)?;
    let mut out = assembler.take_header().unwrap_or_default();
    for record in records {
        out.push_str(&assembler.assemble(record));
    }
    Ok(out)
}
