//! JSON export/import of record histories
//!
//! A history is stored as a JSON array of record mappings. Records whose source
//! had no timestamp carry it under `_created`; on import that key is folded back
//! into the record's timestamp.

use std::io::{Read, Write};

use crate::error::Result;
use crate::record::{Fields, LogRecord};

/// Write `records` as an indented JSON array
pub fn write_records<'a, W, I>(writer: W, records: I) -> Result<()>
where
    W: Write,
    I: IntoIterator<Item = &'a LogRecord>,
{
    let mappings: Vec<Fields> = records.into_iter().map(LogRecord::to_fields).collect();
    serde_json::to_writer_pretty(writer, &mappings)?;
    Ok(())
}

/// Read a JSON array of record mappings
pub fn read_records<R: Read>(reader: R) -> Result<Vec<LogRecord>> {
    let mappings: Vec<Fields> = serde_json::from_reader(reader)?;
    Ok(mappings.into_iter().map(LogRecord::from_fields).collect())
}
