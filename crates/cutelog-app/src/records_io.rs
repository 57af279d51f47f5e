//! Saving and loading record histories

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use cutelog_core::prelude::*;
use cutelog_core::{read_records, write_records, LogRecord};

/// Write records to `path` as a JSON array, through a temp file beside it.
pub fn save_records(path: &Path, records: &[LogRecord]) -> Result<()> {
    let file_name = path
        .file_name()
        .ok_or_else(|| Error::records_file(path, "not a file path"))?;
    let temp_path = path.with_file_name(format!(".{}.tmp", file_name.to_string_lossy()));

    let write = || -> Result<()> {
        let mut writer = BufWriter::new(File::create(&temp_path)?);
        write_records(&mut writer, records)?;
        writer.write_all(b"\n")?;
        writer.flush()?;
        Ok(())
    };
    if let Err(e) = write() {
        let _ = std::fs::remove_file(&temp_path);
        return Err(Error::records_file(path, e.to_string()));
    }

    std::fs::rename(&temp_path, path).map_err(|e| Error::records_file(path, e.to_string()))?;
    info!("Saved {} records to {:?}", records.len(), path);
    Ok(())
}

/// Read a JSON array of records from `path`
pub fn load_records(path: &Path) -> Result<Vec<LogRecord>> {
    let file = File::open(path).map_err(|e| Error::records_file(path, e.to_string()))?;
    let records =
        read_records(BufReader::new(file)).map_err(|e| Error::records_file(path, e.to_string()))?;
    info!("Loaded {} records from {:?}", records.len(), path);
    Ok(records)
}

/// Tab name for a loaded file: its base name
pub fn tab_name_for(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
