//! CSV output of the computed tables

use std::io::Write;
use std::path::Path;

use serde::Serialize;

use crate::Result;

/// Serialize rows as CSV with a header line
pub fn write_rows<W: Write, T: Serialize>(writer: W, rows: &[T]) -> Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    for row in rows {
        csv_writer.serialize(row)?;
    }
    csv_writer.flush()?;
    Ok(())
}

/// Write rows to a CSV file, creating parent directories as needed
pub fn write_csv<P: AsRef<Path>, T: Serialize>(path: P, rows: &[T]) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let file = std::fs::File::create(path)?;
    write_rows(file, rows)?;
    log::info!("Wrote {} rows to {}", rows.len(), path.display());
    Ok(())
}
