//! Evaluation record export
//!
//! Writes the scored grid to CSV with one row per combination. Undefined
//! per-class recalls serialize as empty fields, distinguishing "class not
//! observed" from a recall of 0.

use super::grid_search::EvaluationRecord;
use std::io::Write;
use std::path::Path;
use taigamap_core::{Error, Result};

/// Write records to any sink in CSV form, header included
pub fn write_records<W: Write>(sink: W, records: &[EvaluationRecord]) -> Result<()> {
    let mut writer = csv::Writer::from_writer(sink);
    for record in records {
        writer
            .serialize(record)
            .map_err(|e| Error::Other(e.to_string()))?;
    }
    writer.flush()?;
    Ok(())
}

/// Write records to a CSV file at `path`
pub fn write_records_to_path(path: impl AsRef<Path>, records: &[EvaluationRecord]) -> Result<()> {
    let file = std::fs::File::create(path)?;
    write_records(std::io::BufWriter::new(file), records)
}
