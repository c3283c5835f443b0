//! CSV source and sink
//!
//! Loads the raw match sheet with row validation and writes the result table.

use super::raw::RawRow;
use super::store::MatchStore;
use crate::features::table::ResultTable;
use crate::{FootballError, InvalidRowPolicy, MatchRecord, Result};
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

/// A row that was rejected while loading
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowIssue {
    /// 1-based line in the source file
    pub line: u64,
    pub message: String,
}

/// Summary of a load
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub rows_read: usize,
    pub rows_loaded: usize,
    pub skipped: Vec<RowIssue>,
}

/// Read and validate match rows from any CSV reader
pub fn read_matches<R: Read>(
    reader: R,
    policy: InvalidRowPolicy,
) -> Result<(MatchStore, LoadReport)> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::Headers)
        .from_reader(reader);
    let mut report = LoadReport::default();
    let mut records: Vec<MatchRecord> = Vec::new();

    for (i, row) in reader.deserialize::<RawRow>().enumerate() {
        report.rows_read += 1;
        // Header is line 1
        let line = i as u64 + 2;

        let parsed = match row {
            Ok(raw) => raw.into_record(),
            Err(e) if e.is_io_error() => return Err(e.into()),
            Err(e) => Err(FootballError::from(e)),
        };

        match parsed {
            Ok(record) => records.push(record),
            Err(e) => match policy {
                InvalidRowPolicy::Abort => return Err(e),
                InvalidRowPolicy::Skip => {
                    log::warn!("Skipping line {}: {}", line, e);
                    report.skipped.push(RowIssue {
                        line,
                        message: e.to_string(),
                    });
                }
            },
        }
    }

    report.rows_loaded = records.len();
    let store = MatchStore::new(records)?;
    log::info!(
        "Loaded {} of {} rows ({} skipped)",
        report.rows_loaded,
        report.rows_read,
        report.skipped.len()
    );
    Ok((store, report))
}

/// Load the raw match sheet from a CSV file
pub fn load_matches<P: AsRef<Path>>(
    path: P,
    policy: InvalidRowPolicy,
) -> Result<(MatchStore, LoadReport)> {
    let file = File::open(path.as_ref())?;
    read_matches(file, policy)
}

/// Write the result table as CSV; missing features become empty cells
pub fn write_table<W: Write>(writer: W, table: &ResultTable) -> Result<()> {
    let mut writer = csv::Writer::from_writer(writer);
    writer.write_record(table.header())?;
    for row in table.rows() {
        let cells = table.cells(row);
        writer.write_record(cells.iter().map(|c| c.as_deref().unwrap_or("")))?;
    }
    writer.flush()?;
    Ok(())
}

/// Write the result table to a CSV file, creating parent directories
pub fn save_table<P: AsRef<Path>>(path: P, table: &ResultTable) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    write_table(File::create(path)?, table)
}
