//! Picks the data file out of a downloaded archive and decodes it.
//!
//! Archive layouts differ between naming eras and the publisher does not
//! keep entry names stable, so the data file is chosen by size: the
//! largest `.txt`/`.csv` entry wins. When two candidates have the same
//! size, the one listed first in the archive is used.

use std::io::{Cursor, Read};

use tracing::debug;
use zip::ZipArchive;

use crate::error::CotError;
use crate::table::ReportTable;

const DATA_FILE_SUFFIXES: [&str; 2] = [".txt", ".csv"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataFileCandidate {
    pub index: usize,
    pub name: String,
    pub size: u64,
}

pub fn is_data_file_name(name: &str) -> bool {
    let lower = name.to_ascii_lowercase();
    DATA_FILE_SUFFIXES
        .iter()
        .any(|suffix| lower.ends_with(suffix))
}

/// Largest candidate; on equal size the earliest one.
pub fn select_data_file(candidates: &[DataFileCandidate]) -> Option<&DataFileCandidate> {
    candidates
        .iter()
        .reduce(|best, next| if next.size > best.size { next } else { best })
}

pub fn read_table(bytes: &[u8]) -> Result<ReportTable, CotError> {
    let mut archive = ZipArchive::new(Cursor::new(bytes)).map_err(|err| CotError::CorruptArchive {
        reason: err.to_string(),
    })?;

    let mut entries_seen = Vec::with_capacity(archive.len());
    let mut candidates = Vec::new();
    for index in 0..archive.len() {
        let entry = archive
            .by_index_raw(index)
            .map_err(|err| CotError::CorruptArchive {
                reason: err.to_string(),
            })?;
        let name = entry.name().to_string();
        if !entry.is_dir() && is_data_file_name(&name) {
            candidates.push(DataFileCandidate {
                index,
                name: name.clone(),
                size: entry.size(),
            });
        }
        entries_seen.push(name);
    }

    let selected = select_data_file(&candidates)
        .cloned()
        .ok_or(CotError::NoDataFileFound { entries_seen })?;
    debug!(
        entry = %selected.name,
        size = selected.size,
        candidates = candidates.len(),
        "selected data file"
    );

    let mut entry = archive
        .by_index(selected.index)
        .map_err(|err| CotError::CorruptArchive {
            reason: format!("{}: {err}", selected.name),
        })?;
    // Declared size is untrusted: compared after reading, never preallocated.
    let mut raw = Vec::new();
    entry
        .read_to_end(&mut raw)
        .map_err(|err| CotError::CorruptArchive {
            reason: format!("{}: {err}", selected.name),
        })?;
    if raw.len() as u64 != selected.size {
        return Err(CotError::CorruptArchive {
            reason: format!(
                "{}: declared {} bytes, read {}",
                selected.name,
                selected.size,
                raw.len()
            ),
        });
    }

    decode_delimited(&raw).map_err(|err| CotError::CorruptArchive {
        reason: format!("{}: {err}", selected.name),
    })
}

/// Comma-delimited text with a header row. Bytes that are not UTF-8 are
/// replaced rather than rejected.
pub fn decode_delimited(raw: &[u8]) -> Result<ReportTable, csv::Error> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(raw);

    let columns = reader
        .byte_headers()?
        .iter()
        .map(|field| String::from_utf8_lossy(field).into_owned())
        .collect::<Vec<_>>();

    let mut rows = Vec::new();
    for record in reader.byte_records() {
        let record = record?;
        rows.push(
            record
                .iter()
                .map(|field| String::from_utf8_lossy(field).into_owned())
                .collect(),
        );
    }
    Ok(ReportTable::new(columns, rows))
}
