use std::fs::File;
use std::io::{self, Write};

use camino::Utf8Path;
use clap::ValueEnum;
use serde::Serialize;

use crate::error::CotError;
use crate::table::ReportTable;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TableFormat {
    Csv,
    Json,
}

pub struct TableOutput;

impl TableOutput {
    /// Writes to `path`, or stdout when `None`.
    pub fn write(
        table: &ReportTable,
        format: TableFormat,
        path: Option<&Utf8Path>,
    ) -> Result<(), CotError> {
        match path {
            Some(path) => {
                if let Some(parent) = path.parent().filter(|p| !p.as_str().is_empty()) {
                    std::fs::create_dir_all(parent.as_std_path())
                        .map_err(|err| CotError::Output(format!("{parent}: {err}")))?;
                }
                let file = File::create(path.as_std_path())
                    .map_err(|err| CotError::Output(format!("{path}: {err}")))?;
                Self::write_to(table, format, io::BufWriter::new(file))
            }
            None => Self::write_to(table, format, io::stdout().lock()),
        }
    }

    pub fn write_to<W: Write>(
        table: &ReportTable,
        format: TableFormat,
        writer: W,
    ) -> Result<(), CotError> {
        match format {
            TableFormat::Csv => write_csv(table, writer),
            TableFormat::Json => write_json(&table.records(), writer),
        }
    }
}

pub struct JsonOutput;

impl JsonOutput {
    pub fn print<T: Serialize>(value: &T) -> io::Result<()> {
        let json = serde_json::to_string_pretty(value).map_err(io::Error::other)?;
        let mut stdout = io::stdout();
        stdout.write_all(json.as_bytes())?;
        stdout.write_all(b"\n")?;
        Ok(())
    }
}

fn write_csv<W: Write>(table: &ReportTable, writer: W) -> Result<(), CotError> {
    let mut csv = csv::WriterBuilder::new().flexible(true).from_writer(writer);
    csv.write_record(table.columns())
        .map_err(|err| CotError::Output(err.to_string()))?;
    for row in table.rows() {
        csv.write_record(row)
            .map_err(|err| CotError::Output(err.to_string()))?;
    }
    csv.flush().map_err(|err| CotError::Output(err.to_string()))
}

fn write_json<T: Serialize, W: Write>(value: &T, mut writer: W) -> Result<(), CotError> {
    serde_json::to_writer_pretty(&mut writer, value)
        .map_err(|err| CotError::Output(err.to_string()))?;
    writer
        .write_all(b"\n")
        .map_err(|err| CotError::Output(err.to_string()))?;
    writer.flush().map_err(|err| CotError::Output(err.to_string()))
}
