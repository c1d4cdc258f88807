//! Human-readable dumps of archive contents and decoded messages

use std::io::Write;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::config::OutputFormat;
use crate::record::{HeaderMultimap, Record};
use crate::{Result, RetraceError};

/// Summary of one record, as printed by `record inspect`
#[derive(Debug, Serialize)]
pub struct RecordSummary<'a> {
    /// Entry modification time
    pub modtime: DateTime<Utc>,
    /// Request method
    pub method: &'a str,
    /// Request URL
    pub url: &'a str,
    /// Request headers
    pub headers: &'a HeaderMultimap,
    /// Request body size
    pub request_bytes: usize,
    /// Captured response status
    pub status: u16,
    /// Captured response body size
    pub response_bytes: usize,
}

impl<'a> From<&'a Record> for RecordSummary<'a> {
    fn from(record: &'a Record) -> Self {
        Self {
            modtime: record.modtime,
            method: &record.request.method,
            url: &record.request.url,
            headers: &record.request.headers,
            request_bytes: record.request.body.len(),
            status: record.response.status,
            response_bytes: record.response.body.len(),
        }
    }
}

/// Write record summaries to `writer` in the given format
///
/// # Errors
///
/// Returns error if serialization or the write fails
pub fn render<W: Write>(writer: W, format: OutputFormat, records: &[Record]) -> Result<()> {
    let summaries: Vec<RecordSummary<'_>> = records.iter().map(RecordSummary::from).collect();
    write_value(writer, format, &summaries)
}

/// Write any serializable value to `writer` in the given format
///
/// # Errors
///
/// Returns error if serialization or the write fails
pub fn write_value<W: Write, T: Serialize + ?Sized>(
    mut writer: W,
    format: OutputFormat,
    value: &T,
) -> Result<()> {
    match format {
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut writer, value)
                .map_err(|e| RetraceError::Render(e.to_string()))?;
            writeln!(writer)?;
        }
        OutputFormat::Yaml => {
            serde_yaml::to_writer(&mut writer, value)
                .map_err(|e| RetraceError::Render(e.to_string()))?;
        }
    }

    writer.flush()?;
    Ok(())
}
