//! Archive decoding

use std::io::{Cursor, Read};

use bytes::Bytes;
use chrono::{DateTime, NaiveDate, Utc};
use tracing::{debug, info};
use zip::extra_fields::ExtraField;
use zip::ZipArchive;

use crate::record::Record;
use crate::{Result, RetraceError};

use super::source::BlobSource;

/// Reads archives of captured records through a [`BlobSource`]
pub struct ArchiveReader<S> {
    source: S,
}

impl<S: BlobSource> ArchiveReader<S> {
    /// Create a reader over the given blob source
    #[must_use]
    pub fn new(source: S) -> Self {
        Self { source }
    }

    /// Read one archive, returning its records ordered by capture time
    ///
    /// # Errors
    ///
    /// Returns error if the archive cannot be fetched, is not a valid
    /// container, or holds a non-empty entry that does not decode
    pub async fn read(&self, location: &str) -> Result<Vec<Record>> {
        let data = self.source.fetch(location).await?;
        let name = location.to_string();

        let records = tokio::task::spawn_blocking(move || decode_archive(&name, data))
            .await
            .map_err(|e| RetraceError::ingestion(location, e))??;

        debug!("Read {} records from {location}", records.len());
        Ok(records)
    }

    /// Read several archives and concatenate their records in argument order
    ///
    /// Each archive is sorted on its own; the concatenation is not re-sorted.
    ///
    /// # Errors
    ///
    /// Fails on the first archive that cannot be read
    pub async fn read_all<L: AsRef<str>>(&self, locations: &[L]) -> Result<Vec<Record>> {
        info!("Reading records from {} archives", locations.len());

        let mut records = Vec::new();
        for location in locations {
            records.extend(self.read(location.as_ref()).await?);
        }

        info!("Read {} records", records.len());
        Ok(records)
    }
}

/// Decode an in-memory zip archive into records sorted by entry modtime
///
/// Entries that are empty or whitespace-only are skipped. Ties keep entry order.
///
/// # Errors
///
/// Returns error if the container is corrupt or any non-empty entry fails
/// to decode; no partial result is returned
pub fn decode_archive(name: &str, data: Bytes) -> Result<Vec<Record>> {
    let mut archive = ZipArchive::new(Cursor::new(data)).map_err(|e| {
        debug!("{name} is not a readable archive: {e}");
        RetraceError::Archive(e)
    })?;

    let mut records = Vec::with_capacity(archive.len());

    for index in 0..archive.len() {
        let mut entry = archive.by_index(index)?;
        if entry.is_dir() {
            continue;
        }

        let entry_name = entry.name().to_string();
        let extended = entry.extra_data_fields().find_map(|field| match field {
            ExtraField::ExtendedTimestamp(ts) => ts.mod_time(),
            _ => None,
        });
        let modtime = extended
            .and_then(|secs| DateTime::from_timestamp(i64::from(secs), 0))
            .or_else(|| entry.last_modified().and_then(dos_to_utc))
            .unwrap_or_default();

        let mut content = Vec::new();
        entry
            .read_to_end(&mut content)
            .map_err(|e| RetraceError::InvalidEntry {
                entry: entry_name.clone(),
                reason: format!("error reading: {e}"),
            })?;

        if std::str::from_utf8(&content).is_ok_and(|text| text.trim().is_empty()) {
            continue;
        }

        let record = Record::from_json(&content, modtime).map_err(|reason| {
            RetraceError::InvalidEntry {
                entry: entry_name,
                reason,
            }
        })?;
        records.push(record);
    }

    records.sort_by_key(|record| record.modtime);
    Ok(records)
}

fn dos_to_utc(dt: zip::DateTime) -> Option<DateTime<Utc>> {
    NaiveDate::from_ymd_opt(i32::from(dt.year()), u32::from(dt.month()), u32::from(dt.day()))?
        .and_hms_opt(
            u32::from(dt.hour()),
            u32::from(dt.minute()),
            u32::from(dt.second()),
        )
        .map(|naive| naive.and_utc())
}
