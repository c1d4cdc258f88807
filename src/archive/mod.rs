//! Archive ingestion
//!
//! An archive is a zip container with one JSON-encoded [`Record`] per entry.
//! Locations are resolved to bytes by a [`BlobSource`] and decoded by the
//! [`ArchiveReader`].
//!
//! [`Record`]: crate::record::Record

mod reader;
mod source;

pub use reader::{decode_archive, ArchiveReader};
pub use source::{BlobSource, DefaultBlobSource, Location, ObjectStoreSession, DEFAULT_REGION};
