//! Network layer for Retrace
//!
//! One pooled HTTP/HTTPS client shared by every replay worker and by the
//! archive fetcher.

mod client;

pub use client::{DrainedResponse, HttpClient};

/// Idle pooled connections are closed after this many seconds
pub const POOL_IDLE_TIMEOUT_SECS: u64 = 90;

/// Maximum idle pooled connections kept per host
pub const POOL_MAX_IDLE_PER_HOST: usize = 32;

/// Timeout for downloading an archive over HTTP
pub const ARCHIVE_FETCH_TIMEOUT_SECS: u64 = 300;
