//! Prometheus remote-read protocol
//!
//! Messages, snappy framing, a one-shot client, and decoding of payloads
//! captured in archive records.

mod client;
pub mod codec;
mod payload;
pub mod prompb;

use std::io::{IsTerminal, Read};

use bytes::Bytes;

use crate::{Result, RetraceError};

pub use client::{RemoteReadClient, REMOTE_READ_HEADERS};
pub use payload::{decode_payload, DecodedPayload};
pub use prompb::{ReadRequest, ReadResponse};

/// Input name that selects standard input
pub const STDIN: &str = "-";

/// Read a whole input file, or piped standard input for [`STDIN`]
///
/// # Errors
///
/// Returns an ingestion error if the file cannot be read or standard input
/// is an interactive terminal
pub async fn read_input(path: &str) -> Result<Bytes> {
    if path != STDIN {
        return tokio::fs::read(path)
            .await
            .map(Bytes::from)
            .map_err(|e| RetraceError::ingestion(path, e));
    }

    tokio::task::spawn_blocking(|| {
        let stdin = std::io::stdin();
        if stdin.is_terminal() {
            return Err(RetraceError::ingestion(STDIN, "no data being piped"));
        }

        let mut data = Vec::new();
        stdin
            .lock()
            .read_to_end(&mut data)
            .map_err(|e| RetraceError::ingestion(STDIN, e))?;
        Ok(Bytes::from(data))
    })
    .await
    .map_err(|e| RetraceError::ingestion(STDIN, e))?
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[tokio::test]
    async fn test_read_input_file() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"{\"queries\": []}").unwrap();

        let data = read_input(file.path().to_str().unwrap()).await.unwrap();
        assert_eq!(data.as_ref(), b"{\"queries\": []}");
    }

    #[tokio::test]
    async fn test_read_input_missing_file() {
        let err = read_input("/nonexistent/request.json").await.unwrap_err();
        assert!(matches!(err, RetraceError::Ingestion { .. }));
    }
}
