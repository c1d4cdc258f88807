//! Single-record replay

use std::fmt;

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::{Request, StatusCode};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::network::HttpClient;
use crate::record::Record;
use crate::{Result, RetraceError};

/// Classification of one replay attempt
#[derive(Debug)]
pub enum Outcome {
    /// Endpoint answered 200 or 204
    Success {
        /// Response status code
        status: u16,
        /// Drained response body size
        body_len: u64,
    },
    /// Endpoint answered with any other status
    ReplayError {
        /// Status line text, e.g. `500 Internal Server Error`
        status: String,
    },
    /// Request never produced a usable response
    TransportError(RetraceError),
}

impl Outcome {
    /// Short label used in log lines
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Success { .. } => "success",
            Self::ReplayError { .. } => "replay-error",
            Self::TransportError(_) => "transport-error",
        }
    }

    /// Whether the replay succeeded
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success { status, body_len } => write!(f, "success: {status} ({body_len}B)"),
            Self::ReplayError { status } => write!(f, "response error: {status}"),
            Self::TransportError(e) => write!(f, "{e}"),
        }
    }
}

/// Build the outbound request exactly as captured
///
/// # Errors
///
/// Returns error if the stored method, URL, or headers are not valid HTTP
pub fn build_request(record: &Record) -> Result<Request<Full<Bytes>>> {
    let captured = &record.request;
    let mut builder = Request::builder()
        .method(captured.method.as_str())
        .uri(captured.url.as_str());

    for (name, values) in &captured.headers {
        for value in values {
            builder = builder.header(name.as_str(), value.as_str());
        }
    }

    builder
        .body(Full::new(captured.body.clone()))
        .map_err(|e| RetraceError::Http(format!("failed to build request: {e}")))
}

/// Replay one record and classify the result
///
/// `cancel` is the invocation-wide scope; firing it aborts the request in
/// flight. Every outcome is logged here and nowhere else.
pub async fn replay_record(
    client: &HttpClient,
    record: &Record,
    cancel: &CancellationToken,
) -> Outcome {
    let url = record.request.url.as_str();

    let request = match build_request(record) {
        Ok(request) => request,
        Err(e) => {
            warn!(url, outcome = "transport-error", "{e}");
            return Outcome::TransportError(e);
        }
    };

    info!("Sending request to {url} ({}B)", record.request.body.len());

    let response = match client.send_and_drain(request, cancel).await {
        Ok(response) => response,
        Err(e) => {
            warn!(url, outcome = "transport-error", "{e}");
            return Outcome::TransportError(e);
        }
    };

    info!(
        "Received response {} ({}B)",
        response.status.as_u16(),
        response.body_len
    );

    let outcome = if !matches!(response.status, StatusCode::OK | StatusCode::NO_CONTENT) {
        Outcome::ReplayError {
            status: response.status.to_string(),
        }
    } else if let Some(e) = response.read_error {
        Outcome::TransportError(RetraceError::Http(format!("error reading response: {e}")))
    } else {
        Outcome::Success {
            status: response.status.as_u16(),
            body_len: response.body_len,
        }
    };

    if outcome.is_success() {
        info!(url, outcome = outcome.label(), "Replay succeeded");
    } else {
        warn!(url, outcome = outcome.label(), "{outcome}");
    }

    outcome
}
