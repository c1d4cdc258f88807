//! Remote-read client speaking snappy-framed protobuf over HTTP

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use bytes::Bytes;
use http_body_util::Full;
use hyper::header::HeaderValue;
use hyper::{Request, StatusCode, Uri};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::network::HttpClient;
use crate::{Result, RetraceError};

use super::codec;
use super::prompb::{ReadRequest, ReadResponse};

/// Headers a Prometheus server sends with every remote-read call
pub const REMOTE_READ_HEADERS: [(&str, &str); 5] = [
    ("Accept-Encoding", "snappy"),
    ("Content-Encoding", "snappy"),
    ("Content-Type", "application/x-protobuf"),
    ("User-Agent", "Prometheus/2.10.0"),
    ("X-Prometheus-Remote-Read-Version", "0.1.0"),
];

/// Client for one remote storage endpoint
#[derive(Clone)]
pub struct RemoteReadClient {
    http: HttpClient,
    url: Uri,
    authorization: Option<String>,
}

impl RemoteReadClient {
    /// Create a client for `url`, sending `token` as a bearer credential
    /// when it is non-empty
    ///
    /// # Errors
    ///
    /// Returns a configuration error for an empty or relative URL, or a
    /// token that cannot be carried in a header
    pub fn new(http: HttpClient, url: &str, token: Option<&str>) -> Result<Self> {
        if url.is_empty() {
            return Err(RetraceError::ConfigError("url is empty".to_string()));
        }
        let url: Uri = url
            .parse()
            .map_err(|e| RetraceError::ConfigError(format!("invalid url {url:?}: {e}")))?;
        if url.scheme().is_none() || url.authority().is_none() {
            return Err(RetraceError::ConfigError(format!("url {url} is not absolute")));
        }

        let authorization = match token.filter(|t| !t.is_empty()) {
            Some(token) => {
                let value = format!("Bearer {token}");
                HeaderValue::from_str(&value).map_err(|_| {
                    RetraceError::ConfigError("token is not a valid header value".to_string())
                })?;
                Some(value)
            }
            None => None,
        };

        Ok(Self {
            http,
            url,
            authorization,
        })
    }

    /// Endpoint URL
    #[must_use]
    pub fn url(&self) -> &Uri {
        &self.url
    }

    /// Headers sent with every call, sorted by name
    #[must_use]
    pub fn headers(&self) -> Vec<(&'static str, &str)> {
        let mut headers: Vec<_> = REMOTE_READ_HEADERS.to_vec();
        if let Some(value) = &self.authorization {
            headers.push(("Authorization", value.as_str()));
        }
        headers.sort_unstable();
        headers
    }

    /// Build the POST carrying `request`
    ///
    /// # Errors
    ///
    /// Returns error if the request cannot be encoded
    pub fn make_request(&self, request: &ReadRequest) -> Result<Request<Full<Bytes>>> {
        let body = codec::encode(request)?;

        let mut builder = Request::post(self.url.clone());
        for (name, value) in self.headers() {
            builder = builder.header(name, value);
        }

        builder
            .body(Full::new(body))
            .map_err(|e| RetraceError::Http(format!("failed to build request: {e}")))
    }

    /// Send `request` and decode the response
    ///
    /// # Errors
    ///
    /// Returns a transport error, [`RetraceError::RequestFailed`] for a
    /// non-200 status, or a decoding error for a malformed body
    pub async fn read(
        &self,
        request: &ReadRequest,
        cancel: &CancellationToken,
    ) -> Result<ReadResponse> {
        let outbound = self.make_request(request)?;
        debug!("Sending remote read to {}", self.url);

        let (status, body) = tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(RetraceError::Cancelled),
            result = self.http.fetch(outbound) => result?,
        };

        if status != StatusCode::OK {
            warn!(
                "Remote read returned {status}: {}",
                String::from_utf8_lossy(&body)
            );
            let reason = status.canonical_reason().unwrap_or("unknown status");
            return Err(RetraceError::RequestFailed(reason.to_string()));
        }

        debug!("Received {}B remote read response", body.len());
        codec::decode(&body)
    }

    /// Shell command that replays `request` with curl, storing the raw
    /// response in `request.pb.snappy`
    ///
    /// # Errors
    ///
    /// Returns error if the request cannot be encoded
    pub fn curl_command(&self, request: &ReadRequest) -> Result<String> {
        let body = codec::encode(request)?;

        let mut command = format!("echo '{}' | base64 -d | ", STANDARD.encode(&body));
        command.push_str(
            "curl --show-error --silent --location --connect-timeout 10 --max-time 60 --fail --data-binary @-",
        );
        command.push_str(" -X POST");
        for (name, value) in self.headers() {
            command.push_str(&format!(" -H '{name}: {value}'"));
        }
        command.push_str(&format!(" {} > request.pb.snappy", self.url));

        Ok(command)
    }
}
