//! Shared HTTP client for replaying requests and fetching archives

use std::sync::Arc;
use std::time::Duration;

use http_body_util::{BodyExt, Full};
use hyper::body::{Bytes, Incoming};
use hyper::{Request, Response, StatusCode, Uri};
use hyper_rustls::HttpsConnector;
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::client::legacy::Client;
use hyper_util::rt::TokioExecutor;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::{Result, RetraceError};

use super::{POOL_IDLE_TIMEOUT_SECS, POOL_MAX_IDLE_PER_HOST};

/// Response whose body was read to the end and thrown away
#[derive(Debug, Clone)]
pub struct DrainedResponse {
    /// HTTP status code
    pub status: StatusCode,
    /// Number of body bytes read before the stream ended
    pub body_len: u64,
    /// Body read failure, if the stream broke after the status line
    pub read_error: Option<String>,
}

/// HTTP client bound to a fixed per-request timeout
///
/// The client keeps no per-call state, so one instance is shared by every
/// worker without locking.
#[derive(Clone)]
pub struct HttpClient {
    client: Client<HttpsConnector<HttpConnector>, Full<Bytes>>,
    timeout: Duration,
}

impl HttpClient {
    /// Create a new HTTP client
    ///
    /// # Errors
    ///
    /// Returns error if the TLS configuration cannot be built
    pub fn new(timeout: Duration) -> Result<Self> {
        let provider = Arc::new(rustls::crypto::ring::default_provider());
        let roots = rustls::RootCertStore {
            roots: webpki_roots::TLS_SERVER_ROOTS.to_vec(),
        };
        let tls = rustls::ClientConfig::builder_with_provider(provider)
            .with_safe_default_protocol_versions()
            .map_err(|e| RetraceError::ConfigError(format!("TLS setup failed: {e}")))?
            .with_root_certificates(roots)
            .with_no_client_auth();

        let connector = hyper_rustls::HttpsConnectorBuilder::new()
            .with_tls_config(tls)
            .https_or_http()
            .enable_http1()
            .build();

        let client = Client::builder(TokioExecutor::new())
            .pool_idle_timeout(Duration::from_secs(POOL_IDLE_TIMEOUT_SECS))
            .pool_max_idle_per_host(POOL_MAX_IDLE_PER_HOST)
            .build(connector);

        Ok(Self { client, timeout })
    }

    /// Per-request timeout
    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Send a request and drain its response body
    ///
    /// The timeout covers the whole exchange, body included. Cancelling
    /// `cancel` aborts the exchange wherever it is.
    ///
    /// # Errors
    ///
    /// Returns error on connection failure, timeout, or cancellation
    pub async fn send_and_drain(
        &self,
        request: Request<Full<Bytes>>,
        cancel: &CancellationToken,
    ) -> Result<DrainedResponse> {
        let exchange = async {
            let response = self.send(request).await?;
            let status = response.status();
            let (body_len, read_error) = drain(response.into_body()).await;

            Ok::<_, RetraceError>(DrainedResponse {
                status,
                body_len,
                read_error,
            })
        };

        tokio::select! {
            biased;
            () = cancel.cancelled() => Err(RetraceError::Cancelled),
            result = tokio::time::timeout(self.timeout, exchange) => {
                result.map_err(|_| RetraceError::Timeout(self.timeout))?
            }
        }
    }

    /// Fetch a resource with GET and collect the body
    ///
    /// # Errors
    ///
    /// Returns error on transport failure, timeout, or a broken body
    pub async fn get(&self, uri: Uri) -> Result<(StatusCode, Bytes)> {
        let request = Request::get(uri)
            .body(Full::new(Bytes::new()))
            .map_err(|e| RetraceError::Http(format!("failed to build request: {e}")))?;

        self.fetch(request).await
    }

    /// Send a request and collect the whole response body
    ///
    /// # Errors
    ///
    /// Returns error on transport failure, timeout, or a broken body
    pub async fn fetch(&self, request: Request<Full<Bytes>>) -> Result<(StatusCode, Bytes)> {
        let exchange = async {
            let response = self.send(request).await?;
            let status = response.status();
            let body = response
                .into_body()
                .collect()
                .await
                .map_err(|e| RetraceError::Http(format!("error reading body: {e}")))?
                .to_bytes();
            Ok::<_, RetraceError>((status, body))
        };

        tokio::time::timeout(self.timeout, exchange)
            .await
            .map_err(|_| RetraceError::Timeout(self.timeout))?
    }

    async fn send(&self, request: Request<Full<Bytes>>) -> Result<Response<Incoming>> {
        debug!("Sending {} {}", request.method(), request.uri());

        self.client
            .request(request)
            .await
            .map_err(|e| RetraceError::Http(e.to_string()))
    }
}

/// Read a body to the end, counting bytes without keeping them
async fn drain(mut body: Incoming) -> (u64, Option<String>) {
    let mut total = 0u64;

    while let Some(frame) = body.frame().await {
        match frame {
            Ok(frame) => {
                if let Some(data) = frame.data_ref() {
                    total += data.len() as u64;
                }
            }
            Err(e) => return (total, Some(e.to_string())),
        }
    }

    (total, None)
}
