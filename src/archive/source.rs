//! Resolution of archive locations to raw bytes

use std::future::Future;
use std::path::PathBuf;

use bytes::Bytes;
use hyper::{StatusCode, Uri};
use object_store::aws::AmazonS3Builder;
use object_store::path::Path as ObjectPath;
use object_store::ObjectStore;
use tracing::{debug, info};

use crate::network::HttpClient;
use crate::{Result, RetraceError};

/// Region used when `AWS_REGION` is not set
pub const DEFAULT_REGION: &str = "us-east-1";

/// Where an archive lives
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Location {
    /// Local filesystem path
    File(PathBuf),
    /// HTTP or HTTPS URL, fetched with GET
    Http(Uri),
    /// Object in an S3-compatible bucket
    ObjectStore {
        /// Bucket name
        bucket: String,
        /// Object key, without leading slash
        key: String,
    },
}

impl Location {
    /// Parse a location identifier
    ///
    /// Identifiers without a `scheme://` prefix are local paths.
    ///
    /// # Errors
    ///
    /// Returns error for unknown schemes and malformed URLs
    pub fn parse(location: &str) -> Result<Self> {
        let Some((scheme, rest)) = location.split_once("://") else {
            return Ok(Self::File(PathBuf::from(location)));
        };

        match scheme.to_ascii_lowercase().as_str() {
            "file" => Ok(Self::File(PathBuf::from(rest))),
            "http" | "https" => location
                .parse::<Uri>()
                .map(Self::Http)
                .map_err(|e| RetraceError::ingestion(location, e)),
            "s3" => {
                let (bucket, key) = rest.split_once('/').unwrap_or((rest, ""));
                let key = key.trim_start_matches('/');
                if bucket.is_empty() || key.is_empty() {
                    return Err(RetraceError::ingestion(
                        location,
                        "expected s3://<bucket>/<key>",
                    ));
                }
                Ok(Self::ObjectStore {
                    bucket: bucket.to_string(),
                    key: key.to_string(),
                })
            }
            _ => Err(RetraceError::UnsupportedScheme(scheme.to_string())),
        }
    }
}

/// Resolves a location identifier to the bytes stored there
pub trait BlobSource: Send + Sync {
    /// Fetch the full contents at `location`
    fn fetch(&self, location: &str) -> impl Future<Output = Result<Bytes>> + Send;
}

/// Object-store credentials and region, built once and shared
///
/// Credentials come from the `AWS_*` environment variables, falling back to
/// the instance metadata endpoint when none are set.
#[derive(Debug, Clone)]
pub struct ObjectStoreSession {
    builder: AmazonS3Builder,
}

impl ObjectStoreSession {
    /// Build a session from the process environment
    #[must_use]
    pub fn from_env() -> Self {
        let region = std::env::var("AWS_REGION")
            .ok()
            .filter(|r| !r.is_empty())
            .unwrap_or_else(|| DEFAULT_REGION.to_string());

        Self::new(AmazonS3Builder::from_env().with_region(region))
    }

    /// Use a preconfigured builder, e.g. for S3-compatible endpoints
    #[must_use]
    pub fn new(builder: AmazonS3Builder) -> Self {
        Self { builder }
    }

    /// Download an object into memory
    ///
    /// # Errors
    ///
    /// Returns error if the store cannot be built or the download fails
    pub async fn download(&self, bucket: &str, key: &str) -> Result<Bytes> {
        let store = self.builder.clone().with_bucket_name(bucket).build()?;
        let result = store.get(&ObjectPath::from(key)).await?;
        Ok(result.bytes().await?)
    }
}

/// Blob source for local files, HTTP(S) URLs, and `s3://` objects
#[derive(Clone)]
pub struct DefaultBlobSource {
    http: HttpClient,
    object_store: ObjectStoreSession,
}

impl DefaultBlobSource {
    /// Create a blob source from its injected clients
    #[must_use]
    pub fn new(http: HttpClient, object_store: ObjectStoreSession) -> Self {
        Self { http, object_store }
    }

    async fn fetch_http(&self, location: &str, uri: Uri) -> Result<Bytes> {
        let (status, body) = self
            .http
            .get(uri)
            .await
            .map_err(|e| RetraceError::ingestion(location, e))?;

        if status != StatusCode::OK {
            return Err(RetraceError::ingestion(
                location,
                status.canonical_reason().unwrap_or(status.as_str()),
            ));
        }

        Ok(body)
    }
}

impl BlobSource for DefaultBlobSource {
    async fn fetch(&self, location: &str) -> Result<Bytes> {
        let bytes = match Location::parse(location)? {
            Location::File(path) => {
                debug!("Reading archive from {}", path.display());
                tokio::fs::read(&path)
                    .await
                    .map(Bytes::from)
                    .map_err(|e| RetraceError::ingestion(location, e))?
            }
            Location::Http(uri) => {
                debug!("Fetching archive from {uri}");
                self.fetch_http(location, uri).await?
            }
            Location::ObjectStore { bucket, key } => {
                debug!("Downloading archive s3://{bucket}/{key}");
                self.object_store
                    .download(&bucket, &key)
                    .await
                    .map_err(|e| RetraceError::ingestion(location, e))?
            }
        };

        info!("Fetched {location} ({}B)", bytes.len());
        Ok(bytes)
    }
}
