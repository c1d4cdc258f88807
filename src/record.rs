//! Captured request/response records
//!
//! A [`Record`] is the unit of replay. It is decoded once from an archive
//! entry and never mutated afterwards; every replay builds a fresh outbound
//! request from it.

use std::collections::BTreeMap;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use hyper::header::{HeaderName, HeaderValue};
use hyper::{Method, Uri};
use serde::{Deserialize, Deserializer, Serialize};

/// Header multimap: name to the ordered sequence of values sent under it
pub type HeaderMultimap = BTreeMap<String, Vec<String>>;

/// Captured outbound request
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordedRequest {
    /// HTTP method
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub method: String,
    /// Absolute target URL
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub url: String,
    /// Request headers
    #[serde(default, deserialize_with = "null_as_default")]
    pub headers: HeaderMultimap,
    /// Request body, base64 on the wire
    #[serde(default, with = "base64_body", skip_serializing_if = "Bytes::is_empty")]
    pub body: Bytes,
}

/// Captured response; kept for inspection, never replayed
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordedResponse {
    /// HTTP status code
    #[serde(default)]
    pub status: u16,
    /// Response headers
    #[serde(default, deserialize_with = "null_as_default")]
    pub headers: HeaderMultimap,
    /// Response body, base64 on the wire
    #[serde(default, with = "base64_body", skip_serializing_if = "Bytes::is_empty")]
    pub body: Bytes,
}

/// One captured exchange
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// The request that was sent
    pub request: RecordedRequest,
    /// The response that came back at capture time
    #[serde(default)]
    pub response: RecordedResponse,
    /// Capture time of the archive entry, used only for ordering
    #[serde(skip)]
    pub modtime: DateTime<Utc>,
}

impl Record {
    /// Decode a record from the JSON body of an archive entry
    ///
    /// # Errors
    ///
    /// Returns the decoding or validation failure as a message
    pub fn from_json(data: &[u8], modtime: DateTime<Utc>) -> std::result::Result<Self, String> {
        let mut record: Self = serde_json::from_slice(data).map_err(|e| e.to_string())?;
        record.modtime = modtime;
        record.validate()?;
        Ok(record)
    }

    /// Check that the request can be turned into an outbound HTTP request
    ///
    /// # Errors
    ///
    /// Returns a description of the first invalid field
    pub fn validate(&self) -> std::result::Result<(), String> {
        let request = &self.request;

        if request.method.is_empty() {
            return Err("request method is empty".to_string());
        }
        Method::from_bytes(request.method.as_bytes())
            .map_err(|e| format!("invalid method {:?}: {e}", request.method))?;

        if request.url.is_empty() {
            return Err("request url is empty".to_string());
        }
        let uri: Uri = request
            .url
            .parse()
            .map_err(|e| format!("invalid url {:?}: {e}", request.url))?;
        if uri.scheme().is_none() || uri.authority().is_none() {
            return Err(format!("url {:?} is not absolute", request.url));
        }

        for (name, values) in &request.headers {
            HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| format!("invalid header name {name:?}: {e}"))?;
            for value in values {
                HeaderValue::from_str(value)
                    .map_err(|e| format!("invalid value for header {name:?}: {e}"))?;
            }
        }

        Ok(())
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

mod base64_body {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;
    use bytes::Bytes;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(body: &Bytes, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(body))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Bytes, D::Error> {
        match Option::<String>::deserialize(deserializer)? {
            Some(encoded) => STANDARD
                .decode(encoded.as_bytes())
                .map(Bytes::from)
                .map_err(serde::de::Error::custom),
            None => Ok(Bytes::new()),
        }
    }
}
