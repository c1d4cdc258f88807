//! Prometheus remote-read messages
//!
//! Hand-maintained mirror of the `prompb` protobuf schema, limited to the
//! sample-based read path. The JSON form uses the snake_case field names the
//! Prometheus tooling emits, so request files written for other clients load
//! unchanged.

use serde::{Deserialize, Serialize};

/// Remote-read request: one or more independent queries
#[derive(Clone, PartialEq, prost::Message, Serialize, Deserialize)]
#[serde(default)]
pub struct ReadRequest {
    /// Queries to evaluate
    #[prost(message, repeated, tag = "1")]
    pub queries: Vec<Query>,
    /// Response encodings the client can handle, in preference order
    #[prost(enumeration = "ResponseType", repeated, tag = "2")]
    pub accepted_response_types: Vec<i32>,
}

/// Remote-read response: one result per query, in query order
#[derive(Clone, PartialEq, prost::Message, Serialize, Deserialize)]
#[serde(default)]
pub struct ReadResponse {
    /// Query results
    #[prost(message, repeated, tag = "1")]
    pub results: Vec<QueryResult>,
}

/// Time range plus label matchers
#[derive(Clone, PartialEq, prost::Message, Serialize, Deserialize)]
#[serde(default)]
pub struct Query {
    /// Inclusive start, milliseconds since the epoch
    #[prost(int64, tag = "1")]
    pub start_timestamp_ms: i64,
    /// Inclusive end, milliseconds since the epoch
    #[prost(int64, tag = "2")]
    pub end_timestamp_ms: i64,
    /// Series selectors
    #[prost(message, repeated, tag = "3")]
    pub matchers: Vec<LabelMatcher>,
    /// Optional evaluation hints
    #[prost(message, optional, tag = "4")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hints: Option<ReadHints>,
}

/// Series returned for one query
#[derive(Clone, PartialEq, prost::Message, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryResult {
    /// Matching series
    #[prost(message, repeated, tag = "1")]
    pub timeseries: Vec<TimeSeries>,
}

/// Label set and its samples
#[derive(Clone, PartialEq, prost::Message, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeSeries {
    /// Series labels, sorted by name
    #[prost(message, repeated, tag = "1")]
    pub labels: Vec<Label>,
    /// Samples in timestamp order
    #[prost(message, repeated, tag = "2")]
    pub samples: Vec<Sample>,
}

/// Name/value pair
#[derive(Clone, PartialEq, Eq, Hash, prost::Message, Serialize, Deserialize)]
#[serde(default)]
pub struct Label {
    /// Label name
    #[prost(string, tag = "1")]
    pub name: String,
    /// Label value
    #[prost(string, tag = "2")]
    pub value: String,
}

/// Single data point
#[derive(Clone, PartialEq, prost::Message, Serialize, Deserialize)]
#[serde(default)]
pub struct Sample {
    /// Sample value
    #[prost(double, tag = "1")]
    pub value: f64,
    /// Milliseconds since the epoch
    #[prost(int64, tag = "2")]
    pub timestamp: i64,
}

/// Selector on one label
#[derive(Clone, PartialEq, Eq, Hash, prost::Message, Serialize, Deserialize)]
#[serde(default)]
pub struct LabelMatcher {
    /// Match operator, see [`MatchType`]
    #[prost(enumeration = "MatchType", tag = "1")]
    #[serde(rename = "type")]
    pub r#type: i32,
    /// Label name
    #[prost(string, tag = "2")]
    pub name: String,
    /// Operand
    #[prost(string, tag = "3")]
    pub value: String,
}

/// Hints forwarded to the storage about how the data will be used
#[derive(Clone, PartialEq, prost::Message, Serialize, Deserialize)]
#[serde(default)]
pub struct ReadHints {
    /// Query step size in milliseconds
    #[prost(int64, tag = "1")]
    pub step_ms: i64,
    /// Surrounding PromQL function
    #[prost(string, tag = "2")]
    pub func: String,
    /// Start of the selected range
    #[prost(int64, tag = "3")]
    pub start_ms: i64,
    /// End of the selected range
    #[prost(int64, tag = "4")]
    pub end_ms: i64,
    /// Labels used in aggregation
    #[prost(string, repeated, tag = "5")]
    pub grouping: Vec<String>,
    /// Whether `grouping` is a `by` clause rather than `without`
    #[prost(bool, tag = "6")]
    pub by: bool,
    /// Range vector selector length in milliseconds
    #[prost(int64, tag = "7")]
    pub range_ms: i64,
}

/// Label match operators
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, prost::Enumeration)]
#[repr(i32)]
pub enum MatchType {
    /// `=`
    Eq = 0,
    /// `!=`
    Neq = 1,
    /// `=~`
    Re = 2,
    /// `!~`
    Nre = 3,
}

/// Response encodings
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, prost::Enumeration)]
#[repr(i32)]
pub enum ResponseType {
    /// Snappy-compressed `ReadResponse`
    Samples = 0,
    /// Stream of chunked responses
    StreamedXorChunks = 1,
}
