//! Decoding of captured remote-read payloads

use crate::record::Record;
use crate::{Result, RetraceError};

use super::codec;
use super::prompb::{ReadRequest, ReadResponse};

/// Remote-read messages recovered from a record or raw payload
#[derive(Debug, Default, PartialEq)]
pub struct DecodedPayload {
    /// Decoded request, when the input carried one
    pub request: Option<ReadRequest>,
    /// Decoded response, when the input carried one
    pub response: Option<ReadResponse>,
}

/// Decode `data` as a captured record, a raw request, or a raw response
///
/// A record yields both messages; an empty body decodes to an empty
/// message. Raw snappy payloads are tried as a request first.
///
/// # Errors
///
/// Returns [`RetraceError::Payload`] if a record body is malformed or the
/// input matches none of the accepted shapes
pub fn decode_payload(data: &[u8]) -> Result<DecodedPayload> {
    if let Ok(record) = serde_json::from_slice::<Record>(data) {
        let request = decode_body(&record.request.body)
            .map_err(|e| RetraceError::Payload(format!("error decoding request: {e}")))?;
        let response = decode_body(&record.response.body)
            .map_err(|e| RetraceError::Payload(format!("error decoding response: {e}")))?;

        return Ok(DecodedPayload {
            request: Some(request),
            response: Some(response),
        });
    }

    if let Ok(request) = codec::decode::<ReadRequest>(data) {
        return Ok(DecodedPayload {
            request: Some(request),
            response: None,
        });
    }

    if let Ok(response) = codec::decode::<ReadResponse>(data) {
        return Ok(DecodedPayload {
            request: None,
            response: Some(response),
        });
    }

    Err(RetraceError::Payload("unable to decode data".to_string()))
}

fn decode_body<M: prost::Message + Default>(body: &[u8]) -> Result<M> {
    if body.is_empty() {
        return Ok(M::default());
    }
    codec::decode(body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::prompb::{Label, Query, QueryResult, TimeSeries};
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;

    fn request() -> ReadRequest {
        ReadRequest {
            queries: vec![Query {
                start_timestamp_ms: 1,
                end_timestamp_ms: 2,
                ..Default::default()
            }],
            accepted_response_types: Vec::new(),
        }
    }

    fn response() -> ReadResponse {
        ReadResponse {
            results: vec![QueryResult {
                timeseries: vec![TimeSeries {
                    labels: vec![Label {
                        name: "job".to_string(),
                        value: "node".to_string(),
                    }],
                    samples: Vec::new(),
                }],
            }],
        }
    }

    #[test]
    fn test_record_with_both_bodies() {
        let json = format!(
            r#"{{"request": {{"method": "POST", "url": "http://prom/read", "headers": null, "body": "{}"}}, "response": {{"status": 200, "body": "{}"}}}}"#,
            STANDARD.encode(codec::encode(&request()).unwrap()),
            STANDARD.encode(codec::encode(&response()).unwrap()),
        );

        let decoded = decode_payload(json.as_bytes()).unwrap();
        assert_eq!(decoded.request, Some(request()));
        assert_eq!(decoded.response, Some(response()));
    }

    #[test]
    fn test_record_without_bodies() {
        let json = r#"{"request": {"method": "POST", "url": "http://prom/read"}, "response": {"status": 500}}"#;

        let decoded = decode_payload(json.as_bytes()).unwrap();
        assert_eq!(decoded.request, Some(ReadRequest::default()));
        assert_eq!(decoded.response, Some(ReadResponse::default()));
    }

    #[test]
    fn test_record_with_corrupt_request_body() {
        let json = r#"{"request": {"method": "POST", "url": "http://prom/read", "body": "////////"}}"#;

        let err = decode_payload(json.as_bytes()).unwrap_err();
        assert!(err.to_string().starts_with("error decoding request: "));
    }

    #[test]
    fn test_raw_request() {
        let data = codec::encode(&request()).unwrap();

        let decoded = decode_payload(&data).unwrap();
        assert_eq!(decoded.request, Some(request()));
        assert!(decoded.response.is_none());
    }

    #[test]
    fn test_undecodable() {
        let err = decode_payload(b"\xff\xff\xff\xff\xff\xff").unwrap_err();
        assert_eq!(err.to_string(), "unable to decode data");
    }
}
