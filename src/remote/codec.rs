//! Snappy block framing around protobuf messages

use bytes::Bytes;
use prost::Message;

use crate::Result;

/// Serialize `message` and compress it with raw (unframed) snappy
///
/// # Errors
///
/// Returns error if the encoded message exceeds the snappy block limit
pub fn encode<M: Message>(message: &M) -> Result<Bytes> {
    let compressed = snap::raw::Encoder::new().compress_vec(&message.encode_to_vec())?;
    Ok(Bytes::from(compressed))
}

/// Decompress a raw snappy block and decode it as `M`
///
/// # Errors
///
/// Returns [`RetraceError::Snappy`](crate::RetraceError::Snappy) or
/// [`RetraceError::Protobuf`](crate::RetraceError::Protobuf)
pub fn decode<M: Message + Default>(data: &[u8]) -> Result<M> {
    let raw = snap::raw::Decoder::new().decompress_vec(data)?;
    Ok(M::decode(raw.as_slice())?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::prompb::{LabelMatcher, Query, ReadRequest, ReadResponse};
    use crate::RetraceError;

    #[test]
    fn test_request_survives_framing() {
        let request = ReadRequest {
            queries: vec![Query {
                start_timestamp_ms: 10,
                end_timestamp_ms: 20,
                matchers: vec![LabelMatcher {
                    r#type: 0,
                    name: "__name__".to_string(),
                    value: "up".to_string(),
                }],
                hints: None,
            }],
            accepted_response_types: vec![0],
        };

        let data = encode(&request).unwrap();
        let decoded: ReadRequest = decode(&data).unwrap();
        assert_eq!(decoded, request);
    }

    #[test]
    fn test_not_snappy() {
        let err = decode::<ReadResponse>(b"\xff\xff\xff\xff\xff\xff").unwrap_err();
        assert!(matches!(err, RetraceError::Snappy(_)));
    }

    #[test]
    fn test_snappy_but_not_protobuf() {
        let data = snap::raw::Encoder::new()
            .compress_vec(b"\x0a\xff\xff\xff\xff")
            .unwrap();
        let err = decode::<ReadResponse>(&data).unwrap_err();
        assert!(matches!(err, RetraceError::Protobuf(_)));
    }
}
