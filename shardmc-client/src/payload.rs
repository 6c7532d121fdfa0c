//! Pluggable value codec seam.
//!
//! The protocol core moves opaque bytes; turning those bytes into typed
//! values is the caller's choice of codec. Decode is best-effort: a value
//! that fails to parse surfaces as the type's default instead of an
//! error, mirroring best-effort typed reads.

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{ClientError, ClientResult};

/// Encodes and decodes cache values to and from opaque bytes.
pub trait PayloadCodec {
    /// Serializes a value for storage.
    fn encode<T: Serialize>(&self, value: &T) -> ClientResult<Vec<u8>>;

    /// Deserializes stored bytes; `None` when the bytes don't parse.
    fn decode<T: DeserializeOwned>(&self, bytes: &[u8]) -> Option<T>;
}

/// Default codec: values as JSON documents.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl PayloadCodec for JsonCodec {
    fn encode<T: Serialize>(&self, value: &T) -> ClientResult<Vec<u8>> {
        serde_json::to_vec(value).map_err(|err| ClientError::Encode(Box::new(err)))
    }

    fn decode<T: DeserializeOwned>(&self, bytes: &[u8]) -> Option<T> {
        if bytes.is_empty() {
            return None;
        }
        serde_json::from_slice(bytes).ok()
    }
}
