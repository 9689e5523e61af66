//! Codec trait and the JSON implementation used for attribute values.
//!
//! Room attributes are plain strings, so a codec here turns a model into
//! a `String` and back. The rest of the workspace only talks to the
//! [`Codec`] trait; [`JsonCodec`] is what goes on the wire today.

use serde::{de::DeserializeOwned, Serialize};

use crate::ProtocolError;

/// Encodes models into attribute values and decodes them back.
///
/// `Send + Sync + 'static` so a codec can live inside the session actor
/// task for the lifetime of the process.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into an attribute string.
    ///
    /// # Errors
    /// Returns [`ProtocolError::Encode`] if the value can't be represented.
    fn encode<T: Serialize>(&self, value: &T) -> Result<String, ProtocolError>;

    /// Deserializes an attribute string back into a value.
    ///
    /// # Errors
    /// Returns [`ProtocolError::Decode`] if the string is malformed or
    /// doesn't match the expected shape.
    fn decode<T: DeserializeOwned>(&self, data: &str) -> Result<T, ProtocolError>;
}

/// A [`Codec`] backed by `serde_json`.
///
/// ```rust
/// use voxroom_protocol::{Codec, JsonCodec, RoomInfo};
///
/// let info = RoomInfo::new_hosted("r1", "lobby", "alice", 8);
/// let value = JsonCodec.encode(&info).unwrap();
/// let back: RoomInfo = JsonCodec.decode(&value).unwrap();
/// assert_eq!(info, back);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl Codec for JsonCodec {
    fn encode<T: Serialize>(&self, value: &T) -> Result<String, ProtocolError> {
        serde_json::to_string(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(&self, data: &str) -> Result<T, ProtocolError> {
        serde_json::from_str(data).map_err(ProtocolError::Decode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{SeatModel, SeatStatus};

    #[test]
    fn test_json_codec_decode_rejects_garbage() {
        let result: Result<SeatModel, _> = JsonCodec.decode("{not json");
        assert!(matches!(result, Err(ProtocolError::Decode(_))));
    }

    #[test]
    fn test_json_codec_decode_rejects_unknown_status() {
        let result: Result<SeatModel, _> =
            JsonCodec.decode(r#"{"index":0,"status":"reserved"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_json_codec_decodes_minimal_seat() {
        let seat: SeatModel = JsonCodec.decode(r#"{"index":2}"#).unwrap();
        assert_eq!(seat.index, 2);
        assert_eq!(seat.status, SeatStatus::Untaken);
        assert!(seat.user_id.is_none());
    }
}
