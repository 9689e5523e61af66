//! Error types for the protocol layer.

/// Errors that can occur while encoding or decoding attribute values.
///
/// A `ProtocolError` always means the *payload* is at fault, never the
/// network or the room state.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed (turning a model into an attribute value).
    #[error("encode failed: {0}")]
    Encode(#[source] serde_json::Error),

    /// Deserialization failed: malformed JSON, missing required fields,
    /// or wrong data types.
    #[error("decode failed: {0}")]
    Decode(#[source] serde_json::Error),

    /// The attribute decoded fine but breaks a protocol rule, e.g. a
    /// seat key whose suffix is not a number.
    #[error("invalid attribute: {0}")]
    InvalidAttribute(String),
}
