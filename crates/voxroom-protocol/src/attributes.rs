//! Mapping between models and the flat room-attribute store.
//!
//! The signaling service stores room attributes as string keys to string
//! values. Room info lives under [`ROOM_INFO_KEY`]; each seat lives under
//! `seat_<index>`. Any other key belongs to somebody else and is ignored
//! by this crate.

use std::collections::BTreeMap;

use crate::{Codec, JsonCodec, ProtocolError, RoomInfo, SeatModel};

/// Room attributes as published through the signaling service.
///
/// A `BTreeMap` keeps iteration order stable, which keeps seat updates
/// and their logs deterministic.
pub type AttributeMap = BTreeMap<String, String>;

/// Attribute key carrying the JSON-encoded [`RoomInfo`].
pub const ROOM_INFO_KEY: &str = "room_info";

/// Prefix of every seat attribute key.
pub const SEAT_KEY_PREFIX: &str = "seat_";

/// Returns the attribute key for the seat at `index`.
pub fn seat_key(index: u32) -> String {
    format!("{SEAT_KEY_PREFIX}{index}")
}

/// Parses a seat attribute key.
///
/// Returns `None` for keys that are not seat keys at all, and
/// `Some(Err(_))` for seat keys whose suffix isn't a valid index.
pub fn seat_index(key: &str) -> Option<Result<u32, ProtocolError>> {
    let suffix = key.strip_prefix(SEAT_KEY_PREFIX)?;
    Some(suffix.parse::<u32>().map_err(|_| {
        ProtocolError::InvalidAttribute(format!("bad seat key {key:?}"))
    }))
}

/// Encodes `info` as a single-entry attribute map under [`ROOM_INFO_KEY`].
pub fn encode_room_info(info: &RoomInfo) -> Result<AttributeMap, ProtocolError> {
    let value = JsonCodec.encode(info)?;
    Ok(AttributeMap::from([(ROOM_INFO_KEY.to_string(), value)]))
}

/// Decodes the [`RoomInfo`] carried by `attributes`, if any.
pub fn decode_room_info(
    attributes: &AttributeMap,
) -> Option<Result<RoomInfo, ProtocolError>> {
    attributes
        .get(ROOM_INFO_KEY)
        .map(|value| JsonCodec.decode(value))
}

/// Encodes one seat as `(seat_<index>, json)`.
pub fn encode_seat(seat: &SeatModel) -> Result<(String, String), ProtocolError> {
    Ok((seat_key(seat.index), JsonCodec.encode(seat)?))
}
