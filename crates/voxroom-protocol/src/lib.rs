//! Wire types for voxroom.
//!
//! Everything that is published through the signaling service's shared
//! room attributes lives here:
//!
//! - **Types** ([`RoomInfo`], [`SeatModel`], [`UserInfo`]) — the room and
//!   seat models, with serde attributes pinned to the field names existing
//!   clients already read.
//! - **Attributes** ([`AttributeMap`], [`ROOM_INFO_KEY`], [`seat_key`]) —
//!   how those models map onto the flat string-to-string attribute store.
//! - **Codec** ([`Codec`], [`JsonCodec`]) — how a single model becomes an
//!   attribute value.
//! - **Errors** ([`ProtocolError`]).
//!
//! ```text
//! RoomInfo ──JsonCodec──→ "{\"id\":\"r1\",...}" ──→ {"room_info": ...}
//! ```

mod attributes;
mod codec;
mod error;
mod types;

pub use attributes::{
    decode_room_info, encode_room_info, encode_seat, seat_index, seat_key,
    AttributeMap, ROOM_INFO_KEY, SEAT_KEY_PREFIX,
};
pub use codec::{Codec, JsonCodec};
pub use error::ProtocolError;
pub use types::{
    NetworkQuality, RoomInfo, SeatModel, SeatStatus, UserInfo, UserRole,
};
