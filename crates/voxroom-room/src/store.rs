//! The canonical room info of the current session.

use voxroom_protocol::{
    decode_room_info, encode_room_info, AttributeMap, ProtocolError, RoomInfo,
};

use crate::RoomError;

/// Holds the [`RoomInfo`] of the room this session is in.
///
/// Mutated from two directions: local actions (create, join, an
/// acknowledged publish) through [`set_info`](Self::set_info), and remote
/// attribute updates through
/// [`apply_remote_attributes`](Self::apply_remote_attributes). Neither
/// path ever leaves a half-applied value behind.
#[derive(Debug, Default)]
pub struct RoomStateStore {
    info: Option<RoomInfo>,
}

impl RoomStateStore {
    /// Creates an empty store (no room).
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the stored info.
    pub fn set_info(&mut self, info: RoomInfo) {
        self.info = Some(info);
    }

    /// Records the identity of a room we joined before its full info
    /// arrives through the attribute stream.
    pub fn set_identity(&mut self, room_id: &str, room_name: &str) {
        self.info = Some(RoomInfo {
            room_id: room_id.to_string(),
            room_name: room_name.to_string(),
            ..RoomInfo::default()
        });
    }

    pub fn current_info(&self) -> Option<&RoomInfo> {
        self.info.as_ref()
    }

    /// ID of the current room, if any.
    pub fn room_id(&self) -> Option<&str> {
        self.info.as_ref().map(|i| i.room_id.as_str())
    }

    /// Forgets the room. Returns `true` if there was one.
    pub fn clear(&mut self) -> bool {
        self.info.take().is_some()
    }

    /// Applies the `room_info` entry of a remote attribute update.
    ///
    /// Returns whether the stored info changed. Payloads without a
    /// `room_info` key are ignored.
    ///
    /// # Errors
    /// - [`ProtocolError::Decode`] if the value is malformed JSON.
    /// - [`ProtocolError::InvalidAttribute`] if it describes a different
    ///   room, or rewrites the host or seat count once they're known.
    ///
    /// The stored info is untouched on error.
    pub fn apply_remote_attributes(
        &mut self,
        attributes: &AttributeMap,
    ) -> Result<bool, ProtocolError> {
        let Some(decoded) = decode_room_info(attributes) else {
            return Ok(false);
        };
        let incoming = decoded?;

        if let Some(current) = &self.info {
            if current.room_id != incoming.room_id {
                return Err(ProtocolError::InvalidAttribute(format!(
                    "room_info for {} while in {}",
                    incoming.room_id, current.room_id
                )));
            }
            if !current.host_id.is_empty() && current.host_id != incoming.host_id {
                return Err(ProtocolError::InvalidAttribute(format!(
                    "host of {} cannot change",
                    current.room_id
                )));
            }
            if current.seat_num != 0 && current.seat_num != incoming.seat_num {
                return Err(ProtocolError::InvalidAttribute(format!(
                    "seat count of {} cannot change",
                    current.room_id
                )));
            }
            if *current == incoming {
                return Ok(false);
            }
        }

        self.info = Some(incoming);
        Ok(true)
    }

    /// The stored info as it is published: `{"room_info": <json>}`.
    ///
    /// Empty when there is no room.
    pub fn serialize(&self) -> Result<AttributeMap, ProtocolError> {
        match &self.info {
            Some(info) => encode_room_info(info),
            None => Ok(AttributeMap::new()),
        }
    }

    /// Computes the next info with text chat toggled, without applying it.
    ///
    /// Returns the candidate info and the attributes to publish. The store
    /// is only updated once the caller commits the candidate with
    /// [`set_info`](Self::set_info) after the publish is acknowledged.
    ///
    /// # Errors
    /// [`RoomError::Failed`] if there is no current room or the candidate
    /// can't be encoded.
    pub fn with_text_message_disabled(
        &self,
        disabled: bool,
    ) -> Result<(RoomInfo, AttributeMap), RoomError> {
        let mut next = self.info.clone().ok_or(RoomError::Failed)?;
        next.is_text_message_disabled = disabled;
        let staged = Self {
            info: Some(next.clone()),
        };
        let attributes = staged.serialize().map_err(|e| {
            tracing::warn!(error = %e, "failed to encode room info");
            RoomError::Failed
        })?;
        Ok((next, attributes))
    }
}
