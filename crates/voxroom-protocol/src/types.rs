//! Core models shared by every voxroom layer.
//!
//! These structures are what other room members see. The serde renames
//! are the interoperability contract with clients that already read the
//! `room_info` attribute, so the Rust field names and the wire names
//! deliberately differ.

use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// RoomInfo
// ---------------------------------------------------------------------------

/// Metadata of a single audio room.
///
/// Serialized as `{id, name, hostID, num, disable, close}`. Only `id` is
/// required on decode; every other key falls back to its default so that
/// older clients publishing a subset of the keys still parse.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomInfo {
    /// Unique room ID. Immutable once the room is created.
    #[serde(rename = "id")]
    pub room_id: String,

    /// Display name of the room.
    #[serde(rename = "name", default)]
    pub room_name: String,

    /// User ID of the host. Set once, when the room is created.
    #[serde(rename = "hostID", default)]
    pub host_id: String,

    /// Number of speaker seats. Fixed at creation.
    #[serde(rename = "num", default)]
    pub seat_num: u32,

    /// Whether text chat is disabled for everyone but the host.
    #[serde(rename = "disable", default)]
    pub is_text_message_disabled: bool,

    /// Whether all seats are closed.
    #[serde(rename = "close", default)]
    pub is_seat_closed: bool,
}

impl RoomInfo {
    /// Builds the info for a freshly created room hosted by `host_id`.
    ///
    /// An empty `room_name` falls back to the room ID.
    pub fn new_hosted(
        room_id: &str,
        room_name: &str,
        host_id: &str,
        seat_num: u32,
    ) -> Self {
        let room_name = if room_name.is_empty() {
            room_id
        } else {
            room_name
        };
        Self {
            room_id: room_id.to_string(),
            room_name: room_name.to_string(),
            host_id: host_id.to_string(),
            seat_num,
            is_text_message_disabled: false,
            is_seat_closed: false,
        }
    }

    /// Returns `true` if `user_id` hosts this room.
    pub fn is_host(&self, user_id: &str) -> bool {
        !self.host_id.is_empty() && self.host_id == user_id
    }
}

// ---------------------------------------------------------------------------
// Seats
// ---------------------------------------------------------------------------

/// Occupancy status of a speaker seat.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeatStatus {
    #[default]
    Untaken,
    Occupied,
    Closed,
}

impl fmt::Display for SeatStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Untaken => write!(f, "untaken"),
            Self::Occupied => write!(f, "occupied"),
            Self::Closed => write!(f, "closed"),
        }
    }
}

/// Network quality reported by the media service for a seated user.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NetworkQuality {
    #[default]
    Good,
    Medium,
    Bad,
}

/// One speaker seat.
///
/// Only `userID`, `index`, `isMicMuted` and `status` travel on the wire.
/// `sound_level` and `network_quality` are fed locally from media events
/// and are never published.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeatModel {
    /// The seated user. `None` means nobody sits here.
    #[serde(rename = "userID", default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,

    /// Position of the seat in `[0, seat_num)`.
    pub index: u32,

    #[serde(rename = "isMicMuted", default)]
    pub is_mic_muted: bool,

    #[serde(default)]
    pub status: SeatStatus,

    /// Microphone level in `[0, 100]`.
    #[serde(skip)]
    pub sound_level: u8,

    #[serde(skip)]
    pub network_quality: NetworkQuality,
}

impl SeatModel {
    /// An empty seat at `index`.
    pub fn untaken(index: u32) -> Self {
        Self {
            index,
            ..Self::default()
        }
    }

    /// Returns `true` if `user_id` sits on this seat.
    pub fn is_taken_by(&self, user_id: &str) -> bool {
        self.user_id.as_deref() == Some(user_id)
    }
}

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

/// Role of a user inside a room.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    #[default]
    Listener,
    Speaker,
    Host,
}

/// Identity of a room member.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserInfo {
    #[serde(rename = "userID")]
    pub user_id: String,

    #[serde(rename = "userName", default)]
    pub user_name: String,

    #[serde(default)]
    pub role: UserRole,
}

impl UserInfo {
    /// A listener with the given ID and name.
    pub fn new(user_id: impl Into<String>, user_name: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            user_name: user_name.into(),
            role: UserRole::Listener,
        }
    }
}

impl fmt::Display for UserInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.user_id)
    }
}
