//! Events emitted by the external services.
//!
//! Each service pushes its events into the [`EventSink`](crate::EventSink)
//! it was handed. Two variants of [`SignalingEvent`]
//! (`RoomInfoUpdated`, `SeatsUpdated`) are never produced by a service:
//! the session emits them after applying a state-bearing event so that
//! observers can re-read derived state without decoding attributes.

use std::collections::BTreeMap;

use voxroom_protocol::{AttributeMap, NetworkQuality, RoomInfo, SeatModel, UserInfo};

use crate::ServiceError;

// ---------------------------------------------------------------------------
// Signaling
// ---------------------------------------------------------------------------

/// Connection state of the signaling client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    Reconnecting,
}

/// Why the signaling connection state changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionEvent {
    Success,
    ActiveLogin,
    LoginTimeout,
    LoginInterrupted,
    KickedOut,
}

/// Membership state of the local user in a signaling room.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoomConnectionState {
    Disconnected,
    Connecting,
    Connected,
}

/// Why the room membership state changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoomStateEvent {
    Success,
    ActiveCreate,
    ActiveEnter,
    NetworkInterrupted,
    NetworkDisconnected,
    RoomNotExist,
    KickedOut,
}

/// Whether an attribute update wrote or removed keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeAction {
    Set,
    Delete,
}

/// A batch of room attribute changes.
///
/// For [`AttributeAction::Delete`] only the keys are meaningful.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributesUpdate {
    pub action: AttributeAction,
    pub attributes: AttributeMap,
}

/// A text message relayed by the signaling service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextMessage {
    pub sender_id: String,
    pub text: String,
}

/// Everything the signaling service can tell us.
#[derive(Debug, Clone, PartialEq)]
pub enum SignalingEvent {
    ConnectionStateChanged {
        state: ConnectionState,
        event: ConnectionEvent,
    },
    Error(ServiceError),
    TokenWillExpire {
        seconds: u32,
    },
    PeerMessage {
        from_user_id: String,
        messages: Vec<TextMessage>,
    },
    RoomMessage {
        room_id: String,
        messages: Vec<TextMessage>,
    },
    MemberJoined {
        room_id: String,
        members: Vec<UserInfo>,
    },
    MemberLeft {
        room_id: String,
        members: Vec<UserInfo>,
    },
    RoomStateChanged {
        room_id: String,
        state: RoomConnectionState,
        event: RoomStateEvent,
    },
    RoomAttributesUpdated {
        room_id: String,
        update: AttributesUpdate,
    },
    /// Emitted by the session after the room info changed. `None` once
    /// the room is gone.
    RoomInfoUpdated(Option<RoomInfo>),
    /// Emitted by the session after any seat changed.
    SeatsUpdated(Vec<SeatModel>),
}

// ---------------------------------------------------------------------------
// Media
// ---------------------------------------------------------------------------

/// Whether streams were published or withdrawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamUpdateKind {
    Add,
    Delete,
}

/// A remote audio stream and the user publishing it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamInfo {
    pub stream_id: String,
    pub user_id: String,
}

/// Everything the media service can tell us.
#[derive(Debug, Clone, PartialEq)]
pub enum MediaEvent {
    /// Level of the local microphone, `0.0..=100.0`.
    CapturedSoundLevel(f32),
    /// Levels of remote streams, keyed by stream ID.
    RemoteSoundLevels(BTreeMap<String, f32>),
    StreamUpdate {
        room_id: String,
        kind: StreamUpdateKind,
        streams: Vec<StreamInfo>,
    },
    NetworkQuality {
        user_id: String,
        quality: NetworkQuality,
    },
}
