//! Collaborator interfaces for voxroom.
//!
//! voxroom does not move audio or messages itself. It drives two opaque
//! services through the traits defined here:
//!
//! - [`SignalingService`] — room membership, shared room attributes,
//!   member counts, and the connection/room/member event stream.
//! - [`MediaService`] — the real-time audio engine: media room login,
//!   stream playback, and sound-level monitoring.
//!
//! Both traits return `impl Future + Send` so the session actor that owns
//! them can run on any Tokio worker thread.
//!
//! # Feature Flags
//!
//! - `memory` (default) — in-process loopback implementations
//!   ([`MemorySignalingHub`], [`MemoryMedia`]) for tests and demos.

mod error;
mod events;
#[cfg(feature = "memory")]
mod memory;

pub use error::{codes, ServiceError};
pub use events::{
    AttributeAction, AttributesUpdate, ConnectionEvent, ConnectionState,
    MediaEvent, RoomConnectionState, RoomStateEvent, SignalingEvent,
    StreamInfo, StreamUpdateKind, TextMessage,
};
#[cfg(feature = "memory")]
pub use memory::{MediaCall, MemoryMedia, MemorySignaling, MemorySignalingHub};

use std::future::Future;
use std::time::Duration;

use tokio::sync::mpsc;
use voxroom_protocol::AttributeMap;

/// Where a service delivers its events.
///
/// Unbounded so that a service never waits on the session while the
/// session is itself waiting on the service.
pub type EventSink<E> = mpsc::UnboundedSender<E>;

/// The signaling-side description of a room.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomDescriptor {
    pub room_id: String,
    pub room_name: String,
}

/// Flags attached to a room attribute write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttributeSetConfig {
    /// Remove the written keys once the writer leaves the room.
    pub delete_after_owner_left: bool,
    /// Overwrite keys currently owned by another member.
    pub force: bool,
}

impl Default for AttributeSetConfig {
    fn default() -> Self {
        Self {
            delete_after_owner_left: true,
            force: false,
        }
    }
}

/// Room membership and shared-attribute storage.
pub trait SignalingService: Send + Sync + 'static {
    /// Installs the sink that receives every [`SignalingEvent`].
    fn set_event_sink(&self, sink: EventSink<SignalingEvent>);

    /// Creates a room and publishes its initial attributes.
    fn create_room(
        &self,
        room: &RoomDescriptor,
        attributes: &AttributeMap,
    ) -> impl Future<Output = Result<(), ServiceError>> + Send;

    /// Joins an existing room.
    fn join_room(
        &self,
        room_id: &str,
    ) -> impl Future<Output = Result<(), ServiceError>> + Send;

    /// Leaves a room.
    fn leave_room(
        &self,
        room_id: &str,
    ) -> impl Future<Output = Result<(), ServiceError>> + Send;

    /// Number of members currently online in the room.
    fn query_online_member_count(
        &self,
        room_id: &str,
    ) -> impl Future<Output = Result<u32, ServiceError>> + Send;

    /// Writes shared room attributes.
    fn set_room_attributes(
        &self,
        room_id: &str,
        attributes: &AttributeMap,
        config: AttributeSetConfig,
    ) -> impl Future<Output = Result<(), ServiceError>> + Send;

    /// Reads every shared room attribute.
    fn query_room_attributes(
        &self,
        room_id: &str,
    ) -> impl Future<Output = Result<AttributeMap, ServiceError>> + Send;
}

/// The real-time audio engine.
pub trait MediaService: Send + Sync + 'static {
    /// Installs the sink that receives every [`MediaEvent`].
    fn set_event_sink(&self, sink: EventSink<MediaEvent>);

    fn create_engine(&self) -> impl Future<Output = Result<(), ServiceError>> + Send;

    fn destroy_engine(&self) -> impl Future<Output = Result<(), ServiceError>> + Send;

    /// Logs `user_id` into the media room `room_id` using `token`.
    fn login_room(
        &self,
        room_id: &str,
        user_id: &str,
        token: &str,
    ) -> impl Future<Output = Result<(), ServiceError>> + Send;

    fn logout_room(&self) -> impl Future<Output = Result<(), ServiceError>> + Send;

    fn start_playing_stream(
        &self,
        stream_id: &str,
    ) -> impl Future<Output = Result<(), ServiceError>> + Send;

    fn stop_playing_stream(
        &self,
        stream_id: &str,
    ) -> impl Future<Output = Result<(), ServiceError>> + Send;

    /// Starts emitting sound-level events every `interval`.
    fn start_sound_level_monitor(
        &self,
        interval: Duration,
    ) -> impl Future<Output = Result<(), ServiceError>> + Send;
}
