//! The caller-facing side of the session actor.

use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};
use voxroom_events::EventBroadcastRegistry;
use voxroom_protocol::{RoomInfo, SeatModel, UserInfo};
use voxroom_room::{RoomConfig, RoomError};
use voxroom_service::{MediaService, SignalingService};

use crate::actor::{SessionActor, SessionCommand};
use crate::{SessionConfig, SessionState};

/// Handle to a running session actor.
///
/// Cheap to clone. Every method waits for the actor's reply; once the
/// actor has stopped, every method reports [`RoomError::Failed`].
///
/// Dropping a pending call does not cancel it: the actor still completes
/// the operation and discards the reply.
#[derive(Clone)]
pub struct SessionHandle {
    sender: mpsc::Sender<SessionCommand>,
}

impl SessionHandle {
    async fn request<T>(
        &self,
        command: impl FnOnce(oneshot::Sender<T>) -> SessionCommand,
    ) -> Result<T, RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(command(reply_tx))
            .await
            .map_err(|_| RoomError::Failed)?;
        reply_rx.await.map_err(|_| RoomError::Failed)
    }

    /// Creates `room_id` with the local user as host and enters it.
    pub async fn create_room(
        &self,
        room_id: &str,
        room_name: &str,
        token: &str,
    ) -> Result<(), RoomError> {
        self.request(|reply| SessionCommand::CreateRoom {
            room_id: room_id.to_string(),
            room_name: room_name.to_string(),
            token: token.to_string(),
            reply,
        })
        .await?
    }

    /// Joins an existing room.
    pub async fn join_room(
        &self,
        room_id: &str,
        room_name: &str,
        token: &str,
    ) -> Result<(), RoomError> {
        self.request(|reply| SessionCommand::JoinRoom {
            room_id: room_id.to_string(),
            room_name: room_name.to_string(),
            token: token.to_string(),
            reply,
        })
        .await?
    }

    pub async fn leave_room(&self) -> Result<(), RoomError> {
        self.request(|reply| SessionCommand::LeaveRoom { reply })
            .await?
    }

    /// Number of members online in the current room.
    pub async fn query_online_user_count(&self) -> Result<u32, RoomError> {
        self.request(|reply| SessionCommand::QueryOnlineUserCount { reply })
            .await?
    }

    /// Turns text chat off (or back on) for the current room.
    ///
    /// The new value is only visible locally once the signaling service
    /// acknowledged the write.
    pub async fn disable_text_message(&self, disabled: bool) -> Result<(), RoomError> {
        self.request(|reply| SessionCommand::DisableTextMessage { disabled, reply })
            .await?
    }

    /// Re-reads the room's attributes from signaling and returns the
    /// resulting room info.
    pub async fn refresh_room_info(&self) -> Result<Option<RoomInfo>, RoomError> {
        self.request(|reply| SessionCommand::RefreshRoomInfo { reply })
            .await?
    }

    /// Drops all room state without contacting signaling.
    pub async fn reset(&self, including_identity: bool) -> Result<(), RoomError> {
        self.request(|reply| SessionCommand::Reset {
            including_identity,
            reply,
        })
        .await
    }

    pub async fn set_local_user(&self, user: UserInfo) -> Result<(), RoomError> {
        self.request(|reply| SessionCommand::SetLocalUser { user, reply })
            .await
    }

    pub async fn local_user(&self) -> Result<Option<UserInfo>, RoomError> {
        self.request(|reply| SessionCommand::GetLocalUser { reply })
            .await
    }

    pub async fn room_info(&self) -> Result<Option<RoomInfo>, RoomError> {
        self.request(|reply| SessionCommand::GetRoomInfo { reply })
            .await
    }

    pub async fn seats(&self) -> Result<Vec<SeatModel>, RoomError> {
        self.request(|reply| SessionCommand::GetSeats { reply })
            .await
    }

    pub async fn state(&self) -> Result<SessionState, RoomError> {
        self.request(|reply| SessionCommand::GetState { reply })
            .await
    }

    /// Resets everything, identity included, and stops the actor.
    pub async fn shutdown(&self) -> Result<(), RoomError> {
        self.request(|reply| SessionCommand::Shutdown { reply })
            .await
    }

    /// Returns `true` once the actor has stopped.
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }
}

/// Spawns a session actor driving `signaling` and `media`.
///
/// Installs the event sinks on both services before the actor starts, so
/// no event is lost. Every event the services deliver is broadcast
/// through `registry`.
pub fn spawn_session<S, M>(
    signaling: S,
    media: M,
    registry: Arc<EventBroadcastRegistry>,
    room_config: RoomConfig,
    config: SessionConfig,
) -> SessionHandle
where
    S: SignalingService,
    M: MediaService,
{
    let (tx, rx) = mpsc::channel(config.command_channel_size.max(1));
    let (signaling_tx, signaling_rx) = mpsc::unbounded_channel();
    let (media_tx, media_rx) = mpsc::unbounded_channel();
    signaling.set_event_sink(signaling_tx);
    media.set_event_sink(media_tx);

    let actor = SessionActor::new(
        signaling,
        media,
        registry,
        room_config.validated(),
        config,
        rx,
        signaling_rx,
        media_rx,
    );
    tokio::spawn(actor.run());

    SessionHandle { sender: tx }
}
