//! The room operations an application calls.

use voxroom_protocol::{RoomInfo, SeatModel, UserInfo};
use voxroom_room::RoomError;
use voxroom_session::{SessionHandle, SessionState};

/// Room operations for the local user.
///
/// Obtained from [`AudioRoomContext::room_service`](crate::AudioRoomContext::room_service).
/// Cheap to clone; all clones drive the same session. Operations run one
/// at a time in call order, and every call gets exactly one result.
#[derive(Clone)]
pub struct RoomService {
    session: SessionHandle,
}

impl RoomService {
    pub(crate) fn new(session: SessionHandle) -> Self {
        Self { session }
    }

    /// Creates a room hosted by the local user and enters it.
    ///
    /// # Errors
    /// - [`RoomError::ParamInvalid`] for an empty `room_id`.
    /// - [`RoomError::Failed`] without a local user, or while in another room.
    /// - [`RoomError::RoomExisted`] if the ID is taken.
    /// - [`RoomError::Other`] for any other signaling or media failure.
    pub async fn create_room(
        &self,
        room_id: &str,
        room_name: &str,
        token: &str,
    ) -> Result<(), RoomError> {
        self.session.create_room(room_id, room_name, token).await
    }

    /// Joins an existing room as a listener.
    ///
    /// Room info and seats arrive shortly after through the attribute
    /// stream; listen for `RoomInfoUpdated` / `SeatsUpdated`.
    pub async fn join_room(
        &self,
        room_id: &str,
        room_name: &str,
        token: &str,
    ) -> Result<(), RoomError> {
        self.session.join_room(room_id, room_name, token).await
    }

    pub async fn leave_room(&self) -> Result<(), RoomError> {
        self.session.leave_room().await
    }

    pub async fn query_online_user_count(&self) -> Result<u32, RoomError> {
        self.session.query_online_user_count().await
    }

    /// Disables (or re-enables) text chat in the current room.
    pub async fn disable_text_message(&self, disabled: bool) -> Result<(), RoomError> {
        self.session.disable_text_message(disabled).await
    }

    pub async fn refresh_room_info(&self) -> Result<Option<RoomInfo>, RoomError> {
        self.session.refresh_room_info().await
    }

    pub async fn room_info(&self) -> Result<Option<RoomInfo>, RoomError> {
        self.session.room_info().await
    }

    pub async fn seats(&self) -> Result<Vec<SeatModel>, RoomError> {
        self.session.seats().await
    }

    pub async fn state(&self) -> Result<SessionState, RoomError> {
        self.session.state().await
    }

    /// Sets who the local user is. Required before create or join.
    pub async fn set_local_user(&self, user: UserInfo) -> Result<(), RoomError> {
        self.session.set_local_user(user).await
    }

    pub async fn local_user(&self) -> Result<Option<UserInfo>, RoomError> {
        self.session.local_user().await
    }
}
