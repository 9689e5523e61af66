//! The session actor: one Tokio task that owns a user's room presence.
//!
//! Commands from [`SessionHandle`](crate::SessionHandle)s and events from
//! the two services are applied strictly one at a time, so the room state,
//! the seat table and the media bookkeeping are never touched from two
//! places at once. The only suspension points are the service calls.

use std::collections::HashMap;
use std::ops::ControlFlow;
use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};
use voxroom_events::{EventBroadcastRegistry, RoomEvent};
use voxroom_protocol::{
    AttributeMap, RoomInfo, SeatModel, UserInfo, UserRole, ROOM_INFO_KEY,
};
use voxroom_room::{RoomConfig, RoomError, RoomStateStore, SpeakerSeatRegistry, UpdateMode};
use voxroom_service::{
    AttributeAction, MediaEvent, MediaService, RoomConnectionState, RoomDescriptor,
    ServiceError, SignalingEvent, SignalingService, StreamInfo, StreamUpdateKind,
};

use crate::{SessionConfig, SessionState};

/// Reply channel of a fallible command.
pub(crate) type Reply<T> = oneshot::Sender<Result<T, RoomError>>;

/// Requests a [`SessionHandle`](crate::SessionHandle) sends to the actor.
///
/// Every variant carries a reply channel and is answered exactly once.
pub(crate) enum SessionCommand {
    CreateRoom {
        room_id: String,
        room_name: String,
        token: String,
        reply: Reply<()>,
    },
    JoinRoom {
        room_id: String,
        room_name: String,
        token: String,
        reply: Reply<()>,
    },
    LeaveRoom {
        reply: Reply<()>,
    },
    QueryOnlineUserCount {
        reply: Reply<u32>,
    },
    DisableTextMessage {
        disabled: bool,
        reply: Reply<()>,
    },
    RefreshRoomInfo {
        reply: Reply<Option<RoomInfo>>,
    },
    Reset {
        including_identity: bool,
        reply: oneshot::Sender<()>,
    },
    SetLocalUser {
        user: UserInfo,
        reply: oneshot::Sender<()>,
    },
    GetLocalUser {
        reply: oneshot::Sender<Option<UserInfo>>,
    },
    GetRoomInfo {
        reply: oneshot::Sender<Option<RoomInfo>>,
    },
    GetSeats {
        reply: oneshot::Sender<Vec<SeatModel>>,
    },
    GetState {
        reply: oneshot::Sender<SessionState>,
    },
    /// Reset including identity, then stop the actor.
    Shutdown {
        reply: oneshot::Sender<()>,
    },
}

/// Everything scoped to one stay in one room.
///
/// Replaced wholesale on reset, so nothing from a previous room survives.
#[derive(Debug, Default)]
struct SessionComponents {
    /// The signaling room we are a member of. Outlives the room info,
    /// which remote updates may delete.
    room_id: Option<String>,
    store: RoomStateStore,
    seats: SpeakerSeatRegistry,
    /// Remote stream ID → publishing user ID.
    streams: HashMap<String, String>,
}

/// What applying one attribute payload did.
#[derive(Debug, Default)]
struct Applied {
    info_changed: bool,
    seats_changed: bool,
    /// First rejection, if any part of the payload was refused.
    rejected: Option<RoomError>,
}

pub(crate) struct SessionActor<S, M> {
    signaling: S,
    media: M,
    registry: Arc<EventBroadcastRegistry>,
    room_config: RoomConfig,
    config: SessionConfig,
    state: SessionState,
    local_user: Option<UserInfo>,
    components: SessionComponents,
    /// Whether the media engine has been created and not yet torn down.
    media_active: bool,
    commands: mpsc::Receiver<SessionCommand>,
    signaling_events: mpsc::UnboundedReceiver<SignalingEvent>,
    media_events: mpsc::UnboundedReceiver<MediaEvent>,
}

impl<S: SignalingService, M: MediaService> SessionActor<S, M> {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        signaling: S,
        media: M,
        registry: Arc<EventBroadcastRegistry>,
        room_config: RoomConfig,
        config: SessionConfig,
        commands: mpsc::Receiver<SessionCommand>,
        signaling_events: mpsc::UnboundedReceiver<SignalingEvent>,
        media_events: mpsc::UnboundedReceiver<MediaEvent>,
    ) -> Self {
        Self {
            signaling,
            media,
            registry,
            room_config,
            config,
            state: SessionState::Uninitialized,
            local_user: None,
            components: SessionComponents::default(),
            media_active: false,
            commands,
            signaling_events,
            media_events,
        }
    }

    /// Runs until shutdown or until every handle is dropped.
    ///
    /// Pending service events are drained before the next command, so a
    /// command always observes every event delivered before it was sent.
    pub(crate) async fn run(mut self) {
        tracing::info!("session actor started");

        loop {
            tokio::select! {
                biased;
                Some(event) = self.signaling_events.recv() => {
                    self.on_signaling_event(event).await;
                }
                Some(event) = self.media_events.recv() => {
                    self.on_media_event(event).await;
                }
                cmd = self.commands.recv() => match cmd {
                    Some(cmd) => {
                        if self.handle_command(cmd).await.is_break() {
                            break;
                        }
                    }
                    None => {
                        tracing::debug!("all session handles dropped");
                        self.reset(true).await;
                        break;
                    }
                },
            }
        }

        tracing::info!("session actor stopped");
    }

    async fn handle_command(&mut self, cmd: SessionCommand) -> ControlFlow<()> {
        match cmd {
            SessionCommand::CreateRoom {
                room_id,
                room_name,
                token,
                reply,
            } => {
                let result = self.create_room(room_id, room_name, token).await;
                let _ = reply.send(result);
            }
            SessionCommand::JoinRoom {
                room_id,
                room_name,
                token,
                reply,
            } => {
                let result = self.join_room(room_id, room_name, token).await;
                let _ = reply.send(result);
            }
            SessionCommand::LeaveRoom { reply } => {
                let result = self.leave_room().await;
                let _ = reply.send(result);
            }
            SessionCommand::QueryOnlineUserCount { reply } => {
                let result = self.query_online_user_count().await;
                let _ = reply.send(result);
            }
            SessionCommand::DisableTextMessage { disabled, reply } => {
                let result = self.disable_text_message(disabled).await;
                let _ = reply.send(result);
            }
            SessionCommand::RefreshRoomInfo { reply } => {
                let result = self.refresh_room_info().await;
                let _ = reply.send(result);
            }
            SessionCommand::Reset {
                including_identity,
                reply,
            } => {
                self.reset(including_identity).await;
                let _ = reply.send(());
            }
            SessionCommand::SetLocalUser { user, reply } => {
                tracing::debug!(user_id = %user.user_id, "local user set");
                self.local_user = Some(user);
                let _ = reply.send(());
            }
            SessionCommand::GetLocalUser { reply } => {
                let _ = reply.send(self.local_user.clone());
            }
            SessionCommand::GetRoomInfo { reply } => {
                let _ = reply.send(self.components.store.current_info().cloned());
            }
            SessionCommand::GetSeats { reply } => {
                let _ = reply.send(self.components.seats.seats().to_vec());
            }
            SessionCommand::GetState { reply } => {
                let _ = reply.send(self.state);
            }
            SessionCommand::Shutdown { reply } => {
                tracing::info!("session shutting down");
                self.reset(true).await;
                let _ = reply.send(());
                return ControlFlow::Break(());
            }
        }
        ControlFlow::Continue(())
    }

    // -----------------------------------------------------------------------
    // Operations
    // -----------------------------------------------------------------------

    async fn create_room(
        &mut self,
        room_id: String,
        room_name: String,
        token: String,
    ) -> Result<(), RoomError> {
        if self.is_current_room(&room_id) {
            tracing::warn!(%room_id, state = %self.state, "room already created");
            return Err(RoomError::RoomExisted);
        }
        let user = self.entry_user(&room_id)?;
        let info = RoomInfo::new_hosted(
            &room_id,
            &room_name,
            &user.user_id,
            self.room_config.seat_num,
        );
        let mut store = RoomStateStore::new();
        store.set_info(info.clone());
        let attributes = store.serialize().map_err(|e| {
            tracing::warn!(%room_id, error = %e, "failed to encode room info");
            RoomError::Failed
        })?;
        let descriptor = RoomDescriptor {
            room_id: room_id.clone(),
            room_name: info.room_name.clone(),
        };
        self.signaling
            .create_room(&descriptor, &attributes)
            .await
            .map_err(|e| service_failure("create_room", &room_id, e))?;

        let mut seats = SpeakerSeatRegistry::with_layout(info.seat_num);
        if let Err(e) = seats.update_seats(&attributes, UpdateMode::Set) {
            tracing::warn!(%room_id, error = %e, "failed to seed seats");
        }
        self.components = SessionComponents {
            room_id: Some(room_id.clone()),
            store,
            seats,
            ..SessionComponents::default()
        };
        self.state = SessionState::Created;
        if let Some(local) = &mut self.local_user {
            local.role = UserRole::Host;
        }
        tracing::info!(
            %room_id,
            host_id = %user.user_id,
            seat_num = info.seat_num,
            "room created"
        );

        self.enter_media(&room_id, &user.user_id, &token).await?;
        self.dispatch(SignalingEvent::RoomInfoUpdated(Some(info)));
        self.dispatch(SignalingEvent::SeatsUpdated(
            self.components.seats.seats().to_vec(),
        ));
        Ok(())
    }

    async fn join_room(
        &mut self,
        room_id: String,
        room_name: String,
        token: String,
    ) -> Result<(), RoomError> {
        let user = self.entry_user(&room_id)?;
        self.signaling
            .join_room(&room_id)
            .await
            .map_err(|e| service_failure("join_room", &room_id, e))?;

        let room_name = if room_name.is_empty() {
            room_id.clone()
        } else {
            room_name
        };
        self.components = SessionComponents {
            room_id: Some(room_id.clone()),
            ..SessionComponents::default()
        };
        self.components.store.set_identity(&room_id, &room_name);
        self.state = SessionState::Joined;
        if let Some(local) = &mut self.local_user {
            local.role = UserRole::Listener;
        }
        tracing::info!(%room_id, user_id = %user.user_id, "room joined");

        self.enter_media(&room_id, &user.user_id, &token).await
    }

    async fn leave_room(&mut self) -> Result<(), RoomError> {
        let room_id = self.require_room("leave_room")?;
        self.signaling
            .leave_room(&room_id)
            .await
            .map_err(|e| service_failure("leave_room", &room_id, e))?;

        self.reset(false).await;
        self.state = SessionState::Left;
        tracing::info!(%room_id, "room left");
        Ok(())
    }

    async fn query_online_user_count(&mut self) -> Result<u32, RoomError> {
        let room_id = self.require_room("query_online_user_count")?;
        self.signaling
            .query_online_member_count(&room_id)
            .await
            .map_err(|e| service_failure("query_online_member_count", &room_id, e))
    }

    /// Publishes the toggled room info and commits it once acknowledged.
    async fn disable_text_message(&mut self, disabled: bool) -> Result<(), RoomError> {
        let room_id = self.require_room("disable_text_message")?;
        let (next, attributes) = self.components.store.with_text_message_disabled(disabled)?;
        self.signaling
            .set_room_attributes(
                &room_id,
                &attributes,
                self.room_config.attribute_set_config(),
            )
            .await
            .map_err(|e| service_failure("set_room_attributes", &room_id, e))?;

        self.components.store.set_info(next.clone());
        tracing::info!(%room_id, disabled, "text messages toggled");
        self.dispatch(SignalingEvent::RoomInfoUpdated(Some(next)));
        Ok(())
    }

    /// Re-reads the room attributes and applies them as a remote update.
    async fn refresh_room_info(&mut self) -> Result<Option<RoomInfo>, RoomError> {
        let room_id = self.require_room("refresh_room_info")?;
        let attributes = self
            .signaling
            .query_room_attributes(&room_id)
            .await
            .map_err(|e| service_failure("query_room_attributes", &room_id, e))?;

        let applied = self.apply_attributes(AttributeAction::Set, &attributes);
        self.publish_changes(&applied);
        match applied.rejected {
            Some(err) => Err(err),
            None => Ok(self.components.store.current_info().cloned()),
        }
    }

    /// Drops all room-scoped state and tears down the media session.
    async fn reset(&mut self, including_identity: bool) {
        self.stop_media().await;
        self.components = SessionComponents::default();
        self.state = SessionState::Uninitialized;
        if including_identity {
            self.local_user = None;
        } else if let Some(local) = &mut self.local_user {
            local.role = UserRole::Listener;
        }
        tracing::info!(including_identity, "session reset");
    }

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    /// Checks the preconditions shared by create and join.
    fn entry_user(&self, room_id: &str) -> Result<UserInfo, RoomError> {
        if room_id.is_empty() {
            tracing::warn!("room id is empty");
            return Err(RoomError::ParamInvalid);
        }
        let Some(user) = self.local_user.clone() else {
            tracing::warn!(%room_id, "no local user set");
            return Err(RoomError::Failed);
        };
        if !self.state.can_enter() {
            tracing::warn!(%room_id, state = %self.state, "already in a room");
            return Err(RoomError::Failed);
        }
        Ok(user)
    }

    fn require_room(&self, op: &'static str) -> Result<String, RoomError> {
        match &self.components.room_id {
            Some(room_id) if self.state.is_in_room() => Ok(room_id.clone()),
            _ => {
                tracing::warn!(op, state = %self.state, "called outside a room");
                Err(RoomError::Failed)
            }
        }
    }

    fn is_current_room(&self, room_id: &str) -> bool {
        self.components.room_id.as_deref() == Some(room_id)
    }

    /// Starts media for the room just entered, rolling the entry back if
    /// the engine can't be brought up.
    async fn enter_media(
        &mut self,
        room_id: &str,
        user_id: &str,
        token: &str,
    ) -> Result<(), RoomError> {
        let Err(err) = self.start_media(room_id, user_id, token).await else {
            return Ok(());
        };
        tracing::error!(%room_id, error = %err, "media start failed, leaving room");
        if let Err(e) = self.signaling.leave_room(room_id).await {
            tracing::error!(%room_id, error = %e, "leave after media failure failed");
        }
        self.reset(false).await;
        Err(RoomError::Other(err.code))
    }

    async fn start_media(
        &mut self,
        room_id: &str,
        user_id: &str,
        token: &str,
    ) -> Result<(), ServiceError> {
        self.media.create_engine().await?;
        self.media_active = true;
        self.media.login_room(room_id, user_id, token).await?;
        self.media
            .start_sound_level_monitor(self.config.sound_level_interval)
            .await?;
        tracing::debug!(%room_id, "media session started");
        Ok(())
    }

    async fn stop_media(&mut self) {
        if !self.media_active {
            return;
        }
        self.media_active = false;
        if let Err(e) = self.media.logout_room().await {
            tracing::error!(error = %e, "media logout failed");
        }
        if let Err(e) = self.media.destroy_engine().await {
            tracing::error!(error = %e, "failed to destroy media engine");
        }
        tracing::debug!("media session stopped");
    }

    /// Applies one attribute payload for the current room.
    ///
    /// Room info and seats are applied independently: a rejected room
    /// info does not keep valid seats out, and vice versa.
    fn apply_attributes(&mut self, action: AttributeAction, attributes: &AttributeMap) -> Applied {
        let mut applied = Applied::default();
        let parts = &mut self.components;

        match action {
            AttributeAction::Set => {
                match parts.store.apply_remote_attributes(attributes) {
                    Ok(changed) => applied.info_changed = changed,
                    Err(e) => {
                        tracing::warn!(error = %e, "rejected remote room info");
                        applied.rejected = Some(RoomError::ParamInvalid);
                    }
                }
                let seat_num = parts.store.current_info().map_or(0, |i| i.seat_num);
                if seat_num != 0 && parts.seats.resize(seat_num) {
                    applied.seats_changed = true;
                }
                match parts.seats.update_seats(attributes, UpdateMode::Merge) {
                    Ok(changed) => applied.seats_changed |= changed,
                    Err(e) => {
                        tracing::warn!(error = %e, "rejected remote seat update");
                        applied.rejected.get_or_insert(e.into());
                    }
                }
            }
            AttributeAction::Delete => {
                if attributes.contains_key(ROOM_INFO_KEY) {
                    applied.info_changed = parts.store.clear();
                }
                match parts.seats.clear_seats(attributes.keys()) {
                    Ok(changed) => applied.seats_changed = changed,
                    Err(e) => {
                        tracing::warn!(error = %e, "rejected remote seat deletion");
                        applied.rejected.get_or_insert(e.into());
                    }
                }
            }
        }
        applied
    }

    fn publish_changes(&self, applied: &Applied) {
        if applied.info_changed {
            self.dispatch(SignalingEvent::RoomInfoUpdated(
                self.components.store.current_info().cloned(),
            ));
        }
        if applied.seats_changed {
            self.publish_seats();
        }
    }

    fn publish_seats(&self) {
        self.dispatch(SignalingEvent::SeatsUpdated(
            self.components.seats.seats().to_vec(),
        ));
    }

    fn dispatch(&self, event: impl Into<RoomEvent>) {
        let event = event.into();
        let notified = self.registry.dispatch(&event);
        tracing::trace!(domain = %event.domain(), notified, "event dispatched");
    }

    // -----------------------------------------------------------------------
    // Inbound events
    // -----------------------------------------------------------------------

    async fn on_signaling_event(&mut self, event: SignalingEvent) {
        let applied = match &event {
            SignalingEvent::RoomAttributesUpdated { room_id, update }
                if self.is_current_room(room_id) =>
            {
                tracing::debug!(
                    %room_id,
                    action = ?update.action,
                    keys = update.attributes.len(),
                    "room attributes updated"
                );
                Some(self.apply_attributes(update.action, &update.attributes))
            }
            _ => None,
        };
        let disconnected = matches!(
            &event,
            SignalingEvent::RoomStateChanged {
                room_id,
                state: RoomConnectionState::Disconnected,
                ..
            } if self.is_current_room(room_id)
        );

        self.dispatch(event);
        if let Some(applied) = applied {
            self.publish_changes(&applied);
        }
        if disconnected {
            tracing::info!(room_id = ?self.components.room_id, "disconnected from room by service");
            self.reset(false).await;
        }
    }

    async fn on_media_event(&mut self, event: MediaEvent) {
        let parts = &mut self.components;
        let seats_changed = match &event {
            MediaEvent::CapturedSoundLevel(level) => match &self.local_user {
                Some(user) => parts.seats.set_sound_level(&user.user_id, *level),
                None => false,
            },
            MediaEvent::RemoteSoundLevels(levels) => {
                let mut changed = false;
                for (stream_id, level) in levels {
                    if let Some(user_id) = parts.streams.get(stream_id) {
                        changed |= parts.seats.set_sound_level(user_id, *level);
                    }
                }
                changed
            }
            MediaEvent::NetworkQuality { user_id, quality } => {
                parts.seats.set_network_quality(user_id, *quality)
            }
            MediaEvent::StreamUpdate { .. } => false,
        };
        let stream_update = match &event {
            MediaEvent::StreamUpdate {
                room_id,
                kind,
                streams,
            } if self.is_current_room(room_id) => Some((*kind, streams.clone())),
            _ => None,
        };

        self.dispatch(event);
        if seats_changed {
            self.publish_seats();
        }
        if let Some((kind, streams)) = stream_update {
            self.apply_stream_update(kind, streams).await;
        }
    }

    /// Starts or stops playback and keeps the stream → user map current.
    async fn apply_stream_update(&mut self, kind: StreamUpdateKind, streams: Vec<StreamInfo>) {
        for stream in streams {
            match kind {
                StreamUpdateKind::Add => {
                    let result = self.media.start_playing_stream(&stream.stream_id).await;
                    if let Err(e) = result {
                        tracing::warn!(
                            stream_id = %stream.stream_id,
                            error = %e,
                            "failed to play stream"
                        );
                    }
                    self.components.streams.insert(stream.stream_id, stream.user_id);
                }
                StreamUpdateKind::Delete => {
                    let result = self.media.stop_playing_stream(&stream.stream_id).await;
                    if let Err(e) = result {
                        tracing::warn!(
                            stream_id = %stream.stream_id,
                            error = %e,
                            "failed to stop stream"
                        );
                    }
                    self.components.streams.remove(&stream.stream_id);
                }
            }
        }
    }
}

fn service_failure(op: &'static str, room_id: &str, err: ServiceError) -> RoomError {
    tracing::warn!(op, %room_id, code = err.code, error = %err, "service request failed");
    RoomError::from(err)
}
