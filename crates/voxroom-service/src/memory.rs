//! In-process loopback services.
//!
//! [`MemorySignalingHub`] plays the signaling backend for any number of
//! users in the same process: each [`MemorySignaling`] client it hands out
//! behaves like one logged-in user. [`MemoryMedia`] is a single user's
//! audio engine that records every call and lets tests inject events.
//!
//! Both support one-shot fault injection through `fail_next`.

use std::collections::{BTreeSet, HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use voxroom_protocol::{AttributeMap, UserInfo};

use crate::{
    codes, AttributeAction, AttributeSetConfig, AttributesUpdate, EventSink,
    MediaEvent, MediaService, RoomConnectionState, RoomDescriptor,
    RoomStateEvent, ServiceError, SignalingEvent, SignalingService,
};

// ---------------------------------------------------------------------------
// Signaling
// ---------------------------------------------------------------------------

struct AttributeOwner {
    user_id: String,
    delete_after_owner_left: bool,
}

struct HubRoom {
    room_name: String,
    members: Vec<UserInfo>,
    attributes: AttributeMap,
    owners: HashMap<String, AttributeOwner>,
}

impl HubRoom {
    fn is_member(&self, user_id: &str) -> bool {
        self.members.iter().any(|m| m.user_id == user_id)
    }
}

#[derive(Default)]
struct HubState {
    rooms: HashMap<String, HubRoom>,
    sinks: HashMap<String, EventSink<SignalingEvent>>,
}

impl HubState {
    fn send_to(&self, user_id: &str, event: SignalingEvent) {
        if let Some(sink) = self.sinks.get(user_id) {
            // A closed sink means that user's session is gone.
            let _ = sink.send(event);
        }
    }

    fn broadcast(&self, members: &[UserInfo], except: Option<&str>, event: &SignalingEvent) {
        for member in members {
            if Some(member.user_id.as_str()) != except {
                self.send_to(&member.user_id, event.clone());
            }
        }
    }
}

/// A shared in-memory signaling backend.
///
/// Cheap to clone; every clone talks to the same rooms.
#[derive(Clone, Default)]
pub struct MemorySignalingHub {
    state: Arc<Mutex<HubState>>,
}

impl MemorySignalingHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a signaling client logged in as `user`.
    pub fn connect(&self, user: UserInfo) -> MemorySignaling {
        MemorySignaling {
            user,
            hub: self.clone(),
            failures: Arc::new(Mutex::new(VecDeque::new())),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Pushes an arbitrary event to `user_id`, as if the backend sent it.
    pub fn emit_to(&self, user_id: &str, event: SignalingEvent) {
        self.state.lock().send_to(user_id, event);
    }

    /// Whether a room with this ID exists.
    pub fn has_room(&self, room_id: &str) -> bool {
        self.state.lock().rooms.contains_key(room_id)
    }

    /// User IDs of the room's members, in join order.
    pub fn members(&self, room_id: &str) -> Vec<String> {
        self.state
            .lock()
            .rooms
            .get(room_id)
            .map(|r| r.members.iter().map(|m| m.user_id.clone()).collect())
            .unwrap_or_default()
    }

    /// Current attributes of the room (empty if it doesn't exist).
    pub fn room_attributes(&self, room_id: &str) -> AttributeMap {
        self.state
            .lock()
            .rooms
            .get(room_id)
            .map(|r| r.attributes.clone())
            .unwrap_or_default()
    }

    /// Display name the room was created with.
    pub fn room_name(&self, room_id: &str) -> Option<String> {
        self.state
            .lock()
            .rooms
            .get(room_id)
            .map(|r| r.room_name.clone())
    }
}

/// One user's connection to a [`MemorySignalingHub`].
#[derive(Clone)]
pub struct MemorySignaling {
    user: UserInfo,
    hub: MemorySignalingHub,
    failures: Arc<Mutex<VecDeque<ServiceError>>>,
    requests: Arc<Mutex<Vec<&'static str>>>,
}

impl MemorySignaling {
    /// The user this client is logged in as.
    pub fn user(&self) -> &UserInfo {
        &self.user
    }

    /// Makes the next request fail with `code`.
    pub fn fail_next(&self, code: i32) {
        self.failures
            .lock()
            .push_back(ServiceError::new(code, "injected failure"));
    }

    /// Names of every request issued so far, oldest first.
    pub fn requests(&self) -> Vec<&'static str> {
        self.requests.lock().clone()
    }

    fn begin(&self, op: &'static str) -> Result<(), ServiceError> {
        self.requests.lock().push(op);
        match self.failures.lock().pop_front() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn user_id(&self) -> &str {
        &self.user.user_id
    }
}

fn room_not_exist(room_id: &str) -> ServiceError {
    ServiceError::new(codes::ROOM_NOT_EXIST, format!("room {room_id} does not exist"))
}

fn not_in_room(room_id: &str) -> ServiceError {
    ServiceError::new(codes::NOT_IN_ROOM, format!("not a member of room {room_id}"))
}

impl SignalingService for MemorySignaling {
    fn set_event_sink(&self, sink: EventSink<SignalingEvent>) {
        self.hub
            .state
            .lock()
            .sinks
            .insert(self.user.user_id.clone(), sink);
    }

    async fn create_room(
        &self,
        room: &RoomDescriptor,
        attributes: &AttributeMap,
    ) -> Result<(), ServiceError> {
        self.begin("create_room")?;
        let mut state = self.hub.state.lock();
        if state.rooms.contains_key(&room.room_id) {
            return Err(ServiceError::new(
                codes::ROOM_ALREADY_EXISTS,
                format!("room {} already exists", room.room_id),
            ));
        }

        let owners = attributes
            .keys()
            .map(|k| {
                let owner = AttributeOwner {
                    user_id: self.user.user_id.clone(),
                    delete_after_owner_left: true,
                };
                (k.clone(), owner)
            })
            .collect();
        state.rooms.insert(
            room.room_id.clone(),
            HubRoom {
                room_name: room.room_name.clone(),
                members: vec![self.user.clone()],
                attributes: attributes.clone(),
                owners,
            },
        );
        tracing::debug!(room_id = %room.room_id, user_id = %self.user, "hub: room created");

        state.send_to(
            self.user_id(),
            SignalingEvent::RoomStateChanged {
                room_id: room.room_id.clone(),
                state: RoomConnectionState::Connected,
                event: RoomStateEvent::ActiveCreate,
            },
        );
        Ok(())
    }

    async fn join_room(&self, room_id: &str) -> Result<(), ServiceError> {
        self.begin("join_room")?;
        let mut state = self.hub.state.lock();
        let room = state
            .rooms
            .get_mut(room_id)
            .ok_or_else(|| room_not_exist(room_id))?;
        if room.is_member(self.user_id()) {
            return Ok(());
        }
        room.members.push(self.user.clone());
        let members = room.members.clone();
        let attributes = room.attributes.clone();
        tracing::debug!(%room_id, user_id = %self.user, "hub: member joined");

        state.broadcast(
            &members,
            Some(self.user_id()),
            &SignalingEvent::MemberJoined {
                room_id: room_id.to_string(),
                members: vec![self.user.clone()],
            },
        );
        state.send_to(
            self.user_id(),
            SignalingEvent::RoomStateChanged {
                room_id: room_id.to_string(),
                state: RoomConnectionState::Connected,
                event: RoomStateEvent::ActiveEnter,
            },
        );
        if !attributes.is_empty() {
            state.send_to(
                self.user_id(),
                SignalingEvent::RoomAttributesUpdated {
                    room_id: room_id.to_string(),
                    update: AttributesUpdate {
                        action: AttributeAction::Set,
                        attributes,
                    },
                },
            );
        }
        Ok(())
    }

    async fn leave_room(&self, room_id: &str) -> Result<(), ServiceError> {
        self.begin("leave_room")?;
        let mut state = self.hub.state.lock();
        let room = state
            .rooms
            .get_mut(room_id)
            .ok_or_else(|| room_not_exist(room_id))?;
        if !room.is_member(self.user_id()) {
            return Err(not_in_room(room_id));
        }
        let user_id = self.user.user_id.clone();
        room.members.retain(|m| m.user_id != user_id);

        let dropped: Vec<String> = room
            .owners
            .iter()
            .filter(|(_, o)| o.user_id == user_id && o.delete_after_owner_left)
            .map(|(k, _)| k.clone())
            .collect();
        let mut deleted = AttributeMap::new();
        for key in dropped {
            room.owners.remove(&key);
            if let Some(value) = room.attributes.remove(&key) {
                deleted.insert(key, value);
            }
        }
        let members = room.members.clone();
        let empty = members.is_empty();
        tracing::debug!(%room_id, %user_id, "hub: member left");

        if empty {
            state.rooms.remove(room_id);
            return Ok(());
        }
        if !deleted.is_empty() {
            state.broadcast(
                &members,
                None,
                &SignalingEvent::RoomAttributesUpdated {
                    room_id: room_id.to_string(),
                    update: AttributesUpdate {
                        action: AttributeAction::Delete,
                        attributes: deleted,
                    },
                },
            );
        }
        state.broadcast(
            &members,
            None,
            &SignalingEvent::MemberLeft {
                room_id: room_id.to_string(),
                members: vec![self.user.clone()],
            },
        );
        Ok(())
    }

    async fn query_online_member_count(&self, room_id: &str) -> Result<u32, ServiceError> {
        self.begin("query_online_member_count")?;
        let state = self.hub.state.lock();
        let room = state
            .rooms
            .get(room_id)
            .ok_or_else(|| room_not_exist(room_id))?;
        Ok(u32::try_from(room.members.len()).unwrap_or(u32::MAX))
    }

    async fn set_room_attributes(
        &self,
        room_id: &str,
        attributes: &AttributeMap,
        config: AttributeSetConfig,
    ) -> Result<(), ServiceError> {
        self.begin("set_room_attributes")?;
        let mut state = self.hub.state.lock();
        let room = state
            .rooms
            .get_mut(room_id)
            .ok_or_else(|| room_not_exist(room_id))?;
        if !room.is_member(self.user_id()) {
            return Err(not_in_room(room_id));
        }
        if !config.force {
            let conflict = attributes.keys().find(|k| {
                room.owners
                    .get(*k)
                    .is_some_and(|o| o.user_id != self.user.user_id)
            });
            if let Some(key) = conflict {
                return Err(ServiceError::new(
                    codes::ATTRIBUTE_CONFLICT,
                    format!("attribute {key} is owned by another member"),
                ));
            }
        }

        for (key, value) in attributes {
            room.attributes.insert(key.clone(), value.clone());
            room.owners.insert(
                key.clone(),
                AttributeOwner {
                    user_id: self.user.user_id.clone(),
                    delete_after_owner_left: config.delete_after_owner_left,
                },
            );
        }
        let members = room.members.clone();
        state.broadcast(
            &members,
            None,
            &SignalingEvent::RoomAttributesUpdated {
                room_id: room_id.to_string(),
                update: AttributesUpdate {
                    action: AttributeAction::Set,
                    attributes: attributes.clone(),
                },
            },
        );
        Ok(())
    }

    async fn query_room_attributes(&self, room_id: &str) -> Result<AttributeMap, ServiceError> {
        self.begin("query_room_attributes")?;
        let state = self.hub.state.lock();
        state
            .rooms
            .get(room_id)
            .map(|r| r.attributes.clone())
            .ok_or_else(|| room_not_exist(room_id))
    }
}

// ---------------------------------------------------------------------------
// Media
// ---------------------------------------------------------------------------

/// One call made against a [`MemoryMedia`] engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaCall {
    CreateEngine,
    DestroyEngine,
    LoginRoom {
        room_id: String,
        user_id: String,
        token: String,
    },
    LogoutRoom,
    StartPlaying(String),
    StopPlaying(String),
    StartSoundLevelMonitor(Duration),
}

#[derive(Default)]
struct MediaState {
    engine_created: bool,
    room_id: Option<String>,
    playing: BTreeSet<String>,
    journal: Vec<MediaCall>,
    sink: Option<EventSink<MediaEvent>>,
    failures: VecDeque<ServiceError>,
}

impl MediaState {
    fn begin(&mut self, call: MediaCall) -> Result<(), ServiceError> {
        self.journal.push(call);
        match self.failures.pop_front() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn require_engine(&self) -> Result<(), ServiceError> {
        if self.engine_created {
            Ok(())
        } else {
            Err(ServiceError::new(codes::ENGINE_NOT_CREATED, "engine not created"))
        }
    }

    fn require_room(&self) -> Result<(), ServiceError> {
        self.require_engine()?;
        if self.room_id.is_some() {
            Ok(())
        } else {
            Err(ServiceError::new(codes::MEDIA_NOT_LOGGED_IN, "not logged into a media room"))
        }
    }
}

/// A loopback audio engine that records its calls.
///
/// Cheap to clone; clones share the journal, so a test can keep one clone
/// while the session owns the other.
#[derive(Clone, Default)]
pub struct MemoryMedia {
    state: Arc<Mutex<MediaState>>,
}

impl MemoryMedia {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every call made so far, oldest first.
    pub fn calls(&self) -> Vec<MediaCall> {
        self.state.lock().journal.clone()
    }

    /// Stream IDs currently being played.
    pub fn playing_streams(&self) -> Vec<String> {
        self.state.lock().playing.iter().cloned().collect()
    }

    pub fn is_engine_created(&self) -> bool {
        self.state.lock().engine_created
    }

    /// The media room currently logged into.
    pub fn logged_in_room(&self) -> Option<String> {
        self.state.lock().room_id.clone()
    }

    /// Makes the next call fail with `code`.
    pub fn fail_next(&self, code: i32) {
        self.state
            .lock()
            .failures
            .push_back(ServiceError::new(code, "injected failure"));
    }

    /// Delivers `event` to the installed sink, as if the engine raised it.
    ///
    /// Returns `false` when no sink is installed or the receiver is gone.
    pub fn emit(&self, event: MediaEvent) -> bool {
        match &self.state.lock().sink {
            Some(sink) => sink.send(event).is_ok(),
            None => false,
        }
    }
}

impl MediaService for MemoryMedia {
    fn set_event_sink(&self, sink: EventSink<MediaEvent>) {
        self.state.lock().sink = Some(sink);
    }

    async fn create_engine(&self) -> Result<(), ServiceError> {
        let mut state = self.state.lock();
        state.begin(MediaCall::CreateEngine)?;
        state.engine_created = true;
        Ok(())
    }

    async fn destroy_engine(&self) -> Result<(), ServiceError> {
        let mut state = self.state.lock();
        state.begin(MediaCall::DestroyEngine)?;
        state.engine_created = false;
        state.room_id = None;
        state.playing.clear();
        Ok(())
    }

    async fn login_room(
        &self,
        room_id: &str,
        user_id: &str,
        token: &str,
    ) -> Result<(), ServiceError> {
        let mut state = self.state.lock();
        state.begin(MediaCall::LoginRoom {
            room_id: room_id.to_string(),
            user_id: user_id.to_string(),
            token: token.to_string(),
        })?;
        state.require_engine()?;
        state.room_id = Some(room_id.to_string());
        Ok(())
    }

    async fn logout_room(&self) -> Result<(), ServiceError> {
        let mut state = self.state.lock();
        state.begin(MediaCall::LogoutRoom)?;
        state.room_id = None;
        state.playing.clear();
        Ok(())
    }

    async fn start_playing_stream(&self, stream_id: &str) -> Result<(), ServiceError> {
        let mut state = self.state.lock();
        state.begin(MediaCall::StartPlaying(stream_id.to_string()))?;
        state.require_room()?;
        state.playing.insert(stream_id.to_string());
        Ok(())
    }

    async fn stop_playing_stream(&self, stream_id: &str) -> Result<(), ServiceError> {
        let mut state = self.state.lock();
        state.begin(MediaCall::StopPlaying(stream_id.to_string()))?;
        state.playing.remove(stream_id);
        Ok(())
    }

    async fn start_sound_level_monitor(&self, interval: Duration) -> Result<(), ServiceError> {
        let mut state = self.state.lock();
        state.begin(MediaCall::StartSoundLevelMonitor(interval))?;
        state.require_engine()
    }
}
