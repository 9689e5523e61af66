//! `AudioRoomContext` builder and process-level wiring.

use std::sync::Arc;

use voxroom_events::{Domain, EventBroadcastRegistry, RoomEventListener};
use voxroom_room::{RoomConfig, RoomError};
use voxroom_service::{MediaService, SignalingService};
use voxroom_session::{spawn_session, SessionConfig, SessionHandle};

use crate::RoomService;

/// Builder for an [`AudioRoomContext`].
///
/// # Example
///
/// ```rust,ignore
/// let context = AudioRoomContext::builder()
///     .room_config(RoomConfig { seat_num: 6, ..RoomConfig::default() })
///     .build(signaling, media);
/// context.room_service().create_room("r1", "lobby", token).await?;
/// ```
#[derive(Debug, Default)]
pub struct AudioRoomContextBuilder {
    session_config: SessionConfig,
    room_config: RoomConfig,
}

impl AudioRoomContextBuilder {
    /// Creates a builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn session_config(mut self, config: SessionConfig) -> Self {
        self.session_config = config;
        self
    }

    pub fn room_config(mut self, config: RoomConfig) -> Self {
        self.room_config = config;
        self
    }

    /// Spawns the session actor over the given services.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn build<S, M>(self, signaling: S, media: M) -> AudioRoomContext
    where
        S: SignalingService,
        M: MediaService,
    {
        let registry = Arc::new(EventBroadcastRegistry::new());
        let session = spawn_session(
            signaling,
            media,
            Arc::clone(&registry),
            self.room_config,
            self.session_config,
        );
        tracing::info!("audio room context ready");
        AudioRoomContext { registry, session }
    }
}

/// Everything one process needs to take part in audio rooms.
///
/// Build one per process and pass it by reference to whatever needs it.
/// Dropping the last reference to it (and every [`RoomService`]) lets the
/// session wind down on its own; [`shutdown`](Self::shutdown) does so
/// eagerly.
pub struct AudioRoomContext {
    registry: Arc<EventBroadcastRegistry>,
    session: SessionHandle,
}

impl AudioRoomContext {
    pub fn builder() -> AudioRoomContextBuilder {
        AudioRoomContextBuilder::new()
    }

    /// The room operations of the local user.
    pub fn room_service(&self) -> RoomService {
        RoomService::new(self.session.clone())
    }

    /// Subscribes `listener` to one event domain.
    ///
    /// The registry only keeps a weak reference: the listener stops
    /// receiving events once the caller drops its last `Arc`.
    pub fn add_listener<L>(&self, listener: &Arc<L>, domain: Domain)
    where
        L: RoomEventListener + 'static,
    {
        self.registry.register(listener, domain);
    }

    /// Unsubscribes `listener` from `domain`. Returns `false` if it wasn't
    /// subscribed.
    pub fn remove_listener<L>(&self, listener: &Arc<L>, domain: Domain) -> bool
    where
        L: RoomEventListener + 'static,
    {
        self.registry.unregister(listener, domain)
    }

    /// The shared broadcast registry.
    pub fn registry(&self) -> &Arc<EventBroadcastRegistry> {
        &self.registry
    }

    /// Tears the session down: media stops, room state and the local user
    /// are dropped, and the actor exits. Later room calls report
    /// [`RoomError::Failed`].
    ///
    /// This does not leave the signaling room; call
    /// [`RoomService::leave_room`] first for a clean exit.
    pub async fn shutdown(&self) -> Result<(), RoomError> {
        tracing::info!("audio room context shutting down");
        self.session.shutdown().await
    }
}
