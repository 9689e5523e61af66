//! # voxroom
//!
//! Session coordination for live audio rooms.
//!
//! voxroom sits between an application and two opaque collaborators, a
//! signaling service (membership and shared room attributes) and a media
//! engine (audio streams and sound levels). It keeps the local view of
//! the room, its info and its speaker seats, consistent with what
//! everybody else published, and fans every service event out to the
//! application's listeners.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use voxroom::prelude::*;
//! use voxroom::service::{MemoryMedia, MemorySignalingHub};
//!
//! struct Printer;
//!
//! impl RoomEventListener for Printer {
//!     fn on_signaling_event(&self, event: &SignalingEvent) {
//!         println!("{event:?}");
//!     }
//! }
//!
//! # async fn run() -> Result<(), VoxroomError> {
//! let hub = MemorySignalingHub::new();
//! let alice = UserInfo::new("alice", "Alice");
//! let context = AudioRoomContext::builder()
//!     .build(hub.connect(alice.clone()), MemoryMedia::new());
//!
//! let printer = Arc::new(Printer);
//! context.add_listener(&printer, Domain::Signaling);
//!
//! let rooms = context.room_service();
//! rooms.set_local_user(alice).await?;
//! rooms.create_room("r1", "lobby", "token").await?;
//! # Ok(())
//! # }
//! ```

mod context;
mod error;
mod room_service;

pub use context::{AudioRoomContext, AudioRoomContextBuilder};
pub use error::VoxroomError;
pub use room_service::RoomService;

pub use voxroom_events as events;
pub use voxroom_protocol as protocol;
pub use voxroom_room as room;
pub use voxroom_service as service;
pub use voxroom_session as session;

/// The types most applications need.
pub mod prelude {
    pub use crate::{AudioRoomContext, RoomService, VoxroomError};
    pub use voxroom_events::{Domain, RoomEventListener};
    pub use voxroom_protocol::{RoomInfo, SeatModel, SeatStatus, UserInfo, UserRole};
    pub use voxroom_room::{RoomConfig, RoomError};
    pub use voxroom_service::{MediaEvent, SignalingEvent};
    pub use voxroom_session::{SessionConfig, SessionState};
}
