//! Session lifecycle for voxroom.
//!
//! A session is one local user's presence in (at most) one audio room.
//! [`spawn_session`] starts an actor task that owns the room state, the
//! seat table and the media session, and returns a [`SessionHandle`] to
//! talk to it.
//!
//! # How it fits in the stack
//!
//! ```text
//! voxroom (above)          ← RoomService, AudioRoomContext
//!     ↕
//! Session Layer (this crate) ← ordering, rollback, event routing
//!     ↕
//! voxroom-room / voxroom-events / voxroom-service (below)
//! ```

mod actor;
mod handle;
mod session;

pub use handle::{spawn_session, SessionHandle};
pub use session::{SessionConfig, SessionState};
