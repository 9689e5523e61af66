//! Room state for voxroom.
//!
//! Holds the two pieces of per-session state that remote events and local
//! actions both mutate, plus the error taxonomy every public operation
//! reports with.
//!
//! # Key types
//!
//! - [`RoomStateStore`] — the canonical [`RoomInfo`](voxroom_protocol::RoomInfo)
//! - [`SpeakerSeatRegistry`] — the seat table and its occupancy invariants
//! - [`RoomError`] — stable, numbered error kinds
//! - [`RoomConfig`] — seat count and attribute-write policy

mod config;
mod error;
mod seats;
mod store;

pub use config::RoomConfig;
pub use error::{RoomError, SeatError};
pub use seats::{SpeakerSeatRegistry, UpdateMode};
pub use store::RoomStateStore;
