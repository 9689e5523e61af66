//! Event fan-out for voxroom.
//!
//! The signaling and media services each report to exactly one place: the
//! session. The session in turn hands every event to an
//! [`EventBroadcastRegistry`], which forwards it to however many observers
//! are currently alive. Observers are held weakly, so dropping the last
//! `Arc` to an observer is all it takes to stop receiving events.
//!
//! # Key types
//!
//! - [`RoomEventListener`] — the trait observers implement
//! - [`EventBroadcastRegistry`] — the weak listener set
//! - [`RoomEvent`] / [`Domain`] — what gets dispatched, and where it came from

mod listener;
mod registry;

pub use listener::{Domain, RoomEvent, RoomEventListener};
pub use registry::EventBroadcastRegistry;
