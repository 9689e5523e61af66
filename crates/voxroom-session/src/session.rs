//! Session configuration and the session state machine.

use std::time::Duration;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// SessionConfig
// ---------------------------------------------------------------------------

/// Tunables for the session actor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// How often the media engine reports sound levels once in a room.
    pub sound_level_interval: Duration,

    /// Capacity of the command channel. Callers wait when it is full.
    pub command_channel_size: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            sound_level_interval: Duration::from_millis(1000),
            command_channel_size: 64,
        }
    }
}

// ---------------------------------------------------------------------------
// SessionState
// ---------------------------------------------------------------------------

/// Where the local user stands relative to a room.
///
/// ```text
///                 ┌──(create)──→ Created ──┐
/// Uninitialized ──┤                        ├──(leave)──→ Left
///                 └──(join)────→ Joined ───┘
/// ```
///
/// Any reset, local or service-initiated, goes back to `Uninitialized`.
/// `Left` can enter a room again directly.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SessionState {
    #[default]
    Uninitialized,
    /// In a room this user created (and hosts).
    Created,
    /// In a room somebody else created.
    Joined,
    Left,
}

impl SessionState {
    /// Returns `true` while the user is inside a room.
    pub fn is_in_room(&self) -> bool {
        matches!(self, Self::Created | Self::Joined)
    }

    /// Returns `true` if create or join may be attempted.
    pub fn can_enter(&self) -> bool {
        matches!(self, Self::Uninitialized | Self::Left)
    }
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Uninitialized => write!(f, "Uninitialized"),
            Self::Created => write!(f, "Created"),
            Self::Joined => write!(f, "Joined"),
            Self::Left => write!(f, "Left"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_config_default() {
        let config = SessionConfig::default();
        assert_eq!(config.sound_level_interval, Duration::from_secs(1));
        assert_eq!(config.command_channel_size, 64);
    }

    #[test]
    fn test_session_config_round_trips_through_json() {
        let config = SessionConfig {
            sound_level_interval: Duration::from_millis(250),
            command_channel_size: 8,
        };
        let json = serde_json::to_string(&config).unwrap();
        let back: SessionConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
    }

    #[test]
    fn test_in_room_states() {
        assert!(SessionState::Created.is_in_room());
        assert!(SessionState::Joined.is_in_room());
        assert!(!SessionState::Uninitialized.is_in_room());
        assert!(!SessionState::Left.is_in_room());
    }

    #[test]
    fn test_can_enter_only_outside_a_room() {
        assert!(SessionState::Uninitialized.can_enter());
        assert!(SessionState::Left.can_enter());
        assert!(!SessionState::Created.can_enter());
        assert!(!SessionState::Joined.can_enter());
    }

    #[test]
    fn test_session_state_display() {
        assert_eq!(SessionState::default().to_string(), "Uninitialized");
        assert_eq!(SessionState::Joined.to_string(), "Joined");
    }
}
