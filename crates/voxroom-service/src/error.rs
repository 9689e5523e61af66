//! Errors reported by the external services.

/// A failure reported by the signaling or media service.
///
/// `code` is the service's native numeric code and is passed through to
/// callers untouched when no better mapping exists.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("service error {code}: {message}")]
pub struct ServiceError {
    /// Native error code of the service that failed.
    pub code: i32,
    /// Human-readable detail, for logs only.
    pub message: String,
}

impl ServiceError {
    /// Creates a new error with the given native code.
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

/// Native codes with a well-known meaning.
pub mod codes {
    /// `create_room` hit a room ID that already exists.
    pub const ROOM_ALREADY_EXISTS: i32 = 6_000_301;
    /// The room ID is unknown to the signaling service.
    pub const ROOM_NOT_EXIST: i32 = 6_000_302;
    /// The caller is not a member of the room.
    pub const NOT_IN_ROOM: i32 = 6_000_303;
    /// A non-forced attribute write hit a key owned by another member.
    pub const ATTRIBUTE_CONFLICT: i32 = 6_000_304;
    /// A media call was made before `create_engine`.
    pub const ENGINE_NOT_CREATED: i32 = 1_000_001;
    /// A media room call was made without a logged-in media room.
    pub const MEDIA_NOT_LOGGED_IN: i32 = 1_000_002;
}
