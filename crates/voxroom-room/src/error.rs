//! Error types for the room layer.

use voxroom_protocol::ProtocolError;
use voxroom_service::{codes, ServiceError};

/// The error kinds every room operation reports.
///
/// The numeric codes returned by [`RoomError::code`] are part of the
/// public contract: clients compare against them, so they never change.
/// [`RoomError::Other`] passes a collaborator's native code through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, thiserror::Error)]
pub enum RoomError {
    /// A precondition or calling contract was violated.
    #[error("operation failed")]
    Failed,

    #[error("room already exists")]
    RoomExisted,

    #[error("room not found")]
    RoomNotFound,

    #[error("failed to take seat")]
    TakeSeatFailed,

    #[error("failed to update seat info")]
    SetSeatInfoFailed,

    #[error("already on a seat")]
    AlreadyOnSeat,

    #[error("no permission")]
    NoPermission,

    #[error("not on a seat")]
    NotOnSeat,

    /// A required argument was missing or malformed.
    #[error("invalid parameter")]
    ParamInvalid,

    /// An unmapped failure from the signaling or media service.
    #[error("service error {0}")]
    Other(i32),
}

impl RoomError {
    /// The stable numeric code of this error.
    pub fn code(&self) -> i32 {
        match self {
            Self::Failed => 1,
            Self::RoomExisted => 1001,
            Self::RoomNotFound => 1002,
            Self::TakeSeatFailed => 2001,
            Self::SetSeatInfoFailed => 2002,
            Self::AlreadyOnSeat => 2003,
            Self::NoPermission => 2004,
            Self::NotOnSeat => 2005,
            Self::ParamInvalid => 2006,
            Self::Other(code) => *code,
        }
    }

    /// Maps a service failure onto the nearest kind.
    pub fn from_service(err: &ServiceError) -> Self {
        match err.code {
            codes::ROOM_ALREADY_EXISTS => Self::RoomExisted,
            codes::ROOM_NOT_EXIST => Self::RoomNotFound,
            code => Self::Other(code),
        }
    }
}

impl From<ServiceError> for RoomError {
    fn from(err: ServiceError) -> Self {
        Self::from_service(&err)
    }
}

/// Why a seat update was rejected.
///
/// A rejected update never changes the seat table.
#[derive(Debug, thiserror::Error)]
pub enum SeatError {
    /// The payload names a seat outside `[0, seat_num)`.
    #[error("seat index {index} out of range (seat_num = {seat_num})")]
    IndexOutOfRange { index: u32, seat_num: u32 },

    /// The resulting seat would break the status/user pairing.
    #[error("seat {index}: {reason}")]
    Occupancy { index: u32, reason: &'static str },

    /// The same user would sit on two seats.
    #[error("user {user_id} would occupy more than one seat")]
    DuplicateUser { user_id: String },

    /// A seat value couldn't be decoded.
    #[error(transparent)]
    Decode(#[from] ProtocolError),
}

impl From<SeatError> for RoomError {
    fn from(err: SeatError) -> Self {
        match err {
            SeatError::IndexOutOfRange { .. } | SeatError::Decode(_) => Self::ParamInvalid,
            SeatError::Occupancy { .. } => Self::SetSeatInfoFailed,
            SeatError::DuplicateUser { .. } => Self::AlreadyOnSeat,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_are_stable() {
        let expected = [
            (RoomError::Failed, 1),
            (RoomError::RoomExisted, 1001),
            (RoomError::RoomNotFound, 1002),
            (RoomError::TakeSeatFailed, 2001),
            (RoomError::SetSeatInfoFailed, 2002),
            (RoomError::AlreadyOnSeat, 2003),
            (RoomError::NoPermission, 2004),
            (RoomError::NotOnSeat, 2005),
            (RoomError::ParamInvalid, 2006),
            (RoomError::Other(-7), -7),
        ];
        for (err, code) in expected {
            assert_eq!(err.code(), code, "{err:?}");
        }
    }

    #[test]
    fn test_from_service_maps_known_codes() {
        let exists = ServiceError::new(codes::ROOM_ALREADY_EXISTS, "dup");
        let missing = ServiceError::new(codes::ROOM_NOT_EXIST, "gone");
        assert_eq!(RoomError::from(exists), RoomError::RoomExisted);
        assert_eq!(RoomError::from(missing), RoomError::RoomNotFound);
    }

    #[test]
    fn test_from_service_passes_unknown_codes_through() {
        let err = RoomError::from(ServiceError::new(6_000_999, "?"));
        assert_eq!(err, RoomError::Other(6_000_999));
        assert_eq!(err.code(), 6_000_999);
        assert!(err.to_string().contains("6000999"));
    }

    #[test]
    fn test_seat_errors_map_into_taxonomy() {
        let range = SeatError::IndexOutOfRange { index: 9, seat_num: 8 };
        let occupancy = SeatError::Occupancy { index: 0, reason: "x" };
        let dup = SeatError::DuplicateUser { user_id: "bob".into() };
        assert_eq!(RoomError::from(range), RoomError::ParamInvalid);
        assert_eq!(RoomError::from(occupancy), RoomError::SetSeatInfoFailed);
        assert_eq!(RoomError::from(dup), RoomError::AlreadyOnSeat);
    }
}
