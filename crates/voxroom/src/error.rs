//! Unified error type for voxroom.

use voxroom_protocol::ProtocolError;
use voxroom_room::{RoomError, SeatError};
use voxroom_service::ServiceError;

/// Top-level error wrapping every layer's error.
///
/// Room operations report [`RoomError`] directly; this type is for
/// applications that mix them with the lower layers and want one `?`.
#[derive(Debug, thiserror::Error)]
pub enum VoxroomError {
    /// A wire encode/decode failure.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A raw signaling or media failure.
    #[error(transparent)]
    Service(#[from] ServiceError),

    /// A rejected seat update.
    #[error(transparent)]
    Seat(#[from] SeatError),

    /// A room operation failed.
    #[error(transparent)]
    Room(#[from] RoomError),
}

impl VoxroomError {
    /// The stable room error code, when this error maps onto one.
    pub fn code(&self) -> Option<i32> {
        match self {
            Self::Room(e) => Some(e.code()),
            Self::Service(e) => Some(RoomError::from_service(e).code()),
            Self::Seat(_) | Self::Protocol(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use voxroom_service::codes;

    use super::*;

    #[test]
    fn test_from_room_error() {
        let err: VoxroomError = RoomError::ParamInvalid.into();
        assert!(matches!(err, VoxroomError::Room(RoomError::ParamInvalid)));
        assert_eq!(err.code(), Some(2006));
    }

    #[test]
    fn test_from_service_error_maps_code() {
        let err: VoxroomError = ServiceError::new(codes::ROOM_NOT_EXIST, "gone").into();
        assert!(matches!(err, VoxroomError::Service(_)));
        assert_eq!(err.code(), Some(1002));
        assert!(err.to_string().contains("gone"));
    }

    #[test]
    fn test_from_seat_error() {
        let err: VoxroomError = SeatError::DuplicateUser { user_id: "bob".into() }.into();
        assert!(matches!(err, VoxroomError::Seat(_)));
        assert!(err.code().is_none());
        assert!(err.to_string().contains("bob"));
    }

    #[test]
    fn test_from_protocol_error() {
        let err: VoxroomError = ProtocolError::InvalidAttribute("seat_x".into()).into();
        assert!(matches!(err, VoxroomError::Protocol(_)));
    }
}
