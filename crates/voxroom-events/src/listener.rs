//! The observer trait and the events it receives.

use std::fmt;

use voxroom_service::{MediaEvent, SignalingEvent};

/// The service an event originates from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Domain {
    Signaling,
    Media,
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Signaling => write!(f, "signaling"),
            Self::Media => write!(f, "media"),
        }
    }
}

/// An event tagged with its domain.
#[derive(Debug, Clone, PartialEq)]
pub enum RoomEvent {
    Signaling(SignalingEvent),
    Media(MediaEvent),
}

impl RoomEvent {
    /// The domain observers must subscribe to in order to see this event.
    pub fn domain(&self) -> Domain {
        match self {
            Self::Signaling(_) => Domain::Signaling,
            Self::Media(_) => Domain::Media,
        }
    }
}

impl From<SignalingEvent> for RoomEvent {
    fn from(event: SignalingEvent) -> Self {
        Self::Signaling(event)
    }
}

impl From<MediaEvent> for RoomEvent {
    fn from(event: MediaEvent) -> Self {
        Self::Media(event)
    }
}

/// Something that wants to hear about room events.
///
/// Both methods default to no-ops, so an observer only implements the
/// domain it registers for. Callbacks run synchronously on the session's
/// task: keep them short and never block. Anything slow belongs in a
/// task the observer spawns itself.
///
/// # Example
///
/// ```rust
/// use std::sync::atomic::{AtomicUsize, Ordering};
/// use voxroom_events::RoomEventListener;
/// use voxroom_service::MediaEvent;
///
/// #[derive(Default)]
/// struct LevelMeter {
///     updates: AtomicUsize,
/// }
///
/// impl RoomEventListener for LevelMeter {
///     fn on_media_event(&self, event: &MediaEvent) {
///         if let MediaEvent::CapturedSoundLevel(_) = event {
///             self.updates.fetch_add(1, Ordering::Relaxed);
///         }
///     }
/// }
/// ```
pub trait RoomEventListener: Send + Sync {
    fn on_signaling_event(&self, _event: &SignalingEvent) {}

    fn on_media_event(&self, _event: &MediaEvent) {}
}
