//! The weak listener registry.

use std::sync::{Arc, Weak};

use parking_lot::Mutex;

use crate::{Domain, RoomEvent, RoomEventListener};

/// One registered observer and the domains it listens to.
///
/// The registry never owns the observer; it only keeps a `Weak` that is
/// upgraded for the duration of a single dispatch.
struct ListenerEntry {
    listener: Weak<dyn RoomEventListener>,
    signaling: bool,
    media: bool,
}

impl ListenerEntry {
    fn subscribes(&self, domain: Domain) -> bool {
        match domain {
            Domain::Signaling => self.signaling,
            Domain::Media => self.media,
        }
    }

    fn set(&mut self, domain: Domain, on: bool) {
        match domain {
            Domain::Signaling => self.signaling = on,
            Domain::Media => self.media = on,
        }
    }

    fn is_alive(&self) -> bool {
        self.listener.strong_count() > 0
    }

    fn is_subscribed(&self) -> bool {
        self.signaling || self.media
    }

    fn points_to(&self, target: *const ()) -> bool {
        std::ptr::addr_eq(self.listener.as_ptr(), target)
    }
}

/// Fans events out to every live observer.
///
/// Shared across the whole process (wrap it in an `Arc`); it outlives any
/// single room session.
///
/// ## Guarantees
///
/// - An observer registered for a domain is notified exactly once per
///   dispatch of an event of that domain, no matter how many times it was
///   registered.
/// - Observers are notified in registration order.
/// - Dropped observers are skipped and pruned, never an error.
/// - The observer set is snapshotted before the first callback runs and
///   the lock is released, so callbacks may register or unregister
///   (themselves or others) without deadlocking. Such changes apply from
///   the next dispatch on.
#[derive(Default)]
pub struct EventBroadcastRegistry {
    entries: Mutex<Vec<ListenerEntry>>,
}

impl EventBroadcastRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribes `observer` to `domain`.
    ///
    /// Registering an observer that is already present only adds the
    /// domain to its existing entry.
    pub fn register<L>(&self, observer: &Arc<L>, domain: Domain)
    where
        L: RoomEventListener + 'static,
    {
        let target = Arc::as_ptr(observer) as *const ();
        let mut entries = self.entries.lock();
        entries.retain(ListenerEntry::is_alive);

        if let Some(entry) = entries.iter_mut().find(|e| e.points_to(target)) {
            entry.set(domain, true);
        } else {
            let weak: Weak<L> = Arc::downgrade(observer);
            let weak: Weak<dyn RoomEventListener> = weak;
            let mut entry = ListenerEntry {
                listener: weak,
                signaling: false,
                media: false,
            };
            entry.set(domain, true);
            entries.push(entry);
        }
        tracing::debug!(%domain, listeners = entries.len(), "listener registered");
    }

    /// Unsubscribes `observer` from `domain`.
    ///
    /// Returns `false` if the observer wasn't subscribed to it. The entry
    /// disappears once it has no domain left.
    pub fn unregister<L>(&self, observer: &Arc<L>, domain: Domain) -> bool
    where
        L: RoomEventListener + 'static,
    {
        let target = Arc::as_ptr(observer) as *const ();
        let mut entries = self.entries.lock();

        let Some(pos) = entries.iter().position(|e| e.points_to(target)) else {
            return false;
        };
        let Some(entry) = entries.get_mut(pos) else {
            return false;
        };
        let was_subscribed = entry.subscribes(domain);
        entry.set(domain, false);
        if !entry.is_subscribed() {
            entries.remove(pos);
        }
        tracing::debug!(%domain, listeners = entries.len(), "listener unregistered");
        was_subscribed
    }

    /// Delivers `event` to every live observer of its domain.
    ///
    /// Returns how many observers were notified.
    pub fn dispatch(&self, event: &RoomEvent) -> usize {
        let domain = event.domain();
        let targets: Vec<Arc<dyn RoomEventListener>> = {
            let mut entries = self.entries.lock();
            let before = entries.len();
            entries.retain(ListenerEntry::is_alive);
            if entries.len() != before {
                tracing::trace!(pruned = before - entries.len(), "dropped listeners pruned");
            }
            entries
                .iter()
                .filter(|e| e.subscribes(domain))
                .filter_map(|e| e.listener.upgrade())
                .collect()
        };

        for listener in &targets {
            match event {
                RoomEvent::Signaling(ev) => listener.on_signaling_event(ev),
                RoomEvent::Media(ev) => listener.on_media_event(ev),
            }
        }
        targets.len()
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        self.entries.lock().iter().filter(|e| e.is_alive()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use voxroom_service::{MediaEvent, SignalingEvent};

    use super::*;

    #[derive(Default)]
    struct Counter {
        signaling: AtomicUsize,
        media: AtomicUsize,
    }

    impl RoomEventListener for Counter {
        fn on_signaling_event(&self, _event: &SignalingEvent) {
            self.signaling.fetch_add(1, Ordering::SeqCst);
        }

        fn on_media_event(&self, _event: &MediaEvent) {
            self.media.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn media_event() -> RoomEvent {
        RoomEvent::Media(MediaEvent::CapturedSoundLevel(10.0))
    }

    fn signaling_event() -> RoomEvent {
        RoomEvent::Signaling(SignalingEvent::TokenWillExpire { seconds: 30 })
    }

    #[test]
    fn test_dispatch_respects_domain() {
        let registry = EventBroadcastRegistry::new();
        let counter = Arc::new(Counter::default());
        registry.register(&counter, Domain::Media);

        assert_eq!(registry.dispatch(&signaling_event()), 0);
        assert_eq!(registry.dispatch(&media_event()), 1);
        assert_eq!(counter.media.load(Ordering::SeqCst), 1);
        assert_eq!(counter.signaling.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_double_register_notifies_once() {
        let registry = EventBroadcastRegistry::new();
        let counter = Arc::new(Counter::default());
        registry.register(&counter, Domain::Media);
        registry.register(&counter, Domain::Media);

        registry.dispatch(&media_event());

        assert_eq!(registry.len(), 1);
        assert_eq!(counter.media.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_both_domains_share_one_entry() {
        let registry = EventBroadcastRegistry::new();
        let counter = Arc::new(Counter::default());
        registry.register(&counter, Domain::Media);
        registry.register(&counter, Domain::Signaling);

        registry.dispatch(&media_event());
        registry.dispatch(&signaling_event());

        assert_eq!(registry.len(), 1);
        assert_eq!(counter.media.load(Ordering::SeqCst), 1);
        assert_eq!(counter.signaling.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_unregister_one_domain_keeps_the_other() {
        let registry = EventBroadcastRegistry::new();
        let counter = Arc::new(Counter::default());
        registry.register(&counter, Domain::Media);
        registry.register(&counter, Domain::Signaling);

        assert!(registry.unregister(&counter, Domain::Media));
        assert!(!registry.unregister(&counter, Domain::Media));

        assert_eq!(registry.dispatch(&media_event()), 0);
        assert_eq!(registry.dispatch(&signaling_event()), 1);

        assert!(registry.unregister(&counter, Domain::Signaling));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_unregister_unknown_observer_is_false() {
        let registry = EventBroadcastRegistry::new();
        let counter = Arc::new(Counter::default());
        assert!(!registry.unregister(&counter, Domain::Signaling));
    }

    #[test]
    fn test_dropped_observer_is_skipped_and_pruned() {
        let registry = EventBroadcastRegistry::new();
        let kept = Arc::new(Counter::default());
        let dropped = Arc::new(Counter::default());
        registry.register(&kept, Domain::Media);
        registry.register(&dropped, Domain::Media);
        assert_eq!(registry.len(), 2);

        drop(dropped);

        assert_eq!(registry.dispatch(&media_event()), 1);
        assert_eq!(registry.len(), 1);
    }
}
