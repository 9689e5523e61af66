//! Integration tests for the loopback signaling hub and media engine.
//!
//! The session layer relies on these behaving like the real services:
//! duplicate-room detection, attribute broadcast to every member, and
//! delete-on-owner-leave.

#[cfg(feature = "memory")]
mod memory {
    use std::time::Duration;

    use tokio::sync::mpsc;
    use voxroom_protocol::{AttributeMap, UserInfo, ROOM_INFO_KEY};
    use voxroom_service::{
        codes, AttributeAction, AttributeSetConfig, MediaCall, MediaEvent,
        MediaService, MemoryMedia, MemorySignalingHub, RoomDescriptor,
        SignalingEvent, SignalingService,
    };

    fn room(id: &str) -> RoomDescriptor {
        RoomDescriptor {
            room_id: id.to_string(),
            room_name: format!("{id}-name"),
        }
    }

    fn attrs(pairs: &[(&str, &str)]) -> AttributeMap {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    /// Drains every event currently queued on `rx`.
    fn drain(rx: &mut mpsc::UnboundedReceiver<SignalingEvent>) -> Vec<SignalingEvent> {
        let mut out = Vec::new();
        while let Ok(ev) = rx.try_recv() {
            out.push(ev);
        }
        out
    }

    #[tokio::test]
    async fn test_create_room_twice_reports_room_exists() {
        let hub = MemorySignalingHub::new();
        let alice = hub.connect(UserInfo::new("alice", "Alice"));
        let bob = hub.connect(UserInfo::new("bob", "Bob"));

        alice.create_room(&room("r1"), &AttributeMap::new()).await.unwrap();
        let err = bob.create_room(&room("r1"), &AttributeMap::new()).await.unwrap_err();

        assert_eq!(err.code, codes::ROOM_ALREADY_EXISTS);
        assert_eq!(hub.room_name("r1").as_deref(), Some("r1-name"));
    }

    #[tokio::test]
    async fn test_join_unknown_room_reports_not_exist() {
        let hub = MemorySignalingHub::new();
        let bob = hub.connect(UserInfo::new("bob", "Bob"));

        let err = bob.join_room("nope").await.unwrap_err();
        assert_eq!(err.code, codes::ROOM_NOT_EXIST);
    }

    #[tokio::test]
    async fn test_join_delivers_existing_attributes_and_notifies_members() {
        let hub = MemorySignalingHub::new();
        let alice = hub.connect(UserInfo::new("alice", "Alice"));
        let bob = hub.connect(UserInfo::new("bob", "Bob"));
        let (alice_tx, mut alice_rx) = mpsc::unbounded_channel();
        let (bob_tx, mut bob_rx) = mpsc::unbounded_channel();
        alice.set_event_sink(alice_tx);
        bob.set_event_sink(bob_tx);

        alice
            .create_room(&room("r1"), &attrs(&[(ROOM_INFO_KEY, "{\"id\":\"r1\"}")]))
            .await
            .unwrap();
        drain(&mut alice_rx);

        bob.join_room("r1").await.unwrap();

        let alice_events = drain(&mut alice_rx);
        assert!(matches!(
            &alice_events[..],
            [SignalingEvent::MemberJoined { members, .. }] if members[0].user_id == "bob"
        ));

        let bob_events = drain(&mut bob_rx);
        let update = bob_events.iter().find_map(|e| match e {
            SignalingEvent::RoomAttributesUpdated { update, .. } => Some(update),
            _ => None,
        });
        let update = update.expect("joiner should receive current attributes");
        assert_eq!(update.action, AttributeAction::Set);
        assert!(update.attributes.contains_key(ROOM_INFO_KEY));
        assert_eq!(hub.members("r1"), vec!["alice", "bob"]);
    }

    #[tokio::test]
    async fn test_set_attributes_broadcasts_to_all_members_including_writer() {
        let hub = MemorySignalingHub::new();
        let alice = hub.connect(UserInfo::new("alice", "Alice"));
        let bob = hub.connect(UserInfo::new("bob", "Bob"));
        let (alice_tx, mut alice_rx) = mpsc::unbounded_channel();
        let (bob_tx, mut bob_rx) = mpsc::unbounded_channel();
        alice.set_event_sink(alice_tx);
        bob.set_event_sink(bob_tx);
        alice.create_room(&room("r1"), &AttributeMap::new()).await.unwrap();
        bob.join_room("r1").await.unwrap();
        drain(&mut alice_rx);
        drain(&mut bob_rx);

        alice
            .set_room_attributes("r1", &attrs(&[("k", "v")]), AttributeSetConfig::default())
            .await
            .unwrap();

        assert_eq!(drain(&mut alice_rx).len(), 1);
        assert_eq!(drain(&mut bob_rx).len(), 1);
        assert_eq!(hub.room_attributes("r1").get("k").map(String::as_str), Some("v"));
    }

    #[tokio::test]
    async fn test_non_forced_write_to_foreign_key_conflicts() {
        let hub = MemorySignalingHub::new();
        let alice = hub.connect(UserInfo::new("alice", "Alice"));
        let bob = hub.connect(UserInfo::new("bob", "Bob"));
        alice
            .create_room(&room("r1"), &attrs(&[(ROOM_INFO_KEY, "a")]))
            .await
            .unwrap();
        bob.join_room("r1").await.unwrap();

        let err = bob
            .set_room_attributes(
                "r1",
                &attrs(&[(ROOM_INFO_KEY, "b")]),
                AttributeSetConfig::default(),
            )
            .await
            .unwrap_err();
        assert_eq!(err.code, codes::ATTRIBUTE_CONFLICT);

        let forced = AttributeSetConfig {
            force: true,
            ..AttributeSetConfig::default()
        };
        bob.set_room_attributes("r1", &attrs(&[(ROOM_INFO_KEY, "b")]), forced)
            .await
            .unwrap();
        assert_eq!(hub.room_attributes("r1")[ROOM_INFO_KEY], "b");
    }

    #[tokio::test]
    async fn test_owner_leave_deletes_owned_attributes() {
        let hub = MemorySignalingHub::new();
        let alice = hub.connect(UserInfo::new("alice", "Alice"));
        let bob = hub.connect(UserInfo::new("bob", "Bob"));
        let (bob_tx, mut bob_rx) = mpsc::unbounded_channel();
        bob.set_event_sink(bob_tx);
        alice
            .create_room(&room("r1"), &attrs(&[(ROOM_INFO_KEY, "x")]))
            .await
            .unwrap();
        bob.join_room("r1").await.unwrap();
        drain(&mut bob_rx);

        alice.leave_room("r1").await.unwrap();

        let events = drain(&mut bob_rx);
        assert!(events.iter().any(|e| matches!(
            e,
            SignalingEvent::RoomAttributesUpdated { update, .. }
                if update.action == AttributeAction::Delete
                    && update.attributes.contains_key(ROOM_INFO_KEY)
        )));
        assert!(events.iter().any(|e| matches!(e, SignalingEvent::MemberLeft { .. })));
        assert!(hub.room_attributes("r1").is_empty());
    }

    #[tokio::test]
    async fn test_last_member_leaving_removes_room() {
        let hub = MemorySignalingHub::new();
        let alice = hub.connect(UserInfo::new("alice", "Alice"));
        alice.create_room(&room("r1"), &AttributeMap::new()).await.unwrap();
        assert_eq!(alice.query_online_member_count("r1").await.unwrap(), 1);

        alice.leave_room("r1").await.unwrap();

        assert!(!hub.has_room("r1"));
    }

    #[tokio::test]
    async fn test_fail_next_applies_once_and_is_journaled() {
        let hub = MemorySignalingHub::new();
        let alice = hub.connect(UserInfo::new("alice", "Alice"));
        alice.fail_next(42);

        let err = alice.create_room(&room("r1"), &AttributeMap::new()).await.unwrap_err();
        assert_eq!(err.code, 42);
        alice.create_room(&room("r1"), &AttributeMap::new()).await.unwrap();
        assert_eq!(alice.requests(), vec!["create_room", "create_room"]);
    }

    #[tokio::test]
    async fn test_media_login_requires_engine() {
        let media = MemoryMedia::new();
        let err = media.login_room("r1", "alice", "t").await.unwrap_err();
        assert_eq!(err.code, codes::ENGINE_NOT_CREATED);

        media.create_engine().await.unwrap();
        media.login_room("r1", "alice", "t").await.unwrap();
        assert_eq!(media.logged_in_room().as_deref(), Some("r1"));
    }

    #[tokio::test]
    async fn test_media_journal_and_playback() {
        let media = MemoryMedia::new();
        media.create_engine().await.unwrap();
        media.login_room("r1", "alice", "t").await.unwrap();
        media
            .start_sound_level_monitor(Duration::from_millis(1000))
            .await
            .unwrap();
        media.start_playing_stream("s1").await.unwrap();
        assert_eq!(media.playing_streams(), vec!["s1"]);

        media.destroy_engine().await.unwrap();

        assert!(media.playing_streams().is_empty());
        assert!(!media.is_engine_created());
        assert_eq!(
            media.calls(),
            vec![
                MediaCall::CreateEngine,
                MediaCall::LoginRoom {
                    room_id: "r1".into(),
                    user_id: "alice".into(),
                    token: "t".into(),
                },
                MediaCall::StartSoundLevelMonitor(Duration::from_millis(1000)),
                MediaCall::StartPlaying("s1".into()),
                MediaCall::DestroyEngine,
            ]
        );
    }

    #[tokio::test]
    async fn test_media_emit_reaches_sink() {
        let media = MemoryMedia::new();
        assert!(!media.emit(MediaEvent::CapturedSoundLevel(1.0)));

        let (tx, mut rx) = mpsc::unbounded_channel();
        media.set_event_sink(tx);
        assert!(media.emit(MediaEvent::CapturedSoundLevel(12.5)));
        assert_eq!(rx.recv().await, Some(MediaEvent::CapturedSoundLevel(12.5)));
    }
}
