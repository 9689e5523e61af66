//! A host and a listener in one process, sharing a loopback hub.
//!
//! Run with `RUST_LOG=debug cargo run -p live-room` to see the session
//! actors at work.

use std::sync::Arc;

use tracing_subscriber::EnvFilter;
use voxroom::prelude::*;
use voxroom::protocol::{encode_seat, AttributeMap};
use voxroom::service::{
    AttributeSetConfig, MemoryMedia, MemorySignalingHub, SignalingService, StreamInfo,
    StreamUpdateKind,
};

/// Prints every derived room event for one user.
struct Printer {
    name: &'static str,
}

impl RoomEventListener for Printer {
    fn on_signaling_event(&self, event: &SignalingEvent) {
        match event {
            SignalingEvent::RoomInfoUpdated(Some(info)) => println!(
                "[{}] room {} ({}) host={} seats={} text_disabled={}",
                self.name, info.room_id, info.room_name, info.host_id, info.seat_num,
                info.is_text_message_disabled
            ),
            SignalingEvent::RoomInfoUpdated(None) => println!("[{}] room closed", self.name),
            SignalingEvent::SeatsUpdated(seats) => {
                let taken: Vec<String> = seats
                    .iter()
                    .filter_map(|s| s.user_id.as_ref().map(|u| format!("{}:{u}", s.index)))
                    .collect();
                println!("[{}] seats taken: {taken:?}", self.name);
            }
            SignalingEvent::MemberJoined { members, .. } => {
                for m in members {
                    println!("[{}] {m} joined", self.name);
                }
            }
            _ => {}
        }
    }

    fn on_media_event(&self, event: &MediaEvent) {
        if let MediaEvent::StreamUpdate { kind, streams, .. } = event {
            println!("[{}] streams {kind:?}: {}", self.name, streams.len());
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), VoxroomError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let hub = MemorySignalingHub::new();
    let alice = UserInfo::new("alice", "Alice");
    let bob = UserInfo::new("bob", "Bob");

    let alice_signaling = hub.connect(alice.clone());
    let host = AudioRoomContext::builder().build(alice_signaling.clone(), MemoryMedia::new());
    let bob_media = MemoryMedia::new();
    let guest = AudioRoomContext::builder().build(hub.connect(bob.clone()), bob_media.clone());

    let host_printer = Arc::new(Printer { name: "alice" });
    let guest_printer = Arc::new(Printer { name: "bob" });
    host.add_listener(&host_printer, Domain::Signaling);
    guest.add_listener(&guest_printer, Domain::Signaling);
    guest.add_listener(&guest_printer, Domain::Media);

    let host_rooms = host.room_service();
    let guest_rooms = guest.room_service();
    host_rooms.set_local_user(alice).await?;
    guest_rooms.set_local_user(bob).await?;

    host_rooms.create_room("lounge", "Late Night Lounge", "token-a").await?;
    guest_rooms.join_room("lounge", "Late Night Lounge", "token-b").await?;

    // Alice takes the first seat and starts publishing audio.
    let seat = SeatModel {
        user_id: Some("alice".into()),
        status: SeatStatus::Occupied,
        ..SeatModel::untaken(0)
    };
    let seat_attrs: AttributeMap = [encode_seat(&seat)?].into_iter().collect();
    alice_signaling
        .set_room_attributes("lounge", &seat_attrs, AttributeSetConfig::default())
        .await?;
    bob_media.emit(MediaEvent::StreamUpdate {
        room_id: "lounge".into(),
        kind: StreamUpdateKind::Add,
        streams: vec![StreamInfo {
            stream_id: "alice-main".into(),
            user_id: "alice".into(),
        }],
    });

    host_rooms.disable_text_message(true).await?;
    println!(
        "online: {}",
        guest_rooms.query_online_user_count().await?
    );

    guest_rooms.leave_room().await?;
    host_rooms.leave_room().await?;
    guest.shutdown().await?;
    host.shutdown().await?;
    Ok(())
}
