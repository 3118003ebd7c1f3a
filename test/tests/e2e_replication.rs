/// E2E tests for server-to-client state replication:
/// full snapshots first, diffs afterwards, always-replicated instances every tick

use replica_shared::{
    InstanceId, Payload, PeerId, ReceiveEvent, Recipient, ReplicationMessage, Vec3,
};
use replica_test::{
    deliver_to_clients, tick_and_exchange, LocalTransport, PlayerInfo, SimpleBullet,
    SimplePlayer, TestClient, TestServer,
};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Server and one client, both holding a PlayerInfo (1) and a SimplePlayer (2)
/// owned by the client
fn connected_pair() -> (TestServer, TestClient) {
    let mut server = TestServer::new();
    let mut client = TestClient::new(1);

    let info = server.spawn_owned(1, PlayerInfo::new("alice"), client.peer);
    server.spawn_owned(2, SimplePlayer::new(info), client.peer);

    client.spawn_possessed(1, PlayerInfo::default());
    client.spawn_possessed(2, SimplePlayer::default());

    (server, client)
}

fn sent_snapshots(transport: &mut LocalTransport) -> Vec<(InstanceId, usize)> {
    transport
        .drain()
        .into_iter()
        .filter_map(|(_, bytes)| {
            let message = ReplicationMessage::from_bytes(&bytes).ok()?;
            match message.payload {
                Payload::Snapshot(snapshot) => Some((message.instance, snapshot.len())),
                Payload::Invocation(_) => None,
            }
        })
        .collect()
}

#[test]
fn first_tick_sends_full_snapshots() {
    init_logging();
    let (mut server, mut client) = connected_pair();

    let received = tick_and_exchange(&mut server, &mut [&mut client]);

    assert_eq!(received.len(), 2, "Both instances should be replicated");
    for (peer, result) in &received {
        assert_eq!(*peer, PeerId::new(1));
        assert!(matches!(result, Ok(ReceiveEvent::Applied { .. })));
    }

    let info = client.world.get::<PlayerInfo>(&InstanceId::new(1)).unwrap();
    assert_eq!(info.name, "alice");

    let player = client.world.get::<SimplePlayer>(&InstanceId::new(2)).unwrap();
    assert_eq!(player.player_info, Some(InstanceId::new(1)));
    assert!(player.lerp_target_changed);
    assert_eq!(player.post_apply_count, 1);
}

#[test]
fn later_ticks_send_only_changed_fields() {
    init_logging();
    let (mut server, mut client) = connected_pair();
    tick_and_exchange(&mut server, &mut [&mut client]);

    server
        .world
        .get_mut::<SimplePlayer>(&InstanceId::new(2))
        .unwrap()
        .position = Vec3::new(4.0, 2.0, 0.0);

    assert!(server.server.update(server.server.protocol().tick_interval));
    server.send_all_updates();

    // PlayerInfo is unchanged and skipped, SimplePlayer carries one field
    let snapshots = sent_snapshots(&mut server.transport);
    assert_eq!(snapshots, vec![(InstanceId::new(2), 1)]);
}

#[test]
fn diffs_reach_the_client() {
    init_logging();
    let (mut server, mut client) = connected_pair();
    tick_and_exchange(&mut server, &mut [&mut client]);

    {
        let player = server.world.get_mut::<SimplePlayer>(&InstanceId::new(2)).unwrap();
        player.position = Vec3::new(-3.5, 8.0, 0.0);
        player.held_item = 7;
    }
    tick_and_exchange(&mut server, &mut [&mut client]);

    let player = client.world.get::<SimplePlayer>(&InstanceId::new(2)).unwrap();
    assert_eq!(player.position, Vec3::new(-3.5, 8.0, 0.0));
    assert_eq!(player.held_item, 7);
    assert_eq!(player.player_info, Some(InstanceId::new(1)));
}

#[test]
fn always_replicated_instances_update_every_tick() {
    init_logging();
    let (mut server, mut client) = connected_pair();

    for _ in 0..4 {
        tick_and_exchange(&mut server, &mut [&mut client]);
    }

    let player = client.world.get::<SimplePlayer>(&InstanceId::new(2)).unwrap();
    assert_eq!(player.post_apply_count, 4);
}

#[test]
fn unchanged_instances_are_skipped() {
    init_logging();
    let mut server = TestServer::new();
    let mut client = TestClient::new(1);
    server.spawn(5, SimpleBullet::default());
    client.spawn(5, SimpleBullet::default());

    let first = tick_and_exchange(&mut server, &mut [&mut client]);
    assert_eq!(first.len(), 1);

    let second = tick_and_exchange(&mut server, &mut [&mut client]);
    assert!(second.is_empty(), "A bullet that did not change sends nothing");

    server.world.get_mut::<SimpleBullet>(&InstanceId::new(5)).unwrap().age = 0.25;
    let third = tick_and_exchange(&mut server, &mut [&mut client]);
    assert_eq!(third.len(), 1);

    let bullet = client.world.get::<SimpleBullet>(&InstanceId::new(5)).unwrap();
    assert_eq!(bullet.age, 0.25);
    assert!(bullet.lerp_target_changed);
}

#[test]
fn update_waits_for_tick_interval() {
    let mut server = TestServer::new();
    let interval = server.server.protocol().tick_interval;

    assert!(!server.server.update(interval / 2));
    assert!(server.server.update(interval / 2));
    assert_eq!(server.server.current_tick(), 1);
}

#[test]
fn respawned_instance_gets_full_snapshot() {
    init_logging();
    let mut server = TestServer::new();
    let id = server.spawn(5, SimpleBullet::default());

    server.send_all_updates();
    assert_eq!(sent_snapshots(&mut server.transport), vec![(id, 3)]);

    server.world.despawn(&id);
    server.send_all_updates();
    assert!(server.transport.is_empty());

    server.spawn(5, SimpleBullet::default());
    server.send_all_updates();
    assert_eq!(sent_snapshots(&mut server.transport), vec![(id, 3)]);
}

#[test]
fn explicit_despawn_resets_diff_base() {
    let mut server = TestServer::new();
    let id = server.spawn(5, SimpleBullet::default());

    server.send_all_updates();
    server.transport.drain();

    server.server.despawn(&id);
    server.send_all_updates();
    assert_eq!(sent_snapshots(&mut server.transport), vec![(id, 3)]);
}

#[test]
fn updates_are_addressed_to_replicating_clients() {
    let mut server = TestServer::new();
    let id = server.spawn(5, SimpleBullet::default());

    server.send_all_updates();

    assert_eq!(server.transport.sent_to(&Recipient::Replicating(id)), 1);
    assert_eq!(server.transport.sent_to(&Recipient::Server), 0);
}

#[test]
fn clients_without_the_instance_get_nothing() {
    init_logging();
    let mut server = TestServer::new();
    let mut watching = TestClient::new(1);
    let mut elsewhere = TestClient::new(2);
    server.spawn(5, SimpleBullet::default());
    watching.spawn(5, SimpleBullet::default());

    let received = tick_and_exchange(&mut server, &mut [&mut watching, &mut elsewhere]);

    assert_eq!(received.len(), 1);
    assert_eq!(received[0].0, watching.peer);
}

#[test]
fn snapshot_for_missing_instance_is_dropped() {
    init_logging();
    let mut server = TestServer::new();
    let mut client = TestClient::new(1);
    let id = server.spawn(5, SimpleBullet::default());
    server.send_all_updates();

    let (_, bytes) = server.transport.drain().remove(0);
    let event = client
        .client
        .receive(&bytes, &mut client.world, &mut client.transport)
        .unwrap();

    assert!(matches!(event, ReceiveEvent::Dropped { instance, .. } if instance == id));
}

#[test]
fn refused_sends_are_not_counted() {
    init_logging();
    let mut server = TestServer::new();
    server.transport = LocalTransport::refusing();
    server.spawn(5, SimpleBullet::default());

    assert_eq!(server.send_all_updates(), 0);
}

#[test]
fn refused_update_is_sent_again() {
    init_logging();
    let mut server = TestServer::new();
    let mut client = TestClient::new(1);
    let id = server.spawn(5, SimpleBullet::default());
    client.spawn(5, SimpleBullet::default());
    tick_and_exchange(&mut server, &mut [&mut client]);

    server.world.get_mut::<SimpleBullet>(&id).unwrap().age = 5.0;
    server.transport = LocalTransport::refusing();
    assert!(tick_and_exchange(&mut server, &mut [&mut client]).is_empty());

    server.transport = LocalTransport::new();
    let received = tick_and_exchange(&mut server, &mut [&mut client]);

    assert_eq!(received.len(), 1);
    assert_eq!(client.world.get::<SimpleBullet>(&id).unwrap().age, 5.0);
}

#[test]
fn refused_first_send_stays_full() {
    let mut server = TestServer::new();
    let id = server.spawn(5, SimpleBullet::default());

    server.transport = LocalTransport::refusing();
    assert_eq!(server.send_all_updates(), 0);

    server.transport = LocalTransport::new();
    server.send_all_updates();
    assert_eq!(sent_snapshots(&mut server.transport), vec![(id, 3)]);
}

#[test]
fn late_joiner_catches_up_with_full_snapshots() {
    init_logging();
    let mut server = TestServer::new();
    let mut early = TestClient::new(1);
    let id = server.spawn(5, SimpleBullet::default());
    early.spawn(5, SimpleBullet::default());

    server.world.get_mut::<SimpleBullet>(&id).unwrap().age = 5.0;
    tick_and_exchange(&mut server, &mut [&mut early]);
    assert!(tick_and_exchange(&mut server, &mut [&mut early]).is_empty());

    let mut late = TestClient::new(2);
    late.spawn(5, SimpleBullet::default());
    assert_eq!(server.send_full_to(late.peer), 1);
    assert_eq!(server.transport.sent_to(&Recipient::Client(late.peer)), 1);

    let received = deliver_to_clients(&mut server, &mut [&mut early, &mut late]);

    assert_eq!(received.len(), 1);
    assert_eq!(received[0].0, late.peer);
    assert_eq!(late.world.get::<SimpleBullet>(&id).unwrap().age, 5.0);
    assert_eq!(early.world.get::<SimpleBullet>(&id).unwrap().age, 5.0);

    // the late joiner's catch-up does not disturb the shared diff base
    assert!(tick_and_exchange(&mut server, &mut [&mut early, &mut late]).is_empty());
}

#[test]
fn delivery_without_tick_is_empty() {
    let mut server = TestServer::new();
    let mut client = TestClient::new(1);
    server.spawn(5, SimpleBullet::default());
    client.spawn(5, SimpleBullet::default());

    assert!(deliver_to_clients(&mut server, &mut [&mut client]).is_empty());
}
