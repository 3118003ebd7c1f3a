/// E2E tests for messages that do not match the local descriptors: they are
/// rejected with an error and leave the world untouched

use replica_shared::{
    Context, DiffMask, InstanceId, ProtocolError, ReplicationMessage, RpcInvocation, Snapshot,
    Value, Vec2,
};
use replica_test::{tick_and_exchange, PlayerInfo, SimplePlayer, TestClient, TestServer};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn id(value: u64) -> InstanceId {
    InstanceId::new(value)
}

fn connected_pair() -> (TestServer, TestClient) {
    let mut server = TestServer::new();
    let mut client = TestClient::new(1);
    let info = server.spawn_owned(1, PlayerInfo::new("bob"), client.peer);
    server.spawn_owned(2, SimplePlayer::new(info), client.peer);
    client.spawn_possessed(1, PlayerInfo::default());
    client.spawn_possessed(2, SimplePlayer::default());
    tick_and_exchange(&mut server, &mut [&mut client]);
    (server, client)
}

#[test]
fn empty_bytes_are_malformed() {
    init_logging();
    let (mut server, mut client) = connected_pair();

    let result = server
        .server
        .receive(client.peer, &[], &mut server.world, &mut server.transport);
    assert!(matches!(result, Err(ProtocolError::Malformed(_))));

    let result = client
        .client
        .receive(&[], &mut client.world, &mut client.transport);
    assert!(matches!(result, Err(ProtocolError::Malformed(_))));
}

#[test]
fn trailing_bytes_are_malformed() {
    init_logging();
    let (_, mut client) = connected_pair();

    let mut bytes =
        ReplicationMessage::invocation(0, id(1), RpcInvocation::new(2, vec!["hi".into()]))
            .to_bytes();
    bytes.extend_from_slice(&[0xAB, 0xCD]);

    let result = client
        .client
        .receive(&bytes, &mut client.world, &mut client.transport);
    assert!(matches!(result, Err(ProtocolError::Malformed(_))));
    assert!(client
        .world
        .get::<PlayerInfo>(&id(1))
        .unwrap()
        .chat_log
        .is_empty());
}

#[test]
fn unknown_net_id_is_rejected() {
    init_logging();
    let (mut server, client) = connected_pair();

    let bytes =
        ReplicationMessage::invocation(99, id(1), RpcInvocation::new(0, Vec::new())).to_bytes();
    let result = server
        .server
        .receive(client.peer, &bytes, &mut server.world, &mut server.transport);

    assert_eq!(result, Err(ProtocolError::UnknownKind { net_id: 99 }));
}

#[test]
fn unknown_method_ordinal_is_rejected() {
    init_logging();
    let (_, mut client) = connected_pair();

    let bytes =
        ReplicationMessage::invocation(0, id(1), RpcInvocation::new(40, Vec::new())).to_bytes();
    let result = client
        .client
        .receive(&bytes, &mut client.world, &mut client.transport);

    assert!(matches!(
        result,
        Err(ProtocolError::UnknownMethod { ordinal: 40, .. })
    ));
}

#[test]
fn wrong_argument_kind_on_the_wire_is_rejected() {
    init_logging();
    let (mut server, client) = connected_pair();

    // `say` takes a string
    let bytes =
        ReplicationMessage::invocation(0, id(1), RpcInvocation::new(0, vec![Value::I32(5)]))
            .to_bytes();
    let result = server
        .server
        .receive(client.peer, &bytes, &mut server.world, &mut server.transport);

    assert!(matches!(
        result,
        Err(ProtocolError::ArgumentKind { index: 0, .. })
    ));
    assert!(server.transport.is_empty());
}

#[test]
fn clients_cannot_send_snapshots() {
    init_logging();
    let (mut server, client) = connected_pair();

    let bytes =
        ReplicationMessage::snapshot(0, id(1), Snapshot::full(vec!["mallory".into()])).to_bytes();
    let result = server
        .server
        .receive(client.peer, &bytes, &mut server.world, &mut server.transport);

    assert_eq!(
        result,
        Err(ProtocolError::UnexpectedMessage {
            context: Context::Server,
            message: "snapshot",
        })
    );
    assert_eq!(server.world.get::<PlayerInfo>(&id(1)).unwrap().name, "bob");
}

#[test]
fn snapshot_with_wrong_value_kind_is_rejected() {
    init_logging();
    let (_, mut client) = connected_pair();

    let mut mask = DiffMask::for_fields(1);
    mask.set_bit(0, true);
    let snapshot = Snapshot::from_parts(mask, vec![Value::Vec2(Vec2::new(1.0, 2.0))]).unwrap();
    let bytes = ReplicationMessage::snapshot(0, id(1), snapshot).to_bytes();

    let result = client
        .client
        .receive(&bytes, &mut client.world, &mut client.transport);

    assert!(matches!(
        result,
        Err(ProtocolError::ValueKindMismatch { field: "name", .. })
    ));
    assert_eq!(client.world.get::<PlayerInfo>(&id(1)).unwrap().name, "bob");
}

#[test]
fn snapshot_addressed_to_wrong_type_is_rejected() {
    init_logging();
    let (_, mut client) = connected_pair();

    // net id 0 is PlayerInfo, instance 2 is a SimplePlayer
    let bytes =
        ReplicationMessage::snapshot(0, id(2), Snapshot::full(vec!["eve".into()])).to_bytes();
    let result = client
        .client
        .receive(&bytes, &mut client.world, &mut client.transport);

    assert!(matches!(result, Err(ProtocolError::KindMismatch { .. })));
}

#[test]
fn errors_do_not_stop_later_messages() {
    init_logging();
    let (mut server, mut client) = connected_pair();

    let _ = client
        .client
        .receive(&[0xFF], &mut client.world, &mut client.transport);

    server
        .world
        .get_mut::<PlayerInfo>(&id(1))
        .unwrap()
        .name = "robert".to_string();
    tick_and_exchange(&mut server, &mut [&mut client]);

    assert_eq!(client.world.get::<PlayerInfo>(&id(1)).unwrap().name, "robert");
}
