/// Test wrapper around ReplicaClient with its own world and transport

use replica_client::{ClientConfig, ReplicaClient};
use replica_shared::{InstanceId, PeerId, Replicable};

use crate::{protocol, LocalTransport, TestWorld};

pub struct TestClient {
    pub peer: PeerId,
    pub client: ReplicaClient,
    pub world: TestWorld,
    pub transport: LocalTransport,
}

impl TestClient {
    pub fn new(peer: u64) -> Self {
        let client = match ReplicaClient::new(ClientConfig::default(), protocol()) {
            Ok(client) => client,
            Err(error) => panic!("test protocol failed to build: {}", error),
        };
        Self {
            peer: PeerId::new(peer),
            client,
            world: TestWorld::new(),
            transport: LocalTransport::new(),
        }
    }

    /// Mirrors a server-side spawn into this client's world
    pub fn spawn<R: Replicable>(&mut self, id: u64, replica: R) -> InstanceId {
        self.world.spawn(id, replica)
    }

    /// Mirrors a server-side spawn this client owns
    pub fn spawn_possessed<R: Replicable>(&mut self, id: u64, replica: R) -> InstanceId {
        let id = self.world.spawn(id, replica);
        self.world.possess(id);
        id
    }
}
