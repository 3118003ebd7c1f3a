/// Test wrapper around ReplicaServer with its own world and transport

use replica_server::{ReplicaServer, ServerConfig};
use replica_shared::{InstanceId, PeerId, Replicable};

use crate::{protocol, LocalTransport, TestWorld};

pub struct TestServer {
    pub server: ReplicaServer,
    pub world: TestWorld,
    pub transport: LocalTransport,
}

impl TestServer {
    pub fn new() -> Self {
        Self::with_config(ServerConfig::default())
    }

    pub fn with_config(config: ServerConfig) -> Self {
        let server = match ReplicaServer::new(config, protocol()) {
            Ok(server) => server,
            Err(error) => panic!("test protocol failed to build: {}", error),
        };
        Self {
            server,
            world: TestWorld::new(),
            transport: LocalTransport::new(),
        }
    }

    pub fn spawn<R: Replicable>(&mut self, id: u64, replica: R) -> InstanceId {
        self.world.spawn(id, replica)
    }

    /// Spawns an instance owned by `owner`
    pub fn spawn_owned<R: Replicable>(&mut self, id: u64, replica: R, owner: PeerId) -> InstanceId {
        let id = self.world.spawn(id, replica);
        self.world.set_owner(id, owner);
        id
    }

    pub fn send_all_updates(&mut self) -> usize {
        self.server
            .send_all_updates(&self.world, &mut self.transport)
    }

    /// Catches a client that joined late up with full snapshots
    pub fn send_full_to(&mut self, peer: PeerId) -> usize {
        self.server
            .send_full_to(peer, &self.world, &mut self.transport)
    }
}

impl Default for TestServer {
    fn default() -> Self {
        Self::new()
    }
}
