/// Simple World implementation for E2E testing

use std::{
    any::TypeId,
    collections::{HashMap, HashSet},
};

use replica_shared::{InstanceId, PeerId, Replicable, Replicate, WorldMutType, WorldRefType};

// TestWorld - Simple HashMap-based world
#[derive(Default)]
pub struct TestWorld {
    instances: HashMap<InstanceId, Box<dyn Replicate>>,
    owners: HashMap<InstanceId, PeerId>,
    possessed: HashSet<InstanceId>,
}

impl TestWorld {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn spawn<R: Replicable>(&mut self, id: u64, replica: R) -> InstanceId {
        let id = InstanceId::new(id);
        self.instances.insert(id, Box::new(replica));
        id
    }

    pub fn despawn(&mut self, id: &InstanceId) {
        self.instances.remove(id);
        self.owners.remove(id);
        self.possessed.remove(id);
    }

    /// Server side: marks `peer` as the owner of `id`
    pub fn set_owner(&mut self, id: InstanceId, peer: PeerId) {
        self.owners.insert(id, peer);
    }

    /// Client side: marks `id` as possessed by this client
    pub fn possess(&mut self, id: InstanceId) {
        self.possessed.insert(id);
    }

    pub fn get<R: Replicable>(&self, id: &InstanceId) -> Option<&R> {
        self.instances.get(id)?.as_any().downcast_ref::<R>()
    }

    pub fn get_mut<R: Replicable>(&mut self, id: &InstanceId) -> Option<&mut R> {
        self.instances.get_mut(id)?.as_any_mut().downcast_mut::<R>()
    }
}

impl WorldRefType for TestWorld {
    fn instances_of(&self, type_id: TypeId) -> Vec<InstanceId> {
        let mut ids: Vec<InstanceId> = self
            .instances
            .iter()
            .filter(|(_, instance)| instance.as_any().type_id() == type_id)
            .map(|(id, _)| *id)
            .collect();
        ids.sort();
        ids
    }

    fn instance(&self, id: &InstanceId) -> Option<&dyn Replicate> {
        self.instances.get(id).map(|instance| instance.as_ref())
    }

    fn owner(&self, id: &InstanceId) -> Option<PeerId> {
        self.owners.get(id).copied()
    }

    fn is_possessed(&self, id: &InstanceId) -> bool {
        self.possessed.contains(id)
    }
}

impl WorldMutType for TestWorld {
    fn instance_mut(&mut self, id: &InstanceId) -> Option<&mut dyn Replicate> {
        let instance = self.instances.get_mut(id)?;
        Some(instance.as_mut())
    }
}

#[cfg(test)]
mod tests {
    use replica_shared::{InstanceId, WorldMutType};

    use super::TestWorld;
    use crate::SimpleBullet;

    #[test]
    fn instance_mut_reaches_spawned_instances_only() {
        let mut world = TestWorld::new();
        let id = world.spawn(3, SimpleBullet::default());

        let instance = world.instance_mut(&id).unwrap();
        instance
            .as_any_mut()
            .downcast_mut::<SimpleBullet>()
            .unwrap()
            .age = 1.5;
        assert_eq!(world.get::<SimpleBullet>(&id).unwrap().age, 1.5);

        assert!(world.instance_mut(&InstanceId::new(4)).is_none());
        world.despawn(&id);
        assert!(world.instance_mut(&id).is_none());
    }
}
