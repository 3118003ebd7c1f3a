use std::any::TypeId;

use crate::{
    registry::replicable::Replicate,
    types::{InstanceId, PeerId},
};

/// Read access to the host's scene, which owns every replicated instance
pub trait WorldRefType {
    /// Ids of the live instances whose concrete type is `type_id`
    fn instances_of(&self, type_id: TypeId) -> Vec<InstanceId>;

    fn instance(&self, id: &InstanceId) -> Option<&dyn Replicate>;

    fn has_instance(&self, id: &InstanceId) -> bool {
        self.instance(id).is_some()
    }

    /// Server side: the client that owns (possesses) the instance, if any
    fn owner(&self, _id: &InstanceId) -> Option<PeerId> {
        None
    }

    /// Client side: whether this client possesses the instance
    fn is_possessed(&self, _id: &InstanceId) -> bool {
        false
    }
}

pub trait WorldMutType: WorldRefType {
    fn instance_mut(&mut self, id: &InstanceId) -> Option<&mut dyn Replicate>;
}
