use std::{
    any::{type_name, TypeId},
    collections::HashMap,
    sync::Arc,
};

use crate::{
    protocol::error::ProtocolError,
    registry::{
        descriptor::ReplicaDescriptor,
        error::{ConfigError, LookupError},
        replicable::{Replicable, Replicate},
        type_registry::TypeRegistry,
    },
    types::NetId,
};

type DescriptorLoader = fn(&TypeRegistry) -> Result<Arc<dyn ReplicaDescriptor>, ConfigError>;

struct ReplicaKind {
    net_id: NetId,
    type_name: &'static str,
    load: DescriptorLoader,
    descriptor: Option<Arc<dyn ReplicaDescriptor>>,
}

/// Replicable types known to a Protocol, each with the wire net id it was
/// given in registration order
#[derive(Default)]
pub struct ReplicaKinds {
    current_net_id: NetId,
    kind_map: HashMap<TypeId, ReplicaKind>,
    net_id_map: HashMap<NetId, TypeId>,
}

impl ReplicaKinds {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_replicable<T: Replicable>(&mut self) -> Result<NetId, ConfigError> {
        let type_id = TypeId::of::<T>();
        if self.kind_map.contains_key(&type_id) {
            return Err(ConfigError::AlreadyRegistered {
                type_name: type_name::<T>(),
            });
        }
        if self.kind_map.len() >= usize::from(NetId::MAX) {
            return Err(ConfigError::TooManySlots {
                type_name: "Protocol",
                slot: "replicable kind",
                count: self.kind_map.len() + 1,
            });
        }

        let net_id = self.current_net_id;
        self.kind_map.insert(
            type_id,
            ReplicaKind {
                net_id,
                type_name: type_name::<T>(),
                load: |registry| registry.get_replica_descriptor::<T>(),
                descriptor: None,
            },
        );
        self.net_id_map.insert(net_id, type_id);
        self.current_net_id += 1;
        Ok(net_id)
    }

    /// Builds every descriptor through `registry` and keeps them for lookups
    pub(crate) fn load_all(&mut self, registry: &TypeRegistry) -> Result<(), ConfigError> {
        let mut net_ids: Vec<NetId> = self.net_id_map.keys().copied().collect();
        net_ids.sort_unstable();
        for net_id in net_ids {
            let type_id = self.net_id_map[&net_id];
            let Some(kind) = self.kind_map.get_mut(&type_id) else {
                continue;
            };
            kind.descriptor = Some((kind.load)(registry)?);
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.kind_map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.kind_map.is_empty()
    }

    /// Net ids in registration order
    pub fn net_ids(&self) -> impl Iterator<Item = NetId> {
        0..self.current_net_id
    }

    pub fn net_id_of<T: Replicable>(&self) -> Result<NetId, LookupError> {
        self.kind_map
            .get(&TypeId::of::<T>())
            .map(|kind| kind.net_id)
            .ok_or(LookupError::TypeNotRegistered {
                type_name: type_name::<T>(),
            })
    }

    /// Net id of the concrete type behind `instance`
    pub fn net_id_of_instance(&self, instance: &dyn Replicate) -> Result<NetId, LookupError> {
        self.kind_map
            .get(&instance.as_any().type_id())
            .map(|kind| kind.net_id)
            .ok_or(LookupError::TypeNotRegistered {
                type_name: instance.type_name(),
            })
    }

    pub fn type_id(&self, net_id: NetId) -> Option<TypeId> {
        self.net_id_map.get(&net_id).copied()
    }

    pub fn type_name(&self, net_id: NetId) -> Option<&'static str> {
        let type_id = self.net_id_map.get(&net_id)?;
        self.kind_map.get(type_id).map(|kind| kind.type_name)
    }

    /// Descriptor for a received net id. Only available once the Protocol is locked.
    pub fn descriptor(&self, net_id: NetId) -> Result<&Arc<dyn ReplicaDescriptor>, ProtocolError> {
        self.net_id_map
            .get(&net_id)
            .and_then(|type_id| self.kind_map.get(type_id))
            .and_then(|kind| kind.descriptor.as_ref())
            .ok_or(ProtocolError::UnknownKind { net_id })
    }

    pub fn descriptor_of<T: Replicable>(
        &self,
    ) -> Result<(NetId, &Arc<dyn ReplicaDescriptor>), LookupError> {
        let not_registered = LookupError::TypeNotRegistered {
            type_name: type_name::<T>(),
        };
        let Some(kind) = self.kind_map.get(&TypeId::of::<T>()) else {
            return Err(not_registered);
        };
        kind.descriptor
            .as_ref()
            .map(|descriptor| (kind.net_id, descriptor))
            .ok_or(not_registered)
    }
}
