use std::{sync::Arc, time::Duration};

use log::info;

use crate::{
    registry::{
        descriptor::ReplicaDescriptor,
        error::{ConfigError, LookupError},
        replicable::{Replicable, Replicate},
        type_registry::TypeRegistry,
    },
    types::NetId,
};

pub mod error;
pub mod replica_kinds;

pub use error::ProtocolError;
pub use replica_kinds::ReplicaKinds;

// Protocol Plugin
pub trait ProtocolPlugin {
    fn build(&self, protocol: &mut Protocol);
}

// Protocol
pub struct Protocol {
    pub replica_kinds: ReplicaKinds,
    /// The duration between each replication tick
    pub tick_interval: Duration,
    registry: Arc<TypeRegistry>,
    locked: bool,
}

impl Default for Protocol {
    fn default() -> Self {
        Self {
            replica_kinds: ReplicaKinds::new(),
            tick_interval: Duration::from_millis(50),
            registry: TypeRegistry::global(),
            locked: false,
        }
    }
}

impl Protocol {
    pub fn builder() -> Self {
        Self::default()
    }

    pub fn add_plugin<P: ProtocolPlugin>(&mut self, plugin: P) -> &mut Self {
        self.check_lock();
        plugin.build(self);
        self
    }

    /// Use `registry` instead of the process-wide one, e.g. to isolate tests
    pub fn registry(&mut self, registry: Arc<TypeRegistry>) -> &mut Self {
        self.check_lock();
        self.registry = registry;
        self
    }

    pub fn tick_interval(&mut self, duration: Duration) -> &mut Self {
        self.check_lock();
        self.tick_interval = duration;
        self
    }

    /// Registers a replicable type. Both peers must register the same types
    /// in the same order, since the order assigns the wire net ids.
    pub fn add_replicable<T: Replicable>(&mut self) -> &mut Self {
        self.check_lock();
        if let Err(error) = self.replica_kinds.add_replicable::<T>() {
            panic!("{}", error);
        }
        self
    }

    // Non-panicking builder methods

    pub fn try_add_plugin<P: ProtocolPlugin>(
        &mut self,
        plugin: P,
    ) -> Result<&mut Self, ConfigError> {
        self.try_check_lock()?;
        plugin.build(self);
        Ok(self)
    }

    pub fn try_registry(&mut self, registry: Arc<TypeRegistry>) -> Result<&mut Self, ConfigError> {
        self.try_check_lock()?;
        self.registry = registry;
        Ok(self)
    }

    pub fn try_tick_interval(&mut self, duration: Duration) -> Result<&mut Self, ConfigError> {
        self.try_check_lock()?;
        self.tick_interval = duration;
        Ok(self)
    }

    pub fn try_add_replicable<T: Replicable>(&mut self) -> Result<&mut Self, ConfigError> {
        self.try_check_lock()?;
        self.replica_kinds.add_replicable::<T>()?;
        Ok(self)
    }

    /// Builds the descriptor of every registered type, so configuration
    /// errors surface here rather than on the first received message
    pub fn try_lock(&mut self) -> Result<(), ConfigError> {
        self.try_check_lock()?;
        self.replica_kinds.load_all(&self.registry)?;
        self.locked = true;
        info!(
            "Protocol locked with {} replicable kinds",
            self.replica_kinds.len()
        );
        Ok(())
    }

    pub fn lock(&mut self) {
        self.check_lock();
        if let Err(error) = self.try_lock() {
            panic!("{}", error);
        }
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    /// Checks if protocol is locked without panicking
    /// Returns Err if protocol is locked
    pub fn try_check_lock(&self) -> Result<(), ConfigError> {
        if self.locked {
            Err(ConfigError::ProtocolLocked)
        } else {
            Ok(())
        }
    }

    /// Checks if protocol is locked, panics if it is
    pub fn check_lock(&self) {
        if self.locked {
            panic!("Protocol already locked!");
        }
    }

    pub fn build(&mut self) -> Self {
        std::mem::take(self)
    }

    // Lookups

    pub fn type_registry(&self) -> &Arc<TypeRegistry> {
        &self.registry
    }

    pub fn descriptor(&self, net_id: NetId) -> Result<&Arc<dyn ReplicaDescriptor>, ProtocolError> {
        self.replica_kinds.descriptor(net_id)
    }

    pub fn descriptor_of<T: Replicable>(
        &self,
    ) -> Result<(NetId, &Arc<dyn ReplicaDescriptor>), LookupError> {
        self.replica_kinds.descriptor_of::<T>()
    }

    /// Net id and descriptor of the concrete type behind `instance`
    pub fn descriptor_of_instance(
        &self,
        instance: &dyn Replicate,
    ) -> Result<(NetId, &Arc<dyn ReplicaDescriptor>), LookupError> {
        let net_id = self.replica_kinds.net_id_of_instance(instance)?;
        let descriptor =
            self.replica_kinds
                .descriptor(net_id)
                .map_err(|_| LookupError::TypeNotRegistered {
                    type_name: instance.type_name(),
                })?;
        Ok((net_id, descriptor))
    }
}
