use std::{
    any::{Any, TypeId},
    collections::HashMap,
    sync::{Arc, OnceLock, PoisonError, RwLock},
};

use log::info;

use crate::registry::{
    builder::DescriptorBuilder,
    descriptor::{ReplicaDescriptor, TypeDescriptor},
    error::ConfigError,
    replicable::Replicable,
};

/// Process-wide cache of [`TypeDescriptor`]s, keyed by type identity.
///
/// Descriptors are built lazily on first request. Building happens under the
/// write lock and the finished descriptor is published in one step, so
/// readers never observe a partially built table and each type is built once.
#[derive(Default)]
pub struct TypeRegistry {
    entries: RwLock<HashMap<TypeId, Arc<dyn Any + Send + Sync>>>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The registry shared by every Protocol that does not bring its own
    pub fn global() -> Arc<TypeRegistry> {
        static GLOBAL: OnceLock<Arc<TypeRegistry>> = OnceLock::new();
        GLOBAL.get_or_init(|| Arc::new(TypeRegistry::new())).clone()
    }

    /// Returns the cached descriptor for `T`, building it on first access.
    /// A type that fails to build is not cached; every request reports the
    /// same configuration error.
    pub fn get_descriptor<T: Replicable>(&self) -> Result<Arc<TypeDescriptor<T>>, ConfigError> {
        let type_id = TypeId::of::<T>();
        if let Some(descriptor) = self.cached::<T>(&type_id) {
            return Ok(descriptor);
        }

        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(entry) = entries.get(&type_id) {
            if let Ok(descriptor) = entry.clone().downcast::<TypeDescriptor<T>>() {
                return Ok(descriptor);
            }
        }

        let descriptor = Arc::new(DescriptorBuilder::<T>::build()?);
        info!(
            "Built replication descriptor for {} ({} fields, {} methods)",
            descriptor.type_name(),
            descriptor.field_count(),
            descriptor.method_count()
        );
        entries.insert(type_id, descriptor.clone());
        Ok(descriptor)
    }

    /// Same as [`get_descriptor`](Self::get_descriptor), type-erased
    pub fn get_replica_descriptor<T: Replicable>(
        &self,
    ) -> Result<Arc<dyn ReplicaDescriptor>, ConfigError> {
        let descriptor: Arc<dyn ReplicaDescriptor> = self.get_descriptor::<T>()?;
        Ok(descriptor)
    }

    pub fn is_built<T: Replicable>(&self) -> bool {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(&TypeId::of::<T>())
    }

    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drops every cached descriptor. Only meant for test isolation.
    pub fn reset_all(&self) {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        if !entries.is_empty() {
            info!("Resetting {} replication descriptors", entries.len());
        }
        entries.clear();
    }

    fn cached<T: Replicable>(&self, type_id: &TypeId) -> Option<Arc<TypeDescriptor<T>>> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        entries
            .get(type_id)?
            .clone()
            .downcast::<TypeDescriptor<T>>()
            .ok()
    }
}
