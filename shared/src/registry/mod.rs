pub mod builder;
pub mod descriptor;
pub mod error;
pub mod replicable;
pub mod type_registry;
