//! # Replica Shared
//! Type registry, snapshot diffing, RPC dispatch and wire codec shared
//! between replica-server & replica-client crates.

#![deny(trivial_numeric_casts, unstable_features, unused_import_braces)]

pub use replica_serde::{
    BitReader, BitWrite, BitWriter, ConstBitLength, Serde, SerdeErr, UnsignedInteger,
    UnsignedVariableInteger,
};

mod error;
mod events;
mod message;
mod protocol;
mod registry;
mod rpc;
mod snapshot;
mod transport;
mod types;
mod value;
mod world_type;

pub use error::ReplicaError;
pub use events::ReceiveEvent;
pub use message::{Payload, ReplicationMessage};
pub use protocol::{Protocol, ProtocolError, ProtocolPlugin, ReplicaKinds};
pub use registry::{
    builder::DescriptorBuilder,
    descriptor::{FieldSlot, MethodSlot, ReplicaDescriptor, Target, TypeDescriptor, Visibility},
    error::{ConfigError, LookupError},
    replicable::{Replicable, Replicate},
    type_registry::TypeRegistry,
};
pub use rpc::{
    dispatch::{dispatch, route, DispatchOutcome, DropReason, Route},
    invocation::RpcInvocation,
    outbox::{QueuedCall, RpcOutbox},
};
pub use snapshot::{diff_mask::DiffMask, snapshot::Snapshot};
pub use transport::{Recipient, SendError, Transport};
pub use types::{Context, InstanceId, MethodOrdinal, NetId, PeerId};
pub use value::{ReplicatedField, Value, ValueKind, Vec2, Vec3};
pub use world_type::{WorldMutType, WorldRefType};
