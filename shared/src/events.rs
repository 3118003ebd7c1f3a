use crate::{
    rpc::dispatch::{DispatchOutcome, DropReason},
    types::{InstanceId, MethodOrdinal, NetId},
};

/// What happened to one received message
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReceiveEvent {
    /// A snapshot or diff was written into the instance
    Applied { net_id: NetId, instance: InstanceId },
    /// An invocation went through dispatch
    Invoked {
        net_id: NetId,
        instance: InstanceId,
        method: MethodOrdinal,
        outcome: DispatchOutcome,
    },
    /// A snapshot arrived for an instance this process does not have
    Dropped {
        net_id: NetId,
        instance: InstanceId,
        reason: DropReason,
    },
}

impl ReceiveEvent {
    pub fn instance(&self) -> InstanceId {
        match self {
            ReceiveEvent::Applied { instance, .. }
            | ReceiveEvent::Invoked { instance, .. }
            | ReceiveEvent::Dropped { instance, .. } => *instance,
        }
    }
}
