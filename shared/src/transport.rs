use crate::types::{InstanceId, PeerId};

/// Who a message is sent to. Resolving `Replicating` to the set of clients
/// currently seeing the instance is up to the transport.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Recipient {
    Server,
    Client(PeerId),
    Replicating(InstanceId),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendError;

pub trait Transport {
    /// Hands one encoded message to the transport
    fn send(&mut self, recipient: Recipient, payload: &[u8]) -> Result<(), SendError>;
}
