/// In-memory transport for E2E testing
/// Records every message instead of putting it on a network

use std::collections::VecDeque;

use replica_shared::{Recipient, SendError, Transport};

#[derive(Default)]
pub struct LocalTransport {
    outgoing: VecDeque<(Recipient, Vec<u8>)>,
    refuse: bool,
}

impl LocalTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// A transport whose every send fails, to exercise error paths
    pub fn refusing() -> Self {
        Self {
            outgoing: VecDeque::new(),
            refuse: true,
        }
    }

    pub fn len(&self) -> usize {
        self.outgoing.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outgoing.is_empty()
    }

    /// Number of queued messages addressed to `recipient`
    pub fn sent_to(&self, recipient: &Recipient) -> usize {
        self.outgoing
            .iter()
            .filter(|(to, _)| to == recipient)
            .count()
    }

    /// Takes every queued message, oldest first
    pub fn drain(&mut self) -> Vec<(Recipient, Vec<u8>)> {
        self.outgoing.drain(..).collect()
    }
}

impl Transport for LocalTransport {
    fn send(&mut self, recipient: Recipient, payload: &[u8]) -> Result<(), SendError> {
        if self.refuse {
            return Err(SendError);
        }
        self.outgoing.push_back((recipient, payload.to_vec()));
        Ok(())
    }
}
