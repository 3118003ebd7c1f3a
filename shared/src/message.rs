use replica_serde::{BitReader, BitWrite, BitWriter, Serde, SerdeErr};

use crate::{
    rpc::invocation::RpcInvocation,
    snapshot::snapshot::Snapshot,
    types::{InstanceId, NetId},
};

/// What a [`ReplicationMessage`] carries
#[derive(Clone, Debug, PartialEq)]
pub enum Payload {
    /// Full snapshot or diff of the instance's replicated fields
    Snapshot(Snapshot),
    /// Remote call on the instance
    Invocation(RpcInvocation),
}

impl Payload {
    pub fn name(&self) -> &'static str {
        match self {
            Payload::Snapshot(_) => "snapshot",
            Payload::Invocation(_) => "invocation",
        }
    }
}

/// One unit handed to the transport: a payload addressed to an instance of
/// a registered kind.
///
/// Layout: a tag bit (0 = snapshot, 1 = invocation), the kind net id as a
/// fixed 16-bit integer, the instance id, then the payload.
#[derive(Clone, Debug, PartialEq)]
pub struct ReplicationMessage {
    pub net_id: NetId,
    pub instance: InstanceId,
    pub payload: Payload,
}

impl ReplicationMessage {
    pub fn snapshot(net_id: NetId, instance: InstanceId, snapshot: Snapshot) -> Self {
        Self {
            net_id,
            instance,
            payload: Payload::Snapshot(snapshot),
        }
    }

    pub fn invocation(net_id: NetId, instance: InstanceId, invocation: RpcInvocation) -> Self {
        Self {
            net_id,
            instance,
            payload: Payload::Invocation(invocation),
        }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut writer = BitWriter::new();
        self.ser(&mut writer);
        writer.to_bytes()
    }

    /// Trailing padding bits from byte alignment are ignored
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, SerdeErr> {
        let mut reader = BitReader::new(bytes);
        let message = Self::de(&mut reader)?;
        if reader.bits_remaining() >= 8 {
            return Err(SerdeErr);
        }
        Ok(message)
    }
}

impl Serde for ReplicationMessage {
    fn ser(&self, writer: &mut dyn BitWrite) {
        matches!(self.payload, Payload::Invocation(_)).ser(writer);
        self.net_id.ser(writer);
        self.instance.ser(writer);
        match &self.payload {
            Payload::Snapshot(snapshot) => snapshot.ser(writer),
            Payload::Invocation(invocation) => invocation.ser(writer),
        }
    }

    fn de(reader: &mut BitReader) -> Result<Self, SerdeErr> {
        let is_invocation = bool::de(reader)?;
        let net_id = NetId::de(reader)?;
        let instance = InstanceId::de(reader)?;
        let payload = if is_invocation {
            Payload::Invocation(RpcInvocation::de(reader)?)
        } else {
            Payload::Snapshot(Snapshot::de(reader)?)
        };
        Ok(Self {
            net_id,
            instance,
            payload,
        })
    }

    fn bit_length(&self) -> u32 {
        let payload = match &self.payload {
            Payload::Snapshot(snapshot) => snapshot.bit_length(),
            Payload::Invocation(invocation) => invocation.bit_length(),
        };
        1 + self.net_id.bit_length() + self.instance.bit_length() + payload
    }
}
