use replica_serde::{BitReader, BitWrite, Serde, SerdeErr, UnsignedVariableInteger};

use crate::{types::MethodOrdinal, value::Value};

type ArgCount = UnsignedVariableInteger<3>;

/// A remote call addressed by method ordinal, with its positional arguments
#[derive(Clone, Debug, PartialEq)]
pub struct RpcInvocation {
    method: MethodOrdinal,
    args: Vec<Value>,
}

impl RpcInvocation {
    pub fn new(method: MethodOrdinal, args: Vec<Value>) -> Self {
        Self { method, args }
    }

    pub fn method(&self) -> MethodOrdinal {
        self.method
    }

    pub fn args(&self) -> &[Value] {
        &self.args
    }

    pub fn into_args(self) -> Vec<Value> {
        self.args
    }
}

impl Serde for RpcInvocation {
    fn ser(&self, writer: &mut dyn BitWrite) {
        self.method.ser(writer);
        ArgCount::new(self.args.len() as u64).ser(writer);
        for arg in &self.args {
            arg.ser(writer);
        }
    }

    fn de(reader: &mut BitReader) -> Result<Self, SerdeErr> {
        let method = MethodOrdinal::de(reader)?;
        let count = ArgCount::de(reader)?.get();
        let count = usize::try_from(count).map_err(|_| SerdeErr)?;
        // every value carries at least its 4-bit kind tag
        if count > reader.bits_remaining() / 4 {
            return Err(SerdeErr);
        }
        let mut args = Vec::with_capacity(count);
        for _ in 0..count {
            args.push(Value::de(reader)?);
        }
        Ok(Self { method, args })
    }

    fn bit_length(&self) -> u32 {
        self.args.iter().fold(
            self.method.bit_length() + ArgCount::new(self.args.len() as u64).bit_length(),
            |acc, arg| acc + arg.bit_length(),
        )
    }
}
