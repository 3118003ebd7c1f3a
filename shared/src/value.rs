use replica_serde::{BitReader, BitWrite, Serde, SerdeErr, UnsignedInteger};

use crate::types::InstanceId;

#[derive(Clone, Copy, Debug, Default)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

// Bitwise, so a NaN component equals itself and 0.0 differs from -0.0
impl PartialEq for Vec2 {
    fn eq(&self, other: &Self) -> bool {
        self.x.to_bits() == other.x.to_bits() && self.y.to_bits() == other.y.to_bits()
    }
}

impl Serde for Vec2 {
    fn ser(&self, writer: &mut dyn BitWrite) {
        self.x.ser(writer);
        self.y.ser(writer);
    }

    fn de(reader: &mut BitReader) -> Result<Self, SerdeErr> {
        Ok(Self::new(f32::de(reader)?, f32::de(reader)?))
    }

    fn bit_length(&self) -> u32 {
        64
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }
}

impl PartialEq for Vec3 {
    fn eq(&self, other: &Self) -> bool {
        self.x.to_bits() == other.x.to_bits()
            && self.y.to_bits() == other.y.to_bits()
            && self.z.to_bits() == other.z.to_bits()
    }
}

impl Serde for Vec3 {
    fn ser(&self, writer: &mut dyn BitWrite) {
        self.x.ser(writer);
        self.y.ser(writer);
        self.z.ser(writer);
    }

    fn de(reader: &mut BitReader) -> Result<Self, SerdeErr> {
        Ok(Self::new(f32::de(reader)?, f32::de(reader)?, f32::de(reader)?))
    }

    fn bit_length(&self) -> u32 {
        96
    }
}

/// The kind of a [`Value`], written on the wire as a 4-bit tag
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Bool,
    I32,
    I64,
    F32,
    F64,
    Str,
    Vec2,
    Vec3,
    Instance,
    Bytes,
}

type KindTag = UnsignedInteger<4>;

impl ValueKind {
    const ALL: [ValueKind; 10] = [
        ValueKind::Bool,
        ValueKind::I32,
        ValueKind::I64,
        ValueKind::F32,
        ValueKind::F64,
        ValueKind::Str,
        ValueKind::Vec2,
        ValueKind::Vec3,
        ValueKind::Instance,
        ValueKind::Bytes,
    ];

    fn tag(self) -> u8 {
        match self {
            ValueKind::Bool => 0,
            ValueKind::I32 => 1,
            ValueKind::I64 => 2,
            ValueKind::F32 => 3,
            ValueKind::F64 => 4,
            ValueKind::Str => 5,
            ValueKind::Vec2 => 6,
            ValueKind::Vec3 => 7,
            ValueKind::Instance => 8,
            ValueKind::Bytes => 9,
        }
    }

    fn from_tag(tag: u8) -> Option<Self> {
        Self::ALL.iter().copied().find(|kind| kind.tag() == tag)
    }
}

impl Serde for ValueKind {
    fn ser(&self, writer: &mut dyn BitWrite) {
        KindTag::new(self.tag()).ser(writer);
    }

    fn de(reader: &mut BitReader) -> Result<Self, SerdeErr> {
        let tag: u8 = KindTag::de(reader)?.to();
        Self::from_tag(tag).ok_or(SerdeErr)
    }

    fn bit_length(&self) -> u32 {
        4
    }
}

/// A self-describing replicated value. Field values and RPC arguments are
/// carried as `Value`s so either side can decode them without a schema.
///
/// Floats compare by bit pattern: a value equals exactly what it decodes to.
#[derive(Clone, Debug)]
pub enum Value {
    Bool(bool),
    I32(i32),
    I64(i64),
    F32(f32),
    F64(f64),
    Str(String),
    Vec2(Vec2),
    Vec3(Vec3),
    /// Reference to another replicated instance, e.g. the node that spawned a bullet
    Instance(Option<InstanceId>),
    Bytes(Vec<u8>),
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::I32(a), Value::I32(b)) => a == b,
            (Value::I64(a), Value::I64(b)) => a == b,
            (Value::F32(a), Value::F32(b)) => a.to_bits() == b.to_bits(),
            (Value::F64(a), Value::F64(b)) => a.to_bits() == b.to_bits(),
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Vec2(a), Value::Vec2(b)) => a == b,
            (Value::Vec3(a), Value::Vec3(b)) => a == b,
            (Value::Instance(a), Value::Instance(b)) => a == b,
            (Value::Bytes(a), Value::Bytes(b)) => a == b,
            _ => false,
        }
    }
}

impl Value {
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Bool(_) => ValueKind::Bool,
            Value::I32(_) => ValueKind::I32,
            Value::I64(_) => ValueKind::I64,
            Value::F32(_) => ValueKind::F32,
            Value::F64(_) => ValueKind::F64,
            Value::Str(_) => ValueKind::Str,
            Value::Vec2(_) => ValueKind::Vec2,
            Value::Vec3(_) => ValueKind::Vec3,
            Value::Instance(_) => ValueKind::Instance,
            Value::Bytes(_) => ValueKind::Bytes,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_i32(&self) -> Option<i32> {
        match self {
            Value::I32(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_f32(&self) -> Option<f32> {
        match self {
            Value::F32(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(value) => Some(value.as_str()),
            _ => None,
        }
    }

    pub fn as_vec2(&self) -> Option<Vec2> {
        match self {
            Value::Vec2(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_vec3(&self) -> Option<Vec3> {
        match self {
            Value::Vec3(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_instance(&self) -> Option<Option<InstanceId>> {
        match self {
            Value::Instance(value) => Some(*value),
            _ => None,
        }
    }
}

impl Serde for Value {
    fn ser(&self, writer: &mut dyn BitWrite) {
        self.kind().ser(writer);
        match self {
            Value::Bool(value) => value.ser(writer),
            Value::I32(value) => value.ser(writer),
            Value::I64(value) => value.ser(writer),
            Value::F32(value) => value.ser(writer),
            Value::F64(value) => value.ser(writer),
            Value::Str(value) => value.ser(writer),
            Value::Vec2(value) => value.ser(writer),
            Value::Vec3(value) => value.ser(writer),
            Value::Instance(value) => value.ser(writer),
            Value::Bytes(value) => value.ser(writer),
        }
    }

    fn de(reader: &mut BitReader) -> Result<Self, SerdeErr> {
        let value = match ValueKind::de(reader)? {
            ValueKind::Bool => Value::Bool(Serde::de(reader)?),
            ValueKind::I32 => Value::I32(Serde::de(reader)?),
            ValueKind::I64 => Value::I64(Serde::de(reader)?),
            ValueKind::F32 => Value::F32(Serde::de(reader)?),
            ValueKind::F64 => Value::F64(Serde::de(reader)?),
            ValueKind::Str => Value::Str(Serde::de(reader)?),
            ValueKind::Vec2 => Value::Vec2(Serde::de(reader)?),
            ValueKind::Vec3 => Value::Vec3(Serde::de(reader)?),
            ValueKind::Instance => Value::Instance(Serde::de(reader)?),
            ValueKind::Bytes => Value::Bytes(Serde::de(reader)?),
        };
        Ok(value)
    }

    fn bit_length(&self) -> u32 {
        let payload = match self {
            Value::Bool(value) => value.bit_length(),
            Value::I32(value) => value.bit_length(),
            Value::I64(value) => value.bit_length(),
            Value::F32(value) => value.bit_length(),
            Value::F64(value) => value.bit_length(),
            Value::Str(value) => value.bit_length(),
            Value::Vec2(value) => value.bit_length(),
            Value::Vec3(value) => value.bit_length(),
            Value::Instance(value) => value.bit_length(),
            Value::Bytes(value) => value.bit_length(),
        };
        self.kind().bit_length() + payload
    }
}

/// A Rust type that can back a replicated field or travel as an RPC argument
pub trait ReplicatedField: Clone + PartialEq + Send + Sync + 'static {
    const KIND: ValueKind;

    fn to_value(&self) -> Value;

    /// Returns `None` when the value is of a different kind
    fn from_value(value: Value) -> Option<Self>;
}

macro_rules! impl_replicated_field {
    ($type:ty, $variant:ident) => {
        impl ReplicatedField for $type {
            const KIND: ValueKind = ValueKind::$variant;

            fn to_value(&self) -> Value {
                Value::$variant(self.clone())
            }

            fn from_value(value: Value) -> Option<Self> {
                match value {
                    Value::$variant(inner) => Some(inner),
                    _ => None,
                }
            }
        }

        impl From<$type> for Value {
            fn from(value: $type) -> Self {
                Value::$variant(value)
            }
        }
    };
}

impl_replicated_field!(bool, Bool);
impl_replicated_field!(i32, I32);
impl_replicated_field!(i64, I64);
impl_replicated_field!(f32, F32);
impl_replicated_field!(f64, F64);
impl_replicated_field!(String, Str);
impl_replicated_field!(Vec2, Vec2);
impl_replicated_field!(Vec3, Vec3);
impl_replicated_field!(Option<InstanceId>, Instance);
impl_replicated_field!(Vec<u8>, Bytes);

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Str(value.to_string())
    }
}

impl From<InstanceId> for Value {
    fn from(value: InstanceId) -> Self {
        Value::Instance(Some(value))
    }
}
