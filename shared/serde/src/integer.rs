use crate::{
    bit_reader::BitReader, bit_writer::BitWrite, error::SerdeErr, serde::Serde, ConstBitLength,
};

pub trait SerdeIntegerConversion<const SIGNED: bool, const VARIABLE: bool, const BITS: u8> {
    fn from_integer(value: &SerdeInteger<SIGNED, VARIABLE, BITS>) -> Self;
}

pub type UnsignedInteger<const BITS: u8> = SerdeInteger<false, false, BITS>;
pub type SignedInteger<const BITS: u8> = SerdeInteger<true, false, BITS>;
pub type UnsignedVariableInteger<const BITS: u8> = SerdeInteger<false, true, BITS>;
pub type SignedVariableInteger<const BITS: u8> = SerdeInteger<true, true, BITS>;

/// An integer written with a chosen number of bits. Fixed integers always
/// occupy `BITS` bits (plus a sign bit when signed). Variable integers are
/// written in `BITS`-sized chunks, each preceded by a continuation bit.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub struct SerdeInteger<const SIGNED: bool, const VARIABLE: bool, const BITS: u8> {
    inner: IntegerLayout,
}

// Non-generic so the bit twiddling is only compiled once.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
struct IntegerLayout {
    value: i128,
    signed: bool,
    variable: bool,
    bits: u8,
}

impl IntegerLayout {
    fn new(signed: bool, variable: bool, bits: u8, value: i128) -> Self {
        assert!(bits > 0 && bits < 128, "integer width must be within 1..=127 bits");
        assert!(
            signed || value >= 0,
            "can't encode a negative number with an Unsigned Integer!"
        );
        if !variable {
            let limit: u128 = 1_u128 << bits;
            assert!(
                value.unsigned_abs() < limit,
                "with {} bits, can't encode {}",
                bits,
                value
            );
        }

        Self {
            value,
            signed,
            variable,
            bits,
        }
    }

    fn write_chunk(writer: &mut dyn BitWrite, magnitude: &mut u128, bits: u8) {
        for _ in 0..bits {
            writer.write_bit(*magnitude & 1 != 0);
            *magnitude >>= 1;
        }
    }

    fn read_chunk(reader: &mut BitReader, bits: u8, shift: u32) -> Result<u128, SerdeErr> {
        let mut chunk: u128 = 0;
        for index in 0..u32::from(bits) {
            if reader.read_bit()? {
                let position = shift + index;
                if position >= 128 {
                    return Err(SerdeErr);
                }
                chunk |= 1 << position;
            }
        }
        Ok(chunk)
    }

    fn ser(&self, writer: &mut dyn BitWrite) {
        if self.signed {
            writer.write_bit(self.value < 0);
        }

        let mut magnitude = self.value.unsigned_abs();

        if self.variable {
            let chunk_limit: u128 = 1_u128 << self.bits;
            loop {
                let proceed = magnitude >= chunk_limit;
                writer.write_bit(proceed);
                Self::write_chunk(writer, &mut magnitude, self.bits);
                if !proceed {
                    return;
                }
            }
        } else {
            Self::write_chunk(writer, &mut magnitude, self.bits);
        }
    }

    fn de(reader: &mut BitReader, signed: bool, variable: bool, bits: u8) -> Result<Self, SerdeErr> {
        let negative = if signed { reader.read_bit()? } else { false };

        let mut magnitude: u128 = 0;
        if variable {
            let mut shift: u32 = 0;
            loop {
                let proceed = reader.read_bit()?;
                magnitude |= Self::read_chunk(reader, bits, shift)?;
                shift += u32::from(bits);
                if !proceed {
                    break;
                }
            }
        } else {
            magnitude = Self::read_chunk(reader, bits, 0)?;
        }

        let Ok(value) = i128::try_from(magnitude) else {
            return Err(SerdeErr);
        };

        Ok(Self {
            value: if negative { -value } else { value },
            signed,
            variable,
            bits,
        })
    }

    fn bit_length(&self) -> u32 {
        let mut output: u32 = if self.signed { 1 } else { 0 };

        if self.variable {
            let chunk_limit: u128 = 1_u128 << self.bits;
            let mut magnitude = self.value.unsigned_abs();
            loop {
                output += 1 + u32::from(self.bits);
                if magnitude < chunk_limit {
                    break;
                }
                magnitude >>= self.bits;
            }
        } else {
            output += u32::from(self.bits);
        }

        output
    }
}

impl<const SIGNED: bool, const VARIABLE: bool, const BITS: u8> SerdeInteger<SIGNED, VARIABLE, BITS> {
    /// # Panics
    ///
    /// Panics when the value does not fit the integer's layout.
    pub fn new<T: Into<i128>>(value: T) -> Self {
        Self {
            inner: IntegerLayout::new(SIGNED, VARIABLE, BITS, value.into()),
        }
    }

    pub fn get(&self) -> i128 {
        self.inner.value
    }

    pub fn to<T: SerdeIntegerConversion<SIGNED, VARIABLE, BITS>>(&self) -> T {
        T::from_integer(self)
    }
}

impl<const SIGNED: bool, const VARIABLE: bool, const BITS: u8> Serde
    for SerdeInteger<SIGNED, VARIABLE, BITS>
{
    fn ser(&self, writer: &mut dyn BitWrite) {
        self.inner.ser(writer);
    }

    fn de(reader: &mut BitReader) -> Result<Self, SerdeErr> {
        let inner = IntegerLayout::de(reader, SIGNED, VARIABLE, BITS)?;
        Ok(Self { inner })
    }

    fn bit_length(&self) -> u32 {
        self.inner.bit_length()
    }
}

impl<const SIGNED: bool, const BITS: u8> ConstBitLength for SerdeInteger<SIGNED, false, BITS> {
    fn const_bit_length() -> u32 {
        u32::from(BITS) + if SIGNED { 1 } else { 0 }
    }
}

impl<const SIGNED: bool, const VARIABLE: bool, const BITS: u8, T: Into<i128>> From<T>
    for SerdeInteger<SIGNED, VARIABLE, BITS>
{
    fn from(value: T) -> Self {
        Self::new(value)
    }
}

impl<const SIGNED: bool, const VARIABLE: bool, const BITS: u8, T: TryFrom<i128>>
    SerdeIntegerConversion<SIGNED, VARIABLE, BITS> for T
{
    fn from_integer(value: &SerdeInteger<SIGNED, VARIABLE, BITS>) -> Self {
        let Ok(t_value) = T::try_from(value.get()) else {
            panic!("SerdeInteger's value is out of range to convert to this type.");
        };
        t_value
    }
}
