use replica_serde::{BitReader, BitWrite, Serde, SerdeErr, UnsignedVariableInteger};

/// Presence bitset of a snapshot, one bit per field ordinal. Storage is
/// byte aligned, so a type with 3 fields gets a mask with a capacity of 8.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Default)]
pub struct DiffMask {
    mask: Vec<u8>,
}

impl DiffMask {
    /// Create a new, cleared mask able to hold `field_count` bits
    pub fn for_fields(field_count: usize) -> Self {
        Self {
            mask: vec![0; field_count.div_ceil(8)],
        }
    }

    /// Create a mask with bits `0..field_count` set
    pub fn full(field_count: usize) -> Self {
        let mut mask = Self::for_fields(field_count);
        for index in 0..field_count {
            mask.set_bit(index, true);
        }
        mask
    }

    pub fn from_bytes(mask: Vec<u8>) -> Self {
        Self { mask }
    }

    pub fn byte_number(&self) -> usize {
        self.mask.len()
    }

    /// Number of addressable bits
    pub fn capacity(&self) -> usize {
        self.mask.len() * 8
    }

    /// Out-of-range bits read as unset
    pub fn bit(&self, index: usize) -> bool {
        self.mask
            .get(index / 8)
            .is_some_and(|byte| byte & (1 << (index % 8)) != 0)
    }

    /// Returns false when `index` is beyond the mask's capacity
    pub fn set_bit(&mut self, index: usize, value: bool) -> bool {
        let Some(byte) = self.mask.get_mut(index / 8) else {
            return false;
        };
        let bit = 1 << (index % 8);
        if value {
            *byte |= bit;
        } else {
            *byte &= !bit;
        }
        true
    }

    pub fn count_ones(&self) -> usize {
        self.mask.iter().map(|byte| byte.count_ones() as usize).sum()
    }

    /// Indices of set bits, ascending
    pub fn ones(&self) -> impl Iterator<Item = usize> + '_ {
        (0..self.capacity()).filter(move |index| self.bit(*index))
    }

    pub fn is_clear(&self) -> bool {
        self.mask.iter().all(|byte| *byte == 0)
    }
}

type ByteCount = UnsignedVariableInteger<3>;

impl Serde for DiffMask {
    fn ser(&self, writer: &mut dyn BitWrite) {
        ByteCount::new(self.mask.len() as u64).ser(writer);
        for byte in &self.mask {
            writer.write_byte(*byte);
        }
    }

    fn de(reader: &mut BitReader) -> Result<Self, SerdeErr> {
        let byte_number = ByteCount::de(reader)?.get();
        let byte_number = usize::try_from(byte_number).map_err(|_| SerdeErr)?;
        if byte_number > reader.bits_remaining() / 8 {
            return Err(SerdeErr);
        }
        let mut mask = Vec::with_capacity(byte_number);
        for _ in 0..byte_number {
            mask.push(reader.read_byte()?);
        }
        Ok(Self { mask })
    }

    fn bit_length(&self) -> u32 {
        ByteCount::new(self.mask.len() as u64).bit_length() + (self.mask.len() as u32) * 8
    }
}
