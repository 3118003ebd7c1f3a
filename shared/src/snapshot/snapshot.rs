use replica_serde::{BitReader, BitWrite, Serde, SerdeErr};

use crate::{
    registry::error::LookupError, protocol::error::ProtocolError, snapshot::diff_mask::DiffMask,
    value::Value,
};

/// Replicated field values of one instance: a presence mask plus the values
/// for exactly the set bits, in ascending ordinal order. A full capture has
/// every declared field present; a diff only carries the changed ones.
#[derive(Clone, Debug, PartialEq, Default)]
pub struct Snapshot {
    mask: DiffMask,
    values: Vec<Value>,
}

impl Snapshot {
    /// Capture where every one of `values` is present, ordinal order
    pub fn full(values: Vec<Value>) -> Self {
        Self {
            mask: DiffMask::full(values.len()),
            values,
        }
    }

    /// Snapshot with no fields present, sized for `field_count` fields
    pub fn empty(field_count: usize) -> Self {
        Self {
            mask: DiffMask::for_fields(field_count),
            values: Vec::new(),
        }
    }

    /// Pairs a mask with its values, checking the values line up with the set bits
    pub fn from_parts(mask: DiffMask, values: Vec<Value>) -> Result<Self, ProtocolError> {
        let present = mask.count_ones();
        if present != values.len() {
            return Err(ProtocolError::ValueCountMismatch {
                present,
                values: values.len(),
            });
        }
        Ok(Self { mask, values })
    }

    pub fn mask(&self) -> &DiffMask {
        &self.mask
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// Number of present fields
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// True when no field is present
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// `(ordinal, value)` for every present field, ascending
    pub fn iter(&self) -> impl Iterator<Item = (usize, &Value)> + '_ {
        self.mask.ones().zip(self.values.iter())
    }

    /// Value of field `ordinal` if it is present
    pub fn value_at(&self, ordinal: usize) -> Option<&Value> {
        if !self.mask.bit(ordinal) {
            return None;
        }
        let position = self.mask.ones().take_while(|index| *index < ordinal).count();
        self.values.get(position)
    }

    /// Computes the changeset taking `self` to `newer`. A field is included
    /// when it is present in `newer` and either absent from `self` or holds a
    /// different value. Fields absent from `newer` are never included.
    ///
    /// The result may be empty; callers decide whether an empty changeset is
    /// still worth delivering.
    pub fn diff(&self, newer: &Snapshot) -> Result<Snapshot, LookupError> {
        if self.mask.byte_number() != newer.mask.byte_number() {
            return Err(LookupError::SnapshotLengthMismatch {
                old_bytes: self.mask.byte_number(),
                new_bytes: newer.mask.byte_number(),
            });
        }

        let mut mask = DiffMask::from_bytes(vec![0; newer.mask.byte_number()]);
        let mut values = Vec::new();

        let mut old_entries = self.iter().peekable();
        for (ordinal, new_value) in newer.iter() {
            while old_entries
                .peek()
                .is_some_and(|(old_ordinal, _)| *old_ordinal < ordinal)
            {
                old_entries.next();
            }
            let old_value = match old_entries.peek() {
                Some((old_ordinal, old_value)) if *old_ordinal == ordinal => Some(*old_value),
                _ => None,
            };
            if old_value != Some(new_value) {
                mask.set_bit(ordinal, true);
                values.push(new_value.clone());
            }
        }

        Ok(Snapshot { mask, values })
    }
}

impl Serde for Snapshot {
    fn ser(&self, writer: &mut dyn BitWrite) {
        self.mask.ser(writer);
        for value in &self.values {
            value.ser(writer);
        }
    }

    fn de(reader: &mut BitReader) -> Result<Self, SerdeErr> {
        let mask = DiffMask::de(reader)?;
        let present = mask.count_ones();
        let mut values = Vec::with_capacity(present.min(reader.bits_remaining()));
        for _ in 0..present {
            values.push(Value::de(reader)?);
        }
        Ok(Self { mask, values })
    }

    fn bit_length(&self) -> u32 {
        self.values
            .iter()
            .fold(self.mask.bit_length(), |acc, value| acc + value.bit_length())
    }
}
