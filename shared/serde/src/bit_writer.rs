/// Sink for a bit stream
pub trait BitWrite {
    fn write_bit(&mut self, bit: bool);
    fn write_byte(&mut self, byte: u8);
}

/// Growable bit stream. Bit `n` of the stream lands in byte `n / 8` at
/// position `n % 8`, which is the order [`BitReader`](crate::BitReader)
/// reads back. `to_bytes()` zero-pads the final partial byte.
#[derive(Default)]
pub struct BitWriter {
    bytes: Vec<u8>,
    pending: u8,
    pending_bits: u8,
    bits_written: u32,
}

impl BitWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bits_written(&self) -> u32 {
        self.bits_written
    }

    pub fn to_bytes(mut self) -> Vec<u8> {
        if self.pending_bits > 0 {
            self.bytes.push(self.pending);
        }
        self.bytes
    }
}

impl BitWrite for BitWriter {
    fn write_bit(&mut self, bit: bool) {
        self.pending |= u8::from(bit) << self.pending_bits;
        self.pending_bits += 1;
        self.bits_written += 1;

        if self.pending_bits == 8 {
            self.bytes.push(self.pending);
            self.pending = 0;
            self.pending_bits = 0;
        }
    }

    fn write_byte(&mut self, byte: u8) {
        self.bits_written += 8;

        if self.pending_bits == 0 {
            self.bytes.push(byte);
            return;
        }

        // low bits complete the pending byte, high bits start the next one
        let offset = self.pending_bits;
        self.bytes.push(self.pending | (byte << offset));
        self.pending = byte >> (8 - offset);
    }
}
