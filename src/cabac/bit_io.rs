//! Bit sinks for the arithmetic encoder.

/// Append-only, MSB-first bit output.
pub trait BitSink {
    /// Writes the `num_bits` least significant bits of `value`, MSB first.
    fn write(&mut self, value: u32, num_bits: u32);

    /// Pads with zero bits up to the next byte boundary.
    fn write_align_zero(&mut self);

    fn num_written_bits(&self) -> u32;

    /// Discards everything written so far.
    fn clear(&mut self);

    /// Writes `rbsp_stop_one_bit` followed by alignment zeros.
    fn write_trailing_bits(&mut self) {
        self.write(1, 1);
        self.write_align_zero();
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BitWriter {
    data: Vec<u8>,
    held_bits: u8,
    num_held_bits: u32,
}

impl BitWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(bytes: usize) -> Self {
        Self {
            data: Vec::with_capacity(bytes),
            ..Self::default()
        }
    }

    /// Complete bytes written so far. Bits of an unfinished byte are not included.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn is_byte_aligned(&self) -> bool {
        self.num_held_bits == 0
    }

    /// Returns the written bytes, zero-padding a partial last byte.
    pub fn into_data(mut self) -> Vec<u8> {
        self.write_align_zero();
        self.data
    }
}

impl BitSink for BitWriter {
    fn write(&mut self, value: u32, num_bits: u32) {
        debug_assert!(num_bits <= 32);
        debug_assert!(num_bits == 32 || value >> num_bits == 0, "value {value:#x} wider than {num_bits} bits");

        let mut remaining = num_bits;
        while remaining > 0 {
            let free = 8 - self.num_held_bits;
            let take = remaining.min(free);
            let chunk = ((value >> (remaining - take)) & ((1u32 << take) - 1)) as u8;
            self.held_bits = if take == 8 { chunk } else { (self.held_bits << take) | chunk };
            self.num_held_bits += take;
            remaining -= take;

            if self.num_held_bits == 8 {
                self.data.push(self.held_bits);
                self.held_bits = 0;
                self.num_held_bits = 0;
            }
        }
    }

    fn write_align_zero(&mut self) {
        if self.num_held_bits > 0 {
            self.write(0, 8 - self.num_held_bits);
        }
    }

    fn num_written_bits(&self) -> u32 {
        (self.data.len() as u32) * 8 + self.num_held_bits
    }

    fn clear(&mut self) {
        self.data.clear();
        self.held_bits = 0;
        self.num_held_bits = 0;
    }
}

/// A sink that only counts bits, for rate estimation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BitCounter {
    num_bits: u32,
}

impl BitCounter {
    pub fn new() -> Self {
        Self::default()
    }
}

impl BitSink for BitCounter {
    fn write(&mut self, _value: u32, num_bits: u32) {
        self.num_bits += num_bits;
    }

    fn write_align_zero(&mut self) {
        self.num_bits = (self.num_bits + 7) & !7;
    }

    fn num_written_bits(&self) -> u32 {
        self.num_bits
    }

    fn clear(&mut self) {
        self.num_bits = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bit_writer_packs_msb_first() {
        let mut writer = BitWriter::new();
        writer.write(0b101, 3);
        writer.write(0b11110, 5);
        writer.write(0xABCD, 16);
        writer.write(1, 1);
        assert_eq!(writer.num_written_bits(), 25);
        assert_eq!(writer.data(), &[0b1011_1110, 0xAB, 0xCD]);
        assert!(!writer.is_byte_aligned());

        writer.write_align_zero();
        assert_eq!(writer.into_data(), vec![0b1011_1110, 0xAB, 0xCD, 0x80]);
    }

    #[test]
    fn test_bit_writer_full_word() {
        let mut writer = BitWriter::new();
        writer.write(0xDEADBEEF, 32);
        assert_eq!(writer.data(), &[0xDE, 0xAD, 0xBE, 0xEF]);
    }

    #[test]
    fn test_trailing_bits() {
        let mut writer = BitWriter::new();
        writer.write(0, 2);
        writer.write_trailing_bits();
        assert_eq!(writer.data(), &[0b0010_0000]);

        let mut counter = BitCounter::new();
        counter.write(0, 2);
        counter.write_trailing_bits();
        assert_eq!(counter.num_written_bits(), 8);
    }
}
