//! Binary arithmetic encoding engines (ITU-T H.265, 9.3.4.3).
//!
//! [`CabacEncoder`] produces the bitstream. [`CabacCounter`] runs the same
//! context adaptation but only accumulates fractional bit costs, which is what
//! rate-distortion trial coding needs.

use crate::cabac::bit_io::{BitCounter, BitSink, BitWriter};
use crate::cabac::context_model::ContextModel;
use crate::cabac::tables::{FRAC_BITS_ONE, FRAC_BITS_PRECISION, LPS_TABLE, RENORM_TABLE};

/// The interface every syntax-element coder drives.
///
/// Implementations are plain values: cloning one forks the complete coder
/// state, including its output.
pub trait BinEncoder: Clone {
    /// Resets the arithmetic registers. Must be called once per slice before any bin.
    fn start(&mut self);

    /// Flushes the registers so that a decoder can recover every bin coded so far.
    fn finish(&mut self);

    fn encode_bin(&mut self, bin: u32, model: &mut ContextModel);

    fn encode_bin_ep(&mut self, bin: u32);

    /// Codes the `num_bins` least significant bits of `value` as bypass bins, MSB first.
    fn encode_bins_ep(&mut self, value: u32, num_bins: u32);

    fn encode_bin_trm(&mut self, bin: u32);

    /// Sets the range so that following bypass bins map to whole output bits.
    fn align(&mut self);

    /// Finishes the arithmetic codeword and byte-aligns the output for raw PCM data.
    fn encode_pcm_align_bits(&mut self);

    fn write_pcm_code(&mut self, code: u32, length: u32);

    /// Writes `rbsp_stop_one_bit` plus alignment directly to the output.
    fn write_trailing_bits(&mut self);

    fn num_written_bits(&self) -> u32;

    /// Clears the output and the registers.
    fn reset_bits(&mut self);

    fn reset_bac(&mut self) {
        self.start();
    }

    fn copy_state(&mut self, other: &Self) {
        self.clone_from(other);
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CabacEncoder<S: BitSink = BitWriter> {
    sink: S,
    low: u32,
    range: u32,
    bits_left: i32,
    num_buffered_bytes: u32,
    buffered_byte: u32,
}

impl Default for CabacEncoder<BitWriter> {
    fn default() -> Self {
        Self::new(BitWriter::new())
    }
}

impl<S: BitSink> CabacEncoder<S> {
    /// An engine in its start state, writing to `sink`.
    pub fn new(sink: S) -> Self {
        Self {
            sink,
            low: 0,
            range: 510,
            bits_left: 23,
            num_buffered_bytes: 0,
            buffered_byte: 0xff,
        }
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }

    #[inline]
    fn test_and_write_out(&mut self) {
        if self.bits_left < 12 {
            self.write_out();
        }
    }

    /// Moves the top byte of `low` to the output, resolving carries through
    /// any run of buffered 0xFF bytes.
    fn write_out(&mut self) {
        let lead_byte = self.low >> (24 - self.bits_left);
        self.bits_left += 8;
        self.low &= 0xffff_ffff >> self.bits_left;

        if lead_byte == 0xff {
            self.num_buffered_bytes += 1;
        } else if self.num_buffered_bytes > 0 {
            let carry = lead_byte >> 8;
            let byte = self.buffered_byte + carry;
            self.buffered_byte = lead_byte & 0xff;
            self.sink.write(byte, 8);

            let byte = (0xff + carry) & 0xff;
            while self.num_buffered_bytes > 1 {
                self.sink.write(byte, 8);
                self.num_buffered_bytes -= 1;
            }
        } else {
            self.num_buffered_bytes = 1;
            self.buffered_byte = lead_byte;
        }
    }

    fn encode_aligned_bins_ep(&mut self, value: u32, num_bins: u32) {
        let mut remaining = num_bins;
        while remaining > 0 {
            let count = remaining.min(8);
            let mask = (1 << count) - 1;
            let bins = (value >> (remaining - count)) & mask;
            self.low = (self.low << count) + (bins << 8);
            remaining -= count;
            self.bits_left -= count as i32;
            self.test_and_write_out();
        }
    }
}

impl<S: BitSink + Clone> BinEncoder for CabacEncoder<S> {
    fn start(&mut self) {
        self.low = 0;
        self.range = 510;
        self.bits_left = 23;
        self.num_buffered_bytes = 0;
        self.buffered_byte = 0xff;
    }

    fn finish(&mut self) {
        if self.low >> (32 - self.bits_left) != 0 {
            self.sink.write(self.buffered_byte + 1, 8);
            while self.num_buffered_bytes > 1 {
                self.sink.write(0x00, 8);
                self.num_buffered_bytes -= 1;
            }
            self.low -= 1 << (32 - self.bits_left);
        } else {
            if self.num_buffered_bytes > 0 {
                self.sink.write(self.buffered_byte, 8);
            }
            while self.num_buffered_bytes > 1 {
                self.sink.write(0xff, 8);
                self.num_buffered_bytes -= 1;
            }
        }
        self.sink.write(self.low >> 8, (24 - self.bits_left) as u32);
        ldebug!("cabac finish: {} bits written", self.sink.num_written_bits());
    }

    fn encode_bin(&mut self, bin: u32, model: &mut ContextModel) {
        debug_assert!(bin <= 1);
        model.set_bins_coded();

        let lps = LPS_TABLE[model.state() as usize][((self.range >> 6) & 3) as usize] as u32;
        self.range -= lps;

        if bin != model.mps() as u32 {
            let num_bits = RENORM_TABLE[(lps >> 3) as usize] as u32;
            self.low = (self.low + self.range) << num_bits;
            self.range = lps << num_bits;
            model.update_lps();
            self.bits_left -= num_bits as i32;
        } else {
            model.update_mps();
            if self.range >= 256 {
                return;
            }
            self.low <<= 1;
            self.range <<= 1;
            self.bits_left -= 1;
        }
        self.test_and_write_out();
    }

    fn encode_bin_ep(&mut self, bin: u32) {
        debug_assert!(bin <= 1);
        self.low <<= 1;
        if bin != 0 {
            self.low += self.range;
        }
        self.bits_left -= 1;
        self.test_and_write_out();
    }

    fn encode_bins_ep(&mut self, value: u32, num_bins: u32) {
        debug_assert!(num_bins <= 32);
        debug_assert!(num_bins == 32 || value >> num_bins == 0);

        if self.range == 256 {
            self.encode_aligned_bins_ep(value, num_bins);
            return;
        }

        let mut value = value;
        let mut num_bins = num_bins;
        while num_bins > 8 {
            num_bins -= 8;
            let pattern = value >> num_bins;
            self.low <<= 8;
            self.low += self.range * pattern;
            value -= pattern << num_bins;
            self.bits_left -= 8;
            self.test_and_write_out();
        }

        self.low <<= num_bins;
        self.low += self.range * value;
        self.bits_left -= num_bins as i32;
        self.test_and_write_out();
    }

    fn encode_bin_trm(&mut self, bin: u32) {
        self.range -= 2;
        if bin != 0 {
            self.low += self.range;
            self.low <<= 7;
            self.range = 2 << 7;
            self.bits_left -= 7;
        } else if self.range >= 256 {
            return;
        } else {
            self.low <<= 1;
            self.range <<= 1;
            self.bits_left -= 1;
        }
        self.test_and_write_out();
    }

    fn align(&mut self) {
        self.range = 256;
    }

    fn encode_pcm_align_bits(&mut self) {
        self.finish();
        self.sink.write_trailing_bits();
        ltrace!("pcm alignment at bit {}", self.sink.num_written_bits());
    }

    fn write_pcm_code(&mut self, code: u32, length: u32) {
        self.sink.write(code, length);
    }

    fn write_trailing_bits(&mut self) {
        self.sink.write_trailing_bits();
    }

    fn num_written_bits(&self) -> u32 {
        (self.sink.num_written_bits() as i32 + 8 * self.num_buffered_bytes as i32 + 23 - self.bits_left) as u32
    }

    fn reset_bits(&mut self) {
        self.sink.clear();
        self.start();
    }
}

/// Fractional-bit counting engine for trial coding.
///
/// Context bins are charged their entropy and adapt the context exactly as
/// in [`CabacEncoder`]; bypass bins cost one bit each.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CabacCounter {
    counter: BitCounter,
    frac_bits: u64,
}

impl CabacCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accumulated cost in 1/32768 bit units, including the whole bits already flushed.
    pub fn frac_bits(&self) -> u64 {
        ((self.counter.num_written_bits() as u64) << FRAC_BITS_PRECISION) + self.frac_bits
    }
}

impl BinEncoder for CabacCounter {
    fn start(&mut self) {}

    fn finish(&mut self) {
        self.counter.write(0, (self.frac_bits >> FRAC_BITS_PRECISION) as u32);
        self.frac_bits &= (FRAC_BITS_ONE - 1) as u64;
    }

    fn encode_bin(&mut self, bin: u32, model: &mut ContextModel) {
        model.set_bins_coded();
        self.frac_bits += model.entropy_bits(bin) as u64;
        if bin == model.mps() as u32 {
            model.update_mps();
        } else {
            model.update_lps();
        }
    }

    fn encode_bin_ep(&mut self, _bin: u32) {
        self.frac_bits += FRAC_BITS_ONE as u64;
    }

    fn encode_bins_ep(&mut self, _value: u32, num_bins: u32) {
        self.frac_bits += (FRAC_BITS_ONE * num_bins) as u64;
    }

    fn encode_bin_trm(&mut self, bin: u32) {
        self.frac_bits += ContextModel::entropy_bits_trm(bin) as u64;
    }

    fn align(&mut self) {}

    fn encode_pcm_align_bits(&mut self) {
        self.finish();
        self.counter.write_trailing_bits();
    }

    fn write_pcm_code(&mut self, code: u32, length: u32) {
        self.counter.write(code, length);
    }

    fn write_trailing_bits(&mut self) {
        self.counter.write_trailing_bits();
    }

    fn num_written_bits(&self) -> u32 {
        self.counter.num_written_bits() + (self.frac_bits >> FRAC_BITS_PRECISION) as u32
    }

    fn reset_bits(&mut self) {
        self.counter.clear();
        self.frac_bits &= (FRAC_BITS_ONE - 1) as u64;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn finished_bytes(encoder: CabacEncoder) -> Vec<u8> {
        encoder.into_sink().into_data()
    }

    #[test]
    fn test_empty_slice_is_terminate_and_stop_bit() {
        let mut encoder = CabacEncoder::default();
        encoder.encode_bin_trm(1);
        encoder.finish();
        encoder.write_trailing_bits();
        // low = 508 << 7 after the terminate bin; finish emits 0xFE then 0x80 with the stop bit
        let bytes = finished_bytes(encoder);
        assert_eq!(bytes, vec![0xFE, 0x80]);
    }

    /// Sink without `Clone`: only the inherent constructor and accessors apply.
    #[derive(Debug, Default)]
    struct ByteCount(u32);

    impl BitSink for ByteCount {
        fn write(&mut self, _value: u32, num_bits: u32) {
            self.0 += num_bits;
        }

        fn write_align_zero(&mut self) {
            self.0 = (self.0 + 7) & !7;
        }

        fn num_written_bits(&self) -> u32 {
            self.0
        }

        fn clear(&mut self) {
            self.0 = 0;
        }
    }

    #[test]
    fn test_new_engine_is_in_start_state() {
        let encoder = CabacEncoder::new(ByteCount::default());
        assert_eq!(encoder.sink().num_written_bits(), 0);
        assert_eq!(encoder.into_sink().0, 0);

        let mut used = CabacEncoder::default();
        used.encode_bins_ep(0x5a5, 11);
        used.reset_bits();
        assert_eq!(used, CabacEncoder::default());
    }

    #[test]
    fn test_bypass_bins_batch_matches_single_bins() {
        let mut single = CabacEncoder::default();
        let mut batched = CabacEncoder::default();
        let value = 0b1011_0010_1110_0101_1u32;
        for i in (0..17).rev() {
            single.encode_bin_ep((value >> i) & 1);
        }
        batched.encode_bins_ep(value, 17);
        assert_eq!(single, batched);
    }

    #[test]
    fn test_aligned_bypass_matches_unaligned_path() {
        let mut fast = CabacEncoder::default();
        fast.align();
        fast.encode_bins_ep(0x2d7, 10);

        let mut slow = CabacEncoder::default();
        slow.align();
        for i in (0..10).rev() {
            slow.encode_bin_ep((0x2d7 >> i) & 1);
        }
        assert_eq!(fast, slow);
    }

    #[test]
    fn test_num_written_bits_tracks_pending_state() {
        let mut encoder = CabacEncoder::default();
        assert_eq!(encoder.num_written_bits(), 0);
        encoder.encode_bins_ep(0, 20);
        assert_eq!(encoder.num_written_bits(), 20);
        encoder.encode_bin_ep(1);
        assert_eq!(encoder.num_written_bits(), 21);
    }

    #[test]
    fn test_counter_charges_entropy_and_adapts() {
        let mut counter = CabacCounter::new();
        let mut model = ContextModel::new(0, 1);
        let expected = model.entropy_bits(1) as u64;
        counter.encode_bin(1, &mut model);
        assert_eq!(counter.frac_bits(), expected);
        assert!(model.bins_coded());
        assert_eq!(model.state(), 1);

        counter.encode_bins_ep(0b101, 3);
        counter.encode_bin_ep(0);
        assert_eq!(counter.frac_bits(), expected + 4 * FRAC_BITS_ONE as u64);
        assert_eq!(counter.num_written_bits(), 4 + (expected >> FRAC_BITS_PRECISION) as u32);
    }

    #[test]
    fn test_counter_and_encoder_adapt_contexts_identically() {
        let mut encoder = CabacEncoder::default();
        let mut counter = CabacCounter::new();
        let mut encoder_model = ContextModel::with_init(30, 140);
        let mut counter_model = encoder_model;
        for bin in [0, 0, 1, 0, 1, 1, 1, 0, 0, 0, 0, 1] {
            encoder.encode_bin(bin, &mut encoder_model);
            counter.encode_bin(bin, &mut counter_model);
        }
        assert_eq!(encoder_model, counter_model);
    }

    #[test]
    fn test_counter_pcm_bits_are_exact() {
        let mut counter = CabacCounter::new();
        counter.encode_bin_ep(1);
        counter.encode_bin_trm(1);
        counter.encode_pcm_align_bits();
        let aligned = counter.num_written_bits();
        assert_eq!(aligned % 8, 0);
        counter.write_pcm_code(0xAB, 8);
        assert_eq!(counter.num_written_bits(), aligned + 8);
    }
}
