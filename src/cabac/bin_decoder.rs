//! Mirror of [`CabacEncoder`](crate::cabac::CabacEncoder) (ITU-T H.265, 9.3.4.3).
//!
//! Used to check that encoded streams parse back to the coded bins. The
//! decoder shares [`ContextModel`] and its transition tables with the encoder,
//! so both sides adapt identically.

use crate::cabac::context_model::ContextModel;
use crate::cabac::tables::{LPS_TABLE, RENORM_TABLE};
use crate::error::CabacError;

#[derive(Debug, Clone)]
pub struct CabacDecoder<'a> {
    data: &'a [u8],
    position: usize,
    range: u32,
    value: u32,
    bits_needed: i32,
    // Bit offset of the next raw PCM bit while reading PCM samples.
    pcm_bit_position: Option<usize>,
}

impl<'a> CabacDecoder<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        let mut decoder = Self {
            data,
            position: 0,
            range: 510,
            value: 0,
            bits_needed: -8,
            pcm_bit_position: None,
        };
        decoder.start();
        decoder
    }

    /// Initializes the registers from the next two bytes.
    pub fn start(&mut self) {
        self.range = 510;
        self.bits_needed = -8;
        self.value = (self.read_byte() << 8) | self.read_byte();
    }

    /// Number of bytes the arithmetic decoder has pulled from the input.
    pub fn position(&self) -> usize {
        self.position
    }

    // Past the end, the input reads as zeros.
    fn read_byte(&mut self) -> u32 {
        let byte = self.data.get(self.position).copied().unwrap_or(0);
        self.position += 1;
        byte as u32
    }

    fn renorm_once(&mut self, scaled_range: u32) {
        if scaled_range < (256 << 7) {
            self.range = scaled_range >> 6;
            self.value <<= 1;
            self.bits_needed += 1;
            if self.bits_needed == 0 {
                self.bits_needed = -8;
                self.value += self.read_byte();
            }
        }
    }

    pub fn decode_bin(&mut self, model: &mut ContextModel) -> u32 {
        let lps = LPS_TABLE[model.state() as usize][((self.range >> 6) & 3) as usize] as u32;
        self.range -= lps;
        let scaled_range = self.range << 7;

        if self.value < scaled_range {
            let bin = model.mps() as u32;
            model.update_mps();
            self.renorm_once(scaled_range);
            bin
        } else {
            let bin = 1 - model.mps() as u32;
            let num_bits = RENORM_TABLE[(lps >> 3) as usize] as i32;
            self.value = (self.value - scaled_range) << num_bits;
            self.range = lps << num_bits;
            model.update_lps();

            self.bits_needed += num_bits;
            if self.bits_needed >= 0 {
                self.value += self.read_byte() << self.bits_needed;
                self.bits_needed -= 8;
            }
            bin
        }
    }

    pub fn decode_bin_ep(&mut self) -> u32 {
        self.value <<= 1;
        self.bits_needed += 1;
        if self.bits_needed >= 0 {
            self.bits_needed = -8;
            self.value += self.read_byte();
        }

        let scaled_range = self.range << 7;
        if self.value >= scaled_range {
            self.value -= scaled_range;
            1
        } else {
            0
        }
    }

    /// Decodes `num_bins` bypass bins, first bin in the most significant position.
    pub fn decode_bins_ep(&mut self, num_bins: u32) -> u32 {
        (0..num_bins).fold(0, |acc, _| (acc << 1) | self.decode_bin_ep())
    }

    pub fn decode_bin_trm(&mut self) -> u32 {
        self.range -= 2;
        let scaled_range = self.range << 7;
        if self.value >= scaled_range {
            1
        } else {
            self.renorm_once(scaled_range);
            0
        }
    }

    pub fn align(&mut self) {
        self.range = 256;
    }

    /// Skips the stop bit and alignment that follow a terminate bin of value 1,
    /// positioning the raw reader at the first PCM sample.
    pub fn decode_pcm_align_bits(&mut self) {
        // The stop bit sits inside the last byte pulled by the arithmetic decoder.
        let stop_bit = self.position as i64 * 8 + self.bits_needed as i64;
        let start = ((stop_bit + 1 + 7) / 8 * 8) as usize;
        self.pcm_bit_position = Some(start);
        ltrace!("pcm samples start at byte {}", start / 8);
    }

    pub fn read_pcm_code(&mut self, length: u32) -> Result<u32, CabacError> {
        let mut bit_position = self.pcm_bit_position.unwrap_or(self.position * 8);
        let mut code = 0u32;
        for _ in 0..length {
            let byte = *self.data.get(bit_position / 8).ok_or(CabacError::UnexpectedEndOfStream)?;
            let bit = (byte >> (7 - bit_position % 8)) & 1;
            code = (code << 1) | bit as u32;
            bit_position += 1;
        }
        self.pcm_bit_position = Some(bit_position);
        Ok(code)
    }

    /// Restarts arithmetic decoding at the byte following the PCM samples.
    pub fn reset_bac(&mut self) {
        if let Some(bit_position) = self.pcm_bit_position.take() {
            self.position = bit_position.div_ceil(8);
        }
        self.start();
    }
}
