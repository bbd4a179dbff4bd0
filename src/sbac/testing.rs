//! A bin-recording engine for checking binarizations bin by bin.

use crate::cabac::{BinEncoder, ContextModel};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordedBin {
    Ctx(u32),
    Ep(u32),
    Trm(u32),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BinRecorder {
    pub bins: Vec<RecordedBin>,
    pub pcm_bits: u32,
}

impl BinRecorder {
    /// Bin values only, in coding order.
    pub fn values(&self) -> Vec<u32> {
        self.bins
            .iter()
            .map(|bin| match *bin {
                RecordedBin::Ctx(value) | RecordedBin::Ep(value) | RecordedBin::Trm(value) => value,
            })
            .collect()
    }
}

impl BinEncoder for BinRecorder {
    fn start(&mut self) {}

    fn finish(&mut self) {}

    fn encode_bin(&mut self, bin: u32, model: &mut ContextModel) {
        model.set_bins_coded();
        self.bins.push(RecordedBin::Ctx(bin));
    }

    fn encode_bin_ep(&mut self, bin: u32) {
        self.bins.push(RecordedBin::Ep(bin));
    }

    fn encode_bins_ep(&mut self, value: u32, num_bins: u32) {
        for i in (0..num_bins).rev() {
            self.bins.push(RecordedBin::Ep((value >> i) & 1));
        }
    }

    fn encode_bin_trm(&mut self, bin: u32) {
        self.bins.push(RecordedBin::Trm(bin));
    }

    fn align(&mut self) {}

    fn encode_pcm_align_bits(&mut self) {}

    fn write_pcm_code(&mut self, _code: u32, length: u32) {
        self.pcm_bits += length;
    }

    fn write_trailing_bits(&mut self) {}

    fn num_written_bits(&self) -> u32 {
        self.bins.len() as u32 + self.pcm_bits
    }

    fn reset_bits(&mut self) {
        self.bins.clear();
        self.pcm_bits = 0;
    }
}
