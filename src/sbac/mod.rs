//! Syntax-element coding on top of the binary arithmetic engine.
//!
//! [`SbacEncoder`] owns one engine, one context arena and the Golomb-Rice
//! adaptation statistics. It is generic over the engine, so the same syntax
//! code writes a bitstream ([`CabacEncoder`]) or estimates its cost
//! ([`CabacCounter`](crate::cabac::CabacCounter)).
//!
//! [`SbacReader`] parses everything the encoder writes.

pub mod alf;
pub mod binarization;
pub mod coding_unit;
pub mod jem;
pub mod rate;
pub mod reader;
pub mod residual;
pub mod sao;
pub mod scan;
#[cfg(test)]
pub(crate) mod testing;
pub mod transform_unit;

pub use coding_unit::{ChromaIntraMode, CodingUnitInfo, CodingUnitSource, NeighbourInfo};
pub use rate::{EstBitsSbac, EstPuBits};
pub use reader::SbacReader;
pub use residual::ResidualBlock;
pub use sao::{SaoBlkParam, SaoMerge, SaoOffset, SaoType};
pub use scan::ScanOrder;

use crate::cabac::{BinEncoder, CabacEncoder, ContextGroup, ContextStore};
use crate::coding_parameters::CodingParameters;
use crate::constants::GOLOMB_RICE_ADAPTATION_STATISTICS_SETS;
use crate::error::CabacError;
use crate::trace::{encode_trace, TraceLine};
use crate::{ChannelType, SliceType};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SbacEncoder<E: BinEncoder = CabacEncoder> {
    bin_if: E,
    contexts: ContextStore,
    golomb_rice_statistics: [u32; GOLOMB_RICE_ADAPTATION_STATISTICS_SETS],
    params: CodingParameters,
}

impl<E: BinEncoder> SbacEncoder<E> {
    pub fn new(bin_if: E, params: CodingParameters) -> Result<Self, CabacError> {
        params.validate()?;
        Ok(Self {
            bin_if,
            contexts: ContextStore::new(),
            golomb_rice_statistics: [0; GOLOMB_RICE_ADAPTATION_STATISTICS_SETS],
            params,
        })
    }

    pub fn params(&self) -> &CodingParameters {
        &self.params
    }

    pub fn bin_if(&self) -> &E {
        &self.bin_if
    }

    pub fn bin_if_mut(&mut self) -> &mut E {
        &mut self.bin_if
    }

    pub fn into_bin_if(self) -> E {
        self.bin_if
    }

    pub fn contexts(&self) -> &ContextStore {
        &self.contexts
    }

    pub fn contexts_mut(&mut self) -> &mut ContextStore {
        &mut self.contexts
    }

    pub fn golomb_rice_statistics(&self) -> &[u32; GOLOMB_RICE_ADAPTATION_STATISTICS_SETS] {
        &self.golomb_rice_statistics
    }

    /// Prepares for a new slice: initializes every context, clears the Rice
    /// statistics and restarts the engine.
    pub fn reset_entropy(&mut self, params: &CodingParameters) -> Result<(), CabacError> {
        params.validate()?;
        self.params = *params;

        let slice_type = self.params.init_slice_type();
        let qp = self.params.slice.qp;
        self.contexts.init_all(slice_type, qp);
        self.golomb_rice_statistics = [0; GOLOMB_RICE_ADAPTATION_STATISTICS_SETS];
        self.bin_if.start();

        ldebug!(
            "reset entropy: slice {:?}, qp {}, init table {:?}",
            self.params.slice.slice_type,
            qp,
            slice_type
        );
        Ok(())
    }

    /// Picks the initialization table for the next P or B slice: the one whose
    /// initial states are closest to the current adapted statistics.
    pub fn determine_cabac_init_idx(&self) -> SliceType {
        let slice = &self.params.slice;
        if slice.slice_type.is_intra() {
            return SliceType::I;
        }

        let mut best_cost = u32::MAX;
        let mut best_slice_type = SliceType::B;
        for candidate in [SliceType::B, SliceType::P] {
            let cost = self.contexts.cost(candidate, slice.qp);
            if cost < best_cost {
                best_cost = cost;
                best_slice_type = candidate;
            }
            ltrace!("cabac init candidate {:?}: cost {}", candidate, cost);
        }
        ldebug!("cabac init table {:?}", best_slice_type);
        best_slice_type
    }

    /// Assigns trained adaptation windows to every context.
    ///
    /// `window_sizes` holds, per slice type and QP index, one window per
    /// context of the arena. Nothing changes when adaptive windows are off or
    /// no QP index is given.
    pub fn update_window_size(
        &mut self,
        slice_type: SliceType,
        qp_idx: Option<usize>,
        window_sizes: &[Vec<Vec<u8>>; 3],
    ) -> Result<(), CabacError> {
        let Some(qp_idx) = qp_idx else {
            return Ok(());
        };
        if !self.params.tools.adaptive_window {
            return Ok(());
        }
        let sizes = window_sizes[u8::from(slice_type) as usize]
            .get(qp_idx)
            .ok_or(CabacError::MissingWindowSizes {
                slice_type: slice_type.name(),
                qp_idx,
            })?;
        self.contexts.set_window_sizes(sizes)?;
        ldebug!("window sizes for {:?} slices at qp index {}", slice_type, qp_idx);
        Ok(())
    }

    /// Ends a substream and restarts coding with freshly initialized contexts.
    pub fn update_context_tables(&mut self, slice_type: SliceType, qp: i32, execute_finish: bool) {
        self.bin_if.encode_bin_trm(1);
        if execute_finish {
            self.bin_if.finish();
            self.bin_if.write_trailing_bits();
        }
        self.contexts.init_all(slice_type, qp);
        self.bin_if.reset_bac();
    }

    pub fn code_terminating_bit(&mut self, is_last: bool) {
        self.bin_if.encode_bin_trm(is_last as u32);
    }

    pub fn code_slice_finish(&mut self) {
        self.bin_if.finish();
    }

    pub fn num_written_bits(&self) -> u32 {
        self.bin_if.num_written_bits()
    }

    pub fn reset_bits(&mut self) {
        self.bin_if.reset_bits();
    }

    /// Codes the commands of a bin trace with this coder's engine and contexts.
    pub fn code_trace(&mut self, trace: &[TraceLine]) -> Result<(), CabacError> {
        encode_trace(&mut self.bin_if, &mut self.contexts, trace)
    }

    fn encode_bin_ctx(&mut self, bin: u32, group: ContextGroup, set: usize, index: usize) {
        self.bin_if.encode_bin(bin, self.contexts.get_mut(group, set, index));
    }

    /// Copies engine, contexts and Rice statistics into `dst`.
    pub fn store(&self, dst: &mut Self) {
        dst.load(self);
    }

    /// Takes over engine, contexts and Rice statistics from `src`.
    pub fn load(&mut self, src: &Self) {
        self.bin_if.copy_state(&src.bin_if);
        self.load_contexts(src);
    }

    /// Takes over contexts and Rice statistics only; the engine is untouched.
    pub fn load_contexts(&mut self, src: &Self) {
        self.contexts = src.contexts;
        self.golomb_rice_statistics = src.golomb_rice_statistics;
    }

    /// Takes over the engine and the intra prediction contexts of one channel type.
    pub fn load_intra_dir_mode(&mut self, src: &Self, channel_type: ChannelType) {
        self.bin_if.copy_state(&src.bin_if);
        let group = match channel_type {
            ChannelType::Luma => ContextGroup::IntraPred,
            ChannelType::Chroma => ContextGroup::ChromaPred,
        };
        self.contexts.group_mut(group).copy_from_slice(src.contexts.group(group));
    }
}
