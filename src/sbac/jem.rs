//! Syntax of the JEM prediction and transform tools: multiple core
//! transforms, the secondary transform index, FRUC merge modes, MPI and PDPC
//! indices and KLT flags.
//!
//! Each element is only present when its tool is enabled; the gating helpers
//! are shared with the reader.

use crate::cabac::{BinEncoder, ContextGroup};
use crate::coding_parameters::ToolSet;
use crate::constants::*;
use crate::sbac::SbacEncoder;
use crate::sbac::coding_unit::{
    allowed_lm_modes, count_neighbours, signalled_chroma_mode, ChromaIntraMode, CodingUnitSource,
};
use crate::sbac::residual::ResidualBlock;
use crate::{ChannelType, FrucMode, PredMode, SliceType};

/// Whether the EMT flags of `cu` are present: the tool is on for its
/// prediction mode and the CU fits the largest EMT size.
pub(crate) fn emt_present<C: CodingUnitSource + ?Sized>(tools: &ToolSet, cu: &C) -> bool {
    let (enabled, log2_max_size) = match cu.pred_mode() {
        PredMode::Intra => (tools.emt_intra, LOG2_EMT_INTRA_MAX_CU),
        PredMode::Inter => (tools.emt_inter, LOG2_EMT_INTER_MAX_CU),
    };
    enabled && cu.log2_width() <= log2_max_size && cu.log2_height() <= log2_max_size
}

pub(crate) fn emt_cu_flag_ctx(depth: u32) -> usize {
    (depth as usize).min(NUM_EMT_CU_FLAG_CTX - 1)
}

/// First EMT TU-index context: intra CUs use the first pair, inter CUs the second.
pub(crate) fn emt_tu_idx_ctx_base(pred_mode: PredMode) -> usize {
    match pred_mode {
        PredMode::Intra => 0,
        PredMode::Inter => 2,
    }
}

/// Number of secondary-transform choices of `cu` for `channel_type`. One
/// choice means the index is not coded.
pub(crate) fn rot_passes<C: CodingUnitSource + ?Sized>(tools: &ToolSet, cu: &C, channel_type: ChannelType) -> u32 {
    if !tools.nsst || cu.pred_mode() != PredMode::Intra || cu.transquant_bypass() {
        return 1;
    }
    let direction = match channel_type {
        ChannelType::Luma => {
            if cu.mpi_idx() != 0 || cu.pdpc_idx() != 0 {
                return 1;
            }
            cu.intra_dir_luma(0)
        }
        // linear-model chroma selects the planar transform set
        ChannelType::Chroma => match signalled_chroma_mode(cu, allowed_lm_modes(tools, cu)) {
            ChromaIntraMode::Lm(_) => PLANAR_IDX,
            _ => cu.intra_dir_chroma(),
        },
    };
    if direction <= DC_IDX { 3 } else { 4 }
}

pub(crate) fn fruc_mrg_mode_ctx<C: CodingUnitSource + ?Sized>(cu: &C) -> usize {
    count_neighbours(cu, |neighbour| neighbour.fruc != FrucMode::Off)
}

pub(crate) fn fruc_me_ctx<C: CodingUnitSource + ?Sized>(cu: &C) -> usize {
    count_neighbours(cu, |neighbour| neighbour.fruc == FrucMode::Bilateral)
}

/// Whether an intra index of MPI or PDPC is present.
pub(crate) fn intra_index_present<C: CodingUnitSource + ?Sized>(enabled: bool, cu: &C) -> bool {
    enabled && cu.pred_mode() == PredMode::Intra
}

/// KLT flags exist for square luma blocks between the KLT size limits.
pub(crate) fn has_klt_flag(block: &ResidualBlock) -> bool {
    !block.transquant_bypass
        && block.component.is_luma()
        && block.log2_width == block.log2_height
        && (LOG2_KLT_MIN_SIZE..=LOG2_KLT_MAX_SIZE).contains(&block.log2_width)
}

impl<E: BinEncoder> SbacEncoder<E> {
    /// Codes the CU-level EMT flag. `code_cu_flag` is false where the
    /// transform tree already implies it.
    pub fn code_emt_cu_flag<C: CodingUnitSource + ?Sized>(&mut self, cu: &C, depth: u32, code_cu_flag: bool) {
        if !code_cu_flag || !emt_present(&self.params.tools, cu) {
            return;
        }
        self.encode_bin_ctx(cu.emt_cu_flag() as u32, ContextGroup::EmtCuFlag, 0, emt_cu_flag_ctx(depth));
    }

    /// Codes the two-bin EMT transform index of a TU, low bit first.
    pub fn code_emt_tu_idx<C: CodingUnitSource + ?Sized>(&mut self, cu: &C) {
        if !emt_present(&self.params.tools, cu) {
            return;
        }
        let idx = cu.emt_tu_idx();
        debug_assert!(idx < 4, "EMT index {idx}");
        let base = emt_tu_idx_ctx_base(cu.pred_mode());
        self.encode_bin_ctx(idx & 1, ContextGroup::EmtTuIdx, 0, base);
        self.encode_bin_ctx(idx >> 1, ContextGroup::EmtTuIdx, 0, base + 1);
    }

    /// Codes the secondary transform index of one channel type.
    ///
    /// Planar and DC blocks choose among three transforms, angular blocks
    /// among four.
    pub fn code_rot_idx<C: CodingUnitSource + ?Sized>(&mut self, cu: &C, channel_type: ChannelType) {
        let idx = cu.rot_idx(channel_type);
        match rot_passes(&self.params.tools, cu, channel_type) {
            3 => {
                debug_assert!(idx < 3, "secondary transform index {idx} of 3");
                self.encode_bin_ctx((idx != 0) as u32, ContextGroup::RotIdx, 0, 1);
                if idx != 0 {
                    self.encode_bin_ctx((idx == 2) as u32, ContextGroup::RotIdx, 0, 3);
                }
            }
            4 => {
                self.encode_bin_ctx((idx != 0) as u32, ContextGroup::RotIdx, 0, 0);
                if idx != 0 {
                    self.encode_bin_ctx((idx > 1) as u32, ContextGroup::RotIdx, 0, 2);
                    if idx > 1 {
                        self.encode_bin_ctx((idx > 2) as u32, ContextGroup::RotIdx, 0, 4);
                    }
                }
            }
            _ => {}
        }
    }

    /// Codes the FRUC merge mode: off, or on plus template/bilateral. P slices
    /// only allow template matching and skip the second bin.
    pub fn code_fruc_mode<C: CodingUnitSource + ?Sized>(&mut self, cu: &C) {
        if !self.params.tools.fruc {
            return;
        }
        let mode = cu.fruc_mode();
        self.encode_bin_ctx((mode != FrucMode::Off) as u32, ContextGroup::FrucMrgMode, 0, fruc_mrg_mode_ctx(cu));
        if mode == FrucMode::Off {
            return;
        }
        if self.params.slice.slice_type == SliceType::P {
            debug_assert_eq!(mode, FrucMode::Template, "bilateral FRUC in a P slice");
            return;
        }
        self.encode_bin_ctx((mode == FrucMode::Bilateral) as u32, ContextGroup::FrucMe, 0, fruc_me_ctx(cu));
    }

    pub fn code_mpi_idx<C: CodingUnitSource + ?Sized>(&mut self, cu: &C) {
        if !intra_index_present(self.params.tools.mpi, cu) {
            return;
        }
        debug_assert!(cu.mpi_idx() <= 1);
        self.encode_bin_ctx(cu.mpi_idx(), ContextGroup::MpiIdx, 0, 0);
    }

    pub fn code_pdpc_idx<C: CodingUnitSource + ?Sized>(&mut self, cu: &C) {
        if !intra_index_present(self.params.tools.pdpc, cu) {
            return;
        }
        debug_assert!(cu.pdpc_idx() <= 1);
        self.encode_bin_ctx(cu.pdpc_idx(), ContextGroup::PdpcIdx, 0, 0);
    }

    pub fn code_klt_flag(&mut self, block: &ResidualBlock) {
        if !self.params.tools.klt || !has_klt_flag(block) {
            return;
        }
        let set = u8::from(block.channel_type()) as usize;
        self.encode_bin_ctx(block.klt as u32, ContextGroup::KltFlag, set, 0);
    }
}
