//! Parsing mirror of [`SbacEncoder`](crate::sbac::SbacEncoder).
//!
//! Every `parse_*` method reads what the matching `code_*` method writes.
//! Where the coder reads a [`CodingUnitSource`], the reader takes one too, but
//! only for the neighbourhood and for elements parsed earlier in the same CU.

use crate::cabac::{CabacDecoder, ContextGroup, ContextStore};
use crate::coding_parameters::CodingParameters;
use crate::constants::*;
use crate::error::CabacError;
use crate::sbac::binarization::{
    read_coef_remain_ex_golomb, read_ep_ex_golomb, read_sao_max_uvlc, read_trunc_bin_code, read_unary_max_symbol,
};
use crate::sbac::coding_unit::{
    allowed_lm_modes, bi_pred_bin_present, bt_depth, bt_direction_ctx, bt_split_ctx, count_neighbours, inter_dir_ctx,
    lm_mode_from_symbol, merge_idx_ctx, mpm_context, mvd_shift, sorted_candidates, split_flag_ctx, ChromaIntraMode,
    CodingUnitSource,
};
use crate::sbac::alf::{alf_ctrl_flag_present, flag_num_length};
use crate::sbac::jem::{
    emt_cu_flag_ctx, emt_present, emt_tu_idx_ctx_base, fruc_me_ctx, fruc_mrg_mode_ctx, has_klt_flag, intra_index_present,
    rot_passes,
};
use crate::sbac::residual::{last_position_group, update_rice_statistic, ResidualBlock};
use crate::sbac::sao::{max_sao_offset, SaoBlkParam, SaoMerge, SaoOffset, SaoType};
use crate::sbac::scan::{
    context_set_index, first_sig_ctx, last_significant_context_params, pattern_sig_ctx, sig_coeff_group_ctx_inc,
    sig_ctx_channel_offset, sig_ctx_inc, ScanOrder, GROUP_IDX, MIN_IN_GROUP,
};
use crate::sbac::transform_unit::{
    cross_component_ctx_base, cross_component_prediction_present, has_transform_skip_flag, qt_cbf_ctx,
    transform_subdiv_ctx,
};
use crate::{
    BtSplit, BtSplitConstraint, ChannelType, ComponentId, FrucMode, InterDir, Mv, PartSize, PredMode, RdpcmMode, RefPicList, ScanType,
    SliceType,
};

/// The residual syntax of one transform block as parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedResidual {
    /// Raster order, `y * width + x`.
    pub coefficients: Vec<i32>,
    pub transform_skip: bool,
    pub explicit_rdpcm: RdpcmMode,
}

#[derive(Debug, Clone)]
pub struct SbacReader<'a> {
    decoder: CabacDecoder<'a>,
    contexts: ContextStore,
    golomb_rice_statistics: [u32; GOLOMB_RICE_ADAPTATION_STATISTICS_SETS],
    params: CodingParameters,
}

impl<'a> SbacReader<'a> {
    /// Starts parsing a slice at the beginning of `data`.
    pub fn new(data: &'a [u8], params: CodingParameters) -> Result<Self, CabacError> {
        params.validate()?;
        let mut contexts = ContextStore::new();
        contexts.init_all(params.init_slice_type(), params.slice.qp);
        Ok(Self {
            decoder: CabacDecoder::new(data),
            contexts,
            golomb_rice_statistics: [0; GOLOMB_RICE_ADAPTATION_STATISTICS_SETS],
            params,
        })
    }

    pub fn params(&self) -> &CodingParameters {
        &self.params
    }

    pub fn contexts(&self) -> &ContextStore {
        &self.contexts
    }

    pub fn golomb_rice_statistics(&self) -> &[u32; GOLOMB_RICE_ADAPTATION_STATISTICS_SETS] {
        &self.golomb_rice_statistics
    }

    pub fn decoder_mut(&mut self) -> &mut CabacDecoder<'a> {
        &mut self.decoder
    }

    fn decode_bin_ctx(&mut self, group: ContextGroup, set: usize, index: usize) -> u32 {
        self.decoder.decode_bin(self.contexts.get_mut(group, set, index))
    }

    pub fn parse_terminating_bit(&mut self) -> bool {
        self.decoder.decode_bin_trm() == 1
    }

    /// Reads the end of a substream written with `update_context_tables(.., true)`
    /// and restarts parsing on the next byte with freshly initialized contexts.
    pub fn parse_substream_end(&mut self, slice_type: SliceType, qp: i32) -> Result<(), CabacError> {
        if self.decoder.decode_bin_trm() != 1 {
            return Err(CabacError::MissingSubstreamEnd);
        }
        self.decoder.decode_pcm_align_bits();
        self.contexts.init_all(slice_type, qp);
        self.decoder.reset_bac();
        Ok(())
    }

    pub fn parse_cu_transquant_bypass_flag(&mut self) -> bool {
        self.decode_bin_ctx(ContextGroup::TransquantBypassFlag, 0, 0) == 1
    }

    pub fn parse_skip_flag<C: CodingUnitSource + ?Sized>(&mut self, cu: &C) -> bool {
        let ctx = count_neighbours(cu, |neighbour| neighbour.skip);
        self.decode_bin_ctx(ContextGroup::SkipFlag, 0, ctx) == 1
    }

    pub fn parse_obmc_flag(&mut self) -> bool {
        self.decode_bin_ctx(ContextGroup::ObmcFlag, 0, 0) == 1
    }

    pub fn parse_ic_flag(&mut self) -> bool {
        self.decode_bin_ctx(ContextGroup::IcFlag, 0, 0) == 1
    }

    pub fn parse_imv_flag<C: CodingUnitSource + ?Sized>(&mut self, cu: &C) -> u32 {
        let ctx = count_neighbours(cu, |neighbour| neighbour.imv);
        if self.decode_bin_ctx(ContextGroup::ImvFlag, 0, ctx) == 0 {
            return 0;
        }
        if self.params.tools.multi_pel_mvd {
            1 + self.decode_bin_ctx(ContextGroup::ImvFlag, 0, 3)
        } else {
            1
        }
    }

    pub fn parse_affine_flag<C: CodingUnitSource + ?Sized>(&mut self, cu: &C) -> bool {
        let ctx = count_neighbours(cu, |neighbour| neighbour.affine);
        self.decode_bin_ctx(ContextGroup::AffineFlag, 0, ctx) == 1
    }

    pub fn parse_merge_flag(&mut self) -> bool {
        self.decode_bin_ctx(ContextGroup::MergeFlag, 0, 0) == 1
    }

    pub fn parse_merge_index(&mut self) -> u32 {
        let num_candidates = self.params.slice.max_num_merge_cand;
        let mut merge_index = 0;
        let gen_merge = self.params.tools.gen_merge;
        for i in 0..num_candidates.saturating_sub(1) {
            let bin = match merge_idx_ctx(gen_merge, i) {
                Some(ctx) => self.decode_bin_ctx(ContextGroup::MergeIdx, 0, ctx),
                None => self.decoder.decode_bin_ep(),
            };
            if bin == 0 {
                break;
            }
            merge_index += 1;
        }
        merge_index
    }

    /// Whether the quadtree node at `depth` splits.
    pub fn parse_split_flag<C: CodingUnitSource + ?Sized>(&mut self, cu: &C, depth: u32) -> bool {
        if depth == self.params.max_split_depth() {
            return false;
        }
        let ctx = split_flag_ctx(cu, depth);
        self.decode_bin_ctx(ContextGroup::SplitFlag, 0, ctx) == 1
    }

    /// Binary-tree decision of a node. When one side is at the minimum size,
    /// or the node's split constraint rules a direction out, the direction is
    /// implied.
    pub fn parse_bt_split_mode<C: CodingUnitSource + ?Sized>(
        &mut self,
        cu: &C,
        log2_width: u32,
        log2_height: u32,
    ) -> BtSplit {
        let log2_ctu_size = self.params.sequence.log2_ctu_size;
        let log2_min_bt_size = self.params.log2_min_bt_size(cu.channel_type());

        let ctx = bt_split_ctx(cu, log2_ctu_size, log2_width, log2_height);
        if self.decode_bin_ctx(ContextGroup::BtSplitFlag, 0, ctx) == 0 {
            return BtSplit::None;
        }
        if log2_width == log2_min_bt_size {
            return BtSplit::Horizontal;
        }
        if log2_height == log2_min_bt_size {
            return BtSplit::Vertical;
        }
        match cu.bt_split_constraint() {
            BtSplitConstraint::NoHorizontal => return BtSplit::Vertical,
            BtSplitConstraint::NoVertical => return BtSplit::Horizontal,
            BtSplitConstraint::None => {}
        }
        let ctx = bt_direction_ctx(log2_width, log2_height);
        let mode = if self.decode_bin_ctx(ContextGroup::BtSplitFlag, 0, ctx) == 0 {
            BtSplit::Horizontal
        } else {
            BtSplit::Vertical
        };
        ltrace!(
            "bt split {:?} at bt depth {}",
            mode,
            bt_depth(log2_ctu_size, cu.depth(), log2_width, log2_height)
        );
        mode
    }

    pub fn parse_pred_mode(&mut self) -> PredMode {
        if self.decode_bin_ctx(ContextGroup::PredMode, 0, 0) == 1 {
            PredMode::Intra
        } else {
            PredMode::Inter
        }
    }

    /// Partitioning of the CU at `depth`; `cu` supplies the prediction mode and size.
    pub fn parse_part_size<C: CodingUnitSource + ?Sized>(&mut self, cu: &C, depth: u32) -> PartSize {
        let max_depth = self.params.sequence.max_cu_depth;

        if cu.pred_mode() == PredMode::Intra {
            if depth == max_depth && self.decode_bin_ctx(ContextGroup::PartSize, 0, 0) == 0 {
                return PartSize::SizeNxN;
            }
            return PartSize::Size2Nx2N;
        }

        if self.decode_bin_ctx(ContextGroup::PartSize, 0, 0) == 1 {
            return PartSize::Size2Nx2N;
        }

        let amp = self.params.sequence.amp_enabled && depth < max_depth;
        let smallest_non_8x8 = depth == max_depth && !(cu.log2_width() == 3 && cu.log2_height() == 3);
        if self.decode_bin_ctx(ContextGroup::PartSize, 0, 1) == 1 {
            if !amp || self.decode_bin_ctx(ContextGroup::PartSize, 0, 3) == 1 {
                return PartSize::Size2NxN;
            }
            return if self.decoder.decode_bin_ep() == 0 {
                PartSize::Size2NxnU
            } else {
                PartSize::Size2NxnD
            };
        }

        if smallest_non_8x8 && self.decode_bin_ctx(ContextGroup::PartSize, 0, 2) == 0 {
            return PartSize::SizeNxN;
        }
        if !amp || self.decode_bin_ctx(ContextGroup::PartSize, 0, 3) == 1 {
            return PartSize::SizeNx2N;
        }
        if self.decoder.decode_bin_ep() == 0 {
            PartSize::SizenLx2N
        } else {
            PartSize::SizenRx2N
        }
    }

    /// Luma intra modes of the CU, one per coded prediction unit.
    pub fn parse_intra_dir_luma_ang<C: CodingUnitSource + ?Sized>(&mut self, cu: &C, is_multiple: bool) -> Vec<u32> {
        let num_parts = if is_multiple && !self.params.tools.qtbt && cu.part_size() == PartSize::SizeNxN {
            4
        } else {
            1
        };

        let mut mpm_flags = [false; 4];
        for mpm_flag in mpm_flags.iter_mut().take(num_parts) {
            *mpm_flag = self.decode_bin_ctx(ContextGroup::IntraPred, 0, 0) == 1;
        }

        let angular_65 = self.params.tools.intra_65_angular;
        let mut modes = Vec::with_capacity(num_parts);
        for (part, &mpm_flag) in mpm_flags.iter().enumerate().take(num_parts) {
            let candidates = cu.intra_mpm_candidates(part);
            let mode = if mpm_flag {
                let mut index = 0;
                if angular_65 {
                    while index < NUM_MOST_PROBABLE_MODES_JEM - 1 {
                        let bin = if index < 3 {
                            let ctx = mpm_context(candidates[index]);
                            self.decode_bin_ctx(ContextGroup::IntraPred, 0, ctx)
                        } else {
                            self.decoder.decode_bin_ep()
                        };
                        if bin == 0 {
                            break;
                        }
                        index += 1;
                    }
                } else if self.decoder.decode_bin_ep() == 1 {
                    index = 1 + self.decoder.decode_bin_ep() as usize;
                }
                candidates[index]
            } else {
                let rank = if angular_65 {
                    if self.decode_bin_ctx(ContextGroup::IntraPred, 0, INTRA_SELECTED_MODE_CTX) == 1 {
                        self.decoder.decode_bins_ep(4) << 2
                    } else {
                        let code = read_trunc_bin_code(&mut self.decoder, 45);
                        code + code / 3 + 1
                    }
                } else {
                    self.decoder.decode_bins_ep(5)
                };
                let (sorted, count) = sorted_candidates(candidates);
                sorted[..count]
                    .iter()
                    .fold(rank, |mode, &candidate| if mode >= candidate { mode + 1 } else { mode })
            };
            modes.push(mode);
        }
        modes
    }

    /// Chroma intra mode; `cu` supplies the number of linear-model modes it allows.
    pub fn parse_intra_dir_chroma<C: CodingUnitSource + ?Sized>(&mut self, cu: &C) -> ChromaIntraMode {
        if self.decode_bin_ctx(ContextGroup::ChromaPred, 0, 0) == 0 {
            return ChromaIntraMode::Derived;
        }
        let num_lm_modes = allowed_lm_modes(&self.params.tools, cu);
        if num_lm_modes > 0 {
            let models = &mut self.contexts.group_mut(ContextGroup::ChromaPred)[1..];
            let symbol = read_unary_max_symbol(&mut self.decoder, models, 1, num_lm_modes);
            if let Some(mode) = lm_mode_from_symbol(symbol) {
                return ChromaIntraMode::Lm(mode);
            }
        }
        ChromaIntraMode::Candidate(self.decoder.decode_bins_ep(NUM_CHROMA_CANDIDATE_BITS))
    }

    pub fn parse_inter_dir<C: CodingUnitSource + ?Sized>(&mut self, cu: &C) -> InterDir {
        if bi_pred_bin_present(&self.params.tools, cu) {
            let ctx = inter_dir_ctx(cu);
            if self.decode_bin_ctx(ContextGroup::InterDir, 0, ctx) == 1 {
                return InterDir::Bi;
            }
        }
        if self.decode_bin_ctx(ContextGroup::InterDir, 0, 4) == 0 {
            InterDir::L0
        } else {
            InterDir::L1
        }
    }

    pub fn parse_ref_frm_idx(&mut self, list: RefPicList) -> u32 {
        let num_ref = self.params.slice.num_ref_idx[list as usize];
        if num_ref <= 1 || self.decode_bin_ctx(ContextGroup::RefPic, 0, 0) == 0 {
            return 0;
        }

        let mut ref_idx = 1;
        for i in 0..num_ref - 2 {
            let bin = if i == 0 {
                self.decode_bin_ctx(ContextGroup::RefPic, 0, 1)
            } else {
                self.decoder.decode_bin_ep()
            };
            if bin == 0 {
                break;
            }
            ref_idx += 1;
        }
        ref_idx
    }

    /// Motion vector difference in quarter-sample units. `cu` supplies the
    /// inter direction of `part` and the MV resolution.
    pub fn parse_mvd<C: CodingUnitSource + ?Sized>(&mut self, cu: &C, part: usize, list: RefPicList) -> Mv {
        if self.params.slice.mvd_l1_zero && list == RefPicList::L1 && cu.inter_dir(part) == InterDir::Bi {
            return Mv::default();
        }

        let mut abs = [0u32; 2];
        for value in abs.iter_mut() {
            *value = self.decode_bin_ctx(ContextGroup::Mvd, 0, 0);
        }
        for value in abs.iter_mut() {
            if *value != 0 {
                *value += self.decode_bin_ctx(ContextGroup::Mvd, 0, 1);
            }
        }

        let mut components = [0i32; 2];
        for (component, &value) in components.iter_mut().zip(&abs) {
            if value == 0 {
                continue;
            }
            let magnitude = if value > 1 {
                read_ep_ex_golomb(&mut self.decoder, 1) + 2
            } else {
                1
            };
            let negative = self.decoder.decode_bin_ep() == 1;
            *component = if negative { -(magnitude as i32) } else { magnitude as i32 };
        }

        let shift = mvd_shift(&self.params.tools, cu.imv());
        Mv::new(components[0] << shift, components[1] << shift)
    }

    pub fn parse_mvp_idx(&mut self) -> u32 {
        let models = self.contexts.group_mut(ContextGroup::MvpIdx);
        read_unary_max_symbol(&mut self.decoder, models, 1, AMVP_MAX_NUM_CANDS - 1)
    }

    pub fn parse_emt_cu_flag<C: CodingUnitSource + ?Sized>(&mut self, cu: &C, depth: u32, code_cu_flag: bool) -> bool {
        if !code_cu_flag || !emt_present(&self.params.tools, cu) {
            return false;
        }
        self.decode_bin_ctx(ContextGroup::EmtCuFlag, 0, emt_cu_flag_ctx(depth)) != 0
    }

    pub fn parse_emt_tu_idx<C: CodingUnitSource + ?Sized>(&mut self, cu: &C) -> u32 {
        if !emt_present(&self.params.tools, cu) {
            return 0;
        }
        let base = emt_tu_idx_ctx_base(cu.pred_mode());
        let low = self.decode_bin_ctx(ContextGroup::EmtTuIdx, 0, base);
        let high = self.decode_bin_ctx(ContextGroup::EmtTuIdx, 0, base + 1);
        (high << 1) | low
    }

    /// The intra mode and the MPI and PDPC indices of `cu` must already be parsed.
    pub fn parse_rot_idx<C: CodingUnitSource + ?Sized>(&mut self, cu: &C, channel_type: ChannelType) -> u32 {
        match rot_passes(&self.params.tools, cu, channel_type) {
            3 => {
                if self.decode_bin_ctx(ContextGroup::RotIdx, 0, 1) == 0 {
                    0
                } else {
                    1 + self.decode_bin_ctx(ContextGroup::RotIdx, 0, 3)
                }
            }
            4 => {
                if self.decode_bin_ctx(ContextGroup::RotIdx, 0, 0) == 0 {
                    0
                } else if self.decode_bin_ctx(ContextGroup::RotIdx, 0, 2) == 0 {
                    1
                } else {
                    2 + self.decode_bin_ctx(ContextGroup::RotIdx, 0, 4)
                }
            }
            _ => 0,
        }
    }

    pub fn parse_fruc_mode<C: CodingUnitSource + ?Sized>(&mut self, cu: &C) -> FrucMode {
        if !self.params.tools.fruc || self.decode_bin_ctx(ContextGroup::FrucMrgMode, 0, fruc_mrg_mode_ctx(cu)) == 0 {
            return FrucMode::Off;
        }
        if self.params.slice.slice_type == SliceType::P {
            return FrucMode::Template;
        }
        match self.decode_bin_ctx(ContextGroup::FrucMe, 0, fruc_me_ctx(cu)) {
            0 => FrucMode::Template,
            _ => FrucMode::Bilateral,
        }
    }

    pub fn parse_mpi_idx<C: CodingUnitSource + ?Sized>(&mut self, cu: &C) -> u32 {
        if !intra_index_present(self.params.tools.mpi, cu) {
            return 0;
        }
        self.decode_bin_ctx(ContextGroup::MpiIdx, 0, 0)
    }

    pub fn parse_pdpc_idx<C: CodingUnitSource + ?Sized>(&mut self, cu: &C) -> u32 {
        if !intra_index_present(self.params.tools.pdpc, cu) {
            return 0;
        }
        self.decode_bin_ctx(ContextGroup::PdpcIdx, 0, 0)
    }

    pub fn parse_klt_flag(&mut self, block: &ResidualBlock) -> bool {
        if !self.params.tools.klt || !has_klt_flag(block) {
            return false;
        }
        let set = u8::from(block.channel_type()) as usize;
        self.decode_bin_ctx(ContextGroup::KltFlag, set, 0) != 0
    }

    fn decode_alf_param_bin(&mut self, group: ContextGroup, index: usize) -> u32 {
        if self.params.tools.galf {
            self.decoder.decode_bin_ep()
        } else {
            self.decode_bin_ctx(group, 0, index)
        }
    }

    pub fn parse_alf_ctrl_flag<C: CodingUnitSource + ?Sized>(&mut self, cu: &C) -> bool {
        if !alf_ctrl_flag_present(&self.params, cu) {
            return false;
        }
        self.decode_bin_ctx(ContextGroup::AlfCtrlFlag, 0, 0) != 0
    }

    pub fn parse_alf_ctrl_flag_symbol(&mut self) -> bool {
        self.decode_bin_ctx(ContextGroup::AlfCtrlFlag, 0, 0) != 0
    }

    /// Parses the control depth and makes it the depth of the following
    /// control flags and flag counts.
    pub fn parse_alf_ctrl_depth(&mut self, max_total_cu_depth: u32) -> u32 {
        let models = self.contexts.group_mut(ContextGroup::AlfUvlc);
        let depth = read_unary_max_symbol(&mut self.decoder, models, 1, max_total_cu_depth.saturating_sub(1));
        self.params.slice.alf_max_ctrl_depth = depth;
        depth
    }

    pub fn parse_alf_prev_filt_type(&mut self) -> u32 {
        read_ep_ex_golomb(&mut self.decoder, 0)
    }

    pub fn parse_alf_prev_filt_flag(&mut self) -> bool {
        self.decoder.decode_bin_ep() != 0
    }

    pub fn parse_alf_flag(&mut self) -> bool {
        self.decode_alf_param_bin(ContextGroup::AlfFlag, 0) != 0
    }

    pub fn parse_alf_flag_num(&mut self, min: u32) -> u32 {
        match flag_num_length(&self.params, min) {
            0 => min,
            length => min + self.decoder.decode_bins_ep(length),
        }
    }

    pub fn parse_alf_uvlc(&mut self) -> u32 {
        if self.decode_alf_param_bin(ContextGroup::AlfUvlc, 0) == 0 {
            return 0;
        }
        let mut code = 1;
        while self.decode_alf_param_bin(ContextGroup::AlfUvlc, 1) != 0 {
            code += 1;
        }
        code
    }

    pub fn parse_alf_svlc(&mut self) -> i32 {
        if self.decode_alf_param_bin(ContextGroup::AlfSvlc, 0) == 0 {
            return 0;
        }
        let negative = self.decode_alf_param_bin(ContextGroup::AlfSvlc, 1) != 0;
        let mut magnitude = 1;
        while self.decode_alf_param_bin(ContextGroup::AlfSvlc, 2) != 0 {
            magnitude += 1;
        }
        if negative { -magnitude } else { magnitude }
    }

    /// Parses `pcm_flag` and, when set, the raw samples of every component.
    pub fn parse_ipcm_info<C: CodingUnitSource + ?Sized>(&mut self, cu: &C) -> Result<Option<Vec<Vec<u32>>>, CabacError> {
        if self.decoder.decode_bin_trm() == 0 {
            return Ok(None);
        }

        self.decoder.decode_pcm_align_bits();
        let sequence = self.params.sequence;
        let chroma_format = sequence.chroma_format;
        let mut samples = Vec::with_capacity(chroma_format.component_count());
        for component in ComponentId::ALL.into_iter().take(chroma_format.component_count()) {
            let (shift_x, shift_y) = chroma_format.scale_shift(component);
            let num_samples = ((1usize << cu.log2_width()) >> shift_x) * ((1usize << cu.log2_height()) >> shift_y);
            let bit_depth = sequence.pcm_bit_depth[component.channel_type() as usize];
            let component_samples = (0..num_samples)
                .map(|_| self.decoder.read_pcm_code(bit_depth))
                .collect::<Result<Vec<_>, _>>()?;
            samples.push(component_samples);
        }
        self.decoder.reset_bac();
        Ok(Some(samples))
    }

    pub fn parse_qt_cbf(&mut self, component: ComponentId, tr_depth: u32) -> bool {
        let channel_type = component.channel_type();
        let ctx = qt_cbf_ctx(channel_type, tr_depth);
        self.decode_bin_ctx(ContextGroup::QtCbf, u8::from(channel_type) as usize, ctx) == 1
    }

    pub fn parse_qt_cbf_pair(&mut self, component: ComponentId, tr_depth: u32) -> [bool; 2] {
        let first = self.parse_qt_cbf(component, tr_depth);
        [first, self.parse_qt_cbf(component, tr_depth)]
    }

    pub fn parse_transform_subdiv_flag(&mut self, log2_size: u32) -> bool {
        self.decode_bin_ctx(ContextGroup::TransSubdivFlag, 0, transform_subdiv_ctx(log2_size)) == 1
    }

    pub fn parse_qt_root_cbf(&mut self) -> bool {
        self.decode_bin_ctx(ContextGroup::QtRootCbf, 0, 0) == 1
    }

    /// Transform skip flag of `block`; `false` when the block carries none.
    pub fn parse_transform_skip_flag(&mut self, block: &ResidualBlock) -> bool {
        if !has_transform_skip_flag(block, self.params.picture.log2_max_transform_skip_size) {
            return false;
        }
        let set = u8::from(block.channel_type()) as usize;
        self.decode_bin_ctx(ContextGroup::TransformSkipFlag, set, 0) == 1
    }

    pub fn parse_explicit_rdpcm_mode(&mut self, component: ComponentId) -> RdpcmMode {
        let set = u8::from(component.channel_type()) as usize;
        if self.decode_bin_ctx(ContextGroup::RdpcmFlag, set, 0) == 0 {
            return RdpcmMode::Off;
        }
        if self.decode_bin_ctx(ContextGroup::RdpcmDir, set, 0) == 0 {
            RdpcmMode::Horizontal
        } else {
            RdpcmMode::Vertical
        }
    }

    /// Cross-component prediction weight; 0 when the TU carries none.
    pub fn parse_cross_component_prediction<C: CodingUnitSource + ?Sized>(
        &mut self,
        cu: &C,
        component: ComponentId,
    ) -> i32 {
        if !cross_component_prediction_present(cu, component, self.params.picture.cross_component_prediction) {
            return 0;
        }

        let base = cross_component_ctx_base(component);
        if self.decode_bin_ctx(ContextGroup::CrossComponentPrediction, 0, base) == 0 {
            return 0;
        }
        let magnitude = if self.decode_bin_ctx(ContextGroup::CrossComponentPrediction, 0, base + 1) == 1 {
            let models = &mut self.contexts.group_mut(ContextGroup::CrossComponentPrediction)[base + 2..];
            let log2_abs_alpha = read_unary_max_symbol(&mut self.decoder, models, 1, 2) + 1;
            1 << log2_abs_alpha
        } else {
            1
        };
        if self.decode_bin_ctx(ContextGroup::CrossComponentPrediction, 0, base + 4) == 1 {
            -magnitude
        } else {
            magnitude
        }
    }

    /// Coded QP difference, already wrapped into the signalable range.
    pub fn parse_delta_qp(&mut self) -> i32 {
        let models = self.contexts.group_mut(ContextGroup::DeltaQp);
        let mut abs_delta_qp = read_unary_max_symbol(&mut self.decoder, models, 1, CU_DQP_TU_CMAX);
        if abs_delta_qp >= CU_DQP_TU_CMAX {
            abs_delta_qp += read_ep_ex_golomb(&mut self.decoder, CU_DQP_EG_K);
        }
        if abs_delta_qp > 0 && self.decoder.decode_bin_ep() == 1 {
            -(abs_delta_qp as i32)
        } else {
            abs_delta_qp as i32
        }
    }

    pub fn parse_chroma_qp_adjustment(&mut self) -> u32 {
        if self.decode_bin_ctx(ContextGroup::ChromaQpAdjFlag, 0, 0) == 0 {
            return 0;
        }
        let list_len = self.params.picture.chroma_qp_offset_list_len;
        if list_len > 1 {
            let models = self.contexts.group_mut(ContextGroup::ChromaQpAdjIdc);
            1 + read_unary_max_symbol(&mut self.decoder, models, 0, list_len - 1)
        } else {
            1
        }
    }

    /// Position of the last significant coefficient as `(x, y)`.
    pub fn parse_last_significant_xy(
        &mut self,
        mut log2_width: u32,
        mut log2_height: u32,
        component: ComponentId,
        scan_type: ScanType,
    ) -> (u32, u32) {
        if scan_type == ScanType::Vertical {
            std::mem::swap(&mut log2_width, &mut log2_height);
        }
        let channel_type = component.channel_type();
        let set = u8::from(channel_type) as usize;

        let mut groups = [0u32; 2];
        for (group, (group_ctx, log2_size)) in groups
            .iter_mut()
            .zip([(ContextGroup::LastX, log2_width), (ContextGroup::LastY, log2_height)])
        {
            let (offset, shift) = last_significant_context_params(channel_type, log2_size);
            let max_group = GROUP_IDX[(1 << log2_size) - 1] as u32;
            while *group < max_group && self.decode_bin_ctx(group_ctx, set, offset + (*group >> shift) as usize) == 1 {
                *group += 1;
            }
        }

        let mut positions = [0u32; 2];
        for (position, &group) in positions.iter_mut().zip(&groups) {
            let (_, _, count) = last_position_group(MIN_IN_GROUP[group as usize] as u32);
            *position = MIN_IN_GROUP[group as usize] as u32;
            if count > 0 {
                *position += self.decoder.decode_bins_ep(count);
            }
        }

        let [mut pos_x, mut pos_y] = positions;
        if scan_type == ScanType::Vertical {
            std::mem::swap(&mut pos_x, &mut pos_y);
        }
        (pos_x, pos_y)
    }

    /// Parses the residual of one transform block.
    ///
    /// The coefficients, transform skip flag and RDPCM mode of `block` are not
    /// read; they are what this returns.
    pub fn parse_coeff_nxn(&mut self, block: &ResidualBlock) -> ParsedResidual {
        let mut block = *block;
        let log2_width = block.log2_width;
        let log2_height = block.log2_height;
        let channel_type = block.channel_type();
        block.transform_skip = false;
        block.explicit_rdpcm = RdpcmMode::Off;

        let explicit_rdpcm_enabled = !block.is_intra() && self.params.sequence.explicit_rdpcm;
        if block.transquant_bypass && explicit_rdpcm_enabled {
            block.explicit_rdpcm = self.parse_explicit_rdpcm_mode(block.component);
        }
        if self.params.picture.transform_skip {
            block.transform_skip = self.parse_transform_skip_flag(&block);
            if block.transform_skip && explicit_rdpcm_enabled {
                block.explicit_rdpcm = self.parse_explicit_rdpcm_mode(block.component);
            }
        }
        let sign_hiding_allowed = self.params.picture.sign_data_hiding
            && !block.transquant_bypass
            && !block.is_implicit_rdpcm(&self.params)
            && block.explicit_rdpcm == RdpcmMode::Off;

        let extended_precision = self.params.sequence.extended_precision_processing;
        let align_before_bypass = self.params.sequence.cabac_bypass_alignment;
        let persistent_rice = self.params.sequence.persistent_rice_adaptation;
        let max_log2_tr_dynamic_range = self.params.sequence.max_log2_tr_dynamic_range(channel_type);
        let statistics_set = block.rice_statistics_set();

        let scan = ScanOrder::new(log2_width, log2_height, block.scan_type);
        let width_in_groups = scan.width_in_groups();
        let height_in_groups = scan.height_in_groups();
        let first_ctx = first_sig_ctx(
            log2_width,
            log2_height,
            channel_type,
            block.scan_type,
            block.uses_single_sig_context(&self.params),
        );
        let sig_offset = sig_ctx_channel_offset(channel_type);
        let set = u8::from(channel_type) as usize;

        let (last_x, last_y) = self.parse_last_significant_xy(log2_width, log2_height, block.component, block.scan_type);
        let last_position = ((last_y << log2_width) + last_x) as u16;
        let positions = scan.positions();
        let scan_pos_last = positions.iter().position(|&position| position == last_position).unwrap_or(0);

        let mut coefficients = vec![0i32; 1 << (log2_width + log2_height)];
        let mut sig_groups = [false; MAX_CG_COUNT];
        let last_subset = scan_pos_last >> MLS_CG_SIZE;
        let mut c1 = 1;
        let mut scan_pos_sig = scan_pos_last as isize;

        for subset in (0..=last_subset).rev() {
            let sub_pos = (subset << MLS_CG_SIZE) as isize;
            let mut rice_param = self.golomb_rice_statistics[statistics_set] / GOLOMB_RICE_INCREMENT_DIVISOR;
            let mut update_statistics = persistent_rice;
            let mut abs_coeff = [0u32; 1 << MLS_CG_SIZE];
            let mut nz_positions = [0usize; 1 << MLS_CG_SIZE];
            let mut num_non_zero = 0;
            let mut last_nz_pos_in_group: isize = -1;
            let mut first_nz_pos_in_group: isize = 1 << MLS_CG_SIZE;

            if scan_pos_sig == scan_pos_last as isize {
                abs_coeff[0] = 1;
                nz_positions[0] = last_position as usize;
                num_non_zero = 1;
                last_nz_pos_in_group = scan_pos_sig;
                first_nz_pos_in_group = scan_pos_sig;
                scan_pos_sig -= 1;
            }

            let group = scan.groups()[subset] as u32;
            let group_y = group / width_in_groups;
            let group_x = group - group_y * width_in_groups;
            if subset == last_subset || subset == 0 {
                sig_groups[group as usize] = true;
            } else {
                let ctx = sig_coeff_group_ctx_inc(&sig_groups, group_x, group_y, width_in_groups, height_in_groups);
                sig_groups[group as usize] = self.decode_bin_ctx(ContextGroup::SigCoeffGroup, set, ctx) == 1;
            }

            if sig_groups[group as usize] {
                let pattern = pattern_sig_ctx(&sig_groups, group_x, group_y, width_in_groups, height_in_groups);
                while scan_pos_sig >= sub_pos {
                    let position = positions[scan_pos_sig as usize] as u32;
                    let sig = if scan_pos_sig > sub_pos || subset == 0 || num_non_zero > 0 {
                        let pos_y = position >> log2_width;
                        let pos_x = position - (pos_y << log2_width);
                        let ctx = sig_ctx_inc(pattern, first_ctx, pos_x, pos_y, log2_width, log2_height, channel_type);
                        self.decode_bin_ctx(ContextGroup::SigFlag, 0, sig_offset + ctx) == 1
                    } else {
                        true
                    };
                    if sig {
                        abs_coeff[num_non_zero] = 1;
                        nz_positions[num_non_zero] = position as usize;
                        num_non_zero += 1;
                        if last_nz_pos_in_group == -1 {
                            last_nz_pos_in_group = scan_pos_sig;
                        }
                        first_nz_pos_in_group = scan_pos_sig;
                    }
                    scan_pos_sig -= 1;
                }
            } else {
                scan_pos_sig = sub_pos - 1;
            }

            if num_non_zero == 0 {
                continue;
            }

            let mut escape_data_present = false;
            let sign_hidden = last_nz_pos_in_group - first_nz_pos_in_group >= SBH_THRESHOLD as isize;
            let ctx_set = context_set_index(channel_type, subset, c1 == 0);
            c1 = 1;

            let num_c1_flags = num_non_zero.min(C1FLAG_NUMBER);
            let mut first_c2_flag_idx = None;
            for idx in 0..num_c1_flags {
                let symbol = self.decode_bin_ctx(ContextGroup::OneFlag, 0, NUM_ONE_FLAG_CTX_PER_SET * ctx_set + c1);
                if symbol == 1 {
                    abs_coeff[idx] = 2;
                    c1 = 0;
                    if first_c2_flag_idx.is_none() {
                        first_c2_flag_idx = Some(idx);
                    } else {
                        escape_data_present = true;
                    }
                } else if c1 > 0 && c1 < 3 {
                    c1 += 1;
                }
            }

            if c1 == 0 {
                if let Some(idx) = first_c2_flag_idx {
                    let symbol = self.decode_bin_ctx(ContextGroup::AbsFlag, 0, NUM_ABS_FLAG_CTX_PER_SET * ctx_set);
                    abs_coeff[idx] += symbol;
                    if symbol == 1 {
                        escape_data_present = true;
                    }
                }
            }

            escape_data_present |= num_non_zero > C1FLAG_NUMBER;
            if escape_data_present && align_before_bypass {
                self.decoder.align();
            }

            let hide_sign = sign_hiding_allowed && sign_hidden;
            let num_signs = if hide_sign { num_non_zero - 1 } else { num_non_zero };
            let coeff_signs = self.decoder.decode_bins_ep(num_signs as u32);

            if escape_data_present {
                self.parse_remainders(
                    &mut abs_coeff[..num_non_zero],
                    &mut rice_param,
                    &mut update_statistics,
                    statistics_set,
                    persistent_rice,
                    extended_precision,
                    max_log2_tr_dynamic_range,
                );
            }

            let mut sum_abs_level = 0;
            for idx in 0..num_non_zero {
                let abs = abs_coeff[idx];
                sum_abs_level += abs;
                let negative = if hide_sign && idx == num_non_zero - 1 {
                    sum_abs_level & 1 == 1
                } else {
                    (coeff_signs >> (num_signs - 1 - idx)) & 1 == 1
                };
                coefficients[nz_positions[idx]] = if negative { -(abs as i32) } else { abs as i32 };
            }
        }

        ParsedResidual {
            coefficients,
            transform_skip: block.transform_skip,
            explicit_rdpcm: block.explicit_rdpcm,
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn parse_remainders(
        &mut self,
        abs_coeff: &mut [u32],
        rice_param: &mut u32,
        update_statistics: &mut bool,
        statistics_set: usize,
        persistent_rice: bool,
        extended_precision: bool,
        max_log2_tr_dynamic_range: u32,
    ) {
        let mut first_coeff2 = 1;
        for (idx, abs) in abs_coeff.iter_mut().enumerate() {
            let base_level = if idx < C1FLAG_NUMBER { 2 + first_coeff2 } else { 1 };
            if *abs == base_level {
                let escape_code_value = read_coef_remain_ex_golomb(
                    &mut self.decoder,
                    *rice_param,
                    extended_precision,
                    max_log2_tr_dynamic_range,
                );
                *abs = escape_code_value + base_level;
                if *abs > (3 << *rice_param) {
                    *rice_param = if persistent_rice {
                        *rice_param + 1
                    } else {
                        (*rice_param + 1).min(MAX_RICE_PARAMETER_WITHOUT_ADAPTATION)
                    };
                }
                if *update_statistics {
                    update_rice_statistic(&mut self.golomb_rice_statistics[statistics_set], escape_code_value);
                    *update_statistics = false;
                }
            }
            if *abs >= 2 {
                first_coeff2 = 0;
            }
        }
    }

    /// SAO parameters of a CTU. A merged CTU comes back with `merge` set and
    /// default offsets; the caller copies them from the neighbour.
    pub fn parse_sao_blk_param(&mut self, left_merge_available: bool, above_merge_available: bool) -> SaoBlkParam {
        let mut param = SaoBlkParam::default();
        if left_merge_available && self.decode_bin_ctx(ContextGroup::SaoMergeFlag, 0, 0) == 1 {
            param.merge = SaoMerge::Left;
            return param;
        }
        if above_merge_available && self.decode_bin_ctx(ContextGroup::SaoMergeFlag, 0, 0) == 1 {
            param.merge = SaoMerge::Above;
            return param;
        }

        let num_components = self.params.sequence.chroma_format.component_count();
        for component in ComponentId::ALL.into_iter().take(num_components) {
            let channel_type = component.channel_type();
            if !self.params.slice.sao_enabled[u8::from(channel_type) as usize] {
                continue;
            }
            let shared = if component == ComponentId::Cr {
                Some(param.components[ComponentId::Cb as usize].sao_type)
            } else {
                None
            };
            param.components[component as usize] = self.parse_sao_offset_param(component, shared);
        }
        param
    }

    fn parse_sao_type_idx(&mut self) -> u32 {
        if self.decode_bin_ctx(ContextGroup::SaoTypeIdx, 0, 0) == 0 {
            0
        } else {
            1 + self.decoder.decode_bin_ep()
        }
    }

    fn parse_sao_offset_param(&mut self, component: ComponentId, shared_type: Option<SaoType>) -> SaoOffset {
        let type_idx = match shared_type {
            Some(sao_type) => sao_type.type_idx(),
            None => self.parse_sao_type_idx(),
        };
        if type_idx == 0 {
            return SaoOffset::default();
        }

        let channel_type: ChannelType = component.channel_type();
        let bit_depth = self.params.sequence.bit_depth[u8::from(channel_type) as usize];
        let max_offset = max_sao_offset(bit_depth);
        let mut offsets = [0i32; NUM_SAO_OFFSETS];
        for offset in offsets.iter_mut() {
            *offset = read_sao_max_uvlc(&mut self.decoder, max_offset) as i32;
        }

        let sao_type = if type_idx == 1 {
            for offset in offsets.iter_mut().filter(|offset| **offset != 0) {
                if self.decoder.decode_bin_ep() == 1 {
                    *offset = -*offset;
                }
            }
            SaoType::Band {
                position: self.decoder.decode_bins_ep(NUM_SAO_BO_CLASSES_LOG2),
            }
        } else {
            offsets[2] = -offsets[2];
            offsets[3] = -offsets[3];
            let class = match shared_type {
                Some(SaoType::Edge { class }) => class,
                _ => self.decoder.decode_bins_ep(NUM_SAO_EO_TYPES_LOG2),
            };
            SaoType::Edge { class }
        };
        SaoOffset { sao_type, offsets }
    }
}
