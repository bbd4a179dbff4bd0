//! Coding-unit and prediction-unit syntax elements.
//!
//! The coder reads the coding tree through [`CodingUnitSource`] and never
//! writes to it. Context derivations that depend on causal neighbours use the
//! left and above [`NeighbourInfo`].

use crate::cabac::{BinEncoder, ContextGroup};
use crate::coding_parameters::ToolSet;
use crate::constants::*;
use crate::sbac::SbacEncoder;
use crate::sbac::binarization::{write_ep_ex_golomb, write_trunc_bin_code, write_unary_max_symbol};
use crate::{BtSplit, BtSplitConstraint, ChannelType, ComponentId, FrucMode, InterDir, Mv, PartSize, PredMode, RefPicList};

/// What the context derivations need to know about an already coded neighbour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NeighbourInfo {
    pub depth: u32,
    pub log2_width: u32,
    pub log2_height: u32,
    pub skip: bool,
    pub affine: bool,
    pub imv: bool,
    pub fruc: FrucMode,
}

/// How the chroma intra mode of a CU is signalled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChromaIntraMode {
    /// Derived from the luma mode.
    Derived,
    /// Index into the allowed chroma candidates.
    Candidate(u32),
    /// Index into the linear-model modes the CU allows.
    Lm(u32),
}

/// Read access to one coding unit and its neighbourhood.
///
/// `part` indexes the prediction units of the CU in coding order.
pub trait CodingUnitSource {
    /// Quadtree depth of the CU.
    fn depth(&self) -> u32;
    fn log2_width(&self) -> u32;
    fn log2_height(&self) -> u32;
    /// Coding tree the CU belongs to; intra slices code chroma in a separate tree.
    fn channel_type(&self) -> ChannelType;
    /// Position in z-order within the CTU, in units of 4x4 blocks.
    fn z_index(&self) -> u32;
    fn left(&self) -> Option<&NeighbourInfo>;
    fn above(&self) -> Option<&NeighbourInfo>;

    fn transquant_bypass(&self) -> bool;
    fn skip(&self) -> bool;
    fn pred_mode(&self) -> PredMode;
    fn part_size(&self) -> PartSize;
    /// Binary-tree decision at `bt_depth` below the quadtree leaf.
    fn bt_split(&self, bt_depth: u32) -> BtSplit;
    /// Directions the next BT split of this node may not take.
    fn bt_split_constraint(&self) -> BtSplitConstraint;

    fn merge_flag(&self, part: usize) -> bool;
    fn merge_index(&self, part: usize) -> u32;
    fn inter_dir(&self, part: usize) -> InterDir;
    fn ref_idx(&self, part: usize, list: RefPicList) -> u32;
    /// Motion vector difference in quarter-sample units.
    fn mvd(&self, part: usize, list: RefPicList) -> Mv;
    fn mvp_idx(&self, part: usize, list: RefPicList) -> u32;

    fn intra_dir_luma(&self, part: usize) -> u32;
    /// Most probable modes of `part`, in candidate order.
    fn intra_mpm_candidates(&self, part: usize) -> &[u32];
    /// Index into the allowed chroma candidates, `None` for the derived mode.
    fn intra_chroma_candidate(&self) -> Option<u32>;
    /// Linear-model chroma mode, as an index into the modes this CU allows.
    fn lm_chroma_mode(&self) -> Option<u32>;
    /// Number of linear-model chroma modes allowed at this CU size.
    fn num_lm_chroma_modes(&self) -> u32;
    /// Chroma intra direction with the derived mode resolved.
    fn intra_dir_chroma(&self) -> u32;
    fn mpi_idx(&self) -> u32;
    fn pdpc_idx(&self) -> u32;
    /// Secondary transform index of one channel type.
    fn rot_idx(&self, channel_type: ChannelType) -> u32;
    fn emt_cu_flag(&self) -> bool;
    fn emt_tu_idx(&self) -> u32;

    fn qp(&self) -> i32;
    fn ref_qp(&self) -> i32;
    fn chroma_qp_adj(&self) -> u32;
    fn cross_component_alpha(&self, component: ComponentId) -> i32;
    fn root_cbf(&self) -> bool;

    fn obmc_flag(&self) -> bool;
    fn ic_flag(&self) -> bool;
    /// 0: quarter-sample, 1: integer-sample, 2: four-sample MVD resolution.
    fn imv(&self) -> u32;
    fn affine_flag(&self) -> bool;
    fn fruc_mode(&self) -> FrucMode;
    fn alf_ctrl_flag(&self) -> bool;

    fn pcm_flag(&self) -> bool;
    fn pcm_samples(&self, component: ComponentId) -> &[u32];
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PredictionUnitInfo {
    pub merge_flag: bool,
    pub merge_index: u32,
    pub inter_dir: InterDir,
    pub ref_idx: [u32; 2],
    pub mvd: [Mv; 2],
    pub mvp_idx: [u32; 2],
    pub intra_dir_luma: u32,
    pub intra_mpm_candidates: Vec<u32>,
}

static EMPTY_PREDICTION_UNIT: PredictionUnitInfo = PredictionUnitInfo {
    merge_flag: false,
    merge_index: 0,
    inter_dir: InterDir::L0,
    ref_idx: [0; 2],
    mvd: [Mv { hor: 0, ver: 0 }; 2],
    mvp_idx: [0; 2],
    intra_dir_luma: 0,
    intra_mpm_candidates: Vec::new(),
};

/// Plain-data coding unit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CodingUnitInfo {
    pub depth: u32,
    pub log2_width: u32,
    pub log2_height: u32,
    pub channel_type: ChannelType,
    pub z_index: u32,
    pub left: Option<NeighbourInfo>,
    pub above: Option<NeighbourInfo>,
    pub transquant_bypass: bool,
    pub skip: bool,
    pub pred_mode: PredMode,
    pub part_size: PartSize,
    pub bt_splits: Vec<BtSplit>,
    pub bt_split_constraint: BtSplitConstraint,
    pub parts: Vec<PredictionUnitInfo>,
    pub intra_chroma_candidate: Option<u32>,
    pub lm_chroma_mode: Option<u32>,
    pub num_lm_chroma_modes: u32,
    pub intra_dir_chroma: u32,
    pub mpi_idx: u32,
    pub pdpc_idx: u32,
    pub rot_idx: [u32; MAX_NUM_CHANNEL_TYPE],
    pub emt_cu_flag: bool,
    pub emt_tu_idx: u32,
    pub qp: i32,
    pub ref_qp: i32,
    pub chroma_qp_adj: u32,
    pub cross_component_alpha: [i32; MAX_NUM_COMPONENT],
    pub root_cbf: bool,
    pub obmc: bool,
    pub ic: bool,
    pub imv: u32,
    pub affine: bool,
    pub fruc: FrucMode,
    pub alf_ctrl: bool,
    pub pcm: bool,
    pub pcm_samples: [Vec<u32>; MAX_NUM_COMPONENT],
}

impl CodingUnitInfo {
    /// This CU as seen by a later neighbour.
    pub fn neighbour_info(&self) -> NeighbourInfo {
        NeighbourInfo {
            depth: self.depth,
            log2_width: self.log2_width,
            log2_height: self.log2_height,
            skip: self.skip,
            affine: self.affine,
            imv: self.imv != 0,
            fruc: self.fruc,
        }
    }

    /// The chroma mode as signalled, a linear-model mode taking precedence.
    pub fn chroma_intra_mode(&self) -> ChromaIntraMode {
        match (self.lm_chroma_mode, self.intra_chroma_candidate) {
            (Some(mode), _) => ChromaIntraMode::Lm(mode),
            (None, Some(candidate)) => ChromaIntraMode::Candidate(candidate),
            (None, None) => ChromaIntraMode::Derived,
        }
    }

    fn part(&self, part: usize) -> &PredictionUnitInfo {
        self.parts.get(part).unwrap_or(&EMPTY_PREDICTION_UNIT)
    }
}

impl CodingUnitSource for CodingUnitInfo {
    fn depth(&self) -> u32 {
        self.depth
    }

    fn log2_width(&self) -> u32 {
        self.log2_width
    }

    fn log2_height(&self) -> u32 {
        self.log2_height
    }

    fn channel_type(&self) -> ChannelType {
        self.channel_type
    }

    fn z_index(&self) -> u32 {
        self.z_index
    }

    fn left(&self) -> Option<&NeighbourInfo> {
        self.left.as_ref()
    }

    fn above(&self) -> Option<&NeighbourInfo> {
        self.above.as_ref()
    }

    fn transquant_bypass(&self) -> bool {
        self.transquant_bypass
    }

    fn skip(&self) -> bool {
        self.skip
    }

    fn pred_mode(&self) -> PredMode {
        self.pred_mode
    }

    fn part_size(&self) -> PartSize {
        self.part_size
    }

    fn bt_split(&self, bt_depth: u32) -> BtSplit {
        self.bt_splits.get(bt_depth as usize).copied().unwrap_or_default()
    }

    fn bt_split_constraint(&self) -> BtSplitConstraint {
        self.bt_split_constraint
    }

    fn merge_flag(&self, part: usize) -> bool {
        self.part(part).merge_flag
    }

    fn merge_index(&self, part: usize) -> u32 {
        self.part(part).merge_index
    }

    fn inter_dir(&self, part: usize) -> InterDir {
        self.part(part).inter_dir
    }

    fn ref_idx(&self, part: usize, list: RefPicList) -> u32 {
        self.part(part).ref_idx[list as usize]
    }

    fn mvd(&self, part: usize, list: RefPicList) -> Mv {
        self.part(part).mvd[list as usize]
    }

    fn mvp_idx(&self, part: usize, list: RefPicList) -> u32 {
        self.part(part).mvp_idx[list as usize]
    }

    fn intra_dir_luma(&self, part: usize) -> u32 {
        self.part(part).intra_dir_luma
    }

    fn intra_mpm_candidates(&self, part: usize) -> &[u32] {
        &self.part(part).intra_mpm_candidates
    }

    fn intra_chroma_candidate(&self) -> Option<u32> {
        self.intra_chroma_candidate
    }

    fn lm_chroma_mode(&self) -> Option<u32> {
        self.lm_chroma_mode
    }

    fn num_lm_chroma_modes(&self) -> u32 {
        self.num_lm_chroma_modes
    }

    fn intra_dir_chroma(&self) -> u32 {
        self.intra_dir_chroma
    }

    fn mpi_idx(&self) -> u32 {
        self.mpi_idx
    }

    fn pdpc_idx(&self) -> u32 {
        self.pdpc_idx
    }

    fn rot_idx(&self, channel_type: ChannelType) -> u32 {
        self.rot_idx[channel_type as usize]
    }

    fn emt_cu_flag(&self) -> bool {
        self.emt_cu_flag
    }

    fn emt_tu_idx(&self) -> u32 {
        self.emt_tu_idx
    }

    fn qp(&self) -> i32 {
        self.qp
    }

    fn ref_qp(&self) -> i32 {
        self.ref_qp
    }

    fn chroma_qp_adj(&self) -> u32 {
        self.chroma_qp_adj
    }

    fn cross_component_alpha(&self, component: ComponentId) -> i32 {
        self.cross_component_alpha[component as usize]
    }

    fn root_cbf(&self) -> bool {
        self.root_cbf
    }

    fn obmc_flag(&self) -> bool {
        self.obmc
    }

    fn ic_flag(&self) -> bool {
        self.ic
    }

    fn imv(&self) -> u32 {
        self.imv
    }

    fn affine_flag(&self) -> bool {
        self.affine
    }

    fn fruc_mode(&self) -> FrucMode {
        self.fruc
    }

    fn alf_ctrl_flag(&self) -> bool {
        self.alf_ctrl
    }

    fn pcm_flag(&self) -> bool {
        self.pcm
    }

    fn pcm_samples(&self, component: ComponentId) -> &[u32] {
        &self.pcm_samples[component as usize]
    }
}

pub(crate) fn count_neighbours<C, F>(cu: &C, predicate: F) -> usize
where
    C: CodingUnitSource + ?Sized,
    F: Fn(&NeighbourInfo) -> bool,
{
    [cu.left(), cu.above()].into_iter().flatten().filter(|neighbour| predicate(*neighbour)).count()
}

pub(crate) fn split_flag_ctx<C: CodingUnitSource + ?Sized>(cu: &C, depth: u32) -> usize {
    count_neighbours(cu, |neighbour| neighbour.depth > depth)
}

pub(crate) fn bt_split_ctx<C: CodingUnitSource + ?Sized>(
    cu: &C,
    log2_ctu_size: u32,
    log2_width: u32,
    log2_height: u32,
) -> usize {
    let current = 2 * log2_ctu_size - log2_width - log2_height;
    count_neighbours(cu, |neighbour| 2 * log2_ctu_size - neighbour.log2_width - neighbour.log2_height > current)
}

/// Context of the BT direction bin: square, wide or tall node.
pub(crate) fn bt_direction_ctx(log2_width: u32, log2_height: u32) -> usize {
    let shape = match log2_width.cmp(&log2_height) {
        std::cmp::Ordering::Equal => 0,
        std::cmp::Ordering::Greater => 1,
        std::cmp::Ordering::Less => 2,
    };
    NUM_SPLIT_FLAG_CTX + shape
}

/// Binary-tree depth of a node of the given size inside the quadtree leaf at `depth`.
pub(crate) fn bt_depth(log2_ctu_size: u32, depth: u32, log2_width: u32, log2_height: u32) -> u32 {
    2 * (log2_ctu_size - depth) - log2_width - log2_height
}

/// Context of merge-index bin `bin_index`; `None` for a bypass bin.
pub(crate) fn merge_idx_ctx(gen_merge: bool, bin_index: u32) -> Option<usize> {
    if gen_merge {
        Some((bin_index as usize).min(NUM_MERGE_IDX_EXT_CTX - 1))
    } else if bin_index == 0 {
        Some(0)
    } else {
        None
    }
}

/// Number of linear-model chroma modes that can be signalled for `cu`.
pub(crate) fn allowed_lm_modes<C: CodingUnitSource + ?Sized>(tools: &ToolSet, cu: &C) -> u32 {
    if tools.lm_chroma { cu.num_lm_chroma_modes() } else { 0 }
}

pub(crate) fn signalled_chroma_mode<C: CodingUnitSource + ?Sized>(cu: &C, num_lm_modes: u32) -> ChromaIntraMode {
    match (cu.lm_chroma_mode(), cu.intra_chroma_candidate()) {
        (Some(mode), _) if num_lm_modes > 0 => {
            debug_assert!(mode < num_lm_modes, "LM mode {mode} of {num_lm_modes}");
            ChromaIntraMode::Lm(mode)
        }
        (_, Some(candidate)) => ChromaIntraMode::Candidate(candidate),
        (_, None) => ChromaIntraMode::Derived,
    }
}

// The LM symbol list puts the first LM mode ahead of the regular-mode entry.
const LM_REGULAR_SYMBOL: u32 = 1;

pub(crate) fn lm_symbol(mode: ChromaIntraMode) -> u32 {
    match mode {
        ChromaIntraMode::Lm(0) => 0,
        ChromaIntraMode::Lm(index) => index + 1,
        _ => LM_REGULAR_SYMBOL,
    }
}

/// The LM mode a symbol selects, `None` for the regular-mode entry.
pub(crate) fn lm_mode_from_symbol(symbol: u32) -> Option<u32> {
    match symbol {
        0 => Some(0),
        LM_REGULAR_SYMBOL => None,
        _ => Some(symbol - 1),
    }
}

pub(crate) fn inter_dir_ctx<C: CodingUnitSource + ?Sized>(cu: &C) -> usize {
    cu.depth().min(3) as usize
}

/// Whether the bi-prediction bin of `inter_pred_idc` is present.
pub(crate) fn bi_pred_bin_present<C: CodingUnitSource + ?Sized>(tools: &ToolSet, cu: &C) -> bool {
    tools.qtbt || cu.part_size() == PartSize::Size2Nx2N || cu.log2_height() != 3
}

/// Context of an MPM-index bin for 65 angular directions, from the candidate it skips.
pub(crate) fn mpm_context(mode: u32) -> usize {
    match mode {
        0 | 1 => 1,
        2..=34 => 2,
        _ => 3,
    }
}

/// Candidates in ascending order, for mapping modes to and from the non-MPM rank.
pub(crate) fn sorted_candidates(candidates: &[u32]) -> ([u32; NUM_MOST_PROBABLE_MODES_JEM], usize) {
    let count = candidates.len().min(NUM_MOST_PROBABLE_MODES_JEM);
    let mut sorted = [0u32; NUM_MOST_PROBABLE_MODES_JEM];
    sorted[..count].copy_from_slice(&candidates[..count]);
    sorted[..count].sort_unstable();
    (sorted, count)
}

fn non_mpm_rank(mode: u32, candidates: &[u32]) -> u32 {
    let (sorted, count) = sorted_candidates(candidates);
    sorted[..count]
        .iter()
        .rev()
        .fold(mode, |rank, &candidate| if rank > candidate { rank - 1 } else { rank })
}

/// Shift from quarter-sample MVD units to the coded resolution.
pub(crate) fn mvd_shift(tools: &ToolSet, imv: u32) -> u32 {
    if !tools.imv || imv == 0 {
        0
    } else if imv == 2 {
        IMV_INTEGER_SHIFT + MULTI_PEL_MVD_BITS
    } else {
        IMV_INTEGER_SHIFT
    }
}

pub(crate) fn inter_dir_value(inter_dir: InterDir) -> u32 {
    match inter_dir {
        InterDir::L0 => 0,
        InterDir::L1 => 1,
        InterDir::Bi => 2,
    }
}

impl<E: BinEncoder> SbacEncoder<E> {
    pub fn code_cu_transquant_bypass_flag<C: CodingUnitSource + ?Sized>(&mut self, cu: &C) {
        self.encode_bin_ctx(cu.transquant_bypass() as u32, ContextGroup::TransquantBypassFlag, 0, 0);
    }

    pub fn code_skip_flag<C: CodingUnitSource + ?Sized>(&mut self, cu: &C) {
        let ctx = count_neighbours(cu, |neighbour| neighbour.skip);
        self.encode_bin_ctx(cu.skip() as u32, ContextGroup::SkipFlag, 0, ctx);
    }

    pub fn code_obmc_flag<C: CodingUnitSource + ?Sized>(&mut self, cu: &C) {
        self.encode_bin_ctx(cu.obmc_flag() as u32, ContextGroup::ObmcFlag, 0, 0);
    }

    pub fn code_ic_flag<C: CodingUnitSource + ?Sized>(&mut self, cu: &C) {
        self.encode_bin_ctx(cu.ic_flag() as u32, ContextGroup::IcFlag, 0, 0);
    }

    pub fn code_imv_flag<C: CodingUnitSource + ?Sized>(&mut self, cu: &C) {
        let ctx = count_neighbours(cu, |neighbour| neighbour.imv);
        let imv = cu.imv();
        self.encode_bin_ctx((imv != 0) as u32, ContextGroup::ImvFlag, 0, ctx);
        if imv != 0 && self.params.tools.multi_pel_mvd {
            self.encode_bin_ctx((imv > 1) as u32, ContextGroup::ImvFlag, 0, 3);
        }
    }

    pub fn code_affine_flag<C: CodingUnitSource + ?Sized>(&mut self, cu: &C) {
        let ctx = count_neighbours(cu, |neighbour| neighbour.affine);
        self.encode_bin_ctx(cu.affine_flag() as u32, ContextGroup::AffineFlag, 0, ctx);
    }

    pub fn code_merge_flag<C: CodingUnitSource + ?Sized>(&mut self, cu: &C, part: usize) {
        self.encode_bin_ctx(cu.merge_flag(part) as u32, ContextGroup::MergeFlag, 0, 0);
    }

    pub fn code_merge_index<C: CodingUnitSource + ?Sized>(&mut self, cu: &C, part: usize) {
        let merge_index = cu.merge_index(part);
        let num_candidates = self.params.slice.max_num_merge_cand;
        let gen_merge = self.params.tools.gen_merge;
        for i in 0..num_candidates.saturating_sub(1) {
            let bin = (i != merge_index) as u32;
            match merge_idx_ctx(gen_merge, i) {
                Some(ctx) => self.encode_bin_ctx(bin, ContextGroup::MergeIdx, 0, ctx),
                None => self.bin_if.encode_bin_ep(bin),
            }
            if bin == 0 {
                break;
            }
        }
        ltrace!("merge index {}", merge_index);
    }

    /// Codes `split_cu_flag` for the quadtree node at `depth`.
    pub fn code_split_flag<C: CodingUnitSource + ?Sized>(&mut self, cu: &C, depth: u32) {
        if depth == self.params.max_split_depth() {
            return;
        }
        let ctx = split_flag_ctx(cu, depth);
        self.encode_bin_ctx((cu.depth() > depth) as u32, ContextGroup::SplitFlag, 0, ctx);
    }

    /// Codes the binary-tree decision for the node of the given size: `0` no
    /// split, `10` horizontal, `11` vertical.
    ///
    /// The direction bin is dropped when a side is at the minimum size or when
    /// [`CodingUnitSource::bt_split_constraint`] leaves a single direction.
    pub fn code_bt_split_mode<C: CodingUnitSource + ?Sized>(&mut self, cu: &C, log2_width: u32, log2_height: u32) {
        let log2_ctu_size = self.params.sequence.log2_ctu_size;
        let log2_min_bt_size = self.params.log2_min_bt_size(cu.channel_type());

        let mode = cu.bt_split(bt_depth(log2_ctu_size, cu.depth(), log2_width, log2_height));
        let ctx = bt_split_ctx(cu, log2_ctu_size, log2_width, log2_height);
        self.encode_bin_ctx((mode != BtSplit::None) as u32, ContextGroup::BtSplitFlag, 0, ctx);

        if log2_width == log2_min_bt_size || log2_height == log2_min_bt_size {
            return;
        }
        match cu.bt_split_constraint() {
            BtSplitConstraint::NoHorizontal => {
                debug_assert_ne!(mode, BtSplit::Horizontal);
                return;
            }
            BtSplitConstraint::NoVertical => {
                debug_assert_ne!(mode, BtSplit::Vertical);
                return;
            }
            BtSplitConstraint::None => {}
        }
        if mode != BtSplit::None {
            let ctx = bt_direction_ctx(log2_width, log2_height);
            self.encode_bin_ctx((mode != BtSplit::Horizontal) as u32, ContextGroup::BtSplitFlag, 0, ctx);
        }
    }

    pub fn code_part_size<C: CodingUnitSource + ?Sized>(&mut self, cu: &C, depth: u32) {
        let part_size = cu.part_size();
        let max_depth = self.params.sequence.max_cu_depth;

        if cu.pred_mode() == PredMode::Intra {
            if depth == max_depth {
                self.encode_bin_ctx((part_size == PartSize::Size2Nx2N) as u32, ContextGroup::PartSize, 0, 0);
            }
            return;
        }

        let amp = self.params.sequence.amp_enabled && depth < max_depth;
        let smallest_non_8x8 = depth == max_depth && !(cu.log2_width() == 3 && cu.log2_height() == 3);
        match part_size {
            PartSize::Size2Nx2N => self.encode_bin_ctx(1, ContextGroup::PartSize, 0, 0),
            PartSize::Size2NxN | PartSize::Size2NxnU | PartSize::Size2NxnD => {
                self.encode_bin_ctx(0, ContextGroup::PartSize, 0, 0);
                self.encode_bin_ctx(1, ContextGroup::PartSize, 0, 1);
                if amp {
                    if part_size == PartSize::Size2NxN {
                        self.encode_bin_ctx(1, ContextGroup::PartSize, 0, 3);
                    } else {
                        self.encode_bin_ctx(0, ContextGroup::PartSize, 0, 3);
                        self.bin_if.encode_bin_ep((part_size == PartSize::Size2NxnD) as u32);
                    }
                }
            }
            PartSize::SizeNx2N | PartSize::SizenLx2N | PartSize::SizenRx2N => {
                self.encode_bin_ctx(0, ContextGroup::PartSize, 0, 0);
                self.encode_bin_ctx(0, ContextGroup::PartSize, 0, 1);
                if smallest_non_8x8 {
                    self.encode_bin_ctx(1, ContextGroup::PartSize, 0, 2);
                }
                if amp {
                    if part_size == PartSize::SizeNx2N {
                        self.encode_bin_ctx(1, ContextGroup::PartSize, 0, 3);
                    } else {
                        self.encode_bin_ctx(0, ContextGroup::PartSize, 0, 3);
                        self.bin_if.encode_bin_ep((part_size == PartSize::SizenRx2N) as u32);
                    }
                }
            }
            PartSize::SizeNxN => {
                if smallest_non_8x8 {
                    self.encode_bin_ctx(0, ContextGroup::PartSize, 0, 0);
                    self.encode_bin_ctx(0, ContextGroup::PartSize, 0, 1);
                    self.encode_bin_ctx(0, ContextGroup::PartSize, 0, 2);
                }
            }
        }
    }

    pub fn code_pred_mode<C: CodingUnitSource + ?Sized>(&mut self, cu: &C) {
        self.encode_bin_ctx((cu.pred_mode() == PredMode::Intra) as u32, ContextGroup::PredMode, 0, 0);
    }

    /// Codes the luma intra modes of the CU. With `is_multiple`, an NxN CU
    /// codes its four MPM flags before the four mode payloads.
    pub fn code_intra_dir_luma_ang<C: CodingUnitSource + ?Sized>(&mut self, cu: &C, is_multiple: bool) {
        let num_parts = if is_multiple && !self.params.tools.qtbt && cu.part_size() == PartSize::SizeNxN {
            4
        } else {
            1
        };

        let mut mpm_indices = [None; 4];
        for (part, mpm_index) in mpm_indices.iter_mut().enumerate().take(num_parts) {
            let mode = cu.intra_dir_luma(part);
            *mpm_index = cu.intra_mpm_candidates(part).iter().position(|&candidate| candidate == mode);
            self.encode_bin_ctx(mpm_index.is_some() as u32, ContextGroup::IntraPred, 0, 0);
        }

        let angular_65 = self.params.tools.intra_65_angular;
        for (part, mpm_index) in mpm_indices.iter().enumerate().take(num_parts) {
            let candidates = cu.intra_mpm_candidates(part);
            match *mpm_index {
                Some(index) if angular_65 => {
                    for bin_index in 0..NUM_MOST_PROBABLE_MODES_JEM - 1 {
                        let bin = (index > bin_index) as u32;
                        if bin_index < 3 {
                            let ctx = mpm_context(candidates[bin_index]);
                            self.encode_bin_ctx(bin, ContextGroup::IntraPred, 0, ctx);
                        } else {
                            self.bin_if.encode_bin_ep(bin);
                        }
                        if bin == 0 {
                            break;
                        }
                    }
                }
                Some(index) => {
                    self.bin_if.encode_bin_ep((index > 0) as u32);
                    if index > 0 {
                        self.bin_if.encode_bin_ep(index as u32 - 1);
                    }
                }
                None => {
                    let rank = non_mpm_rank(cu.intra_dir_luma(part), candidates);
                    if angular_65 {
                        let selected = rank % 4 == 0;
                        self.encode_bin_ctx(selected as u32, ContextGroup::IntraPred, 0, INTRA_SELECTED_MODE_CTX);
                        if selected {
                            self.bin_if.encode_bins_ep(rank >> 2, 4);
                        } else {
                            write_trunc_bin_code(&mut self.bin_if, rank - (rank >> 2) - 1, 45);
                        }
                    } else {
                        self.bin_if.encode_bins_ep(rank, 5);
                    }
                }
            }
        }
    }

    /// Codes the chroma intra mode: `0` for the derived mode, otherwise `1`
    /// followed by the linear-model symbol (when the CU allows LM modes) and,
    /// for a regular candidate, its two-bit index.
    pub fn code_intra_dir_chroma<C: CodingUnitSource + ?Sized>(&mut self, cu: &C) {
        let num_lm_modes = allowed_lm_modes(&self.params.tools, cu);
        let mode = signalled_chroma_mode(cu, num_lm_modes);
        if mode == ChromaIntraMode::Derived {
            self.encode_bin_ctx(0, ContextGroup::ChromaPred, 0, 0);
            return;
        }

        self.encode_bin_ctx(1, ContextGroup::ChromaPred, 0, 0);
        if num_lm_modes > 0 {
            let symbol = lm_symbol(mode);
            let models = &mut self.contexts.group_mut(ContextGroup::ChromaPred)[1..];
            write_unary_max_symbol(&mut self.bin_if, models, symbol, 1, num_lm_modes);
        }
        if let ChromaIntraMode::Candidate(candidate) = mode {
            self.bin_if.encode_bins_ep(candidate, NUM_CHROMA_CANDIDATE_BITS);
        }
    }

    pub fn code_inter_dir<C: CodingUnitSource + ?Sized>(&mut self, cu: &C, part: usize) {
        let value = inter_dir_value(cu.inter_dir(part));
        if bi_pred_bin_present(&self.params.tools, cu) {
            let ctx = inter_dir_ctx(cu);
            self.encode_bin_ctx((value == 2) as u32, ContextGroup::InterDir, 0, ctx);
        }
        if value < 2 {
            self.encode_bin_ctx(value, ContextGroup::InterDir, 0, 4);
        }
    }

    pub fn code_ref_frm_idx<C: CodingUnitSource + ?Sized>(&mut self, cu: &C, part: usize, list: RefPicList) {
        let num_ref = self.params.slice.num_ref_idx[list as usize];
        if num_ref <= 1 {
            return;
        }

        let ref_idx = cu.ref_idx(part, list);
        self.encode_bin_ctx((ref_idx != 0) as u32, ContextGroup::RefPic, 0, 0);
        if ref_idx == 0 {
            return;
        }
        for i in 0..num_ref - 2 {
            let bin = (i != ref_idx - 1) as u32;
            if i == 0 {
                self.encode_bin_ctx(bin, ContextGroup::RefPic, 0, 1);
            } else {
                self.bin_if.encode_bin_ep(bin);
            }
            if bin == 0 {
                break;
            }
        }
    }

    pub fn code_mvd<C: CodingUnitSource + ?Sized>(&mut self, cu: &C, part: usize, list: RefPicList) {
        if self.params.slice.mvd_l1_zero && list == RefPicList::L1 && cu.inter_dir(part) == InterDir::Bi {
            return;
        }

        let shift = mvd_shift(&self.params.tools, cu.imv());
        let mvd = cu.mvd(part, list);
        debug_assert!(mvd.hor % (1 << shift) == 0 && mvd.ver % (1 << shift) == 0);
        let components = [mvd.hor >> shift, mvd.ver >> shift];

        for value in components {
            self.encode_bin_ctx((value != 0) as u32, ContextGroup::Mvd, 0, 0);
        }
        for value in components {
            if value != 0 {
                self.encode_bin_ctx((value.unsigned_abs() > 1) as u32, ContextGroup::Mvd, 0, 1);
            }
        }
        for value in components {
            if value != 0 {
                let abs = value.unsigned_abs();
                if abs > 1 {
                    write_ep_ex_golomb(&mut self.bin_if, abs - 2, 1);
                }
                self.bin_if.encode_bin_ep((value < 0) as u32);
            }
        }
    }

    pub fn code_mvp_idx<C: CodingUnitSource + ?Sized>(&mut self, cu: &C, part: usize, list: RefPicList) {
        let symbol = cu.mvp_idx(part, list);
        let models = self.contexts.group_mut(ContextGroup::MvpIdx);
        write_unary_max_symbol(&mut self.bin_if, models, symbol, 1, AMVP_MAX_NUM_CANDS - 1);
    }

    /// Codes `pcm_flag` and, when set, the raw samples of every component.
    pub fn code_ipcm_info<C: CodingUnitSource + ?Sized>(&mut self, cu: &C) {
        let pcm = cu.pcm_flag();
        self.bin_if.encode_bin_trm(pcm as u32);
        if !pcm {
            return;
        }

        self.bin_if.encode_pcm_align_bits();
        let sequence = &self.params.sequence;
        let chroma_format = sequence.chroma_format;
        for component in ComponentId::ALL.into_iter().take(chroma_format.component_count()) {
            let (shift_x, shift_y) = chroma_format.scale_shift(component);
            let num_samples = ((1usize << cu.log2_width()) >> shift_x) * ((1usize << cu.log2_height()) >> shift_y);
            let bit_depth = sequence.pcm_bit_depth[component.channel_type() as usize];
            let samples = cu.pcm_samples(component);
            debug_assert_eq!(samples.len(), num_samples, "PCM samples of {component:?}");
            for &sample in samples.iter().take(num_samples) {
                self.bin_if.write_pcm_code(sample, bit_depth);
            }
        }
        ldebug!("pcm block written, restarting the engine");
        self.bin_if.reset_bac();
    }
}
