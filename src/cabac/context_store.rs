//! The context-model arena.
//!
//! Every syntax-element group owns a fixed slice of one flat array whose size
//! is known at compile time. A group is addressed by `(set, index)`, where the
//! set is usually the channel type.

use crate::SliceType;
use crate::cabac::context_model::ContextModel;
use crate::cabac::context_tables::*;
use crate::cabac::tables::PROBABILITY_LPS;
use crate::constants::*;
use crate::error::CabacError;
use num_enum::{IntoPrimitive, TryFromPrimitive};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, IntoPrimitive, TryFromPrimitive)]
#[repr(u8)]
pub enum ContextGroup {
    SplitFlag,
    BtSplitFlag,
    SkipFlag,
    MergeFlag,
    MergeIdx,
    PartSize,
    PredMode,
    IntraPred,
    ChromaPred,
    DeltaQp,
    InterDir,
    RefPic,
    Mvd,
    QtCbf,
    TransSubdivFlag,
    QtRootCbf,
    SigCoeffGroup,
    SigFlag,
    LastX,
    LastY,
    OneFlag,
    AbsFlag,
    MvpIdx,
    SaoMergeFlag,
    SaoTypeIdx,
    TransformSkipFlag,
    TransquantBypassFlag,
    RdpcmFlag,
    RdpcmDir,
    CrossComponentPrediction,
    ChromaQpAdjFlag,
    ChromaQpAdjIdc,
    ObmcFlag,
    ImvFlag,
    IcFlag,
    AffineFlag,
    EmtTuIdx,
    EmtCuFlag,
    RotIdx,
    FrucMrgMode,
    FrucMe,
    MpiIdx,
    PdpcIdx,
    KltFlag,
    AlfCtrlFlag,
    AlfFlag,
    AlfUvlc,
    AlfSvlc,
}

pub const NUM_CONTEXT_GROUPS: usize = 48;

impl ContextGroup {
    pub const ALL: [ContextGroup; NUM_CONTEXT_GROUPS] = [
        ContextGroup::SplitFlag,
        ContextGroup::BtSplitFlag,
        ContextGroup::SkipFlag,
        ContextGroup::MergeFlag,
        ContextGroup::MergeIdx,
        ContextGroup::PartSize,
        ContextGroup::PredMode,
        ContextGroup::IntraPred,
        ContextGroup::ChromaPred,
        ContextGroup::DeltaQp,
        ContextGroup::InterDir,
        ContextGroup::RefPic,
        ContextGroup::Mvd,
        ContextGroup::QtCbf,
        ContextGroup::TransSubdivFlag,
        ContextGroup::QtRootCbf,
        ContextGroup::SigCoeffGroup,
        ContextGroup::SigFlag,
        ContextGroup::LastX,
        ContextGroup::LastY,
        ContextGroup::OneFlag,
        ContextGroup::AbsFlag,
        ContextGroup::MvpIdx,
        ContextGroup::SaoMergeFlag,
        ContextGroup::SaoTypeIdx,
        ContextGroup::TransformSkipFlag,
        ContextGroup::TransquantBypassFlag,
        ContextGroup::RdpcmFlag,
        ContextGroup::RdpcmDir,
        ContextGroup::CrossComponentPrediction,
        ContextGroup::ChromaQpAdjFlag,
        ContextGroup::ChromaQpAdjIdc,
        ContextGroup::ObmcFlag,
        ContextGroup::ImvFlag,
        ContextGroup::IcFlag,
        ContextGroup::AffineFlag,
        ContextGroup::EmtTuIdx,
        ContextGroup::EmtCuFlag,
        ContextGroup::RotIdx,
        ContextGroup::FrucMrgMode,
        ContextGroup::FrucMe,
        ContextGroup::MpiIdx,
        ContextGroup::PdpcIdx,
        ContextGroup::KltFlag,
        ContextGroup::AlfCtrlFlag,
        ContextGroup::AlfFlag,
        ContextGroup::AlfUvlc,
        ContextGroup::AlfSvlc,
    ];

    /// `(number of sets, contexts per set)`.
    pub const fn shape(self) -> (usize, usize) {
        match self {
            ContextGroup::SplitFlag => (1, NUM_SPLIT_FLAG_CTX),
            ContextGroup::BtSplitFlag => (1, NUM_BT_SPLIT_MODE_CTX),
            ContextGroup::SkipFlag => (1, NUM_SKIP_FLAG_CTX),
            ContextGroup::MergeFlag => (1, NUM_MERGE_FLAG_EXT_CTX),
            ContextGroup::MergeIdx => (1, NUM_MERGE_IDX_EXT_CTX),
            ContextGroup::PartSize => (1, NUM_PART_SIZE_CTX),
            ContextGroup::PredMode => (1, NUM_PRED_MODE_CTX),
            ContextGroup::IntraPred => (1, NUM_INTRA_PREDICT_CTX),
            ContextGroup::ChromaPred => (1, NUM_CHROMA_PRED_CTX),
            ContextGroup::DeltaQp => (1, NUM_DELTA_QP_CTX),
            ContextGroup::InterDir => (1, NUM_INTER_DIR_CTX),
            ContextGroup::RefPic => (1, NUM_REF_NO_CTX),
            ContextGroup::Mvd => (1, NUM_MV_RES_CTX),
            ContextGroup::QtCbf => (NUM_QT_CBF_CTX_SETS, NUM_QT_CBF_CTX_PER_SET),
            ContextGroup::TransSubdivFlag => (1, NUM_TRANS_SUBDIV_FLAG_CTX),
            ContextGroup::QtRootCbf => (1, NUM_QT_ROOT_CBF_CTX),
            ContextGroup::SigCoeffGroup => (MAX_NUM_CHANNEL_TYPE, NUM_SIG_CG_FLAG_CTX),
            ContextGroup::SigFlag => (1, NUM_SIG_FLAG_CTX),
            ContextGroup::LastX | ContextGroup::LastY => (MAX_NUM_CHANNEL_TYPE, NUM_CTX_LAST_FLAG_XY),
            ContextGroup::OneFlag => (1, NUM_ONE_FLAG_CTX),
            ContextGroup::AbsFlag => (1, NUM_ABS_FLAG_CTX),
            ContextGroup::MvpIdx => (1, NUM_MVP_IDX_CTX),
            ContextGroup::SaoMergeFlag => (1, NUM_SAO_MERGE_FLAG_CTX),
            ContextGroup::SaoTypeIdx => (1, NUM_SAO_TYPE_IDX_CTX),
            ContextGroup::TransformSkipFlag => (MAX_NUM_CHANNEL_TYPE, NUM_TRANSFORM_SKIP_FLAG_CTX),
            ContextGroup::TransquantBypassFlag => (1, NUM_CU_TRANSQUANT_BYPASS_FLAG_CTX),
            ContextGroup::RdpcmFlag => (MAX_NUM_CHANNEL_TYPE, NUM_EXPLICIT_RDPCM_FLAG_CTX),
            ContextGroup::RdpcmDir => (MAX_NUM_CHANNEL_TYPE, NUM_EXPLICIT_RDPCM_DIR_CTX),
            ContextGroup::CrossComponentPrediction => (1, NUM_CROSS_COMPONENT_PREDICTION_CTX),
            ContextGroup::ChromaQpAdjFlag => (1, NUM_CHROMA_QP_ADJ_FLAG_CTX),
            ContextGroup::ChromaQpAdjIdc => (1, NUM_CHROMA_QP_ADJ_IDC_CTX),
            ContextGroup::ObmcFlag => (1, NUM_OBMC_FLAG_CTX),
            ContextGroup::ImvFlag => (1, NUM_IMV_FLAG_CTX),
            ContextGroup::IcFlag => (1, NUM_IC_FLAG_CTX),
            ContextGroup::AffineFlag => (1, NUM_AFFINE_FLAG_CTX),
            ContextGroup::EmtTuIdx => (1, NUM_EMT_TU_IDX_CTX),
            ContextGroup::EmtCuFlag => (1, NUM_EMT_CU_FLAG_CTX),
            ContextGroup::RotIdx => (1, NUM_ROT_TR_CTX),
            ContextGroup::FrucMrgMode => (1, NUM_FRUC_MRG_MODE_CTX),
            ContextGroup::FrucMe => (1, NUM_FRUC_ME_CTX),
            ContextGroup::MpiIdx => (1, NUM_MPI_CTX),
            ContextGroup::PdpcIdx => (1, NUM_PDPC_CTX),
            ContextGroup::KltFlag => (MAX_NUM_CHANNEL_TYPE, NUM_KLT_FLAG_CTX),
            ContextGroup::AlfCtrlFlag => (1, NUM_ALF_CTRL_FLAG_CTX),
            ContextGroup::AlfFlag => (1, NUM_ALF_FLAG_CTX),
            ContextGroup::AlfUvlc => (1, NUM_ALF_UVLC_CTX),
            ContextGroup::AlfSvlc => (1, NUM_ALF_SVLC_CTX),
        }
    }

    pub const fn len(self) -> usize {
        let (sets, per_set) = self.shape();
        sets * per_set
    }

    pub const fn offset(self) -> usize {
        GROUP_OFFSETS[self as usize]
    }

    pub fn name(self) -> &'static str {
        match self {
            ContextGroup::SplitFlag => "split_flag",
            ContextGroup::BtSplitFlag => "bt_split_flag",
            ContextGroup::SkipFlag => "skip_flag",
            ContextGroup::MergeFlag => "merge_flag",
            ContextGroup::MergeIdx => "merge_idx",
            ContextGroup::PartSize => "part_size",
            ContextGroup::PredMode => "pred_mode",
            ContextGroup::IntraPred => "intra_pred",
            ContextGroup::ChromaPred => "chroma_pred",
            ContextGroup::DeltaQp => "delta_qp",
            ContextGroup::InterDir => "inter_dir",
            ContextGroup::RefPic => "ref_pic",
            ContextGroup::Mvd => "mvd",
            ContextGroup::QtCbf => "qt_cbf",
            ContextGroup::TransSubdivFlag => "trans_subdiv_flag",
            ContextGroup::QtRootCbf => "qt_root_cbf",
            ContextGroup::SigCoeffGroup => "sig_coeff_group",
            ContextGroup::SigFlag => "sig_flag",
            ContextGroup::LastX => "last_x",
            ContextGroup::LastY => "last_y",
            ContextGroup::OneFlag => "one_flag",
            ContextGroup::AbsFlag => "abs_flag",
            ContextGroup::MvpIdx => "mvp_idx",
            ContextGroup::SaoMergeFlag => "sao_merge_flag",
            ContextGroup::SaoTypeIdx => "sao_type_idx",
            ContextGroup::TransformSkipFlag => "transform_skip_flag",
            ContextGroup::TransquantBypassFlag => "transquant_bypass_flag",
            ContextGroup::RdpcmFlag => "rdpcm_flag",
            ContextGroup::RdpcmDir => "rdpcm_dir",
            ContextGroup::CrossComponentPrediction => "cross_component_prediction",
            ContextGroup::ChromaQpAdjFlag => "chroma_qp_adj_flag",
            ContextGroup::ChromaQpAdjIdc => "chroma_qp_adj_idc",
            ContextGroup::ObmcFlag => "obmc_flag",
            ContextGroup::ImvFlag => "imv_flag",
            ContextGroup::IcFlag => "ic_flag",
            ContextGroup::AffineFlag => "affine_flag",
            ContextGroup::EmtTuIdx => "emt_tu_idx",
            ContextGroup::EmtCuFlag => "emt_cu_flag",
            ContextGroup::RotIdx => "rot_idx",
            ContextGroup::FrucMrgMode => "fruc_mrg_mode",
            ContextGroup::FrucMe => "fruc_me",
            ContextGroup::MpiIdx => "mpi_idx",
            ContextGroup::PdpcIdx => "pdpc_idx",
            ContextGroup::KltFlag => "klt_flag",
            ContextGroup::AlfCtrlFlag => "alf_ctrl_flag",
            ContextGroup::AlfFlag => "alf_flag",
            ContextGroup::AlfUvlc => "alf_uvlc",
            ContextGroup::AlfSvlc => "alf_svlc",
        }
    }

    pub fn from_name(name: &str) -> Result<ContextGroup, CabacError> {
        ContextGroup::ALL
            .into_iter()
            .find(|group| group.name() == name)
            .ok_or_else(|| CabacError::UnknownContextGroup(name.to_string()))
    }

    /// Resolves a group given by name or by its numeric id.
    pub fn parse(token: &str) -> Result<ContextGroup, CabacError> {
        match token.parse::<u8>() {
            Ok(id) => Ok(ContextGroup::try_from(id)?),
            Err(_) => ContextGroup::from_name(token),
        }
    }

    /// Groups that only the JEM coding tools use.
    pub fn requires_jem(self) -> bool {
        (self as usize) >= ContextGroup::ObmcFlag as usize || self == ContextGroup::BtSplitFlag
    }

    /// Initialization values of all sets of this group for one slice type.
    pub fn init_values(self, slice_type: SliceType) -> &'static [u8] {
        let row = slice_type as usize;
        match self {
            ContextGroup::SplitFlag => &INIT_SPLIT_FLAG[row],
            ContextGroup::BtSplitFlag => &INIT_BT_SPLIT_FLAG[row],
            ContextGroup::SkipFlag => &INIT_SKIP_FLAG[row],
            ContextGroup::MergeFlag => &INIT_MERGE_FLAG_EXT[row],
            ContextGroup::MergeIdx => &INIT_MERGE_IDX_EXT[row],
            ContextGroup::PartSize => &INIT_PART_SIZE[row],
            ContextGroup::PredMode => &INIT_PRED_MODE[row],
            ContextGroup::IntraPred => &INIT_INTRA_PRED_MODE[row],
            ContextGroup::ChromaPred => &INIT_CHROMA_PRED_MODE[row],
            ContextGroup::DeltaQp => &INIT_DQP[row],
            ContextGroup::InterDir => &INIT_INTER_DIR[row],
            ContextGroup::RefPic => &INIT_REF_PIC[row],
            ContextGroup::Mvd => &INIT_MVD[row],
            ContextGroup::QtCbf => &INIT_QT_CBF[row],
            ContextGroup::TransSubdivFlag => &INIT_TRANS_SUBDIV_FLAG[row],
            ContextGroup::QtRootCbf => &INIT_QT_ROOT_CBF[row],
            ContextGroup::SigCoeffGroup => &INIT_SIG_CG_FLAG[row],
            ContextGroup::SigFlag => &INIT_SIG_FLAG[row],
            ContextGroup::LastX | ContextGroup::LastY => &INIT_LAST[row],
            ContextGroup::OneFlag => &INIT_ONE_FLAG[row],
            ContextGroup::AbsFlag => &INIT_ABS_FLAG[row],
            ContextGroup::MvpIdx => &INIT_MVP_IDX[row],
            ContextGroup::SaoMergeFlag => &INIT_SAO_MERGE_FLAG[row],
            ContextGroup::SaoTypeIdx => &INIT_SAO_TYPE_IDX[row],
            ContextGroup::TransformSkipFlag => &INIT_TRANSFORM_SKIP_FLAG[row],
            ContextGroup::TransquantBypassFlag => &INIT_CU_TRANSQUANT_BYPASS_FLAG[row],
            ContextGroup::RdpcmFlag => &INIT_EXPLICIT_RDPCM_FLAG[row],
            ContextGroup::RdpcmDir => &INIT_EXPLICIT_RDPCM_DIR[row],
            ContextGroup::CrossComponentPrediction => &INIT_CROSS_COMPONENT_PREDICTION[row],
            ContextGroup::ChromaQpAdjFlag => &INIT_CHROMA_QP_ADJ_FLAG[row],
            ContextGroup::ChromaQpAdjIdc => &INIT_CHROMA_QP_ADJ_IDC[row],
            ContextGroup::ObmcFlag => &INIT_OBMC_FLAG[row],
            ContextGroup::ImvFlag => &INIT_IMV_FLAG[row],
            ContextGroup::IcFlag => &INIT_IC_FLAG[row],
            ContextGroup::AffineFlag => &INIT_AFFINE_FLAG[row],
            ContextGroup::EmtTuIdx => &INIT_EMT_TU_IDX[row],
            ContextGroup::EmtCuFlag => &INIT_EMT_CU_FLAG[row],
            ContextGroup::RotIdx => &INIT_ROT_TR_IDX[row],
            ContextGroup::FrucMrgMode => &INIT_FRUC_MRG_MODE[row],
            ContextGroup::FrucMe => &INIT_FRUC_ME[row],
            ContextGroup::MpiIdx => &INIT_MPI_IDX[row],
            ContextGroup::PdpcIdx => &INIT_PDPC_IDX[row],
            ContextGroup::KltFlag => &INIT_KLT_FLAG[row],
            ContextGroup::AlfCtrlFlag => &INIT_ALF_CTRL_FLAG[row],
            ContextGroup::AlfFlag => &INIT_ALF_FLAG[row],
            ContextGroup::AlfUvlc => &INIT_ALF_UVLC[row],
            ContextGroup::AlfSvlc => &INIT_ALF_SVLC[row],
        }
    }
}

const GROUP_OFFSETS: [usize; NUM_CONTEXT_GROUPS + 1] = {
    let mut offsets = [0usize; NUM_CONTEXT_GROUPS + 1];
    let mut i = 0;
    while i < NUM_CONTEXT_GROUPS {
        offsets[i + 1] = offsets[i] + ContextGroup::ALL[i].len();
        i += 1;
    }
    offsets
};

/// Total number of context models held by one coder instance.
pub const TOTAL_CONTEXTS: usize = GROUP_OFFSETS[NUM_CONTEXT_GROUPS];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContextStore {
    models: [ContextModel; TOTAL_CONTEXTS],
}

impl Default for ContextStore {
    fn default() -> Self {
        Self {
            models: [ContextModel::default(); TOTAL_CONTEXTS],
        }
    }
}

impl ContextStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, group: ContextGroup, set: usize, index: usize) -> &ContextModel {
        &self.models[Self::position(group, set, index)]
    }

    pub fn get_mut(&mut self, group: ContextGroup, set: usize, index: usize) -> &mut ContextModel {
        &mut self.models[Self::position(group, set, index)]
    }

    pub fn group(&self, group: ContextGroup) -> &[ContextModel] {
        &self.models[group.offset()..group.offset() + group.len()]
    }

    pub fn group_mut(&mut self, group: ContextGroup) -> &mut [ContextModel] {
        &mut self.models[group.offset()..group.offset() + group.len()]
    }

    fn position(group: ContextGroup, set: usize, index: usize) -> usize {
        let (sets, per_set) = group.shape();
        debug_assert!(set < sets, "set {set} out of range for {}", group.name());
        debug_assert!(index < per_set, "context {index} out of range for {}", group.name());
        group.offset() + set * per_set + index
    }

    /// Checked lookup by flat index within a group, for externally supplied indices.
    pub fn checked_index(group: ContextGroup, index: usize) -> Result<usize, CabacError> {
        if index < group.len() {
            Ok(group.offset() + index)
        } else {
            Err(CabacError::ContextIndexOutOfRange {
                group: group.name(),
                index,
            })
        }
    }

    pub fn model_at_mut(&mut self, flat_index: usize) -> &mut ContextModel {
        &mut self.models[flat_index]
    }

    pub fn init_group(&mut self, group: ContextGroup, slice_type: SliceType, qp: i32) {
        let values = group.init_values(slice_type);
        debug_assert_eq!(values.len(), group.len());
        for (model, &value) in self.group_mut(group).iter_mut().zip(values) {
            model.init(qp, value);
        }
    }

    pub fn init_all(&mut self, slice_type: SliceType, qp: i32) {
        for group in ContextGroup::ALL {
            self.init_group(group, slice_type, qp);
        }
    }

    /// Assigns one adaptation window size per context, in arena order.
    pub fn set_window_sizes(&mut self, sizes: &[u8]) -> Result<(), CabacError> {
        if sizes.len() != TOTAL_CONTEXTS {
            return Err(CabacError::WindowSizeCount {
                expected: TOTAL_CONTEXTS,
                actual: sizes.len(),
            });
        }
        for (model, &size) in self.models.iter_mut().zip(sizes) {
            model.set_window_size(size);
        }
        Ok(())
    }

    /// Estimated cost, in fractional bits, of coding the adapted statistics
    /// of `group` with the states that `slice_type` at `qp` would initialize.
    ///
    /// Only contexts that coded at least one bin since their last
    /// initialization contribute.
    pub fn group_cost(&self, group: ContextGroup, slice_type: SliceType, qp: i32) -> u32 {
        let values = group.init_values(slice_type);
        let mut cost = 0u32;
        for (model, &value) in self.group(group).iter().zip(values) {
            if !model.bins_coded() {
                continue;
            }
            let candidate = ContextModel::with_init(qp, value);

            let probability_lps = PROBABILITY_LPS[model.state() as usize];
            let (probability_zero, probability_one) = if model.mps() == 1 {
                (probability_lps, 1.0 - probability_lps)
            } else {
                (1.0 - probability_lps, probability_lps)
            };

            let bits = probability_zero * candidate.entropy_bits(0) as f64
                + probability_one * candidate.entropy_bits(1) as f64;
            cost += bits as u32;
        }
        cost
    }

    pub fn cost(&self, slice_type: SliceType, qp: i32) -> u32 {
        ContextGroup::ALL
            .into_iter()
            .map(|group| self.group_cost(group, slice_type, qp))
            .sum()
    }
}
