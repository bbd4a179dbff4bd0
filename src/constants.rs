// Context counts per syntax-element group (ITU-T H.265, 9.3.2.2 and the JEM tool extensions).
pub const NUM_SPLIT_FLAG_CTX: usize = 3;
pub const NUM_BT_SPLIT_MODE_CTX: usize = 6;
pub const NUM_SKIP_FLAG_CTX: usize = 3;
pub const NUM_MERGE_FLAG_EXT_CTX: usize = 1;
pub const NUM_MERGE_IDX_EXT_CTX: usize = 5;
pub const NUM_PART_SIZE_CTX: usize = 4;
pub const NUM_PRED_MODE_CTX: usize = 1;
pub const NUM_INTRA_PREDICT_CTX: usize = 10;
pub const NUM_CHROMA_PRED_CTX: usize = 3;
pub const NUM_DELTA_QP_CTX: usize = 3;
pub const NUM_INTER_DIR_CTX: usize = 5;
pub const NUM_REF_NO_CTX: usize = 2;
pub const NUM_MV_RES_CTX: usize = 2;
pub const NUM_QT_CBF_CTX_SETS: usize = 2;
pub const NUM_QT_CBF_CTX_PER_SET: usize = 5;
pub const NUM_TRANS_SUBDIV_FLAG_CTX: usize = 3;
pub const NUM_QT_ROOT_CBF_CTX: usize = 1;
pub const NUM_SIG_CG_FLAG_CTX: usize = 2;
pub const NUM_SIG_FLAG_CTX_LUMA: usize = 28;
pub const NUM_SIG_FLAG_CTX_CHROMA: usize = 16;
pub const NUM_SIG_FLAG_CTX: usize = NUM_SIG_FLAG_CTX_LUMA + NUM_SIG_FLAG_CTX_CHROMA;
pub const NUM_CTX_LAST_FLAG_XY: usize = 15;
pub const NUM_ONE_FLAG_CTX_PER_SET: usize = 4;
pub const NUM_ONE_FLAG_CTX_LUMA: usize = 16;
pub const NUM_ONE_FLAG_CTX_CHROMA: usize = 8;
pub const NUM_ONE_FLAG_CTX: usize = NUM_ONE_FLAG_CTX_LUMA + NUM_ONE_FLAG_CTX_CHROMA;
pub const NUM_ABS_FLAG_CTX_PER_SET: usize = 1;
pub const NUM_ABS_FLAG_CTX_LUMA: usize = 4;
pub const NUM_ABS_FLAG_CTX_CHROMA: usize = 2;
pub const NUM_ABS_FLAG_CTX: usize = NUM_ABS_FLAG_CTX_LUMA + NUM_ABS_FLAG_CTX_CHROMA;
pub const NUM_MVP_IDX_CTX: usize = 1;
pub const NUM_SAO_MERGE_FLAG_CTX: usize = 1;
pub const NUM_SAO_TYPE_IDX_CTX: usize = 1;
pub const NUM_TRANSFORM_SKIP_FLAG_CTX: usize = 1;
pub const NUM_CU_TRANSQUANT_BYPASS_FLAG_CTX: usize = 1;
pub const NUM_EXPLICIT_RDPCM_FLAG_CTX: usize = 1;
pub const NUM_EXPLICIT_RDPCM_DIR_CTX: usize = 1;
pub const NUM_CROSS_COMPONENT_PREDICTION_CTX: usize = 10;
pub const NUM_CHROMA_QP_ADJ_FLAG_CTX: usize = 1;
pub const NUM_CHROMA_QP_ADJ_IDC_CTX: usize = 1;
pub const NUM_OBMC_FLAG_CTX: usize = 1;
pub const NUM_IMV_FLAG_CTX: usize = 4;
pub const NUM_IC_FLAG_CTX: usize = 1;
pub const NUM_AFFINE_FLAG_CTX: usize = 3;
pub const NUM_EMT_TU_IDX_CTX: usize = 4;
pub const NUM_EMT_CU_FLAG_CTX: usize = 6;
pub const NUM_ROT_TR_CTX: usize = 5;
pub const NUM_FRUC_MRG_MODE_CTX: usize = 3;
pub const NUM_FRUC_ME_CTX: usize = 3;
pub const NUM_MPI_CTX: usize = 2;
pub const NUM_PDPC_CTX: usize = 2;
pub const NUM_KLT_FLAG_CTX: usize = 1;
pub const NUM_ALF_CTRL_FLAG_CTX: usize = 1;
pub const NUM_ALF_FLAG_CTX: usize = 1;
pub const NUM_ALF_UVLC_CTX: usize = 2;
pub const NUM_ALF_SVLC_CTX: usize = 3;

/// Channel-type count; context groups with per-channel sets use this as their set count.
pub const MAX_NUM_CHANNEL_TYPE: usize = 2;
pub const MAX_NUM_COMPONENT: usize = 3;

// Coefficient coding
pub const MLS_CG_LOG2_WIDTH: u32 = 2;
pub const MLS_CG_LOG2_HEIGHT: u32 = 2;
pub const MLS_CG_SIZE: u32 = MLS_CG_LOG2_WIDTH + MLS_CG_LOG2_HEIGHT;
pub const MAX_LOG2_TU_SIZE: u32 = 5;
pub const MAX_TU_SIZE: usize = 1 << MAX_LOG2_TU_SIZE;
pub const MAX_TU_COEFFS: usize = MAX_TU_SIZE * MAX_TU_SIZE;
pub const MAX_CG_COUNT: usize = MAX_TU_COEFFS >> MLS_CG_SIZE;
pub const MIN_TU_SIZE: u32 = 4;
pub const C1FLAG_NUMBER: usize = 8;
pub const SBH_THRESHOLD: i32 = 4;
pub const COEF_REMAIN_BIN_REDUCTION: u32 = 3;
pub const LAST_SIGNIFICANT_GROUPS: usize = 10;

// Golomb-Rice parameter adaptation (range extensions)
pub const GOLOMB_RICE_ADAPTATION_STATISTICS_SETS: usize = 4;
pub const GOLOMB_RICE_INCREMENT_DIVISOR: u32 = 4;
pub const MAX_RICE_PARAMETER_WITHOUT_ADAPTATION: u32 = 4;

// Significance map context selection
pub const SIG_CTX_OFFSET_4X4: usize = 0;
pub const SIG_CTX_OFFSET_8X8: usize = 9;
pub const SIG_CTX_LUMA_NXN: usize = 21;
pub const SIG_CTX_CHROMA_NXN: usize = 12;
pub const SIG_CTX_LUMA_SINGLE: usize = 27;
pub const SIG_CTX_CHROMA_SINGLE: usize = 15;
pub const NON_DIAGONAL_SCAN_8X8_LUMA_OFFSET: usize = 6;
pub const NOT_FIRST_GROUP_LUMA_OFFSET: usize = 3;

// Prediction
pub const AMVP_MAX_NUM_CANDS: u32 = 2;
pub const NUM_MOST_PROBABLE_MODES_HEVC: usize = 3;
pub const NUM_MOST_PROBABLE_MODES_JEM: usize = 6;
pub const NUM_INTRA_MODES_HEVC: u32 = 35;
pub const NUM_INTRA_MODES_JEM: u32 = 67;
pub const HOR_IDX_HEVC: u32 = 10;
pub const VER_IDX_HEVC: u32 = 26;
pub const HOR_IDX_JEM: u32 = 18;
pub const VER_IDX_JEM: u32 = 50;
// Context of the "selected mode" flag for non-MPM modes with 65 angular directions.
pub const INTRA_SELECTED_MODE_CTX: usize = 9;
pub const NUM_CHROMA_CANDIDATE_BITS: u32 = 2;
pub const PLANAR_IDX: u32 = 0;
pub const DC_IDX: u32 = 1;

// Minimum binary-tree node sizes (log2) per slice and channel type
pub const LOG2_MIN_BT_SIZE: u32 = 2;
pub const LOG2_MIN_BT_SIZE_C: u32 = 2;
pub const LOG2_MIN_BT_SIZE_INTER: u32 = 2;

// Enhanced multiple transforms: largest CU (log2) carrying the flags
pub const LOG2_EMT_INTRA_MAX_CU: u32 = 5;
pub const LOG2_EMT_INTER_MAX_CU: u32 = 5;

// Square luma transform sizes (log2) that carry a KLT flag
pub const LOG2_KLT_MIN_SIZE: u32 = 2;
pub const LOG2_KLT_MAX_SIZE: u32 = 5;

// Delta QP binarization
pub const CU_DQP_TU_CMAX: u32 = 5;
pub const CU_DQP_EG_K: u32 = 0;

// SAO
pub const MAX_SAO_TRUNCATED_BITDEPTH: u32 = 10;
pub const NUM_SAO_BO_CLASSES_LOG2: u32 = 5;
pub const NUM_SAO_EO_TYPES_LOG2: u32 = 2;
pub const NUM_SAO_OFFSETS: usize = 4;

// Motion vector resolution: quarter-sample to integer-sample shift, and the extra
// shift from integer to four-sample units
pub const IMV_INTEGER_SHIFT: u32 = 2;
pub const MULTI_PEL_MVD_BITS: u32 = 2;
