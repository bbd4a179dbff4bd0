//! Context initialization values (ITU-T H.265, Tables 9-5 to 9-37).
//!
//! Every table has one row per slice-type category in the order B, P, I.
//! Groups with per-channel sets store the luma set first, then the chroma set.
//! Groups that only exist with the JEM tools start equiprobable.

use crate::cabac::context_model::CNU;
use crate::constants::*;

pub static INIT_SPLIT_FLAG: [[u8; NUM_SPLIT_FLAG_CTX]; 3] = [
    [107, 139, 126],
    [107, 139, 126],
    [139, 141, 157],
];

pub static INIT_BT_SPLIT_FLAG: [[u8; NUM_BT_SPLIT_MODE_CTX]; 3] = [
    [107, 139, 126, CNU, CNU, CNU],
    [107, 139, 126, CNU, CNU, CNU],
    [139, 141, 157, CNU, CNU, CNU],
];

pub static INIT_SKIP_FLAG: [[u8; NUM_SKIP_FLAG_CTX]; 3] = [
    [197, 185, 201],
    [197, 185, 201],
    [CNU, CNU, CNU],
];

pub static INIT_MERGE_FLAG_EXT: [[u8; NUM_MERGE_FLAG_EXT_CTX]; 3] = [[154], [110], [CNU]];

pub static INIT_MERGE_IDX_EXT: [[u8; NUM_MERGE_IDX_EXT_CTX]; 3] = [
    [137, CNU, CNU, CNU, CNU],
    [122, CNU, CNU, CNU, CNU],
    [CNU, CNU, CNU, CNU, CNU],
];

pub static INIT_PART_SIZE: [[u8; NUM_PART_SIZE_CTX]; 3] = [
    [154, 139, 154, 154],
    [154, 139, 154, 154],
    [184, CNU, CNU, CNU],
];

pub static INIT_PRED_MODE: [[u8; NUM_PRED_MODE_CTX]; 3] = [[134], [149], [CNU]];

pub static INIT_INTRA_PRED_MODE: [[u8; NUM_INTRA_PREDICT_CTX]; 3] = [
    [183, CNU, CNU, CNU, CNU, CNU, CNU, CNU, CNU, CNU],
    [154, CNU, CNU, CNU, CNU, CNU, CNU, CNU, CNU, CNU],
    [184, CNU, CNU, CNU, CNU, CNU, CNU, CNU, CNU, CNU],
];

pub static INIT_CHROMA_PRED_MODE: [[u8; NUM_CHROMA_PRED_CTX]; 3] = [[152, 139, CNU], [152, 139, CNU], [63, 139, CNU]];

pub static INIT_DQP: [[u8; NUM_DELTA_QP_CTX]; 3] = [
    [154, 154, 154],
    [154, 154, 154],
    [154, 154, 154],
];

pub static INIT_INTER_DIR: [[u8; NUM_INTER_DIR_CTX]; 3] = [
    [95, 79, 63, 31, 31],
    [95, 79, 63, 31, 31],
    [CNU, CNU, CNU, CNU, CNU],
];

pub static INIT_REF_PIC: [[u8; NUM_REF_NO_CTX]; 3] = [[153, 153], [153, 153], [CNU, CNU]];

pub static INIT_MVD: [[u8; NUM_MV_RES_CTX]; 3] = [[169, 198], [140, 198], [CNU, CNU]];

pub static INIT_QT_CBF: [[u8; NUM_QT_CBF_CTX_SETS * NUM_QT_CBF_CTX_PER_SET]; 3] = [
    [153, 111, CNU, CNU, CNU, 149, 92, 167, 154, 154],
    [153, 111, CNU, CNU, CNU, 149, 107, 167, 154, 154],
    [111, 141, CNU, CNU, CNU, 94, 138, 182, 154, 154],
];

pub static INIT_TRANS_SUBDIV_FLAG: [[u8; NUM_TRANS_SUBDIV_FLAG_CTX]; 3] = [
    [224, 167, 122],
    [124, 138, 94],
    [153, 138, 138],
];

pub static INIT_QT_ROOT_CBF: [[u8; NUM_QT_ROOT_CBF_CTX]; 3] = [[79], [79], [CNU]];

pub static INIT_SIG_CG_FLAG: [[u8; MAX_NUM_CHANNEL_TYPE * NUM_SIG_CG_FLAG_CTX]; 3] = [
    [121, 140, 61, 154],
    [121, 140, 61, 154],
    [91, 171, 134, 141],
];

// Luma: 27 position contexts then the single (transform-skip) context;
// chroma: 15 position contexts then its single context.
pub static INIT_SIG_FLAG: [[u8; NUM_SIG_FLAG_CTX]; 3] = [
    [
        170, 154, 139, 153, 139, 123, 123, 63, 124, 166, 183, 140, 136, 153, 154, 166, 183, 140, 136, 153, 154, 166,
        183, 140, 136, 153, 154, 141, //
        170, 153, 138, 138, 122, 121, 122, 121, 167, 151, 183, 140, 151, 183, 140, 111,
    ],
    [
        155, 154, 139, 153, 139, 123, 123, 63, 153, 166, 183, 140, 136, 153, 154, 166, 183, 140, 136, 153, 154, 166,
        183, 140, 136, 153, 154, 140, //
        170, 153, 123, 123, 107, 121, 107, 121, 167, 151, 183, 140, 151, 183, 140, 140,
    ],
    [
        111, 111, 125, 110, 110, 94, 124, 108, 124, 107, 125, 141, 179, 153, 125, 107, 125, 141, 179, 153, 125, 107,
        125, 141, 179, 153, 125, 141, //
        140, 139, 182, 182, 152, 136, 152, 136, 153, 136, 139, 111, 136, 139, 111, 111,
    ],
];

pub static INIT_LAST: [[u8; MAX_NUM_CHANNEL_TYPE * NUM_CTX_LAST_FLAG_XY]; 3] = [
    [
        125, 110, 124, 110, 95, 94, 125, 111, 111, 79, 125, 126, 111, 111, 79, //
        108, 123, 93, CNU, CNU, CNU, CNU, CNU, CNU, CNU, CNU, CNU, CNU, CNU, CNU,
    ],
    [
        125, 110, 94, 110, 95, 79, 125, 111, 110, 78, 110, 111, 111, 95, 94, //
        108, 123, 108, CNU, CNU, CNU, CNU, CNU, CNU, CNU, CNU, CNU, CNU, CNU, CNU,
    ],
    [
        110, 110, 124, 125, 140, 153, 125, 127, 140, 109, 111, 143, 127, 111, 79, //
        108, 123, 63, CNU, CNU, CNU, CNU, CNU, CNU, CNU, CNU, CNU, CNU, CNU, CNU,
    ],
];

pub static INIT_ONE_FLAG: [[u8; NUM_ONE_FLAG_CTX]; 3] = [
    [
        154, 196, 167, 167, 154, 152, 167, 182, 182, 134, 149, 136, 153, 121, 136, 137, //
        169, 194, 166, 167, 154, 167, 137, 182,
    ],
    [
        154, 196, 196, 167, 154, 152, 167, 182, 182, 134, 149, 136, 153, 121, 136, 122, //
        169, 208, 166, 167, 154, 152, 167, 182,
    ],
    [
        140, 92, 137, 138, 140, 152, 138, 139, 153, 74, 149, 92, 139, 107, 122, 152, //
        140, 179, 166, 182, 140, 227, 122, 197,
    ],
];

pub static INIT_ABS_FLAG: [[u8; NUM_ABS_FLAG_CTX]; 3] = [
    [107, 167, 91, 107, 107, 167],
    [107, 167, 91, 122, 107, 167],
    [138, 153, 136, 167, 152, 152],
];

pub static INIT_MVP_IDX: [[u8; NUM_MVP_IDX_CTX]; 3] = [[168], [168], [CNU]];

pub static INIT_SAO_MERGE_FLAG: [[u8; NUM_SAO_MERGE_FLAG_CTX]; 3] = [[153], [153], [153]];

pub static INIT_SAO_TYPE_IDX: [[u8; NUM_SAO_TYPE_IDX_CTX]; 3] = [[160], [185], [200]];

pub static INIT_TRANSFORM_SKIP_FLAG: [[u8; MAX_NUM_CHANNEL_TYPE * NUM_TRANSFORM_SKIP_FLAG_CTX]; 3] =
    [[139, 139], [139, 139], [139, 139]];

pub static INIT_CU_TRANSQUANT_BYPASS_FLAG: [[u8; NUM_CU_TRANSQUANT_BYPASS_FLAG_CTX]; 3] = [[154], [154], [154]];

pub static INIT_EXPLICIT_RDPCM_FLAG: [[u8; MAX_NUM_CHANNEL_TYPE * NUM_EXPLICIT_RDPCM_FLAG_CTX]; 3] =
    [[139, 139], [139, 139], [CNU, CNU]];

pub static INIT_EXPLICIT_RDPCM_DIR: [[u8; MAX_NUM_CHANNEL_TYPE * NUM_EXPLICIT_RDPCM_DIR_CTX]; 3] =
    [[139, 139], [139, 139], [CNU, CNU]];

pub static INIT_CROSS_COMPONENT_PREDICTION: [[u8; NUM_CROSS_COMPONENT_PREDICTION_CTX]; 3] =
    [[CNU; NUM_CROSS_COMPONENT_PREDICTION_CTX]; 3];

pub static INIT_CHROMA_QP_ADJ_FLAG: [[u8; NUM_CHROMA_QP_ADJ_FLAG_CTX]; 3] = [[CNU], [CNU], [CNU]];

pub static INIT_CHROMA_QP_ADJ_IDC: [[u8; NUM_CHROMA_QP_ADJ_IDC_CTX]; 3] = [[CNU], [CNU], [CNU]];

pub static INIT_OBMC_FLAG: [[u8; NUM_OBMC_FLAG_CTX]; 3] = [[CNU], [CNU], [CNU]];

pub static INIT_IMV_FLAG: [[u8; NUM_IMV_FLAG_CTX]; 3] = [[CNU; NUM_IMV_FLAG_CTX]; 3];

pub static INIT_IC_FLAG: [[u8; NUM_IC_FLAG_CTX]; 3] = [[CNU], [CNU], [CNU]];

pub static INIT_AFFINE_FLAG: [[u8; NUM_AFFINE_FLAG_CTX]; 3] = [[CNU; NUM_AFFINE_FLAG_CTX]; 3];

pub static INIT_EMT_TU_IDX: [[u8; NUM_EMT_TU_IDX_CTX]; 3] = [[CNU; NUM_EMT_TU_IDX_CTX]; 3];

pub static INIT_EMT_CU_FLAG: [[u8; NUM_EMT_CU_FLAG_CTX]; 3] = [[CNU; NUM_EMT_CU_FLAG_CTX]; 3];

pub static INIT_ROT_TR_IDX: [[u8; NUM_ROT_TR_CTX]; 3] = [[CNU; NUM_ROT_TR_CTX]; 3];

pub static INIT_FRUC_MRG_MODE: [[u8; NUM_FRUC_MRG_MODE_CTX]; 3] = [
    [197, 185, 201],
    [197, 185, 201],
    [CNU, CNU, CNU],
];

pub static INIT_FRUC_ME: [[u8; NUM_FRUC_ME_CTX]; 3] = [
    [149, 134, CNU],
    [149, 134, CNU],
    [CNU, CNU, CNU],
];

pub static INIT_MPI_IDX: [[u8; NUM_MPI_CTX]; 3] = [[CNU; NUM_MPI_CTX]; 3];

pub static INIT_PDPC_IDX: [[u8; NUM_PDPC_CTX]; 3] = [[CNU; NUM_PDPC_CTX]; 3];

pub static INIT_KLT_FLAG: [[u8; MAX_NUM_CHANNEL_TYPE * NUM_KLT_FLAG_CTX]; 3] = [[CNU, CNU], [CNU, CNU], [CNU, CNU]];

// Adaptive loop filter side information
pub static INIT_ALF_CTRL_FLAG: [[u8; NUM_ALF_CTRL_FLAG_CTX]; 3] = [[102], [102], [118]];

pub static INIT_ALF_FLAG: [[u8; NUM_ALF_FLAG_CTX]; 3] = [[118], [102], [102]];

pub static INIT_ALF_UVLC: [[u8; NUM_ALF_UVLC_CTX]; 3] = [[140, 154], [154, 154], [154, 154]];

pub static INIT_ALF_SVLC: [[u8; NUM_ALF_SVLC_CTX]; 3] = [[187, 154, 159], [141, 154, 189], [141, 154, 159]];
