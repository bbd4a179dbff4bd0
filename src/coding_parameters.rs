use crate::constants::{LOG2_MIN_BT_SIZE, LOG2_MIN_BT_SIZE_C, LOG2_MIN_BT_SIZE_INTER};
use crate::error::CabacError;
use crate::{ChannelType, ChromaFormat, SliceType};
use std::cmp::max;

/// Optional coding tools beyond HEVC version 2.
///
/// Resolved once per coder instance. Context groups for disabled tools stay in
/// the arena but are never touched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ToolSet {
    /// Quadtree plus binary tree partitioning; replaces `part_mode` with BT split modes.
    pub qtbt: bool,
    /// 65 angular intra directions with six most probable modes.
    pub intra_65_angular: bool,
    pub obmc: bool,
    pub illumination_compensation: bool,
    /// Locally adaptive motion vector resolution.
    pub imv: bool,
    /// Adds the four-sample MVD resolution on top of `imv`.
    pub multi_pel_mvd: bool,
    pub affine: bool,
    /// Context-coded bins for every merge index bin.
    pub gen_merge: bool,
    /// Linear-model chroma prediction modes.
    pub lm_chroma: bool,
    /// Enhanced multiple transforms for intra CUs.
    pub emt_intra: bool,
    pub emt_inter: bool,
    /// Non-separable secondary transform index.
    pub nsst: bool,
    /// Frame-rate up-conversion merge modes.
    pub fruc: bool,
    /// Multi-parameter intra prediction.
    pub mpi: bool,
    /// Position-dependent intra prediction combination.
    pub pdpc: bool,
    pub klt: bool,
    /// Per-context adaptation window sizes carried over from previous slices.
    pub adaptive_window: bool,
    /// Adaptive loop filter side information.
    pub alf: bool,
    /// Geometry-transformation ALF: bypass-coded filter parameters.
    pub galf: bool,
}

impl ToolSet {
    pub const HEVC: ToolSet = ToolSet {
        qtbt: false,
        intra_65_angular: false,
        obmc: false,
        illumination_compensation: false,
        imv: false,
        multi_pel_mvd: false,
        affine: false,
        gen_merge: false,
        lm_chroma: false,
        emt_intra: false,
        emt_inter: false,
        nsst: false,
        fruc: false,
        mpi: false,
        pdpc: false,
        klt: false,
        adaptive_window: false,
        alf: false,
        galf: false,
    };

    pub const JEM: ToolSet = ToolSet {
        qtbt: true,
        intra_65_angular: true,
        obmc: true,
        illumination_compensation: true,
        imv: true,
        multi_pel_mvd: true,
        affine: true,
        gen_merge: true,
        lm_chroma: true,
        emt_intra: true,
        emt_inter: true,
        nsst: true,
        fruc: true,
        mpi: true,
        pdpc: true,
        klt: true,
        adaptive_window: true,
        alf: true,
        galf: true,
    };

    pub fn validate(&self) -> Result<(), CabacError> {
        if self.multi_pel_mvd && !self.imv {
            return Err(CabacError::InvalidToolConfiguration("multi-pel MVD requires IMV"));
        }
        if self.galf && !self.alf {
            return Err(CabacError::InvalidToolConfiguration("GALF requires ALF"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SequenceParameters {
    pub chroma_format: ChromaFormat,
    /// Bit depth per channel type.
    pub bit_depth: [u32; 2],
    pub log2_ctu_size: u32,
    /// log2 difference between the largest and smallest coding block.
    pub max_cu_depth: u32,
    pub amp_enabled: bool,
    pub log2_min_qt_size: u32,
    /// Smallest binary-tree node side in intra slices, luma tree.
    pub log2_min_bt_size_luma: u32,
    /// Smallest binary-tree node side in intra slices, separate chroma tree.
    pub log2_min_bt_size_chroma: u32,
    pub log2_min_bt_size_inter: u32,
    pub pcm_bit_depth: [u32; 2],
    pub extended_precision_processing: bool,
    pub cabac_bypass_alignment: bool,
    pub persistent_rice_adaptation: bool,
    pub transform_skip_context: bool,
    pub implicit_rdpcm: bool,
    pub explicit_rdpcm: bool,
}

impl Default for SequenceParameters {
    fn default() -> Self {
        Self {
            chroma_format: ChromaFormat::Chroma420,
            bit_depth: [8, 8],
            log2_ctu_size: 6,
            max_cu_depth: 3,
            amp_enabled: true,
            log2_min_qt_size: 3,
            log2_min_bt_size_luma: LOG2_MIN_BT_SIZE,
            log2_min_bt_size_chroma: LOG2_MIN_BT_SIZE_C,
            log2_min_bt_size_inter: LOG2_MIN_BT_SIZE_INTER,
            pcm_bit_depth: [8, 8],
            extended_precision_processing: false,
            cabac_bypass_alignment: false,
            persistent_rice_adaptation: false,
            transform_skip_context: false,
            implicit_rdpcm: false,
            explicit_rdpcm: false,
        }
    }
}

impl SequenceParameters {
    pub fn max_log2_tr_dynamic_range(&self, channel_type: ChannelType) -> u32 {
        let bit_depth = self.bit_depth[channel_type as usize];
        if self.extended_precision_processing {
            max(15, bit_depth + 6)
        } else {
            15
        }
    }

    pub fn qp_bd_offset(&self, channel_type: ChannelType) -> i32 {
        6 * (self.bit_depth[channel_type as usize] as i32 - 8)
    }

    /// Smallest binary-tree node side of a `channel_type` tree in a `slice_type` slice.
    pub fn log2_min_bt_size(&self, slice_type: SliceType, channel_type: ChannelType) -> u32 {
        match (slice_type.is_intra(), channel_type) {
            (true, ChannelType::Luma) => self.log2_min_bt_size_luma,
            (true, ChannelType::Chroma) => self.log2_min_bt_size_chroma,
            (false, _) => self.log2_min_bt_size_inter,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PictureParameters {
    pub sign_data_hiding: bool,
    pub cabac_init_present: bool,
    pub transform_skip: bool,
    pub log2_max_transform_skip_size: u32,
    pub cu_qp_delta: bool,
    pub cross_component_prediction: bool,
    pub chroma_qp_offset_list_len: u32,
}

impl Default for PictureParameters {
    fn default() -> Self {
        Self {
            sign_data_hiding: true,
            cabac_init_present: false,
            transform_skip: true,
            log2_max_transform_skip_size: 2,
            cu_qp_delta: false,
            cross_component_prediction: false,
            chroma_qp_offset_list_len: 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SliceParameters {
    pub slice_type: SliceType,
    pub qp: i32,
    /// Initialization table chosen by the encoder for this slice (`cabac_init_flag`).
    pub enc_cabac_table_idx: SliceType,
    pub max_num_merge_cand: u32,
    pub num_ref_idx: [u32; 2],
    pub mvd_l1_zero: bool,
    /// SAO enabled per channel type.
    pub sao_enabled: [bool; 2],
    /// ALF on/off flags are signalled per CU.
    pub alf_ctrl: bool,
    /// Deepest CU level with its own ALF on/off flag.
    pub alf_max_ctrl_depth: u32,
}

impl Default for SliceParameters {
    fn default() -> Self {
        Self {
            slice_type: SliceType::B,
            qp: 32,
            enc_cabac_table_idx: SliceType::B,
            max_num_merge_cand: 5,
            num_ref_idx: [2, 2],
            mvd_l1_zero: false,
            sao_enabled: [true, true],
            alf_ctrl: false,
            alf_max_ctrl_depth: 0,
        }
    }
}

/// Everything the syntax coder reads about the sequence, picture and slice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CodingParameters {
    pub tools: ToolSet,
    pub sequence: SequenceParameters,
    pub picture: PictureParameters,
    pub slice: SliceParameters,
}

impl CodingParameters {
    pub fn hevc() -> Self {
        Self::default()
    }

    pub fn jem() -> Self {
        Self {
            tools: ToolSet::JEM,
            sequence: SequenceParameters {
                log2_ctu_size: 7,
                amp_enabled: false,
                ..SequenceParameters::default()
            },
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), CabacError> {
        self.tools.validate()?;
        if self.sequence.log2_min_qt_size > self.sequence.log2_ctu_size {
            return Err(CabacError::InvalidToolConfiguration("minimum QT size exceeds the CTU size"));
        }
        Ok(())
    }

    /// Deepest quadtree depth at which a split flag is still coded.
    pub fn max_split_depth(&self) -> u32 {
        if self.tools.qtbt {
            self.sequence.log2_ctu_size - self.sequence.log2_min_qt_size
        } else {
            self.sequence.max_cu_depth
        }
    }

    /// Smallest binary-tree node side in the current slice for a `channel_type` tree.
    pub fn log2_min_bt_size(&self, channel_type: ChannelType) -> u32 {
        self.sequence.log2_min_bt_size(self.slice.slice_type, channel_type)
    }

    /// Slice type whose table initializes the contexts of this slice.
    pub fn init_slice_type(&self) -> SliceType {
        let slice = &self.slice;
        if self.picture.cabac_init_present && !slice.slice_type.is_intra() && !slice.enc_cabac_table_idx.is_intra() {
            slice.enc_cabac_table_idx
        } else {
            slice.slice_type
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dynamic_range() {
        let mut sequence = SequenceParameters::default();
        assert_eq!(sequence.max_log2_tr_dynamic_range(ChannelType::Luma), 15);
        sequence.extended_precision_processing = true;
        sequence.bit_depth = [12, 16];
        assert_eq!(sequence.max_log2_tr_dynamic_range(ChannelType::Luma), 18);
        assert_eq!(sequence.max_log2_tr_dynamic_range(ChannelType::Chroma), 22);
        assert_eq!(sequence.qp_bd_offset(ChannelType::Luma), 24);
    }

    #[test]
    fn test_min_bt_size_per_slice_and_channel() {
        let sequence = SequenceParameters {
            log2_min_bt_size_luma: 2,
            log2_min_bt_size_chroma: 3,
            log2_min_bt_size_inter: 4,
            ..SequenceParameters::default()
        };
        assert_eq!(sequence.log2_min_bt_size(SliceType::I, ChannelType::Luma), 2);
        assert_eq!(sequence.log2_min_bt_size(SliceType::I, ChannelType::Chroma), 3);
        assert_eq!(sequence.log2_min_bt_size(SliceType::P, ChannelType::Luma), 4);
        assert_eq!(sequence.log2_min_bt_size(SliceType::B, ChannelType::Chroma), 4);
    }

    #[test]
    fn test_init_slice_type_follows_cabac_init_flag() {
        let mut params = CodingParameters::default();
        params.slice.slice_type = SliceType::B;
        params.slice.enc_cabac_table_idx = SliceType::P;
        assert_eq!(params.init_slice_type(), SliceType::B, "flag not present");

        params.picture.cabac_init_present = true;
        assert_eq!(params.init_slice_type(), SliceType::P);

        params.slice.slice_type = SliceType::I;
        assert_eq!(params.init_slice_type(), SliceType::I);
    }

    #[test]
    fn test_tool_validation() {
        let mut tools = ToolSet::JEM;
        assert!(tools.validate().is_ok());
        tools.imv = false;
        assert!(tools.validate().is_err());
        let mut tools = ToolSet::JEM;
        tools.alf = false;
        assert!(tools.validate().is_err(), "GALF without ALF");
        assert!(CodingParameters::jem().validate().is_ok());
        assert_eq!(CodingParameters::jem().max_split_depth(), 4);
    }
}
