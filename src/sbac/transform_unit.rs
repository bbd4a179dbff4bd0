//! Transform-tree syntax: coded block flags, subdivision, transform skip,
//! RDPCM, cross-component prediction and QP deltas.

use crate::cabac::{BinEncoder, ContextGroup};
use crate::constants::*;
use crate::sbac::SbacEncoder;
use crate::sbac::binarization::{write_ep_ex_golomb, write_unary_max_symbol};
use crate::sbac::coding_unit::CodingUnitSource;
use crate::sbac::residual::ResidualBlock;
use crate::{ChannelType, ComponentId, PredMode, RdpcmMode};

/// Context of a coded block flag at transform depth `tr_depth`.
pub(crate) fn qt_cbf_ctx(channel_type: ChannelType, tr_depth: u32) -> usize {
    match channel_type {
        ChannelType::Luma => (tr_depth == 0) as usize,
        ChannelType::Chroma => tr_depth as usize,
    }
}

pub(crate) fn transform_subdiv_ctx(log2_size: u32) -> usize {
    debug_assert!((3..=5).contains(&log2_size), "subdivision of a 1 << {log2_size} transform");
    (5 - log2_size) as usize
}

/// Whether the block is small enough to carry a transform skip flag.
pub(crate) fn has_transform_skip_flag(block: &ResidualBlock, log2_max_transform_skip_size: u32) -> bool {
    !block.transquant_bypass && block.area() <= 1 << (2 * log2_max_transform_skip_size)
}

pub(crate) fn cross_component_prediction_present<C: CodingUnitSource + ?Sized>(
    cu: &C,
    component: ComponentId,
    enabled: bool,
) -> bool {
    component.is_chroma()
        && enabled
        && (cu.pred_mode() != PredMode::Intra || cu.intra_chroma_candidate().is_none())
}

/// Wraps a QP difference into the range a slice can signal.
pub(crate) fn wrap_delta_qp(delta_qp: i32, qp_bd_offset_y: i32) -> i32 {
    (delta_qp + 78 + qp_bd_offset_y + qp_bd_offset_y / 2).rem_euclid(52 + qp_bd_offset_y) - 26 - qp_bd_offset_y / 2
}

const LOG2_ABS_ALPHA_MINUS1: [u32; 8] = [0, 1, 1, 2, 2, 2, 3, 3];

pub(crate) fn cross_component_ctx_base(component: ComponentId) -> usize {
    if component == ComponentId::Cr { NUM_CROSS_COMPONENT_PREDICTION_CTX >> 1 } else { 0 }
}

impl<E: BinEncoder> SbacEncoder<E> {
    pub fn code_qt_cbf(&mut self, component: ComponentId, tr_depth: u32, cbf: bool) {
        let channel_type = component.channel_type();
        let ctx = qt_cbf_ctx(channel_type, tr_depth);
        self.encode_bin_ctx(cbf as u32, ContextGroup::QtCbf, u8::from(channel_type) as usize, ctx);
    }

    /// Coded block flags of the two vertically stacked sub-blocks of a 4:2:2 chroma TU.
    pub fn code_qt_cbf_pair(&mut self, component: ComponentId, tr_depth: u32, cbf: [bool; 2]) {
        debug_assert!(component.is_chroma());
        for sub_cbf in cbf {
            self.code_qt_cbf(component, tr_depth, sub_cbf);
        }
    }

    /// Codes a zero coded block flag, for rate estimation of an all-zero residual.
    pub fn code_qt_cbf_zero(&mut self, channel_type: ChannelType, tr_depth: u32) {
        let ctx = qt_cbf_ctx(channel_type, tr_depth);
        self.encode_bin_ctx(0, ContextGroup::QtCbf, u8::from(channel_type) as usize, ctx);
    }

    pub fn code_transform_subdiv_flag(&mut self, split: bool, log2_size: u32) {
        self.encode_bin_ctx(split as u32, ContextGroup::TransSubdivFlag, 0, transform_subdiv_ctx(log2_size));
    }

    pub fn code_qt_root_cbf<C: CodingUnitSource + ?Sized>(&mut self, cu: &C) {
        self.encode_bin_ctx(cu.root_cbf() as u32, ContextGroup::QtRootCbf, 0, 0);
    }

    pub fn code_qt_root_cbf_zero(&mut self) {
        self.encode_bin_ctx(0, ContextGroup::QtRootCbf, 0, 0);
    }

    /// Codes `transform_skip_flag`; nothing for lossless blocks or blocks above
    /// the maximum transform-skip size.
    pub fn code_transform_skip_flag(&mut self, block: &ResidualBlock) {
        if !has_transform_skip_flag(block, self.params.picture.log2_max_transform_skip_size) {
            return;
        }
        let set = u8::from(block.channel_type()) as usize;
        self.encode_bin_ctx(block.transform_skip as u32, ContextGroup::TransformSkipFlag, set, 0);
    }

    pub fn code_explicit_rdpcm_mode(&mut self, component: ComponentId, mode: RdpcmMode) {
        let set = u8::from(component.channel_type()) as usize;
        match mode {
            RdpcmMode::Off => self.encode_bin_ctx(0, ContextGroup::RdpcmFlag, set, 0),
            RdpcmMode::Horizontal | RdpcmMode::Vertical => {
                self.encode_bin_ctx(1, ContextGroup::RdpcmFlag, set, 0);
                let direction = (mode == RdpcmMode::Vertical) as u32;
                self.encode_bin_ctx(direction, ContextGroup::RdpcmDir, set, 0);
            }
        }
    }

    /// Codes the cross-component prediction weight of a chroma TU.
    ///
    /// Only inter CUs and intra CUs with the derived chroma mode carry it.
    pub fn code_cross_component_prediction<C: CodingUnitSource + ?Sized>(&mut self, cu: &C, component: ComponentId) {
        if !cross_component_prediction_present(cu, component, self.params.picture.cross_component_prediction) {
            return;
        }

        let alpha = cu.cross_component_alpha(component);
        debug_assert!(matches!(alpha.unsigned_abs(), 0 | 1 | 2 | 4 | 8), "alpha {alpha}");
        let base = cross_component_ctx_base(component);

        self.encode_bin_ctx((alpha != 0) as u32, ContextGroup::CrossComponentPrediction, 0, base);
        if alpha == 0 {
            return;
        }

        let abs_alpha = alpha.unsigned_abs();
        if abs_alpha > 1 {
            self.encode_bin_ctx(1, ContextGroup::CrossComponentPrediction, 0, base + 1);
            let models = &mut self.contexts.group_mut(ContextGroup::CrossComponentPrediction)[base + 2..];
            write_unary_max_symbol(
                &mut self.bin_if,
                models,
                LOG2_ABS_ALPHA_MINUS1[abs_alpha as usize - 1] - 1,
                1,
                2,
            );
        } else {
            self.encode_bin_ctx(0, ContextGroup::CrossComponentPrediction, 0, base + 1);
        }
        self.encode_bin_ctx((alpha < 0) as u32, ContextGroup::CrossComponentPrediction, 0, base + 4);
    }

    pub fn code_delta_qp<C: CodingUnitSource + ?Sized>(&mut self, cu: &C) {
        let qp_bd_offset_y = self.params.sequence.qp_bd_offset(ChannelType::Luma);
        let delta_qp = wrap_delta_qp(cu.qp() - cu.ref_qp(), qp_bd_offset_y);
        let abs_delta_qp = delta_qp.unsigned_abs();

        let prefix = abs_delta_qp.min(CU_DQP_TU_CMAX);
        let models = self.contexts.group_mut(ContextGroup::DeltaQp);
        write_unary_max_symbol(&mut self.bin_if, models, prefix, 1, CU_DQP_TU_CMAX);
        if abs_delta_qp >= CU_DQP_TU_CMAX {
            write_ep_ex_golomb(&mut self.bin_if, abs_delta_qp - CU_DQP_TU_CMAX, CU_DQP_EG_K);
        }
        if abs_delta_qp > 0 {
            self.bin_if.encode_bin_ep((delta_qp < 0) as u32);
        }
        ltrace!("delta qp {}", delta_qp);
    }

    pub fn code_chroma_qp_adjustment<C: CodingUnitSource + ?Sized>(&mut self, cu: &C) {
        let idc = cu.chroma_qp_adj();
        let list_len = self.params.picture.chroma_qp_offset_list_len;
        debug_assert!(idc <= list_len, "chroma qp adjustment {idc} of {list_len}");

        self.encode_bin_ctx((idc > 0) as u32, ContextGroup::ChromaQpAdjFlag, 0, 0);
        if idc > 0 && list_len > 1 {
            let models = self.contexts.group_mut(ContextGroup::ChromaQpAdjIdc);
            write_unary_max_symbol(&mut self.bin_if, models, idc - 1, 0, list_len - 1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coding_parameters::CodingParameters;
    use crate::sbac::coding_unit::CodingUnitInfo;
    use crate::sbac::testing::{BinRecorder, RecordedBin::*};

    fn recorder(params: CodingParameters) -> SbacEncoder<BinRecorder> {
        let mut sbac = SbacEncoder::new(BinRecorder::default(), params).unwrap();
        sbac.reset_entropy(&params).unwrap();
        sbac
    }

    #[test]
    fn test_qt_cbf_contexts() {
        let mut sbac = recorder(CodingParameters::hevc());
        sbac.code_qt_cbf(ComponentId::Y, 0, true);
        sbac.code_qt_cbf(ComponentId::Cr, 3, false);
        let contexts = sbac.contexts();
        assert!(contexts.get(ContextGroup::QtCbf, 0, 1).bins_coded(), "luma at depth 0 uses ctx 1");
        assert!(!contexts.get(ContextGroup::QtCbf, 0, 0).bins_coded());
        assert!(contexts.get(ContextGroup::QtCbf, 1, 3).bins_coded(), "chroma uses its depth");
        assert_eq!(sbac.bin_if().values(), vec![1, 0]);
    }

    #[test]
    fn test_qt_cbf_pair_and_zero() {
        let mut sbac = recorder(CodingParameters::hevc());
        sbac.code_qt_cbf_pair(ComponentId::Cb, 1, [false, true]);
        sbac.code_qt_cbf_zero(ChannelType::Luma, 2);
        sbac.code_qt_root_cbf_zero();
        assert_eq!(sbac.bin_if().values(), vec![0, 1, 0, 0]);
        assert!(sbac.contexts().get(ContextGroup::QtCbf, 0, 0).bins_coded());
        assert!(sbac.contexts().get(ContextGroup::QtRootCbf, 0, 0).bins_coded());
    }

    #[test]
    fn test_transform_subdiv_context() {
        let mut sbac = recorder(CodingParameters::hevc());
        sbac.code_transform_subdiv_flag(true, 5);
        sbac.code_transform_subdiv_flag(false, 3);
        assert!(sbac.contexts().get(ContextGroup::TransSubdivFlag, 0, 0).bins_coded());
        assert!(!sbac.contexts().get(ContextGroup::TransSubdivFlag, 0, 1).bins_coded());
        assert!(sbac.contexts().get(ContextGroup::TransSubdivFlag, 0, 2).bins_coded());
    }

    #[test]
    fn test_transform_skip_flag_presence() {
        let coefficients = [0; 64];
        let mut sbac = recorder(CodingParameters::hevc());
        sbac.code_transform_skip_flag(&ResidualBlock::new(ComponentId::Y, 3, 3, &coefficients));
        assert!(sbac.bin_if().bins.is_empty(), "8x8 is above the default maximum");

        let mut params = CodingParameters::hevc();
        params.picture.log2_max_transform_skip_size = 3;
        let mut sbac = recorder(params);
        let block = ResidualBlock {
            transform_skip: true,
            ..ResidualBlock::new(ComponentId::Cb, 3, 3, &coefficients)
        };
        sbac.code_transform_skip_flag(&block);
        assert_eq!(sbac.bin_if().bins, vec![Ctx(1)]);
        assert!(sbac.contexts().get(ContextGroup::TransformSkipFlag, 1, 0).bins_coded());

        sbac.code_transform_skip_flag(&ResidualBlock {
            transquant_bypass: true,
            ..block
        });
        assert_eq!(sbac.bin_if().bins.len(), 1);
    }

    #[test]
    fn test_explicit_rdpcm_mode() {
        let mut sbac = recorder(CodingParameters::hevc());
        sbac.code_explicit_rdpcm_mode(ComponentId::Y, RdpcmMode::Off);
        sbac.code_explicit_rdpcm_mode(ComponentId::Y, RdpcmMode::Horizontal);
        sbac.code_explicit_rdpcm_mode(ComponentId::Cr, RdpcmMode::Vertical);
        assert_eq!(sbac.bin_if().values(), vec![0, 1, 0, 1, 1]);
        assert!(sbac.contexts().get(ContextGroup::RdpcmDir, 1, 0).bins_coded());
    }

    #[test]
    fn test_cross_component_prediction() {
        let mut params = CodingParameters::hevc();
        params.picture.cross_component_prediction = true;
        let cases = [
            (0, vec![0]),
            (1, vec![1, 0, 0]),
            (-2, vec![1, 1, 0, 1]),
            (4, vec![1, 1, 1, 0, 0]),
            (-8, vec![1, 1, 1, 1, 1]),
        ];
        for (alpha, expected) in cases {
            let mut sbac = recorder(params);
            let mut cu = CodingUnitInfo::default();
            cu.cross_component_alpha[ComponentId::Cr as usize] = alpha;
            sbac.code_cross_component_prediction(&cu, ComponentId::Cr);
            assert_eq!(sbac.bin_if().values(), expected, "alpha {alpha}");
            assert!(!sbac.contexts().get(ContextGroup::CrossComponentPrediction, 0, 0).bins_coded());
        }

        let mut sbac = recorder(params);
        let cu = CodingUnitInfo::default();
        sbac.code_cross_component_prediction(&cu, ComponentId::Y);
        assert!(sbac.bin_if().bins.is_empty());

        let cu = CodingUnitInfo {
            pred_mode: PredMode::Intra,
            intra_chroma_candidate: Some(1),
            ..CodingUnitInfo::default()
        };
        sbac.code_cross_component_prediction(&cu, ComponentId::Cb);
        assert!(sbac.bin_if().bins.is_empty(), "intra chroma with its own mode");
    }

    #[test]
    fn test_delta_qp() {
        let cases = [
            (0, vec![Ctx(0)]),
            (-2, vec![Ctx(1), Ctx(1), Ctx(0), Ep(1)]),
            (5, vec![Ctx(1), Ctx(1), Ctx(1), Ctx(1), Ctx(1), Ep(0), Ep(0)]),
            (7, vec![Ctx(1), Ctx(1), Ctx(1), Ctx(1), Ctx(1), Ep(1), Ep(0), Ep(1), Ep(0)]),
        ];
        for (delta, expected) in cases {
            let mut sbac = recorder(CodingParameters::hevc());
            let cu = CodingUnitInfo {
                qp: 30 + delta,
                ref_qp: 30,
                ..CodingUnitInfo::default()
            };
            sbac.code_delta_qp(&cu);
            assert_eq!(sbac.bin_if().bins, expected, "delta {delta}");
        }
    }

    #[test]
    fn test_wrap_delta_qp() {
        assert_eq!(wrap_delta_qp(0, 0), 0);
        assert_eq!(wrap_delta_qp(-26, 0), -26);
        assert_eq!(wrap_delta_qp(26, 0), -26);
        assert_eq!(wrap_delta_qp(30, 0), -22);
        assert_eq!(wrap_delta_qp(-31, 12), -31);
    }

    #[test]
    fn test_chroma_qp_adjustment() {
        let mut params = CodingParameters::hevc();
        params.picture.chroma_qp_offset_list_len = 3;
        let cases = [(0, vec![0]), (1, vec![1, 0]), (3, vec![1, 1, 1])];
        for (idc, expected) in cases {
            let mut sbac = recorder(params);
            let cu = CodingUnitInfo {
                chroma_qp_adj: idc,
                ..CodingUnitInfo::default()
            };
            sbac.code_chroma_qp_adjustment(&cu);
            assert_eq!(sbac.bin_if().values(), expected, "idc {idc}");
        }
    }
}
