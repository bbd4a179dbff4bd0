//! Sample adaptive offset parameters of one CTU.

use crate::cabac::{BinEncoder, ContextGroup};
use crate::constants::*;
use crate::sbac::SbacEncoder;
use crate::sbac::binarization::write_sao_max_uvlc;
use crate::ComponentId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SaoMerge {
    #[default]
    None,
    Left,
    Above,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SaoType {
    #[default]
    Off,
    /// Edge offset along one of the four directions.
    Edge { class: u32 },
    /// Band offset on four consecutive bands starting at `position`.
    Band { position: u32 },
}

impl SaoType {
    /// `sao_type_idx`: 0 off, 1 band, 2 edge.
    pub(crate) fn type_idx(self) -> u32 {
        match self {
            SaoType::Off => 0,
            SaoType::Band { .. } => 1,
            SaoType::Edge { .. } => 2,
        }
    }
}

/// Offsets of one component, in coding order.
///
/// For edge offsets these are the four non-flat categories; the last two are
/// negative. For band offsets they belong to the four bands from `position`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SaoOffset {
    pub sao_type: SaoType,
    pub offsets: [i32; NUM_SAO_OFFSETS],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SaoBlkParam {
    pub merge: SaoMerge,
    pub components: [SaoOffset; MAX_NUM_COMPONENT],
}

/// Largest offset magnitude at `bit_depth`.
pub fn max_sao_offset(bit_depth: u32) -> u32 {
    (1 << (bit_depth.min(MAX_SAO_TRUNCATED_BITDEPTH) - 5)) - 1
}

impl<E: BinEncoder> SbacEncoder<E> {
    pub fn code_sao_merge(&mut self, merge: bool) {
        self.encode_bin_ctx(merge as u32, ContextGroup::SaoMergeFlag, 0, 0);
    }

    pub fn code_sao_type_idx(&mut self, type_idx: u32) {
        debug_assert!(type_idx <= 2);
        if type_idx == 0 {
            self.encode_bin_ctx(0, ContextGroup::SaoTypeIdx, 0, 0);
        } else {
            self.encode_bin_ctx(1, ContextGroup::SaoTypeIdx, 0, 0);
            self.bin_if.encode_bin_ep((type_idx != 1) as u32);
        }
    }

    /// Codes the offsets of one component. Cr takes its type and edge class from Cb.
    pub fn code_sao_offset_param(&mut self, component: ComponentId, param: &SaoOffset, slice_enabled: bool) {
        if !slice_enabled {
            debug_assert_eq!(param.sao_type, SaoType::Off);
            return;
        }

        if component != ComponentId::Cr {
            self.code_sao_type_idx(param.sao_type.type_idx());
        }
        if param.sao_type == SaoType::Off {
            return;
        }

        let bit_depth = self.params.sequence.bit_depth[u8::from(component.channel_type()) as usize];
        let max_offset = max_sao_offset(bit_depth);
        for offset in param.offsets {
            write_sao_max_uvlc(&mut self.bin_if, offset.unsigned_abs(), max_offset);
        }

        match param.sao_type {
            SaoType::Band { position } => {
                for offset in param.offsets.into_iter().filter(|&offset| offset != 0) {
                    self.bin_if.encode_bin_ep((offset < 0) as u32);
                }
                self.bin_if.encode_bins_ep(position, NUM_SAO_BO_CLASSES_LOG2);
            }
            SaoType::Edge { class } => {
                if component != ComponentId::Cr {
                    self.bin_if.encode_bins_ep(class, NUM_SAO_EO_TYPES_LOG2);
                }
            }
            SaoType::Off => {}
        }
    }

    /// Codes the SAO parameters of a CTU: the merge flags the neighbourhood
    /// allows, then, unless merged, every component's offsets.
    ///
    /// With `only_merge_info` only the merge flags are coded, for rate estimation.
    pub fn code_sao_blk_param(
        &mut self,
        param: &SaoBlkParam,
        left_merge_available: bool,
        above_merge_available: bool,
        only_merge_info: bool,
    ) {
        let mut merged = false;
        if left_merge_available {
            merged = param.merge == SaoMerge::Left;
            self.code_sao_merge(merged);
        }
        if above_merge_available && !merged {
            merged = param.merge == SaoMerge::Above;
            self.code_sao_merge(merged);
        }
        if only_merge_info || merged {
            return;
        }

        let num_components = self.params.sequence.chroma_format.component_count();
        for component in ComponentId::ALL.into_iter().take(num_components) {
            let enabled = self.params.slice.sao_enabled[u8::from(component.channel_type()) as usize];
            self.code_sao_offset_param(component, &param.components[component as usize], enabled);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coding_parameters::CodingParameters;
    use crate::sbac::testing::{BinRecorder, RecordedBin::*};

    fn recorder() -> SbacEncoder<BinRecorder> {
        let params = CodingParameters::hevc();
        let mut sbac = SbacEncoder::new(BinRecorder::default(), params).unwrap();
        sbac.reset_entropy(&params).unwrap();
        sbac
    }

    #[test]
    fn test_max_sao_offset() {
        assert_eq!(max_sao_offset(8), 7);
        assert_eq!(max_sao_offset(10), 31);
        assert_eq!(max_sao_offset(12), 31);
    }

    #[test]
    fn test_merge_flags() {
        let left = SaoBlkParam {
            merge: SaoMerge::Left,
            ..SaoBlkParam::default()
        };
        let mut sbac = recorder();
        sbac.code_sao_blk_param(&left, true, true, false);
        assert_eq!(sbac.bin_if().bins, vec![Ctx(1)], "no merge-up after merge-left");

        let above = SaoBlkParam {
            merge: SaoMerge::Above,
            ..SaoBlkParam::default()
        };
        let mut sbac = recorder();
        sbac.code_sao_blk_param(&above, true, true, false);
        assert_eq!(sbac.bin_if().bins, vec![Ctx(0), Ctx(1)]);

        let mut sbac = recorder();
        sbac.code_sao_blk_param(&SaoBlkParam::default(), false, true, true);
        assert_eq!(sbac.bin_if().bins, vec![Ctx(0)]);
    }

    #[test]
    fn test_all_components_off() {
        let mut sbac = recorder();
        sbac.code_sao_blk_param(&SaoBlkParam::default(), false, false, false);
        // luma type, chroma type; Cr has none of its own
        assert_eq!(sbac.bin_if().bins, vec![Ctx(0), Ctx(0)]);
    }

    #[test]
    fn test_band_offset() {
        let mut param = SaoBlkParam::default();
        param.components[0] = SaoOffset {
            sao_type: SaoType::Band { position: 9 },
            offsets: [2, 0, -1, 7],
        };
        let mut sbac = recorder();
        sbac.code_sao_offset_param(ComponentId::Y, &param.components[0], true);

        let mut expected = vec![Ctx(1), Ep(0)];
        expected.extend([Ep(1), Ep(1), Ep(0)]);
        expected.push(Ep(0));
        expected.extend([Ep(1), Ep(0)]);
        expected.extend([Ep(1); 7]);
        expected.extend([Ep(0), Ep(1), Ep(0)]);
        expected.extend([Ep(0), Ep(1), Ep(0), Ep(0), Ep(1)]);
        assert_eq!(sbac.bin_if().bins, expected);
    }

    #[test]
    fn test_edge_offset_class_for_cb_only() {
        let edge = SaoOffset {
            sao_type: SaoType::Edge { class: 2 },
            offsets: [1, 0, 0, -1],
        };
        let mut sbac = recorder();
        sbac.code_sao_offset_param(ComponentId::Cb, &edge, true);
        assert_eq!(
            sbac.bin_if().bins,
            vec![Ctx(1), Ep(1), Ep(1), Ep(0), Ep(0), Ep(0), Ep(1), Ep(0), Ep(1), Ep(0)]
        );

        let mut sbac = recorder();
        sbac.code_sao_offset_param(ComponentId::Cr, &edge, true);
        assert_eq!(sbac.bin_if().bins, vec![Ep(1), Ep(0), Ep(0), Ep(0), Ep(1), Ep(0)]);
    }

    #[test]
    fn test_disabled_channel_codes_nothing() {
        let mut params = CodingParameters::hevc();
        params.slice.sao_enabled = [true, false];
        let mut sbac = SbacEncoder::new(BinRecorder::default(), params).unwrap();
        sbac.reset_entropy(&params).unwrap();
        sbac.code_sao_blk_param(&SaoBlkParam::default(), false, false, false);
        assert_eq!(sbac.bin_if().bins, vec![Ctx(0)]);
    }
}
