//! Adaptive loop filter syntax: the per-CU control flags and the filter
//! parameter codes of the slice header.
//!
//! With GALF every filter parameter bin is a bypass bin; without it the
//! parameter codes use the ALF context groups.

use crate::cabac::{BinEncoder, ContextGroup};
use crate::coding_parameters::CodingParameters;
use crate::sbac::binarization::{write_ep_ex_golomb, write_unary_max_symbol};
use crate::sbac::coding_unit::CodingUnitSource;
use crate::sbac::SbacEncoder;

/// Whether `cu` carries a control flag. Below the control depth only the
/// first CU of each control area does.
pub(crate) fn alf_ctrl_flag_present<C: CodingUnitSource + ?Sized>(params: &CodingParameters, cu: &C) -> bool {
    if !params.tools.alf || !params.slice.alf_ctrl {
        return false;
    }
    let max_depth = params.slice.alf_max_ctrl_depth;
    cu.depth() <= max_depth || is_first_in_depth(params.sequence.log2_ctu_size, cu.z_index(), max_depth)
}

/// Whether the 4x4 z-order index `z_index` starts a block at `depth`.
pub(crate) fn is_first_in_depth(log2_ctu_size: u32, z_index: u32, depth: u32) -> bool {
    let parts_in_ctu = 1u32 << (2 * (log2_ctu_size - 2));
    let parts_per_block = (parts_in_ctu >> (2 * depth)).max(1);
    z_index % parts_per_block == 0
}

/// Number of fixed-length bins of a flag count in `min..=max`.
pub(crate) fn flag_num_length(params: &CodingParameters, min: u32) -> u32 {
    let max = min << (2 * params.slice.alf_max_ctrl_depth);
    u32::BITS - (max - min).leading_zeros()
}

impl<E: BinEncoder> SbacEncoder<E> {
    fn encode_alf_param_bin(&mut self, bin: u32, group: ContextGroup, index: usize) {
        if self.params.tools.galf {
            self.bin_if.encode_bin_ep(bin);
        } else {
            self.encode_bin_ctx(bin, group, 0, index);
        }
    }

    pub fn code_alf_ctrl_flag<C: CodingUnitSource + ?Sized>(&mut self, cu: &C) {
        if !alf_ctrl_flag_present(&self.params, cu) {
            return;
        }
        self.encode_bin_ctx(cu.alf_ctrl_flag() as u32, ContextGroup::AlfCtrlFlag, 0, 0);
    }

    /// Codes a control flag outside of any CU.
    pub fn code_alf_ctrl_flag_symbol(&mut self, flag: bool) {
        self.encode_bin_ctx(flag as u32, ContextGroup::AlfCtrlFlag, 0, 0);
    }

    /// Codes the slice's control depth, at most `max_total_cu_depth - 1`.
    pub fn code_alf_ctrl_depth(&mut self, max_total_cu_depth: u32) {
        let depth = self.params.slice.alf_max_ctrl_depth;
        let models = self.contexts.group_mut(ContextGroup::AlfUvlc);
        write_unary_max_symbol(&mut self.bin_if, models, depth, 1, max_total_cu_depth.saturating_sub(1));
    }

    /// 0: no prediction, 1: one filter for all classes, 2: one per class.
    pub fn code_alf_prev_filt_type(&mut self, code: u32) {
        write_ep_ex_golomb(&mut self.bin_if, code, 0);
    }

    pub fn code_alf_prev_filt_flag(&mut self, code: i32) {
        self.bin_if.encode_bin_ep((code > 0) as u32);
    }

    pub fn code_alf_flag(&mut self, code: u32) {
        self.encode_alf_param_bin((code != 0) as u32, ContextGroup::AlfFlag, 0);
    }

    /// Codes a flag count in `min..=min << 2 * control depth` as fixed-length
    /// bypass bins, most significant first.
    pub fn code_alf_flag_num(&mut self, code: u32, min: u32) {
        debug_assert!(code >= min && code <= min << (2 * self.params.slice.alf_max_ctrl_depth));
        let length = flag_num_length(&self.params, min);
        if length > 0 {
            self.bin_if.encode_bins_ep(code - min, length);
        }
    }

    pub fn code_alf_uvlc(&mut self, code: u32) {
        self.encode_alf_param_bin((code != 0) as u32, ContextGroup::AlfUvlc, 0);
        if code == 0 {
            return;
        }
        for _ in 1..code {
            self.encode_alf_param_bin(1, ContextGroup::AlfUvlc, 1);
        }
        self.encode_alf_param_bin(0, ContextGroup::AlfUvlc, 1);
    }

    pub fn code_alf_svlc(&mut self, code: i32) {
        self.encode_alf_param_bin((code != 0) as u32, ContextGroup::AlfSvlc, 0);
        if code == 0 {
            return;
        }
        self.encode_alf_param_bin((code < 0) as u32, ContextGroup::AlfSvlc, 1);
        for _ in 1..code.unsigned_abs() {
            self.encode_alf_param_bin(1, ContextGroup::AlfSvlc, 2);
        }
        self.encode_alf_param_bin(0, ContextGroup::AlfSvlc, 2);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sbac::coding_unit::CodingUnitInfo;
    use crate::sbac::testing::{BinRecorder, RecordedBin, RecordedBin::*};

    fn recorder(params: CodingParameters) -> SbacEncoder<BinRecorder> {
        let mut sbac = SbacEncoder::new(BinRecorder::default(), params).unwrap();
        sbac.reset_entropy(&params).unwrap();
        sbac
    }

    fn bins(sbac: &SbacEncoder<BinRecorder>) -> &[RecordedBin] {
        &sbac.bin_if().bins
    }

    fn alf_params(galf: bool, max_ctrl_depth: u32) -> CodingParameters {
        let mut params = CodingParameters::jem();
        params.tools.galf = galf;
        params.slice.alf_ctrl = true;
        params.slice.alf_max_ctrl_depth = max_ctrl_depth;
        params
    }

    #[test]
    fn test_first_in_depth() {
        // 128x128 CTU: 1024 4x4 parts, 64 per 32x32 block at depth 2
        assert!(is_first_in_depth(7, 0, 2));
        assert!(is_first_in_depth(7, 128, 2));
        assert!(!is_first_in_depth(7, 130, 2));
        assert!(is_first_in_depth(7, 1023, 5));
    }

    #[test]
    fn test_ctrl_flag_below_control_depth() {
        let params = alf_params(false, 1);
        let cu = |depth, z_index| CodingUnitInfo {
            depth,
            z_index,
            alf_ctrl: true,
            ..CodingUnitInfo::default()
        };

        let mut sbac = recorder(params);
        sbac.code_alf_ctrl_flag(&cu(1, 256));
        sbac.code_alf_ctrl_flag(&cu(3, 512));
        sbac.code_alf_ctrl_flag(&cu(3, 520));
        assert_eq!(bins(&sbac), &[Ctx(1), Ctx(1)], "only the first CU of a control area");
        assert!(sbac.contexts().get(ContextGroup::AlfCtrlFlag, 0, 0).bins_coded());

        let mut params = params;
        params.slice.alf_ctrl = false;
        let mut sbac = recorder(params);
        sbac.code_alf_ctrl_flag(&cu(0, 0));
        assert!(bins(&sbac).is_empty());
    }

    #[test]
    fn test_ctrl_depth_unary() {
        let mut sbac = recorder(alf_params(false, 2));
        sbac.code_alf_ctrl_depth(4);
        assert_eq!(bins(&sbac), &[Ctx(1), Ctx(1), Ctx(0)]);

        let mut sbac = recorder(alf_params(false, 3));
        sbac.code_alf_ctrl_depth(4);
        assert_eq!(bins(&sbac), &[Ctx(1), Ctx(1), Ctx(1)], "no terminating bin at the maximum");
        assert!(sbac.contexts().get(ContextGroup::AlfUvlc, 0, 1).bins_coded());
    }

    #[test]
    fn test_vlc_codes_with_and_without_galf() {
        let mut sbac = recorder(alf_params(false, 0));
        sbac.code_alf_uvlc(3);
        sbac.code_alf_svlc(-2);
        sbac.code_alf_svlc(0);
        sbac.code_alf_flag(5);
        assert_eq!(
            bins(&sbac),
            &[Ctx(1), Ctx(1), Ctx(1), Ctx(0), Ctx(1), Ctx(1), Ctx(1), Ctx(0), Ctx(0), Ctx(1)]
        );
        assert!(sbac.contexts().get(ContextGroup::AlfSvlc, 0, 2).bins_coded());
        assert!(sbac.contexts().get(ContextGroup::AlfFlag, 0, 0).bins_coded());

        let mut sbac = recorder(alf_params(true, 0));
        sbac.code_alf_uvlc(3);
        sbac.code_alf_svlc(2);
        sbac.code_alf_flag(0);
        assert_eq!(bins(&sbac), &[Ep(1), Ep(1), Ep(1), Ep(0), Ep(1), Ep(0), Ep(1), Ep(0), Ep(0)]);
        assert!(!sbac.contexts().get(ContextGroup::AlfUvlc, 0, 0).bins_coded());
    }

    #[test]
    fn test_flag_num_and_prediction_codes() {
        let mut sbac = recorder(alf_params(true, 2));
        // counts 1..=16 at depth 2 take four bins
        assert_eq!(flag_num_length(sbac.params(), 1), 4);
        sbac.code_alf_flag_num(6, 1);
        assert_eq!(bins(&sbac), &[Ep(0), Ep(1), Ep(0), Ep(1)]);

        let mut sbac = recorder(alf_params(true, 0));
        sbac.code_alf_flag_num(1, 1);
        assert!(bins(&sbac).is_empty(), "a single possible count codes nothing");

        sbac.code_alf_prev_filt_type(2);
        sbac.code_alf_prev_filt_flag(-1);
        sbac.code_alf_prev_filt_flag(4);
        assert_eq!(bins(&sbac), &[Ep(1), Ep(0), Ep(1), Ep(0), Ep(1)]);
    }
}
