//! Residual coding: last significant position, significance map and levels.

use crate::cabac::{BinEncoder, ContextGroup};
use crate::coding_parameters::CodingParameters;
use crate::constants::*;
use crate::sbac::SbacEncoder;
use crate::sbac::binarization::write_coef_remain_ex_golomb;
use crate::sbac::scan::{
    context_set_index, first_sig_ctx, last_significant_context_params, pattern_sig_ctx, sig_coeff_group_ctx_inc,
    sig_ctx_channel_offset, sig_ctx_inc, ScanOrder, GROUP_IDX, MIN_IN_GROUP,
};
use crate::{ChannelType, ComponentId, PredMode, RdpcmMode, ScanType};

/// One transform block of quantized coefficients and the CU state its coding depends on.
///
/// `coefficients` is in raster order, `y * width + x`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResidualBlock<'a> {
    pub component: ComponentId,
    pub log2_width: u32,
    pub log2_height: u32,
    pub coefficients: &'a [i32],
    pub scan_type: ScanType,
    pub pred_mode: PredMode,
    /// Intra prediction mode of this component, with the derived chroma mode
    /// already resolved. `None` for inter blocks.
    pub intra_dir: Option<u32>,
    pub transform_skip: bool,
    pub transquant_bypass: bool,
    pub explicit_rdpcm: RdpcmMode,
    pub klt: bool,
}

impl<'a> ResidualBlock<'a> {
    pub fn new(component: ComponentId, log2_width: u32, log2_height: u32, coefficients: &'a [i32]) -> Self {
        debug_assert_eq!(coefficients.len(), 1 << (log2_width + log2_height));
        Self {
            component,
            log2_width,
            log2_height,
            coefficients,
            scan_type: ScanType::Diagonal,
            pred_mode: PredMode::Inter,
            intra_dir: None,
            transform_skip: false,
            transquant_bypass: false,
            explicit_rdpcm: RdpcmMode::Off,
            klt: false,
        }
    }

    pub fn channel_type(&self) -> ChannelType {
        self.component.channel_type()
    }

    pub fn is_intra(&self) -> bool {
        self.pred_mode == PredMode::Intra
    }

    pub(crate) fn area(&self) -> u32 {
        1 << (self.log2_width + self.log2_height)
    }

    /// Transform skip or lossless: the residual was not transformed.
    pub(crate) fn is_untransformed(&self) -> bool {
        self.transform_skip || self.transquant_bypass
    }

    /// Intra transform skip with implicit RDPCM along a pure horizontal or vertical mode.
    pub(crate) fn is_implicit_rdpcm(&self, params: &CodingParameters) -> bool {
        if !(self.transform_skip && self.is_intra() && params.sequence.implicit_rdpcm) {
            return false;
        }
        let (hor, ver) = if params.tools.intra_65_angular {
            (HOR_IDX_JEM, VER_IDX_JEM)
        } else {
            (HOR_IDX_HEVC, VER_IDX_HEVC)
        };
        matches!(self.intra_dir, Some(dir) if dir == hor || dir == ver)
    }

    pub(crate) fn rice_statistics_set(&self) -> usize {
        2 * self.component.is_chroma() as usize + self.is_untransformed() as usize
    }

    pub(crate) fn uses_single_sig_context(&self, params: &CodingParameters) -> bool {
        params.sequence.transform_skip_context && self.is_untransformed()
    }
}

/// Prefix group and suffix of a last-position coordinate.
pub(crate) fn last_position_group(position: u32) -> (u32, u32, u32) {
    let group = GROUP_IDX[position as usize] as u32;
    if group > 3 {
        let count = (group - 2) >> 1;
        (group, position - MIN_IN_GROUP[group as usize] as u32, count)
    } else {
        (group, 0, 0)
    }
}

impl<E: BinEncoder> SbacEncoder<E> {
    /// Codes the position of the last significant coefficient of a block.
    ///
    /// For the vertical scan the coordinates (and block sides) are exchanged.
    pub fn code_last_significant_xy(
        &mut self,
        mut pos_x: u32,
        mut pos_y: u32,
        mut log2_width: u32,
        mut log2_height: u32,
        component: ComponentId,
        scan_type: ScanType,
    ) {
        if scan_type == ScanType::Vertical {
            std::mem::swap(&mut pos_x, &mut pos_y);
            std::mem::swap(&mut log2_width, &mut log2_height);
        }
        let channel_type = component.channel_type();
        let set = u8::from(channel_type) as usize;

        let (group_x, suffix_x, count_x) = last_position_group(pos_x);
        let (group_y, suffix_y, count_y) = last_position_group(pos_y);

        for (group_ctx, group, log2_size) in [
            (ContextGroup::LastX, group_x, log2_width),
            (ContextGroup::LastY, group_y, log2_height),
        ] {
            let (offset, shift) = last_significant_context_params(channel_type, log2_size);
            let max_group = GROUP_IDX[(1 << log2_size) - 1] as u32;
            for ctx in 0..group {
                self.encode_bin_ctx(1, group_ctx, set, offset + (ctx >> shift) as usize);
            }
            if group < max_group {
                self.encode_bin_ctx(0, group_ctx, set, offset + (group >> shift) as usize);
            }
        }

        if count_x > 0 {
            self.bin_if.encode_bins_ep(suffix_x, count_x);
        }
        if count_y > 0 {
            self.bin_if.encode_bins_ep(suffix_y, count_y);
        }
    }

    /// Codes the residual of one transform block, including its transform skip
    /// flag and explicit RDPCM mode when those are present.
    ///
    /// The block must contain at least one nonzero coefficient.
    pub fn code_coeff_nxn(&mut self, block: &ResidualBlock) {
        let log2_width = block.log2_width;
        let log2_height = block.log2_height;
        let channel_type = block.channel_type();
        let coefficients = block.coefficients;

        let mut num_sig = coefficients.iter().filter(|&&coefficient| coefficient != 0).count();
        debug_assert!(num_sig > 0, "empty {:?} transform block", block.component);
        if num_sig == 0 {
            return;
        }

        let mut sign_hiding_allowed;
        if block.transquant_bypass || block.is_implicit_rdpcm(&self.params) {
            sign_hiding_allowed = false;
            if !block.is_intra() && self.params.sequence.explicit_rdpcm {
                self.code_explicit_rdpcm_mode(block.component, block.explicit_rdpcm);
            }
        } else {
            sign_hiding_allowed = self.params.picture.sign_data_hiding;
        }

        if self.params.picture.transform_skip {
            self.code_transform_skip_flag(block);
            if block.transform_skip && !block.is_intra() && self.params.sequence.explicit_rdpcm {
                self.code_explicit_rdpcm_mode(block.component, block.explicit_rdpcm);
                if block.explicit_rdpcm != RdpcmMode::Off {
                    sign_hiding_allowed = false;
                }
            }
        }

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

        let mut sig_groups = [false; MAX_CG_COUNT];
        let positions = scan.positions();
        let mut scan_pos_last = 0;
        for (scan_pos, &position) in positions.iter().enumerate() {
            let position = position as u32;
            if coefficients[position as usize] != 0 {
                let pos_y = position >> log2_width;
                let pos_x = position - (pos_y << log2_width);
                let group = width_in_groups * (pos_y >> MLS_CG_LOG2_HEIGHT) + (pos_x >> MLS_CG_LOG2_WIDTH);
                sig_groups[group as usize] = true;
                num_sig -= 1;
                if num_sig == 0 {
                    scan_pos_last = scan_pos;
                    break;
                }
            }
        }

        let last_position = positions[scan_pos_last] as u32;
        let last_y = last_position >> log2_width;
        let last_x = last_position - (last_y << log2_width);
        self.code_last_significant_xy(last_x, last_y, log2_width, log2_height, block.component, block.scan_type);

        let last_subset = scan_pos_last >> MLS_CG_SIZE;
        let mut c1 = 1;
        let mut scan_pos_sig = scan_pos_last as isize;

        for subset in (0..=last_subset).rev() {
            let sub_pos = (subset << MLS_CG_SIZE) as isize;
            let mut rice_param = self.golomb_rice_statistics[statistics_set] / GOLOMB_RICE_INCREMENT_DIVISOR;
            let mut update_statistics = persistent_rice;
            let mut abs_coeff = [0u32; 1 << MLS_CG_SIZE];
            let mut num_non_zero = 0;
            let mut coeff_signs = 0u32;
            let mut last_nz_pos_in_group: isize = -1;
            let mut first_nz_pos_in_group: isize = 1 << MLS_CG_SIZE;

            if scan_pos_sig == scan_pos_last as isize {
                let coefficient = coefficients[last_position as usize];
                abs_coeff[0] = coefficient.unsigned_abs();
                coeff_signs = (coefficient < 0) as u32;
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
                self.encode_bin_ctx(sig_groups[group as usize] as u32, ContextGroup::SigCoeffGroup, set, ctx);
            }

            if sig_groups[group as usize] {
                let pattern = pattern_sig_ctx(&sig_groups, group_x, group_y, width_in_groups, height_in_groups);
                while scan_pos_sig >= sub_pos {
                    let position = positions[scan_pos_sig as usize] as u32;
                    let coefficient = coefficients[position as usize];
                    let sig = coefficient != 0;
                    if scan_pos_sig > sub_pos || subset == 0 || num_non_zero > 0 {
                        let pos_y = position >> log2_width;
                        let pos_x = position - (pos_y << log2_width);
                        let ctx = sig_ctx_inc(pattern, first_ctx, pos_x, pos_y, log2_width, log2_height, channel_type);
                        self.encode_bin_ctx(sig as u32, ContextGroup::SigFlag, 0, sig_offset + ctx);
                    }
                    if sig {
                        abs_coeff[num_non_zero] = coefficient.unsigned_abs();
                        coeff_signs = 2 * coeff_signs + (coefficient < 0) as u32;
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
            for (idx, &abs) in abs_coeff[..num_c1_flags].iter().enumerate() {
                let symbol = (abs > 1) as u32;
                self.encode_bin_ctx(symbol, ContextGroup::OneFlag, 0, NUM_ONE_FLAG_CTX_PER_SET * ctx_set + c1);
                if symbol == 1 {
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
                    let symbol = (abs_coeff[idx] > 2) as u32;
                    self.encode_bin_ctx(symbol, ContextGroup::AbsFlag, 0, NUM_ABS_FLAG_CTX_PER_SET * ctx_set);
                    if symbol == 1 {
                        escape_data_present = true;
                    }
                }
            }

            escape_data_present |= num_non_zero > C1FLAG_NUMBER;
            if escape_data_present && align_before_bypass {
                self.bin_if.align();
            }

            if sign_hiding_allowed && sign_hidden {
                self.bin_if.encode_bins_ep(coeff_signs >> 1, num_non_zero as u32 - 1);
            } else {
                self.bin_if.encode_bins_ep(coeff_signs, num_non_zero as u32);
            }

            if !escape_data_present {
                continue;
            }

            let mut first_coeff2 = 1;
            for (idx, &abs) in abs_coeff[..num_non_zero].iter().enumerate() {
                let base_level = if idx < C1FLAG_NUMBER { 2 + first_coeff2 } else { 1 };
                if abs >= base_level {
                    let escape_code_value = abs - base_level;
                    write_coef_remain_ex_golomb(
                        &mut self.bin_if,
                        escape_code_value,
                        rice_param,
                        extended_precision,
                        max_log2_tr_dynamic_range,
                    );
                    if abs > (3 << rice_param) {
                        rice_param = if persistent_rice {
                            rice_param + 1
                        } else {
                            (rice_param + 1).min(MAX_RICE_PARAMETER_WITHOUT_ADAPTATION)
                        };
                    }
                    if update_statistics {
                        update_rice_statistic(&mut self.golomb_rice_statistics[statistics_set], escape_code_value);
                        update_statistics = false;
                    }
                }
                if abs >= 2 {
                    first_coeff2 = 0;
                }
            }
        }
    }
}

/// Moves a Golomb-Rice statistic after the first escape value of a group.
pub(crate) fn update_rice_statistic(statistic: &mut u32, escape_code_value: u32) {
    let initial_rice_param = *statistic / GOLOMB_RICE_INCREMENT_DIVISOR;
    if escape_code_value >= (3 << initial_rice_param) {
        *statistic += 1;
    } else if escape_code_value * 2 < (1 << initial_rice_param) && *statistic > 0 {
        *statistic -= 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sbac::testing::{BinRecorder, RecordedBin::*};

    fn recorder(params: CodingParameters) -> SbacEncoder<BinRecorder> {
        let mut sbac = SbacEncoder::new(BinRecorder::default(), params).unwrap();
        sbac.reset_entropy(&params).unwrap();
        sbac
    }

    fn count_bypass(sbac: &SbacEncoder<BinRecorder>) -> usize {
        sbac.bin_if().bins.iter().filter(|bin| matches!(bin, Ep(_))).count()
    }

    #[test]
    fn test_last_position_prefix_and_suffix() {
        let mut sbac = recorder(CodingParameters::hevc());
        sbac.code_last_significant_xy(5, 2, 3, 3, ComponentId::Y, ScanType::Diagonal);
        assert_eq!(
            sbac.bin_if().bins,
            vec![Ctx(1), Ctx(1), Ctx(1), Ctx(1), Ctx(0), Ctx(1), Ctx(1), Ctx(0), Ep(1)]
        );

        let mut sbac = recorder(CodingParameters::hevc());
        sbac.code_last_significant_xy(5, 2, 3, 3, ComponentId::Y, ScanType::Vertical);
        assert_eq!(
            sbac.bin_if().bins,
            vec![Ctx(1), Ctx(1), Ctx(0), Ctx(1), Ctx(1), Ctx(1), Ctx(1), Ctx(0), Ep(1)]
        );
    }

    #[test]
    fn test_last_position_at_block_edge_has_no_terminator() {
        let mut sbac = recorder(CodingParameters::hevc());
        sbac.code_last_significant_xy(3, 0, 2, 2, ComponentId::Cb, ScanType::Diagonal);
        assert_eq!(sbac.bin_if().values(), vec![1, 1, 1, 0]);
    }

    #[test]
    fn test_last_position_group_suffix() {
        assert_eq!(last_position_group(3), (3, 0, 0));
        assert_eq!(last_position_group(7), (5, 1, 1));
        assert_eq!(last_position_group(31), (9, 7, 3));
    }

    #[test]
    fn test_single_dc_coefficient() {
        let mut coefficients = [0; 16];
        coefficients[0] = 1;
        let mut sbac = recorder(CodingParameters::hevc());
        sbac.code_coeff_nxn(&ResidualBlock::new(ComponentId::Y, 2, 2, &coefficients));
        // transform skip flag, last x, last y, greater-1 flag, sign
        assert_eq!(sbac.bin_if().bins, vec![Ctx(0), Ctx(0), Ctx(0), Ctx(0), Ep(0)]);
    }

    #[test]
    fn test_sign_data_hiding_drops_one_sign() {
        // diagonal scan positions 0 and 5
        let mut coefficients = [0; 16];
        coefficients[0] = -1;
        coefficients[2] = 1;
        let block = ResidualBlock::new(ComponentId::Y, 2, 2, &coefficients);

        let mut params = CodingParameters::hevc();
        let mut sbac = recorder(params);
        sbac.code_coeff_nxn(&block);
        assert_eq!(count_bypass(&sbac), 1, "first sign in scan order is hidden");

        params.picture.sign_data_hiding = false;
        let mut sbac = recorder(params);
        sbac.code_coeff_nxn(&block);
        assert_eq!(count_bypass(&sbac), 2);

        params.picture.sign_data_hiding = true;
        let mut sbac = recorder(params);
        sbac.code_coeff_nxn(&ResidualBlock {
            transquant_bypass: true,
            ..block
        });
        assert_eq!(count_bypass(&sbac), 2, "lossless blocks never hide signs");
    }

    #[test]
    fn test_rice_statistics_follow_escape_values() {
        let mut coefficients = [0; 16];
        coefficients[0] = 20;
        let block = ResidualBlock::new(ComponentId::Y, 2, 2, &coefficients);

        let mut params = CodingParameters::hevc();
        params.picture.transform_skip = false;
        let mut sbac = recorder(params);
        sbac.code_coeff_nxn(&block);
        assert_eq!(sbac.golomb_rice_statistics(), &[0; 4]);
        // last x, last y, greater-1, greater-2, then sign, 7 prefix and 3 suffix bins
        assert_eq!(sbac.bin_if().bins.len(), 4 + 11);

        params.sequence.persistent_rice_adaptation = true;
        let mut sbac = recorder(params);
        sbac.code_coeff_nxn(&block);
        assert_eq!(sbac.golomb_rice_statistics(), &[1, 0, 0, 0]);

        sbac.code_coeff_nxn(&ResidualBlock {
            component: ComponentId::Cr,
            transquant_bypass: true,
            ..block
        });
        assert_eq!(sbac.golomb_rice_statistics(), &[1, 0, 0, 1]);
    }

    #[test]
    fn test_update_rice_statistic() {
        let mut statistic = 0;
        update_rice_statistic(&mut statistic, 0);
        assert_eq!(statistic, 0, "never below zero");
        update_rice_statistic(&mut statistic, 3);
        assert_eq!(statistic, 1);

        let mut statistic = 8;
        update_rice_statistic(&mut statistic, 1);
        assert_eq!(statistic, 7, "2 * 1 < 1 << 2");
        update_rice_statistic(&mut statistic, 4);
        assert_eq!(statistic, 7, "between the thresholds");
    }

    #[test]
    fn test_explicit_rdpcm_coded_for_inter_transform_skip() {
        let mut coefficients = [0; 16];
        coefficients[0] = 1;
        let mut params = CodingParameters::hevc();
        params.sequence.explicit_rdpcm = true;

        let mut sbac = recorder(params);
        sbac.code_coeff_nxn(&ResidualBlock {
            transform_skip: true,
            explicit_rdpcm: RdpcmMode::Vertical,
            ..ResidualBlock::new(ComponentId::Cb, 2, 2, &coefficients)
        });
        // transform skip, rdpcm flag, rdpcm direction, then the residual
        assert_eq!(sbac.bin_if().values()[..3], [1, 1, 1]);
        assert_eq!(sbac.bin_if().bins.len(), 3 + 4);

        let mut sbac = recorder(params);
        sbac.code_coeff_nxn(&ResidualBlock {
            pred_mode: PredMode::Intra,
            intra_dir: Some(HOR_IDX_HEVC),
            transform_skip: true,
            ..ResidualBlock::new(ComponentId::Cb, 2, 2, &coefficients)
        });
        assert_eq!(sbac.bin_if().bins.len(), 1 + 4, "no rdpcm syntax for intra blocks");
    }

    #[test]
    fn test_many_coefficients_in_32x32_chroma() {
        let mut coefficients = vec![0; 1024];
        for (i, coefficient) in coefficients.iter_mut().enumerate().step_by(7) {
            *coefficient = if i % 3 == 0 { -((i % 11) as i32) - 1 } else { (i % 5) as i32 + 1 };
        }
        let mut sbac = recorder(CodingParameters::hevc());
        sbac.code_coeff_nxn(&ResidualBlock::new(ComponentId::Cb, 5, 5, &coefficients));
        assert!(sbac.bin_if().bins.len() > 1024 / 7);
    }
}
