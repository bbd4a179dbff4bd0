//! Bit-cost tables for rate-distortion optimized quantization and motion search.
//!
//! The tables are snapshots of the current context states; nothing is coded.
//! Costs are 15-bit fixed-point fractional bits, see
//! [`frac_bits_to_bits`](crate::cabac::frac_bits_to_bits).

use crate::cabac::{BinEncoder, ContextGroup, ContextModel};
use crate::constants::*;
use crate::sbac::SbacEncoder;
use crate::sbac::scan::{last_significant_context_params, sig_ctx_channel_offset, GROUP_IDX};
use crate::{ChannelType, ScanType};

/// Cost of a `0` and a `1` for each context.
pub type BinCosts = [u32; 2];

/// Residual coding costs used by rate-distortion optimized quantization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EstBitsSbac {
    pub block_cbp_bits: [BinCosts; NUM_QT_CBF_CTX_SETS * NUM_QT_CBF_CTX_PER_SET],
    pub block_root_cbp_bits: [BinCosts; NUM_QT_ROOT_CBF_CTX],
    pub significant_coeff_group_bits: [BinCosts; NUM_SIG_CG_FLAG_CTX],
    pub significant_bits: [BinCosts; NUM_SIG_FLAG_CTX],
    /// Cumulative cost of the last-position prefix ending in each group, per channel type.
    pub last_x_bits: [[u32; LAST_SIGNIFICANT_GROUPS]; MAX_NUM_CHANNEL_TYPE],
    pub last_y_bits: [[u32; LAST_SIGNIFICANT_GROUPS]; MAX_NUM_CHANNEL_TYPE],
    pub greater_one_bits: [BinCosts; NUM_ONE_FLAG_CTX],
    pub level_abs_bits: [BinCosts; NUM_ABS_FLAG_CTX],
    pub golomb_rice_adaptation_statistics: [u32; GOLOMB_RICE_ADAPTATION_STATISTICS_SETS],
}

impl Default for EstBitsSbac {
    fn default() -> Self {
        Self {
            block_cbp_bits: [[0; 2]; NUM_QT_CBF_CTX_SETS * NUM_QT_CBF_CTX_PER_SET],
            block_root_cbp_bits: [[0; 2]; NUM_QT_ROOT_CBF_CTX],
            significant_coeff_group_bits: [[0; 2]; NUM_SIG_CG_FLAG_CTX],
            significant_bits: [[0; 2]; NUM_SIG_FLAG_CTX],
            last_x_bits: [[0; LAST_SIGNIFICANT_GROUPS]; MAX_NUM_CHANNEL_TYPE],
            last_y_bits: [[0; LAST_SIGNIFICANT_GROUPS]; MAX_NUM_CHANNEL_TYPE],
            greater_one_bits: [[0; 2]; NUM_ONE_FLAG_CTX],
            level_abs_bits: [[0; 2]; NUM_ABS_FLAG_CTX],
            golomb_rice_adaptation_statistics: [0; GOLOMB_RICE_ADAPTATION_STATISTICS_SETS],
        }
    }
}

/// Prediction-unit syntax costs used by motion estimation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EstPuBits {
    pub mvd_bits: [BinCosts; NUM_MV_RES_CTX],
    pub mvp_idx_bits: [BinCosts; NUM_MVP_IDX_CTX],
    pub ref_idx_bits: [BinCosts; NUM_REF_NO_CTX],
    pub merge_flag_bits: [BinCosts; NUM_MERGE_FLAG_EXT_CTX],
    pub merge_idx_bits: [BinCosts; NUM_MERGE_IDX_EXT_CTX],
    pub inter_dir_bits: [BinCosts; NUM_INTER_DIR_CTX],
    pub affine_flag_bits: [BinCosts; NUM_AFFINE_FLAG_CTX],
    pub imv_flag_bits: [BinCosts; NUM_IMV_FLAG_CTX],
    pub fruc_mrg_bits: [BinCosts; NUM_FRUC_MRG_MODE_CTX],
    pub fruc_me_bits: [BinCosts; NUM_FRUC_ME_CTX],
}

fn fill_bin_costs(costs: &mut [BinCosts], models: &[ContextModel]) {
    debug_assert!(costs.len() <= models.len());
    for (cost, model) in costs.iter_mut().zip(models) {
        *cost = [model.entropy_bits(0), model.entropy_bits(1)];
    }
}

/// Fills `bits[group]` with the cost of a last-position prefix that ends in `group`.
fn fill_last_position_bits(
    bits: &mut [u32; LAST_SIGNIFICANT_GROUPS],
    models: &[ContextModel],
    channel_type: ChannelType,
    log2_size: u32,
) {
    let (offset, shift) = last_significant_context_params(channel_type, log2_size);
    let max_group = GROUP_IDX[(1 << log2_size) - 1] as usize;
    let mut accumulated = 0;
    for (ctx, entry) in bits.iter_mut().enumerate().take(max_group) {
        let model = &models[offset + (ctx >> shift)];
        *entry = accumulated + model.entropy_bits(0);
        accumulated += model.entropy_bits(1);
    }
    bits[max_group] = accumulated;
}

impl<E: BinEncoder> SbacEncoder<E> {
    /// Snapshots the residual coding costs of a `channel_type` block of the given size.
    pub fn est_bit(
        &self,
        est: &mut EstBitsSbac,
        mut log2_width: u32,
        mut log2_height: u32,
        channel_type: ChannelType,
        scan_type: ScanType,
    ) {
        let contexts = &self.contexts;
        let set = u8::from(channel_type) as usize;

        fill_bin_costs(&mut est.block_cbp_bits, contexts.group(ContextGroup::QtCbf));
        fill_bin_costs(&mut est.block_root_cbp_bits, contexts.group(ContextGroup::QtRootCbf));

        let sig_groups = &contexts.group(ContextGroup::SigCoeffGroup)[set * NUM_SIG_CG_FLAG_CTX..];
        fill_bin_costs(&mut est.significant_coeff_group_bits, sig_groups);

        let first = sig_ctx_channel_offset(channel_type);
        let count = match channel_type {
            ChannelType::Luma => NUM_SIG_FLAG_CTX_LUMA,
            ChannelType::Chroma => NUM_SIG_FLAG_CTX_CHROMA,
        };
        fill_bin_costs(
            &mut est.significant_bits[first..first + count],
            &contexts.group(ContextGroup::SigFlag)[first..],
        );

        if scan_type == ScanType::Vertical {
            std::mem::swap(&mut log2_width, &mut log2_height);
        }
        let last_x = &contexts.group(ContextGroup::LastX)[set * NUM_CTX_LAST_FLAG_XY..];
        fill_last_position_bits(&mut est.last_x_bits[set], last_x, channel_type, log2_width);
        let last_y = &contexts.group(ContextGroup::LastY)[set * NUM_CTX_LAST_FLAG_XY..];
        fill_last_position_bits(&mut est.last_y_bits[set], last_y, channel_type, log2_height);

        let (one_range, abs_range) = match channel_type {
            ChannelType::Luma => (0..NUM_ONE_FLAG_CTX_LUMA, 0..NUM_ABS_FLAG_CTX_LUMA),
            ChannelType::Chroma => (NUM_ONE_FLAG_CTX_LUMA..NUM_ONE_FLAG_CTX, NUM_ABS_FLAG_CTX_LUMA..NUM_ABS_FLAG_CTX),
        };
        fill_bin_costs(
            &mut est.greater_one_bits[one_range.clone()],
            &contexts.group(ContextGroup::OneFlag)[one_range],
        );
        fill_bin_costs(
            &mut est.level_abs_bits[abs_range.clone()],
            &contexts.group(ContextGroup::AbsFlag)[abs_range],
        );

        est.golomb_rice_adaptation_statistics = self.golomb_rice_statistics;
    }

    /// Snapshots the prediction-unit syntax costs.
    pub fn est_pu_bits(&self, est: &mut EstPuBits) {
        let contexts = &self.contexts;
        fill_bin_costs(&mut est.mvd_bits, contexts.group(ContextGroup::Mvd));
        fill_bin_costs(&mut est.mvp_idx_bits, contexts.group(ContextGroup::MvpIdx));
        fill_bin_costs(&mut est.ref_idx_bits, contexts.group(ContextGroup::RefPic));
        fill_bin_costs(&mut est.merge_flag_bits, contexts.group(ContextGroup::MergeFlag));
        fill_bin_costs(&mut est.merge_idx_bits, contexts.group(ContextGroup::MergeIdx));
        fill_bin_costs(&mut est.inter_dir_bits, contexts.group(ContextGroup::InterDir));
        fill_bin_costs(&mut est.affine_flag_bits, contexts.group(ContextGroup::AffineFlag));
        fill_bin_costs(&mut est.imv_flag_bits, contexts.group(ContextGroup::ImvFlag));
    }

    /// Snapshots the FRUC merge-mode costs only.
    pub fn est_fruc_mode_bit(&self, est: &mut EstPuBits) {
        fill_bin_costs(&mut est.fruc_mrg_bits, self.contexts.group(ContextGroup::FrucMrgMode));
        fill_bin_costs(&mut est.fruc_me_bits, self.contexts.group(ContextGroup::FrucMe));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cabac::CabacCounter;
    use crate::coding_parameters::CodingParameters;
    use crate::sbac::ResidualBlock;
    use crate::{ComponentId, SliceType};

    fn counter(params: CodingParameters) -> SbacEncoder<CabacCounter> {
        let mut sbac = SbacEncoder::new(CabacCounter::new(), params).unwrap();
        sbac.reset_entropy(&params).unwrap();
        sbac
    }

    #[test]
    fn test_last_position_estimate_matches_coded_cost() {
        let mut params = CodingParameters::hevc();
        params.slice.slice_type = SliceType::I;
        let mut sbac = counter(params);

        let mut est = EstBitsSbac::default();
        sbac.est_bit(&mut est, 2, 2, ChannelType::Luma, ScanType::Diagonal);

        // in a 4x4 block every prefix bin has its own context
        let expected = est.last_x_bits[0][2] + est.last_y_bits[0][0];
        sbac.code_last_significant_xy(2, 0, 2, 2, ComponentId::Y, ScanType::Diagonal);
        assert_eq!(sbac.bin_if().frac_bits(), expected as u64);
    }

    #[test]
    fn test_last_position_terminal_group_has_no_zero_bin() {
        let sbac = counter(CodingParameters::hevc());
        let mut est = EstBitsSbac::default();
        sbac.est_bit(&mut est, 2, 2, ChannelType::Chroma, ScanType::Diagonal);

        let models = &sbac.contexts().group(ContextGroup::LastX)[NUM_CTX_LAST_FLAG_XY..];
        let ones: u32 = (0..3).map(|ctx| models[ctx].entropy_bits(1)).sum();
        assert_eq!(est.last_x_bits[1][3], ones);
        assert_eq!(est.last_x_bits[1][0], models[0].entropy_bits(0));
    }

    #[test]
    fn test_vertical_scan_swaps_dimensions() {
        let sbac = counter(CodingParameters::hevc());
        let mut wide = EstBitsSbac::default();
        sbac.est_bit(&mut wide, 5, 3, ChannelType::Luma, ScanType::Vertical);
        let mut tall = EstBitsSbac::default();
        sbac.est_bit(&mut tall, 3, 5, ChannelType::Luma, ScanType::Diagonal);
        assert_eq!(wide.last_x_bits, tall.last_x_bits);
        assert_eq!(wide.last_y_bits, tall.last_y_bits);
    }

    #[test]
    fn test_estimates_track_adaptation() {
        let mut params = CodingParameters::hevc();
        params.sequence.persistent_rice_adaptation = true;
        params.picture.transform_skip = false;
        let mut sbac = counter(params);

        let mut before = EstBitsSbac::default();
        sbac.est_bit(&mut before, 2, 2, ChannelType::Luma, ScanType::Diagonal);

        let mut coefficients = [0; 16];
        coefficients[0] = 40;
        sbac.code_coeff_nxn(&ResidualBlock::new(ComponentId::Y, 2, 2, &coefficients));

        let mut after = EstBitsSbac::default();
        sbac.est_bit(&mut after, 2, 2, ChannelType::Luma, ScanType::Diagonal);
        assert_ne!(before.greater_one_bits, after.greater_one_bits);
        assert_eq!(after.golomb_rice_adaptation_statistics, [1, 0, 0, 0]);
        assert_eq!(after.significant_bits[NUM_SIG_FLAG_CTX_LUMA..], [[0; 2]; NUM_SIG_FLAG_CTX_CHROMA]);
    }

    #[test]
    fn test_pu_bits_follow_contexts() {
        let sbac = counter(CodingParameters::jem());
        let mut est = EstPuBits::default();
        sbac.est_pu_bits(&mut est);
        let merge_flag = sbac.contexts().get(ContextGroup::MergeFlag, 0, 0);
        assert_eq!(est.merge_flag_bits[0], [merge_flag.entropy_bits(0), merge_flag.entropy_bits(1)]);
        assert!(est.imv_flag_bits.iter().all(|costs| costs[0] > 0 && costs[1] > 0));
    }

    #[test]
    fn test_fruc_mode_bits_leave_other_costs() {
        let sbac = counter(CodingParameters::jem());
        let mut est = EstPuBits::default();
        sbac.est_fruc_mode_bit(&mut est);
        let first_mode = sbac.contexts().get(ContextGroup::FrucMrgMode, 0, 0);
        assert_eq!(est.fruc_mrg_bits[0], [first_mode.entropy_bits(0), first_mode.entropy_bits(1)]);
        assert!(est.fruc_me_bits.iter().all(|costs| costs[0] > 0 && costs[1] > 0));
        assert_eq!(est.merge_flag_bits, EstPuBits::default().merge_flag_bits);
    }
}
