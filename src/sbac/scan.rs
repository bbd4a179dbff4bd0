//! Coefficient scan orders and the significance context derivations that depend on them.

use crate::constants::*;
use crate::{ChannelType, ScanType};

/// Walks a `width` x `height` block in one scan order, yielding `(x, y)`.
#[derive(Debug, Clone)]
pub struct ScanGenerator {
    width: u32,
    height: u32,
    scan_type: ScanType,
    x: u32,
    y: u32,
    remaining: u32,
}

impl ScanGenerator {
    pub fn new(width: u32, height: u32, scan_type: ScanType) -> Self {
        Self {
            width,
            height,
            scan_type,
            x: 0,
            y: 0,
            remaining: width * height,
        }
    }

    fn advance(&mut self) {
        match self.scan_type {
            ScanType::Diagonal => {
                if self.x == self.width - 1 || self.y == 0 {
                    self.y += self.x + 1;
                    self.x = 0;
                    if self.y >= self.height {
                        self.x += self.y - (self.height - 1);
                        self.y = self.height - 1;
                    }
                } else {
                    self.x += 1;
                    self.y -= 1;
                }
            }
            ScanType::Horizontal => {
                self.x += 1;
                if self.x == self.width {
                    self.x = 0;
                    self.y += 1;
                }
            }
            ScanType::Vertical => {
                self.y += 1;
                if self.y == self.height {
                    self.y = 0;
                    self.x += 1;
                }
            }
        }
    }
}

impl Iterator for ScanGenerator {
    type Item = (u32, u32);

    fn next(&mut self) -> Option<(u32, u32)> {
        if self.remaining == 0 {
            return None;
        }
        let position = (self.x, self.y);
        self.remaining -= 1;
        if self.remaining > 0 {
            self.advance();
        }
        Some(position)
    }
}

/// Scan of a transform block in 4x4 coefficient groups.
///
/// Groups are visited in the scan order of the group grid, and the sixteen
/// positions of each group in the same order. Positions are raster indices
/// `y * width + x`.
#[derive(Debug, Clone)]
pub struct ScanOrder {
    positions: [u16; MAX_TU_COEFFS],
    groups: [u16; MAX_CG_COUNT],
    num_positions: usize,
    num_groups: usize,
    log2_width: u32,
    log2_height: u32,
    scan_type: ScanType,
}

impl ScanOrder {
    pub fn new(log2_width: u32, log2_height: u32, scan_type: ScanType) -> Self {
        debug_assert!((2..=MAX_LOG2_TU_SIZE).contains(&log2_width), "width 1 << {log2_width}");
        debug_assert!((2..=MAX_LOG2_TU_SIZE).contains(&log2_height), "height 1 << {log2_height}");

        let width = 1 << log2_width;
        let width_in_groups = width >> MLS_CG_LOG2_WIDTH;
        let height_in_groups = (1 << log2_height) >> MLS_CG_LOG2_HEIGHT;

        let mut order = Self {
            positions: [0; MAX_TU_COEFFS],
            groups: [0; MAX_CG_COUNT],
            num_positions: 0,
            num_groups: 0,
            log2_width,
            log2_height,
            scan_type,
        };

        for (group_x, group_y) in ScanGenerator::new(width_in_groups, height_in_groups, scan_type) {
            order.groups[order.num_groups] = (group_y * width_in_groups + group_x) as u16;
            order.num_groups += 1;

            let offset_x = group_x << MLS_CG_LOG2_WIDTH;
            let offset_y = group_y << MLS_CG_LOG2_HEIGHT;
            for (x, y) in ScanGenerator::new(1 << MLS_CG_LOG2_WIDTH, 1 << MLS_CG_LOG2_HEIGHT, scan_type) {
                order.positions[order.num_positions] = ((offset_y + y) * width + offset_x + x) as u16;
                order.num_positions += 1;
            }
        }
        order
    }

    /// Raster position of every coefficient in scan order.
    pub fn positions(&self) -> &[u16] {
        &self.positions[..self.num_positions]
    }

    /// Raster index in the group grid of every coefficient group in scan order.
    pub fn groups(&self) -> &[u16] {
        &self.groups[..self.num_groups]
    }

    pub fn log2_width(&self) -> u32 {
        self.log2_width
    }

    pub fn log2_height(&self) -> u32 {
        self.log2_height
    }

    pub fn scan_type(&self) -> ScanType {
        self.scan_type
    }

    pub fn width_in_groups(&self) -> u32 {
        1 << (self.log2_width - MLS_CG_LOG2_WIDTH)
    }

    pub fn height_in_groups(&self) -> u32 {
        1 << (self.log2_height - MLS_CG_LOG2_HEIGHT)
    }
}

const CTX_IND_MAP_4X4: [u8; 16] = [0, 1, 4, 5, 2, 3, 4, 5, 6, 6, 8, 8, 7, 7, 8, 8];

/// Context of `coded_sub_block_flag`: 1 when the group to the right or below is significant.
pub fn sig_coeff_group_ctx_inc(
    sig_groups: &[bool],
    group_x: u32,
    group_y: u32,
    width_in_groups: u32,
    height_in_groups: u32,
) -> usize {
    let right = group_x + 1 < width_in_groups && sig_groups[(group_y * width_in_groups + group_x + 1) as usize];
    let below = group_y + 1 < height_in_groups && sig_groups[((group_y + 1) * width_in_groups + group_x) as usize];
    (right || below) as usize
}

/// Significance of the right (bit 0) and lower (bit 1) neighbouring groups.
pub fn pattern_sig_ctx(
    sig_groups: &[bool],
    group_x: u32,
    group_y: u32,
    width_in_groups: u32,
    height_in_groups: u32,
) -> u32 {
    if width_in_groups <= 1 && height_in_groups <= 1 {
        return 0;
    }
    let right = group_x + 1 < width_in_groups && sig_groups[(group_y * width_in_groups + group_x + 1) as usize];
    let below = group_y + 1 < height_in_groups && sig_groups[((group_y + 1) * width_in_groups + group_x) as usize];
    right as u32 + 2 * below as u32
}

/// First significance context of a transform block, relative to its channel's contexts.
pub fn first_sig_ctx(
    log2_width: u32,
    log2_height: u32,
    channel_type: ChannelType,
    scan_type: ScanType,
    single_context: bool,
) -> usize {
    let luma = channel_type == ChannelType::Luma;
    if single_context {
        return if luma { SIG_CTX_LUMA_SINGLE } else { SIG_CTX_CHROMA_SINGLE };
    }
    match (log2_width, log2_height) {
        (2, 2) => SIG_CTX_OFFSET_4X4,
        (3, 3) => {
            if luma && scan_type != ScanType::Diagonal {
                SIG_CTX_OFFSET_8X8 + NON_DIAGONAL_SCAN_8X8_LUMA_OFFSET
            } else {
                SIG_CTX_OFFSET_8X8
            }
        }
        _ => {
            if luma {
                SIG_CTX_LUMA_NXN
            } else {
                SIG_CTX_CHROMA_NXN
            }
        }
    }
}

/// Offset of a channel's significance contexts in the `sig_flag` group.
pub fn sig_ctx_channel_offset(channel_type: ChannelType) -> usize {
    match channel_type {
        ChannelType::Luma => 0,
        ChannelType::Chroma => NUM_SIG_FLAG_CTX_LUMA,
    }
}

/// Context of `sig_coeff_flag` at `(pos_x, pos_y)`, relative to the channel's contexts.
pub fn sig_ctx_inc(
    pattern_sig_ctx: u32,
    first_ctx: usize,
    pos_x: u32,
    pos_y: u32,
    log2_width: u32,
    log2_height: u32,
    channel_type: ChannelType,
) -> usize {
    let luma = channel_type == ChannelType::Luma;
    if first_ctx == SIG_CTX_LUMA_SINGLE && luma || first_ctx == SIG_CTX_CHROMA_SINGLE && !luma {
        return first_ctx;
    }

    if pos_x == 0 && pos_y == 0 {
        return 0;
    }

    if log2_width == 2 && log2_height == 2 {
        return CTX_IND_MAP_4X4[((pos_y << 2) + pos_x) as usize] as usize;
    }

    let x_in_group = pos_x & 3;
    let y_in_group = pos_y & 3;
    let count = match pattern_sig_ctx {
        0 => match x_in_group + y_in_group {
            total if total >= 3 => 0,
            total if total >= 1 => 1,
            _ => 2,
        },
        1 => match y_in_group {
            0 => 2,
            1 => 1,
            _ => 0,
        },
        2 => match x_in_group {
            0 => 2,
            1 => 1,
            _ => 0,
        },
        _ => 2,
    };

    let not_first_group = (pos_x >> MLS_CG_LOG2_WIDTH) + (pos_y >> MLS_CG_LOG2_HEIGHT) > 0;
    let offset = if luma && not_first_group { NOT_FIRST_GROUP_LUMA_OFFSET } else { 0 };
    first_ctx + offset + count
}

/// Greater-1 context set: luma sets 0..3, chroma sets 4..5.
pub fn context_set_index(channel_type: ChannelType, subset: usize, found_greater_one: bool) -> usize {
    let luma = channel_type == ChannelType::Luma;
    let not_first_subset = if luma && subset > 0 { 2 } else { 0 };
    let set = not_first_subset + found_greater_one as usize;
    if luma { set } else { set + 4 }
}

/// Context offsets of the last-position prefix: `(offset, shift)`.
pub fn last_significant_context_params(channel_type: ChannelType, log2_size: u32) -> (usize, u32) {
    match channel_type {
        ChannelType::Luma => {
            let c = log2_size - 2;
            ((3 * c + ((c + 1) >> 2)) as usize, (c + 3) >> 2)
        }
        ChannelType::Chroma => (0, log2_size - 2),
    }
}

/// Prefix group of each last-position coordinate, up to 32.
pub const GROUP_IDX: [u8; MAX_TU_SIZE] = [
    0, 1, 2, 3, 4, 4, 5, 5, 6, 6, 6, 6, 7, 7, 7, 7, 8, 8, 8, 8, 8, 8, 8, 8, 9, 9, 9, 9, 9, 9, 9, 9,
];

/// Smallest coordinate in each prefix group.
pub const MIN_IN_GROUP: [u8; LAST_SIGNIFICANT_GROUPS] = [0, 1, 2, 3, 4, 6, 8, 12, 16, 24];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diagonal_4x4() {
        let scan: Vec<(u32, u32)> = ScanGenerator::new(4, 4, ScanType::Diagonal).collect();
        assert_eq!(&scan[..6], &[(0, 0), (0, 1), (1, 0), (0, 2), (1, 1), (2, 0)]);
        assert_eq!(scan[15], (3, 3));
    }

    #[test]
    fn test_diagonal_rectangular_visits_every_position() {
        let scan: Vec<(u32, u32)> = ScanGenerator::new(2, 4, ScanType::Diagonal).collect();
        assert_eq!(scan, vec![(0, 0), (0, 1), (1, 0), (0, 2), (1, 1), (0, 3), (1, 2), (1, 3)]);
    }

    #[test]
    fn test_grouped_8x8_horizontal() {
        let order = ScanOrder::new(3, 3, ScanType::Horizontal);
        assert_eq!(order.groups(), &[0, 1, 2, 3]);
        assert_eq!(&order.positions()[..5], &[0, 1, 2, 3, 8]);
        assert_eq!(order.positions()[16], 4);
        assert_eq!(order.positions()[63], 63);
    }

    #[test]
    fn test_grouped_scan_is_a_permutation() {
        for (log2_width, log2_height) in [(2, 2), (3, 3), (4, 4), (5, 5), (2, 5), (5, 3)] {
            for scan_type in [ScanType::Diagonal, ScanType::Horizontal, ScanType::Vertical] {
                let order = ScanOrder::new(log2_width, log2_height, scan_type);
                let mut seen = vec![false; 1 << (log2_width + log2_height)];
                for &position in order.positions() {
                    assert!(!seen[position as usize]);
                    seen[position as usize] = true;
                }
                assert!(seen.iter().all(|&s| s));
            }
        }
    }

    #[test]
    fn test_sig_ctx_inc() {
        assert_eq!(sig_ctx_inc(0, 0, 0, 0, 2, 2, ChannelType::Luma), 0);
        assert_eq!(sig_ctx_inc(0, 0, 3, 3, 2, 2, ChannelType::Luma), 8);
        assert_eq!(sig_ctx_inc(0, 0, 1, 0, 2, 2, ChannelType::Chroma), 1);

        let first = first_sig_ctx(4, 4, ChannelType::Luma, ScanType::Diagonal, false);
        assert_eq!(first, SIG_CTX_LUMA_NXN);
        // pattern 0, second group: x + y in group = 0 -> 2, plus 3 outside the first group
        assert_eq!(sig_ctx_inc(0, first, 4, 0, 4, 4, ChannelType::Luma), 21 + 3 + 2);
        assert_eq!(sig_ctx_inc(3, first, 1, 1, 4, 4, ChannelType::Luma), 21 + 2);
        assert_eq!(sig_ctx_inc(1, 12, 5, 2, 4, 4, ChannelType::Chroma), 12);

        let first = first_sig_ctx(3, 3, ChannelType::Luma, ScanType::Vertical, false);
        assert_eq!(first, 15);
        let single = first_sig_ctx(3, 3, ChannelType::Chroma, ScanType::Diagonal, true);
        assert_eq!(sig_ctx_inc(2, single, 2, 1, 3, 3, ChannelType::Chroma), 15);
    }

    #[test]
    fn test_group_contexts() {
        let sig_groups = [false, true, false, false];
        assert_eq!(sig_coeff_group_ctx_inc(&sig_groups, 0, 0, 2, 2), 1);
        assert_eq!(sig_coeff_group_ctx_inc(&sig_groups, 0, 1, 2, 2), 0);
        assert_eq!(pattern_sig_ctx(&sig_groups, 0, 0, 2, 2), 1);
        assert_eq!(pattern_sig_ctx(&[true], 0, 0, 1, 1), 0);
    }

    #[test]
    fn test_context_set_index() {
        assert_eq!(context_set_index(ChannelType::Luma, 0, false), 0);
        assert_eq!(context_set_index(ChannelType::Luma, 2, true), 3);
        assert_eq!(context_set_index(ChannelType::Chroma, 2, true), 5);
    }

    #[test]
    fn test_last_context_params() {
        assert_eq!(last_significant_context_params(ChannelType::Luma, 2), (0, 0));
        assert_eq!(last_significant_context_params(ChannelType::Luma, 3), (3, 1));
        assert_eq!(last_significant_context_params(ChannelType::Luma, 4), (6, 1));
        assert_eq!(last_significant_context_params(ChannelType::Luma, 5), (10, 1));
        assert_eq!(last_significant_context_params(ChannelType::Chroma, 4), (0, 2));
    }
}
