use crate::cabac::tables::{ENTROPY_BITS, NEXT_STATE_LPS, NEXT_STATE_MPS, TERMINATE_STATE};

/// Init value that maps to the equiprobable state at every QP ("context not used").
pub const CNU: u8 = 154;

const MIN_QP: i32 = 0;
const MAX_QP: i32 = 51;

/// A single adaptive binary probability estimate.
///
/// The state is kept packed as `(state << 1) | mps`, which is also the index
/// layout of the entropy-bits table.
///
/// A window size, when assigned, travels with the model through store and
/// load. The 64-state tables adapt at a fixed rate regardless of it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ContextModel {
    packed_state: u8,
    bins_coded: bool,
    window_size: Option<u8>,
}

impl ContextModel {
    pub fn new(state: u8, mps: u8) -> Self {
        debug_assert!(state < 64 && mps <= 1);
        Self {
            packed_state: (state << 1) | mps,
            bins_coded: false,
            window_size: None,
        }
    }

    /// Builds a context initialized from `init_value` at `qp`.
    pub fn with_init(qp: i32, init_value: u8) -> Self {
        let mut model = Self::default();
        model.init(qp, init_value);
        model
    }

    pub fn state(&self) -> u8 {
        self.packed_state >> 1
    }

    pub fn mps(&self) -> u8 {
        self.packed_state & 1
    }

    pub fn packed_state(&self) -> u8 {
        self.packed_state
    }

    /// Initialization (9.3.2.2): slope/offset from the init value, linear in QP.
    pub fn init(&mut self, qp: i32, init_value: u8) {
        let qp = qp.clamp(MIN_QP, MAX_QP);

        let slope = ((init_value as i32) >> 4) * 5 - 45;
        let offset = (((init_value as i32) & 15) << 3) - 16;
        let init_state = (((slope * qp) >> 4) + offset).clamp(1, 126);

        let mps = (init_state >= 64) as u8;
        let state = if mps == 1 { init_state - 64 } else { 63 - init_state } as u8;
        self.packed_state = (state << 1) | mps;
        self.bins_coded = false;
        self.window_size = None;
    }

    pub fn update_lps(&mut self) {
        let state = self.state();
        let mps = if state == 0 { 1 - self.mps() } else { self.mps() };
        self.packed_state = (NEXT_STATE_LPS[state as usize] << 1) | mps;
    }

    pub fn update_mps(&mut self) {
        self.packed_state = (NEXT_STATE_MPS[self.state() as usize] << 1) | self.mps();
    }

    /// Fractional cost (15-bit fixed point) of coding `bin` with this context.
    pub fn entropy_bits(&self, bin: u32) -> u32 {
        debug_assert!(bin <= 1);
        ENTROPY_BITS[(self.packed_state as usize) ^ bin as usize]
    }

    /// Fractional cost of a terminate bin.
    pub fn entropy_bits_trm(bin: u32) -> u32 {
        debug_assert!(bin <= 1);
        ENTROPY_BITS[TERMINATE_STATE ^ bin as usize]
    }

    pub fn set_bins_coded(&mut self) {
        self.bins_coded = true;
    }

    pub fn bins_coded(&self) -> bool {
        self.bins_coded
    }

    pub fn set_window_size(&mut self, window_size: u8) {
        self.window_size = Some(window_size);
    }

    /// log2 adaptation window assigned after initialization, if any.
    pub fn window_size(&self) -> Option<u8> {
        self.window_size
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_matches_reference_states() {
        // split_cu_flag, B slice, first context
        let model = ContextModel::with_init(26, 139);
        assert_eq!((model.state(), model.mps()), (0, 0));

        let model = ContextModel::with_init(26, CNU);
        assert_eq!((model.state(), model.mps()), (0, 1), "CNU is equiprobable with MPS 1");

        let model = ContextModel::with_init(32, 197);
        assert_eq!((model.state(), model.mps()), (9, 0));
    }

    #[test]
    fn test_init_clips_qp_and_state() {
        let low = ContextModel::with_init(-12, 107);
        let zero = ContextModel::with_init(0, 107);
        assert_eq!(low, zero);

        let high = ContextModel::with_init(70, 107);
        let max = ContextModel::with_init(51, 107);
        assert_eq!(high, max);

        // init value 0: slope -45, offset -16 => clipped to 1 at QP 0
        let model = ContextModel::with_init(0, 0);
        assert_eq!((model.state(), model.mps()), (62, 0));
    }

    #[test]
    fn test_mps_updates_saturate() {
        let mut model = ContextModel::new(0, 1);
        let mut previous_cost = model.entropy_bits(1);
        for _ in 0..100 {
            model.update_mps();
            let cost = model.entropy_bits(1);
            assert!(cost <= previous_cost, "coding the MPS never gets more expensive");
            previous_cost = cost;
        }
        assert_eq!(model.state(), 62);
        assert_eq!(model.mps(), 1);
    }

    #[test]
    fn test_lps_at_state_zero_flips_mps() {
        let mut model = ContextModel::new(0, 0);
        model.update_lps();
        assert_eq!((model.state(), model.mps()), (0, 1));

        let mut model = ContextModel::new(10, 1);
        model.update_lps();
        assert_eq!((model.state(), model.mps()), (8, 1));
    }

    #[test]
    fn test_init_resets_bins_coded() {
        let mut model = ContextModel::with_init(30, CNU);
        model.set_bins_coded();
        assert!(model.bins_coded());
        model.init(30, CNU);
        assert!(!model.bins_coded());
    }

    #[test]
    fn test_window_size_does_not_change_adaptation() {
        let mut plain = ContextModel::with_init(30, 139);
        let mut windowed = plain;
        windowed.set_window_size(6);
        for bin in [1, 1, 0, 1, 0, 0, 0] {
            for model in [&mut plain, &mut windowed] {
                if bin == model.mps() as u32 {
                    model.update_mps();
                } else {
                    model.update_lps();
                }
            }
        }
        assert_eq!(windowed.packed_state(), plain.packed_state());
        assert_eq!(windowed.window_size(), Some(6));

        windowed.init(30, 139);
        assert_eq!(windowed.window_size(), None);
    }
}
