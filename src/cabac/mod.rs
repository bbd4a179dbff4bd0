//! Context modelling and binary arithmetic coding.

pub mod bin_decoder;
pub mod bin_encoder;
pub mod bit_io;
pub mod context_model;
pub mod context_store;
pub mod context_tables;
pub mod tables;

pub use bin_decoder::CabacDecoder;
pub use bin_encoder::{BinEncoder, CabacCounter, CabacEncoder};
pub use bit_io::{BitCounter, BitSink, BitWriter};
pub use context_model::{CNU, ContextModel};
pub use context_store::{ContextGroup, ContextStore, TOTAL_CONTEXTS};
pub use tables::FRAC_BITS_PRECISION;

/// Converts a 15-bit fixed-point fractional cost to (fractional) bits.
pub fn frac_bits_to_bits(frac_bits: u64) -> f64 {
    frac_bits as f64 / (1u64 << FRAC_BITS_PRECISION) as f64
}
