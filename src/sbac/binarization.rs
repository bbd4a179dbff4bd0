//! Binarizations shared by the syntax-element coders, with their parsing mirrors.
//!
//! Context-coded binarizations take the slice of models they may touch: bin 0
//! uses `models[0]`, every following bin uses `models[offset]`.

use crate::cabac::{BinEncoder, CabacDecoder, ContextModel};
use crate::constants::COEF_REMAIN_BIN_REDUCTION;

/// Truncated unary: `symbol` ones and a terminating zero that is dropped at `max_symbol`.
pub fn write_unary_max_symbol<E: BinEncoder>(
    bin_if: &mut E,
    models: &mut [ContextModel],
    symbol: u32,
    offset: usize,
    max_symbol: u32,
) {
    if max_symbol == 0 {
        return;
    }
    debug_assert!(symbol <= max_symbol, "symbol {symbol} above maximum {max_symbol}");

    bin_if.encode_bin((symbol != 0) as u32, &mut models[0]);
    if symbol == 0 {
        return;
    }

    for _ in 1..symbol {
        bin_if.encode_bin(1, &mut models[offset]);
    }
    if max_symbol > symbol {
        bin_if.encode_bin(0, &mut models[offset]);
    }
}

pub fn write_unary_symbol<E: BinEncoder>(bin_if: &mut E, models: &mut [ContextModel], symbol: u32, offset: usize) {
    bin_if.encode_bin((symbol != 0) as u32, &mut models[0]);
    if symbol == 0 {
        return;
    }
    for _ in 1..symbol {
        bin_if.encode_bin(1, &mut models[offset]);
    }
    bin_if.encode_bin(0, &mut models[offset]);
}

/// Number of bits `k` such that `2^k <= max_symbol < 2^(k+1)`.
fn floor_log2(value: u32) -> u32 {
    debug_assert!(value > 0);
    31 - value.leading_zeros()
}

/// Truncated binary code of `symbol` in `[0, max_symbol)`, all bypass bins.
pub fn write_trunc_bin_code<E: BinEncoder>(bin_if: &mut E, symbol: u32, max_symbol: u32) {
    debug_assert!(symbol < max_symbol, "symbol {symbol} not below {max_symbol}");
    let thresh = floor_log2(max_symbol);
    let val = 1 << thresh;
    let b = max_symbol - val;

    if symbol < val - b {
        bin_if.encode_bins_ep(symbol, thresh);
    } else {
        bin_if.encode_bins_ep(symbol + val - b, thresh + 1);
    }
}

/// k-th order Exp-Golomb in bypass bins.
pub fn write_ep_ex_golomb<E: BinEncoder>(bin_if: &mut E, symbol: u32, count: u32) {
    let mut symbol = symbol;
    let mut count = count;
    let mut bins = 0u32;
    let mut num_bins = 0u32;

    while symbol >= (1 << count) {
        bins = 2 * bins + 1;
        num_bins += 1;
        symbol -= 1 << count;
        count += 1;
    }
    bins *= 2;
    num_bins += 1;

    bins = (bins << count) | symbol;
    num_bins += count;

    debug_assert!(num_bins <= 32, "exp-golomb code of {num_bins} bins");
    bin_if.encode_bins_ep(bins, num_bins);
}

/// Longest unary prefix of a remainder code when its length is limited.
pub fn max_coef_remain_prefix_length(max_log2_tr_dynamic_range: u32) -> u32 {
    32 - (COEF_REMAIN_BIN_REDUCTION + max_log2_tr_dynamic_range)
}

/// Golomb-Rice code of a coefficient remainder with an Exp-Golomb escape (ITU-T H.265, 9.3.3.11).
///
/// Below `3 << r_param` the value is a Rice code with parameter `r_param`.
/// Above it, the escape is an Exp-Golomb code whose prefix is capped when
/// `use_limited_prefix_length` is set.
pub fn write_coef_remain_ex_golomb<E: BinEncoder>(
    bin_if: &mut E,
    symbol: u32,
    r_param: u32,
    use_limited_prefix_length: bool,
    max_log2_tr_dynamic_range: u32,
) {
    let code_number = symbol;

    if code_number < (COEF_REMAIN_BIN_REDUCTION << r_param) {
        let length = code_number >> r_param;
        bin_if.encode_bins_ep((1 << (length + 1)) - 2, length + 1);
        bin_if.encode_bins_ep(code_number % (1 << r_param), r_param);
    } else if use_limited_prefix_length {
        let maximum_prefix_length = max_coef_remain_prefix_length(max_log2_tr_dynamic_range);

        let mut prefix_length = 0;
        let suffix_length;
        let code_value = (symbol >> r_param) - COEF_REMAIN_BIN_REDUCTION;

        if code_value >= (1 << maximum_prefix_length) - 1 {
            prefix_length = maximum_prefix_length;
            suffix_length = max_log2_tr_dynamic_range - r_param;
        } else {
            while code_value > (2 << prefix_length) - 2 {
                prefix_length += 1;
            }
            // one more for the separator
            suffix_length = prefix_length + 1;
        }

        let suffix = code_value - ((1 << prefix_length) - 1);
        let total_prefix_length = prefix_length + COEF_REMAIN_BIN_REDUCTION;
        let prefix = ((1u64 << total_prefix_length) - 1) as u32;
        let r_param_mask = (1 << r_param) - 1;

        bin_if.encode_bins_ep(prefix, total_prefix_length);
        bin_if.encode_bins_ep((suffix << r_param) | (symbol & r_param_mask), suffix_length + r_param);
    } else {
        let mut length = r_param;
        let mut code_number = code_number - (COEF_REMAIN_BIN_REDUCTION << r_param);

        while code_number >= (1 << length) {
            code_number -= 1 << length;
            length += 1;
        }

        let prefix_bins = COEF_REMAIN_BIN_REDUCTION + length + 1 - r_param;
        bin_if.encode_bins_ep((1 << prefix_bins) - 2, prefix_bins);
        bin_if.encode_bins_ep(code_number, length);
    }
}

/// Truncated unary in bypass bins, used by SAO offsets.
pub fn write_sao_max_uvlc<E: BinEncoder>(bin_if: &mut E, code: u32, max_symbol: u32) {
    debug_assert!(code <= max_symbol);
    if max_symbol == 0 {
        return;
    }

    if code == 0 {
        bin_if.encode_bin_ep(0);
        return;
    }

    bin_if.encode_bin_ep(1);
    for _ in 1..code {
        bin_if.encode_bin_ep(1);
    }
    if max_symbol > code {
        bin_if.encode_bin_ep(0);
    }
}

pub fn read_unary_max_symbol(
    decoder: &mut CabacDecoder,
    models: &mut [ContextModel],
    offset: usize,
    max_symbol: u32,
) -> u32 {
    if max_symbol == 0 || decoder.decode_bin(&mut models[0]) == 0 {
        return 0;
    }

    let mut symbol = 1;
    while symbol < max_symbol && decoder.decode_bin(&mut models[offset]) == 1 {
        symbol += 1;
    }
    symbol
}

pub fn read_unary_symbol(decoder: &mut CabacDecoder, models: &mut [ContextModel], offset: usize) -> u32 {
    if decoder.decode_bin(&mut models[0]) == 0 {
        return 0;
    }

    let mut symbol = 1;
    while decoder.decode_bin(&mut models[offset]) == 1 {
        symbol += 1;
    }
    symbol
}

pub fn read_trunc_bin_code(decoder: &mut CabacDecoder, max_symbol: u32) -> u32 {
    let thresh = floor_log2(max_symbol);
    let val = 1 << thresh;
    let b = max_symbol - val;

    let symbol = decoder.decode_bins_ep(thresh);
    if symbol < val - b {
        symbol
    } else {
        ((symbol << 1) | decoder.decode_bin_ep()) - (val - b)
    }
}

pub fn read_ep_ex_golomb(decoder: &mut CabacDecoder, count: u32) -> u32 {
    let mut count = count;
    let mut symbol = 0u32;

    while count < 32 && decoder.decode_bin_ep() == 1 {
        symbol += 1 << count;
        count += 1;
    }
    symbol + decoder.decode_bins_ep(count)
}

pub fn read_coef_remain_ex_golomb(
    decoder: &mut CabacDecoder,
    r_param: u32,
    use_limited_prefix_length: bool,
    max_log2_tr_dynamic_range: u32,
) -> u32 {
    let longest_possible_prefix = if use_limited_prefix_length {
        max_coef_remain_prefix_length(max_log2_tr_dynamic_range) + COEF_REMAIN_BIN_REDUCTION
    } else {
        32
    };

    let mut prefix = 0u32;
    while prefix < longest_possible_prefix && decoder.decode_bin_ep() == 1 {
        prefix += 1;
    }

    if prefix < COEF_REMAIN_BIN_REDUCTION {
        return (prefix << r_param) + decoder.decode_bins_ep(r_param);
    }

    let suffix_length = if use_limited_prefix_length && prefix == longest_possible_prefix {
        max_log2_tr_dynamic_range - r_param
    } else {
        prefix - COEF_REMAIN_BIN_REDUCTION
    };
    let code_word = decoder.decode_bins_ep(suffix_length + r_param);
    code_word + (((1 << (prefix - COEF_REMAIN_BIN_REDUCTION)) + COEF_REMAIN_BIN_REDUCTION - 1) << r_param)
}

pub fn read_sao_max_uvlc(decoder: &mut CabacDecoder, max_symbol: u32) -> u32 {
    if max_symbol == 0 || decoder.decode_bin_ep() == 0 {
        return 0;
    }

    let mut code = 1;
    while code < max_symbol && decoder.decode_bin_ep() == 1 {
        code += 1;
    }
    code
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cabac::{BitWriter, CabacCounter, CabacEncoder};

    fn finish(mut encoder: CabacEncoder) -> Vec<u8> {
        encoder.encode_bin_trm(1);
        encoder.finish();
        encoder.write_trailing_bits();
        encoder.into_sink().into_data()
    }

    fn models() -> [ContextModel; 4] {
        [ContextModel::with_init(32, 140); 4]
    }

    #[test]
    fn test_unary_max_symbol_round_trip() {
        let mut encoder = CabacEncoder::default();
        let mut encode_models = models();
        for symbol in 0..=5 {
            write_unary_max_symbol(&mut encoder, &mut encode_models, symbol, 1, 5);
        }
        write_unary_max_symbol(&mut encoder, &mut encode_models, 3, 1, 0);
        let data = finish(encoder);

        let mut decoder = CabacDecoder::new(&data);
        let mut decode_models = models();
        for symbol in 0..=5 {
            assert_eq!(read_unary_max_symbol(&mut decoder, &mut decode_models, 1, 5), symbol);
        }
        assert_eq!(read_unary_max_symbol(&mut decoder, &mut decode_models, 1, 0), 0);
        assert_eq!(decoder.decode_bin_trm(), 1);
        assert_eq!(encode_models, decode_models);
    }

    #[test]
    fn test_unary_max_symbol_zero_maximum_codes_nothing() {
        let mut counter = CabacCounter::new();
        let mut counter_models = models();
        write_unary_max_symbol(&mut counter, &mut counter_models, 3, 1, 0);
        assert_eq!(counter.frac_bits(), 0);
        assert_eq!(counter_models, models());
    }

    #[test]
    fn test_unary_symbol_uses_offset_context() {
        let mut encoder = CabacEncoder::default();
        let mut encode_models = models();
        write_unary_symbol(&mut encoder, &mut encode_models, 3, 2);
        assert_eq!(encode_models[1], models()[1], "offset 2 skips context 1");
        let data = finish(encoder);

        let mut decoder = CabacDecoder::new(&data);
        let mut decode_models = models();
        assert_eq!(read_unary_symbol(&mut decoder, &mut decode_models, 2), 3);
    }

    #[test]
    fn test_trunc_bin_code_lengths() {
        // max 45: k = 5, 19 short codes of 5 bits, 26 long codes of 6 bits
        for symbol in 0..45 {
            let mut counter = CabacCounter::new();
            write_trunc_bin_code(&mut counter, symbol, 45);
            let expected = if symbol < 19 { 5 } else { 6 };
            assert_eq!(counter.num_written_bits(), expected, "symbol {symbol}");
        }

        let mut encoder = CabacEncoder::default();
        for symbol in 0..45 {
            write_trunc_bin_code(&mut encoder, symbol, 45);
        }
        let data = finish(encoder);
        let mut decoder = CabacDecoder::new(&data);
        for symbol in 0..45 {
            assert_eq!(read_trunc_bin_code(&mut decoder, 45), symbol);
        }
    }

    #[test]
    fn test_ex_golomb_code_words() {
        // EG0 of 3: prefix 110, suffix 00
        let mut writer = CabacEncoder::new(BitWriter::new());
        writer.align();
        write_ep_ex_golomb(&mut writer, 3, 0);
        let mut counter = CabacCounter::new();
        write_ep_ex_golomb(&mut counter, 3, 0);
        assert_eq!(counter.num_written_bits(), 5);

        let mut counter = CabacCounter::new();
        write_ep_ex_golomb(&mut counter, 0, 1);
        assert_eq!(counter.num_written_bits(), 2);

        let data = finish(writer);
        let mut decoder = CabacDecoder::new(&data);
        decoder.align();
        assert_eq!(read_ep_ex_golomb(&mut decoder, 0), 3);
    }

    #[test]
    fn test_coef_remain_round_trip() {
        let values: Vec<u32> = (0..64).chain([100, 1000, 4095, 65535, 1 << 20]).collect();
        // with a limited prefix the code only spans the transform dynamic range
        for (limited, dynamic_range) in [(false, 15), (true, 22)] {
            for r_param in 0..=4 {
                let mut encoder = CabacEncoder::default();
                for &value in &values {
                    write_coef_remain_ex_golomb(&mut encoder, value, r_param, limited, dynamic_range);
                }
                let data = finish(encoder);
                let mut decoder = CabacDecoder::new(&data);
                for &value in &values {
                    assert_eq!(
                        read_coef_remain_ex_golomb(&mut decoder, r_param, limited, dynamic_range),
                        value,
                        "r_param {r_param}, limited {limited}"
                    );
                }
                assert_eq!(decoder.decode_bin_trm(), 1);
            }
        }
    }

    #[test]
    fn test_limited_prefix_is_capped() {
        // maxLog2TrDynamicRange 15: at most 14 + 3 prefix bins, then 15 - r suffix bins
        let mut counter = CabacCounter::new();
        write_coef_remain_ex_golomb(&mut counter, (1 << 15) - 1, 0, true, 15);
        assert_eq!(counter.num_written_bits(), 17 + 15);

        let mut counter = CabacCounter::new();
        write_coef_remain_ex_golomb(&mut counter, 5, 1, true, 15);
        // Rice region: prefix 11 0, suffix 1 bit
        assert_eq!(counter.num_written_bits(), 4);
    }

    #[test]
    fn test_sao_max_uvlc() {
        let mut counter = CabacCounter::new();
        write_sao_max_uvlc(&mut counter, 7, 7);
        assert_eq!(counter.num_written_bits(), 7);

        let mut encoder = CabacEncoder::default();
        for code in 0..=7 {
            write_sao_max_uvlc(&mut encoder, code, 7);
        }
        write_sao_max_uvlc(&mut encoder, 0, 0);
        let data = finish(encoder);
        let mut decoder = CabacDecoder::new(&data);
        for code in 0..=7 {
            assert_eq!(read_sao_max_uvlc(&mut decoder, 7), code);
        }
        assert_eq!(read_sao_max_uvlc(&mut decoder, 0), 0);
        assert_eq!(decoder.decode_bin_trm(), 1);
    }
}
