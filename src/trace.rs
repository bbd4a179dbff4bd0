//! Line-oriented bin traces.
//!
//! A trace lists the bins of a slice in coding order, one command per line:
//!
//! ```text
//! # comment
//! ctx split_flag 1 1
//! ep 5 3
//! trm 1
//! align
//! pcm 128 8
//! ```
//!
//! `ctx` names a context group, by name or numeric id, and an index counted
//! across all sets of the group. Consecutive `pcm` lines form one PCM block: the first one aligns the
//! stream after the preceding terminate bin, and the engine restarts after the
//! last one.

use crate::cabac::{BinEncoder, CabacDecoder, ContextGroup, ContextStore};
use crate::error::CabacError;

const MAX_EP_BINS: u32 = 32;
const MAX_PCM_BITS: u32 = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraceCommand {
    Ctx { group: ContextGroup, index: usize, bin: u32 },
    Ep { value: u32, count: u32 },
    Trm { bin: u32 },
    Align,
    Pcm { value: u32, bits: u32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TraceLine {
    /// 1-based line number in the source text.
    pub line: usize,
    pub command: TraceCommand,
}

fn invalid(line: usize, reason: impl Into<String>) -> CabacError {
    CabacError::InvalidTrace {
        line,
        reason: reason.into(),
    }
}

fn parse_number(line: usize, token: Option<&str>, what: &str) -> Result<u32, CabacError> {
    let token = token.ok_or_else(|| invalid(line, format!("missing {what}")))?;
    token
        .parse()
        .map_err(|_| invalid(line, format!("{what} '{token}' is not a number")))
}

fn parse_bin(line: usize, token: Option<&str>) -> Result<u32, CabacError> {
    match parse_number(line, token, "bin")? {
        bin @ (0 | 1) => Ok(bin),
        bin => Err(invalid(line, format!("bin {bin} is neither 0 nor 1"))),
    }
}

fn parse_fixed_length(line: usize, value: Option<&str>, length: Option<&str>, max_length: u32) -> Result<(u32, u32), CabacError> {
    let value = parse_number(line, value, "value")?;
    let length = parse_number(line, length, "length")?;
    if length == 0 || length > max_length {
        return Err(invalid(line, format!("length {length} outside 1..={max_length}")));
    }
    if length < 32 && value >> length != 0 {
        return Err(invalid(line, format!("value {value} does not fit in {length} bits")));
    }
    Ok((value, length))
}

fn parse_line(line: usize, text: &str) -> Result<Option<TraceCommand>, CabacError> {
    let text = text.split('#').next().unwrap_or_default();
    let mut tokens = text.split_whitespace();
    let Some(keyword) = tokens.next() else {
        return Ok(None);
    };

    let command = match keyword {
        "ctx" => {
            let name = tokens.next().ok_or_else(|| invalid(line, "missing context group"))?;
            let group = ContextGroup::parse(name)?;
            let index = parse_number(line, tokens.next(), "context index")? as usize;
            ContextStore::checked_index(group, index)?;
            let bin = parse_bin(line, tokens.next())?;
            TraceCommand::Ctx { group, index, bin }
        }
        "ep" => {
            let (value, count) = parse_fixed_length(line, tokens.next(), tokens.next(), MAX_EP_BINS)?;
            TraceCommand::Ep { value, count }
        }
        "trm" => TraceCommand::Trm {
            bin: parse_bin(line, tokens.next())?,
        },
        "align" => TraceCommand::Align,
        "pcm" => {
            let (value, bits) = parse_fixed_length(line, tokens.next(), tokens.next(), MAX_PCM_BITS)?;
            TraceCommand::Pcm { value, bits }
        }
        other => return Err(invalid(line, format!("unknown command '{other}'"))),
    };

    if let Some(extra) = tokens.next() {
        return Err(invalid(line, format!("unexpected '{extra}'")));
    }
    Ok(Some(command))
}

/// Parses a trace, skipping blank lines and comments.
pub fn parse_trace(text: &str) -> Result<Vec<TraceLine>, CabacError> {
    let mut trace = Vec::new();
    let mut previous: Option<TraceCommand> = None;
    for (number, text) in text.lines().enumerate() {
        let line = number + 1;
        let Some(command) = parse_line(line, text)? else {
            continue;
        };

        if let TraceCommand::Pcm { .. } = command {
            if !matches!(previous, Some(TraceCommand::Pcm { .. } | TraceCommand::Trm { bin: 1 })) {
                lwarn!("line {}: pcm data without a preceding terminate bin", line);
            }
        }
        previous = Some(command);
        trace.push(TraceLine { line, command });
    }
    ldebug!("parsed {} trace commands", trace.len());
    Ok(trace)
}

/// Codes every command of `trace`. Ending the stream is left to the caller.
pub fn encode_trace<E: BinEncoder>(
    bin_if: &mut E,
    contexts: &mut ContextStore,
    trace: &[TraceLine],
) -> Result<(), CabacError> {
    let mut in_pcm = false;
    for entry in trace {
        if in_pcm && !matches!(entry.command, TraceCommand::Pcm { .. }) {
            bin_if.reset_bac();
            in_pcm = false;
        }
        match entry.command {
            TraceCommand::Ctx { group, index, bin } => {
                let position = ContextStore::checked_index(group, index)?;
                bin_if.encode_bin(bin, contexts.model_at_mut(position));
            }
            TraceCommand::Ep { value, count } => bin_if.encode_bins_ep(value, count),
            TraceCommand::Trm { bin } => bin_if.encode_bin_trm(bin),
            TraceCommand::Align => bin_if.align(),
            TraceCommand::Pcm { value, bits } => {
                if !in_pcm {
                    bin_if.encode_pcm_align_bits();
                    in_pcm = true;
                }
                bin_if.write_pcm_code(value, bits);
            }
        }
    }

    if in_pcm {
        bin_if.reset_bac();
    }
    Ok(())
}

/// Decodes `trace.len()` commands from `decoder` and checks every value
/// against the trace.
pub fn verify_trace(
    decoder: &mut CabacDecoder,
    contexts: &mut ContextStore,
    trace: &[TraceLine],
) -> Result<(), CabacError> {
    let mut in_pcm = false;
    for entry in trace {
        if in_pcm && !matches!(entry.command, TraceCommand::Pcm { .. }) {
            decoder.reset_bac();
            in_pcm = false;
        }
        let (expected, decoded) = match entry.command {
            TraceCommand::Ctx { group, index, bin } => {
                let position = ContextStore::checked_index(group, index)?;
                (bin, decoder.decode_bin(contexts.model_at_mut(position)))
            }
            TraceCommand::Ep { value, count } => (value, decoder.decode_bins_ep(count)),
            TraceCommand::Trm { bin } => (bin, decoder.decode_bin_trm()),
            TraceCommand::Align => {
                decoder.align();
                continue;
            }
            TraceCommand::Pcm { value, bits } => {
                if !in_pcm {
                    decoder.decode_pcm_align_bits();
                    in_pcm = true;
                }
                (value, decoder.read_pcm_code(bits)?)
            }
        };
        if expected != decoded {
            return Err(CabacError::BinMismatch {
                line: entry.line,
                expected,
                decoded,
            });
        }
    }
    Ok(())
}
