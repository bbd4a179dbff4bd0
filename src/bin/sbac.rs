//! sbac CLI - inspect CABAC contexts and encode or verify bin traces.

use clap::{Parser, Subcommand, ValueEnum};
use sbac_rs::cabac::{frac_bits_to_bits, BinEncoder, ContextGroup, ContextStore};
use sbac_rs::trace::{encode_trace, parse_trace, verify_trace};
use sbac_rs::{CabacCounter, CabacDecoder, CabacEncoder, CodingParameters, SbacEncoder, ToolSet};
use std::fs;
use std::path::{Path, PathBuf};

/// CABAC entropy coder for HEVC and JEM syntax elements
#[derive(Parser)]
#[command(name = "sbac")]
#[command(version)]
#[command(about = "Inspect CABAC contexts, encode bin traces and verify streams against them", long_about = None)]
#[command(after_help = "EXAMPLES:
    sbac groups
    sbac init --slice-type i --qp 32 --group split_flag
    sbac encode -i slice.trace -o slice.bin --slice-type b --qp 27 --estimate
    sbac verify -i slice.bin -t slice.trace --slice-type b --qp 27

TRACE FORMAT (one command per line, '#' starts a comment):
    ctx <group name or id> <index> <bin>
    ep <value> <count>
    trm <bin>
    align
    pcm <value> <bits>")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List context groups with their shape and arena offset
    #[command(visible_alias = "g")]
    Groups {
        #[arg(short, long, default_value = "hevc", value_enum)]
        profile: Profile,
    },

    /// Print the initial state and MPS of every context
    #[command(visible_alias = "n")]
    Init {
        #[arg(short, long, default_value = "i", value_enum)]
        slice_type: SliceTypeArg,

        #[arg(short, long, default_value = "32", allow_negative_numbers = true)]
        qp: i32,

        /// Only print this group, by name or numeric id
        #[arg(short, long)]
        group: Option<String>,
    },

    /// Encode a bin trace into a CABAC stream
    #[command(visible_alias = "e")]
    Encode {
        /// Bin trace to encode
        #[arg(short, long)]
        input: PathBuf,

        /// Output stream
        #[arg(short, long)]
        output: PathBuf,

        #[arg(short, long, default_value = "i", value_enum)]
        slice_type: SliceTypeArg,

        #[arg(short, long, default_value = "32", allow_negative_numbers = true)]
        qp: i32,

        #[arg(short, long, default_value = "hevc", value_enum)]
        profile: Profile,

        /// Also report the estimated cost and the preferred init table
        #[arg(long)]
        estimate: bool,
    },

    /// Decode a stream and check every bin against a trace
    #[command(visible_alias = "v")]
    Verify {
        /// Encoded stream
        #[arg(short, long)]
        input: PathBuf,

        /// Bin trace the stream should contain
        #[arg(short, long)]
        trace: PathBuf,

        #[arg(short, long, default_value = "i", value_enum)]
        slice_type: SliceTypeArg,

        #[arg(short, long, default_value = "32", allow_negative_numbers = true)]
        qp: i32,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Profile {
    /// HEVC version 2 syntax
    Hevc,
    /// JEM tool extensions (QTBT, 65 angular modes, OBMC, IC, IMV, affine)
    Jem,
}

impl Profile {
    fn tools(self) -> ToolSet {
        match self {
            Profile::Hevc => ToolSet::HEVC,
            Profile::Jem => ToolSet::JEM,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum SliceTypeArg {
    B,
    P,
    I,
}

impl From<SliceTypeArg> for sbac_rs::SliceType {
    fn from(slice_type: SliceTypeArg) -> Self {
        match slice_type {
            SliceTypeArg::B => sbac_rs::SliceType::B,
            SliceTypeArg::P => sbac_rs::SliceType::P,
            SliceTypeArg::I => sbac_rs::SliceType::I,
        }
    }
}

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Groups { profile } => list_groups(profile),
        Commands::Init { slice_type, qp, group } => show_init(slice_type, qp, group.as_deref()),
        Commands::Encode {
            input,
            output,
            slice_type,
            qp,
            profile,
            estimate,
        } => encode(&input, &output, coding_parameters(slice_type, qp, profile), estimate),
        Commands::Verify {
            input,
            trace,
            slice_type,
            qp,
        } => verify(&input, &trace, slice_type, qp),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn coding_parameters(slice_type: SliceTypeArg, qp: i32, profile: Profile) -> CodingParameters {
    let mut params = CodingParameters::hevc();
    params.tools = profile.tools();
    params.slice.slice_type = slice_type.into();
    params.slice.enc_cabac_table_idx = slice_type.into();
    params.slice.qp = qp;
    params
}

fn list_groups(profile: Profile) -> Result<(), Box<dyn std::error::Error>> {
    let tools = profile.tools();

    println!("{:<28} {:>5} {:>8} {:>7}", "group", "sets", "per set", "offset");
    for group in ContextGroup::ALL {
        if group.requires_jem() && tools == ToolSet::HEVC {
            continue;
        }
        let (sets, per_set) = group.shape();
        println!("{:<28} {:>5} {:>8} {:>7}", group.name(), sets, per_set, group.offset());
    }
    Ok(())
}

fn show_init(slice_type: SliceTypeArg, qp: i32, group: Option<&str>) -> Result<(), Box<dyn std::error::Error>> {
    let groups = match group {
        Some(token) => vec![ContextGroup::parse(token)?],
        None => ContextGroup::ALL.to_vec(),
    };

    let mut contexts = ContextStore::new();
    contexts.init_all(slice_type.into(), qp);
    for group in groups {
        let states: Vec<String> = contexts
            .group(group)
            .iter()
            .map(|model| format!("{}/{}", model.state(), model.mps()))
            .collect();
        println!("{:<28} {}", group.name(), states.join(" "));
    }
    Ok(())
}

fn read_trace(path: &Path) -> Result<Vec<sbac_rs::trace::TraceLine>, Box<dyn std::error::Error>> {
    let text = fs::read_to_string(path)?;
    Ok(parse_trace(&text)?)
}

fn encode(input: &Path, output: &Path, params: CodingParameters, estimate: bool) -> Result<(), Box<dyn std::error::Error>> {
    let trace = read_trace(input)?;

    let mut contexts = ContextStore::new();
    contexts.init_all(params.init_slice_type(), params.slice.qp);
    let mut encoder = CabacEncoder::default();
    encode_trace(&mut encoder, &mut contexts, &trace)?;
    encoder.finish();
    encoder.write_trailing_bits();
    let data = encoder.into_sink().into_data();
    fs::write(output, &data)?;
    println!("Encoded {} commands into {} bytes", trace.len(), data.len());

    if estimate {
        let mut sbac = SbacEncoder::new(CabacCounter::new(), params)?;
        sbac.reset_entropy(&params)?;
        sbac.code_trace(&trace)?;
        let frac_bits = sbac.bin_if().frac_bits();
        println!("Estimated cost: {:.3} bits", frac_bits_to_bits(frac_bits));
        println!("Preferred init table: {:?}", sbac.determine_cabac_init_idx());
    }
    Ok(())
}

fn verify(input: &Path, trace: &Path, slice_type: SliceTypeArg, qp: i32) -> Result<(), Box<dyn std::error::Error>> {
    let data = fs::read(input)?;
    let trace = read_trace(trace)?;

    let mut contexts = ContextStore::new();
    contexts.init_all(slice_type.into(), qp);
    let mut decoder = CabacDecoder::new(&data);
    verify_trace(&mut decoder, &mut contexts, &trace)?;
    println!("OK: {} commands match", trace.len());
    Ok(())
}
