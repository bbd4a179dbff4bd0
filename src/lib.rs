//! CABAC entropy coding for HEVC and JEM syntax elements.
//!
//! The crate is organized leaf-first:
//!
//! - [`cabac`]: probability states, context-model arena, binary arithmetic
//!   encoder, fractional-bit counter and the mirror decoder.
//! - [`sbac`]: binarizations, syntax-element coding, rate estimation and
//!   trial-coding state save/restore, plus [`sbac::SbacReader`] which parses
//!   everything the encoder writes.
//! - [`trace`]: a line-oriented bin trace used by the `sbac` binary.
//!
//! Coding-tree data is read through [`sbac::CodingUnitSource`]; the coder never
//! owns picture data.

#[macro_use]
mod log;

pub mod cabac;
pub mod coding_parameters;
pub mod constants;
pub mod error;
pub mod sbac;
pub mod trace;

pub use cabac::{BinEncoder, BitCounter, BitSink, BitWriter, CabacCounter, CabacDecoder, CabacEncoder};
pub use coding_parameters::{CodingParameters, PictureParameters, SequenceParameters, SliceParameters, ToolSet};
pub use error::CabacError;
pub use sbac::{SbacEncoder, SbacReader};

use num_enum::{IntoPrimitive, TryFromPrimitive};

/// Slice type, numbered as the rows of the context initialization tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, IntoPrimitive, TryFromPrimitive)]
#[repr(u8)]
pub enum SliceType {
    B = 0,
    P = 1,
    I = 2,
}

impl SliceType {
    pub fn is_intra(self) -> bool {
        self == SliceType::I
    }

    pub fn name(self) -> &'static str {
        match self {
            SliceType::B => "B",
            SliceType::P => "P",
            SliceType::I => "I",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, IntoPrimitive, TryFromPrimitive)]
#[repr(u8)]
pub enum ChannelType {
    #[default]
    Luma = 0,
    Chroma = 1,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, IntoPrimitive, TryFromPrimitive)]
#[repr(u8)]
pub enum ComponentId {
    Y = 0,
    Cb = 1,
    Cr = 2,
}

impl ComponentId {
    pub const ALL: [ComponentId; 3] = [ComponentId::Y, ComponentId::Cb, ComponentId::Cr];

    pub fn channel_type(self) -> ChannelType {
        match self {
            ComponentId::Y => ChannelType::Luma,
            ComponentId::Cb | ComponentId::Cr => ChannelType::Chroma,
        }
    }

    pub fn is_luma(self) -> bool {
        self == ComponentId::Y
    }

    pub fn is_chroma(self) -> bool {
        !self.is_luma()
    }
}

/// Chroma sampling format, numbered as `chroma_format_idc`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, IntoPrimitive, TryFromPrimitive)]
#[repr(u8)]
pub enum ChromaFormat {
    Chroma400 = 0,
    Chroma420 = 1,
    Chroma422 = 2,
    Chroma444 = 3,
}

impl ChromaFormat {
    pub fn component_count(self) -> usize {
        if self == ChromaFormat::Chroma400 { 1 } else { 3 }
    }

    /// Horizontal and vertical subsampling shift of `component`.
    pub fn scale_shift(self, component: ComponentId) -> (u32, u32) {
        if component.is_luma() {
            return (0, 0);
        }
        match self {
            ChromaFormat::Chroma400 | ChromaFormat::Chroma444 => (0, 0),
            ChromaFormat::Chroma420 => (1, 1),
            ChromaFormat::Chroma422 => (1, 0),
        }
    }
}

/// Coefficient scan order within a transform block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, IntoPrimitive, TryFromPrimitive)]
#[repr(u8)]
pub enum ScanType {
    Diagonal = 0,
    Horizontal = 1,
    Vertical = 2,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PredMode {
    #[default]
    Inter,
    Intra,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PartSize {
    #[default]
    Size2Nx2N,
    Size2NxN,
    SizeNx2N,
    SizeNxN,
    Size2NxnU,
    Size2NxnD,
    SizenLx2N,
    SizenRx2N,
}

impl PartSize {
    pub fn num_parts(self) -> usize {
        match self {
            PartSize::Size2Nx2N => 1,
            PartSize::SizeNxN => 4,
            _ => 2,
        }
    }
}

/// Binary-tree split decision of a QTBT node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, IntoPrimitive, TryFromPrimitive)]
#[repr(u8)]
pub enum BtSplit {
    None = 0,
    Horizontal = 1,
    Vertical = 2,
}

impl Default for BtSplit {
    fn default() -> Self {
        BtSplit::None
    }
}

/// Split directions a binary-tree node may not take because an earlier
/// split already produced the same partitioning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BtSplitConstraint {
    #[default]
    None,
    NoHorizontal,
    NoVertical,
}

/// Frame-rate up-conversion merge mode of a CU.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FrucMode {
    #[default]
    Off,
    Template,
    Bilateral,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum InterDir {
    #[default]
    L0,
    L1,
    Bi,
}

impl InterDir {
    pub fn uses(self, list: RefPicList) -> bool {
        match self {
            InterDir::Bi => true,
            InterDir::L0 => list == RefPicList::L0,
            InterDir::L1 => list == RefPicList::L1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RefPicList {
    L0 = 0,
    L1 = 1,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RdpcmMode {
    #[default]
    Off,
    Horizontal,
    Vertical,
}

/// Motion vector (difference) in quarter-sample units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Mv {
    pub hor: i32,
    pub ver: i32,
}

impl Mv {
    pub fn new(hor: i32, ver: i32) -> Self {
        Self { hor, ver }
    }
}
