use snafu::Snafu;
use std::path::PathBuf;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Faults surfaced by tries, DAWGs and the persistence helpers.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))] // Make creatable enum variants crate-visible
pub enum Error {
    #[snafu(display("Symbol {:?} is not part of the configured alphabet", symbol))]
    InvalidSymbol { symbol: char },

    #[snafu(display("Malformed payload: {}", source))]
    Payload { source: FormatError },

    #[snafu(display("Could not read file {}: {}", path.display(), source))]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[snafu(display("Could not write file {}: {}", path.display(), source))]
    FileWrite {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Structural faults found while decoding a persisted payload.
///
/// The encodings carry no checksums, so these checks are the only line of
/// defense between a corrupted payload and out-of-bounds indexing.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum FormatError {
    #[snafu(display("input ended at byte {}, {} more byte(s) expected", offset, needed))]
    UnexpectedEnd { offset: usize, needed: usize },

    #[snafu(display("string field is not valid UTF-8"))]
    InvalidUtf8 { source: std::str::Utf8Error },

    #[snafu(display("encoded tree ended in the middle of a node"))]
    TruncatedTree,

    #[snafu(display("unexpected marker {:?} in encoded tree", found))]
    UnexpectedMarker { found: char },

    #[snafu(display("symbol {:?} does not belong to the alphabet", symbol))]
    ForeignSymbol { symbol: char },

    #[snafu(display("child slot {} is out of range for an alphabet of {} symbol(s)", slot, len))]
    SlotOutOfRange { slot: u16, len: usize },

    #[snafu(display("child slots are not strictly increasing at slot {}", slot))]
    SlotOrder { slot: u16 },

    #[snafu(display("node reference {} is out of bounds for {} node(s)", index, count))]
    DanglingIndex { index: u32, count: u32 },

    #[snafu(display("a word graph payload must contain at least the root node"))]
    EmptyGraph,

    #[snafu(display("stored word count {} disagrees with {} end-of-word node(s)", stored, counted))]
    WordCountMismatch { stored: u32, counted: u32 },

    #[snafu(display("symbol table holds {} symbol(s), expected {}", counted, stored))]
    SymbolCountMismatch { stored: u32, counted: u32 },

    #[snafu(display("{} trailing element(s) after the payload", remaining))]
    TrailingData { remaining: usize },
}
