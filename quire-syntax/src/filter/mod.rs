//! Decoding data streams.

pub mod ascii_85;
pub mod ascii_hex;
pub mod flate;
pub mod run_length;

use crate::object::dict::keys::*;
use crate::object::{Dict, Name};
use log::warn;

/// A stream filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Filter {
    /// `ASCIIHexDecode`
    AsciiHex,
    /// `ASCII85Decode`
    Ascii85,
    /// `FlateDecode`
    Flate,
    /// `RunLengthDecode`
    RunLength,
    /// Any other filter. The data is kept untouched, but can't be decoded.
    Other(Name),
}

impl Filter {
    /// Map a filter name (including the abbreviated forms used in inline images)
    /// to a filter.
    pub fn from_name(name: &Name) -> Self {
        match name.as_bytes() {
            ASCII_HEX_DECODE | AHX => Self::AsciiHex,
            ASCII85_DECODE | A85 => Self::Ascii85,
            FLATE_DECODE | FL => Self::Flate,
            RUN_LENGTH_DECODE | RL => Self::RunLength,
            _ => Self::Other(name.clone()),
        }
    }

    fn debug_name(&self) -> &str {
        match self {
            Self::AsciiHex => "ascii_hex",
            Self::Ascii85 => "ascii_85",
            Self::Flate => "flate",
            Self::RunLength => "run-length",
            Self::Other(n) => n.as_str(),
        }
    }
}

/// Apply a single filter to the data.
pub fn apply_filter(data: &[u8], filter: &Filter, params: Option<&Dict>) -> Option<Vec<u8>> {
    let result = match filter {
        Filter::AsciiHex => ascii_hex::decode(data),
        Filter::Ascii85 => ascii_85::decode(data),
        Filter::Flate => flate::decode(data, params),
        Filter::RunLength => run_length::decode(data),
        Filter::Other(_) => None,
    };

    if result.is_none() {
        warn!("failed to apply filter {}", filter.debug_name());
    }

    result
}
