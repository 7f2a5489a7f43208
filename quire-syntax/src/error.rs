//! Error types.

use crate::object::ObjRef;
use std::fmt;
use thiserror::Error;

/// A specialized [`Result`] type for reading and writing PDF files.
pub type Result<T> = std::result::Result<T, Error>;

/// An error that occurred while loading, mutating or saving a PDF file.
#[derive(Debug, Error)]
pub enum Error {
    /// The input is malformed in a way that makes it unreadable.
    #[error("parse error at byte {offset}: expected {expected}")]
    Parse {
        /// The byte offset at which parsing failed.
        offset: usize,
        /// A short description of the token that was expected.
        expected: &'static str,
    },
    /// The input (or the requested operation) uses a feature that is not supported.
    #[error("{0} is not supported")]
    Unsupported(Feature),
    /// A text string could not be encoded or decoded.
    #[error(transparent)]
    Encoding(#[from] EncodingError),
    /// An inline image in a content stream has no valid end marker.
    #[error("inline image starting at byte {offset} has no `EI` end marker")]
    InlineImage {
        /// The offset of the image data.
        offset: usize,
    },
    /// A stream that needs to be read can't be decoded, for example because it uses an
    /// unsupported filter.
    #[error("stream {0} can't be decoded")]
    Undecodable(ObjRef),
    /// An I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub(crate) fn parse(offset: usize, expected: &'static str) -> Self {
        Self::Parse { offset, expected }
    }
}

/// A feature that is recognized but deliberately not supported.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Feature {
    /// Reading encrypted documents.
    Encryption,
    /// Writing linearized ("fast web view") files.
    LinearizedWrite,
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Encryption => f.write_str("reading encrypted documents"),
            Self::LinearizedWrite => f.write_str("writing linearized files"),
        }
    }
}

/// A text string contained a byte or character that the active encoding can't map.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncodingError {
    /// A byte had no mapping while decoding.
    #[error("byte {byte:#04x} at position {position} has no mapped character")]
    UnmappedByte {
        /// The offending byte.
        byte: u8,
        /// The position of the byte in the input.
        position: usize,
    },
    /// A UTF-16 code unit sequence was invalid while decoding.
    #[error("invalid UTF-16 sequence at position {position}")]
    InvalidUtf16 {
        /// The byte position of the invalid code unit.
        position: usize,
    },
    /// A character had no mapping while encoding.
    #[error("character {char:?} at position {position} can't be encoded")]
    UnmappedChar {
        /// The offending character.
        char: char,
        /// The character position in the input.
        position: usize,
    },
}

/// Attach the offset of a failed parse to an `Option`.
pub(crate) trait OptionParse<T> {
    fn or_parse_error(self, offset: usize, expected: &'static str) -> Result<T>;
}

impl<T> OptionParse<T> for Option<T> {
    #[inline]
    fn or_parse_error(self, offset: usize, expected: &'static str) -> Result<T> {
        self.ok_or(Error::Parse { offset, expected })
    }
}
