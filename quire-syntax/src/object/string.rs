//! String objects and text strings.

use crate::error::EncodingError;
use crate::reader::{Readable, Reader, ReaderContext, Skippable};
use crate::trivia::is_white_space_character;
use std::fmt;

/// How a string is written in the file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StringKind {
    /// `(...)`
    #[default]
    Literal,
    /// `<...>`
    Hex,
}

/// A PDF string. The bytes are stored with all escapes resolved.
#[derive(Clone, PartialEq, Eq, Default)]
pub struct PdfString {
    data: Vec<u8>,
    kind: StringKind,
}

impl PdfString {
    /// Create a new literal string.
    pub fn new(data: impl Into<Vec<u8>>) -> Self {
        Self {
            data: data.into(),
            kind: StringKind::Literal,
        }
    }

    /// Create a new hex string.
    pub fn new_hex(data: impl Into<Vec<u8>>) -> Self {
        Self {
            data: data.into(),
            kind: StringKind::Hex,
        }
    }

    /// Encode a text string. PDFDocEncoding is used when every character can be represented
    /// in it, UTF-16BE with a byte order mark otherwise.
    pub fn from_text(text: &str) -> Self {
        match encode_pdf_doc(text, Fallback::Error) {
            Ok(bytes) => Self::new(bytes),
            Err(_) => Self::new(encode_utf16be(text)),
        }
    }

    /// Return the raw bytes of the string.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Consume the string and return its bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }

    /// Return how the string is written.
    pub fn kind(&self) -> StringKind {
        self.kind
    }

    /// Decode the string as a text string.
    pub fn to_text(&self, fallback: Fallback) -> Result<String, EncodingError> {
        decode_text(&self.data, fallback)
    }

    /// Write the string in its original form. Literal strings escape parentheses, backslashes
    /// and carriage returns, hex strings use uppercase digits.
    pub fn write_escaped(&self, out: &mut Vec<u8>) {
        const HEX: &[u8; 16] = b"0123456789ABCDEF";

        match self.kind {
            StringKind::Literal => {
                out.push(b'(');

                for &b in &self.data {
                    match b {
                        b'(' | b')' | b'\\' => out.extend_from_slice(&[b'\\', b]),
                        b'\r' => out.extend_from_slice(b"\\r"),
                        _ => out.push(b),
                    }
                }

                out.push(b')');
            }
            StringKind::Hex => {
                out.push(b'<');

                for &b in &self.data {
                    out.extend_from_slice(&[HEX[(b >> 4) as usize], HEX[(b & 0xf) as usize]]);
                }

                out.push(b'>');
            }
        }
    }
}

impl fmt::Debug for PdfString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            StringKind::Literal => write!(f, "({})", String::from_utf8_lossy(&self.data)),
            StringKind::Hex => {
                f.write_str("<")?;
                for b in &self.data {
                    write!(f, "{b:02X}")?;
                }
                f.write_str(">")
            }
        }
    }
}

impl Skippable for PdfString {
    fn skip(r: &mut Reader<'_>, _: bool) -> Option<()> {
        match r.peek_byte()? {
            b'<' => parse_hex(r).map(|_| {}),
            b'(' => parse_literal(r).map(|_| {}),
            _ => None,
        }
    }
}

impl Readable for PdfString {
    fn read(r: &mut Reader<'_>, _: ReaderContext<'_>) -> Option<Self> {
        match r.peek_byte()? {
            b'<' => parse_hex(r).map(Self::new_hex),
            b'(' => parse_literal(r).map(Self::new),
            _ => None,
        }
    }
}

fn parse_hex(r: &mut Reader<'_>) -> Option<Vec<u8>> {
    let mut digits = Vec::new();

    r.forward_tag(b"<")?;
    while let Some(b) = r.peek_byte() {
        if b.is_ascii_hexdigit() {
            digits.push(b);
        } else if !is_white_space_character(b) {
            break;
        }

        r.read_byte()?;
    }
    r.forward_tag(b">")?;

    // A final odd digit is treated as if followed by a zero.
    if digits.len() % 2 != 0 {
        digits.push(b'0');
    }

    crate::filter::ascii_hex::decode_hex_string(&digits)
}

fn parse_literal(r: &mut Reader<'_>) -> Option<Vec<u8>> {
    let mut out = Vec::new();
    let mut depth = 0_usize;

    r.forward_tag(b"(")?;

    loop {
        match r.read_byte()? {
            b'(' => {
                depth += 1;
                out.push(b'(');
            }
            b')' => {
                if depth == 0 {
                    break;
                }

                depth -= 1;
                out.push(b')');
            }
            b'\\' => match r.read_byte()? {
                b'n' => out.push(b'\n'),
                b'r' => out.push(b'\r'),
                b't' => out.push(b'\t'),
                b'b' => out.push(0x08),
                b'f' => out.push(0x0c),
                b'(' => out.push(b'('),
                b')' => out.push(b')'),
                b'\\' => out.push(b'\\'),
                // Line continuation.
                b'\n' => {}
                b'\r' => {
                    r.forward_tag(b"\n");
                }
                d @ b'0'..=b'7' => {
                    let mut value = u32::from(d - b'0');

                    for _ in 0..2 {
                        match r.eat(is_octal_digit) {
                            Some(d) => value = value * 8 + u32::from(d - b'0'),
                            None => break,
                        }
                    }

                    // High-order overflow is ignored.
                    out.push((value & 0xff) as u8);
                }
                // An unknown escape ignores the backslash.
                other => out.push(other),
            },
            // An unescaped end-of-line is always read as a single line feed.
            b'\r' => {
                r.forward_tag(b"\n");
                out.push(b'\n');
            }
            b => out.push(b),
        }
    }

    Some(out)
}

#[inline(always)]
fn is_octal_digit(byte: u8) -> bool {
    matches!(byte, b'0'..=b'7')
}

/// What to do with a byte or character that has no mapping in the active text encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Fallback {
    /// Fail with an [`EncodingError`].
    #[default]
    Error,
    /// Substitute the given character.
    Replace(char),
    /// Drop the byte or character.
    Skip,
}

const UTF16_BOM: &[u8] = &[0xfe, 0xff];
const UTF8_BOM: &[u8] = &[0xef, 0xbb, 0xbf];

/// Decode a text string: UTF-16BE or UTF-8 if prefixed with the matching byte order mark,
/// PDFDocEncoding otherwise.
pub fn decode_text(data: &[u8], fallback: Fallback) -> Result<String, EncodingError> {
    if let Some(rest) = data.strip_prefix(UTF16_BOM) {
        decode_utf16be(rest, UTF16_BOM.len(), fallback)
    } else if let Some(rest) = data.strip_prefix(UTF8_BOM) {
        decode_utf8(rest, UTF8_BOM.len(), fallback)
    } else {
        decode_pdf_doc(data, fallback)
    }
}

fn decode_utf16be(data: &[u8], base: usize, fallback: Fallback) -> Result<String, EncodingError> {
    let units = data
        .chunks(2)
        .map(|c| (c.len() == 2).then(|| u16::from_be_bytes([c[0], c[1]])));
    let mut out = String::with_capacity(data.len() / 2);
    let mut pending_high: Option<(u16, usize)> = None;

    let invalid = |out: &mut String, position: usize| match fallback {
        Fallback::Error => Err(EncodingError::InvalidUtf16 { position }),
        Fallback::Replace(c) => {
            out.push(c);
            Ok(())
        }
        Fallback::Skip => Ok(()),
    };

    for (i, unit) in units.enumerate() {
        let position = base + i * 2;

        let Some(unit) = unit else {
            // Odd trailing byte.
            invalid(&mut out, position)?;
            continue;
        };

        match unit {
            0xd800..=0xdbff => {
                if let Some((_, pos)) = pending_high.take() {
                    invalid(&mut out, pos)?;
                }
                pending_high = Some((unit, position));
            }
            0xdc00..=0xdfff => match pending_high.take() {
                Some((high, _)) => {
                    let code = 0x10000 + ((u32::from(high) - 0xd800) << 10) + (u32::from(unit) - 0xdc00);
                    // Always a valid scalar value.
                    out.push(char::from_u32(code).unwrap_or(char::REPLACEMENT_CHARACTER));
                }
                None => invalid(&mut out, position)?,
            },
            _ => {
                if let Some((_, pos)) = pending_high.take() {
                    invalid(&mut out, pos)?;
                }
                out.push(char::from_u32(u32::from(unit)).unwrap_or(char::REPLACEMENT_CHARACTER));
            }
        }
    }

    if let Some((_, pos)) = pending_high {
        invalid(&mut out, pos)?;
    }

    Ok(out)
}

fn decode_utf8(data: &[u8], base: usize, fallback: Fallback) -> Result<String, EncodingError> {
    let mut out = String::with_capacity(data.len());
    let mut rest = data;
    let mut consumed = 0;

    loop {
        match std::str::from_utf8(rest) {
            Ok(s) => {
                out.push_str(s);
                return Ok(out);
            }
            Err(e) => {
                let valid = e.valid_up_to();
                // `valid_up_to` always lies on a char boundary.
                out.push_str(std::str::from_utf8(&rest[..valid]).unwrap_or_default());

                let position = base + consumed + valid;
                let bad_len = e.error_len().unwrap_or(rest.len() - valid);

                match fallback {
                    Fallback::Error => {
                        return Err(EncodingError::UnmappedByte {
                            byte: rest[valid],
                            position,
                        });
                    }
                    Fallback::Replace(c) => out.push(c),
                    Fallback::Skip => {}
                }

                consumed += valid + bad_len;
                rest = &rest[valid + bad_len..];
            }
        }
    }
}

fn decode_pdf_doc(data: &[u8], fallback: Fallback) -> Result<String, EncodingError> {
    let mut out = String::with_capacity(data.len());

    for (position, &byte) in data.iter().enumerate() {
        match pdf_doc_to_char(byte) {
            Some(c) => out.push(c),
            None => match fallback {
                Fallback::Error => return Err(EncodingError::UnmappedByte { byte, position }),
                Fallback::Replace(c) => out.push(c),
                Fallback::Skip => {}
            },
        }
    }

    Ok(out)
}

/// Encode text in PDFDocEncoding.
pub fn encode_pdf_doc(text: &str, fallback: Fallback) -> Result<Vec<u8>, EncodingError> {
    let mut out = Vec::with_capacity(text.len());

    for (position, char) in text.chars().enumerate() {
        match char_to_pdf_doc(char) {
            Some(b) => out.push(b),
            None => match fallback {
                Fallback::Error => return Err(EncodingError::UnmappedChar { char, position }),
                Fallback::Replace(r) => out.push(
                    char_to_pdf_doc(r).ok_or(EncodingError::UnmappedChar { char: r, position })?,
                ),
                Fallback::Skip => {}
            },
        }
    }

    Ok(out)
}

/// Encode text as UTF-16BE, prefixed with a byte order mark.
pub fn encode_utf16be(text: &str) -> Vec<u8> {
    let mut out = UTF16_BOM.to_vec();

    for unit in text.encode_utf16() {
        out.extend_from_slice(&unit.to_be_bytes());
    }

    out
}

// Code points for 0x18..=0x1f.
const LOW_TABLE: [char; 8] = [
    '\u{02d8}', '\u{02c7}', '\u{02c6}', '\u{02d9}', '\u{02dd}', '\u{02db}', '\u{02da}', '\u{02dc}',
];

// Code points for 0x80..=0xa0. `None` marks 0x9f, which is undefined.
const HIGH_TABLE: [Option<char>; 33] = [
    Some('\u{2022}'),
    Some('\u{2020}'),
    Some('\u{2021}'),
    Some('\u{2026}'),
    Some('\u{2014}'),
    Some('\u{2013}'),
    Some('\u{0192}'),
    Some('\u{2044}'),
    Some('\u{2039}'),
    Some('\u{203a}'),
    Some('\u{2212}'),
    Some('\u{2030}'),
    Some('\u{201e}'),
    Some('\u{201c}'),
    Some('\u{201d}'),
    Some('\u{2018}'),
    Some('\u{2019}'),
    Some('\u{201a}'),
    Some('\u{2122}'),
    Some('\u{fb01}'),
    Some('\u{fb02}'),
    Some('\u{0141}'),
    Some('\u{0152}'),
    Some('\u{0160}'),
    Some('\u{0178}'),
    Some('\u{017d}'),
    Some('\u{0131}'),
    Some('\u{0142}'),
    Some('\u{0153}'),
    Some('\u{0161}'),
    Some('\u{017e}'),
    None,
    Some('\u{20ac}'),
];

fn pdf_doc_to_char(byte: u8) -> Option<char> {
    match byte {
        0x09 | 0x0a | 0x0d => Some(byte as char),
        0x18..=0x1f => Some(LOW_TABLE[(byte - 0x18) as usize]),
        0x20..=0x7e => Some(byte as char),
        0x80..=0xa0 => HIGH_TABLE[(byte - 0x80) as usize],
        0xad => None,
        0xa1..=0xff => Some(byte as char),
        _ => None,
    }
}

fn char_to_pdf_doc(char: char) -> Option<u8> {
    match char as u32 {
        0x09 | 0x0a | 0x0d | 0x20..=0x7e => Some(char as u8),
        0xa1..=0xff if char as u32 != 0xad => Some(char as u8),
        _ => {
            if let Some(i) = LOW_TABLE.iter().position(|c| *c == char) {
                return Some(0x18 + i as u8);
            }

            HIGH_TABLE
                .iter()
                .position(|c| *c == Some(char))
                .map(|i| 0x80 + i as u8)
        }
    }
}
