//! A decoder for ASCII-hex-encoded streams.

use crate::trivia::is_white_space_character;

/// Decode an ASCII-hex-encoded stream. White space is ignored, and the end-of-data
/// marker `>` is optional.
pub fn decode(data: &[u8]) -> Option<Vec<u8>> {
    let mut digits = Vec::with_capacity(data.len());

    for &byte in data {
        match byte {
            b'>' => break,
            b if b.is_ascii_hexdigit() => digits.push(b),
            b if is_white_space_character(b) => {}
            _ => return None,
        }
    }

    decode_hex_string(&digits)
}

/// Decode pairs of hex digits. A final odd digit is treated as if followed by a zero.
pub(crate) fn decode_hex_string(digits: &[u8]) -> Option<Vec<u8>> {
    digits
        .chunks(2)
        .map(|pair| Some((val(pair[0])? << 4) | val(*pair.get(1).unwrap_or(&b'0'))?))
        .collect()
}

fn val(c: u8) -> Option<u8> {
    match c {
        b'A'..=b'F' => Some(c - b'A' + 10),
        b'a'..=b'f' => Some(c - b'a' + 10),
        b'0'..=b'9' => Some(c - b'0'),
        _ => None,
    }
}
