//! A decoder for ASCII-85-encoded streams.

use crate::trivia::is_white_space_character;

/// Decode an ASCII-85-encoded stream, which is terminated by `~>`.
pub fn decode(data: &[u8]) -> Option<Vec<u8>> {
    let mut decoded = Vec::with_capacity(data.len() * 4 / 5);
    let mut group = [0_u8; 5];
    let mut filled = 0;
    let mut terminated = false;

    let mut bytes = data
        .iter()
        .copied()
        .filter(|b| !is_white_space_character(*b));

    while let Some(b) = bytes.next() {
        match b {
            b'~' => {
                if bytes.next() != Some(b'>') {
                    return None;
                }

                terminated = true;
                break;
            }
            b'z' if filled == 0 => decoded.extend_from_slice(&[0; 4]),
            0x21..=0x75 => {
                group[filled] = b - 0x21;
                filled += 1;

                if filled == 5 {
                    decoded.extend_from_slice(&word_85(group)?);
                    filled = 0;
                }
            }
            _ => return None,
        }
    }

    if !terminated {
        return None;
    }

    match filled {
        0 => {}
        // A single trailing character can't encode any byte.
        1 => return None,
        n => {
            // Pad the final partial group with the highest digit.
            group[n..].fill(84);
            decoded.extend_from_slice(&word_85(group)?[..n - 1]);
        }
    }

    Some(decoded)
}

fn word_85(digits: [u8; 5]) -> Option<[u8; 4]> {
    let q = digits
        .iter()
        .fold(0_u64, |acc, d| acc * 85 + u64::from(*d));

    // 85^5 > 256^4, the result might not fit in an u32.
    Some(u32::try_from(q).ok()?.to_be_bytes())
}
