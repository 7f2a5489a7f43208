//! Finding the end of inline image data.
//!
//! The data of an inline image has no length, it simply ends with white space followed by
//! `EI` and more white space. Since the data itself can contain this sequence, a candidate
//! end is only accepted if the bytes after it look like valid content.

use crate::content::{RawToken, ops, read_raw_token};
use crate::reader::Reader;
use crate::trivia::is_white_space_character;
use log::debug;

/// How many tokens after a candidate `EI` are checked.
const LOOKAHEAD_TOKENS: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Scanning,
    /// Seen white space at the candidate end of the data.
    PossibleEnd0,
    /// Seen `E`.
    PossibleEnd1,
    /// Seen `EI`.
    PossibleEnd2,
}

/// Find the end of the inline image data starting at `start`. Returns the end of the
/// data and the offset after the `EI` operator.
pub(crate) fn find_end(data: &[u8], start: usize) -> Option<(usize, usize)> {
    // The white space after `ID` counts as the white space before `EI`, in case the
    // data is empty.
    let mut state = State::PossibleEnd0;
    let mut candidate = start;
    let mut pos = start;

    while pos < data.len() {
        let b = data[pos];

        state = match (state, b) {
            (State::PossibleEnd0, b'E') => State::PossibleEnd1,
            (State::PossibleEnd1, b'I') => State::PossibleEnd2,
            (State::PossibleEnd2, b) if is_white_space_character(b) => {
                if is_valid_continuation(&data[pos..]) {
                    return Some((candidate, pos));
                }

                debug!("skipping false end of inline image at offset {candidate}");
                candidate = pos;

                State::PossibleEnd0
            }
            (_, b) if is_white_space_character(b) => {
                candidate = pos;

                State::PossibleEnd0
            }
            _ => State::Scanning,
        };

        pos += 1;
    }

    (state == State::PossibleEnd2).then_some((candidate, pos))
}

/// Whether the data re-tokenizes into known operators and valid operands.
fn is_valid_continuation(data: &[u8]) -> bool {
    let mut r = Reader::new(data);

    for _ in 0..LOOKAHEAD_TOKENS {
        r.skip_white_spaces_and_comments();

        if r.at_end() {
            return true;
        }

        match read_raw_token(&mut r) {
            Some(RawToken::Operand(_)) => {}
            // The data of the next inline image can't be checked.
            Some(RawToken::Operator(op)) if op.as_bytes() == b"BI" => return true,
            Some(RawToken::Operator(op)) if ops::lookup(&op).is_some() => {}
            _ => return false,
        }
    }

    true
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body(data: &[u8]) -> Option<&[u8]> {
        find_end(data, 0).map(|(end, _)| &data[..end])
    }

    #[test]
    fn simple() {
        assert_eq!(body(b"abc EI Q"), Some(&b"abc"[..]));
    }

    #[test]
    fn at_end_of_stream() {
        let data = b"abc\nEI";
        assert_eq!(find_end(data, 0), Some((3, 6)));
    }

    #[test]
    fn empty_data() {
        assert_eq!(body(b"EI q"), Some(&b""[..]));
    }

    #[test]
    fn false_end_in_data() {
        // `EI` inside the data is followed by binary garbage, which isn't valid content.
        let data = b"\x01 EI \xff\x02) garbage\nEI\nQ";
        assert_eq!(body(data), Some(&b"\x01 EI \xff\x02) garbage"[..]));
    }

    #[test]
    fn false_end_with_unknown_operator() {
        let data = b"x EI zz yy\nEI 0 0 m";
        assert_eq!(body(data), Some(&b"x EI zz yy"[..]));
    }

    #[test]
    fn no_end() {
        assert_eq!(find_end(b"abc EIx", 0), None);
        assert_eq!(find_end(b"abc", 0), None);
    }

    #[test]
    fn repeated_white_space() {
        assert_eq!(body(b"ab  \n EI\n"), Some(&b"ab  \n"[..]));
    }
}
