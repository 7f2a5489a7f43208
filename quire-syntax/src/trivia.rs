//! Comments and white spaces.

use crate::reader::{Reader, Skippable};

#[inline(always)]
pub(crate) fn is_white_space_character(char: u8) -> bool {
    matches!(char, 0x00 | 0x09 | 0x0a | 0x0c | 0x0d | 0x20)
}

#[inline(always)]
pub(crate) fn is_delimiter_character(char: u8) -> bool {
    matches!(
        char,
        b'(' | b')' | b'<' | b'>' | b'[' | b']' | b'{' | b'}' | b'/' | b'%'
    )
}

#[inline(always)]
pub(crate) fn is_regular_character(char: u8) -> bool {
    !is_white_space_character(char) && !is_delimiter_character(char)
}

#[inline(always)]
pub(crate) fn is_eol_character(char: u8) -> bool {
    matches!(char, 0x0a | 0x0d)
}

pub(crate) struct Comment;

impl Skippable for Comment {
    fn skip(r: &mut Reader<'_>, _: bool) -> Option<()> {
        r.forward_tag(b"%")?;
        r.forward_while(|b| !is_eol_character(b));

        Some(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classification() {
        assert!(is_white_space_character(b' '));
        assert!(is_white_space_character(0x00));
        assert!(is_delimiter_character(b'/'));
        assert!(is_regular_character(b'a'));
        assert!(!is_regular_character(b'['));
    }

    #[test]
    fn comment_stops_at_eol() {
        let mut r = Reader::new(b"%PDF-1.7\n1 0 obj");
        r.skip::<Comment>(false).unwrap();
        assert_eq!(r.peek_byte(), Some(b'\n'));
    }
}
