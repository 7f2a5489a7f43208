//! Name objects.

use crate::reader::{Readable, Reader, ReaderContext, Skippable};
use crate::trivia::is_regular_character;
use std::borrow::Borrow;
use std::fmt;
use std::ops::Deref;

/// A PDF name, stored without its leading solidus and with `#xx` escapes resolved.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Name(Vec<u8>);

impl Name {
    /// Create a new name from unescaped bytes.
    pub fn new(data: impl Into<Vec<u8>>) -> Self {
        Self(data.into())
    }

    /// Create a new name from the raw (possibly escaped) bytes that follow the solidus.
    pub(crate) fn from_escaped(data: &[u8]) -> Self {
        fn convert_hex(c: u8) -> u8 {
            match c {
                b'A'..=b'F' => c - b'A' + 10,
                b'a'..=b'f' => c - b'a' + 10,
                _ => c - b'0',
            }
        }

        if !data.contains(&b'#') {
            return Self(data.to_vec());
        }

        let mut cleaned = Vec::with_capacity(data.len());
        let mut r = Reader::new(data);

        while let Some(b) = r.read_byte() {
            if b == b'#'
                && let Some(hex) = r.peek_bytes(2)
                && hex.iter().all(|h| h.is_ascii_hexdigit())
            {
                r.skip_bytes(2);
                cleaned.push((convert_hex(hex[0]) << 4) | convert_hex(hex[1]));
            } else {
                cleaned.push(b);
            }
        }

        Self(cleaned)
    }

    /// Return a string representation of the name.
    pub fn as_str(&self) -> &str {
        std::str::from_utf8(&self.0).unwrap_or("{non-utf8 name}")
    }

    /// Return the raw bytes of the name.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Write the name including its solidus, escaping every byte that is not a
    /// regular character (and `#` itself).
    pub fn write_escaped(&self, out: &mut Vec<u8>) {
        const HEX: &[u8; 16] = b"0123456789ABCDEF";

        out.push(b'/');

        for &b in &self.0 {
            if b == b'#' || !(0x21..=0x7e).contains(&b) || !is_regular_character(b) {
                out.extend_from_slice(&[b'#', HEX[(b >> 4) as usize], HEX[(b & 0xf) as usize]]);
            } else {
                out.push(b);
            }
        }
    }
}

impl Deref for Name {
    type Target = [u8];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl Borrow<[u8]> for Name {
    fn borrow(&self) -> &[u8] {
        &self.0
    }
}

impl AsRef<[u8]> for Name {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}", self.as_str())
    }
}

impl From<&[u8]> for Name {
    fn from(value: &[u8]) -> Self {
        Self(value.to_vec())
    }
}

impl<const N: usize> From<&[u8; N]> for Name {
    fn from(value: &[u8; N]) -> Self {
        Self(value.to_vec())
    }
}

impl From<&str> for Name {
    fn from(value: &str) -> Self {
        Self(value.as_bytes().to_vec())
    }
}

impl PartialEq<[u8]> for Name {
    fn eq(&self, other: &[u8]) -> bool {
        self.0 == other
    }
}

impl PartialEq<&[u8]> for Name {
    fn eq(&self, other: &&[u8]) -> bool {
        self.0 == *other
    }
}

impl Skippable for Name {
    fn skip(r: &mut Reader<'_>, _: bool) -> Option<()> {
        skip_name_like(r, true)
    }
}

impl Readable for Name {
    fn read(r: &mut Reader<'_>, _: ReaderContext<'_>) -> Option<Self> {
        let start = r.offset();
        skip_name_like(r, true)?;
        let end = r.offset();

        Some(Self::from_escaped(r.range(start + 1..end)?))
    }
}

// Shared by `Name` and the parser for content stream operators (which behave like names,
// except that they aren't preceded by a solidus).
pub(crate) fn skip_name_like(r: &mut Reader<'_>, solidus: bool) -> Option<()> {
    if solidus {
        r.forward_tag(b"/")?;
    }

    while let Some(b) = r.eat(is_regular_character) {
        if b == b'#' {
            r.eat(|n| n.is_ascii_hexdigit())?;
            r.eat(|n| n.is_ascii_hexdigit())?;
        }
    }

    Some(())
}

#[cfg(test)]
mod tests {
    use crate::object::name::Name;
    use crate::reader::Reader;
    use std::ops::Deref;

    fn read(data: &[u8]) -> Option<Name> {
        Reader::new(data).read_plain::<Name>()
    }

    #[test]
    fn name_1() {
        assert_eq!(read(b"/").unwrap().deref(), b"");
    }

    #[test]
    fn name_2() {
        assert!(read(b"dfg").is_none());
    }

    #[test]
    fn name_3() {
        assert!(read(b"/AB#FG").is_none());
    }

    #[test]
    fn name_4() {
        assert_eq!(read(b"/Name1").unwrap().deref(), b"Name1");
    }

    #[test]
    fn name_5() {
        assert_eq!(
            read(b"/A;Name_With-Various***Characters?").unwrap().deref(),
            b"A;Name_With-Various***Characters?"
        );
    }

    #[test]
    fn name_6() {
        assert_eq!(read(b"/lime#20Green").unwrap().deref(), b"lime Green");
    }

    #[test]
    fn name_7() {
        assert_eq!(read(b"/The_Key_of_F#23_Minor").unwrap().deref(), b"The_Key_of_F#_Minor");
    }

    #[test]
    fn name_stops_at_delimiter() {
        assert_eq!(read(b"/Type/Page").unwrap().deref(), b"Type");
    }

    #[test]
    fn escaped_writing() {
        let mut out = vec![];
        Name::new(b"lime Green#(x)".to_vec()).write_escaped(&mut out);
        assert_eq!(out, b"/lime#20Green#23#28x#29");
    }

    #[test]
    fn escape_round_trip() {
        let name = Name::new(vec![b'a', 0x00, 0xff, b'/']);
        let mut out = vec![];
        name.write_escaped(&mut out);
        assert_eq!(read(&out).unwrap(), name);
    }
}
