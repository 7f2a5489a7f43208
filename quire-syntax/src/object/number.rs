//! Number objects.

use crate::reader::{Readable, Reader, ReaderContext, Skippable};
use log::debug;
use std::fmt;
use std::str::FromStr;

/// A PDF number.
///
/// Integers and reals are kept apart so that a number read as an integer is also
/// written back as one.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Number(pub(crate) InternalNumber);

impl Number {
    /// Create a new integer number.
    pub fn from_i64(num: i64) -> Self {
        Self(InternalNumber::Integer(num))
    }

    /// Create a new real number.
    pub fn from_f64(num: f64) -> Self {
        Self(InternalNumber::Real(num))
    }

    /// Whether the number was stored as an integer.
    pub fn is_integer(&self) -> bool {
        matches!(self.0, InternalNumber::Integer(_))
    }

    /// Returns the number as a f64.
    pub fn as_f64(&self) -> f64 {
        match self.0 {
            InternalNumber::Real(r) => r,
            InternalNumber::Integer(i) => i as f64,
        }
    }

    /// Returns the number as an integer, if it has no fractional part.
    pub fn as_integer(&self) -> Option<i64> {
        match self.0 {
            InternalNumber::Integer(i) => Some(i),
            InternalNumber::Real(r) => {
                if r.fract() == 0.0 && r.is_finite() {
                    debug!("real {r} used as an integer");

                    Some(r as i64)
                } else {
                    None
                }
            }
        }
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            InternalNumber::Integer(i) => write!(f, "{i}"),
            InternalNumber::Real(r) => {
                if !r.is_finite() {
                    debug!("non-finite real {r} written as 0");

                    return f.write_str("0");
                }

                // `Display` for floats gives the shortest representation that round-trips
                // and never uses an exponent.
                let s = r.to_string();

                if s.contains('.') {
                    f.write_str(&s)
                } else {
                    write!(f, "{s}.0")
                }
            }
        }
    }
}

impl Skippable for Number {
    fn skip(r: &mut Reader<'_>, _: bool) -> Option<()> {
        r.forward_if(|b| b == b'+' || b == b'-');

        match r.peek_byte()? {
            b'.' => {
                r.read_byte()?;
                r.forward_while_1(is_digit)?;
            }
            b'0'..=b'9' => {
                r.forward_while_1(is_digit)?;
                if let Some(()) = r.forward_tag(b".") {
                    r.forward_while(is_digit);
                }
            }
            _ => return None,
        }

        Some(())
    }
}

impl Readable for Number {
    fn read(r: &mut Reader<'_>, ctx: ReaderContext<'_>) -> Option<Self> {
        let data = r.skip::<Number>(ctx.in_content_stream)?;
        let str = std::str::from_utf8(data).ok()?;

        if !data.contains(&b'.') {
            if let Ok(i) = i64::from_str(str) {
                return Some(Self(InternalNumber::Integer(i)));
            }

            debug!("integer {str} is out of range, reading it as a real");
        }

        let num = f64::from_str(str).ok().filter(|n| n.is_finite())?;

        Some(Self(InternalNumber::Real(num)))
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) enum InternalNumber {
    Real(f64),
    Integer(i64),
}

macro_rules! from_int {
    ($i:ident) => {
        impl From<$i> for Number {
            fn from(value: $i) -> Self {
                Self(InternalNumber::Integer(value as i64))
            }
        }
    };
}

from_int!(i32);
from_int!(i64);
from_int!(u16);
from_int!(u32);
from_int!(usize);

impl From<f32> for Number {
    fn from(value: f32) -> Self {
        Self(InternalNumber::Real(value as f64))
    }
}

impl From<f64> for Number {
    fn from(value: f64) -> Self {
        Self(InternalNumber::Real(value))
    }
}

macro_rules! int_num {
    ($i:ident) => {
        impl Skippable for $i {
            fn skip(r: &mut Reader<'_>, _: bool) -> Option<()> {
                r.forward_if(|b| b == b'+' || b == b'-');
                r.forward_while_1(is_digit)?;

                // We have a float instead of an integer.
                if r.peek_byte() == Some(b'.') {
                    return None;
                }

                Some(())
            }
        }

        impl Readable for $i {
            fn read(r: &mut Reader<'_>, _: ReaderContext<'_>) -> Option<$i> {
                let data = r.skip::<$i>(false)?;
                let data = data.strip_prefix(b"+").unwrap_or(data);

                $i::from_str(std::str::from_utf8(data).ok()?).ok()
            }
        }
    };
}

int_num!(i64);
int_num!(u64);
int_num!(u32);
int_num!(u16);
int_num!(usize);

#[inline(always)]
pub(crate) fn is_digit(byte: u8) -> bool {
    byte.is_ascii_digit()
}

#[cfg(test)]
mod tests {
    use crate::object::Number;
    use crate::reader::Reader;

    fn read(data: &[u8]) -> Option<Number> {
        Reader::new(data).read_plain::<Number>()
    }

    #[test]
    fn int_1() {
        assert_eq!(read(b"0").unwrap().as_integer(), Some(0));
    }

    #[test]
    fn int_2() {
        assert_eq!(read(b"+32").unwrap().as_integer(), Some(32));
    }

    #[test]
    fn int_3() {
        assert_eq!(read(b"-32").unwrap().as_integer(), Some(-32));
    }

    #[test]
    fn int_4() {
        assert_eq!(read(b"98349").unwrap().as_integer(), Some(98349));
    }

    #[test]
    fn int_5() {
        assert_eq!(read(b"003245").unwrap().as_integer(), Some(3245));
    }

    #[test]
    fn int_trailing() {
        assert_eq!(read(b"0abc").unwrap().as_integer(), Some(0));
    }

    #[test]
    fn real_1() {
        assert_eq!(read(b"3").unwrap().as_f64(), 3.0);
    }

    #[test]
    fn real_3() {
        assert_eq!(read(b"-32.01").unwrap().as_f64(), -32.01);
    }

    #[test]
    fn real_4() {
        assert_eq!(read(b"-.345").unwrap().as_f64(), -0.345);
    }

    #[test]
    fn real_5() {
        assert_eq!(read(b"-.00143").unwrap().as_f64(), -0.00143);
    }

    #[test]
    fn real_6() {
        assert_eq!(read(b"-12.0013").unwrap().as_f64(), -12.0013);
    }

    #[test]
    fn real_7() {
        assert_eq!(read(b"98349.432534").unwrap().as_f64(), 98_349.432_534);
    }

    #[test]
    fn real_trailing_dot() {
        let n = read(b"4.").unwrap();
        assert!(!n.is_integer());
        assert_eq!(n.as_f64(), 4.0);
    }

    #[test]
    fn real_failing() {
        assert!(read(b"+abc").is_none());
        assert!(read(b"-.").is_none());
    }

    #[test]
    fn integer_stays_integer() {
        assert!(read(b"12").unwrap().is_integer());
        assert!(!read(b"12.0").unwrap().is_integer());
    }

    #[test]
    fn huge_integer_becomes_real() {
        let n = read(b"99999999999999999999").unwrap();
        assert!(!n.is_integer());
    }

    #[test]
    fn display() {
        assert_eq!(Number::from_i64(-7).to_string(), "-7");
        assert_eq!(Number::from_f64(0.5).to_string(), "0.5");
        assert_eq!(Number::from_f64(2.0).to_string(), "2.0");
        assert_eq!(Number::from_f64(1e-7).to_string(), "0.0000001");
        assert_eq!(Number::from_f64(f64::NAN).to_string(), "0");
    }

    #[test]
    fn unsigned_reader() {
        assert_eq!(Reader::new(b"65535").read_plain::<u16>(), Some(65535));
        assert_eq!(Reader::new(b"65536").read_plain::<u16>(), None);
        assert_eq!(Reader::new(b"-3").read_plain::<u32>(), None);
    }
}
