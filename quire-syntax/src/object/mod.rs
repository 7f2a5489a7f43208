//! PDF objects.

use crate::reader::{Readable, Reader, ReaderContext};

pub mod array;
pub mod dict;
pub mod name;
pub mod number;
pub mod r#ref;
pub mod stream;
pub mod string;

pub use array::Array;
pub use dict::Dict;
pub use name::Name;
pub use number::Number;
pub use r#ref::ObjRef;
pub use stream::Stream;
pub use string::{Fallback, PdfString, StringKind};

pub(crate) use r#ref::IndirectHeader;

/// A primitive PDF object.
///
/// Arrays and dictionaries hold direct objects or references. A reference is never
/// resolved by the object model itself, resolution always goes through the
/// [`IndirectObjectTable`](crate::table::IndirectObjectTable).
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Object {
    /// The null object.
    #[default]
    Null,
    /// A boolean object.
    Boolean(bool),
    /// A number object.
    Number(Number),
    /// A string object.
    String(PdfString),
    /// A name object.
    Name(Name),
    /// An array object.
    Array(Array),
    /// A dict object.
    Dict(Dict),
    /// A stream object.
    // Can only be an indirect object in theory, but we treat it the same.
    Stream(Stream),
    /// A reference to an indirect object.
    Ref(ObjRef),
}

impl Object {
    /// Whether the object is the null object.
    #[inline]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Return the object as a boolean.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Return the object as a number.
    pub fn as_number(&self) -> Option<Number> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Return the object as an integer. Reals are only accepted if they have no
    /// fractional part.
    pub fn as_i64(&self) -> Option<i64> {
        self.as_number().and_then(|n| n.as_integer())
    }

    /// Return the object as a float.
    pub fn as_f64(&self) -> Option<f64> {
        self.as_number().map(|n| n.as_f64())
    }

    /// Return the object as a string.
    pub fn as_string(&self) -> Option<&PdfString> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Return the object as a name.
    pub fn as_name(&self) -> Option<&Name> {
        match self {
            Self::Name(n) => Some(n),
            _ => None,
        }
    }

    /// Return the object as an array.
    pub fn as_array(&self) -> Option<&Array> {
        match self {
            Self::Array(a) => Some(a),
            _ => None,
        }
    }

    /// Return the object as a mutable array.
    pub fn as_array_mut(&mut self) -> Option<&mut Array> {
        match self {
            Self::Array(a) => Some(a),
            _ => None,
        }
    }

    /// Return the object as a dictionary. For streams, this returns the stream dictionary.
    pub fn as_dict(&self) -> Option<&Dict> {
        match self {
            Self::Dict(d) => Some(d),
            Self::Stream(s) => Some(s.dict()),
            _ => None,
        }
    }

    /// Return the object as a mutable dictionary. For streams, this returns the stream
    /// dictionary.
    pub fn as_dict_mut(&mut self) -> Option<&mut Dict> {
        match self {
            Self::Dict(d) => Some(d),
            Self::Stream(s) => Some(s.dict_mut()),
            _ => None,
        }
    }

    /// Return the object as a stream.
    pub fn as_stream(&self) -> Option<&Stream> {
        match self {
            Self::Stream(s) => Some(s),
            _ => None,
        }
    }

    /// Return the object as a mutable stream.
    pub fn as_stream_mut(&mut self) -> Option<&mut Stream> {
        match self {
            Self::Stream(s) => Some(s),
            _ => None,
        }
    }

    /// Return the object as an object reference.
    pub fn as_obj_ref(&self) -> Option<ObjRef> {
        match self {
            Self::Ref(r) => Some(*r),
            _ => None,
        }
    }

    /// A short name of the object type, for diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Boolean(_) => "boolean",
            Self::Number(_) => "number",
            Self::String(_) => "string",
            Self::Name(_) => "name",
            Self::Array(_) => "array",
            Self::Dict(_) => "dictionary",
            Self::Stream(_) => "stream",
            Self::Ref(_) => "reference",
        }
    }
}

macro_rules! from_impl {
    ($t:ty, $v:ident) => {
        impl From<$t> for Object {
            fn from(value: $t) -> Self {
                Self::$v(value)
            }
        }
    };
}

from_impl!(bool, Boolean);
from_impl!(Number, Number);
from_impl!(PdfString, String);
from_impl!(Name, Name);
from_impl!(Array, Array);
from_impl!(Dict, Dict);
from_impl!(Stream, Stream);
from_impl!(ObjRef, Ref);

macro_rules! from_num_impl {
    ($t:ty) => {
        impl From<$t> for Object {
            fn from(value: $t) -> Self {
                Self::Number(Number::from(value))
            }
        }
    };
}

from_num_impl!(i32);
from_num_impl!(i64);
from_num_impl!(u16);
from_num_impl!(u32);
from_num_impl!(usize);
from_num_impl!(f32);
from_num_impl!(f64);

impl Readable for Object {
    fn read(r: &mut Reader<'_>, ctx: ReaderContext<'_>) -> Option<Self> {
        let object = match r.peek_byte()? {
            b'n' => {
                r.forward_tag(b"null")?;
                Self::Null
            }
            b't' => {
                r.forward_tag(b"true")?;
                Self::Boolean(true)
            }
            b'f' => {
                r.forward_tag(b"false")?;
                Self::Boolean(false)
            }
            b'/' => Self::Name(r.read::<Name>(ctx)?),
            b'<' => match r.peek_bytes(2)? {
                b"<<" => {
                    let mut cloned = r.clone();
                    let dict = cloned.read::<Dict>(ctx)?;
                    cloned.skip_white_spaces_and_comments();

                    if !ctx.in_content_stream && cloned.peek_tag(b"stream").is_some() {
                        Self::Stream(r.read::<Stream>(ctx)?)
                    } else {
                        r.jump(cloned.offset());

                        Self::Dict(dict)
                    }
                }
                _ => Self::String(r.read::<PdfString>(ctx)?),
            },
            b'(' => Self::String(r.read::<PdfString>(ctx)?),
            b'.' | b'+' | b'-' | b'0'..=b'9' => {
                // Object references can't appear in content streams, so we don't need to
                // look ahead there.
                if !ctx.in_content_stream
                    && let Some(obj_ref) = r.read::<ObjRef>(ctx)
                {
                    Self::Ref(obj_ref)
                } else {
                    Self::Number(r.read::<Number>(ctx)?)
                }
            }
            b'[' => Self::Array(r.read::<Array>(ctx)?),
            _ => return None,
        };

        Some(object)
    }
}
