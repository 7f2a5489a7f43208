//! Serializing objects back into their textual representation.

use crate::object::dict::keys::LENGTH;
use crate::object::{Array, Dict, Name, Number, ObjRef, Object, PdfString, Stream};
use std::io::Write;

/// Serialize an object into a new buffer.
pub fn to_bytes<T: WriteDirect + ?Sized>(item: &T) -> Vec<u8> {
    let mut out = vec![];
    item.write_direct(&mut out);

    out
}

/// An object that can be written as a direct object.
///
/// The output never starts or ends with white space, so tokens written one after another
/// only need a single space between them.
pub trait WriteDirect {
    /// Append the serialized object to `out`.
    fn write_direct(&self, out: &mut Vec<u8>);
}

impl WriteDirect for Object {
    fn write_direct(&self, out: &mut Vec<u8>) {
        match self {
            Self::Null => out.extend_from_slice(b"null"),
            Self::Boolean(b) => b.write_direct(out),
            Self::Number(n) => n.write_direct(out),
            Self::String(s) => s.write_direct(out),
            Self::Name(n) => n.write_direct(out),
            Self::Array(a) => a.write_direct(out),
            Self::Dict(d) => d.write_direct(out),
            Self::Stream(s) => s.write_direct(out),
            Self::Ref(r) => r.write_direct(out),
        }
    }
}

impl WriteDirect for bool {
    fn write_direct(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(if *self { b"true" } else { b"false" });
    }
}

impl WriteDirect for Number {
    fn write_direct(&self, out: &mut Vec<u8>) {
        // Writing into a `Vec` can't fail.
        let _ = write!(out, "{self}");
    }
}

impl WriteDirect for PdfString {
    fn write_direct(&self, out: &mut Vec<u8>) {
        self.write_escaped(out);
    }
}

impl WriteDirect for Name {
    fn write_direct(&self, out: &mut Vec<u8>) {
        self.write_escaped(out);
    }
}

impl WriteDirect for ObjRef {
    fn write_direct(&self, out: &mut Vec<u8>) {
        let _ = write!(out, "{} {} R", self.obj_number, self.gen_number);
    }
}

impl WriteDirect for Array {
    fn write_direct(&self, out: &mut Vec<u8>) {
        out.push(b'[');

        for (i, item) in self.iter().enumerate() {
            if i > 0 {
                out.push(b' ');
            }

            item.write_direct(out);
        }

        out.push(b']');
    }
}

impl WriteDirect for Dict {
    fn write_direct(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(b"<<");

        for (key, value) in self.iter() {
            out.push(b' ');
            key.write_direct(out);
            out.push(b' ');
            value.write_direct(out);
        }

        out.extend_from_slice(b" >>");
    }
}

impl WriteDirect for Stream {
    /// Streams are written with their dictionary, where `/Length` always reflects the
    /// actual length of the data.
    fn write_direct(&self, out: &mut Vec<u8>) {
        let mut dict = self.dict().clone();
        dict.insert(LENGTH, self.raw_data().len());
        dict.write_direct(out);

        out.extend_from_slice(b"\nstream\n");
        out.extend_from_slice(self.raw_data());
        out.extend_from_slice(b"\nendstream");
    }
}
