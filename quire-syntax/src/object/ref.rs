//! Object references.

use crate::reader::{Readable, Reader, ReaderContext, Skippable};
use std::fmt;

/// A reference to an indirect object.
#[derive(PartialEq, Eq, PartialOrd, Ord, Hash, Clone, Copy)]
pub struct ObjRef {
    /// The object number.
    pub obj_number: u32,
    /// The generation number.
    pub gen_number: u16,
}

impl ObjRef {
    /// Create a new object reference.
    pub fn new(obj_number: u32, gen_number: u16) -> Self {
        Self {
            obj_number,
            gen_number,
        }
    }
}

impl fmt::Debug for ObjRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} R", self.obj_number, self.gen_number)
    }
}

impl fmt::Display for ObjRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} R", self.obj_number, self.gen_number)
    }
}

impl Skippable for ObjRef {
    fn skip(r: &mut Reader<'_>, _: bool) -> Option<()> {
        r.skip::<u32>(false)?;
        r.skip_white_spaces_and_comments();
        r.skip::<u16>(false)?;
        r.skip_white_spaces_and_comments();
        r.forward_tag(b"R")?;

        Some(())
    }
}

impl Readable for ObjRef {
    fn read(r: &mut Reader<'_>, ctx: ReaderContext<'_>) -> Option<Self> {
        let obj_number = r.read::<u32>(ctx)?;
        r.skip_white_spaces_and_comments();
        let gen_number = r.read::<u16>(ctx)?;
        r.skip_white_spaces_and_comments();
        r.forward_tag(b"R")?;

        Some(Self::new(obj_number, gen_number))
    }
}

/// The `n g obj` header of an indirect object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct IndirectHeader(pub(crate) ObjRef);

impl Readable for IndirectHeader {
    fn read(r: &mut Reader<'_>, ctx: ReaderContext<'_>) -> Option<Self> {
        let obj_number = r.read::<u32>(ctx)?;
        r.skip_white_spaces_and_comments();
        let gen_number = r.read::<u16>(ctx)?;
        r.skip_white_spaces_and_comments();
        r.forward_tag(b"obj")?;

        Some(Self(ObjRef::new(obj_number, gen_number)))
    }
}
