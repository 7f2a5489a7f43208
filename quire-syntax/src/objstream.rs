//! Reading object streams.

use crate::object::dict::keys::{EXTENDS, FIRST, N, OBJ_STM};
use crate::object::{ObjRef, Object, Stream};
use crate::reader::{Reader, ReaderContext};
use log::warn;

/// A decoded object stream (`/Type /ObjStm`).
#[derive(Debug, Clone)]
pub struct ObjectStream {
    data: Vec<u8>,
    offsets: Vec<(u32, usize)>,
    extends: Option<ObjRef>,
}

impl ObjectStream {
    /// Decode an object stream and read its header of object numbers and offsets.
    pub fn new(stream: &Stream) -> Option<Self> {
        let dict = stream.dict();

        if !dict.has_type(OBJ_STM) {
            warn!("object stream has the wrong type");
        }

        let num_objects = dict.get_i64(N).and_then(|n| usize::try_from(n).ok())?;
        let first_offset = dict.get_i64(FIRST).and_then(|n| usize::try_from(n).ok())?;
        let data = stream.decoded()?;

        let mut r = Reader::new(&data);
        let mut offsets = Vec::with_capacity(num_objects);

        for _ in 0..num_objects {
            r.skip_white_spaces_and_comments();
            let obj_num = r.read_plain::<u32>()?;
            r.skip_white_spaces_and_comments();
            let relative_offset = r.read_plain::<usize>()?;
            offsets.push((obj_num, first_offset.checked_add(relative_offset)?));
        }

        Some(Self {
            data,
            offsets,
            extends: dict.get_ref(EXTENDS),
        })
    }

    /// The number of objects in the stream.
    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    /// Whether the stream holds no objects.
    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }

    /// The object stream that this one extends, if any.
    pub fn extends(&self) -> Option<ObjRef> {
        self.extends
    }

    /// The object numbers stored in this stream, in order.
    pub fn object_numbers(&self) -> impl Iterator<Item = u32> + '_ {
        self.offsets.iter().map(|(n, _)| *n)
    }

    /// Read the object with the given number, which is expected at `index`. If the index
    /// doesn't match, the header is searched for the object number.
    pub fn get(&self, obj_number: u32, index: u32) -> Option<Object> {
        let offset = match self.offsets.get(index as usize) {
            Some((n, offset)) if *n == obj_number => *offset,
            _ => {
                warn!("object {obj_number} is not at index {index} of its object stream");

                self.offsets.iter().find(|(n, _)| *n == obj_number)?.1
            }
        };

        let mut r = Reader::new_with(&self.data, offset);
        r.skip_white_spaces_and_comments();

        // Streams can't be stored in object streams, and neither can references to the
        // lengths of streams, so no resolver is needed.
        r.read::<Object>(ReaderContext::default())
    }
}
