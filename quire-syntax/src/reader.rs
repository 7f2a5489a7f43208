//! Reading bytes and PDF objects from data.

use crate::object::ObjRef;
use crate::trivia::{Comment, is_eol_character, is_white_space_character};
use log::warn;
use std::fmt::{Debug, Formatter};
use std::ops::Range;

/// A reader for reading bytes and PDF objects.
#[derive(Clone, Debug)]
pub struct Reader<'a> {
    /// The underlying data of the reader.
    pub data: &'a [u8],
    /// The current byte-offset.
    pub offset: usize,
}

impl<'a> Reader<'a> {
    /// Create a new reader.
    #[inline]
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, offset: 0 }
    }

    /// Create a new reader at the given offset.
    #[inline]
    pub fn new_with(data: &'a [u8], offset: usize) -> Self {
        Self { data, offset }
    }

    /// Returns `true` if the reader has reached the end of the data.
    #[inline]
    pub fn at_end(&self) -> bool {
        self.offset >= self.data.len()
    }

    /// Moves the reader offset to the end of the data.
    #[inline]
    pub fn jump_to_end(&mut self) {
        self.offset = self.data.len();
    }

    /// Moves the reader to the specified offset.
    #[inline]
    pub fn jump(&mut self, offset: usize) {
        self.offset = offset;
    }

    /// Returns the remaining data from the current offset to the end.
    #[inline]
    pub fn tail(&self) -> Option<&'a [u8]> {
        self.data.get(self.offset..)
    }

    /// Returns the total length of the underlying data.
    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns `true` if the underlying data is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Returns a slice of the data for the specified range.
    #[inline]
    pub fn range(&self, range: Range<usize>) -> Option<&'a [u8]> {
        self.data.get(range)
    }

    /// Returns the current offset of the reader.
    #[inline]
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Reads the specified number of bytes and advances the offset.
    #[inline]
    pub fn read_bytes(&mut self, len: usize) -> Option<&'a [u8]> {
        let v = self.peek_bytes(len)?;
        self.offset += len;

        Some(v)
    }

    /// Reads a single byte and advances the offset.
    #[inline]
    pub fn read_byte(&mut self) -> Option<u8> {
        let v = self.peek_byte()?;
        self.offset += 1;

        Some(v)
    }

    /// Skips the specified number of bytes by advancing the offset.
    #[inline]
    pub fn skip_bytes(&mut self, len: usize) -> Option<()> {
        self.read_bytes(len).map(|_| {})
    }

    /// Peeks the specified number of bytes.
    #[inline]
    pub fn peek_bytes(&self, len: usize) -> Option<&'a [u8]> {
        self.data.get(self.offset..self.offset.checked_add(len)?)
    }

    /// Peeks a single byte.
    #[inline]
    pub fn peek_byte(&self) -> Option<u8> {
        self.data.get(self.offset).copied()
    }

    /// Eat the next byte if it satisfies the condition.
    #[inline]
    pub fn eat(&mut self, f: impl Fn(u8) -> bool) -> Option<u8> {
        let val = self.peek_byte()?;
        if f(val) {
            self.forward();
            Some(val)
        } else {
            None
        }
    }

    /// Advances the offset by one byte.
    #[inline]
    pub fn forward(&mut self) {
        self.offset += 1;
    }

    /// Advances the offset by one byte if the current byte satisfies the predicate.
    #[inline]
    pub fn forward_if(&mut self, f: impl Fn(u8) -> bool) -> Option<()> {
        if f(self.peek_byte()?) {
            self.forward();

            Some(())
        } else {
            None
        }
    }

    /// Advances the offset while bytes satisfy the predicate, at least one time.
    #[inline]
    pub fn forward_while_1(&mut self, f: impl Fn(u8) -> bool) -> Option<()> {
        self.eat(&f)?;
        self.forward_while(f);
        Some(())
    }

    /// Advances the offset if the next bytes match the specified tag.
    #[inline]
    pub fn forward_tag(&mut self, tag: &[u8]) -> Option<()> {
        self.peek_tag(tag)?;
        self.offset += tag.len();

        Some(())
    }

    /// Advances the offset while the given byte satisfies the predicate.
    #[inline]
    pub fn forward_while(&mut self, f: impl Fn(u8) -> bool) {
        while let Some(b) = self.peek_byte() {
            if f(b) {
                self.forward();
            } else {
                break;
            }
        }
    }

    /// Checks if the next bytes match the specified tag.
    #[inline]
    pub fn peek_tag(&self, tag: &[u8]) -> Option<()> {
        (self.peek_bytes(tag.len())? == tag).then_some(())
    }

    /// Read an object of the given type, restoring the offset on failure.
    #[inline]
    pub(crate) fn read<T: Readable>(&mut self, ctx: ReaderContext<'_>) -> Option<T> {
        let old_offset = self.offset;

        T::read(self, ctx).or_else(|| {
            self.offset = old_offset;

            None
        })
    }

    /// Read an object of the given type outside of a content stream and without
    /// any way of resolving indirect stream lengths.
    #[inline]
    pub(crate) fn read_plain<T: Readable>(&mut self) -> Option<T> {
        self.read::<T>(ReaderContext::default())
    }

    /// Skip an object of the given type, returning the skipped bytes. Restores the offset on
    /// failure.
    #[inline]
    pub(crate) fn skip<T: Skippable>(&mut self, in_content_stream: bool) -> Option<&'a [u8]> {
        let old_offset = self.offset;

        T::skip(self, in_content_stream).or_else(|| {
            self.offset = old_offset;
            None
        })?;

        self.data.get(old_offset..self.offset)
    }

    /// Skip all white space characters.
    #[inline]
    pub fn skip_white_spaces(&mut self) {
        self.forward_while(is_white_space_character);
    }

    /// Read exactly one white space (treating `\r\n` as a single one).
    #[inline]
    pub fn read_white_space(&mut self) -> Option<()> {
        let w = self.eat(is_white_space_character)?;

        if w == b'\r' && self.peek_byte() == Some(b'\n') {
            self.forward();
        }

        Some(())
    }

    /// Skip all end-of-line characters.
    #[inline]
    pub fn skip_eol_characters(&mut self) {
        self.forward_while(is_eol_character);
    }

    /// Skip white spaces and comments.
    #[inline]
    pub fn skip_white_spaces_and_comments(&mut self) {
        while let Some(b) = self.peek_byte() {
            if is_white_space_character(b) {
                self.skip_white_spaces();
            } else if b == b'%' {
                Comment::skip(self, true);
            } else {
                return;
            }
        }
    }
}

/// A callback that resolves the value of an indirect `/Length` entry.
pub(crate) type LengthResolver<'a> = &'a dyn Fn(ObjRef) -> Option<usize>;

/// Arrays and dictionaries nested deeper than this are rejected.
const MAX_NESTING_DEPTH: u32 = 256;

/// Information about where an object is being read from.
#[derive(Clone, Copy, Default)]
pub(crate) struct ReaderContext<'a> {
    /// Object references can't appear in content streams, so numbers never need a look-ahead.
    pub(crate) in_content_stream: bool,
    pub(crate) lengths: Option<LengthResolver<'a>>,
    depth: u32,
}

impl<'a> ReaderContext<'a> {
    pub(crate) fn content_stream() -> Self {
        Self {
            in_content_stream: true,
            ..Self::default()
        }
    }

    pub(crate) fn with_lengths(lengths: LengthResolver<'a>) -> Self {
        Self {
            lengths: Some(lengths),
            ..Self::default()
        }
    }

    /// The context for the items of an array or dictionary, `None` if it is nested too deeply.
    pub(crate) fn nested(self) -> Option<Self> {
        if self.depth >= MAX_NESTING_DEPTH {
            warn!("objects are nested too deeply");

            return None;
        }

        Some(Self {
            depth: self.depth + 1,
            ..self
        })
    }
}

impl Debug for ReaderContext<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReaderContext")
            .field("in_content_stream", &self.in_content_stream)
            .field("has_length_resolver", &self.lengths.is_some())
            .field("depth", &self.depth)
            .finish()
    }
}

pub(crate) trait Readable: Sized {
    fn read(r: &mut Reader<'_>, ctx: ReaderContext<'_>) -> Option<Self>;

    fn from_bytes(b: &[u8]) -> Option<Self> {
        Reader::new(b).read_plain::<Self>()
    }
}

pub(crate) trait Skippable {
    fn skip(r: &mut Reader<'_>, in_content_stream: bool) -> Option<()>;
}
