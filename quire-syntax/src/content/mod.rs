//! PDF content streams.
//!
//! A content stream is read in two steps. The [`Tokenizer`] turns the bytes into flat
//! operations, collecting operands on a stack until an operator keyword arrives. Then,
//! [`parse`] groups these operations into a tree of [`ContentObject`]s, with nodes for paths,
//! text objects, saved graphics states and marked content. [`build`] writes such a tree
//! back into bytes.

mod builder;
mod contents;
mod inline_image;
pub mod ops;
mod tree;

pub use builder::build;
pub use contents::{Compression, ContentSettings, Contents};
pub use tree::parse;

use crate::error::{Error, Result};
use crate::object::name::skip_name_like;
use crate::object::{Dict, Name, Object};
use crate::reader::{Reader, ReaderContext};
use crate::write::WriteDirect;
use log::{debug, warn};
use ops::OperatorKind;
use smallvec::SmallVec;
use std::fmt::{Debug, Formatter};

// 6 operands are used for example for ctm or cubic curves,
// but anything above should be pretty rare (for example for
// DeviceN color spaces)
const OPERANDS_THRESHOLD: usize = 6;

/// The operands of an operation.
pub type Operands = SmallVec<[Object; OPERANDS_THRESHOLD]>;

/// A single operation in a content stream.
#[derive(Clone, PartialEq)]
pub struct Operation {
    /// The operator keyword.
    pub operator: Name,
    /// The operands, in the order in which they appeared.
    pub operands: Operands,
}

impl Operation {
    /// Create a new operation.
    pub fn new(operator: impl Into<Name>, operands: impl IntoIterator<Item = Object>) -> Self {
        Self {
            operator: operator.into(),
            operands: operands.into_iter().collect(),
        }
    }

    /// The group of the operator, `None` for operators that aren't defined.
    pub fn kind(&self) -> Option<OperatorKind> {
        ops::kind(&self.operator)
    }

    /// Whether the operator is `name`.
    pub fn is(&self, name: &[u8]) -> bool {
        self.operator.as_bytes() == name
    }

    pub(crate) fn write(&self, out: &mut Vec<u8>) {
        for operand in &self.operands {
            operand.write_direct(out);
            out.push(b' ');
        }

        out.extend_from_slice(&self.operator);
        out.push(b'\n');
    }
}

impl Debug for Operation {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?} {}", self.operands.as_slice(), self.operator.as_str())
    }
}

/// An inline image, consisting of the image dictionary and its data.
#[derive(Debug, Clone, PartialEq)]
pub struct InlineImage {
    /// The image dictionary, with its keys as they appear in the stream (possibly
    /// abbreviated).
    pub dict: Dict,
    /// The (potentially encoded) image data.
    pub data: Vec<u8>,
}

/// A node of a parsed content stream.
#[derive(Debug, Clone, PartialEq)]
pub enum ContentObject {
    /// An operation that isn't grouped into any other node.
    Operation(Operation),
    /// A sequence of path construction, clipping and painting operations.
    Path(Vec<Operation>),
    /// A text object, enclosed in `BT` and `ET`.
    Text(Vec<ContentObject>),
    /// A saved graphics state, enclosed in `q` and `Q`.
    LocalGraphicsState(Vec<ContentObject>),
    /// A marked-content sequence, enclosed in `BMC` or `BDC` and `EMC`.
    MarkedContent {
        /// The tag of the sequence.
        tag: Name,
        /// The property list, either inline or as a name of a resource. Only present
        /// for `BDC`.
        properties: Option<Object>,
        /// The content of the sequence.
        children: Vec<ContentObject>,
    },
    /// An inline image, enclosed in `BI`, `ID` and `EI`.
    InlineImage(InlineImage),
    /// An external object painted with `Do`.
    XObject(Name),
    /// A shading painted with `sh`.
    Shading(Name),
}

/// A token produced by the tokenizer.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// An operator together with its operands.
    Operation(Operation),
    /// A complete inline image.
    InlineImage(InlineImage),
}

/// A tokenizer for content streams.
///
/// Yields an error and stops if a token can't be read or an inline image has no end
/// marker.
pub struct Tokenizer<'a> {
    reader: Reader<'a>,
    stack: Operands,
}

impl<'a> Tokenizer<'a> {
    /// Create a new tokenizer.
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            reader: Reader::new(data),
            stack: SmallVec::new(),
        }
    }

    /// The offset of the next token.
    pub fn offset(&self) -> usize {
        self.reader.offset()
    }

    /// Continue tokenizing at the given offset, which must be the start of a token.
    pub fn jump(&mut self, offset: usize) {
        self.stack.clear();
        self.reader.jump(offset);
    }

    fn read_inline_image(&mut self) -> Result<InlineImage> {
        let start = self.reader.offset();

        let Some(dict) = Dict::read_inline(&mut self.reader) else {
            return Err(Error::InlineImage { offset: start });
        };

        self.reader.forward_tag(b"ID").ok_or(Error::InlineImage { offset: start })?;
        // A single white space separates `ID` from the data.
        self.reader.forward_if(crate::trivia::is_white_space_character);

        let data_start = self.reader.offset();
        let (data_end, after) = inline_image::find_end(self.reader.data, data_start)
            .ok_or(Error::InlineImage { offset: data_start })?;
        self.reader.jump(after);

        Ok(InlineImage {
            dict,
            data: self.reader.data[data_start..data_end].to_vec(),
        })
    }
}

impl Iterator for Tokenizer<'_> {
    type Item = Result<Token>;

    fn next(&mut self) -> Option<Self::Item> {
        self.stack.clear();

        loop {
            self.reader.skip_white_spaces_and_comments();

            if self.reader.at_end() {
                if !self.stack.is_empty() {
                    warn!(
                        "dropping {} operands at the end of the content stream",
                        self.stack.len()
                    );
                    self.stack.clear();
                }

                return None;
            }

            let offset = self.reader.offset();

            match read_raw_token(&mut self.reader) {
                Some(RawToken::Operand(operand)) => self.stack.push(operand),
                Some(RawToken::Operator(operator)) if operator.as_bytes() == b"BI" => {
                    if !self.stack.is_empty() {
                        debug!("ignoring operands of inline image at offset {offset}");
                    }

                    return Some(match self.read_inline_image() {
                        Ok(image) => Ok(Token::InlineImage(image)),
                        Err(e) => {
                            self.reader.jump_to_end();

                            Err(e)
                        }
                    });
                }
                Some(RawToken::Operator(operator)) => {
                    return Some(Ok(Token::Operation(Operation {
                        operator,
                        operands: std::mem::take(&mut self.stack),
                    })));
                }
                None => {
                    self.reader.jump_to_end();

                    return Some(Err(Error::parse(offset, "content stream token")));
                }
            }
        }
    }
}

pub(crate) enum RawToken {
    Operand(Object),
    Operator(Name),
}

pub(crate) fn read_raw_token(r: &mut Reader<'_>) -> Option<RawToken> {
    let ctx = ReaderContext::content_stream();

    match r.peek_byte()? {
        b'/' | b'.' | b'+' | b'-' | b'0'..=b'9' | b'[' | b'<' | b'(' => {
            r.read::<Object>(ctx).map(RawToken::Operand)
        }
        _ => {
            let start = r.offset();
            skip_name_like(r, false)?;
            let data = r.range(start..r.offset())?;

            match data {
                b"" => None,
                b"true" => Some(RawToken::Operand(Object::Boolean(true))),
                b"false" => Some(RawToken::Operand(Object::Boolean(false))),
                b"null" => Some(RawToken::Operand(Object::Null)),
                _ => Some(RawToken::Operator(Name::from_escaped(data))),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(data: &[u8]) -> Vec<Token> {
        Tokenizer::new(data).collect::<Result<Vec<_>>>().unwrap()
    }

    fn operators(data: &[u8]) -> Vec<String> {
        tokens(data)
            .into_iter()
            .map(|t| match t {
                Token::Operation(op) => op.operator.as_str().to_string(),
                Token::InlineImage(_) => "<image>".to_string(),
            })
            .collect()
    }

    #[test]
    fn operands_collect_on_stack() {
        let tokens = tokens(b"1 0 0 1 50 50 cm /F1 12 Tf [(a) -20 (b)] TJ");

        let Token::Operation(cm) = &tokens[0] else {
            panic!("expected an operation");
        };
        assert!(cm.is(b"cm"));
        assert_eq!(cm.operands.len(), 6);

        let Token::Operation(tj) = &tokens[2] else {
            panic!("expected an operation");
        };
        assert_eq!(tj.operands[0].as_array().unwrap().len(), 3);
    }

    #[test]
    fn keywords_as_operands() {
        let tokens = tokens(b"true false null foo");
        let Token::Operation(op) = &tokens[0] else {
            panic!("expected an operation");
        };

        assert_eq!(op.operands.len(), 3);
        assert_eq!(op.operands[2], Object::Null);
    }

    #[test]
    fn operators_that_look_like_keywords() {
        assert_eq!(operators(b"0 0 m 1 1 l f n"), vec!["m", "l", "f", "n"]);
    }

    #[test]
    fn comments_are_skipped() {
        assert_eq!(operators(b"q % save\nQ"), vec!["q", "Q"]);
    }

    #[test]
    fn quote_operators() {
        assert_eq!(operators(b"(a) ' 1 2 (b) \""), vec!["'", "\""]);
    }

    #[test]
    fn trailing_operands_are_dropped() {
        assert_eq!(operators(b"q 1 2"), vec!["q"]);
    }

    #[test]
    fn unreadable_token() {
        let mut t = Tokenizer::new(b"q ) Q");

        assert!(matches!(t.next(), Some(Ok(Token::Operation(op))) if op.is(b"q")));
        assert!(matches!(
            t.next(),
            Some(Err(Error::Parse { offset: 2, .. }))
        ));
        assert!(t.next().is_none());
    }

    #[test]
    fn inline_image() {
        let tokens = tokens(b"BI /W 2 /H 1 /BPC 8 /CS /G ID \x00\xff EI Q");

        let Token::InlineImage(image) = &tokens[0] else {
            panic!("expected an inline image");
        };
        assert_eq!(image.data, b"\x00\xff");
        assert_eq!(image.dict.get_i64(b"W"), Some(2));
        assert!(matches!(&tokens[1], Token::Operation(op) if op.is(b"Q")));
    }

    #[test]
    fn inline_image_without_end() {
        let res = Tokenizer::new(b"BI /W 1 ID abc").collect::<Result<Vec<_>>>();
        assert!(matches!(res, Err(Error::InlineImage { .. })));
    }

    #[test]
    fn jump_back() {
        let mut t = Tokenizer::new(b"q Q");
        let start = t.offset();
        t.next();
        t.jump(start);
        assert!(matches!(t.next(), Some(Ok(Token::Operation(op))) if op.is(b"q")));
    }

    #[test]
    fn write_operation() {
        let mut out = vec![];
        Operation::new(b"Tf", [Object::Name(Name::from("F1")), Object::from(12)]).write(&mut out);
        assert_eq!(out, b"/F1 12 Tf\n");
    }
}
