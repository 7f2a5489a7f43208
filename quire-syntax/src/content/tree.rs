//! Grouping the operations of a content stream into a tree.

use crate::content::ops::{self, OperatorKind};
use crate::content::{ContentObject, Operation, Token, Tokenizer};
use crate::error::Result;
use crate::object::{Name, Object};
use log::{debug, warn};

/// Containers nested deeper than this are kept as flat operations.
const MAX_NESTING: usize = 256;

/// Parse a content stream into a tree of content objects.
///
/// Containers that are not closed are closed at the end of the stream, and end operators
/// without a matching begin operator are kept as plain operations. Fails if a token can't be
/// read or an inline image has no end marker, so that nothing after it is lost silently.
pub fn parse(data: &[u8]) -> Result<Vec<ContentObject>> {
    let mut parser = Parser {
        tokens: Tokenizer::new(data),
        depth: 0,
    };

    parser.read_objects(None)
}

struct Parser<'a> {
    tokens: Tokenizer<'a>,
    depth: usize,
}

impl Parser<'_> {
    fn read_objects(&mut self, end: Option<&[u8]>) -> Result<Vec<ContentObject>> {
        let mut objects = vec![];

        while let Some(token) = self.tokens.next() {
            let op = match token? {
                Token::InlineImage(image) => {
                    objects.push(ContentObject::InlineImage(image));
                    continue;
                }
                Token::Operation(op) => op,
            };

            if let Some(end) = end
                && op.is(end)
            {
                return Ok(objects);
            }

            objects.push(self.read_object(op)?);
        }

        if let Some(end) = end {
            warn!(
                "missing {} operator at the end of the content stream",
                String::from_utf8_lossy(end)
            );
        }

        Ok(objects)
    }

    fn read_object(&mut self, op: Operation) -> Result<ContentObject> {
        let kind = op.kind();

        if !has_valid_arity(&op) {
            debug!(
                "operator {:?} has an unexpected number of operands ({})",
                op.operator,
                op.operands.len()
            );
        }

        if kind.is_some_and(OperatorKind::is_path) {
            return self.read_path(op);
        }

        let container_end: Option<&[u8]> = match op.operator.as_bytes() {
            b"BT" => Some(b"ET"),
            b"q" => Some(b"Q"),
            b"BMC" | b"BDC" => Some(b"EMC"),
            b"ET" | b"Q" | b"EMC" => {
                warn!("found {:?} without a matching begin operator", op.operator);

                None
            }
            b"Do" => return Ok(named(op, ContentObject::XObject)),
            b"sh" => return Ok(named(op, ContentObject::Shading)),
            _ => None,
        };

        let Some(end) = container_end else {
            return Ok(ContentObject::Operation(op));
        };

        if self.depth >= MAX_NESTING {
            warn!("content stream is nested too deeply, keeping {:?} as is", op.operator);

            return Ok(ContentObject::Operation(op));
        }

        // Marked content only becomes a container if the builder writes back the same operator.
        let marked_content = match (op.operator.as_bytes(), op.operands.as_slice()) {
            (b"BMC", [Object::Name(tag)]) => Some((tag.clone(), None)),
            (b"BDC", [Object::Name(tag), properties]) => {
                Some((tag.clone(), Some(properties.clone())))
            }
            (b"BMC" | b"BDC", _) => {
                warn!("invalid operands for {:?}", op.operator);

                return Ok(ContentObject::Operation(op));
            }
            _ => None,
        };

        self.depth += 1;
        let children = self.read_objects(Some(end));
        self.depth -= 1;
        let children = children?;

        Ok(match (op.operator.as_bytes(), marked_content) {
            (b"BT", _) => ContentObject::Text(children),
            (_, Some((tag, properties))) => ContentObject::MarkedContent {
                tag,
                properties,
                children,
            },
            _ => ContentObject::LocalGraphicsState(children),
        })
    }

    fn read_path(&mut self, first: Operation) -> Result<ContentObject> {
        let is_painting = |op: &Operation| op.kind() == Some(OperatorKind::PathPainting);

        // The number of operations and the offset after the last painting operator.
        let mut painted = is_painting(&first).then(|| (1, self.tokens.offset()));
        let mut path = vec![first];

        loop {
            let before = self.tokens.offset();

            let op = match self.tokens.next().transpose()? {
                Some(Token::Operation(op)) if op.kind().is_some_and(OperatorKind::is_path) => op,
                _ => {
                    self.end_path(&mut path, painted, before);
                    break;
                }
            };

            let painting = is_painting(&op);
            path.push(op);

            if painting {
                painted = Some((path.len(), self.tokens.offset()));
            }
        }

        Ok(ContentObject::Path(path))
    }

    /// End a path at the last painting operator, or at `end` if there is none.
    fn end_path(&mut self, path: &mut Vec<Operation>, painted: Option<(usize, usize)>, end: usize) {
        match painted {
            Some((len, offset)) => {
                path.truncate(len);
                self.tokens.jump(offset);
            }
            None => self.tokens.jump(end),
        }
    }
}

fn named(op: Operation, node: impl FnOnce(Name) -> ContentObject) -> ContentObject {
    match op.operands.as_slice() {
        [Object::Name(name)] => node(name.clone()),
        _ => {
            warn!("invalid operands for {:?}", op.operator);

            ContentObject::Operation(op)
        }
    }
}

fn has_valid_arity(op: &Operation) -> bool {
    ops::lookup(&op.operator).is_none_or(|info| info.arity.accepts(op.operands.len()))
}
