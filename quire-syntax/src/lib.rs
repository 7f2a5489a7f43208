/*!
A low-level crate for reading and mutating the object graph of PDF files.

This crate provides the building blocks for working with PDF files on the level of their
object structure:
- The primitive objects ([`object::Object`] and friends), how they are parsed and how they
  are written back.
- The cross-reference chain ([`xref`]), including classic tables, cross-reference streams,
  hybrid files and `/Prev` chains.
- The [`IndirectObjectTable`], which resolves indirect objects lazily and records every
  mutation, so that a writer knows which objects changed.
- Content streams ([`content`]), parsed into a tree of paths, text objects, graphics states,
  marked content and inline images.

Writing files is handled by the `quire-write` crate.

## Example
```rust,no_run
use quire_syntax::Pdf;

let data = std::fs::read("document.pdf").unwrap();
let pdf = Pdf::new(data).unwrap();

for number in pdf.objects() {
    println!("{number}: {:?}", pdf.table().resolve(number));
}
```

## Robustness
Malformed objects never cause an error: an object whose bytes can't be read resolves to the
null object, and a warning is emitted through the `log` crate. Only problems that make the
whole file unreadable, like a broken cross-reference chain, are reported as an [`Error`].
Encrypted files are rejected with [`Error::Unsupported`].
*/

#![forbid(unsafe_code)]

pub mod content;
mod error;
pub mod filter;
pub mod object;
pub mod objstream;
pub mod pdf;
pub(crate) mod reader;
pub mod table;
pub(crate) mod trivia;
pub mod write;
pub mod xref;

pub use error::{EncodingError, Error, Feature, Result};
pub use pdf::{Pdf, Version};
pub use table::IndirectObjectTable;
