/*!
A crate for opening, modifying and saving PDF files.

This crate ties together [`quire_syntax`], which reads PDF files into an indirect object table,
and [`quire_write`], which saves them again. A [`File`] holds a PDF read into memory and can be
saved in place, either as a full rewrite or as an incremental update. The on-disk file is only
replaced once the new version has been written completely.

Objects can be copied between files with a [`Cloner`](clone::Cloner), which follows all
references and can adjust values on the way with a chain of filters.

Encrypted files are not supported and are rejected when they are opened.

## Example
```no_run
use quire::{File, SaveMode, SaveOptions};
use quire::object::Name;

let mut file = File::open("document.pdf").unwrap();
let info = file.table_mut().register(Name::from("Edited"));
println!("registered {info:?}");

file.save(&SaveOptions {
    mode: SaveMode::Incremental,
    ..SaveOptions::default()
})
.unwrap();
```

## Safety
This crate forbids unsafe code via a crate-level attribute.
*/

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod clone;
mod file;

pub use file::File;
pub use quire_syntax;
pub use quire_syntax::content;
pub use quire_syntax::object;
pub use quire_syntax::{EncodingError, Error, Feature, IndirectObjectTable, Pdf, Result, Version};
pub use quire_write;
pub use quire_write::{SaveMode, SaveOptions, XRefMode};
