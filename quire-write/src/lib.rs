/*!
A crate for saving PDF files that were read (and possibly modified) with `quire-syntax`.

Files can be saved in the following ways:
- [`SaveMode::Standard`] rewrites the whole file, with every live object written in ascending
  order followed by a single cross-reference section.
- [`SaveMode::Incremental`] keeps the original bytes untouched and appends the modified objects
  together with a new cross-reference section that links back to the previous one.
- [`SaveMode::Compressed`] rewrites the whole file, packing all objects that allow it into
  object streams and using a cross-reference stream.

Writing linearized files is not supported.
*/

#![forbid(unsafe_code)]

mod objstm;
mod primitive;
mod xref;

pub use objstm::MAX_OBJECTS_PER_STREAM;
pub use xref::close_free_list;

use crate::primitive::{is_compressible, is_structural, write_indirect};
use log::debug;
use quire_syntax::object::dict::keys::{ID, INFO, PREV, ROOT, SIZE};
use quire_syntax::object::{Dict, ObjRef, Object};
use quire_syntax::xref::XRefEntry;
use quire_syntax::{Error, Feature, IndirectObjectTable, Pdf, Result, Version};
use std::collections::{BTreeMap, BTreeSet};

/// How a file is saved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SaveMode {
    /// A full rewrite.
    #[default]
    Standard,
    /// Append the changes to the original file.
    Incremental,
    /// A full rewrite using object streams and a cross-reference stream.
    Compressed,
    /// A linearized file, which is not supported.
    Linearized,
}

/// The kind of cross-reference section that is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum XRefMode {
    /// A classic cross-reference table.
    #[default]
    Table,
    /// A cross-reference stream. Incremental saves additionally pack modified objects into
    /// object streams.
    Stream,
}

/// Options for saving a file.
#[derive(Debug, Clone, Copy, Default)]
pub struct SaveOptions {
    /// How the file is saved.
    pub mode: SaveMode,
    /// The kind of cross-reference section. Ignored for [`SaveMode::Compressed`], which always
    /// uses a stream.
    pub xref: XRefMode,
    /// Whether streams without any filter are compressed with the flate filter.
    pub compress_streams: bool,
}

/// Save a file.
pub fn write(pdf: &Pdf, options: &SaveOptions) -> Result<Vec<u8>> {
    match options.mode {
        SaveMode::Standard => Ok(write_full(pdf, options.xref, false, options.compress_streams)),
        SaveMode::Compressed => Ok(write_full(
            pdf,
            XRefMode::Stream,
            true,
            options.compress_streams,
        )),
        SaveMode::Incremental => Ok(write_incremental(pdf, options)),
        SaveMode::Linearized => Err(Error::Unsupported(Feature::LinearizedWrite)),
    }
}

struct Writer<'a> {
    table: &'a IndirectObjectTable,
    out: Vec<u8>,
    /// The entries of all objects, as they are after writing.
    entries: BTreeMap<u32, XRefEntry>,
    compress_streams: bool,
    /// Numbers of old object and cross-reference streams that can be reused for new ones.
    spare: Vec<u32>,
    next_number: u32,
}

impl<'a> Writer<'a> {
    fn new(table: &'a IndirectObjectTable, out: Vec<u8>, compress_streams: bool) -> Self {
        let entries = (0..table.size())
            .filter_map(|n| table.entry(n).map(|e| (n, e)))
            .collect();

        Self {
            table,
            out,
            entries,
            compress_streams,
            spare: vec![],
            next_number: table.size(),
        }
    }

    /// Allocate an object number for an object stream or a cross-reference stream.
    fn allocate(&mut self) -> u32 {
        if !self.spare.is_empty() {
            return self.spare.remove(0);
        }

        self.next_number += 1;

        self.next_number - 1
    }

    fn write_object(&mut self, obj_ref: ObjRef, object: &Object) {
        let offset = self.out.len();

        match object {
            Object::Stream(stream) if self.compress_streams && !stream.is_filtered() => {
                let mut stream = stream.clone();
                stream.compress();
                write_indirect(&mut self.out, obj_ref, &Object::Stream(stream));
            }
            _ => write_indirect(&mut self.out, obj_ref, object),
        }

        self.entries.insert(
            obj_ref.obj_number,
            XRefEntry::InUse {
                offset,
                gen_number: obj_ref.gen_number,
            },
        );
    }

    /// Pack objects into object streams of at most [`MAX_OBJECTS_PER_STREAM`] objects each.
    /// Returns the numbers of the new streams.
    fn write_object_streams(&mut self, numbers: &[u32], extends: Option<ObjRef>) -> Vec<u32> {
        let mut streams = vec![];

        for chunk in numbers.chunks(MAX_OBJECTS_PER_STREAM) {
            let stream_number = self.allocate();
            let stream = objstm::build(self.table, chunk, extends);

            for (index, num) in chunk.iter().enumerate() {
                self.entries.insert(
                    *num,
                    XRefEntry::Compressed {
                        stream: stream_number,
                        index: index as u32,
                    },
                );
            }

            debug!(
                "packed {} objects into object stream {stream_number}",
                chunk.len()
            );

            self.write_object(ObjRef::new(stream_number, 0), &Object::Stream(stream));

            streams.push(stream_number);
        }

        streams
    }

    /// Close the free list and write the cross-reference section with the given object
    /// numbers (or all entries), followed by the trailer.
    fn finish(
        mut self,
        mode: XRefMode,
        section: Option<BTreeSet<u32>>,
        mut trailer: Dict,
    ) -> Vec<u8> {
        let xref_number = (mode == XRefMode::Stream).then(|| self.allocate());

        if let Some(num) = xref_number {
            self.entries.insert(
                num,
                XRefEntry::InUse {
                    offset: self.out.len(),
                    gen_number: 0,
                },
            );
        }

        close_free_list(&mut self.entries);

        let size = self.entries.last_key_value().map(|(n, _)| n + 1).unwrap_or(1);
        trailer.insert(SIZE, size);

        let entries = match section {
            Some(mut section) => {
                section.insert(0);
                section.extend(xref_number);
                section.extend(
                    self.entries
                        .iter()
                        .filter(|(_, e)| e.is_free())
                        .map(|(n, _)| *n),
                );

                self.entries
                    .into_iter()
                    .filter(|(n, _)| section.contains(n))
                    .collect()
            }
            None => self.entries,
        };

        match xref_number {
            Some(num) => xref::write_stream(&mut self.out, num, &entries, &trailer),
            None => xref::write_table(&mut self.out, &entries, &trailer),
        }

        self.out
    }
}

fn header(version: Version) -> Vec<u8> {
    let mut out = format!("%PDF-{version}\n").into_bytes();
    // Marks the file as binary.
    out.extend_from_slice(b"%\xe2\xe3\xcf\xd3\n");

    out
}

/// The trailer entries that are carried over into every saved file.
fn base_trailer(pdf: &Pdf) -> Dict {
    pdf.trailer()
        .iter()
        .filter(|(k, _)| [ROOT, INFO, ID].iter().any(|key| *key == k.as_bytes()))
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect()
}

fn write_full(pdf: &Pdf, xref_mode: XRefMode, pack: bool, compress_streams: bool) -> Vec<u8> {
    let table = pdf.table();

    let mut version = pdf.version();
    if xref_mode == XRefMode::Stream {
        version = version.max(Version { major: 1, minor: 5 });
    }

    let mut w = Writer::new(table, header(version), compress_streams);
    let mut packed = vec![];

    for num in table.live_objects().collect::<Vec<_>>() {
        let object = table.resolve(num);
        let gen_number = w.entries[&num].gen_number();

        if is_structural(object) {
            if gen_number == 0 {
                w.spare.push(num);
            }

            w.entries.insert(
                num,
                XRefEntry::Free {
                    next: 0,
                    gen_number: gen_number.saturating_add(1),
                },
            );

            continue;
        }

        if pack && is_compressible(object, gen_number) {
            packed.push(num);
        } else {
            w.write_object(ObjRef::new(num, gen_number), object);
        }
    }

    w.write_object_streams(&packed, None);
    w.finish(xref_mode, None, base_trailer(pdf))
}

fn write_incremental(pdf: &Pdf, options: &SaveOptions) -> Vec<u8> {
    let table = pdf.table();
    let pack = options.xref == XRefMode::Stream;

    let mut out = pdf.data().to_vec();
    if !out.ends_with(b"\n") && !out.ends_with(b"\r") {
        out.push(b'\n');
    }

    let mut w = Writer::new(table, out, options.compress_streams);
    let mut section = BTreeSet::new();
    let mut new_packed = vec![];
    let mut extended: BTreeMap<u32, Vec<u32>> = BTreeMap::new();

    for num in table.modified() {
        section.insert(num);

        let Some(entry) = table.entry(num).filter(|e| !e.is_free()) else {
            continue;
        };

        let object = table.resolve(num);
        let gen_number = entry.gen_number();

        if pack && is_compressible(object, gen_number) {
            match table.original_entry(num) {
                Some(XRefEntry::Compressed { stream, .. }) => {
                    extended.entry(stream).or_default().push(num);
                }
                _ => new_packed.push(num),
            }
        } else {
            w.write_object(ObjRef::new(num, gen_number), object);
        }
    }

    for (base, numbers) in extended {
        section.extend(w.write_object_streams(&numbers, Some(ObjRef::new(base, 0))));
    }

    section.extend(w.write_object_streams(&new_packed, None));

    let mut trailer = base_trailer(pdf);
    trailer.insert(PREV, pdf.startxref());

    w.finish(options.xref, Some(section), trailer)
}
