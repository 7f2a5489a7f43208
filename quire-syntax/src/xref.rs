//! Reading cross-reference tables and streams.

use crate::error::{Error, OptionParse, Result};
use crate::object::dict::keys::{INDEX, PREV, SIZE, TYPE, W, XREF, XREF_STM};
use crate::object::{Dict, IndirectHeader, Object, Stream};
use crate::reader::{Reader, ReaderContext};
use log::{debug, warn};
use memchr::memmem;
use rustc_hash::FxHashSet;
use std::collections::BTreeMap;
use std::collections::btree_map::Entry;

/// The location of an indirect object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum XRefEntry {
    /// A free slot. `next` is the object number of the next free slot (0 terminates the
    /// list) and `gen` the generation to use when the slot is reused.
    Free {
        /// The next free object number.
        next: u32,
        /// The generation for the next use of this slot.
        gen_number: u16,
    },
    /// An object stored at a byte offset in the file.
    InUse {
        /// The byte offset of the `n g obj` header.
        offset: usize,
        /// The generation number.
        gen_number: u16,
    },
    /// An object stored inside an object stream.
    Compressed {
        /// The object number of the object stream (its generation is always 0).
        stream: u32,
        /// The index of the object inside the stream.
        index: u32,
    },
}

impl XRefEntry {
    /// The generation number of the entry. Compressed objects always have generation 0.
    pub fn gen_number(&self) -> u16 {
        match self {
            Self::Free { gen_number, .. } | Self::InUse { gen_number, .. } => *gen_number,
            Self::Compressed { .. } => 0,
        }
    }

    /// Whether the entry describes a free slot.
    pub fn is_free(&self) -> bool {
        matches!(self, Self::Free { .. })
    }
}

/// The kind of a cross-reference section.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionKind {
    /// A classic `xref` table with 20-byte records.
    Table,
    /// A cross-reference stream (`/Type /XRef`).
    Stream,
}

/// The merged result of following a chain of cross-reference sections.
#[derive(Debug, Clone)]
pub struct XRefChain {
    /// All entries, newer sections shadowing older ones.
    pub entries: BTreeMap<u32, XRefEntry>,
    /// The newest trailer, completed with entries of older trailers it lacks.
    pub trailer: Dict,
    /// The offsets of all sections, from newest to oldest.
    pub sections: Vec<usize>,
    /// The kind of the newest section.
    pub kind: SectionKind,
}

struct Section {
    kind: SectionKind,
    entries: Vec<(u32, XRefEntry)>,
    trailer: Dict,
}

/// Find the offset that the last `startxref` keyword points to.
pub fn find_last_xref_pos(data: &[u8]) -> Option<usize> {
    let pos = memmem::rfind(data, b"startxref")?;
    let mut r = Reader::new_with(data, pos + b"startxref".len());
    r.skip_white_spaces_and_comments();

    r.read_plain::<usize>()
}

/// Read the chain of cross-reference sections starting at `start`, following `/Prev`
/// and `/XRefStm` links.
pub fn read_chain(data: &[u8], start: usize) -> Result<XRefChain> {
    let mut visited = FxHashSet::default();
    let mut entries = BTreeMap::new();
    let mut trailer: Option<Dict> = None;
    let mut sections = vec![];
    let mut kind = None;
    let mut next = Some(start);

    let mut merge = |section_entries: Vec<(u32, XRefEntry)>| {
        for (num, entry) in section_entries {
            // Sections are visited from newest to oldest, so existing entries win.
            if let Entry::Vacant(v) = entries.entry(num) {
                v.insert(entry);
            }
        }
    };

    while let Some(pos) = next {
        if !visited.insert(pos) {
            return Err(Error::parse(pos, "acyclic /Prev chain"));
        }

        let section = read_section(data, pos)?;
        sections.push(pos);
        kind.get_or_insert(section.kind);
        merge(section.entries);

        // In hybrid files, the entries of the stream shadow the older sections but not the
        // table that refers to it.
        if section.kind == SectionKind::Table
            && let Some(stm_pos) = offset_entry(&section.trailer, XREF_STM)
        {
            if visited.insert(stm_pos) {
                match read_section(data, stm_pos) {
                    Ok(stm) if stm.kind == SectionKind::Stream => {
                        sections.push(stm_pos);
                        merge(stm.entries);
                    }
                    _ => warn!("ignoring broken /XRefStm section at offset {stm_pos}"),
                }
            } else {
                warn!("/XRefStm at offset {stm_pos} was already visited");
            }
        }

        next = offset_entry(&section.trailer, PREV);

        match &mut trailer {
            None => trailer = Some(section.trailer),
            Some(newer) => {
                for (key, value) in section.trailer {
                    if !newer.contains_key(&key) {
                        newer.insert(key, value);
                    }
                }
            }
        }
    }

    Ok(XRefChain {
        entries,
        trailer: trailer.or_parse_error(start, "trailer dictionary")?,
        sections,
        kind: kind.unwrap_or(SectionKind::Table),
    })
}

fn offset_entry(dict: &Dict, key: &[u8]) -> Option<usize> {
    dict.get_i64(key).and_then(|o| usize::try_from(o).ok())
}

fn read_section(data: &[u8], pos: usize) -> Result<Section> {
    if pos >= data.len() {
        return Err(Error::parse(pos, "xref section inside the file"));
    }

    let mut r = Reader::new_with(data, pos);
    // In case the position points to white space before the section.
    r.skip_white_spaces_and_comments();

    if r.peek_tag(b"xref").is_some() {
        read_table(&mut r)
    } else {
        read_stream(&mut r).or_parse_error(pos, "xref keyword or xref stream")
    }
}

fn read_table(r: &mut Reader<'_>) -> Result<Section> {
    r.forward_tag(b"xref").or_parse_error(r.offset(), "xref keyword")?;

    let mut entries = vec![];

    loop {
        r.skip_white_spaces_and_comments();

        if r.peek_tag(b"trailer").is_some() {
            break;
        }

        let header_pos = r.offset();
        let mut start = r
            .read_plain::<u32>()
            .or_parse_error(header_pos, "xref subsection start")?;
        r.skip_white_spaces();
        let count = r
            .read_plain::<u32>()
            .or_parse_error(r.offset(), "xref subsection length")?;

        for i in 0..count {
            r.skip_white_spaces();
            let entry_pos = r.offset();
            let (entry, head) = read_record(r).or_parse_error(entry_pos, "xref record")?;

            // A common producer bug numbers the first subsection from 1, while its first
            // record is the head of the free list.
            if i == 0
                && start == 1
                && head
                && !entries.iter().any(|(n, _)| *n == 0)
            {
                debug!("fixing xref subsection that starts at 1");
                start = 0;
            }

            let num = start
                .checked_add(i)
                .or_parse_error(entry_pos, "object number in range")?;
            entries.push((num, entry));
        }
    }

    r.forward_tag(b"trailer")
        .or_parse_error(r.offset(), "trailer keyword")?;
    r.skip_white_spaces_and_comments();
    let trailer = r
        .read_plain::<Dict>()
        .or_parse_error(r.offset(), "trailer dictionary")?;

    Ok(Section {
        kind: SectionKind::Table,
        entries,
        trailer,
    })
}

// Records are `oooooooooo ggggg n` plus a two-byte EOL, but we don't insist on the exact
// widths. The returned flag tells whether this looks like the free-list head.
fn read_record(r: &mut Reader<'_>) -> Option<(XRefEntry, bool)> {
    let offset = r.read_plain::<u64>()?;
    r.forward_while_1(|b| b == b' ')?;
    let gen_number = r.read_plain::<u32>()?;
    r.forward_while(|b| b == b' ');
    let kind = r.read_byte()?;

    let gen_number = u16::try_from(gen_number).unwrap_or(u16::MAX);

    let entry = match kind {
        b'n' if offset == 0 => {
            warn!("in-use xref record with offset 0, treating it as free");
            XRefEntry::Free {
                next: 0,
                gen_number,
            }
        }
        b'n' => XRefEntry::InUse {
            offset: usize::try_from(offset).ok()?,
            gen_number,
        },
        b'f' => XRefEntry::Free {
            next: u32::try_from(offset).ok()?,
            gen_number,
        },
        _ => return None,
    };

    Some((entry, kind == b'f' && gen_number == u16::MAX && offset == 0))
}

fn read_stream(r: &mut Reader<'_>) -> Option<Section> {
    r.read_plain::<IndirectHeader>()?;
    r.skip_white_spaces_and_comments();
    let stream = r.read::<Stream>(ReaderContext::default())?;

    if !stream.dict().has_type(XREF) {
        return None;
    }

    let dict = stream.dict();
    let widths = dict
        .get_array(W)?
        .iter()
        .map(|w| w.as_i64().and_then(|w| usize::try_from(w).ok()))
        .collect::<Option<Vec<_>>>()?;

    let [w1, w2, w3] = widths[..] else {
        warn!("xref stream /W must have three entries");

        return None;
    };

    if [w1, w2, w3].iter().any(|w| *w > size_of::<u64>()) {
        warn!("xref stream field is wider than 8 bytes");

        return None;
    }

    // Every record needs to take up at least one byte, the number of records is bounded by
    // the length of the data then.
    if w1 + w2 + w3 == 0 {
        warn!("xref stream has empty records");

        return None;
    }

    let size = dict.get_i64(SIZE).and_then(|s| u32::try_from(s).ok())?;
    let subsections = match dict.get_array(INDEX) {
        Some(index) => index
            .chunks_exact(2)
            .map(|pair| {
                Some((
                    u32::try_from(pair[0].as_i64()?).ok()?,
                    u32::try_from(pair[1].as_i64()?).ok()?,
                ))
            })
            .collect::<Option<Vec<_>>>()?,
        None => vec![(0, size)],
    };

    let decoded = stream.decoded()?;
    let mut data = Reader::new(&decoded);
    let mut entries = vec![];

    for (start, count) in subsections {
        for i in 0..count {
            let f_type = if w1 == 0 {
                1
            } else {
                read_field(&mut data, w1)?
            };
            let f2 = read_field(&mut data, w2)?;
            let f3 = read_field(&mut data, w3)?;

            let entry = match f_type {
                0 => XRefEntry::Free {
                    next: u32::try_from(f2).ok()?,
                    gen_number: u16::try_from(f3).unwrap_or(u16::MAX),
                },
                1 => XRefEntry::InUse {
                    offset: usize::try_from(f2).ok()?,
                    gen_number: u16::try_from(f3).ok()?,
                },
                2 => XRefEntry::Compressed {
                    stream: u32::try_from(f2).ok()?,
                    index: u32::try_from(f3).ok()?,
                },
                // Unknown types must be treated as references to the null object.
                t => {
                    debug!("ignoring xref stream entry of type {t}");
                    continue;
                }
            };

            entries.push((start.checked_add(i)?, entry));
        }
    }

    let (mut trailer, _) = stream.into_parts();
    trailer.remove(TYPE);

    Some(Section {
        kind: SectionKind::Stream,
        entries,
        trailer,
    })
}

fn read_field(r: &mut Reader<'_>, width: usize) -> Option<u64> {
    Some(
        r.read_bytes(width)?
            .iter()
            .fold(0_u64, |acc, b| (acc << 8) | u64::from(*b)),
    )
}

/// Whether the offset points to the beginning of an xref stream object.
pub(crate) fn is_xref_stream(obj: &Object) -> bool {
    obj.as_stream().is_some_and(|s| s.dict().has_type(XREF))
}
