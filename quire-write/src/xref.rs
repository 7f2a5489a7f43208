//! Writing cross-reference sections.

use crate::primitive::write_indirect;
use log::error;
use quire_syntax::object::dict::keys::{INDEX, TYPE, W, XREF};
use quire_syntax::object::{Array, Dict, Name, ObjRef, Object, Stream};
use quire_syntax::table::MAX_GENERATION;
use quire_syntax::write::WriteDirect;
use quire_syntax::xref::XRefEntry;
use std::collections::BTreeMap;

/// Link all free entries into one list in ascending order. The list starts at object 0 and
/// the last free entry points back to it.
///
/// Every writer uses this function before writing a cross-reference section, so that the
/// free list of a saved file is always closed.
pub fn close_free_list(entries: &mut BTreeMap<u32, XRefEntry>) {
    match entries.get(&0) {
        Some(XRefEntry::Free { .. }) => {}
        _ => {
            entries.insert(
                0,
                XRefEntry::Free {
                    next: 0,
                    gen_number: MAX_GENERATION,
                },
            );
        }
    }

    let free = entries
        .iter()
        .filter(|(_, e)| e.is_free())
        .map(|(n, _)| *n)
        .collect::<Vec<_>>();

    for (i, num) in free.iter().enumerate() {
        let next = free.get(i + 1).copied().unwrap_or(0);
        let gen_number = if *num == 0 {
            MAX_GENERATION
        } else {
            entries[num].gen_number()
        };

        entries.insert(*num, XRefEntry::Free { next, gen_number });
    }
}

/// Group entries into runs of consecutive object numbers.
pub(crate) fn subsections(entries: &BTreeMap<u32, XRefEntry>) -> Vec<(u32, Vec<XRefEntry>)> {
    let mut sections: Vec<(u32, Vec<XRefEntry>)> = vec![];

    for (num, entry) in entries {
        match sections.last_mut() {
            Some((start, run)) if *start as usize + run.len() == *num as usize => run.push(*entry),
            _ => sections.push((*num, vec![*entry])),
        }
    }

    sections
}

/// Write a classic cross-reference table, the trailer and the end of the file.
pub(crate) fn write_table(out: &mut Vec<u8>, entries: &BTreeMap<u32, XRefEntry>, trailer: &Dict) {
    let start = out.len();
    out.extend_from_slice(b"xref\n");

    for (first, run) in subsections(entries) {
        out.extend_from_slice(format!("{first} {}\n", run.len()).as_bytes());

        for entry in run {
            let record = match entry {
                XRefEntry::Free { next, gen_number } => format!("{next:010} {gen_number:05} f\r\n"),
                XRefEntry::InUse { offset, gen_number } => {
                    format!("{offset:010} {gen_number:05} n\r\n")
                }
                XRefEntry::Compressed { stream, .. } => {
                    error!("compressed object in stream {stream} can't be written to a table");

                    format!("{:010} {:05} f\r\n", 0, 0)
                }
            };

            out.extend_from_slice(record.as_bytes());
        }
    }

    out.extend_from_slice(b"trailer\n");
    trailer.write_direct(out);
    write_end(out, start);
}

/// Write a cross-reference stream as object `obj_number`, followed by the end of the file.
/// The entry of the stream itself must already be part of `entries`.
pub(crate) fn write_stream(
    out: &mut Vec<u8>,
    obj_number: u32,
    entries: &BTreeMap<u32, XRefEntry>,
    trailer: &Dict,
) {
    let start = out.len();
    let stream = xref_stream(entries, trailer);
    write_indirect(out, ObjRef::new(obj_number, 0), &Object::Stream(stream));
    write_end(out, start);
}

fn write_end(out: &mut Vec<u8>, start: usize) {
    out.extend_from_slice(format!("\nstartxref\n{start}\n%%EOF\n").as_bytes());
}

pub(crate) fn xref_stream(entries: &BTreeMap<u32, XRefEntry>, trailer: &Dict) -> Stream {
    let fields = |entry: &XRefEntry| -> (u8, u64, u64) {
        match *entry {
            XRefEntry::Free { next, gen_number } => (0, next as u64, gen_number as u64),
            XRefEntry::InUse { offset, gen_number } => (1, offset as u64, gen_number as u64),
            XRefEntry::Compressed { stream, index } => (2, stream as u64, index as u64),
        }
    };

    let (max2, max3) = entries.values().map(fields).fold((0, 0), |(a, b), (_, f2, f3)| {
        (a.max(f2), b.max(f3))
    });
    let (w2, w3) = (byte_width(max2), byte_width(max3));

    let mut data = Vec::with_capacity(entries.len() * (1 + w2 + w3));

    for entry in entries.values() {
        let (typ, f2, f3) = fields(entry);
        data.push(typ);
        data.extend_from_slice(&f2.to_be_bytes()[8 - w2..]);
        data.extend_from_slice(&f3.to_be_bytes()[8 - w3..]);
    }

    let index = subsections(entries)
        .into_iter()
        .flat_map(|(first, run)| [Object::from(first), Object::from(run.len())])
        .collect::<Array>();

    let mut dict = trailer.clone();
    dict.insert(TYPE, Name::from(XREF));
    dict.insert(W, Array::from_iter([1, w2 as i64, w3 as i64]));
    dict.insert(INDEX, index);

    Stream::from_decoded(dict, data, true)
}

fn byte_width(value: u64) -> usize {
    (64 - value.leading_zeros() as usize).div_ceil(8).max(1)
}
