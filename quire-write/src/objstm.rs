//! Packing objects into object streams.

use quire_syntax::IndirectObjectTable;
use quire_syntax::object::dict::keys::{EXTENDS, FIRST, N, OBJ_STM, TYPE};
use quire_syntax::object::{Dict, Name, ObjRef, Stream};
use quire_syntax::write::WriteDirect;

/// The maximum number of objects stored in a single object stream.
pub const MAX_OBJECTS_PER_STREAM: usize = 100;

/// Build an object stream holding the given objects of the table, in order.
pub(crate) fn build(
    table: &IndirectObjectTable,
    numbers: &[u32],
    extends: Option<ObjRef>,
) -> Stream {
    let mut header = vec![];
    let mut body = vec![];

    for (i, num) in numbers.iter().enumerate() {
        if i > 0 {
            header.push(b' ');
        }

        header.extend_from_slice(format!("{num} {}", body.len()).as_bytes());
        table.resolve(*num).write_direct(&mut body);
        body.push(b'\n');
    }

    header.push(b'\n');

    let mut dict = Dict::new();
    dict.insert(TYPE, Name::from(OBJ_STM));
    dict.insert(N, numbers.len());
    dict.insert(FIRST, header.len());

    if let Some(extends) = extends {
        dict.insert(EXTENDS, extends);
    }

    header.extend(body);

    Stream::from_decoded(dict, header, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use quire_syntax::objstream::ObjectStream;

    #[test]
    fn build_and_read() {
        let mut table = IndirectObjectTable::empty();
        let a = table.register(Name::from("A"));
        let b = table.register(Dict::from_iter([(b"K", 1)]));

        let stream = build(&table, &[a.obj_number, b.obj_number], Some(ObjRef::new(9, 0)));
        let read = ObjectStream::new(&stream).unwrap();

        assert_eq!(read.len(), 2);
        assert_eq!(read.extends(), Some(ObjRef::new(9, 0)));
        assert_eq!(
            read.get(a.obj_number, 0).unwrap().as_name().unwrap().as_str(),
            "A"
        );
        assert_eq!(
            read.get(b.obj_number, 1).unwrap().as_dict().unwrap().get_i64(b"K"),
            Some(1)
        );
    }
}
