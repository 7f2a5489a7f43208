use once_cell::sync::Lazy;
use quire::{Pdf, SaveMode, SaveOptions, XRefMode};
use quire_syntax::IndirectObjectTable;
use quire_syntax::xref::XRefEntry;

mod clone;
mod read;

pub(crate) static DOCUMENT: Lazy<Vec<u8>> = Lazy::new(quire_tests::document);

pub(crate) fn load(data: &[u8]) -> Pdf {
    Pdf::new(data.to_vec()).unwrap()
}

pub(crate) fn save(pdf: &Pdf, mode: SaveMode, xref: XRefMode) -> Vec<u8> {
    quire_write::write(
        pdf,
        &SaveOptions {
            mode,
            xref,
            compress_streams: false,
        },
    )
    .unwrap()
}

/// Check that the free list links all free entries in ascending order and ends at object 0.
pub(crate) fn assert_free_list_closed(table: &IndirectObjectTable) {
    assert!(matches!(
        table.entry(0),
        Some(XRefEntry::Free {
            gen_number: 65535,
            ..
        })
    ));

    let free = (1..table.size())
        .filter(|n| table.entry(*n).is_some_and(|e| e.is_free()))
        .collect::<Vec<_>>();

    assert_eq!(table.free_list().collect::<Vec<_>>(), free);

    if let Some(last) = free.last() {
        assert!(matches!(
            table.entry(*last),
            Some(XRefEntry::Free { next: 0, .. })
        ));
    }
}
