//! Helpers for building PDF files in tests.

use memchr::memmem;
use quire_syntax::xref::find_last_xref_pos;

/// Build a file with a classic cross-reference table. The objects are numbered from 1, and
/// `trailer` is added to the trailer dictionary after `/Size`.
pub fn build_pdf(version: &str, objects: &[&[u8]], trailer: &str) -> Vec<u8> {
    let mut out = format!("%PDF-{version}\n").into_bytes();
    let mut offsets = vec![];

    for (i, object) in objects.iter().enumerate() {
        offsets.push(out.len());
        out.extend_from_slice(format!("{} 0 obj\n", i + 1).as_bytes());
        out.extend_from_slice(object);
        out.extend_from_slice(b"\nendobj\n");
    }

    let start = out.len();
    out.extend_from_slice(format!("xref\n0 {}\n", objects.len() + 1).as_bytes());
    out.extend_from_slice(b"0000000000 65535 f\r\n");

    for offset in offsets {
        out.extend_from_slice(format!("{offset:010} 00000 n\r\n").as_bytes());
    }

    out.extend_from_slice(
        format!(
            "trailer\n<< /Size {} {trailer} >>\nstartxref\n{start}\n%%EOF\n",
            objects.len() + 1
        )
        .as_bytes(),
    );

    out
}

/// Append an update section to a file, defining (or redefining) the given objects. The new
/// section points back to the newest section of `base` unless `prev` overrides it.
pub fn append_update(
    mut base: Vec<u8>,
    objects: &[(u32, &[u8])],
    trailer: &str,
    prev: Option<usize>,
) -> Vec<u8> {
    let prev = prev.or_else(|| find_last_xref_pos(&base)).unwrap_or(0);
    let mut entries = vec![];

    for (num, object) in objects {
        entries.push((*num, base.len()));
        base.extend_from_slice(format!("{num} 0 obj\n").as_bytes());
        base.extend_from_slice(object);
        base.extend_from_slice(b"\nendobj\n");
    }

    let start = base.len();
    base.extend_from_slice(b"xref\n");

    for (num, offset) in entries {
        base.extend_from_slice(format!("{num} 1\n{offset:010} 00000 n\r\n").as_bytes());
    }

    base.extend_from_slice(
        format!("trailer\n<< {trailer} /Prev {prev} >>\nstartxref\n{start}\n%%EOF\n").as_bytes(),
    );

    base
}

/// A small document with a page tree, one page with a content stream and a document
/// information dictionary.
pub fn document() -> Vec<u8> {
    let content: &[u8] = b"q 1 0 0 1 10 10 cm 0 0 m 100 100 l S Q BT /F1 12 Tf (Hello) Tj ET";
    let mut stream = format!("<< /Length {} >>\nstream\n", content.len()).into_bytes();
    stream.extend_from_slice(content);
    stream.extend_from_slice(b"\nendstream");

    build_pdf(
        "1.4",
        &[
            b"<< /Type /Catalog /Pages 2 0 R >>",
            b"<< /Type /Pages /Kids [3 0 R] /Count 1 /MediaBox [0 0 200 200] >>",
            b"<< /Type /Page /Parent 2 0 R /Contents 4 0 R /Resources << >> >>",
            &stream,
            b"<< /Title (A small document) /Producer (quire-tests) >>",
        ],
        "/Root 1 0 R /Info 5 0 R",
    )
}

/// Count the occurrences of `needle` in `haystack`.
pub fn occurrences(haystack: &[u8], needle: &[u8]) -> usize {
    memmem::find_iter(haystack, needle).count()
}
