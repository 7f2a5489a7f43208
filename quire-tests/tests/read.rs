use crate::{DOCUMENT, load};
use quire::object::dict::keys::{CATALOG, PAGES};
use quire::object::ObjRef;
use quire::{Error, Feature, Pdf, Version};
use quire_tests::{append_update, build_pdf};

#[test]
fn read_document() {
    let pdf = load(&DOCUMENT);

    assert_eq!(pdf.version(), Version { major: 1, minor: 4 });
    assert_eq!(pdf.root(), ObjRef::new(1, 0));
    assert!(pdf.catalog().as_dict().unwrap().has_type(CATALOG));
    assert_eq!(pdf.objects().collect::<Vec<_>>(), vec![1, 2, 3, 4, 5]);
}

#[test]
fn dangling_references() {
    let data = build_pdf(
        "1.7",
        &[
            b"<< /Type /Catalog /Pages 9 0 R /Outlines 2 3 R >>",
            b"(two)",
            b"<< /Broken [",
        ],
        "/Root 1 0 R",
    );
    let pdf = load(&data);
    let catalog = pdf.catalog().as_dict().unwrap();

    assert!(pdf.table().deref(catalog.get(PAGES).unwrap()).is_null());
    // Wrong generation.
    assert!(pdf.table().deref(catalog.get(b"Outlines").unwrap()).is_null());
    assert!(pdf.resolve(ObjRef::new(100, 0)).is_null());
    assert!(pdf.resolve(ObjRef::new(3, 0)).is_null());
    assert!(pdf.resolve(ObjRef::new(2, 0)).as_string().is_some());
}

#[test]
fn newer_section_wins() {
    let base = build_pdf("1.7", &[b"<< /Type /Catalog >>", b"(old)"], "/Root 1 0 R");
    let data = append_update(base, &[(2, b"(new)")], "/Size 3 /Root 1 0 R", None);
    let pdf = load(&data);

    assert_eq!(
        pdf.resolve(ObjRef::new(2, 0)).as_string().unwrap().as_bytes(),
        b"new"
    );
}

#[test]
fn prev_loop() {
    let base = build_pdf("1.7", &[b"<< /Type /Catalog >>", b"(old)"], "/Root 1 0 R");
    let body: &[u8] = b"(loop)";
    let section = base.len() + b"2 0 obj\n".len() + body.len() + b"\nendobj\n".len();
    let data = append_update(base, &[(2, body)], "/Size 3 /Root 1 0 R", Some(section));

    assert!(matches!(Pdf::new(data), Err(Error::Parse { .. })));
}

#[test]
fn encrypted() {
    let data = build_pdf(
        "1.7",
        &[b"<< /Type /Catalog >>", b"<< /Filter /Standard /V 2 >>"],
        "/Root 1 0 R /Encrypt 2 0 R",
    );

    assert!(matches!(
        Pdf::new(data),
        Err(Error::Unsupported(Feature::Encryption))
    ));
}

#[test]
fn missing_startxref() {
    let data = b"%PDF-1.7\n1 0 obj\nnull\nendobj\n".to_vec();

    assert!(matches!(Pdf::new(data), Err(Error::Parse { .. })));
}

#[test]
fn missing_root() {
    let data = build_pdf("1.7", &[b"<< /Type /Catalog >>"], "");

    assert!(matches!(Pdf::new(data), Err(Error::Parse { .. })));
}
