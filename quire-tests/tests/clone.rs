use crate::{DOCUMENT, load, save};
use quire::clone::{ActionFilter, Cloner};
use quire::object::dict::keys::{ANNOTS, CONTENTS, KIDS, MEDIA_BOX, P, PARENT};
use quire::object::{Array, ObjRef, Object};
use quire::{SaveMode, XRefMode};
use quire_tests::build_pdf;

fn destination() -> Vec<u8> {
    build_pdf(
        "1.7",
        &[
            b"<< /Type /Catalog /Pages 2 0 R >>",
            b"<< /Type /Pages /Kids [] /Count 0 >>",
        ],
        "/Root 1 0 R",
    )
}

#[test]
fn copy_page_between_files() {
    let source = load(&DOCUMENT);
    let mut dest = load(&destination());
    let pages = ObjRef::new(2, 0);

    let page = {
        let mut cloner = Cloner::with_default_filters(source.table());
        cloner.clone_ref(ObjRef::new(3, 0), dest.table_mut()).unwrap()
    };

    let page_dict = dest.table_mut().get_mut(page.obj_number).unwrap();
    page_dict.as_dict_mut().unwrap().insert(PARENT, pages);

    let tree = dest.table_mut().get_mut(2).unwrap().as_dict_mut().unwrap();
    tree.insert(KIDS, Array::from_iter([page]));
    tree.insert(b"Count", 1);

    let read = load(&save(&dest, SaveMode::Standard, XRefMode::Table));
    let page = read.resolve(page).as_dict().unwrap();

    assert_eq!(page.get_ref(PARENT), Some(pages));
    assert_eq!(
        page.get_array(MEDIA_BOX).unwrap().numbers().collect::<Vec<_>>(),
        vec![0.0, 0.0, 200.0, 200.0]
    );

    let contents = read.table().deref(page.get(CONTENTS).unwrap());
    let original = source.resolve(ObjRef::new(4, 0));
    assert_eq!(
        contents.as_stream().unwrap().decoded(),
        original.as_stream().unwrap().decoded()
    );
}

#[test]
fn annotations_follow_page() {
    let source = load(&build_pdf(
        "1.7",
        &[
            b"<< /Type /Catalog /Pages 2 0 R >>",
            b"<< /Type /Pages /Kids [3 0 R] /Count 1 >>",
            b"<< /Type /Page /Parent 2 0 R /Annots [4 0 R 5 0 R] >>",
            b"<< /Type /Annot /Subtype /Link /P 3 0 R /A << /S /GoTo /D (chapter1) >> >>",
            b"<< /Type /Annot /Subtype /Text /Contents (note) >>",
        ],
        "/Root 1 0 R",
    ));
    let mut dest = load(&destination());

    let mut cloner = Cloner::with_default_filters(source.table());
    cloner.push_filter(ActionFilter::new(|name: &[u8]| {
        [&b"imported-"[..], name].concat()
    }));

    let page = cloner.clone_ref(ObjRef::new(3, 0), dest.table_mut()).unwrap();
    let annots = dest.resolve(page).as_dict().unwrap().get_array(ANNOTS).unwrap().clone();

    assert_eq!(annots.len(), 2);

    for annot in annots.iter() {
        let annot = dest.table().deref(annot).as_dict().unwrap();
        assert_eq!(annot.get_ref(P), Some(page));
    }

    let link = dest.table().deref(&annots[0]).as_dict().unwrap();
    let destination = link.get_dict(b"A").unwrap().get(b"D").unwrap();
    assert_eq!(destination.as_string().unwrap().as_bytes(), b"imported-chapter1");

    // The page tree of the source isn't copied.
    assert_eq!(
        cloner.mapping().len(),
        3,
        "only the page and its annotations are cloned"
    );
}

#[test]
fn clone_twice_shares_objects() {
    let source = load(&DOCUMENT);
    let mut dest = load(&destination());
    let mut cloner = Cloner::new(source.table());

    let first = cloner.clone_ref(ObjRef::new(5, 0), dest.table_mut());
    let second = cloner.clone_ref(ObjRef::new(5, 0), dest.table_mut());

    assert_eq!(first, second);
    assert!(cloner.clone_ref(ObjRef::new(42, 0), dest.table_mut()).is_none());

    let direct = cloner.clone_object(
        &Object::from(Array::from_iter([ObjRef::new(5, 0), ObjRef::new(42, 0)])),
        dest.table_mut(),
    );
    assert_eq!(
        direct,
        Object::from(Array::from_iter([Object::Ref(first.unwrap()), Object::Null]))
    );
}
