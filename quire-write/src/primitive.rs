use quire_syntax::object::{ObjRef, Object};
use quire_syntax::write::WriteDirect;

/// Write an indirect object definition, `n g obj ... endobj`.
pub(crate) fn write_indirect(out: &mut Vec<u8>, obj_ref: ObjRef, object: &Object) {
    out.extend_from_slice(format!("{} {} obj\n", obj_ref.obj_number, obj_ref.gen_number).as_bytes());
    object.write_direct(out);
    out.extend_from_slice(b"\nendobj\n");
}

/// Whether an object is a cross-reference stream or an object stream. These are rebuilt
/// by the writer instead of being copied.
pub(crate) fn is_structural(object: &Object) -> bool {
    use quire_syntax::object::dict::keys::{OBJ_STM, XREF};

    object
        .as_stream()
        .is_some_and(|s| s.dict().has_type(OBJ_STM) || s.dict().has_type(XREF))
}

/// Whether an object may be stored in an object stream.
pub(crate) fn is_compressible(object: &Object, gen_number: u16) -> bool {
    gen_number == 0 && !matches!(object, Object::Stream(_))
}

#[cfg(test)]
mod tests {
    use super::*;
    use quire_syntax::object::{Dict, Name, Stream};

    #[test]
    fn indirect() {
        let mut out = vec![];
        write_indirect(&mut out, ObjRef::new(3, 1), &Object::from(true));
        assert_eq!(out, b"3 1 obj\ntrue\nendobj\n");
    }

    #[test]
    fn structural() {
        let mut dict = Dict::new();
        dict.insert(b"Type", Name::from("ObjStm"));
        assert!(is_structural(&Object::Stream(Stream::new(dict.clone(), vec![]))));
        assert!(!is_structural(&Object::Dict(dict)));
    }

    #[test]
    fn compressible() {
        assert!(is_compressible(&Object::from(1), 0));
        assert!(!is_compressible(&Object::from(1), 2));
        assert!(!is_compressible(
            &Object::Stream(Stream::new(Dict::new(), vec![])),
            0
        ));
    }
}
