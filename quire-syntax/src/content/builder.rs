//! Writing content objects back into a content stream.

use crate::content::{ContentObject, InlineImage, Operation};
use crate::object::{Name, Object};
use crate::write::WriteDirect;

/// Serialize a tree of content objects. Every operation is written on its own line, and
/// containers are enclosed in their begin and end operators.
pub fn build(objects: &[ContentObject]) -> Vec<u8> {
    let mut out = vec![];
    write_objects(objects, &mut out);

    out
}

fn write_objects(objects: &[ContentObject], out: &mut Vec<u8>) {
    for object in objects {
        write_object(object, out);
    }
}

fn write_object(object: &ContentObject, out: &mut Vec<u8>) {
    match object {
        ContentObject::Operation(op) => op.write(out),
        ContentObject::Path(ops) => ops.iter().for_each(|op| op.write(out)),
        ContentObject::Text(children) => {
            write_container(b"BT", &[], children, b"ET", out);
        }
        ContentObject::LocalGraphicsState(children) => {
            write_container(b"q", &[], children, b"Q", out);
        }
        ContentObject::MarkedContent {
            tag,
            properties,
            children,
        } => match properties {
            Some(properties) => write_container(
                b"BDC",
                &[Object::Name(tag.clone()), properties.clone()],
                children,
                b"EMC",
                out,
            ),
            None => write_container(b"BMC", &[Object::Name(tag.clone())], children, b"EMC", out),
        },
        ContentObject::InlineImage(image) => write_inline_image(image, out),
        ContentObject::XObject(name) => write_named(b"Do", name, out),
        ContentObject::Shading(name) => write_named(b"sh", name, out),
    }
}

fn write_container(
    begin: &[u8],
    operands: &[Object],
    children: &[ContentObject],
    end: &[u8],
    out: &mut Vec<u8>,
) {
    Operation::new(begin, operands.iter().cloned()).write(out);
    write_objects(children, out);
    Operation::new(end, []).write(out);
}

fn write_named(operator: &[u8], name: &Name, out: &mut Vec<u8>) {
    Operation::new(operator, [Object::Name(name.clone())]).write(out);
}

fn write_inline_image(image: &InlineImage, out: &mut Vec<u8>) {
    out.extend_from_slice(b"BI");

    for (key, value) in image.dict.iter() {
        out.push(b' ');
        key.write_direct(out);
        out.push(b' ');
        value.write_direct(out);
    }

    out.extend_from_slice(b" ID\n");
    out.extend_from_slice(&image.data);
    out.extend_from_slice(b"\nEI\n");
}
