//! Arrays.

use crate::object::Object;
use crate::reader::{Readable, Reader, ReaderContext};
use std::ops::{Deref, DerefMut};

/// An array of PDF objects.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Array(Vec<Object>);

impl Array {
    /// Create a new, empty array.
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Return the numbers in the array, skipping anything that isn't a number.
    pub fn numbers(&self) -> impl Iterator<Item = f64> + '_ {
        self.0.iter().filter_map(Object::as_f64)
    }

    /// Consume the array and return its items.
    pub fn into_inner(self) -> Vec<Object> {
        self.0
    }
}

impl Deref for Array {
    type Target = Vec<Object>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl DerefMut for Array {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

impl From<Vec<Object>> for Array {
    fn from(value: Vec<Object>) -> Self {
        Self(value)
    }
}

impl<T: Into<Object>> FromIterator<T> for Array {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

impl IntoIterator for Array {
    type Item = Object;
    type IntoIter = std::vec::IntoIter<Object>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a Array {
    type Item = &'a Object;
    type IntoIter = std::slice::Iter<'a, Object>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl Readable for Array {
    fn read(r: &mut Reader<'_>, ctx: ReaderContext<'_>) -> Option<Self> {
        r.forward_tag(b"[")?;
        let ctx = ctx.nested()?;

        let mut items = Vec::new();

        loop {
            r.skip_white_spaces_and_comments();

            if let Some(()) = r.forward_tag(b"]") {
                return Some(Self(items));
            }

            items.push(r.read::<Object>(ctx)?);
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::object::{Array, Name, Object, ObjRef};
    use crate::reader::{Reader, ReaderContext};

    fn array_impl(data: &[u8]) -> Option<Array> {
        Reader::new(data).read_plain::<Array>()
    }

    #[test]
    fn empty_array_1() {
        assert!(array_impl(b"[]").unwrap().is_empty());
    }

    #[test]
    fn empty_array_2() {
        assert!(array_impl(b"[   \n]").unwrap().is_empty());
    }

    #[test]
    fn array_1() {
        assert_eq!(array_impl(b"[34]").unwrap().len(), 1);
    }

    #[test]
    fn array_2() {
        let array = array_impl(b"[true  ]").unwrap();
        assert_eq!(array[0], Object::Boolean(true));
    }

    #[test]
    fn array_3() {
        let array = array_impl(b"[true \n false 34.564]").unwrap();
        assert_eq!(array.len(), 3);
        assert_eq!(array[2].as_f64(), Some(34.564));
    }

    #[test]
    fn array_4() {
        let array = array_impl(b"[(A) 37 /Name]").unwrap();
        assert_eq!(array[2], Object::Name(Name::from("Name")));
    }

    #[test]
    fn array_5() {
        let array = array_impl(b"[[32] 345.6]").unwrap();
        assert_eq!(array[0].as_array().unwrap().len(), 1);
    }

    #[test]
    fn array_with_ref() {
        let array = array_impl(b"[345 34 5 R 34.0]").unwrap();
        assert_eq!(array.len(), 3);
        assert_eq!(array[1], Object::Ref(ObjRef::new(34, 5)));
    }

    #[test]
    fn array_in_content_stream_never_has_refs() {
        let array = Reader::new(b"[1 0 R]")
            .read::<Array>(ReaderContext::content_stream());
        // `R` is not a valid object in a content stream.
        assert!(array.is_none());
    }

    #[test]
    fn array_with_comment() {
        let array = array_impl(b"[true % A comment \n false]").unwrap();
        assert_eq!(array.len(), 2);
    }

    #[test]
    fn array_with_trailing() {
        assert_eq!(array_impl(b"[(Hi) /Test]trialing data").unwrap().len(), 2);
    }

    #[test]
    fn array_unterminated() {
        assert!(array_impl(b"[1 2").is_none());
    }

    #[test]
    fn too_deeply_nested() {
        assert!(array_impl(&b"[".repeat(100_000)).is_none());
        assert!(array_impl(&[b"[".repeat(50), b"]".repeat(50)].concat()).is_some());
    }

    #[test]
    fn numbers() {
        let array = array_impl(b"[0 0 612 792.5 /X]").unwrap();
        assert_eq!(array.numbers().collect::<Vec<_>>(), vec![0.0, 0.0, 612.0, 792.5]);
    }
}
