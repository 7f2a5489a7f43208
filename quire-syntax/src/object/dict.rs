//! Dictionaries.

use crate::object::{Array, Name, ObjRef, Object, Stream};
use crate::reader::{Readable, Reader, ReaderContext};
use std::collections::BTreeMap;
use std::collections::btree_map;
use std::fmt::{Debug, Formatter};

/// A dictionary, which is a key-value map, keys being names, and values being any direct
/// object or object reference.
///
/// Entries are kept sorted by key, which makes serialization deterministic.
#[derive(Clone, PartialEq, Default)]
pub struct Dict(BTreeMap<Name, Object>);

impl Dict {
    /// Create a new, empty dictionary.
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Returns the number of entries in the dictionary.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Return whether the dictionary is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Checks whether the dictionary contains an entry with a specific key.
    pub fn contains_key(&self, key: &[u8]) -> bool {
        self.0.contains_key(key)
    }

    /// Returns the entry of a key, without resolving references.
    pub fn get(&self, key: &[u8]) -> Option<&Object> {
        self.0.get(key)
    }

    /// Returns a mutable reference to the entry of a key.
    pub fn get_mut(&mut self, key: &[u8]) -> Option<&mut Object> {
        self.0.get_mut(key)
    }

    /// Insert an entry, returning the previous value.
    pub fn insert(&mut self, key: impl Into<Name>, value: impl Into<Object>) -> Option<Object> {
        self.0.insert(key.into(), value.into())
    }

    /// Remove an entry, returning its value.
    pub fn remove(&mut self, key: &[u8]) -> Option<Object> {
        self.0.remove(key)
    }

    /// Returns the entry of a key as a name.
    pub fn get_name(&self, key: &[u8]) -> Option<&Name> {
        self.get(key).and_then(Object::as_name)
    }

    /// Returns the entry of a key as an integer.
    pub fn get_i64(&self, key: &[u8]) -> Option<i64> {
        self.get(key).and_then(Object::as_i64)
    }

    /// Returns the entry of a key as an object reference.
    pub fn get_ref(&self, key: &[u8]) -> Option<ObjRef> {
        self.get(key).and_then(Object::as_obj_ref)
    }

    /// Returns the entry of a key as a direct dictionary.
    pub fn get_dict(&self, key: &[u8]) -> Option<&Dict> {
        self.get(key).and_then(Object::as_dict)
    }

    /// Returns the entry of a key as a direct array.
    pub fn get_array(&self, key: &[u8]) -> Option<&Array> {
        self.get(key).and_then(Object::as_array)
    }

    /// Whether the `/Type` entry has the given value.
    pub fn has_type(&self, typ: &[u8]) -> bool {
        self.get_name(keys::TYPE).is_some_and(|n| n == typ)
    }

    /// Returns an iterator over all keys in the dictionary.
    pub fn keys(&self) -> impl Iterator<Item = &Name> {
        self.0.keys()
    }

    /// An iterator over all entries in the dictionary, sorted by key.
    pub fn iter(&self) -> btree_map::Iter<'_, Name, Object> {
        self.0.iter()
    }

    /// A mutable iterator over all entries in the dictionary, sorted by key.
    pub fn iter_mut(&mut self) -> btree_map::IterMut<'_, Name, Object> {
        self.0.iter_mut()
    }

    /// Keep only the entries for which the predicate returns `true`.
    pub fn retain(&mut self, f: impl FnMut(&Name, &mut Object) -> bool) {
        self.0.retain(f)
    }

    /// Read the entries of an inline image dictionary, which has no delimiters and
    /// stops at the `ID` operator. The `ID` itself is not consumed.
    pub(crate) fn read_inline(r: &mut Reader<'_>) -> Option<Self> {
        let ctx = ReaderContext::content_stream();
        let mut map = BTreeMap::new();

        loop {
            r.skip_white_spaces_and_comments();

            if r.peek_tag(b"ID").is_some() {
                return Some(Self(map));
            }

            let name = r.read::<Name>(ctx)?;
            r.skip_white_spaces_and_comments();
            let value = r.read::<Object>(ctx)?;
            map.insert(name, value);
        }
    }
}

impl Debug for Dict {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_map().entries(self.0.iter()).finish()
    }
}

impl<K: Into<Name>, V: Into<Object>> FromIterator<(K, V)> for Dict {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

impl IntoIterator for Dict {
    type Item = (Name, Object);
    type IntoIter = btree_map::IntoIter<Name, Object>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a Dict {
    type Item = (&'a Name, &'a Object);
    type IntoIter = btree_map::Iter<'a, Name, Object>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl Readable for Dict {
    fn read(r: &mut Reader<'_>, ctx: ReaderContext<'_>) -> Option<Self> {
        let mut map = BTreeMap::new();

        r.forward_tag(b"<<")?;
        let ctx = ctx.nested()?;

        loop {
            r.skip_white_spaces_and_comments();

            if let Some(()) = r.forward_tag(b">>") {
                break;
            }

            let Some(name) = r.read::<Name>(ctx) else {
                // In case there is garbage in-between, be lenient and just try to skip it.
                r.read::<Object>(ctx)?;
                continue;
            };

            r.skip_white_spaces_and_comments();

            // A stream can't be the direct value of an entry, so a nested dict is always read
            // as a plain dict.
            let value = if r.peek_tag(b"<<").is_some() {
                Object::Dict(r.read::<Dict>(ctx)?)
            } else {
                r.read::<Object>(ctx)?
            };

            // A null value is equivalent to the entry being absent.
            if !value.is_null() {
                map.insert(name, value);
            }
        }

        Some(Self(map))
    }
}

impl From<Stream> for Dict {
    fn from(value: Stream) -> Self {
        value.into_parts().0
    }
}

/// A collection of keys that are used by the reader and writer.
#[allow(missing_docs)]
pub mod keys {
    macro_rules! key {
        ($i:ident, $e:expr) => {
            pub const $i: &'static [u8] = $e;
        };
    }

    // A
    key!(A85, b"A85");
    key!(ACTION, b"Action");
    key!(AHX, b"AHx");
    key!(ANNOT, b"Annot");
    key!(ANNOTS, b"Annots");
    key!(ASCII_HEX_DECODE, b"ASCIIHexDecode");
    key!(ASCII85_DECODE, b"ASCII85Decode");

    // B
    key!(BITS_PER_COMPONENT, b"BitsPerComponent");
    key!(BPC, b"BPC");

    // C
    key!(CATALOG, b"Catalog");
    key!(COLORS, b"Colors");
    key!(COLUMNS, b"Columns");
    key!(CONTENTS, b"Contents");
    key!(COUNT, b"Count");
    key!(CROP_BOX, b"CropBox");

    // D
    key!(D, b"D");
    key!(DECODE_PARMS, b"DecodeParms");
    key!(DEST, b"Dest");
    key!(DP, b"DP");

    // E
    key!(EARLY_CHANGE, b"EarlyChange");
    key!(ENCRYPT, b"Encrypt");
    key!(EXTENDS, b"Extends");

    // F
    key!(F, b"F");
    key!(FILTER, b"Filter");
    key!(FIRST, b"First");
    key!(FL, b"Fl");
    key!(FLATE_DECODE, b"FlateDecode");

    // G-K
    key!(ID, b"ID");
    key!(INDEX, b"Index");
    key!(INFO, b"Info");
    key!(KIDS, b"Kids");

    // L
    key!(LENGTH, b"Length");
    key!(LINEARIZED, b"Linearized");

    // M
    key!(MEDIA_BOX, b"MediaBox");

    // N
    key!(N, b"N");
    key!(NEXT, b"Next");

    // O
    key!(OBJ_STM, b"ObjStm");

    // P
    key!(P, b"P");
    key!(PAGE, b"Page");
    key!(PAGES, b"Pages");
    key!(PARENT, b"Parent");
    key!(PREDICTOR, b"Predictor");
    key!(PREV, b"Prev");

    // R
    key!(RESOURCES, b"Resources");
    key!(RL, b"RL");
    key!(ROOT, b"Root");
    key!(ROTATE, b"Rotate");
    key!(RUN_LENGTH_DECODE, b"RunLengthDecode");

    // S
    key!(S, b"S");
    key!(SIZE, b"Size");
    key!(SUBTYPE, b"Subtype");

    // T
    key!(TYPE, b"Type");

    // W-X
    key!(W, b"W");
    key!(XREF, b"XRef");
    key!(XREF_STM, b"XRefStm");
}

#[cfg(test)]
mod tests {
    use crate::object::dict::keys::{LENGTH, TYPE};
    use crate::object::{Dict, Name, ObjRef, Object};
    use crate::reader::Reader;

    fn dict_impl(data: &[u8]) -> Option<Dict> {
        Reader::new(data).read_plain::<Dict>()
    }

    #[test]
    fn too_deeply_nested() {
        assert!(dict_impl(&b"<< /A ".repeat(10_000)).is_none());
    }

    #[test]
    fn empty_dict_1() {
        assert!(dict_impl(b"<<>>").unwrap().is_empty());
    }

    #[test]
    fn empty_dict_2() {
        assert!(dict_impl(b"<<   \n >>").unwrap().is_empty());
    }

    #[test]
    fn dict_1() {
        let dict = dict_impl(b"<< /Hi 34.0 >>").unwrap();
        assert_eq!(dict.len(), 1);
        assert!(dict.contains_key(b"Hi"));
    }

    #[test]
    fn dict_2() {
        let dict = dict_impl(b"<< /Hi \n 34.0 /Second true >>").unwrap();
        assert_eq!(dict.len(), 2);
        assert_eq!(dict.get(b"Second"), Some(&Object::Boolean(true)));
    }

    #[test]
    fn dict_complex() {
        let data = b"<< /Type /Example
/Subtype /DictionaryExample
/Version 0.01
/IntegerItem 12
/StringItem (a string)
/Subdictionary << /Item1 0.4
                /Item2 true
                /LastItem (not!)
                /VeryLastItem (OK)
                >>
>>";

        let dict = dict_impl(data).unwrap();
        assert_eq!(dict.len(), 6);
        assert!(dict.has_type(b"Example"));
        assert_eq!(dict.get_dict(b"Subdictionary").unwrap().len(), 4);
    }

    #[test]
    fn dict_with_trailing() {
        assert_eq!(dict_impl(b"<< /Hi 67.0 >>trailing data").unwrap().len(), 1);
    }

    #[test]
    fn dict_with_comment() {
        let dict = dict_impl(b"<< /Hi % A comment \n 67.0 % Another comment \n >>").unwrap();
        assert_eq!(dict.len(), 1);
    }

    #[test]
    fn dict_with_escaped_name() {
        let dict = dict_impl(b"<< /PANTONE#205757#20CV 234 >>").unwrap();
        assert!(dict.contains_key(b"PANTONE 5757 CV"));
    }

    #[test]
    fn garbage_in_between() {
        let dict = dict_impl(b"<<
/ProcSet [ /PDF /Text ]
/Font << /F4 31 0 R /F6 23 0 R >>
/ExtGState << /GS2 14 0 R
2000 >>
/ColorSpace << /Cs5 16 0 R >>
>>")
        .unwrap();

        assert_eq!(dict.get_dict(b"ExtGState").unwrap().len(), 1);
        assert_eq!(
            dict.get_dict(b"Font").unwrap().get_ref(b"F4"),
            Some(ObjRef::new(31, 0))
        );
    }

    #[test]
    fn null_value_is_dropped() {
        let dict = dict_impl(b"<< /A null /B 1 >>").unwrap();
        assert_eq!(dict.len(), 1);
        assert!(!dict.contains_key(b"A"));
    }

    #[test]
    fn iteration_is_sorted() {
        let dict: Dict = [("Z", 1), ("A", 2), ("M", 3)].into_iter().collect();
        let keys: Vec<_> = dict.keys().map(Name::as_str).collect();
        assert_eq!(keys, vec!["A", "M", "Z"]);
    }

    #[test]
    fn insert_and_remove() {
        let mut dict = Dict::new();
        dict.insert(TYPE, Name::from("Page"));
        dict.insert(LENGTH, 5);
        assert_eq!(dict.get_i64(LENGTH), Some(5));
        assert_eq!(dict.remove(LENGTH).and_then(|o| o.as_i64()), Some(5));
        assert!(dict.has_type(b"Page"));
    }

    #[test]
    fn inline_image_dict() {
        let mut r = Reader::new(b"/W 4 /H 4 /CS /RGB /BPC 8\nID abc");
        let dict = Dict::read_inline(&mut r).unwrap();
        assert_eq!(dict.len(), 4);
        assert!(r.peek_tag(b"ID").is_some());
    }
}
