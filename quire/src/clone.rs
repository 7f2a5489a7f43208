//! Cloning objects from one file into another.
//!
//! Every reference that is reachable from a cloned object is cloned as well and rewritten to
//! point to a new object in the destination table. Each source object is cloned at most once
//! per [`Cloner`], so shared objects stay shared and cycles are fine.
//!
//! Values can be adjusted while they are cloned by a chain of [`CloneFilter`]s. For each value,
//! the first filter that matches it is used.

use log::{debug, warn};
use quire_syntax::IndirectObjectTable;
use quire_syntax::object::dict::keys::{
    ACTION, ANNOTS, CROP_BOX, D, MEDIA_BOX, P, PAGE, PARENT, RESOURCES, ROTATE, S, TYPE,
};
use quire_syntax::object::{Array, Dict, Name, ObjRef, Object, PdfString, StringKind, Stream};
use rustc_hash::{FxHashMap, FxHashSet};

/// Where a value is located while it is cloned.
#[derive(Debug, Clone)]
pub struct CloneContext<'a> {
    /// The table the value is cloned from.
    pub source: &'a IndirectObjectTable,
    /// The dictionary key the value is stored under, if any.
    pub key: Option<Name>,
    /// The clone of the indirect object holding the value, in the destination table.
    pub holder: Option<ObjRef>,
}

/// A filter that adjusts values while they are cloned.
pub trait CloneFilter {
    /// Whether the filter wants to handle the value.
    fn matches(&self, value: &Object, ctx: &CloneContext<'_>) -> bool;

    /// Adjust the value before it is cloned. References in the returned value still point into
    /// the source table.
    fn before(&self, value: Object, _ctx: &CloneContext<'_>) -> Object {
        value
    }

    /// Called with the finished clone once everything reachable from it has been cloned.
    fn after(&self, _clone: &Object, _dest: &mut IndirectObjectTable, _ctx: &CloneContext<'_>) {}
}

struct Pending {
    source: ObjRef,
    target: ObjRef,
    key: Option<Name>,
    holder: Option<ObjRef>,
}

/// Clones objects from a source table into destination tables.
pub struct Cloner<'a> {
    source: &'a IndirectObjectTable,
    map: FxHashMap<ObjRef, ObjRef>,
    filters: Vec<Box<dyn CloneFilter + 'a>>,
    to_visit: Vec<Pending>,
    finished: Vec<(usize, Object, CloneContext<'a>)>,
}

impl<'a> Cloner<'a> {
    /// Create a new cloner without any filters.
    pub fn new(source: &'a IndirectObjectTable) -> Self {
        Self {
            source,
            map: FxHashMap::default(),
            filters: vec![],
            to_visit: vec![],
            finished: vec![],
        }
    }

    /// Create a new cloner with the [`PageFilter`] and the [`AnnotationsFilter`].
    pub fn with_default_filters(source: &'a IndirectObjectTable) -> Self {
        let mut cloner = Self::new(source);
        cloner.push_filter(PageFilter);
        cloner.push_filter(AnnotationsFilter);

        cloner
    }

    /// Add a filter to the end of the chain.
    pub fn push_filter(&mut self, filter: impl CloneFilter + 'a) {
        self.filters.push(Box::new(filter));
    }

    /// The destination reference of each source reference cloned so far.
    pub fn mapping(&self) -> &FxHashMap<ObjRef, ObjRef> {
        &self.map
    }

    /// Clone an indirect object and everything reachable from it. Returns `None` if the
    /// reference doesn't point to a live object.
    pub fn clone_ref(&mut self, obj_ref: ObjRef, dest: &mut IndirectObjectTable) -> Option<ObjRef> {
        let cloned = self.map_ref(obj_ref, None, None, dest);
        self.finish(dest);

        cloned
    }

    /// Clone a direct object and everything reachable from it.
    pub fn clone_object(&mut self, object: &Object, dest: &mut IndirectObjectTable) -> Object {
        let ctx = CloneContext {
            source: self.source,
            key: None,
            holder: None,
        };

        let cloned = self.clone_value(object.clone(), ctx, None, dest);
        self.finish(dest);

        cloned
    }

    fn map_ref(
        &mut self,
        obj_ref: ObjRef,
        key: Option<Name>,
        holder: Option<ObjRef>,
        dest: &mut IndirectObjectTable,
    ) -> Option<ObjRef> {
        if let Some(mapped) = self.map.get(&obj_ref) {
            return Some(*mapped);
        }

        if self.source.resolve_ref(obj_ref).is_null() {
            debug!("dangling reference {obj_ref:?} is cloned as null");

            return None;
        }

        // Reserve the slot first, so that references back to the object find it.
        let target = dest.register(Object::Null);
        self.map.insert(obj_ref, target);
        self.to_visit.push(Pending {
            source: obj_ref,
            target,
            key,
            holder,
        });

        Some(target)
    }

    fn finish(&mut self, dest: &mut IndirectObjectTable) {
        while let Some(pending) = self.to_visit.pop() {
            let value = self.source.resolve_ref(pending.source).clone();
            let ctx = CloneContext {
                source: self.source,
                key: pending.key,
                holder: pending.holder,
            };

            let cloned = self.clone_value(value, ctx, Some(pending.target), dest);

            if !dest.replace(pending.target.obj_number, cloned) {
                warn!("reserved object {:?} disappeared while cloning", pending.target);
            }
        }

        for (index, clone, ctx) in std::mem::take(&mut self.finished) {
            self.filters[index].after(&clone, dest, &ctx);
        }
    }

    /// Clone a value. `inner` is the holder of the values nested in it.
    fn clone_value(
        &mut self,
        value: Object,
        ctx: CloneContext<'a>,
        inner: Option<ObjRef>,
        dest: &mut IndirectObjectTable,
    ) -> Object {
        let filter = self.filters.iter().position(|f| f.matches(&value, &ctx));

        let value = match filter {
            Some(index) => self.filters[index].before(value, &ctx),
            None => value,
        };

        let cloned = match value {
            Object::Ref(r) => self
                .map_ref(r, ctx.key.clone(), ctx.holder, dest)
                .map_or(Object::Null, Object::Ref),
            Object::Array(array) => Object::Array(self.clone_array(array, inner, dest)),
            Object::Dict(dict) => Object::Dict(self.clone_dict(dict, inner, dest)),
            Object::Stream(stream) => {
                let (dict, data) = stream.into_parts();

                Object::Stream(Stream::new(self.clone_dict(dict, inner, dest), data))
            }
            other => other,
        };

        if let Some(index) = filter {
            self.finished.push((index, cloned.clone(), ctx));
        }

        cloned
    }

    fn clone_array(
        &mut self,
        array: Array,
        holder: Option<ObjRef>,
        dest: &mut IndirectObjectTable,
    ) -> Array {
        array
            .into_iter()
            .map(|item| {
                let ctx = CloneContext {
                    source: self.source,
                    key: None,
                    holder,
                };

                self.clone_value(item, ctx, holder, dest)
            })
            .collect()
    }

    fn clone_dict(
        &mut self,
        dict: Dict,
        holder: Option<ObjRef>,
        dest: &mut IndirectObjectTable,
    ) -> Dict {
        let mut cloned = Dict::new();

        for (key, item) in dict {
            let ctx = CloneContext {
                source: self.source,
                key: Some(key.clone()),
                holder,
            };

            let item = self.clone_value(item, ctx, holder, dest);

            if !item.is_null() {
                cloned.insert(key, item);
            }
        }

        cloned
    }
}

/// The attributes of a page that can be inherited from the page tree.
const INHERITABLE: [&[u8]; 4] = [RESOURCES, MEDIA_BOX, CROP_BOX, ROTATE];

/// Clones pages without their page tree. Inherited attributes are copied into the page, and
/// `/Parent` is dropped, so the destination has to insert the page into its own tree.
#[derive(Debug, Clone, Copy, Default)]
pub struct PageFilter;

impl CloneFilter for PageFilter {
    fn matches(&self, value: &Object, _: &CloneContext<'_>) -> bool {
        value.as_dict().is_some_and(|d| d.has_type(PAGE))
    }

    fn before(&self, value: Object, ctx: &CloneContext<'_>) -> Object {
        let Object::Dict(mut page) = value else {
            return value;
        };

        let mut visited = FxHashSet::default();
        let mut parent = page.get_ref(PARENT);

        while let Some(parent_ref) = parent {
            if !visited.insert(parent_ref) {
                warn!("page tree has a cycle at {parent_ref:?}");

                break;
            }

            let Some(node) = ctx.source.resolve_ref(parent_ref).as_dict() else {
                break;
            };

            for key in INHERITABLE {
                if !page.contains_key(key)
                    && let Some(inherited) = node.get(key)
                {
                    page.insert(key, inherited.clone());
                }
            }

            parent = node.get_ref(PARENT);
        }

        page.remove(PARENT);

        Object::Dict(page)
    }
}

/// Renames named destinations in the `/D` entry of actions.
pub struct ActionFilter<F> {
    rename: F,
}

impl<F: Fn(&[u8]) -> Vec<u8>> ActionFilter<F> {
    /// Create a new action filter with the given renaming function.
    pub fn new(rename: F) -> Self {
        Self { rename }
    }
}

impl<F: Fn(&[u8]) -> Vec<u8>> CloneFilter for ActionFilter<F> {
    fn matches(&self, value: &Object, _: &CloneContext<'_>) -> bool {
        value.as_dict().is_some_and(|d| {
            d.contains_key(S) && d.get_name(TYPE).is_none_or(|t| t.as_bytes() == ACTION)
        })
    }

    fn before(&self, value: Object, _: &CloneContext<'_>) -> Object {
        let Object::Dict(mut action) = value else {
            return value;
        };

        let renamed = match action.get(D) {
            Some(Object::String(s)) => {
                let data = (self.rename)(s.as_bytes());

                Some(Object::String(match s.kind() {
                    StringKind::Literal => PdfString::new(data),
                    StringKind::Hex => PdfString::new_hex(data),
                }))
            }
            Some(Object::Name(n)) => Some(Object::Name(Name::new((self.rename)(n.as_bytes())))),
            _ => None,
        };

        if let Some(renamed) = renamed {
            action.insert(D, renamed);
        }

        Object::Dict(action)
    }
}

/// Points the `/P` entry of the annotations in an `/Annots` array to the page holding the
/// array.
#[derive(Debug, Clone, Copy, Default)]
pub struct AnnotationsFilter;

impl CloneFilter for AnnotationsFilter {
    fn matches(&self, value: &Object, ctx: &CloneContext<'_>) -> bool {
        ctx.key.as_ref().is_some_and(|k| k.as_bytes() == ANNOTS)
            && matches!(value, Object::Array(_))
    }

    fn after(&self, clone: &Object, dest: &mut IndirectObjectTable, ctx: &CloneContext<'_>) {
        let Some(page) = ctx.holder else {
            return;
        };

        let Object::Array(annots) = clone else {
            return;
        };

        for annot in annots.iter().filter_map(Object::as_obj_ref) {
            if let Some(dict) = dest.get_mut(annot.obj_number).and_then(Object::as_dict_mut) {
                dict.insert(P, page);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quire_syntax::object::dict::keys::{CONTENTS, KIDS, PAGES};

    fn page_tree() -> (IndirectObjectTable, ObjRef, ObjRef) {
        let mut table = IndirectObjectTable::empty();
        let pages = table.register(Object::Null);
        let page = table.register(Object::Null);
        let annot = table.register(Dict::from_iter([
            (TYPE, Object::from(Name::from("Annot"))),
            (P, Object::Ref(page)),
        ]));
        let annots = table.register(Array::from_iter([annot]));
        let resources = table.register(Dict::from_iter([(b"Font", Dict::new())]));

        table.replace(
            pages.obj_number,
            Dict::from_iter([
                (TYPE, Object::from(Name::from(PAGES))),
                (KIDS, Object::from(Array::from_iter([page]))),
                (RESOURCES, Object::Ref(resources)),
                (ROTATE, Object::from(90)),
            ]),
        );
        table.replace(
            page.obj_number,
            Dict::from_iter([
                (TYPE, Object::from(Name::from(PAGE))),
                (PARENT, Object::Ref(pages)),
                (ANNOTS, Object::Ref(annots)),
                (CONTENTS, Object::Ref(ObjRef::new(40, 0))),
            ]),
        );

        (table, page, annot)
    }

    #[test]
    fn clone_page() {
        let (source, page, _) = page_tree();
        let mut dest = IndirectObjectTable::empty();
        let mut cloner = Cloner::with_default_filters(&source);

        let cloned = cloner.clone_ref(page, &mut dest).unwrap();
        let dict = dest.resolve_ref(cloned).as_dict().unwrap();

        assert!(!dict.contains_key(PARENT));
        // Dangling.
        assert!(!dict.contains_key(CONTENTS));
        assert_eq!(dict.get_i64(ROTATE), Some(90));

        let resources = dest.deref(dict.get(RESOURCES).unwrap()).as_dict().unwrap();
        assert!(resources.contains_key(b"Font"));

        // The page tree itself isn't cloned.
        assert!(!cloner.mapping().values().any(|r| dest
            .resolve_ref(*r)
            .as_dict()
            .is_some_and(|d| d.has_type(PAGES))));
    }

    #[test]
    fn annotations_point_to_clone() {
        let (source, page, annot) = page_tree();
        let mut dest = IndirectObjectTable::empty();
        // Take up some numbers so that source and destination numbers differ.
        dest.register(Object::Null);
        dest.register(Object::Null);

        let mut cloner = Cloner::with_default_filters(&source);
        let cloned = cloner.clone_ref(page, &mut dest).unwrap();
        let cloned_annot = cloner.mapping()[&annot];

        let annot = dest.resolve_ref(cloned_annot).as_dict().unwrap();
        assert_eq!(annot.get_ref(P), Some(cloned));
    }

    #[test]
    fn annotations_without_page() {
        let (source, _, annot) = page_tree();
        let mut dest = IndirectObjectTable::empty();
        let mut cloner = Cloner::new(&source);

        let cloned = cloner.clone_ref(annot, &mut dest).unwrap();
        let page = dest.resolve_ref(cloned).as_dict().unwrap().get_ref(P).unwrap();

        // Without the page filter, the page tree comes along.
        let page = dest.resolve_ref(page).as_dict().unwrap();
        assert!(page.contains_key(PARENT));
    }

    #[test]
    fn shared_objects_stay_shared() {
        let mut source = IndirectObjectTable::empty();
        let shared = source.register(Name::from("Shared"));
        let a = source.register(Array::from_iter([shared, shared]));

        let mut dest = IndirectObjectTable::empty();
        let mut cloner = Cloner::new(&source);
        let cloned = cloner.clone_ref(a, &mut dest).unwrap();

        let array = dest.resolve_ref(cloned).as_array().unwrap();
        assert_eq!(array[0], array[1]);
        assert_eq!(dest.size(), 3);
    }

    #[test]
    fn cycles() {
        let mut source = IndirectObjectTable::empty();
        let a = source.register(Object::Null);
        let b = source.register(Dict::from_iter([(b"Next", a)]));
        source.replace(a.obj_number, Dict::from_iter([(b"Next", b)]));

        let mut dest = IndirectObjectTable::empty();
        let mut cloner = Cloner::new(&source);
        let a2 = cloner.clone_ref(a, &mut dest).unwrap();

        let b2 = dest.resolve_ref(a2).as_dict().unwrap().get_ref(b"Next").unwrap();
        assert_eq!(
            dest.resolve_ref(b2).as_dict().unwrap().get_ref(b"Next"),
            Some(a2)
        );
    }

    #[test]
    fn rename_destinations() {
        let mut source = IndirectObjectTable::empty();
        let action = source.register(Dict::from_iter([
            (S, Object::from(Name::from("GoTo"))),
            (D, Object::from(PdfString::new_hex(b"intro".to_vec()))),
        ]));
        let named = source.register(Dict::from_iter([
            (TYPE, Object::from(Name::from(ACTION))),
            (S, Object::from(Name::from("GoTo"))),
            (D, Object::from(Name::from("intro"))),
        ]));

        let mut dest = IndirectObjectTable::empty();
        let mut cloner = Cloner::new(&source);
        cloner.push_filter(ActionFilter::new(|d: &[u8]| [&b"copy-"[..], d].concat()));

        let cloned = cloner.clone_ref(action, &mut dest).unwrap();
        let d = dest.resolve_ref(cloned).as_dict().unwrap().get(D).unwrap();
        let d = d.as_string().unwrap();
        assert_eq!(d.as_bytes(), b"copy-intro");
        assert_eq!(d.kind(), StringKind::Hex);

        let cloned = cloner.clone_ref(named, &mut dest).unwrap();
        let d = dest.resolve_ref(cloned).as_dict().unwrap().get_name(D).unwrap();
        assert_eq!(d.as_bytes(), b"copy-intro");
    }

    #[test]
    fn first_filter_wins() {
        struct Upper;

        impl CloneFilter for Upper {
            fn matches(&self, value: &Object, _: &CloneContext<'_>) -> bool {
                value.as_name().is_some()
            }

            fn before(&self, value: Object, _: &CloneContext<'_>) -> Object {
                Name::new(value.as_name().unwrap().as_bytes().to_ascii_uppercase()).into()
            }
        }

        struct Never;

        impl CloneFilter for Never {
            fn matches(&self, value: &Object, _: &CloneContext<'_>) -> bool {
                value.as_name().is_some()
            }

            fn before(&self, _: Object, _: &CloneContext<'_>) -> Object {
                panic!("shadowed by the first filter");
            }
        }

        let source = IndirectObjectTable::empty();
        let mut dest = IndirectObjectTable::empty();
        let mut cloner = Cloner::new(&source);
        cloner.push_filter(Upper);
        cloner.push_filter(Never);

        let cloned = cloner.clone_object(&Object::from(Name::from("abc")), &mut dest);
        assert_eq!(cloned.as_name().unwrap().as_bytes(), b"ABC");
    }
}
