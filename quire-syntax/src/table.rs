//! The indirect object table.
//!
//! The table owns the raw bytes of a file and one slot per object number. Objects are only
//! parsed the first time they are resolved. All mutations go through the table, which keeps
//! track of the object numbers that need to be written on the next save.

use crate::object::{IndirectHeader, ObjRef, Object};
use crate::objstream::ObjectStream;
use crate::reader::{Reader, ReaderContext};
use crate::xref::XRefEntry;
use log::{error, warn};
use once_cell::unsync::OnceCell;
use rustc_hash::{FxHashMap, FxHashSet};
use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

static NULL: Object = Object::Null;

/// The generation number of retired slots, which are never reused.
pub const MAX_GENERATION: u16 = u16::MAX;

struct Slot {
    entry: XRefEntry,
    /// The entry as it was read from the file, `None` for slots that were added later.
    original: Option<XRefEntry>,
    value: OnceCell<Object>,
}

impl Slot {
    fn free(next: u32, gen_number: u16) -> Self {
        Self {
            entry: XRefEntry::Free { next, gen_number },
            original: None,
            value: OnceCell::new(),
        }
    }
}

/// A table mapping object numbers to indirect objects.
///
/// The table is `Send`, but not `Sync`: resolution fills caches through shared references.
pub struct IndirectObjectTable {
    data: Vec<u8>,
    slots: Vec<Slot>,
    modified: BTreeSet<u32>,
    obj_streams: RefCell<FxHashMap<u32, Option<ObjectStream>>>,
    resolving: RefCell<FxHashSet<u32>>,
}

impl IndirectObjectTable {
    /// Create a table for a document that has no backing file yet. Only object 0, the head
    /// of the free list, exists.
    pub fn empty() -> Self {
        Self::new(Vec::new(), &BTreeMap::new(), 1)
    }

    /// Create a table from the raw file data and the merged cross-reference entries.
    pub fn new(data: Vec<u8>, entries: &BTreeMap<u32, XRefEntry>, size: u32) -> Self {
        let size = entries
            .last_key_value()
            .map(|(n, _)| n.saturating_add(1))
            .unwrap_or(0)
            .max(size)
            .max(1);

        let slots = (0..size)
            .map(|num| {
                let entry = match (num, entries.get(&num)) {
                    (0, Some(XRefEntry::Free { next, .. })) => XRefEntry::Free {
                        next: *next,
                        gen_number: MAX_GENERATION,
                    },
                    (0, _) => XRefEntry::Free {
                        next: 0,
                        gen_number: MAX_GENERATION,
                    },
                    (_, Some(entry)) => *entry,
                    // Numbers without any entry are free, but not linked into the free list.
                    (_, None) => XRefEntry::Free {
                        next: 0,
                        gen_number: 0,
                    },
                };

                Slot {
                    entry,
                    original: (num != 0).then(|| entries.get(&num).copied()).flatten(),
                    value: OnceCell::new(),
                }
            })
            .collect();

        Self {
            data,
            slots,
            modified: BTreeSet::new(),
            obj_streams: RefCell::new(FxHashMap::default()),
            resolving: RefCell::new(FxHashSet::default()),
        }
    }

    /// The raw data of the file the table was read from.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// The number of slots, which is one more than the highest object number.
    pub fn size(&self) -> u32 {
        self.slots.len() as u32
    }

    /// The current entry of an object number.
    pub fn entry(&self, obj_number: u32) -> Option<XRefEntry> {
        self.slots.get(obj_number as usize).map(|s| s.entry)
    }

    /// The entry of an object number as it was read from the file.
    pub fn original_entry(&self, obj_number: u32) -> Option<XRefEntry> {
        self.slots.get(obj_number as usize).and_then(|s| s.original)
    }

    /// The object numbers of all objects that are not free, in ascending order.
    pub fn live_objects(&self) -> impl Iterator<Item = u32> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, s)| !s.entry.is_free())
            .map(|(n, _)| n as u32)
    }

    /// The reference of a live object number, with its current generation.
    pub fn obj_ref(&self, obj_number: u32) -> Option<ObjRef> {
        self.entry(obj_number)
            .filter(|e| !e.is_free())
            .map(|e| ObjRef::new(obj_number, e.gen_number()))
    }

    /// The object numbers that were registered, replaced, mutated or freed since the
    /// table was created.
    pub fn modified(&self) -> impl Iterator<Item = u32> + '_ {
        self.modified.iter().copied()
    }

    /// Whether an object number was modified.
    pub fn is_modified(&self, obj_number: u32) -> bool {
        self.modified.contains(&obj_number)
    }

    /// Resolve an object number. Unknown or free numbers, as well as objects that can't be
    /// parsed, resolve to the null object.
    pub fn resolve(&self, obj_number: u32) -> &Object {
        let Some(slot) = self.slots.get(obj_number as usize) else {
            return &NULL;
        };

        if slot.entry.is_free() {
            return &NULL;
        }

        if let Some(value) = slot.value.get() {
            return value;
        }

        if !self.resolving.borrow_mut().insert(obj_number) {
            error!("object {obj_number} depends on itself while being resolved");

            return &NULL;
        }

        let value = self.load(obj_number, slot.entry);
        self.resolving.borrow_mut().remove(&obj_number);

        slot.value.get_or_init(|| value)
    }

    /// Resolve an object reference. Like [`IndirectObjectTable::resolve`], but a generation
    /// mismatch also resolves to the null object.
    pub fn resolve_ref(&self, obj_ref: ObjRef) -> &Object {
        match self.entry(obj_ref.obj_number) {
            Some(e) if !e.is_free() && e.gen_number() == obj_ref.gen_number => {
                self.resolve(obj_ref.obj_number)
            }
            _ => &NULL,
        }
    }

    /// Resolve an object, following a reference if the object is one.
    pub fn deref<'a>(&'a self, obj: &'a Object) -> &'a Object {
        match obj {
            Object::Ref(r) => self.resolve_ref(*r),
            _ => obj,
        }
    }

    /// Add a new indirect object. The first reusable slot of the free list is taken, with the
    /// generation stored in its free entry. Otherwise, the object is appended.
    pub fn register(&mut self, value: impl Into<Object>) -> ObjRef {
        let value = value.into();

        let (obj_number, gen_number) = match self.take_free_slot() {
            Some(taken) => taken,
            None => {
                self.slots.push(Slot::free(0, 0));

                (self.size() - 1, 0)
            }
        };

        let slot = &mut self.slots[obj_number as usize];
        slot.entry = XRefEntry::InUse {
            offset: 0,
            gen_number,
        };
        slot.value = OnceCell::from(value);
        self.modified.insert(obj_number);

        ObjRef::new(obj_number, gen_number)
    }

    fn take_free_slot(&mut self) -> Option<(u32, u16)> {
        let mut prev = 0;
        let mut steps = 0;

        loop {
            let XRefEntry::Free { next, .. } = self.slots[prev as usize].entry else {
                warn!("free list of the table is broken at object {prev}");

                return None;
            };

            steps += 1;

            if next == 0 || steps > self.slots.len() {
                return None;
            }

            match self.slots.get(next as usize).map(|s| s.entry) {
                Some(XRefEntry::Free {
                    next: after,
                    gen_number,
                }) if gen_number < MAX_GENERATION => {
                    self.set_next(prev, after);

                    return Some((next, gen_number));
                }
                Some(XRefEntry::Free { .. }) => prev = next,
                _ => {
                    warn!("free list of the table points to live object {next}");

                    return None;
                }
            }
        }
    }

    fn set_next(&mut self, obj_number: u32, new_next: u32) {
        if let Some(slot) = self.slots.get_mut(obj_number as usize)
            && let XRefEntry::Free { next, .. } = &mut slot.entry
        {
            *next = new_next;
            self.modified.insert(obj_number);
        }
    }

    /// Free an object. Its generation is bumped, and it is linked at the tail of the free
    /// list. Returns `false` if the reference didn't point to a live object.
    pub fn unregister(&mut self, obj_ref: ObjRef) -> bool {
        let num = obj_ref.obj_number;

        match self.entry(num) {
            Some(e) if num != 0 && !e.is_free() && e.gen_number() == obj_ref.gen_number => {}
            _ => return false,
        }

        let tail = self.free_list().last().unwrap_or(0);

        let slot = &mut self.slots[num as usize];
        slot.entry = XRefEntry::Free {
            next: 0,
            gen_number: obj_ref.gen_number.saturating_add(1),
        };
        slot.value = OnceCell::new();
        self.modified.insert(num);
        self.obj_streams.get_mut().remove(&num);

        self.set_next(tail, num);

        true
    }

    /// Replace the value of a live object, keeping its number and generation.
    /// Returns `false` if the object number isn't live.
    pub fn replace(&mut self, obj_number: u32, value: impl Into<Object>) -> bool {
        match self.slots.get_mut(obj_number as usize) {
            Some(slot) if !slot.entry.is_free() => {
                slot.value = OnceCell::from(value.into());
                self.modified.insert(obj_number);
                self.obj_streams.get_mut().remove(&obj_number);

                true
            }
            _ => false,
        }
    }

    /// Get mutable access to a live object, marking it as modified.
    pub fn get_mut(&mut self, obj_number: u32) -> Option<&mut Object> {
        if self.entry(obj_number).is_none_or(|e| e.is_free()) {
            return None;
        }

        // Make sure the value is loaded.
        self.resolve(obj_number);
        self.modified.insert(obj_number);
        self.obj_streams.get_mut().remove(&obj_number);

        self.slots.get_mut(obj_number as usize)?.value.get_mut()
    }

    /// Iterate over the object numbers of the free list, starting after object 0. The
    /// iteration stops at the end of the list, or as soon as a number repeats.
    pub fn free_list(&self) -> FreeList<'_> {
        FreeList {
            table: self,
            current: 0,
            seen: FxHashSet::default(),
        }
    }

    fn load(&self, obj_number: u32, entry: XRefEntry) -> Object {
        let loaded = match entry {
            XRefEntry::InUse { offset, gen_number } => {
                self.load_from_offset(ObjRef::new(obj_number, gen_number), offset)
            }
            XRefEntry::Compressed { stream, index } => {
                self.load_from_stream(obj_number, stream, index)
            }
            XRefEntry::Free { .. } => Some(Object::Null),
        };

        loaded.unwrap_or_else(|| {
            warn!("failed to read object {obj_number}, using null instead");

            Object::Null
        })
    }

    fn load_from_offset(&self, expected: ObjRef, offset: usize) -> Option<Object> {
        let mut r = Reader::new_with(&self.data, offset);
        r.skip_white_spaces_and_comments();

        let IndirectHeader(found) = r.read_plain::<IndirectHeader>()?;

        if found != expected {
            warn!("expected object {expected} at offset {offset}, found {found}");

            return None;
        }

        r.skip_white_spaces_and_comments();

        let lengths = |length_ref: ObjRef| {
            self.resolve_ref(length_ref)
                .as_i64()
                .and_then(|l| usize::try_from(l).ok())
        };

        r.read::<Object>(ReaderContext::with_lengths(&lengths))
    }

    fn load_from_stream(&self, obj_number: u32, stream: u32, index: u32) -> Option<Object> {
        if !self.obj_streams.borrow().contains_key(&stream) {
            let decoded = match self.resolve(stream) {
                Object::Stream(s) => ObjectStream::new(s),
                _ => None,
            };

            if decoded.is_none() {
                warn!("object stream {stream} can't be read");
            }

            self.obj_streams.borrow_mut().insert(stream, decoded);
        }

        self.obj_streams
            .borrow()
            .get(&stream)?
            .as_ref()?
            .get(obj_number, index)
    }
}

impl fmt::Debug for IndirectObjectTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IndirectObjectTable")
            .field("size", &self.slots.len())
            .field("modified", &self.modified)
            .finish_non_exhaustive()
    }
}

/// An iterator over the free list of a table.
pub struct FreeList<'a> {
    table: &'a IndirectObjectTable,
    current: u32,
    seen: FxHashSet<u32>,
}

impl Iterator for FreeList<'_> {
    type Item = u32;

    fn next(&mut self) -> Option<Self::Item> {
        let XRefEntry::Free { next, .. } = self.table.entry(self.current)? else {
            return None;
        };

        if next == 0 || !self.seen.insert(next) {
            return None;
        }

        match self.table.entry(next) {
            Some(XRefEntry::Free { .. }) => {
                self.current = next;

                Some(next)
            }
            _ => None,
        }
    }
}
