//! Loading and storing the content streams of a page.

use crate::content::{ContentObject, build, parse};
use crate::error::{Error, Result};
use crate::object::dict::keys::CONTENTS;
use crate::object::{Dict, ObjRef, Object, Stream};
use crate::table::IndirectObjectTable;
use log::{debug, warn};

/// How the content stream is compressed when it is written back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Compression {
    /// Use the flate filter if the original stream used it.
    #[default]
    Keep,
    /// Always use the flate filter.
    Always,
    /// Never compress.
    Never,
}

/// Settings for writing content streams.
#[derive(Debug, Clone, Copy, Default)]
pub struct ContentSettings {
    /// How the rewritten stream is compressed.
    pub compression: Compression,
}

/// The parsed contents of a page (or any other object with a `/Contents` entry).
#[derive(Debug)]
pub struct Contents {
    owner: ObjRef,
    streams: Vec<ObjRef>,
    objects: Vec<ContentObject>,
    settings: ContentSettings,
}

impl Contents {
    /// Load the contents of the object `owner`. A single stream and an array of streams are
    /// both supported, in the latter case the streams are joined with a newline.
    ///
    /// Fails if any of the streams can't be decoded, since writing the contents back would
    /// drop it.
    pub fn load(
        table: &IndirectObjectTable,
        owner: ObjRef,
        settings: ContentSettings,
    ) -> Result<Self> {
        let streams = match table.resolve_ref(owner).as_dict().and_then(|d| d.get(CONTENTS)) {
            Some(Object::Ref(r)) => vec![*r],
            Some(Object::Array(a)) => a.iter().filter_map(Object::as_obj_ref).collect(),
            Some(other) => {
                warn!("invalid /Contents entry of type {}", other.type_name());

                vec![]
            }
            None => vec![],
        };

        let mut data = vec![];

        for (i, stream) in streams.iter().enumerate() {
            let decoded = match table.resolve_ref(*stream) {
                Object::Stream(s) => s.decoded().ok_or(Error::Undecodable(*stream))?,
                Object::Null => {
                    debug!("skipping missing content stream {stream}");

                    continue;
                }
                _ => return Err(Error::Undecodable(*stream)),
            };

            if i > 0 {
                data.push(b'\n');
            }

            data.extend(decoded);
        }

        Ok(Self {
            owner,
            streams,
            objects: parse(&data)?,
            settings,
        })
    }

    /// The content objects.
    pub fn objects(&self) -> &[ContentObject] {
        &self.objects
    }

    /// Mutable access to the content objects.
    pub fn objects_mut(&mut self) -> &mut Vec<ContentObject> {
        &mut self.objects
    }

    /// The streams the contents were loaded from.
    pub fn streams(&self) -> &[ObjRef] {
        &self.streams
    }

    /// Write the content objects back. The result is stored in the first content stream and
    /// replaces the `/Contents` of the owner, all other streams are freed. Returns the
    /// reference to the stream.
    pub fn flush(self, table: &mut IndirectObjectTable) -> ObjRef {
        let data = build(&self.objects);
        let compression = self.settings.compression;

        let first = self
            .streams
            .first()
            .copied()
            .filter(|r| table.resolve_ref(*r).as_stream().is_some());

        let target = match first {
            Some(first) => {
                if let Some(stream) = table
                    .get_mut(first.obj_number)
                    .and_then(Object::as_stream_mut)
                {
                    match compression {
                        Compression::Keep => stream.set_decoded(data),
                        Compression::Always => {
                            stream.set_decoded(data);
                            stream.compress();
                        }
                        Compression::Never => {
                            *stream = Stream::from_decoded(stream.dict().clone(), data, false);
                        }
                    }
                }

                first
            }
            None => {
                let compress = compression == Compression::Always;
                table.register(Stream::from_decoded(Dict::new(), data, compress))
            }
        };

        if let Some(owner) = table
            .get_mut(self.owner.obj_number)
            .and_then(Object::as_dict_mut)
        {
            owner.insert(CONTENTS, target);
        }

        let mut freed = vec![target];

        for stream in self.streams {
            if !freed.contains(&stream) {
                debug!("freeing merged content stream {stream}");
                table.unregister(stream);
                freed.push(stream);
            }
        }

        target
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::Operation;
    use crate::filter::Filter;
    use crate::object::{Array, Name};

    fn page_with(table: &mut IndirectObjectTable, streams: Vec<Stream>) -> ObjRef {
        let refs = streams
            .into_iter()
            .map(|s| Object::Ref(table.register(s)))
            .collect::<Array>();

        let mut page = Dict::new();
        page.insert(b"Type", Name::from("Page"));
        page.insert(CONTENTS, refs);

        table.register(page)
    }

    #[test]
    fn join_and_flush() {
        let mut table = IndirectObjectTable::empty();
        let first = Stream::from_decoded(Dict::new(), b"q 0 0 m".to_vec(), true);
        let second = Stream::from_decoded(Dict::new(), b"1 1 l S Q".to_vec(), false);
        let page = page_with(&mut table, vec![first, second]);

        let mut contents = Contents::load(&table, page, ContentSettings::default()).unwrap();
        assert_eq!(contents.objects().len(), 1);
        contents
            .objects_mut()
            .push(ContentObject::Operation(Operation::new(b"BX", [])));

        let target = contents.flush(&mut table);

        assert_eq!(target, ObjRef::new(1, 0));
        assert_eq!(
            table.resolve(page.obj_number).as_dict().unwrap().get_ref(CONTENTS),
            Some(target)
        );
        assert!(table.resolve(2).is_null());

        let stream = table.resolve_ref(target).as_stream().unwrap();
        assert_eq!(stream.filters(), vec![Filter::Flate]);
        assert_eq!(stream.decoded().unwrap(), b"q\n0 0 m\n1 1 l\nS\nQ\nBX\n");
    }

    #[test]
    fn never_compress() {
        let mut table = IndirectObjectTable::empty();
        let stream = Stream::from_decoded(Dict::new(), b"1 g".to_vec(), true);
        let page = page_with(&mut table, vec![stream]);

        let settings = ContentSettings {
            compression: Compression::Never,
        };
        let target = Contents::load(&table, page, settings).unwrap().flush(&mut table);

        let stream = table.resolve_ref(target).as_stream().unwrap();
        assert!(!stream.is_filtered());
        assert_eq!(stream.raw_data(), b"1 g\n");
    }

    #[test]
    fn undecodable_segment() {
        let mut table = IndirectObjectTable::empty();
        let mut dict = Dict::new();
        dict.insert(b"Filter", Name::from("LZWDecode"));
        let lzw = Stream::new(dict, b"\x80\x0b\x60\x50".to_vec());
        let plain = Stream::from_decoded(Dict::new(), b"1 g".to_vec(), false);
        let page = page_with(&mut table, vec![plain, lzw]);

        let res = Contents::load(&table, page, ContentSettings::default());
        assert!(matches!(res, Err(Error::Undecodable(r)) if r == ObjRef::new(2, 0)));

        let lzw = table.resolve(2).as_stream().unwrap();
        assert_eq!(lzw.raw_data(), b"\x80\x0b\x60\x50");
    }

    #[test]
    fn unreadable_token() {
        let mut table = IndirectObjectTable::empty();
        let data = b"q 1 g ) 0 0 10 10 re f Q BT (keep) Tj ET".to_vec();
        let page = page_with(&mut table, vec![Stream::from_decoded(Dict::new(), data, false)]);

        assert!(matches!(
            Contents::load(&table, page, ContentSettings::default()),
            Err(Error::Parse { .. })
        ));
        assert_eq!(
            table.resolve(1).as_stream().unwrap().decoded().unwrap(),
            b"q 1 g ) 0 0 10 10 re f Q BT (keep) Tj ET"
        );
    }

    #[test]
    fn missing_contents() {
        let mut table = IndirectObjectTable::empty();
        let page = table.register(Dict::new());

        let contents = Contents::load(&table, page, ContentSettings::default()).unwrap();
        assert!(contents.objects().is_empty());

        let target = contents.flush(&mut table);
        assert_eq!(
            table.resolve(page.obj_number).as_dict().unwrap().get_ref(CONTENTS),
            Some(target)
        );
    }
}
