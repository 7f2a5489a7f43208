//! Streams.

use crate::filter::{Filter, apply_filter, flate};
use crate::object::dict::keys::{DECODE_PARMS, FILTER, FLATE_DECODE, LENGTH};
use crate::object::{Dict, Name, Object};
use crate::reader::{Readable, Reader, ReaderContext};
use log::{debug, warn};
use memchr::memmem;
use std::fmt::{Debug, Formatter};

/// A stream of arbitrary data.
///
/// The data is kept in its encoded form, exactly as it appeared between the `stream`
/// and `endstream` keywords.
#[derive(Clone, PartialEq)]
pub struct Stream {
    dict: Dict,
    data: Vec<u8>,
}

impl Stream {
    /// Create a new stream from a dictionary and its (already encoded) data.
    pub fn new(dict: Dict, data: Vec<u8>) -> Self {
        Self { dict, data }
    }

    /// Create a new stream from unencoded data, optionally compressing it with the
    /// flate filter.
    pub fn from_decoded(mut dict: Dict, data: Vec<u8>, compress: bool) -> Self {
        dict.remove(FILTER);
        dict.remove(DECODE_PARMS);

        let mut stream = Self { dict, data };

        if compress {
            stream.compress();
        }

        stream
    }

    /// Return the stream dictionary.
    pub fn dict(&self) -> &Dict {
        &self.dict
    }

    /// Return the stream dictionary mutably.
    pub fn dict_mut(&mut self) -> &mut Dict {
        &mut self.dict
    }

    /// Return the raw (potentially with some applied filters) data of the stream.
    pub fn raw_data(&self) -> &[u8] {
        &self.data
    }

    /// Split the stream into its dictionary and raw data.
    pub fn into_parts(self) -> (Dict, Vec<u8>) {
        (self.dict, self.data)
    }

    /// The filters of the stream, in the order in which they need to be applied
    /// for decoding.
    pub fn filters(&self) -> Vec<Filter> {
        match self.dict.get(FILTER) {
            Some(Object::Name(n)) => vec![Filter::from_name(n)],
            Some(Object::Array(a)) => a
                .iter()
                .filter_map(Object::as_name)
                .map(Filter::from_name)
                .collect(),
            _ => vec![],
        }
    }

    /// Whether any filter is applied to the stream data.
    pub fn is_filtered(&self) -> bool {
        !self.filters().is_empty()
    }

    /// Return the decoded data of the stream.
    ///
    /// Note that the result of this method will not be cached, so calling it multiple
    /// times is expensive. Returns `None` if any of the filters is unsupported or fails.
    pub fn decoded(&self) -> Option<Vec<u8>> {
        let filters = self.filters();

        if filters.is_empty() {
            return Some(self.data.clone());
        }

        let params = match self.dict.get(DECODE_PARMS) {
            Some(Object::Dict(d)) => vec![Some(d)],
            Some(Object::Array(a)) => a.iter().map(Object::as_dict).collect(),
            _ => vec![],
        };

        let mut current = self.data.clone();

        for (i, filter) in filters.iter().enumerate() {
            let params = params.get(i).copied().flatten();
            current = apply_filter(&current, filter, params)?;
        }

        Some(current)
    }

    /// Replace the contents of the stream with new, unencoded data. If the stream was
    /// flate-compressed before, the new data is compressed again. Any other filter is removed.
    pub fn set_decoded(&mut self, data: Vec<u8>) {
        let was_flate = self.filters() == [Filter::Flate];

        self.dict.remove(FILTER);
        self.dict.remove(DECODE_PARMS);
        self.data = data;

        if was_flate {
            self.compress();
        }
    }

    /// Compress the stream with the flate filter, if it isn't filtered yet.
    pub fn compress(&mut self) {
        if self.is_filtered() {
            return;
        }

        self.data = flate::encode(&self.data);
        self.dict.insert(FILTER, Name::from(FLATE_DECODE));
    }
}

impl Debug for Stream {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Stream (len: {:?}) {:?}", self.data.len(), self.dict)
    }
}

impl Readable for Stream {
    fn read(r: &mut Reader<'_>, ctx: ReaderContext<'_>) -> Option<Self> {
        let dict = r.read::<Dict>(ctx)?;
        r.skip_white_spaces_and_comments();
        r.forward_tag(b"stream")?;

        // The keyword should be followed by CRLF or LF, but a lone CR occurs in practice.
        if r.forward_tag(b"\r\n").is_none() {
            r.eat(|b| b == b'\n' || b == b'\r');
        }

        let start = r.offset();
        let length = match dict.get(LENGTH) {
            Some(Object::Ref(obj_ref)) => ctx.lengths.and_then(|resolve| resolve(*obj_ref)),
            Some(obj) => obj.as_i64().and_then(|l| usize::try_from(l).ok()),
            None => None,
        };

        let data = if let Some(data) = length.and_then(|l| with_length(r, l)) {
            data
        } else {
            debug!("stream at offset {start} has a missing or wrong length, searching for endstream");

            let tail = r.tail()?;
            let Some(pos) = memmem::find(tail, b"endstream") else {
                warn!("stream at offset {start} has no endstream keyword");

                return None;
            };

            let mut data = &tail[..pos];

            if let Some(stripped) = data.strip_suffix(b"\r\n") {
                data = stripped;
            } else if let Some(stripped) = data
                .strip_suffix(b"\n")
                .or_else(|| data.strip_suffix(b"\r"))
            {
                data = stripped;
            }

            r.jump(start + pos);
            r.forward_tag(b"endstream")?;

            data
        };

        Some(Self {
            dict,
            data: data.to_vec(),
        })
    }
}

fn with_length<'a>(r: &mut Reader<'a>, length: usize) -> Option<&'a [u8]> {
    let mut cloned = r.clone();
    let data = cloned.read_bytes(length)?;
    cloned.skip_white_spaces_and_comments();
    cloned.forward_tag(b"endstream")?;
    r.jump(cloned.offset());

    Some(data)
}

#[cfg(test)]
mod tests {
    use crate::object::dict::keys::FILTER;
    use crate::object::{Dict, ObjRef, Stream};
    use crate::reader::{Reader, ReaderContext};

    #[test]
    fn stream() {
        let data = b"<< /Length 10 >> stream\nabcdefghij\nendstream";
        let mut r = Reader::new(data);
        let stream = r.read_plain::<Stream>().unwrap();

        assert_eq!(stream.raw_data(), b"abcdefghij");
        assert!(r.at_end());
    }

    #[test]
    fn stream_crlf() {
        let data = b"<< /Length 3 >>\r\nstream\r\nabc\r\nendstream";
        let stream = Reader::new(data).read_plain::<Stream>().unwrap();

        assert_eq!(stream.raw_data(), b"abc");
    }

    #[test]
    fn stream_wrong_length() {
        let data = b"<< /Length 100 >> stream\nabcdefghij\nendstream";
        let stream = Reader::new(data).read_plain::<Stream>().unwrap();

        assert_eq!(stream.raw_data(), b"abcdefghij");
    }

    #[test]
    fn stream_missing_length() {
        let data = b"<< >> stream\r\nabc\r\nendstream";
        let stream = Reader::new(data).read_plain::<Stream>().unwrap();

        assert_eq!(stream.raw_data(), b"abc");
    }

    #[test]
    fn stream_indirect_length() {
        let data = b"<< /Length 5 0 R >> stream\nab\nendstream\nendstream";
        let resolve = |r: ObjRef| (r == ObjRef::new(5, 0)).then_some(12);
        let stream = Reader::new(data)
            .read::<Stream>(ReaderContext::with_lengths(&resolve))
            .unwrap();

        // The resolved length covers a false `endstream` inside the data.
        assert_eq!(stream.raw_data(), b"ab\nendstream");
    }

    #[test]
    fn stream_without_endstream() {
        let data = b"<< /Length 3 >> stream\nabc";
        assert!(Reader::new(data).read_plain::<Stream>().is_none());
    }

    #[test]
    fn compress_and_decode() {
        let mut stream = Stream::from_decoded(Dict::new(), b"hello hello hello".to_vec(), true);
        assert!(stream.dict().contains_key(FILTER));
        assert_eq!(stream.decoded().unwrap(), b"hello hello hello");

        stream.set_decoded(b"bye".to_vec());
        assert!(stream.dict().contains_key(FILTER));
        assert_eq!(stream.decoded().unwrap(), b"bye");
    }

    #[test]
    fn set_decoded_uncompressed() {
        let mut stream = Stream::from_decoded(Dict::new(), b"abc".to_vec(), false);
        stream.set_decoded(b"xyz".to_vec());
        assert_eq!(stream.raw_data(), b"xyz");
        assert!(!stream.is_filtered());
    }
}
