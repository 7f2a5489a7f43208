//! A decoder for run-length-encoded streams.

use crate::reader::Reader;
use log::warn;

/// Decode a run-length-encoded stream. A stream that ends without the end-of-data marker
/// yields whatever was decoded up to that point.
pub fn decode(data: &[u8]) -> Option<Vec<u8>> {
    let mut reader = Reader::new(data);
    let mut decoded = vec![];

    if decode_inner(&mut reader, &mut decoded).is_none() {
        warn!("run-length decode stream ended prematurely");
    }

    Some(decoded)
}

fn decode_inner(reader: &mut Reader<'_>, decoded: &mut Vec<u8>) -> Option<()> {
    loop {
        match reader.read_byte()? {
            128 => return Some(()),
            literal @ 0..=127 => decoded.extend_from_slice(reader.read_bytes(literal as usize + 1)?),
            run => {
                let byte = reader.read_byte()?;
                decoded.resize(decoded.len() + (257 - run as usize), byte);
            }
        }
    }
}
