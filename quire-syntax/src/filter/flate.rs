//! The flate filter and the predictor functions that can be combined with it.

use crate::object::Dict;
use crate::object::dict::keys::{BITS_PER_COMPONENT, COLORS, COLUMNS, PREDICTOR};
use flate2::Compression;
use flate2::read::{DeflateDecoder, ZlibDecoder};
use flate2::write::ZlibEncoder;
use log::warn;
use std::io::{Read, Write};

/// Decode flate-compressed data and undo the predictor given in the decode parameters.
pub fn decode(data: &[u8], params: Option<&Dict>) -> Option<Vec<u8>> {
    let decoded = inflate(ZlibDecoder::new(data)).or_else(|| inflate(DeflateDecoder::new(data)))?;
    let params = params.map(PredictorParams::from_params).unwrap_or_default();

    apply_predictor(decoded, &params)
}

/// Compress data with the flate filter.
pub fn encode(data: &[u8]) -> Vec<u8> {
    const COMPRESSION_LEVEL: u32 = 6;

    let mut e = ZlibEncoder::new(Vec::new(), Compression::new(COMPRESSION_LEVEL));
    e.write_all(data).expect("writing to a vec can't fail");
    e.finish().expect("writing to a vec can't fail")
}

fn inflate(mut decoder: impl Read) -> Option<Vec<u8>> {
    let mut out = vec![];

    match decoder.read_to_end(&mut out) {
        Ok(_) => Some(out),
        // Truncated or corrupt streams are common, keep what could be decoded.
        Err(_) if !out.is_empty() => {
            warn!("flate stream is corrupt, using {} decoded bytes", out.len());

            Some(out)
        }
        Err(_) => None,
    }
}

struct PredictorParams {
    predictor: u8,
    colors: u8,
    bits_per_component: u8,
    columns: usize,
}

impl PredictorParams {
    fn bits_per_pixel(&self) -> usize {
        self.bits_per_component as usize * self.colors as usize
    }

    fn bytes_per_pixel(&self) -> usize {
        self.bits_per_pixel().div_ceil(8)
    }

    fn row_length_in_bytes(&self) -> usize {
        (self.columns * self.bits_per_pixel()).div_ceil(8)
    }

    fn from_params(dict: &Dict) -> Self {
        let get = |key: &[u8], default: u8| {
            dict.get_i64(key)
                .and_then(|v| u8::try_from(v).ok())
                .unwrap_or(default)
        };

        Self {
            predictor: get(PREDICTOR, 1),
            colors: get(COLORS, 1),
            bits_per_component: get(BITS_PER_COMPONENT, 8),
            columns: dict
                .get_i64(COLUMNS)
                .and_then(|v| usize::try_from(v).ok())
                .unwrap_or(1),
        }
    }
}

impl Default for PredictorParams {
    fn default() -> Self {
        Self {
            predictor: 1,
            colors: 1,
            bits_per_component: 8,
            columns: 1,
        }
    }
}

fn apply_predictor(data: Vec<u8>, params: &PredictorParams) -> Option<Vec<u8>> {
    match params.predictor {
        1 => Some(data),
        2 => apply_tiff(data, params),
        10..=15 => apply_png(&data, params),
        p => {
            warn!("unknown predictor {p}");

            None
        }
    }
}

fn apply_tiff(mut data: Vec<u8>, params: &PredictorParams) -> Option<Vec<u8>> {
    if params.bits_per_component != 8 {
        warn!(
            "tiff predictor with {} bits per component is unsupported",
            params.bits_per_component
        );

        return None;
    }

    let row_len = params.row_length_in_bytes();
    let bpp = params.bytes_per_pixel();

    if row_len == 0 {
        return None;
    }

    for row in data.chunks_mut(row_len) {
        for i in bpp..row.len() {
            row[i] = row[i].wrapping_add(row[i - bpp]);
        }
    }

    Some(data)
}

fn apply_png(data: &[u8], params: &PredictorParams) -> Option<Vec<u8>> {
    let row_len = params.row_length_in_bytes();
    let bpp = params.bytes_per_pixel();

    if row_len == 0 {
        return None;
    }

    let mut out = Vec::with_capacity(data.len());
    let mut prev_row = vec![0_u8; row_len];

    // +1 Because each row must start with the predictor that is used.
    for chunk in data.chunks(row_len + 1) {
        let (&kind, row) = chunk.split_first()?;
        // A short last row is padded with zeroes.
        let mut cur = row.to_vec();
        cur.resize(row_len, 0);

        for i in 0..row_len {
            let left = if i >= bpp { cur[i - bpp] } else { 0 };
            let up = prev_row[i];
            let up_left = if i >= bpp { prev_row[i - bpp] } else { 0 };

            cur[i] = match kind {
                0 => cur[i],
                1 => cur[i].wrapping_add(left),
                2 => cur[i].wrapping_add(up),
                3 => cur[i].wrapping_add(((left as u16 + up as u16) / 2) as u8),
                4 => cur[i].wrapping_add(paeth(left, up, up_left)),
                _ => {
                    warn!("unknown png predictor type {kind}");

                    return None;
                }
            };
        }

        out.extend_from_slice(&cur[..row.len().min(row_len)]);
        prev_row = cur;
    }

    Some(out)
}

fn paeth(a: u8, b: u8, c: u8) -> u8 {
    let p = a as i16 + b as i16 - c as i16;
    let pa = (p - a as i16).abs();
    let pb = (p - b as i16).abs();
    let pc = (p - c as i16).abs();

    if pa <= pb && pa <= pc {
        a
    } else if pb <= pc {
        b
    } else {
        c
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(predictor: i64, columns: i64) -> Dict {
        [("Predictor", predictor), ("Columns", columns)]
            .into_iter()
            .collect()
    }

    #[test]
    fn round_trip() {
        let data = b"The quick brown fox jumps over the lazy dog.".repeat(4);
        assert_eq!(decode(&encode(&data), None).unwrap(), data);
    }

    #[test]
    fn raw_deflate() {
        let mut e = flate2::write::DeflateEncoder::new(Vec::new(), Compression::default());
        e.write_all(b"raw deflate").unwrap();
        let data = e.finish().unwrap();

        assert_eq!(decode(&data, None).unwrap(), b"raw deflate");
    }

    #[test]
    fn garbage() {
        // A reserved block type, which is invalid for both zlib and raw deflate.
        assert!(decode(b"\xff\xff\xff\xff", None).is_none());
    }

    #[test]
    fn png_up() {
        // Two rows of three bytes, the second one uses the `Up` predictor.
        let raw = [0, 1, 2, 3, 2, 1, 1, 1];
        let decoded = decode(&encode(&raw), Some(&params(12, 3))).unwrap();
        assert_eq!(decoded, vec![1, 2, 3, 2, 3, 4]);
    }

    #[test]
    fn png_sub_and_paeth() {
        let raw = [1, 5, 1, 1, 4, 0, 0, 0];
        let decoded = decode(&encode(&raw), Some(&params(15, 3))).unwrap();
        // Row 1: 5, 6, 7. Row 2 (paeth with all zero deltas) repeats the row above.
        assert_eq!(decoded, vec![5, 6, 7, 5, 6, 7]);
    }

    #[test]
    fn png_average() {
        let raw = [0, 10, 20, 3, 2, 2];
        let decoded = decode(&encode(&raw), Some(&params(13, 2))).unwrap();
        // Second row: 2 + (0 + 10) / 2 = 7, 2 + (7 + 20) / 2 = 15.
        assert_eq!(decoded, vec![10, 20, 7, 15]);
    }

    #[test]
    fn tiff() {
        let raw = [1, 1, 1, 5, 0, 0];
        let decoded = decode(&encode(&raw), Some(&params(2, 3))).unwrap();
        assert_eq!(decoded, vec![1, 2, 3, 5, 5, 5]);
    }
}
