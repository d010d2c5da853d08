//! Binary layout of the DAT cache file (spec.md §3, §6):
//!
//! ```text
//! offset 0:  CacheFileHeader (48 bytes)
//!            md5_hex  [32 bytes ASCII, lowercase hex]
//!            min_weight (f64 LE)
//!            elements_num (u32 LE)
//!            dat_size    (u32 LE)
//! offset 48: DatMemElem × elements_num (16 bytes each)
//!            weight (f64 LE) | tag[8] (NUL-padded ASCII)
//! next:      DAT units × dat_size (4 bytes each, Darts/yada layout)
//! ```

use byteorder::{ByteOrder, LittleEndian};

pub const HEADER_LEN: usize = 48;
pub const MD5_HEX_LEN: usize = 32;
pub const ELEM_LEN: usize = 16;
pub const TAG_LEN: usize = 8;
pub const DAT_UNIT_LEN: usize = 4;

/// 48-byte header at the start of every cache file. A multiple of 16 bytes
/// per spec.md §3.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CacheFileHeader {
    pub md5_hex: [u8; MD5_HEX_LEN],
    pub min_weight: f64,
    pub elements_num: u32,
    pub dat_size: u32,
}

impl CacheFileHeader {
    pub fn serialize(&self) -> [u8; HEADER_LEN] {
        let mut buf = [0u8; HEADER_LEN];
        buf[0..MD5_HEX_LEN].copy_from_slice(&self.md5_hex);
        LittleEndian::write_f64(&mut buf[32..40], self.min_weight);
        LittleEndian::write_u32(&mut buf[40..44], self.elements_num);
        LittleEndian::write_u32(&mut buf[44..48], self.dat_size);
        buf
    }

    pub fn deserialize(buf: &[u8]) -> Option<CacheFileHeader> {
        if buf.len() < HEADER_LEN {
            return None;
        }
        let mut md5_hex = [0u8; MD5_HEX_LEN];
        md5_hex.copy_from_slice(&buf[0..MD5_HEX_LEN]);
        Some(CacheFileHeader {
            md5_hex,
            min_weight: LittleEndian::read_f64(&buf[32..40]),
            elements_num: LittleEndian::read_u32(&buf[40..44]),
            dat_size: LittleEndian::read_u32(&buf[44..48]),
        })
    }

    pub fn expected_file_len(&self) -> usize {
        HEADER_LEN + self.elements_num as usize * ELEM_LEN + self.dat_size as usize * DAT_UNIT_LEN
    }
}

/// Per-word metadata stored in the cache file's elements table. Exactly 16
/// bytes on disk: `weight: f64` followed by an 8-byte NUL-padded tag.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DatMemElem {
    pub weight: f64,
    tag: [u8; TAG_LEN],
}

impl DatMemElem {
    pub fn new(weight: f64, tag: &str) -> DatMemElem {
        let mut buf = [0u8; TAG_LEN];
        let bytes = tag.as_bytes();
        let n = bytes.len().min(TAG_LEN - 1);
        buf[..n].copy_from_slice(&bytes[..n]);
        DatMemElem { weight, tag: buf }
    }

    pub fn tag(&self) -> &str {
        let end = self.tag.iter().position(|&b| b == 0).unwrap_or(TAG_LEN);
        std::str::from_utf8(&self.tag[..end]).unwrap_or("")
    }

    pub fn serialize(&self) -> [u8; ELEM_LEN] {
        let mut buf = [0u8; ELEM_LEN];
        LittleEndian::write_f64(&mut buf[0..8], self.weight);
        buf[8..16].copy_from_slice(&self.tag);
        buf
    }

    pub fn deserialize(buf: &[u8]) -> DatMemElem {
        let mut tag = [0u8; TAG_LEN];
        tag.copy_from_slice(&buf[8..16]);
        DatMemElem {
            weight: LittleEndian::read_f64(&buf[0..8]),
            tag,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_round_trip() {
        let header = CacheFileHeader {
            md5_hex: [b'a'; MD5_HEX_LEN],
            min_weight: 3.0,
            elements_num: 7,
            dat_size: 42,
        };
        let buf = header.serialize();
        assert_eq!(buf.len(), HEADER_LEN);
        let back = CacheFileHeader::deserialize(&buf).unwrap();
        assert_eq!(header, back);
    }

    #[test]
    fn elem_round_trip_and_tag_truncation() {
        let elem = DatMemElem::new(-1.5, "nz");
        let buf = elem.serialize();
        assert_eq!(buf.len(), ELEM_LEN);
        let back = DatMemElem::deserialize(&buf);
        assert_eq!(back.weight, -1.5);
        assert_eq!(back.tag(), "nz");

        let long = DatMemElem::new(0.0, "12345678901");
        assert_eq!(long.tag().len(), TAG_LEN - 1);
    }
}
