//! Double-array trie (DAT) over UTF-8 byte keys, paired with a side table of
//! per-word metadata ([`cache::DatMemElem`]), persisted as a memory-mappable
//! cache file validated by content hash (spec.md §3, §4.2).
//!
//! The double array itself is built and queried through `yada`
//! (`examples/lindera-lindera/lindera-core/src/prefix_dict.rs` wraps the
//! same crate) rather than a hand-rolled Darts-style builder — spec.md §9
//! explicitly allows an equivalent library as long as the on-disk unit
//! layout is preserved.

pub mod cache;

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::ops::Deref;
use std::path::Path;
use std::sync::Arc;

use memmap2::Mmap;
use yada::builder::DoubleArrayBuilder;
use yada::DoubleArray;

use crate::error::{JiebaErrorKind, JiebaResult};
use cache::{CacheFileHeader, DatMemElem, DAT_UNIT_LEN, HEADER_LEN, MD5_HEX_LEN};

/// A single dictionary entry at build time (spec.md §3's `DatElement`).
/// Ordering: by `word` ascending; on ties, by `weight` descending — the DAT
/// build keeps the highest-weight variant of a duplicate key.
#[derive(Debug, Clone)]
pub struct DatElement {
    pub word: String,
    pub tag: String,
    pub weight: f64,
}

impl DatElement {
    fn sort_key(&self) -> (&str, std::cmp::Reverse<ordered_float_bits::OrderedF64>) {
        (
            &self.word,
            std::cmp::Reverse(ordered_float_bits::OrderedF64(self.weight)),
        )
    }
}

/// Minimal total ordering over `f64` sufficient for sorting weights; NaN
/// never appears in practice (weights come from `log` of positive
/// frequencies), so a panic-free `partial_cmp` fallback to `Equal` is fine.
mod ordered_float_bits {
    #[derive(Debug, Clone, Copy, PartialEq)]
    pub struct OrderedF64(pub f64);

    impl Eq for OrderedF64 {}

    impl PartialOrd for OrderedF64 {
        fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
            Some(self.cmp(other))
        }
    }

    impl Ord for OrderedF64 {
        fn cmp(&self, other: &Self) -> std::cmp::Ordering {
            self.0.partial_cmp(&other.0).unwrap_or(std::cmp::Ordering::Equal)
        }
    }
}

/// Owns either an in-memory build or a memory-mapped cache file. Either way
/// the bytes outlive every `DatMemElem` copied out of them and every lookup
/// performed against the trie built over them.
enum Backing {
    Mmap(Mmap),
    Owned(Vec<u8>),
}

impl Deref for Backing {
    type Target = [u8];
    fn deref(&self) -> &[u8] {
        match self {
            Backing::Mmap(m) => m,
            Backing::Owned(v) => v,
        }
    }
}

/// A `Deref<Target=[u8]>` view into a sub-range of a shared [`Backing`],
/// so the single on-disk region (`header ‖ elements ‖ dat_array`) can back
/// both the elements table and the `yada::DoubleArray` without copying.
#[derive(Clone)]
struct BackingSlice {
    data: Arc<Backing>,
    start: usize,
    end: usize,
}

impl Deref for BackingSlice {
    type Target = [u8];
    fn deref(&self) -> &[u8] {
        &self.data[self.start..self.end]
    }
}

/// Per-source-position transitions discovered by a common-prefix DAT scan,
/// plus the DP scratch fields used by [`crate::dag`]'s max-probability walk.
///
/// Invariant: `nexts[0]` is always `(i + 1, None)`, the empty single-char
/// fallback; every other transition has `next_pos > i + 1`.
#[derive(Debug, Clone, Default)]
pub struct DagCell {
    pub nexts: Vec<(usize, Option<DatMemElem>)>,
    pub max_weight: f64,
    pub max_next: isize,
}

/// The double-array trie plus its element table. Read-only and `Send +
/// Sync` once constructed; concurrent readers need no synchronization
/// (spec.md §5).
pub struct Dat {
    da: DoubleArray<BackingSlice>,
    elements: BackingSlice,
    elements_num: u32,
    min_weight: f64,
}

impl Dat {
    /// Opens `cache_path` read-only, memory-maps it, and validates the
    /// header against `expected_md5_hex` and the file length. On any
    /// mismatch returns `Err` so the caller can rebuild — an invalid cache
    /// is never treated as fatal by the dictionary loader (spec.md §4.2).
    pub fn open(cache_path: &Path, expected_md5_hex: &[u8; MD5_HEX_LEN]) -> JiebaResult<Dat> {
        let file = File::open(cache_path)
            .map_err(|err| JiebaErrorKind::OpenFileFailed.with_error(err))?;
        let mmap = unsafe { Mmap::map(&file) }
            .map_err(|err| JiebaErrorKind::MmapError.with_error(err))?;

        if mmap.len() < HEADER_LEN {
            return Err(JiebaErrorKind::FileOperationError
                .with_error(anyhow::anyhow!("cache file shorter than header")));
        }
        let header = CacheFileHeader::deserialize(&mmap)
            .ok_or_else(|| JiebaErrorKind::FileOperationError.with_error(anyhow::anyhow!("bad header")))?;

        if &header.md5_hex != expected_md5_hex {
            return Err(JiebaErrorKind::ValueError
                .with_error(anyhow::anyhow!("md5 mismatch in cache file {:?}", cache_path)));
        }
        if mmap.len() != header.expected_file_len() {
            return Err(JiebaErrorKind::ValueError
                .with_error(anyhow::anyhow!("cache file length mismatch")));
        }

        let backing = Arc::new(Backing::Mmap(mmap));
        Dat::from_backing(backing, header)
    }

    fn from_backing(backing: Arc<Backing>, header: CacheFileHeader) -> JiebaResult<Dat> {
        let elements_start = HEADER_LEN;
        let elements_end = elements_start + header.elements_num as usize * cache::ELEM_LEN;
        let dat_start = elements_end;
        let dat_end = dat_start + header.dat_size as usize * DAT_UNIT_LEN;

        let elements = BackingSlice {
            data: backing.clone(),
            start: elements_start,
            end: elements_end,
        };
        let dat_bytes = BackingSlice {
            data: backing,
            start: dat_start,
            end: dat_end,
        };

        Ok(Dat {
            da: DoubleArray::new(dat_bytes),
            elements,
            elements_num: header.elements_num,
            min_weight: header.min_weight,
        })
    }

    /// Sorts `elements` per spec.md §3's ordering (keeping the
    /// highest-weight variant of duplicate words), builds a double-array
    /// trie mapping each key to its index, and atomically writes
    /// `header ‖ elements_table ‖ dat_array` to `cache_path`.
    ///
    /// `min_weight` is the raw (pre-log-transform) floor the dictionary
    /// loader computed — see spec.md §9's open question on why this is not
    /// itself a log-probability.
    pub fn build(
        mut elements: Vec<DatElement>,
        min_weight: f64,
        cache_path: &Path,
        md5_hex: &[u8; MD5_HEX_LEN],
    ) -> JiebaResult<Dat> {
        elements.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
        elements.dedup_by(|a, b| a.word == b.word);

        let mut mem_elems: Vec<DatMemElem> = Vec::with_capacity(elements.len());
        let mut keyset: Vec<(&[u8], u32)> = Vec::with_capacity(elements.len());
        for (idx, e) in elements.iter().enumerate() {
            keyset.push((e.word.as_bytes(), idx as u32));
            mem_elems.push(DatMemElem::new(e.weight, &e.tag));
        }

        let dat_bytes = DoubleArrayBuilder::build(&keyset).ok_or_else(|| {
            JiebaErrorKind::BuildTrieError.with_error(anyhow::anyhow!("double array build failed"))
        })?;
        let dat_size = (dat_bytes.len() / DAT_UNIT_LEN) as u32;

        let header = CacheFileHeader {
            md5_hex: *md5_hex,
            min_weight,
            elements_num: mem_elems.len() as u32,
            dat_size,
        };

        let mut buf = Vec::with_capacity(header.expected_file_len());
        buf.extend_from_slice(&header.serialize());
        for e in &mem_elems {
            buf.extend_from_slice(&e.serialize());
        }
        buf.extend_from_slice(&dat_bytes);

        write_atomically(cache_path, &buf)?;

        let backing = Arc::new(Backing::Owned(buf));
        Dat::from_backing(backing, header)
    }

    pub fn min_weight(&self) -> f64 {
        self.min_weight
    }

    pub fn elements_num(&self) -> u32 {
        self.elements_num
    }

    fn element_at(&self, idx: u32) -> Option<DatMemElem> {
        if idx >= self.elements_num {
            return None;
        }
        let off = idx as usize * cache::ELEM_LEN;
        Some(DatMemElem::deserialize(&self.elements[off..off + cache::ELEM_LEN]))
    }

    /// Returns the metadata for `key` iff an exact match exists.
    pub fn find_exact(&self, key: &str) -> Option<DatMemElem> {
        let value: u32 = self.da.exact_match_search(key)?;
        self.element_at(value)
    }

    /// Common-prefix search at `text_suffix` (already the byte slice
    /// starting at rune index `start`). For each hit with a value in range,
    /// computes its UTF-8 character length; single-character hits become
    /// the position's fallback transition (overwriting the `None`
    /// sentinel), longer hits are appended as additional transitions.
    /// Hits whose character length exceeds `max_word_len_chars` are
    /// dropped.
    pub fn find_all_prefixes(
        &self,
        text_suffix: &[u8],
        start_rune_idx: usize,
        max_word_len_chars: usize,
        out: &mut DagCell,
    ) {
        out.nexts.clear();
        out.nexts.push((start_rune_idx + 1, None));
        let s = match std::str::from_utf8(text_suffix) {
            Ok(s) => s,
            Err(err) => std::str::from_utf8(&text_suffix[..err.valid_up_to()]).unwrap_or(""),
        };
        for (value, prefix_len) in self.da.common_prefix_search(s) {
            if value >= self.elements_num {
                continue;
            }
            let char_len = crate::rune::utf8_char_count(text_suffix, prefix_len);
            if char_len > max_word_len_chars {
                continue;
            }
            let elem = self.element_at(value);
            if char_len == 1 {
                out.nexts[0].1 = elem;
            } else {
                out.nexts.push((start_rune_idx + char_len, elem));
            }
        }
    }
}

fn write_atomically(target: &Path, contents: &[u8]) -> JiebaResult<()> {
    let dir = target.parent().unwrap_or_else(|| Path::new("."));
    let suffix: u64 = std::process::id() as u64
        ^ (std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or(0));
    let tmp_path = dir.join(format!(
        "{}.{:016x}.tmp",
        target.file_name().and_then(|n| n.to_str()).unwrap_or("dat_cache"),
        suffix
    ));

    let mut options = OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o644);
    }
    let mut tmp_file = options
        .open(&tmp_path)
        .map_err(|err| JiebaErrorKind::OpenFileFailed.with_error(err))?;
    tmp_file
        .write_all(contents)
        .map_err(|err| JiebaErrorKind::FileOperationError.with_error(err))?;
    drop(tmp_file);

    std::fs::rename(&tmp_path, target).map_err(|err| {
        let _ = std::fs::remove_file(&tmp_path);
        JiebaErrorKind::FileOperationError.with_error(err)
    })?;
    Ok(())
}
