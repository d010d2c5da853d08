//! Parses the main dictionary and user dictionaries, normalizes weights to
//! log-probabilities, and produces the `DatElement`s the DAT layer builds
//! from (spec.md §4.3).

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use log::{debug, warn};
use md5::{Digest, Md5};

use crate::dat::{Dat, DatElement};
use crate::error::{JiebaErrorKind, JiebaResult};

/// How to weight single-character and multi-field-less user dictionary
/// entries that carry no explicit frequency (spec.md §4.3 step (d)).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserWordWeightOption {
    Min,
    Median,
    Max,
}

impl UserWordWeightOption {
    /// Matches cppjieba's `enum UserWordWeightOption { WordWeightMin,
    /// WordWeightMedian, WordWeightMax }` ordinal, used verbatim in the
    /// cache path default.
    fn as_int(self) -> u8 {
        match self {
            UserWordWeightOption::Min => 0,
            UserWordWeightOption::Median => 1,
            UserWordWeightOption::Max => 2,
        }
    }
}

/// The result of loading a dictionary: the built/opened [`Dat`] plus the set
/// of codepoints registered as single-character user words, which
/// [`crate`]'s Mix strategy needs to decide whether to re-run HMM over a
/// single MP character.
pub struct Dictionary {
    pub dat: Dat,
    pub user_single_char_set: HashSet<u32>,
}

struct RawEntry {
    word: String,
    freq: Option<f64>,
    tag: String,
}

/// `word<SP>freq<SP>tag`, exactly three whitespace-separated fields,
/// `freq > 0`. Any other shape is rejected (spec.md §4.3 step 3a).
fn parse_default_line(line: &str) -> JiebaResult<RawEntry> {
    let fields: Vec<&str> = line.split_whitespace().collect();
    if fields.len() != 3 {
        return Err(JiebaErrorKind::ValueError
            .with_error(anyhow::anyhow!("default dict line must have 3 fields: {:?}", line)));
    }
    let freq: f64 = fields[1]
        .parse()
        .map_err(|_| JiebaErrorKind::ValueError.with_error(anyhow::anyhow!("bad freq: {}", fields[1])))?;
    if freq <= 0.0 {
        return Err(JiebaErrorKind::ValueError.with_error(anyhow::anyhow!("non-positive freq: {}", freq)));
    }
    Ok(RawEntry {
        word: fields[0].to_string(),
        freq: Some(freq),
        tag: fields[2].to_string(),
    })
}

/// `word`, `word<SP>tag`, or `word<SP>freq<SP>tag` — 1 to 3 fields.
fn parse_user_line(line: &str) -> Option<RawEntry> {
    let fields: Vec<&str> = line.split_whitespace().collect();
    match fields.len() {
        0 => None,
        1 => Some(RawEntry { word: fields[0].to_string(), freq: None, tag: String::new() }),
        2 => Some(RawEntry { word: fields[0].to_string(), freq: None, tag: fields[1].to_string() }),
        3 => {
            let freq: f64 = fields[1].parse().ok()?;
            Some(RawEntry { word: fields[0].to_string(), freq: Some(freq), tag: fields[2].to_string() })
        }
        _ => None,
    }
}

fn read_to_string(path: &Path) -> JiebaResult<String> {
    std::fs::read_to_string(path).map_err(|err| JiebaErrorKind::OpenFileFailed.with_error(err))
}

fn hex_lower(bytes: &[u8]) -> String {
    let mut s = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        s.push_str(&format!("{:02x}", b));
    }
    s
}

/// MD5 over the concatenation of the default dict and every non-empty user
/// dict path's contents. An empty/missing user dict path contributes
/// nothing to the hash — per spec.md §9's open question, treated as "no
/// file" rather than hashed as an empty byte string.
fn compute_md5(dict_path: &Path, user_dict_paths: &[PathBuf]) -> JiebaResult<[u8; 32]> {
    let mut hasher = Md5::new();
    hasher.update(std::fs::read(dict_path).map_err(|err| JiebaErrorKind::OpenFileFailed.with_error(err))?);
    for p in user_dict_paths {
        if p.as_os_str().is_empty() {
            continue;
        }
        hasher.update(std::fs::read(p).map_err(|err| JiebaErrorKind::OpenFileFailed.with_error(err))?);
    }
    let digest = hasher.finalize();
    let hex = hex_lower(&digest);
    let mut out = [0u8; 32];
    out.copy_from_slice(hex.as_bytes());
    Ok(out)
}

fn default_cache_path(dict_path: &Path, md5_hex: &[u8; 32], option: UserWordWeightOption) -> PathBuf {
    let md5_str = std::str::from_utf8(md5_hex).unwrap_or("");
    let mut s = dict_path.as_os_str().to_owned();
    s.push(format!(".{}.{}.dat_cache", md5_str, option.as_int()));
    PathBuf::from(s)
}

fn collect_user_single_chars(user_dict_paths: &[PathBuf]) -> JiebaResult<HashSet<u32>> {
    let mut set = HashSet::new();
    for path in user_dict_paths {
        if path.as_os_str().is_empty() {
            continue;
        }
        let content = read_to_string(path)?;
        for line in content.lines() {
            if line.is_empty() {
                continue;
            }
            if let Some(entry) = parse_user_line(line) {
                let rs = crate::rune::RuneString::from_str(&entry.word);
                if rs.len() == 1 {
                    set.insert(rs.runes()[0].codepoint);
                }
            }
        }
    }
    Ok(set)
}

/// Loads the default dictionary and any user dictionaries, using a cached
/// DAT if one matching the computed MD5 already exists, otherwise building
/// and persisting a fresh one (spec.md §4.3).
pub fn load(
    dict_path: &Path,
    user_dict_paths: &[PathBuf],
    cache_path: Option<PathBuf>,
    option: UserWordWeightOption,
) -> JiebaResult<Dictionary> {
    let md5_hex = compute_md5(dict_path, user_dict_paths)?;
    let cache_path = cache_path.unwrap_or_else(|| default_cache_path(dict_path, &md5_hex, option));

    if let Ok(dat) = Dat::open(&cache_path, &md5_hex) {
        debug!("loaded dictionary from cache {:?}", cache_path);
        let user_single_char_set = collect_user_single_chars(user_dict_paths)?;
        return Ok(Dictionary { dat, user_single_char_set });
    }

    debug!("no usable cache at {:?}; rebuilding", cache_path);

    let default_content = read_to_string(dict_path)?;
    let mut raw_entries = Vec::new();
    for line in default_content.lines() {
        if line.is_empty() {
            continue;
        }
        raw_entries.push(parse_default_line(line)?);
    }
    if raw_entries.is_empty() {
        return Err(JiebaErrorKind::ValueError.with_error(anyhow::anyhow!("empty default dictionary")));
    }

    let freq_sum: f64 = raw_entries.iter().map(|e| e.freq.unwrap()).sum();
    let raw_min_weight = raw_entries
        .iter()
        .map(|e| e.freq.unwrap())
        .fold(f64::INFINITY, f64::min);

    let mut elements: Vec<DatElement> = raw_entries
        .iter()
        .map(|e| DatElement {
            word: e.word.clone(),
            tag: e.tag.clone(),
            weight: (e.freq.unwrap() / freq_sum).ln(),
        })
        .collect();

    let user_word_default_weight = {
        let mut weights: Vec<f64> = elements.iter().map(|e| e.weight).collect();
        weights.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
        match option {
            UserWordWeightOption::Min => weights[0],
            UserWordWeightOption::Median => weights[weights.len() / 2],
            UserWordWeightOption::Max => weights[weights.len() - 1],
        }
    };

    let mut user_single_char_set = HashSet::new();
    for path in user_dict_paths {
        if path.as_os_str().is_empty() {
            continue;
        }
        let content = read_to_string(path)?;
        for line in content.lines() {
            if line.is_empty() {
                continue;
            }
            let entry = match parse_user_line(line) {
                Some(e) => e,
                None => {
                    warn!("skipping malformed user dict line: {:?}", line);
                    continue;
                }
            };
            let weight = match entry.freq {
                Some(freq) if freq_sum > 0.0 => (freq / freq_sum).ln(),
                _ => user_word_default_weight,
            };
            let rs = crate::rune::RuneString::from_str(&entry.word);
            if rs.len() == 1 {
                user_single_char_set.insert(rs.runes()[0].codepoint);
            }
            elements.push(DatElement { word: entry.word, tag: entry.tag, weight });
        }
    }

    let dat = Dat::build(elements, raw_min_weight, &cache_path, &md5_hex)?;
    Ok(Dictionary { dat, user_single_char_set })
}
