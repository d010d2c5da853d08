//! The public facade: loads a dictionary, HMM model, and (optionally) an
//! IDF table and stop-word list, then exposes the four operations spec.md
//! §6 names as the external surface.

use std::collections::HashSet;
use std::path::Path;

use log::warn;

use jieba_core::dict::{self, UserWordWeightOption};
use jieba_core::error::JiebaResult;
use jieba_core::{Dat, HmmModel, RuneString};

use crate::keyword::{Keyword, KeywordExtractor};
use crate::segment::mix::MixSegment;
use crate::segment::Segmenter;

/// The canonical jieba value; cppjieba references but never defines it in
/// the excerpted source (spec.md §9).
pub const DEFAULT_MAX_WORD_LEN: usize = 5;

pub struct Jieba {
    dat: Dat,
    hmm_model: HmmModel,
    user_single_char_set: HashSet<u32>,
    max_word_len: usize,
    keyword_extractor: Option<KeywordExtractor>,
}

impl Jieba {
    pub fn new(dict_path: &Path, user_dict_paths: &[std::path::PathBuf], hmm_model_path: &Path) -> JiebaResult<Jieba> {
        Jieba::with_options(dict_path, user_dict_paths, hmm_model_path, UserWordWeightOption::Median, DEFAULT_MAX_WORD_LEN)
    }

    pub fn with_options(
        dict_path: &Path,
        user_dict_paths: &[std::path::PathBuf],
        hmm_model_path: &Path,
        user_word_weight_option: UserWordWeightOption,
        max_word_len: usize,
    ) -> JiebaResult<Jieba> {
        let dictionary = dict::load(dict_path, user_dict_paths, None, user_word_weight_option)?;
        let hmm_model = HmmModel::load(hmm_model_path)?;
        Ok(Jieba {
            dat: dictionary.dat,
            hmm_model,
            user_single_char_set: dictionary.user_single_char_set,
            max_word_len,
            keyword_extractor: None,
        })
    }

    /// Attaches an IDF table and stop-word list, enabling [`Jieba::extract`].
    pub fn with_keyword_extractor(mut self, idf_path: &Path, stop_words_path: &Path) -> JiebaResult<Jieba> {
        self.keyword_extractor = Some(KeywordExtractor::load(idf_path, stop_words_path)?);
        Ok(self)
    }

    fn mix(&self) -> MixSegment<'_> {
        MixSegment::new(&self.dat, self.max_word_len, &self.hmm_model, &self.user_single_char_set)
    }

    /// Mix-cuts `text` and returns each word as an owned `String`. Empty
    /// input produces an empty vector, never an error (spec.md §6).
    pub fn cut(&self, text: &str, with_hmm: bool) -> Vec<String> {
        let runes = RuneString::from_str(text);
        self.mix()
            .cut(&runes, 0..runes.len(), with_hmm)
            .into_iter()
            .map(|r| String::from_utf8_lossy(runes.encode_range(r)).into_owned())
            .collect()
    }

    /// Same cut, but reporting byte offsets into `text` instead of owned
    /// strings — callers that only need span boundaries avoid the
    /// allocation.
    pub fn cut_ranges(&self, text: &str) -> Vec<(usize, usize)> {
        let runes = RuneString::from_str(text);
        self.mix()
            .cut(&runes, 0..runes.len(), true)
            .into_iter()
            .map(|r| byte_range(&runes, r))
            .collect()
    }

    /// Mix-cuts `text` and tags each word with its dictionary part of
    /// speech, or `"x"` for a word with no exact dictionary entry (an
    /// HMM-decoded out-of-vocabulary span).
    pub fn tag(&self, text: &str) -> Vec<(String, String)> {
        let runes = RuneString::from_str(text);
        self.mix()
            .cut(&runes, 0..runes.len(), true)
            .into_iter()
            .map(|r| {
                let word = String::from_utf8_lossy(runes.encode_range(r.clone())).into_owned();
                let tag = self
                    .dat
                    .find_exact(&word)
                    .map(|elem| elem.tag().to_string())
                    .unwrap_or_else(|| "x".to_string());
                (word, tag)
            })
            .collect()
    }

    /// Top `top_n` TF×IDF keywords in `text`. Returns an empty vector and
    /// logs a warning if no keyword extractor was attached — extraction is
    /// a cut-like operation and must not fail by design (spec.md §7).
    pub fn extract(&self, text: &str, top_n: usize) -> Vec<(String, f64)> {
        match &self.keyword_extractor {
            Some(extractor) => extractor
                .extract(&self.mix(), text, top_n)
                .into_iter()
                .map(|Keyword { word, weight, .. }| (word, weight))
                .collect(),
            None => {
                warn!("Jieba::extract called without a keyword extractor attached");
                Vec::new()
            }
        }
    }
}

fn byte_range(runes: &RuneString, range: std::ops::Range<usize>) -> (usize, usize) {
    if range.start == range.end {
        let offset = runes
            .runes()
            .get(range.start)
            .map(|r| r.byte_offset as usize)
            .unwrap_or_else(|| runes.bytes().len());
        return (offset, offset);
    }
    let start = runes.runes()[range.start].byte_offset as usize;
    let last = &runes.runes()[range.end - 1];
    let end = last.byte_offset as usize + last.byte_len as usize;
    (start, end)
}
