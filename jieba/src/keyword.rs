//! TF×IDF keyword extraction over a Mix-cut sentence (spec.md §4.6).

use std::collections::{HashMap, HashSet};
use std::path::Path;

use jieba_core::error::{JiebaErrorKind, JiebaResult};
use jieba_core::RuneString;

use crate::segment::mix::MixSegment;
use crate::segment::Segmenter;

/// One ranked result: the token, its aggregated `tf * idf` weight, and
/// every byte offset at which it occurred in the source sentence.
#[derive(Debug, Clone, PartialEq)]
pub struct Keyword {
    pub word: String,
    pub weight: f64,
    pub offsets: Vec<usize>,
}

pub struct KeywordExtractor {
    idf: HashMap<String, f64>,
    idf_average: f64,
    stop_words: HashSet<String>,
}

impl KeywordExtractor {
    /// `idf_path`: `word<SP>idf_value` per line. `stop_words_path`: one
    /// word per line.
    pub fn load(idf_path: &Path, stop_words_path: &Path) -> JiebaResult<KeywordExtractor> {
        let idf_content = std::fs::read_to_string(idf_path)
            .map_err(|err| JiebaErrorKind::OpenFileFailed.with_error(err))?;
        let mut idf = HashMap::new();
        for line in idf_content.lines() {
            if line.trim().is_empty() {
                continue;
            }
            let mut fields = line.split_whitespace();
            let word = match fields.next() {
                Some(w) => w,
                None => {
                    log::warn!("skipping empty idf line");
                    continue;
                }
            };
            let value: f64 = match fields.next().and_then(|v| v.parse().ok()) {
                Some(v) => v,
                None => {
                    log::warn!("skipping malformed idf line: {:?}", line);
                    continue;
                }
            };
            idf.insert(word.to_string(), value);
        }
        if idf.is_empty() {
            return Err(JiebaErrorKind::ValueError.with_error(anyhow::anyhow!("empty idf dictionary")));
        }
        let idf_average = idf.values().sum::<f64>() / idf.len() as f64;

        let stop_words_content = std::fs::read_to_string(stop_words_path)
            .map_err(|err| JiebaErrorKind::OpenFileFailed.with_error(err))?;
        let stop_words = stop_words_content
            .lines()
            .map(|l| l.trim().to_string())
            .filter(|l| !l.is_empty())
            .collect();

        Ok(KeywordExtractor { idf, idf_average, stop_words })
    }

    /// Mix-cuts `sentence`, drops single-character tokens and stop words,
    /// aggregates remaining tokens by term frequency, multiplies by IDF
    /// (falling back to the corpus average when a token is unseen), and
    /// returns the top `top_n` by weight descending. If the running byte
    /// offset doesn't land on `sentence.len()` once the cut is consumed,
    /// logs the mismatch and returns an empty result rather than panicking.
    pub fn extract(&self, mix: &MixSegment, sentence: &str, top_n: usize) -> Vec<Keyword> {
        let runes = RuneString::from_str(sentence);
        let spans = mix.cut(&runes, 0..runes.len(), true);

        let mut wordmap: HashMap<String, (f64, Vec<usize>)> = HashMap::new();
        let mut byte_offset = 0usize;
        for span in &spans {
            let bytes = runes.encode_range(span.clone());
            let word = String::from_utf8_lossy(bytes).into_owned();
            let offset = byte_offset;
            byte_offset += bytes.len();

            if span.end - span.start <= 1 || self.stop_words.contains(&word) {
                continue;
            }
            let entry = wordmap.entry(word).or_insert((0.0, Vec::new()));
            entry.0 += 1.0;
            entry.1.push(offset);
        }
        if byte_offset != sentence.len() {
            log::error!("mix cut did not partition the sentence: offset accounting mismatch");
            return Vec::new();
        }

        let mut keywords: Vec<Keyword> = wordmap
            .into_iter()
            .map(|(word, (tf, offsets))| {
                let idf = *self.idf.get(&word).unwrap_or(&self.idf_average);
                Keyword { word, weight: tf * idf, offsets }
            })
            .collect();

        keywords.sort_by(|a, b| b.weight.partial_cmp(&a.weight).unwrap_or(std::cmp::Ordering::Equal));
        keywords.truncate(top_n);
        keywords
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jieba_core::{Dat, DatElement, HmmModel};

    fn write_idf(dir: &tempfile::TempDir) -> std::path::PathBuf {
        let path = dir.path().join("idf.utf8");
        std::fs::write(
            &path,
            "拖拉机 8.5\n学院 6.0\n手扶拖拉机 9.0\n专业 5.0\n",
        )
        .unwrap();
        path
    }

    fn write_stop_words(dir: &tempfile::TempDir) -> std::path::PathBuf {
        let path = dir.path().join("stop_words.utf8");
        std::fs::write(&path, "我\n是\n的\n").unwrap();
        path
    }

    fn write_model(dir: &tempfile::TempDir) -> std::path::PathBuf {
        let path = dir.path().join("hmm_model.utf8");
        let content = "\
-0.26 -3.14e+100 -3.14e+100 -1.47\n\
-0.51 -0.91 -3.14e+100 -3.14e+100\n\
-3.14e+100 -3.14e+100 -0.34 -1.26\n\
-3.14e+100 -3.14e+100 -0.35 -1.22\n\
-3.6 -3.6 -2.6 -1.9\n\
a:-2.0\n\
a:-2.0\n\
a:-2.0\n\
a:-2.0\n";
        std::fs::write(&path, content).unwrap();
        path
    }

    fn build_dat() -> (tempfile::TempDir, Dat) {
        let dir = tempfile::tempdir().unwrap();
        let cache_path = dir.path().join("kw.dat_cache");
        let md5 = [b'9'; 32];
        let elements = vec![
            DatElement { word: "我".into(), tag: "r".into(), weight: -3.0 },
            DatElement { word: "是".into(), tag: "v".into(), weight: -3.0 },
            DatElement { word: "拖拉机".into(), tag: "n".into(), weight: -5.0 },
            DatElement { word: "学院".into(), tag: "n".into(), weight: -4.0 },
            DatElement { word: "手扶".into(), tag: "n".into(), weight: -4.3 },
            DatElement { word: "专业".into(), tag: "n".into(), weight: -4.5 },
            DatElement { word: "的".into(), tag: "uj".into(), weight: -2.0 },
        ];
        let dat = Dat::build(elements, -100.0, &cache_path, &md5).unwrap();
        (dir, dat)
    }

    #[test]
    fn top_keyword_is_highest_weighted_aggregate() {
        let (_dat_dir, dat) = build_dat();
        let hmm_dir = tempfile::tempdir().unwrap();
        let model = HmmModel::load(&write_model(&hmm_dir)).unwrap();
        let user_single_char_set = HashSet::new();
        let mix = MixSegment::new(&dat, 5, &model, &user_single_char_set);

        let idf_dir = tempfile::tempdir().unwrap();
        let extractor = KeywordExtractor::load(&write_idf(&idf_dir), &write_stop_words(&idf_dir)).unwrap();

        let results = extractor.extract(&mix, "我是拖拉机学院手扶拖拉机专业的", 5);
        assert!(!results.is_empty());
        assert_eq!(results[0].word, "拖拉机");
    }

    #[test]
    fn stop_words_and_single_chars_are_excluded() {
        let (_dat_dir, dat) = build_dat();
        let hmm_dir = tempfile::tempdir().unwrap();
        let model = HmmModel::load(&write_model(&hmm_dir)).unwrap();
        let user_single_char_set = HashSet::new();
        let mix = MixSegment::new(&dat, 5, &model, &user_single_char_set);

        let idf_dir = tempfile::tempdir().unwrap();
        let extractor = KeywordExtractor::load(&write_idf(&idf_dir), &write_stop_words(&idf_dir)).unwrap();

        let results = extractor.extract(&mix, "我是拖拉机学院手扶拖拉机专业的", 10);
        assert!(results.iter().all(|k| k.word != "我" && k.word != "是" && k.word != "的"));
    }

    #[test]
    fn malformed_idf_line_is_skipped_not_fatal() {
        let idf_dir = tempfile::tempdir().unwrap();
        let idf_path = idf_dir.path().join("idf.utf8");
        std::fs::write(&idf_path, "拖拉机 8.5\n只有一个字段\n学院 not_a_number\n专业 5.0\n").unwrap();

        let extractor = KeywordExtractor::load(&idf_path, &write_stop_words(&idf_dir)).unwrap();
        assert_eq!(extractor.idf.get("拖拉机"), Some(&8.5));
        assert_eq!(extractor.idf.get("专业"), Some(&5.0));
        assert!(!extractor.idf.contains_key("学院"));
    }
}
