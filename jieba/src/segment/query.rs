//! Query segmentation: Mix first, then 2- and 3-character sliding
//! sub-words of every Mix word longer than 2/3 characters that exist in
//! the dictionary, emitted ahead of the parent word (spec.md §4.5.5).

use std::ops::Range;

use jieba_core::{Dat, RuneString};

use crate::segment::mix::MixSegment;
use crate::segment::Segmenter;

pub struct QuerySegment<'a> {
    mix: MixSegment<'a>,
    dat: &'a Dat,
}

impl<'a> QuerySegment<'a> {
    pub fn new(mix: MixSegment<'a>, dat: &'a Dat) -> Self {
        QuerySegment { mix, dat }
    }
}

impl<'a> Segmenter for QuerySegment<'a> {
    fn cut(&self, runes: &RuneString, range: Range<usize>, with_hmm: bool) -> Vec<Range<usize>> {
        let mix_spans = self.mix.cut(runes, range, with_hmm);
        let mut result = Vec::with_capacity(mix_spans.len());

        for span in mix_spans {
            let len = span.end - span.start;

            if len > 2 {
                for i in span.start..span.end - 1 {
                    let sub = i..i + 2;
                    if self.dat.find_exact(bytes_of(runes, sub.clone())).is_some() {
                        result.push(sub);
                    }
                }
            }
            if len > 3 {
                for i in span.start..span.end - 2 {
                    let sub = i..i + 3;
                    if self.dat.find_exact(bytes_of(runes, sub.clone())).is_some() {
                        result.push(sub);
                    }
                }
            }

            result.push(span);
        }

        result
    }
}

fn bytes_of(runes: &RuneString, range: Range<usize>) -> &str {
    std::str::from_utf8(runes.encode_range(range)).unwrap_or("")
}

#[cfg(test)]
mod tests {
    use super::*;
    use jieba_core::{DatElement, HmmModel};
    use std::collections::HashSet;

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
        let cache_path = dir.path().join("query.dat_cache");
        let md5 = [b'8'; 32];
        let elements = vec![
            DatElement { word: "小明".into(), tag: "nr".into(), weight: -4.0 },
            DatElement { word: "硕士".into(), tag: "n".into(), weight: -4.5 },
            DatElement { word: "毕业".into(), tag: "v".into(), weight: -4.2 },
            DatElement { word: "于".into(), tag: "p".into(), weight: -3.0 },
            DatElement { word: "中国".into(), tag: "ns".into(), weight: -5.0 },
            DatElement { word: "中国科学院".into(), tag: "nt".into(), weight: -8.0 },
            DatElement { word: "科学院".into(), tag: "n".into(), weight: -6.0 },
            DatElement { word: "科学".into(), tag: "n".into(), weight: -4.0 },
            DatElement { word: "学院".into(), tag: "n".into(), weight: -4.1 },
            DatElement { word: "计算所".into(), tag: "n".into(), weight: -7.0 },
        ];
        let dat = Dat::build(elements, -100.0, &cache_path, &md5).unwrap();
        (dir, dat)
    }

    #[test]
    fn query_cut_adds_subwords_of_long_mix_words() {
        let (_dir, dat) = build_dat();
        let hmm_dir = tempfile::tempdir().unwrap();
        let model = HmmModel::load(&write_model(&hmm_dir)).unwrap();
        let user_single_char_set = HashSet::new();
        let mix = MixSegment::new(&dat, 5, &model, &user_single_char_set);
        let query = QuerySegment::new(mix, &dat);

        let runes = RuneString::from_str("小明硕士毕业于中国科学院计算所");
        let spans = query.cut(&runes, 0..runes.len(), true);
        let words: Vec<String> = spans
            .iter()
            .map(|r| String::from_utf8(runes.encode_range(r.clone()).to_vec()).unwrap())
            .collect();

        assert!(words.contains(&"中国".to_string()));
        assert!(words.contains(&"科学".to_string()));
        assert!(words.contains(&"学院".to_string()));
        assert!(words.contains(&"科学院".to_string()));
        assert!(words.contains(&"中国科学院".to_string()));
    }
}
