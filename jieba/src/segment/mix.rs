//! Mix segmentation: MP first, then the HMM decides maximal runs of
//! single-character, non-user-dict MP output (spec.md §4.5.3).

use std::collections::HashSet;
use std::ops::Range;

use jieba_core::{Dat, HmmModel, RuneString};

use crate::segment::hmm::HmmSegment;
use crate::segment::mp::MpSegment;
use crate::segment::Segmenter;

pub struct MixSegment<'a> {
    mp: MpSegment<'a>,
    hmm: HmmSegment<'a>,
    user_single_char_set: &'a HashSet<u32>,
}

impl<'a> MixSegment<'a> {
    pub fn new(dat: &'a Dat, max_word_len: usize, model: &'a HmmModel, user_single_char_set: &'a HashSet<u32>) -> Self {
        MixSegment {
            mp: MpSegment::new(dat, max_word_len),
            hmm: HmmSegment::new(model),
            user_single_char_set,
        }
    }

    fn is_user_single_char(&self, runes: &RuneString, span: &Range<usize>) -> bool {
        span.end - span.start == 1 && self.user_single_char_set.contains(&runes.runes()[span.start].codepoint)
    }
}

impl<'a> Segmenter for MixSegment<'a> {
    fn cut(&self, runes: &RuneString, range: Range<usize>, with_hmm: bool) -> Vec<Range<usize>> {
        let mp_spans = self.mp.cut(runes, range, with_hmm);
        if !with_hmm {
            return mp_spans;
        }

        let mut result = Vec::with_capacity(mp_spans.len());
        let mut run_start: Option<usize> = None;

        let flush_run = |run_start: &mut Option<usize>, run_end: usize, result: &mut Vec<Range<usize>>| {
            if let Some(start) = run_start.take() {
                result.extend(self.hmm.cut(runes, start..run_end, true));
            }
        };

        for span in &mp_spans {
            let is_oov_single_char = span.end - span.start == 1 && !self.is_user_single_char(runes, span);
            if is_oov_single_char {
                if run_start.is_none() {
                    run_start = Some(span.start);
                }
            } else {
                flush_run(&mut run_start, span.start, &mut result);
                result.push(span.clone());
            }
        }
        flush_run(&mut run_start, range_end(&mp_spans), &mut result);

        result
    }
}

fn range_end(spans: &[Range<usize>]) -> usize {
    spans.last().map(|r| r.end).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use jieba_core::DatElement;

    fn write_model(dir: &tempfile::TempDir) -> std::path::PathBuf {
        let path = dir.path().join("hmm_model.utf8");
        let content = "\
-0.26 -3.14e+100 -3.14e+100 -1.47\n\
-0.51 -0.91 -3.14e+100 -3.14e+100\n\
-3.14e+100 -3.14e+100 -0.34 -1.26\n\
-3.14e+100 -3.14e+100 -0.35 -1.22\n\
-3.6 -3.6 -2.6 -1.9\n\
杭:-2.0,研:-2.1\n\
研:-2.0,杭:-2.1\n\
杭:-2.5,研:-2.5\n\
杭:-3.0,研:-3.0\n";
        std::fs::write(&path, content).unwrap();
        path
    }

    fn build_dat() -> (tempfile::TempDir, Dat) {
        let dir = tempfile::tempdir().unwrap();
        let cache_path = dir.path().join("mix.dat_cache");
        let md5 = [b'6'; 32];
        let elements = vec![
            DatElement { word: "他".into(), tag: "r".into(), weight: -3.0 },
            DatElement { word: "来到".into(), tag: "v".into(), weight: -4.0 },
            DatElement { word: "了".into(), tag: "ul".into(), weight: -2.5 },
            DatElement { word: "网易".into(), tag: "nz".into(), weight: -5.0 },
            DatElement { word: "大厦".into(), tag: "n".into(), weight: -4.5 },
        ];
        let dat = Dat::build(elements, -100.0, &cache_path, &md5).unwrap();
        (dir, dat)
    }

    #[test]
    fn oov_run_is_resolved_through_hmm() {
        let (_dir, dat) = build_dat();
        let hmm_dir = tempfile::tempdir().unwrap();
        let model = HmmModel::load(&write_model(&hmm_dir)).unwrap();
        let user_single_char_set = HashSet::new();
        let mix = MixSegment::new(&dat, 5, &model, &user_single_char_set);

        let runes = RuneString::from_str("他来到了网易杭研大厦");
        let spans = mix.cut(&runes, 0..runes.len(), true);
        let words: Vec<String> = spans
            .iter()
            .map(|r| String::from_utf8(runes.encode_range(r.clone()).to_vec()).unwrap())
            .collect();
        assert_eq!(
            words,
            vec!["他", "来到", "了", "网易", "杭研", "大厦"]
        );
        let mut expected_start = 0;
        for span in &spans {
            assert_eq!(span.start, expected_start);
            expected_start = span.end;
        }
        assert_eq!(expected_start, runes.len());
    }

    #[test]
    fn without_hmm_falls_back_to_plain_mp() {
        let (_dir, dat) = build_dat();
        let hmm_dir = tempfile::tempdir().unwrap();
        let model = HmmModel::load(&write_model(&hmm_dir)).unwrap();
        let user_single_char_set = HashSet::new();
        let mix = MixSegment::new(&dat, 5, &model, &user_single_char_set);

        let runes = RuneString::from_str("他来到了");
        let mp = MpSegment::new(&dat, 5);
        assert_eq!(
            mix.cut(&runes, 0..runes.len(), false),
            mp.cut(&runes, 0..runes.len(), false)
        );
    }

    #[test]
    fn user_single_char_word_is_not_sent_through_hmm() {
        let (_dir, dat) = build_dat();
        let hmm_dir = tempfile::tempdir().unwrap();
        let model = HmmModel::load(&write_model(&hmm_dir)).unwrap();
        let mut user_single_char_set = HashSet::new();
        user_single_char_set.insert('了' as u32);
        let mix = MixSegment::new(&dat, 5, &model, &user_single_char_set);

        let runes = RuneString::from_str("了");
        let spans = mix.cut(&runes, 0..runes.len(), true);
        assert_eq!(spans, vec![0..1]);
    }
}
