//! Maximum-probability segmentation: DAG + right-to-left DP over dictionary
//! weights (spec.md §4.5.1).

use std::ops::Range;

use jieba_core::{Dat, DagCell, RuneString};

use crate::dag::{build_dag, run_mp_dp, walk_mp_path};
use crate::segment::Segmenter;

pub struct MpSegment<'a> {
    dat: &'a Dat,
    max_word_len: usize,
}

impl<'a> MpSegment<'a> {
    pub fn new(dat: &'a Dat, max_word_len: usize) -> Self {
        MpSegment { dat, max_word_len }
    }

    /// Builds and DPs the DAG, returning both the chosen word spans
    /// (absolute rune indices) and the raw DAG cells — callers like
    /// [`super::full::FullSegment`] want the DAG itself, not just the
    /// MP-optimal path through it.
    pub fn cut_with_dag(&self, runes: &RuneString, range: Range<usize>) -> (Vec<Range<usize>>, Vec<DagCell>) {
        let mut dag = build_dag(self.dat, runes, range.clone(), self.max_word_len);
        run_mp_dp(self.dat, &mut dag);
        let spans = walk_mp_path(&dag)
            .into_iter()
            .map(|r| (range.start + r.start)..(range.start + r.end))
            .collect();
        (spans, dag)
    }
}

impl<'a> Segmenter for MpSegment<'a> {
    fn cut(&self, runes: &RuneString, range: Range<usize>, _with_hmm: bool) -> Vec<Range<usize>> {
        self.cut_with_dag(runes, range).0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jieba_core::DatElement;

    fn build_dat() -> (tempfile::TempDir, Dat) {
        let dir = tempfile::tempdir().unwrap();
        let cache_path = dir.path().join("mp.dat_cache");
        let md5 = [b'5'; 32];
        let elements = vec![
            DatElement { word: "小明".into(), tag: "nr".into(), weight: -4.0 },
            DatElement { word: "硕士".into(), tag: "n".into(), weight: -4.5 },
            DatElement { word: "毕业".into(), tag: "v".into(), weight: -4.2 },
            DatElement { word: "于".into(), tag: "p".into(), weight: -3.0 },
            DatElement { word: "中国".into(), tag: "ns".into(), weight: -5.0 },
            DatElement { word: "中国科学院".into(), tag: "nt".into(), weight: -8.0 },
            DatElement { word: "科学院".into(), tag: "n".into(), weight: -6.0 },
            DatElement { word: "计算所".into(), tag: "n".into(), weight: -7.0 },
        ];
        let dat = Dat::build(elements, -100.0, &cache_path, &md5).unwrap();
        (dir, dat)
    }

    #[test]
    fn mp_cut_matches_canonical_sentence() {
        let (_dir, dat) = build_dat();
        let runes = RuneString::from_str("小明硕士毕业于中国科学院计算所");
        let mp = MpSegment::new(&dat, 5);
        let spans = mp.cut(&runes, 0..runes.len(), false);
        let words: Vec<String> = spans
            .iter()
            .map(|r| String::from_utf8(runes.encode_range(r.clone()).to_vec()).unwrap())
            .collect();
        assert_eq!(
            words,
            vec!["小明", "硕士", "毕业", "于", "中国科学院", "计算所"]
        );
    }

    #[test]
    fn cut_partitions_the_whole_range() {
        let (_dir, dat) = build_dat();
        let runes = RuneString::from_str("小明硕士毕业于中国科学院计算所");
        let mp = MpSegment::new(&dat, 5);
        let spans = mp.cut(&runes, 0..runes.len(), false);
        let mut expected_start = 0;
        for span in &spans {
            assert_eq!(span.start, expected_start);
            expected_start = span.end;
        }
        assert_eq!(expected_start, runes.len());
    }
}
