//! Full segmentation: every dictionary word of length ≥ 2 plus every
//! single-character position not yet covered (spec.md §4.5.4).

use std::ops::Range;

use jieba_core::{Dat, RuneString};

use crate::dag::build_dag;
use crate::segment::Segmenter;

pub struct FullSegment<'a> {
    dat: &'a Dat,
    max_word_len: usize,
}

impl<'a> FullSegment<'a> {
    pub fn new(dat: &'a Dat, max_word_len: usize) -> Self {
        FullSegment { dat, max_word_len }
    }
}

impl<'a> Segmenter for FullSegment<'a> {
    fn cut(&self, runes: &RuneString, range: Range<usize>, _with_hmm: bool) -> Vec<Range<usize>> {
        let dag = build_dag(self.dat, runes, range.clone(), self.max_word_len);
        let mut spans = Vec::new();
        let mut max_word_end_pos = 0usize;

        for (i, cell) in dag.iter().enumerate() {
            for &(next, elem) in &cell.nexts {
                let word_len = next - i;
                let is_not_covered_single_word = cell.nexts.len() == 1 && max_word_end_pos <= i;
                let is_oov = elem.is_none();

                if is_not_covered_single_word || (!is_oov && word_len >= 2) {
                    spans.push((range.start + i)..(range.start + next));
                }
                max_word_end_pos = max_word_end_pos.max(next);
            }
        }

        spans
    }
}
