//! HMM-only segmentation: splits at the ASCII boundary, decodes non-ASCII
//! runs with Viterbi, and cuts ASCII runs with the sequential-letter and
//! numbers rules (spec.md §4.5.2).

use std::ops::Range;

use jieba_core::hmm::{cuts_from_status, viterbi};
use jieba_core::{HmmModel, RuneString};

use crate::segment::Segmenter;

pub struct HmmSegment<'a> {
    model: &'a HmmModel,
}

impl<'a> HmmSegment<'a> {
    pub fn new(model: &'a HmmModel) -> Self {
        HmmSegment { model }
    }
}

fn is_ascii_letter(c: u32) -> bool {
    (0x41..=0x5a).contains(&c) || (0x61..=0x7a).contains(&c)
}

fn is_ascii_digit(c: u32) -> bool {
    (0x30..=0x39).contains(&c)
}

/// `[A-Za-z][A-Za-z0-9]*`, starting at `start`. Returns the index just past
/// the match, or `start` if the rune at `start` isn't a letter.
fn sequential_letter_rule(codepoints: &[u32], start: usize) -> usize {
    if start >= codepoints.len() || !is_ascii_letter(codepoints[start]) {
        return start;
    }
    let mut i = start + 1;
    while i < codepoints.len() && (is_ascii_letter(codepoints[i]) || is_ascii_digit(codepoints[i])) {
        i += 1;
    }
    i
}

/// `[0-9][0-9.]*`, starting at `start`.
fn numbers_rule(codepoints: &[u32], start: usize) -> usize {
    if start >= codepoints.len() || !is_ascii_digit(codepoints[start]) {
        return start;
    }
    let mut i = start + 1;
    while i < codepoints.len() && (is_ascii_digit(codepoints[i]) || codepoints[i] == b'.' as u32) {
        i += 1;
    }
    i
}

impl<'a> Segmenter for HmmSegment<'a> {
    fn cut(&self, runes: &RuneString, range: Range<usize>, _with_hmm: bool) -> Vec<Range<usize>> {
        let codepoints: Vec<u32> = runes.runes()[range.clone()].iter().map(|r| r.codepoint).collect();
        let mut spans = Vec::new();

        let mut left = 0usize;
        let mut right = 0usize;
        while right < codepoints.len() {
            if codepoints[right] < 0x80 {
                if left != right {
                    internal_cut(self.model, &codepoints[left..right], range.start + left, &mut spans);
                }
                left = right;

                let mut next = sequential_letter_rule(&codepoints, left);
                if next == left {
                    next = numbers_rule(&codepoints, left);
                }
                if next == left {
                    next = left + 1;
                }
                spans.push((range.start + left)..(range.start + next));
                left = next;
                right = next;
            } else {
                right += 1;
            }
        }
        if left != right {
            internal_cut(self.model, &codepoints[left..right], range.start + left, &mut spans);
        }

        spans
    }
}

fn internal_cut(model: &HmmModel, codepoints: &[u32], absolute_offset: usize, out: &mut Vec<Range<usize>>) {
    let status = viterbi(model, codepoints);
    for r in cuts_from_status(&status) {
        out.push((absolute_offset + r.start)..(absolute_offset + r.end));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_model(dir: &tempfile::TempDir) -> std::path::PathBuf {
        let path = dir.path().join("hmm_model.utf8");
        let content = "\
-0.26 -3.14e+100 -3.14e+100 -1.47\n\
-0.51 -0.91 -3.14e+100 -3.14e+100\n\
-3.14e+100 -3.14e+100 -0.34 -1.26\n\
-3.14e+100 -3.14e+100 -0.35 -1.22\n\
-3.6 -3.6 -2.6 -1.9\n\
他:-2.0,来:-2.2,网:-2.3,杭:-3.0,大:-2.1\n\
了:-2.0,到:-2.1,易:-2.2,研:-3.0,厦:-2.1\n\
到:-2.0,网:-2.1\n\
他:-1.0,了:-1.0,网:-1.2\n";
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn splits_ascii_letters_and_digits_from_cjk() {
        let dir = tempfile::tempdir().unwrap();
        let model = HmmModel::load(&write_model(&dir)).unwrap();
        let hmm = HmmSegment::new(&model);
        let runes = RuneString::from_str("abc123");
        let spans = hmm.cut(&runes, 0..runes.len(), true);
        assert_eq!(spans, vec![0..6]);
    }

    #[test]
    fn cuts_partition_mixed_ascii_and_cjk() {
        let dir = tempfile::tempdir().unwrap();
        let model = HmmModel::load(&write_model(&dir)).unwrap();
        let hmm = HmmSegment::new(&model);
        let runes = RuneString::from_str("ab他来");
        let spans = hmm.cut(&runes, 0..runes.len(), true);
        let mut expected_start = 0;
        for span in &spans {
            assert_eq!(span.start, expected_start);
            expected_start = span.end;
        }
        assert_eq!(expected_start, runes.len());
    }
}
