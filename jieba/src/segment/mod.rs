//! The five cut strategies, composed from the DAT/HMM primitives in
//! `jieba-core` (spec.md §4.5, §9's "small capability interface").

pub mod full;
pub mod hmm;
pub mod mix;
pub mod mp;
pub mod query;

use std::ops::Range;

use jieba_core::RuneString;

/// Common shape of every cut strategy: given a rune slice and a range into
/// it, produce the half-open word spans that partition that range.
/// `with_hmm` only changes behavior for [`mix::MixSegment`] and
/// [`query::QuerySegment`], which route single-character, non-user-dict
/// spans through the HMM when set; the other strategies ignore it.
pub trait Segmenter {
    fn cut(&self, runes: &RuneString, range: Range<usize>, with_hmm: bool) -> Vec<Range<usize>>;
}
