//! Chinese word segmentation over a double-array trie dictionary, an HMM
//! fallback for unknown spans, and the five composite cut strategies, plus
//! TF×IDF keyword extraction.
//!
//! [`Jieba`] is the entry point most callers want; the `segment` module
//! exposes the individual strategies for callers who need one directly.

mod dag;
pub mod jieba;
pub mod keyword;
pub mod segment;

pub use jieba::Jieba;
pub use keyword::{Keyword, KeywordExtractor};
pub use segment::full::FullSegment;
pub use segment::hmm::HmmSegment;
pub use segment::mix::MixSegment;
pub use segment::mp::MpSegment;
pub use segment::query::QuerySegment;
pub use segment::Segmenter;
