//! Primitives shared by every segmentation strategy: UTF-8 rune indexing,
//! the double-array trie dictionary cache, the dictionary loader, and the
//! HMM model with its Viterbi decoder.
//!
//! Higher-level strategy composition (MP/HMM/Mix/Full/Query cuts, keyword
//! extraction) lives in the `jieba` crate; this crate only owns data and
//! the algorithms that operate directly on it.

pub mod dat;
pub mod dict;
pub mod error;
pub mod hmm;
pub mod rune;

pub use dat::cache::DatMemElem;
pub use dat::{Dat, DatElement, DagCell};
pub use dict::{Dictionary, UserWordWeightOption};
pub use error::{JiebaError, JiebaErrorKind, JiebaResult};
pub use hmm::HmmModel;
pub use rune::{Rune, RuneString};
