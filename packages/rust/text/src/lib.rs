//! Text normalization and word-frequency statistics.
//!
//! - [`normalize`] turns raw page text into a [`TokenSequence`] of content words
//! - [`FrequencyTable`] folds any number of sequences into word counts

pub mod frequency;
pub mod normalize;

pub use frequency::FrequencyTable;
pub use normalize::{MAX_DROPPED_LEN, STOP_WORDS, TokenSequence, is_stop_word, normalize};
