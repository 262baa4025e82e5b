//! Markov chain text model - tokenization, chain construction, sampling.

pub mod chain;
pub mod text;

pub use chain::{ChainModel, MergeError, SampleOptions, BEGIN, END, MAX_WALK_TOKENS};
pub use text::{split_sentences, word_join, word_split};
