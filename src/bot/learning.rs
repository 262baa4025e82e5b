//! Incremental learning and corpus statistics.

use std::collections::HashSet;
use std::fmt;
use std::sync::{Arc, Mutex};
use tracing::{debug, error};

use crate::bot::persist::CorpusStore;
use crate::markov::ChainModel;

/// Owns the live chain model and folds new text into it.
pub struct Learner {
    model: ChainModel,
    corpus: Arc<Mutex<CorpusStore>>,
    stats: Statistics,
    enabled: bool,
}

impl Learner {
    pub fn new(model: ChainModel, corpus: Arc<Mutex<CorpusStore>>, enabled: bool) -> Self {
        let line_count = corpus.lock().expect("corpus lock poisoned").len();
        let stats = Statistics::compute(&model, line_count);
        Self {
            model,
            corpus,
            stats,
            enabled,
        }
    }

    pub fn model(&self) -> &ChainModel {
        &self.model
    }

    pub fn statistics(&self) -> Statistics {
        self.stats
    }

    /// Learn `text`: build a chain from it, record its sentences as corpus
    /// lines and swap in the merge of the old and new chains.
    pub fn ingest(&mut self, text: &str) {
        if !self.enabled {
            return;
        }

        let learned = ChainModel::build(text, self.model.order());
        if learned.sentence_count() == 0 {
            debug!("Nothing learnable in {:?}", text);
            return;
        }

        let merged = match self.model.merge(&learned) {
            Ok(merged) => merged,
            Err(e) => {
                error!("Failed to merge learned text: {}", e);
                return;
            }
        };

        let line_count = {
            let mut corpus = self.corpus.lock().expect("corpus lock poisoned");
            corpus.extend(learned.lines());
            corpus.len()
        };

        self.model = merged;
        self.stats = Statistics::compute(&self.model, line_count);
        debug!("Learned {} sentence(s), {} lines total", learned.sentence_count(), line_count);
    }
}

/// Corpus-wide counters. Always recomputed from scratch, never patched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Statistics {
    pub line_count: usize,
    pub word_count: usize,
    pub unique_word_count: usize,
    pub order: usize,
    pub context_count: usize,
}

impl Statistics {
    /// Scan every token of every learned sentence.
    pub fn compute(model: &ChainModel, line_count: usize) -> Self {
        let mut word_count = 0;
        let mut unique = HashSet::new();
        for sentence in model.parsed_sentences() {
            for word in sentence {
                word_count += 1;
                unique.insert(word.as_str());
            }
        }

        Self {
            line_count,
            word_count,
            unique_word_count: unique.len(),
            order: model.order(),
            context_count: model.context_count(),
        }
    }

    /// Human-readable summary, one line per entry.
    pub fn summary(&self) -> [String; 3] {
        [
            format!(
                "I know {} lines containing a total of {} words.",
                self.line_count, self.word_count
            ),
            format!("{} of those words are unique.", self.unique_word_count),
            format!(
                "We are currently using a state size of {} which generated {} contexts.",
                self.order, self.context_count
            ),
        ]
    }
}

impl fmt::Display for Statistics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.summary().join("\n"))
    }
}
