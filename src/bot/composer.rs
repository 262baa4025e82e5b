//! Reply decision and keyword-guided sentence composition.

use rand::Rng;
use rand::seq::SliceRandom;
use regex::Regex;
use tracing::debug;

use crate::config::EngineConfig;
use crate::markov::{ChainModel, SampleOptions, word_split};

/// Walks per seeded sampling attempt in the fallback phase.
const START_TRIES: usize = 10;

/// Roll against the reply rate. Messages that address the bot use the
/// bot-name rate instead.
pub fn should_reply<R: Rng + ?Sized>(config: &EngineConfig, addressed: bool, rng: &mut R) -> bool {
    let threshold = if addressed {
        config.bot_name_reply_rate
    } else {
        config.reply_rate
    };
    rng.gen_range(0.0..100.0) < threshold
}

/// Compose a reply to an already normalized message.
///
/// Without keywords the first sampled sentence is taken, even for a message
/// with no words left after normalization.
/// With keywords enabled, sampled sentences must contain one of the
/// message's words; if none does within the try budget, sentences seeded
/// with each keyword are tried instead. A reply identical to the message is
/// never returned.
pub fn compose<R: Rng + ?Sized>(
    model: &ChainModel,
    config: &EngineConfig,
    message: &str,
    rng: &mut R,
) -> Option<String> {
    let words = word_split(message);
    if config.use_keywords && words.is_empty() {
        return None;
    }

    let keywords = if config.use_keywords {
        pick_keywords(&words, config.try_all_words_for_key, rng)
    } else {
        Vec::new()
    };

    let reply = sample_with_keywords(model, config, &keywords, rng)
        .or_else(|| sample_from_keywords(model, config, &keywords, rng))?;

    if reply == message {
        debug!("Dropping reply that echoes the message");
        return None;
    }
    Some(reply)
}

fn pick_keywords<R: Rng + ?Sized>(words: &[String], try_all: bool, rng: &mut R) -> Vec<String> {
    let key_phrase = words.choose(rng).cloned();
    if try_all {
        let mut shuffled = words.to_vec();
        shuffled.shuffle(rng);
        shuffled
    } else {
        key_phrase.into_iter().collect()
    }
}

fn sample_with_keywords<R: Rng + ?Sized>(
    model: &ChainModel,
    config: &EngineConfig,
    keywords: &[String],
    rng: &mut R,
) -> Option<String> {
    let options = config.sample_options();
    let patterns: Vec<Regex> = keywords.iter().filter_map(|w| word_pattern(w)).collect();

    for attempt in 1..=config.sentence_with_key_tries {
        let Some(sentence) = model.sample(&options, rng) else {
            continue;
        };
        if !config.use_keywords {
            return Some(sentence);
        }
        if patterns.iter().any(|p| p.is_match(&sentence)) {
            debug!("Keyword sentence found after {} attempt(s)", attempt);
            return Some(sentence);
        }
    }

    None
}

fn sample_from_keywords<R: Rng + ?Sized>(
    model: &ChainModel,
    config: &EngineConfig,
    keywords: &[String],
    rng: &mut R,
) -> Option<String> {
    let options = SampleOptions {
        tries: START_TRIES,
        ..config.sample_options()
    };
    keywords
        .iter()
        .find_map(|word| model.sample_from_start(word, &options, rng))
}

/// Case-insensitive whole-word matcher for `word`.
fn word_pattern(word: &str) -> Option<Regex> {
    Regex::new(&format!(r"(?i)\b{}\b", regex::escape(word))).ok()
}

/// Whether `sentence` contains `word` as a whole word, ignoring case.
pub fn contains_word(sentence: &str, word: &str) -> bool {
    word_pattern(word).is_some_and(|p| p.is_match(sentence))
}
