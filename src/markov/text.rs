//! Sentence splitting and whitespace tokenization.

use regex::Regex;
use std::sync::LazyLock;

/// Sentences with quotes, brackets or dangling apostrophes make for broken
/// output once recombined, so they are never learned.
static REJECT_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(^')|('$)|\s'|'\s|["()\[\]]"#).unwrap());

/// Split free text into sentences.
///
/// Every line break ends a sentence. Within a line, `.`, `!` or `?` followed
/// by whitespace and an uppercase letter also ends one.
pub fn split_sentences(text: &str) -> Vec<&str> {
    let mut sentences = Vec::new();

    for line in text.lines() {
        let chars: Vec<(usize, char)> = line.char_indices().collect();
        let mut start = 0;

        for i in 0..chars.len() {
            let (idx, c) = chars[i];
            if !matches!(c, '.' | '!' | '?') {
                continue;
            }

            let mut j = i + 1;
            if j >= chars.len() || !chars[j].1.is_whitespace() {
                continue;
            }
            while j < chars.len() && chars[j].1.is_whitespace() {
                j += 1;
            }

            if j < chars.len() && chars[j].1.is_uppercase() {
                sentences.push(line[start..idx + c.len_utf8()].trim());
                start = chars[j].0;
            }
        }

        sentences.push(line[start..].trim());
    }

    sentences.retain(|s| !s.is_empty());
    sentences
}

/// Split a sentence into whitespace-separated tokens.
pub fn word_split(sentence: &str) -> Vec<String> {
    sentence.split_whitespace().map(str::to_string).collect()
}

/// Join tokens with single spaces. Inverse of [`word_split`] for tokens
/// without embedded whitespace.
pub fn word_join<S: AsRef<str>>(tokens: &[S]) -> String {
    let mut out = String::new();
    for (i, token) in tokens.iter().enumerate() {
        if i > 0 {
            out.push(' ');
        }
        out.push_str(token.as_ref());
    }
    out
}

/// Whether a sentence is fit to be learned.
pub fn accepts_sentence(sentence: &str) -> bool {
    !sentence.trim().is_empty() && !REJECT_PATTERN.is_match(sentence)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_on_lines() {
        let sentences = split_sentences("hello there\n\nhow are you\n");
        assert_eq!(sentences, vec!["hello there", "how are you"]);
    }

    #[test]
    fn test_split_on_terminal_punctuation() {
        let sentences = split_sentences("I went home. Then I slept! Did you?");
        assert_eq!(sentences, vec!["I went home.", "Then I slept!", "Did you?"]);
    }

    #[test]
    fn test_no_split_before_lowercase() {
        // Normalized chat text is lowercase, a single message stays one sentence
        let sentences = split_sentences("see you at 5 p.m. tomorrow. ok");
        assert_eq!(sentences, vec!["see you at 5 p.m. tomorrow. ok"]);
    }

    #[test]
    fn test_word_split_collapses_whitespace() {
        assert_eq!(word_split("  a\tb   c \n"), vec!["a", "b", "c"]);
        assert!(word_split("   ").is_empty());
    }

    #[test]
    fn test_join_split_round_trip() {
        let tokens = vec!["the", "quick", ":D", "http://x.y/z", "fox."];
        let joined = word_join(&tokens);
        assert_eq!(joined, "the quick :D http://x.y/z fox.");
        assert_eq!(word_join(&word_split(&joined)), joined);
        assert_eq!(word_join::<&str>(&[]), "");
    }

    #[test]
    fn test_accepts_sentence() {
        assert!(accepts_sentence("don't stop me now"));
        assert!(!accepts_sentence("he said \"hi\""));
        assert!(!accepts_sentence("a (parenthetical) remark"));
        assert!(!accepts_sentence("'quoted start"));
        assert!(!accepts_sentence("dangling end'"));
        assert!(!accepts_sentence("   "));
    }
}
