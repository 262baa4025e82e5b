//! Message normalization before learning and reply composition.

use regex::Regex;
use std::sync::LazyLock;

static URI_PATTERN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\S*://\S*").unwrap());
static EMOTICON_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(:[DPO]|D:|[X|x]D|[Oo][_-][Oo])").unwrap());
static MENTION_PATTERN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[@#]\S*").unwrap());

/// Tokens whose casing carries meaning: URIs, emoticons, mentions and hashtags.
pub fn is_case_sensitive(token: &str) -> bool {
    URI_PATTERN.is_match(token) || EMOTICON_PATTERN.is_match(token) || MENTION_PATTERN.is_match(token)
}

/// Strip double quotes, collapse whitespace and lowercase every token that
/// isn't case sensitive.
pub fn normalize(message: &str) -> String {
    message
        .replace('"', "")
        .split_whitespace()
        .map(|token| {
            if is_case_sensitive(token) {
                token.to_string()
            } else {
                token.to_lowercase()
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
