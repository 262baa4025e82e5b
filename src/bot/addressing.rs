//! Detects whether a message is directed at the bot.

/// How a message addresses the bot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Addressing {
    /// The first word contains the bot's name.
    pub paged: bool,
    /// A later word contains the bot's name.
    pub named: bool,
    /// The message with a paging first word removed.
    pub effective_message: String,
}

impl Addressing {
    pub fn is_addressed(&self) -> bool {
        self.paged || self.named
    }
}

/// Case-insensitive name search over the message's words.
///
/// When the first word pages the bot and more words follow, the paging word
/// is dropped from the effective message. An empty name never matches.
pub fn detect(message: &str, bot_name: &str) -> Addressing {
    let name = bot_name.trim().to_lowercase();
    let mut addressing = Addressing {
        paged: false,
        named: false,
        effective_message: message.to_string(),
    };

    if name.is_empty() {
        return addressing;
    }

    for (index, word) in message.split_whitespace().enumerate() {
        let contains_name = word.to_lowercase().contains(&name);
        if index == 0 {
            addressing.paged = contains_name;
        } else if contains_name {
            addressing.named = true;
        }
    }

    if addressing.paged {
        let trimmed = message.trim_start();
        if let Some(split) = trimmed.find(char::is_whitespace) {
            let rest = trimmed[split..].trim_start();
            if !rest.is_empty() {
                addressing.effective_message = rest.to_string();
            }
        }
    }

    addressing
}
