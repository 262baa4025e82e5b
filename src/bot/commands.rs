//! Introspection commands the engine answers directly.

/// Commands understood by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Statistics,
    Version,
}

impl Command {
    pub const ALL: [Command; 2] = [Command::Statistics, Command::Version];

    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "statistics" => Some(Self::Statistics),
            "version" => Some(Self::Version),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Statistics => "statistics",
            Self::Version => "version",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Self::Statistics => "List statistics for markov instance",
            Self::Version => "Get current version",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse() {
        assert_eq!(Command::parse("statistics"), Some(Command::Statistics));
        assert_eq!(Command::parse(" Version "), Some(Command::Version));
        assert_eq!(Command::parse("shutdown"), None);
        assert_eq!(Command::parse(""), None);
    }

    #[test]
    fn test_names_round_trip() {
        for command in Command::ALL {
            assert_eq!(Command::parse(command.name()), Some(command));
            assert!(!command.description().is_empty());
        }
    }
}
