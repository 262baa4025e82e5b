use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::markov::{MAX_WALK_TOKENS, SampleOptions};

/// Errors that can occur when loading configuration.
#[derive(Debug)]
pub enum ConfigError {
    /// Failed to read the config file.
    ReadFile { path: PathBuf, source: std::io::Error },
    /// Failed to parse JSON.
    ParseJson { path: PathBuf, source: serde_json::Error },
    /// Validation error.
    Validation(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ReadFile { path, source } => {
                write!(f, "failed to read config file '{}': {}", path.display(), source)
            }
            Self::ParseJson { path, source } => {
                write!(f, "failed to parse config file '{}': {}", path.display(), source)
            }
            Self::Validation(msg) => write!(f, "config validation error: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::ReadFile { source, .. } => Some(source),
            Self::ParseJson { source, .. } => Some(source),
            Self::Validation(_) => None,
        }
    }
}

/// Settings consumed by the reply engine.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Markov state size: tokens of context per transition.
    pub order: usize,
    /// Chance (0-100) of replying to an ordinary message.
    pub reply_rate: f64,
    /// Chance (0-100) of replying when the bot is named or paged.
    #[serde(alias = "boot_name_reply_rate")]
    pub bot_name_reply_rate: f64,
    /// Steer replies toward words from the incoming message.
    pub use_keywords: bool,
    /// Accept any message word as keyword, not just one picked at random.
    pub try_all_words_for_key: bool,
    pub sentence_with_key_tries: usize,
    pub max_overlap_ratio: f64,
    pub max_overlap_total: usize,
    /// 0 = no cap. At most `MAX_WALK_TOKENS`.
    pub sentence_max_words: usize,
    /// Learn from incoming messages.
    pub learn: bool,
    pub save_interval_seconds: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            order: 2,
            reply_rate: 2.0,
            bot_name_reply_rate: 100.0,
            use_keywords: true,
            try_all_words_for_key: true,
            sentence_with_key_tries: 25,
            max_overlap_ratio: 0.7,
            max_overlap_total: 15,
            sentence_max_words: 0,
            learn: true,
            save_interval_seconds: 300,
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.order == 0 {
            return Err(ConfigError::Validation("order must be at least 1".into()));
        }
        for (name, rate) in [
            ("reply_rate", self.reply_rate),
            ("bot_name_reply_rate", self.bot_name_reply_rate),
        ] {
            if !(0.0..=100.0).contains(&rate) {
                return Err(ConfigError::Validation(format!("{name} must be between 0 and 100")));
            }
        }
        if !(0.0..=1.0).contains(&self.max_overlap_ratio) {
            return Err(ConfigError::Validation(
                "max_overlap_ratio must be between 0 and 1".into(),
            ));
        }
        if self.sentence_with_key_tries == 0 {
            return Err(ConfigError::Validation(
                "sentence_with_key_tries must be at least 1".into(),
            ));
        }
        if self.sentence_max_words > MAX_WALK_TOKENS {
            return Err(ConfigError::Validation(format!(
                "sentence_max_words must be at most {MAX_WALK_TOKENS}"
            )));
        }
        if self.save_interval_seconds == 0 {
            return Err(ConfigError::Validation(
                "save_interval_seconds must be at least 1".into(),
            ));
        }
        Ok(())
    }

    /// Sampling limits for a single chain sampling call.
    pub fn sample_options(&self) -> SampleOptions {
        SampleOptions {
            tries: 1,
            max_overlap_ratio: self.max_overlap_ratio,
            max_overlap_total: self.max_overlap_total,
            max_words: (self.sentence_max_words > 0).then_some(self.sentence_max_words),
        }
    }
}

#[derive(Deserialize)]
struct ConfigFile {
    bot_name: String,
    /// Directory holding the corpus files and logs. Defaults to current directory.
    data_dir: Option<String>,
    #[serde(default = "default_main_corpus_file")]
    main_corpus_file: String,
    #[serde(default = "default_supplementary_corpus_file")]
    supplementary_corpus_file: String,
    #[serde(flatten)]
    engine: EngineConfig,
}

fn default_main_corpus_file() -> String {
    "lines.txt".to_string()
}

fn default_supplementary_corpus_file() -> String {
    "supplementary.txt".to_string()
}

pub struct Config {
    /// Name the bot answers to.
    pub bot_name: String,
    pub data_dir: PathBuf,
    /// Learned corpus, read at startup and rewritten on save.
    pub main_corpus_path: PathBuf,
    /// Extra read-only corpus.
    pub supplementary_corpus_path: PathBuf,
    pub engine: EngineConfig,
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let config_path = path.as_ref().to_path_buf();
        let content = std::fs::read_to_string(&config_path)
            .map_err(|e| ConfigError::ReadFile { path: config_path.clone(), source: e })?;
        let file: ConfigFile = serde_json::from_str(&content)
            .map_err(|e| ConfigError::ParseJson { path: config_path.clone(), source: e })?;

        if file.bot_name.trim().is_empty() {
            return Err(ConfigError::Validation("bot_name is required".into()));
        }
        file.engine.validate()?;

        let data_dir = file
            .data_dir
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."));

        Ok(Self {
            bot_name: file.bot_name,
            main_corpus_path: data_dir.join(&file.main_corpus_file),
            supplementary_corpus_path: data_dir.join(&file.supplementary_corpus_file),
            data_dir,
            engine: file.engine,
        })
    }
}
