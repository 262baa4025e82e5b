//! Reply engine - learns from chat messages and answers with Markov sentences.

use rand::SeedableRng;
use rand::rngs::StdRng;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{error, info, warn};

use crate::bot::addressing;
use crate::bot::commands::Command;
use crate::bot::composer::{compose, should_reply};
use crate::bot::learning::{Learner, Statistics};
use crate::bot::normalize::normalize;
use crate::bot::persist::{CorpusStore, PersistError, SaveOutcome};
use crate::bot::scheduler::SaveScheduler;
use crate::config::EngineConfig;
use crate::markov::ChainModel;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// The reply engine.
pub struct Engine {
    config: EngineConfig,
    learner: Learner,
    corpus: Arc<Mutex<CorpusStore>>,
    rng: StdRng,
    scheduler: Option<SaveScheduler>,
}

impl Engine {
    /// Build the engine from the corpus files. Missing files count as empty.
    ///
    /// Learned lines are saved back to `primary`.
    pub fn initialize(primary: &Path, supplementary: &Path, config: EngineConfig) -> Self {
        info!("Loading parrot {}...", VERSION);

        let mut text = read_corpus(primary);
        let extra = read_corpus(supplementary);
        if !extra.is_empty() {
            if !text.is_empty() && !text.ends_with('\n') {
                text.push('\n');
            }
            text.push_str(&extra);
        }

        let model = ChainModel::build(&text, config.order);
        let mut lines = model.lines();
        lines.sort();

        let corpus = Arc::new(Mutex::new(CorpusStore::new(primary.to_path_buf(), lines)));
        let learner = Learner::new(model, corpus.clone(), config.learn);

        for line in learner.statistics().summary() {
            info!("{}", line);
        }
        info!(
            "Normal reply rate is {} and bot name reply rate is {}.",
            config.reply_rate, config.bot_name_reply_rate
        );

        Self {
            config,
            learner,
            corpus,
            rng: StdRng::from_entropy(),
            scheduler: None,
        }
    }

    /// Replace the random source, e.g. with a seeded one.
    pub fn with_rng(mut self, rng: StdRng) -> Self {
        self.rng = rng;
        self
    }

    /// Start the periodic save task. Must be called within a tokio runtime.
    pub fn start_scheduler(&mut self) {
        if self.scheduler.is_some() {
            return;
        }
        let period = Duration::from_secs(self.config.save_interval_seconds);
        self.scheduler = Some(SaveScheduler::start(self.corpus.clone(), period));
    }

    /// Handle an incoming message and maybe produce a reply.
    ///
    /// `bot_name` is the name the bot answers to. When `learn` is set (and
    /// learning is enabled) the message is learned whether or not a reply
    /// follows.
    pub fn respond(&mut self, message: &str, bot_name: &str, learn: bool) -> Option<String> {
        if message.trim().is_empty() {
            return None;
        }

        let addressing = addressing::detect(message, bot_name);
        let prepared = normalize(&addressing.effective_message);

        if learn {
            self.learner.ingest(&prepared);
        }

        if !should_reply(&self.config, addressing.is_addressed(), &mut self.rng) {
            return None;
        }

        compose(self.learner.model(), &self.config, &prepared, &mut self.rng)
    }

    pub fn statistics(&self) -> Statistics {
        self.learner.statistics()
    }

    pub fn statistics_text(&self) -> String {
        self.learner.statistics().to_string()
    }

    pub fn run_command(&self, command: Command) -> String {
        match command {
            Command::Statistics => self.statistics_text(),
            Command::Version => format!("parrot version {}", VERSION),
        }
    }

    pub fn model(&self) -> &ChainModel {
        self.learner.model()
    }

    pub fn is_dirty(&self) -> bool {
        self.corpus.lock().expect("corpus lock poisoned").is_dirty()
    }

    /// Flush the corpus to disk now if it has unsaved changes.
    pub fn save(&self) -> Result<SaveOutcome, PersistError> {
        self.corpus.lock().expect("corpus lock poisoned").save()
    }

    /// Stop the scheduler, save one last time and release the model.
    pub async fn shutdown(mut self) {
        if let Some(scheduler) = self.scheduler.take() {
            scheduler.stop().await;
        }
        if let Err(e) = self.save() {
            error!("Final save failed: {}", e);
        }
        info!("Parrot is shutting down now.");
    }
}

/// Read a corpus file, substituting invalid UTF-8.
fn read_corpus(path: &Path) -> String {
    if !path.is_file() {
        if path.exists() {
            warn!("{} is not a file, ignoring", path.display());
        } else {
            info!("No corpus at {}, starting empty", path.display());
        }
        return String::new();
    }

    match std::fs::read(path) {
        Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
        Err(e) => {
            warn!("Failed to read {}: {}", path.display(), e);
            String::new()
        }
    }
}
