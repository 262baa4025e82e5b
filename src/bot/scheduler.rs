//! Periodic background save of the corpus.

use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tracing::{error, info};

use crate::bot::persist::{CorpusStore, SaveOutcome};

/// Background task that flushes the corpus every `period` when dirty.
///
/// Saves run on the blocking pool. Cancellation is only observed between
/// ticks, so a save that has started always runs to completion.
pub struct SaveScheduler {
    cancel: Arc<Notify>,
    handle: Option<JoinHandle<()>>,
}

impl SaveScheduler {
    /// Spawn the save loop. Must be called within a tokio runtime.
    pub fn start(corpus: Arc<Mutex<CorpusStore>>, period: Duration) -> Self {
        let cancel = Arc::new(Notify::new());
        let cancel_clone = cancel.clone();

        let handle = tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            info!("Save scheduler running every {:?}", period);

            loop {
                tokio::select! {
                    biased;

                    _ = cancel_clone.notified() => {
                        break;
                    }
                    _ = ticker.tick() => {
                        let corpus = corpus.clone();
                        if let Err(e) = tokio::task::spawn_blocking(move || save_tick(&corpus)).await {
                            error!("Periodic save task failed: {}", e);
                        }
                    }
                }
            }

            info!("Save scheduler stopped");
        });

        Self {
            cancel,
            handle: Some(handle),
        }
    }

    /// Signal the loop to exit and wait for it.
    pub async fn stop(mut self) {
        self.cancel.notify_one();
        if let Some(handle) = self.handle.take()
            && let Err(e) = handle.await
        {
            error!("Save scheduler task failed: {}", e);
        }
    }
}

impl Drop for SaveScheduler {
    fn drop(&mut self) {
        self.cancel.notify_one();
    }
}

fn save_tick(corpus: &Mutex<CorpusStore>) {
    let mut store = corpus.lock().expect("corpus lock poisoned");
    match store.save() {
        Ok(SaveOutcome::Written(n)) => info!("Periodic save wrote {} lines", n),
        Ok(SaveOutcome::Clean) => {}
        Err(e) => error!("Periodic save failed: {}", e),
    }
}
