//! Bot module - turns chat messages into learned text and Markov replies.

pub mod addressing;
pub mod commands;
pub mod composer;
pub mod engine;
pub mod learning;
pub mod normalize;
pub mod persist;
pub mod scheduler;


pub use commands::Command;
pub use engine::{Engine, VERSION};
pub use learning::Statistics;
pub use persist::{PersistError, SaveOutcome};
