//! Decision core for a supervised button clicker: match configured button
//! labels inside allow-listed windows and invoke them under pause, dry-run
//! and cooldown gating.

pub mod clock;
pub mod engine;
pub mod logger;
pub mod matcher;
pub mod policy;
pub mod provider;
pub mod settings;
pub mod types;

pub use engine::Engine;
pub use provider::CandidateProvider;
pub use settings::Settings;
pub use types::{Activate, Candidate, RuntimeState, Status, WindowIdentity};
