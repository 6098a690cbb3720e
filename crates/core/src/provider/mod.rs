pub mod scripted;
pub mod stub;

use anyhow::Result;

use crate::logger;
use crate::settings::Settings;
use crate::types::Candidate;

/// A source of candidates for the current screen state.
///
/// `scan` is called once per cycle and should return promptly. "Nothing
/// found" is an empty list, not an error.
pub trait CandidateProvider: Send + Sync {
    /// Stable identifier used in logs and match summaries.
    fn name(&self) -> &str;
    fn scan(&self, settings: &Settings) -> Result<Vec<Candidate>>;
}

/// Build providers in priority order (first wins ties).
pub fn create_providers(force_stub: bool) -> Vec<Box<dyn CandidateProvider>> {
    if force_stub {
        logger::register_prefix("stub", logger::COLOR_GRAY);
        return vec![Box::new(stub::StubProvider::new())];
    }
    logger::warn("no UI discovery backend is built into this binary; pass --stub to simulate one");
    Vec::new()
}
