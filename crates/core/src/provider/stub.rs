use std::sync::atomic::{AtomicU64, Ordering};

use anyhow::Result;

use crate::logger;
use crate::settings::Settings;
use crate::types::{Candidate, WindowIdentity};
use super::CandidateProvider;

const STUB_HANDLE: u64 = 30001;

/// Simulated backend: every scan reports one "Submit" button in a VS Code
/// window. Activation only logs.
pub struct StubProvider {
    scans: AtomicU64,
}

impl StubProvider {
    pub fn new() -> Self {
        Self { scans: AtomicU64::new(0) }
    }
}

impl Default for StubProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl CandidateProvider for StubProvider {
    fn name(&self) -> &str {
        "stub"
    }

    fn scan(&self, _settings: &Settings) -> Result<Vec<Candidate>> {
        let n = self.scans.fetch_add(1, Ordering::Relaxed) + 1;
        let window = WindowIdentity::new("Visual Studio Code - stub", "Code.exe").with_handle(STUB_HANDLE);
        let candidate = Candidate::new(
            window,
            "Submit",
            self.name(),
            move |allow_focus: bool| -> Result<bool> {
                logger::info_p(
                    "stub",
                    &format!("win({}).invoke(\"Submit\") scan={} allow_focus={}", STUB_HANDLE, n, allow_focus),
                );
                Ok(true)
            },
        )
        .near_text("Do you want to make these changes?");
        Ok(vec![candidate])
    }
}
