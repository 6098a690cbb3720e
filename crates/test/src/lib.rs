//! Fixtures shared by the scenario harness.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use clickgate_core::clock::ManualClock;
use clickgate_core::provider::scripted::{ActivationLog, CandidateTemplate, ScriptedProvider};
use clickgate_core::{CandidateProvider, Engine, Settings};

/// Settings allowing `Code.exe` windows titled "Visual Studio Code" and the
/// single button label "Submit".
pub fn vscode_settings(dry_run: bool, cooldown_ms: u64) -> Settings {
    Settings {
        allowed_processes: vec!["Code.exe".into()],
        allowed_window_title_contains: vec!["Visual Studio Code".into()],
        button_texts: vec!["Submit".into()],
        poll_interval_ms: 100,
        click_cooldown_ms: cooldown_ms,
        require_button_enabled: true,
        require_near_text_contains: Vec::new(),
        allow_focus: false,
        dry_run,
        log_level: "INFO".into(),
    }
}

pub fn submit_button() -> CandidateTemplate {
    CandidateTemplate::new("Visual Studio Code", "Code.exe", "Submit")
}

pub struct Fixture {
    pub engine: Engine,
    pub clock: Arc<ManualClock>,
    pub log: ActivationLog,
    pub scans: Arc<AtomicUsize>,
}

impl Fixture {
    /// One scripted provider named "fake" returning `templates` every scan.
    pub fn single(settings: Settings, templates: Vec<CandidateTemplate>) -> Self {
        let log = ActivationLog::new();
        let provider = ScriptedProvider::new("fake", templates, &log);
        let scans = provider.scan_counter();
        Self::build(settings, vec![Box::new(provider)], log, scans)
    }

    pub fn build(
        settings: Settings,
        providers: Vec<Box<dyn CandidateProvider>>,
        log: ActivationLog,
        scans: Arc<AtomicUsize>,
    ) -> Self {
        let clock = Arc::new(ManualClock::default());
        let engine = Engine::with_clock(settings, providers, clock.clone());
        Self { engine, clock, log, scans }
    }

    pub fn scan_count(&self) -> usize {
        self.scans.load(Ordering::SeqCst)
    }
}
