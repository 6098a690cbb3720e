//! Deterministic providers and activations for tests and demos.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Result};

use crate::settings::Settings;
use crate::types::{Activate, Candidate, WindowIdentity};
use super::CandidateProvider;

/// What a [`RecordingActivation`] does when invoked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Succeed,
    /// Returns `Ok(false)`.
    Decline,
    /// Succeeds only when focus may be taken.
    NeedsFocus,
    Fail,
    Panic,
}

/// Shared record of every activation attempt and the `allow_focus` it got.
#[derive(Debug, Clone, Default)]
pub struct ActivationLog {
    calls: Arc<Mutex<Vec<bool>>>,
}

impl ActivationLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self) -> usize {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn focus_flags(&self) -> Vec<bool> {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn activation(&self, outcome: Outcome) -> RecordingActivation {
        RecordingActivation { log: self.clone(), outcome }
    }
}

pub struct RecordingActivation {
    log: ActivationLog,
    outcome: Outcome,
}

impl Activate for RecordingActivation {
    fn activate(&self, allow_focus: bool) -> Result<bool> {
        self.log.calls.lock().unwrap_or_else(|e| e.into_inner()).push(allow_focus);
        match self.outcome {
            Outcome::Succeed => Ok(true),
            Outcome::Decline => Ok(false),
            Outcome::NeedsFocus => Ok(allow_focus),
            Outcome::Fail => Err(anyhow!("element vanished before invoke")),
            Outcome::Panic => panic!("activation panicked"),
        }
    }
}

/// Recipe for a candidate; a fresh [`Candidate`] is built from it per scan.
#[derive(Debug, Clone)]
pub struct CandidateTemplate {
    pub window: WindowIdentity,
    pub label: String,
    pub enabled: bool,
    pub near_text: String,
    pub outcome: Outcome,
}

impl CandidateTemplate {
    pub fn new(title: &str, process: &str, label: &str) -> Self {
        Self {
            window: WindowIdentity::new(title, process),
            label: label.into(),
            enabled: true,
            near_text: String::new(),
            outcome: Outcome::Succeed,
        }
    }

    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn near_text(mut self, near_text: &str) -> Self {
        self.near_text = near_text.into();
        self
    }

    pub fn outcome(mut self, outcome: Outcome) -> Self {
        self.outcome = outcome;
        self
    }

    pub fn build(&self, source: &str, log: &ActivationLog) -> Candidate {
        Candidate::new(self.window.clone(), self.label.clone(), source, log.activation(self.outcome))
            .enabled(self.enabled)
            .near_text(self.near_text.clone())
    }
}

enum Script {
    Repeat(Vec<CandidateTemplate>),
    /// One entry per scan; empty once drained.
    Sequence(Mutex<VecDeque<Vec<CandidateTemplate>>>),
    Fail,
    Panic,
}

/// Provider returning the same templates on every scan, a per-scan sequence,
/// or failing.
pub struct ScriptedProvider {
    name: String,
    script: Script,
    log: ActivationLog,
    scans: Arc<AtomicUsize>,
}

impl ScriptedProvider {
    pub fn new(name: &str, templates: Vec<CandidateTemplate>, log: &ActivationLog) -> Self {
        Self::with_script(name, Script::Repeat(templates), log)
    }

    /// Scan `n` returns `scans[n]`; every scan after the last returns nothing.
    pub fn sequence(name: &str, scans: Vec<Vec<CandidateTemplate>>, log: &ActivationLog) -> Self {
        Self::with_script(name, Script::Sequence(Mutex::new(scans.into())), log)
    }

    pub fn empty(name: &str) -> Self {
        Self::with_script(name, Script::Repeat(Vec::new()), &ActivationLog::new())
    }

    /// Every scan returns an error.
    pub fn failing(name: &str) -> Self {
        Self::with_script(name, Script::Fail, &ActivationLog::new())
    }

    /// Every scan panics.
    pub fn panicking(name: &str) -> Self {
        Self::with_script(name, Script::Panic, &ActivationLog::new())
    }

    fn with_script(name: &str, script: Script, log: &ActivationLog) -> Self {
        Self {
            name: name.into(),
            script,
            log: log.clone(),
            scans: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Handle to the scan counter that stays valid after the provider is boxed.
    pub fn scan_counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.scans)
    }
}

impl CandidateProvider for ScriptedProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn scan(&self, _settings: &Settings) -> Result<Vec<Candidate>> {
        self.scans.fetch_add(1, Ordering::SeqCst);
        match &self.script {
            Script::Repeat(templates) => {
                Ok(templates.iter().map(|t| t.build(&self.name, &self.log)).collect())
            }
            Script::Sequence(scans) => {
                let next = scans.lock().unwrap_or_else(|e| e.into_inner()).pop_front();
                Ok(next
                    .unwrap_or_default()
                    .iter()
                    .map(|t| t.build(&self.name, &self.log))
                    .collect())
            }
            Script::Fail => Err(anyhow!("{} backend unavailable", self.name)),
            Script::Panic => panic!("{} backend crashed", self.name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scripted_provider_builds_fresh_candidates_each_scan() {
        let log = ActivationLog::new();
        let provider = ScriptedProvider::new(
            "fake",
            vec![CandidateTemplate::new("Visual Studio Code", "Code.exe", "Submit").outcome(Outcome::NeedsFocus)],
            &log,
        );
        let scans = provider.scan_counter();

        let first = provider.scan(&Settings::default()).unwrap();
        let second = provider.scan(&Settings::default()).unwrap();
        assert_eq!(scans.load(Ordering::SeqCst), 2);
        assert_eq!(first[0].source, "fake");

        let mut it = first.into_iter().chain(second);
        assert!(!it.next().unwrap().activate(false).unwrap());
        assert!(it.next().unwrap().activate(true).unwrap());
        assert_eq!(log.focus_flags(), vec![false, true]);
    }

    #[test]
    fn sequence_plays_each_scan_once_then_goes_quiet() {
        let log = ActivationLog::new();
        let provider = ScriptedProvider::sequence(
            "fake",
            vec![
                vec![CandidateTemplate::new("Visual Studio Code", "Code.exe", "Submit")],
                vec![],
                vec![
                    CandidateTemplate::new("Visual Studio Code", "Code.exe", "Apply"),
                    CandidateTemplate::new("Visual Studio Code", "Code.exe", "Submit"),
                ],
            ],
            &log,
        );

        let labels = |c: Vec<Candidate>| c.into_iter().map(|c| c.label).collect::<Vec<_>>();
        assert_eq!(labels(provider.scan(&Settings::default()).unwrap()), vec!["Submit"]);
        assert!(provider.scan(&Settings::default()).unwrap().is_empty());
        assert_eq!(labels(provider.scan(&Settings::default()).unwrap()), vec!["Apply", "Submit"]);
        assert!(provider.scan(&Settings::default()).unwrap().is_empty());
        assert_eq!(provider.scan_counter().load(Ordering::SeqCst), 4);
    }

    #[test]
    fn failing_provider_errors() {
        let provider = ScriptedProvider::failing("broken");
        assert!(provider.scan(&Settings::default()).is_err());
        assert_eq!(provider.scan_counter().load(Ordering::SeqCst), 1);
    }
}
