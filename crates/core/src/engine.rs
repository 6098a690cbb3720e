use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::{Arc, Condvar, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use anyhow::{Context, Result};

use crate::clock::{Clock, SystemClock};
use crate::logger;
use crate::matcher::{button_text_matches, near_text_matches};
use crate::policy::AllowListPolicy;
use crate::provider::CandidateProvider;
use crate::settings::Settings;
use crate::types::{Candidate, RuntimeState, Status};

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|e| e.into_inner())
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".into())
}

/// Whether `candidate` passes every gate, checked in order: allow-list,
/// enabled (when required), button label, near text.
pub fn candidate_passes(candidate: &Candidate, settings: &Settings, policy: &AllowListPolicy) -> bool {
    policy.is_allowed(&candidate.window)
        && (!settings.require_button_enabled || candidate.enabled)
        && button_text_matches(&candidate.label, &settings.button_texts)
        && near_text_matches(&candidate.near_text, &settings.require_near_text_contains)
}

struct EngineState {
    settings: Arc<Settings>,
    policy: Arc<AllowListPolicy>,
    runtime: RuntimeState,
    /// Monotonic time of the last click, or of the last dry-run match.
    last_action: Option<Duration>,
}

impl EngineState {
    fn new(settings: Settings) -> Self {
        let runtime = RuntimeState::new(settings.dry_run);
        let (settings, policy) = Self::install(settings);
        Self { settings, policy, runtime, last_action: None }
    }

    fn install(settings: Settings) -> (Arc<Settings>, Arc<AllowListPolicy>) {
        let policy = AllowListPolicy::new(&settings.allowed_processes, &settings.allowed_window_title_contains);
        if policy.allows_everything() {
            logger::warn("allow-list is empty: every window may be acted on");
        }
        (Arc::new(settings), Arc::new(policy))
    }
}

#[derive(Default)]
struct StopSignal {
    stopped: Mutex<bool>,
    cvar: Condvar,
}

impl StopSignal {
    fn set(&self) {
        *lock(&self.stopped) = true;
        self.cvar.notify_all();
    }

    fn reset(&self) {
        *lock(&self.stopped) = false;
    }

    fn is_set(&self) -> bool {
        *lock(&self.stopped)
    }

    /// Sleep up to `timeout`, waking early on stop. Returns whether stop is set.
    fn wait(&self, timeout: Duration) -> bool {
        let guard = lock(&self.stopped);
        let (guard, _) = self
            .cvar
            .wait_timeout_while(guard, timeout, |stopped| !*stopped)
            .unwrap_or_else(|e| e.into_inner());
        *guard
    }
}

struct Selection {
    provider: String,
    candidate: Candidate,
}

impl Selection {
    fn summary(&self) -> String {
        format!(
            "provider={} process={} title={:?} button={:?}",
            self.provider, self.candidate.window.process_name, self.candidate.window.title, self.candidate.label,
        )
    }
}

struct Shared {
    providers: Vec<Box<dyn CandidateProvider>>,
    clock: Arc<dyn Clock>,
    state: Mutex<EngineState>,
    /// Held for a whole cycle so two decisions never interleave.
    cycle: Mutex<()>,
    stop: StopSignal,
}

impl Shared {
    fn settings(&self) -> Arc<Settings> {
        Arc::clone(&lock(&self.state).settings)
    }

    fn run_once(&self) -> bool {
        let _cycle = lock(&self.cycle);

        let (settings, policy, paused, last_action) = {
            let st = lock(&self.state);
            (Arc::clone(&st.settings), Arc::clone(&st.policy), st.runtime.paused, st.last_action)
        };
        if paused {
            return false;
        }

        let now = self.clock.monotonic();
        if let Some(last) = last_action {
            if now.saturating_sub(last) < settings.click_cooldown() {
                return false;
            }
        }

        let Some(selection) = self.select(&settings, &policy) else {
            return false;
        };
        let summary = selection.summary();

        let dry_run = {
            let mut st = lock(&self.state);
            st.runtime.last_match = Some(summary.clone());
            if st.runtime.paused {
                logger::info(&format!("paused during scan, not acting. {}", summary));
                return false;
            }
            if st.runtime.dry_run {
                st.last_action = Some(now);
            }
            st.runtime.dry_run
        };

        if dry_run {
            logger::info(&format!("dry-run: matched candidate. {}", summary));
            return true;
        }

        let attempt = panic::catch_unwind(AssertUnwindSafe(|| selection.candidate.activate(settings.allow_focus)));
        let clicked = match attempt {
            Ok(Ok(clicked)) => clicked,
            Ok(Err(e)) => {
                logger::error(&format!("click action failed: {:#}. {}", e, summary));
                false
            }
            Err(payload) => {
                logger::error(&format!("click action panicked: {}. {}", panic_message(payload.as_ref()), summary));
                false
            }
        };

        if !clicked {
            logger::warn(&format!("candidate matched but click did not execute. {}", summary));
            return false;
        }

        {
            let mut st = lock(&self.state);
            st.last_action = Some(now);
            st.runtime.last_click_ts = Some(self.clock.wall());
        }
        logger::info(&format!("clicked candidate. {}", summary));
        true
    }

    /// First candidate, in provider priority order then scan order, that
    /// passes every gate.
    fn select(&self, settings: &Settings, policy: &AllowListPolicy) -> Option<Selection> {
        for provider in &self.providers {
            let name = provider.name();
            let candidates = match panic::catch_unwind(AssertUnwindSafe(|| provider.scan(settings))) {
                Ok(Ok(candidates)) => candidates,
                Ok(Err(e)) => {
                    logger::error_p(name, &format!("scan failed: {:#}", e));
                    continue;
                }
                Err(payload) => {
                    logger::error_p(name, &format!("scan panicked: {}", panic_message(payload.as_ref())));
                    continue;
                }
            };
            logger::debug(&format!("provider {} returned {} candidate(s)", name, candidates.len()));

            if let Some(candidate) = candidates.into_iter().find(|c| candidate_passes(c, settings, policy)) {
                return Some(Selection { provider: name.to_string(), candidate });
            }
        }
        None
    }
}

fn run_loop(shared: Arc<Shared>, done_tx: mpsc::Sender<()>) {
    logger::info("click engine started");
    while !shared.stop.is_set() {
        if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(|| shared.run_once())) {
            logger::error(&format!("unexpected engine loop error: {}", panic_message(payload.as_ref())));
        }
        // Re-read each tick so a reload changes the pace immediately.
        let interval = shared.settings().poll_interval();
        if shared.stop.wait(interval) {
            break;
        }
    }
    logger::info("click engine stopped");
    done_tx.send(()).ok();
}

struct Worker {
    handle: JoinHandle<()>,
    done_rx: mpsc::Receiver<()>,
}

/// Scan, filter, select, act. Shareable across threads; every method may be
/// called while the loop is running.
pub struct Engine {
    shared: Arc<Shared>,
    worker: Mutex<Option<Worker>>,
}

impl Engine {
    pub fn new(settings: Settings, providers: Vec<Box<dyn CandidateProvider>>) -> Self {
        Self::with_clock(settings, providers, Arc::new(SystemClock::new()))
    }

    pub fn with_clock(settings: Settings, providers: Vec<Box<dyn CandidateProvider>>, clock: Arc<dyn Clock>) -> Self {
        Self {
            shared: Arc::new(Shared {
                providers,
                clock,
                state: Mutex::new(EngineState::new(settings)),
                cycle: Mutex::new(()),
                stop: StopSignal::default(),
            }),
            worker: Mutex::new(None),
        }
    }

    /// Run one decision cycle. Returns true when a candidate was clicked, or
    /// matched in dry-run mode.
    pub fn run_once(&self) -> bool {
        self.shared.run_once()
    }

    /// Spawn the polling loop. No-op if it is already running.
    pub fn start(&self) -> Result<()> {
        let mut worker = lock(&self.worker);
        if worker.as_ref().is_some_and(|w| !w.handle.is_finished()) {
            return Ok(());
        }

        self.shared.stop.reset();
        let (done_tx, done_rx) = mpsc::channel();
        let shared = Arc::clone(&self.shared);
        let handle = thread::Builder::new()
            .name("clickgate-loop".into())
            .spawn(move || run_loop(shared, done_tx))
            .context("failed to spawn engine loop")?;
        *worker = Some(Worker { handle, done_rx });
        Ok(())
    }

    /// Signal the loop to stop and wait up to `timeout` for it to exit.
    /// Returns false if it is still running (e.g. stuck in a provider).
    pub fn stop(&self, timeout: Duration) -> bool {
        self.shared.stop.set();
        let mut slot = lock(&self.worker);
        let Some(worker) = slot.take() else { return true };

        match worker.done_rx.recv_timeout(timeout) {
            Ok(()) | Err(RecvTimeoutError::Disconnected) => {
                worker.handle.join().ok();
                true
            }
            Err(RecvTimeoutError::Timeout) => {
                logger::warn(&format!("engine loop did not exit within {:?}", timeout));
                *slot = Some(worker);
                false
            }
        }
    }

    pub fn is_running(&self) -> bool {
        lock(&self.worker).as_ref().is_some_and(|w| !w.handle.is_finished())
    }

    pub fn toggle_paused(&self) -> bool {
        let mut st = lock(&self.shared.state);
        st.runtime.paused = !st.runtime.paused;
        logger::info(&format!("paused: {}", st.runtime.paused));
        st.runtime.paused
    }

    pub fn toggle_dry_run(&self) -> bool {
        let mut st = lock(&self.shared.state);
        st.runtime.dry_run = !st.runtime.dry_run;
        logger::info(&format!("dry-run: {}", st.runtime.dry_run));
        st.runtime.dry_run
    }

    pub fn set_dry_run(&self, enabled: bool) {
        let mut st = lock(&self.shared.state);
        st.runtime.dry_run = enabled;
        logger::info(&format!("dry-run: {}", enabled));
    }

    /// Swap in new settings and rebuild the allow-list in one step. With
    /// `keep_runtime_toggles` the pause/dry-run flags and history survive;
    /// otherwise dry-run resets to the new default and pause clears.
    pub fn update_config(&self, settings: Settings, keep_runtime_toggles: bool) {
        let dry_run_default = settings.dry_run;
        let (settings, policy) = EngineState::install(settings);

        let mut st = lock(&self.shared.state);
        st.settings = settings;
        st.policy = policy;
        if !keep_runtime_toggles {
            st.runtime.dry_run = dry_run_default;
            st.runtime.paused = false;
        }
        logger::info(&format!(
            "settings applied (keep toggles: {}): paused={} dry_run={}",
            keep_runtime_toggles, st.runtime.paused, st.runtime.dry_run
        ));
    }

    pub fn settings(&self) -> Arc<Settings> {
        self.shared.settings()
    }

    pub fn status(&self) -> Status {
        let st = lock(&self.shared.state);
        Status {
            paused: st.runtime.paused,
            dry_run: st.runtime.dry_run,
            last_click_ts: st.runtime.last_click_ts,
            last_match: st.runtime.last_match.clone(),
            poll_interval_ms: st.settings.poll_interval_ms,
            click_cooldown_ms: st.settings.click_cooldown_ms,
        }
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        self.shared.stop.set();
    }
}
