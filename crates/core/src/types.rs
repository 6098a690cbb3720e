use std::fmt;

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Opaque platform window handle (HWND on Windows, CGWindowID on macOS)
pub type WindowHandle = u64;

/// The UI surface a candidate belongs to
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct WindowIdentity {
    pub title: String,
    pub process_name: String,
    pub handle: Option<WindowHandle>,
}

impl WindowIdentity {
    pub fn new(title: impl Into<String>, process_name: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            process_name: process_name.into(),
            handle: None,
        }
    }

    pub fn with_handle(mut self, handle: WindowHandle) -> Self {
        self.handle = Some(handle);
        self
    }
}

/// Performs the real-world click for one candidate.
///
/// May decline and return `Ok(false)` when `allow_focus` is false and the
/// element cannot be invoked without stealing focus.
pub trait Activate: Send {
    fn activate(&self, allow_focus: bool) -> Result<bool>;
}

impl<F> Activate for F
where
    F: Fn(bool) -> Result<bool> + Send,
{
    fn activate(&self, allow_focus: bool) -> Result<bool> {
        self(allow_focus)
    }
}

/// One discovered, potentially clickable element.
///
/// Built fresh by a provider on every scan and consumed by the cycle that
/// requested it; it is neither `Clone` nor kept past that cycle.
pub struct Candidate {
    pub window: WindowIdentity,
    pub label: String,
    pub enabled: bool,
    pub near_text: String,
    pub source: String,
    activation: Box<dyn Activate>,
}

impl Candidate {
    pub fn new(
        window: WindowIdentity,
        label: impl Into<String>,
        source: impl Into<String>,
        activation: impl Activate + 'static,
    ) -> Self {
        Self {
            window,
            label: label.into(),
            enabled: true,
            near_text: String::new(),
            source: source.into(),
            activation: Box::new(activation),
        }
    }

    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn near_text(mut self, near_text: impl Into<String>) -> Self {
        self.near_text = near_text.into();
        self
    }

    /// Takes `self` so a candidate can be activated at most once.
    pub fn activate(self, allow_focus: bool) -> Result<bool> {
        self.activation.activate(allow_focus)
    }
}

impl fmt::Debug for Candidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Candidate")
            .field("window", &self.window)
            .field("label", &self.label)
            .field("enabled", &self.enabled)
            .field("near_text", &self.near_text)
            .field("source", &self.source)
            .finish_non_exhaustive()
    }
}

/// Engine-owned mutable state
#[derive(Debug, Clone, Default)]
pub struct RuntimeState {
    pub paused: bool,
    pub dry_run: bool,
    pub last_click_ts: Option<DateTime<Utc>>,
    pub last_match: Option<String>,
}

impl RuntimeState {
    pub fn new(dry_run: bool) -> Self {
        Self { dry_run, ..Self::default() }
    }
}

/// Read-only snapshot handed to presentation layers
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Status {
    pub paused: bool,
    pub dry_run: bool,
    pub last_click_ts: Option<DateTime<Utc>>,
    pub last_match: Option<String>,
    pub poll_interval_ms: u64,
    pub click_cooldown_ms: u64,
}

impl Status {
    pub fn mode_label(&self) -> &'static str {
        match (self.paused, self.dry_run) {
            (true, true) => "PAUSED (dry-run)",
            (true, false) => "PAUSED (live)",
            (false, true) => "RUNNING (dry-run)",
            (false, false) => "RUNNING (live)",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn closure_activation_receives_focus_flag() {
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&calls);
        let candidate = Candidate::new(
            WindowIdentity::new("Visual Studio Code", "Code.exe").with_handle(42),
            "Submit",
            "test",
            move |allow_focus: bool| -> Result<bool> {
                seen.fetch_add(1, Ordering::SeqCst);
                Ok(!allow_focus)
            },
        );

        assert_eq!(candidate.window.handle, Some(42));
        assert!(candidate.activate(false).unwrap());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn status_serializes_expected_keys() {
        let status = Status {
            paused: false,
            dry_run: true,
            last_click_ts: None,
            last_match: Some("provider=x".into()),
            poll_interval_ms: 350,
            click_cooldown_ms: 5000,
        };
        let json = serde_json::to_value(&status).unwrap();
        for key in ["paused", "dry_run", "last_click_ts", "last_match", "poll_interval_ms", "click_cooldown_ms"] {
            assert!(json.get(key).is_some(), "missing {}", key);
        }
        assert!(json["last_click_ts"].is_null());
        assert_eq!(status.mode_label(), "RUNNING (dry-run)");
    }
}
