use std::path::PathBuf;
use std::sync::{mpsc, Arc};

use clickgate_core::logger::{self, Level};
use clickgate_core::{Engine, Settings, Status};

use crate::confirm::GoLiveDialog;

const MAX_LOG_LINES: usize = 2000;

pub struct App {
    pub engine: Arc<Engine>,
    pub settings_path: PathBuf,
    pub log_visible: bool,
    pub log_messages: Vec<String>,
    pub log_scroll: usize, // scroll offset from bottom (0 = latest)
    pub log_rx: mpsc::Receiver<String>,
    pub confirm: Option<GoLiveDialog>,
    pub should_quit: bool,
}

impl App {
    pub fn new(engine: Arc<Engine>, log_rx: mpsc::Receiver<String>, settings_path: PathBuf) -> Self {
        Self {
            engine,
            settings_path,
            log_visible: true,
            log_messages: Vec::new(),
            log_scroll: 0,
            log_rx,
            confirm: None,
            should_quit: false,
        }
    }

    pub fn status(&self) -> Status {
        self.engine.status()
    }

    pub fn drain_logs(&mut self) {
        while let Ok(msg) = self.log_rx.try_recv() {
            self.log_messages.push(msg);
        }
        if self.log_messages.len() > MAX_LOG_LINES {
            let excess = self.log_messages.len() - MAX_LOG_LINES;
            self.log_messages.drain(..excess);
        }
    }

    pub fn scroll_log_up(&mut self, n: usize) {
        self.log_scroll = self.log_scroll.saturating_add(n);
    }

    pub fn scroll_log_down(&mut self, n: usize) {
        self.log_scroll = self.log_scroll.saturating_sub(n);
    }

    pub fn toggle_pause(&mut self) {
        self.engine.toggle_paused();
    }

    /// Going live needs confirmation; going back to dry-run does not.
    pub fn request_dry_run_toggle(&mut self) {
        if self.engine.status().dry_run {
            self.confirm = Some(GoLiveDialog::new(&self.engine.settings()));
        } else {
            self.engine.set_dry_run(true);
        }
    }

    /// Close the open dialog, going live if that was chosen.
    pub fn resolve_confirm(&mut self) {
        if let Some(dialog) = self.confirm.take() {
            if dialog.go_live() {
                self.engine.set_dry_run(false);
            } else {
                logger::info("stayed in dry-run");
            }
        }
    }

    pub fn cancel_confirm(&mut self) {
        self.confirm = None;
    }

    pub fn reload_settings(&mut self) {
        let settings = Settings::load(&self.settings_path);
        logger::set_level(Level::parse(&settings.log_level));
        self.engine.update_config(settings, true);
        logger::info(&format!("settings reloaded from {}", self.settings_path.display()));
    }

    pub fn toggle_log(&mut self) {
        self.log_visible = !self.log_visible;
    }

    pub fn quit(&mut self) {
        self.should_quit = true;
    }
}
