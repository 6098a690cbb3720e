use std::collections::HashMap;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{mpsc, Mutex, MutexGuard, OnceLock};

use anyhow::{Context, Result};
use chrono::Local;

static LOGGER: OnceLock<Mutex<Logger>> = OnceLock::new();
static LEVEL: AtomicU8 = AtomicU8::new(Level::Info as u8);

const LOG_FILE: &str = "clickgate.log";
const MAX_BYTES: u64 = 1_000_000;
const BACKUPS: usize = 5;

struct Logger {
    file: File,
    dir: PathBuf,
    written: u64,
    max_bytes: u64,
    tui_tx: Option<mpsc::Sender<String>>,
    prefixes: HashMap<String, u8>, // prefix -> color index
}

// Color indices for TUI rendering (mapped in ui.rs)
pub const COLOR_GRAY: u8 = 1;
pub const COLOR_BLUE: u8 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Level {
    Debug = 0,
    Info = 1,
    Warn = 2,
    Error = 3,
}

impl Level {
    /// Unknown names map to `Info`.
    pub fn parse(name: &str) -> Self {
        match name.trim().to_uppercase().as_str() {
            "DEBUG" | "TRACE" => Level::Debug,
            "WARN" | "WARNING" => Level::Warn,
            "ERROR" | "CRITICAL" => Level::Error,
            _ => Level::Info,
        }
    }

    fn tag(self) -> &'static str {
        match self {
            Level::Debug => "DEBUG",
            Level::Info => "INFO",
            Level::Warn => "WARN",
            Level::Error => "ERROR",
        }
    }
}

fn lock() -> Option<MutexGuard<'static, Logger>> {
    LOGGER.get().map(|l| l.lock().unwrap_or_else(|e| e.into_inner()))
}

/// Shift `clickgate.log` -> `.1` -> ... -> `.5` once it has grown past `max_bytes`.
fn rotate(log_dir: &Path, max_bytes: u64) {
    let active = log_dir.join(LOG_FILE);
    let too_big = fs::metadata(&active).map(|m| m.len() > max_bytes).unwrap_or(false);
    if !too_big {
        return;
    }
    for i in (1..BACKUPS).rev() {
        let from = log_dir.join(format!("{}.{}", LOG_FILE, i));
        if from.exists() {
            fs::rename(&from, log_dir.join(format!("{}.{}", LOG_FILE, i + 1))).ok();
        }
    }
    fs::rename(&active, log_dir.join(format!("{}.1", LOG_FILE))).ok();
}

fn open_active(log_dir: &Path) -> Result<File> {
    let log_path = log_dir.join(LOG_FILE);
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .with_context(|| format!("failed to open log file {}", log_path.display()))
}

impl Logger {
    fn open(log_dir: &Path, max_bytes: u64) -> Result<Self> {
        fs::create_dir_all(log_dir)
            .with_context(|| format!("failed to create log dir {}", log_dir.display()))?;
        rotate(log_dir, max_bytes);
        let file = open_active(log_dir)?;
        let written = file.metadata().map(|m| m.len()).unwrap_or(0);
        Ok(Self {
            file,
            dir: log_dir.to_path_buf(),
            written,
            max_bytes,
            tui_tx: None,
            prefixes: HashMap::new(),
        })
    }

    /// Write one line, rolling the file over once it passes `max_bytes`.
    fn append(&mut self, line: &str) {
        if writeln!(self.file, "{}", line).is_ok() {
            self.written += line.len() as u64 + 1;
        }
        if self.written <= self.max_bytes {
            return;
        }
        rotate(&self.dir, self.max_bytes);
        // On failure keep writing to the old handle rather than dropping lines.
        if let Ok(file) = open_active(&self.dir) {
            self.file = file;
            self.written = 0;
        }
    }
}

/// Initialize the global logger, appending to `<log_dir>/clickgate.log`.
pub fn init(log_dir: &Path, level: Level) -> Result<()> {
    let logger = Logger::open(log_dir, MAX_BYTES)?;
    set_level(level);
    LOGGER.set(Mutex::new(logger)).ok();
    Ok(())
}

pub fn set_level(level: Level) {
    LEVEL.store(level as u8, Ordering::Relaxed);
}

/// Wire the TUI log channel.
pub fn set_tui_sender(tx: mpsc::Sender<String>) {
    if let Some(mut l) = lock() {
        l.tui_tx = Some(tx);
    }
}

/// Register a prefix with a color used by the `*_p` calls.
pub fn register_prefix(prefix: &str, color: u8) {
    if let Some(mut l) = lock() {
        l.prefixes.insert(prefix.to_string(), color);
    }
}

/// TUI record: level\x1fprefix\x1fcolor\x1ftimestamp\x1fmessage
fn tui_record(level: Level, prefix: &str, color: u8, ts: &str, msg: &str) -> String {
    format!("{}\x1f{}\x1f{}\x1f{}\x1f{}", level.tag(), prefix, color, ts, msg)
}

fn file_line(level: Level, prefix: &str, ts: &str, msg: &str) -> String {
    if prefix.is_empty() {
        format!("[{}] [{}] {}", ts, level.tag(), msg)
    } else {
        format!("[{}] [{}] [{}] {}", ts, level.tag(), prefix, msg)
    }
}

fn write_log(level: Level, prefix: &str, msg: &str) {
    if (level as u8) < LEVEL.load(Ordering::Relaxed) {
        return;
    }
    let Some(mut l) = lock() else { return };

    let color = l.prefixes.get(prefix).copied().unwrap_or(0);
    let now = Local::now();
    let file_ts = now.format("%Y-%m-%d %H:%M:%S").to_string();
    let tui_ts = now.format("%H:%M:%S").to_string();

    l.append(&file_line(level, prefix, &file_ts, msg));
    if let Some(tx) = &l.tui_tx {
        tx.send(tui_record(level, prefix, color, &tui_ts, msg)).ok();
    }
}

pub fn debug(msg: &str) {
    write_log(Level::Debug, "", msg);
}

pub fn info(msg: &str) {
    write_log(Level::Info, "", msg);
}

pub fn warn(msg: &str) {
    write_log(Level::Warn, "", msg);
}

pub fn error(msg: &str) {
    write_log(Level::Error, "", msg);
}

pub fn info_p(prefix: &str, msg: &str) {
    write_log(Level::Info, prefix, msg);
}

pub fn warn_p(prefix: &str, msg: &str) {
    write_log(Level::Warn, prefix, msg);
}

pub fn error_p(prefix: &str, msg: &str) {
    write_log(Level::Error, prefix, msg);
}
