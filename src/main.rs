use std::any::Any;
use std::io;
use std::panic;
use std::path::PathBuf;
use std::sync::{mpsc, Arc};
use std::time::Duration;

use anyhow::{bail, Result};
use crossterm::{
    execute,
    event::{EnableMouseCapture, DisableMouseCapture},
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{Terminal, backend::CrosstermBackend};

use clickgate_core::logger::{self, Level};
use clickgate_core::provider::create_providers;
use clickgate_core::settings::{default_log_dir, default_settings_path, Settings};
use clickgate_core::Engine;

const STOP_TIMEOUT: Duration = Duration::from_secs(2);

struct Args {
    force_stub: bool,
    config: Option<PathBuf>,
}

fn parse_args() -> Result<Args> {
    let mut args = Args { force_stub: false, config: None };
    let mut it = std::env::args().skip(1);
    while let Some(arg) = it.next() {
        match arg.as_str() {
            "--stub" => args.force_stub = true,
            "--config" => match it.next() {
                Some(path) => args.config = Some(PathBuf::from(path)),
                None => bail!("--config needs a path"),
            },
            other => bail!("unknown argument {other:?} (usage: clickgate [--stub] [--config <path>])"),
        }
    }
    Ok(args)
}

fn panic_line(payload: &(dyn Any + Send), location: Option<String>) -> String {
    let msg = payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string panic payload");
    match location {
        Some(at) => format!("panic at {at}: {msg}"),
        None => format!("panic: {msg}"),
    }
}

fn main() -> Result<()> {
    let args = parse_args()?;

    let settings_path = args.config.unwrap_or_else(default_settings_path);
    let settings = Settings::load(&settings_path);

    logger::init(&default_log_dir(), Level::parse(&settings.log_level))?;
    logger::info(&format!("settings loaded from {}", settings_path.display()));

    let providers = create_providers(args.force_stub);
    logger::info(&format!(
        "{} provider(s): [{}]",
        providers.len(),
        providers.iter().map(|p| p.name()).collect::<Vec<_>>().join(", ")
    ));

    let engine = Arc::new(Engine::new(settings, providers));

    let (log_tx, log_rx) = mpsc::channel::<String>();
    logger::set_tui_sender(log_tx);
    logger::info("clickgate started");

    engine.start()?;

    // The alternate screen hides stderr, so panics go to the log while the TUI is up.
    let default_hook = panic::take_hook();
    panic::set_hook(Box::new(|info| {
        let at = info.location().map(|l| format!("{}:{}", l.file(), l.line()));
        logger::error(&panic_line(info.payload(), at));
    }));

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = clickgate_tui::App::new(Arc::clone(&engine), log_rx, settings_path);
    let result = clickgate_tui::event::run(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen, DisableMouseCapture)?;
    terminal.show_cursor()?;
    let _ = panic::take_hook();
    panic::set_hook(default_hook);

    if engine.stop(STOP_TIMEOUT) {
        logger::info("clickgate shutdown complete");
    } else {
        eprintln!("engine loop still busy after {:?}; exiting anyway", STOP_TIMEOUT);
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn panic_line_formats_str_and_string_payloads() {
        let payload: Box<dyn Any + Send> = Box::new("provider blew up");
        assert_eq!(
            panic_line(payload.as_ref(), Some("core/src/engine.rs:42".into())),
            "panic at core/src/engine.rs:42: provider blew up"
        );

        let payload: Box<dyn Any + Send> = Box::new(String::from("index out of range"));
        assert_eq!(panic_line(payload.as_ref(), None), "panic: index out of range");
    }

    #[test]
    fn panic_line_tolerates_other_payloads() {
        let payload: Box<dyn Any + Send> = Box::new(7_u32);
        assert_eq!(panic_line(payload.as_ref(), None), "panic: non-string panic payload");
    }

    #[test]
    fn caught_panic_goes_through_installed_hook() {
        let seen = std::sync::Arc::new(std::sync::Mutex::new(Vec::new()));
        let sink = std::sync::Arc::clone(&seen);
        let previous = panic::take_hook();
        panic::set_hook(Box::new(move |info| {
            let at = info.location().map(|l| l.file().to_string());
            sink.lock().unwrap().push(panic_line(info.payload(), at));
        }));

        let _ = panic::catch_unwind(|| panic!("scan failed"));

        let _ = panic::take_hook();
        panic::set_hook(previous);
        let lines = seen.lock().unwrap();
        assert_eq!(lines.len(), 1);
        assert!(lines[0].ends_with(": scan failed"), "{}", lines[0]);
        assert!(lines[0].contains("main.rs"), "{}", lines[0]);
    }
}
