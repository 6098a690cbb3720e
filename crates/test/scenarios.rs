use std::sync::atomic::AtomicUsize;
use std::sync::Arc;

use anyhow::{ensure, Result};
use libtest_mimic::{Arguments, Failed, Trial};

use clickgate_core::provider::scripted::{ActivationLog, CandidateTemplate, Outcome, ScriptedProvider};
use clickgate_test::{submit_button, vscode_settings, Fixture};

fn live_click_in_allowed_window() -> Result<()> {
    let fx = Fixture::single(vscode_settings(false, 0), vec![submit_button()]);
    fx.clock.advance_ms(10);

    ensure!(fx.engine.run_once(), "expected a click");
    ensure!(fx.log.count() == 1, "activation count {}", fx.log.count());
    ensure!(fx.engine.status().last_click_ts.is_some(), "last_click_ts not set");
    Ok(())
}

fn process_outside_allow_list() -> Result<()> {
    let fx = Fixture::single(
        vscode_settings(false, 0),
        vec![CandidateTemplate::new("Visual Studio Code", "notepad.exe", "Submit")],
    );

    ensure!(!fx.engine.run_once(), "must not match");
    ensure!(fx.log.count() == 0, "activation invoked");
    Ok(())
}

fn cooldown_window_is_half_open() -> Result<()> {
    let fx = Fixture::single(vscode_settings(false, 3000), vec![submit_button()]);

    ensure!(fx.engine.run_once(), "first click");
    ensure!(!fx.engine.run_once(), "matched at T");
    fx.clock.advance_ms(2999);
    ensure!(!fx.engine.run_once(), "matched just before T+C");
    ensure!(fx.log.count() == 1, "activation during cooldown");

    fx.clock.advance_ms(1);
    ensure!(fx.engine.run_once(), "no click at T+C");
    ensure!(fx.log.count() == 2, "activation count {}", fx.log.count());
    Ok(())
}

fn dry_run_leaves_click_timestamp() -> Result<()> {
    let fx = Fixture::single(vscode_settings(true, 1000), vec![submit_button()]);

    ensure!(fx.engine.run_once(), "dry-run should report a match");
    let status = fx.engine.status();
    ensure!(status.last_click_ts.is_none(), "dry-run recorded a click");
    ensure!(status.last_match.is_some(), "dry-run did not record the match");
    ensure!(fx.log.count() == 0, "dry-run activated");
    ensure!(!fx.engine.run_once(), "dry-run ignored cooldown");
    Ok(())
}

fn pause_skips_scanning() -> Result<()> {
    let fx = Fixture::single(vscode_settings(false, 0), vec![submit_button()]);
    fx.engine.toggle_paused();

    for _ in 0..5 {
        ensure!(!fx.engine.run_once(), "paused engine matched");
    }
    ensure!(fx.scan_count() == 0, "paused engine scanned {} times", fx.scan_count());
    Ok(())
}

fn reload_keeps_or_resets_pause() -> Result<()> {
    let fx = Fixture::single(vscode_settings(false, 0), vec![submit_button()]);

    fx.engine.toggle_paused();
    fx.engine.update_config(vscode_settings(false, 0), true);
    ensure!(fx.engine.status().paused, "pause lost on live reload");

    fx.engine.update_config(vscode_settings(false, 0), false);
    ensure!(!fx.engine.status().paused, "pause kept on reset");
    ensure!(fx.engine.run_once(), "unpaused engine should click");
    Ok(())
}

fn broken_provider_is_isolated() -> Result<()> {
    let log = ActivationLog::new();
    let good = ScriptedProvider::new("uia", vec![submit_button()], &log);
    let scans = good.scan_counter();
    let fx = Fixture::build(
        vscode_settings(false, 0),
        vec![Box::new(ScriptedProvider::failing("image")), Box::new(good)],
        log,
        scans,
    );

    ensure!(fx.engine.run_once(), "healthy provider was not consulted");
    ensure!(fx.scan_count() == 1, "healthy provider scans {}", fx.scan_count());
    Ok(())
}

fn priority_order_breaks_ties() -> Result<()> {
    let first = ActivationLog::new();
    let second = ActivationLog::new();
    let fx = Fixture::build(
        vscode_settings(false, 0),
        vec![
            Box::new(ScriptedProvider::empty("nothing")),
            Box::new(ScriptedProvider::new("primary", vec![submit_button()], &first)),
            Box::new(ScriptedProvider::new("fallback", vec![submit_button()], &second)),
        ],
        ActivationLog::new(),
        Arc::new(AtomicUsize::new(0)),
    );

    ensure!(fx.engine.run_once(), "no match");
    ensure!(first.count() == 1 && second.count() == 0, "wrong provider clicked");
    let summary = fx.engine.status().last_match.unwrap_or_default();
    ensure!(summary.starts_with("provider=primary "), "summary {summary:?}");
    Ok(())
}

fn declined_click_retries_next_tick() -> Result<()> {
    let fx = Fixture::single(
        vscode_settings(false, 60_000),
        vec![submit_button().outcome(Outcome::Decline)],
    );

    ensure!(!fx.engine.run_once(), "declined click counted as success");
    ensure!(!fx.engine.run_once(), "declined click counted as success");
    ensure!(fx.log.count() == 2, "no retry after decline");
    Ok(())
}

fn candidate_vanishes_between_cycles() -> Result<()> {
    let log = ActivationLog::new();
    let provider = ScriptedProvider::sequence("uia", vec![vec![submit_button()], vec![]], &log);
    let scans = provider.scan_counter();
    let fx = Fixture::build(vscode_settings(false, 0), vec![Box::new(provider)], log, scans);

    ensure!(fx.engine.run_once(), "first cycle should click");
    ensure!(!fx.engine.run_once(), "clicked a candidate that is gone");
    ensure!(fx.log.count() == 1, "activation count {}", fx.log.count());
    ensure!(fx.scan_count() == 2, "scans {}", fx.scan_count());
    Ok(())
}

fn trial(name: &'static str, f: fn() -> Result<()>) -> Trial {
    Trial::test(name, move || f().map_err(|e| Failed::from(format!("{e:#}"))))
}

fn main() {
    let args = Arguments::from_args();
    let trials = vec![
        trial("live_click_in_allowed_window", live_click_in_allowed_window),
        trial("process_outside_allow_list", process_outside_allow_list),
        trial("cooldown_window_is_half_open", cooldown_window_is_half_open),
        trial("dry_run_leaves_click_timestamp", dry_run_leaves_click_timestamp),
        trial("pause_skips_scanning", pause_skips_scanning),
        trial("reload_keeps_or_resets_pause", reload_keeps_or_resets_pause),
        trial("broken_provider_is_isolated", broken_provider_is_isolated),
        trial("priority_order_breaks_ties", priority_order_breaks_ties),
        trial("declined_click_retries_next_tick", declined_click_retries_next_tick),
        trial("candidate_vanishes_between_cycles", candidate_vanishes_between_cycles),
    ];
    libtest_mimic::run(&args, trials).exit();
}
