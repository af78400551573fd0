mod cli;
mod config;
mod fork;
mod git;
mod giturl;
mod output;
mod reconcile;
mod repo;
#[cfg(test)]
mod testutil;

use std::process;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use clap_complete::CompleteEnv;
use tracing_subscriber::EnvFilter;

/// Overrides the level picked from `-v` flags, e.g. `FORKUP_LOG=debug`.
const LOG_ENV: &str = "FORKUP_LOG";

fn main() {
    CompleteEnv::with_factory(cli::build_cli).complete();

    let interrupted = Arc::new(AtomicBool::new(false));
    let i = interrupted.clone();
    let _ = ctrlc::set_handler(move || {
        i.store(true, Ordering::SeqCst);
    });

    let app = cli::build_cli();
    let matches = app.get_matches();
    let json = matches.get_flag("json");
    init_logging(matches.get_count("verbose"));

    let paths = match config::Paths::resolve() {
        Ok(p) => p,
        Err(err) => {
            render_error(err, json);
            process::exit(1);
        }
    };

    match cli::dispatch(&matches, &paths) {
        Ok(out) => {
            if let Err(err) = output::render(out, json) {
                render_error(err, json);
                process::exit(1);
            }
        }
        Err(err) => {
            if interrupted.load(Ordering::SeqCst) {
                process::exit(130);
            }
            render_error(err, json);
            process::exit(1);
        }
    }
}

fn init_logging(verbosity: u8) {
    let level = match verbosity {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn render_error(err: anyhow::Error, json: bool) {
    if json {
        let _ = serde_json::to_string_pretty(&output::ErrorOutput {
            error: format!("{:#}", err),
        })
        .map(|s| println!("{}", s));
    } else {
        eprintln!("Error: {:#}", err);
    }
}
