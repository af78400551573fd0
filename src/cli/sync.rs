use anyhow::Result;
use clap::{Arg, ArgMatches, Command};

use crate::config::{self, Paths};
use crate::output::{self, Output, SyncOutput};
use crate::reconcile::{self, DivergePolicy, Integration, SyncOutcome, SyncSettings};

pub fn cmd() -> Command {
    Command::new("sync-master")
        .about("Bring the default branch level with upstream and push it to origin")
        .arg(
            Arg::new("upstream-url")
                .long("upstream-url")
                .value_name("URL")
                .help("URL to add as the upstream remote if it is missing"),
        )
        .arg(
            Arg::new("on-diverge")
                .long("on-diverge")
                .value_parser(["rebase", "fail"])
                .help("When fast-forward is impossible: rebase (default) or fail"),
        )
}

/// Applies command-line overrides on top of the configured settings.
fn settings(matches: &ArgMatches, cfg: &config::Config) -> Result<SyncSettings> {
    let mut s = cfg.sync_settings();
    if let Some(url) = matches.get_one::<String>("upstream-url") {
        s.upstream_url = Some(url.clone());
    }
    if let Some(p) = matches.get_one::<String>("on-diverge") {
        s.on_diverge = p.parse::<DivergePolicy>()?;
    }
    Ok(s)
}

pub fn run(matches: &ArgMatches, paths: &Paths) -> Result<Output> {
    let wc = super::open_repo(matches)?;
    let cfg = config::Config::load_from(&paths.config_path)?;
    let s = settings(matches, &cfg)?;

    eprintln!("Syncing {} with upstream/{}...", s.branch, s.branch);
    let outcome = reconcile::sync_master(&wc, &s)?;
    Ok(Output::Sync(to_output(&outcome)))
}

fn to_output(outcome: &SyncOutcome) -> SyncOutput {
    let (action, commits) = match outcome.integration {
        Integration::UpToDate => ("up-to-date", 0),
        Integration::FastForward { commits } => ("fast-forward", commits),
        Integration::Rebased { commits } => ("rebase", commits),
    };
    let mut message = format!(
        "{}: {}, pushed to origin",
        outcome.branch,
        output::format_integration(&outcome.integration)
    );
    if outcome.upstream_added {
        message = format!("Added upstream remote\n{}", message);
    }
    SyncOutput {
        branch: outcome.branch.clone(),
        upstream_added: outcome.upstream_added,
        seeded_from: outcome.seeded_from.describe().to_string(),
        action: action.to_string(),
        commits,
        message,
    }
}
