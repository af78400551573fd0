use anyhow::Result;
use clap::{Arg, ArgMatches, Command};
use clap_complete::engine::ArgValueCandidates;

use super::completers;
use crate::config::{self, Paths};
use crate::output::{self, EnsureBranchOutput, Output};
use crate::reconcile::{self, EnsureOutcome};

pub fn cmd() -> Command {
    Command::new("ensure-branch")
        .about("Switch to a branch, creating it from origin or updating it from origin")
        .arg(
            Arg::new("name")
                .help("Branch name (default: the configured default branch)")
                .add(ArgValueCandidates::new(completers::complete_branches)),
        )
}

pub fn run(matches: &ArgMatches, paths: &Paths) -> Result<Output> {
    let wc = super::open_repo(matches)?;
    let cfg = config::Config::load_from(&paths.config_path)?;
    let requested = matches.get_one::<String>("name").map(|s| s.as_str());

    let outcome = reconcile::ensure_branch(&wc, requested, cfg.default_branch())?;
    Ok(Output::EnsureBranch(to_output(&outcome)))
}

fn to_output(outcome: &EnsureOutcome) -> EnsureBranchOutput {
    let message = output::format_ensure(outcome);
    let (branch, action, from) = match outcome {
        EnsureOutcome::Updated { branch } => (branch, "updated", None),
        EnsureOutcome::NotOnOrigin { branch } => (branch, "not-on-origin", None),
        EnsureOutcome::Switched { branch, from } => (branch, "switched", Some(from.clone())),
        EnsureOutcome::CreatedTracking { branch, from } => {
            (branch, "created-tracking", Some(from.clone()))
        }
    };
    EnsureBranchOutput {
        branch: branch.clone(),
        action: action.to_string(),
        from,
        message,
    }
}
