use anyhow::Result;
use clap::{Arg, ArgAction, ArgMatches, Command};

use crate::config::Paths;
use crate::fork;
use crate::output::{FetchOutput, Output};

pub fn cmd() -> Command {
    Command::new("fetch")
        .about("Fetch origin and upstream")
        .arg(
            Arg::new("prune")
                .long("prune")
                .action(ArgAction::SetTrue)
                .help("Remove remote-tracking refs that no longer exist on the remote"),
        )
}

pub fn run(matches: &ArgMatches, _paths: &Paths) -> Result<Output> {
    let wc = super::open_repo(matches)?;
    let prune = matches.get_flag("prune");
    let remotes = fork::fetch_all(&wc, prune)?;
    Ok(Output::Fetch(FetchOutput { remotes, prune }))
}
