use anyhow::Result;
use clap::{ArgMatches, Command};

use crate::config::Paths;
use crate::fork;
use crate::output::{BranchListEntry, BranchListOutput, Output};

pub fn cmd() -> Command {
    Command::new("branches").about("List branches locally, on origin and on upstream")
}

pub fn run(matches: &ArgMatches, _paths: &Paths) -> Result<Output> {
    let wc = super::open_repo(matches)?;
    let branches = fork::list_branches(&wc)?
        .into_iter()
        .map(|r| BranchListEntry {
            name: r.name,
            current: r.current,
            local: r.local,
            origin: r.origin,
            upstream: r.upstream,
        })
        .collect();
    Ok(Output::BranchList(BranchListOutput { branches }))
}
