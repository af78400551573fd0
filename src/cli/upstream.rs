use anyhow::Result;
use clap::{Arg, ArgMatches, Command};

use crate::config::{self, Paths};
use crate::fork::{self, UpstreamStatus};
use crate::output::{MutationOutput, Output};

pub fn cmd() -> Command {
    Command::new("add-upstream")
        .about("Add the upstream remote if it is missing")
        .arg(Arg::new("url").help("Upstream URL (default: configured upstream-url)"))
}

pub fn run(matches: &ArgMatches, paths: &Paths) -> Result<Output> {
    let wc = super::open_repo(matches)?;
    let cfg = config::Config::load_from(&paths.config_path)?;
    let url = matches
        .get_one::<String>("url")
        .cloned()
        .or_else(|| cfg.upstream_url());

    let message = match fork::add_upstream(&wc, url.as_deref())? {
        UpstreamStatus::Added => format!("Added upstream {}", url.unwrap_or_default()),
        UpstreamStatus::Present { url } => format!("upstream already set to {}", url),
        UpstreamStatus::Mismatch { url: current } => {
            eprintln!(
                "warning: upstream points at {}, not {}; leaving it unchanged",
                current,
                url.unwrap_or_default()
            );
            format!("upstream already set to {}", current)
        }
    };
    Ok(Output::Mutation(MutationOutput { ok: true, message }))
}
