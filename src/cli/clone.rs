use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Arg, ArgMatches, Command};

use crate::config::{self, Paths};
use crate::fork;
use crate::output::{MutationOutput, Output};

pub fn cmd() -> Command {
    Command::new("clone")
        .about("Clone a fork and add its upstream remote")
        .arg(Arg::new("url").required(true).help("URL of the fork"))
        .arg(
            Arg::new("dest")
                .help("Destination directory (default: repo name from the URL)"),
        )
        .arg(
            Arg::new("upstream-url")
                .long("upstream-url")
                .value_name("URL")
                .help("URL of the repository the fork was made from"),
        )
}

pub fn run(matches: &ArgMatches, paths: &Paths) -> Result<Output> {
    let url = matches.get_one::<String>("url").unwrap();
    let parent = super::work_dir(matches)?;
    let dest = match matches.get_one::<String>("dest") {
        Some(d) => parent.join(PathBuf::from(d)),
        None => fork::default_clone_dir(&parent, url)?,
    };

    let cfg = config::Config::load_from(&paths.config_path)?;
    let upstream_url = matches
        .get_one::<String>("upstream-url")
        .cloned()
        .or_else(|| cfg.upstream_url());

    eprintln!("Cloning {}...", url);
    let cloned = fork::clone_fork(url, &dest, upstream_url.as_deref()).context("cloning")?;

    let message = match (cloned.upstream_added, upstream_url) {
        (true, Some(up)) => format!("Cloned into {} (upstream: {})", cloned.dir.display(), up),
        _ => format!(
            "Cloned into {} (no upstream URL configured; run add-upstream)",
            cloned.dir.display()
        ),
    };
    Ok(Output::Mutation(MutationOutput { ok: true, message }))
}
