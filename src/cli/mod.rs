pub mod branches;
pub mod cfg;
pub mod clone;
pub mod completers;
pub mod completion;
pub mod ensure;
pub mod fetch;
pub mod sync;
pub mod upstream;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Arg, ArgAction, ArgMatches, Command};

use crate::config::Paths;
use crate::output::Output;
use crate::repo::WorkingCopy;

pub fn build_cli() -> Command {
    let config = Command::new("config")
        .about("Manage forkup configuration")
        .subcommand_required(true)
        .subcommand(cfg::list_cmd())
        .subcommand(cfg::get_cmd())
        .subcommand(cfg::set_cmd())
        .subcommand(cfg::unset_cmd());

    Command::new("forkup")
        .about("Keep a git fork in step with its upstream")
        .version(env!("FORKUP_VERSION_STRING"))
        .subcommand_required(true)
        .arg(
            Arg::new("json")
                .long("json")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Print results as JSON"),
        )
        .arg(
            Arg::new("dir")
                .short('C')
                .global(true)
                .value_name("PATH")
                .help("Run in PATH instead of the current directory"),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .global(true)
                .action(ArgAction::Count)
                .help("Log more (-v info, -vv debug)"),
        )
        .subcommand(ensure::cmd())
        .subcommand(sync::cmd())
        .subcommand(clone::cmd())
        .subcommand(upstream::cmd())
        .subcommand(branches::cmd())
        .subcommand(fetch::cmd())
        .subcommand(config)
        .subcommand(
            Command::new("completion")
                .about("Output shell completions")
                .hide(true)
                .arg(
                    Arg::new("shell")
                        .required(true)
                        .value_parser(["bash", "zsh", "fish"]),
                ),
        )
}

pub fn dispatch(matches: &ArgMatches, paths: &Paths) -> Result<Output> {
    match matches.subcommand() {
        Some(("ensure-branch", m)) => ensure::run(m, paths),
        Some(("sync-master", m)) => sync::run(m, paths),
        Some(("clone", m)) => clone::run(m, paths),
        Some(("add-upstream", m)) => upstream::run(m, paths),
        Some(("branches", m)) => branches::run(m, paths),
        Some(("fetch", m)) => fetch::run(m, paths),
        Some(("config", sub)) => match sub.subcommand() {
            Some(("list", m)) => cfg::run_list(m, paths),
            Some(("get", m)) => cfg::run_get(m, paths),
            Some(("set", m)) => cfg::run_set(m, paths),
            Some(("unset", m)) => cfg::run_unset(m, paths),
            _ => unreachable!(),
        },
        Some(("completion", m)) => completion::run(m),
        _ => unreachable!(),
    }
}

/// The directory given with `-C`, or the current directory.
pub fn work_dir(matches: &ArgMatches) -> Result<PathBuf> {
    match matches.try_get_one::<String>("dir").ok().flatten() {
        Some(d) => Ok(PathBuf::from(d)),
        None => Ok(std::env::current_dir()?),
    }
}

pub fn open_repo(matches: &ArgMatches) -> Result<WorkingCopy> {
    let dir = work_dir(matches)?;
    Ok(WorkingCopy::open(&dir)?)
}
