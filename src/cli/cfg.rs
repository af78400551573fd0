use anyhow::{Result, bail};
use clap::{Arg, ArgMatches, Command};

use crate::config::{self, Config, Paths};
use crate::output::{ConfigGetOutput, ConfigListEntry, ConfigListOutput, MutationOutput, Output};
use crate::reconcile::DivergePolicy;

const KEYS: [&str; 3] = ["upstream-url", "default-branch", "on-diverge"];

pub fn list_cmd() -> Command {
    Command::new("list").about("List all config values")
}

pub fn get_cmd() -> Command {
    Command::new("get")
        .about("Get a config value")
        .arg(Arg::new("key").required(true).value_parser(KEYS))
}

pub fn set_cmd() -> Command {
    Command::new("set")
        .about("Set a config value")
        .arg(Arg::new("key").required(true).value_parser(KEYS))
        .arg(Arg::new("value").required(true))
}

pub fn unset_cmd() -> Command {
    Command::new("unset")
        .about("Unset a config value")
        .arg(Arg::new("key").required(true).value_parser(KEYS))
}

/// Effective value of `key`, with defaults filled in.
fn effective(cfg: &Config, key: &str) -> Result<Option<String>> {
    match key {
        "upstream-url" => Ok(cfg.upstream_url.clone()),
        "default-branch" => Ok(Some(cfg.default_branch().to_string())),
        "on-diverge" => Ok(Some(cfg.on_diverge.unwrap_or_default().to_string())),
        _ => bail!("unknown config key: {}", key),
    }
}

fn set(cfg: &mut Config, key: &str, value: &str) -> Result<()> {
    match key {
        "upstream-url" => cfg.upstream_url = Some(value.to_string()),
        "default-branch" => {
            if value.is_empty() {
                bail!("default-branch cannot be empty");
            }
            cfg.default_branch = Some(value.to_string());
        }
        "on-diverge" => cfg.on_diverge = Some(value.parse::<DivergePolicy>()?),
        _ => bail!("unknown config key: {}", key),
    }
    Ok(())
}

fn unset(cfg: &mut Config, key: &str) -> Result<()> {
    match key {
        "upstream-url" => cfg.upstream_url = None,
        "default-branch" => cfg.default_branch = None,
        "on-diverge" => cfg.on_diverge = None,
        _ => bail!("unknown config key: {}", key),
    }
    Ok(())
}

pub fn run_list(_matches: &ArgMatches, paths: &Paths) -> Result<Output> {
    let cfg = config::Config::load_from(&paths.config_path)?;
    let mut entries = Vec::new();
    for key in KEYS {
        entries.push(ConfigListEntry {
            key: key.to_string(),
            value: effective(&cfg, key)?.unwrap_or_else(|| "(not set)".to_string()),
        });
    }
    Ok(Output::ConfigList(ConfigListOutput { entries }))
}

pub fn run_get(matches: &ArgMatches, paths: &Paths) -> Result<Output> {
    let key = matches.get_one::<String>("key").unwrap();
    let cfg = config::Config::load_from(&paths.config_path)?;
    Ok(Output::ConfigGet(ConfigGetOutput {
        key: key.clone(),
        value: effective(&cfg, key)?,
    }))
}

pub fn run_set(matches: &ArgMatches, paths: &Paths) -> Result<Output> {
    let key = matches.get_one::<String>("key").unwrap();
    let value = matches.get_one::<String>("value").unwrap();
    let mut cfg = config::Config::load_from(&paths.config_path)?;
    set(&mut cfg, key, value)?;
    cfg.save_to(&paths.config_path)?;
    Ok(Output::Mutation(MutationOutput {
        ok: true,
        message: format!("{} = {}", key, value),
    }))
}

pub fn run_unset(matches: &ArgMatches, paths: &Paths) -> Result<Output> {
    let key = matches.get_one::<String>("key").unwrap();
    let mut cfg = config::Config::load_from(&paths.config_path)?;
    unset(&mut cfg, key)?;
    cfg.save_to(&paths.config_path)?;
    let message = match effective(&cfg, key)? {
        Some(default) => format!("{} unset (default: {})", key, default),
        None => format!("{} unset", key),
    };
    Ok(Output::Mutation(MutationOutput { ok: true, message }))
}
