use std::io::Write;

use anyhow::{Result, bail};
use clap::ArgMatches;
use clap_complete::generate;
use clap_complete::shells::{Bash, Fish, Zsh};

use crate::output::Output;

use super::build_cli;

pub fn run(matches: &ArgMatches) -> Result<Output> {
    let shell = matches.get_one::<String>("shell").unwrap();
    generate_for(shell, &mut std::io::stdout())?;
    Ok(Output::None)
}

fn generate_for(shell: &str, w: &mut dyn Write) -> Result<()> {
    let mut app = build_cli();
    match shell {
        "bash" => generate(Bash, &mut app, "forkup", w),
        "zsh" => generate(Zsh, &mut app, "forkup", w),
        "fish" => generate(Fish, &mut app, "forkup", w),
        _ => bail!("unsupported shell: {} (supported: bash, zsh, fish)", shell),
    }
    Ok(())
}
