use std::io::Write;

use anyhow::{Result, bail};
use serde::Serialize;
use tabwriter::TabWriter;

use crate::reconcile::{EnsureOutcome, Integration};

// ---------------------------------------------------------------------------
// Table helper
// ---------------------------------------------------------------------------

pub struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
    dest: Box<dyn Write>,
}

impl Table {
    pub fn new(w: Box<dyn Write>, headers: Vec<String>) -> Self {
        Table {
            headers,
            rows: Vec::new(),
            dest: w,
        }
    }

    pub fn add_row(&mut self, columns: Vec<String>) -> Result<()> {
        if columns.len() != self.headers.len() {
            bail!(
                "row has {} columns, expected {}",
                columns.len(),
                self.headers.len()
            );
        }
        self.rows.push(columns);
        Ok(())
    }

    pub fn render(&mut self) -> Result<()> {
        if self.headers.is_empty() {
            return Ok(());
        }

        let buf = render_buf(&self.headers, &self.rows)?;
        self.dest.write_all(&buf)?;
        Ok(())
    }
}

fn render_buf(headers: &[String], rows: &[Vec<String>]) -> Result<Vec<u8>> {
    let mut tw = TabWriter::new(Vec::new()).minwidth(0).padding(2);

    let upper: Vec<String> = headers.iter().map(|h| h.to_uppercase()).collect();
    writeln!(tw, "{}", upper.join("\t"))?;

    for row in rows {
        writeln!(tw, "{}", row.join("\t"))?;
    }

    tw.flush()?;
    Ok(tw.into_inner()?)
}

pub fn format_integration(integration: &Integration) -> String {
    match integration {
        Integration::UpToDate => "already up to date".into(),
        Integration::FastForward { commits } => format!("fast-forwarded {} commit(s)", commits),
        Integration::Rebased { commits } => format!("{} commit(s) rebased", commits),
    }
}

pub fn format_ensure(outcome: &EnsureOutcome) -> String {
    match outcome {
        EnsureOutcome::Updated { branch } => {
            format!("Updated {} from origin/{}", branch, branch)
        }
        EnsureOutcome::NotOnOrigin { branch } => {
            format!("On {}; branch does not exist on origin, nothing to update", branch)
        }
        EnsureOutcome::Switched { branch, from } => {
            format!("Switched from {} to {}", from, branch)
        }
        EnsureOutcome::CreatedTracking { branch, from } => format!(
            "Switched from {} to new branch {} tracking origin/{}",
            from, branch, branch
        ),
    }
}

fn mark(present: bool) -> String {
    if present { "yes".into() } else { "-".into() }
}

// ---------------------------------------------------------------------------
// JSON-serializable output types
// ---------------------------------------------------------------------------

#[derive(Serialize)]
pub struct EnsureBranchOutput {
    pub branch: String,
    pub action: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
    pub message: String,
}

#[derive(Serialize)]
pub struct SyncOutput {
    pub branch: String,
    pub upstream_added: bool,
    pub seeded_from: String,
    pub action: String,
    pub commits: u32,
    pub message: String,
}

#[derive(Serialize)]
pub struct BranchListOutput {
    pub branches: Vec<BranchListEntry>,
}

#[derive(Serialize)]
pub struct BranchListEntry {
    pub name: String,
    pub current: bool,
    pub local: bool,
    pub origin: bool,
    pub upstream: bool,
}

#[derive(Serialize)]
pub struct FetchOutput {
    pub remotes: Vec<String>,
    pub prune: bool,
}

#[derive(Serialize)]
pub struct ConfigListOutput {
    pub entries: Vec<ConfigListEntry>,
}

#[derive(Serialize)]
pub struct ConfigListEntry {
    pub key: String,
    pub value: String,
}

#[derive(Serialize)]
pub struct ConfigGetOutput {
    pub key: String,
    pub value: Option<String>,
}

#[derive(Serialize)]
pub struct MutationOutput {
    pub ok: bool,
    pub message: String,
}

#[derive(Serialize)]
pub struct ErrorOutput {
    pub error: String,
}

// ---------------------------------------------------------------------------
// Output enum, returned by all command handlers
// ---------------------------------------------------------------------------

pub enum Output {
    EnsureBranch(EnsureBranchOutput),
    Sync(SyncOutput),
    BranchList(BranchListOutput),
    Fetch(FetchOutput),
    ConfigList(ConfigListOutput),
    ConfigGet(ConfigGetOutput),
    Mutation(MutationOutput),
    None,
}

// ---------------------------------------------------------------------------
// Central render function
// ---------------------------------------------------------------------------

pub fn render(output: Output, json: bool) -> Result<()> {
    if json {
        return match output {
            Output::None => Ok(()),
            Output::EnsureBranch(v) => print_json(&v),
            Output::Sync(v) => print_json(&v),
            Output::BranchList(v) => print_json(&v),
            Output::Fetch(v) => print_json(&v),
            Output::ConfigList(v) => print_json(&v),
            Output::ConfigGet(v) => print_json(&v),
            Output::Mutation(v) => print_json(&v),
        };
    }
    match output {
        Output::None => Ok(()),
        Output::EnsureBranch(v) => render_message(&v.message),
        Output::Sync(v) => render_message(&v.message),
        Output::BranchList(v) => render_branch_list_table(v),
        Output::Fetch(v) => render_fetch_text(v),
        Output::ConfigList(v) => render_config_list_text(v),
        Output::ConfigGet(v) => render_config_get_text(v),
        Output::Mutation(v) => render_message(&v.message),
    }
}

fn print_json(value: &impl Serialize) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

// ---------------------------------------------------------------------------
// Text/table renderers
// ---------------------------------------------------------------------------

fn render_message(message: &str) -> Result<()> {
    println!("{}", message);
    Ok(())
}

fn branch_rows(v: &BranchListOutput) -> Vec<Vec<String>> {
    v.branches
        .iter()
        .map(|b| {
            let name = if b.current {
                format!("* {}", b.name)
            } else {
                format!("  {}", b.name)
            };
            vec![name, mark(b.local), mark(b.origin), mark(b.upstream)]
        })
        .collect()
}

fn render_branch_list_table(v: BranchListOutput) -> Result<()> {
    if v.branches.is_empty() {
        println!("No branches.");
        return Ok(());
    }
    let mut table = Table::new(
        Box::new(std::io::stdout()),
        vec![
            "Branch".to_string(),
            "Local".to_string(),
            "Origin".to_string(),
            "Upstream".to_string(),
        ],
    );
    for row in branch_rows(&v) {
        table.add_row(row)?;
    }
    table.render()
}

fn render_fetch_text(v: FetchOutput) -> Result<()> {
    if v.remotes.is_empty() {
        println!("No remotes to fetch.");
    } else {
        println!("Fetched {}", v.remotes.join(", "));
    }
    Ok(())
}

fn render_config_list_text(v: ConfigListOutput) -> Result<()> {
    let mut table = Table::new(
        Box::new(std::io::stdout()),
        vec!["Key".to_string(), "Value".to_string()],
    );
    for e in &v.entries {
        table.add_row(vec![e.key.clone(), e.value.clone()])?;
    }
    table.render()
}

fn render_config_get_text(v: ConfigGetOutput) -> Result<()> {
    match &v.value {
        Some(val) => println!("{}", val),
        None => println!("(not set)"),
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
