//! Branch reconciliation for a fork working copy.
//!
//! Two operations live here. [`ensure_branch`] gets the working copy onto a
//! named branch, creating it from origin when needed. [`sync_master`] brings
//! the default branch level with upstream and publishes it to origin.
//!
//! Both are fail-fast: the first fatal condition is returned as a
//! [`ReconcileError`] and nothing already done (fetches, checkouts, a stopped
//! rebase) is undone.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::repo::{ORIGIN, Repo, UPSTREAM};

pub const DEFAULT_BRANCH: &str = "master";

#[derive(Debug, Error)]
pub enum ReconcileError {
    /// The working copy or a remote it needs is missing.
    #[error("{what}")]
    NotFoundPrecondition { what: String },

    #[error("branch '{branch}' exists neither locally nor on origin")]
    BranchNotFound { branch: String },

    #[error("no '{branch}' branch locally, on origin or on upstream to start from")]
    NoMasterBranch { branch: String },

    /// The stopped rebase is left in the working copy.
    #[error(
        "rebasing '{branch}' onto {onto} stopped on conflicts; resolve them manually \
         (git rebase --continue, or git rebase --abort), then re-run"
    )]
    RebaseConflict { branch: String, onto: String },

    #[error(
        "'{branch}' has diverged from {onto} and on-diverge is 'fail'; \
         reconcile the histories manually, then re-run"
    )]
    Diverged { branch: String, onto: String },

    #[error(transparent)]
    ExternalTool(#[from] anyhow::Error),
}

/// Where a branch can be taken from, in order of preference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum BranchSource {
    UseLocal,
    TrackOrigin,
    TrackUpstream,
    NotFound,
}

impl BranchSource {
    pub fn describe(&self) -> &'static str {
        match self {
            BranchSource::UseLocal => "local",
            BranchSource::TrackOrigin => "origin",
            BranchSource::TrackUpstream => "upstream",
            BranchSource::NotFound => "none",
        }
    }
}

/// Looks for `branch` locally, then on origin, then (if `with_upstream`) on
/// upstream.
pub fn resolve_branch(
    repo: &dyn Repo,
    branch: &str,
    with_upstream: bool,
) -> Result<BranchSource, ReconcileError> {
    if repo.has_local_branch(branch) {
        return Ok(BranchSource::UseLocal);
    }
    if repo.has_remote_branch(ORIGIN, branch)? {
        return Ok(BranchSource::TrackOrigin);
    }
    if with_upstream && repo.has_remote_branch(UPSTREAM, branch)? {
        return Ok(BranchSource::TrackUpstream);
    }
    Ok(BranchSource::NotFound)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnsureOutcome {
    /// Already on the branch; fetched and pulled from origin.
    Updated { branch: String },
    /// Already on the branch, which origin does not have. Nothing done.
    NotOnOrigin { branch: String },
    /// Switched to an existing local branch.
    Switched { branch: String, from: String },
    /// Created a local branch tracking origin and switched to it.
    CreatedTracking { branch: String, from: String },
}

/// Puts the working copy on `requested` (or `default` when absent).
pub fn ensure_branch(
    repo: &dyn Repo,
    requested: Option<&str>,
    default: &str,
) -> Result<EnsureOutcome, ReconcileError> {
    let branch = requested.unwrap_or(default).to_string();
    let current = repo.current_branch()?;

    if current == branch {
        if !repo.has_remote_branch(ORIGIN, &branch)? {
            info!(%branch, "branch is not on origin, leaving it alone");
            return Ok(EnsureOutcome::NotOnOrigin { branch });
        }
        info!(%branch, "updating from origin");
        repo.fetch(ORIGIN, Some(&branch))?;
        repo.pull(ORIGIN, &branch)?;
        return Ok(EnsureOutcome::Updated { branch });
    }

    match resolve_branch(repo, &branch, false)? {
        BranchSource::UseLocal => {
            info!(%branch, from = %current, "switching to local branch");
            repo.checkout(&branch)?;
            Ok(EnsureOutcome::Switched {
                branch,
                from: current,
            })
        }
        BranchSource::TrackOrigin => {
            info!(%branch, from = %current, "creating branch from origin");
            // The remote-tracking ref may not exist yet.
            repo.fetch(ORIGIN, Some(&branch))?;
            repo.checkout_tracking(&branch, ORIGIN)?;
            Ok(EnsureOutcome::CreatedTracking {
                branch,
                from: current,
            })
        }
        BranchSource::TrackUpstream | BranchSource::NotFound => {
            Err(ReconcileError::BranchNotFound { branch })
        }
    }
}

/// What to do when the branch cannot be fast-forwarded to upstream.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DivergePolicy {
    /// Replay the branch's own commits on top of upstream.
    #[default]
    Rebase,
    /// Stop with [`ReconcileError::Diverged`] and leave history alone.
    Fail,
}

impl fmt::Display for DivergePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DivergePolicy::Rebase => write!(f, "rebase"),
            DivergePolicy::Fail => write!(f, "fail"),
        }
    }
}

impl FromStr for DivergePolicy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s {
            "rebase" => Ok(DivergePolicy::Rebase),
            "fail" => Ok(DivergePolicy::Fail),
            other => anyhow::bail!(
                "invalid on-diverge {:?}; must be 'rebase' or 'fail'",
                other
            ),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SyncSettings {
    pub branch: String,
    pub upstream_url: Option<String>,
    pub on_diverge: DivergePolicy,
}

impl Default for SyncSettings {
    fn default() -> Self {
        SyncSettings {
            branch: DEFAULT_BRANCH.to_string(),
            upstream_url: None,
            on_diverge: DivergePolicy::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Integration {
    UpToDate,
    FastForward { commits: u32 },
    Rebased { commits: u32 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncOutcome {
    pub branch: String,
    pub upstream_added: bool,
    pub seeded_from: BranchSource,
    pub integration: Integration,
}

/// Adds the upstream remote unless one is already configured. An existing
/// remote is never touched, whatever its URL. Returns whether it was added.
pub fn ensure_upstream(repo: &dyn Repo, url: Option<&str>) -> Result<bool, ReconcileError> {
    if repo.has_remote(UPSTREAM) {
        return Ok(false);
    }
    let url = url.ok_or_else(|| ReconcileError::NotFoundPrecondition {
        what: format!(
            "no '{}' remote and no upstream URL configured (set upstream-url or pass --upstream-url)",
            UPSTREAM
        ),
    })?;
    info!(%url, "adding upstream remote");
    repo.add_remote(UPSTREAM, url)?;
    Ok(true)
}

/// Brings the default branch level with upstream and pushes it to origin.
pub fn sync_master(
    repo: &dyn Repo,
    settings: &SyncSettings,
) -> Result<SyncOutcome, ReconcileError> {
    let branch = settings.branch.as_str();
    let upstream_added = ensure_upstream(repo, settings.upstream_url.as_deref())?;

    info!("fetching upstream and origin");
    repo.fetch(UPSTREAM, None)?;
    repo.fetch(ORIGIN, None)?;

    let seeded_from = resolve_branch(repo, branch, true)?;
    match seeded_from {
        BranchSource::UseLocal => repo.checkout(branch)?,
        BranchSource::TrackOrigin => repo.checkout_tracking(branch, ORIGIN)?,
        BranchSource::TrackUpstream => repo.checkout_tracking(branch, UPSTREAM)?,
        BranchSource::NotFound => {
            return Err(ReconcileError::NoMasterBranch {
                branch: branch.to_string(),
            });
        }
    }

    let onto = format!("{}/{}", UPSTREAM, branch);
    let integration = match repo.merge_ff_only(&onto)? {
        Some(0) => Integration::UpToDate,
        Some(commits) => Integration::FastForward { commits },
        None => match settings.on_diverge {
            DivergePolicy::Fail => {
                return Err(ReconcileError::Diverged {
                    branch: branch.to_string(),
                    onto,
                });
            }
            DivergePolicy::Rebase => {
                info!(%branch, %onto, "fast-forward impossible, rebasing");
                match repo.rebase(&onto)? {
                    Some(commits) => Integration::Rebased { commits },
                    None => {
                        return Err(ReconcileError::RebaseConflict {
                            branch: branch.to_string(),
                            onto,
                        });
                    }
                }
            }
        },
    };

    info!(%branch, "pushing to origin");
    repo.push(ORIGIN, branch)?;

    Ok(SyncOutcome {
        branch: branch.to_string(),
        upstream_added,
        seeded_from,
        integration,
    })
}
