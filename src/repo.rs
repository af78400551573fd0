use std::path::{Path, PathBuf};

use anyhow::Result;

use crate::git;
use crate::reconcile::ReconcileError;

pub const ORIGIN: &str = "origin";
pub const UPSTREAM: &str = "upstream";

/// The queries and mutations the branch reconciler needs from a working copy.
///
/// Remote branch queries go to the remote itself, so answers reflect the
/// remote at the time of the call rather than the last fetch.
pub trait Repo {
    fn current_branch(&self) -> Result<String>;
    fn has_local_branch(&self, branch: &str) -> bool;
    fn has_remote_branch(&self, remote: &str, branch: &str) -> Result<bool>;
    fn has_remote(&self, name: &str) -> bool;
    fn add_remote(&self, name: &str, url: &str) -> Result<()>;
    fn fetch(&self, remote: &str, branch: Option<&str>) -> Result<()>;
    fn checkout(&self, branch: &str) -> Result<()>;
    /// Creates `branch` tracking `<remote>/<branch>` and switches to it.
    fn checkout_tracking(&self, branch: &str, remote: &str) -> Result<()>;
    /// `Some(commits)` when HEAD was fast-forwarded (0 if already there),
    /// `None` when the histories have diverged.
    fn merge_ff_only(&self, target: &str) -> Result<Option<u32>>;
    /// `Some(commits)` replayed, or `None` when the rebase stopped on
    /// conflicts and was left in progress.
    fn rebase(&self, onto: &str) -> Result<Option<u32>>;
    fn pull(&self, remote: &str, branch: &str) -> Result<()>;
    fn push(&self, remote: &str, branch: &str) -> Result<()>;
}

/// A git working copy on disk, driven through the `git` executable.
#[derive(Debug, Clone)]
pub struct WorkingCopy {
    dir: PathBuf,
}

impl WorkingCopy {
    /// Opens `dir` as a fork working copy: it must exist, be a git work tree
    /// and have an `origin` remote.
    pub fn open(dir: &Path) -> Result<WorkingCopy, ReconcileError> {
        if !dir.is_dir() {
            return Err(ReconcileError::NotFoundPrecondition {
                what: format!("directory {} does not exist", dir.display()),
            });
        }
        if !git::is_repo(dir) {
            return Err(ReconcileError::NotFoundPrecondition {
                what: format!("{} is not a git working copy", dir.display()),
            });
        }
        if !git::remote_exists(dir, ORIGIN) {
            return Err(ReconcileError::NotFoundPrecondition {
                what: format!("{} has no '{}' remote", dir.display(), ORIGIN),
            });
        }
        Ok(WorkingCopy {
            dir: dir.to_path_buf(),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl Repo for WorkingCopy {
    fn current_branch(&self) -> Result<String> {
        git::branch_current(&self.dir)
    }

    fn has_local_branch(&self, branch: &str) -> bool {
        git::branch_exists(&self.dir, branch)
    }

    fn has_remote_branch(&self, remote: &str, branch: &str) -> Result<bool> {
        git::remote_branch_exists(&self.dir, remote, branch)
    }

    fn has_remote(&self, name: &str) -> bool {
        git::remote_exists(&self.dir, name)
    }

    fn add_remote(&self, name: &str, url: &str) -> Result<()> {
        git::remote_add(&self.dir, name, url)
    }

    fn fetch(&self, remote: &str, branch: Option<&str>) -> Result<()> {
        git::fetch(&self.dir, remote, branch, false)
    }

    fn checkout(&self, branch: &str) -> Result<()> {
        git::checkout(&self.dir, branch)
    }

    fn checkout_tracking(&self, branch: &str, remote: &str) -> Result<()> {
        git::checkout_track(&self.dir, branch, remote)
    }

    fn merge_ff_only(&self, target: &str) -> Result<Option<u32>> {
        git::merge_ff_only(&self.dir, target)
    }

    fn rebase(&self, onto: &str) -> Result<Option<u32>> {
        git::rebase(&self.dir, onto)
    }

    fn pull(&self, remote: &str, branch: &str) -> Result<()> {
        git::pull(&self.dir, remote, branch)
    }

    fn push(&self, remote: &str, branch: &str) -> Result<()> {
        git::push(&self.dir, remote, branch)
    }
}
