use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Result, bail};
use tracing::info;

use crate::git;
use crate::giturl;
use crate::reconcile::{self, ReconcileError};
use crate::repo::{ORIGIN, UPSTREAM, WorkingCopy};

/// Where `clone` puts a fork when no destination is given: the repo name
/// from the URL, under `parent`.
pub fn default_clone_dir(parent: &Path, url: &str) -> Result<PathBuf> {
    let parsed = giturl::parse(url)
        .map_err(|e| anyhow::anyhow!("cannot derive a directory from {}: {}", url, e))?;
    Ok(parent.join(parsed.repo))
}

#[derive(Debug)]
pub struct Cloned {
    pub dir: PathBuf,
    pub upstream_added: bool,
}

/// Clones the fork at `url` into `dest` and, when `upstream_url` is known,
/// adds it as the `upstream` remote.
pub fn clone_fork(url: &str, dest: &Path, upstream_url: Option<&str>) -> Result<Cloned> {
    if dest.exists() {
        bail!("{} already exists", dest.display());
    }
    if let Some(up) = upstream_url
        && giturl::same_repo(url, up)
    {
        bail!("upstream URL {} is the fork itself", up);
    }

    info!(%url, dest = %dest.display(), "cloning fork");
    git::clone(url, dest)?;

    let wc = WorkingCopy::open(dest)?;
    let upstream_added = match upstream_url {
        Some(up) => reconcile::ensure_upstream(&wc, Some(up))?,
        None => false,
    };
    Ok(Cloned {
        dir: dest.to_path_buf(),
        upstream_added,
    })
}

pub enum UpstreamStatus {
    Added,
    Present { url: String },
    /// Present, but pointing somewhere other than the requested URL.
    Mismatch { url: String },
}

/// Adds the upstream remote if missing. An existing remote is never changed.
pub fn add_upstream(wc: &WorkingCopy, url: Option<&str>) -> Result<UpstreamStatus, ReconcileError> {
    if reconcile::ensure_upstream(wc, url)? {
        return Ok(UpstreamStatus::Added);
    }
    let current = git::remote_url(wc.dir(), UPSTREAM)?;
    match url {
        Some(want) if !giturl::same_repo(want, &current) => {
            Ok(UpstreamStatus::Mismatch { url: current })
        }
        _ => Ok(UpstreamStatus::Present { url: current }),
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BranchRow {
    pub name: String,
    pub current: bool,
    pub local: bool,
    pub origin: bool,
    pub upstream: bool,
}

/// Every branch known locally, on origin, or on upstream (when configured).
pub fn list_branches(wc: &WorkingCopy) -> Result<Vec<BranchRow>> {
    let dir = wc.dir();
    let current = git::branch_current(dir).ok();
    let mut rows: BTreeMap<String, BranchRow> = BTreeMap::new();

    for b in git::local_branches(dir)? {
        row(&mut rows, &b).local = true;
    }
    for b in git::remote_branches(dir, ORIGIN)? {
        row(&mut rows, &b).origin = true;
    }
    if git::remote_exists(dir, UPSTREAM) {
        for b in git::remote_branches(dir, UPSTREAM)? {
            row(&mut rows, &b).upstream = true;
        }
    }

    if let Some(cur) = current
        && let Some(r) = rows.get_mut(&cur)
    {
        r.current = true;
    }
    Ok(rows.into_values().collect())
}

fn row<'a>(rows: &'a mut BTreeMap<String, BranchRow>, name: &str) -> &'a mut BranchRow {
    rows.entry(name.to_string()).or_insert_with(|| BranchRow {
        name: name.to_string(),
        ..BranchRow::default()
    })
}

/// Fetches origin and, when configured, upstream. Returns the remotes fetched.
pub fn fetch_all(wc: &WorkingCopy, prune: bool) -> Result<Vec<String>> {
    let mut fetched = Vec::new();
    for remote in [ORIGIN, UPSTREAM] {
        if !git::remote_exists(wc.dir(), remote) {
            continue;
        }
        eprintln!("Fetching {}...", remote);
        git::fetch(wc.dir(), remote, None, prune)?;
        fetched.push(remote.to_string());
    }
    Ok(fetched)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{Fork, git as sh, push_branch_to_origin};

    #[test]
    fn test_default_clone_dir() {
        let d = default_clone_dir(Path::new("/src"), "git@github.com:me/tool.git").unwrap();
        assert_eq!(d, PathBuf::from("/src/tool"));
        assert!(default_clone_dir(Path::new("/src"), "/local/path").is_err());
    }

    #[test]
    fn test_clone_fork_adds_upstream() {
        let fork = Fork::new();
        let dest = fork.root.path().join("second");
        let cloned = clone_fork(
            fork.origin.to_str().unwrap(),
            &dest,
            Some(fork.upstream.to_str().unwrap()),
        )
        .unwrap();
        assert!(cloned.upstream_added);
        assert_eq!(
            git::remote_url(&dest, UPSTREAM).unwrap(),
            fork.upstream.to_str().unwrap()
        );
    }

    #[test]
    fn test_clone_fork_without_upstream() {
        let fork = Fork::new();
        let dest = fork.root.path().join("second");
        let cloned = clone_fork(fork.origin.to_str().unwrap(), &dest, None).unwrap();
        assert!(!cloned.upstream_added);
        assert!(!git::remote_exists(&dest, UPSTREAM));
    }

    #[test]
    fn test_clone_fork_existing_dest() {
        let fork = Fork::new();
        let err = clone_fork(fork.origin.to_str().unwrap(), &fork.work, None).unwrap_err();
        assert!(err.to_string().contains("already exists"), "{}", err);
    }

    #[test]
    fn test_clone_fork_rejects_self_as_upstream() {
        let fork = Fork::new();
        let origin = fork.origin.to_str().unwrap();
        let dest = fork.root.path().join("second");
        assert!(clone_fork(origin, &dest, Some(origin)).is_err());
        assert!(!dest.exists());
    }

    #[test]
    fn test_add_upstream_states() {
        let fork = Fork::new();
        let wc = WorkingCopy::open(&fork.work).unwrap();
        let up = fork.upstream.to_str().unwrap();

        assert!(matches!(
            add_upstream(&wc, Some(up)).unwrap(),
            UpstreamStatus::Present { .. }
        ));
        assert!(matches!(
            add_upstream(&wc, Some("/elsewhere")).unwrap(),
            UpstreamStatus::Mismatch { .. }
        ));

        sh(&fork.work, &["remote", "remove", "upstream"]);
        assert!(matches!(
            add_upstream(&wc, Some(up)).unwrap(),
            UpstreamStatus::Added
        ));
        assert!(add_upstream(&wc, None).is_ok());
    }

    #[test]
    fn test_list_branches() {
        let fork = Fork::new();
        push_branch_to_origin(&fork, "feature-x", "x.txt");
        sh(&fork.work, &["branch", "scratch"]);
        let wc = WorkingCopy::open(&fork.work).unwrap();

        let rows = list_branches(&wc).unwrap();
        let names: Vec<&str> = rows.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["feature-x", "master", "scratch"]);

        let master = &rows[1];
        assert!(master.current && master.local && master.origin && master.upstream);
        assert!(!rows[0].local && rows[0].origin && !rows[0].upstream);
        assert!(rows[2].local && !rows[2].origin && !rows[2].current);
    }

    #[test]
    fn test_fetch_all() {
        let fork = Fork::new();
        let wc = WorkingCopy::open(&fork.work).unwrap();
        assert_eq!(fetch_all(&wc, true).unwrap(), vec!["origin", "upstream"]);

        sh(&fork.work, &["remote", "remove", "upstream"]);
        assert_eq!(fetch_all(&wc, false).unwrap(), vec!["origin"]);
    }
}
