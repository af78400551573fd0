use std::path::Path;
use std::process::{Command, Output};

use anyhow::{Context, Result};
use tracing::debug;

fn path_str(p: &Path) -> Result<&str> {
    p.to_str().context("path contains non-UTF8 characters")
}

fn exec(dir: Option<&Path>, args: &[&str]) -> Result<Output> {
    let mut cmd = Command::new("git");
    cmd.args(args);
    if let Some(d) = dir {
        cmd.current_dir(d);
    }
    debug!(dir = ?dir, "git {}", args.join(" "));
    cmd.output()
        .with_context(|| format!("running git {}", args.join(" ")))
}

fn failure(dir: Option<&Path>, args: &[&str], output: &Output) -> anyhow::Error {
    let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
    let args_str = args.join(" ");
    match dir {
        Some(d) => anyhow::anyhow!(
            "git {} (in {}): {}\n{}",
            args_str,
            d.display(),
            output.status,
            stderr
        ),
        None => anyhow::anyhow!("git {}: {}\n{}", args_str, output.status, stderr),
    }
}

pub fn run(dir: Option<&Path>, args: &[&str]) -> Result<String> {
    let output = exec(dir, args)?;
    if !output.status.success() {
        return Err(failure(dir, args, &output));
    }
    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

/// Runs a probe whose exit code is the answer: `yes` means true, `no` means
/// false, anything else is an error.
fn probe(dir: &Path, args: &[&str], yes: i32, no: i32) -> Result<bool> {
    let output = exec(Some(dir), args)?;
    match output.status.code() {
        Some(c) if c == yes => Ok(true),
        Some(c) if c == no => Ok(false),
        _ => Err(failure(Some(dir), args, &output)),
    }
}

fn lines(out: &str) -> Vec<String> {
    out.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(String::from)
        .collect()
}

pub fn is_repo(dir: &Path) -> bool {
    run(Some(dir), &["rev-parse", "--is-inside-work-tree"])
        .map(|s| s == "true")
        .unwrap_or(false)
}

pub fn clone(url: &str, dest: &Path) -> Result<()> {
    let dest_str = path_str(dest)?;
    run(None, &["clone", "--", url, dest_str])?;
    Ok(())
}

pub fn branch_current(dir: &Path) -> Result<String> {
    run(Some(dir), &["rev-parse", "--abbrev-ref", "HEAD"])
}

pub fn local_branches(dir: &Path) -> Result<Vec<String>> {
    let out = run(
        Some(dir),
        &["for-each-ref", "--format=%(refname:short)", "refs/heads"],
    )?;
    Ok(lines(&out))
}

pub fn branch_exists(dir: &Path, branch: &str) -> bool {
    let ref_path = format!("refs/heads/{}", branch);
    run(Some(dir), &["rev-parse", "--verify", "--quiet", &ref_path]).is_ok()
}

/// Branch names on `remote`, asked of the remote itself rather than read from
/// the local remote-tracking refs.
pub fn remote_branches(dir: &Path, remote: &str) -> Result<Vec<String>> {
    let out = run(Some(dir), &["ls-remote", "--heads", remote])?;
    Ok(out
        .lines()
        .filter_map(|l| l.split_once('\t'))
        .filter_map(|(_, r)| r.strip_prefix("refs/heads/"))
        .map(String::from)
        .collect())
}

pub fn remote_branch_exists(dir: &Path, remote: &str, branch: &str) -> Result<bool> {
    let ref_path = format!("refs/heads/{}", branch);
    // ls-remote --exit-code exits 2 when no ref matched
    probe(
        dir,
        &["ls-remote", "--exit-code", "--heads", remote, &ref_path],
        0,
        2,
    )
}

pub fn remotes(dir: &Path) -> Result<Vec<String>> {
    Ok(lines(&run(Some(dir), &["remote"])?))
}

pub fn remote_exists(dir: &Path, name: &str) -> bool {
    remotes(dir)
        .map(|r| r.iter().any(|n| n == name))
        .unwrap_or(false)
}

pub fn remote_url(dir: &Path, name: &str) -> Result<String> {
    run(Some(dir), &["remote", "get-url", name])
}

pub fn remote_add(dir: &Path, name: &str, url: &str) -> Result<()> {
    run(Some(dir), &["remote", "add", name, url])?;
    Ok(())
}

pub fn fetch(dir: &Path, remote: &str, branch: Option<&str>, prune: bool) -> Result<()> {
    let mut args = vec!["fetch"];
    if prune {
        args.push("--prune");
    }
    args.push(remote);
    if let Some(b) = branch {
        args.push(b);
    }
    run(Some(dir), &args)?;
    Ok(())
}

pub fn checkout(dir: &Path, branch: &str) -> Result<()> {
    run(Some(dir), &["checkout", branch, "--"])?;
    Ok(())
}

/// Creates `branch` tracking `<remote>/<branch>` and switches to it.
pub fn checkout_track(dir: &Path, branch: &str, remote: &str) -> Result<()> {
    let start = format!("{}/{}", remote, branch);
    run(Some(dir), &["checkout", "--track", "-b", branch, &start])?;
    Ok(())
}

pub fn is_ancestor(dir: &Path, ancestor: &str, descendant: &str) -> Result<bool> {
    probe(
        dir,
        &["merge-base", "--is-ancestor", ancestor, descendant],
        0,
        1,
    )
}

pub fn commit_count(dir: &Path, from: &str, to: &str) -> Result<u32> {
    let range = format!("{}..{}", from, to);
    let out = run(Some(dir), &["rev-list", "--count", &range])?;
    out.parse::<u32>()
        .with_context(|| format!("parsing rev-list count {:?}", out))
}

/// Fast-forwards HEAD to `target`. Returns the number of commits HEAD moved
/// (0 when HEAD already contains `target`), or `None` when the two have
/// diverged and a fast-forward is impossible.
pub fn merge_ff_only(dir: &Path, target: &str) -> Result<Option<u32>> {
    if is_ancestor(dir, target, "HEAD")? {
        return Ok(Some(0));
    }
    if !is_ancestor(dir, "HEAD", target)? {
        return Ok(None);
    }
    let commits = commit_count(dir, "HEAD", target)?;
    if commits > 0 {
        run(Some(dir), &["merge", "--ff-only", target])?;
    }
    Ok(Some(commits))
}

pub fn rebase_in_progress(dir: &Path) -> bool {
    ["rebase-merge", "rebase-apply"].iter().any(|name| {
        run(Some(dir), &["rev-parse", "--git-path", name])
            .map(|p| dir.join(p).exists())
            .unwrap_or(false)
    })
}

/// Rebases HEAD onto `onto`. Returns the number of replayed commits, or
/// `None` when the rebase stopped on conflicts. A stopped rebase is left in
/// progress for the operator to finish or abort.
pub fn rebase(dir: &Path, onto: &str) -> Result<Option<u32>> {
    let commits = commit_count(dir, onto, "HEAD")?;
    let args = ["rebase", onto];
    let output = exec(Some(dir), &args)?;
    if output.status.success() {
        return Ok(Some(commits));
    }
    if rebase_in_progress(dir) {
        return Ok(None);
    }
    Err(failure(Some(dir), &args, &output))
}

pub fn pull(dir: &Path, remote: &str, branch: &str) -> Result<()> {
    run(Some(dir), &["pull", remote, branch])?;
    Ok(())
}

pub fn push(dir: &Path, remote: &str, branch: &str) -> Result<()> {
    run(Some(dir), &["push", remote, branch])?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{Fork, git, local_commit, push_branch_to_origin};

    #[test]
    fn test_is_repo() {
        let fork = Fork::new();
        assert!(is_repo(&fork.work));
        let plain = tempfile::tempdir().unwrap();
        assert!(!is_repo(plain.path()));
    }

    #[test]
    fn test_branch_queries() {
        let fork = Fork::new();
        assert_eq!(branch_current(&fork.work).unwrap(), "master");
        assert_eq!(local_branches(&fork.work).unwrap(), vec!["master"]);
        assert!(branch_exists(&fork.work, "master"));
        assert!(!branch_exists(&fork.work, "nope"));
    }

    #[test]
    fn test_remote_branches_are_live() {
        let fork = Fork::new();
        push_branch_to_origin(&fork, "feature-x", "x.txt");

        // Not fetched yet, but visible on the remote.
        assert!(!ref_exists(&fork.work, "refs/remotes/origin/feature-x"));
        assert!(remote_branch_exists(&fork.work, "origin", "feature-x").unwrap());
        assert!(!remote_branch_exists(&fork.work, "origin", "missing").unwrap());

        let mut branches = remote_branches(&fork.work, "origin").unwrap();
        branches.sort();
        assert_eq!(branches, vec!["feature-x", "master"]);
    }

    #[test]
    fn test_remote_branch_exists_unknown_remote_errors() {
        let fork = Fork::new();
        assert!(remote_branch_exists(&fork.work, "nowhere", "master").is_err());
    }

    #[test]
    fn test_remotes() {
        let fork = Fork::new();
        assert!(remote_exists(&fork.work, "origin"));
        assert!(remote_exists(&fork.work, "upstream"));
        assert!(!remote_exists(&fork.work, "other"));
        assert_eq!(
            remote_url(&fork.work, "upstream").unwrap(),
            fork.upstream.to_str().unwrap()
        );
    }

    #[test]
    fn test_merge_ff_only() {
        let fork = Fork::new();
        local_commit(&fork.upstream, "a.txt", "a");
        fetch(&fork.work, "upstream", None, false).unwrap();

        assert_eq!(merge_ff_only(&fork.work, "upstream/master").unwrap(), Some(1));
        assert_eq!(merge_ff_only(&fork.work, "upstream/master").unwrap(), Some(0));
    }

    #[test]
    fn test_merge_ff_only_local_ahead() {
        let fork = Fork::new();
        local_commit(&fork.work, "b.txt", "b");
        fetch(&fork.work, "upstream", None, false).unwrap();

        let before = git(&fork.work, &["rev-parse", "HEAD"]);
        assert_eq!(merge_ff_only(&fork.work, "upstream/master").unwrap(), Some(0));
        assert_eq!(git(&fork.work, &["rev-parse", "HEAD"]), before);
    }

    #[test]
    fn test_commit_count() {
        let fork = Fork::new();
        local_commit(&fork.work, "a.txt", "a");
        local_commit(&fork.work, "b.txt", "b");

        assert_eq!(commit_count(&fork.work, "origin/master", "HEAD").unwrap(), 2);
        assert_eq!(commit_count(&fork.work, "HEAD", "origin/master").unwrap(), 0);
        assert!(commit_count(&fork.work, "HEAD", "no-such-ref").is_err());
    }

    #[test]
    fn test_merge_ff_only_diverged() {
        let fork = Fork::new();
        local_commit(&fork.upstream, "a.txt", "a");
        local_commit(&fork.work, "b.txt", "b");
        fetch(&fork.work, "upstream", None, false).unwrap();

        let before = git(&fork.work, &["rev-parse", "HEAD"]);
        assert_eq!(merge_ff_only(&fork.work, "upstream/master").unwrap(), None);
        assert_eq!(git(&fork.work, &["rev-parse", "HEAD"]), before);
    }

    #[test]
    fn test_rebase_conflict_left_in_progress() {
        let fork = Fork::new();
        local_commit(&fork.upstream, "c.txt", "upstream");
        local_commit(&fork.work, "c.txt", "local");
        fetch(&fork.work, "upstream", None, false).unwrap();

        assert_eq!(rebase(&fork.work, "upstream/master").unwrap(), None);
        assert!(rebase_in_progress(&fork.work));
    }

    #[test]
    fn test_rebase_clean() {
        let fork = Fork::new();
        local_commit(&fork.upstream, "a.txt", "a");
        local_commit(&fork.work, "b.txt", "b");
        fetch(&fork.work, "upstream", None, false).unwrap();

        assert_eq!(rebase(&fork.work, "upstream/master").unwrap(), Some(1));
        assert!(!rebase_in_progress(&fork.work));
        assert!(is_ancestor(&fork.work, "upstream/master", "HEAD").unwrap());
    }

    fn ref_exists(dir: &Path, git_ref: &str) -> bool {
        run(Some(dir), &["rev-parse", "--verify", "--quiet", git_ref]).is_ok()
    }
}
