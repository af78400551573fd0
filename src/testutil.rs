//! Shared test utilities for git-based tests.
//!
//! A [`Fork`] is three throwaway repositories wired the way a real fork is:
//! `upstream` (a working repo with one commit on master), `origin` (a bare
//! clone of upstream) and `work` (a clone of origin with an `upstream`
//! remote).

use std::path::{Path, PathBuf};
use std::process::Command;

const IDENTITY: &[&[&str]] = &[
    &["config", "user.email", "test@test.com"],
    &["config", "user.name", "Test"],
    &["config", "commit.gpgsign", "false"],
];

/// Runs git in `dir`, panicking on failure. Returns trimmed stdout.
pub fn git(dir: &Path, args: &[&str]) -> String {
    let out = Command::new("git")
        .args(args)
        .current_dir(dir)
        .output()
        .unwrap();
    assert!(
        out.status.success(),
        "git {:?}: {}",
        args,
        String::from_utf8_lossy(&out.stderr)
    );
    String::from_utf8_lossy(&out.stdout).trim().to_string()
}

fn configure_identity(dir: &Path) {
    for args in IDENTITY {
        git(dir, args);
    }
}

fn clone_into(src: &Path, dest: &Path, bare: bool) {
    let mut args = vec!["clone"];
    if bare {
        args.push("--bare");
    }
    args.push(src.to_str().unwrap());
    args.push(dest.to_str().unwrap());
    let out = Command::new("git").args(&args).output().unwrap();
    assert!(
        out.status.success(),
        "clone: {}",
        String::from_utf8_lossy(&out.stderr)
    );
}

pub struct Fork {
    pub upstream: PathBuf,
    pub origin: PathBuf,
    pub work: PathBuf,
    pub root: tempfile::TempDir,
}

impl Fork {
    pub fn new() -> Fork {
        let root = tempfile::tempdir().unwrap();
        let upstream = root.path().join("upstream");
        std::fs::create_dir_all(&upstream).unwrap();
        git(&upstream, &["init", "--initial-branch=master"]);
        configure_identity(&upstream);
        git(&upstream, &["commit", "--allow-empty", "-m", "initial"]);

        let origin = root.path().join("origin.git");
        clone_into(&upstream, &origin, true);

        let work = root.path().join("work");
        clone_into(&origin, &work, false);
        configure_identity(&work);
        git(
            &work,
            &["remote", "add", "upstream", upstream.to_str().unwrap()],
        );

        Fork {
            upstream,
            origin,
            work,
            root,
        }
    }

    /// Like [`Fork::new`], but origin carries `develop` instead of `master`
    /// and the working copy is on `develop`.
    pub fn without_origin_master() -> Fork {
        let root = tempfile::tempdir().unwrap();
        let upstream = root.path().join("upstream");
        std::fs::create_dir_all(&upstream).unwrap();
        git(&upstream, &["init", "--initial-branch=master"]);
        configure_identity(&upstream);
        git(&upstream, &["commit", "--allow-empty", "-m", "initial"]);

        let origin = root.path().join("origin.git");
        clone_into(&upstream, &origin, true);
        git(&origin, &["branch", "-m", "master", "develop"]);
        git(&origin, &["symbolic-ref", "HEAD", "refs/heads/develop"]);

        let work = root.path().join("work");
        clone_into(&origin, &work, false);
        configure_identity(&work);
        git(
            &work,
            &["remote", "add", "upstream", upstream.to_str().unwrap()],
        );

        Fork {
            upstream,
            origin,
            work,
            root,
        }
    }

    pub fn head(&self, dir: &Path, git_ref: &str) -> String {
        git(dir, &["rev-parse", git_ref])
    }
}

/// Commits a file in a repo on the current branch.
pub fn local_commit(dir: &Path, file: &str, content: &str) {
    std::fs::write(dir.join(file), content).unwrap();
    git(dir, &["add", file]);
    git(dir, &["commit", "-m", &format!("add {}", file)]);
}

/// Pushes a new commit on `branch` to origin from a scratch clone, leaving
/// the fork's working copy untouched.
pub fn push_branch_to_origin(fork: &Fork, branch: &str, file: &str) {
    let scratch = fork.root.path().join(format!("scratch-{}", branch));
    if !scratch.exists() {
        clone_into(&fork.origin, &scratch, false);
        configure_identity(&scratch);
    }
    git(&scratch, &["fetch", "origin"]);
    let remote_ref = format!("origin/{}", branch);
    let has_remote = Command::new("git")
        .args(["rev-parse", "--verify", "--quiet", &remote_ref])
        .current_dir(&scratch)
        .output()
        .unwrap()
        .status
        .success();
    if has_remote {
        git(&scratch, &["checkout", "-B", branch, &remote_ref]);
    } else {
        git(&scratch, &["checkout", "-B", branch]);
    }
    local_commit(&scratch, file, branch);
    git(&scratch, &["push", "origin", branch]);
}
