use clap_complete::engine::CompletionCandidate;

use crate::git;
use crate::repo::ORIGIN;

/// Local branches first, then origin branches not checked out yet.
pub fn complete_branches() -> Vec<CompletionCandidate> {
    let Ok(cwd) = std::env::current_dir() else {
        return Vec::new();
    };
    let Ok(local) = git::local_branches(&cwd) else {
        return Vec::new();
    };
    let remote = git::remote_branches(&cwd, ORIGIN).unwrap_or_default();

    let mut out: Vec<CompletionCandidate> = local
        .iter()
        .map(|b| CompletionCandidate::new(b.clone()))
        .collect();
    out.extend(
        remote
            .into_iter()
            .filter(|b| !local.contains(b))
            .map(|b| CompletionCandidate::new(b).help(Some("origin".into()))),
    );
    out
}
