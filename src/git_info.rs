//! Workspace version-control inspection.
//!
//! Run documents carry the remotes, head commit, and dirty flag of the
//! repository the experiment ran from. Inspection goes through the small
//! [`Vcs`] capability trait so the assembly code never touches tool
//! specifics; the default [`GitCli`] implementation shells out to `git`
//! rather than reimplementing any version-control internals.

use std::collections::BTreeSet;
use std::path::Path;
use std::process::{Command, Output};

use anyhow::{bail, Context, Result};

use crate::models::GitInfo;

/// Capability surface over a version-control tool.
pub trait Vcs: Send + Sync {
    /// Whether `dir` is inside a version-controlled working tree.
    fn is_repository(&self, dir: &Path) -> Result<bool>;

    /// Whitespace tokens of the remote listing, unfiltered.
    fn remote_urls(&self, dir: &Path) -> Result<Vec<String>>;

    /// Current commit hash, or empty when no commits exist yet.
    fn head_commit(&self, dir: &Path) -> Result<String>;

    /// Whether uncommitted changes exist relative to the last commit.
    fn is_dirty(&self, dir: &Path) -> Result<bool>;
}

/// [`Vcs`] implementation backed by the `git` command-line tool.
pub struct GitCli;

impl GitCli {
    fn git(&self, dir: &Path, args: &[&str]) -> Result<Output> {
        Command::new("git")
            .args(args)
            .current_dir(dir)
            .output()
            .with_context(|| "Failed to execute 'git'. Is git installed?")
    }
}

impl Vcs for GitCli {
    fn is_repository(&self, dir: &Path) -> Result<bool> {
        if !dir.is_dir() {
            return Ok(false);
        }
        let output = self.git(dir, &["rev-parse", "--is-inside-work-tree"])?;
        Ok(output.status.success()
            && String::from_utf8_lossy(&output.stdout).trim() == "true")
    }

    fn remote_urls(&self, dir: &Path) -> Result<Vec<String>> {
        let output = self.git(dir, &["remote", "-v"])?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            bail!("git remote -v failed: {}", stderr.trim());
        }
        Ok(String::from_utf8_lossy(&output.stdout)
            .split_whitespace()
            .map(str::to_string)
            .collect())
    }

    fn head_commit(&self, dir: &Path) -> Result<String> {
        // Fails on a repository with no commits; that is an empty hash,
        // not an error.
        let output = self.git(dir, &["rev-parse", "HEAD"])?;
        if !output.status.success() {
            return Ok(String::new());
        }
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    fn is_dirty(&self, dir: &Path) -> Result<bool> {
        let output = self.git(dir, &["status", "--porcelain"])?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            bail!("git status failed: {}", stderr.trim());
        }
        Ok(!String::from_utf8_lossy(&output.stdout).trim().is_empty())
    }
}

/// Collect version-control metadata for `dir`.
///
/// Returns `None` when `dir` is not inside a working tree. Remote tokens
/// are filtered to URLs ending in `.git` and deduplicated; the sorted
/// order makes repeated scans comparable.
pub fn scan_git(vcs: &dyn Vcs, dir: &Path) -> Result<Option<GitInfo>> {
    if !vcs.is_repository(dir)? {
        return Ok(None);
    }

    let urls: BTreeSet<String> = vcs
        .remote_urls(dir)?
        .into_iter()
        .filter(|token| token.ends_with(".git"))
        .collect();
    let commit = vcs.head_commit(dir)?;
    let dirty = vcs.is_dirty(dir)?;

    Ok(Some(GitInfo {
        urls: urls.into_iter().collect(),
        commit,
        dirty,
    }))
}
