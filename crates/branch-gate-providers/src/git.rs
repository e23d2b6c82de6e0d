// crates/branch-gate-providers/src/git.rs
// ============================================================================
// Module: Git Repository Provider
// Description: Repository facts read from an on-disk git repository.
// Purpose: Produce snapshots, working-tree listings, and branch inventories.
// Dependencies: branch-gate-core, git2
// ============================================================================

//! ## Overview
//! [`GitRepositoryProvider`] reads repository facts through libgit2. The
//! repository is discovered from the configured root on every call, so no
//! handle outlives a request and the provider is trivially `Send + Sync`.
//!
//! Snapshot reads never fail. Each fact degrades independently:
//! - no repository: [`RepositorySnapshot::unavailable`]
//! - unreadable HEAD: branch [`UNKNOWN_BRANCH`]
//! - detached HEAD: branch `HEAD`
//! - unborn branch: the branch HEAD points at, ancestry unknown
//! - status failure: reported clean

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::Path;
use std::path::PathBuf;

use branch_gate_core::BranchInventory;
use branch_gate_core::RepositoryError;
use branch_gate_core::RepositoryProvider;
use branch_gate_core::RepositorySnapshot;
use branch_gate_core::UNKNOWN_BRANCH;
use git2::BranchType;
use git2::ErrorCode;
use git2::Repository;
use git2::Status;
use git2::StatusOptions;
use git2::Statuses;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Branch label reported when HEAD is detached.
pub const DETACHED_HEAD: &str = "HEAD";

/// Prefix stripped from local branch references.
const LOCAL_BRANCH_PREFIX: &str = "refs/heads/";

// ============================================================================
// SECTION: Provider
// ============================================================================

/// Repository provider backed by libgit2.
///
/// # Invariants
/// - The repository is reopened for every request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitRepositoryProvider {
    /// Path the repository is discovered from.
    root: PathBuf,
}

impl GitRepositoryProvider {
    /// Creates a provider that discovers the repository from `root`.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
        }
    }

    /// Returns the configured root path.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Opens the repository containing the configured root.
    fn open(&self) -> Result<Repository, RepositoryError> {
        Repository::discover(&self.root).map_err(|err| {
            if err.code() == ErrorCode::NotFound {
                RepositoryError::NotFound(self.root.display().to_string())
            } else {
                backend_error(&err)
            }
        })
    }
}

impl RepositoryProvider for GitRepositoryProvider {
    fn snapshot(&self) -> RepositorySnapshot {
        let Ok(repo) = self.open() else {
            return RepositorySnapshot::unavailable();
        };
        let branch = current_branch(&repo);
        let is_clean = match worktree_statuses(&repo) {
            Ok(statuses) => statuses.is_empty(),
            Err(_) => true,
        };
        RepositorySnapshot::new(branch, is_clean, head_is_merge(&repo))
    }

    fn modified_files(&self) -> Result<Vec<String>, RepositoryError> {
        let repo = self.open()?;
        let statuses = worktree_statuses(&repo).map_err(|err| backend_error(&err))?;
        let lines = statuses
            .iter()
            .map(|entry| {
                let path = entry.path().map_or_else(
                    || String::from_utf8_lossy(entry.path_bytes()).into_owned(),
                    str::to_string,
                );
                format!("{} {path}", porcelain_code(entry.status()))
            })
            .collect();
        Ok(lines)
    }

    fn branches(&self) -> Result<BranchInventory, RepositoryError> {
        let repo = self.open()?;
        Ok(BranchInventory {
            local: branch_names(&repo, BranchType::Local)?,
            remote: branch_names(&repo, BranchType::Remote)?,
        })
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Maps a libgit2 error into a backend error.
fn backend_error(err: &git2::Error) -> RepositoryError {
    RepositoryError::Backend(err.message().to_string())
}

/// Resolves the current branch label.
fn current_branch(repo: &Repository) -> String {
    match repo.head() {
        Ok(head) if head.is_branch() => {
            head.shorthand().map_or_else(|| UNKNOWN_BRANCH.to_string(), str::to_string)
        }
        Ok(_) => DETACHED_HEAD.to_string(),
        Err(err) if err.code() == ErrorCode::UnbornBranch => {
            unborn_branch(repo).unwrap_or_else(|| UNKNOWN_BRANCH.to_string())
        }
        Err(_) => UNKNOWN_BRANCH.to_string(),
    }
}

/// Reads the branch HEAD points at before the first commit exists.
fn unborn_branch(repo: &Repository) -> Option<String> {
    let head = repo.find_reference("HEAD").ok()?;
    let target = head.symbolic_target()?;
    target.strip_prefix(LOCAL_BRANCH_PREFIX).map(str::to_string)
}

/// Returns whether HEAD is a merge commit, or `None` when unreadable.
fn head_is_merge(repo: &Repository) -> Option<bool> {
    let commit = repo.head().ok()?.peel_to_commit().ok()?;
    Some(commit.parent_count() > 1)
}

/// Collects working-tree and index changes, excluding ignored paths.
fn worktree_statuses(repo: &Repository) -> Result<Statuses<'_>, git2::Error> {
    let mut options = StatusOptions::new();
    options.include_untracked(true).recurse_untracked_dirs(true).include_ignored(false);
    repo.statuses(Some(&mut options))
}

/// Renders a status as the two-letter porcelain code.
fn porcelain_code(status: Status) -> String {
    if status.contains(Status::CONFLICTED) {
        return "UU".to_string();
    }
    if status.contains(Status::WT_NEW) && !index_changed(status) {
        return "??".to_string();
    }
    let index = if status.contains(Status::INDEX_NEW) {
        'A'
    } else if status.contains(Status::INDEX_MODIFIED) {
        'M'
    } else if status.contains(Status::INDEX_DELETED) {
        'D'
    } else if status.contains(Status::INDEX_RENAMED) {
        'R'
    } else if status.contains(Status::INDEX_TYPECHANGE) {
        'T'
    } else {
        ' '
    };
    let worktree = if status.contains(Status::WT_MODIFIED) {
        'M'
    } else if status.contains(Status::WT_DELETED) {
        'D'
    } else if status.contains(Status::WT_RENAMED) {
        'R'
    } else if status.contains(Status::WT_TYPECHANGE) {
        'T'
    } else {
        ' '
    };
    format!("{index}{worktree}")
}

/// Returns true when any index-side flag is set.
fn index_changed(status: Status) -> bool {
    status.intersects(
        Status::INDEX_NEW
            | Status::INDEX_MODIFIED
            | Status::INDEX_DELETED
            | Status::INDEX_RENAMED
            | Status::INDEX_TYPECHANGE,
    )
}

/// Lists sorted branch names of one kind, skipping symbolic remote `HEAD`s.
fn branch_names(repo: &Repository, kind: BranchType) -> Result<Vec<String>, RepositoryError> {
    let mut names = Vec::new();
    for entry in repo.branches(Some(kind)).map_err(|err| backend_error(&err))? {
        let (branch, _) = entry.map_err(|err| backend_error(&err))?;
        let Some(name) = branch.name().map_err(|err| backend_error(&err))? else {
            continue;
        };
        if kind == BranchType::Remote && name.ends_with("/HEAD") {
            continue;
        }
        names.push(name.to_string());
    }
    names.sort();
    Ok(names)
}
