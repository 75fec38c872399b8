//! Resolution of OWNERS files, which declare who may approve and review the files in a directory.
use std::collections::HashSet;

use axum::async_trait;

use crate::github::GithubRepoName;

mod loader;
mod tree;

pub use loader::{load_owners_tree, OwnersFileSource};
pub use tree::{OwnersFile, OwnersOptions, OwnersTree, OWNERS_FILE_NAME};

/// Ownership information of a repository at a specific ref.
///
/// All returned logins are normalized.
pub trait RepoOwners: Send + Sync {
    fn approvers(&self, path: &str) -> HashSet<String>;
    fn reviewers(&self, path: &str) -> HashSet<String>;
}

#[async_trait]
pub trait OwnersLoader: Send + Sync {
    /// Loads the ownership of `changed_files` at `git_ref`. Only the OWNERS files that cover
    /// these files have to be consulted.
    async fn load_repo_owners(
        &self,
        repo: &GithubRepoName,
        git_ref: &str,
        changed_files: &[String],
    ) -> anyhow::Result<Box<dyn RepoOwners>>;
}

/// Returns all approvers and reviewers of the given files.
pub fn reviewers_for_files(owners: &dyn RepoOwners, files: &[String]) -> HashSet<String> {
    files
        .iter()
        .flat_map(|file| owners.approvers(file).into_iter().chain(owners.reviewers(file)))
        .collect()
}
