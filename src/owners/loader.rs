use std::collections::HashSet;

use anyhow::Context;
use axum::async_trait;
use futures::{stream, StreamExt};

use crate::github::GithubRepoName;
use crate::owners::tree::parent_directory;
use crate::owners::{OwnersFile, OwnersTree, OWNERS_FILE_NAME};

/// Maximum number of `OWNERS` files that are fetched at the same time.
const MAX_CONCURRENT_FETCHES: usize = 8;

/// Raw access to the `OWNERS` files of a repository.
#[async_trait]
pub trait OwnersFileSource: Send + Sync {
    /// Paths of all `OWNERS` files in the repository at `git_ref`.
    async fn list_owners_files(
        &self,
        repo: &GithubRepoName,
        git_ref: &str,
    ) -> anyhow::Result<Vec<String>>;

    async fn read_file(
        &self,
        repo: &GithubRepoName,
        git_ref: &str,
        path: &str,
    ) -> anyhow::Result<String>;
}

/// Builds the ownership tree that covers `changed_files`.
///
/// Only `OWNERS` files located in a directory on the path of a changed file are fetched. Files
/// that cannot be read or parsed are skipped.
pub async fn load_owners_tree(
    source: &dyn OwnersFileSource,
    repo: &GithubRepoName,
    git_ref: &str,
    changed_files: &[String],
) -> anyhow::Result<OwnersTree> {
    let directories = covering_directories(changed_files);
    let paths: Vec<String> = source
        .list_owners_files(repo, git_ref)
        .await?
        .into_iter()
        .filter(|path| is_owners_file(path) && directories.contains(owners_directory(path)))
        .collect();
    tracing::debug!("Loading OWNERS files of {repo} at {git_ref}: {paths:?}");

    let files: Vec<(String, anyhow::Result<OwnersFile>)> = stream::iter(paths)
        .map(|path| async move {
            let file = match source.read_file(repo, git_ref, &path).await {
                Ok(content) => OwnersFile::parse(&content)
                    .with_context(|| format!("Cannot parse {path} in {repo}")),
                Err(error) => Err(error),
            };
            (path, file)
        })
        .buffer_unordered(MAX_CONCURRENT_FETCHES)
        .collect()
        .await;

    let mut tree = OwnersTree::new();
    for (path, file) in files {
        match file {
            Ok(file) => tree.insert(owners_directory(&path), file),
            Err(error) => tracing::warn!("Ignoring OWNERS file {path}: {error:?}"),
        }
    }
    Ok(tree)
}

/// All directories that contain one of `files`, directly or transitively.
fn covering_directories(files: &[String]) -> HashSet<&str> {
    let mut directories = HashSet::new();
    for file in files {
        let mut directory = parent_directory(file.trim_matches('/'));
        while directories.insert(directory) && !directory.is_empty() {
            directory = parent_directory(directory);
        }
    }
    directories
}

fn is_owners_file(path: &str) -> bool {
    path.rsplit('/').next() == Some(OWNERS_FILE_NAME)
}

fn owners_directory(path: &str) -> &str {
    path.rsplit_once('/').map(|(directory, _)| directory).unwrap_or("")
}
