use anyhow::Context;
use axum::async_trait;
use octocrab::Octocrab;

use crate::github::GithubRepoName;
use crate::owners::{
    load_owners_tree, OwnersFileSource, OwnersLoader, RepoOwners, OWNERS_FILE_NAME,
};

#[derive(serde::Deserialize, Debug)]
struct TreeEntry {
    path: String,
    #[serde(rename = "type")]
    kind: String,
}

#[derive(serde::Deserialize, Debug)]
struct TreeResponse {
    tree: Vec<TreeEntry>,
    truncated: bool,
}

/// Loads `OWNERS` files directly from a GitHub repository.
pub struct GithubOwnersLoader {
    client: Octocrab,
}

impl GithubOwnersLoader {
    pub fn new(client: Octocrab) -> Self {
        Self { client }
    }
}

#[async_trait]
impl OwnersFileSource for GithubOwnersLoader {
    async fn list_owners_files(
        &self,
        repo: &GithubRepoName,
        git_ref: &str,
    ) -> anyhow::Result<Vec<String>> {
        // https://docs.github.com/en/rest/git/trees#get-a-tree
        let response: TreeResponse = self
            .client
            .get(
                format!("/repos/{repo}/git/trees/{git_ref}?recursive=1"),
                None::<&()>,
            )
            .await
            .with_context(|| format!("Cannot load file tree of {repo} at {git_ref}"))?;
        if response.truncated {
            tracing::warn!("File tree of {repo} at {git_ref} was truncated, some OWNERS files may be missing");
        }

        Ok(response
            .tree
            .into_iter()
            .filter(|entry| entry.kind == "blob" && entry.path.ends_with(OWNERS_FILE_NAME))
            .map(|entry| entry.path)
            .collect())
    }

    async fn read_file(
        &self,
        repo: &GithubRepoName,
        git_ref: &str,
        path: &str,
    ) -> anyhow::Result<String> {
        let mut content = self
            .client
            .repos(repo.owner(), repo.name())
            .get_content()
            .path(path)
            .r#ref(git_ref)
            .send()
            .await
            .with_context(|| format!("Cannot load {path} from {repo} at {git_ref}"))?;
        content
            .take_items()
            .into_iter()
            .next()
            .and_then(|item| item.decoded_content())
            .ok_or_else(|| anyhow::anyhow!("{path} in {repo} has no content"))
    }
}

#[async_trait]
impl OwnersLoader for GithubOwnersLoader {
    async fn load_repo_owners(
        &self,
        repo: &GithubRepoName,
        git_ref: &str,
        changed_files: &[String],
    ) -> anyhow::Result<Box<dyn RepoOwners>> {
        let tree = load_owners_tree(self, repo, git_ref, changed_files).await?;
        Ok(Box::new(tree))
    }
}
