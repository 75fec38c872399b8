use anyhow::Context;
use axum::async_trait;
use http::StatusCode;
use octocrab::{Error, Octocrab};
use tokio::sync::OnceCell;

use crate::github::{
    CommentId, GithubRepoName, GithubUser, IssueComment, PullRequest, PullRequestNumber,
};
use crate::lgtm::{Comment, PullRequestClient, RemoveLabelError};

const PAGE_SIZE: u8 = 100;

/// Provides access to GitHub repositories using the GitHub API.
pub struct GithubClient {
    client: Octocrab,
    /// Login of the authenticated user, resolved on first use.
    bot_name: OnceCell<String>,
}

impl GithubClient {
    pub fn new(client: Octocrab) -> Self {
        Self {
            client,
            bot_name: OnceCell::new(),
        }
    }

    fn format_pr(repo: &GithubRepoName, pr: PullRequestNumber) -> String {
        format!("{}/{}#{}", repo.owner(), repo.name(), pr)
    }
}

#[async_trait]
impl PullRequestClient for GithubClient {
    async fn is_collaborator(&self, repo: &GithubRepoName, username: &str) -> anyhow::Result<bool> {
        // https://docs.github.com/en/rest/collaborators/collaborators#check-if-a-user-is-a-repository-collaborator
        let url = format!("/repos/{repo}/collaborators/{username}");
        let response = self
            .client
            ._get(url.as_str())
            .await
            .with_context(|| format!("Cannot check if {username} is a collaborator of {repo}"))?;
        match response.status() {
            StatusCode::NO_CONTENT => Ok(true),
            StatusCode::NOT_FOUND => Ok(false),
            status => Err(anyhow::anyhow!(
                "Unexpected response status {status} when checking if {username} is a collaborator of {repo}"
            )),
        }
    }

    async fn add_label(
        &self,
        repo: &GithubRepoName,
        pr: PullRequestNumber,
        label: &str,
    ) -> anyhow::Result<()> {
        self.client
            .issues(repo.owner(), repo.name())
            .add_labels(pr.0, &[label.to_string()])
            .await
            .with_context(|| format!("Cannot add label {label} to {}", Self::format_pr(repo, pr)))?;
        Ok(())
    }

    async fn remove_label(
        &self,
        repo: &GithubRepoName,
        pr: PullRequestNumber,
        label: &str,
    ) -> Result<(), RemoveLabelError> {
        match self
            .client
            .issues(repo.owner(), repo.name())
            .remove_label(pr.0, label)
            .await
        {
            Ok(_) => Ok(()),
            // This error is returned if we try to remove a label that is not present on the issue.
            Err(Error::GitHub { source, .. }) if source.message.contains("Label does not exist") => {
                tracing::trace!("Label {label} does not exist on {}", Self::format_pr(repo, pr));
                Err(RemoveLabelError::LabelNotFound(label.to_string()))
            }
            Err(error) => Err(RemoveLabelError::Other(anyhow::Error::new(error).context(
                format!("Cannot remove label {label} from {}", Self::format_pr(repo, pr)),
            ))),
        }
    }

    async fn assign(
        &self,
        repo: &GithubRepoName,
        pr: PullRequestNumber,
        usernames: &[String],
    ) -> anyhow::Result<()> {
        let usernames: Vec<&str> = usernames.iter().map(|s| s.as_str()).collect();
        self.client
            .issues(repo.owner(), repo.name())
            .add_assignees(pr.0, &usernames)
            .await
            .with_context(|| format!("Cannot assign {usernames:?} to {}", Self::format_pr(repo, pr)))?;
        Ok(())
    }

    /// The comment will be posted as the user of the bot.
    async fn post_comment(
        &self,
        repo: &GithubRepoName,
        pr: PullRequestNumber,
        comment: Comment,
    ) -> anyhow::Result<()> {
        self.client
            .issues(repo.owner(), repo.name())
            .create_comment(pr.0, comment.render())
            .await
            .with_context(|| format!("Cannot post comment to {}", Self::format_pr(repo, pr)))?;
        Ok(())
    }

    async fn delete_comment(&self, repo: &GithubRepoName, id: CommentId) -> anyhow::Result<()> {
        self.client
            .issues(repo.owner(), repo.name())
            .delete_comment(octocrab::models::CommentId(id.0))
            .await
            .with_context(|| format!("Cannot delete comment {id} from {repo}"))?;
        Ok(())
    }

    async fn get_labels(
        &self,
        repo: &GithubRepoName,
        pr: PullRequestNumber,
    ) -> anyhow::Result<Vec<String>> {
        let page = self
            .client
            .issues(repo.owner(), repo.name())
            .list_labels_for_issue(pr.0)
            .per_page(PAGE_SIZE)
            .send()
            .await
            .with_context(|| format!("Cannot get labels of {}", Self::format_pr(repo, pr)))?;
        let labels = self.client.all_pages(page).await?;
        Ok(labels.into_iter().map(|label| label.name).collect())
    }

    async fn get_pull_request(
        &self,
        repo: &GithubRepoName,
        pr: PullRequestNumber,
    ) -> anyhow::Result<PullRequest> {
        let pr = self
            .client
            .pulls(repo.owner(), repo.name())
            .get(pr.0)
            .await
            .map_err(|error| anyhow::anyhow!("Could not get PR {repo}/{}: {error:?}", pr.0))?;
        Ok(github_pr_to_pr(pr))
    }

    async fn get_changed_files(
        &self,
        repo: &GithubRepoName,
        pr: PullRequestNumber,
    ) -> anyhow::Result<Vec<String>> {
        let page = self
            .client
            .pulls(repo.owner(), repo.name())
            .list_files(pr.0)
            .await
            .with_context(|| format!("Cannot get changed files of {}", Self::format_pr(repo, pr)))?;
        let files = self.client.all_pages(page).await?;
        Ok(files.into_iter().map(|file| file.filename).collect())
    }

    async fn list_comments(
        &self,
        repo: &GithubRepoName,
        pr: PullRequestNumber,
    ) -> anyhow::Result<Vec<IssueComment>> {
        let page = self
            .client
            .issues(repo.owner(), repo.name())
            .list_comments(pr.0)
            .per_page(PAGE_SIZE)
            .send()
            .await
            .with_context(|| format!("Cannot list comments of {}", Self::format_pr(repo, pr)))?;
        let comments = self.client.all_pages(page).await?;
        Ok(comments
            .into_iter()
            .map(|comment| IssueComment {
                id: CommentId(comment.id.0),
                author: GithubUser::new(&comment.user.login),
                text: comment.body.unwrap_or_default(),
            })
            .collect())
    }

    async fn bot_name(&self) -> anyhow::Result<String> {
        let name = self
            .bot_name
            .get_or_try_init(|| async {
                let user = self
                    .client
                    .current()
                    .user()
                    .await
                    .context("Cannot load the authenticated user")?;
                tracing::info!("Acting as user {}", user.login);
                Ok::<_, anyhow::Error>(user.login)
            })
            .await?;
        Ok(name.clone())
    }
}

fn github_pr_to_pr(pr: octocrab::models::pulls::PullRequest) -> PullRequest {
    PullRequest {
        base_ref: pr.base.ref_field,
    }
}
