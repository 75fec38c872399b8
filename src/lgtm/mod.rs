use axum::async_trait;
use thiserror::Error;

use crate::config::PluginConfig;
use crate::github::{CommentId, GithubRepoName, IssueComment, PullRequest, PullRequestNumber};
use crate::owners::OwnersLoader;

mod authorization;
mod command;
mod comment;
pub mod event;
mod handlers;
mod help;

pub use command::{parse_command, LgtmCommand};
pub use comment::Comment;
pub use handlers::handle_lgtm_event;
pub use help::{plugin_help, CommandHelp, PluginHelp};

/// The label whose presence marks a pull request as approved.
pub const LGTM_LABEL: &str = "lgtm";

/// Posted when new commits remove the approval label. Deleted again once the label is re-added,
/// so it has to stay byte-for-byte stable.
pub const LGTM_REMOVED_NOTIFICATION: &str =
    "New changes are detected. LGTM label has been removed.";

#[derive(Error, Debug)]
pub enum RemoveLabelError {
    #[error("Label {0} does not exist on the pull request")]
    LabelNotFound(String),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Provides the operations that the bot needs to perform on a remote repository.
#[async_trait]
pub trait PullRequestClient: Send + Sync {
    /// Does the user have write access to the repository?
    async fn is_collaborator(&self, repo: &GithubRepoName, username: &str) -> anyhow::Result<bool>;

    async fn add_label(
        &self,
        repo: &GithubRepoName,
        pr: PullRequestNumber,
        label: &str,
    ) -> anyhow::Result<()>;

    async fn remove_label(
        &self,
        repo: &GithubRepoName,
        pr: PullRequestNumber,
        label: &str,
    ) -> Result<(), RemoveLabelError>;

    /// Assign the given users to the pull request.
    async fn assign(
        &self,
        repo: &GithubRepoName,
        pr: PullRequestNumber,
        usernames: &[String],
    ) -> anyhow::Result<()>;

    /// Post a comment to the pull request with the given number.
    async fn post_comment(
        &self,
        repo: &GithubRepoName,
        pr: PullRequestNumber,
        comment: Comment,
    ) -> anyhow::Result<()>;

    async fn delete_comment(&self, repo: &GithubRepoName, id: CommentId) -> anyhow::Result<()>;

    /// Names of labels currently attached to the pull request.
    async fn get_labels(
        &self,
        repo: &GithubRepoName,
        pr: PullRequestNumber,
    ) -> anyhow::Result<Vec<String>>;

    async fn get_pull_request(
        &self,
        repo: &GithubRepoName,
        pr: PullRequestNumber,
    ) -> anyhow::Result<PullRequest>;

    /// Paths of all files changed by the pull request.
    async fn get_changed_files(
        &self,
        repo: &GithubRepoName,
        pr: PullRequestNumber,
    ) -> anyhow::Result<Vec<String>>;

    async fn list_comments(
        &self,
        repo: &GithubRepoName,
        pr: PullRequestNumber,
    ) -> anyhow::Result<Vec<IssueComment>>;

    /// Login of the user that the bot is acting as.
    async fn bot_name(&self) -> anyhow::Result<String>;
}

/// Everything a handler needs to react to an event.
pub struct LgtmContext<Client: PullRequestClient> {
    pub client: Client,
    pub owners: Box<dyn OwnersLoader>,
    pub config: PluginConfig,
}

impl<Client: PullRequestClient> LgtmContext<Client> {
    pub fn new(client: Client, owners: Box<dyn OwnersLoader>, config: PluginConfig) -> Self {
        Self {
            client,
            owners,
            config,
        }
    }
}
