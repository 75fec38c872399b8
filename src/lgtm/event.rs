use crate::github::{GithubRepoName, GithubUser, PullRequestNumber};

#[derive(Debug)]
pub enum LgtmEvent {
    /// A comment (or a review body) was posted on an issue or a pull request.
    Comment(PullRequestComment),
    /// Something has happened to a pull request.
    PullRequest(PullRequestChanged),
}

impl LgtmEvent {
    pub fn repository(&self) -> &GithubRepoName {
        match self {
            LgtmEvent::Comment(comment) => &comment.repository,
            LgtmEvent::PullRequest(payload) => &payload.repository,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IssueState {
    Open,
    Closed,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CommentAction {
    Created,
    Edited,
    Deleted,
}

#[derive(Debug, Clone)]
pub struct PullRequestComment {
    pub repository: GithubRepoName,
    pub pr_number: PullRequestNumber,
    /// Comments on plain issues are delivered too, but the bot ignores them.
    pub is_pull_request: bool,
    pub issue_state: IssueState,
    pub action: CommentAction,
    pub text: String,
    /// URL of the comment itself.
    pub html_url: String,
    pub author: GithubUser,
    pub issue_author: GithubUser,
    pub assignees: Vec<GithubUser>,
}

impl PullRequestComment {
    pub fn is_from_issue_author(&self) -> bool {
        self.author.is(&self.issue_author)
    }

    pub fn is_from_assignee(&self) -> bool {
        self.assignees
            .iter()
            .any(|assignee| assignee.is(&self.author))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PullRequestAction {
    Opened,
    Synchronize,
    Closed,
    Reopened,
    Edited,
    Other,
}

#[derive(Debug, Clone)]
pub struct PullRequestChanged {
    pub repository: GithubRepoName,
    pub pr_number: PullRequestNumber,
    pub action: PullRequestAction,
    pub merged: bool,
}
