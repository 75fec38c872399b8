//! Contains definitions of common types (pull request, user, repository name) needed
//! for working with (GitHub) repositories.
use std::fmt::{Debug, Display, Formatter};

pub mod api;
pub mod server;
mod webhook;

pub use api::client::GithubClient;
pub use api::owners::GithubOwnersLoader;
pub use webhook::WebhookSecret;

/// Unique identifier of a GitHub repository
#[derive(Debug, PartialEq, Eq, Hash, Clone)]
pub struct GithubRepoName {
    owner: String,
    name: String,
}

impl GithubRepoName {
    pub fn new(owner: &str, name: &str) -> Self {
        Self {
            owner: owner.to_lowercase(),
            name: name.to_lowercase(),
        }
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Display for GithubRepoName {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_fmt(format_args!("{}/{}", self.owner, self.name))
    }
}

/// Normalizes a GitHub login for comparisons: GitHub logins are case insensitive and are
/// sometimes written with a leading `@`.
pub fn normalize_login(login: &str) -> String {
    login.trim_start_matches('@').to_lowercase()
}

#[derive(Debug, Clone, PartialEq)]
pub struct GithubUser {
    pub username: String,
}

impl GithubUser {
    pub fn new(username: &str) -> Self {
        Self {
            username: username.to_string(),
        }
    }

    /// Returns true if both users have the same login, ignoring case.
    pub fn is(&self, other: &GithubUser) -> bool {
        normalize_login(&self.username) == normalize_login(&other.username)
    }

    pub fn normalized(&self) -> String {
        normalize_login(&self.username)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PullRequestNumber(pub u64);

impl Display for PullRequestNumber {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        <u64 as Display>::fmt(&self.0, f)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct CommentId(pub u64);

impl Display for CommentId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        <u64 as Display>::fmt(&self.0, f)
    }
}

#[derive(Clone, Debug)]
pub struct PullRequest {
    /// Name of the branch into which the PR should be merged.
    pub base_ref: String,
}

/// A comment posted on an issue or a pull request.
#[derive(Clone, Debug, PartialEq)]
pub struct IssueComment {
    pub id: CommentId,
    pub author: GithubUser,
    pub text: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repo_name_is_lowercase() {
        let name = GithubRepoName::new("Kubernetes", "Test-Infra");
        assert_eq!(name.to_string(), "kubernetes/test-infra");
    }

    #[test]
    fn normalize_login_strips_at() {
        assert_eq!(normalize_login("@Alice"), "alice");
        assert_eq!(normalize_login("bob"), "bob");
    }

    #[test]
    fn user_is_case_insensitive() {
        assert!(GithubUser::new("Alice").is(&GithubUser::new("alice")));
        assert!(!GithubUser::new("alice").is(&GithubUser::new("bob")));
    }
}
