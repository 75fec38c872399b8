use axum::async_trait;
use axum::body::Bytes;
use axum::extract::{FromRequest, Request};
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;

use crate::github::server::ServerStateRef;
use crate::github::{GithubRepoName, GithubUser, PullRequestNumber};
use crate::lgtm::event::{
    CommentAction, IssueState, LgtmEvent, PullRequestAction, PullRequestChanged,
    PullRequestComment,
};

/// Maximum accepted size of a webhook payload.
const MAX_WEBHOOK_SIZE: usize = 25 * 1024 * 1024;

#[derive(serde::Deserialize, Debug)]
struct WebhookUser {
    login: String,
}

impl From<WebhookUser> for GithubUser {
    fn from(user: WebhookUser) -> Self {
        GithubUser {
            username: user.login,
        }
    }
}

#[derive(serde::Deserialize, Debug)]
struct WebhookRepository {
    name: String,
    owner: WebhookUser,
}

impl From<&WebhookRepository> for GithubRepoName {
    fn from(repository: &WebhookRepository) -> Self {
        GithubRepoName::new(&repository.owner.login, &repository.name)
    }
}

#[derive(serde::Deserialize, Debug, Clone, Copy)]
#[serde(rename_all = "lowercase")]
enum WebhookIssueState {
    Open,
    Closed,
}

impl From<WebhookIssueState> for IssueState {
    fn from(state: WebhookIssueState) -> Self {
        match state {
            WebhookIssueState::Open => IssueState::Open,
            WebhookIssueState::Closed => IssueState::Closed,
        }
    }
}

#[derive(serde::Deserialize, Debug)]
struct WebhookIssue {
    number: u64,
    state: WebhookIssueState,
    user: WebhookUser,
    #[serde(default)]
    assignees: Vec<WebhookUser>,
    /// Only present if the issue is a pull request.
    pull_request: Option<serde_json::Value>,
}

#[derive(serde::Deserialize, Debug)]
struct WebhookComment {
    body: Option<String>,
    html_url: String,
    user: WebhookUser,
}

#[derive(serde::Deserialize, Debug)]
#[serde(rename_all = "lowercase")]
enum IssueCommentAction {
    Created,
    Edited,
    Deleted,
}

impl From<IssueCommentAction> for CommentAction {
    fn from(action: IssueCommentAction) -> Self {
        match action {
            IssueCommentAction::Created => CommentAction::Created,
            IssueCommentAction::Edited => CommentAction::Edited,
            IssueCommentAction::Deleted => CommentAction::Deleted,
        }
    }
}

#[derive(serde::Deserialize, Debug)]
struct WebhookIssueComment {
    action: IssueCommentAction,
    issue: WebhookIssue,
    comment: WebhookComment,
    repository: WebhookRepository,
}

#[derive(serde::Deserialize, Debug)]
struct WebhookPullRequest {
    number: u64,
    state: WebhookIssueState,
    user: WebhookUser,
    #[serde(default)]
    assignees: Vec<WebhookUser>,
    #[serde(default)]
    merged: bool,
}

#[derive(serde::Deserialize, Debug)]
#[serde(rename_all = "lowercase")]
enum ReviewAction {
    Submitted,
    Edited,
    Dismissed,
}

#[derive(serde::Deserialize, Debug)]
struct WebhookReview {
    body: Option<String>,
    html_url: String,
    user: WebhookUser,
}

#[derive(serde::Deserialize, Debug)]
struct WebhookPullRequestReview {
    action: ReviewAction,
    review: WebhookReview,
    pull_request: WebhookPullRequest,
    repository: WebhookRepository,
}

#[derive(serde::Deserialize, Debug)]
struct WebhookPullRequestReviewComment {
    action: IssueCommentAction,
    comment: WebhookComment,
    pull_request: WebhookPullRequest,
    repository: WebhookRepository,
}

#[derive(serde::Deserialize, Debug)]
#[serde(rename_all = "lowercase")]
enum WebhookPullRequestAction {
    Opened,
    Synchronize,
    Closed,
    Reopened,
    Edited,
    #[serde(other)]
    Other,
}

#[derive(serde::Deserialize, Debug)]
struct WebhookPullRequestEvent {
    action: WebhookPullRequestAction,
    pull_request: WebhookPullRequest,
    repository: WebhookRepository,
}

/// axum extractor for GitHub webhook events.
#[derive(Debug)]
pub struct GitHubWebhook(pub LgtmEvent);

/// Extracts a webhook event from a HTTP request.
#[async_trait]
impl FromRequest<ServerStateRef> for GitHubWebhook {
    type Rejection = StatusCode;

    async fn from_request(request: Request, state: &ServerStateRef) -> Result<Self, Self::Rejection> {
        let (parts, body) = request.into_parts();

        // Eagerly load body
        let body: Bytes = axum::body::to_bytes(body, MAX_WEBHOOK_SIZE)
            .await
            .map_err(|error| {
                tracing::error!("Parsing webhook body failed: {error:?}");
                StatusCode::BAD_REQUEST
            })?;

        // Verify that the request is valid
        if !verify_gh_signature(&parts.headers, &body, state.get_webhook_secret()) {
            tracing::error!("Webhook request failed, could not authenticate webhook");
            return Err(StatusCode::BAD_REQUEST);
        }

        // Parse webhook content
        match parse_webhook_event(&parts.headers, &body) {
            Ok(Some(event)) => Ok(GitHubWebhook(event)),
            Ok(None) => Err(StatusCode::OK),
            Err(error) => {
                tracing::error!("Cannot parse webhook event: {error:?}");
                Err(StatusCode::BAD_REQUEST)
            }
        }
    }
}

fn parse_webhook_event(headers: &HeaderMap, body: &[u8]) -> anyhow::Result<Option<LgtmEvent>> {
    let Some(event_type) = headers.get("x-github-event") else {
        return Err(anyhow::anyhow!("x-github-event header not found"));
    };

    match event_type.as_bytes() {
        b"issue_comment" => {
            let payload: WebhookIssueComment = serde_json::from_slice(body)?;
            Ok(Some(LgtmEvent::Comment(parse_issue_comment(payload))))
        }
        b"pull_request_review" => {
            let payload: WebhookPullRequestReview = serde_json::from_slice(body)?;
            Ok(parse_review(payload).map(LgtmEvent::Comment))
        }
        b"pull_request_review_comment" => {
            let payload: WebhookPullRequestReviewComment = serde_json::from_slice(body)?;
            Ok(Some(LgtmEvent::Comment(parse_review_comment(payload))))
        }
        b"pull_request" => {
            let payload: WebhookPullRequestEvent = serde_json::from_slice(body)?;
            Ok(Some(LgtmEvent::PullRequest(parse_pull_request(payload))))
        }
        _ => {
            tracing::debug!("Ignoring unknown event type {:?}", event_type.to_str());
            Ok(None)
        }
    }
}

fn parse_issue_comment(payload: WebhookIssueComment) -> PullRequestComment {
    PullRequestComment {
        repository: (&payload.repository).into(),
        pr_number: PullRequestNumber(payload.issue.number),
        is_pull_request: payload.issue.pull_request.is_some(),
        issue_state: payload.issue.state.into(),
        action: payload.action.into(),
        text: payload.comment.body.unwrap_or_default(),
        html_url: payload.comment.html_url,
        author: payload.comment.user.into(),
        issue_author: payload.issue.user.into(),
        assignees: payload.issue.assignees.into_iter().map(Into::into).collect(),
    }
}

/// Reviews carry a body that can contain commands, so they are treated like comments.
fn parse_review(payload: WebhookPullRequestReview) -> Option<PullRequestComment> {
    let text = payload.review.body.unwrap_or_default();
    if text.is_empty() {
        tracing::debug!("Ignoring review without a body");
        return None;
    }

    Some(PullRequestComment {
        repository: (&payload.repository).into(),
        pr_number: PullRequestNumber(payload.pull_request.number),
        is_pull_request: true,
        issue_state: payload.pull_request.state.into(),
        action: match payload.action {
            ReviewAction::Submitted => CommentAction::Created,
            ReviewAction::Edited => CommentAction::Edited,
            ReviewAction::Dismissed => CommentAction::Deleted,
        },
        text,
        html_url: payload.review.html_url,
        author: payload.review.user.into(),
        issue_author: payload.pull_request.user.into(),
        assignees: payload
            .pull_request
            .assignees
            .into_iter()
            .map(Into::into)
            .collect(),
    })
}

/// Comments on the diff of a pull request.
fn parse_review_comment(payload: WebhookPullRequestReviewComment) -> PullRequestComment {
    PullRequestComment {
        repository: (&payload.repository).into(),
        pr_number: PullRequestNumber(payload.pull_request.number),
        is_pull_request: true,
        issue_state: payload.pull_request.state.into(),
        action: payload.action.into(),
        text: payload.comment.body.unwrap_or_default(),
        html_url: payload.comment.html_url,
        author: payload.comment.user.into(),
        issue_author: payload.pull_request.user.into(),
        assignees: payload
            .pull_request
            .assignees
            .into_iter()
            .map(Into::into)
            .collect(),
    }
}

fn parse_pull_request(payload: WebhookPullRequestEvent) -> PullRequestChanged {
    PullRequestChanged {
        repository: (&payload.repository).into(),
        pr_number: PullRequestNumber(payload.pull_request.number),
        action: match payload.action {
            WebhookPullRequestAction::Opened => PullRequestAction::Opened,
            WebhookPullRequestAction::Synchronize => PullRequestAction::Synchronize,
            WebhookPullRequestAction::Closed => PullRequestAction::Closed,
            WebhookPullRequestAction::Reopened => PullRequestAction::Reopened,
            WebhookPullRequestAction::Edited => PullRequestAction::Edited,
            WebhookPullRequestAction::Other => PullRequestAction::Other,
        },
        merged: payload.pull_request.merged,
    }
}

type HmacSha256 = Hmac<Sha256>;

/// Verifies that the request is properly signed by GitHub with SHA-256 and the passed `secret`.
fn verify_gh_signature(
    headers: &HeaderMap<HeaderValue>,
    body: &[u8],
    secret: &WebhookSecret,
) -> bool {
    let Some(signature) = headers.get("x-hub-signature-256").map(|v| v.as_bytes()) else {
        return false;
    };
    let Some(signature) = signature
        .get(b"sha256=".len()..)
        .and_then(|v| hex::decode(v).ok())
    else {
        return false;
    };

    let Ok(mut mac) = HmacSha256::new_from_slice(secret.expose().as_bytes()) else {
        return false;
    };
    mac.update(body);
    mac.verify_slice(&signature).is_ok()
}

/// Wrapper for a secret which is zeroed on drop and can be exposed only through the [`WebhookSecret::expose`] method.
pub struct WebhookSecret(SecretString);

impl WebhookSecret {
    pub fn new(secret: String) -> Self {
        Self(secret.into())
    }

    pub fn expose(&self) -> &str {
        self.0.expose_secret().as_str()
    }
}
