use anyhow::Context;

use crate::lgtm::event::PullRequestComment;
use crate::lgtm::{LgtmContext, PullRequestClient};
use crate::owners::reviewers_for_files;

#[derive(Debug, PartialEq)]
pub(super) enum AuthorizationOutcome {
    Granted,
    /// The user may not change the label. The message explains why.
    Denied(String),
}

/// Decides whether the author of `comment` may change the approval label of the pull request.
///
/// - The PR author may always proceed (they can only get here with a cancellation).
/// - Unless collaborator checks are skipped for the repository, commenters are assigned to the
///   PR, which only succeeds for collaborators. Existing assignees are accepted directly.
/// - Otherwise, the commenter has to be an approver or a reviewer in the OWNERS files covering
///   the changed files.
pub(super) async fn resolve_authorization<Client: PullRequestClient>(
    ctx: &LgtmContext<Client>,
    comment: &PullRequestComment,
) -> anyhow::Result<AuthorizationOutcome> {
    if comment.is_from_issue_author() {
        return Ok(AuthorizationOutcome::Granted);
    }
    if ctx.config.skip_collaborators(&comment.repository) {
        authorize_by_owners(ctx, comment).await
    } else if comment.is_from_assignee() {
        Ok(AuthorizationOutcome::Granted)
    } else {
        authorize_by_assignment(ctx, comment).await
    }
}

async fn authorize_by_assignment<Client: PullRequestClient>(
    ctx: &LgtmContext<Client>,
    comment: &PullRequestComment,
) -> anyhow::Result<AuthorizationOutcome> {
    let repo = &comment.repository;
    let username = &comment.author.username;

    tracing::info!("Assigning {repo}#{} to {username}", comment.pr_number);
    let Err(assign_error) = ctx
        .client
        .assign(repo, comment.pr_number, &[username.clone()])
        .await
    else {
        return Ok(AuthorizationOutcome::Granted);
    };

    let reason = match ctx.client.is_collaborator(repo, username).await {
        Ok(false) => format!("only {repo} repo collaborators may be assigned issues"),
        Ok(true) => {
            tracing::error!("Cannot assign {username} to {repo}#{}: {assign_error:?}", comment.pr_number);
            "assigning you to the PR failed".to_string()
        }
        Err(error) => {
            tracing::error!("Cannot determine if {username} is a collaborator of {repo}: {error:?}");
            "assigning you to the PR failed".to_string()
        }
    };
    Ok(AuthorizationOutcome::Denied(format!(
        "changing LGTM is restricted to assignees, and {reason}."
    )))
}

async fn authorize_by_owners<Client: PullRequestClient>(
    ctx: &LgtmContext<Client>,
    comment: &PullRequestComment,
) -> anyhow::Result<AuthorizationOutcome> {
    let repo = &comment.repository;
    tracing::debug!(
        "Skipping collaborator checks and loading OWNERS for {repo}#{}",
        comment.pr_number
    );

    let pr = ctx.client.get_pull_request(repo, comment.pr_number).await?;
    let files = ctx
        .client
        .get_changed_files(repo, comment.pr_number)
        .await
        .with_context(|| format!("Cannot get PR changes for {repo}#{}", comment.pr_number))?;
    let owners = ctx
        .owners
        .load_repo_owners(repo, &pr.base_ref, &files)
        .await
        .with_context(|| format!("Cannot load OWNERS of {repo} at {}", pr.base_ref))?;

    if reviewers_for_files(owners.as_ref(), &files).contains(&comment.author.normalized()) {
        Ok(AuthorizationOutcome::Granted)
    } else {
        Ok(AuthorizationOutcome::Denied(
            "adding LGTM is restricted to approvers and reviewers in OWNERS files.".to_string(),
        ))
    }
}
