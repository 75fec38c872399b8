use anyhow::Context;

use crate::lgtm::event::{PullRequestAction, PullRequestChanged};
use crate::lgtm::{
    Comment, LgtmContext, PullRequestClient, RemoveLabelError, LGTM_LABEL,
    LGTM_REMOVED_NOTIFICATION,
};

/// Removes the approval label when new commits are pushed to a pull request.
pub(super) async fn handle_pull_request_changed<Client: PullRequestClient>(
    ctx: &LgtmContext<Client>,
    payload: &PullRequestChanged,
) -> anyhow::Result<()> {
    if payload.merged || payload.action != PullRequestAction::Synchronize {
        return Ok(());
    }

    let repo = &payload.repository;
    let pr_number = payload.pr_number;

    match ctx.client.remove_label(repo, pr_number, LGTM_LABEL).await {
        Ok(()) => {
            tracing::info!("Notifying {repo}#{pr_number} that the LGTM label was removed");
            ctx.client
                .post_comment(
                    repo,
                    pr_number,
                    Comment::new(LGTM_REMOVED_NOTIFICATION.to_string()),
                )
                .await
        }
        Err(RemoveLabelError::LabelNotFound(_)) => {
            tracing::debug!("{repo}#{pr_number} has no LGTM label");
            Ok(())
        }
        Err(RemoveLabelError::Other(error)) => Err(error).context("Failed removing LGTM label"),
    }
}
