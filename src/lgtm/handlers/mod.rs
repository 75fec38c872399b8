use tracing::Instrument;

use crate::lgtm::event::LgtmEvent;
use crate::lgtm::handlers::comment::handle_comment;
use crate::lgtm::handlers::synchronize::handle_pull_request_changed;
use crate::lgtm::{LgtmContext, PullRequestClient};

mod comment;
mod synchronize;

/// This function executes a single event.
pub async fn handle_lgtm_event<Client: PullRequestClient>(
    event: LgtmEvent,
    ctx: &LgtmContext<Client>,
) -> anyhow::Result<()> {
    match event {
        LgtmEvent::Comment(comment) => {
            let span = tracing::info_span!(
                "Comment",
                pr = format!("{}#{}", comment.repository, comment.pr_number),
                author = comment.author.username
            );
            handle_comment(ctx, &comment).instrument(span).await
        }
        LgtmEvent::PullRequest(payload) => {
            let span = tracing::info_span!(
                "Pull request",
                pr = format!("{}#{}", payload.repository, payload.pr_number),
                action = ?payload.action
            );
            handle_pull_request_changed(ctx, &payload)
                .instrument(span)
                .await
        }
    }
}
