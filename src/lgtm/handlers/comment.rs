use crate::lgtm::authorization::{resolve_authorization, AuthorizationOutcome};
use crate::lgtm::event::{CommentAction, IssueState, PullRequestComment};
use crate::lgtm::{
    parse_command, Comment, LgtmCommand, LgtmContext, PullRequestClient, LGTM_LABEL,
    LGTM_REMOVED_NOTIFICATION,
};

/// Reacts to `/lgtm` and `/lgtm cancel` commands by adding or removing the approval label.
pub(super) async fn handle_comment<Client: PullRequestClient>(
    ctx: &LgtmContext<Client>,
    comment: &PullRequestComment,
) -> anyhow::Result<()> {
    // Only consider new comments on open PRs.
    if !comment.is_pull_request
        || comment.issue_state != IssueState::Open
        || comment.action != CommentAction::Created
    {
        return Ok(());
    }

    let Some(command) = parse_command(&comment.text) else {
        return Ok(());
    };
    tracing::debug!("Command: {command:?}");

    let repo = &comment.repository;
    let pr_number = comment.pr_number;

    if command == LgtmCommand::Approve && comment.is_from_issue_author() {
        let message = "you cannot LGTM your own PR.";
        tracing::info!("Commenting with \"{message}\"");
        return ctx
            .client
            .post_comment(repo, pr_number, Comment::response(comment, message))
            .await;
    }

    if let AuthorizationOutcome::Denied(message) = resolve_authorization(ctx, comment).await? {
        tracing::info!("Replying to {command:?} request with \"{message}\"");
        return ctx
            .client
            .post_comment(repo, pr_number, Comment::response(comment, &message))
            .await;
    }

    // If the labels cannot be loaded, continue as if the PR had none.
    let labels = ctx
        .client
        .get_labels(repo, pr_number)
        .await
        .unwrap_or_else(|error| {
            tracing::error!("Cannot get labels of {repo}#{pr_number}: {error:?}");
            vec![]
        });
    let has_lgtm = labels.iter().any(|label| label == LGTM_LABEL);

    match (command, has_lgtm) {
        (LgtmCommand::Cancel, true) => {
            tracing::info!("Removing LGTM label");
            ctx.client
                .remove_label(repo, pr_number, LGTM_LABEL)
                .await
                .map_err(anyhow::Error::from)
        }
        (LgtmCommand::Approve, false) => {
            tracing::info!("Adding LGTM label");
            ctx.client.add_label(repo, pr_number, LGTM_LABEL).await?;
            delete_removal_notifications(ctx, comment).await;
            Ok(())
        }
        _ => Ok(()),
    }
}

/// Deletes the notifications about the LGTM label being removed, which are obsolete once the
/// label is back.
async fn delete_removal_notifications<Client: PullRequestClient>(
    ctx: &LgtmContext<Client>,
    comment: &PullRequestComment,
) {
    let repo = &comment.repository;
    let pr_number = comment.pr_number;

    let bot_name = match ctx.client.bot_name().await {
        Ok(name) => name,
        Err(error) => {
            tracing::error!("Cannot get bot name: {error:?}");
            return;
        }
    };
    let comments = match ctx.client.list_comments(repo, pr_number).await {
        Ok(comments) => comments,
        Err(error) => {
            tracing::error!("Cannot list comments of {repo}#{pr_number}: {error:?}");
            return;
        }
    };

    for notification in comments.iter().filter(|comment| {
        comment.author.username == bot_name && comment.text == LGTM_REMOVED_NOTIFICATION
    }) {
        if let Err(error) = ctx.client.delete_comment(repo, notification.id).await {
            tracing::error!(
                "Cannot delete comment {} from {repo}#{pr_number}: {error:?}",
                notification.id
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::github::GithubUser;
    use crate::lgtm::event::{CommentAction, IssueState};
    use crate::lgtm::{LGTM_LABEL, LGTM_REMOVED_NOTIFICATION};
    use crate::tests::client::ClientCall;
    use crate::tests::event::{comment, default_pr_author, user};
    use crate::tests::state::{skip_collaborators_config, test_bot_name, TestState};

    #[tokio::test]
    async fn ignore_non_command() {
        let state = TestState::default();
        state.comment(comment("Looks good to me")).await.unwrap();
        state.client().check_calls(&[]);
    }

    #[tokio::test]
    async fn ignore_issue_comment() {
        let state = TestState::default();
        state
            .comment(comment("/lgtm").is_pull_request(false))
            .await
            .unwrap();
        state.client().check_calls(&[]);
    }

    #[tokio::test]
    async fn ignore_closed_pr() {
        let state = TestState::default();
        state
            .comment(comment("/lgtm").issue_state(IssueState::Closed))
            .await
            .unwrap();
        state.client().check_calls(&[]);
    }

    #[tokio::test]
    async fn ignore_edited_comment() {
        let state = TestState::default();
        state
            .comment(comment("/lgtm").action(CommentAction::Edited))
            .await
            .unwrap();
        state
            .comment(comment("/lgtm").action(CommentAction::Deleted))
            .await
            .unwrap();
        state.client().check_calls(&[]);
    }

    #[tokio::test]
    async fn approve_assigns_and_adds_label() {
        let state = TestState::default();
        state.comment(comment("/lgtm")).await.unwrap();
        state.client().check_calls(&[
            ClientCall::Assign(vec!["<user>".to_string()]),
            ClientCall::GetLabels,
            ClientCall::AddLabel(LGTM_LABEL.to_string()),
            ClientCall::BotName,
            ClientCall::ListComments,
        ]);
        state.client().check_labels(&[LGTM_LABEL]);
        state.client().check_comments(&[]);
    }

    #[tokio::test]
    async fn approve_no_issue() {
        let state = TestState::default();
        state
            .comment(comment("Thanks!\n/lgtm no-issue"))
            .await
            .unwrap();
        state.client().check_labels(&[LGTM_LABEL]);
    }

    #[tokio::test]
    async fn approve_by_assignee_does_not_assign() {
        let state = TestState::default();
        state
            .comment(comment("/lgtm").assignees(vec![user("<user>")]))
            .await
            .unwrap();
        state.client().check_assignees(&[]);
        state.client().check_labels(&[LGTM_LABEL]);
    }

    #[tokio::test]
    async fn approve_already_approved() {
        let state = TestState::default();
        state.client().set_labels(&[LGTM_LABEL]);
        state.comment(comment("/lgtm")).await.unwrap();
        state.client().check_calls(&[
            ClientCall::Assign(vec!["<user>".to_string()]),
            ClientCall::GetLabels,
        ]);
        state.client().check_labels(&[LGTM_LABEL]);
    }

    #[tokio::test]
    async fn self_approval_is_rejected() {
        let state = TestState::default();
        state
            .comment(comment("/lgtm").author(default_pr_author()))
            .await
            .unwrap();
        state.client().check_calls(&[ClientCall::PostComment]);
        state.client().check_labels(&[]);
        insta::assert_snapshot!(state.client().get_last_comment(), @r###"
        @pr-author: you cannot LGTM your own PR.

        <details>

        In response to [this](https://github.com/owner/name/pull/1#issuecomment-1):

        >/lgtm
        </details>
        "###);
    }

    #[tokio::test]
    async fn self_approval_is_rejected_when_skipping_collaborators() {
        let state = TestState::with_config(skip_collaborators_config());
        state
            .comment(comment("/lgtm").author(user("PR-AUTHOR")))
            .await
            .unwrap();
        state.client().check_calls(&[ClientCall::PostComment]);
        state.owners().check_loaded_refs(&[]);
    }

    #[tokio::test]
    async fn author_can_cancel() {
        let state = TestState::default();
        state.client().set_labels(&[LGTM_LABEL, "kind/bug"]);
        state
            .comment(comment("/lgtm cancel").author(default_pr_author()))
            .await
            .unwrap();
        state.client().check_calls(&[
            ClientCall::GetLabels,
            ClientCall::RemoveLabel(LGTM_LABEL.to_string()),
        ]);
        state.client().check_labels(&["kind/bug"]);
        state.client().check_comments(&[]);
    }

    #[tokio::test]
    async fn author_can_cancel_when_skipping_collaborators() {
        let state = TestState::with_config(skip_collaborators_config());
        state.client().set_labels(&[LGTM_LABEL]);
        state
            .comment(comment("/lgtm cancel").author(default_pr_author()))
            .await
            .unwrap();
        state.client().check_labels(&[]);
        state.owners().check_loaded_refs(&[]);
    }

    #[tokio::test]
    async fn cancel_by_collaborator() {
        let state = TestState::default();
        state.client().set_labels(&[LGTM_LABEL]);
        state.comment(comment("/lgtm cancel")).await.unwrap();
        state.client().check_calls(&[
            ClientCall::Assign(vec!["<user>".to_string()]),
            ClientCall::GetLabels,
            ClientCall::RemoveLabel(LGTM_LABEL.to_string()),
        ]);
        state.client().check_labels(&[]);
    }

    #[tokio::test]
    async fn cancel_without_label() {
        let state = TestState::default();
        state.comment(comment("/lgtm cancel")).await.unwrap();
        state.client().check_calls(&[
            ClientCall::Assign(vec!["<user>".to_string()]),
            ClientCall::GetLabels,
        ]);
    }

    #[tokio::test]
    async fn cancel_remove_label_failure_is_error() {
        let state = TestState::default();
        state.client().set_labels(&[LGTM_LABEL]);
        state.client().fail_remove_label();
        assert!(state.comment(comment("/lgtm cancel")).await.is_err());
    }

    #[tokio::test]
    async fn non_collaborator_cannot_approve() {
        let state = TestState::default();
        state.client().set_collaborator("<user>", false);
        state.comment(comment("/lgtm")).await.unwrap();
        state.client().check_calls(&[
            ClientCall::Assign(vec!["<user>".to_string()]),
            ClientCall::IsCollaborator("<user>".to_string()),
            ClientCall::PostComment,
        ]);
        state.client().check_labels(&[]);
        insta::assert_snapshot!(state.client().get_last_comment(), @r###"
        @<user>: changing LGTM is restricted to assignees, and only owner/name repo collaborators may be assigned issues.

        <details>

        In response to [this](https://github.com/owner/name/pull/1#issuecomment-1):

        >/lgtm
        </details>
        "###);
    }

    #[tokio::test]
    async fn non_collaborator_cannot_cancel() {
        let state = TestState::default();
        state.client().set_labels(&[LGTM_LABEL]);
        state.client().set_collaborator("<user>", false);
        state.comment(comment("/lgtm cancel")).await.unwrap();
        state.client().check_labels(&[LGTM_LABEL]);
        state.client().check_comment_count(1);
    }

    #[tokio::test]
    async fn owners_reviewer_can_approve() {
        let state = TestState::with_config(skip_collaborators_config());
        state.client().set_changed_files(&["src/lib.rs"]);
        state.owners().add_reviewers("src/lib.rs", &["<user>"]);
        state.comment(comment("/lgtm")).await.unwrap();
        state.client().check_assignees(&[]);
        state.client().check_labels(&[LGTM_LABEL]);
    }

    #[tokio::test]
    async fn non_owner_cannot_approve() {
        let state = TestState::with_config(skip_collaborators_config());
        state.client().set_changed_files(&["src/lib.rs"]);
        state.owners().add_reviewers("src/lib.rs", &["someone-else"]);
        state.comment(comment("/lgtm")).await.unwrap();
        state.client().check_labels(&[]);
        insta::assert_snapshot!(state.client().get_last_comment(), @r###"
        @<user>: adding LGTM is restricted to approvers and reviewers in OWNERS files.

        <details>

        In response to [this](https://github.com/owner/name/pull/1#issuecomment-1):

        >/lgtm
        </details>
        "###);
    }

    #[tokio::test]
    async fn owners_load_failure_is_error() {
        let state = TestState::with_config(skip_collaborators_config());
        state.owners().fail_load();
        assert!(state.comment(comment("/lgtm")).await.is_err());
        state.client().check_labels(&[]);
        state.client().check_comments(&[]);
    }

    #[tokio::test]
    async fn label_fetch_failure_assumes_no_label() {
        let state = TestState::default();
        state.client().set_labels(&[LGTM_LABEL]);
        state.client().fail_get_labels();
        state.comment(comment("/lgtm")).await.unwrap();
        state.client().check_calls(&[
            ClientCall::Assign(vec!["<user>".to_string()]),
            ClientCall::GetLabels,
            ClientCall::AddLabel(LGTM_LABEL.to_string()),
            ClientCall::BotName,
            ClientCall::ListComments,
        ]);
    }

    #[tokio::test]
    async fn label_fetch_failure_ignores_cancel() {
        let state = TestState::default();
        state.client().set_labels(&[LGTM_LABEL]);
        state.client().fail_get_labels();
        state.comment(comment("/lgtm cancel")).await.unwrap();
        state.client().check_labels(&[LGTM_LABEL]);
    }

    #[tokio::test]
    async fn add_label_failure_skips_cleanup() {
        let state = TestState::default();
        state.client().fail_add_label();
        assert!(state.comment(comment("/lgtm")).await.is_err());
        state.client().check_calls(&[
            ClientCall::Assign(vec!["<user>".to_string()]),
            ClientCall::GetLabels,
            ClientCall::AddLabel(LGTM_LABEL.to_string()),
        ]);
    }

    #[tokio::test]
    async fn approve_deletes_removal_notifications() {
        let state = TestState::default();
        let bot = GithubUser::new(&test_bot_name());
        let notification = state
            .client()
            .add_existing_comment(bot.clone(), LGTM_REMOVED_NOTIFICATION);
        let other_bot_comment = state.client().add_existing_comment(bot, "Hello!");
        let user_copy = state
            .client()
            .add_existing_comment(user("mallory"), LGTM_REMOVED_NOTIFICATION);

        state.comment(comment("/lgtm")).await.unwrap();
        state.client().check_deleted_comments(&[notification]);
        state
            .client()
            .check_existing_comments(&[other_bot_comment, user_copy]);
    }

    #[tokio::test]
    async fn cleanup_continues_after_delete_failure() {
        let state = TestState::default();
        let bot = GithubUser::new(&test_bot_name());
        let first = state
            .client()
            .add_existing_comment(bot.clone(), LGTM_REMOVED_NOTIFICATION);
        let second = state
            .client()
            .add_existing_comment(bot, LGTM_REMOVED_NOTIFICATION);
        state.client().fail_delete_comment(first);

        state.comment(comment("/lgtm")).await.unwrap();
        state.client().check_deleted_comments(&[second]);
        state.client().check_labels(&[LGTM_LABEL]);
    }

    #[tokio::test]
    async fn cleanup_failures_do_not_fail_approval() {
        let state = TestState::default();
        state.client().fail_bot_name();
        state.comment(comment("/lgtm")).await.unwrap();
        state.client().check_labels(&[LGTM_LABEL]);

        let state = TestState::default();
        state.client().fail_list_comments();
        state.comment(comment("/lgtm")).await.unwrap();
        state.client().check_labels(&[LGTM_LABEL]);
        state.client().check_deleted_comments(&[]);
    }

    #[tokio::test]
    async fn cancel_does_not_cleanup() {
        let state = TestState::default();
        state.client().set_labels(&[LGTM_LABEL]);
        let notification = state.client().add_existing_comment(
            GithubUser::new(&test_bot_name()),
            LGTM_REMOVED_NOTIFICATION,
        );
        state.comment(comment("/lgtm cancel")).await.unwrap();
        state.client().check_existing_comments(&[notification]);
    }
}
