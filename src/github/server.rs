use std::future::Future;
use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use tokio::sync::mpsc;
use tower::limit::ConcurrencyLimitLayer;
use tracing::Instrument;

use crate::github::webhook::{GitHubWebhook, WebhookSecret};
use crate::lgtm::event::LgtmEvent;
use crate::lgtm::{handle_lgtm_event, plugin_help, LgtmContext, PullRequestClient};
use crate::utils::logging::LogError;

/// Shared server state for all axum handlers.
pub struct ServerState {
    event_queue: mpsc::Sender<LgtmEvent>,
    webhook_secret: WebhookSecret,
}

impl ServerState {
    pub fn new(event_queue: mpsc::Sender<LgtmEvent>, webhook_secret: WebhookSecret) -> Self {
        Self {
            event_queue,
            webhook_secret,
        }
    }

    pub fn get_webhook_secret(&self) -> &WebhookSecret {
        &self.webhook_secret
    }
}

pub type ServerStateRef = Arc<ServerState>;

pub fn create_app(state: ServerState) -> Router {
    Router::new()
        .route("/github", post(github_webhook_handler))
        .route("/health", get(health_handler))
        .route("/help", get(help_handler))
        .layer(ConcurrencyLimitLayer::new(100))
        .with_state(Arc::new(state))
}

async fn health_handler() -> impl IntoResponse {
    (StatusCode::OK, "")
}

async fn help_handler() -> impl IntoResponse {
    Json(plugin_help())
}

/// Axum handler that receives a webhook and sends it to a webhook channel.
pub async fn github_webhook_handler(
    State(state): State<ServerStateRef>,
    GitHubWebhook(event): GitHubWebhook,
) -> impl IntoResponse {
    match state.event_queue.send(event).await {
        Ok(_) => (StatusCode::OK, ""),
        Err(err) => {
            tracing::error!("Could not send webhook event: {err:?}");
            (StatusCode::INTERNAL_SERVER_ERROR, "")
        }
    }
}

/// Creates a future with a process that continuously receives webhook events and reacts to them.
///
/// Each event is handled in its own task, so events for different pull requests do not wait for
/// each other.
pub fn create_lgtm_process<Client: PullRequestClient + 'static>(
    ctx: LgtmContext<Client>,
) -> (mpsc::Sender<LgtmEvent>, impl Future<Output = ()>) {
    let (tx, mut rx) = mpsc::channel::<LgtmEvent>(1024);
    let ctx = Arc::new(ctx);

    let service = async move {
        while let Some(event) = rx.recv().await {
            let ctx = Arc::clone(&ctx);
            let span = tracing::info_span!("Event", repo = event.repository().to_string());
            tracing::debug!("Received event: {event:#?}");
            tokio::spawn(
                async move {
                    if let Err(error) = handle_lgtm_event(event, &ctx).await {
                        tracing::Span::current().log_error(error);
                    }
                }
                .instrument(span),
            );
        }
    };
    (tx, service)
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    use super::*;
    use crate::lgtm::LGTM_LABEL;
    use crate::tests::event::pr_changed;
    use crate::tests::state::TestState;

    fn test_app() -> Router {
        let (tx, _) = mpsc::channel(1);
        create_app(ServerState::new(tx, WebhookSecret::new("secret".to_string())))
    }

    #[tokio::test]
    async fn health() {
        let response = test_app()
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn help() {
        let response = test_app()
            .oneshot(Request::get("/help").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let help: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(help["commands"][0]["usage"], "/lgtm [cancel]");
    }

    #[tokio::test]
    async fn process_handles_events() {
        let state = TestState::default();
        state.client().set_labels(&[LGTM_LABEL]);
        let client = state.client_handle();

        let (tx, process) = create_lgtm_process(state.ctx);
        let process = tokio::spawn(process);
        tx.send(LgtmEvent::PullRequest(
            pr_changed(crate::lgtm::event::PullRequestAction::Synchronize).create(),
        ))
        .await
        .unwrap();

        // The event is handled in a separate task.
        for _ in 0..100 {
            if client.get_labels_snapshot().is_empty() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        client.check_labels(&[]);

        drop(tx);
        process.await.unwrap();
    }
}
