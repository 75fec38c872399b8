use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;

use lgtm::config::PluginConfig;
use lgtm::github::api::create_github_client;
use lgtm::github::server::{create_app, create_lgtm_process, ServerState};
use lgtm::github::{GithubClient, GithubOwnersLoader, WebhookSecret};
use lgtm::lgtm::LgtmContext;
use lgtm::utils::logging::init_logging;

#[derive(clap::Parser)]
struct Opts {
    /// Secret used to authenticate webhooks.
    #[arg(long, env = "WEBHOOK_SECRET")]
    webhook_secret: String,

    /// Token of the GitHub user that the bot acts as.
    #[arg(long, env = "GITHUB_TOKEN")]
    github_token: String,

    /// Path to a TOML configuration file.
    #[arg(long, env = "LGTM_CONFIG")]
    config: Option<PathBuf>,

    /// Port on which the webhook server listens.
    #[arg(long, env = "PORT", default_value_t = 8080)]
    port: u16,
}

async fn server(state: ServerState, port: u16) -> anyhow::Result<()> {
    let app = create_app(state);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Cannot bind to {addr}"))?;
    tracing::info!("Listening on {addr}");

    axum::serve(listener, app).await?;
    Ok(())
}

fn try_main(opts: Opts) -> anyhow::Result<()> {
    let config = match &opts.config {
        Some(path) => PluginConfig::load(path)?,
        None => PluginConfig::default(),
    };
    tracing::info!("Loaded config: {config:?}");

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Cannot build tokio runtime")?;

    runtime.block_on(async move {
        let client = create_github_client(opts.github_token.into())?;
        let ctx = LgtmContext::new(
            GithubClient::new(client.clone()),
            Box::new(GithubOwnersLoader::new(client)),
            config,
        );
        let (tx, lgtm_process) = create_lgtm_process(ctx);

        let state = ServerState::new(tx, WebhookSecret::new(opts.webhook_secret));
        let server_process = server(state, opts.port);

        tokio::select! {
            () = lgtm_process => {
                tracing::warn!("Event handling process has ended");
                Ok(())
            },
            res = server_process => {
                tracing::warn!("Server has ended: {res:?}");
                res
            }
        }
    })
}

fn main() {
    init_logging();

    let opts = Opts::parse();
    if let Err(error) = try_main(opts) {
        eprintln!("Error: {error:?}");
        std::process::exit(1);
    }
}
