use anyhow::Context;
use octocrab::Octocrab;
use secrecy::{ExposeSecret, SecretString};

pub mod client;
pub mod owners;

fn base_github_url() -> &'static str {
    "https://api.github.com"
}

/// Creates a GitHub API client that acts as the bot user owning `token`.
pub fn create_github_client(token: SecretString) -> anyhow::Result<Octocrab> {
    Octocrab::builder()
        .base_uri(base_github_url())
        .context("Invalid GitHub base URL")?
        .personal_token(token.expose_secret().to_string())
        .build()
        .context("Could not create octocrab client")
}
