use std::path::Path;

use anyhow::Context;

use crate::github::GithubRepoName;

/// Configuration of the bot, loaded from a TOML file.
#[derive(serde::Deserialize, Debug, Default, Clone)]
pub struct PluginConfig {
    #[serde(default)]
    pub owners: OwnersConfig,
}

#[derive(serde::Deserialize, Debug, Default, Clone)]
pub struct OwnersConfig {
    /// Organizations (`org`) or repositories (`org/repo`) for which assignment based
    /// authorization is replaced by OWNERS files.
    #[serde(default)]
    pub skip_collaborators: Vec<String>,
}

impl PluginConfig {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Cannot read config file {}", path.display()))?;
        Self::parse(&content).with_context(|| format!("Cannot parse config file {}", path.display()))
    }

    pub fn parse(content: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Should collaborator checks be skipped for the given repository?
    pub fn skip_collaborators(&self, repo: &GithubRepoName) -> bool {
        let full = repo.to_string();
        self.owners.skip_collaborators.iter().any(|entry| {
            let entry = entry.to_lowercase();
            entry == repo.owner() || entry == full
        })
    }
}
