use std::collections::{HashMap, HashSet};

use crate::github::normalize_login;
use crate::owners::RepoOwners;

pub const OWNERS_FILE_NAME: &str = "OWNERS";

/// Contents of a single `OWNERS` file.
///
/// ```yaml
/// approvers:
/// - alice
/// reviewers:
/// - bob
/// - carol
/// options:
///   no_parent_owners: true
/// ```
#[derive(serde::Deserialize, Debug, Default, Clone)]
pub struct OwnersFile {
    #[serde(default)]
    pub approvers: Vec<String>,
    #[serde(default)]
    pub reviewers: Vec<String>,
    #[serde(default)]
    pub options: OwnersOptions,
}

#[derive(serde::Deserialize, Debug, Default, Clone)]
pub struct OwnersOptions {
    /// Do not inherit owners from parent directories.
    #[serde(default)]
    pub no_parent_owners: bool,
}

impl OwnersFile {
    pub fn parse(content: &str) -> anyhow::Result<Self> {
        Ok(serde_yaml::from_str(content)?)
    }
}

/// All `OWNERS` files of a repository, keyed by the directory that contains them.
/// The root directory is represented by an empty string.
#[derive(Debug, Default)]
pub struct OwnersTree {
    files: HashMap<String, OwnersFile>,
}

impl OwnersTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, directory: &str, file: OwnersFile) {
        self.files
            .insert(directory.trim_matches('/').to_string(), file);
    }

    /// Returns the `OWNERS` files that apply to `path`, starting with the closest one.
    fn owners_of(&self, path: &str) -> Vec<&OwnersFile> {
        let mut result = vec![];
        let mut directory = parent_directory(path.trim_matches('/'));
        loop {
            if let Some(file) = self.files.get(directory) {
                result.push(file);
                if file.options.no_parent_owners {
                    break;
                }
            }
            if directory.is_empty() {
                break;
            }
            directory = parent_directory(directory);
        }
        result
    }

    fn collect<F>(&self, path: &str, select: F) -> HashSet<String>
    where
        F: Fn(&OwnersFile) -> &[String],
    {
        self.owners_of(path)
            .into_iter()
            .flat_map(|file| select(file).iter().map(|login| normalize_login(login)))
            .collect()
    }
}

impl RepoOwners for OwnersTree {
    fn approvers(&self, path: &str) -> HashSet<String> {
        self.collect(path, |file| file.approvers.as_slice())
    }

    fn reviewers(&self, path: &str) -> HashSet<String> {
        self.collect(path, |file| file.reviewers.as_slice())
    }
}

pub(super) fn parent_directory(path: &str) -> &str {
    match path.rfind('/') {
        Some(index) => &path[..index],
        None => "",
    }
}
