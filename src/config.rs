//! Editor configuration.
//!
//! Every component receives an [`EditorConfig`] at construction time, so
//! tests can point the transport at a fixture server and a fixture
//! repository. Configuration can be written inline or parsed from TOML.

use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use reqwest::Url;
use serde::{Deserialize, Serialize};

use crate::error::{DocFsError, Result};
use crate::types::Repository;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Owner of the canonical documentation repository
    pub owner: String,
    /// Name of the canonical documentation repository
    pub repo: String,
    /// Canonical branch; work branches start here and PRs target it
    pub branch: String,
    /// Root of the virtual tree, relative to the repository root
    pub docs_root: String,
    pub api_base_url: String,
    pub raw_base_url: String,
    pub user_agent: String,
    pub work_branch_prefix: String,
    /// Marker file that stands in for an empty directory
    pub placeholder_name: String,
    /// Repository directory pasted images are committed to
    pub upload_dir: String,
    /// Site path under which `upload_dir` is served
    pub upload_public_prefix: String,
    pub fork_poll_attempts: u32,
    pub fork_poll_delay_ms: u64,
    pub pull_request_title: String,
    pub sync_fork_before_publish: bool,
    pub delete_branch_after_merge: bool,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            owner: String::new(),
            repo: String::new(),
            branch: "main".to_string(),
            docs_root: "docs".to_string(),
            api_base_url: "https://api.github.com".to_string(),
            raw_base_url: "https://raw.githubusercontent.com".to_string(),
            user_agent: concat!("docfs/", env!("CARGO_PKG_VERSION")).to_string(),
            work_branch_prefix: "inline-fs".to_string(),
            placeholder_name: ".gitkeep".to_string(),
            upload_dir: "static/EditorUpload".to_string(),
            upload_public_prefix: "/EditorUpload".to_string(),
            fork_poll_attempts: 10,
            fork_poll_delay_ms: 3000,
            pull_request_title: "docs: content and structure updates via editor".to_string(),
            sync_fork_before_publish: true,
            delete_branch_after_merge: false,
        }
    }
}

impl EditorConfig {
    pub fn new(owner: impl Into<String>, repo: impl Into<String>, branch: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            repo: repo.into(),
            branch: branch.into(),
            ..Self::default()
        }
    }

    /// Read and validate a TOML configuration file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let data = std::fs::read_to_string(path)?;
        data.parse()
    }

    /// The canonical repository all contributions target
    pub fn original(&self) -> Repository {
        Repository::new(&self.owner, &self.repo)
    }

    pub fn is_original(&self, repository: &Repository) -> bool {
        repository.owner == self.owner && repository.repo == self.repo
    }

    pub fn fork_poll_delay(&self) -> Duration {
        Duration::from_millis(self.fork_poll_delay_ms)
    }

    /// Placeholder file path representing the directory `dir`
    pub fn placeholder_path(&self, dir: &str) -> String {
        format!("{}/{}", dir.trim_end_matches('/'), self.placeholder_name)
    }

    pub fn validate(&self) -> Result<()> {
        let required = [
            ("owner", &self.owner),
            ("repo", &self.repo),
            ("branch", &self.branch),
            ("docs_root", &self.docs_root),
            ("placeholder_name", &self.placeholder_name),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(DocFsError::InvalidConfig {
                    message: format!("`{field}` must not be empty"),
                });
            }
        }
        for (field, value) in [
            ("api_base_url", &self.api_base_url),
            ("raw_base_url", &self.raw_base_url),
        ] {
            Url::parse(value).map_err(|e| DocFsError::InvalidConfig {
                message: format!("`{field}` is not a valid URL: {e}"),
            })?;
        }
        Ok(())
    }
}

impl FromStr for EditorConfig {
    type Err = DocFsError;

    fn from_str(data: &str) -> Result<Self> {
        let config: EditorConfig = toml::from_str(data)?;
        config.validate()?;
        Ok(config)
    }
}
