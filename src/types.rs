use std::fmt;

use serde::{Deserialize, Serialize};

/// A concrete GitHub repository a session reads from or writes to
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Repository {
    pub owner: String,
    pub repo: String,
}

impl Repository {
    pub fn new(owner: impl Into<String>, repo: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            repo: repo.into(),
        }
    }

    /// `owner/repo`, the form GitHub uses in `full_name`
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.repo)
    }
}

impl fmt::Display for Repository {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.repo)
    }
}

/// Type of tree entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryType {
    File,
    Dir,
}

/// A file or directory in the virtual tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeNode {
    /// Type of entry
    pub entry_type: EntryType,
    /// Last path segment
    pub name: String,
    /// Path relative to the repository root, unique within a tree
    pub path: String,
    /// Remote blob/tree SHA, absent for nodes created in this session
    pub sha: Option<String>,
    /// Ordered children, `None` for files
    pub children: Option<Vec<TreeNode>>,
    /// Whether the children of a directory have been fetched
    pub loaded: bool,
}

impl TreeNode {
    pub fn file(path: impl Into<String>) -> Self {
        let path = path.into();
        Self {
            entry_type: EntryType::File,
            name: last_segment(&path).to_string(),
            path,
            sha: None,
            children: None,
            loaded: false,
        }
    }

    pub fn dir(path: impl Into<String>) -> Self {
        let path = path.into();
        Self {
            entry_type: EntryType::Dir,
            name: last_segment(&path).to_string(),
            path,
            sha: None,
            children: Some(Vec::new()),
            loaded: false,
        }
    }

    pub fn with_sha(mut self, sha: impl Into<String>) -> Self {
        self.sha = Some(sha.into());
        self
    }

    pub fn is_dir(&self) -> bool {
        self.entry_type == EntryType::Dir
    }

    pub fn is_file(&self) -> bool {
        self.entry_type == EntryType::File
    }

    pub fn children(&self) -> &[TreeNode] {
        self.children.as_deref().unwrap_or(&[])
    }
}

/// How the content of a staged file is encoded
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Encoding {
    /// Plain text, base64-encoded from UTF-8 on upload
    #[default]
    Utf8,
    /// Already base64-encoded bytes (images and other binaries)
    Base64,
}

/// One staged mutation waiting to be published
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Change {
    AddFile {
        path: String,
        content: String,
        #[serde(default)]
        encoding: Encoding,
    },
    UpdateFile {
        path: String,
        content: String,
        #[serde(default)]
        encoding: Encoding,
    },
    DeleteFile {
        path: String,
    },
    MoveFile {
        from: String,
        to: String,
    },
    AddFolder {
        path: String,
    },
    DeleteFolder {
        path: String,
    },
}

impl Change {
    pub fn add_file(path: impl Into<String>, content: impl Into<String>) -> Self {
        Self::AddFile {
            path: path.into(),
            content: content.into(),
            encoding: Encoding::Utf8,
        }
    }

    pub fn update_file(path: impl Into<String>, content: impl Into<String>) -> Self {
        Self::UpdateFile {
            path: path.into(),
            content: content.into(),
            encoding: Encoding::Utf8,
        }
    }

    pub fn delete_file(path: impl Into<String>) -> Self {
        Self::DeleteFile { path: path.into() }
    }

    pub fn move_file(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self::MoveFile {
            from: from.into(),
            to: to.into(),
        }
    }

    pub fn add_folder(path: impl Into<String>) -> Self {
        Self::AddFolder { path: path.into() }
    }

    pub fn delete_folder(path: impl Into<String>) -> Self {
        Self::DeleteFolder { path: path.into() }
    }

    /// Wire name of the variant, as used in PR bodies
    pub fn kind(&self) -> &'static str {
        match self {
            Self::AddFile { .. } => "addFile",
            Self::UpdateFile { .. } => "updateFile",
            Self::DeleteFile { .. } => "deleteFile",
            Self::MoveFile { .. } => "moveFile",
            Self::AddFolder { .. } => "addFolder",
            Self::DeleteFolder { .. } => "deleteFolder",
        }
    }

    /// The path the change writes to (destination for moves)
    pub fn target_path(&self) -> &str {
        match self {
            Self::AddFile { path, .. }
            | Self::UpdateFile { path, .. }
            | Self::DeleteFile { path }
            | Self::AddFolder { path }
            | Self::DeleteFolder { path } => path,
            Self::MoveFile { to, .. } => to,
        }
    }

    /// Short label such as `add file: docs/intro.md`
    pub fn describe(&self) -> String {
        match self {
            Self::AddFile { path, .. } => format!("add file: {path}"),
            Self::UpdateFile { path, .. } => format!("update file: {path}"),
            Self::DeleteFile { path } => format!("delete file: {path}"),
            Self::MoveFile { from, to } => format!("move: {from} -> {to}"),
            Self::AddFolder { path } => format!("add folder: {path}"),
            Self::DeleteFolder { path } => format!("delete folder: {path}"),
        }
    }
}

/// Request body for opening a pull request
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewPullRequest {
    pub title: String,
    /// `branch` for same-repository PRs, `owner:branch` for forks
    pub head: String,
    pub base: String,
    pub body: String,
}

/// An opened pull request
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PullRequest {
    pub number: u64,
    pub html_url: String,
}

/// Merge strategy for `PUT /pulls/{n}/merge`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MergeMethod {
    Merge,
    Squash,
    Rebase,
}

/// Result of `POST /repos/{o}/{r}/merge-upstream`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncOutcome {
    pub synced: bool,
    pub message: Option<String>,
}

/// Successful publish result
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishOutcome {
    pub pr_url: String,
    pub pr_number: u64,
    pub merged: bool,
    pub work_branch: String,
    pub target: Repository,
}

pub(crate) fn last_segment(path: &str) -> &str {
    path.trim_end_matches('/').rsplit('/').next().unwrap_or(path)
}

pub(crate) fn parent_path(path: &str) -> Option<&str> {
    path.trim_end_matches('/').rsplit_once('/').map(|(parent, _)| parent)
}
