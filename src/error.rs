use thiserror::Error;

/// Errors that can occur while reading, staging or publishing documentation changes
#[derive(Error, Debug)]
pub enum DocFsError {
    #[error("GitHub request failed while {context}: {status} {status_text} {body}")]
    Http {
        context: String,
        status: u16,
        status_text: String,
        body: String,
    },

    #[error("Rate limited by GitHub: {message}")]
    RateLimited { message: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Not found: {path}")]
    NotFound { path: String },

    #[error("{message}")]
    Precondition { message: String },

    #[error("Folder is not empty, delete its files first: {path}")]
    FolderNotEmpty { path: String },

    #[error("Invalid path {path}: {reason}")]
    InvalidPath { path: String, reason: String },

    #[error("Fork {owner}/{repo} was not available after {attempts} attempts")]
    ForkUnavailable {
        owner: String,
        repo: String,
        attempts: u32,
    },

    #[error("Invalid response from GitHub: {message}")]
    InvalidResponse { message: String },

    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration parse error: {0}")]
    TomlDeserialize(#[from] toml::de::Error),

    #[error("Base64 decode error: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("File content is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

impl DocFsError {
    pub(crate) fn precondition(message: impl Into<String>) -> Self {
        Self::Precondition {
            message: message.into(),
        }
    }

    pub(crate) fn invalid_path(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidPath {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// HTTP status carried by a transport error, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            Self::RateLimited { .. } => Some(429),
            Self::Network(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// GitHub answers a branch-name collision with 422 "Reference already exists"
    pub fn is_reference_conflict(&self) -> bool {
        matches!(
            self,
            Self::Http { status: 422, body, .. } if body.contains("Reference already exists")
        )
    }
}

/// Result type alias for documentation file-system operations
pub type Result<T> = std::result::Result<T, DocFsError>;
