pub mod config;
pub mod content;
pub mod error;
pub mod github;
pub mod image;
pub mod ledger;
pub mod publisher;
pub mod resolver;
pub mod session;
pub mod transport;
pub mod tree;
pub mod types;
pub mod workspace;

#[cfg(test)]
mod testing;

pub use config::EditorConfig;
pub use content::ContentMap;
pub use error::{DocFsError, Result};
pub use github::GitHubClient;
pub use image::ImageUpload;
pub use ledger::ChangeLedger;
pub use publisher::{PublishStatus, Publisher};
pub use resolver::{Access, RepositoryResolver, ResolvedTarget};
pub use session::{AuthGrant, AuthRequest, Authenticator, Session, TokenStore};
pub use transport::GitHubApi;
pub use tree::VirtualTree;
pub use types::{
    Change, EntryType, Encoding, MergeMethod, NewPullRequest, PublishOutcome, PullRequest,
    Repository, SyncOutcome, TreeNode,
};
pub use workspace::Workspace;
