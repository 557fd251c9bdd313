use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use bytes::Bytes;

use crate::{
    error::Result,
    types::{MergeMethod, NewPullRequest, PullRequest, Repository, SyncOutcome, TreeNode},
};

/// Stateless mapping onto the GitHub REST v3 endpoints the editor needs
///
/// Every call names its repository, branch and token explicitly; an
/// implementation holds no session state. Absence is reported as `None`
/// only where documented, every other failure is an error.
#[async_trait]
pub trait GitHubApi: Send + Sync {
    /// SHA of `refs/heads/{branch}`
    async fn get_ref_sha(&self, repo: &Repository, branch: &str, token: &str) -> Result<String>;

    /// Create `refs/heads/{branch}` pointing at `from_sha`
    async fn create_branch(
        &self,
        repo: &Repository,
        branch: &str,
        from_sha: &str,
        token: &str,
    ) -> Result<()>;

    /// Blob SHA of a file, `None` when the file does not exist
    async fn get_file_sha(
        &self,
        repo: &Repository,
        path: &str,
        branch: &str,
        token: Option<&str>,
    ) -> Result<Option<String>>;

    /// Decoded UTF-8 body of a file through the contents API
    async fn get_file_content(
        &self,
        repo: &Repository,
        path: &str,
        branch: &str,
        token: Option<&str>,
    ) -> Result<String>;

    /// Raw bytes of a file from the raw content host
    async fn fetch_raw(
        &self,
        repo: &Repository,
        branch: &str,
        path: &str,
        token: Option<&str>,
    ) -> Result<Bytes>;

    /// Create or update a file from already base64-encoded content
    ///
    /// Passing `sha` updates the existing blob, omitting it creates the file.
    #[allow(clippy::too_many_arguments)]
    async fn put_file_base64(
        &self,
        repo: &Repository,
        path: &str,
        base64_content: &str,
        message: &str,
        branch: &str,
        sha: Option<&str>,
        token: &str,
    ) -> Result<()>;

    /// Create or update a text file
    #[allow(clippy::too_many_arguments)]
    async fn put_file(
        &self,
        repo: &Repository,
        path: &str,
        content: &str,
        message: &str,
        branch: &str,
        sha: Option<&str>,
        token: &str,
    ) -> Result<()> {
        let encoded = STANDARD.encode(content.as_bytes());
        self.put_file_base64(repo, path, &encoded, message, branch, sha, token)
            .await
    }

    async fn delete_file(
        &self,
        repo: &Repository,
        path: &str,
        sha: &str,
        message: &str,
        branch: &str,
        token: &str,
    ) -> Result<()>;

    async fn create_pull_request(
        &self,
        repo: &Repository,
        request: &NewPullRequest,
        token: &str,
    ) -> Result<PullRequest>;

    /// `Ok(false)` when GitHub refuses the merge (405, already merged, blocked)
    async fn merge_pull_request(
        &self,
        repo: &Repository,
        number: u64,
        method: MergeMethod,
        token: &str,
    ) -> Result<bool>;

    /// Directory entries as unloaded tree nodes, directories first then by name
    async fn list_directory(
        &self,
        repo: &Repository,
        path: &str,
        branch: &str,
        token: Option<&str>,
    ) -> Result<Vec<TreeNode>>;

    /// Whether the token holds push, maintain or admin on `repo`
    async fn check_write_permission(&self, repo: &Repository, token: &str) -> Result<bool>;

    /// Whether `repo` can be queried with this token
    async fn repository_exists(&self, repo: &Repository, token: &str) -> Result<bool>;

    /// Login of the authenticated user
    async fn get_current_user(&self, token: &str) -> Result<String>;

    /// The current user's fork of `original`, `None` when there is none
    async fn find_existing_fork(
        &self,
        original: &Repository,
        token: &str,
    ) -> Result<Option<Repository>>;

    /// Request a fork; GitHub creates it asynchronously
    async fn create_fork(&self, original: &Repository, token: &str) -> Result<Repository>;

    async fn sync_fork_with_upstream(
        &self,
        fork: &Repository,
        branch: &str,
        token: &str,
    ) -> Result<SyncOutcome>;

    /// `Ok(false)` when GitHub refuses to delete the branch (protected)
    async fn delete_branch(&self, repo: &Repository, branch: &str, token: &str) -> Result<bool>;
}
