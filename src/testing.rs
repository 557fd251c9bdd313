//! In-memory `GitHubApi` that records every call, for unit tests.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use bytes::Bytes;
use parking_lot::Mutex;

use crate::{
    error::{DocFsError, Result},
    transport::GitHubApi,
    types::{MergeMethod, NewPullRequest, PullRequest, Repository, SyncOutcome, TreeNode},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Call {
    GetRefSha(String),
    CreateBranch(String),
    GetFileSha(String),
    GetFileContent(String),
    FetchRaw(String),
    PutFile { path: String, content: String },
    DeleteFile(String),
    CreatePullRequest(NewPullRequest),
    MergePullRequest(u64),
    ListDirectory(String),
    CheckWritePermission,
    RepositoryExists(Repository),
    GetCurrentUser,
    FindExistingFork,
    CreateFork,
    SyncFork(Repository),
    DeleteBranch(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum MergeBehavior {
    Merged,
    Refused,
    Fails,
}

#[derive(Debug)]
struct FakeState {
    calls: Vec<Call>,
    files: HashMap<String, Vec<u8>>,
    listings: HashMap<String, Vec<TreeNode>>,
    write_access: bool,
    permission_check_fails: bool,
    existing_fork: Option<String>,
    new_fork: Option<(String, u32)>,
    probes: u32,
    branch_conflicts: u32,
    merge: MergeBehavior,
    sync_conflict: bool,
    failing_path: Option<String>,
    listing_delay: Option<Duration>,
    ref_delay: Option<Duration>,
    next_pr: u64,
}

pub(crate) struct FakeGitHub {
    state: Mutex<FakeState>,
}

fn http_error(status: u16, body: &str) -> DocFsError {
    DocFsError::Http {
        context: "fake".to_string(),
        status,
        status_text: String::new(),
        body: body.to_string(),
    }
}

impl FakeGitHub {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(FakeState {
                calls: Vec::new(),
                files: HashMap::new(),
                listings: HashMap::new(),
                write_access: false,
                permission_check_fails: false,
                existing_fork: None,
                new_fork: None,
                probes: 0,
                branch_conflicts: 0,
                merge: MergeBehavior::Merged,
                sync_conflict: false,
                failing_path: None,
                listing_delay: None,
                ref_delay: None,
                next_pr: 1,
            }),
        }
    }

    fn configure(self, f: impl FnOnce(&mut FakeState)) -> Self {
        f(&mut self.state.lock());
        self
    }

    pub fn with_write_access(self) -> Self {
        self.configure(|s| s.write_access = true)
    }

    pub fn with_failing_permission_check(self) -> Self {
        self.configure(|s| s.permission_check_fails = true)
    }

    pub fn with_existing_fork(self, owner: &str) -> Self {
        self.configure(|s| s.existing_fork = Some(owner.to_string()))
    }

    /// A fork that only becomes queryable after `not_ready_for` probes
    pub fn with_new_fork(self, owner: &str, not_ready_for: u32) -> Self {
        self.configure(|s| s.new_fork = Some((owner.to_string(), not_ready_for)))
    }

    pub fn with_file(self, path: &str, content: &str) -> Self {
        self.configure(|s| {
            s.files.insert(path.to_string(), content.as_bytes().to_vec());
        })
    }

    pub fn with_listing(self, dir: &str, nodes: Vec<TreeNode>) -> Self {
        self.configure(|s| {
            s.listings.insert(dir.to_string(), nodes);
        })
    }

    pub fn with_listing_delay(self, delay: Duration) -> Self {
        self.configure(|s| s.listing_delay = Some(delay))
    }

    /// Base SHA lookups take `delay`, holding a publish open
    pub fn with_ref_delay(self, delay: Duration) -> Self {
        self.configure(|s| s.ref_delay = Some(delay))
    }

    /// The next `count` branch creations collide with an existing ref
    pub fn with_branch_conflicts(self, count: u32) -> Self {
        self.configure(|s| s.branch_conflicts = count)
    }

    pub fn with_merge(self, merge: MergeBehavior) -> Self {
        self.configure(|s| s.merge = merge)
    }

    pub fn with_sync_conflict(self) -> Self {
        self.configure(|s| s.sync_conflict = true)
    }

    /// Writes and deletes at `path` fail with a 500
    pub fn with_failing_path(self, path: &str) -> Self {
        self.configure(|s| s.failing_path = Some(path.to_string()))
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().calls.clone()
    }

    /// Only the calls that change the remote repository
    pub fn writes(&self) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|c| {
                matches!(
                    c,
                    Call::CreateBranch(_)
                        | Call::PutFile { .. }
                        | Call::DeleteFile(_)
                        | Call::CreatePullRequest(_)
                        | Call::MergePullRequest(_)
                        | Call::DeleteBranch(_)
                )
            })
            .collect()
    }

    pub fn file(&self, path: &str) -> Option<String> {
        self.state
            .lock()
            .files
            .get(path)
            .map(|bytes| String::from_utf8_lossy(bytes).into_owned())
    }

    fn record(&self, call: Call) {
        self.state.lock().calls.push(call);
    }

    fn check_path(&self, path: &str) -> Result<()> {
        match &self.state.lock().failing_path {
            Some(failing) if failing == path => Err(http_error(500, "boom")),
            _ => Ok(()),
        }
    }
}

#[async_trait]
impl GitHubApi for FakeGitHub {
    async fn get_ref_sha(&self, _repo: &Repository, branch: &str, _token: &str) -> Result<String> {
        self.record(Call::GetRefSha(branch.to_string()));
        let delay = self.state.lock().ref_delay;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        Ok("base-sha".to_string())
    }

    async fn create_branch(
        &self,
        _repo: &Repository,
        branch: &str,
        _from_sha: &str,
        _token: &str,
    ) -> Result<()> {
        self.record(Call::CreateBranch(branch.to_string()));
        let mut state = self.state.lock();
        if state.branch_conflicts > 0 {
            state.branch_conflicts -= 1;
            return Err(http_error(422, r#"{"message":"Reference already exists"}"#));
        }
        Ok(())
    }

    async fn get_file_sha(
        &self,
        _repo: &Repository,
        path: &str,
        _branch: &str,
        _token: Option<&str>,
    ) -> Result<Option<String>> {
        self.record(Call::GetFileSha(path.to_string()));
        let state = self.state.lock();
        Ok(state.files.contains_key(path).then(|| format!("sha-{path}")))
    }

    async fn get_file_content(
        &self,
        _repo: &Repository,
        path: &str,
        _branch: &str,
        _token: Option<&str>,
    ) -> Result<String> {
        self.record(Call::GetFileContent(path.to_string()));
        self.file(path).ok_or_else(|| DocFsError::NotFound {
            path: path.to_string(),
        })
    }

    async fn fetch_raw(
        &self,
        _repo: &Repository,
        _branch: &str,
        path: &str,
        _token: Option<&str>,
    ) -> Result<Bytes> {
        self.record(Call::FetchRaw(path.to_string()));
        self.state
            .lock()
            .files
            .get(path)
            .map(|bytes| Bytes::from(bytes.clone()))
            .ok_or_else(|| DocFsError::NotFound {
                path: path.to_string(),
            })
    }

    async fn put_file_base64(
        &self,
        _repo: &Repository,
        path: &str,
        base64_content: &str,
        _message: &str,
        _branch: &str,
        _sha: Option<&str>,
        _token: &str,
    ) -> Result<()> {
        let bytes = STANDARD.decode(base64_content)?;
        self.record(Call::PutFile {
            path: path.to_string(),
            content: String::from_utf8_lossy(&bytes).into_owned(),
        });
        self.check_path(path)?;
        self.state.lock().files.insert(path.to_string(), bytes);
        Ok(())
    }

    async fn delete_file(
        &self,
        _repo: &Repository,
        path: &str,
        _sha: &str,
        _message: &str,
        _branch: &str,
        _token: &str,
    ) -> Result<()> {
        self.record(Call::DeleteFile(path.to_string()));
        self.check_path(path)?;
        self.state.lock().files.remove(path);
        Ok(())
    }

    async fn create_pull_request(
        &self,
        repo: &Repository,
        request: &NewPullRequest,
        _token: &str,
    ) -> Result<PullRequest> {
        self.record(Call::CreatePullRequest(request.clone()));
        let mut state = self.state.lock();
        let number = state.next_pr;
        state.next_pr += 1;
        Ok(PullRequest {
            number,
            html_url: format!("https://github.com/{repo}/pull/{number}"),
        })
    }

    async fn merge_pull_request(
        &self,
        _repo: &Repository,
        number: u64,
        _method: MergeMethod,
        _token: &str,
    ) -> Result<bool> {
        self.record(Call::MergePullRequest(number));
        match self.state.lock().merge {
            MergeBehavior::Merged => Ok(true),
            MergeBehavior::Refused => Ok(false),
            MergeBehavior::Fails => Err(http_error(403, "review required")),
        }
    }

    async fn list_directory(
        &self,
        _repo: &Repository,
        path: &str,
        _branch: &str,
        _token: Option<&str>,
    ) -> Result<Vec<TreeNode>> {
        self.record(Call::ListDirectory(path.to_string()));
        let delay = self.state.lock().listing_delay;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.state
            .lock()
            .listings
            .get(path)
            .cloned()
            .ok_or_else(|| DocFsError::NotFound {
                path: path.to_string(),
            })
    }

    async fn check_write_permission(&self, _repo: &Repository, _token: &str) -> Result<bool> {
        self.record(Call::CheckWritePermission);
        let state = self.state.lock();
        if state.permission_check_fails {
            return Err(http_error(500, "permissions unavailable"));
        }
        Ok(state.write_access)
    }

    async fn repository_exists(&self, repo: &Repository, _token: &str) -> Result<bool> {
        self.record(Call::RepositoryExists(repo.clone()));
        let mut state = self.state.lock();
        state.probes += 1;
        Ok(match &state.new_fork {
            Some((_, not_ready_for)) => state.probes > *not_ready_for,
            None => true,
        })
    }

    async fn get_current_user(&self, _token: &str) -> Result<String> {
        self.record(Call::GetCurrentUser);
        Ok("octo".to_string())
    }

    async fn find_existing_fork(
        &self,
        original: &Repository,
        _token: &str,
    ) -> Result<Option<Repository>> {
        self.record(Call::FindExistingFork);
        let state = self.state.lock();
        Ok(state
            .existing_fork
            .as_ref()
            .map(|owner| Repository::new(owner, &original.repo)))
    }

    async fn create_fork(&self, original: &Repository, _token: &str) -> Result<Repository> {
        self.record(Call::CreateFork);
        let state = self.state.lock();
        let owner = state
            .new_fork
            .as_ref()
            .map(|(owner, _)| owner.clone())
            .unwrap_or_else(|| "octo".to_string());
        Ok(Repository::new(owner, &original.repo))
    }

    async fn sync_fork_with_upstream(
        &self,
        fork: &Repository,
        _branch: &str,
        _token: &str,
    ) -> Result<SyncOutcome> {
        self.record(Call::SyncFork(fork.clone()));
        if self.state.lock().sync_conflict {
            return Ok(SyncOutcome {
                synced: false,
                message: Some("merge conflict".to_string()),
            });
        }
        Ok(SyncOutcome {
            synced: true,
            message: None,
        })
    }

    async fn delete_branch(&self, _repo: &Repository, branch: &str, _token: &str) -> Result<bool> {
        self.record(Call::DeleteBranch(branch.to_string()));
        Ok(true)
    }
}
