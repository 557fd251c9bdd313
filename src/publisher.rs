//! Turns a staged change set into a pull request.
//!
//! Publishing is strictly sequential: the work branch must exist before any
//! content is written, and a move writes its destination before deleting its
//! source. A failure part-way leaves the work branch and any commits already
//! made on GitHub; the caller keeps its ledger so the user can retry.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::{SecondsFormat, Utc};
use sha2::{Digest, Sha256};
use tokio::sync::watch;
use tracing::{debug, info, instrument, warn};

use crate::{
    config::EditorConfig,
    content::ContentMap,
    error::{DocFsError, Result},
    resolver::{Access, ResolvedTarget},
    transport::GitHubApi,
    types::{Change, Encoding, MergeMethod, NewPullRequest, PublishOutcome, Repository},
};

/// Progress of the current (or last) publish
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PublishStatus {
    #[default]
    Idle,
    SyncingFork,
    /// Fork sync failed; publishing continues from the fork's current state
    ForkSyncSkipped {
        message: String,
    },
    FetchingBase,
    CreatingBranch {
        branch: String,
    },
    Applying {
        index: usize,
        total: usize,
        description: String,
    },
    OpeningPullRequest,
    Merging {
        number: u64,
    },
    Published {
        url: String,
        merged: bool,
    },
    Failed {
        message: String,
    },
}

impl fmt::Display for PublishStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "Idle"),
            Self::SyncingFork => write!(f, "Syncing fork with upstream..."),
            Self::ForkSyncSkipped { message } => write!(f, "Fork sync skipped: {message}"),
            Self::FetchingBase => write!(f, "Reading base branch..."),
            Self::CreatingBranch { branch } => write!(f, "Creating work branch {branch}..."),
            Self::Applying {
                index,
                total,
                description,
            } => write!(f, "Applying change {index}/{total}: {description}"),
            Self::OpeningPullRequest => write!(f, "Opening pull request..."),
            Self::Merging { number } => write!(f, "Merging pull request #{number}..."),
            Self::Published { url, merged: true } => write!(f, "Pull request merged: {url}"),
            Self::Published { url, merged: false } => write!(f, "Pull request created: {url}"),
            Self::Failed { message } => write!(f, "Publish failed: {message}"),
        }
    }
}

/// Clears the in-flight flag when a publish ends, however it ends
struct InFlight<'a>(&'a AtomicBool);

impl<'a> InFlight<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

pub struct Publisher {
    api: Arc<dyn GitHubApi>,
    config: Arc<EditorConfig>,
    in_flight: AtomicBool,
    status: watch::Sender<PublishStatus>,
}

impl Publisher {
    pub fn new(api: Arc<dyn GitHubApi>, config: Arc<EditorConfig>) -> Self {
        let (status, _) = watch::channel(PublishStatus::Idle);
        Self {
            api,
            config,
            in_flight: AtomicBool::new(false),
            status,
        }
    }

    pub fn status(&self) -> PublishStatus {
        self.status.borrow().clone()
    }

    /// Live progress updates for UI rendering
    pub fn subscribe(&self) -> watch::Receiver<PublishStatus> {
        self.status.subscribe()
    }

    pub fn is_publishing(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    fn set_status(&self, status: PublishStatus) {
        debug!("publish status: {status}");
        self.status.send_replace(status);
    }

    /// Publish `changes` to `target` as a pull request against the original
    ///
    /// Returns `Ok(None)` without touching the network when there is nothing
    /// to publish or another publish is still running. `contents` supplies
    /// locally known bodies for moved files.
    #[instrument(skip_all, fields(target = %target.repository, changes = changes.len()))]
    pub async fn publish(
        &self,
        target: &ResolvedTarget,
        token: &str,
        changes: &[Change],
        contents: &ContentMap,
    ) -> Result<Option<PublishOutcome>> {
        if changes.is_empty() {
            debug!("nothing to publish");
            return Ok(None);
        }
        if !target.can_write() {
            return Err(DocFsError::precondition(format!(
                "{} is read-only; publishing is disabled",
                target.repository
            )));
        }
        let Some(_guard) = InFlight::acquire(&self.in_flight) else {
            warn!("publish already in progress, ignoring");
            return Ok(None);
        };

        match self.run(target, token, changes, contents).await {
            Ok(outcome) => {
                self.set_status(PublishStatus::Published {
                    url: outcome.pr_url.clone(),
                    merged: outcome.merged,
                });
                Ok(Some(outcome))
            }
            Err(e) => {
                warn!("publish failed: {e}");
                self.set_status(PublishStatus::Failed {
                    message: e.to_string(),
                });
                Err(e)
            }
        }
    }

    async fn run(
        &self,
        target: &ResolvedTarget,
        token: &str,
        changes: &[Change],
        contents: &ContentMap,
    ) -> Result<PublishOutcome> {
        let repo = &target.repository;
        let base = self.config.branch.as_str();
        let original = self.config.original();
        let is_original = self.config.is_original(repo);

        if !is_original && self.config.sync_fork_before_publish {
            self.sync_fork(repo, token).await;
        }

        self.set_status(PublishStatus::FetchingBase);
        let base_sha = self.api.get_ref_sha(repo, base, token).await?;
        let branch = self.create_work_branch(repo, &base_sha, token).await?;

        let total = changes.len();
        for (i, change) in changes.iter().enumerate() {
            self.set_status(PublishStatus::Applying {
                index: i + 1,
                total,
                description: change.describe(),
            });
            self.apply(repo, &branch, change, contents, token).await?;
        }

        self.set_status(PublishStatus::OpeningPullRequest);
        let head = if is_original {
            branch.clone()
        } else {
            format!("{}:{}", repo.owner, branch)
        };
        let request = NewPullRequest {
            title: self.config.pull_request_title.clone(),
            head,
            base: base.to_string(),
            body: pull_request_body(changes),
        };
        let pr = self.api.create_pull_request(&original, &request, token).await?;
        info!("opened pull request #{} at {}", pr.number, pr.html_url);

        let mut merged = false;
        if is_original && target.access == Access::Write {
            self.set_status(PublishStatus::Merging { number: pr.number });
            merged = match self
                .api
                .merge_pull_request(&original, pr.number, MergeMethod::Squash, token)
                .await
            {
                Ok(true) => true,
                Ok(false) => {
                    info!("pull request #{} left open, GitHub refused the merge", pr.number);
                    false
                }
                Err(e) => {
                    warn!("merging pull request #{} failed: {e}", pr.number);
                    false
                }
            };
            if merged && self.config.delete_branch_after_merge {
                self.delete_work_branch(repo, &branch, token).await;
            }
        }

        Ok(PublishOutcome {
            pr_url: pr.html_url,
            pr_number: pr.number,
            merged,
            work_branch: branch,
            target: repo.clone(),
        })
    }

    async fn sync_fork(&self, fork: &Repository, token: &str) {
        self.set_status(PublishStatus::SyncingFork);
        let message = match self
            .api
            .sync_fork_with_upstream(fork, &self.config.branch, token)
            .await
        {
            Ok(outcome) if outcome.synced => {
                debug!("fork {fork} synced with upstream");
                return;
            }
            Ok(outcome) => outcome
                .message
                .unwrap_or_else(|| "fork could not be synced".to_string()),
            Err(e) => e.to_string(),
        };
        warn!("syncing fork {fork} failed: {message}");
        self.set_status(PublishStatus::ForkSyncSkipped { message });
    }

    async fn create_work_branch(
        &self,
        repo: &Repository,
        base_sha: &str,
        token: &str,
    ) -> Result<String> {
        let branch = work_branch_name(&self.config.work_branch_prefix);
        self.set_status(PublishStatus::CreatingBranch {
            branch: branch.clone(),
        });
        match self.api.create_branch(repo, &branch, base_sha, token).await {
            Ok(()) => Ok(branch),
            Err(e) if e.is_reference_conflict() => {
                let retry = format!("{branch}-{}", random_suffix());
                debug!("{branch} already exists, retrying as {retry}");
                self.set_status(PublishStatus::CreatingBranch {
                    branch: retry.clone(),
                });
                self.api.create_branch(repo, &retry, base_sha, token).await?;
                Ok(retry)
            }
            Err(e) => Err(e),
        }
    }

    async fn apply(
        &self,
        repo: &Repository,
        branch: &str,
        change: &Change,
        contents: &ContentMap,
        token: &str,
    ) -> Result<()> {
        let api = &self.api;
        match change {
            Change::AddFile {
                path,
                content,
                encoding,
            }
            | Change::UpdateFile {
                path,
                content,
                encoding,
            } => {
                let sha = api.get_file_sha(repo, path, branch, Some(token)).await?;
                let verb = if matches!(change, Change::AddFile { .. }) {
                    "add"
                } else {
                    "update"
                };
                let message = format!("docs: {verb} {path}");
                match encoding {
                    Encoding::Utf8 => {
                        api.put_file(repo, path, content, &message, branch, sha.as_deref(), token)
                            .await
                    }
                    Encoding::Base64 => {
                        api.put_file_base64(repo, path, content, &message, branch, sha.as_deref(), token)
                            .await
                    }
                }
            }
            Change::DeleteFile { path } => {
                let sha = require_sha(api.get_file_sha(repo, path, branch, Some(token)).await?, path)?;
                api.delete_file(repo, path, &sha, &format!("docs: delete {path}"), branch, token)
                    .await
            }
            Change::MoveFile { from, to } => {
                let encoded = match contents.get(to).or_else(|| contents.get(from)) {
                    Some(text) => STANDARD.encode(text),
                    None => STANDARD.encode(api.fetch_raw(repo, branch, from, Some(token)).await?),
                };
                let message = format!("docs: move {from} to {to}");

                // Destination first so an interrupted move never loses the file
                let existing = api.get_file_sha(repo, to, branch, Some(token)).await?;
                api.put_file_base64(repo, to, &encoded, &message, branch, existing.as_deref(), token)
                    .await?;
                let sha = require_sha(api.get_file_sha(repo, from, branch, Some(token)).await?, from)?;
                api.delete_file(repo, from, &sha, &message, branch, token).await
            }
            Change::AddFolder { path } => {
                let placeholder = self.config.placeholder_path(path);
                if api
                    .get_file_sha(repo, &placeholder, branch, Some(token))
                    .await?
                    .is_some()
                {
                    debug!("{placeholder} already exists");
                    return Ok(());
                }
                let message = format!("docs: add folder {path}");
                api.put_file(repo, &placeholder, "", &message, branch, None, token)
                    .await
            }
            Change::DeleteFolder { path } => {
                let placeholder = self.config.placeholder_path(path);
                match api.get_file_sha(repo, &placeholder, branch, Some(token)).await? {
                    Some(sha) => {
                        let message = format!("docs: delete folder {path}");
                        api.delete_file(repo, &placeholder, &sha, &message, branch, token)
                            .await
                    }
                    None => {
                        debug!("no placeholder under {path}, nothing to delete");
                        Ok(())
                    }
                }
            }
        }
    }

    async fn delete_work_branch(&self, repo: &Repository, branch: &str, token: &str) {
        match self.api.delete_branch(repo, branch, token).await {
            Ok(true) => debug!("deleted work branch {branch}"),
            Ok(false) => warn!("GitHub refused to delete work branch {branch}"),
            Err(e) => warn!("deleting work branch {branch} failed: {e}"),
        }
    }
}

fn require_sha(sha: Option<String>, path: &str) -> Result<String> {
    sha.ok_or_else(|| DocFsError::NotFound {
        path: path.to_string(),
    })
}

/// `<prefix>/<ISO-8601 timestamp>` with ref-safe separators
fn work_branch_name(prefix: &str) -> String {
    let stamp = Utc::now()
        .to_rfc3339_opts(SecondsFormat::Millis, true)
        .replace([':', '.'], "-");
    format!("{}/{stamp}", prefix.trim_end_matches('/'))
}

fn random_suffix() -> String {
    let now = Utc::now();
    let seed = format!("{}{}", now.timestamp(), now.timestamp_subsec_nanos());
    let digest = format!("{:x}", Sha256::digest(seed.as_bytes()));
    digest[..4].to_string()
}

/// PR body listing every change on its own line
pub fn pull_request_body(changes: &[Change]) -> String {
    let mut body = String::from("Changes:");
    for change in changes {
        let target = match change {
            Change::MoveFile { from, to } => format!("{from} -> {to}"),
            other => other.target_path().to_string(),
        };
        body.push_str(&format!("\n- {} {target}", change.kind()));
    }
    body
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Call, FakeGitHub, MergeBehavior};
    use std::time::Duration;

    fn config() -> EditorConfig {
        EditorConfig::new("acme", "handbook", "main")
    }

    fn publisher(fake: &Arc<FakeGitHub>, config: EditorConfig) -> Publisher {
        Publisher::new(fake.clone(), Arc::new(config))
    }

    fn original_write() -> ResolvedTarget {
        ResolvedTarget {
            repository: Repository::new("acme", "handbook"),
            access: Access::Write,
        }
    }

    fn fork() -> ResolvedTarget {
        ResolvedTarget {
            repository: Repository::new("octo", "handbook"),
            access: Access::Fork,
        }
    }

    fn put(path: &str, content: &str) -> Call {
        Call::PutFile {
            path: path.to_string(),
            content: content.to_string(),
        }
    }

    #[tokio::test]
    async fn test_end_to_end_on_original() {
        let fake = Arc::new(
            FakeGitHub::new()
                .with_file("docs/existing.md", "old")
                .with_file("docs/old.md", "bye"),
        );
        let publisher = publisher(&fake, config());
        let changes = vec![
            Change::add_file("docs/new.md", "# New"),
            Change::update_file("docs/existing.md", "edited"),
            Change::delete_file("docs/old.md"),
        ];

        let outcome = publisher
            .publish(&original_write(), "t0ken", &changes, &ContentMap::new())
            .await
            .unwrap()
            .unwrap();

        assert!(outcome.merged);
        assert_eq!(outcome.pr_url, "https://github.com/acme/handbook/pull/1");
        assert!(outcome.work_branch.starts_with("inline-fs/"));

        let writes = fake.writes();
        assert_eq!(writes.len(), 6);
        assert_eq!(writes[0], Call::CreateBranch(outcome.work_branch.clone()));
        assert_eq!(writes[1], put("docs/new.md", "# New"));
        assert_eq!(writes[2], put("docs/existing.md", "edited"));
        assert_eq!(writes[3], Call::DeleteFile("docs/old.md".to_string()));
        match &writes[4] {
            Call::CreatePullRequest(pr) => {
                assert_eq!(pr.head, outcome.work_branch);
                assert_eq!(pr.base, "main");
                assert_eq!(
                    pr.body,
                    "Changes:\n- addFile docs/new.md\n- updateFile docs/existing.md\n- deleteFile docs/old.md"
                );
            }
            other => panic!("expected a pull request, got {other:?}"),
        }
        assert_eq!(writes[5], Call::MergePullRequest(1));
        assert_eq!(
            publisher.status(),
            PublishStatus::Published {
                url: outcome.pr_url,
                merged: true
            }
        );
    }

    #[tokio::test]
    async fn test_move_writes_destination_before_deleting_source() {
        let fake = Arc::new(FakeGitHub::new().with_file("a.md", "alpha"));
        let publisher = publisher(&fake, config());

        publisher
            .publish(
                &original_write(),
                "t0ken",
                &[Change::move_file("a.md", "b.md")],
                &ContentMap::new(),
            )
            .await
            .unwrap();

        let calls = fake.calls();
        let put_b = calls.iter().position(|c| *c == put("b.md", "alpha")).unwrap();
        let delete_a = calls
            .iter()
            .position(|c| *c == Call::DeleteFile("a.md".to_string()))
            .unwrap();
        assert!(put_b < delete_a);
        assert!(calls.contains(&Call::FetchRaw("a.md".to_string())));
    }

    #[tokio::test]
    async fn test_move_prefers_local_content() {
        let fake = Arc::new(FakeGitHub::new().with_file("docs/a.md", "remote"));
        let publisher = publisher(&fake, config());
        let mut contents = ContentMap::new();
        contents.set("docs/b.md", "local edit");

        publisher
            .publish(
                &original_write(),
                "t0ken",
                &[Change::move_file("docs/a.md", "docs/b.md")],
                &contents,
            )
            .await
            .unwrap();

        assert!(fake.calls().contains(&put("docs/b.md", "local edit")));
        assert!(!fake.calls().iter().any(|c| matches!(c, Call::FetchRaw(_))));
    }

    #[tokio::test]
    async fn test_branch_collision_retries_with_suffix() {
        let fake = Arc::new(FakeGitHub::new().with_branch_conflicts(1));
        let publisher = publisher(&fake, config());

        let outcome = publisher
            .publish(
                &original_write(),
                "t0ken",
                &[Change::add_folder("docs/new")],
                &ContentMap::new(),
            )
            .await
            .unwrap()
            .unwrap();

        let attempts: Vec<String> = fake
            .calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::CreateBranch(b) => Some(b),
                _ => None,
            })
            .collect();
        assert_eq!(attempts.len(), 2);
        assert_eq!(attempts[1], outcome.work_branch);
        assert!(attempts[1].starts_with(&format!("{}-", attempts[0])));
        assert_eq!(attempts[1].len(), attempts[0].len() + 5);
    }

    #[tokio::test]
    async fn test_fork_publish_uses_cross_repository_head_and_skips_merge() {
        let fake = Arc::new(FakeGitHub::new().with_sync_conflict());
        let publisher = publisher(&fake, config());

        let outcome = publisher
            .publish(
                &fork(),
                "t0ken",
                &[Change::add_file("docs/x.md", "x")],
                &ContentMap::new(),
            )
            .await
            .unwrap()
            .unwrap();

        assert!(!outcome.merged);
        let calls = fake.calls();
        assert_eq!(calls[0], Call::SyncFork(Repository::new("octo", "handbook")));
        let pr = calls
            .iter()
            .find_map(|c| match c {
                Call::CreatePullRequest(pr) => Some(pr.clone()),
                _ => None,
            })
            .unwrap();
        assert_eq!(pr.head, format!("octo:{}", outcome.work_branch));
        assert!(!calls.iter().any(|c| matches!(c, Call::MergePullRequest(_))));
        assert_eq!(outcome.pr_url, "https://github.com/acme/handbook/pull/1");
    }

    #[tokio::test]
    async fn test_merge_failure_leaves_pull_request_open() {
        let fake = Arc::new(FakeGitHub::new().with_merge(MergeBehavior::Fails));
        let publisher = publisher(&fake, config());

        let outcome = publisher
            .publish(
                &original_write(),
                "t0ken",
                &[Change::add_file("docs/x.md", "x")],
                &ContentMap::new(),
            )
            .await
            .unwrap()
            .unwrap();

        assert!(!outcome.merged);
        assert_eq!(
            publisher.status().to_string(),
            format!("Pull request created: {}", outcome.pr_url)
        );
    }

    #[tokio::test]
    async fn test_refused_merge_keeps_branch() {
        let fake = Arc::new(FakeGitHub::new().with_merge(MergeBehavior::Refused));
        let mut config = config();
        config.delete_branch_after_merge = true;
        let publisher = publisher(&fake, config);

        let outcome = publisher
            .publish(
                &original_write(),
                "t0ken",
                &[Change::add_file("docs/x.md", "x")],
                &ContentMap::new(),
            )
            .await
            .unwrap()
            .unwrap();

        assert!(!outcome.merged);
        assert_eq!(fake.writes().last(), Some(&Call::MergePullRequest(1)));
        assert!(matches!(
            publisher.status(),
            PublishStatus::Published { merged: false, .. }
        ));
    }

    #[tokio::test]
    async fn test_concurrent_publish_runs_once() {
        let fake = Arc::new(FakeGitHub::new().with_ref_delay(Duration::from_millis(20)));
        let publisher = publisher(&fake, config());
        let target = original_write();
        let changes = [Change::add_file("docs/x.md", "x")];
        let contents = ContentMap::new();

        let (first, second) = tokio::join!(
            publisher.publish(&target, "t0ken", &changes, &contents),
            publisher.publish(&target, "t0ken", &changes, &contents),
        );

        assert!(first.unwrap().is_some());
        assert!(second.unwrap().is_none());
        let branches = fake
            .calls()
            .into_iter()
            .filter(|c| matches!(c, Call::CreateBranch(_)))
            .count();
        assert_eq!(branches, 1);
        assert!(!publisher.is_publishing());
    }

    #[tokio::test]
    async fn test_branch_deleted_after_merge_when_configured() {
        let fake = Arc::new(FakeGitHub::new());
        let mut config = config();
        config.delete_branch_after_merge = true;
        let publisher = publisher(&fake, config);

        let outcome = publisher
            .publish(
                &original_write(),
                "t0ken",
                &[Change::add_file("docs/x.md", "x")],
                &ContentMap::new(),
            )
            .await
            .unwrap()
            .unwrap();

        assert_eq!(
            fake.writes().last(),
            Some(&Call::DeleteBranch(outcome.work_branch))
        );
    }

    #[tokio::test]
    async fn test_folders_use_placeholder_files() {
        let fake = Arc::new(FakeGitHub::new().with_file("docs/old/.gitkeep", ""));
        let publisher = publisher(&fake, config());

        publisher
            .publish(
                &original_write(),
                "t0ken",
                &[
                    Change::add_folder("docs/new"),
                    Change::delete_folder("docs/old"),
                    Change::delete_folder("docs/never-existed"),
                ],
                &ContentMap::new(),
            )
            .await
            .unwrap();

        let writes = fake.writes();
        assert_eq!(writes[1], put("docs/new/.gitkeep", ""));
        assert_eq!(writes[2], Call::DeleteFile("docs/old/.gitkeep".to_string()));
        assert!(matches!(writes[3], Call::CreatePullRequest(_)));
    }

    #[tokio::test]
    async fn test_delete_of_missing_file_aborts() {
        let fake = Arc::new(FakeGitHub::new());
        let publisher = publisher(&fake, config());

        let err = publisher
            .publish(
                &original_write(),
                "t0ken",
                &[
                    Change::add_file("docs/a.md", "a"),
                    Change::delete_file("docs/ghost.md"),
                ],
                &ContentMap::new(),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, DocFsError::NotFound { ref path } if path == "docs/ghost.md"));
        assert!(!fake.calls().iter().any(|c| matches!(c, Call::CreatePullRequest(_))));
        assert!(matches!(publisher.status(), PublishStatus::Failed { .. }));
        assert!(!publisher.is_publishing());
    }

    #[tokio::test]
    async fn test_read_only_target_and_empty_set() {
        let fake = Arc::new(FakeGitHub::new());
        let publisher = publisher(&fake, config());
        let read_only = ResolvedTarget::read_only(Repository::new("acme", "handbook"));

        let none = publisher
            .publish(&original_write(), "t0ken", &[], &ContentMap::new())
            .await
            .unwrap();
        assert!(none.is_none());

        let err = publisher
            .publish(&read_only, "t0ken", &[Change::add_folder("docs/x")], &ContentMap::new())
            .await
            .unwrap_err();
        assert!(matches!(err, DocFsError::Precondition { .. }));
        assert!(fake.calls().is_empty());
    }

    #[test]
    fn test_in_flight_guard_is_single_flight() {
        let flag = AtomicBool::new(false);
        let first = InFlight::acquire(&flag);
        assert!(first.is_some());
        assert!(InFlight::acquire(&flag).is_none());
        drop(first);
        assert!(InFlight::acquire(&flag).is_some());
    }

    #[test]
    fn test_work_branch_name_is_ref_safe() {
        let name = work_branch_name("inline-fs/");
        let stamp = name.strip_prefix("inline-fs/").unwrap();
        assert!(!stamp.contains(':') && !stamp.contains('.'));
        assert!(stamp.ends_with('Z'));
    }

    #[test]
    fn test_status_display() {
        let status = PublishStatus::Applying {
            index: 2,
            total: 3,
            description: "move: a.md -> b.md".to_string(),
        };
        assert_eq!(status.to_string(), "Applying change 2/3: move: a.md -> b.md");
    }
}
