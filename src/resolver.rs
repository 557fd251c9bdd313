use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, instrument, warn};

use crate::{
    config::EditorConfig,
    error::{DocFsError, Result},
    transport::GitHubApi,
    types::Repository,
};

/// What the session may do with its target repository
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// Push access to the canonical repository
    Write,
    /// Writing to the user's fork, contributing back through PRs
    Fork,
    /// No token, or fork setup failed: reads only
    ReadOnly,
}

/// The concrete repository a session reads from and writes to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTarget {
    pub repository: Repository,
    pub access: Access,
}

impl ResolvedTarget {
    pub fn read_only(repository: Repository) -> Self {
        Self {
            repository,
            access: Access::ReadOnly,
        }
    }

    pub fn can_write(&self) -> bool {
        self.access != Access::ReadOnly
    }
}

/// Decides which repository a session should write to
///
/// Tries, in order: the original when the token can push to it, the user's
/// existing fork, and finally a freshly created fork once it is queryable.
pub struct RepositoryResolver {
    api: Arc<dyn GitHubApi>,
    poll_attempts: u32,
    poll_delay: Duration,
}

impl RepositoryResolver {
    pub fn new(api: Arc<dyn GitHubApi>, config: &EditorConfig) -> Self {
        Self {
            api,
            poll_attempts: config.fork_poll_attempts.max(1),
            poll_delay: config.fork_poll_delay(),
        }
    }

    /// Resolve the target repository for `token`
    ///
    /// Fork creation or polling failures are returned to the caller; see
    /// [`RepositoryResolver::resolve_or_read_only`] for the fallback.
    #[instrument(skip_all, fields(original = %original))]
    pub async fn resolve(
        &self,
        original: &Repository,
        token: Option<&str>,
    ) -> Result<ResolvedTarget> {
        let Some(token) = token else {
            debug!("no token, reading {original} without write access");
            return Ok(ResolvedTarget::read_only(original.clone()));
        };

        // A failed permission check only means "no direct write"
        let can_push = match self.api.check_write_permission(original, token).await {
            Ok(can_push) => can_push,
            Err(e) => {
                warn!("permission check on {original} failed: {e}");
                false
            }
        };
        if can_push {
            info!("using original repository {original}");
            return Ok(ResolvedTarget {
                repository: original.clone(),
                access: Access::Write,
            });
        }

        let existing = match self.api.find_existing_fork(original, token).await {
            Ok(fork) => fork,
            Err(e) => {
                warn!("fork lookup for {original} failed: {e}");
                None
            }
        };
        if let Some(fork) = existing {
            info!("using existing fork {fork}");
            return Ok(ResolvedTarget {
                repository: fork,
                access: Access::Fork,
            });
        }

        info!("creating fork of {original}");
        let fork = self.api.create_fork(original, token).await?;
        self.wait_for_fork(&fork, token).await?;
        info!("fork {fork} is ready");
        Ok(ResolvedTarget {
            repository: fork,
            access: Access::Fork,
        })
    }

    /// Like [`RepositoryResolver::resolve`], degrading to read-only use of
    /// the original when no writable target can be set up
    pub async fn resolve_or_read_only(
        &self,
        original: &Repository,
        token: Option<&str>,
    ) -> ResolvedTarget {
        match self.resolve(original, token).await {
            Ok(target) => target,
            Err(e) => {
                warn!("falling back to read-only {original}: {e}");
                ResolvedTarget::read_only(original.clone())
            }
        }
    }

    async fn wait_for_fork(&self, fork: &Repository, token: &str) -> Result<()> {
        for attempt in 0..self.poll_attempts {
            if attempt > 0 {
                tokio::time::sleep(self.poll_delay).await;
            }
            match self.api.repository_exists(fork, token).await {
                Ok(true) => return Ok(()),
                Ok(false) => debug!("fork {fork} not ready (attempt {})", attempt + 1),
                Err(e) => debug!("fork {fork} probe failed (attempt {}): {e}", attempt + 1),
            }
        }
        Err(DocFsError::ForkUnavailable {
            owner: fork.owner.clone(),
            repo: fork.repo.clone(),
            attempts: self.poll_attempts,
        })
    }
}
