//! The editor-facing facade.
//!
//! A [`Workspace`] owns the virtual tree, the content map and the change
//! ledger for one documentation repository, and drives the resolver and
//! publisher on their behalf. Structural edits are synchronous and never
//! touch the network; only listing, reading and publishing do.
//!
//! State sits behind a single lock that is never held across an await, so
//! async operations may interleave. Interleaving is made safe by:
//! - a per-directory in-flight marker in [`Workspace::load_children`];
//!   concurrent callers wait for the running load instead of fetching twice
//! - generation stamps on the content map, so a slow read never overwrites
//!   a newer local edit
//! - a tree epoch, so a listing fetched before a repository switch is dropped

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::watch;
use tracing::{debug, info, instrument};

use crate::{
    config::EditorConfig,
    content::ContentMap,
    error::{DocFsError, Result},
    github::GitHubClient,
    image::ImageUpload,
    ledger::ChangeLedger,
    publisher::{PublishStatus, Publisher},
    resolver::{RepositoryResolver, ResolvedTarget},
    session::Session,
    transport::GitHubApi,
    tree::VirtualTree,
    types::{last_segment, parent_path, Change, Encoding, PublishOutcome, Repository, TreeNode},
};

struct WorkspaceState {
    /// Token the current target was resolved with, and the target
    resolution: Option<(Option<String>, ResolvedTarget)>,
    tree: VirtualTree,
    tree_epoch: u64,
    contents: ContentMap,
    ledger: ChangeLedger,
    /// Directories being listed; the flag flips once the listing is merged
    loading: HashMap<String, watch::Receiver<bool>>,
    selected: Option<String>,
    status: Option<String>,
    last_result_url: Option<String>,
}

impl WorkspaceState {
    fn new(docs_root: &str) -> Self {
        Self {
            resolution: None,
            tree: VirtualTree::new(docs_root),
            tree_epoch: 0,
            contents: ContentMap::new(),
            ledger: ChangeLedger::new(),
            loading: HashMap::new(),
            selected: None,
            status: None,
            last_result_url: None,
        }
    }

    /// Forget everything read from the previous repository
    ///
    /// Staged changes are kept; they apply to any repository with the same
    /// layout.
    fn reset_tree(&mut self) {
        self.tree = VirtualTree::new(&self.tree.root().path);
        self.tree_epoch += 1;
        self.contents.clear();
        self.loading.clear();
    }

    /// Insert into the tree when `node` lies under the documentation root
    fn insert_node(&mut self, node: TreeNode) -> Result<()> {
        if self.tree.covers(&node.path) {
            self.tree.insert(node)
        } else {
            Ok(())
        }
    }

    fn move_node(&mut self, from: &str, to: &str) -> Result<()> {
        match (self.tree.covers(from), self.tree.covers(to)) {
            (true, true) => self.tree.move_file(from, to),
            (true, false) => match self.tree.find(from).map(TreeNode::is_dir) {
                Some(true) => Err(DocFsError::invalid_path(from, "only files can be moved")),
                Some(false) => {
                    self.tree.remove(from);
                    Ok(())
                }
                None => Err(DocFsError::NotFound {
                    path: from.to_string(),
                }),
            },
            (false, true) => self.tree.insert(TreeNode::file(to)),
            (false, false) => Ok(()),
        }
    }

    fn clear_selection_of(&mut self, path: &str) {
        if self.selected.as_deref() == Some(path) {
            self.selected = None;
        }
    }
}

pub struct Workspace {
    config: Arc<EditorConfig>,
    api: Arc<dyn GitHubApi>,
    session: Arc<dyn Session>,
    resolver: RepositoryResolver,
    publisher: Publisher,
    state: Mutex<WorkspaceState>,
}

impl Workspace {
    /// Workspace talking to GitHub over HTTPS
    pub fn new(config: EditorConfig, session: Arc<dyn Session>) -> Result<Self> {
        config.validate()?;
        let config = Arc::new(config);
        let api: Arc<dyn GitHubApi> = Arc::new(GitHubClient::new(config.clone()));
        Ok(Self::with_client(config, api, session))
    }

    pub fn with_client(
        config: Arc<EditorConfig>,
        api: Arc<dyn GitHubApi>,
        session: Arc<dyn Session>,
    ) -> Self {
        Self {
            resolver: RepositoryResolver::new(api.clone(), &config),
            publisher: Publisher::new(api.clone(), config.clone()),
            state: Mutex::new(WorkspaceState::new(&config.docs_root)),
            config,
            api,
            session,
        }
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    // Repository resolution

    /// Resolve the target repository for the current session token
    ///
    /// Resolution is cached per token; signing in or out triggers a new
    /// one. When the target repository changes, the tree and content map
    /// are reset.
    pub async fn resolve_repository(&self) -> ResolvedTarget {
        let token = self.session.token();
        {
            let state = self.state.lock();
            if let Some((resolved_for, target)) = &state.resolution {
                if *resolved_for == token {
                    return target.clone();
                }
            }
        }

        let target = self
            .resolver
            .resolve_or_read_only(&self.config.original(), token.as_deref())
            .await;

        let mut state = self.state.lock();
        let switched = state
            .resolution
            .as_ref()
            .is_some_and(|(_, previous)| previous.repository != target.repository);
        if switched {
            info!("target repository is now {}, resetting tree", target.repository);
            state.reset_tree();
        }
        state.resolution = Some((token, target.clone()));
        target
    }

    /// The resolved repository, if resolution has happened
    pub fn repository(&self) -> Option<Repository> {
        let state = self.state.lock();
        state
            .resolution
            .as_ref()
            .map(|(_, target)| target.repository.clone())
    }

    /// Whether write-triggering actions (save, publish) should be enabled
    pub fn can_write(&self) -> bool {
        let token = self.session.token();
        let state = self.state.lock();
        match &state.resolution {
            Some((resolved_for, target)) => {
                token.is_some() && *resolved_for == token && target.can_write()
            }
            None => false,
        }
    }

    // Tree

    /// Fetch a directory listing without touching the tree
    pub async fn list_directory(&self, path: &str) -> Result<Vec<TreeNode>> {
        let target = self.resolve_repository().await;
        let token = self.session.token();
        self.api
            .list_directory(&target.repository, path, &self.config.branch, token.as_deref())
            .await
    }

    pub async fn load_root(&self) -> Result<()> {
        let root = self.state.lock().tree.root().path.clone();
        self.load_children(&root).await
    }

    /// Fetch and merge the children of the directory at `path`
    ///
    /// No-op when the directory is already loaded. When a load is already in
    /// flight, waits for it rather than fetching again.
    pub async fn load_children(&self, path: &str) -> Result<()> {
        let path = path.trim_matches('/').to_string();
        let (epoch, created_locally, done) = loop {
            let mut pending = {
                let mut state = self.state.lock();
                let (is_dir, loaded, has_sha) = match state.tree.find(&path) {
                    Some(node) => (node.is_dir(), node.loaded, node.sha.is_some()),
                    None => return Err(DocFsError::NotFound { path }),
                };
                if !is_dir {
                    return Err(DocFsError::invalid_path(&path, "not a directory"));
                }
                if loaded {
                    return Ok(());
                }
                // A closed channel means the loading call was dropped
                let running = state
                    .loading
                    .get(&path)
                    .filter(|pending| pending.has_changed().is_ok())
                    .cloned();
                if let Some(pending) = running {
                    pending
                } else {
                    let (done, pending) = watch::channel(false);
                    state.loading.insert(path.clone(), pending);
                    let created_locally = !has_sha && path != state.tree.root().path;
                    break (state.tree_epoch, created_locally, done);
                }
            };
            debug!("{path} is already loading, waiting for it");
            // Errors only when the loading call went away; the loop re-checks
            let _ = pending.wait_for(|merged| *merged).await;
        };

        let result = self.list_directory(&path).await;

        let mut state = self.state.lock();
        if state.tree_epoch != epoch {
            debug!("tree was reset while loading {path}, dropping listing");
            return Ok(());
        }
        state.loading.remove(&path);
        let mut fetched = match result {
            Ok(nodes) => nodes,
            // Nothing pushed yet for a folder created in this session
            Err(DocFsError::NotFound { .. }) if created_locally => Vec::new(),
            Err(e) => return Err(e),
        };
        if !state.tree.contains(&path) {
            debug!("{path} was removed while loading");
            return Ok(());
        }
        let placeholder = self.config.placeholder_name.as_str();
        fetched.retain(|node| !(node.is_file() && node.name == placeholder));
        state.tree.merge_children(&path, fetched)?;
        done.send_replace(true);
        Ok(())
    }

    /// Snapshot of the current tree
    pub fn tree(&self) -> VirtualTree {
        self.state.lock().tree.clone()
    }

    pub fn node(&self, path: &str) -> Option<TreeNode> {
        self.state.lock().tree.find(path).cloned()
    }

    /// Open a file in the editor
    ///
    /// Paths not yet in the tree are accepted when they look like files
    /// (have an extension), to allow navigating to unexpanded directories.
    pub fn select_file(&self, path: &str) -> Result<()> {
        let path = normalize(path)?;
        let mut state = self.state.lock();
        match state.tree.find(&path).map(TreeNode::is_dir) {
            Some(false) => {}
            Some(true) => return Err(DocFsError::invalid_path(&path, "is a directory")),
            None if has_extension(&path) => {}
            None => return Err(DocFsError::invalid_path(&path, "not a known file")),
        }
        state.selected = Some(path);
        Ok(())
    }

    pub fn selected_file(&self) -> Option<String> {
        self.state.lock().selected.clone()
    }

    // Structural edits

    /// Create a file; without `content` it starts as `# <file stem>`
    pub fn add_file(&self, path: &str, content: Option<&str>) -> Result<()> {
        let path = normalize(path)?;
        let content = match content {
            Some(content) => content.to_string(),
            None => default_content(&path),
        };

        let mut state = self.state.lock();
        state.insert_node(TreeNode::file(&path))?;
        state.contents.set(&path, content.clone());
        state.ledger.stage(Change::add_file(&path, content));
        debug!("staged new file {path}");
        Ok(())
    }

    /// Stage a binary file from base64-encoded bytes
    pub fn add_binary_file(&self, path: &str, base64: impl Into<String>) -> Result<()> {
        let path = normalize(path)?;
        let mut state = self.state.lock();
        if !state.tree.contains(&path) {
            state.insert_node(TreeNode::file(&path))?;
        }
        state.ledger.stage(Change::AddFile {
            path,
            content: base64.into(),
            encoding: Encoding::Base64,
        });
        Ok(())
    }

    /// Stage a pasted image under the upload directory
    ///
    /// Returns `None` for unsupported file types. Staging the same image
    /// twice is a no-op.
    pub fn stage_image(
        &self,
        bytes: &[u8],
        mime: &str,
        file_name: Option<&str>,
    ) -> Result<Option<ImageUpload>> {
        let Some(upload) = ImageUpload::prepare(bytes, mime, file_name, &self.config) else {
            debug!("skipping unsupported image type {mime:?}");
            return Ok(None);
        };
        if self.state.lock().ledger.pending_add(&upload.repo_path) {
            debug!("{} already staged", upload.repo_path);
            return Ok(Some(upload));
        }
        self.add_binary_file(&upload.repo_path, upload.base64.clone())?;
        Ok(Some(upload))
    }

    pub fn add_folder(&self, path: &str) -> Result<()> {
        let path = normalize(path)?;
        let mut state = self.state.lock();
        state.insert_node(TreeNode::dir(&path))?;
        state.ledger.stage(Change::add_folder(&path));
        Ok(())
    }

    pub fn delete_file(&self, path: &str) -> Result<()> {
        let path = normalize(path)?;
        let mut state = self.state.lock();
        if state.tree.covers(&path) {
            match state.tree.find(&path).map(TreeNode::is_dir) {
                Some(true) => {
                    return Err(DocFsError::invalid_path(&path, "is a directory"));
                }
                Some(false) => {
                    state.tree.remove(&path);
                }
                None => {
                    let parent_loaded = parent_path(&path).is_some_and(|p| state.tree.is_loaded(p));
                    if parent_loaded {
                        return Err(DocFsError::NotFound { path });
                    }
                }
            }
        }
        state.contents.remove(&path);
        state.clear_selection_of(&path);
        state.ledger.stage(Change::delete_file(&path));
        Ok(())
    }

    /// Delete a folder whose in-memory subtree holds no files
    ///
    /// Callers delete the folder's files first. Folders that were never
    /// expanded are rejected, since their remote contents are unknown.
    pub fn delete_folder(&self, path: &str) -> Result<()> {
        let path = normalize(path)?;
        let mut state = self.state.lock();
        if state.tree.covers(&path) {
            if path == state.tree.root().path {
                return Err(DocFsError::invalid_path(&path, "cannot delete the documentation root"));
            }
            match state.tree.find(&path).map(TreeNode::is_dir) {
                Some(true) => {}
                Some(false) => return Err(DocFsError::invalid_path(&path, "is a file")),
                None => return Err(DocFsError::NotFound { path }),
            }
            if state.tree.contains_files(&path) {
                return Err(DocFsError::FolderNotEmpty { path });
            }
            if !state.tree.is_fully_loaded(&path) {
                return Err(DocFsError::precondition(format!(
                    "{path} has not been loaded; expand it before deleting"
                )));
            }
            state.tree.remove(&path);
        }
        state.ledger.stage(Change::delete_folder(&path));
        Ok(())
    }

    pub fn move_file(&self, from: &str, to: &str) -> Result<()> {
        let from = normalize(from)?;
        let to = normalize(to)?;
        if from == to {
            return Ok(());
        }
        let mut state = self.state.lock();
        state.move_node(&from, &to)?;
        state.contents.rename(&from, &to);
        state.ledger.stage(Change::move_file(&from, &to));
        if state.selected.as_deref() == Some(from.as_str()) {
            state.selected = Some(to);
        }
        Ok(())
    }

    /// Move several files into `target_dir`, returning how many moved
    ///
    /// Directories are rejected up front; moves that would not change a
    /// path are skipped.
    pub fn move_items<S: AsRef<str>>(&self, paths: &[S], target_dir: &str) -> Result<usize> {
        let target_dir = normalize(target_dir)?;
        let sources = paths
            .iter()
            .map(|p| normalize(p.as_ref()))
            .collect::<Result<Vec<_>>>()?;
        {
            let state = self.state.lock();
            if state.tree.find(&target_dir).is_some_and(TreeNode::is_file) {
                return Err(DocFsError::invalid_path(&target_dir, "is a file"));
            }
            if let Some(dir) = sources
                .iter()
                .find(|p| state.tree.find(p).is_some_and(TreeNode::is_dir))
            {
                return Err(DocFsError::invalid_path(dir, "only files can be moved"));
            }
        }

        let mut moved = 0;
        for from in sources {
            let to = format!("{target_dir}/{}", last_segment(&from));
            let into_itself = target_dir == from || target_dir.starts_with(&format!("{from}/"));
            if to == from || into_itself {
                debug!("skipping move of {from} into {target_dir}");
                continue;
            }
            self.move_file(&from, &to)?;
            moved += 1;
        }
        Ok(moved)
    }

    // Content

    /// Current content of a file, fetching it on first access
    ///
    /// Without a token the file is read from the raw content host.
    pub async fn get_file_content(&self, path: &str) -> Result<String> {
        let path = normalize(path)?;
        let cached = self.state.lock().contents.get(&path).map(str::to_string);
        if let Some(content) = cached {
            return Ok(content);
        }

        let target = self.resolve_repository().await;
        let since = {
            let state = self.state.lock();
            if let Some(content) = state.contents.get(&path) {
                return Ok(content.to_string());
            }
            state.contents.generation()
        };

        let token = self.session.token();
        let branch = self.config.branch.as_str();
        let fetched = match token.as_deref() {
            Some(token) => {
                self.api
                    .get_file_content(&target.repository, &path, branch, Some(token))
                    .await?
            }
            None => {
                debug!("no token, reading {path} from the raw host");
                let bytes = self
                    .api
                    .fetch_raw(&target.repository, branch, &path, None)
                    .await?;
                String::from_utf8(bytes.to_vec())?
            }
        };

        // A local edit or delete made while fetching wins
        let current = self.state.lock().contents.fill(&path, fetched, since);
        current.ok_or(DocFsError::NotFound { path })
    }

    pub fn set_file_content(&self, path: &str, content: impl Into<String>) -> Result<()> {
        let path = normalize(path)?;
        let content = content.into();
        let mut state = self.state.lock();
        state.contents.set(&path, content.clone());
        state.ledger.stage(Change::update_file(&path, content));
        Ok(())
    }

    /// Whether a directory holds no files, loading it first if needed
    pub async fn is_dir_empty(&self, path: &str) -> Result<bool> {
        let path = normalize(path)?;
        self.load_children(&path).await?;
        let state = self.state.lock();
        if !state.tree.is_loaded(&path) {
            return Err(DocFsError::precondition(format!("{path} could not be loaded")));
        }
        Ok(!state.tree.contains_files(&path))
    }

    // Ledger

    pub fn changes(&self) -> Vec<Change> {
        self.state.lock().ledger.list().to_vec()
    }

    pub fn has_unsaved_changes(&self) -> bool {
        !self.state.lock().ledger.is_empty()
    }

    pub fn changes_summary(&self) -> String {
        self.state.lock().ledger.summary()
    }

    /// Discard staged changes; the tree is left as it is
    pub fn clear_changes(&self) {
        self.state.lock().ledger.clear();
    }

    // Publishing

    /// Publish every staged change as one pull request
    ///
    /// Returns `Ok(None)` when there is nothing to publish or a publish is
    /// already running. On success the published changes leave the ledger;
    /// on failure the ledger is untouched so the user can retry.
    #[instrument(skip_all)]
    pub async fn save_all_changes(&self) -> Result<Option<PublishOutcome>> {
        let Some(token) = self.session.token() else {
            return Err(self.fail(DocFsError::precondition("Sign in to GitHub to publish changes")));
        };
        let changes = self.changes();
        if changes.is_empty() {
            self.state.lock().status = Some("No changes to publish".to_string());
            return Ok(None);
        }

        let target = self.resolve_repository().await;
        if !target.can_write() {
            return Err(self.fail(DocFsError::precondition(format!(
                "{} is read-only; publishing is disabled",
                target.repository
            ))));
        }

        let contents = self.state.lock().contents.clone();
        match self.publisher.publish(&target, &token, &changes, &contents).await {
            Ok(Some(outcome)) => {
                let mut state = self.state.lock();
                state.ledger.remove_published(&changes);
                state.status = Some(self.publisher.status().to_string());
                state.last_result_url = Some(outcome.pr_url.clone());
                info!("published {} changes as {}", changes.len(), outcome.pr_url);
                Ok(Some(outcome))
            }
            Ok(None) => Ok(None),
            Err(e) => {
                self.state.lock().status = Some(self.publisher.status().to_string());
                Err(e)
            }
        }
    }

    fn fail(&self, err: DocFsError) -> DocFsError {
        self.state.lock().status = Some(err.to_string());
        err
    }

    /// Last human-readable outcome of a save
    pub fn status(&self) -> Option<String> {
        self.state.lock().status.clone()
    }

    pub fn subscribe_status(&self) -> watch::Receiver<PublishStatus> {
        self.publisher.subscribe()
    }

    pub fn is_publishing(&self) -> bool {
        self.publisher.is_publishing()
    }

    pub fn last_result_url(&self) -> Option<String> {
        self.state.lock().last_result_url.clone()
    }
}

/// Trim slashes and reject empty or relative segments
fn normalize(path: &str) -> Result<String> {
    let trimmed = path.trim().trim_matches('/');
    if trimmed.is_empty() {
        return Err(DocFsError::invalid_path(path, "empty path"));
    }
    if trimmed
        .split('/')
        .any(|segment| segment.is_empty() || segment == "." || segment == "..")
    {
        return Err(DocFsError::invalid_path(path, "empty or relative segment"));
    }
    Ok(trimmed.to_string())
}

fn has_extension(path: &str) -> bool {
    last_segment(path)
        .rsplit_once('.')
        .is_some_and(|(stem, ext)| !stem.is_empty() && !ext.is_empty())
}

fn default_content(path: &str) -> String {
    let name = last_segment(path);
    let stem = match name.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem,
        _ => name,
    };
    format!("# {stem}")
}
