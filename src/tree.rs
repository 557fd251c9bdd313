//! In-memory mirror of the documentation directory.
//!
//! The tree is populated lazily: a directory's children are fetched only
//! when it is expanded, and local mutations are applied synchronously
//! without touching the network.

use std::cmp::Ordering;

use crate::{
    error::{DocFsError, Result},
    types::{parent_path, EntryType, TreeNode},
};

/// Directories first, then by name
pub fn compare_nodes(a: &TreeNode, b: &TreeNode) -> Ordering {
    match (a.entry_type, b.entry_type) {
        (EntryType::Dir, EntryType::File) => Ordering::Less,
        (EntryType::File, EntryType::Dir) => Ordering::Greater,
        _ => a.name.cmp(&b.name),
    }
}

pub fn sort_nodes(nodes: &mut [TreeNode]) {
    nodes.sort_by(compare_nodes);
}

#[derive(Debug, Clone)]
pub struct VirtualTree {
    root: TreeNode,
}

impl VirtualTree {
    /// Create an empty, unloaded tree rooted at `root_path`
    pub fn new(root_path: &str) -> Self {
        Self {
            root: TreeNode::dir(root_path.trim_matches('/')),
        }
    }

    pub fn root(&self) -> &TreeNode {
        &self.root
    }

    /// Whether `path` lies inside this tree (the root included)
    pub fn covers(&self, path: &str) -> bool {
        path == self.root.path
            || path
                .strip_prefix(self.root.path.as_str())
                .is_some_and(|rest| rest.starts_with('/'))
    }

    pub fn find(&self, path: &str) -> Option<&TreeNode> {
        let mut current = &self.root;
        for segment in self.relative_segments(path)? {
            current = current.children().iter().find(|c| c.name == segment)?;
        }
        Some(current)
    }

    fn find_mut(&mut self, path: &str) -> Option<&mut TreeNode> {
        let segments: Vec<String> = self
            .relative_segments(path)?
            .map(str::to_string)
            .collect();
        let mut current = &mut self.root;
        for segment in segments {
            current = current
                .children
                .as_mut()?
                .iter_mut()
                .find(|c| c.name == segment)?;
        }
        Some(current)
    }

    fn relative_segments<'a>(&self, path: &'a str) -> Option<impl Iterator<Item = &'a str>> {
        let path = path.trim_matches('/');
        if !self.covers(path) {
            return None;
        }
        let rest = &path[self.root.path.len()..];
        Some(rest.split('/').filter(|s| !s.is_empty()))
    }

    pub fn contains(&self, path: &str) -> bool {
        self.find(path).is_some()
    }

    pub fn is_loaded(&self, path: &str) -> bool {
        self.find(path).is_some_and(|node| node.is_dir() && node.loaded)
    }

    /// Merge a fetched listing into the directory at `path` and mark it loaded
    ///
    /// Nodes already present at the same path are kept as they are, so
    /// loaded subtrees and local additions survive a refresh.
    pub fn merge_children(&mut self, path: &str, fetched: Vec<TreeNode>) -> Result<()> {
        let dir = self
            .find_mut(path)
            .filter(|node| node.is_dir())
            .ok_or_else(|| DocFsError::invalid_path(path, "not a directory in the tree"))?;

        let children = dir.children.get_or_insert_with(Vec::new);
        for node in fetched {
            if !children.iter().any(|c| c.path == node.path) {
                children.push(node);
            }
        }
        sort_nodes(children);
        dir.loaded = true;
        Ok(())
    }

    /// Insert a node, creating missing parent directories as unloaded nodes
    ///
    /// Inserting at a path that already exists is rejected.
    pub fn insert(&mut self, node: TreeNode) -> Result<()> {
        if !self.covers(&node.path) || node.path == self.root.path {
            return Err(DocFsError::invalid_path(&node.path, "outside the documentation tree"));
        }
        if self.contains(&node.path) {
            return Err(DocFsError::invalid_path(&node.path, "already exists"));
        }
        let parent = parent_path(&node.path)
            .ok_or_else(|| DocFsError::invalid_path(&node.path, "has no parent directory"))?
            .to_string();
        self.ensure_dir(&parent)?;

        let dir = self
            .find_mut(&parent)
            .ok_or_else(|| DocFsError::invalid_path(&parent, "parent directory missing"))?;
        let children = dir.children.get_or_insert_with(Vec::new);
        children.push(node);
        sort_nodes(children);
        Ok(())
    }

    fn ensure_dir(&mut self, path: &str) -> Result<()> {
        match self.find(path) {
            Some(node) if node.is_dir() => Ok(()),
            Some(_) => Err(DocFsError::invalid_path(path, "is a file, not a directory")),
            None => self.insert(TreeNode::dir(path)),
        }
    }

    /// Detach the node at `path`, returning it
    pub fn remove(&mut self, path: &str) -> Option<TreeNode> {
        let parent = parent_path(path.trim_matches('/'))?.to_string();
        let children = self.find_mut(&parent)?.children.as_mut()?;
        let index = children.iter().position(|c| c.path == path)?;
        Some(children.remove(index))
    }

    /// Move a file node, rewriting its name and path
    pub fn move_file(&mut self, from: &str, to: &str) -> Result<()> {
        match self.find(from) {
            Some(node) if node.is_file() => {}
            Some(_) => return Err(DocFsError::invalid_path(from, "only files can be moved")),
            None => return Err(DocFsError::NotFound { path: from.to_string() }),
        }
        if self.contains(to) {
            return Err(DocFsError::invalid_path(to, "already exists"));
        }
        let Some(mut node) = self.remove(from) else {
            return Err(DocFsError::NotFound { path: from.to_string() });
        };
        let moved = TreeNode::file(to);
        node.name = moved.name;
        node.path = moved.path;
        if let Err(e) = self.insert(node.clone()) {
            // Put the file back where it was
            node.name = crate::types::last_segment(from).to_string();
            node.path = from.to_string();
            self.insert(node)?;
            return Err(e);
        }
        Ok(())
    }

    /// Whether every directory in the subtree at `path` has been listed
    ///
    /// Directories created in this session count as listed.
    pub fn is_fully_loaded(&self, path: &str) -> bool {
        let Some(node) = self.find(path) else {
            return false;
        };
        let mut stack = vec![node];
        while let Some(n) = stack.pop() {
            if n.is_dir() && !n.loaded && n.sha.is_some() {
                return false;
            }
            stack.extend(n.children());
        }
        true
    }

    /// Whether the in-memory subtree at `path` holds at least one file
    pub fn contains_files(&self, path: &str) -> bool {
        let Some(node) = self.find(path) else {
            return false;
        };
        let mut stack: Vec<&TreeNode> = node.children().iter().collect();
        while let Some(n) = stack.pop() {
            if n.is_file() {
                return true;
            }
            stack.extend(n.children());
        }
        false
    }
}
