//! Ordered list of staged changes.
//!
//! Staging collapses transient edits so the published change set reflects
//! the net effect on the remote repository:
//!
//! - adding/updating a path that already has a pending add/update replaces
//!   that entry's content in place, keeping its kind and position
//! - deleting a path that was added in this session drops the add instead of
//!   emitting a delete
//! - moving a path that was added in this session retargets the add
//!
//! Everything else is appended.

use crate::types::Change;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeLedger {
    entries: Vec<Change>,
}

impl ChangeLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stage(&mut self, change: Change) {
        match change {
            Change::AddFile { .. } | Change::UpdateFile { .. } => self.stage_content(change),
            Change::DeleteFile { path } => self.stage_delete(path),
            Change::MoveFile { from, to } => self.stage_move(from, to),
            other => self.entries.push(other),
        }
    }

    fn stage_content(&mut self, change: Change) {
        let (path, content, encoding) = match &change {
            Change::AddFile {
                path,
                content,
                encoding,
            }
            | Change::UpdateFile {
                path,
                content,
                encoding,
            } => (path, content, *encoding),
            _ => return,
        };
        let existing = self
            .entries
            .iter_mut()
            .find(|c| is_content_entry_for(c, path));
        match existing {
            Some(
                Change::AddFile {
                    content: c,
                    encoding: e,
                    ..
                }
                | Change::UpdateFile {
                    content: c,
                    encoding: e,
                    ..
                },
            ) => {
                *c = content.clone();
                *e = encoding;
            }
            _ => self.entries.push(change),
        }
    }

    fn stage_delete(&mut self, path: String) {
        let added_in_session = self.pending_add(&path);
        self.entries.retain(|c| !is_content_entry_for(c, &path));
        if !added_in_session {
            self.entries.push(Change::DeleteFile { path });
        }
    }

    fn stage_move(&mut self, from: String, to: String) {
        if let Some(Change::AddFile { path, .. }) = self
            .entries
            .iter_mut()
            .find(|c| matches!(c, Change::AddFile { path, .. } if *path == from))
        {
            *path = to;
            return;
        }
        // A pending edit of a pre-existing file follows the file
        for entry in &mut self.entries {
            if let Change::UpdateFile { path, .. } = entry {
                if *path == from {
                    *path = to.clone();
                }
            }
        }
        self.entries.push(Change::MoveFile { from, to });
    }

    /// Whether `path` exists only because of an in-session add
    pub fn pending_add(&self, path: &str) -> bool {
        self.entries
            .iter()
            .any(|c| matches!(c, Change::AddFile { path: p, .. } if p == path))
    }

    pub fn list(&self) -> &[Change] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Drop entries that were published, keeping anything staged since
    ///
    /// Entries edited in place after the snapshot was taken no longer match
    /// and therefore survive for the next publish. A published add that was
    /// moved or deleted in the meantime now exists remotely, so a delete of
    /// its old path is staged.
    pub fn remove_published(&mut self, published: &[Change]) {
        let mut remaining: Vec<&Change> = published.iter().collect();
        self.entries.retain(|entry| {
            match remaining.iter().position(|p| *p == entry) {
                Some(index) => {
                    remaining.swap_remove(index);
                    false
                }
                None => true,
            }
        });

        let orphaned: Vec<String> = remaining
            .into_iter()
            .filter_map(|change| match change {
                Change::AddFile { path, .. } if !self.touches(path) => Some(path.clone()),
                _ => None,
            })
            .collect();
        for path in orphaned {
            self.entries.push(Change::DeleteFile { path });
        }
    }

    /// Whether a pending content write or delete targets `path`
    fn touches(&self, path: &str) -> bool {
        self.entries.iter().any(|c| {
            is_content_entry_for(c, path)
                || matches!(c, Change::DeleteFile { path: p } if p == path)
        })
    }

    /// Numbered, human-readable summary, one change per line
    pub fn summary(&self) -> String {
        self.entries
            .iter()
            .enumerate()
            .map(|(i, c)| format!("{}. {}", i + 1, c.describe()))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

fn is_content_entry_for(change: &Change, path: &str) -> bool {
    matches!(
        change,
        Change::AddFile { path: p, .. } | Change::UpdateFile { path: p, .. } if p == path
    )
}
