use std::collections::HashMap;

/// Locally known file bodies, keyed by repository path
///
/// A present entry is the authoritative current content; an absent one must
/// be fetched before display. Every write is stamped with a monotonically
/// increasing generation so a read-through fetch that started before a local
/// edit can tell it has been overtaken.
#[derive(Debug, Clone, Default)]
pub struct ContentMap {
    entries: HashMap<String, String>,
    stamps: HashMap<String, u64>,
    generation: u64,
    reset_at: u64,
}

impl ContentMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, path: &str) -> Option<&str> {
        self.entries.get(path).map(String::as_str)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.entries.contains_key(path)
    }

    /// Store a local edit
    pub fn set(&mut self, path: &str, content: impl Into<String>) {
        self.generation += 1;
        self.entries.insert(path.to_string(), content.into());
        self.stamps.insert(path.to_string(), self.generation);
    }

    pub fn remove(&mut self, path: &str) -> Option<String> {
        self.generation += 1;
        self.stamps.insert(path.to_string(), self.generation);
        self.entries.remove(path)
    }

    /// Carry content from one path to another
    pub fn rename(&mut self, from: &str, to: &str) {
        if let Some(content) = self.remove(from) {
            self.set(to, content);
        }
    }

    /// Current generation, taken before starting a fetch
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Store fetched content unless `path` was touched after `since`
    ///
    /// Returns the content that is authoritative afterwards: the fetched
    /// body, or the newer local one that won.
    pub fn fill(&mut self, path: &str, fetched: String, since: u64) -> Option<String> {
        let touched = self.stamps.get(path).is_some_and(|stamp| *stamp > since);
        if touched || since < self.reset_at {
            return self.entries.get(path).cloned();
        }
        self.entries.insert(path.to_string(), fetched.clone());
        Some(fetched)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.stamps.clear();
        self.generation += 1;
        self.reset_at = self.generation;
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
