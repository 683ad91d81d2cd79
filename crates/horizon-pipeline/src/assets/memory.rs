use std::collections::HashMap;
use std::future::{ready, Future};

use super::{AssetError, AssetSource};

/// In-memory asset source keyed by path.
#[derive(Debug, Clone, Default)]
pub struct MemoryAssets {
    files: HashMap<String, String>,
}

impl MemoryAssets {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, path: impl Into<String>, text: impl Into<String>) {
        self.files.insert(path.into(), text.into());
    }

    pub fn remove(&mut self, path: &str) -> Option<String> {
        self.files.remove(path)
    }
}

impl AssetSource for MemoryAssets {
    fn fetch(&self, path: &str) -> impl Future<Output = Result<String, AssetError>> {
        ready(self.files.get(path).cloned().ok_or_else(|| AssetError::Fetch {
            path: path.to_string(),
            reason: "not found".to_string(),
        }))
    }
}
