//! Texture name cache
//!
//! Maps each texture name referenced by the level's materials to one id and
//! a resolved file path. Decoding and upload belong to the renderer.

use std::path::{Path, PathBuf};

use indexmap::IndexMap;

/// Index of a texture in the cache
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureId(pub usize);

/// Deduplicated texture references of a level
#[derive(Debug, Clone, Default)]
pub struct TextureCache {
    search_path: Option<PathBuf>,
    entries: IndexMap<String, PathBuf>,
}

impl TextureCache {
    /// Create a cache resolving relative names against `search_path`
    pub fn new(search_path: Option<PathBuf>) -> Self {
        Self {
            search_path,
            entries: IndexMap::new(),
        }
    }

    /// Id for `name`, registering it on first use
    pub fn get_or_insert(&mut self, name: &str) -> TextureId {
        if let Some(index) = self.entries.get_index_of(name) {
            return TextureId(index);
        }
        let path = self.resolve(name);
        let (index, _) = self.entries.insert_full(name.to_string(), path);
        TextureId(index)
    }

    /// Id of an already registered texture
    pub fn get(&self, name: &str) -> Option<TextureId> {
        self.entries.get_index_of(name).map(TextureId)
    }

    /// Resolved file path
    pub fn path(&self, id: TextureId) -> Option<&Path> {
        self.entries.get_index(id.0).map(|(_, p)| p.as_path())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn resolve(&self, name: &str) -> PathBuf {
        let path = Path::new(name);
        match &self.search_path {
            Some(dir) if path.is_relative() => dir.join(path),
            _ => path.to_path_buf(),
        }
    }
}
