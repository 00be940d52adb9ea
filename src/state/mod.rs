//! State owned by the session controller.

use crate::image_cache::CacheEntry;
use std::path::{Path, PathBuf};

pub mod navigation;

pub use navigation::{CandidateList, Direction, Mode, Recovery};

/// What is shown right now.
#[derive(Default)]
pub struct Session {
    current_path: Option<PathBuf>,
    display_name: String,
    cache: CacheEntry,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current_path(&self) -> Option<&Path> {
        self.current_path.as_deref()
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn cache(&self) -> &CacheEntry {
        &self.cache
    }

    pub fn cache_mut(&mut self) -> &mut CacheEntry {
        &mut self.cache
    }

    /// Drops the current entry, stopping any animation, and leaves an empty
    /// one in its place.
    pub fn release_cache(&mut self) {
        self.cache = CacheEntry::empty();
    }

    /// Installs the entry for `path`. The previous entry must already have
    /// been released with [`Session::release_cache`].
    pub fn install(&mut self, path: PathBuf, cache: CacheEntry) {
        self.display_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        self.current_path = Some(path);
        self.cache = cache;
    }

    /// Forgets the current path and shows nothing.
    pub fn clear(&mut self) {
        self.release_cache();
        self.current_path = None;
        self.display_name.clear();
    }
}
