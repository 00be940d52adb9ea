//! Candidate lists: the pictures the viewer can step through and the
//! current position among them.

use crate::file_utils::{self, PathExt};
use log::{debug, warn};
use std::path::{Path, PathBuf};

/// Direction for navigation through pictures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Next,
    Previous,
}

/// How the candidate list was built.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    DirectoryScoped,
    ExplicitList,
}

/// Result of index recovery after the list changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recovery {
    /// The current entry is still present.
    Unchanged(usize),
    /// The current entry vanished; this index was selected instead.
    Moved(usize),
    /// Nothing is left to show.
    Empty,
}

/// Ordered pictures in scope plus the current position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CandidateList {
    /// Bare file names of one directory, sorted by the directory collation.
    Directory {
        directory: PathBuf,
        names: Vec<PathBuf>,
        current: Option<usize>,
    },
    /// Full paths in the order the caller gave them.
    Explicit {
        paths: Vec<PathBuf>,
        current: Option<usize>,
    },
}

impl CandidateList {
    /// Builds a directory-scoped list around `anchor`, the file being opened.
    pub fn for_directory(anchor: &Path) -> Self {
        let anchor = file_utils::normalize_path(anchor);
        let directory = anchor
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| anchor.clone());

        let mut list = CandidateList::Directory {
            directory,
            names: Vec::new(),
            current: None,
        };
        list.rebuild_for_directory(Some(&anchor));
        list
    }

    /// Builds an explicit list. The first path is current.
    pub fn explicit(paths: Vec<PathBuf>) -> Self {
        let current = if paths.is_empty() { None } else { Some(0) };
        CandidateList::Explicit { paths, current }
    }

    pub fn mode(&self) -> Mode {
        match self {
            CandidateList::Directory { .. } => Mode::DirectoryScoped,
            CandidateList::Explicit { .. } => Mode::ExplicitList,
        }
    }

    pub fn entries(&self) -> &[PathBuf] {
        match self {
            CandidateList::Directory { names, .. } => names,
            CandidateList::Explicit { paths, .. } => paths,
        }
    }

    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }

    pub fn current_index(&self) -> Option<usize> {
        match self {
            CandidateList::Directory { current, .. } | CandidateList::Explicit { current, .. } => {
                *current
            }
        }
    }

    fn current_mut(&mut self) -> &mut Option<usize> {
        match self {
            CandidateList::Directory { current, .. } | CandidateList::Explicit { current, .. } => {
                current
            }
        }
    }

    /// The browsed directory, for directory-scoped lists.
    pub fn directory(&self) -> Option<&Path> {
        match self {
            CandidateList::Directory { directory, .. } => Some(directory),
            CandidateList::Explicit { .. } => None,
        }
    }

    /// Full path of the entry at `index`.
    pub fn path_at(&self, index: usize) -> Option<PathBuf> {
        let entry = self.entries().get(index)?;
        Some(self.resolve(entry))
    }

    /// Turns an entry identifier into a full path.
    pub fn resolve(&self, entry: &Path) -> PathBuf {
        match self {
            CandidateList::Directory { directory, .. } => directory.join(entry),
            CandidateList::Explicit { .. } => entry.to_path_buf(),
        }
    }

    /// Paths to hand to the watch service: the directory and its parent
    /// (to notice renames of the directory itself), or every listed file.
    pub fn watch_targets(&self) -> Vec<PathBuf> {
        match self {
            CandidateList::Directory { directory, .. } => {
                let mut targets = vec![directory.clone()];
                if let Some(parent) = directory.parent() {
                    targets.push(parent.to_path_buf());
                }
                targets
            }
            CandidateList::Explicit { paths, .. } => paths.clone(),
        }
    }

    /// Rescans the directory and points the cursor at `anchor`'s file name,
    /// or at nothing when the anchor is absent or not in the listing.
    /// Does nothing for explicit lists.
    pub fn rebuild_for_directory(&mut self, anchor: Option<&Path>) {
        let CandidateList::Directory {
            directory,
            names,
            current,
        } = self
        else {
            return;
        };

        let start = std::time::Instant::now();
        *names = match file_utils::scan_directory(directory) {
            Ok(found) => found,
            Err(e) => {
                warn!("Failed to scan {}: {}", directory.format_for_log(), e);
                Vec::new()
            }
        };

        let anchor_name = anchor.and_then(Path::file_name);
        *current = anchor_name.and_then(|name| names.iter().position(|n| n.as_os_str() == name));

        debug!(
            "Scanned {} in {:?}: {} picture(s), current {:?}",
            directory.format_for_log(),
            start.elapsed(),
            names.len(),
            current
        );
    }

    /// Drops `changed` from an explicit list if it no longer exists, then
    /// points the cursor at `target` (the shown path), or at nothing when
    /// the target is no longer listed. Does nothing for directory lists.
    pub fn repair_explicit_list(&mut self, changed: &Path, target: Option<&Path>) {
        let CandidateList::Explicit { paths, current } = self else {
            return;
        };

        if let Some(index) = paths.iter().position(|p| p == changed) {
            if !changed.exists() {
                debug!("Removing vanished {}", changed.format_for_log());
                paths.remove(index);
            }
        }
        *current = target.and_then(|target| paths.iter().position(|p| p == target));
    }

    /// Chooses a new current index after a rebuild or repair.
    ///
    /// Positional rather than by identity: if the old index still fits it is
    /// reused, past the end it clamps to the tail, otherwise the head.
    pub fn recover_index(&mut self, old_index: Option<usize>) -> Recovery {
        if let Some(index) = self.current_index() {
            return Recovery::Unchanged(index);
        }

        let len = self.len();
        if len == 0 {
            return Recovery::Empty;
        }

        let index = match old_index {
            Some(old) if old >= len => len - 1,
            Some(old) => old,
            None => 0,
        };
        *self.current_mut() = Some(index);
        Recovery::Moved(index)
    }

    /// Moves the cursor one step with wraparound and returns the new index.
    /// A missing cursor counts as "before the head" for `Next` and "after
    /// the tail" for `Previous`. Returns `None` on an empty list.
    pub fn step(&mut self, direction: Direction) -> Option<usize> {
        let len = self.len();
        if len == 0 {
            return None;
        }

        let index = match (direction, self.current_index()) {
            (Direction::Next, Some(i)) if i + 1 < len => i + 1,
            (Direction::Next, _) => 0,
            (Direction::Previous, Some(i)) if i > 0 && i <= len => i - 1,
            (Direction::Previous, _) => len - 1,
        };
        *self.current_mut() = Some(index);
        Some(index)
    }
}
