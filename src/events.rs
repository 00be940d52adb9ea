//! Messages delivered into the session's single processing context.

use std::path::PathBuf;

/// Everything that can happen to a session asynchronously.
///
/// Watcher threads and frame tickers only ever send these; the session
/// applies them one at a time on its own thread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// Raw paths reported by the watcher backend, not yet classified.
    PathsChanged(Vec<PathBuf>),
    /// The browsed directory (or its parent) changed.
    DirectoryChanged(PathBuf),
    /// A watched file of an explicit list changed or disappeared.
    FileChanged(PathBuf),
    /// An animation ticker wants the next frame shown.
    FrameAdvance { ticket: u64 },
    /// The watcher backend reported an error.
    WatchError(String),
}
