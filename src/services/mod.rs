//! Service layer for business logic.
//!
//! Separates session logic from its collaborators (codec, watcher, trash,
//! display) so each can be replaced in tests.

pub mod session_service;
pub mod trash_service;
pub mod watch_service;

pub use session_service::{Collaborators, SessionService};
pub use trash_service::{SystemTrash, TrashService};
pub use watch_service::{DebouncedWatchService, WatchService};
