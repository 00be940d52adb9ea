//! Display-facing side of the session.
//!
//! The session only talks to the screen through [`DisplaySink`] and asks
//! before deleting through [`ConfirmDelete`]. The terminal front-end wires
//! both to stdin/stdout in [`handlers`].
//!
//! Threading model:
//! - the session and every handler run on the main thread
//! - a reader thread turns stdin lines into commands
//! - watcher and frame-ticker threads only post events into the session queue

pub mod display_sink;
pub mod handlers;

pub use display_sink::{AlwaysConfirm, ConfirmDelete, DisplaySink, LogDisplaySink};
pub use handlers::{apply_command, run_command_loop, spawn_stdin_reader, Command, PromptConfirm};
