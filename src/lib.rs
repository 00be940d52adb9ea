//! Picture-session manager for an image viewer.
//!
//! Tracks which picture is shown, which pictures are nearby, and what
//! happens when the filesystem changes underneath. The entry point is
//! [`services::SessionService`].

pub mod animation;
pub mod config;
pub mod error;
pub mod events;
pub mod file_utils;
pub mod image_cache;
pub mod image_loader;
pub mod metadata;
pub mod services;
pub mod startup;
pub mod state;
pub mod ui;

pub use animation::PlaybackState;
pub use config::Settings;
pub use error::{Result, SessionError};
pub use events::SessionEvent;
pub use metadata::AttributeReport;
pub use services::{Collaborators, SessionService};
pub use state::{CandidateList, Mode};
