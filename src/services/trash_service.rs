//! Service for moving pictures to the trash.

use crate::error::Result;
use std::path::Path;

/// OS integration for removing a file the user asked to delete.
pub trait TrashService {
    fn move_to_trash(&self, path: &Path) -> Result<()>;
}

/// [`TrashService`] using the platform trash via the `trash` crate.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemTrash;

impl TrashService for SystemTrash {
    fn move_to_trash(&self, path: &Path) -> Result<()> {
        trash::delete(path)?;
        Ok(())
    }
}
