//! Notifications from the session to whatever draws the picture.

use image::RgbaImage;
use log::{debug, error, info};
use std::path::Path;

/// Receives what the session wants on screen. Purely observational: nothing
/// here feeds back into session state.
pub trait DisplaySink {
    /// A new picture, or a new animation frame, is ready. `None` clears the view.
    fn on_image_ready(&mut self, path: Option<&Path>, image: Option<&RgbaImage>);

    /// The shown file changed. Empty when nothing is shown.
    fn on_name_changed(&mut self, name: &str);

    /// Something went wrong that the user should see.
    fn on_error(&mut self, message: &str);
}

/// Asks the user before a file is moved to the trash.
pub trait ConfirmDelete {
    fn confirm_delete(&mut self, name: &str) -> bool;
}

/// Confirms every deletion.
#[derive(Debug, Default, Clone, Copy)]
pub struct AlwaysConfirm;

impl ConfirmDelete for AlwaysConfirm {
    fn confirm_delete(&mut self, _name: &str) -> bool {
        true
    }
}

/// Sink for the terminal front-end: names go to stdout, the rest to the log.
#[derive(Debug, Default)]
pub struct LogDisplaySink {
    frames_shown: u64,
}

impl LogDisplaySink {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DisplaySink for LogDisplaySink {
    fn on_image_ready(&mut self, path: Option<&Path>, image: Option<&RgbaImage>) {
        self.frames_shown += 1;
        match (path, image) {
            (Some(path), Some(image)) => debug!(
                "Frame #{}: {} ({}x{})",
                self.frames_shown,
                path.display(),
                image.width(),
                image.height()
            ),
            _ => debug!("Frame #{}: nothing to show", self.frames_shown),
        }
    }

    fn on_name_changed(&mut self, name: &str) {
        if name.is_empty() {
            info!("No file");
            println!("[no file]");
        } else {
            info!("Showing {}", name);
            println!("[{}]", name);
        }
    }

    fn on_error(&mut self, message: &str) {
        error!("{}", message);
    }
}
