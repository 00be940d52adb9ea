//! The single decoded resource of a session.
//!
//! Exactly one [`CacheEntry`] is live at a time. Replacing it drops the old
//! one, and dropping stops the animation ticker before the bitmap goes, so
//! no frame tick can refer to a released entry.

use crate::animation::{Animation, PlaybackState};
use crate::events::SessionEvent;
use crate::image_loader::DecodedPicture;
use crossbeam_channel::Sender;
use image::RgbaImage;
use log::debug;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Decoded picture data for exactly one path.
#[derive(Default)]
pub struct CacheEntry {
    path: Option<PathBuf>,
    image: Option<Arc<RgbaImage>>,
    animation: Option<Animation>,
    format: String,
    bits_per_pixel: u16,
    frame_count: usize,
}

impl CacheEntry {
    /// An entry that shows nothing.
    pub fn empty() -> Self {
        Self::default()
    }

    /// An entry for a path that could not be decoded.
    pub fn failed(path: PathBuf) -> Self {
        Self {
            path: Some(path),
            image: None,
            animation: None,
            format: String::new(),
            bits_per_pixel: 0,
            frame_count: 0,
        }
    }

    /// Builds the entry for a freshly decoded picture. Animations are
    /// created stopped; the session starts them.
    pub fn from_decoded(
        path: PathBuf,
        decoded: DecodedPicture,
        events: Sender<SessionEvent>,
    ) -> Self {
        let DecodedPicture {
            image,
            frames,
            format,
            bits_per_pixel,
            frame_count,
        } = decoded;

        debug!(
            "Cache PUT: {} ({}x{}, {} frame(s))",
            path.display(),
            image.width(),
            image.height(),
            frame_count
        );

        Self {
            path: Some(path),
            image: Some(image),
            animation: frames.map(|frames| Animation::new(frames, events)),
            format,
            bits_per_pixel,
            frame_count,
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn image(&self) -> Option<&Arc<RgbaImage>> {
        self.image.as_ref()
    }

    pub fn has_image(&self) -> bool {
        self.image.is_some()
    }

    pub fn format(&self) -> &str {
        &self.format
    }

    pub fn bits_per_pixel(&self) -> u16 {
        self.bits_per_pixel
    }

    pub fn frame_count(&self) -> usize {
        self.frame_count
    }

    pub fn dimensions(&self) -> Option<(u32, u32)> {
        self.image.as_ref().map(|image| image.dimensions())
    }

    pub fn animation_mut(&mut self) -> Option<&mut Animation> {
        self.animation.as_mut()
    }

    pub fn playback_state(&self) -> PlaybackState {
        self.animation
            .as_ref()
            .map(Animation::state)
            .unwrap_or(PlaybackState::NotRunning)
    }

    /// Replaces the still image with the animation's current frame.
    pub fn set_frame(&mut self, frame: Arc<RgbaImage>) {
        self.image = Some(frame);
    }

    /// Stops and frees the animation, keeping the still frame.
    /// Used before the file is handed to the trash.
    pub fn release_animation(&mut self) {
        if let Some(mut animation) = self.animation.take() {
            animation.stop();
            debug!("Released animation for {:?}", self.path);
        }
    }
}

impl Drop for CacheEntry {
    fn drop(&mut self) {
        // Ticker first, then the bitmap.
        self.release_animation();
        self.image = None;
        if let Some(path) = &self.path {
            debug!("Cache RELEASE: {}", path.display());
        }
    }
}
