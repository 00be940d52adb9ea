//! The picture-session controller.
//!
//! Owns the candidate list, the watch set and the single cache entry, and
//! applies every mutation on the caller's thread. Watchers and animation
//! tickers feed [`SessionEvent`]s into one queue which the owner drains with
//! [`SessionService::process_pending_events`] or
//! [`SessionService::handle_event`], so notifications are never processed
//! concurrently with navigation.

use crate::animation::PlaybackState;
use crate::config::Settings;
use crate::error::SessionError;
use crate::events::SessionEvent;
use crate::file_utils::{self, PathExt};
use crate::image_cache::CacheEntry;
use crate::image_loader::{ImageDecoder, PictureDecoder};
use crate::metadata::AttributeReport;
use crate::services::trash_service::{SystemTrash, TrashService};
use crate::services::watch_service::{DebouncedWatchService, WatchService};
use crate::state::{CandidateList, Direction, Mode, Recovery, Session};
use crate::ui::{ConfirmDelete, DisplaySink};
use crossbeam_channel::{Receiver, Sender};
use log::{debug, error, info, warn};
use std::path::{Path, PathBuf};

/// External collaborators of a session.
pub struct Collaborators {
    pub decoder: Box<dyn PictureDecoder>,
    pub watcher: Box<dyn WatchService>,
    pub trash: Box<dyn TrashService>,
    pub sink: Box<dyn DisplaySink>,
    pub confirm: Box<dyn ConfirmDelete>,
}

impl Collaborators {
    /// The real codec, notify watcher and platform trash, reporting to `sink`.
    pub fn system(
        settings: &Settings,
        sink: Box<dyn DisplaySink>,
        confirm: Box<dyn ConfirmDelete>,
    ) -> Self {
        Self {
            decoder: Box::new(ImageDecoder::new()),
            watcher: Box::new(DebouncedWatchService::new(settings)),
            trash: Box::new(SystemTrash),
            sink,
            confirm,
        }
    }
}

/// Tracks which picture is shown and keeps that in step with the disk.
pub struct SessionService {
    settings: Settings,
    candidates: Option<CandidateList>,
    session: Session,
    watched: Vec<PathBuf>,
    visible: bool,
    decoder: Box<dyn PictureDecoder>,
    watcher: Box<dyn WatchService>,
    trash: Box<dyn TrashService>,
    sink: Box<dyn DisplaySink>,
    confirm: Box<dyn ConfirmDelete>,
    events_tx: Sender<SessionEvent>,
    events_rx: Receiver<SessionEvent>,
}

impl SessionService {
    /// Creates an idle session. A watcher that fails to start only disables
    /// automatic refresh.
    pub fn new(settings: Settings, collaborators: Collaborators) -> Self {
        let (events_tx, events_rx) = crossbeam_channel::unbounded();
        let Collaborators {
            decoder,
            mut watcher,
            trash,
            mut sink,
            confirm,
        } = collaborators;

        if let Err(e) = watcher.start(events_tx.clone()) {
            warn!("Auto refresh disabled: {}", e);
            sink.on_error(&e.to_string());
        }

        Self {
            settings,
            candidates: None,
            session: Session::new(),
            watched: Vec::new(),
            visible: true,
            decoder,
            watcher,
            trash,
            sink,
            confirm,
            events_tx,
            events_rx,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn current_path(&self) -> Option<&Path> {
        self.session.current_path()
    }

    pub fn display_name(&self) -> &str {
        self.session.display_name()
    }

    pub fn mode(&self) -> Option<Mode> {
        self.candidates.as_ref().map(CandidateList::mode)
    }

    pub fn candidates(&self) -> Option<&CandidateList> {
        self.candidates.as_ref()
    }

    pub fn current_index(&self) -> Option<usize> {
        self.candidates.as_ref().and_then(CandidateList::current_index)
    }

    pub fn cache(&self) -> &CacheEntry {
        self.session.cache()
    }

    pub fn has_picture(&self) -> bool {
        self.session.cache().has_image()
    }

    pub fn playback_state(&self) -> PlaybackState {
        self.session.cache().playback_state()
    }

    pub fn watched_paths(&self) -> &[PathBuf] {
        &self.watched
    }

    /// Sender for feeding events from other sources into this session.
    pub fn event_sender(&self) -> Sender<SessionEvent> {
        self.events_tx.clone()
    }

    /// Receiver for owners that multiplex the queue with other inputs.
    /// Events taken from it must be passed to [`SessionService::handle_event`].
    pub fn event_receiver(&self) -> Receiver<SessionEvent> {
        self.events_rx.clone()
    }

    /// Opens one file and browses the directory containing it.
    pub fn open_path(&mut self, path: &Path) {
        info!("Opening {}", path.format_for_log());
        let list = CandidateList::for_directory(path);
        let targets = list.watch_targets();
        self.candidates = Some(list);

        // Load the requested path itself so a non-picture still reports an error.
        self.load_path(path);
        self.rewatch(targets);
    }

    /// Opens a caller-ordered list of files. A single path behaves like
    /// [`SessionService::open_path`]; an empty list is ignored.
    pub fn open_explicit_list(&mut self, paths: &[PathBuf]) {
        match paths {
            [] => {}
            [single] => self.open_path(single),
            _ => {
                info!("Opening explicit list of {} files", paths.len());
                let paths: Vec<PathBuf> =
                    paths.iter().map(|p| file_utils::normalize_path(p)).collect();
                let list = CandidateList::explicit(paths);
                let targets = list.watch_targets();
                self.candidates = Some(list);

                self.load_entry(0);
                self.rewatch(targets);
            }
        }
    }

    /// Shows the next picture, wrapping at the end. Returns the new current
    /// path, or `None` when there is nothing to navigate.
    pub fn next(&mut self) -> Option<PathBuf> {
        self.navigate(Direction::Next)
    }

    /// Shows the previous picture, wrapping at the start.
    pub fn previous(&mut self) -> Option<PathBuf> {
        self.navigate(Direction::Previous)
    }

    fn navigate(&mut self, direction: Direction) -> Option<PathBuf> {
        if self.session.current_path().is_none() {
            debug!("No current file, ignoring {:?}", direction);
            return None;
        }

        let list = self.candidates.as_mut()?;
        let index = list.step(direction)?;
        let path = list.path_at(index)?;
        self.load_path(&path);
        self.session.current_path().map(Path::to_path_buf)
    }

    fn load_entry(&mut self, index: usize) {
        let Some(path) = self.candidates.as_ref().and_then(|list| list.path_at(index)) else {
            return;
        };
        self.load_path(&path);
    }

    /// Decodes `path` into a fresh cache entry unless it is already shown.
    fn load_path(&mut self, path: &Path) {
        let path = file_utils::normalize_path(path);
        if self.session.current_path() == Some(path.as_path()) {
            debug!("Already showing {}, skipping reload", path.format_for_log());
            return;
        }

        // Old entry (and its ticker) must be gone before decoding starts.
        self.session.release_cache();

        let (entry, failure) = match self.decoder.decode(&path) {
            Ok(decoded) => {
                let mut entry = CacheEntry::from_decoded(path.clone(), decoded, self.events_tx.clone());
                self.start_animation(&mut entry);
                (entry, None)
            }
            Err(e) => {
                error!("Failed to load {}: {}", path.format_for_log(), e);
                (CacheEntry::failed(path.clone()), Some(e))
            }
        };

        self.session.install(path, entry);

        let cache = self.session.cache();
        self.sink
            .on_image_ready(cache.path(), cache.image().map(|image| &**image));
        if failure.is_some() {
            if let Some(path) = self.session.current_path() {
                self.sink
                    .on_error(&format!("Cannot load picture:\n'{}'.", path.display()));
            }
        }
        self.sink.on_name_changed(self.session.display_name());
    }

    fn start_animation(&self, entry: &mut CacheEntry) {
        let Some(animation) = entry.animation_mut() else {
            return;
        };
        let paused = self.settings.pause_animations || !self.visible;
        animation.start(paused);
        if !self.visible && !self.settings.pause_animations {
            animation.resume_when_shown();
        }
    }

    /// Clears the current path and shows nothing.
    fn show_no_picture(&mut self) {
        info!("No picture left to show");
        self.session.clear();
        self.sink.on_image_ready(None, None);
        self.sink.on_name_changed("");
    }

    fn rewatch(&mut self, targets: Vec<PathBuf>) {
        if !self.watched.is_empty() {
            if let Err(e) = self.watcher.unwatch(&self.watched) {
                debug!("Unwatch failed: {}", e);
            }
        }

        self.watched = targets;
        if let Err(e) = self.watcher.watch(&self.watched) {
            warn!("Auto refresh degraded: {}", e);
            self.sink.on_error(&e.to_string());
        }
    }

    /// Drains every queued event. Returns how many were handled.
    pub fn process_pending_events(&mut self) -> usize {
        let mut handled = 0;
        while let Ok(event) = self.events_rx.try_recv() {
            self.handle_event(event);
            handled += 1;
        }
        handled
    }

    /// Applies one event to the session.
    pub fn handle_event(&mut self, event: SessionEvent) {
        match event {
            SessionEvent::PathsChanged(paths) => self.on_paths_changed(paths),
            SessionEvent::DirectoryChanged(directory) => self.on_directory_changed(&directory),
            SessionEvent::FileChanged(path) => self.on_file_changed(&path),
            SessionEvent::FrameAdvance { ticket } => self.on_frame_advance(ticket),
            SessionEvent::WatchError(message) => warn!("File watcher error: {}", message),
        }
    }

    /// Classifies raw watcher paths against the current watch set.
    fn on_paths_changed(&mut self, paths: Vec<PathBuf>) {
        let Some(list) = &self.candidates else {
            return;
        };

        match list {
            CandidateList::Directory { directory, .. } => {
                let touches_directory = paths.iter().any(|path| {
                    path == directory
                        || (path.parent() == Some(directory.as_path())
                            && file_utils::is_supported_image(path))
                });
                if touches_directory {
                    let directory = directory.clone();
                    self.on_directory_changed(&directory);
                }
            }
            CandidateList::Explicit { .. } => {
                let mut changed: Vec<PathBuf> = paths
                    .into_iter()
                    .filter(|path| self.watched.contains(path))
                    .collect();
                changed.dedup();
                for path in changed {
                    self.on_file_changed(&path);
                }
            }
        }
    }

    /// Rescans the browsed directory and recovers the current position.
    /// `directory` is the watched path that fired: the browsed directory
    /// or its parent, which reports renames and removal of the former.
    fn on_directory_changed(&mut self, directory: &Path) {
        let anchor = self.session.current_path().map(Path::to_path_buf);
        let Some(list) = self.candidates.as_mut() else {
            return;
        };
        let related =
            list.directory() == Some(directory) || self.watched.iter().any(|w| w == directory);
        if list.mode() != Mode::DirectoryScoped || !related {
            debug!("Ignoring change of unrelated {}", directory.format_for_log());
            return;
        }

        let old_index = list.current_index();
        list.rebuild_for_directory(anchor.as_deref());
        let recovery = list.recover_index(old_index);
        self.apply_recovery(recovery);
    }

    /// Repairs an explicit list after one of its files changed.
    fn on_file_changed(&mut self, path: &Path) {
        let anchor = self.session.current_path().map(Path::to_path_buf);
        let Some(list) = self.candidates.as_mut() else {
            return;
        };
        if list.mode() != Mode::ExplicitList {
            return;
        }

        let old_index = list.current_index();
        list.repair_explicit_list(path, anchor.as_deref());
        let recovery = list.recover_index(old_index);
        self.apply_recovery(recovery);
    }

    fn apply_recovery(&mut self, recovery: Recovery) {
        match recovery {
            Recovery::Unchanged(index) => {
                debug!("Current entry still at index {}", index);
                self.load_entry(index);
            }
            Recovery::Moved(index) => {
                if let Some(vanished) = self.vanished_current() {
                    info!("{}, moving to index {}", vanished, index);
                }
                self.load_entry(index);
            }
            Recovery::Empty => {
                if let Some(vanished) = self.vanished_current() {
                    info!("{}, nothing left to show", vanished);
                }
                self.show_no_picture();
            }
        }
    }

    fn vanished_current(&self) -> Option<SessionError> {
        self.session
            .current_path()
            .filter(|path| !path.exists())
            .map(|path| SessionError::PathVanished(path.to_path_buf()))
    }

    fn on_frame_advance(&mut self, ticket: u64) {
        let cache = self.session.cache_mut();
        let Some(animation) = cache.animation_mut() else {
            debug!("Frame tick {} without animation", ticket);
            return;
        };
        let Some(frame) = animation.on_tick(ticket) else {
            return;
        };
        cache.set_frame(frame.clone());
        self.sink.on_image_ready(cache.path(), Some(&*frame));
    }

    /// Flips between running and paused. Returns the resulting state.
    pub fn toggle_pause(&mut self) -> PlaybackState {
        if let Some(animation) = self.session.cache_mut().animation_mut() {
            animation.toggle_pause();
        }
        self.playback_state()
    }

    /// Pauses a running animation, or shows the next frame of a paused one.
    pub fn step_frame(&mut self) -> PlaybackState {
        let cache = self.session.cache_mut();
        if let Some(frame) = cache.animation_mut().and_then(|a| a.step_frame()) {
            cache.set_frame(frame.clone());
            self.sink.on_image_ready(cache.path(), Some(&*frame));
        }
        self.playback_state()
    }

    /// Tells the session whether its view is on screen. Hidden views keep
    /// animations paused until shown again.
    pub fn set_visible(&mut self, visible: bool) {
        if self.visible == visible {
            return;
        }
        self.visible = visible;
        if let Some(animation) = self.session.cache_mut().animation_mut() {
            if visible {
                animation.show();
            } else {
                animation.hide();
            }
        }
    }

    /// Moves the current file to the trash. When `ask` is set the
    /// confirmation collaborator decides first.
    ///
    /// The list is not touched here: the removal comes back through the
    /// watcher like any other change. Returns whether the trash was asked
    /// to remove the file.
    pub fn delete_current(&mut self, ask: bool) -> bool {
        let Some(path) = self.session.current_path().map(Path::to_path_buf) else {
            return false;
        };
        if !path.exists() {
            debug!("{} already gone, nothing to delete", path.format_for_log());
            return false;
        }
        if ask && !self.confirm.confirm_delete(self.session.display_name()) {
            return false;
        }

        // The decoder must not hold the file open while it is removed.
        self.session.cache_mut().release_animation();

        match self.trash.move_to_trash(&path) {
            Ok(()) => info!("Moved {} to trash", path.format_for_log()),
            Err(e) => {
                error!("Failed to trash {}: {}", path.format_for_log(), e);
                self.sink.on_error(&format!(
                    "Delete file '{}' failed: {}",
                    self.session.display_name(),
                    e
                ));
            }
        }
        true
    }

    /// Read-only summary of the current file and picture. `scale` is the
    /// zoom factor of the display layer.
    pub fn attribute_report(&self, scale: f64) -> AttributeReport {
        AttributeReport::collect(
            self.session.current_path(),
            self.session.display_name(),
            self.session.cache(),
            scale,
        )
    }
}
