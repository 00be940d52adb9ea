#![allow(dead_code)]

use image::RgbaImage;
use picture_session::config::Settings;
use picture_session::error::{Result, SessionError};
use picture_session::events::SessionEvent;
use picture_session::file_utils::{self, is_supported_image};
use picture_session::image_loader::{AnimationFrame, DecodedPicture, PictureDecoder};
use picture_session::services::{Collaborators, SessionService, TrashService, WatchService};
use picture_session::ui::{ConfirmDelete, DisplaySink};
use crossbeam_channel::Sender;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tempfile::TempDir;

/// Everything the fakes saw, in order.
#[derive(Debug, Default)]
pub struct Journal {
    pub decodes: Vec<PathBuf>,
    pub images: Vec<Option<PathBuf>>,
    pub names: Vec<String>,
    pub errors: Vec<String>,
    pub watch_calls: Vec<Vec<PathBuf>>,
    pub unwatch_calls: Vec<Vec<PathBuf>>,
    pub trashed: Vec<PathBuf>,
    pub confirm_requests: Vec<String>,
}

pub type SharedJournal = Arc<Mutex<Journal>>;

pub fn still(width: u32, height: u32) -> DecodedPicture {
    DecodedPicture::still(RgbaImage::new(width, height), "PNG")
}

pub fn animated(frames: usize, delay: Duration) -> DecodedPicture {
    let frames = (0..frames)
        .map(|i| AnimationFrame {
            image: Arc::new(RgbaImage::from_pixel(4, 4, image::Rgba([i as u8, 0, 0, 255]))),
            delay,
        })
        .collect();
    DecodedPicture::animated(frames, "GIF").expect("at least one frame")
}

/// Decodes by file name: `anim*` is a 3-frame animation, `empty*` is 0x0,
/// `broken*`, unsupported or missing files fail, anything else is 4x2.
pub struct FakeDecoder {
    journal: SharedJournal,
    frame_delay: Duration,
}

impl PictureDecoder for FakeDecoder {
    fn decode(&self, path: &Path) -> Result<DecodedPicture> {
        self.journal.lock().unwrap().decodes.push(path.to_path_buf());
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        if !path.is_file() || !is_supported_image(path) || name.contains("broken") {
            return Err(SessionError::DecodeFailure(format!("{}", path.display())));
        }
        if name.contains("anim") {
            return Ok(animated(3, self.frame_delay));
        }
        if name.contains("empty") {
            return Ok(still(0, 0));
        }
        Ok(still(4, 2))
    }
}

pub struct FakeWatcher {
    journal: SharedJournal,
    fail: bool,
}

impl WatchService for FakeWatcher {
    fn start(&mut self, _events: Sender<SessionEvent>) -> Result<()> {
        Ok(())
    }

    fn watch(&mut self, paths: &[PathBuf]) -> Result<()> {
        self.journal.lock().unwrap().watch_calls.push(paths.to_vec());
        if self.fail {
            return Err(SessionError::WatchSubscription("no inotify".to_string()));
        }
        Ok(())
    }

    fn unwatch(&mut self, paths: &[PathBuf]) -> Result<()> {
        self.journal.lock().unwrap().unwatch_calls.push(paths.to_vec());
        Ok(())
    }
}

/// Deletes for real so the following reconciliation sees the file gone.
pub struct FakeTrash {
    journal: SharedJournal,
    fail: bool,
}

impl TrashService for FakeTrash {
    fn move_to_trash(&self, path: &Path) -> Result<()> {
        if self.fail {
            return Err(SessionError::Trash("permission denied".to_string()));
        }
        std::fs::remove_file(path)?;
        self.journal.lock().unwrap().trashed.push(path.to_path_buf());
        Ok(())
    }
}

pub struct RecordingSink {
    journal: SharedJournal,
}

impl DisplaySink for RecordingSink {
    fn on_image_ready(&mut self, path: Option<&Path>, _image: Option<&RgbaImage>) {
        self.journal
            .lock()
            .unwrap()
            .images
            .push(path.map(Path::to_path_buf));
    }

    fn on_name_changed(&mut self, name: &str) {
        self.journal.lock().unwrap().names.push(name.to_string());
    }

    fn on_error(&mut self, message: &str) {
        self.journal.lock().unwrap().errors.push(message.to_string());
    }
}

pub struct ScriptedConfirm {
    journal: SharedJournal,
    answer: bool,
}

impl ConfirmDelete for ScriptedConfirm {
    fn confirm_delete(&mut self, name: &str) -> bool {
        self.journal
            .lock()
            .unwrap()
            .confirm_requests
            .push(name.to_string());
        self.answer
    }
}

pub struct Options {
    pub confirm: bool,
    pub trash_fails: bool,
    pub watch_fails: bool,
    pub frame_delay: Duration,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            confirm: true,
            trash_fails: false,
            watch_fails: false,
            frame_delay: Duration::from_secs(60),
        }
    }
}

/// A session over a temporary directory with recording fakes.
pub struct Harness {
    pub session: SessionService,
    pub journal: SharedJournal,
    pub dir: TempDir,
}

impl Harness {
    pub fn new() -> Self {
        Self::with(Settings::default(), Options::default())
    }

    pub fn with(settings: Settings, options: Options) -> Self {
        let journal = SharedJournal::default();
        let watcher = Box::new(FakeWatcher {
            journal: journal.clone(),
            fail: options.watch_fails,
        });
        Self::assemble(settings, options, journal, watcher)
    }

    /// Like [`Harness::with`], but with a real watch service.
    pub fn with_watcher(settings: Settings, watcher: Box<dyn WatchService>) -> Self {
        Self::assemble(settings, Options::default(), SharedJournal::default(), watcher)
    }

    fn assemble(
        settings: Settings,
        options: Options,
        journal: SharedJournal,
        watcher: Box<dyn WatchService>,
    ) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let collaborators = Collaborators {
            decoder: Box::new(FakeDecoder {
                journal: journal.clone(),
                frame_delay: options.frame_delay,
            }),
            watcher,
            trash: Box::new(FakeTrash {
                journal: journal.clone(),
                fail: options.trash_fails,
            }),
            sink: Box::new(RecordingSink {
                journal: journal.clone(),
            }),
            confirm: Box::new(ScriptedConfirm {
                journal: journal.clone(),
                answer: options.confirm,
            }),
        };

        Self {
            session: SessionService::new(settings, collaborators),
            journal,
            dir,
        }
    }

    /// Normalized absolute directory of the harness.
    pub fn directory(&self) -> PathBuf {
        file_utils::normalize_path(self.dir.path())
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.directory().join(name)
    }

    pub fn touch(&self, names: &[&str]) {
        for name in names {
            File::create(self.dir.path().join(name)).unwrap();
        }
    }

    pub fn remove(&self, name: &str) {
        std::fs::remove_file(self.dir.path().join(name)).unwrap();
    }

    pub fn current_name(&self) -> Option<String> {
        self.session
            .current_path()
            .and_then(Path::file_name)
            .map(|n| n.to_string_lossy().into_owned())
    }

    pub fn decode_count(&self) -> usize {
        self.journal.lock().unwrap().decodes.len()
    }

    pub fn last_name(&self) -> Option<String> {
        self.journal.lock().unwrap().names.last().cloned()
    }

    pub fn errors(&self) -> Vec<String> {
        self.journal.lock().unwrap().errors.clone()
    }

    /// Processes queued events until `done` holds or the timeout passes.
    pub fn pump_until<F>(&mut self, timeout: Duration, mut done: F) -> bool
    where
        F: FnMut(&Harness) -> bool,
    {
        let deadline = Instant::now() + timeout;
        while Instant::now() < deadline {
            self.session.process_pending_events();
            if done(&*self) {
                return true;
            }
            std::thread::sleep(Duration::from_millis(2));
        }
        false
    }
}
