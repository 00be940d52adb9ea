//! Service for watching the paths a session depends on.
//!
//! The backend runs on notify's own thread; it only forwards debounced
//! paths into the session queue and never touches session state.

use crate::config::{Settings, WatchBackend};
use crate::error::{Result, SessionError};
use crate::events::SessionEvent;
use crate::file_utils::PathExt;
use crossbeam_channel::Sender;
use log::{debug, warn};
use notify::{PollWatcher, RecommendedWatcher, RecursiveMode, Watcher};
use notify_debouncer_mini::{new_debouncer_opt, Config, DebounceEventResult, Debouncer};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Subscribes paths for change notification.
pub trait WatchService {
    /// Connects the service to the session queue. Called once.
    fn start(&mut self, events: Sender<SessionEvent>) -> Result<()>;

    /// Subscribes every path, continuing past failures.
    fn watch(&mut self, paths: &[PathBuf]) -> Result<()>;

    /// Unsubscribes every path, continuing past failures.
    fn unwatch(&mut self, paths: &[PathBuf]) -> Result<()>;
}

fn is_temporary_file(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("tmp"))
}

/// Forwards one debounced batch into the session queue.
fn handle_debounced_events(result: DebounceEventResult, events: &Sender<SessionEvent>) {
    let event = match result {
        Ok(batch) => {
            if batch.is_empty() {
                return;
            }
            debug!("Debounced file system events: {} events", batch.len());
            for event in &batch {
                debug!("  - {:?} for {}", event.kind, event.path.format_for_log());
            }
            SessionEvent::PathsChanged(batch.into_iter().map(|event| event.path).collect())
        }
        Err(error) => {
            // Editors and downloaders churn through `.tmp` files next to pictures.
            if error.paths.iter().any(|path| is_temporary_file(path)) {
                debug!("Ignoring watcher error for temporary file: {}", error);
                return;
            }
            SessionEvent::WatchError(error.to_string())
        }
    };

    if events.send(event).is_err() {
        debug!("Session queue closed, dropping watch event");
    }
}

enum Backend {
    Poll(Debouncer<PollWatcher>),
    Native(Debouncer<RecommendedWatcher>),
}

impl Backend {
    fn watcher(&mut self) -> &mut dyn Watcher {
        match self {
            Backend::Poll(debouncer) => debouncer.watcher(),
            Backend::Native(debouncer) => debouncer.watcher(),
        }
    }
}

/// [`WatchService`] backed by `notify` with a debouncer in front.
pub struct DebouncedWatchService {
    backend_kind: WatchBackend,
    debounce: Duration,
    poll_interval: Duration,
    backend: Option<Backend>,
}

impl DebouncedWatchService {
    pub fn new(settings: &Settings) -> Self {
        Self {
            backend_kind: settings.watch_backend,
            debounce: Duration::from_millis(settings.watch_debounce_ms),
            poll_interval: Duration::from_millis(settings.watch_poll_interval_ms),
            backend: None,
        }
    }

    fn backend(&mut self) -> Result<&mut Backend> {
        self.backend.as_mut().ok_or_else(|| {
            SessionError::WatchSubscription("watch service not started".to_string())
        })
    }
}

fn apply_to_all<F>(paths: &[PathBuf], mut op: F) -> Result<()>
where
    F: FnMut(&PathBuf) -> notify::Result<()>,
{
    let failures: Vec<String> = paths
        .iter()
        .filter_map(|path| {
            op(path)
                .err()
                .map(|e| format!("{}: {}", path.format_for_log(), e))
        })
        .collect();

    if failures.is_empty() {
        Ok(())
    } else {
        Err(SessionError::WatchSubscription(failures.join("; ")))
    }
}

impl WatchService for DebouncedWatchService {
    fn start(&mut self, events: Sender<SessionEvent>) -> Result<()> {
        let notify_config = notify::Config::default().with_poll_interval(self.poll_interval);
        let debouncer_config = Config::default()
            .with_timeout(self.debounce)
            .with_notify_config(notify_config);

        let handler = move |res: DebounceEventResult| handle_debounced_events(res, &events);

        let backend = match self.backend_kind {
            WatchBackend::Poll => {
                Backend::Poll(new_debouncer_opt::<_, PollWatcher>(debouncer_config, handler)?)
            }
            WatchBackend::Native => Backend::Native(new_debouncer_opt::<_, RecommendedWatcher>(
                debouncer_config,
                handler,
            )?),
        };

        debug!("Watch service started ({:?})", self.backend_kind);
        self.backend = Some(backend);
        Ok(())
    }

    fn watch(&mut self, paths: &[PathBuf]) -> Result<()> {
        let watcher = self.backend()?.watcher();
        apply_to_all(paths, |path| {
            debug!("Watching {}", path.format_for_log());
            watcher.watch(path, RecursiveMode::NonRecursive)
        })
    }

    fn unwatch(&mut self, paths: &[PathBuf]) -> Result<()> {
        let watcher = self.backend()?.watcher();
        apply_to_all(paths, |path| {
            debug!("Unwatching {}", path.format_for_log());
            watcher.unwatch(path)
        })
        .inspect_err(|e| warn!("{}", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn watching_before_start_fails_softly() {
        let mut service = DebouncedWatchService::new(&Settings::default());
        let err = service.watch(&[PathBuf::from("/tmp")]).unwrap_err();
        assert!(matches!(err, SessionError::WatchSubscription(_)));
    }

    #[test]
    fn missing_path_is_reported_but_others_are_watched() {
        let dir = tempfile::tempdir().unwrap();
        let (tx, _rx) = crossbeam_channel::unbounded();
        let settings = Settings {
            watch_backend: WatchBackend::Native,
            ..Settings::default()
        };
        let mut service = DebouncedWatchService::new(&settings);
        service.start(tx).unwrap();

        let result = service.watch(&[
            dir.path().to_path_buf(),
            dir.path().join("does-not-exist"),
        ]);
        let Err(SessionError::WatchSubscription(msg)) = result else {
            panic!("expected a subscription error");
        };
        assert!(msg.contains("does-not-exist"));
    }

    #[test]
    fn errors_for_temporary_files_are_dropped() {
        let (tx, rx) = crossbeam_channel::unbounded();
        let error = notify::Error::generic("gone").add_path(PathBuf::from("/pictures/a.png.tmp"));
        handle_debounced_events(Err(error), &tx);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn errors_under_tmp_directories_are_forwarded() {
        let (tx, rx) = crossbeam_channel::unbounded();
        let error =
            notify::Error::generic("gone").add_path(PathBuf::from("/tmp/.tmpA1b2/picture.png"));
        handle_debounced_events(Err(error), &tx);
        assert!(matches!(rx.try_recv(), Ok(SessionEvent::WatchError(_))));
    }

    #[test]
    fn empty_batches_are_not_forwarded() {
        let (tx, rx) = crossbeam_channel::unbounded();
        handle_debounced_events(Ok(Vec::new()), &tx);
        assert!(rx.try_recv().is_err());
    }
}
