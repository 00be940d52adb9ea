//! Playback of multi-frame pictures.
//!
//! An [`Animation`] owns its frames and, while running, a [`FrameTicker`]
//! thread that posts [`SessionEvent::FrameAdvance`] into the session queue.
//! The session applies those events on its own thread, so the frame index
//! is only ever touched from one place.

use crate::events::SessionEvent;
use crate::image_loader::AnimationFrame;
use crossbeam_channel::{RecvTimeoutError, Sender};
use image::RgbaImage;
use log::{debug, warn};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;

static NEXT_TICKET: AtomicU64 = AtomicU64::new(1);

/// Playback state of the current picture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    /// No animation, or one that has not been started.
    NotRunning,
    Running,
    Paused,
}

/// Background thread that wakes up after each frame delay.
///
/// Dropping the ticker stops the thread and waits for it, so no event is
/// sent after the drop returns.
pub struct FrameTicker {
    ticket: u64,
    stop: Option<Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl FrameTicker {
    /// Spawns a ticker that starts timing `delays[start]`.
    pub fn spawn(delays: Vec<Duration>, start: usize, events: Sender<SessionEvent>) -> Self {
        let ticket = NEXT_TICKET.fetch_add(1, Ordering::Relaxed);
        let (stop_tx, stop_rx) = crossbeam_channel::bounded::<()>(0);

        let spawned = thread::Builder::new()
            .name(format!("frame-ticker-{}", ticket))
            .spawn(move || {
                if delays.is_empty() {
                    return;
                }
                let mut index = start % delays.len();
                loop {
                    match stop_rx.recv_timeout(delays[index]) {
                        Err(RecvTimeoutError::Timeout) => {
                            index = (index + 1) % delays.len();
                            if events.send(SessionEvent::FrameAdvance { ticket }).is_err() {
                                break;
                            }
                        }
                        _ => break,
                    }
                }
            });

        let handle = match spawned {
            Ok(handle) => Some(handle),
            Err(e) => {
                warn!("Failed to spawn frame ticker, animation will not advance: {}", e);
                None
            }
        };

        Self {
            ticket,
            stop: Some(stop_tx),
            handle,
        }
    }

    pub fn ticket(&self) -> u64 {
        self.ticket
    }
}

impl Drop for FrameTicker {
    fn drop(&mut self) {
        // Disconnecting the stop channel wakes the thread immediately.
        self.stop.take();
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                warn!("Frame ticker {} panicked", self.ticket);
            }
        }
    }
}

/// An owned animation with its playback state.
pub struct Animation {
    ticker: Option<FrameTicker>,
    frames: Vec<AnimationFrame>,
    current: usize,
    state: PlaybackState,
    /// Paused because the view is hidden; resume when shown again.
    resume_on_show: bool,
    events: Sender<SessionEvent>,
}

impl Animation {
    pub fn new(frames: Vec<AnimationFrame>, events: Sender<SessionEvent>) -> Self {
        Self {
            ticker: None,
            frames,
            current: 0,
            state: PlaybackState::NotRunning,
            resume_on_show: false,
            events,
        }
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn current_frame(&self) -> Option<Arc<RgbaImage>> {
        self.frames.get(self.current).map(|frame| frame.image.clone())
    }

    /// Starts playback, either running or immediately paused.
    pub fn start(&mut self, paused: bool) {
        if paused {
            self.state = PlaybackState::Paused;
        } else {
            self.run();
        }
    }

    fn run(&mut self) {
        let delays = self.frames.iter().map(|frame| frame.delay).collect();
        self.ticker = Some(FrameTicker::spawn(delays, self.current, self.events.clone()));
        self.state = PlaybackState::Running;
    }

    fn pause(&mut self) {
        self.ticker = None;
        self.state = PlaybackState::Paused;
    }

    /// Flips Running and Paused. Does nothing when not running.
    pub fn toggle_pause(&mut self) {
        match self.state {
            PlaybackState::Running => self.pause(),
            PlaybackState::Paused => {
                self.resume_on_show = false;
                self.run();
            }
            PlaybackState::NotRunning => {}
        }
    }

    /// Running: pause without advancing. Paused: show the next frame.
    /// Returns the frame to display when one was advanced.
    pub fn step_frame(&mut self) -> Option<Arc<RgbaImage>> {
        match self.state {
            PlaybackState::Running => {
                self.pause();
                None
            }
            PlaybackState::Paused => self.advance(),
            PlaybackState::NotRunning => None,
        }
    }

    /// Applies a tick from the ticker identified by `ticket`. Ticks from any
    /// other ticker are stale and ignored.
    pub fn on_tick(&mut self, ticket: u64) -> Option<Arc<RgbaImage>> {
        let active = self.ticker.as_ref().map(FrameTicker::ticket);
        if self.state != PlaybackState::Running || active != Some(ticket) {
            debug!("Ignoring stale frame tick {}", ticket);
            return None;
        }
        self.advance()
    }

    fn advance(&mut self) -> Option<Arc<RgbaImage>> {
        if self.frames.is_empty() {
            return None;
        }
        self.current = (self.current + 1) % self.frames.len();
        self.current_frame()
    }

    /// Pauses for a hidden view, remembering whether to resume later.
    pub fn hide(&mut self) {
        if self.state == PlaybackState::Running {
            self.pause();
            self.resume_on_show = true;
        }
    }

    /// Undoes [`Animation::hide`]; a pause chosen while hidden is kept.
    pub fn show(&mut self) {
        if self.resume_on_show && self.state == PlaybackState::Paused {
            self.run();
        }
        self.resume_on_show = false;
    }

    /// Marks a freshly started, paused animation to run once shown.
    pub(crate) fn resume_when_shown(&mut self) {
        self.resume_on_show = self.state == PlaybackState::Paused;
    }

    /// Stops the ticker for good.
    pub fn stop(&mut self) {
        self.ticker = None;
        self.state = PlaybackState::NotRunning;
        self.resume_on_show = false;
    }
}

impl Drop for Animation {
    fn drop(&mut self) {
        self.stop();
    }
}
