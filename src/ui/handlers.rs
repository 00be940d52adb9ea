//! Command handlers for the terminal front-end.
//!
//! Maps stdin commands (next, prev, pause, ...) onto session operations and
//! interleaves them with queued session events on the main thread.

use crate::file_utils::PathExt;
use crate::services::SessionService;
use crate::ui::ConfirmDelete;
use crossbeam_channel::{select, unbounded, Receiver};
use log::{debug, warn};
use std::io::{BufRead, Write};
use std::path::PathBuf;

/// One line of user input.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Next,
    Previous,
    TogglePause,
    StepFrame,
    /// `ask` is false for the forced variant.
    Delete { ask: bool },
    Info,
    Open(Vec<PathBuf>),
    Hide,
    Show,
    Quit,
}

impl Command {
    pub fn parse(line: &str) -> Option<Self> {
        let line = line.trim_end_matches(['\r', '\n']);
        if line == " " {
            return Some(Command::TogglePause);
        }

        let mut words = line.split_whitespace();
        let command = match words.next()? {
            "n" | "next" => Command::Next,
            "p" | "prev" | "previous" => Command::Previous,
            "pause" => Command::TogglePause,
            "s" | "step" => Command::StepFrame,
            "d" | "delete" => Command::Delete { ask: true },
            "D" => Command::Delete { ask: false },
            "i" | "info" => Command::Info,
            "hide" => Command::Hide,
            "show" => Command::Show,
            "q" | "quit" => Command::Quit,
            "o" | "open" => {
                let paths: Vec<PathBuf> = words.map(PathBuf::from).collect();
                if paths.is_empty() {
                    return None;
                }
                return Some(Command::Open(paths));
            }
            _ => return None,
        };
        Some(command)
    }
}

/// Reads stdin on a background thread, one message per line.
pub fn spawn_stdin_reader() -> Receiver<String> {
    let (tx, rx) = unbounded();
    let spawned = std::thread::Builder::new()
        .name("stdin-reader".into())
        .spawn(move || {
            for line in std::io::stdin().lock().lines() {
                let Ok(line) = line else { break };
                if tx.send(line).is_err() {
                    break;
                }
            }
        });
    if let Err(e) = spawned {
        warn!("Failed to start stdin reader: {}", e);
    }
    rx
}

/// Confirmation that waits for the next input line.
pub struct PromptConfirm {
    lines: Receiver<String>,
}

impl PromptConfirm {
    pub fn new(lines: Receiver<String>) -> Self {
        Self { lines }
    }
}

impl ConfirmDelete for PromptConfirm {
    fn confirm_delete(&mut self, name: &str) -> bool {
        print!("Are you sure to delete file '{}'? [y/N] ", name);
        let _ = std::io::stdout().flush();
        match self.lines.recv() {
            Ok(answer) => matches!(answer.trim(), "y" | "Y" | "yes"),
            Err(_) => false,
        }
    }
}

/// Applies one command. Returns false when the loop should stop.
pub fn apply_command(session: &mut SessionService, command: Command) -> bool {
    debug!("Command: {:?}", command);
    match command {
        Command::Next => {
            session.next();
        }
        Command::Previous => {
            session.previous();
        }
        Command::TogglePause => {
            let state = session.toggle_pause();
            debug!("Playback now {:?}", state);
        }
        Command::StepFrame => {
            session.step_frame();
        }
        Command::Delete { ask } => {
            let ask = ask && session.settings().confirm_delete;
            session.delete_current(ask);
        }
        Command::Info => {
            let report = session.attribute_report(1.0);
            if report.is_empty() {
                println!("(nothing shown)");
            } else {
                println!("{}", report);
            }
        }
        Command::Open(paths) => {
            for path in &paths {
                debug!("Open request for {}", path.format_for_log());
            }
            session.open_explicit_list(&paths);
        }
        Command::Hide => session.set_visible(false),
        Command::Show => session.set_visible(true),
        Command::Quit => return false,
    }
    true
}

/// Runs until `q` or end of input, multiplexing commands with session events.
pub fn run_command_loop(session: &mut SessionService, commands: Receiver<String>) {
    let events = session.event_receiver();
    loop {
        select! {
            recv(commands) -> line => {
                let Ok(line) = line else { break };
                match Command::parse(&line) {
                    Some(command) => {
                        if !apply_command(session, command) {
                            break;
                        }
                    }
                    None if line.trim().is_empty() => {}
                    None => warn!("Unknown command: {:?}", line),
                }
            }
            recv(events) -> event => {
                if let Ok(event) = event {
                    session.handle_event(event);
                }
            }
        }
    }
}
