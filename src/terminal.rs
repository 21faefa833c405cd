//! Terminal backend for headless/dedicated servers.
//!
//! Reads command input from stdin and prints command output to stdout.

use std::io::{self, BufRead, Write};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Mutex, PoisonError};
use std::thread::{self, JoinHandle};

use bevy::prelude::*;

use crate::core::{CommandInputEvent, CommandOutputEvent, CommandOutputLevel};

/// Plugin that feeds stdin lines to the dispatcher and prints its output.
pub struct TerminalPlugin;

impl Plugin for TerminalPlugin {
    fn build(&self, app: &mut App) {
        let (sender, receiver) = mpsc::channel();
        let _handle = spawn_stdin_reader(sender);

        app.insert_resource(StdinReceiver(Mutex::new(receiver)))
            .init_resource::<TerminalConfig>()
            .add_systems(PreUpdate, read_stdin)
            .add_systems(PostUpdate, write_stdout);
    }
}

/// Configuration for terminal behavior.
#[derive(Resource, Debug, Clone)]
pub struct TerminalConfig {
    /// Whether to use colored output (ANSI escape codes).
    pub colored: bool,
    /// Print the echo of each input line.
    pub show_echo: bool,
}

impl Default for TerminalConfig {
    fn default() -> Self {
        // The input is already visible on the terminal
        Self {
            colored: false,
            show_echo: false,
        }
    }
}

#[derive(Resource)]
struct StdinReceiver(Mutex<Receiver<String>>);

fn spawn_stdin_reader(sender: Sender<String>) -> JoinHandle<()> {
    thread::spawn(move || {
        let stdin = io::stdin();
        let handle = stdin.lock();

        for line in handle.lines().map_while(Result::ok) {
            let text = line.trim().to_string();
            if !text.is_empty() && sender.send(text).is_err() {
                break;
            }
        }
        debug!("stdin closed, terminal input stopped");
    })
}

fn read_stdin(receiver: Res<StdinReceiver>, mut events: MessageWriter<CommandInputEvent>) {
    let rx = receiver.0.lock().unwrap_or_else(PoisonError::into_inner);
    while let Ok(line) = rx.try_recv() {
        events.write(CommandInputEvent::new(line));
    }
}

fn write_stdout(mut events: MessageReader<CommandOutputEvent>, config: Res<TerminalConfig>) {
    let mut stdout = io::stdout().lock();
    for event in events.read() {
        if event.level == CommandOutputLevel::Command && !config.show_echo {
            continue;
        }
        let written = if config.colored {
            writeln!(stdout, "{}{}\x1b[0m", color(event.level), event.message)
        } else {
            writeln!(stdout, "{}", event.message)
        };
        if let Err(error) = written.and_then(|()| stdout.flush()) {
            warn!("Failed to write command output: {}", error);
            return;
        }
    }
}

fn color(level: CommandOutputLevel) -> &'static str {
    match level {
        CommandOutputLevel::Info => "\x1b[0m",
        CommandOutputLevel::Warn => "\x1b[33m",
        CommandOutputLevel::Error => "\x1b[31m",
        CommandOutputLevel::Command => "\x1b[36m",
        CommandOutputLevel::Result => "\x1b[32m",
    }
}
