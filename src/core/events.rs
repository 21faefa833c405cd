//! Messages connecting the dispatcher to the rest of the app.
//!
//! - Input -> dispatcher: [`CommandInputEvent`]
//! - Dispatcher -> output: [`CommandOutputEvent`]

use bevy::prelude::*;

/// Raw input submitted for dispatch.
///
/// # Examples
///
/// ```ignore
/// fn submit(mut inputs: MessageWriter<CommandInputEvent>) {
///     inputs.write(CommandInputEvent::from_sender("alice", "/remindme lunch 12:00"));
/// }
/// ```
#[derive(Message, Debug, Clone)]
pub struct CommandInputEvent {
    /// The raw input, prefix included.
    pub input: String,
    /// Who typed it. `None` for the local console.
    pub sender: Option<String>,
}

impl CommandInputEvent {
    pub fn new(input: impl Into<String>) -> Self {
        Self {
            input: input.into(),
            sender: None,
        }
    }

    pub fn from_sender(sender: impl Into<String>, input: impl Into<String>) -> Self {
        Self {
            input: input.into(),
            sender: Some(sender.into()),
        }
    }
}

/// Text produced while handling input.
#[derive(Message, Debug, Clone, PartialEq)]
pub struct CommandOutputEvent {
    pub message: String,
    pub level: CommandOutputLevel,
    /// The sender of the input this answers, if any.
    pub sender: Option<String>,
}

/// Output category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CommandOutputLevel {
    #[default]
    Info,
    Warn,
    Error,
    /// Echo of the input being handled.
    Command,
    /// A handler's reply.
    Result,
}

impl CommandOutputEvent {
    pub fn new(level: CommandOutputLevel, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            level,
            sender: None,
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(CommandOutputLevel::Info, message)
    }

    pub fn warn(message: impl Into<String>) -> Self {
        Self::new(CommandOutputLevel::Warn, message)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(CommandOutputLevel::Error, message)
    }

    pub fn command(message: impl Into<String>) -> Self {
        Self::new(CommandOutputLevel::Command, message)
    }

    pub fn result(message: impl Into<String>) -> Self {
        Self::new(CommandOutputLevel::Result, message)
    }

    /// Address the output to a sender.
    pub fn to_sender(mut self, sender: Option<String>) -> Self {
        self.sender = sender;
        self
    }
}

/// Registers the command messages.
pub struct CommandEventsPlugin;

impl Plugin for CommandEventsPlugin {
    fn build(&self, app: &mut App) {
        app.add_message::<CommandInputEvent>()
            .add_message::<CommandOutputEvent>();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_input_event() {
        let event = CommandInputEvent::from_sender("alice", "/ping");
        assert_eq!(event.input, "/ping");
        assert_eq!(event.sender.as_deref(), Some("alice"));
        assert!(CommandInputEvent::new("/ping").sender.is_none());
    }

    #[test]
    fn test_command_output_event() {
        let event = CommandOutputEvent::error("Something went wrong").to_sender(Some("bob".into()));
        assert_eq!(event.level, CommandOutputLevel::Error);
        assert_eq!(event.message, "Something went wrong");
        assert_eq!(event.sender.as_deref(), Some("bob"));
    }
}
