//! Command dispatcher.
//!
//! Owns the top-level commands, resolves raw input to a command and reports
//! non-success results to a single error callback.

use std::sync::Arc;

use bevy::log::{debug, warn};

use super::{
    split_label, Command, CommandBuilder, CommandContext, CommandError, CommandResult,
    Identifier, ResultKind,
};

/// Receives every non-success result of [`Dispatcher::process_input`].
pub type ErrorCallback<C> = Arc<dyn Fn(&mut C, &CommandResult) + Send + Sync>;

/// Maps a result kind to user-facing text.
pub type Translator<C> = Arc<dyn Fn(&C, ResultKind) -> String + Send + Sync>;

/// The default prefix raw input must start with.
pub const DEFAULT_PREFIX: &str = "/";

/// Command dispatcher for a context type `C`.
///
/// # Examples
///
/// ```
/// use kimiko::core::{CommandResult, Dispatcher};
///
/// let mut dispatcher = Dispatcher::<()>::new();
/// dispatcher
///     .command("bot:ping")
///     .handler(|_, _, _| Ok(CommandResult::success_with("pong")))
///     .register()
///     .unwrap();
///
/// let result = dispatcher.process_input(&mut (), "/ping");
/// assert_eq!(result.message(), Some("pong"));
///
/// // Input without the prefix is not a command
/// assert!(dispatcher.process_input(&mut (), "ping").is_ok());
/// ```
pub struct Dispatcher<C> {
    commands: Vec<Command<C>>,
    prefix: String,
    notice_not_found: bool,
    error_callback: ErrorCallback<C>,
    translator: Translator<C>,
}

impl<C: CommandContext> Dispatcher<C> {
    pub fn new() -> Self {
        Self {
            commands: Vec::new(),
            prefix: DEFAULT_PREFIX.to_string(),
            notice_not_found: false,
            error_callback: Arc::new(default_error_callback::<C>),
            translator: Arc::new(|_: &C, kind: ResultKind| kind.key().to_string()),
        }
    }

    /// Set the prefix raw input must start with. May be empty.
    pub fn prefix(&mut self, prefix: impl Into<String>) -> &mut Self {
        self.prefix = prefix.into();
        self
    }

    /// Set the callback receiving every non-success result.
    ///
    /// The default callback panics on runtime errors and ignores the rest.
    pub fn on_error<F>(&mut self, callback: F) -> &mut Self
    where
        F: Fn(&mut C, &CommandResult) + Send + Sync + 'static,
    {
        self.error_callback = Arc::new(callback);
        self
    }

    /// Whether unmatched input produces [`CommandResult::ERROR_NOT_FOUND`]
    /// instead of a silent success.
    pub fn notice_command_not_found(&mut self, notice: bool) -> &mut Self {
        self.notice_not_found = notice;
        self
    }

    pub fn translator<F>(&mut self, translator: F) -> &mut Self
    where
        F: Fn(&C, ResultKind) -> String + Send + Sync + 'static,
    {
        self.translator = Arc::new(translator);
        self
    }

    #[inline]
    pub fn get_prefix(&self) -> &str {
        &self.prefix
    }

    #[inline]
    pub fn notices_command_not_found(&self) -> bool {
        self.notice_not_found
    }

    /// Start building a command that registers into this dispatcher.
    pub fn command(&mut self, declaration: &str) -> CommandBuilder<'_, C> {
        CommandBuilder::attached(declaration, self)
    }

    /// Register a top-level command.
    ///
    /// Fails if the command is a sub-command of another, or if one of its
    /// labels is taken by a registered command.
    pub fn register(&mut self, command: Command<C>) -> Result<&mut Self, CommandError> {
        if command.has_parent() {
            return Err(CommandError::AlreadyParented {
                id: command.id().clone(),
            });
        }
        if let Some((existing, name)) = self
            .commands
            .iter()
            .find_map(|registered| registered.conflict_with(&command).map(|name| (registered.id(), name)))
        {
            warn!("Command '{}' rejected: '{}' is used by '{}'", command.id(), name, existing);
            return Err(CommandError::Duplicate {
                name,
                existing: existing.clone(),
            });
        }

        debug!("Registered command: {}", command.id());
        self.commands.push(command);
        Ok(self)
    }

    /// Find a top-level command by full id, bare name or alias.
    pub fn get_command(&self, name: &str) -> Option<&Command<C>> {
        self.commands.iter().find(|command| command.matches_name(name, true))
    }

    pub fn get_command_mut(&mut self, name: &str) -> Option<&mut Command<C>> {
        self.commands.iter_mut().find(|command| command.matches_name(name, true))
    }

    #[inline]
    pub fn has_command(&self, name: &str) -> bool {
        self.get_command(name).is_some()
    }

    /// Check if a command with the same identifier is registered.
    pub fn contains(&self, command: &Command<C>) -> bool {
        self.commands.iter().any(|registered| registered.id() == command.id())
    }

    pub fn remove_command(&mut self, id: &Identifier) -> Option<Command<C>> {
        let index = self.commands.iter().position(|command| command.id() == id)?;
        debug!("Removed command: {}", id);
        Some(self.commands.remove(index))
    }

    pub fn clear_commands(&mut self) {
        self.commands.clear();
    }

    /// Registered top-level commands, in registration order.
    #[inline]
    pub fn commands(&self) -> &[Command<C>] {
        &self.commands
    }

    /// Resolve and run `input` without reporting to the error callback.
    pub fn dispatch(&self, context: &mut C, input: &str) -> CommandResult {
        let Some(stripped) = input.strip_prefix(self.prefix.as_str()) else {
            return self.unmatched(split_label(input).map_or("", |(label, _)| label));
        };
        let Some((label, raw_args)) = split_label(stripped) else {
            return self.unmatched("");
        };
        let Some(command) = self.get_command(label) else {
            return self.unmatched(label);
        };

        debug!("Dispatching '{}' to {}", label, command.id());
        command.handle(context, label, raw_args)
    }

    /// Resolve and run `input`, passing any non-success result to the error
    /// callback exactly once before returning it.
    pub fn process_input(&self, context: &mut C, input: &str) -> CommandResult {
        let result = self.dispatch(context, input);
        if !result.is_ok() {
            (self.error_callback)(context, &result);
        }
        result
    }

    /// User-facing text for a result's kind.
    pub fn translate(&self, context: &C, result: &CommandResult) -> String {
        (self.translator)(context, result.kind())
    }

    /// Completion candidates for the last token of `input`.
    ///
    /// Commands the context may not run are never offered.
    pub fn complete(&self, context: &C, input: &str) -> Vec<String> {
        let Some(stripped) = input.strip_prefix(self.prefix.as_str()) else {
            return Vec::new();
        };

        let mut tokens: Vec<&str> = stripped.split_whitespace().collect();
        if stripped.is_empty() || stripped.ends_with(char::is_whitespace) {
            tokens.push("");
        }

        match tokens.as_slice() {
            [partial] => {
                let mut labels: Vec<String> = self
                    .commands
                    .iter()
                    .filter(|command| command.is_permitted(context))
                    .flat_map(|command| command.labels())
                    .filter(|label| label.starts_with(partial))
                    .map(str::to_string)
                    .collect();
                labels.sort();
                labels.dedup();
                labels
            }
            [label, rest @ ..] => match self.get_command(label) {
                Some(command) if command.is_permitted(context) => command.complete(context, label, rest),
                _ => Vec::new(),
            },
            [] => Vec::new(),
        }
    }

    fn unmatched(&self, label: &str) -> CommandResult {
        if self.notice_not_found {
            CommandResult::not_found(label)
        } else {
            CommandResult::SUCCESS
        }
    }
}

impl<C: CommandContext> Default for Dispatcher<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> std::fmt::Debug for Dispatcher<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("prefix", &self.prefix)
            .field("notice_not_found", &self.notice_not_found)
            .field("commands", &self.commands)
            .finish_non_exhaustive()
    }
}

fn default_error_callback<C>(_context: &mut C, result: &CommandResult) {
    if result.is_runtime_error() {
        panic!("unhandled command failure: {result}");
    }
    debug!("Command result: {}", result);
}
