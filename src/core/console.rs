//! Console-side context and system parameter.
//!
//! Commands registered through [`CommandConsole`] run with a [`ConsoleContext`].
//! Handlers cannot borrow the [`World`] while the dispatcher is borrowed, so
//! world access is deferred with [`ConsoleContext::defer`] and applied right
//! after dispatch, within the same frame.

use bevy::ecs::system::SystemParam;
use bevy::prelude::*;

use super::{
    Command, CommandBuilder, CommandContext, CommandError, CommandOutputEvent, ConsolePermissions,
    Dispatcher, Identifier,
};

/// Work run with exclusive world access after dispatch.
pub type WorldAction = Box<dyn FnOnce(&mut World, &mut ConsoleContext) + Send + Sync>;

/// Context for commands dispatched from [`CommandInputEvent`](super::CommandInputEvent)s.
pub struct ConsoleContext {
    sender: Option<String>,
    permissions: ConsolePermissions,
    outputs: Vec<CommandOutputEvent>,
    deferred: Vec<WorldAction>,
}

impl ConsoleContext {
    pub fn new(sender: Option<String>, permissions: ConsolePermissions) -> Self {
        Self {
            sender,
            permissions,
            outputs: Vec::new(),
            deferred: Vec::new(),
        }
    }

    /// Who sent the input. `None` for the local console.
    #[inline]
    pub fn sender(&self) -> Option<&str> {
        self.sender.as_deref()
    }

    #[inline]
    pub fn permissions(&self) -> &ConsolePermissions {
        &self.permissions
    }

    /// Queue output addressed to the sender.
    pub fn push(&mut self, output: CommandOutputEvent) {
        self.outputs.push(output.to_sender(self.sender.clone()));
    }

    pub fn reply(&mut self, message: impl Into<String>) {
        self.push(CommandOutputEvent::result(message));
    }

    pub fn info(&mut self, message: impl Into<String>) {
        self.push(CommandOutputEvent::info(message));
    }

    pub fn warn(&mut self, message: impl Into<String>) {
        self.push(CommandOutputEvent::warn(message));
    }

    pub fn error(&mut self, message: impl Into<String>) {
        self.push(CommandOutputEvent::error(message));
    }

    /// Output queued so far.
    #[inline]
    pub fn outputs(&self) -> &[CommandOutputEvent] {
        &self.outputs
    }

    /// Run `action` with exclusive world access once dispatch is over.
    ///
    /// # Examples
    ///
    /// ```ignore
    /// console
    ///     .command("game:spawn <count:int>")
    ///     .handler(|ctx, _, args| {
    ///         let count = args.get_int("count").unwrap_or(1);
    ///         ctx.defer(move |world, ctx| {
    ///             for _ in 0..count {
    ///                 world.spawn(Enemy);
    ///             }
    ///             ctx.reply(format!("Spawned {count} enemies"));
    ///         });
    ///         Ok(CommandResult::SUCCESS)
    ///     })
    ///     .register()?;
    /// ```
    pub fn defer<F>(&mut self, action: F)
    where
        F: FnOnce(&mut World, &mut ConsoleContext) + Send + Sync + 'static,
    {
        self.deferred.push(Box::new(action));
    }

    #[inline]
    pub fn has_deferred(&self) -> bool {
        !self.deferred.is_empty()
    }

    /// Split into queued output and deferred actions.
    pub fn into_parts(self) -> (Vec<CommandOutputEvent>, Vec<WorldAction>) {
        (self.outputs, self.deferred)
    }
}

impl CommandContext for ConsoleContext {
    fn has_permission(&self, permission: &str) -> bool {
        self.permissions.has_permission(permission)
    }
}

impl std::fmt::Debug for ConsoleContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConsoleContext")
            .field("sender", &self.sender)
            .field("permissions", &self.permissions)
            .field("outputs", &self.outputs)
            .field("deferred", &self.deferred.len())
            .finish()
    }
}

/// The app-wide dispatcher.
#[derive(Resource, Deref, DerefMut, Debug, Default)]
pub struct ConsoleDispatcher(pub Dispatcher<ConsoleContext>);

/// System parameter for registering and inspecting console commands.
///
/// # Examples
///
/// ```ignore
/// fn setup(mut console: CommandConsole) {
///     console
///         .command("chloe:remindme <event> <date> [repeat:boolean]")
///         .description("Schedule a reminder")
///         .handler(|ctx, _, args| {
///             ctx.reply(format!("Reminder set: {}", args.get_str_or("event", "")));
///             Ok(CommandResult::SUCCESS)
///         })
///         .register()
///         .expect("valid command");
/// }
/// ```
#[derive(SystemParam)]
pub struct CommandConsole<'w> {
    dispatcher: ResMut<'w, ConsoleDispatcher>,
    permissions: ResMut<'w, ConsolePermissions>,
}

impl CommandConsole<'_> {
    /// Start building a command that registers into the console.
    pub fn command(&mut self, declaration: &str) -> CommandBuilder<'_, ConsoleContext> {
        self.dispatcher.0.command(declaration)
    }

    pub fn register(&mut self, command: Command<ConsoleContext>) -> Result<(), CommandError> {
        self.dispatcher.0.register(command).map(|_| ())
    }

    pub fn get_command(&self, name: &str) -> Option<&Command<ConsoleContext>> {
        self.dispatcher.0.get_command(name)
    }

    pub fn has_command(&self, name: &str) -> bool {
        self.dispatcher.0.has_command(name)
    }

    pub fn remove_command(&mut self, id: &Identifier) -> Option<Command<ConsoleContext>> {
        self.dispatcher.0.remove_command(id)
    }

    pub fn commands(&self) -> &[Command<ConsoleContext>] {
        self.dispatcher.0.commands()
    }

    /// Completion candidates for the local console.
    pub fn complete(&self, input: &str) -> Vec<String> {
        let context = ConsoleContext::new(None, self.permissions.clone());
        self.dispatcher.0.complete(&context, input)
    }

    #[inline]
    pub fn dispatcher(&self) -> &Dispatcher<ConsoleContext> {
        &self.dispatcher.0
    }

    #[inline]
    pub fn dispatcher_mut(&mut self) -> &mut Dispatcher<ConsoleContext> {
        &mut self.dispatcher.0
    }

    #[inline]
    pub fn permissions(&self) -> &ConsolePermissions {
        &self.permissions
    }

    #[inline]
    pub fn permissions_mut(&mut self) -> &mut ConsolePermissions {
        &mut self.permissions
    }
}
