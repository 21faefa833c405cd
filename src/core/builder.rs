//! Fluent command construction.

use super::{
    Command, CommandArgs, CommandContext, CommandError, CommandResult, Dispatcher,
};

/// Builds a [`Command`], optionally registering it into a [`Dispatcher`].
///
/// The first error (a bad declaration, a rejected sub-command) is kept and
/// returned from [`build`](Self::build) or [`register`](Self::register); later
/// calls are ignored.
///
/// # Examples
///
/// ```
/// use kimiko::core::{CommandBuilder, CommandResult};
///
/// let command = CommandBuilder::<()>::new("chloe:remindme <event> <date> [repeat:boolean]")
///     .description("Schedule a reminder")
///     .alias("remind")
///     .handler(|_, _, args| {
///         let _event = args.get_str("event").unwrap_or_default();
///         Ok(CommandResult::SUCCESS)
///     })
///     .build()
///     .unwrap();
///
/// assert_eq!(command.usage(), "chloe:remindme <event:string> <date:string> [repeat:boolean]");
/// ```
pub struct CommandBuilder<'d, C> {
    command: Result<Command<C>, CommandError>,
    dispatcher: Option<&'d mut Dispatcher<C>>,
}

impl<'d, C: CommandContext> CommandBuilder<'d, C> {
    /// Start a detached builder. [`register`](Self::register) will fail;
    /// use [`build`](Self::build).
    pub fn new(declaration: &str) -> Self {
        Self {
            command: Command::parse(declaration).map_err(CommandError::from),
            dispatcher: None,
        }
    }

    pub(crate) fn attached(declaration: &str, dispatcher: &'d mut Dispatcher<C>) -> Self {
        Self {
            dispatcher: Some(dispatcher),
            ..Self::new(declaration)
        }
    }

    fn map(mut self, f: impl FnOnce(&mut Command<C>)) -> Self {
        if let Ok(command) = &mut self.command {
            f(command);
        }
        self
    }

    fn try_map(mut self, f: impl FnOnce(&mut Command<C>) -> Result<(), CommandError>) -> Self {
        if let Ok(command) = &mut self.command
            && let Err(error) = f(command)
        {
            self.command = Err(error);
        }
        self
    }

    pub fn description(self, description: impl Into<String>) -> Self {
        let description = description.into();
        self.map(|command| command.set_description(description))
    }

    /// Require a permission to run the command. An empty string clears it.
    pub fn permission(self, permission: impl Into<String>) -> Self {
        let permission = permission.into();
        self.map(|command| command.set_permission(Some(permission)))
    }

    pub fn alias(self, alias: &str) -> Self {
        self.map(|command| command.add_alias(alias))
    }

    pub fn aliases<'a>(self, aliases: impl IntoIterator<Item = &'a str>) -> Self {
        self.map(|command| aliases.into_iter().for_each(|alias| command.add_alias(alias)))
    }

    /// Set the function run when the command executes.
    pub fn handler<F>(self, handler: F) -> Self
    where
        F: Fn(&mut C, &str, &CommandArgs) -> anyhow::Result<CommandResult> + Send + Sync + 'static,
    {
        self.map(|command| command.set_handler(handler))
    }

    /// Set the tab-completion provider.
    pub fn suggestions<F>(self, provider: F) -> Self
    where
        F: Fn(&C, &str, &[&str]) -> Vec<String> + Send + Sync + 'static,
    {
        self.map(|command| command.set_suggestions(provider))
    }

    /// Declare and attach a sub-command in place.
    pub fn command(self, declaration: &str, configure: impl FnOnce(Self) -> Self) -> Self {
        let sub_command = configure(Self::new(declaration)).build();
        self.try_map(|command| command.add_sub_command(sub_command?))
    }

    /// Attach an already built sub-command.
    pub fn subcommand(self, sub_command: Command<C>) -> Self {
        self.try_map(|command| command.add_sub_command(sub_command))
    }

    pub fn build(self) -> Result<Command<C>, CommandError> {
        self.command
    }

    /// Register the command into the dispatcher this builder came from.
    pub fn register(self) -> Result<&'d mut Dispatcher<C>, CommandError> {
        let command = self.command?;
        match self.dispatcher {
            Some(dispatcher) => dispatcher.register(command),
            None => Err(CommandError::Detached { id: command.id().clone() }),
        }
    }
}
