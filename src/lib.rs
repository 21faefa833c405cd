//! Declarative command parsing and dispatch for Bevy.
//!
//! Commands are declared with a one-line syntax:
//!
//! ```text
//! chloe:remindme <event> <date> [repeat:boolean] [users:int...]
//! ```
//!
//! kimiko provides:
//!
//! - **Syntax parsing**: identifiers, required/optional/list arguments, typed slots
//! - **Argument types**: a regex-validated registry (`string`, `word`, `boolean`,
//!   `int`, `float`, `uri`, `url`) open to custom types
//! - **Binding**: quote-aware tokenizing and per-type coercion into [`CommandArgs`](core::CommandArgs)
//! - **Dispatch**: prefixes, aliases, sub-command trees, permissions and a single
//!   error callback
//! - **Bevy integration**: [`CommandPlugin`] and the [`CommandConsole`](core::CommandConsole)
//!   system parameter
//!
//! # Features
//!
//! - `terminal`: stdin/stdout backend for dedicated servers
//! - `serde`: `Serialize`/`Deserialize` for identifiers; `Serialize` for
//!   declarations, arguments and argument types
//!
//! # Quick Start
//!
//! ```ignore
//! use bevy::prelude::*;
//! use kimiko::prelude::*;
//!
//! fn main() {
//!     App::new()
//!         .add_plugins(MinimalPlugins)
//!         .add_plugins(CommandPlugin::default().with_prefix("/"))
//!         .add_systems(Startup, setup_commands)
//!         .run();
//! }
//!
//! fn setup_commands(mut console: CommandConsole) {
//!     console
//!         .command("chloe:remindme <event> <date> [repeat:boolean]")
//!         .alias("remind")
//!         .handler(|ctx, _, args| {
//!             ctx.reply(format!("Reminder set for {}", args.get_str_or("date", "?")));
//!             Ok(CommandResult::SUCCESS)
//!         })
//!         .register()
//!         .expect("valid command");
//! }
//! ```
//!
//! The core types do not depend on the ECS and can be driven directly:
//!
//! ```
//! use kimiko::core::{CommandResult, Dispatcher};
//!
//! let mut dispatcher = Dispatcher::<()>::new();
//! dispatcher
//!     .command("bot:add <a:int> <b:int>")
//!     .handler(|_, _, args| {
//!         let sum = args.get_int("a").unwrap_or(0) + args.get_int("b").unwrap_or(0);
//!         Ok(CommandResult::success_with(sum.to_string()))
//!     })
//!     .register()
//!     .unwrap();
//!
//! assert_eq!(dispatcher.process_input(&mut (), "/add 2 0x10").message(), Some("18"));
//! ```

use std::panic::{self, AssertUnwindSafe};

use bevy::prelude::*;

pub mod core;

#[cfg(feature = "terminal")]
pub mod terminal;

pub use core::{
    ArgValue, ArgumentType, Command, CommandArgs, CommandArgument, CommandBuilder, CommandConsole,
    CommandContext, CommandError, CommandInputEvent, CommandOutputEvent, CommandOutputLevel,
    CommandResult, CommandSyntax, ConsoleContext, ConsoleDispatcher, ConsolePermissions,
    Dispatcher, Identifier, ResultKind, SyntaxError, UsageError,
};

#[cfg(feature = "terminal")]
pub use terminal::{TerminalConfig, TerminalPlugin};

/// Commonly used types.
pub mod prelude {
    pub use crate::core::{
        ArgValue, ArgumentType, Command, CommandArgs, CommandBuilder, CommandConsole, CommandContext,
        CommandError, CommandInputEvent, CommandOutputEvent, CommandOutputLevel, CommandResult,
        ConsoleContext, ConsoleDispatcher, ConsolePermissions, Dispatcher, Identifier, ResultKind,
    };
    pub use crate::{CommandConsoleSettings, CommandPlugin};

    #[cfg(feature = "terminal")]
    pub use crate::terminal::{TerminalConfig, TerminalPlugin};
}

/// Declaration of the builtin help command.
pub const HELP_COMMAND: &str = "kimiko:help [path:word...]";

/// Plugin that dispatches [`CommandInputEvent`]s and writes [`CommandOutputEvent`]s.
///
/// # Configuration
///
/// ```ignore
/// CommandPlugin::default()
///     .with_prefix("/")
///     .notice_command_not_found(false)
/// ```
#[derive(Debug, Clone)]
pub struct CommandPlugin {
    /// Prefix input must start with to be treated as a command.
    pub prefix: String,
    /// Report unmatched input as an unknown command.
    pub notice_command_not_found: bool,
    /// Echo each input line as a [`CommandOutputLevel::Command`] output.
    pub echo_input: bool,
    /// Register the builtin `help` command.
    pub help_command: bool,
}

impl Default for CommandPlugin {
    fn default() -> Self {
        Self {
            prefix: String::new(),
            notice_command_not_found: true,
            echo_input: true,
            help_command: true,
        }
    }
}

impl CommandPlugin {
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    pub fn notice_command_not_found(mut self, notice: bool) -> Self {
        self.notice_command_not_found = notice;
        self
    }

    pub fn echo_input(mut self, echo: bool) -> Self {
        self.echo_input = echo;
        self
    }

    pub fn help_command(mut self, enabled: bool) -> Self {
        self.help_command = enabled;
        self
    }
}

/// Runtime settings of the input pipeline.
#[derive(Resource, Debug, Clone)]
pub struct CommandConsoleSettings {
    pub echo_input: bool,
}

impl Plugin for CommandPlugin {
    fn build(&self, app: &mut App) {
        let mut dispatcher = Dispatcher::<ConsoleContext>::new();
        dispatcher
            .prefix(self.prefix.clone())
            .notice_command_not_found(self.notice_command_not_found)
            .on_error(report_failure);

        if self.help_command
            && let Err(error) = register_help_command(&mut dispatcher)
        {
            error!("Failed to register help command: {}", error);
        }

        app.insert_resource(ConsoleDispatcher(dispatcher))
            .insert_resource(CommandConsoleSettings {
                echo_input: self.echo_input,
            })
            .init_resource::<ConsolePermissions>()
            .init_resource::<PendingCommandWork>()
            .add_plugins(core::CommandEventsPlugin);

        // Input pipeline (three stages)
        // 1. dispatch_command_input: Dispatch input, collect output and deferred actions
        // 2. apply_deferred_actions: Run deferred actions with exclusive World access
        // 3. send_pending_outputs: Write output messages
        app.add_systems(
            Update,
            (dispatch_command_input, apply_deferred_actions, send_pending_outputs).chain(),
        );

        #[cfg(feature = "terminal")]
        {
            app.add_plugins(terminal::TerminalPlugin);
        }
    }
}

/// Turn a failed result into console output.
fn report_failure(ctx: &mut ConsoleContext, result: &CommandResult) {
    match result.kind() {
        ResultKind::Success => {}
        ResultKind::NotFound => {
            ctx.error(format!("Unknown command: '{}'", result.label().unwrap_or_default()));
        }
        ResultKind::Permission => match result.missing_permission() {
            Some(permission) => ctx.error(format!("Insufficient permission (requires {permission})")),
            None => ctx.error("Insufficient permission"),
        },
        ResultKind::Usage => match result.usage_report() {
            Some(report) => {
                if let Some(error) = &report.error {
                    ctx.error(error.to_string());
                }
                ctx.info(format!("Usage: {}", report.usage));
            }
            None => ctx.error(result.message().unwrap_or("Invalid usage").to_string()),
        },
        ResultKind::Runtime => {
            error!("Command failed: {}", result);
            match result.runtime_failure() {
                Some(failure) => ctx.error(format!("Command failed: {failure}")),
                None => ctx.error(result.message().unwrap_or("Command failed").to_string()),
            }
        }
    }
}

fn register_help_command(dispatcher: &mut Dispatcher<ConsoleContext>) -> Result<(), CommandError> {
    dispatcher
        .command(HELP_COMMAND)
        .description("List commands, or describe one")
        .alias("?")
        .handler(|ctx, _, args| {
            let path: Vec<String> = args
                .get_list("path")
                .iter()
                .filter_map(ArgValue::as_str)
                .map(str::to_string)
                .collect();
            ctx.defer(move |world, ctx| {
                let dispatcher = world.resource::<ConsoleDispatcher>();
                describe_commands(dispatcher, ctx, &path);
            });
            Ok(CommandResult::SUCCESS)
        })
        .register()
        .map(|_| ())
}

fn describe_commands(dispatcher: &Dispatcher<ConsoleContext>, ctx: &mut ConsoleContext, path: &[String]) {
    let Some((first, rest)) = path.split_first() else {
        let lines: Vec<String> = dispatcher
            .commands()
            .iter()
            .filter(|command| command.is_permitted(ctx))
            .map(summary)
            .collect();
        ctx.info("Available commands:");
        for line in lines {
            ctx.info(line);
        }
        return;
    };

    let mut command = dispatcher.get_command(first);
    for label in rest {
        command = command.and_then(|parent| parent.get_sub_command(label));
    }

    let Some(command) = command else {
        ctx.error(format!("Unknown command: '{}'", path.join(" ")));
        return;
    };

    ctx.info(format!("Usage: {}{}", dispatcher.get_prefix(), command.usage()));
    if !command.description().is_empty() {
        ctx.info(format!(" - {}", command.description()));
    }
    if !command.aliases().is_empty() {
        ctx.info(format!(" aliases: {}", command.aliases().join(", ")));
    }
    let sub_commands: Vec<String> = command
        .sub_commands()
        .iter()
        .filter(|sub| sub.is_permitted(ctx))
        .map(summary)
        .collect();
    for line in sub_commands {
        ctx.info(line);
    }
}

fn summary(command: &Command<ConsoleContext>) -> String {
    if command.description().is_empty() {
        format!("  {}", command.usage())
    } else {
        format!("  {} - {}", command.usage(), command.description())
    }
}

/// Output and deferred work collected during dispatch.
#[derive(Resource, Default)]
struct PendingCommandWork {
    actions: Vec<(Option<String>, core::WorldAction)>,
    outputs: Vec<CommandOutputEvent>,
}

impl PendingCommandWork {
    fn absorb(&mut self, ctx: ConsoleContext) {
        let sender = ctx.sender().map(str::to_string);
        let (outputs, actions) = ctx.into_parts();
        self.outputs.extend(outputs);
        self.actions
            .extend(actions.into_iter().map(|action| (sender.clone(), action)));
    }
}

/// System that dispatches every submitted input line.
fn dispatch_command_input(
    mut input_events: MessageReader<CommandInputEvent>,
    dispatcher: Res<ConsoleDispatcher>,
    permissions: Res<ConsolePermissions>,
    settings: Res<CommandConsoleSettings>,
    mut pending: ResMut<PendingCommandWork>,
) {
    for event in input_events.read() {
        let mut ctx = ConsoleContext::new(event.sender.clone(), permissions.clone());
        if settings.echo_input {
            ctx.push(CommandOutputEvent::command(format!("$ {}", event.input)));
        }

        let result = dispatcher.process_input(&mut ctx, &event.input);
        if result.is_ok()
            && let Some(message) = result.message()
        {
            ctx.reply(message);
        }

        pending.absorb(ctx);
    }
}

/// Exclusive system that runs deferred actions with full World access.
fn apply_deferred_actions(world: &mut World) {
    let actions = std::mem::take(&mut world.resource_mut::<PendingCommandWork>().actions);
    if actions.is_empty() {
        return;
    }

    let permissions = world.resource::<ConsolePermissions>().clone();
    let mut done = PendingCommandWork::default();

    for (sender, action) in actions {
        let mut ctx = ConsoleContext::new(sender, permissions.clone());

        let result = panic::catch_unwind(AssertUnwindSafe(|| action(world, &mut ctx)));

        if let Err(panic_info) = result {
            let panic_msg = crate::core::panic_message(&*panic_info);
            error!("Deferred command action panicked: {}", panic_msg);
            ctx.error(format!("Command failed: panicked: {panic_msg}"));
        }

        done.absorb(ctx);
    }

    // Actions deferred by actions run next frame
    let mut pending = world.resource_mut::<PendingCommandWork>();
    pending.outputs.append(&mut done.outputs);
    pending.actions.append(&mut done.actions);
}

/// System that writes queued output messages.
fn send_pending_outputs(
    mut pending: ResMut<PendingCommandWork>,
    mut output_events: MessageWriter<CommandOutputEvent>,
) {
    for output in pending.outputs.drain(..) {
        output_events.write(output);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Inputs fed to the pipeline on the next update.
    #[derive(Resource, Default)]
    struct TestInputs(Vec<CommandInputEvent>);

    /// Outputs collected after the pipeline ran.
    #[derive(Resource, Default)]
    struct TestOutputs(Vec<CommandOutputEvent>);

    /// Test resource to track command execution.
    #[derive(Resource, Default)]
    struct Counter(i64);

    fn feed_inputs(mut inputs: ResMut<TestInputs>, mut writer: MessageWriter<CommandInputEvent>) {
        for input in inputs.0.drain(..) {
            writer.write(input);
        }
    }

    fn collect_outputs(mut reader: MessageReader<CommandOutputEvent>, mut outputs: ResMut<TestOutputs>) {
        outputs.0.extend(reader.read().cloned());
    }

    fn app_with(plugin: CommandPlugin) -> App {
        let mut app = App::new();
        app.add_plugins(MinimalPlugins)
            .add_plugins(plugin)
            .init_resource::<TestInputs>()
            .init_resource::<TestOutputs>()
            .init_resource::<Counter>()
            .add_systems(PreUpdate, feed_inputs)
            .add_systems(PostUpdate, collect_outputs)
            .add_systems(Startup, register_test_commands);
        app.update();
        app
    }

    fn register_test_commands(mut console: CommandConsole) {
        console
            .command("test:add <amount:int>")
            .description("Add to the counter")
            .handler(|ctx, _, args| {
                let amount = args.get_int("amount").unwrap_or_default();
                ctx.defer(move |world, ctx| {
                    let mut counter = world.resource_mut::<Counter>();
                    counter.0 += amount;
                    let total = counter.0;
                    ctx.reply(format!("counter = {total}"));
                });
                Ok(CommandResult::SUCCESS)
            })
            .register()
            .unwrap();

        console
            .command("test:ping")
            .handler(|_, _, _| Ok(CommandResult::success_with("pong")))
            .register()
            .unwrap();

        console
            .command("test:admin")
            .permission("admin")
            .command("test:reset", |reset| {
                reset.handler(|ctx, _, _| {
                    ctx.defer(|world, _| world.resource_mut::<Counter>().0 = 0);
                    Ok(CommandResult::SUCCESS)
                })
            })
            .register()
            .unwrap();

        console
            .command("test:fail")
            .handler(|_, _, _| anyhow::bail!("disk on fire"))
            .register()
            .unwrap();

        console
            .command("test:explode")
            .handler(|_, _, _| panic!("kaboom"))
            .register()
            .unwrap();
    }

    fn submit(app: &mut App, input: CommandInputEvent) -> Vec<CommandOutputEvent> {
        app.world_mut().resource_mut::<TestInputs>().0.push(input);
        app.update();
        std::mem::take(&mut app.world_mut().resource_mut::<TestOutputs>().0)
    }

    fn run(app: &mut App, input: &str) -> Vec<CommandOutputEvent> {
        submit(app, CommandInputEvent::new(input))
    }

    fn messages(outputs: &[CommandOutputEvent], level: CommandOutputLevel) -> Vec<&str> {
        outputs
            .iter()
            .filter(|output| output.level == level)
            .map(|output| output.message.as_str())
            .collect()
    }

    #[test]
    fn test_command_execution() {
        let mut app = app_with(CommandPlugin::default());

        let outputs = run(&mut app, "add 5");
        assert_eq!(app.world().resource::<Counter>().0, 5);
        assert_eq!(messages(&outputs, CommandOutputLevel::Command), vec!["$ add 5"]);
        assert_eq!(messages(&outputs, CommandOutputLevel::Result), vec!["counter = 5"]);

        run(&mut app, "test:add 0x10");
        assert_eq!(app.world().resource::<Counter>().0, 21);
    }

    #[test]
    fn test_success_message_is_replied() {
        let mut app = app_with(CommandPlugin::default());
        let outputs = run(&mut app, "ping");
        assert_eq!(messages(&outputs, CommandOutputLevel::Result), vec!["pong"]);
    }

    #[test]
    fn test_prefix_and_echo() {
        let mut app = app_with(CommandPlugin::default().with_prefix("/").echo_input(false));

        let outputs = run(&mut app, "ping");
        assert!(messages(&outputs, CommandOutputLevel::Error)[0].starts_with("Unknown command"));

        let outputs = run(&mut app, "/ping");
        assert_eq!(outputs.len(), 1);
        assert_eq!(outputs[0].message, "pong");
    }

    #[test]
    fn test_unknown_command_silent_when_not_noticed() {
        let mut app = app_with(CommandPlugin::default().notice_command_not_found(false));
        let outputs = run(&mut app, "nope");
        assert!(messages(&outputs, CommandOutputLevel::Error).is_empty());
    }

    #[test]
    fn test_unknown_command_reported() {
        let mut app = app_with(CommandPlugin::default());
        let outputs = run(&mut app, "nope 1 2");
        assert_eq!(messages(&outputs, CommandOutputLevel::Error), vec!["Unknown command: 'nope'"]);
    }

    #[test]
    fn test_usage_error_reported() {
        let mut app = app_with(CommandPlugin::default());

        let outputs = run(&mut app, "add lots");
        assert_eq!(
            messages(&outputs, CommandOutputLevel::Error),
            vec![r#"cannot parse argument "lots": does not comply with type "int""#]
        );
        assert_eq!(
            messages(&outputs, CommandOutputLevel::Info),
            vec!["Usage: test:add <amount:int>"]
        );
        assert_eq!(app.world().resource::<Counter>().0, 0);
    }

    #[test]
    fn test_permission_enforcement() {
        let mut app = app_with(CommandPlugin::default());
        app.world_mut().insert_resource(ConsolePermissions::restricted(Vec::<String>::new()));

        run(&mut app, "add 3");
        let outputs = run(&mut app, "admin");
        assert_eq!(
            messages(&outputs, CommandOutputLevel::Error),
            vec!["Insufficient permission (requires admin)"]
        );

        // Sub-commands are reached without the parent's permission
        run(&mut app, "admin reset");
        assert_eq!(app.world().resource::<Counter>().0, 0);
    }

    #[test]
    fn test_runtime_errors_reported() {
        let mut app = app_with(CommandPlugin::default());

        let outputs = run(&mut app, "fail");
        assert_eq!(messages(&outputs, CommandOutputLevel::Error), vec!["Command failed: disk on fire"]);

        let outputs = run(&mut app, "explode");
        assert_eq!(
            messages(&outputs, CommandOutputLevel::Error),
            vec!["Command failed: panicked: kaboom"]
        );

        // The app keeps working
        run(&mut app, "add 1");
        assert_eq!(app.world().resource::<Counter>().0, 1);
    }

    #[test]
    fn test_outputs_addressed_to_sender() {
        let mut app = app_with(CommandPlugin::default());
        let outputs = submit(&mut app, CommandInputEvent::from_sender("alice", "add 2"));
        assert!(!outputs.is_empty());
        assert!(outputs.iter().all(|output| output.sender.as_deref() == Some("alice")));
    }

    #[test]
    fn test_help_command() {
        let mut app = app_with(CommandPlugin::default());

        let outputs = run(&mut app, "help");
        let info = messages(&outputs, CommandOutputLevel::Info);
        assert_eq!(info[0], "Available commands:");
        assert!(info.contains(&"  test:add <amount:int> - Add to the counter"));
        assert!(info.contains(&"  test:ping"));

        let outputs = run(&mut app, "? admin reset");
        assert_eq!(messages(&outputs, CommandOutputLevel::Info), vec!["Usage: test:reset"]);

        let outputs = run(&mut app, "help nothing");
        assert_eq!(
            messages(&outputs, CommandOutputLevel::Error),
            vec!["Unknown command: 'nothing'"]
        );
    }

    #[test]
    fn test_help_hides_forbidden_commands() {
        let mut app = app_with(CommandPlugin::default());
        app.world_mut().insert_resource(ConsolePermissions::restricted(Vec::<String>::new()));

        let outputs = run(&mut app, "help");
        let info = messages(&outputs, CommandOutputLevel::Info);
        assert!(!info.iter().any(|line| line.contains("test:admin")));
    }

    #[test]
    fn test_help_command_disabled() {
        let app = app_with(CommandPlugin::default().help_command(false));
        assert!(!app.world().resource::<ConsoleDispatcher>().has_command("help"));
    }

    #[test]
    fn test_deferred_action_panic_is_contained() {
        let mut app = app_with(CommandPlugin::default());
        app.world_mut()
            .resource_mut::<ConsoleDispatcher>()
            .command("test:bad_defer")
            .handler(|ctx, _, _| {
                ctx.defer(|_, _| panic!("deferred boom"));
                Ok(CommandResult::SUCCESS)
            })
            .register()
            .unwrap();

        let outputs = run(&mut app, "bad_defer");
        assert_eq!(
            messages(&outputs, CommandOutputLevel::Error),
            vec!["Command failed: panicked: deferred boom"]
        );
    }
}
