//! Commands and command trees.
//!
//! A [`Command`] owns its children. A child keeps its parent's identifier as a
//! non-owning back reference and can only ever be attached to one parent.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use super::{
    bind, split_label, CommandArgs, CommandArgument, CommandContext, CommandError, CommandResult,
    CommandSyntax, Identifier, RuntimeFailure, SyntaxError, UsageReport,
};

/// Type alias for command handler functions.
///
/// Handlers receive:
/// - `context`: the caller's context
/// - `label`: the name the command was invoked with (its bare name or an alias)
/// - `args`: the bound arguments
///
/// Returned errors, as well as panics, are turned into
/// [`CommandResult::ERROR_RUNTIME`].
pub type CommandHandler<C> =
    Arc<dyn Fn(&mut C, &str, &CommandArgs) -> anyhow::Result<CommandResult> + Send + Sync>;

/// Type alias for suggestion provider functions.
///
/// Receives the context, the label, and the raw tokens typed after the
/// command so far (the last one possibly partial).
pub type SuggestionHandler<C> = Arc<dyn Fn(&C, &str, &[&str]) -> Vec<String> + Send + Sync>;

/// A command with a handler and optional sub-commands.
///
/// Usually built with a [`CommandBuilder`](super::CommandBuilder).
pub struct Command<C> {
    syntax: CommandSyntax,
    aliases: Vec<Box<str>>,
    description: String,
    permission: Option<String>,
    handler: CommandHandler<C>,
    suggestions: Option<SuggestionHandler<C>>,
    parent: Option<Identifier>,
    children: Vec<Command<C>>,
}

impl<C: CommandContext> Command<C> {
    /// Create a command from a parsed declaration. The handler does nothing
    /// and succeeds until one is set.
    pub fn new(syntax: CommandSyntax) -> Self {
        Self {
            syntax,
            aliases: Vec::new(),
            description: String::new(),
            permission: None,
            handler: Arc::new(|_: &mut C, _: &str, _: &CommandArgs| -> anyhow::Result<CommandResult> {
                Ok(CommandResult::SUCCESS)
            }),
            suggestions: None,
            parent: None,
            children: Vec::new(),
        }
    }

    /// Parse a declaration and create a command from it.
    pub fn parse(declaration: &str) -> Result<Self, SyntaxError> {
        Ok(Self::new(declaration.parse()?))
    }

    #[inline]
    pub fn id(&self) -> &Identifier {
        &self.syntax.id
    }

    #[inline]
    pub fn syntax(&self) -> &CommandSyntax {
        &self.syntax
    }

    #[inline]
    pub fn arguments(&self) -> &[CommandArgument] {
        &self.syntax.arguments
    }

    #[inline]
    pub fn aliases(&self) -> &[Box<str>] {
        &self.aliases
    }

    #[inline]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// The permission required to run this command locally, if any.
    #[inline]
    pub fn permission(&self) -> Option<&str> {
        self.permission.as_deref().filter(|permission| !permission.is_empty())
    }

    /// The parent's identifier, if this is a sub-command.
    #[inline]
    pub fn parent(&self) -> Option<&Identifier> {
        self.parent.as_ref()
    }

    #[inline]
    pub fn has_parent(&self) -> bool {
        self.parent.is_some()
    }

    #[inline]
    pub fn sub_commands(&self) -> &[Command<C>] {
        &self.children
    }

    #[inline]
    pub fn has_suggestions(&self) -> bool {
        self.suggestions.is_some()
    }

    pub(crate) fn set_description(&mut self, description: String) {
        self.description = description;
    }

    pub(crate) fn set_permission(&mut self, permission: Option<String>) {
        self.permission = permission;
    }

    pub(crate) fn set_handler<F>(&mut self, handler: F)
    where
        F: Fn(&mut C, &str, &CommandArgs) -> anyhow::Result<CommandResult> + Send + Sync + 'static,
    {
        self.handler = Arc::new(handler);
    }

    pub(crate) fn set_suggestions<F>(&mut self, provider: F)
    where
        F: Fn(&C, &str, &[&str]) -> Vec<String> + Send + Sync + 'static,
    {
        self.suggestions = Some(Arc::new(provider));
    }

    /// Add an alias. Aliases already present are ignored.
    pub(crate) fn add_alias(&mut self, alias: &str) {
        if !self.aliases.iter().any(|existing| &**existing == alias) {
            self.aliases.push(alias.into());
        }
    }

    /// The usage line: the identifier followed by every argument.
    pub fn usage(&self) -> String {
        self.syntax.to_string()
    }

    /// Check whether `name` designates this command.
    ///
    /// Matches the full `domain:name` form and the bare name, plus the
    /// aliases when `aliases` is set.
    pub fn matches_name(&self, name: &str, aliases: bool) -> bool {
        self.id().matches_str(name)
            || self.id().name() == name
            || (aliases && self.aliases.iter().any(|alias| &**alias == name))
    }

    /// Every label this command answers to.
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.id().name()).chain(self.aliases.iter().map(|alias| &**alias))
    }

    /// The first label of `other` this command already answers to.
    pub(crate) fn conflict_with(&self, other: &Command<C>) -> Option<String> {
        if self.id() == other.id() {
            return Some(other.id().to_string());
        }
        other
            .labels()
            .find(|label| self.matches_name(label, true))
            .or_else(|| self.labels().find(|label| other.matches_name(label, true)))
            .map(str::to_string)
    }

    /// Attach a sub-command.
    ///
    /// Fails if `sub_command` already has a parent, or if one of its labels is
    /// taken by an existing sub-command. Nothing changes on failure.
    pub fn add_sub_command(&mut self, mut sub_command: Command<C>) -> Result<(), CommandError> {
        if sub_command.has_parent() {
            return Err(CommandError::AlreadyParented {
                id: sub_command.id().clone(),
            });
        }
        if let Some((existing, name)) = self
            .children
            .iter()
            .find_map(|child| child.conflict_with(&sub_command).map(|name| (child.id(), name)))
        {
            return Err(CommandError::Duplicate {
                name,
                existing: existing.clone(),
            });
        }

        sub_command.parent = Some(self.id().clone());
        self.children.push(sub_command);
        Ok(())
    }

    /// Detach and return a sub-command.
    pub fn remove_sub_command(&mut self, id: &Identifier) -> Option<Command<C>> {
        let index = self.children.iter().position(|child| child.id() == id)?;
        let mut removed = self.children.remove(index);
        removed.parent = None;
        Some(removed)
    }

    /// Find a sub-command by full id, bare name or alias.
    pub fn get_sub_command(&self, label: &str) -> Option<&Command<C>> {
        self.children.iter().find(|child| child.matches_name(label, true))
    }

    pub fn has_sub_command(&self, label: &str) -> bool {
        self.get_sub_command(label).is_some()
    }

    /// Whether `context` passes this command's permission gate.
    pub fn is_permitted(&self, context: &C) -> bool {
        self.permission().is_none_or(|permission| context.has_permission(permission))
    }

    /// Resolve and run the command for `raw_args`.
    ///
    /// If the first raw token names a sub-command, the call is delegated to it
    /// with the remaining text, without checking this command's permission.
    /// Otherwise the arguments are bound to this command's signature, the
    /// permission is checked and the handler runs.
    pub fn handle(&self, context: &mut C, label: &str, raw_args: &str) -> CommandResult {
        if let Some((sub_label, rest)) = split_label(raw_args)
            && let Some(sub_command) = self.get_sub_command(sub_label)
        {
            bevy::log::debug!("Command '{}' delegating to '{}'", self.id(), sub_command.id());
            return sub_command.handle(context, sub_label, rest);
        }

        self.handle_local(context, label, raw_args)
    }

    fn handle_local(&self, context: &mut C, label: &str, raw_args: &str) -> CommandResult {
        let args = match bind(self.arguments(), raw_args) {
            Ok(args) => args,
            Err(error) => {
                return CommandResult::usage(UsageReport {
                    command: self.id().clone(),
                    usage: self.usage(),
                    error: Some(error),
                });
            }
        };

        if let Some(permission) = self.permission()
            && !context.has_permission(permission)
        {
            return CommandResult::permission_denied(permission);
        }

        let result = self.execute(context, label, &args);

        if result.is_usage_error() && result.payload().is_none() {
            return CommandResult::usage(UsageReport {
                command: self.id().clone(),
                usage: self.usage(),
                error: None,
            });
        }
        result
    }

    /// Run the handler directly, skipping binding and the permission gate.
    ///
    /// Errors and panics are caught and returned as runtime errors.
    pub fn execute(&self, context: &mut C, label: &str, args: &CommandArgs) -> CommandResult {
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| (self.handler)(context, label, args)));

        match outcome {
            Ok(Ok(result)) => result,
            Ok(Err(error)) => CommandResult::runtime(RuntimeFailure::Error(Arc::new(error))),
            Err(panic_info) => {
                CommandResult::runtime(RuntimeFailure::Panic(panic_message(&*panic_info)))
            }
        }
    }

    /// Suggestions for the token being typed.
    ///
    /// `args` are the raw tokens after `label`; the last one is the partial
    /// token. Sub-commands the context may not run are never suggested.
    pub fn complete(&self, context: &C, label: &str, args: &[&str]) -> Vec<String> {
        if let [first, rest @ ..] = args
            && !rest.is_empty()
            && let Some(sub_command) = self.get_sub_command(first)
        {
            if sub_command.is_permitted(context) {
                return sub_command.complete(context, first, rest);
            }
            return Vec::new();
        }

        let own = self.suggest(context, label, args);
        let [partial] = args else {
            return own;
        };

        let mut suggestions: Vec<String> = self
            .children
            .iter()
            .filter(|child| child.is_permitted(context))
            .map(|child| child.id().name().to_string())
            .chain(own)
            .filter(|suggestion| suggestion.starts_with(partial))
            .collect();
        suggestions.sort();
        suggestions.dedup();
        suggestions
    }

    fn suggest(&self, context: &C, label: &str, args: &[&str]) -> Vec<String> {
        self.suggestions
            .as_ref()
            .map(|f| f(context, label, args))
            .unwrap_or_default()
    }
}

impl<C> Clone for Command<C> {
    fn clone(&self) -> Self {
        Self {
            syntax: self.syntax.clone(),
            aliases: self.aliases.clone(),
            description: self.description.clone(),
            permission: self.permission.clone(),
            handler: Arc::clone(&self.handler),
            suggestions: self.suggestions.clone(),
            parent: self.parent.clone(),
            children: self.children.clone(),
        }
    }
}

impl<C> std::fmt::Debug for Command<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Command")
            .field("id", &self.syntax.id)
            .field("arguments", &self.syntax.arguments)
            .field("aliases", &self.aliases)
            .field("permission", &self.permission)
            .field("parent", &self.parent)
            .field("children", &self.children)
            .finish_non_exhaustive()
    }
}

/// Text of a caught panic payload.
pub(crate) fn panic_message(panic_info: &(dyn Any + Send)) -> String {
    if let Some(s) = panic_info.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic_info.downcast_ref::<String>() {
        s.clone()
    } else {
        "Unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[derive(Default)]
    struct TestContext {
        granted: HashSet<String>,
        calls: Vec<(String, CommandArgs)>,
    }

    impl TestContext {
        fn granting(permissions: &[&str]) -> Self {
            Self {
                granted: permissions.iter().map(|p| p.to_string()).collect(),
                calls: Vec::new(),
            }
        }
    }

    impl CommandContext for TestContext {
        fn has_permission(&self, permission: &str) -> bool {
            self.granted.contains(permission)
        }
    }

    fn recording(declaration: &str) -> Command<TestContext> {
        let mut command = Command::parse(declaration).unwrap();
        let id = command.id().to_string();
        command.set_handler(move |ctx: &mut TestContext, _label, args| {
            ctx.calls.push((id.clone(), args.clone()));
            Ok(CommandResult::SUCCESS)
        });
        command
    }

    #[test]
    fn test_matches_name() {
        let mut command = recording("chloe:remindme <event>");
        command.add_alias("remind");

        assert!(command.matches_name("chloe:remindme", false));
        assert!(command.matches_name("remindme", false));
        assert!(!command.matches_name("remind", false));
        assert!(command.matches_name("remind", true));
        assert!(!command.matches_name("other:remindme", true));
    }

    #[test]
    fn test_usage() {
        assert_eq!(
            recording("chloe:remindme <event> [repeat:boolean]").usage(),
            "chloe:remindme <event:string> [repeat:boolean]"
        );
        assert_eq!(recording("josh:help").usage(), "josh:help");
    }

    #[test]
    fn test_usage_round_trips_through_parser() {
        let command = recording("chloe:remindme <event> <date> [repeat:boolean] [users:int...]");
        let reparsed: CommandSyntax = command.usage().parse().unwrap();
        assert_eq!(reparsed.arguments, command.arguments());
    }

    #[test]
    fn test_handle_local() {
        let command = recording("ns:echo <text>");
        let mut ctx = TestContext::default();

        let result = command.handle(&mut ctx, "echo", "hello");
        assert!(result.is_ok());
        assert_eq!(ctx.calls.len(), 1);
        assert_eq!(ctx.calls[0].1.get_str("text"), Some("hello"));
    }

    #[test]
    fn test_handle_delegates_to_sub_command() {
        let mut parent = recording("ns:admin");
        parent.add_sub_command(recording("ns:kick <user:word>")).unwrap();
        let mut ctx = TestContext::default();

        let result = parent.handle(&mut ctx, "admin", "kick bob");
        assert!(result.is_ok());
        assert_eq!(ctx.calls.len(), 1);
        assert_eq!(ctx.calls[0].0, "ns:kick");
        assert_eq!(ctx.calls[0].1.get_str("user"), Some("bob"));
    }

    #[test]
    fn test_handle_delegates_through_alias() {
        let mut parent = recording("ns:admin");
        let mut kick = recording("ns:kick <user:word>");
        kick.add_alias("k");
        parent.add_sub_command(kick).unwrap();
        let mut ctx = TestContext::default();

        assert!(parent.handle(&mut ctx, "admin", "k bob").is_ok());
        assert_eq!(ctx.calls[0].0, "ns:kick");
    }

    #[test]
    fn test_handle_falls_back_to_parent_when_not_a_child() {
        let mut parent = recording("ns:admin [target:word]");
        parent.add_sub_command(recording("ns:kick <user:word>")).unwrap();
        let mut ctx = TestContext::default();

        assert!(parent.handle(&mut ctx, "admin", "status").is_ok());
        assert_eq!(ctx.calls[0].0, "ns:admin");
        assert_eq!(ctx.calls[0].1.get_str("target"), Some("status"));
    }

    #[test]
    fn test_handle_nested_sub_commands() {
        let mut inner = recording("ns:role");
        inner.add_sub_command(recording("ns:grant <user:word> <role:word>")).unwrap();
        let mut outer = recording("ns:admin");
        outer.add_sub_command(inner).unwrap();
        let mut ctx = TestContext::default();

        assert!(outer.handle(&mut ctx, "admin", "role grant bob mod").is_ok());
        assert_eq!(ctx.calls[0].0, "ns:grant");
        assert_eq!(ctx.calls[0].1.get_str("role"), Some("mod"));
    }

    #[test]
    fn test_parent_permission_not_checked_on_delegation() {
        let mut parent = recording("ns:admin");
        parent.set_permission(Some("admin".into()));
        parent.add_sub_command(recording("ns:status")).unwrap();
        let mut ctx = TestContext::default();

        assert!(parent.handle(&mut ctx, "admin", "status").is_ok());
        assert!(parent.handle(&mut ctx, "admin", "").is_permission_error());
    }

    #[test]
    fn test_permission_gate() {
        let mut command = recording("ns:ban <user:word>");
        command.set_permission(Some("mod.ban".into()));

        let mut denied = TestContext::default();
        let result = command.handle(&mut denied, "ban", "bob");
        assert!(result.is_permission_error());
        assert_eq!(result.missing_permission(), Some("mod.ban"));
        assert!(denied.calls.is_empty());

        let mut allowed = TestContext::granting(&["mod.ban"]);
        assert!(command.handle(&mut allowed, "ban", "bob").is_ok());
        assert_eq!(allowed.calls.len(), 1);
    }

    #[test]
    fn test_empty_permission_is_no_permission() {
        let mut command = recording("ns:ping");
        command.set_permission(Some(String::new()));
        assert_eq!(command.permission(), None);
        assert!(command.handle(&mut TestContext::default(), "ping", "").is_ok());
    }

    #[test]
    fn test_usage_error_carries_report() {
        let command = recording("ns:echo <text>");
        let mut ctx = TestContext::default();

        let result = command.handle(&mut ctx, "echo", "");
        let report = result.usage_report().unwrap();
        assert_eq!(report.command, "ns:echo");
        assert_eq!(report.usage, "ns:echo <text:string>");
        assert_eq!(report.error_name(), "MissingArguments");
        assert!(ctx.calls.is_empty());
    }

    #[test]
    fn test_handler_usage_error_gets_usage_attached() {
        let mut command: Command<TestContext> = Command::parse("ns:pick <n:int>").unwrap();
        command.set_handler(|_, _, _| Ok(CommandResult::ERROR_USAGE));

        let result = command.handle(&mut TestContext::default(), "pick", "4");
        let report = result.usage_report().unwrap();
        assert_eq!(report.usage, "ns:pick <n:int>");
        assert!(report.error.is_none());
    }

    #[test]
    fn test_handler_error_becomes_runtime_error() {
        let mut command: Command<TestContext> = Command::parse("ns:fail").unwrap();
        command.set_handler(|_, _, _| Err(anyhow::anyhow!("database unavailable")));

        let result = command.handle(&mut TestContext::default(), "fail", "");
        assert!(result.is_runtime_error());
        assert!(matches!(result.runtime_failure(), Some(RuntimeFailure::Error(e)) if e.to_string() == "database unavailable"));
    }

    #[test]
    fn test_panic_message_payloads() {
        assert_eq!(panic_message(&"static text"), "static text");
        assert_eq!(panic_message(&String::from("owned text")), "owned text");
        assert_eq!(panic_message(&42_u32), "Unknown panic");
    }

    #[test]
    fn test_handler_panic_becomes_runtime_error() {
        let mut command: Command<TestContext> = Command::parse("ns:explode").unwrap();
        command.set_handler(|_, _, _| panic!("kaboom"));

        let result = command.handle(&mut TestContext::default(), "explode", "");
        assert!(result.is_runtime_error());
        assert!(matches!(result.runtime_failure(), Some(RuntimeFailure::Panic(msg)) if msg == "kaboom"));
    }

    #[test]
    fn test_add_sub_command_rejects_parented() {
        let mut first = recording("ns:first");
        let mut second = recording("ns:second");
        let child = recording("ns:child");

        first.add_sub_command(child).unwrap();
        let attached = first.get_sub_command("child").unwrap().clone();
        assert_eq!(attached.parent(), Some(first.id()));

        assert_eq!(
            second.add_sub_command(attached),
            Err(CommandError::AlreadyParented {
                id: Identifier::parse("ns:child").unwrap(),
            })
        );
        assert!(second.sub_commands().is_empty());
    }

    #[test]
    fn test_add_sub_command_rejects_duplicates() {
        let mut parent = recording("ns:admin");
        let mut kick = recording("ns:kick");
        kick.add_alias("k");
        parent.add_sub_command(kick).unwrap();

        assert!(matches!(
            parent.add_sub_command(recording("ns:kick")),
            Err(CommandError::Duplicate { .. })
        ));
        assert!(matches!(
            parent.add_sub_command(recording("other:kick")),
            Err(CommandError::Duplicate { .. })
        ));

        let mut aliased = recording("ns:knock");
        aliased.add_alias("k");
        assert!(matches!(
            parent.add_sub_command(aliased),
            Err(CommandError::Duplicate { .. })
        ));
        assert_eq!(parent.sub_commands().len(), 1);
    }

    #[test]
    fn test_remove_sub_command_clears_parent() {
        let mut parent = recording("ns:admin");
        parent.add_sub_command(recording("ns:kick")).unwrap();

        let id = Identifier::parse("ns:kick").unwrap();
        let removed = parent.remove_sub_command(&id).unwrap();
        assert!(!removed.has_parent());
        assert!(!parent.has_sub_command("kick"));

        let mut other = recording("ns:other");
        assert!(other.add_sub_command(removed).is_ok());
    }

    #[test]
    fn test_complete_sub_commands() {
        let mut parent = recording("ns:admin");
        parent.add_sub_command(recording("ns:kick")).unwrap();
        parent.add_sub_command(recording("ns:kill")).unwrap();
        let mut secret = recording("ns:keys");
        secret.set_permission(Some("root".into()));
        parent.add_sub_command(secret).unwrap();

        let ctx = TestContext::default();
        assert_eq!(parent.complete(&ctx, "admin", &["k"]), vec!["kick", "kill"]);
        assert_eq!(parent.complete(&ctx, "admin", &["kic"]), vec!["kick"]);

        let root = TestContext::granting(&["root"]);
        assert_eq!(parent.complete(&root, "admin", &["k"]), vec!["keys", "kick", "kill"]);
    }

    #[test]
    fn test_complete_uses_suggestion_handler() {
        let mut kick = recording("ns:kick <user:word>");
        kick.set_suggestions(|_, _, _| vec!["alice".into(), "bob".into()]);
        let mut parent = recording("ns:admin");
        parent.add_sub_command(kick).unwrap();

        let ctx = TestContext::default();
        assert_eq!(parent.complete(&ctx, "admin", &["kick", "a"]), vec!["alice"]);
        assert_eq!(parent.complete(&ctx, "admin", &["kick", ""]), vec!["alice", "bob"]);
    }
}
