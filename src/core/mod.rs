//! Command syntax, binding and dispatch.
//!
//! This module provides the fundamental building blocks:
//! - [`parse_syntax`] - Parses `domain:name <arg:type> [opt...]` declarations
//! - [`ArgumentType`] - Named, regex-validated argument types
//! - [`bind`] - Binds raw input to a command signature
//! - [`Command`] / [`CommandBuilder`] - Command trees with handlers
//! - [`Dispatcher`] - Resolves input to commands and reports failures
//! - [`CommandConsole`] - System parameter over the app-wide dispatcher

mod identifier;
mod error;
mod argument_type;
mod args;
mod argument;
mod syntax;
mod tokenizer;
mod binder;
mod result;
mod context;
mod command;
mod builder;
mod dispatcher;
mod events;
mod permissions;
mod console;

pub use identifier::Identifier;
pub use error::{ArgumentTypeError, CommandError, IdentifierError, SyntaxError, TokenizeError, UsageError};
pub use argument_type::{ArgumentType, CoerceFn};
pub use args::{ArgValue, CommandArgs};
pub use argument::CommandArgument;
pub use syntax::{parse_argument, parse_syntax, CommandSyntax};
pub use tokenizer::{split_label, tokenize};
pub use binder::{bind, bind_tokens};
pub use result::{CommandResult, ResultKind, ResultPayload, RuntimeFailure, UsageReport};
pub use context::CommandContext;
pub use command::{Command, CommandHandler, SuggestionHandler};
pub(crate) use command::panic_message;
pub use builder::CommandBuilder;
pub use dispatcher::{Dispatcher, ErrorCallback, Translator, DEFAULT_PREFIX};
pub use events::{CommandEventsPlugin, CommandInputEvent, CommandOutputEvent, CommandOutputLevel};
pub use permissions::ConsolePermissions;
pub use console::{CommandConsole, ConsoleContext, ConsoleDispatcher, WorldAction};
