//! Command syntax declarations.
//!
//! A declaration is a single line: the command identifier followed by its
//! arguments, separated by whitespace.
//!
//! ```text
//! chloe:remindme <event> <date> [repeat:boolean] [users:int...]
//! ```
//!
//! - `<name>` is required, `[name]` is optional
//! - `:type` names a registered [`ArgumentType`], `string` when omitted
//! - `...` marks a list, which must be the last argument
//! - no required argument may follow an optional one

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;

use super::{ArgumentType, CommandArgument, Identifier, SyntaxError};

static ARGUMENT_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?P<open>[<\[])(?P<name>[A-Za-z][A-Za-z0-9_]*)(?::(?P<type>[A-Za-z_][A-Za-z0-9_]*))?(?P<list>\.\.\.)?(?P<close>[>\]])$",
    )
    .expect("argument pattern is a valid regex")
});

/// A parsed command declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct CommandSyntax {
    /// The command identifier.
    pub id: Identifier,
    /// Arguments in declaration order.
    pub arguments: Vec<CommandArgument>,
}

impl CommandSyntax {
    /// Number of arguments that must be supplied.
    pub fn required_count(&self) -> usize {
        self.arguments.iter().filter(|arg| arg.is_required()).count()
    }
}

impl fmt::Display for CommandSyntax {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id)?;
        for argument in &self.arguments {
            write!(f, " {argument}")?;
        }
        Ok(())
    }
}

impl FromStr for CommandSyntax {
    type Err = SyntaxError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_syntax(s)
    }
}

/// Parse a command syntax declaration.
///
/// # Examples
///
/// ```
/// use kimiko::core::parse_syntax;
///
/// let syntax = parse_syntax("chloe:remindme <event> <date> [repeat:boolean] [users:int...]").unwrap();
/// assert_eq!(syntax.id, "chloe:remindme");
/// assert_eq!(syntax.arguments.len(), 4);
/// assert!(syntax.arguments[3].is_list());
///
/// assert!(parse_syntax("chloe:remindme [repeat:boolean] <event>").is_err());
/// ```
pub fn parse_syntax(declaration: &str) -> Result<CommandSyntax, SyntaxError> {
    let mut parts = declaration.split_whitespace();
    let id = parts.next().ok_or(SyntaxError::Empty)?.parse::<Identifier>()?;

    let mut arguments: Vec<CommandArgument> = Vec::new();
    let mut seen_optional = false;
    let mut seen_list = false;

    for token in parts {
        if seen_list {
            return Err(SyntaxError::ArgumentAfterList { token: token.into() });
        }

        let argument = parse_argument(token)?;

        if argument.is_required() && seen_optional {
            return Err(SyntaxError::RequiredAfterOptional { token: token.into() });
        }
        if arguments.iter().any(|existing| existing.name() == argument.name()) {
            return Err(SyntaxError::DuplicateArgument {
                name: argument.name().into(),
            });
        }

        seen_optional |= !argument.is_required();
        seen_list |= argument.is_list();
        arguments.push(argument);
    }

    Ok(CommandSyntax { id, arguments })
}

/// Parse a single `<name:type...>` / `[name:type...]` token.
pub fn parse_argument(token: &str) -> Result<CommandArgument, SyntaxError> {
    let captures = ARGUMENT_PATTERN
        .captures(token)
        .ok_or_else(|| SyntaxError::InvalidArgument { token: token.into() })?;

    let required = &captures["open"] == "<";
    let closes_required = &captures["close"] == ">";
    if required != closes_required {
        return Err(SyntaxError::MismatchedBrackets { token: token.into() });
    }

    let type_name = captures.name("type").map(|m| m.as_str());
    let argument_type = ArgumentType::from_name(type_name).ok_or_else(|| SyntaxError::UnknownType {
        token: token.into(),
        type_name: type_name.unwrap_or(ArgumentType::STRING).into(),
    })?;

    Ok(CommandArgument::new(
        &captures["name"],
        argument_type,
        required,
        captures.name("list").is_some(),
    ))
}
