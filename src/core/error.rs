//! Error types for declaring, registering and binding commands.
//!
//! Declaration-time failures ([`SyntaxError`], [`CommandError`]) are returned
//! to whoever builds the command. Dispatch-time failures ([`UsageError`]) never
//! leave the dispatcher; they are folded into a
//! [`CommandResult`](super::CommandResult).

use thiserror::Error;

use super::Identifier;

/// A raw string did not have the `domain:name` form.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentifierError {
    #[error("invalid identifier \"{raw}\": expected the form 'domain:name'")]
    Malformed { raw: String },
}

/// A command syntax declaration could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyntaxError {
    #[error("empty command syntax")]
    Empty,

    #[error(transparent)]
    Identifier(#[from] IdentifierError),

    #[error("invalid argument \"{token}\"")]
    InvalidArgument { token: String },

    #[error("argument \"{token}\" opens and closes with different brackets")]
    MismatchedBrackets { token: String },

    #[error("unknown argument type \"{type_name}\" in \"{token}\"")]
    UnknownType { token: String, type_name: String },

    #[error("required argument \"{token}\" cannot follow an optional argument")]
    RequiredAfterOptional { token: String },

    #[error("argument \"{token}\" cannot follow a list argument")]
    ArgumentAfterList { token: String },

    #[error("argument name \"{name}\" is declared twice")]
    DuplicateArgument { name: String },
}

/// An argument type could not be created.
#[derive(Debug, Clone, Error)]
pub enum ArgumentTypeError {
    #[error("invalid argument type name \"{name}\": expected letters, digits and '_', not starting with a digit")]
    InvalidName { name: String },

    #[error(transparent)]
    Pattern(#[from] regex::Error),
}

/// Tokenize error types.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenizeError {
    /// Unterminated quoted string.
    #[error("unterminated string at position {position}")]
    UnterminatedString { position: usize },
}

/// Raw input did not fit a command's argument signature.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UsageError {
    #[error(transparent)]
    Tokenize(#[from] TokenizeError),

    #[error("expected at least {required} arguments, got {supplied}")]
    MissingArguments { required: usize, supplied: usize },

    #[error("too many arguments provided ({supplied}), max: {max}")]
    TooManyArguments { max: usize, supplied: usize },

    #[error("cannot parse argument \"{token}\": does not comply with type \"{type_name}\"")]
    InvalidValue { token: String, type_name: String },
}

impl UsageError {
    /// Short, stable name of the failure, reported alongside the message.
    pub fn name(&self) -> &'static str {
        match self {
            UsageError::Tokenize(_) => "TokenizeError",
            UsageError::MissingArguments { .. } => "MissingArguments",
            UsageError::TooManyArguments { .. } => "TooManyArguments",
            UsageError::InvalidValue { .. } => "InvalidValue",
        }
    }
}

/// Building or registering a command failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error(transparent)]
    Syntax(#[from] SyntaxError),

    #[error("command \"{id}\" already has a parent")]
    AlreadyParented { id: Identifier },

    #[error("\"{name}\" is already used by command \"{existing}\"")]
    Duplicate { name: String, existing: Identifier },

    #[error("command \"{id}\" was built without a dispatcher to register into")]
    Detached { id: Identifier },
}
