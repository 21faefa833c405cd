//! Binds raw argument text to a command signature.

use super::{tokenize, CommandArgs, CommandArgument, UsageError};

/// Tokenize `raw_args` and bind the tokens to `signature`.
///
/// # Examples
///
/// ```
/// use kimiko::core::{bind, parse_syntax, ArgValue};
///
/// let syntax = parse_syntax("chloe:remindme <event> <date> [repeat:boolean] [users:int...]").unwrap();
/// let args = bind(&syntax.arguments, r#""this is an event" 23:35:20 yes 5050 0o56"#).unwrap();
///
/// assert_eq!(args.get_str("event"), Some("this is an event"));
/// assert_eq!(args.get_bool("repeat"), Some(true));
/// assert_eq!(args.get_list("users"), &[ArgValue::Int(5050), ArgValue::Int(46)]);
/// ```
pub fn bind(signature: &[CommandArgument], raw_args: &str) -> Result<CommandArgs, UsageError> {
    let tokens = tokenize(raw_args)?;
    bind_tokens(signature, &tokens)
}

/// Bind already tokenized input to `signature`.
///
/// The i-th token binds to the i-th argument. Tokens past the end of the
/// signature are only accepted when the last argument is a list. Binding stops
/// at the first token its type rejects.
pub fn bind_tokens(signature: &[CommandArgument], tokens: &[&str]) -> Result<CommandArgs, UsageError> {
    let required = signature.iter().filter(|arg| arg.is_required()).count();
    if tokens.len() < required {
        return Err(UsageError::MissingArguments {
            required,
            supplied: tokens.len(),
        });
    }

    let mut args = CommandArgs::new();

    for (i, token) in tokens.iter().enumerate() {
        let argument = match signature.get(i).or_else(|| signature.last().filter(|arg| arg.is_list())) {
            Some(argument) => argument,
            None => {
                return Err(UsageError::TooManyArguments {
                    max: signature.len(),
                    supplied: tokens.len(),
                });
            }
        };

        let value = argument
            .argument_type()
            .parse(token)
            .ok_or_else(|| UsageError::InvalidValue {
                token: token.to_string(),
                type_name: argument.argument_type().name().to_string(),
            })?;

        if argument.is_list() {
            args.push(argument.name(), value);
        } else {
            args.insert(argument.name(), value);
        }
    }

    Ok(args)
}
