//! Argument types: named validator + coercion pairs.
//!
//! The table is process-wide and append-only. The built-in types are always
//! present; hosts may add their own at startup with [`ArgumentType::register`].

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, LazyLock, PoisonError, RwLock};

use regex::Regex;

use super::{ArgValue, ArgumentTypeError};

/// Coercion function from validated text to a value.
///
/// Receives exactly the text the validator accepted. Returning `None` rejects
/// the token as if the validator had (e.g. an integer outside `i64`).
pub type CoerceFn = dyn Fn(&str) -> Option<ArgValue> + Send + Sync;

struct ArgumentTypeInner {
    name: Box<str>,
    pattern: Regex,
    coerce: Box<CoerceFn>,
}

/// A named argument type.
///
/// Cheap to clone; two types are equal when their names are.
///
/// # Examples
///
/// ```
/// use kimiko::core::{ArgValue, ArgumentType};
///
/// let int = ArgumentType::from_name(Some("int")).unwrap();
/// assert!(int.is_valid("0x1F"));
/// assert_eq!(int.parse("0x1F"), Some(ArgValue::Int(31)));
/// assert_eq!(int.parse("twelve"), None);
/// ```
#[derive(Clone)]
pub struct ArgumentType(Arc<ArgumentTypeInner>);

impl ArgumentType {
    pub const STRING: &'static str = "string";
    pub const WORD: &'static str = "word";
    pub const BOOLEAN: &'static str = "boolean";
    pub const INT: &'static str = "int";
    pub const FLOAT: &'static str = "float";
    pub const URI: &'static str = "uri";
    pub const URL: &'static str = "url";

    /// Create a type from a name, a validating pattern and a coercion.
    ///
    /// The name must be usable in a declaration (`<arg:name>`): ASCII letters,
    /// digits and `_`, not starting with a digit.
    ///
    /// The pattern is searched for anywhere in the token. Anchor it with `^`
    /// and `$` to require a whole-token match.
    pub fn new<F>(name: impl Into<Box<str>>, pattern: &str, coerce: F) -> Result<Self, ArgumentTypeError>
    where
        F: Fn(&str) -> Option<ArgValue> + Send + Sync + 'static,
    {
        let name = name.into();
        if !is_type_name(&name) {
            return Err(ArgumentTypeError::InvalidName { name: name.into() });
        }
        Ok(Self(Arc::new(ArgumentTypeInner {
            name,
            pattern: Regex::new(pattern)?,
            coerce: Box::new(coerce),
        })))
    }

    /// Get the type name.
    #[inline]
    pub fn name(&self) -> &str {
        &self.0.name
    }

    /// Get the validating pattern.
    #[inline]
    pub fn pattern(&self) -> &str {
        self.0.pattern.as_str()
    }

    /// Check whether the input is accepted by the validator.
    pub fn is_valid(&self, input: &str) -> bool {
        self.0.pattern.is_match(input)
    }

    /// Validate and coerce the input.
    pub fn parse(&self, input: &str) -> Option<ArgValue> {
        if !self.is_valid(input) {
            return None;
        }
        (self.0.coerce)(input)
    }

    /// Add a type to the process-wide table.
    ///
    /// Returns the type previously registered under the same name, which is
    /// replaced.
    pub fn register(argument_type: ArgumentType) -> Option<ArgumentType> {
        let mut table = REGISTRY.write().unwrap_or_else(PoisonError::into_inner);
        let previous = table.insert(argument_type.0.name.clone(), argument_type);
        if let Some(previous) = &previous {
            bevy::log::warn!("Argument type '{}' was overwritten", previous.name());
        }
        previous
    }

    /// Look a type up by name. No name means the `string` type.
    pub fn from_name(name: Option<&str>) -> Option<ArgumentType> {
        let table = REGISTRY.read().unwrap_or_else(PoisonError::into_inner);
        table.get(name.unwrap_or(Self::STRING)).cloned()
    }

    /// Names of every registered type, sorted.
    pub fn registered_names() -> Vec<String> {
        let table = REGISTRY.read().unwrap_or_else(PoisonError::into_inner);
        let mut names: Vec<String> = table.keys().map(|name| name.to_string()).collect();
        names.sort();
        names
    }
}

impl PartialEq for ArgumentType {
    fn eq(&self, other: &Self) -> bool {
        self.name() == other.name()
    }
}

impl Eq for ArgumentType {}

impl fmt::Debug for ArgumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArgumentType")
            .field("name", &self.name())
            .field("pattern", &self.pattern())
            .finish_non_exhaustive()
    }
}

impl fmt::Display for ArgumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for ArgumentType {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

/// Same shape as the type part of an argument declaration.
fn is_type_name(name: &str) -> bool {
    let mut chars = name.chars();
    chars
        .next()
        .is_some_and(|first| first.is_ascii_alphabetic() || first == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

static REGISTRY: LazyLock<RwLock<HashMap<Box<str>, ArgumentType>>> = LazyLock::new(|| {
    let table = builtin_types()
        .into_iter()
        .map(|ty| (ty.0.name.clone(), ty))
        .collect();
    RwLock::new(table)
});

fn builtin(name: &str, pattern: &str, coerce: fn(&str) -> Option<ArgValue>) -> ArgumentType {
    ArgumentType::new(name, pattern, coerce).expect("built-in argument type is well-formed")
}

fn builtin_types() -> Vec<ArgumentType> {
    vec![
        builtin(ArgumentType::STRING, r"(?s).*", |s| Some(ArgValue::String(s.to_string()))),
        builtin(ArgumentType::WORD, r"^\S+$", |s| Some(ArgValue::String(s.to_string()))),
        builtin(
            ArgumentType::BOOLEAN,
            r"(?i)^(?:false|no?|0|true|y(?:es)?|1)$",
            |s| {
                let truthy = matches!(s.to_ascii_lowercase().as_str(), "true" | "yes" | "y" | "1");
                Some(ArgValue::Bool(truthy))
            },
        ),
        builtin(
            ArgumentType::INT,
            r"^(?:[-+]?[0-9]+|0x[0-9A-Fa-f]+|0o[0-7]+)$",
            coerce_int,
        ),
        builtin(ArgumentType::FLOAT, r"^-?[0-9]+(?:\.[0-9]+)?$", |s| {
            s.parse().ok().map(ArgValue::Float)
        }),
        builtin(ArgumentType::URI, r"^[A-Za-z][A-Za-z0-9+.\-]*:.+$", |s| {
            Some(ArgValue::String(s.to_string()))
        }),
        builtin(ArgumentType::URL, r"^[A-Za-z][A-Za-z0-9+.\-]*://.+$", |s| {
            Some(ArgValue::String(s.to_string()))
        }),
    ]
}

fn coerce_int(s: &str) -> Option<ArgValue> {
    let value = if let Some(hex) = s.strip_prefix("0x") {
        i64::from_str_radix(hex, 16)
    } else if let Some(octal) = s.strip_prefix("0o") {
        i64::from_str_radix(octal, 8)
    } else {
        s.parse()
    };
    value.ok().map(ArgValue::Int)
}
