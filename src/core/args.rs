//! Bound argument values passed to command handlers.

use std::collections::HashMap;

/// A coerced argument value.
#[derive(Debug, Clone, PartialEq)]
pub enum ArgValue {
    String(String),
    Bool(bool),
    Int(i64),
    Float(f64),
    /// Values collected by a list argument, in input order.
    List(Vec<ArgValue>),
}

impl ArgValue {
    /// Get the value as a string slice.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            ArgValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Get the value as a boolean.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ArgValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Get the value as an integer.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            ArgValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Get the value as a float. Integers widen.
    pub fn as_float(&self) -> Option<f64> {
        match self {
            ArgValue::Float(f) => Some(*f),
            ArgValue::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// Get the collected values of a list argument.
    pub fn as_list(&self) -> Option<&[ArgValue]> {
        match self {
            ArgValue::List(values) => Some(values),
            _ => None,
        }
    }
}

impl From<&str> for ArgValue {
    fn from(value: &str) -> Self {
        ArgValue::String(value.to_string())
    }
}

impl From<String> for ArgValue {
    fn from(value: String) -> Self {
        ArgValue::String(value)
    }
}

impl From<bool> for ArgValue {
    fn from(value: bool) -> Self {
        ArgValue::Bool(value)
    }
}

impl From<i64> for ArgValue {
    fn from(value: i64) -> Self {
        ArgValue::Int(value)
    }
}

impl From<f64> for ArgValue {
    fn from(value: f64) -> Self {
        ArgValue::Float(value)
    }
}

impl<T: Into<ArgValue>> From<Vec<T>> for ArgValue {
    fn from(values: Vec<T>) -> Self {
        ArgValue::List(values.into_iter().map(Into::into).collect())
    }
}

/// Arguments passed to a command handler, keyed by declared argument name.
///
/// Optional arguments that were not supplied are absent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CommandArgs {
    values: HashMap<String, ArgValue>,
}

impl CommandArgs {
    /// Create an empty argument set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a value to an argument name, replacing any previous value.
    pub fn insert(&mut self, name: impl Into<String>, value: ArgValue) {
        self.values.insert(name.into(), value);
    }

    /// Append a value to a list argument, creating the list if needed.
    pub(crate) fn push(&mut self, name: &str, value: ArgValue) {
        match self.values.get_mut(name) {
            Some(ArgValue::List(values)) => values.push(value),
            _ => {
                self.values.insert(name.to_string(), ArgValue::List(vec![value]));
            }
        }
    }

    /// Get the number of bound arguments.
    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Check if no argument was bound.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Check if an argument was bound.
    #[inline]
    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// Get an argument by name.
    #[inline]
    pub fn get(&self, name: &str) -> Option<&ArgValue> {
        self.values.get(name)
    }

    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(ArgValue::as_str)
    }

    pub fn get_bool(&self, name: &str) -> Option<bool> {
        self.get(name).and_then(ArgValue::as_bool)
    }

    pub fn get_int(&self, name: &str) -> Option<i64> {
        self.get(name).and_then(ArgValue::as_int)
    }

    pub fn get_float(&self, name: &str) -> Option<f64> {
        self.get(name).and_then(ArgValue::as_float)
    }

    /// Get a list argument. Absent lists read as empty.
    pub fn get_list(&self, name: &str) -> &[ArgValue] {
        self.get(name).and_then(ArgValue::as_list).unwrap_or(&[])
    }

    /// Get a string argument or a default value.
    pub fn get_str_or<'a>(&'a self, name: &str, default: &'a str) -> &'a str {
        self.get_str(name).unwrap_or(default)
    }

    /// Iterate over bound arguments in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ArgValue)> {
        self.values.iter().map(|(name, value)| (name.as_str(), value))
    }
}

impl std::ops::Index<&str> for CommandArgs {
    type Output = ArgValue;

    fn index(&self, name: &str) -> &Self::Output {
        &self.values[name]
    }
}

impl<K: Into<String>> FromIterator<(K, ArgValue)> for CommandArgs {
    fn from_iter<I: IntoIterator<Item = (K, ArgValue)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}
