//! Declared command parameters.

use std::fmt;

use super::ArgumentType;

/// One parameter of a command signature.
///
/// Renders back to its declaration form: `<name:type>` for required,
/// `[name:type]` for optional, with `...` before the closing bracket for lists.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct CommandArgument {
    name: Box<str>,
    #[cfg_attr(feature = "serde", serde(rename = "type"))]
    argument_type: ArgumentType,
    required: bool,
    list: bool,
}

impl CommandArgument {
    /// Create a new argument.
    pub fn new(name: impl Into<Box<str>>, argument_type: ArgumentType, required: bool, list: bool) -> Self {
        Self {
            name: name.into(),
            argument_type,
            required,
            list,
        }
    }

    /// Get the argument name.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the argument type.
    #[inline]
    pub fn argument_type(&self) -> &ArgumentType {
        &self.argument_type
    }

    #[inline]
    pub fn is_required(&self) -> bool {
        self.required
    }

    /// Whether this argument collects every remaining token.
    #[inline]
    pub fn is_list(&self) -> bool {
        self.list
    }
}

impl fmt::Display for CommandArgument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (open, close) = if self.required { ('<', '>') } else { ('[', ']') };
        let list = if self.list { "..." } else { "" };
        write!(f, "{open}{}:{}{list}{close}", self.name, self.argument_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let int = ArgumentType::from_name(Some("int")).unwrap();
        let string = ArgumentType::from_name(None).unwrap();

        assert_eq!(CommandArgument::new("event", string, true, false).to_string(), "<event:string>");
        assert_eq!(CommandArgument::new("users", int.clone(), false, true).to_string(), "[users:int...]");
        assert_eq!(CommandArgument::new("n", int, true, true).to_string(), "<n:int...>");
    }
}
