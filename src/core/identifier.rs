//! Two-part `domain:name` command keys.

use std::fmt;
use std::str::FromStr;

use super::IdentifierError;

/// A command key made of a domain and a name, written `domain:name`.
///
/// Both segments must be non-empty and the raw form must contain exactly one
/// colon. An identifier compares equal to another identifier with the same
/// segments, or to a string holding its exact canonical form.
///
/// # Examples
///
/// ```
/// use kimiko::core::Identifier;
///
/// let id: Identifier = "chloe:remindme".parse().unwrap();
/// assert_eq!(id.domain(), "chloe");
/// assert_eq!(id.name(), "remindme");
/// assert_eq!(id, "chloe:remindme");
/// assert_eq!(id.to_string(), "chloe:remindme");
///
/// assert!("remindme".parse::<Identifier>().is_err());
/// assert!("a:b:c".parse::<Identifier>().is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Identifier {
    domain: Box<str>,
    name: Box<str>,
}

impl Identifier {
    /// Build an identifier from its two segments.
    pub fn new(domain: &str, name: &str) -> Result<Self, IdentifierError> {
        if domain.is_empty() || name.is_empty() || domain.contains(':') || name.contains(':') {
            return Err(IdentifierError::Malformed {
                raw: format!("{domain}:{name}"),
            });
        }
        Ok(Self {
            domain: domain.into(),
            name: name.into(),
        })
    }

    /// Parse the `domain:name` form.
    pub fn parse(raw: &str) -> Result<Self, IdentifierError> {
        match raw.split_once(':') {
            Some((domain, name)) if !name.contains(':') => {
                Self::new(domain, name).map_err(|_| IdentifierError::Malformed { raw: raw.into() })
            }
            _ => Err(IdentifierError::Malformed { raw: raw.into() }),
        }
    }

    /// The segment before the colon.
    #[inline]
    pub fn domain(&self) -> &str {
        &self.domain
    }

    /// The segment after the colon.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Check whether `raw` is this identifier's exact canonical form.
    pub fn matches_str(&self, raw: &str) -> bool {
        raw.split_once(':')
            .is_some_and(|(domain, name)| *self.domain == *domain && *self.name == *name)
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.domain, self.name)
    }
}

impl FromStr for Identifier {
    type Err = IdentifierError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<&str> for Identifier {
    type Error = IdentifierError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl PartialEq<str> for Identifier {
    fn eq(&self, other: &str) -> bool {
        self.matches_str(other)
    }
}

impl PartialEq<&str> for Identifier {
    fn eq(&self, other: &&str) -> bool {
        self.matches_str(other)
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for Identifier {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for Identifier {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = <std::borrow::Cow<'de, str>>::deserialize(deserializer)?;
        Identifier::parse(&raw).map_err(serde::de::Error::custom)
    }
}
