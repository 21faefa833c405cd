//! Permission grants for console callers.

use std::collections::HashSet;

use bevy::prelude::*;

/// Resource holding the permissions granted to console callers.
///
/// By default it is unrestricted: every permission check passes. That suits a
/// local or single-player console. Hosts with remote senders should switch to
/// [`ConsolePermissions::restricted`] and grant what their auth system allows.
///
/// # Examples
///
/// ```
/// use kimiko::core::ConsolePermissions;
///
/// let mut perms = ConsolePermissions::restricted(["chat.send"]);
/// assert!(perms.has_permission("chat.send"));
/// assert!(!perms.has_permission("admin.kick"));
///
/// perms.grant("admin.kick");
/// assert!(perms.has_permission("admin.kick"));
/// ```
#[derive(Resource, Debug, Clone, PartialEq, Eq)]
pub struct ConsolePermissions {
    granted: HashSet<String>,
    unrestricted: bool,
}

impl Default for ConsolePermissions {
    fn default() -> Self {
        Self::unrestricted()
    }
}

impl ConsolePermissions {
    /// Every permission check passes.
    pub fn unrestricted() -> Self {
        Self {
            granted: HashSet::new(),
            unrestricted: true,
        }
    }

    /// Only the given permissions pass.
    pub fn restricted<I, S>(granted: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            granted: granted.into_iter().map(Into::into).collect(),
            unrestricted: false,
        }
    }

    #[inline]
    pub fn is_unrestricted(&self) -> bool {
        self.unrestricted
    }

    pub fn set_unrestricted(&mut self, unrestricted: bool) {
        self.unrestricted = unrestricted;
    }

    pub fn grant(&mut self, permission: impl Into<String>) {
        self.granted.insert(permission.into());
    }

    /// Returns whether the permission was granted.
    pub fn revoke(&mut self, permission: &str) -> bool {
        self.granted.remove(permission)
    }

    #[inline]
    pub fn has_permission(&self, permission: &str) -> bool {
        self.unrestricted || self.granted.contains(permission)
    }

    /// Explicit grants, in no particular order.
    pub fn granted(&self) -> impl Iterator<Item = &str> {
        self.granted.iter().map(String::as_str)
    }
}
