//! The capability a caller must provide to dispatch commands.

/// Per-dispatch caller context.
///
/// The dispatcher only ever asks one question of it: whether the caller holds
/// a permission. Everything else (replying, the sender's identity, access to
/// the host) is up to the implementing type and is reached from handlers.
/// Contexts are owned values handed to `'static` handlers.
pub trait CommandContext: 'static {
    /// Check if the caller holds `permission`.
    fn has_permission(&self, permission: &str) -> bool;
}

/// The unit context holds every permission.
impl CommandContext for () {
    fn has_permission(&self, _permission: &str) -> bool {
        true
    }
}
