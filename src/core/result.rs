//! Command results.
//!
//! Every dispatch ends in a [`CommandResult`]: a [`ResultKind`] from a closed
//! set plus an optional payload describing what went wrong. Results are plain
//! values. [`CommandResult::with`] derives a new result and never touches the
//! constants.

use std::fmt;
use std::sync::Arc;

use super::{Identifier, UsageError};

/// The closed set of result kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResultKind {
    Success,
    NotFound,
    Permission,
    Usage,
    Runtime,
}

impl ResultKind {
    /// Stable key, suitable for translation tables.
    pub fn key(self) -> &'static str {
        match self {
            ResultKind::Success => "kimiko:success",
            ResultKind::NotFound => "kimiko:error/not_found",
            ResultKind::Permission => "kimiko:error/permission",
            ResultKind::Usage => "kimiko:error/usage",
            ResultKind::Runtime => "kimiko:error/runtime",
        }
    }

    /// The key as an [`Identifier`].
    pub fn id(self) -> Identifier {
        Identifier::parse(self.key()).expect("result keys are valid identifiers")
    }
}

impl fmt::Display for ResultKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Details attached to a usage error.
#[derive(Debug, Clone)]
pub struct UsageReport {
    /// The command whose signature was not met.
    pub command: Identifier,
    /// The command's usage line, e.g. `chloe:remindme <event:string> <date:string>`.
    pub usage: String,
    /// The binding failure, if the dispatcher detected it. `None` when the
    /// handler itself reported the usage error.
    pub error: Option<UsageError>,
}

impl UsageReport {
    /// Short name of the failure.
    pub fn error_name(&self) -> &'static str {
        self.error.as_ref().map_or("UsageError", UsageError::name)
    }

    /// User-facing explanation.
    pub fn message(&self) -> String {
        match &self.error {
            Some(error) => error.to_string(),
            None => format!("usage: {}", self.usage),
        }
    }
}

/// A handler failure caught at the dispatch boundary.
#[derive(Debug, Clone)]
pub enum RuntimeFailure {
    /// The handler returned an error.
    Error(Arc<anyhow::Error>),
    /// The handler panicked.
    Panic(String),
}

impl fmt::Display for RuntimeFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuntimeFailure::Error(error) => write!(f, "{error:#}"),
            RuntimeFailure::Panic(message) => write!(f, "panicked: {message}"),
        }
    }
}

/// Payload attached to a result.
#[derive(Debug, Clone)]
pub enum ResultPayload {
    /// The label that matched no command.
    Label(String),
    /// The permission the caller was missing.
    Permission(String),
    Usage(UsageReport),
    Runtime(RuntimeFailure),
    /// Free-form text attached by a handler.
    Message(String),
}

impl fmt::Display for ResultPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResultPayload::Label(label) => f.write_str(label),
            ResultPayload::Permission(permission) => f.write_str(permission),
            ResultPayload::Usage(report) => write!(f, "{} ({})", report.message(), report.usage),
            ResultPayload::Runtime(failure) => write!(f, "{failure}"),
            ResultPayload::Message(message) => f.write_str(message),
        }
    }
}

/// The outcome of a command call.
///
/// # Examples
///
/// ```
/// use kimiko::core::{CommandResult, ResultKind};
///
/// let denied = CommandResult::permission_denied("admin.kick");
/// assert_eq!(denied.kind(), ResultKind::Permission);
/// assert_eq!(denied.missing_permission(), Some("admin.kick"));
///
/// // The constant is untouched
/// assert!(CommandResult::ERROR_PERMISSION.payload().is_none());
/// ```
#[derive(Debug, Clone)]
pub struct CommandResult {
    kind: ResultKind,
    payload: Option<ResultPayload>,
}

impl CommandResult {
    pub const SUCCESS: Self = Self::of(ResultKind::Success);
    pub const ERROR_NOT_FOUND: Self = Self::of(ResultKind::NotFound);
    pub const ERROR_PERMISSION: Self = Self::of(ResultKind::Permission);
    pub const ERROR_USAGE: Self = Self::of(ResultKind::Usage);
    pub const ERROR_RUNTIME: Self = Self::of(ResultKind::Runtime);

    /// A payload-less result of the given kind.
    pub const fn of(kind: ResultKind) -> Self {
        Self { kind, payload: None }
    }

    /// Derive a result of the same kind carrying `payload`.
    #[must_use]
    pub fn with(&self, payload: ResultPayload) -> Self {
        Self {
            kind: self.kind,
            payload: Some(payload),
        }
    }

    pub fn not_found(label: impl Into<String>) -> Self {
        Self::ERROR_NOT_FOUND.with(ResultPayload::Label(label.into()))
    }

    pub fn permission_denied(permission: impl Into<String>) -> Self {
        Self::ERROR_PERMISSION.with(ResultPayload::Permission(permission.into()))
    }

    pub fn usage(report: UsageReport) -> Self {
        Self::ERROR_USAGE.with(ResultPayload::Usage(report))
    }

    pub fn runtime(failure: RuntimeFailure) -> Self {
        Self::ERROR_RUNTIME.with(ResultPayload::Runtime(failure))
    }

    /// Success carrying a message for the caller.
    pub fn success_with(message: impl Into<String>) -> Self {
        Self::SUCCESS.with(ResultPayload::Message(message.into()))
    }

    #[inline]
    pub fn kind(&self) -> ResultKind {
        self.kind
    }

    #[inline]
    pub fn payload(&self) -> Option<&ResultPayload> {
        self.payload.as_ref()
    }

    #[inline]
    pub fn is_ok(&self) -> bool {
        self.kind == ResultKind::Success
    }

    #[inline]
    pub fn is_not_found(&self) -> bool {
        self.kind == ResultKind::NotFound
    }

    #[inline]
    pub fn is_permission_error(&self) -> bool {
        self.kind == ResultKind::Permission
    }

    #[inline]
    pub fn is_usage_error(&self) -> bool {
        self.kind == ResultKind::Usage
    }

    #[inline]
    pub fn is_runtime_error(&self) -> bool {
        self.kind == ResultKind::Runtime
    }

    /// The unmatched label of a not-found result.
    pub fn label(&self) -> Option<&str> {
        match &self.payload {
            Some(ResultPayload::Label(label)) => Some(label),
            _ => None,
        }
    }

    /// The missing permission of a permission error.
    pub fn missing_permission(&self) -> Option<&str> {
        match &self.payload {
            Some(ResultPayload::Permission(permission)) => Some(permission),
            _ => None,
        }
    }

    pub fn usage_report(&self) -> Option<&UsageReport> {
        match &self.payload {
            Some(ResultPayload::Usage(report)) => Some(report),
            _ => None,
        }
    }

    pub fn runtime_failure(&self) -> Option<&RuntimeFailure> {
        match &self.payload {
            Some(ResultPayload::Runtime(failure)) => Some(failure),
            _ => None,
        }
    }

    pub fn message(&self) -> Option<&str> {
        match &self.payload {
            Some(ResultPayload::Message(message)) => Some(message),
            _ => None,
        }
    }
}

impl Default for CommandResult {
    fn default() -> Self {
        Self::SUCCESS
    }
}

impl fmt::Display for CommandResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.payload {
            Some(payload) => write!(f, "{}: {}", self.kind, payload),
            None => write!(f, "{}", self.kind),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_ids() {
        assert_eq!(ResultKind::Success.id(), "kimiko:success");
        assert_eq!(ResultKind::NotFound.id().name(), "error/not_found");
        assert_eq!(ResultKind::Runtime.to_string(), "kimiko:error/runtime");
    }

    #[test]
    fn test_with_does_not_mutate_constant() {
        let derived = CommandResult::ERROR_USAGE.with(ResultPayload::Message("nope".into()));
        assert!(derived.is_usage_error());
        assert_eq!(derived.message(), Some("nope"));
        assert!(CommandResult::ERROR_USAGE.payload().is_none());
    }

    #[test]
    fn test_predicates() {
        assert!(CommandResult::SUCCESS.is_ok());
        assert!(CommandResult::not_found("x").is_not_found());
        assert!(!CommandResult::not_found("x").is_ok());
        assert!(CommandResult::runtime(RuntimeFailure::Panic("boom".into())).is_runtime_error());
    }

    #[test]
    fn test_display() {
        assert_eq!(CommandResult::SUCCESS.to_string(), "kimiko:success");
        assert_eq!(
            CommandResult::permission_denied("admin").to_string(),
            "kimiko:error/permission: admin"
        );
        let failure = RuntimeFailure::Error(Arc::new(anyhow::anyhow!("disk full")));
        assert_eq!(
            CommandResult::runtime(failure).to_string(),
            "kimiko:error/runtime: disk full"
        );
    }

    #[test]
    fn test_usage_report_message() {
        let report = UsageReport {
            command: Identifier::parse("ns:echo").unwrap(),
            usage: "ns:echo <text:string>".into(),
            error: Some(UsageError::MissingArguments { required: 1, supplied: 0 }),
        };
        assert_eq!(report.error_name(), "MissingArguments");
        assert_eq!(report.message(), "expected at least 1 arguments, got 0");

        let handler_reported = UsageReport { error: None, ..report };
        assert_eq!(handler_reported.error_name(), "UsageError");
        assert_eq!(handler_reported.message(), "usage: ns:echo <text:string>");
    }
}
