//! Failure types and error handling strategy for promissory.
//!
//! Every rejected promise carries a [`Failure`]. Failures are explicit and
//! typed so that rejection handlers can be registered for the variant they
//! accept (see [`Rejection`] and `Promise::otherwise`) instead of inspecting
//! the failure at runtime.
//!
//! # Failure Categories
//!
//! - **User**: raised by a resolver, handler or canceller
//! - **Usage**: programming errors such as self-resolution or a wait-for-N
//!   request larger than its input
//! - **Composition**: a wait-for-N combinator that can no longer reach its target
//! - **Time**: a scheduler-driven timeout fired
//! - **Cancellation**: a canceller rejected its promise with a reason
//! - **Panic**: user code panicked and the panic was contained
//! - **Internal**: engine bugs and invalid states
//!
//! All failures are recoverable by a handler further down the chain. Only a
//! failure that reaches a terminal consumption point without a handler is
//! escalated, wrapped in [`UnhandledRejection`].

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use crate::types::{CancelReason, PanicPayload};

/// The kind of failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// Raised by user code.
    User,
    /// A promise was settled with itself.
    SelfResolution,
    /// A wait-for-N combinator can no longer reach its target.
    Aggregate,
    /// A wait-for-N request exceeded the number of inputs.
    Length,
    /// A timeout fired before the guarded promise settled.
    Timeout,
    /// A canceller rejected the promise.
    Cancelled,
    /// User code panicked.
    Panicked,
    /// Engine bug or invalid state.
    Internal,
}

impl FailureKind {
    /// Returns the category for this kind.
    #[must_use]
    pub const fn category(&self) -> FailureCategory {
        match self {
            Self::User => FailureCategory::User,
            Self::SelfResolution | Self::Length => FailureCategory::Usage,
            Self::Aggregate => FailureCategory::Composition,
            Self::Timeout => FailureCategory::Time,
            Self::Cancelled => FailureCategory::Cancellation,
            Self::Panicked => FailureCategory::Panic,
            Self::Internal => FailureCategory::Internal,
        }
    }

    /// Returns the recoverability classification for this kind.
    ///
    /// Nothing in the engine retries on its own; this is a hint for code
    /// composing retry policies out of promises.
    #[must_use]
    pub const fn recoverability(&self) -> Recoverability {
        match self {
            Self::Timeout | Self::Aggregate => Recoverability::Transient,
            Self::SelfResolution
            | Self::Length
            | Self::Cancelled
            | Self::Panicked
            | Self::Internal => Recoverability::Permanent,
            Self::User => Recoverability::Unknown,
        }
    }

    /// Returns true if this failure is typically retryable.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self.recoverability(), Recoverability::Transient)
    }
}

/// High-level failure category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureCategory {
    /// Failures raised by user code.
    User,
    /// Misuse of the engine API.
    Usage,
    /// Combinator threshold failures.
    Composition,
    /// Timer-driven failures.
    Time,
    /// Cancellation reasons.
    Cancellation,
    /// Contained panics.
    Panic,
    /// Engine bugs.
    Internal,
}

/// Classification of failure recoverability for retry logic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Recoverability {
    /// Temporary failure that may succeed on retry.
    Transient,
    /// Permanent failure that will not succeed on retry.
    Permanent,
    /// Depends on context.
    Unknown,
}

/// A failure raised by user code.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{message}")]
pub struct UserError {
    message: String,
    payload: Option<serde_json::Value>,
    source: Option<Arc<dyn std::error::Error + Send + Sync>>,
}

impl UserError {
    /// Creates a user failure with a message.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            payload: None,
            source: None,
        }
    }

    /// Attaches a structured payload.
    #[must_use]
    pub fn with_payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = Some(payload);
        self
    }

    /// Attaches an underlying error.
    #[must_use]
    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Arc::new(source));
        self
    }

    /// Returns the message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the structured payload, if any.
    #[must_use]
    pub fn payload(&self) -> Option<&serde_json::Value> {
        self.payload.as_ref()
    }
}

impl PartialEq for UserError {
    fn eq(&self, other: &Self) -> bool {
        self.message == other.message && self.payload == other.payload
    }
}

/// A wait-for-N combinator that can no longer reach its target.
///
/// Carries every failure collected up to that point, keyed by input position.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{} of {total} inputs rejected, {required} required to succeed", .reasons.len())]
pub struct AggregateError {
    /// Number of successes the combinator waited for.
    pub required: usize,
    /// Number of inputs.
    pub total: usize,
    /// Collected failures by input index.
    pub reasons: BTreeMap<usize, Failure>,
}

/// A wait-for-N request larger than its input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("input must contain at least {} but contains only {}", self.required_items(), self.supplied_items())]
pub struct LengthError {
    /// Requested number of successes.
    pub required: usize,
    /// Number of inputs supplied.
    pub len: usize,
}

impl LengthError {
    /// Creates a length error.
    #[must_use]
    pub const fn new(required: usize, len: usize) -> Self {
        Self { required, len }
    }

    fn required_items(&self) -> String {
        items(self.required)
    }

    fn supplied_items(&self) -> String {
        items(self.len)
    }
}

fn items(n: usize) -> String {
    if n == 1 {
        "1 item".to_string()
    } else {
        format!("{n} items")
    }
}

/// A timeout fired before the guarded promise settled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("timed out after {} seconds", .after.as_secs_f64())]
pub struct TimeoutError {
    /// The configured timeout.
    pub after: Duration,
}

impl TimeoutError {
    /// Creates a timeout error.
    #[must_use]
    pub const fn new(after: Duration) -> Self {
        Self { after }
    }
}

/// The reason a promise was rejected.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Failure {
    /// Raised by user code.
    #[error(transparent)]
    User(#[from] UserError),
    /// A promise was settled with itself.
    #[error("cannot resolve a promise with itself")]
    SelfResolution,
    /// A wait-for-N combinator can no longer reach its target.
    #[error(transparent)]
    Aggregate(#[from] AggregateError),
    /// A wait-for-N request exceeded the number of inputs.
    #[error(transparent)]
    Length(#[from] LengthError),
    /// A timeout fired.
    #[error(transparent)]
    Timeout(#[from] TimeoutError),
    /// A canceller rejected the promise.
    #[error("cancelled: {0}")]
    Cancelled(CancelReason),
    /// User code panicked.
    #[error("{0}")]
    Panicked(PanicPayload),
    /// Engine bug or invalid state.
    #[error("internal error: {0}")]
    Internal(String),
}

impl Failure {
    /// Creates a user failure with a message.
    #[must_use]
    pub fn user(message: impl Into<String>) -> Self {
        Self::User(UserError::new(message))
    }

    /// Wraps any error as a user failure, keeping it as the source.
    #[must_use]
    pub fn from_error(error: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::User(UserError::new(error.to_string()).with_source(error))
    }

    /// Creates a cancellation failure.
    #[must_use]
    pub const fn cancelled(reason: CancelReason) -> Self {
        Self::Cancelled(reason)
    }

    /// Creates an internal failure.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Returns the failure kind.
    #[must_use]
    pub const fn kind(&self) -> FailureKind {
        match self {
            Self::User(_) => FailureKind::User,
            Self::SelfResolution => FailureKind::SelfResolution,
            Self::Aggregate(_) => FailureKind::Aggregate,
            Self::Length(_) => FailureKind::Length,
            Self::Timeout(_) => FailureKind::Timeout,
            Self::Cancelled(_) => FailureKind::Cancelled,
            Self::Panicked(_) => FailureKind::Panicked,
            Self::Internal(_) => FailureKind::Internal,
        }
    }

    /// Returns true if this failure is a cancellation reason.
    #[must_use]
    pub const fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled(_))
    }

    /// Returns true if this failure is a timeout.
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }
}

impl From<CancelReason> for Failure {
    fn from(reason: CancelReason) -> Self {
        Self::Cancelled(reason)
    }
}

impl From<PanicPayload> for Failure {
    fn from(payload: PanicPayload) -> Self {
        Self::Panicked(payload)
    }
}

/// A failure that reached a terminal consumption point with no handler.
///
/// This is the payload of the escalation raised by `done` when a chain ends
/// in failure; it is never converted back into a rejection.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("unhandled rejection: {failure}")]
pub struct UnhandledRejection {
    #[source]
    failure: Failure,
}

impl UnhandledRejection {
    /// Wraps an escaped failure.
    #[must_use]
    pub const fn new(failure: Failure) -> Self {
        Self { failure }
    }

    /// Returns the escaped failure.
    #[must_use]
    pub const fn failure(&self) -> &Failure {
        &self.failure
    }

    /// Consumes the wrapper, returning the escaped failure.
    #[must_use]
    pub fn into_failure(self) -> Failure {
        self.failure
    }
}

/// A failure variant a rejection handler can be registered for.
///
/// `Promise::otherwise::<E>` only invokes its handler when
/// `E::from_failure` matches; everything else passes through unchanged.
pub trait Rejection: Sized + 'static {
    /// Extracts `Self` from a failure of the matching variant.
    fn from_failure(failure: &Failure) -> Option<Self>;
}

impl Rejection for Failure {
    fn from_failure(failure: &Failure) -> Option<Self> {
        Some(failure.clone())
    }
}

impl Rejection for UserError {
    fn from_failure(failure: &Failure) -> Option<Self> {
        match failure {
            Failure::User(e) => Some(e.clone()),
            _ => None,
        }
    }
}

impl Rejection for AggregateError {
    fn from_failure(failure: &Failure) -> Option<Self> {
        match failure {
            Failure::Aggregate(e) => Some(e.clone()),
            _ => None,
        }
    }
}

impl Rejection for LengthError {
    fn from_failure(failure: &Failure) -> Option<Self> {
        match failure {
            Failure::Length(e) => Some(*e),
            _ => None,
        }
    }
}

impl Rejection for TimeoutError {
    fn from_failure(failure: &Failure) -> Option<Self> {
        match failure {
            Failure::Timeout(e) => Some(*e),
            _ => None,
        }
    }
}

impl Rejection for CancelReason {
    fn from_failure(failure: &Failure) -> Option<Self> {
        match failure {
            Failure::Cancelled(reason) => Some(reason.clone()),
            _ => None,
        }
    }
}

impl Rejection for PanicPayload {
    fn from_failure(failure: &Failure) -> Option<Self> {
        match failure {
            Failure::Panicked(payload) => Some(payload.clone()),
            _ => None,
        }
    }
}

/// Extension trait for turning foreign errors into failures with context.
pub trait ResultExt<T> {
    /// Attach a context message on error.
    fn context(self, msg: impl Into<String>) -> Result<T>;
    /// Attach a context message computed lazily on error.
    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T>;
}

impl<T, E> ResultExt<T> for core::result::Result<T, E>
where
    E: std::error::Error + Send + Sync + 'static,
{
    fn context(self, msg: impl Into<String>) -> Result<T> {
        self.map_err(|e| Failure::User(UserError::new(msg).with_source(e)))
    }

    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T> {
        self.map_err(|e| Failure::User(UserError::new(f()).with_source(e)))
    }
}

/// A specialized Result type for settlement outcomes.
#[allow(clippy::result_large_err)]
pub type Result<T> = core::result::Result<T, Failure>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[derive(Debug, thiserror::Error)]
    #[error("underlying")]
    struct Underlying;

    #[test]
    fn self_resolution_message() {
        assert_eq!(
            Failure::SelfResolution.to_string(),
            "cannot resolve a promise with itself"
        );
    }

    #[test]
    fn length_error_pluralizes() {
        assert_eq!(
            LengthError::new(3, 1).to_string(),
            "input must contain at least 3 items but contains only 1 item"
        );
        assert_eq!(
            LengthError::new(1, 0).to_string(),
            "input must contain at least 1 item but contains only 0 items"
        );
    }

    #[test]
    fn aggregate_error_counts_collected_reasons() {
        let err = AggregateError {
            required: 2,
            total: 3,
            reasons: [(0, Failure::user("a")), (2, Failure::user("b"))].into_iter().collect(),
        };
        assert_eq!(err.to_string(), "2 of 3 inputs rejected, 2 required to succeed");
        assert!(err.source().is_none());
    }

    #[test]
    fn timeout_message_uses_seconds() {
        let err = Failure::from(TimeoutError::new(Duration::from_millis(1500)));
        assert_eq!(err.to_string(), "timed out after 1.5 seconds");
        assert!(err.is_timeout());
        assert!(err.kind().is_retryable());
    }

    #[test]
    fn from_error_keeps_source() {
        let err = Failure::from_error(Underlying);
        assert_eq!(err.to_string(), "underlying");
        let source = err.source().map(ToString::to_string);
        assert_eq!(source.as_deref(), Some("underlying"));
    }

    #[test]
    fn context_wraps_foreign_error() {
        let res: core::result::Result<(), Underlying> = Err(Underlying);
        let err = res.context("loading").unwrap_err();
        assert_eq!(err.to_string(), "loading");
        assert_eq!(err.kind(), FailureKind::User);
        assert!(err.source().is_some());
    }

    #[test]
    fn user_errors_compare_by_message_and_payload() {
        let a = UserError::new("x").with_payload(serde_json::json!({"n": 1}));
        let b = UserError::new("x")
            .with_payload(serde_json::json!({"n": 1}))
            .with_source(Underlying);
        assert_eq!(a, b);
        assert_ne!(a, UserError::new("x"));
    }

    #[test]
    fn rejection_matches_only_its_variant() {
        let timeout = Failure::from(TimeoutError::new(Duration::from_secs(1)));
        assert!(TimeoutError::from_failure(&timeout).is_some());
        assert!(CancelReason::from_failure(&timeout).is_none());
        assert!(Failure::from_failure(&timeout).is_some());

        let cancelled = Failure::cancelled(CancelReason::user("stop"));
        assert_eq!(
            CancelReason::from_failure(&cancelled),
            Some(CancelReason::user("stop"))
        );
        assert!(UserError::from_failure(&cancelled).is_none());
    }

    #[test]
    fn kinds_map_to_categories() {
        assert_eq!(FailureKind::Length.category(), FailureCategory::Usage);
        assert_eq!(
            FailureKind::Aggregate.category(),
            FailureCategory::Composition
        );
        assert_eq!(
            Failure::Panicked(PanicPayload::new("p")).kind().recoverability(),
            Recoverability::Permanent
        );
    }

    #[test]
    fn unhandled_rejection_exposes_failure() {
        let wrapped = UnhandledRejection::new(Failure::user("lost"));
        assert_eq!(wrapped.to_string(), "unhandled rejection: lost");
        assert_eq!(wrapped.failure(), &Failure::user("lost"));
        assert!(wrapped.source().is_some());
    }
}
