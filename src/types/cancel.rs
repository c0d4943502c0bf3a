//! Why a promise was cancelled.
//!
//! Cancelling a promise is a request: the canceller decides what happens.
//! A well-behaved canceller rejects its promise with a [`CancelReason`],
//! which is why the reason doubles as a failure payload.

use core::fmt;

/// Who asked for the cancellation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CancelKind {
    /// User code called `cancel`.
    User,
    /// A scheduler timer backing the promise was disarmed.
    TimerCancelled,
    /// A composite operation was abandoned and forwarded the request.
    ParentCancelled,
}

impl fmt::Display for CancelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::User => write!(f, "user"),
            Self::TimerCancelled => write!(f, "timer cancelled"),
            Self::ParentCancelled => write!(f, "parent cancelled"),
        }
    }
}

/// The rejection payload of a cancelled promise.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CancelReason {
    /// What triggered the cancellation.
    pub kind: CancelKind,
    /// Optional static context.
    pub message: Option<&'static str>,
}

impl CancelReason {
    /// Creates a reason of the given kind without a message.
    #[must_use]
    pub const fn new(kind: CancelKind) -> Self {
        Self {
            kind,
            message: None,
        }
    }

    /// A user cancellation with a message.
    #[must_use]
    pub const fn user(message: &'static str) -> Self {
        Self {
            kind: CancelKind::User,
            message: Some(message),
        }
    }

    /// The reason a cancelled `delay` rejects with.
    #[must_use]
    pub const fn timer_cancelled() -> Self {
        Self {
            kind: CancelKind::TimerCancelled,
            message: Some("Timer cancelled"),
        }
    }

    /// A cancellation forwarded by an abandoned composite.
    #[must_use]
    pub const fn parent_cancelled() -> Self {
        Self::new(CancelKind::ParentCancelled)
    }

    /// Returns what triggered the cancellation.
    #[must_use]
    pub const fn kind(&self) -> CancelKind {
        self.kind
    }
}

impl Default for CancelReason {
    fn default() -> Self {
        Self::new(CancelKind::User)
    }
}

impl fmt::Display for CancelReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)?;
        if let Some(msg) = self.message {
            write!(f, ": {msg}")?;
        }
        Ok(())
    }
}
