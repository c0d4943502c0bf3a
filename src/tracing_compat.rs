//! Logging facade used by the engine.
//!
//! Engine modules import their logging macros from here instead of from
//! `tracing` directly:
//!
//! - **With `tracing-integration`**: the macros are `tracing`'s own, so
//!   promise ids, timer ids and failure kinds arrive as structured fields.
//! - **Without it**: every macro expands to nothing and the crate carries
//!   no logging dependency.
//!
//! ```rust,ignore
//! use promissory::tracing_compat::{debug, trace};
//!
//! trace!(promise = %id, handlers = 2, "promise settled");
//! debug!(handles = 3, "cancellation queue invoked");
//! ```
//!
//! Levels used across the crate: `trace` for per-promise state changes,
//! `debug` for combinator and queue decisions, `warn` for dropped
//! shared-data writes and `error` for unhandled rejections.

#[cfg(feature = "tracing-integration")]
pub use tracing::{debug, error, info, trace, warn};

#[cfg(not(feature = "tracing-integration"))]
mod noop {
    /// Discards a trace-level event.
    #[macro_export]
    macro_rules! trace {
        ($($arg:tt)*) => {};
    }

    /// Discards a debug-level event.
    #[macro_export]
    macro_rules! debug {
        ($($arg:tt)*) => {};
    }

    /// Discards an info-level event.
    #[macro_export]
    macro_rules! info {
        ($($arg:tt)*) => {};
    }

    /// Discards a warn-level event.
    #[macro_export]
    macro_rules! warn {
        ($($arg:tt)*) => {};
    }

    /// Discards an error-level event.
    #[macro_export]
    macro_rules! error {
        ($($arg:tt)*) => {};
    }

    pub use crate::{debug, error, info, trace, warn};
}

#[cfg(not(feature = "tracing-integration"))]
pub use noop::*;
