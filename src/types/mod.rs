//! Core types for the promise engine.
//!
//! - [`id`]: Identifier types (`PromiseId`, `TimerId`, `Time`)
//! - [`outcome`]: Observable promise states and panic payloads
//! - [`cancel`]: Cancellation reason and kind types

pub mod cancel;
pub mod id;
pub mod outcome;

pub use cancel::{CancelKind, CancelReason};
pub use id::{PromiseId, Time, TimerId};
pub use outcome::{PanicPayload, PromiseState};
