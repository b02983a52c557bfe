// src/output/mod.rs

//! Diagnostic-stream handling.
//!
//! - [`drain`] pumps a collaborator's stderr into a channel on its own Tokio
//!   task so the collaborator never blocks on a full pipe, and keeps an
//!   ordered transcript of everything handed to the consumer.
//! - [`readiness`] races the first chunk of that stream against a deadline;
//!   this is how every collaborator announces it is alive.

pub mod drain;
pub mod readiness;

pub use drain::{CapturedOutput, DEFAULT_CHUNK_SIZE, OutputDrain};
pub use readiness::{ReadinessGate, ReadinessMarker};
