// src/process/mod.rs

//! Collaborator process lifecycle.
//!
//! - [`spec`] describes how to launch one collaborator.
//! - [`managed`] owns a running collaborator and its single teardown.
//! - [`scope`] collects launched processes and tears all of them down, once,
//!   whatever happened in between.
//! - [`signal`] is the only place that knows how a graceful-termination
//!   request is delivered on the host platform.

pub mod managed;
pub mod scope;
pub mod signal;
pub mod spec;

pub use managed::ManagedProcess;
pub use scope::{ProcessScope, TeardownRecord};
pub use spec::ProcessSpec;
