//! Session startup errors.
//!
//! Everything here is a missing-precondition failure surfaced before any
//! frame runs. Per-frame conditions (no hit, no touches, sub-threshold pinch)
//! are not errors and never reach this type.

use thiserror::Error;

use crate::scene::ModelKey;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    /// The configured model key is not registered with the scene host.
    #[error("{0} is not registered with the scene host")]
    UnknownModel(ModelKey),

    /// A configuration field holds a value the session cannot run with.
    #[error("invalid session configuration: {0}")]
    InvalidConfig(&'static str),
}
