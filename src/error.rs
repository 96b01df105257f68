//! Internal error taxonomy.
//!
//! These are control-flow errors exchanged between the state manager and its collaborators
//! (FWD, PORT, FT). They never reach the wire directly — the error encoder (`error_encoder`)
//! maps the subset that must be reported to a controller into a versioned `(Kind, Code)` pair
//! sent out of band via `Connection::send_error`.

use thiserror::Error;

/// Internal error kind, mirroring the taxonomy `NONE, PARAM, RESOURCE, NOT_FOUND, RANGE,
/// NOT_SUPPORTED, UNKNOWN`.
#[derive(Debug, Error, PartialEq, Eq, Clone, Copy)]
pub enum OfsmError {
    /// Argument or message field is invalid for the requested operation.
    #[error("invalid parameter")]
    Param,
    /// Allocation of a bookkeeping resource (flow id, table slot, state struct) failed.
    #[error("resource exhausted")]
    Resource,
    /// The referenced entry, port, or queue does not exist.
    #[error("not found")]
    NotFound,
    /// An index or value is outside its valid range.
    #[error("out of range")]
    Range,
    /// The operation or experimenter id is not supported by this switch.
    #[error("not supported")]
    NotSupported,
    /// An error occurred but does not map to a more specific kind.
    #[error("unknown error")]
    Unknown,
}

/// Result alias used throughout the state-manager core.
///
/// `Ok(())` corresponds to the source's `NONE`: the operation's user-visible effect (a reply, an
/// error, or silence) has already happened via the collaborator traits.
pub type Result<T> = core::result::Result<T, OfsmError>;
