//! Error types for tessel_core

use thiserror::Error;

use crate::document::ElementId;

/// Errors raised by the host document
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DocumentError {
    /// The element id is stale or was never created by this document
    #[error("unknown element {0:?}")]
    UnknownElement(ElementId),

    /// The element exists but is not a trigger of any disclosure
    #[error("element {0:?} is not a disclosure trigger")]
    NotATrigger(ElementId),
}

/// Errors raised by the selection engine
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ListError {
    /// The option is not a member of the list's owned sequence.
    ///
    /// This is a caller contract violation and is never swallowed by the list.
    #[error("option {0:?} is not owned by this list")]
    NotOwned(ElementId),

    #[error(transparent)]
    Document(#[from] DocumentError),
}

/// Failure while waiting for a custom element definition
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UpgradeError {
    /// The definition was explicitly rejected
    #[error("definition of <{tag}> failed: {reason}")]
    Failed { tag: String, reason: String },

    /// The registry went away before the tag was defined
    #[error("registry closed while waiting for <{0}>")]
    RegistryClosed(String),
}

/// Result type for engine operations
pub type Result<T> = std::result::Result<T, ListError>;
