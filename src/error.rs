//! Rejected user input.
//!
//! None of these are fatal: the multiplexer shows the `Display` text as a
//! transient status message and leaves its state unchanged.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MuxError {
    #[error("pane too small to split")]
    PaneTooSmall,

    #[error("unknown command: {0}")]
    UnknownCommand(String),

    #[error("{command}: missing argument for {flag}")]
    MissingArgument { command: String, flag: String },

    #[error("{command}: invalid argument: {value}")]
    InvalidArgument { command: String, value: String },

    #[error("can't find session: {0}")]
    SessionNotFound(String),

    #[error("duplicate session: {0}")]
    DuplicateSession(String),

    #[error("window index out of range: {0}")]
    WindowOutOfRange(usize),

    #[error("pane index out of range: {0}")]
    PaneOutOfRange(usize),

    #[error("no buffer to paste")]
    EmptyBuffer,
}

pub type Result<T> = std::result::Result<T, MuxError>;
