//! Error types shared across the crate.

use crate::state::VmState;

/// Errors raised by `firecrate`.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// An option bag failed schema validation: unknown key, missing
    /// required field, or wrong type.
    #[error("invalid option `{field}`: {reason}")]
    InvalidOption { field: String, reason: String },

    /// A lifecycle operation or mutation is illegal in the current state.
    #[error("operation `{operation}` is illegal in state {state:?}")]
    InvalidState {
        operation: String,
        state: VmState,
    },

    /// An unknown resource key was passed to `configure`/`add`.
    #[error("unknown resource `{0}`")]
    InvalidResource(String),

    /// The external process died during the startup grace window, the
    /// binary was missing, or the socket directory was unwritable.
    #[error("microVM failed to start: {0}")]
    StartupFailure(String),

    /// The REST API returned a non-success status carrying a
    /// `fault_message`.
    #[error("firecracker API error: {0}")]
    Api(String),

    /// Unexpected HTTP status, a decode failure, or another
    /// transport-level problem.
    #[error("transport error: {0}")]
    Transport(String),

    /// Failure to encode a value for the wire or for a config file.
    #[error("failed to encode: {0}")]
    Encode(String),

    /// Failure to decode a value received from the wire.
    #[error("failed to decode: {0}")]
    Decode(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Decode(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn invalid_option(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::InvalidOption {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub fn invalid_state(operation: impl Into<String>, state: VmState) -> Self {
        Error::InvalidState {
            operation: operation.into(),
            state,
        }
    }
}
