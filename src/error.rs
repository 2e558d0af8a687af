//! Error types for the core dump server.

use std::path::PathBuf;

use thiserror::Error;

/// Fatal errors raised while locating, decoding, or mapping a core dump.
///
/// Every variant here aborts the connection attempt before any protocol
/// traffic is exchanged. Serving a partially decoded snapshot would hand
/// the debugger stale or truncated memory, so nothing in this enum is
/// recoverable at the protocol layer.
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("cannot find dump delimiter: {0}")]
    MarkerNotFound(&'static str),

    #[error("malformed dump record: {0}")]
    DumpJson(#[from] serde_json::Error),

    #[error("invalid base64 in dump entry '{name}': {source}")]
    Base64 {
        name: String,
        source: base64::DecodeError,
    },

    #[error("dump record has no register blob")]
    MissingRegisters,

    #[error("dump region '{0}' has no address")]
    MissingAddress(String),

    #[error("region '{0}' overflows the address space")]
    RegionOverflow(String),

    #[error("firmware filename {0:?} is not a hex load offset")]
    BadFirmwareName(PathBuf),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, CoreError>;
