//! Error types shared by all litectl drivers.

use std::time::Duration;

use thiserror::Error;

/// Errors surfaced by the drivers in this crate.
///
/// Transport failures are propagated unchanged; the drivers never retry on
/// behalf of the caller.
#[derive(Debug, Error)]
pub enum Error {
    /// A transfer parameter exceeds what the hardware registers can carry.
    /// Rejected before any register write, so device state is untouched.
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),

    /// The controller's done flag never asserted within the deadline.
    /// The transaction did not complete and flash state is indeterminate.
    #[error("SPI transfer did not complete within {0:?}")]
    DeviceTimeout(Duration),

    /// The bus has no register under the requested name.
    #[error("unknown register `{0}`")]
    UnknownRegister(String),

    /// The register-access transport itself failed.
    #[error("transport error: {0}")]
    Transport(String),
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Transport(e.to_string())
    }
}

/// Result type alias using the crate error.
pub type Result<T> = std::result::Result<T, Error>;
