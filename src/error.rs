use std::path::PathBuf;
use std::process::ExitCode;

use thiserror::Error;

/// Errors raised while preparing data or training the network.
///
/// Every variant is fatal for the current run.
#[derive(Debug, Error)]
pub enum Error {
    /// A curve or label table is missing or malformed.
    #[error("data format error: {0}")]
    DataFormat(String),

    /// The configured bounds do not line up with the label columns.
    #[error("config mismatch: {0}")]
    ConfigMismatch(String),

    /// A value outside the domain of the input transform (log of x <= 0).
    #[error("numeric domain error: {0}")]
    NumericDomain(String),

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("invalid data: {0}")]
    InvalidData(String),

    #[error("invalid shape: {0}")]
    InvalidShape(String),

    #[error("i/o error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }

    /// Process exit code for this error kind.
    pub fn exit_code(&self) -> ExitCode {
        match self {
            Error::DataFormat(_) => ExitCode::from(2),
            Error::ConfigMismatch(_) => ExitCode::from(3),
            Error::NumericDomain(_) => ExitCode::from(4),
            Error::InvalidConfig(_) => ExitCode::from(5),
            Error::InvalidData(_) | Error::InvalidShape(_) => ExitCode::from(6),
            Error::Io { .. } => ExitCode::from(7),
        }
    }
}
