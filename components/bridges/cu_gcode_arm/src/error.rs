use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by the arm link and its configuration.
///
/// A command that is not acknowledged is not an error: [`crate::ArmLink::send`]
/// reports it as `false` and leaves the retry decision to the caller.
#[derive(Debug, Error)]
pub enum ArmError {
    /// The production serial endpoint could not be opened.
    #[error("arm connection failed on {port}: {source}")]
    ConnectionFailed {
        port: String,
        #[source]
        source: serialport::Error,
    },

    /// Strict mode parsing met a value other than a known mode name.
    #[error("unknown arm mode '{0}' (expected 'simulated' or 'production')")]
    UnknownMode(String),

    #[error("cannot access config file {}: {source}", path.display())]
    Config {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("bad config JSON in {}: {source}", path.display())]
    ConfigFormat {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("serial port enumeration failed: {0}")]
    PortDiscovery(#[source] serialport::Error),
}

pub type ArmResult<T> = Result<T, ArmError>;
