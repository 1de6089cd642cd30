use cdrs_tokio::cluster::session::SessionBuildError;
use std::path::PathBuf;
use std::result;
use thiserror::Error as ThisError;
use tokio_rustls::rustls;

pub type Result<T> = result::Result<T, Error>;

/// Errors raised while turning a connection string into a live session. Nothing here is
/// retried; every failure is handed back to the caller.
#[derive(Debug, ThisError)]
pub enum Error {
    /// The connection string could not be parsed.
    #[error(transparent)]
    Uri(#[from] cassandra_uri::Error),
    /// Secret store coordinates were given, but the password could not be resolved from them.
    #[error("Secret resolution error for {coordinate}: {reason}")]
    SecretResolution { coordinate: String, reason: String },
    /// Key or trust store material is present but unusable.
    #[error("TLS configuration error: {0}")]
    TlsConfiguration(String),
    /// A host specifier carries a port which is not a valid port number.
    #[error("Invalid contact point '{host}': {reason}")]
    InvalidContactPoint { host: String, reason: String },
    /// The driver configuration file could not be read or understood.
    #[error("Driver configuration error in {}: {reason}", path.display())]
    DriverConfig { path: PathBuf, reason: String },
    /// The cluster could not be reached, rejected the credentials or failed the handshake.
    #[error("Connection error: {0}")]
    Connection(#[from] cdrs_tokio::error::Error),
}

impl From<rustls::Error> for Error {
    fn from(error: rustls::Error) -> Self {
        Error::TlsConfiguration(error.to_string())
    }
}

impl From<SessionBuildError> for Error {
    fn from(error: SessionBuildError) -> Self {
        match error {
            // compression is only ever set from the driver configuration file
            SessionBuildError::CompressionTypeNotSupported => Error::DriverConfig {
                path: PathBuf::new(),
                reason: error.to_string(),
            },
            SessionBuildError::SessionInitFailed => {
                Error::Connection(cdrs_tokio::error::Error::General(error.to_string()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_init_failure_is_connection_error() {
        let error = Error::from(SessionBuildError::SessionInitFailed);

        assert!(matches!(
            error,
            Error::Connection(cdrs_tokio::error::Error::General(_))
        ));
        assert!(error.to_string().starts_with("Connection error:"));
    }

    #[test]
    fn test_unsupported_compression_is_driver_config_error() {
        let error = Error::from(SessionBuildError::CompressionTypeNotSupported);

        assert!(matches!(error, Error::DriverConfig { .. }));
        assert!(error.to_string().contains("compression type is not supported"));
    }
}
