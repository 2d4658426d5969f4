use std::path::PathBuf;

use crate::error_chain_fmt;

/// Every way the secure bootstrap can fail. None of these are retried.
#[derive(thiserror::Error)]
pub enum SecureClientError {
    #[error("Failed to read trust store `{}`", path.display())]
    IoError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Trust store is not a usable keystore: {0}")]
    FormatError(String),
    #[error("Trust store password rejected: {0}")]
    AuthError(String),
    #[error("Unable to build TLS context: {0}")]
    ConfigError(String),
    #[error("Unable to establish a TLS connection to the database server")]
    ConnectionError(#[source] mongodb::error::Error),
    #[error("The database server rejected the write")]
    WriteError(#[source] mongodb::error::Error),
    #[error("Unable to read back from the database server")]
    ReadError(#[source] mongodb::error::Error),
    #[error("Required setting `{setting}` is empty")]
    MissingSettingError { setting: &'static str },
    #[error(transparent)]
    UnexpectedError(#[from] anyhow::Error),
}

impl SecureClientError {
    /// True when the server refused the credentials rather than being unreachable.
    pub fn is_authentication_failure(&self) -> bool {
        match self {
            SecureClientError::ConnectionError(e) => matches!(
                *e.kind,
                mongodb::error::ErrorKind::Authentication { .. }
            ),
            _ => false,
        }
    }
}

impl std::fmt::Debug for SecureClientError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}
