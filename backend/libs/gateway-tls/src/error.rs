//! Error types for gateway TLS setup and connection

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Result alias used across the crate
pub type TlsResult<T> = Result<T, TlsError>;

#[derive(Debug, Error)]
pub enum TlsError {
    #[error("failed to read certificate file {path:?}: {source}")]
    CertificateReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse PEM data in {path:?}: {message}")]
    PemParse { path: PathBuf, message: String },

    #[error("no certificate found in {path:?}")]
    MissingCertificate { path: PathBuf },

    #[error("no private key found in {path:?}")]
    MissingPrivateKey { path: PathBuf },

    #[error("more than one private key found in {path:?}")]
    MultiplePrivateKeys { path: PathBuf },

    #[error("failed to decrypt private key (wrong passphrase?): {0}")]
    KeyDecryption(String),

    #[error("failed to parse X.509 certificate: {0}")]
    CertificateParse(String),

    #[error("certificate expired {days_ago} day(s) ago")]
    CertificateExpired { days_ago: i64 },

    #[error("failed to load platform trust store: {0}")]
    NativeRoots(String),

    #[error("invalid gateway endpoint '{endpoint}': {reason}")]
    InvalidEndpoint { endpoint: String, reason: String },

    #[error("TLS configuration error: {0}")]
    Rustls(#[from] rustls::Error),

    #[error("client certificate verifier error: {0}")]
    Verifier(String),

    #[error("connection to {endpoint} timed out after {timeout:?}")]
    ConnectTimeout { endpoint: String, timeout: Duration },

    #[error("connection to {endpoint} failed: {source}")]
    Connect {
        endpoint: String,
        #[source]
        source: std::io::Error,
    },

    #[error("TLS handshake with {endpoint} failed: {source}")]
    Handshake {
        endpoint: String,
        #[source]
        source: std::io::Error,
    },
}
