use serde::Deserialize;
use std::fmt;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Production binary-interface gateway
pub const PRODUCTION_GATEWAY: &str = "gateway.push.apple.com:2195";

/// Sandbox binary-interface gateway
pub const SANDBOX_GATEWAY: &str = "gateway.sandbox.push.apple.com:2195";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("[{}] file does not exist.", .path.display())]
    FileNotFound { path: PathBuf },

    #[error("failed to read APNS_* environment: {0}")]
    Env(#[from] envy::Error),
}

/// Raw client parameters as found in configuration files or the environment
#[derive(Debug, Clone, Deserialize)]
pub struct ClientParams {
    /// Gateway address, `host:port`
    pub endpoint: String,
    /// Combined certificate + private key PEM bundle
    pub ssl_pem: PathBuf,
    /// Passphrase protecting the private key in `ssl_pem`
    #[serde(default)]
    pub passphrase: String,
    /// Extra trust anchors for the gateway certificate. The platform trust
    /// store is used when unset.
    #[serde(default)]
    pub ca_pem: Option<PathBuf>,
}

impl ClientParams {
    pub fn new(
        endpoint: impl Into<String>,
        ssl_pem: impl Into<PathBuf>,
        passphrase: impl Into<String>,
    ) -> Self {
        Self {
            endpoint: endpoint.into(),
            ssl_pem: ssl_pem.into(),
            passphrase: passphrase.into(),
            ca_pem: None,
        }
    }

    pub fn with_ca_pem(mut self, ca_pem: impl Into<PathBuf>) -> Self {
        self.ca_pem = Some(ca_pem.into());
        self
    }

    /// Load parameters from `APNS_ENDPOINT`, `APNS_SSL_PEM`, `APNS_PASSPHRASE`
    /// and `APNS_CA_PEM`
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(envy::prefixed("APNS_").from_env::<Self>()?)
    }
}

/// Validated, immutable client configuration
#[derive(Clone)]
pub struct ClientConfiguration {
    endpoint: String,
    certificate_path: PathBuf,
    certificate_passphrase: String,
    ca_cert_path: Option<PathBuf>,
}

impl ClientConfiguration {
    /// Validate `params` and freeze them
    ///
    /// Only the certificate bundle is checked, and only for readability.
    /// The endpoint and passphrase are verified when connecting.
    pub fn setup(params: ClientParams) -> Result<Self, ConfigError> {
        if !is_readable_file(&params.ssl_pem) {
            return Err(ConfigError::FileNotFound {
                path: params.ssl_pem,
            });
        }

        debug!(
            endpoint = %params.endpoint,
            ssl_pem = ?params.ssl_pem,
            "APNs client configured"
        );

        Ok(Self {
            endpoint: params.endpoint,
            certificate_path: params.ssl_pem,
            certificate_passphrase: params.passphrase,
            ca_cert_path: params.ca_pem,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn certificate_path(&self) -> &Path {
        &self.certificate_path
    }

    pub fn certificate_passphrase(&self) -> &str {
        &self.certificate_passphrase
    }

    pub fn ca_cert_path(&self) -> Option<&Path> {
        self.ca_cert_path.as_deref()
    }
}

impl fmt::Debug for ClientConfiguration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfiguration")
            .field("endpoint", &self.endpoint)
            .field("certificate_path", &self.certificate_path)
            .field("certificate_passphrase", &"<redacted>")
            .field("ca_cert_path", &self.ca_cert_path)
            .finish()
    }
}

// Directories open fine on unix, so check the file type first
fn is_readable_file(path: &Path) -> bool {
    fs::metadata(path).map(|m| m.is_file()).unwrap_or(false) && File::open(path).is_ok()
}
