//! TLS plumbing for legacy binary push gateways
//!
//! **Features**:
//! - Client identity loading from a combined certificate + key PEM bundle
//! - Passphrase-protected PKCS#8 keys
//! - Mutual TLS client configuration on rustls (aws-lc-rs provider)
//! - Single-attempt connect with a bounded timeout
//! - Development certificate generation and local gateway server config

use rustls::crypto::{aws_lc_rs, CryptoProvider};
use rustls::pki_types::CertificateDer;
use rustls::{ClientConfig, RootCertStore};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, warn};
use x509_parser::certificate::X509Certificate;
use x509_parser::prelude::FromDer;

pub mod cert_generation;
pub mod connector;
pub mod endpoint;
pub mod error;
pub mod identity;
pub mod server;

pub use cert_generation::{generate_dev_certificates, CertificateBundle};
pub use connector::{GatewayConnector, GatewayStream};
pub use endpoint::GatewayEndpoint;
pub use error::{TlsError, TlsResult};
pub use identity::CertifiedIdentity;
pub use server::build_gateway_server_config;

/// Days before expiry at which the client certificate starts producing warnings
pub const EXPIRY_WARNING_DAYS: u64 = 30;

pub(crate) fn crypto_provider() -> Arc<CryptoProvider> {
    Arc::new(aws_lc_rs::default_provider())
}

/// Build the trust store used to verify the gateway certificate
///
/// With `ca_cert_path` only the certificates from that PEM file are trusted,
/// otherwise the platform trust store is loaded.
pub fn load_trust_roots(ca_cert_path: Option<&Path>) -> TlsResult<RootCertStore> {
    let mut roots = RootCertStore::empty();

    match ca_cert_path {
        Some(path) => {
            let data = fs::read(path).map_err(|e| TlsError::CertificateReadError {
                path: path.to_path_buf(),
                source: e,
            })?;
            for cert in parse_certificates(&data, path)? {
                roots.add(cert)?;
            }
            if roots.is_empty() {
                return Err(TlsError::MissingCertificate {
                    path: path.to_path_buf(),
                });
            }
            debug!(ca_cert = ?path, anchors = roots.len(), "Loaded gateway trust anchors");
        }
        None => {
            let native = rustls_native_certs::load_native_certs()
                .map_err(|e| TlsError::NativeRoots(e.to_string()))?;
            let (added, ignored) = roots.add_parsable_certificates(native);
            if ignored > 0 {
                warn!(ignored, "Ignored unparsable certificates in platform trust store");
            }
            debug!(anchors = added, "Loaded platform trust store");
        }
    }

    Ok(roots)
}

/// Build a rustls client config presenting `identity` for client authentication
pub fn build_client_config(
    identity: CertifiedIdentity,
    roots: RootCertStore,
) -> TlsResult<Arc<ClientConfig>> {
    let (cert_chain, private_key) = identity.into_parts();

    let config = ClientConfig::builder_with_provider(crypto_provider())
        .with_safe_default_protocol_versions()?
        .with_root_certificates(roots)
        .with_client_auth_cert(cert_chain, private_key)?;

    Ok(Arc::new(config))
}

/// Validate certificate expiration
///
/// Returns the number of whole days left. Expired certificates are an error,
/// certificates expiring within `warn_days_before` only log a warning.
pub fn validate_cert_expiration(cert_der: &[u8], warn_days_before: u64) -> TlsResult<i64> {
    let (_, cert) = X509Certificate::from_der(cert_der)
        .map_err(|e| TlsError::CertificateParse(e.to_string()))?;

    let expiry_timestamp = cert.validity().not_after.timestamp();
    let now = chrono::Utc::now().timestamp();

    if expiry_timestamp < now {
        return Err(TlsError::CertificateExpired {
            days_ago: (now - expiry_timestamp) / 86400,
        });
    }

    let days_until_expiry = (expiry_timestamp - now) / 86400;

    if days_until_expiry < warn_days_before as i64 {
        warn!(
            days_remaining = days_until_expiry,
            "Push certificate expiring soon - renewal recommended"
        );
    } else {
        debug!(
            days_until_expiry = days_until_expiry,
            "Push certificate validity check passed"
        );
    }

    Ok(days_until_expiry)
}

pub(crate) fn parse_certificates(data: &[u8], origin: &Path) -> TlsResult<Vec<CertificateDer<'static>>> {
    let blocks = pem::parse_many(data).map_err(|e| TlsError::PemParse {
        path: origin.to_path_buf(),
        message: e.to_string(),
    })?;

    Ok(blocks
        .iter()
        .filter(|block| block.tag() == "CERTIFICATE")
        .map(|block| CertificateDer::from(block.contents().to_vec()))
        .collect())
}
