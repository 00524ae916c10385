//! Server-side TLS config for local gateways (sandboxes, integration tests)
//!
//! Mirrors what a real push gateway enforces: the provider must present a
//! certificate issued by `client_ca_pem`.

use crate::error::{TlsError, TlsResult};
use crate::identity::CertifiedIdentity;
use rustls::server::WebPkiClientVerifier;
use rustls::{RootCertStore, ServerConfig};
use std::path::Path;
use std::sync::Arc;
use tracing::info;

pub fn build_gateway_server_config(
    cert_pem: &str,
    key_pem: &str,
    client_ca_pem: &str,
) -> TlsResult<Arc<ServerConfig>> {
    let identity = CertifiedIdentity::from_bundle_pem(
        format!("{cert_pem}{key_pem}").as_bytes(),
        "",
        Path::new("<gateway identity>"),
    )?;
    let (cert_chain, private_key) = identity.into_parts();

    let mut client_roots = RootCertStore::empty();
    for cert in crate::parse_certificates(client_ca_pem.as_bytes(), Path::new("<client ca>"))? {
        client_roots.add(cert)?;
    }

    let provider = crate::crypto_provider();

    let verifier = WebPkiClientVerifier::builder_with_provider(Arc::new(client_roots), provider.clone())
        .build()
        .map_err(|e| TlsError::Verifier(e.to_string()))?;

    let config = ServerConfig::builder_with_provider(provider)
        .with_safe_default_protocol_versions()?
        .with_client_cert_verifier(verifier)
        .with_single_cert(cert_chain, private_key)?;

    info!("Gateway TLS config built with mandatory client certificate verification");

    Ok(Arc::new(config))
}
