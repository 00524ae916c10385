//! Certificate Generation for Development and Testing
//!
//! Generates a throwaway CA plus gateway and provider certificates so the push
//! client can be exercised against a local TLS gateway.
//! **WARNING**: NEVER use in production - push gateways only accept
//! certificates issued by the platform vendor.

use anyhow::{anyhow, Context, Result};
use rcgen::{BasicConstraints, CertificateParams, DistinguishedName, DnType, IsCa, SanType};
use std::fs;
use std::path::Path;
use tracing::info;

/// Bundle of certificates for development
#[derive(Clone)]
pub struct CertificateBundle {
    /// CA certificate (PEM)
    pub ca_cert: String,
    /// CA private key (PEM)
    pub ca_key: String,
    /// Gateway certificate signed by CA (PEM)
    pub gateway_cert: String,
    /// Gateway private key (PEM)
    pub gateway_key: String,
    /// Provider (client) certificate signed by CA (PEM)
    pub client_cert: String,
    /// Provider (client) private key, unencrypted PKCS#8 (PEM)
    pub client_key: String,
}

impl CertificateBundle {
    /// Combined certificate + key file, the layout push providers ship
    pub fn client_bundle_pem(&self) -> String {
        format!("{}{}", self.client_cert, self.client_key)
    }

    /// Combined bundle whose key is encrypted with `passphrase`
    pub fn encrypted_client_bundle_pem(&self, passphrase: &str) -> Result<String> {
        let key = encrypt_private_key_pem(&self.client_key, passphrase)?;
        Ok(format!("{}{}", self.client_cert, key))
    }
}

/// Generate development certificates (CA, gateway, client)
///
/// **Usage**: Development and testing only
/// **Subject**: CN=Nova Push Development CA / CN=localhost / CN=push-provider
pub fn generate_dev_certificates() -> Result<CertificateBundle> {
    // 1. CA
    let mut ca_params = CertificateParams::default();
    ca_params.distinguished_name = DistinguishedName::new();
    ca_params
        .distinguished_name
        .push(DnType::CommonName, "Nova Push Development CA");
    ca_params
        .distinguished_name
        .push(DnType::OrganizationName, "Nova Development");
    ca_params.is_ca = IsCa::Ca(BasicConstraints::Unconstrained);

    let ca_keypair = rcgen::KeyPair::generate()?;
    let ca_cert = ca_params
        .self_signed(&ca_keypair)
        .context("Failed to generate CA certificate")?;

    // 2. Gateway certificate
    let mut gateway_params = CertificateParams::default();
    gateway_params.distinguished_name = DistinguishedName::new();
    gateway_params
        .distinguished_name
        .push(DnType::CommonName, "localhost");
    gateway_params.subject_alt_names.push(SanType::DnsName(
        "localhost"
            .try_into()
            .context("Failed to create SAN for localhost")?,
    ));
    gateway_params
        .subject_alt_names
        .push(SanType::IpAddress(std::net::IpAddr::V4(
            std::net::Ipv4Addr::LOCALHOST,
        )));

    let gateway_keypair = rcgen::KeyPair::generate()?;
    let gateway_cert = gateway_params
        .signed_by(&gateway_keypair, &ca_cert, &ca_keypair)
        .context("Failed to sign gateway certificate")?;

    // 3. Provider certificate
    let mut client_params = CertificateParams::default();
    client_params.distinguished_name = DistinguishedName::new();
    client_params
        .distinguished_name
        .push(DnType::CommonName, "push-provider");
    client_params
        .distinguished_name
        .push(DnType::OrganizationName, "Nova Development");

    let client_keypair = rcgen::KeyPair::generate()?;
    let client_cert = client_params
        .signed_by(&client_keypair, &ca_cert, &ca_keypair)
        .context("Failed to sign client certificate")?;

    info!("Generated development certificates (CA, gateway, client)");

    Ok(CertificateBundle {
        ca_cert: ca_cert.pem(),
        ca_key: ca_keypair.serialize_pem(),
        gateway_cert: gateway_cert.pem(),
        gateway_key: gateway_keypair.serialize_pem(),
        client_cert: client_cert.pem(),
        client_key: client_keypair.serialize_pem(),
    })
}

/// Re-encode an unencrypted PKCS#8 key as `ENCRYPTED PRIVATE KEY` (PBES2)
pub fn encrypt_private_key_pem(key_pem: &str, passphrase: &str) -> Result<String> {
    let block = pem::parse(key_pem).context("Failed to parse private key PEM")?;

    let info = pkcs8::PrivateKeyInfo::try_from(block.contents())
        .map_err(|e| anyhow!("Failed to decode PKCS#8 key: {}", e))?;

    let encrypted = info
        .encrypt(pkcs8::rand_core::OsRng, passphrase.as_bytes())
        .map_err(|e| anyhow!("Failed to encrypt private key: {}", e))?;

    let pem = encrypted
        .to_pem("ENCRYPTED PRIVATE KEY", pkcs8::LineEnding::LF)
        .map_err(|e| anyhow!("Failed to encode encrypted key: {}", e))?;

    Ok(pem.as_str().to_owned())
}

/// Write certificate bundle to files
///
/// Creates directory structure:
/// ```text
/// certs/
///   ca.crt        (CA certificate)
///   gateway.crt   (Gateway certificate)
///   gateway.key   (Gateway private key)
///   client.pem    (Provider certificate + key)
/// ```
pub fn write_cert_bundle(bundle: &CertificateBundle, output_dir: &Path) -> Result<()> {
    fs::create_dir_all(output_dir)
        .with_context(|| format!("Failed to create directory: {:?}", output_dir))?;

    fs::write(output_dir.join("ca.crt"), &bundle.ca_cert)
        .context("Failed to write CA certificate")?;

    fs::write(output_dir.join("gateway.crt"), &bundle.gateway_cert)
        .context("Failed to write gateway certificate")?;
    fs::write(output_dir.join("gateway.key"), &bundle.gateway_key)
        .context("Failed to write gateway key")?;

    fs::write(output_dir.join("client.pem"), bundle.client_bundle_pem())
        .context("Failed to write client bundle")?;

    info!(output_dir = ?output_dir, "Certificate bundle written to disk");
    Ok(())
}
