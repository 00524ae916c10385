//! Client identity loading from a combined certificate + key PEM bundle
//!
//! Push gateways authenticate providers with a single PEM file holding the
//! certificate chain and the private key. The key may be stored in clear
//! (`PRIVATE KEY`, `RSA PRIVATE KEY`, `EC PRIVATE KEY`) or as a PKCS#8
//! `ENCRYPTED PRIVATE KEY` block unlocked with the bundle passphrase.

use crate::error::{TlsError, TlsResult};
use pkcs8::EncryptedPrivateKeyInfo;
use rustls::pki_types::{
    CertificateDer, PrivateKeyDer, PrivatePkcs1KeyDer, PrivatePkcs8KeyDer, PrivateSec1KeyDer,
};
use std::fmt;
use std::fs;
use std::path::Path;
use tracing::debug;

const TAG_CERTIFICATE: &str = "CERTIFICATE";
const TAG_PKCS8_KEY: &str = "PRIVATE KEY";
const TAG_PKCS1_KEY: &str = "RSA PRIVATE KEY";
const TAG_SEC1_KEY: &str = "EC PRIVATE KEY";
const TAG_ENCRYPTED_KEY: &str = "ENCRYPTED PRIVATE KEY";

/// Certificate chain and private key presented during the TLS handshake
///
/// Used for the provider side of the connection and for local gateways.
pub struct CertifiedIdentity {
    cert_chain: Vec<CertificateDer<'static>>,
    private_key: PrivateKeyDer<'static>,
}

impl CertifiedIdentity {
    /// Load the identity from a PEM bundle on disk
    ///
    /// The passphrase is only consulted for encrypted keys.
    pub fn from_bundle_file(path: &Path, passphrase: &str) -> TlsResult<Self> {
        let data = fs::read(path).map_err(|e| TlsError::CertificateReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        Self::from_bundle_pem(&data, passphrase, path)
    }

    /// Parse an in-memory PEM bundle. `origin` is only used in error messages.
    pub fn from_bundle_pem(data: &[u8], passphrase: &str, origin: &Path) -> TlsResult<Self> {
        let blocks = pem::parse_many(data).map_err(|e| TlsError::PemParse {
            path: origin.to_path_buf(),
            message: e.to_string(),
        })?;

        let mut cert_chain = Vec::new();
        let mut private_key = None;

        for block in &blocks {
            let key = match block.tag() {
                TAG_CERTIFICATE => {
                    cert_chain.push(CertificateDer::from(block.contents().to_vec()));
                    continue;
                }
                TAG_PKCS8_KEY => {
                    PrivateKeyDer::Pkcs8(PrivatePkcs8KeyDer::from(block.contents().to_vec()))
                }
                TAG_PKCS1_KEY => {
                    PrivateKeyDer::Pkcs1(PrivatePkcs1KeyDer::from(block.contents().to_vec()))
                }
                TAG_SEC1_KEY => {
                    PrivateKeyDer::Sec1(PrivateSec1KeyDer::from(block.contents().to_vec()))
                }
                TAG_ENCRYPTED_KEY => decrypt_pkcs8(block.contents(), passphrase)?,
                other => {
                    debug!(tag = %other, "Skipping unrelated PEM block in bundle");
                    continue;
                }
            };

            if private_key.replace(key).is_some() {
                return Err(TlsError::MultiplePrivateKeys {
                    path: origin.to_path_buf(),
                });
            }
        }

        if cert_chain.is_empty() {
            return Err(TlsError::MissingCertificate {
                path: origin.to_path_buf(),
            });
        }

        let private_key = private_key.ok_or_else(|| TlsError::MissingPrivateKey {
            path: origin.to_path_buf(),
        })?;

        Ok(Self {
            cert_chain,
            private_key,
        })
    }

    /// Leaf certificate (first certificate of the chain)
    pub fn leaf(&self) -> &CertificateDer<'static> {
        &self.cert_chain[0]
    }

    pub fn chain_len(&self) -> usize {
        self.cert_chain.len()
    }

    /// Split into the parts rustls expects
    pub fn into_parts(self) -> (Vec<CertificateDer<'static>>, PrivateKeyDer<'static>) {
        (self.cert_chain, self.private_key)
    }
}

impl fmt::Debug for CertifiedIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CertifiedIdentity")
            .field("chain_len", &self.cert_chain.len())
            .field("private_key", &"<redacted>")
            .finish()
    }
}

fn decrypt_pkcs8(der: &[u8], passphrase: &str) -> TlsResult<PrivateKeyDer<'static>> {
    let encrypted = EncryptedPrivateKeyInfo::try_from(der)
        .map_err(|e| TlsError::KeyDecryption(e.to_string()))?;

    let document = encrypted
        .decrypt(passphrase)
        .map_err(|e| TlsError::KeyDecryption(e.to_string()))?;

    // A wrong passphrase can still yield valid padding
    pkcs8::PrivateKeyInfo::try_from(document.as_bytes())
        .map_err(|e| TlsError::KeyDecryption(e.to_string()))?;

    Ok(PrivateKeyDer::Pkcs8(PrivatePkcs8KeyDer::from(
        document.as_bytes().to_vec(),
    )))
}
