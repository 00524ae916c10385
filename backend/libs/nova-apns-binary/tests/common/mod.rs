//! Local TLS gateway for exercising the push client end to end

#![allow(dead_code)]

use gateway_tls::cert_generation::{generate_dev_certificates, write_cert_bundle, CertificateBundle};
use gateway_tls::build_gateway_server_config;
use nova_apns_binary::ClientParams;
use std::path::PathBuf;
use tempfile::TempDir;
use tokio::io::AsyncReadExt;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio_rustls::TlsAcceptor;

pub struct Certificates {
    pub dir: TempDir,
    pub bundle: CertificateBundle,
}

impl Certificates {
    pub fn generate() -> Self {
        let dir = TempDir::new().unwrap();
        let bundle = generate_dev_certificates().unwrap();
        write_cert_bundle(&bundle, dir.path()).unwrap();
        Self { dir, bundle }
    }

    pub fn client_pem(&self) -> PathBuf {
        self.dir.path().join("client.pem")
    }

    pub fn ca_pem(&self) -> PathBuf {
        self.dir.path().join("ca.crt")
    }

    /// Replace the client bundle with a passphrase-protected copy
    pub fn encrypt_client_key(&self, passphrase: &str) {
        let pem = self.bundle.encrypted_client_bundle_pem(passphrase).unwrap();
        std::fs::write(self.client_pem(), pem).unwrap();
    }

    pub fn params(&self, endpoint: &str, passphrase: &str) -> ClientParams {
        ClientParams::new(endpoint, self.client_pem(), passphrase).with_ca_pem(self.ca_pem())
    }
}

/// What the gateway saw on its single connection
#[derive(Debug)]
pub enum Received {
    /// Bytes read until the client closed the connection
    Frame(Vec<u8>),
    /// TLS handshake or read failed
    Failed(String),
}

pub struct MockGateway {
    pub port: u16,
    received: oneshot::Receiver<Received>,
}

impl MockGateway {
    /// Start a gateway presenting `bundle`'s certificate and requiring client
    /// certificates issued by `bundle`'s CA
    pub async fn start(bundle: &CertificateBundle) -> Self {
        let config =
            build_gateway_server_config(&bundle.gateway_cert, &bundle.gateway_key, &bundle.ca_cert)
                .unwrap();
        let acceptor = TlsAcceptor::from(config);
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let (tx, rx) = oneshot::channel();

        tokio::spawn(async move {
            let Ok((socket, _)) = listener.accept().await else {
                return;
            };
            let received = match acceptor.accept(socket).await {
                Ok(mut tls) => {
                    let mut buf = Vec::new();
                    match tls.read_to_end(&mut buf).await {
                        Ok(_) => Received::Frame(buf),
                        Err(e) => Received::Failed(e.to_string()),
                    }
                }
                Err(e) => Received::Failed(e.to_string()),
            };
            let _ = tx.send(received);
        });

        Self { port, received: rx }
    }

    pub fn endpoint(&self) -> String {
        format!("localhost:{}", self.port)
    }

    pub async fn received(self) -> Received {
        self.received.await.unwrap()
    }
}

/// Decoded view of a binary frame
#[derive(Debug)]
pub struct ParsedFrame {
    pub command: u8,
    pub token_length: u16,
    pub token: Vec<u8>,
    pub payload_length: u16,
    pub payload: Vec<u8>,
}

pub fn parse_frame(bytes: &[u8]) -> ParsedFrame {
    assert!(bytes.len() >= 21, "frame shorter than header: {} bytes", bytes.len());
    ParsedFrame {
        command: bytes[0],
        token_length: u16::from_be_bytes([bytes[1], bytes[2]]),
        token: bytes[3..19].to_vec(),
        payload_length: u16::from_be_bytes([bytes[19], bytes[20]]),
        payload: bytes[21..].to_vec(),
    }
}

/// A port with nothing listening on it
pub fn closed_port() -> u16 {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap().port()
}

/// A peer that accepts TCP connections and never answers the TLS handshake
pub async fn silent_peer() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            held.push(socket);
        }
    });

    port
}
