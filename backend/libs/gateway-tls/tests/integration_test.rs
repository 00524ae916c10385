//! Integration tests for mutual TLS between the push client and a local gateway

use gateway_tls::{
    build_client_config, build_gateway_server_config,
    cert_generation::{generate_dev_certificates, write_cert_bundle, CertificateBundle},
    load_trust_roots, CertifiedIdentity, GatewayConnector, GatewayEndpoint, TlsError,
};
use std::time::Duration;
use tempfile::TempDir;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio_rustls::TlsAcceptor;

/// Setup test environment with certificates written to disk
fn setup_test_env() -> (TempDir, CertificateBundle) {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();

    let temp_dir = TempDir::new().unwrap();
    let bundle = generate_dev_certificates().unwrap();
    write_cert_bundle(&bundle, temp_dir.path()).unwrap();
    (temp_dir, bundle)
}

fn client_connector(temp: &TempDir, passphrase: &str) -> GatewayConnector {
    let identity =
        CertifiedIdentity::from_bundle_file(&temp.path().join("client.pem"), passphrase).unwrap();
    let roots = load_trust_roots(Some(&temp.path().join("ca.crt"))).unwrap();
    GatewayConnector::new(build_client_config(identity, roots).unwrap())
}

/// Gateway that reads one connection to EOF and reports what it received
async fn spawn_gateway(bundle: &CertificateBundle) -> (u16, oneshot::Receiver<std::io::Result<Vec<u8>>>) {
    let config =
        build_gateway_server_config(&bundle.gateway_cert, &bundle.gateway_key, &bundle.ca_cert)
            .unwrap();
    let acceptor = TlsAcceptor::from(config);
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let (tx, rx) = oneshot::channel();

    tokio::spawn(async move {
        let (socket, _) = listener.accept().await.unwrap();
        let result = async {
            let mut tls = acceptor.accept(socket).await?;
            let mut received = Vec::new();
            tls.read_to_end(&mut received).await?;
            Ok::<_, std::io::Error>(received)
        }
        .await;
        let _ = tx.send(result);
    });

    (port, rx)
}

#[tokio::test]
async fn test_mutual_tls_round_trip() {
    let (temp, bundle) = setup_test_env();
    let (port, received) = spawn_gateway(&bundle).await;

    let endpoint = GatewayEndpoint::parse(&format!("localhost:{port}")).unwrap();
    let mut stream = client_connector(&temp, "")
        .connect(&endpoint, Duration::from_secs(5))
        .await
        .expect("handshake should succeed");

    stream.write_all(b"hello gateway").await.unwrap();
    stream.shutdown().await.unwrap();

    let received = received.await.unwrap().unwrap();
    assert_eq!(received, b"hello gateway");
}

#[tokio::test]
async fn test_encrypted_bundle_round_trip() {
    let (temp, bundle) = setup_test_env();
    let encrypted = bundle.encrypted_client_bundle_pem("bundle-pass").unwrap();
    std::fs::write(temp.path().join("client.pem"), encrypted).unwrap();

    let (port, received) = spawn_gateway(&bundle).await;

    let endpoint = GatewayEndpoint::parse(&format!("127.0.0.1:{port}")).unwrap();
    let mut stream = client_connector(&temp, "bundle-pass")
        .connect(&endpoint, Duration::from_secs(5))
        .await
        .expect("handshake should succeed");

    stream.write_all(&[0u8, 0, 32]).await.unwrap();
    stream.shutdown().await.unwrap();

    assert_eq!(received.await.unwrap().unwrap(), vec![0u8, 0, 32]);
}

#[tokio::test]
async fn test_untrusted_gateway_certificate() {
    let (temp, _) = setup_test_env();
    // Gateway signed by an unrelated CA
    let other = generate_dev_certificates().unwrap();
    let (port, received) = spawn_gateway(&other).await;

    let endpoint = GatewayEndpoint::parse(&format!("localhost:{port}")).unwrap();
    let result = client_connector(&temp, "")
        .connect(&endpoint, Duration::from_secs(5))
        .await;

    assert!(matches!(result, Err(TlsError::Handshake { .. })));
    assert!(received.await.unwrap().is_err());
}

#[tokio::test]
async fn test_silent_peer_times_out() {
    let (temp, _) = setup_test_env();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    tokio::spawn(async move {
        // Accept but never answer the ClientHello
        let (_socket, _) = listener.accept().await.unwrap();
        tokio::time::sleep(Duration::from_secs(10)).await;
    });

    let endpoint = GatewayEndpoint::parse(&format!("127.0.0.1:{port}")).unwrap();
    let result = client_connector(&temp, "")
        .connect(&endpoint, Duration::from_millis(200))
        .await;

    match result {
        Err(TlsError::ConnectTimeout { timeout, .. }) => {
            assert_eq!(timeout, Duration::from_millis(200));
        }
        other => panic!("Expected ConnectTimeout, got {:?}", other.map(|_| ())),
    }
}
