//! Single-attempt TLS connect to a push gateway

use crate::endpoint::GatewayEndpoint;
use crate::error::{TlsError, TlsResult};
use rustls::ClientConfig;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio_rustls::client::TlsStream;
use tokio_rustls::TlsConnector;
use tracing::debug;

/// Established gateway connection. Dropping it closes the socket.
pub type GatewayStream = TlsStream<TcpStream>;

#[derive(Clone)]
pub struct GatewayConnector {
    connector: TlsConnector,
}

impl GatewayConnector {
    pub fn new(config: Arc<ClientConfig>) -> Self {
        Self {
            connector: TlsConnector::from(config),
        }
    }

    /// Resolve, connect and complete the TLS handshake within `timeout`
    ///
    /// There is no retry: the first failure is returned.
    pub async fn connect(
        &self,
        endpoint: &GatewayEndpoint,
        timeout: Duration,
    ) -> TlsResult<GatewayStream> {
        let server_name = endpoint.server_name()?;

        let attempt = async {
            let tcp = TcpStream::connect((endpoint.host(), endpoint.port()))
                .await
                .map_err(|e| TlsError::Connect {
                    endpoint: endpoint.to_string(),
                    source: e,
                })?;

            // Frames are tiny and written once
            if let Err(e) = tcp.set_nodelay(true) {
                debug!(endpoint = %endpoint, error = %e, "Failed to disable Nagle on gateway socket");
            }

            debug!(endpoint = %endpoint, "TCP connection established, starting TLS handshake");

            self.connector
                .connect(server_name, tcp)
                .await
                .map_err(|e| TlsError::Handshake {
                    endpoint: endpoint.to_string(),
                    source: e,
                })
        };

        tokio::time::timeout(timeout, attempt)
            .await
            .map_err(|_| TlsError::ConnectTimeout {
                endpoint: endpoint.to_string(),
                timeout,
            })?
    }
}
