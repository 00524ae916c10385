//! Gateway address parsing
//!
//! Endpoints are written `host:port`, optionally prefixed with the `ssl://` or
//! `tls://` scheme found in older provider configuration files. IPv6 hosts use
//! the bracketed form `[::1]:2195`.

use crate::error::{TlsError, TlsResult};
use rustls::pki_types::ServerName;
use std::fmt;

const SCHEMES: [&str; 2] = ["ssl://", "tls://"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayEndpoint {
    host: String,
    port: u16,
}

impl GatewayEndpoint {
    pub fn parse(endpoint: &str) -> TlsResult<Self> {
        let invalid = |reason: &str| TlsError::InvalidEndpoint {
            endpoint: endpoint.to_string(),
            reason: reason.to_string(),
        };

        let mut address = endpoint.trim();
        for scheme in SCHEMES {
            if let Some(rest) = address.strip_prefix(scheme) {
                address = rest;
                break;
            }
        }

        let (host, port) = address
            .rsplit_once(':')
            .ok_or_else(|| invalid("expected host:port"))?;

        let host = host
            .strip_prefix('[')
            .and_then(|h| h.strip_suffix(']'))
            .unwrap_or(host);

        if host.is_empty() {
            return Err(invalid("missing host"));
        }

        let port = port
            .parse::<u16>()
            .map_err(|_| invalid("port must be a number between 0 and 65535"))?;

        Ok(Self {
            host: host.to_string(),
            port,
        })
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Name checked against the gateway certificate (DNS name or IP address)
    pub fn server_name(&self) -> TlsResult<ServerName<'static>> {
        ServerName::try_from(self.host.as_str())
            .map(|name| name.to_owned())
            .map_err(|e| TlsError::InvalidEndpoint {
                endpoint: self.to_string(),
                reason: e.to_string(),
            })
    }
}

impl fmt::Display for GatewayEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.host.contains(':') {
            write!(f, "[{}]:{}", self.host, self.port)
        } else {
            write!(f, "{}:{}", self.host, self.port)
        }
    }
}
