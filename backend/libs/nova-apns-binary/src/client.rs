use std::sync::Arc;
use std::time::Duration;

use gateway_tls::{
    build_client_config, load_trust_roots, validate_cert_expiration, CertifiedIdentity,
    GatewayConnector, GatewayEndpoint, GatewayStream, TlsResult, EXPIRY_WARNING_DAYS,
};
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tracing::{debug, error, info, warn};

use crate::config::{ClientConfiguration, ClientParams, ConfigError};
use crate::error::{ApnsError, PushError};
use crate::frame::{decode_device_token, WireFrame};
use crate::message::NotificationMessage;
use crate::payload::Payload;
use crate::profiler::{Profiler, ProfilingEvent, PushOutcome};

/// Prefix of profiling labels
pub const PLATFORM_TAG: &str = "Ios";

/// Upper bound for resolving, connecting and completing the TLS handshake
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Outcome message recorded when a push future is dropped before finishing
pub const CANCELLED_MESSAGE: &str = "push cancelled";

/// Trait for mobile push platforms
#[async_trait::async_trait]
pub trait MobileClient: Send + Sync {
    /// Deliver one notification
    ///
    /// # Returns
    /// `Ok(())` once the frame has been handed to the gateway; nothing is read
    /// back from it.
    async fn push(&self, message: &NotificationMessage) -> Result<(), ApnsError>;
}

pub type DynMobileClient = Box<dyn MobileClient>;

/// Apple Push Notification service client speaking the legacy binary interface
///
/// Each push opens its own connection, writes one frame and closes it.
#[derive(Clone)]
pub struct AppleMobileClient {
    config: ClientConfiguration,
    profiler: Arc<dyn Profiler>,
}

impl AppleMobileClient {
    pub fn new(config: ClientConfiguration, profiler: Arc<dyn Profiler>) -> Self {
        Self { config, profiler }
    }

    /// Validate `params` and build the client in one step
    pub fn setup(params: ClientParams, profiler: Arc<dyn Profiler>) -> Result<Self, ConfigError> {
        Ok(Self::new(ClientConfiguration::setup(params)?, profiler))
    }

    pub fn config(&self) -> &ClientConfiguration {
        &self.config
    }

    async fn dispatch(&self, message: &NotificationMessage) -> Result<(), ApnsError> {
        let payload = Payload::from_message(message).to_json()?;

        // Malformed tokens are rejected before any socket is opened
        let token = decode_device_token(&message.device_token)?;
        let frame = WireFrame::encode(&token, &payload)?;

        info!(
            endpoint = %self.config.endpoint(),
            "Connecting to Apple Push Notification server"
        );
        let mut stream = self.connect().await?;

        info!(
            device_token = %message.device_token,
            payload = %String::from_utf8_lossy(&payload),
            "Sending message to Apple Push Notification server"
        );
        send_frame(&mut stream, &frame).await?;

        if let Err(e) = stream.shutdown().await {
            warn!(error = %e, "Failed to close gateway connection cleanly");
        }

        debug!(frame_len = frame.len(), "Notification frame delivered");
        Ok(())
    }

    async fn connect(&self) -> Result<GatewayStream, PushError> {
        self.open_connection()
            .await
            .map_err(|source| PushError::Connect {
                endpoint: self.config.endpoint().to_string(),
                source,
            })
    }

    async fn open_connection(&self) -> TlsResult<GatewayStream> {
        let endpoint = GatewayEndpoint::parse(self.config.endpoint())?;

        let identity = CertifiedIdentity::from_bundle_file(
            self.config.certificate_path(),
            self.config.certificate_passphrase(),
        )?;
        validate_cert_expiration(identity.leaf(), EXPIRY_WARNING_DAYS)?;

        let roots = load_trust_roots(self.config.ca_cert_path())?;
        let tls_config = build_client_config(identity, roots)?;

        GatewayConnector::new(tls_config)
            .connect(&endpoint, CONNECT_TIMEOUT)
            .await
    }
}

#[async_trait::async_trait]
impl MobileClient for AppleMobileClient {
    async fn push(&self, message: &NotificationMessage) -> Result<(), ApnsError> {
        let span = ProfilingGuard::start(
            self.profiler.as_ref(),
            &format!("{} : {}", PLATFORM_TAG, message.body),
        );

        let result = self.dispatch(message).await;

        let outcome = match &result {
            Ok(()) => PushOutcome::success(),
            Err(e) => {
                error!(error = %e, "APNs push failed");
                PushOutcome::failure(e.to_string())
            }
        };
        span.stop(&outcome);

        result
    }
}

/// Open profiling event that is stopped exactly once
///
/// Dropping it while still armed (the push future was cancelled) stops the
/// event with [`CANCELLED_MESSAGE`].
struct ProfilingGuard<'a> {
    profiler: &'a dyn Profiler,
    event: Option<ProfilingEvent>,
}

impl<'a> ProfilingGuard<'a> {
    fn start(profiler: &'a dyn Profiler, label: &str) -> Self {
        Self {
            profiler,
            event: Some(profiler.start_profiling(label)),
        }
    }

    fn stop(mut self, outcome: &PushOutcome) {
        if let Some(event) = self.event.take() {
            self.profiler.stop_profiling(event, outcome);
        }
    }
}

impl Drop for ProfilingGuard<'_> {
    fn drop(&mut self) {
        if let Some(event) = self.event.take() {
            warn!(label = %event.label(), "APNs push cancelled before completion");
            self.profiler
                .stop_profiling(event, &PushOutcome::failure(CANCELLED_MESSAGE));
        }
    }
}

/// Write the whole frame and flush it
async fn send_frame<W>(stream: &mut W, frame: &WireFrame) -> Result<(), PushError>
where
    W: AsyncWrite + Unpin,
{
    async {
        stream.write_all(frame.as_bytes()).await?;
        stream.flush().await
    }
    .await
    .map_err(PushError::Write)
}
