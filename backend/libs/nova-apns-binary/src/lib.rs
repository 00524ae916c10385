/// Nova APNs Binary Client
///
/// Delivers notifications to the Apple Push Notification service through the
/// legacy binary interface: a mutually-authenticated TLS connection per push,
/// carrying one fixed-layout frame.
///
/// It handles:
/// - Client configuration and certificate bundle validation
/// - JSON payload building (`aps` + application data)
/// - Binary frame encoding with device token decoding
/// - Connection lifecycle (connect with timeout, write, close)
/// - Profiling and error reporting for every push
pub mod client;
pub mod config;
pub mod error;
pub mod frame;
pub mod logging;
pub mod message;
pub mod payload;
pub mod profiler;

pub use client::{
    AppleMobileClient, DynMobileClient, MobileClient, CANCELLED_MESSAGE, CONNECT_TIMEOUT, PLATFORM_TAG,
};
pub use config::{ClientConfiguration, ClientParams, ConfigError, PRODUCTION_GATEWAY, SANDBOX_GATEWAY};
pub use error::{ApnsError, PushError};
pub use frame::{decode_device_token, FrameError, WireFrame};
pub use message::NotificationMessage;
pub use payload::Payload;
pub use profiler::{Profiler, ProfilingEvent, PushOutcome, RecordingProfiler, TracingProfiler};
