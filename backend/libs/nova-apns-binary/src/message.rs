use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Notification addressed to one device
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NotificationMessage {
    /// Hex-encoded device token, whitespace allowed
    pub device_token: String,
    /// Localization key of the alert text
    pub body: String,
    /// Localization arguments, in order
    #[serde(default)]
    pub arguments: Vec<String>,
    /// Application payload delivered next to `aps`
    #[serde(default)]
    pub data: Map<String, Value>,
}

impl NotificationMessage {
    pub fn new(device_token: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            device_token: device_token.into(),
            body: body.into(),
            ..Default::default()
        }
    }

    pub fn with_argument(mut self, argument: impl Into<String>) -> Self {
        self.arguments.push(argument.into());
        self
    }

    pub fn with_arguments<I, S>(mut self, arguments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.arguments.extend(arguments.into_iter().map(Into::into));
        self
    }

    pub fn with_data(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.data.insert(key.into(), value.into());
        self
    }
}
