//! JSON payload carried inside the binary frame

use crate::message::NotificationMessage;
use serde::Serialize;
use serde_json::{Map, Value};

pub const DEFAULT_BADGE: u32 = 1;
pub const DEFAULT_SOUND: &str = "default";

/// `{"aps": {...}, "data": {...}}`
#[derive(Debug, Serialize)]
pub struct Payload<'a> {
    aps: Aps<'a>,
    data: &'a Map<String, Value>,
}

#[derive(Debug, Serialize)]
struct Aps<'a> {
    badge: u32,
    sound: &'static str,
    alert: Alert<'a>,
}

#[derive(Debug, Serialize)]
struct Alert<'a> {
    #[serde(rename = "loc-key")]
    loc_key: &'a str,
    // An empty list is omitted, never sent as []
    #[serde(rename = "loc-args", skip_serializing_if = "no_arguments")]
    loc_args: &'a [String],
}

fn no_arguments(args: &&[String]) -> bool {
    args.is_empty()
}

impl<'a> Payload<'a> {
    pub fn from_message(message: &'a NotificationMessage) -> Self {
        Self {
            aps: Aps {
                badge: DEFAULT_BADGE,
                sound: DEFAULT_SOUND,
                alert: Alert {
                    loc_key: &message.body,
                    loc_args: &message.arguments,
                },
            },
            data: &message.data,
        }
    }

    pub fn to_json(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec(self)
    }
}
