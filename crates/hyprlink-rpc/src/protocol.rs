//! Message vocabulary exchanged with devices.
//!
//! Every message is a flat JSON object. Inbound messages carry a `type`
//! discriminator, except the pairing handshake which is identified by its
//! position in the session. Outbound responses use one flat shape whose
//! fields are present only when meaningful.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use hyprlink_types::UiDescription;

pub const GET_REQUEST: &str = "get_request";
pub const SYS_INFO: &str = "sys_info";

pub const STATUS_OK: &str = "ok";
pub const STATUS_UPDATE: &str = "update";
pub const STATUS_UNAUTHORIZED: &str = "unauthorized";
pub const STATUS_ERROR: &str = "error";

pub const PIN_REQUIRED: &str = "PIN_REQUIRED";
pub const INVALID_PIN: &str = "INVALID_PIN";
pub const NO_DEVICE: &str = "NO_DEVICE";
pub const TIMEOUT: &str = "TIMEOUT";

pub const NOTHING_PLAYING: &str = "nothing playing";

/// Treat an explicit `null` like a missing field.
fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Read the `type` discriminator of a raw inbound object.
#[must_use]
pub fn message_type(value: &Value) -> Option<&str> {
    value.get("type").and_then(Value::as_str)
}

/// Messages sent by an authorized device (and the CLI relay request).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    Action {
        #[serde(default, deserialize_with = "null_as_default")]
        id: String,
        #[serde(default, deserialize_with = "null_as_default")]
        value: f64,
    },
    Clipboard {
        #[serde(default, deserialize_with = "null_as_default")]
        content: String,
    },
    Notification {
        #[serde(default, deserialize_with = "null_as_default")]
        app: String,
        #[serde(default, deserialize_with = "null_as_default")]
        title: String,
        #[serde(default, deserialize_with = "null_as_default")]
        content: String,
    },
    Ping,
    GetRequest {
        #[serde(default, deserialize_with = "null_as_default")]
        id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pin: Option<String>,
    },
    SysInfo,
    #[serde(other)]
    Unknown,
}

/// First message of a device session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PairingRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hash: Option<String>,
}

impl PairingRequest {
    /// Stored credentials, if the device presented both halves.
    #[must_use]
    pub fn credentials(&self) -> Option<(&str, &str)> {
        match (self.device_id.as_deref(), self.token.as_deref()) {
            (Some(id), Some(token)) if !id.is_empty() && !token.is_empty() => Some((id, token)),
            _ => None,
        }
    }
}

/// Second message of an unauthenticated session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PinSubmission {
    #[serde(default)]
    pub pin: String,
}

/// Outbound message.
///
/// One flat shape covers sync replies, telemetry and errors.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Response {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<UiDescription>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<i64>,
}

impl Response {
    #[must_use]
    pub fn pin_required() -> Self {
        Self {
            status: Some(STATUS_UNAUTHORIZED.to_string()),
            message: Some(PIN_REQUIRED.to_string()),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: Some(STATUS_ERROR.to_string()),
            message: Some(message.into()),
            ..Default::default()
        }
    }

    /// Reply sent once a session is authorized.
    ///
    /// Carries the full description only when the device's cached hash is
    /// stale.
    #[must_use]
    pub fn sync(client_hash: Option<&str>, current: &UiDescription) -> Self {
        if client_hash == Some(current.hash.as_str()) {
            Self {
                status: Some(STATUS_OK.to_string()),
                ..Default::default()
            }
        } else {
            Self {
                status: Some(STATUS_UPDATE.to_string()),
                config: Some(current.clone()),
                ..Default::default()
            }
        }
    }

    /// Attach freshly minted credentials.
    #[must_use]
    pub fn with_credentials(
        mut self,
        device_id: impl Into<String>,
        token: impl Into<String>,
    ) -> Self {
        self.device_id = Some(device_id.into());
        self.token = Some(token.into());
        self
    }

    #[must_use]
    pub fn module_value(id: impl Into<String>, value: f64) -> Self {
        Self {
            kind: Some("update".to_string()),
            id: Some(id.into()),
            value: Some(value),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn module_content(id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            kind: Some("update".to_string()),
            id: Some(id.into()),
            content: Some(content.into()),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn clipboard(content: impl Into<String>) -> Self {
        Self {
            kind: Some("clipboard".to_string()),
            content: Some(content.into()),
            ..Default::default()
        }
    }

    #[must_use]
    #[allow(clippy::cast_precision_loss)] // Positions stay far below 2^53 ms
    pub fn media_info(status: &MediaStatus) -> Self {
        Self {
            kind: Some("media_info".to_string()),
            status: Some(status.status.clone()),
            content: Some(status.title.clone()),
            app: Some(status.artist.clone()),
            value: Some(status.position_ms as f64),
            duration: Some(status.duration_ms),
            ..Default::default()
        }
    }

    /// Pushed to every session when the configuration is replaced.
    #[must_use]
    pub fn layout_update(ui: &UiDescription) -> Self {
        Self {
            kind: Some("update_layout".to_string()),
            status: Some(STATUS_UPDATE.to_string()),
            config: Some(ui.clone()),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn is_error(&self) -> bool {
        self.status.as_deref() == Some(STATUS_ERROR)
    }
}

/// Normalized media-player state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MediaStatus {
    pub title: String,
    pub artist: String,
    pub status: String,
    pub position_ms: i64,
    pub duration_ms: i64,
}

impl MediaStatus {
    #[must_use]
    pub fn nothing_playing(status: impl Into<String>) -> Self {
        Self {
            title: NOTHING_PLAYING.to_string(),
            status: status.into(),
            ..Default::default()
        }
    }
}

/// Anything written to a device connection.
///
/// Relayed device replies are forwarded verbatim, so they travel as raw JSON.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Outbound {
    Response(Box<Response>),
    Raw(Value),
}

impl From<Response> for Outbound {
    fn from(response: Response) -> Self {
        Self::Response(Box::new(response))
    }
}

impl From<Value> for Outbound {
    fn from(value: Value) -> Self {
        Self::Raw(value)
    }
}

/// UDP presence announcement.
///
/// Devices may announce only their hostname; `port` then reads as 0.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Beacon {
    pub hostname: String,
    #[serde(default)]
    pub port: u16,
}

pub const ACK_PREFIX: &str = "HYPRLINK_ACK|";

/// Acknowledgement datagram telling a beaconing client where to connect.
#[must_use]
pub fn discovery_ack(tcp_port: u16) -> String {
    format!("{ACK_PREFIX}{tcp_port}")
}

/// Parse an acknowledgement datagram back into the advertised TCP port.
#[must_use]
pub fn parse_discovery_ack(datagram: &str) -> Option<u16> {
    datagram.trim().strip_prefix(ACK_PREFIX)?.parse().ok()
}
