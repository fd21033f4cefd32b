use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

/// One Socket Mode delivery. The envelope must be acknowledged by its id or
/// Slack redelivers it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SlackEnvelope {
    pub envelope_id: String,
    pub event: SlackEvent,
}

/// The concrete event shapes schemawatch recognizes. Slack delivers a
/// generic envelope; anything that is not a message-class event lands in
/// the `Unsupported` arm and is dropped by the router with a log line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SlackEvent {
    Message(MessageEvent),
    Unsupported { event_type: String },
}

impl SlackEvent {
    pub fn event_type(&self) -> &str {
        match self {
            Self::Message(_) => "message",
            Self::Unsupported { event_type } => event_type,
        }
    }
}

/// One chat message event as delivered by Slack. Read-only to the core and
/// discarded after processing.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct MessageEvent {
    /// Platform-assigned bot identifier; empty when human-authored.
    #[serde(default)]
    pub bot_id: String,
    /// Message subtype; empty means "new message".
    #[serde(default)]
    pub subtype: String,
    #[serde(default, rename = "channel")]
    pub channel_id: String,
    #[serde(default, rename = "user")]
    pub user_id: String,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
}

/// One structured block within a message.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct Attachment {
    #[serde(default)]
    pub author_name: String,
    #[serde(default)]
    pub fields: Vec<AttachmentField>,
}

/// Title/value pair inside an attachment. Titles match case-insensitively.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct AttachmentField {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub value: String,
}

/// Per-dispatch context threaded through logs.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EventContext {
    pub correlation_id: String,
}

impl Default for EventContext {
    fn default() -> Self {
        Self { correlation_id: "unknown-correlation-id".to_owned() }
    }
}

/// The bot's own platform-assigned identifier, resolved once at startup via
/// `auth.test` and read-only afterwards. Used to filter self-authored
/// messages out of the feed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BotIdentity(String);

impl BotIdentity {
    pub fn new(bot_id: impl Into<String>) -> Self {
        Self(bot_id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Error)]
pub enum WireError {
    #[error("unable to parse socket envelope: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Debug, Deserialize)]
struct WireEnvelope {
    #[serde(default)]
    envelope_id: String,
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    payload: Option<WirePayload>,
}

#[derive(Debug, Deserialize)]
struct WirePayload {
    #[serde(default)]
    event: Option<Value>,
}

/// Parse one raw Socket Mode frame into a typed envelope. Event kinds the
/// router does not handle are preserved as `Unsupported` so the drop can be
/// logged with the original type name.
pub fn parse_envelope(raw: &str) -> Result<SlackEnvelope, WireError> {
    let wire: WireEnvelope = serde_json::from_str(raw)?;

    let event = match wire.kind.as_str() {
        "events_api" => match wire.payload.and_then(|payload| payload.event) {
            Some(event) => {
                let event_type =
                    event.get("type").and_then(Value::as_str).unwrap_or_default().to_owned();
                if event_type == "message" {
                    SlackEvent::Message(serde_json::from_value(event)?)
                } else {
                    SlackEvent::Unsupported { event_type }
                }
            }
            None => SlackEvent::Unsupported { event_type: "events_api".to_owned() },
        },
        other => SlackEvent::Unsupported { event_type: other.to_owned() },
    };

    Ok(SlackEnvelope { envelope_id: wire.envelope_id, event })
}
