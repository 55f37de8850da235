//! Wire envelopes exchanged with the recognizer.
//!
//! Every message is a JSON object `{type, id?, data}`. Inbound:
//!
//! | `type`    | `data`            | reply |
//! |-----------|-------------------|-------|
//! | `batch`   | a [`Batch`]       | `{type: "response", id, data}` |
//! | `status`  | `{text}`          | none |
//! | `volume`  | `{volume}` (0..1) | none |
//!
//! Outbound messages the editor originates use the same envelope: `sendText` for chain-break
//! resubmissions, and arbitrary types (`enableListening`, ...) through
//! [`crate::IpcHandle::send`].

use serde::{Deserialize, Serialize};
use serde_json::Value;
use voxedit_core::Batch;

/// Envelope type of a batch reply.
pub const RESPONSE: &str = "response";
/// Envelope type of a resubmission.
pub const SEND_TEXT: &str = "sendText";

#[derive(Debug, Deserialize)]
struct RawEnvelope {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    id: Option<Value>,
    #[serde(default)]
    data: Value,
}

#[derive(Debug, Deserialize)]
struct StatusData {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Deserialize)]
struct VolumeData {
    #[serde(default)]
    volume: f64,
}

/// A decoded inbound message.
#[derive(Debug, Clone, PartialEq)]
pub enum InboundMessage {
    /// Commands to resolve and execute.
    Batch {
        /// Request id echoed in the reply.
        id: Option<Value>,
        /// The recognized alternatives.
        batch: Batch,
    },
    /// New status line text.
    Status {
        /// Status text.
        text: String,
    },
    /// New input level.
    Volume {
        /// Level in `0.0..=1.0`.
        volume: f64,
    },
    /// An envelope type this client does not handle.
    Unknown {
        /// The envelope `type`.
        kind: String,
    },
}

impl InboundMessage {
    /// Decode an inbound envelope.
    pub fn from_value(value: Value) -> serde_json::Result<Self> {
        let envelope: RawEnvelope = serde_json::from_value(value)?;
        Ok(match envelope.kind.as_str() {
            "batch" => InboundMessage::Batch {
                id: envelope.id,
                batch: serde_json::from_value(envelope.data)?,
            },
            "status" => {
                let data: StatusData = serde_json::from_value(envelope.data)?;
                InboundMessage::Status { text: data.text }
            }
            "volume" => {
                let data: VolumeData = serde_json::from_value(envelope.data)?;
                InboundMessage::Volume {
                    volume: data.volume,
                }
            }
            _ => InboundMessage::Unknown {
                kind: envelope.kind,
            },
        })
    }
}

/// An outbound envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutboundMessage {
    /// Envelope type.
    #[serde(rename = "type")]
    pub kind: String,
    /// Request id this message answers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    /// Payload.
    pub data: Value,
}

impl OutboundMessage {
    /// Envelope of `kind` carrying `data`.
    pub fn new(kind: impl Into<String>, data: Value) -> Self {
        Self {
            kind: kind.into(),
            id: None,
            data,
        }
    }

    /// Reply to the batch with request `id`.
    pub fn response(id: Option<Value>, data: Option<Value>) -> Self {
        Self {
            kind: RESPONSE.to_string(),
            id,
            data: data.unwrap_or(Value::Null),
        }
    }

    /// Ask the recognizer to process `text` again.
    pub fn send_text(text: &str, chain: bool) -> Self {
        Self::new(
            SEND_TEXT,
            serde_json::json!({ "text": text, "chain": chain }),
        )
    }

    /// JSON form of this envelope.
    pub fn to_value(&self) -> Value {
        serde_json::json!(self)
    }
}
