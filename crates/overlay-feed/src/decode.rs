//! Wire framing and payload decoding for the position feed.
//!
//! Frames are JSON envelopes `{"event": ..., "data": ...}`. Room messages
//! carry `{"message": ...}` where the message is either an object or a
//! string holding serialized JSON. Numeric fields are usually strings.

use overlay_core::Observation;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::DecodeError;

/// Event name the client uses to subscribe to a room.
pub const JOIN_EVENT: &str = "join";

/// One frame on the channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub event: String,
    #[serde(default)]
    pub data: Value,
}

impl Envelope {
    pub fn join(room: &str) -> Self {
        Self {
            event: JOIN_EVENT.to_string(),
            data: Value::String(room.to_string()),
        }
    }

    pub fn room_message(room: &str, message: Value) -> Self {
        Self {
            event: room.to_string(),
            data: json!({ "message": message }),
        }
    }

    /// Room name of a join request.
    pub fn joined_room(&self) -> Option<&str> {
        (self.event == JOIN_EVENT).then(|| self.data.as_str()).flatten()
    }

    /// The `message` member of a room message.
    pub fn message(&self) -> Option<&Value> {
        self.data.get("message")
    }
}

/// Numeric field as it appears on the wire.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Numeric {
    Number(f64),
    Text(String),
}

impl Numeric {
    /// Type a raw field value; anything but a string or number is invalid.
    fn from_field(value: &Value, field: &'static str) -> Result<Self, DecodeError> {
        match value {
            Value::Number(n) => n.as_f64().map(Numeric::Number),
            Value::String(text) => Some(Numeric::Text(text.clone())),
            _ => None,
        }
        .ok_or_else(|| DecodeError::InvalidNumber {
            field,
            value: value.to_string(),
        })
    }

    fn parse(&self, field: &'static str) -> Result<Option<f64>, DecodeError> {
        let value = match self {
            Numeric::Number(n) => *n,
            Numeric::Text(text) => {
                let trimmed = text.trim();
                if trimmed.is_empty() {
                    return Ok(None);
                }
                trimmed.parse::<f64>().map_err(|_| DecodeError::InvalidNumber {
                    field,
                    value: text.clone(),
                })?
            }
        };
        if !value.is_finite() {
            return Err(DecodeError::InvalidNumber {
                field,
                value: value.to_string(),
            });
        }
        Ok(Some(value))
    }
}

/// Observation payload with its fields still untyped.
///
/// Only the identity is inspected up front; numeric fields are typed in
/// [`FeedPayload::into_observation`], so payloads for other entities never
/// fail to decode because of their shape.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FeedPayload {
    #[serde(default)]
    pub id: Value,
    #[serde(rename = "Lat", default)]
    pub lat: Option<Value>,
    #[serde(rename = "Long", default)]
    pub long: Option<Value>,
    #[serde(rename = "Heading", default)]
    pub heading: Option<Value>,
}

impl FeedPayload {
    /// Entity identity; non-string ids never match a target.
    pub fn entity_id(&self) -> Option<&str> {
        self.id.as_str()
    }

    pub fn into_observation(self) -> Result<Observation, DecodeError> {
        let entity_id = self.id.as_str().ok_or(DecodeError::MissingField("id"))?;
        let lat = required(self.lat.as_ref(), "Lat")?;
        let lon = required(self.long.as_ref(), "Long")?;
        let heading_deg = match &self.heading {
            Some(heading) => Numeric::from_field(heading, "Heading")?.parse("Heading")?,
            None => None,
        };

        Ok(Observation {
            entity_id: entity_id.to_string(),
            lat,
            lon,
            heading_deg,
        })
    }
}

fn required(value: Option<&Value>, field: &'static str) -> Result<f64, DecodeError> {
    let value = value.ok_or(DecodeError::MissingField(field))?;
    Numeric::from_field(value, field)?
        .parse(field)?
        .ok_or(DecodeError::MissingField(field))
}

/// Decode a room message payload, accepting either a pre-parsed object or
/// a string of serialized JSON.
pub fn decode_payload(message: &Value) -> Result<FeedPayload, DecodeError> {
    match message {
        Value::String(text) => {
            let parsed: Value = serde_json::from_str(text)?;
            decode_object(parsed)
        }
        Value::Object(_) => decode_object(message.clone()),
        _ => Err(DecodeError::NotAnObject),
    }
}

fn decode_object(value: Value) -> Result<FeedPayload, DecodeError> {
    if !value.is_object() {
        return Err(DecodeError::NotAnObject);
    }
    Ok(serde_json::from_value(value)?)
}
