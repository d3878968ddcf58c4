//! Observation payloads in the feed's wire format.

use serde_json::{json, Map, Value};

/// How a room message carries its observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadStyle {
    /// Structured JSON object.
    Object,
    /// JSON object serialized into a string.
    Serialized,
}

/// Build a room message payload with string-encoded numerics.
pub fn observation_payload(
    entity_id: &str,
    lat: f64,
    lon: f64,
    heading_deg: Option<f64>,
    style: PayloadStyle,
) -> Value {
    let mut fields = Map::new();
    fields.insert("id".into(), json!(entity_id));
    fields.insert("Lat".into(), json!(format!("{:.7}", lat)));
    fields.insert("Long".into(), json!(format!("{:.7}", lon)));
    if let Some(heading) = heading_deg {
        fields.insert("Heading".into(), json!(format!("{:.1}", heading)));
    }

    let object = Value::Object(fields);
    match style {
        PayloadStyle::Object => object,
        PayloadStyle::Serialized => Value::String(object.to_string()),
    }
}
