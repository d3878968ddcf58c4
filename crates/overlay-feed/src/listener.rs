//! Routes inbound feed frames to the pose store.

use std::sync::Arc;

use overlay_core::{GeoProjector, Observation, Pose, PoseStore};
use serde_json::Value;

use crate::decode::{decode_payload, Envelope};
use crate::error::{DecodeError, FeedError};

/// What happened to one inbound frame.
#[derive(Debug)]
pub enum Disposition {
    /// Pose committed to the store at the given revision.
    Applied { pose: Pose, revision: u64 },
    /// Message for a different entity.
    Ignored,
    /// Frame for an event other than the joined room.
    Unrouted,
    /// Malformed or unusable; logged and dropped.
    Rejected(FeedError),
}

/// Filters feed messages for one entity and keeps its pose current.
///
/// Handling is synchronous and never panics on bad input, so it can be
/// called straight from a transport callback.
pub struct FeedListener {
    room: String,
    target_id: String,
    projector: GeoProjector,
    store: Arc<PoseStore>,
}

impl FeedListener {
    pub fn new(
        room: impl Into<String>,
        target_id: impl Into<String>,
        projector: GeoProjector,
        store: Arc<PoseStore>,
    ) -> Self {
        Self {
            room: room.into(),
            target_id: target_id.into(),
            projector,
            store,
        }
    }

    pub fn room(&self) -> &str {
        &self.room
    }

    pub fn target_id(&self) -> &str {
        &self.target_id
    }

    pub fn store(&self) -> &Arc<PoseStore> {
        &self.store
    }

    /// Handle one raw text frame from the channel.
    pub fn handle_frame(&self, text: &str) -> Disposition {
        let envelope: Envelope = match serde_json::from_str(text) {
            Ok(envelope) => envelope,
            Err(e) => return self.reject(DecodeError::from(e).into()),
        };
        if envelope.event != self.room {
            tracing::trace!("Ignoring '{}' event", envelope.event);
            return Disposition::Unrouted;
        }
        match envelope.message() {
            Some(message) => self.handle_message(message),
            None => self.reject(DecodeError::MissingField("message").into()),
        }
    }

    /// Handle the `message` member of a room message.
    pub fn handle_message(&self, message: &Value) -> Disposition {
        let payload = match decode_payload(message) {
            Ok(payload) => payload,
            Err(e) => return self.reject(e.into()),
        };

        if payload.entity_id() != Some(self.target_id.as_str()) {
            tracing::trace!("Ignoring message for entity {:?}", payload.id);
            return Disposition::Ignored;
        }

        match payload.into_observation() {
            Ok(observation) => self.apply_observation(&observation),
            Err(e) => self.reject(e.into()),
        }
    }

    /// Project a decoded observation and commit it.
    pub fn apply_observation(&self, observation: &Observation) -> Disposition {
        if observation.entity_id != self.target_id {
            return Disposition::Ignored;
        }
        let pose = match self.projector.pose_for(observation) {
            Ok(pose) => pose,
            Err(e) => return self.reject(e.into()),
        };
        let revision = self.store.update(pose);
        tracing::debug!(
            "Latitude: {}, Longitude: {}, Heading: {} -> x = {:.3}, y = {:.3}, rot_z = {:.4} \
             (rev {})",
            observation.lat,
            observation.lon,
            observation.heading_or_north(),
            pose.x,
            pose.y,
            pose.orientation_z,
            revision
        );
        Disposition::Applied { pose, revision }
    }

    fn reject(&self, error: FeedError) -> Disposition {
        match &error {
            FeedError::Decode(e) => tracing::warn!("Error parsing message: {}", e),
            FeedError::Geo(e) => {
                tracing::warn!("Dropping observation for {}: {}", self.target_id, e)
            }
        }
        Disposition::Rejected(error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use overlay_core::{GeoError, Origin};
    use serde_json::json;
    use std::f64::consts::PI;

    fn listener() -> FeedListener {
        let origin = Origin::new(42.3012213, -83.6967968).unwrap();
        FeedListener::new(
            "behaviorstate",
            "543DF7",
            GeoProjector::new(origin),
            Arc::new(PoseStore::new()),
        )
    }

    #[test]
    fn applies_target_messages() {
        let listener = listener();
        let disposition = listener.handle_message(&json!({
            "id": "543DF7", "Lat": "42.3012213", "Long": "-83.6967968", "Heading": "0"
        }));
        match disposition {
            Disposition::Applied { pose, revision } => {
                assert_eq!(pose, Pose::new(0.0, 0.0, PI));
                assert_eq!(revision, 1);
            }
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(listener.store().current(), Some(Pose::new(0.0, 0.0, PI)));
    }

    #[test]
    fn ignores_other_entities_even_when_malformed_numbers() {
        let listener = listener();
        assert!(matches!(
            listener.handle_message(&json!({"id": "FFFFFF", "Lat": "garbage", "Long": "1"})),
            Disposition::Ignored
        ));
        assert!(listener.store().current().is_none());
    }

    #[test]
    fn ignores_other_entities_with_unexpected_field_types() {
        let listener = listener();
        for message in [
            json!({"id": "OTHER1", "Lat": true, "Long": "1"}),
            json!({"id": "OTHER1", "Lat": "1", "Long": [2], "Heading": {"deg": 90}}),
            Value::String(json!({"id": "OTHER1", "Lat": null, "Heading": false}).to_string()),
        ] {
            assert!(matches!(listener.handle_message(&message), Disposition::Ignored));
        }
        assert!(listener.store().current().is_none());

        assert!(matches!(
            listener.handle_message(&json!({"id": "543DF7", "Lat": true, "Long": "1"})),
            Disposition::Rejected(FeedError::Decode(DecodeError::InvalidNumber {
                field: "Lat",
                ..
            }))
        ));
        assert!(listener.store().current().is_none());
    }

    #[test]
    fn routes_frames_by_room() {
        let listener = listener();
        let other = Envelope::room_message("telemetry", json!({"id": "543DF7"}));
        assert!(matches!(
            listener.handle_frame(&serde_json::to_string(&other).unwrap()),
            Disposition::Unrouted
        ));

        let missing = r#"{"event":"behaviorstate","data":{}}"#;
        assert!(matches!(
            listener.handle_frame(missing),
            Disposition::Rejected(FeedError::Decode(DecodeError::MissingField("message")))
        ));

        assert!(matches!(
            listener.handle_frame("not a frame"),
            Disposition::Rejected(FeedError::Decode(DecodeError::Json(_)))
        ));
        assert!(listener.store().current().is_none());
    }

    #[test]
    fn out_of_range_observation_leaves_store_unchanged() {
        let listener = listener();
        listener.handle_message(&json!({"id": "543DF7", "Lat": "42.3013", "Long": "-83.6968"}));
        let before = listener.store().snapshot().unwrap();

        let far =
            listener.handle_message(&json!({"id": "543DF7", "Lat": "43.5", "Long": "-83.6968"}));
        assert!(matches!(
            far,
            Disposition::Rejected(FeedError::Geo(GeoError::BeyondValidRange { .. }))
        ));
        assert_eq!(listener.store().snapshot(), Some(before));
    }
}
