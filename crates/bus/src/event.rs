use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Marker carried by every envelope; messages without it belong to someone
/// else and are ignored.
pub const BUS_NAMESPACE: &str = "studio-bus";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FrameRole {
    Builder,
    Canvas,
}

/// Everything the two frames tell each other.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    tag = "type",
    content = "payload",
    rename_all = "camelCase",
    rename_all_fields = "camelCase"
)]
pub enum BusEvent {
    /// `None` clears the selection.
    SelectInstance { instance_id: Option<String> },
    HoverInstance { instance_id: Option<String> },
    ScrollState { scrolling: bool },
    TextEditing { instance_id: Option<String> },
    /// A keyboard shortcut pressed in one frame, handled by the other.
    Shortcut { name: String },
    CanvasReady,
    CanvasReadyAck,
}

/// Wire form of one message.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope {
    pub namespace: String,
    /// Id of the bus the message was posted on.
    pub session: Uuid,
    pub source: FrameRole,
    pub event: BusEvent,
}

impl Envelope {
    pub fn new(session: Uuid, source: FrameRole, event: BusEvent) -> Self {
        Self {
            namespace: BUS_NAMESPACE.to_owned(),
            session,
            source,
            event,
        }
    }

    /// Decode `text`, returning `None` for anything not posted by a bus
    /// with id `session`.
    pub fn decode(text: &str, session: Uuid) -> Option<Self> {
        let envelope: Self = serde_json::from_str(text).ok()?;
        (envelope.namespace == BUS_NAMESPACE && envelope.session == session).then_some(envelope)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn events_use_the_post_message_shape() {
        let session = Uuid::new_v4();
        let envelope = Envelope::new(
            session,
            FrameRole::Canvas,
            BusEvent::SelectInstance {
                instance_id: Some("box".into()),
            },
        );
        assert_eq!(
            serde_json::to_value(&envelope).unwrap(),
            json!({
                "namespace": "studio-bus",
                "session": session,
                "source": "canvas",
                "event": { "type": "selectInstance", "payload": { "instanceId": "box" } }
            })
        );
        let ready = serde_json::to_value(BusEvent::CanvasReady).unwrap();
        assert_eq!(ready, json!({ "type": "canvasReady" }));
    }

    #[test]
    fn foreign_text_is_not_an_envelope() {
        let session = Uuid::new_v4();
        assert!(Envelope::decode("{\"source\":\"devtools\"}", session).is_none());
        assert!(Envelope::decode("ready", session).is_none());
        let other = serde_json::to_string(&Envelope::new(
            Uuid::new_v4(),
            FrameRole::Builder,
            BusEvent::CanvasReadyAck,
        ))
        .unwrap();
        assert!(Envelope::decode(&other, session).is_none());
    }
}
