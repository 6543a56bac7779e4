//! Inbound client events.
//!
//! Defines the payload the browser sends when a signal fires. The transport
//! layer decodes a request into one or more [`ClientEvent`]s, either from
//! JSON or from MessagePack.

use serde::{Deserialize, Serialize};

use crate::error::EventError;

/// Name of the form-change signal. Change events are processed before any
/// other event of the same request so handlers see up-to-date form values.
pub const CHANGE_SIGNAL: &str = "change";

/// Keyboard modifiers held while the event fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyboardModifier {
    Alt,
    Control,
    Shift,
    Meta,
}

/// The browser event that caused a signal to fire.
///
/// Every field is optional on the wire and defaults to zero or empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct JavaScriptEvent {
    /// DOM event type, e.g. `"click"`.
    #[serde(rename = "type")]
    pub event_type: String,
    pub client_x: i32,
    pub client_y: i32,
    pub document_x: i32,
    pub document_y: i32,
    pub screen_x: i32,
    pub screen_y: i32,
    pub widget_x: i32,
    pub widget_y: i32,
    pub drag_dx: i32,
    pub drag_dy: i32,
    pub wheel_delta: i32,
    pub button: u32,
    pub key_code: u32,
    pub char_code: u32,
    pub modifiers: Vec<KeyboardModifier>,
    pub scroll_x: i32,
    pub scroll_y: i32,
    pub viewport_width: u32,
    pub viewport_height: u32,
    /// Response value for events such as dialog results.
    pub response: String,
    /// Positional arguments of a user event call (`a1..a6`).
    pub user_event_args: Vec<String>,
}

impl JavaScriptEvent {
    /// Whether the given modifier key was held.
    pub fn has_modifier(&self, modifier: KeyboardModifier) -> bool {
        self.modifiers.contains(&modifier)
    }
}

/// One signal occurrence reported by the client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientEvent {
    /// Wire token of the signal (`"s1f"`), or `"user"` for a user event
    /// addressed by object ID and name.
    pub signal: String,
    /// Form identity of the owning node, for user events.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object_id: Option<String>,
    /// Signal name, for user events.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub event: JavaScriptEvent,
}

impl ClientEvent {
    /// Token used for events addressed by object ID and name.
    pub const USER: &'static str = "user";

    /// An event addressed by wire token.
    pub fn for_signal(token: impl Into<String>) -> Self {
        Self {
            signal: token.into(),
            object_id: None,
            name: None,
            event: JavaScriptEvent::default(),
        }
    }

    /// An event addressed by the owner's form identity and the signal name.
    pub fn user(object_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            signal: Self::USER.to_string(),
            object_id: Some(object_id.into()),
            name: Some(name.into()),
            event: JavaScriptEvent::default(),
        }
    }

    /// Attach the browser event payload.
    pub fn with_event(mut self, event: JavaScriptEvent) -> Self {
        self.event = event;
        self
    }

    /// Whether this event is addressed by object ID and name.
    pub fn is_user_event(&self) -> bool {
        self.signal == Self::USER
    }
}

/// All events carried by one client request, in the order they occurred.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventBatch {
    pub events: Vec<ClientEvent>,
}

impl EventBatch {
    /// Parse a batch from JSON.
    pub fn from_json(json: &str) -> Result<Self, EventError> {
        serde_json::from_str(json).map_err(EventError::Json)
    }

    /// Parse a batch from MessagePack.
    pub fn from_msgpack(bytes: &[u8]) -> Result<Self, EventError> {
        rmp_serde::from_slice(bytes).map_err(EventError::MsgPack)
    }

    /// Encode the batch as MessagePack with named fields.
    pub fn to_msgpack(&self) -> Result<Vec<u8>, EventError> {
        rmp_serde::to_vec_named(self).map_err(EventError::MsgPackEncode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_sparse_json_batch() {
        let json = r#"{
            "events": [
                {"signal": "s1f", "event": {"type": "click", "clientX": 10, "modifiers": ["shift"]}},
                {"signal": "user", "objectId": "o2", "name": "picked",
                 "event": {"userEventArgs": ["3"]}}
            ]
        }"#;

        let batch = EventBatch::from_json(json).unwrap();
        assert_eq!(batch.events.len(), 2);

        let click = &batch.events[0];
        assert_eq!(click.signal, "s1f");
        assert_eq!(click.event.event_type, "click");
        assert_eq!(click.event.client_x, 10);
        assert_eq!(click.event.client_y, 0);
        assert!(click.event.has_modifier(KeyboardModifier::Shift));
        assert!(!click.is_user_event());

        let user = &batch.events[1];
        assert!(user.is_user_event());
        assert_eq!(user.object_id.as_deref(), Some("o2"));
        assert_eq!(user.event.user_event_args, vec!["3".to_string()]);
    }

    #[test]
    fn msgpack_batch_survives_transport() {
        let batch = EventBatch {
            events: vec![
                ClientEvent::for_signal("s0").with_event(JavaScriptEvent {
                    event_type: "keydown".into(),
                    key_code: 13,
                    ..JavaScriptEvent::default()
                }),
                ClientEvent::user("o1", "done"),
            ],
        };

        let bytes = batch.to_msgpack().unwrap();
        assert_eq!(EventBatch::from_msgpack(&bytes).unwrap(), batch);
    }

    #[test]
    fn malformed_json_is_an_error() {
        assert!(matches!(
            EventBatch::from_json("{\"events\": 3}"),
            Err(EventError::Json(_))
        ));
    }
}
