//! Render output records.
//!
//! These are what the session hands to the DOM serializer: per node, the
//! event attributes it has to (re)write.

use serde::Serialize;

use super::NodeId;

/// Event markup for one signal, as embedded in the owner's element.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignalMarkup {
    /// The DOM event name.
    pub event: String,
    /// Script to run in the browser when the event fires.
    pub script: String,
    /// Wire token for the round trip.
    pub wire_id: String,
    /// Whether the browser must call the server after running `script`.
    pub exposed: bool,
}

/// Markup updates for one node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeUpdate {
    #[serde(skip)]
    pub node: NodeId,
    pub form_id: String,
    pub signals: Vec<SignalMarkup>,
}

impl NodeUpdate {
    /// Serialize the update as JSON for the client.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
