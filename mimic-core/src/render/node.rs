//! UI Nodes
//!
//! This module defines the render-side view of a UI node: just enough state
//! to know which signals it owns and whether it has to be re-serialized.

use std::fmt;

use smallvec::SmallVec;

use crate::signal::{HandlerId, IdSequence, SignalId};

/// Unique identifier for a UI node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u64);

impl NodeId {
    pub(crate) fn allocate(sequence: &mut IdSequence) -> Self {
        Self(sequence.next_id())
    }

    /// Get the raw ID value.
    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl From<u64> for NodeId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "n{}", self.0)
    }
}

/// Render state of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderState {
    /// The serialized markup is up to date.
    Clean,

    /// The signal connections changed; the node must be re-serialized.
    NeedsRerender,
}

/// A UI node that owns signals.
#[derive(Debug, Clone)]
pub struct UiNode {
    id: NodeId,

    /// Identity of the node in generated markup and round-trip calls.
    form_id: String,

    state: RenderState,

    /// Disabled nodes do not accept client events.
    enabled: bool,

    /// Signals owned by this node, in creation order.
    signals: SmallVec<[SignalId; 4]>,

    /// Handlers whose lifetime is bound to this node.
    owned_handlers: SmallVec<[HandlerId; 2]>,

    /// Number of connection-change notifications received.
    connection_changes: u64,
}

impl UiNode {
    /// Create a clean, enabled node.
    pub fn new(id: NodeId, form_id: impl Into<String>) -> Self {
        Self {
            id,
            form_id: form_id.into(),
            state: RenderState::Clean,
            enabled: true,
            signals: SmallVec::new(),
            owned_handlers: SmallVec::new(),
            connection_changes: 0,
        }
    }

    /// Get the node's ID.
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// The node's form identity.
    pub fn form_id(&self) -> &str {
        &self.form_id
    }

    /// Get the current render state.
    pub fn state(&self) -> RenderState {
        self.state
    }

    /// Check if the node is up to date.
    pub fn is_clean(&self) -> bool {
        self.state == RenderState::Clean
    }

    /// Mark the node as serialized.
    pub fn mark_clean(&mut self) {
        self.state = RenderState::Clean;
    }

    /// Called whenever one of the node's signals changed its connections,
    /// exposure or learned script.
    pub fn on_connections_changed(&mut self) {
        self.state = RenderState::NeedsRerender;
        self.connection_changes += 1;
    }

    /// Number of connection-change notifications received so far.
    pub fn connection_changes(&self) -> u64 {
        self.connection_changes
    }

    /// Whether the node accepts client events.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Signals owned by this node.
    pub fn signals(&self) -> &[SignalId] {
        &self.signals
    }

    pub(crate) fn add_signal(&mut self, signal: SignalId) {
        self.signals.push(signal);
    }

    pub(crate) fn remove_signal(&mut self, signal: SignalId) {
        self.signals.retain(|s| *s != signal);
    }

    /// Handlers destroyed together with this node.
    pub fn owned_handlers(&self) -> &[HandlerId] {
        &self.owned_handlers
    }

    pub(crate) fn own_handler(&mut self, handler: HandlerId) {
        if !self.owned_handlers.contains(&handler) {
            self.owned_handlers.push(handler);
        }
    }

    pub(crate) fn disown_handler(&mut self, handler: HandlerId) -> bool {
        match self.owned_handlers.iter().position(|h| *h == handler) {
            Some(index) => {
                self.owned_handlers.remove(index);
                true
            }
            None => false,
        }
    }
}
