//! Render Tracker
//!
//! The tracker keeps every UI node of a session and the queue of nodes that
//! must be re-serialized.
//!
//! # Algorithm
//!
//! 1. A signal whose exposure, learning state or script changes notifies its
//!    owner through [`RenderTracker::notify_connections_changed`].
//! 2. The owner is marked as needing a re-render and queued, once, in the
//!    order it first became dirty.
//! 3. The render pipeline drains the queue with
//!    [`RenderTracker::take_dirty`], which marks every drained node clean.

use std::collections::HashMap;

use indexmap::IndexSet;

use crate::signal::HandlerId;

use super::node::{NodeId, UiNode};

/// Tracks UI nodes and their render state.
#[derive(Debug, Default)]
pub struct RenderTracker {
    /// All nodes, indexed by ID.
    nodes: HashMap<NodeId, UiNode>,

    /// Node IDs indexed by form identity.
    form_ids: HashMap<String, NodeId>,

    /// Nodes waiting to be re-serialized, in the order they became dirty.
    dirty: IndexSet<NodeId>,
}

impl RenderTracker {
    /// Create an empty tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node.
    ///
    /// Callers make sure the form identity is not taken.
    pub fn add_node(&mut self, node: UiNode) -> NodeId {
        let id = node.id();
        self.form_ids.insert(node.form_id().to_string(), id);
        self.nodes.insert(id, node);
        id
    }

    /// Remove a node, dropping it from the dirty queue.
    pub fn remove_node(&mut self, node_id: NodeId) -> Option<UiNode> {
        let node = self.nodes.remove(&node_id)?;
        if self.form_ids.get(node.form_id()) == Some(&node_id) {
            self.form_ids.remove(node.form_id());
        }
        self.dirty.shift_remove(&node_id);
        Some(node)
    }

    /// Get a reference to a node.
    pub fn node(&self, node_id: NodeId) -> Option<&UiNode> {
        self.nodes.get(&node_id)
    }

    /// Get a mutable reference to a node.
    pub fn node_mut(&mut self, node_id: NodeId) -> Option<&mut UiNode> {
        self.nodes.get_mut(&node_id)
    }

    /// Whether a live node already uses `form_id`.
    pub fn is_form_id_taken(&self, form_id: &str) -> bool {
        self.form_ids.contains_key(form_id)
    }

    /// Drop a handler from the owned list of whichever node holds it.
    pub fn disown_handler(&mut self, handler: HandlerId) {
        for node in self.nodes.values_mut() {
            node.disown_handler(handler);
        }
    }

    /// Look up a node by its form identity.
    pub fn find_by_form_id(&self, form_id: &str) -> Option<NodeId> {
        self.form_ids.get(form_id).copied()
    }

    /// Number of live nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Tell a node that its signal connections changed.
    ///
    /// Returns `false` if the node no longer exists.
    pub fn notify_connections_changed(&mut self, node_id: NodeId) -> bool {
        match self.nodes.get_mut(&node_id) {
            Some(node) => {
                node.on_connections_changed();
                self.dirty.insert(node_id);
                true
            }
            None => false,
        }
    }

    /// Check if a node is waiting to be re-serialized.
    pub fn is_dirty(&self, node_id: NodeId) -> bool {
        self.dirty.contains(&node_id)
    }

    /// Nodes waiting to be re-serialized, in the order they became dirty.
    pub fn dirty_nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.dirty.iter().copied()
    }

    /// Drain the dirty queue, marking every drained node clean.
    pub fn take_dirty(&mut self) -> Vec<NodeId> {
        let drained: Vec<NodeId> = self.dirty.drain(..).collect();
        for node_id in &drained {
            if let Some(node) = self.nodes.get_mut(node_id) {
                node.mark_clean();
            }
        }
        drained
    }
}
