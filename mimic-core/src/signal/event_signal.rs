//! Signal Implementation
//!
//! A Signal is an event point on a UI node that server and client code can
//! react to. It keeps its handlers in attachment order, a set of state flags,
//! and a back-reference to its owning node.
//!
//! # How Signals Work
//!
//! 1. The owning node creates one signal per event it supports. The signal
//!    takes the next ID from the session's sequence; that ID is its wire
//!    address.
//!
//! 2. Application code attaches handlers. Attaching a handler that needs the
//!    server exposes the signal, so the generated markup wires up a round
//!    trip.
//!
//! 3. The render pipeline embeds the signal's script: the concatenated
//!    scripts of all learned handlers, plus an event-cancellation snippet.
//!
//! The signal itself does not own its handlers. They live in the session's
//! handler arena, and the signal only holds their IDs, so flag and handler
//! list bookkeeping here stays free of borrowing concerns.

use smallvec::SmallVec;

use crate::render::NodeId;

use super::{HandlerId, IdSequence, SignalFlags, SignalId};

/// An addressable event point owned by a UI node.
#[derive(Debug, Clone)]
pub struct Signal {
    /// Unique identifier and wire address.
    id: SignalId,

    /// Event name, stable per owner (e.g. `"click"`).
    name: String,

    /// The node producing this event. Not an ownership relation.
    owner: NodeId,

    flags: SignalFlags,

    /// Attached handlers in attachment order.
    handlers: SmallVec<[HandlerId; 4]>,
}

impl Signal {
    /// Create a signal, taking its ID from `ids`.
    pub(crate) fn new(ids: &mut IdSequence, name: impl Into<String>, owner: NodeId) -> Self {
        Self {
            id: SignalId::allocate(ids),
            name: name.into(),
            owner,
            flags: SignalFlags::empty(),
            handlers: SmallVec::new(),
        }
    }

    /// Get the signal's unique ID.
    pub fn id(&self) -> SignalId {
        self.id
    }

    /// The event name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The owning node.
    pub fn owner(&self) -> NodeId {
        self.owner
    }

    /// Current state flags.
    pub fn flags(&self) -> SignalFlags {
        self.flags
    }

    /// The wire token routing client events to this signal.
    pub fn wire_id(&self) -> String {
        self.id.to_wire()
    }

    /// Attached handlers in attachment order.
    pub fn handlers(&self) -> &[HandlerId] {
        &self.handlers
    }

    /// Number of attached handlers.
    pub fn listener_count(&self) -> usize {
        self.handlers.len()
    }

    /// Whether at least one handler is attached.
    pub fn is_connected(&self) -> bool {
        !self.handlers.is_empty()
    }

    /// Whether the handler is attached to this signal.
    pub fn has_handler(&self, handler: HandlerId) -> bool {
        self.handlers.contains(&handler)
    }

    /// Whether the signal is exposed on the wire.
    pub fn is_exposed(&self) -> bool {
        self.flags.contains(SignalFlags::EXPOSED)
    }

    /// Whether a handler was attached before its script was known.
    pub fn needs_learning(&self) -> bool {
        self.flags.contains(SignalFlags::NEEDS_LEARNING)
    }

    /// Whether the owner has to re-serialize this signal.
    pub fn needs_rerender(&self) -> bool {
        self.flags.contains(SignalFlags::NEEDS_RERENDER)
    }

    /// Whether the browser's default action is cancelled.
    pub fn is_default_action_prevented(&self) -> bool {
        self.flags.contains(SignalFlags::PREVENT_DEFAULT)
    }

    /// Whether propagation to ancestors is cancelled.
    pub fn is_propagation_prevented(&self) -> bool {
        self.flags.contains(SignalFlags::PREVENT_PROPAGATION)
    }

    /// Whether a full render has to emit markup for this signal.
    pub fn has_markup(&self) -> bool {
        self.is_connected() || self.is_default_action_prevented() || self.is_propagation_prevented()
    }

    /// Concatenate learned scripts and append the cancellation snippet.
    ///
    /// `scripts` yields the scripts of the learned handlers, in attachment
    /// order.
    pub(crate) fn compose_script<'a, I>(&self, scripts: I, js_scope: &str) -> String
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut out: String = scripts.into_iter().collect();

        let default = self.is_default_action_prevented();
        let propagation = self.is_propagation_prevented();
        if default || propagation {
            out.push_str(js_scope);
            out.push_str(".cancelEvent(e");
            if default && propagation {
                out.push_str(");");
            } else if default {
                out.push_str(",0x2);");
            } else {
                out.push_str(",0x1);");
            }
        }

        out
    }

    pub(crate) fn push_handler(&mut self, handler: HandlerId) -> bool {
        if self.has_handler(handler) {
            return false;
        }
        self.handlers.push(handler);
        true
    }

    pub(crate) fn remove_handler(&mut self, handler: HandlerId) -> bool {
        match self.handlers.iter().position(|h| *h == handler) {
            Some(index) => {
                self.handlers.remove(index);
                true
            }
            None => false,
        }
    }

    pub(crate) fn set_flag(&mut self, flag: SignalFlags, on: bool) {
        self.flags.set(flag, on);
    }

    /// Mark the signal for re-serialization and return the owner to notify.
    pub(crate) fn mark_needs_rerender(&mut self) -> NodeId {
        self.flags.insert(SignalFlags::NEEDS_RERENDER);
        self.owner
    }

    pub(crate) fn mark_rendered(&mut self) {
        self.flags.remove(SignalFlags::NEEDS_RERENDER);
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
