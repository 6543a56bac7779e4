//! Session Runtime
//!
//! The session is the central coordinator that connects nodes, signals and
//! handlers. It owns all three as arenas keyed by ID, together with the ID
//! sequences, the exposure registry and the render tracker.
//!
//! # How It Works
//!
//! 1. A UI node is created, then one signal per event it supports.
//!
//! 2. Handlers are inserted into the session and attached to signals. The
//!    session records the relation on both sides and runs the attach
//!    transition:
//!    a. Exposes the signal if the handler needs the server
//!    b. Flags it for learning if the handler's script is unknown
//!    c. Notifies the owner that its connections changed
//!
//! 3. Detaching reverses the exposure once no server-side handler remains.
//!
//! 4. Destroying a node destroys its signals and every handler bound to
//!    its lifetime.
//!
//! # Thread Safety
//!
//! A session has no interior mutability and no global state; every
//! operation takes `&mut self`. Sessions are `Send`, so a host may move one
//! between worker threads, and any number of sessions run in parallel. See
//! [`SharedSession`](super::SharedSession) for a lockable handle.

use std::collections::HashMap;

use indexmap::IndexMap;

use crate::config::SessionConfig;
use crate::error::{ConfigError, SignalError};
use crate::render::{NodeId, NodeUpdate, RenderTracker, SignalMarkup, UiNode};
use crate::signal::{
    CallTarget, Handler, HandlerId, HandlerKind, IdSequence, RoundTripCall, Signal, SignalFlags,
    SignalId,
};

use super::registry::ExposureRegistry;

/// One user session: the arena of nodes, signals and handlers.
pub struct Session {
    pub(super) config: SessionConfig,

    signal_ids: IdSequence,
    handler_ids: IdSequence,
    node_ids: IdSequence,

    /// All signals, in creation order.
    pub(super) signals: IndexMap<SignalId, Signal>,

    pub(super) handlers: HashMap<HandlerId, Handler>,

    pub(super) registry: ExposureRegistry,

    pub(super) tracker: RenderTracker,
}

impl Default for Session {
    fn default() -> Self {
        Self::new(SessionConfig::default())
    }
}

impl Session {
    /// Create an empty session.
    ///
    /// The configuration is expected to be valid; use
    /// [`try_new`](Self::try_new) for configurations that were not loaded
    /// through [`SessionConfig::from_json`].
    pub fn new(config: SessionConfig) -> Self {
        debug_assert!(
            config.validate().is_ok(),
            "invalid session configuration: {:?}",
            config
        );
        let registry = ExposureRegistry::new(config.always_expose_signals);
        Self {
            config,
            signal_ids: IdSequence::new(),
            handler_ids: IdSequence::new(),
            node_ids: IdSequence::new(),
            signals: IndexMap::new(),
            handlers: HashMap::new(),
            registry,
            tracker: RenderTracker::new(),
        }
    }

    /// Create an empty session after validating `config`.
    pub fn try_new(config: SessionConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::new(config))
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// The exposure registry.
    pub fn registry(&self) -> &ExposureRegistry {
        &self.registry
    }

    /// The render tracker.
    pub fn tracker(&self) -> &RenderTracker {
        &self.tracker
    }

    // ------------------------------------------------------------------
    // Nodes
    // ------------------------------------------------------------------

    /// Create a node whose form identity is derived from its ID.
    ///
    /// IDs whose derived form identity is already taken are skipped.
    pub fn create_node(&mut self) -> NodeId {
        loop {
            let id = NodeId::allocate(&mut self.node_ids);
            let form_id = format!("o{:x}", id.raw());
            if !self.tracker.is_form_id_taken(&form_id) {
                return self.tracker.add_node(UiNode::new(id, form_id));
            }
        }
    }

    /// Create a node with an explicit form identity.
    pub fn create_node_with_form_id(
        &mut self,
        form_id: impl Into<String>,
    ) -> Result<NodeId, SignalError> {
        let form_id = form_id.into();
        if self.tracker.is_form_id_taken(&form_id) {
            return Err(SignalError::DuplicateFormId(form_id));
        }
        let id = NodeId::allocate(&mut self.node_ids);
        Ok(self.tracker.add_node(UiNode::new(id, form_id)))
    }

    pub fn node(&self, node: NodeId) -> Option<&UiNode> {
        self.tracker.node(node)
    }

    /// Enable or disable a node. Disabled nodes ignore client events.
    pub fn set_node_enabled(&mut self, node: NodeId, enabled: bool) -> Result<(), SignalError> {
        self.tracker
            .node_mut(node)
            .ok_or(SignalError::UnknownNode(node))?
            .set_enabled(enabled);
        Ok(())
    }

    /// Destroy a node, its signals, and the handlers bound to it.
    pub fn destroy_node(&mut self, node: NodeId) -> Result<(), SignalError> {
        let (signals, owned) = {
            let n = self.tracker.node(node).ok_or(SignalError::UnknownNode(node))?;
            (n.signals().to_vec(), n.owned_handlers().to_vec())
        };

        for signal in signals {
            self.destroy_signal(signal)?;
        }
        for handler in owned {
            // Already gone if it was destroyed explicitly.
            if self.handlers.contains_key(&handler) {
                self.destroy_handler(handler)?;
            }
        }

        self.tracker.remove_node(node);
        tracing::debug!(node = %node, "node destroyed");
        Ok(())
    }

    // ------------------------------------------------------------------
    // Signals
    // ------------------------------------------------------------------

    /// Create a signal named `name` on `owner`.
    pub fn create_signal(
        &mut self,
        owner: NodeId,
        name: impl Into<String>,
    ) -> Result<SignalId, SignalError> {
        let node = self
            .tracker
            .node_mut(owner)
            .ok_or(SignalError::UnknownNode(owner))?;
        let signal = Signal::new(&mut self.signal_ids, name, owner);
        let id = signal.id();
        node.add_signal(id);
        self.signals.insert(id, signal);
        Ok(id)
    }

    pub fn signal(&self, signal: SignalId) -> Option<&Signal> {
        self.signals.get(&signal)
    }

    pub(super) fn signal_ref(&self, signal: SignalId) -> Result<&Signal, SignalError> {
        self.signals
            .get(&signal)
            .ok_or(SignalError::UnknownSignal(signal))
    }

    fn signal_mut(&mut self, signal: SignalId) -> Result<&mut Signal, SignalError> {
        self.signals
            .get_mut(&signal)
            .ok_or(SignalError::UnknownSignal(signal))
    }

    /// Number of live signals.
    pub fn signal_count(&self) -> usize {
        self.signals.len()
    }

    /// Destroy a signal, detaching it from every handler and unexposing it.
    ///
    /// The owner is re-rendered without the signal.
    pub fn destroy_signal(&mut self, signal: SignalId) -> Result<(), SignalError> {
        let removed = self
            .signals
            .shift_remove(&signal)
            .ok_or(SignalError::UnknownSignal(signal))?;

        for handler in removed.handlers() {
            if let Some(h) = self.handlers.get_mut(handler) {
                h.detach_signal(signal);
            }
        }
        if removed.is_exposed() {
            self.registry.unregister(signal);
        }
        if let Some(node) = self.tracker.node_mut(removed.owner()) {
            node.remove_signal(signal);
            self.tracker.notify_connections_changed(removed.owner());
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Handlers
    // ------------------------------------------------------------------

    /// Move a handler into the session.
    pub fn insert_handler(&mut self, handler: Handler) -> HandlerId {
        let id = HandlerId::allocate(&mut self.handler_ids);
        self.handlers.insert(id, handler);
        id
    }

    pub fn handler(&self, handler: HandlerId) -> Option<&Handler> {
        self.handlers.get(&handler)
    }

    pub(super) fn handler_mut(&mut self, handler: HandlerId) -> Result<&mut Handler, SignalError> {
        self.handlers
            .get_mut(&handler)
            .ok_or(SignalError::UnknownHandler(handler))
    }

    /// Detach a handler from all its signals and drop it.
    pub fn destroy_handler(&mut self, handler: HandlerId) -> Result<(), SignalError> {
        let signals = self
            .handlers
            .get(&handler)
            .ok_or(SignalError::UnknownHandler(handler))?
            .signals()
            .to_vec();

        for signal in signals {
            self.remove_listener(signal, handler)?;
        }
        self.tracker.disown_handler(handler);
        self.handlers.remove(&handler);
        Ok(())
    }

    /// Replace the script of a client-only handler.
    ///
    /// Every signal the handler is attached to is re-rendered.
    pub fn set_client_script(
        &mut self,
        handler: HandlerId,
        script: impl Into<String>,
    ) -> Result<(), SignalError> {
        let h = self.handler_mut(handler)?;
        if h.kind() != HandlerKind::ClientOnly {
            return Err(SignalError::NotClientOnly(handler));
        }
        h.set_script(script.into());
        let signals = h.signals().to_vec();
        for signal in signals {
            self.repaint(signal);
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Attach / detach
    // ------------------------------------------------------------------

    /// Attach a handler to a signal.
    ///
    /// Returns `false` if the handler was already attached.
    pub fn add_listener(&mut self, signal: SignalId, handler: HandlerId) -> Result<bool, SignalError> {
        self.signal_ref(signal)?;
        let h = self.handler_mut(handler)?;
        if !h.attach_signal(signal) {
            return Ok(false);
        }
        let kind = h.kind();
        let learned = h.is_learned();

        self.signal_mut(signal)?.push_handler(handler);
        tracing::debug!(signal = %signal, handler = %handler, kind = %kind, "listener added");

        if kind.needs_server() {
            self.on_listener_added(signal, learned);
        } else {
            self.repaint(signal);
        }
        Ok(true)
    }

    /// Attach a handler whose lifetime is bound to `owner`.
    ///
    /// Destroying `owner` destroys the handler.
    pub fn add_listener_owned(
        &mut self,
        signal: SignalId,
        handler: HandlerId,
        owner: NodeId,
    ) -> Result<bool, SignalError> {
        if self.tracker.node(owner).is_none() {
            return Err(SignalError::UnknownNode(owner));
        }
        let added = self.add_listener(signal, handler)?;
        if let Some(node) = self.tracker.node_mut(owner) {
            node.own_handler(handler);
        }
        Ok(added)
    }

    /// Detach a handler from a signal.
    ///
    /// Returns `false` if the handler was not attached.
    pub fn remove_listener(
        &mut self,
        signal: SignalId,
        handler: HandlerId,
    ) -> Result<bool, SignalError> {
        if !self.signal_mut(signal)?.remove_handler(handler) {
            return Ok(false);
        }
        if let Some(h) = self.handlers.get_mut(&handler) {
            h.detach_signal(signal);
        }
        tracing::debug!(signal = %signal, handler = %handler, "listener removed");

        self.on_listener_removed(signal);
        Ok(true)
    }

    fn on_listener_added(&mut self, signal: SignalId, learned: bool) {
        let policy = self.registry.always_expose_signals();
        let Some(s) = self.signals.get_mut(&signal) else {
            return;
        };

        if !s.is_exposed() && (policy || !learned) {
            self.registry.register(signal);
            s.set_flag(SignalFlags::EXPOSED, true);
        }
        if !learned {
            s.set_flag(SignalFlags::NEEDS_LEARNING, true);
        }
        self.repaint(signal);
    }

    fn on_listener_removed(&mut self, signal: SignalId) {
        let (needs_server, unlearned) = self.server_requirements(signal);
        let Some(s) = self.signals.get_mut(&signal) else {
            return;
        };

        if !needs_server && s.is_exposed() {
            self.registry.unregister(signal);
            s.set_flag(SignalFlags::EXPOSED, false);
        }
        if !unlearned {
            s.set_flag(SignalFlags::NEEDS_LEARNING, false);
        }
        self.repaint(signal);
    }

    /// Whether any attached handler needs the server, and whether any is
    /// still unlearned.
    pub(super) fn server_requirements(&self, signal: SignalId) -> (bool, bool) {
        let Some(s) = self.signals.get(&signal) else {
            return (false, false);
        };
        s.handlers()
            .iter()
            .filter_map(|id| self.handlers.get(id))
            .fold((false, false), |(server, unlearned), h| {
                (
                    server || h.kind().needs_server(),
                    unlearned || !h.is_learned(),
                )
            })
    }

    /// Mark a signal for re-serialization and notify its owner.
    pub(super) fn repaint(&mut self, signal: SignalId) {
        if let Some(s) = self.signals.get_mut(&signal) {
            let owner = s.mark_needs_rerender();
            self.tracker.notify_connections_changed(owner);
        }
    }

    // ------------------------------------------------------------------
    // Event cancellation
    // ------------------------------------------------------------------

    /// Cancel (or stop cancelling) the browser's default action.
    pub fn set_prevent_default(&mut self, signal: SignalId, prevent: bool) -> Result<(), SignalError> {
        self.set_cancel_flag(signal, SignalFlags::PREVENT_DEFAULT, prevent)
    }

    /// Cancel (or stop cancelling) propagation to ancestor elements.
    pub fn set_prevent_propagation(
        &mut self,
        signal: SignalId,
        prevent: bool,
    ) -> Result<(), SignalError> {
        self.set_cancel_flag(signal, SignalFlags::PREVENT_PROPAGATION, prevent)
    }

    fn set_cancel_flag(
        &mut self,
        signal: SignalId,
        flag: SignalFlags,
        on: bool,
    ) -> Result<(), SignalError> {
        let s = self.signal_mut(signal)?;
        if s.flags().contains(flag) == on {
            return Ok(());
        }
        s.set_flag(flag, on);
        self.repaint(signal);
        Ok(())
    }

    // ------------------------------------------------------------------
    // Scripts
    // ------------------------------------------------------------------

    /// The client script of a signal: every learned handler's script in
    /// attachment order, followed by the cancellation snippet.
    pub fn script(&self, signal: SignalId) -> Result<String, SignalError> {
        let s = self.signal_ref(signal)?;
        Ok(self.compose(s))
    }

    fn compose(&self, signal: &Signal) -> String {
        let scripts = signal
            .handlers()
            .iter()
            .filter_map(|id| self.handlers.get(id))
            .filter_map(Handler::script);
        signal.compose_script(scripts, &self.config.js_scope)
    }

    /// Build the JavaScript statement that runs a signal's script and, if
    /// the signal is exposed, calls back into the server.
    pub fn round_trip_call(
        &self,
        signal: SignalId,
        call: &RoundTripCall,
    ) -> Result<String, SignalError> {
        let s = self.signal_ref(signal)?;
        let node = self
            .tracker
            .node(s.owner())
            .ok_or(SignalError::UnknownNode(s.owner()))?;
        let script = self.compose(s);

        Ok(call.render(&CallTarget {
            app_class: &self.config.app_class,
            form_id: node.form_id(),
            name: s.name(),
            script: &script,
            exposed: s.is_exposed(),
        }))
    }

    // ------------------------------------------------------------------
    // Wire decoding
    // ------------------------------------------------------------------

    /// Resolve a wire token to a live signal, exposed or not.
    pub fn signal_by_wire_id(&self, token: &str) -> Option<SignalId> {
        SignalId::parse_wire(token)
            .ok()
            .filter(|id| self.signals.contains_key(id))
    }

    /// Resolve a wire token for an inbound event.
    ///
    /// The signal must be exposed and its owner enabled.
    pub fn decode_exposed(&self, token: &str) -> Result<SignalId, SignalError> {
        let id = SignalId::parse_wire(token)?;
        if self.accepts_events(id) {
            Ok(id)
        } else {
            Err(SignalError::UnknownWireId(token.to_string()))
        }
    }

    /// Resolve a user event by its owner's form identity and signal name.
    pub fn decode_user_signal(&self, form_id: &str, name: &str) -> Result<SignalId, SignalError> {
        let unknown = || SignalError::UnknownWireId(format!("{}.{}", form_id, name));
        let node = self.tracker.find_by_form_id(form_id).ok_or_else(unknown)?;
        let signal = self
            .tracker
            .node(node)
            .and_then(|n| {
                n.signals()
                    .iter()
                    .copied()
                    .find(|id| self.signals.get(id).is_some_and(|s| s.name() == name))
            })
            .ok_or_else(unknown)?;

        if self.accepts_events(signal) {
            Ok(signal)
        } else {
            Err(unknown())
        }
    }

    fn accepts_events(&self, signal: SignalId) -> bool {
        self.registry.contains(signal)
            && self
                .signals
                .get(&signal)
                .and_then(|s| self.tracker.node(s.owner()))
                .is_some_and(UiNode::is_enabled)
    }

    // ------------------------------------------------------------------
    // Rendering
    // ------------------------------------------------------------------

    /// Serialize a node's event markup.
    ///
    /// A full render lists every signal with markup; an incremental one only
    /// the signals flagged for re-rendering. Either way the listed signals
    /// are marked rendered.
    pub fn render_node(&mut self, node: NodeId, full: bool) -> Result<NodeUpdate, SignalError> {
        let n = self.tracker.node(node).ok_or(SignalError::UnknownNode(node))?;
        let form_id = n.form_id().to_string();
        let ids = n.signals().to_vec();

        let mut markup = Vec::new();
        for id in ids {
            let Some(s) = self.signals.get(&id) else {
                continue;
            };
            let include = if full { s.has_markup() } else { s.needs_rerender() };
            if include {
                markup.push(SignalMarkup {
                    event: s.name().to_string(),
                    script: self.compose(s),
                    wire_id: s.wire_id(),
                    exposed: s.is_exposed(),
                });
            }
            if let Some(s) = self.signals.get_mut(&id) {
                s.mark_rendered();
            }
        }

        Ok(NodeUpdate {
            node,
            form_id,
            signals: markup,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(always_expose: bool) -> Session {
        Session::new(SessionConfig {
            always_expose_signals: always_expose,
            ..SessionConfig::default()
        })
    }

    #[test]
    fn session_is_send() {
        fn assert_send<T: Send>() {}
        assert_send::<Session>();
    }

    #[test]
    fn attach_exposes_and_flags_learning() {
        let mut s = session(true);
        let node = s.create_node();
        let clicked = s.create_signal(node, "click").unwrap();
        let h = s.insert_handler(Handler::auto_learn(|| {}));

        assert!(s.add_listener(clicked, h).unwrap());

        let signal = s.signal(clicked).unwrap();
        assert!(signal.is_exposed());
        assert!(signal.needs_learning());
        assert!(signal.needs_rerender());
        assert!(s.registry().contains(clicked));
        assert!(s.tracker().is_dirty(node));
        assert_eq!(s.handler(h).unwrap().signals(), &[clicked]);
    }

    #[test]
    fn attach_twice_is_a_no_op() {
        let mut s = session(true);
        let node = s.create_node();
        let clicked = s.create_signal(node, "click").unwrap();
        let h = s.insert_handler(Handler::auto_learn(|| {}));

        assert!(s.add_listener(clicked, h).unwrap());
        let changes = s.node(node).unwrap().connection_changes();

        assert!(!s.add_listener(clicked, h).unwrap());
        assert_eq!(s.signal(clicked).unwrap().listener_count(), 1);
        assert_eq!(s.registry().len(), 1);
        assert_eq!(s.node(node).unwrap().connection_changes(), changes);
    }

    #[test]
    fn client_only_handler_only_repaints() {
        let mut s = session(true);
        let node = s.create_node();
        let clicked = s.create_signal(node, "click").unwrap();
        let h = s.insert_handler(Handler::client_only("x++;"));

        s.add_listener(clicked, h).unwrap();

        let signal = s.signal(clicked).unwrap();
        assert!(signal.is_connected());
        assert!(!signal.is_exposed());
        assert!(!signal.needs_learning());
        assert!(s.tracker().is_dirty(node));
    }

    #[test]
    fn learned_handler_is_not_exposed_without_policy() {
        let mut s = session(false);
        let node = s.create_node();
        let clicked = s.create_signal(node, "click").unwrap();
        let h = s.insert_handler(Handler::auto_learn(|| {}));
        s.handler_mut(h).unwrap().set_script("a();".into());

        s.add_listener(clicked, h).unwrap();
        assert!(!s.signal(clicked).unwrap().is_exposed());
        assert!(s.registry().is_empty());

        let unlearned = s.insert_handler(Handler::auto_learn(|| {}));
        s.add_listener(clicked, unlearned).unwrap();
        assert!(s.signal(clicked).unwrap().is_exposed());
    }

    #[test]
    fn detach_last_server_handler_unexposes() {
        let mut s = session(true);
        let node = s.create_node();
        let clicked = s.create_signal(node, "click").unwrap();
        let server = s.insert_handler(Handler::dynamic(|_| {}));
        let client = s.insert_handler(Handler::client_only("x++;"));

        s.add_listener(clicked, server).unwrap();
        s.add_listener(clicked, client).unwrap();
        s.tracker.take_dirty();

        assert!(s.remove_listener(clicked, server).unwrap());
        let signal = s.signal(clicked).unwrap();
        assert!(!signal.is_exposed());
        assert!(!signal.needs_learning());
        assert!(signal.is_connected());
        assert!(!s.registry().contains(clicked));
        assert!(s.tracker().is_dirty(node));
        assert!(s.handler(server).unwrap().signals().is_empty());
    }

    #[test]
    fn detach_of_unattached_handler_is_benign() {
        let mut s = session(true);
        let node = s.create_node();
        let clicked = s.create_signal(node, "click").unwrap();
        let h = s.insert_handler(Handler::auto_learn(|| {}));

        assert!(!s.remove_listener(clicked, h).unwrap());
        assert!(!s.tracker().is_dirty(node));
    }

    #[test]
    fn unknown_ids_are_errors() {
        let mut s = Session::default();
        let node = s.create_node();
        let clicked = s.create_signal(node, "click").unwrap();
        let h = s.insert_handler(Handler::auto_learn(|| {}));

        assert!(matches!(
            s.add_listener(SignalId::from_raw(99), h),
            Err(SignalError::UnknownSignal(_))
        ));
        s.destroy_handler(h).unwrap();
        assert!(matches!(
            s.add_listener(clicked, h),
            Err(SignalError::UnknownHandler(_))
        ));
        assert!(matches!(
            s.create_signal(NodeId::from(42), "click"),
            Err(SignalError::UnknownNode(_))
        ));
    }

    #[test]
    fn cancel_flags_repaint_only_on_change() {
        let mut s = Session::default();
        let node = s.create_node();
        let clicked = s.create_signal(node, "click").unwrap();

        s.set_prevent_default(clicked, true).unwrap();
        s.set_prevent_default(clicked, true).unwrap();
        assert_eq!(s.node(node).unwrap().connection_changes(), 1);
        assert_eq!(s.script(clicked).unwrap(), "Mimic.cancelEvent(e,0x2);");

        s.set_prevent_propagation(clicked, true).unwrap();
        assert_eq!(s.script(clicked).unwrap(), "Mimic.cancelEvent(e);");
        assert_eq!(s.node(node).unwrap().connection_changes(), 2);
    }

    #[test]
    fn set_client_script_repaints_every_signal() {
        let mut s = Session::default();
        let a = s.create_node();
        let b = s.create_node();
        let sa = s.create_signal(a, "click").unwrap();
        let sb = s.create_signal(b, "keydown").unwrap();
        let h = s.insert_handler(Handler::client_only("x++;"));
        s.add_listener(sa, h).unwrap();
        s.add_listener(sb, h).unwrap();
        s.tracker.take_dirty();

        s.set_client_script(h, "y--;").unwrap();
        assert_eq!(s.script(sa).unwrap(), "y--;");
        assert!(s.tracker().is_dirty(a));
        assert!(s.tracker().is_dirty(b));

        let server = s.insert_handler(Handler::auto_learn(|| {}));
        assert!(matches!(
            s.set_client_script(server, "z;"),
            Err(SignalError::NotClientOnly(_))
        ));
    }

    #[test]
    fn destroying_a_signal_cleans_both_sides() {
        let mut s = Session::default();
        let node = s.create_node();
        let clicked = s.create_signal(node, "click").unwrap();
        let h = s.insert_handler(Handler::auto_learn(|| {}));
        s.add_listener(clicked, h).unwrap();

        s.tracker.take_dirty();

        s.destroy_signal(clicked).unwrap();
        assert!(s.signal(clicked).is_none());
        assert!(s.handler(h).unwrap().signals().is_empty());
        assert!(!s.registry().contains(clicked));
        assert!(s.node(node).unwrap().signals().is_empty());
        assert!(s.tracker().is_dirty(node));
        assert!(s.render_node(node, true).unwrap().signals.is_empty());
    }

    #[test]
    fn destroying_a_handler_releases_its_owner_binding() {
        let mut s = Session::default();
        let button = s.create_node();
        let dialog = s.create_node();
        let clicked = s.create_signal(button, "click").unwrap();
        let h = s.insert_handler(Handler::auto_learn(|| {}));
        s.add_listener_owned(clicked, h, dialog).unwrap();
        assert_eq!(s.node(dialog).unwrap().owned_handlers(), &[h]);

        s.destroy_handler(h).unwrap();
        assert!(s.node(dialog).unwrap().owned_handlers().is_empty());
        s.destroy_node(dialog).unwrap();
    }

    #[test]
    fn form_ids_are_unique() {
        let mut s = Session::default();
        let named = s.create_node_with_form_id("o1").unwrap();
        let first = s.create_node();
        let second = s.create_node();

        // `named` took ID 0; the generated "o1" collides and is skipped.
        assert_eq!(s.node(first).unwrap().form_id(), "o2");
        assert_eq!(s.node(second).unwrap().form_id(), "o3");
        assert_eq!(s.tracker().find_by_form_id("o1"), Some(named));

        assert!(matches!(
            s.create_node_with_form_id("o1"),
            Err(SignalError::DuplicateFormId(id)) if id == "o1"
        ));
        assert!(matches!(
            s.create_node_with_form_id("o3"),
            Err(SignalError::DuplicateFormId(_))
        ));

        // Freed identities can be reused.
        s.destroy_node(second).unwrap();
        let reused = s.create_node_with_form_id("o3").unwrap();
        assert_eq!(s.tracker().find_by_form_id("o3"), Some(reused));
        assert_eq!(s.tracker().find_by_form_id("o1"), Some(named));
    }

    #[test]
    fn try_new_validates_configuration() {
        let bad = SessionConfig {
            js_scope: "not a scope".into(),
            ..SessionConfig::default()
        };
        assert!(matches!(Session::try_new(bad), Err(ConfigError::Invalid(_))));

        let session = Session::try_new(SessionConfig::default()).unwrap();
        assert_eq!(session.config().js_scope, "Mimic");
    }

    #[test]
    fn destroying_a_node_drops_owned_handlers() {
        let mut s = Session::default();
        let button = s.create_node();
        let dialog = s.create_node();
        let clicked = s.create_signal(button, "click").unwrap();
        let bound = s.insert_handler(Handler::auto_learn(|| {}));
        let free = s.insert_handler(Handler::auto_learn(|| {}));

        s.add_listener_owned(clicked, bound, dialog).unwrap();
        s.add_listener(clicked, free).unwrap();

        s.destroy_node(dialog).unwrap();
        assert!(s.handler(bound).is_none());
        assert!(s.handler(free).is_some());
        assert_eq!(s.signal(clicked).unwrap().handlers(), &[free]);

        s.destroy_node(button).unwrap();
        assert_eq!(s.signal_count(), 0);
        assert!(s.registry().is_empty());
        assert!(s.handler(free).unwrap().signals().is_empty());
    }

    #[test]
    fn decoding_requires_exposure_and_enabled_owner() {
        let mut s = Session::default();
        let node = s.create_node_with_form_id("btn").unwrap();
        let clicked = s.create_signal(node, "click").unwrap();
        let token = clicked.to_wire();

        assert!(matches!(
            s.decode_exposed(&token),
            Err(SignalError::UnknownWireId(_))
        ));
        assert_eq!(s.signal_by_wire_id(&token), Some(clicked));

        let h = s.insert_handler(Handler::dynamic(|_| {}));
        s.add_listener(clicked, h).unwrap();
        assert_eq!(s.decode_exposed(&token).unwrap(), clicked);
        assert_eq!(s.decode_user_signal("btn", "click").unwrap(), clicked);
        assert!(s.decode_user_signal("btn", "dblclick").is_err());

        s.set_node_enabled(node, false).unwrap();
        assert!(s.decode_exposed(&token).is_err());

        assert!(matches!(s.decode_exposed("S0"), Err(SignalError::WireId(_))));
    }

    #[test]
    fn round_trip_call_uses_form_identity() {
        let mut s = Session::default();
        let node = s.create_node_with_form_id("o7").unwrap();
        let clicked = s.create_signal(node, "click").unwrap();
        let h = s.insert_handler(Handler::dynamic(|_| {}));
        s.add_listener(clicked, h).unwrap();

        let call = RoundTripCall::new().arg("1").unwrap();
        assert_eq!(
            s.round_trip_call(clicked, &call).unwrap(),
            "var a1=1,a2=null,a3=null,a4=null,a5=null,a6=null;Mimic.app.emit('o7','click',1);"
        );
    }

    #[test]
    fn render_node_lists_signals() {
        let mut s = Session::default();
        let node = s.create_node();
        let clicked = s.create_signal(node, "click").unwrap();
        let _idle = s.create_signal(node, "mouseover").unwrap();
        let h = s.insert_handler(Handler::client_only("x++;"));
        s.add_listener(clicked, h).unwrap();

        let update = s.render_node(node, false).unwrap();
        assert_eq!(update.signals.len(), 1);
        assert_eq!(update.signals[0].script, "x++;");
        assert!(!s.signal(clicked).unwrap().needs_rerender());

        assert!(s.render_node(node, false).unwrap().signals.is_empty());
        let full = s.render_node(node, true).unwrap();
        assert_eq!(full.signals.len(), 1);
        assert_eq!(full.signals[0].event, "click");
        assert_eq!(full.form_id, "o0");
    }
}
