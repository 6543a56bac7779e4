//! Dispatch protocols.
//!
//! A signal firing is delivered through one of five passes:
//!
//! | Pass | Triggers |
//! |---|---|
//! | [`trigger`](Session::trigger) | every handler |
//! | [`process_pre_learn`](Session::process_pre_learn) | unlearned pre-learn handlers, through the learner, undone |
//! | [`process_auto_learn`](Session::process_auto_learn) | unlearned auto-learn handlers, through the learner, for real |
//! | [`process_learned`](Session::process_learned) | learned handlers |
//! | [`process_dynamic`](Session::process_dynamic) | unlearned handlers, with the client event |
//!
//! A live client event runs learned, auto-learn and dynamic in that order,
//! and every handler is triggered at most once per event.
//!
//! Handler panics are caught and logged so that one handler never blocks
//! its siblings.

use std::collections::HashSet;
use std::panic::{self, AssertUnwindSafe};

use crate::error::{LearnError, SignalError};
use crate::event::{ClientEvent, EventBatch, JavaScriptEvent, CHANGE_SIGNAL};
use crate::render::{NodeId, NodeUpdate};
use crate::signal::{Handler, HandlerId, HandlerKind, Learner, SignalFlags, SignalId};

use super::Session;

/// What a dispatch pass did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchReport {
    /// Handlers whose server logic ran, in order.
    pub triggered: Vec<HandlerId>,
    /// Handlers that received a script.
    pub learned: Vec<HandlerId>,
    /// Handlers whose learning failed.
    pub failed: Vec<HandlerId>,
    /// Handlers that panicked.
    pub panicked: Vec<HandlerId>,
}

impl DispatchReport {
    pub fn is_empty(&self) -> bool {
        self.triggered.is_empty()
            && self.learned.is_empty()
            && self.failed.is_empty()
            && self.panicked.is_empty()
    }

    fn merge(&mut self, other: DispatchReport) {
        self.triggered.extend(other.triggered);
        self.learned.extend(other.learned);
        self.failed.extend(other.failed);
        self.panicked.extend(other.panicked);
    }
}

/// Result of handling one inbound client event.
#[derive(Debug)]
pub enum EventOutcome {
    /// The event reached its signal.
    Dispatched {
        signal: SignalId,
        report: DispatchReport,
    },
    /// The event did not name an exposed signal of an enabled node.
    Ignored { reason: SignalError },
}

impl EventOutcome {
    pub fn is_dispatched(&self) -> bool {
        matches!(self, EventOutcome::Dispatched { .. })
    }

    pub fn report(&self) -> Option<&DispatchReport> {
        match self {
            EventOutcome::Dispatched { report, .. } => Some(report),
            EventOutcome::Ignored { .. } => None,
        }
    }
}

/// Run server logic, catching a panic.
///
/// Returns `false` if the handler panicked.
fn guarded<F: FnOnce()>(handler_id: HandlerId, f: F) -> bool {
    match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(()) => true,
        Err(_) => {
            tracing::error!(handler = %handler_id, "handler panicked");
            false
        }
    }
}

/// Run a learner, mapping a panic to [`LearnError::Panicked`].
fn guarded_learn(learner: &mut dyn Learner, handler: &mut Handler) -> Result<String, LearnError> {
    panic::catch_unwind(AssertUnwindSafe(|| learner.learn(handler)))
        .unwrap_or(Err(LearnError::Panicked))
}

impl Session {
    /// Attached handlers, snapshotted so that passes may mutate the arena.
    fn handler_snapshot(&self, signal: SignalId) -> Result<Vec<HandlerId>, SignalError> {
        Ok(self.signal_ref(signal)?.handlers().to_vec())
    }

    /// Trigger every attached handler, in attachment order.
    pub fn trigger(&mut self, signal: SignalId) -> Result<DispatchReport, SignalError> {
        let mut report = DispatchReport::default();
        for id in self.handler_snapshot(signal)? {
            let Some(handler) = self.handlers.get_mut(&id) else {
                continue;
            };
            if guarded(id, || handler.trigger()) {
                report.triggered.push(id);
            } else {
                report.panicked.push(id);
            }
        }
        tracing::debug!(signal = %signal, triggered = report.triggered.len(), "full trigger");
        Ok(report)
    }

    /// Learn every unlearned pre-learn handler by simulating it.
    ///
    /// Each learned script is stored on its handler and every signal the
    /// handler is attached to is re-rendered. The handlers' effects are
    /// undone by the learner.
    pub fn process_pre_learn(
        &mut self,
        signal: SignalId,
        learner: &mut dyn Learner,
    ) -> Result<DispatchReport, SignalError> {
        let mut report = DispatchReport::default();

        for id in self.handler_snapshot(signal)? {
            if !self.wants_learning(id, HandlerKind::PreLearn) {
                continue;
            }
            let Some(handler) = self.handlers.get_mut(&id) else {
                continue;
            };

            match guarded_learn(learner, handler) {
                Ok(script) => {
                    handler.set_script(script);
                    let signals = handler.signals().to_vec();
                    for s in signals {
                        self.repaint(s);
                    }
                    report.learned.push(id);
                }
                Err(err) => {
                    self.learn_failed(id, &err);
                    report.failed.push(id);
                }
            }
        }

        self.refresh_needs_learning(signal);
        tracing::debug!(signal = %signal, learned = report.learned.len(), "pre-learn pass");
        Ok(report)
    }

    /// Learn every unlearned auto-learn handler from a real run.
    ///
    /// The owner is notified once for this signal however many handlers
    /// were learned; other signals sharing a learned handler are notified
    /// per handler.
    pub fn process_auto_learn(
        &mut self,
        signal: SignalId,
        learner: &mut dyn Learner,
    ) -> Result<DispatchReport, SignalError> {
        let mut report = DispatchReport::default();

        for id in self.handler_snapshot(signal)? {
            if !self.wants_learning(id, HandlerKind::AutoLearn) {
                continue;
            }
            let Some(handler) = self.handlers.get_mut(&id) else {
                continue;
            };

            let before = handler.trigger_count();
            let result = guarded_learn(learner, handler);
            if handler.trigger_count() > before {
                report.triggered.push(id);
            }

            match result {
                Ok(script) => {
                    handler.set_script(script);
                    let others: Vec<SignalId> = handler
                        .signals()
                        .iter()
                        .copied()
                        .filter(|s| *s != signal)
                        .collect();
                    for s in others {
                        self.repaint(s);
                    }
                    report.learned.push(id);
                }
                Err(err) => {
                    self.learn_failed(id, &err);
                    report.failed.push(id);
                }
            }
        }

        if !report.learned.is_empty() {
            self.repaint(signal);
        }
        self.refresh_needs_learning(signal);
        tracing::debug!(signal = %signal, learned = report.learned.len(), "auto-learn pass");
        Ok(report)
    }

    /// Trigger every learned handler.
    pub fn process_learned(&mut self, signal: SignalId) -> Result<DispatchReport, SignalError> {
        let mut report = DispatchReport::default();
        for id in self.handler_snapshot(signal)? {
            let Some(handler) = self.handlers.get_mut(&id) else {
                continue;
            };
            if !handler.is_learned() {
                continue;
            }
            if guarded(id, || handler.trigger()) {
                report.triggered.push(id);
            } else {
                report.panicked.push(id);
            }
        }
        Ok(report)
    }

    /// Trigger every unlearned handler in response to a client event.
    pub fn process_dynamic(
        &mut self,
        signal: SignalId,
        event: &JavaScriptEvent,
    ) -> Result<DispatchReport, SignalError> {
        self.dynamic_pass(signal, event, &HashSet::new())
    }

    fn dynamic_pass(
        &mut self,
        signal: SignalId,
        event: &JavaScriptEvent,
        skip: &HashSet<HandlerId>,
    ) -> Result<DispatchReport, SignalError> {
        let mut report = DispatchReport::default();
        for id in self.handler_snapshot(signal)? {
            if skip.contains(&id) {
                continue;
            }
            let Some(handler) = self.handlers.get_mut(&id) else {
                continue;
            };
            if handler.is_learned() {
                continue;
            }
            if guarded(id, || handler.trigger_with_event(event)) {
                report.triggered.push(id);
            } else {
                report.panicked.push(id);
            }
        }
        tracing::debug!(signal = %signal, triggered = report.triggered.len(), "dynamic pass");
        Ok(report)
    }

    /// Deliver a live client event to a signal.
    ///
    /// Runs learned replay, then auto-learn, then dynamic dispatch. A
    /// handler triggered by an earlier pass is skipped by later ones.
    pub fn notify_signal(
        &mut self,
        signal: SignalId,
        event: &JavaScriptEvent,
        learner: &mut dyn Learner,
    ) -> Result<DispatchReport, SignalError> {
        let mut report = self.process_learned(signal)?;
        report.merge(self.process_auto_learn(signal, learner)?);

        let skip: HashSet<HandlerId> = report
            .triggered
            .iter()
            .chain(&report.panicked)
            .copied()
            .collect();
        report.merge(self.dynamic_pass(signal, event, &skip)?);
        Ok(report)
    }

    /// Decode and deliver one inbound client event.
    pub fn handle_client_event(
        &mut self,
        event: &ClientEvent,
        learner: &mut dyn Learner,
    ) -> EventOutcome {
        let resolved = self
            .resolve_client_event(event)
            .and_then(|signal| Ok((signal, self.notify_signal(signal, &event.event, learner)?)));

        match resolved {
            Ok((signal, report)) => EventOutcome::Dispatched { signal, report },
            Err(reason) => {
                tracing::warn!(signal = %event.signal, error = %reason, "ignoring client event");
                EventOutcome::Ignored { reason }
            }
        }
    }

    fn resolve_client_event(&self, event: &ClientEvent) -> Result<SignalId, SignalError> {
        if event.is_user_event() {
            let object_id = event.object_id.as_deref().unwrap_or_default();
            let name = event.name.as_deref().unwrap_or_default();
            self.decode_user_signal(object_id, name)
        } else {
            self.decode_exposed(&event.signal)
        }
    }

    /// Deliver a batch of client events.
    ///
    /// Events for `change` signals are handled first so that form values
    /// are up to date when the other handlers run. Outcomes are returned
    /// in input order.
    pub fn handle_batch(
        &mut self,
        batch: &EventBatch,
        learner: &mut dyn Learner,
    ) -> Vec<EventOutcome> {
        let (changes, others): (Vec<usize>, Vec<usize>) =
            (0..batch.events.len()).partition(|&i| self.is_change_event(&batch.events[i]));

        let mut outcomes: Vec<Option<EventOutcome>> =
            std::iter::repeat_with(|| None).take(batch.events.len()).collect();
        for i in changes.into_iter().chain(others) {
            outcomes[i] = Some(self.handle_client_event(&batch.events[i], learner));
        }
        outcomes.into_iter().flatten().collect()
    }

    fn is_change_event(&self, event: &ClientEvent) -> bool {
        if event.is_user_event() {
            return event.name.as_deref() == Some(CHANGE_SIGNAL);
        }
        self.signal_by_wire_id(&event.signal)
            .and_then(|id| self.signal(id))
            .is_some_and(|s| s.name() == CHANGE_SIGNAL)
    }

    /// Learn what the dirty nodes need, then serialize them.
    ///
    /// Signals of dirty nodes that still need learning get a pre-learn pass
    /// first, so their markup carries the learned scripts.
    pub fn render_pass(&mut self, learner: &mut dyn Learner) -> Vec<NodeUpdate> {
        let dirty: Vec<NodeId> = self.tracker.dirty_nodes().collect();
        for node in dirty {
            let signals = self
                .tracker
                .node(node)
                .map(|n| n.signals().to_vec())
                .unwrap_or_default();
            for signal in signals {
                let needs = self.signal(signal).is_some_and(|s| s.needs_learning());
                if needs {
                    if let Err(err) = self.process_pre_learn(signal, learner) {
                        tracing::warn!(signal = %signal, error = %err, "pre-learn skipped");
                    }
                }
            }
        }

        let drained = self.tracker.take_dirty();
        drained
            .into_iter()
            .filter_map(|node| self.render_node(node, false).ok())
            .collect()
    }

    fn wants_learning(&self, handler: HandlerId, kind: HandlerKind) -> bool {
        self.handlers.get(&handler).is_some_and(|h| {
            h.kind() == kind
                && !h.is_learned()
                && self.config.may_retry_learning(h.learn_failures())
        })
    }

    fn learn_failed(&mut self, handler: HandlerId, err: &LearnError) {
        let Some(h) = self.handlers.get_mut(&handler) else {
            return;
        };
        let failures = h.record_learn_failure();
        tracing::error!(handler = %handler, failures, error = %err, "learning failed");
        if !self.config.may_retry_learning(failures) {
            tracing::error!(
                handler = %handler,
                "giving up on learning, handler stays server-side"
            );
        }
    }

    /// Clear `NEEDS_LEARNING` once no handler can still be learned.
    fn refresh_needs_learning(&mut self, signal: SignalId) {
        let pending = self.signal(signal).is_some_and(|s| {
            s.handlers().iter().any(|id| {
                self.handlers.get(id).is_some_and(|h| {
                    h.kind().is_learnable()
                        && !h.is_learned()
                        && self.config.may_retry_learning(h.learn_failures())
                })
            })
        });
        if !pending {
            if let Some(s) = self.signals.get_mut(&signal) {
                s.set_flag(SignalFlags::NEEDS_LEARNING, false);
            }
        }
    }
}
