//! Handler Implementation
//!
//! A Handler is one unit of reaction to a signal firing. Handlers come in
//! four variants that share the same capability set (trigger, undo,
//! classify, attached script) but differ in how their client-side script
//! becomes known:
//!
//! - **Client-only**: the script is given at construction. Triggering on
//!   the server does nothing.
//! - **Auto-learn**: the script is captured the first time the handler runs
//!   for real in response to a client event.
//! - **Pre-learn**: the script is captured ahead of time by running the
//!   handler and immediately undoing its effect.
//! - **Dynamic**: plain server logic that reads the client event. It can
//!   never be learned and always needs a round trip.
//!
//! A handler may be attached to several signals. It keeps the IDs of those
//! signals so the session can re-dirty every one of them when the script
//! changes. The IDs are plain values, not ownership: a handler never keeps
//! a signal alive.

use std::fmt;

use smallvec::SmallVec;

use crate::error::HandlerError;
use crate::event::JavaScriptEvent;

use super::SignalId;

/// Server-side logic of a learnable handler.
pub type Action = Box<dyn FnMut() + Send>;

/// Server-side logic of a dynamic handler.
pub type EventAction = Box<dyn FnMut(&JavaScriptEvent) + Send>;

/// The variant of a handler, as reported by [`Handler::kind`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HandlerKind {
    ClientOnly,
    AutoLearn,
    PreLearn,
    Dynamic,
}

impl HandlerKind {
    /// Stable classification string.
    pub fn as_str(self) -> &'static str {
        match self {
            HandlerKind::ClientOnly => "client-only",
            HandlerKind::AutoLearn => "auto-learn",
            HandlerKind::PreLearn => "pre-learn",
            HandlerKind::Dynamic => "dynamic",
        }
    }

    /// Whether a learner can turn this handler into client script.
    pub fn is_learnable(self) -> bool {
        matches!(self, HandlerKind::AutoLearn | HandlerKind::PreLearn)
    }

    /// Whether the handler has server logic that a client event must reach.
    pub fn needs_server(self) -> bool {
        !matches!(self, HandlerKind::ClientOnly)
    }
}

impl fmt::Display for HandlerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

enum Behavior {
    ClientOnly,
    AutoLearn {
        trigger: Action,
    },
    PreLearn {
        trigger: Action,
        undo: Action,
        /// Set by `trigger`, cleared by `undo_trigger`.
        undo_pending: bool,
    },
    Dynamic {
        trigger: EventAction,
    },
}

/// A unit of reaction attached to one or more signals.
///
/// # Example
///
/// ```rust,ignore
/// let open = Handler::pre_learn(
///     move || panel.show(),
///     move || panel.hide(),
/// );
/// let id = session.insert_handler(open);
/// session.add_listener(clicked, id)?;
/// ```
pub struct Handler {
    behavior: Behavior,

    /// Learned client script; `None` until learned.
    script: Option<String>,

    /// Signals this handler is attached to.
    signals: SmallVec<[SignalId; 2]>,

    /// Number of times `trigger` ran.
    trigger_count: u64,

    /// Consecutive failed learning attempts.
    learn_failures: u32,
}

impl Handler {
    fn with_behavior(behavior: Behavior, script: Option<String>) -> Self {
        Self {
            behavior,
            script,
            signals: SmallVec::new(),
            trigger_count: 0,
            learn_failures: 0,
        }
    }

    /// Create a client-only handler with the given JavaScript statements.
    pub fn client_only(script: impl Into<String>) -> Self {
        Self::with_behavior(Behavior::ClientOnly, Some(script.into()))
    }

    /// Create a client-only handler from a JavaScript function.
    ///
    /// The function is called with the event target `o`, the event `e` and
    /// `arg_count` positional arguments `a1..aN` of the round-trip call.
    pub fn client_function(function: &str, arg_count: usize) -> Self {
        let mut script = format!("({})(o,e", function);
        for i in 1..=arg_count {
            script.push_str(&format!(",a{}", i));
        }
        script.push_str(");");
        Self::client_only(script)
    }

    /// Create a handler that learns its script from its first real run.
    pub fn auto_learn<F>(trigger: F) -> Self
    where
        F: FnMut() + Send + 'static,
    {
        Self::with_behavior(
            Behavior::AutoLearn {
                trigger: Box::new(trigger),
            },
            None,
        )
    }

    /// Create a handler that is learned ahead of time.
    ///
    /// `undo` must reverse exactly what `trigger` did.
    pub fn pre_learn<F, U>(trigger: F, undo: U) -> Self
    where
        F: FnMut() + Send + 'static,
        U: FnMut() + Send + 'static,
    {
        Self::with_behavior(
            Behavior::PreLearn {
                trigger: Box::new(trigger),
                undo: Box::new(undo),
                undo_pending: false,
            },
            None,
        )
    }

    /// Create a server-only handler that receives the client event.
    pub fn dynamic<F>(trigger: F) -> Self
    where
        F: FnMut(&JavaScriptEvent) + Send + 'static,
    {
        Self::with_behavior(
            Behavior::Dynamic {
                trigger: Box::new(trigger),
            },
            None,
        )
    }

    /// Classify this handler.
    pub fn kind(&self) -> HandlerKind {
        match self.behavior {
            Behavior::ClientOnly => HandlerKind::ClientOnly,
            Behavior::AutoLearn { .. } => HandlerKind::AutoLearn,
            Behavior::PreLearn { .. } => HandlerKind::PreLearn,
            Behavior::Dynamic { .. } => HandlerKind::Dynamic,
        }
    }

    /// Run the handler's server logic.
    ///
    /// Dynamic handlers receive an empty event.
    pub fn trigger(&mut self) {
        self.fire(None);
    }

    /// Run the handler's server logic for a live client event.
    pub fn trigger_with_event(&mut self, event: &JavaScriptEvent) {
        self.fire(Some(event));
    }

    fn fire(&mut self, event: Option<&JavaScriptEvent>) {
        self.trigger_count += 1;
        match &mut self.behavior {
            Behavior::ClientOnly => {}
            Behavior::AutoLearn { trigger } => trigger(),
            Behavior::PreLearn {
                trigger,
                undo_pending,
                ..
            } => {
                trigger();
                *undo_pending = true;
            }
            Behavior::Dynamic { trigger } => match event {
                Some(event) => trigger(event),
                None => trigger(&JavaScriptEvent::default()),
            },
        }
    }

    /// Reverse the effect of the last [`trigger`](Self::trigger).
    ///
    /// A no-op for every variant except pre-learn. A pre-learn handler must
    /// have been triggered since its last undo.
    pub fn undo_trigger(&mut self) -> Result<(), HandlerError> {
        match &mut self.behavior {
            Behavior::PreLearn {
                undo, undo_pending, ..
            } => {
                if !*undo_pending {
                    return Err(HandlerError::UndoWithoutTrigger);
                }
                undo();
                *undo_pending = false;
                Ok(())
            }
            _ => Ok(()),
        }
    }

    /// The learned client script, if any.
    pub fn script(&self) -> Option<&str> {
        self.script.as_deref()
    }

    /// Whether the client script is known.
    pub fn is_learned(&self) -> bool {
        self.script.is_some()
    }

    /// Number of times the server logic was triggered.
    pub fn trigger_count(&self) -> u64 {
        self.trigger_count
    }

    /// Failed learning attempts since the handler was last learned.
    pub fn learn_failures(&self) -> u32 {
        self.learn_failures
    }

    /// Signals this handler is attached to, in attachment order.
    pub fn signals(&self) -> &[SignalId] {
        &self.signals
    }

    pub(crate) fn set_script(&mut self, script: String) {
        self.script = Some(script);
        self.learn_failures = 0;
    }

    pub(crate) fn record_learn_failure(&mut self) -> u32 {
        self.learn_failures = self.learn_failures.saturating_add(1);
        self.learn_failures
    }

    pub(crate) fn attach_signal(&mut self, signal: SignalId) -> bool {
        if self.signals.contains(&signal) {
            return false;
        }
        self.signals.push(signal);
        true
    }

    pub(crate) fn detach_signal(&mut self, signal: SignalId) -> bool {
        match self.signals.iter().position(|s| *s == signal) {
            Some(index) => {
                self.signals.remove(index);
                true
            }
            None => false,
        }
    }
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handler")
            .field("kind", &self.kind())
            .field("script", &self.script)
            .field("signals", &self.signals)
            .field("trigger_count", &self.trigger_count)
            .field("learn_failures", &self.learn_failures)
            .finish()
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
