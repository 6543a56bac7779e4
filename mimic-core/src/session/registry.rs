//! Exposure Registry
//!
//! The set of signals whose wire ID is reachable from generated markup. An
//! inbound event is only decoded if its signal is in here.
//!
//! Membership is driven by signal transitions alone; application code never
//! registers a signal directly.

use indexmap::IndexSet;

use crate::signal::SignalId;

/// Session-scoped set of exposed signals.
#[derive(Debug, Default)]
pub struct ExposureRegistry {
    exposed: IndexSet<SignalId>,

    /// Expose every signal with a server-side handler, learned or not.
    always_expose_signals: bool,
}

impl ExposureRegistry {
    /// Create an empty registry with the given policy.
    pub fn new(always_expose_signals: bool) -> Self {
        Self {
            exposed: IndexSet::new(),
            always_expose_signals,
        }
    }

    /// The expose-all policy flag.
    pub fn always_expose_signals(&self) -> bool {
        self.always_expose_signals
    }

    /// Whether the signal is registered.
    pub fn contains(&self, signal: SignalId) -> bool {
        self.exposed.contains(&signal)
    }

    /// Number of registered signals.
    pub fn len(&self) -> usize {
        self.exposed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.exposed.is_empty()
    }

    /// Registered signals in registration order.
    pub fn iter(&self) -> impl Iterator<Item = SignalId> + '_ {
        self.exposed.iter().copied()
    }

    /// Returns `false` if the signal was already registered.
    pub(crate) fn register(&mut self, signal: SignalId) -> bool {
        let inserted = self.exposed.insert(signal);
        if inserted {
            tracing::debug!(signal = %signal, "signal exposed");
        }
        inserted
    }

    /// Returns `false` if the signal was not registered.
    pub(crate) fn unregister(&mut self, signal: SignalId) -> bool {
        let removed = self.exposed.shift_remove(&signal);
        if removed {
            tracing::debug!(signal = %signal, "signal unexposed");
        } else {
            tracing::warn!(signal = %signal, "unregistering a signal that was not exposed");
        }
        removed
    }
}
