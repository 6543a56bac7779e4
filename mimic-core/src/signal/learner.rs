//! Learning client behaviour from server logic.
//!
//! A [`Learner`] runs a handler once and returns the client-side script that
//! reproduces its visible effect. The render engine owns the learner, since
//! only it can observe what a handler changed.
//!
//! [`CollectingLearner`] is the learner used when application code reports
//! its client-visible changes to a [`ScriptSink`]: every statement written
//! to the sink while a handler runs becomes part of that handler's script.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::LearnError;

use super::{Handler, HandlerKind};

/// Turns a handler's server logic into equivalent client script.
pub trait Learner {
    /// Execute `handler` and return the client script for its effect.
    ///
    /// Implementations call [`Handler::trigger`] and, for pre-learn handlers
    /// only, [`Handler::undo_trigger`] afterwards so the UI is left as it
    /// was.
    fn learn(&mut self, handler: &mut Handler) -> Result<String, LearnError>;
}

#[derive(Debug, Default)]
struct SinkState {
    pending: String,
    learning: bool,
}

/// Shared buffer of client statements produced by server logic.
///
/// Cloning the sink yields another handle to the same buffer.
#[derive(Debug, Clone, Default)]
pub struct ScriptSink {
    state: Arc<Mutex<SinkState>>,
}

impl ScriptSink {
    /// Create an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record client statements.
    pub fn emit(&self, js: &str) {
        self.state.lock().pending.push_str(js);
    }

    /// Take everything recorded since the last call.
    pub fn take(&self) -> String {
        std::mem::take(&mut self.state.lock().pending)
    }

    /// Whether a pre-learn handler is currently being simulated.
    ///
    /// Application code can use this to skip effects that must never happen
    /// during a simulation, such as sending mail.
    pub fn is_learning(&self) -> bool {
        self.state.lock().learning
    }

    fn enter_learning(&self) -> LearningGuard<'_> {
        self.state.lock().learning = true;
        LearningGuard { sink: self }
    }
}

/// Guard that leaves learning mode when dropped.
///
/// This keeps the sink consistent even if the handler panics.
struct LearningGuard<'a> {
    sink: &'a ScriptSink,
}

impl Drop for LearningGuard<'_> {
    fn drop(&mut self) {
        self.sink.state.lock().learning = false;
    }
}

/// A learner that captures what handlers write to a [`ScriptSink`].
///
/// For auto-learn handlers the effect is real, so the captured script is
/// also kept as live output for the current response. For pre-learn
/// handlers the effect is simulated: the handler is undone and whatever the
/// undo wrote is discarded.
#[derive(Debug, Default)]
pub struct CollectingLearner {
    sink: ScriptSink,
    live: String,
}

impl CollectingLearner {
    /// Create a learner reading from `sink`.
    pub fn new(sink: ScriptSink) -> Self {
        Self {
            sink,
            live: String::new(),
        }
    }

    /// The sink this learner reads from.
    pub fn sink(&self) -> &ScriptSink {
        &self.sink
    }

    /// Client statements that belong to the live response: output of real
    /// handler runs, including auto-learn handlers learned this turn.
    pub fn take_live_script(&mut self) -> String {
        self.flush_pending();
        std::mem::take(&mut self.live)
    }

    fn flush_pending(&mut self) {
        let pending = self.sink.take();
        self.live.push_str(&pending);
    }
}

impl Learner for CollectingLearner {
    fn learn(&mut self, handler: &mut Handler) -> Result<String, LearnError> {
        let kind = handler.kind();
        if !kind.is_learnable() {
            return Err(LearnError::NotLearnable(kind));
        }

        // Output from before this handler ran belongs to the live response.
        self.flush_pending();

        if kind == HandlerKind::PreLearn {
            let _learning = self.sink.enter_learning();
            handler.trigger();
            let script = self.sink.take();
            let undone = handler.undo_trigger();
            self.sink.take();
            undone?;
            Ok(script)
        } else {
            handler.trigger();
            let script = self.sink.take();
            self.live.push_str(&script);
            Ok(script)
        }
    }
}
