//! Signals and Handlers
//!
//! This module implements the event points of a UI node and the handlers
//! that react to them, together with the learning protocol that turns server
//! logic into client script.
//!
//! # Concepts
//!
//! ## Signals
//!
//! A Signal is an addressable event point. Its ID is assigned from the
//! session's sequence and rendered as a wire token (`"s" + hex`) in the
//! generated markup, so an inbound client event can be routed back to it.
//!
//! ## Handlers
//!
//! A Handler is a unit of reaction. Client-only handlers carry a fixed
//! script; auto-learn and pre-learn handlers have server logic whose script
//! is learned; dynamic handlers always run on the server.
//!
//! ## Learning
//!
//! A [`Learner`] executes a handler once and captures the client script that
//! reproduces its effect. Once learned, the script is embedded in the markup
//! and the browser applies the effect without waiting for the server.
//!
//! # Implementation Notes
//!
//! Signals and handlers refer to each other by ID only. Both live in the
//! session's arenas, which keeps the many-to-many relation free of reference
//! cycles: destroying either side just removes IDs from the other.

mod id;
mod flags;
mod handler;
mod event_signal;
mod learner;
mod call;

pub use id::{IdSequence, SignalId, HandlerId, WIRE_PREFIX};
pub use flags::SignalFlags;
pub use handler::{Handler, HandlerKind, Action, EventAction};
pub use event_signal::Signal;
pub use learner::{Learner, CollectingLearner, ScriptSink};
pub use call::{RoundTripCall, EventBinding, MAX_CALL_ARGS};

pub(crate) use call::CallTarget;
