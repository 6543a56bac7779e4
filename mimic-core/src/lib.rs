//! Mimic Core
//!
//! This crate provides event dispatch for server-driven web UIs, where
//! application logic runs on the server and user events happen in the
//! browser. It implements:
//!
//! - Signals: addressable event points owned by UI nodes
//! - Handlers with client-only, auto-learn, pre-learn and dynamic behaviour
//! - Learning: turning server logic into client script, so the browser can
//!   react without a round trip
//! - Exposure tracking and wire addressing for inbound events
//! - Render-dirty propagation to the nodes that must be re-serialized
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - `signal`: IDs, flags, handlers, signals, learners and round-trip calls
//! - `render`: UI nodes, the dirty tracker and markup records
//! - `session`: the per-user arena, dispatch passes and the shared handle
//! - `event`: inbound client events and their wire formats
//! - `config`, `error`
//!
//! # Example
//!
//! ```rust,ignore
//! use mimic_core::{Session, Handler, CollectingLearner, ScriptSink};
//!
//! let mut session = Session::default();
//! let button = session.create_node();
//! let clicked = session.create_signal(button, "click")?;
//!
//! let sink = ScriptSink::new();
//! let out = sink.clone();
//! let show = session.insert_handler(Handler::pre_learn(
//!     move || out.emit("panel.show();"),
//!     || {},
//! ));
//! session.add_listener(clicked, show)?;
//!
//! // The render pass learns the handler; the browser now shows the panel
//! // on its own.
//! let mut learner = CollectingLearner::new(sink);
//! let updates = session.render_pass(&mut learner);
//! assert_eq!(updates[0].signals[0].script, "panel.show();");
//! ```

pub mod config;
pub mod error;
pub mod event;
pub mod render;
pub mod session;
pub mod signal;

pub use config::SessionConfig;
pub use error::{ConfigError, EventError, HandlerError, LearnError, SignalError, WireIdError};
pub use event::{ClientEvent, EventBatch, JavaScriptEvent};
pub use render::{NodeId, NodeUpdate, SignalMarkup};
pub use session::{DispatchReport, EventOutcome, Session, SharedSession};
pub use signal::{
    CollectingLearner, Handler, HandlerId, HandlerKind, Learner, RoundTripCall, ScriptSink,
    Signal, SignalId,
};
