//! Render-Dirty Propagation
//!
//! This module tracks which UI nodes must be re-serialized because one of
//! their signals changed.
//!
//! # Overview
//!
//! A node is the owner of its signals. Whenever a signal is exposed,
//! unexposed, has a handler attached or removed, or one of its handlers
//! learns a new script, the owner is notified. The notification marks the
//! node as needing a re-render and queues it for the next render pass.
//!
//! The session drains that queue and turns every drained node into a
//! [`NodeUpdate`] holding the event markup of its changed signals. How that
//! markup is written into the DOM is up to the serializer.

mod node;
mod tracker;
mod markup;

pub use node::{NodeId, RenderState, UiNode};
pub use tracker::RenderTracker;
pub use markup::{NodeUpdate, SignalMarkup};
