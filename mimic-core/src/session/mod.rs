//! Sessions
//!
//! A session owns everything one user's UI needs for event dispatch: the
//! nodes, their signals, the handlers attached to them, the exposure
//! registry and the render tracker.
//!
//! # Lifecycle of an event
//!
//! 1. Rendering calls [`Session::render_pass`], which pre-learns what it
//!    can and returns markup for every node whose signals changed.
//! 2. The browser runs the embedded scripts. For exposed signals it also
//!    sends the wire token back to the server.
//! 3. The transport decodes the token with [`Session::decode_exposed`] (or
//!    hands the whole [`ClientEvent`](crate::event::ClientEvent) to
//!    [`Session::handle_client_event`]), which replays learned handlers,
//!    learns auto-learn handlers and dispatches the rest dynamically.
//!
//! Sessions share nothing, so any number of them can run in parallel.

mod registry;
mod runtime;
mod dispatch;
mod shared;

pub use registry::ExposureRegistry;
pub use runtime::Session;
pub use dispatch::{DispatchReport, EventOutcome};
pub use shared::SharedSession;
