//! Signal state flags.

use bitflags::bitflags;

bitflags! {
    /// Per-signal state bits.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct SignalFlags: u8 {
        /// The owning node has to re-serialize this signal's markup.
        const NEEDS_RERENDER = 0x01;
        /// The signal is in the exposure registry and emits a round trip.
        const EXPOSED = 0x02;
        /// A handler needing the server was attached while unlearned.
        const NEEDS_LEARNING = 0x04;
        /// The browser's default action is cancelled.
        const PREVENT_DEFAULT = 0x08;
        /// Event propagation to ancestors is cancelled.
        const PREVENT_PROPAGATION = 0x10;
    }
}
