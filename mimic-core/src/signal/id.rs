//! Identifiers for signals and handlers.
//!
//! Every signal gets a unique ID when it is constructed. The ID doubles as
//! the signal's address on the wire: it is rendered as `"s" + hex(id)` in the
//! generated markup, and the transport layer parses that token back to route
//! an inbound client event.
//!
//! IDs come from an [`IdSequence`] owned by the session rather than from a
//! process-wide counter. Two sessions therefore have independent, fully
//! reproducible ID spaces, and a session can be tested in isolation.

use std::fmt;
use std::str::FromStr;

use crate::error::WireIdError;

/// Prefix of an encoded signal ID.
pub const WIRE_PREFIX: char = 's';

/// A monotonically increasing ID generator.
///
/// Each session owns one sequence per kind of object. IDs are never reused.
#[derive(Debug, Clone, Default)]
pub struct IdSequence {
    next: u64,
}

impl IdSequence {
    /// Create a sequence starting at zero.
    pub fn new() -> Self {
        Self { next: 0 }
    }

    /// Create a sequence whose first ID is `first`.
    pub fn starting_at(first: u64) -> Self {
        Self { next: first }
    }

    /// Take the next ID.
    pub fn next_id(&mut self) -> u64 {
        let id = self.next;
        self.next += 1;
        id
    }

    /// The ID that the next call to [`next_id`](Self::next_id) will return.
    pub fn peek(&self) -> u64 {
        self.next
    }
}

/// Unique identifier for a signal within a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SignalId(u64);

impl SignalId {
    pub(crate) fn allocate(sequence: &mut IdSequence) -> Self {
        Self(sequence.next_id())
    }

    /// Build an ID from its raw value.
    pub fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// Get the raw ID value.
    pub fn raw(&self) -> u64 {
        self.0
    }

    /// Encode this ID as a wire token, e.g. `255` becomes `"sff"`.
    pub fn to_wire(&self) -> String {
        format!("{}{:x}", WIRE_PREFIX, self.0)
    }

    /// Parse a wire token produced by [`to_wire`](Self::to_wire).
    ///
    /// Only the canonical form is accepted: the `s` prefix followed by
    /// lowercase hex digits without leading zeros. Every ID therefore has
    /// exactly one token and every token names at most one ID.
    pub fn parse_wire(token: &str) -> Result<Self, WireIdError> {
        let digits = token
            .strip_prefix(WIRE_PREFIX)
            .ok_or_else(|| WireIdError::MissingPrefix(token.to_string()))?;

        let canonical = !digits.is_empty()
            && digits.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
            && (digits.len() == 1 || !digits.starts_with('0'));
        if !canonical {
            return Err(WireIdError::NotCanonical(token.to_string()));
        }

        u64::from_str_radix(digits, 16)
            .map(Self)
            .map_err(|_| WireIdError::Overflow(token.to_string()))
    }
}

impl fmt::Display for SignalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{:x}", WIRE_PREFIX, self.0)
    }
}

impl FromStr for SignalId {
    type Err = WireIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_wire(s)
    }
}

/// Unique identifier for a handler within a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HandlerId(u64);

impl HandlerId {
    pub(crate) fn allocate(sequence: &mut IdSequence) -> Self {
        Self(sequence.next_id())
    }

    /// Get the raw ID value.
    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for HandlerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "h{}", self.0)
    }
}
