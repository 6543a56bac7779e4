//! Error types.

use thiserror::Error;

use crate::render::NodeId;
use crate::signal::{HandlerId, HandlerKind, SignalId, MAX_CALL_ARGS};

/// A wire token that does not name a signal ID.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum WireIdError {
    #[error("wire id `{0}` does not start with `s`")]
    MissingPrefix(String),

    #[error("wire id `{0}` is not canonical lowercase hex")]
    NotCanonical(String),

    #[error("wire id `{0}` does not fit in 64 bits")]
    Overflow(String),
}

/// A handler call made out of order.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum HandlerError {
    #[error("undo_trigger called without a preceding trigger")]
    UndoWithoutTrigger,
}

/// A learner failed to produce a script for a handler.
#[derive(Debug, Error)]
pub enum LearnError {
    #[error("{0} handlers cannot be learned")]
    NotLearnable(HandlerKind),

    #[error("failed to undo simulated trigger: {0}")]
    Undo(#[from] HandlerError),

    #[error("failed to capture client script: {0}")]
    Capture(String),

    #[error("handler panicked while being learned")]
    Panicked,
}

/// Errors raised by session operations.
#[derive(Debug, Error)]
pub enum SignalError {
    #[error("unknown signal {0}")]
    UnknownSignal(SignalId),

    #[error("unknown handler {0}")]
    UnknownHandler(HandlerId),

    #[error("unknown node {0}")]
    UnknownNode(NodeId),

    #[error("no exposed signal for `{0}`")]
    UnknownWireId(String),

    #[error(transparent)]
    WireId(#[from] WireIdError),

    #[error("form id `{0}` is already taken")]
    DuplicateFormId(String),

    #[error("handler {0} is not client-only")]
    NotClientOnly(HandlerId),

    #[error("round-trip calls take at most {} arguments", MAX_CALL_ARGS)]
    TooManyArguments,

    #[error("round-trip argument {0} is empty")]
    EmptyArgument(usize),
}

/// Invalid session configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to parse configuration: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// An inbound event payload that could not be decoded.
#[derive(Debug, Error)]
pub enum EventError {
    #[error("failed to decode JSON event batch: {0}")]
    Json(serde_json::Error),

    #[error("failed to decode MessagePack event batch: {0}")]
    MsgPack(rmp_serde::decode::Error),

    #[error("failed to encode MessagePack event batch: {0}")]
    MsgPackEncode(rmp_serde::encode::Error),
}
