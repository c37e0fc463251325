//! # Framework Errors
//!
//! This module defines the error types used across the dispatch core. Each
//! boundary gets its own enum so callers can tell *where* something failed:
//!
//! - [`CodecError`] - a payload could not be encoded or decoded.
//! - [`RegistryError`] - startup wiring was inconsistent (bad method order, duplicate kind).
//! - [`ActivationError`] - a grain could not be constructed or started.
//! - [`TransportError`] - the cluster collaborator could not deliver a request or its reply.
//! - [`GrainCallError`] - what a caller of a typed client finally observes.

use crate::message::MethodIndex;
use crate::cluster::ClusterIdentity;
use std::time::Duration;

/// A payload or envelope could not be converted to or from its wire form.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("failed to encode: {0}")]
    Encode(#[from] rmp_serde::encode::Error),
    #[error("failed to decode: {0}")]
    Decode(#[from] rmp_serde::decode::Error),
}

/// Kind wiring errors, raised while building registries and the kind table.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    /// Methods must be declared in index order starting at zero.
    #[error("method {kind}::{method} declared with index {found}, expected {expected}")]
    OutOfOrder {
        kind: &'static str,
        method: &'static str,
        expected: MethodIndex,
        found: MethodIndex,
    },
    #[error("kind {0} registered more than once")]
    DuplicateKind(String),
}

/// Activation failed; the identity never became active.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ActivationError {
    #[error("factory for {identity} failed: {reason}")]
    Factory {
        identity: ClusterIdentity,
        reason: String,
    },
    #[error("on_started for {identity} failed: {reason}")]
    Started {
        identity: ClusterIdentity,
        reason: String,
    },
}

/// Failures reported by a [`ClusterTransport`](crate::ClusterTransport).
///
/// None of these say anything about whether the grain's handler ran.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    #[error("no reply within {deadline:?}")]
    Timeout { deadline: Duration },
    #[error("kind {0} is not registered with this cluster")]
    UnknownKind(String),
    #[error(transparent)]
    Activation(#[from] ActivationError),
    #[error("mailbox of {0} is closed")]
    MailboxClosed(ClusterIdentity),
    #[error("{0} dropped the request without replying")]
    ReplyDropped(ClusterIdentity),
    #[error("{0} is unreachable")]
    Unreachable(ClusterIdentity),
    /// The member is shutting down and refuses new activations.
    #[error("cluster {0} is shutting down")]
    ShuttingDown(String),
}

/// The outcome of a failed typed grain call.
#[derive(Debug, thiserror::Error)]
pub enum GrainCallError {
    /// The grain ran and reported a failure (an error envelope came back).
    #[error("remote invocation failed: {0}")]
    Remote(String),
    /// No definitive reply arrived before the deadline.
    #[error("no reply within {deadline:?}")]
    Timeout { deadline: Duration },
    #[error("transport failure: {0}")]
    Transport(TransportError),
    /// The reply was neither a response nor an error envelope.
    #[error("unsupported reply: expected a response or error envelope, got a {0} envelope")]
    UnsupportedResponse(&'static str),
    #[error("failed to encode request: {0}")]
    Encode(CodecError),
    #[error("failed to decode response: {0}")]
    Decode(CodecError),
}

impl GrainCallError {
    /// `true` when the remote grain definitely ran and failed.
    pub fn is_remote(&self) -> bool {
        matches!(self, Self::Remote(_))
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}

impl From<TransportError> for GrainCallError {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::Timeout { deadline } => Self::Timeout { deadline },
            other => Self::Transport(other),
        }
    }
}
