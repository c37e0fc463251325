//! # Envelopes
//!
//! This module defines the generic, transport-level vocabulary exchanged between a
//! [`GrainClient`](crate::GrainClient) and a [`GrainDispatcher`](crate::GrainDispatcher).
//!
//! Every typed method call travels as a [`RequestEnvelope`] (method index + opaque
//! payload) and comes back as either a [`ResponseEnvelope`] or an [`ErrorEnvelope`].
//! The transport only ever sees the [`Envelope`] sum type, so it can route calls for
//! any kind without knowing a single application type.
//!
//! # Type Safety
//! Payloads are opaque bytes, but they can only be produced and read through
//! constructors keyed by a [`GrainMethod`] marker. A `SayHello` request envelope can
//! only be built from a `HelloRequest`, and a `SayHello` response can only be read
//! back as a `HelloResponse`.

use crate::error::CodecError;
use crate::grain::GrainMethod;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Position of a method in its kind's declaration.
///
/// Indices are shared *by value* with every remote caller, so a published kind
/// must never reorder or renumber its methods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MethodIndex(u32);

impl MethodIndex {
    pub const fn new(index: u32) -> Self {
        Self(index)
    }

    pub const fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Display for MethodIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// An encoded request or response value.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payload(#[serde(with = "serde_bytes")] Vec<u8>);

impl fmt::Debug for Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Payload({} bytes)", self.0.len())
    }
}

impl Payload {
    pub(crate) fn from_bytes(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    pub(crate) fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// A typed call, erased to a method index and payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestEnvelope {
    method_index: MethodIndex,
    payload: Payload,
}

impl RequestEnvelope {
    /// Encodes `request` as a call to method `M`.
    pub fn new<M: GrainMethod>(request: &M::Request) -> Result<Self, CodecError> {
        Ok(Self {
            method_index: M::INDEX,
            payload: Payload::encode(request)?,
        })
    }

    /// Rebuilds an envelope from raw parts.
    ///
    /// Meant for transport adapters that decode frames off a wire. Nothing checks
    /// that `bytes` match the request type of `method_index`; the dispatcher
    /// reports a mismatch as a malformed payload.
    pub fn from_raw_parts(method_index: MethodIndex, bytes: Vec<u8>) -> Self {
        Self {
            method_index,
            payload: Payload::from_bytes(bytes),
        }
    }

    pub fn method_index(&self) -> MethodIndex {
        self.method_index
    }

    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    pub(crate) fn into_payload(self) -> Payload {
        self.payload
    }
}

/// A successful reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseEnvelope {
    payload: Payload,
}

impl ResponseEnvelope {
    /// Encodes `response` as the reply to method `M`.
    pub fn new<M: GrainMethod>(response: &M::Response) -> Result<Self, CodecError> {
        Ok(Self {
            payload: Payload::encode(response)?,
        })
    }

    pub(crate) fn from_payload(payload: Payload) -> Self {
        Self { payload }
    }

    /// Reads the reply back as the response type of method `M`.
    pub fn decode<M: GrainMethod>(&self) -> Result<M::Response, CodecError> {
        self.payload.decode()
    }

    pub fn payload(&self) -> &Payload {
        &self.payload
    }
}

/// A failed reply, reduced to a description.
///
/// The message is plain text on purpose: the caller may not share the callee's
/// error types.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    message: String,
}

impl ErrorEnvelope {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn into_message(self) -> String {
        self.message
    }
}

/// Everything a cluster transport carries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Envelope {
    Request(RequestEnvelope),
    Response(ResponseEnvelope),
    Error(ErrorEnvelope),
}

impl Envelope {
    /// Shorthand for a response envelope to method `M`.
    pub fn response<M: GrainMethod>(response: &M::Response) -> Result<Self, CodecError> {
        ResponseEnvelope::new::<M>(response).map(Self::Response)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::Error(ErrorEnvelope::new(message))
    }

    /// Short name of the variant, for logs and error messages.
    pub fn shape(&self) -> &'static str {
        match self {
            Self::Request(_) => "request",
            Self::Response(_) => "response",
            Self::Error(_) => "error",
        }
    }
}

impl From<RequestEnvelope> for Envelope {
    fn from(envelope: RequestEnvelope) -> Self {
        Self::Request(envelope)
    }
}

impl From<ResponseEnvelope> for Envelope {
    fn from(envelope: ResponseEnvelope) -> Self {
        Self::Response(envelope)
    }
}

impl From<ErrorEnvelope> for Envelope {
    fn from(envelope: ErrorEnvelope) -> Self {
        Self::Error(envelope)
    }
}
