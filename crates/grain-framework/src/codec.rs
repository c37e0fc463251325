//! MessagePack encoding for payloads and whole envelopes.
//!
//! Payloads use named-field encoding (`rmp_serde::to_vec_named`) so that a field
//! added on one side of a rolling deployment does not shift the others.

use crate::error::CodecError;
use crate::message::{Envelope, Payload};
use serde::de::DeserializeOwned;
use serde::Serialize;

impl Payload {
    pub(crate) fn encode<T: Serialize + ?Sized>(value: &T) -> Result<Self, CodecError> {
        Ok(Self::from_bytes(rmp_serde::to_vec_named(value)?))
    }

    pub(crate) fn decode<T: DeserializeOwned>(&self) -> Result<T, CodecError> {
        Ok(rmp_serde::from_slice(self.as_bytes())?)
    }
}

/// Frames an envelope for a byte-oriented transport.
pub fn encode_envelope(envelope: &Envelope) -> Result<Vec<u8>, CodecError> {
    Ok(rmp_serde::to_vec_named(envelope)?)
}

/// Reads back a frame produced by [`encode_envelope`].
pub fn decode_envelope(frame: &[u8]) -> Result<Envelope, CodecError> {
    Ok(rmp_serde::from_slice(frame)?)
}
