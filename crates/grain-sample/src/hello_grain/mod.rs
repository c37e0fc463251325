//! # HelloGrain
//!
//! The sample kind: greets callers by name and reports how often it has done so.
//!
//! ## Structure
//!
//! - [`HelloGrain`] (generated) - the kind trait with one handler per method
//! - [`entity`] - [`Greeter`], the grain implementing it
//! - [`error`] - [`HelloGrainError`]
//! - [`registration()`] - the kind registration handed to the cluster
//!
//! ## Methods
//!
//! | Index | Method | Request | Response |
//! |-------|--------|---------|----------|
//! | 0 | `say_hello` | [`HelloRequest`] | [`HelloResponse`] |
//! | 1 | `get_current_state` | [`GetCurrentStateRequest`] | [`GetCurrentStateResponse`] |
//!
//! The indices are part of the wire contract; append new methods, never reorder.

pub mod entity;
pub mod error;

pub use entity::Greeter;
pub use error::*;

use crate::model::{GetCurrentStateRequest, GetCurrentStateResponse, HelloRequest, HelloResponse};
use grain_framework::{grain_kind, KindRegistration, RegistryError};

grain_kind! {
    /// Greets callers and keeps a count.
    pub trait HelloGrain {
        /// Returns `"Hello {name}, pretty cool, right?"`.
        0 => async fn say_hello(HelloRequest) -> HelloResponse;
        /// Returns the state of this activation.
        1 => async fn get_current_state(GetCurrentStateRequest) -> GetCurrentStateResponse;
    }
}

/// Registers `HelloGrain` with [`Greeter`] as its implementation.
pub fn registration() -> Result<KindRegistration, RegistryError> {
    HelloGrainKind::registration::<Greeter, _>(|ctx| Ok(Greeter::new(ctx)))
}
