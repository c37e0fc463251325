//! # Grain Framework
//!
//! A dispatch core for *virtual actors* ("grains"): identity-addressed units of
//! state that are created on first use and invoked through typed calls. Underneath,
//! every call travels as a generic envelope that a cluster transport can route
//! without knowing a single application type.
//!
//! ## Architecture Overview
//!
//! The framework separates concerns into three layers:
//!
//! 1. **Grain Layer** ([`Grain`] + the kind trait from [`grain_kind!`]) - your state,
//!    lifecycle hooks and one handler per method
//! 2. **Runtime Layer** ([`GrainDispatcher`], [`Cluster`]) - activation, the sequential
//!    mailbox, demultiplexing envelopes back into typed calls
//! 3. **Interface Layer** ([`GrainClient`] and the generated `<Kind>Client`) - typed
//!    calls with a deadline, replies mapped to [`GrainCallError`]
//!
//! ```text
//! caller ──► HelloGrainClient::say_hello ──► RequestEnvelope { index 0, payload }
//!        ──► ClusterTransport ──► GrainDispatcher (one task per identity)
//!        ──► HelloGrain::say_hello ──► ResponseEnvelope | ErrorEnvelope ──► caller
//! ```
//!
//! ## Declaring a Kind
//!
//! ```rust
//! use async_trait::async_trait;
//! use grain_framework::{grain_kind, Cluster, ClusterConfig, Grain};
//! use std::time::Duration;
//!
//! grain_kind! {
//!     pub trait Counter {
//!         0 => async fn add(u64) -> u64;
//!         1 => async fn total(()) -> u64;
//!     }
//! }
//!
//! #[derive(Debug, thiserror::Error)]
//! #[error("counter overflow")]
//! pub struct Overflow;
//!
//! #[derive(Default)]
//! struct Tally { value: u64 }
//!
//! #[async_trait]
//! impl Grain for Tally {
//!     type Error = Overflow;
//! }
//!
//! #[async_trait]
//! impl Counter for Tally {
//!     async fn add(&mut self, amount: u64) -> Result<u64, Overflow> {
//!         self.value = self.value.checked_add(amount).ok_or(Overflow)?;
//!         Ok(self.value)
//!     }
//!
//!     async fn total(&mut self, _: ()) -> Result<u64, Overflow> {
//!         Ok(self.value)
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ClusterConfig::setup("docs")
//!         .with_kind(CounterKind::registration::<Tally, _>(|_ctx| Ok(Tally::default()))?);
//!     let cluster = Cluster::start_member(config)?;
//!
//!     let counter: CounterClient = cluster.get("clicks");
//!     counter.add(&2, Duration::from_secs(1)).await?;
//!     assert_eq!(counter.total(&(), Duration::from_secs(1)).await?, 2);
//!
//!     cluster.shutdown().await;
//!     Ok(())
//! }
//! ```
//!
//! ## Concurrency Model
//!
//! - Each active identity runs in its own Tokio task
//! - Messages are handled **sequentially** and to completion within one grain, so
//!   handlers mutate `&mut self` with no locks
//! - Different identities run in parallel
//! - A handler that awaits only blocks its own mailbox
//!
//! ## Testing
//!
//! [`mock::MockTransport`] scripts replies for any kind's client without running a
//! grain, including error envelopes and a node that never answers.

pub mod client;
pub mod client_trait;
pub mod cluster;
pub mod codec;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod grain;
pub mod kind;
mod macros;
pub mod message;
pub mod mock;
pub mod registry;
pub mod tracing;

// Re-export core types for convenience
pub use client::GrainClient;
pub use client_trait::KindClient;
pub use cluster::{Cluster, ClusterIdentity, ClusterTransport};
pub use config::ClusterConfig;
pub use dispatcher::{
    DispatcherHandle, DispatcherSettings, DispatcherState, GrainDispatcher, PendingReply,
    SystemMessage,
};
pub use error::{
    ActivationError, CodecError, GrainCallError, RegistryError, TransportError,
};
pub use grain::{Grain, GrainContext, GrainKind, GrainMethod, Invoke};
pub use kind::KindRegistration;
pub use message::{Envelope, ErrorEnvelope, MethodIndex, Payload, RequestEnvelope, ResponseEnvelope};
pub use registry::{MethodEntry, MethodRegistry, MethodRegistryBuilder};

#[doc(hidden)]
pub mod __private {
    pub use async_trait::async_trait;
    pub use futures::future::BoxFuture;
    pub use paste::paste;
}
