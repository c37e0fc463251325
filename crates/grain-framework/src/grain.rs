//! # Grain Traits
//!
//! The contracts between the dispatch core and the code that defines a kind.
//!
//! - [`Grain`] is implemented by the user type that holds one identity's state. It
//!   carries the lifecycle hooks; the per-method handlers live on the kind trait that
//!   [`grain_kind!`](crate::grain_kind) generates (`trait HelloGrain: Grain`).
//! - [`GrainKind`] is a zero-sized marker naming a kind.
//! - [`GrainMethod`] is a zero-sized marker describing one method: its index, name,
//!   request and response types. Clients only need this half.
//! - [`Invoke`] is the dispatcher half: how a method marker calls into a concrete grain.
//!
//! # Provided Methods (Hooks)
//! All hooks of [`Grain`] default to doing nothing (`Ok(())`).

use crate::client::GrainClient;
use crate::client_trait::KindClient;
use crate::cluster::{ClusterIdentity, ClusterTransport};
use crate::dispatcher::SystemMessage;
use crate::message::MethodIndex;
use async_trait::async_trait;
use futures::future::BoxFuture;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt::Debug;
use std::sync::Arc;

/// State and lifecycle of one activated identity.
///
/// # Concurrency
/// The dispatcher calls every hook and handler with `&mut self`, one at a time.
/// Implementations mutate their fields freely with no locking.
#[async_trait]
pub trait Grain: Send + 'static {
    /// The error type returned by hooks and handlers.
    ///
    /// Handler errors are turned into text (`to_string`) before they leave the
    /// dispatcher, so only the `Display` output reaches the caller.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Runs once, right after construction and before any request is handled.
    /// Failing here aborts the activation.
    async fn on_started(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }

    /// Runs when a stop has been requested, while the dispatcher is `Stopping`.
    async fn on_stopping(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }

    /// Runs once the dispatcher is `Stopped`, right before the grain is dropped.
    async fn on_stopped(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }

    /// Fallback for mailbox messages that are not requests.
    async fn on_receive(&mut self, _message: SystemMessage) -> Result<(), Self::Error> {
        Ok(())
    }
}

/// Names a kind of grain.
pub trait GrainKind: Send + Sync + 'static {
    const NAME: &'static str;
}

/// One method of a kind, as both sides of the wire see it.
pub trait GrainMethod: Send + Sync + 'static {
    type Kind: GrainKind;
    type Request: Serialize + DeserializeOwned + Debug + Send + Sync + 'static;
    type Response: Serialize + DeserializeOwned + Debug + Send + Sync + 'static;

    const INDEX: MethodIndex;
    const NAME: &'static str;
}

/// Calls the handler for this method on a concrete grain `G`.
pub trait Invoke<G: Grain>: GrainMethod {
    fn invoke(
        grain: &mut G,
        request: Self::Request,
    ) -> BoxFuture<'_, Result<Self::Response, G::Error>>;
}

/// Everything a factory gets to build a grain.
///
/// A context from [`Cluster`](crate::Cluster) links back to the member weakly, so a
/// grain may keep it for the whole activation. Calls made after the member is gone
/// fail with [`TransportError::Unreachable`](crate::TransportError::Unreachable).
#[derive(Clone)]
pub struct GrainContext {
    identity: ClusterIdentity,
    transport: Arc<dyn ClusterTransport>,
}

impl GrainContext {
    pub fn new(identity: ClusterIdentity, transport: Arc<dyn ClusterTransport>) -> Self {
        Self { identity, transport }
    }

    pub fn cluster_identity(&self) -> &ClusterIdentity {
        &self.identity
    }

    pub fn identity(&self) -> &str {
        self.identity.identity()
    }

    pub fn kind(&self) -> &str {
        self.identity.kind()
    }

    /// Returns a client for another grain reachable through the same cluster.
    ///
    /// A grain must not await a call to *itself*: its mailbox is busy running the
    /// caller, so the call can only end in a timeout.
    pub fn get<C: KindClient>(&self, identity: impl Into<String>) -> C {
        C::from_client(GrainClient::new(self.transport.clone(), identity))
    }
}

impl Debug for GrainContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GrainContext")
            .field("identity", &self.identity)
            .finish_non_exhaustive()
    }
}
