//! # KindClient Trait
//!
//! Common interface of the per-kind clients generated by
//! [`grain_kind!`](crate::grain_kind). It lets a cluster, a [`GrainContext`](crate::GrainContext)
//! or a test transport hand out any kind's client through one generic `get::<C>()`.
use crate::client::GrainClient;
use crate::cluster::{ClusterIdentity, ClusterTransport};
use crate::grain::GrainKind;
use std::sync::Arc;

/// Trait for kind-specific clients wrapping a [`GrainClient`].
///
/// # Example
///
/// ```rust
/// use grain_framework::{GrainClient, GrainKind, KindClient};
///
/// struct CounterKind;
/// impl GrainKind for CounterKind {
///     const NAME: &'static str = "Counter";
/// }
///
/// struct CounterClient {
///     inner: GrainClient<CounterKind>,
/// }
///
/// impl KindClient for CounterClient {
///     type Kind = CounterKind;
///
///     fn from_client(inner: GrainClient<CounterKind>) -> Self {
///         Self { inner }
///     }
///
///     fn inner(&self) -> &GrainClient<CounterKind> {
///         &self.inner
///     }
/// }
/// ```
pub trait KindClient: Sized {
    type Kind: GrainKind;

    fn from_client(inner: GrainClient<Self::Kind>) -> Self;

    fn inner(&self) -> &GrainClient<Self::Kind>;

    /// Builds a client for `identity` on top of any transport.
    fn connect(transport: Arc<dyn ClusterTransport>, identity: impl Into<String>) -> Self {
        Self::from_client(GrainClient::new(transport, identity))
    }

    fn identity(&self) -> &ClusterIdentity {
        self.inner().identity()
    }
}
