//! # Grain Client
//!
//! The generic typed stub behind every generated `<Kind>Client`.

use crate::cluster::{ClusterIdentity, ClusterTransport};
use crate::error::GrainCallError;
use crate::grain::{GrainKind, GrainMethod};
use crate::message::{Envelope, RequestEnvelope};
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument, warn};

/// A typed client bound to one identity of kind `K`.
///
/// Cheap to clone. Holds no connection state; every call goes through the
/// transport it was built with.
pub struct GrainClient<K: GrainKind> {
    transport: Arc<dyn ClusterTransport>,
    identity: ClusterIdentity,
    _kind: PhantomData<fn() -> K>,
}

impl<K: GrainKind> Clone for GrainClient<K> {
    fn clone(&self) -> Self {
        Self {
            transport: self.transport.clone(),
            identity: self.identity.clone(),
            _kind: PhantomData,
        }
    }
}

impl<K: GrainKind> GrainClient<K> {
    pub fn new(transport: Arc<dyn ClusterTransport>, identity: impl Into<String>) -> Self {
        Self {
            transport,
            identity: ClusterIdentity::new(K::NAME, identity),
            _kind: PhantomData,
        }
    }

    pub fn identity(&self) -> &ClusterIdentity {
        &self.identity
    }

    /// Calls method `M` and waits at most `deadline` for its reply.
    ///
    /// `request` is only borrowed for encoding. The call is not retried.
    #[instrument(
        skip(self, request),
        fields(kind = K::NAME, identity = self.identity.identity(), method = M::NAME)
    )]
    pub async fn call<M>(
        &self,
        request: &M::Request,
        deadline: Duration,
    ) -> Result<M::Response, GrainCallError>
    where
        M: GrainMethod<Kind = K>,
    {
        debug!(?request, "Sending request");
        let envelope = RequestEnvelope::new::<M>(request).map_err(GrainCallError::Encode)?;

        let reply = tokio::time::timeout(
            deadline,
            self.transport.request(&self.identity, envelope, deadline),
        )
        .await
        .map_err(|_| GrainCallError::Timeout { deadline })??;

        match reply {
            Envelope::Response(response) => response.decode::<M>().map_err(GrainCallError::Decode),
            Envelope::Error(error) => {
                warn!(error = %error.message(), "Remote invocation failed");
                Err(GrainCallError::Remote(error.into_message()))
            }
            other => Err(GrainCallError::UnsupportedResponse(other.shape())),
        }
    }
}

impl<K: GrainKind> fmt::Debug for GrainClient<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GrainClient")
            .field("identity", &self.identity)
            .finish_non_exhaustive()
    }
}
