//! # Cluster
//!
//! The collaborator side of the dispatch core: [`ClusterTransport`] is what a typed
//! client needs to reach a grain, and [`Cluster`] is an in-process implementation
//! that activates dispatchers on demand and routes requests to them.
//!
//! ## Activation
//!
//! The first request for a `(kind, identity)` pair activates a dispatcher; later
//! requests reuse it. Each identity gets one `OnceCell` in the activation table, so
//! concurrent first requests wait on the same activation instead of racing to build
//! two grains. A failed activation leaves the cell empty and the next request tries
//! again.
//!
//! An entry stays in the table until its dispatcher has run its stop hooks and dropped
//! the grain, so a request racing with [`Cluster::stop`] reaches the stopping
//! dispatcher (and gets an error) rather than activating a second grain.
//!
//! Grains reach the cluster through a weak link. Dropping every `Cluster` handle
//! without calling [`Cluster::shutdown`] still closes the mailboxes, and each
//! dispatcher runs its stop hooks and ends.

use crate::client::GrainClient;
use crate::client_trait::KindClient;
use crate::config::ClusterConfig;
use crate::dispatcher::{DispatcherHandle, DispatcherSettings, DispatcherState};
use crate::error::{RegistryError, TransportError};
use crate::grain::GrainContext;
use crate::kind::KindTable;
use crate::message::{Envelope, RequestEnvelope};
use async_trait::async_trait;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::sync::{watch, OnceCell};
use tracing::{debug, info, warn};

/// Routing key of one grain: its kind plus its identity within the kind.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ClusterIdentity {
    kind: String,
    identity: String,
}

impl ClusterIdentity {
    pub fn new(kind: impl Into<String>, identity: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            identity: identity.into(),
        }
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn identity(&self) -> &str {
        &self.identity
    }
}

impl fmt::Display for ClusterIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.kind, self.identity)
    }
}

/// Delivers a request envelope to a grain and returns its reply.
///
/// Implementations must give up once `deadline` has passed and report
/// [`TransportError::Timeout`].
#[async_trait]
pub trait ClusterTransport: Send + Sync + 'static {
    async fn request(
        &self,
        target: &ClusterIdentity,
        envelope: RequestEnvelope,
        deadline: Duration,
    ) -> Result<Envelope, TransportError>;
}

struct ClusterInner {
    name: String,
    settings: DispatcherSettings,
    kinds: KindTable,
    activations: DashMap<ClusterIdentity, Arc<OnceCell<DispatcherHandle>>>,
    closed: AtomicBool,
    // Number of `activate` calls in flight.
    activating: watch::Sender<usize>,
}

/// Counts one in-flight activation until dropped.
struct Activating<'a>(&'a watch::Sender<usize>);

impl Drop for Activating<'_> {
    fn drop(&mut self) {
        self.0.send_modify(|n| *n -= 1);
    }
}

/// An in-process cluster member. Cheap to clone; clones share one activation table.
#[derive(Clone)]
pub struct Cluster {
    inner: Arc<ClusterInner>,
}

impl Cluster {
    /// Starts a member with the kinds registered in `config`.
    pub fn start_member(config: ClusterConfig) -> Result<Self, RegistryError> {
        let settings = config.dispatcher_settings();
        let ClusterConfig { name, kinds, .. } = config;
        let kinds = KindTable::build(kinds)?;
        let (activating, _) = watch::channel(0);
        info!(cluster = %name, kinds = ?kinds.names().collect::<Vec<_>>(), "Cluster member started");

        Ok(Self {
            inner: Arc::new(ClusterInner {
                name,
                settings,
                kinds,
                activations: DashMap::new(),
                closed: AtomicBool::new(false),
                activating,
            }),
        })
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Typed client for `identity`, routed through this cluster.
    pub fn get<C: KindClient>(&self, identity: impl Into<String>) -> C {
        C::from_client(GrainClient::new(Arc::new(self.clone()), identity))
    }

    /// Returns the dispatcher for `target`, activating it on first use.
    ///
    /// Fails with [`TransportError::ShuttingDown`] once [`shutdown`](Self::shutdown)
    /// has begun.
    pub async fn activate(&self, target: &ClusterIdentity) -> Result<DispatcherHandle, TransportError> {
        let registration = self
            .inner
            .kinds
            .get(target.kind())
            .ok_or_else(|| TransportError::UnknownKind(target.kind().to_string()))?;
        let _activating = self.begin_activation()?;

        // Clone the cell out so no shard lock is held across the activation.
        let cell = self
            .inner
            .activations
            .entry(target.clone())
            .or_default()
            .clone();

        let handle = cell
            .get_or_try_init(|| async {
                debug!(cluster = %self.inner.name, identity = %target, "Activating");
                let link = MemberLink(Arc::downgrade(&self.inner));
                let ctx = GrainContext::new(target.clone(), Arc::new(link));
                registration
                    .activator()
                    .activate(ctx, self.inner.settings)
                    .await
            })
            .await?;
        Ok(handle.clone())
    }

    fn begin_activation(&self) -> Result<Activating<'_>, TransportError> {
        self.inner.activating.send_modify(|n| *n += 1);
        let guard = Activating(&self.inner.activating);
        if self.inner.closed.load(Ordering::SeqCst) {
            return Err(TransportError::ShuttingDown(self.inner.name.clone()));
        }
        Ok(guard)
    }

    async fn deliver(
        &self,
        target: &ClusterIdentity,
        envelope: RequestEnvelope,
    ) -> Result<Envelope, TransportError> {
        let handle = self.activate(target).await?;
        match handle.request(envelope).await {
            Err(TransportError::MailboxClosed(identity)) => {
                handle.terminated().await;
                self.evict(&handle);
                Err(TransportError::MailboxClosed(identity))
            }
            other => other,
        }
    }

    fn current(&self, target: &ClusterIdentity) -> Option<DispatcherHandle> {
        self.inner
            .activations
            .get(target)
            .and_then(|cell| cell.value().get().cloned())
    }

    fn evict(&self, handle: &DispatcherHandle) {
        let removed = self.inner.activations.remove_if(handle.identity(), |_, cell| {
            cell.get().is_some_and(|current| current.same_mailbox(handle))
        });
        if removed.is_some() {
            debug!(identity = %handle.identity(), "Evicted closed activation");
        }
    }

    /// Stops one activation and forgets it. The next request reactivates it with
    /// fresh state.
    pub async fn stop(&self, target: &ClusterIdentity) -> Result<(), TransportError> {
        let Some(handle) = self.current(target) else {
            return Ok(());
        };
        let stopped = handle.stop().await;
        self.evict(&handle);
        stopped?;
        info!(identity = %target, "Activation stopped");
        Ok(())
    }

    /// Refuses new activations, waits for those under way, then stops every
    /// activation and waits for their stop hooks.
    pub async fn shutdown(&self) {
        self.inner.closed.store(true, Ordering::SeqCst);
        let mut activating = self.inner.activating.subscribe();
        let _ = activating.wait_for(|n| *n == 0).await;

        let handles: Vec<_> = self
            .inner
            .activations
            .iter()
            .filter_map(|entry| entry.value().get().cloned())
            .collect();

        let stopped = handles.len();
        let results = futures::future::join_all(handles.iter().map(|h| h.stop())).await;
        for (handle, result) in handles.iter().zip(results) {
            if let Err(e) = result {
                warn!(identity = %handle.identity(), error = %e, "Stop failed during shutdown");
            }
        }
        self.inner.activations.clear();
        info!(cluster = %self.inner.name, stopped, "Cluster member shut down");
    }

    /// `true` when `target` has a running dispatcher.
    pub fn is_active(&self, target: &ClusterIdentity) -> bool {
        self.inner
            .activations
            .get(target)
            .and_then(|cell| cell.value().get().map(|h| h.state()))
            .is_some_and(|state| state == DispatcherState::Active)
    }

    /// Number of identities with a running dispatcher.
    pub fn active_count(&self) -> usize {
        self.inner
            .activations
            .iter()
            .filter(|entry| entry.value().initialized())
            .count()
    }
}

#[async_trait]
impl ClusterTransport for Cluster {
    async fn request(
        &self,
        target: &ClusterIdentity,
        envelope: RequestEnvelope,
        deadline: Duration,
    ) -> Result<Envelope, TransportError> {
        tokio::time::timeout(deadline, self.deliver(target, envelope))
            .await
            .map_err(|_| TransportError::Timeout { deadline })?
    }
}

/// The transport handed to grains. Holds the member weakly so grains don't keep
/// it alive.
struct MemberLink(Weak<ClusterInner>);

#[async_trait]
impl ClusterTransport for MemberLink {
    async fn request(
        &self,
        target: &ClusterIdentity,
        envelope: RequestEnvelope,
        deadline: Duration,
    ) -> Result<Envelope, TransportError> {
        let inner = self
            .0
            .upgrade()
            .ok_or_else(|| TransportError::Unreachable(target.clone()))?;
        Cluster { inner }.request(target, envelope, deadline).await
    }
}

impl fmt::Debug for Cluster {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cluster")
            .field("name", &self.inner.name)
            .field("activations", &self.inner.activations.len())
            .finish_non_exhaustive()
    }
}
