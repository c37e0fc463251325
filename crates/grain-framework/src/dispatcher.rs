//! # Grain Dispatcher
//!
//! The server half of one activation. A `GrainDispatcher<G>` owns the grain and the
//! receiving end of its mailbox, and runs in its own Tokio task. Requests are taken
//! from the mailbox one at a time and each handler runs to completion before the next
//! message is looked at, so a grain never needs a lock around its own state.
//!
//! ## Lifecycle
//!
//! ```text
//! Uninitialized --factory + on_started--> Active --stop--> Stopping --> Stopped
//! ```
//!
//! - **Activation**: the factory builds the grain, `on_started` runs, and only then is
//!   the dispatcher task spawned. Nothing reaches a handler before `on_started` returns.
//! - **Requests**: the method index is looked up in the kind's [`MethodRegistry`], the
//!   payload is decoded, the handler awaited, the result encoded. Every failure along
//!   the way becomes an [`ErrorEnvelope`](crate::ErrorEnvelope) for the caller; the
//!   dispatcher itself keeps running.
//! - **Stop**: `on_stopping` runs while `Stopping`, `on_stopped` while `Stopped`.
//!   Requests still queued behind the stop are answered with an error envelope, and
//!   the stop is acknowledged only after the grain has been dropped.

use crate::cluster::ClusterIdentity;
use crate::error::{ActivationError, TransportError};
use crate::grain::{Grain, GrainContext};
use crate::message::{Envelope, RequestEnvelope, ResponseEnvelope};
use crate::registry::{InvokeError, MethodRegistry};
use futures::FutureExt;
use std::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot, watch};
use tracing::{debug, error, info, info_span, warn, Instrument};

/// Mailbox traffic that is not a method call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SystemMessage {
    /// The mailbox stayed empty for the configured receive timeout.
    ReceiveTimeout,
    /// An application-defined notification.
    Signal(String),
}

/// Where a dispatcher is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DispatcherState {
    Uninitialized,
    Active,
    Stopping,
    Stopped,
}

impl fmt::Display for DispatcherState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Uninitialized => "uninitialized",
            Self::Active => "active",
            Self::Stopping => "stopping",
            Self::Stopped => "stopped",
        };
        f.write_str(name)
    }
}

pub(crate) enum MailboxMessage {
    Request {
        envelope: RequestEnvelope,
        respond_to: oneshot::Sender<Envelope>,
    },
    System(SystemMessage),
    Stop {
        respond_to: oneshot::Sender<()>,
    },
}

/// Per-activation knobs, taken from [`ClusterConfig`](crate::ClusterConfig).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatcherSettings {
    /// Capacity of the mailbox channel. Senders wait while it is full.
    pub mailbox_capacity: usize,
    /// How long the mailbox may stay empty before the grain gets a
    /// [`SystemMessage::ReceiveTimeout`]. `None` disables the tick.
    pub receive_timeout: Option<Duration>,
}

impl Default for DispatcherSettings {
    fn default() -> Self {
        Self {
            mailbox_capacity: 32,
            receive_timeout: None,
        }
    }
}

/// Runs one activated grain.
pub struct GrainDispatcher<G: Grain> {
    grain: G,
    registry: Arc<MethodRegistry<G>>,
    identity: ClusterIdentity,
    receiver: mpsc::Receiver<MailboxMessage>,
    state: watch::Sender<DispatcherState>,
    receive_timeout: Option<Duration>,
}

impl<G: Grain> GrainDispatcher<G> {
    /// Builds the grain, runs `on_started` and spawns the dispatcher task.
    ///
    /// On error nothing is spawned and the grain (if it was built) is dropped.
    pub async fn activate<F>(
        ctx: GrainContext,
        factory: &F,
        registry: Arc<MethodRegistry<G>>,
        settings: DispatcherSettings,
    ) -> Result<DispatcherHandle, ActivationError>
    where
        F: Fn(&GrainContext) -> Result<G, G::Error> + ?Sized,
    {
        let identity = ctx.cluster_identity().clone();
        let (state, state_rx) = watch::channel(DispatcherState::Uninitialized);

        let mut grain = factory(&ctx).map_err(|e| {
            warn!(%identity, error = %e, "Grain factory failed");
            ActivationError::Factory {
                identity: identity.clone(),
                reason: e.to_string(),
            }
        })?;

        if let Err(e) = grain.on_started().await {
            warn!(%identity, error = %e, "on_started failed");
            return Err(ActivationError::Started {
                identity,
                reason: e.to_string(),
            });
        }

        let (sender, receiver) = mpsc::channel(settings.mailbox_capacity.max(1));
        state.send_replace(DispatcherState::Active);

        let span = info_span!("grain", kind = identity.kind(), identity = identity.identity());
        let dispatcher = Self {
            grain,
            registry,
            identity: identity.clone(),
            receiver,
            state,
            receive_timeout: settings.receive_timeout,
        };
        tokio::spawn(dispatcher.run().instrument(span));

        Ok(DispatcherHandle {
            identity,
            sender,
            state: state_rx,
        })
    }

    async fn run(mut self) {
        info!(methods = self.registry.len(), "Grain activated");
        let acks = self.serve().await;

        // The grain is dropped before the state channel closes and before any stop
        // is acknowledged, so `terminated()` means the grain is gone.
        let Self { grain, state, .. } = self;
        drop(grain);
        drop(state);
        for ack in acks {
            let _ = ack.send(());
        }
    }

    /// Handles mailbox traffic until stopped. Returns the stop acks to send.
    async fn serve(&mut self) -> Vec<oneshot::Sender<()>> {
        loop {
            let next = match self.receive_timeout {
                Some(idle) => match tokio::time::timeout(idle, self.receiver.recv()).await {
                    Ok(message) => message,
                    Err(_) => {
                        self.system(SystemMessage::ReceiveTimeout).await;
                        continue;
                    }
                },
                None => self.receiver.recv().await,
            };

            match next {
                Some(MailboxMessage::Request {
                    envelope,
                    respond_to,
                }) => {
                    let reply = self.dispatch(envelope).await;
                    if respond_to.send(reply).is_err() {
                        debug!("Caller went away before the reply was ready");
                    }
                }
                Some(MailboxMessage::System(message)) => self.system(message).await,
                Some(MailboxMessage::Stop { respond_to }) => {
                    let mut acks = vec![respond_to];
                    acks.extend(self.stop().await);
                    return acks;
                }
                None => return self.stop().await,
            }
        }
    }

    async fn dispatch(&mut self, envelope: RequestEnvelope) -> Envelope {
        let index = envelope.method_index();
        let Some(entry) = self.registry.get(index) else {
            error!(method_index = %index, "Unknown method index");
            return Envelope::error(format!(
                "unknown method index {index} for kind {}",
                self.registry.kind()
            ));
        };
        let method = entry.name();
        let invoke = entry.invoker();
        debug!(method, payload = ?envelope.payload(), "Dispatching");

        let outcome = AssertUnwindSafe(invoke(&mut self.grain, envelope.into_payload()))
            .catch_unwind()
            .await;

        match outcome {
            Ok(Ok(payload)) => {
                debug!(method, "Handled");
                Envelope::Response(ResponseEnvelope::from_payload(payload))
            }
            Ok(Err(InvokeError::Handler(message))) => {
                warn!(method, error = %message, "Handler failed");
                Envelope::error(message)
            }
            Ok(Err(e)) => {
                error!(method, error = %e, "Method invocation failed");
                Envelope::error(e.to_string())
            }
            Err(panic) => {
                let reason = panic_message(panic.as_ref());
                error!(method, panic = %reason, "Handler panicked");
                Envelope::error(format!("handler {method} panicked: {reason}"))
            }
        }
    }

    async fn system(&mut self, message: SystemMessage) {
        debug!(?message, "System message");
        if let Err(e) = self.grain.on_receive(message).await {
            warn!(error = %e, "on_receive failed");
        }
    }

    async fn stop(&mut self) -> Vec<oneshot::Sender<()>> {
        self.state.send_replace(DispatcherState::Stopping);
        if let Err(e) = self.grain.on_stopping().await {
            warn!(error = %e, "on_stopping failed");
        }

        self.state.send_replace(DispatcherState::Stopped);
        if let Err(e) = self.grain.on_stopped().await {
            warn!(error = %e, "on_stopped failed");
        }

        self.receiver.close();
        let mut rejected = 0usize;
        let mut acks = Vec::new();
        while let Ok(message) = self.receiver.try_recv() {
            match message {
                MailboxMessage::Request { respond_to, .. } => {
                    rejected += 1;
                    let _ = respond_to.send(Envelope::error(format!(
                        "{} stopped before handling the request",
                        self.identity
                    )));
                }
                MailboxMessage::Stop { respond_to } => acks.push(respond_to),
                MailboxMessage::System(_) => {}
            }
        }
        info!(rejected, "Grain stopped");
        acks
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

/// Sending side of a dispatcher's mailbox. Cheap to clone.
#[derive(Clone)]
pub struct DispatcherHandle {
    identity: ClusterIdentity,
    sender: mpsc::Sender<MailboxMessage>,
    state: watch::Receiver<DispatcherState>,
}

/// A request that has been queued but not yet answered.
pub struct PendingReply {
    identity: ClusterIdentity,
    response: oneshot::Receiver<Envelope>,
}

impl PendingReply {
    pub async fn reply(self) -> Result<Envelope, TransportError> {
        self.response
            .await
            .map_err(|_| TransportError::ReplyDropped(self.identity))
    }
}

impl DispatcherHandle {
    pub fn identity(&self) -> &ClusterIdentity {
        &self.identity
    }

    /// Queues a request. Returns once it sits in the mailbox, so calls queued one
    /// after another from a single task are handled in that order.
    pub async fn send(&self, envelope: RequestEnvelope) -> Result<PendingReply, TransportError> {
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(MailboxMessage::Request {
                envelope,
                respond_to,
            })
            .await
            .map_err(|_| TransportError::MailboxClosed(self.identity.clone()))?;
        Ok(PendingReply {
            identity: self.identity.clone(),
            response,
        })
    }

    /// Queues a request and waits for its reply.
    pub async fn request(&self, envelope: RequestEnvelope) -> Result<Envelope, TransportError> {
        self.send(envelope).await?.reply().await
    }

    pub async fn notify(&self, message: SystemMessage) -> Result<(), TransportError> {
        self.sender
            .send(MailboxMessage::System(message))
            .await
            .map_err(|_| TransportError::MailboxClosed(self.identity.clone()))
    }

    /// Asks the dispatcher to stop and waits until its stop hooks have run and the
    /// grain has been dropped.
    ///
    /// Stopping an already stopped dispatcher only waits for it to finish. An ack
    /// that never arrives (a stop hook panicked) is reported as
    /// [`TransportError::ReplyDropped`].
    pub async fn stop(&self) -> Result<(), TransportError> {
        let (respond_to, done) = oneshot::channel();
        if self
            .sender
            .send(MailboxMessage::Stop { respond_to })
            .await
            .is_err()
        {
            self.terminated().await;
            return Ok(());
        }
        done.await.map_err(|_| TransportError::ReplyDropped(self.identity.clone()))
    }

    /// Resolves once the dispatcher task has finished and its grain is dropped.
    pub async fn terminated(&self) {
        let mut state = self.state.clone();
        while state.changed().await.is_ok() {}
    }

    pub fn state(&self) -> DispatcherState {
        *self.state.borrow()
    }

    /// `true` when both handles feed the same mailbox.
    pub fn same_mailbox(&self, other: &Self) -> bool {
        self.sender.same_channel(&other.sender)
    }
}

impl fmt::Debug for DispatcherHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DispatcherHandle")
            .field("identity", &self.identity)
            .field("state", &self.state())
            .finish()
    }
}
