//! Startup configuration of a cluster member.

use crate::dispatcher::DispatcherSettings;
use crate::kind::KindRegistration;
use std::time::Duration;

/// Explicit, immutable-once-started configuration of a [`Cluster`](crate::Cluster).
///
/// ```rust,ignore
/// let config = ClusterConfig::setup("MyCluster")
///     .with_kind(HelloGrainKind::registration::<Greeter, _>(|ctx| Ok(Greeter::new(ctx)))?)
///     .with_receive_timeout(Duration::from_secs(30));
/// let cluster = Cluster::start_member(config)?;
/// ```
#[derive(Debug)]
pub struct ClusterConfig {
    pub(crate) name: String,
    pub(crate) mailbox_capacity: usize,
    pub(crate) receive_timeout: Option<Duration>,
    pub(crate) kinds: Vec<KindRegistration>,
}

impl ClusterConfig {
    pub const DEFAULT_MAILBOX_CAPACITY: usize = 32;

    pub fn setup(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            mailbox_capacity: Self::DEFAULT_MAILBOX_CAPACITY,
            receive_timeout: None,
            kinds: Vec::new(),
        }
    }

    pub fn with_kind(mut self, registration: KindRegistration) -> Self {
        self.kinds.push(registration);
        self
    }

    /// Mailbox capacity per activation. Zero is raised to one.
    pub fn with_mailbox_capacity(mut self, capacity: usize) -> Self {
        self.mailbox_capacity = capacity;
        self
    }

    /// Deliver [`SystemMessage::ReceiveTimeout`](crate::SystemMessage::ReceiveTimeout)
    /// to grains whose mailbox stayed empty this long.
    pub fn with_receive_timeout(mut self, idle: Duration) -> Self {
        self.receive_timeout = Some(idle);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kinds(&self) -> impl Iterator<Item = &KindRegistration> {
        self.kinds.iter()
    }

    pub(crate) fn dispatcher_settings(&self) -> DispatcherSettings {
        DispatcherSettings {
            mailbox_capacity: self.mailbox_capacity.max(1),
            receive_timeout: self.receive_timeout,
        }
    }
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self::setup("default")
    }
}
