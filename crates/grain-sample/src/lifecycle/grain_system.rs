use crate::hello_grain::{self, HelloGrainClient};
use grain_framework::{Cluster, ClusterConfig, RegistryError};
use thiserror::Error;
use tracing::info;

/// Name of the sample cluster.
pub const CLUSTER_NAME: &str = "MyCluster";

/// Errors raised while bringing the system up.
#[derive(Debug, Error)]
pub enum SystemError {
    #[error("kind registration failed: {0}")]
    Registry(#[from] RegistryError),
}

/// The runtime orchestrator for the sample grains.
///
/// # Example
///
/// ```ignore
/// let system = GrainSystem::start()?;
/// let reply = system
///     .hello_grain("MyGrain")
///     .say_hello(&HelloRequest { name: "Proto Potato".into() }, Duration::from_millis(1000))
///     .await?;
/// system.shutdown().await;
/// ```
pub struct GrainSystem {
    cluster: Cluster,
}

impl GrainSystem {
    /// Starts a member of [`CLUSTER_NAME`] with the default configuration.
    pub fn start() -> Result<Self, SystemError> {
        Self::start_with(ClusterConfig::setup(CLUSTER_NAME))
    }

    /// Starts a member from `config`, adding every sample kind to it.
    pub fn start_with(config: ClusterConfig) -> Result<Self, SystemError> {
        let config = config.with_kind(hello_grain::registration()?);
        let cluster = Cluster::start_member(config)?;
        info!(cluster = cluster.name(), "Grain system started");
        Ok(Self { cluster })
    }

    /// Client for the `HelloGrain` named `identity`.
    pub fn hello_grain(&self, identity: impl Into<String>) -> HelloGrainClient {
        self.cluster.get(identity)
    }

    pub fn cluster(&self) -> &Cluster {
        &self.cluster
    }

    /// Stops every activation and waits for their stop hooks.
    pub async fn shutdown(self) {
        info!("Shutting down system...");
        self.cluster.shutdown().await;
        info!("System shutdown complete.");
    }
}
