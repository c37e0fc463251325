//! # Kind Registration
//!
//! A [`KindRegistration`] bundles what the cluster needs to activate grains of one
//! kind: the kind's name, its [`MethodRegistry`] and a factory. The concrete grain
//! type is erased behind [`Activator`] so the cluster can keep one table for every
//! kind.

use crate::dispatcher::{DispatcherHandle, DispatcherSettings, GrainDispatcher};
use crate::error::{ActivationError, RegistryError};
use crate::grain::{Grain, GrainContext};
use crate::message::MethodIndex;
use crate::registry::MethodRegistry;
use async_trait::async_trait;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

type Factory<G> = dyn Fn(&GrainContext) -> Result<G, <G as Grain>::Error> + Send + Sync;

#[async_trait]
pub(crate) trait Activator: Send + Sync {
    async fn activate(
        &self,
        ctx: GrainContext,
        settings: DispatcherSettings,
    ) -> Result<DispatcherHandle, ActivationError>;
}

struct KindActivator<G: Grain> {
    factory: Arc<Factory<G>>,
    registry: Arc<MethodRegistry<G>>,
}

#[async_trait]
impl<G: Grain> Activator for KindActivator<G> {
    async fn activate(
        &self,
        ctx: GrainContext,
        settings: DispatcherSettings,
    ) -> Result<DispatcherHandle, ActivationError> {
        GrainDispatcher::activate(ctx, self.factory.as_ref(), self.registry.clone(), settings).await
    }
}

/// Everything needed to activate grains of one kind.
#[derive(Clone)]
pub struct KindRegistration {
    name: &'static str,
    methods: Vec<(MethodIndex, &'static str)>,
    activator: Arc<dyn Activator>,
}

impl KindRegistration {
    /// Pairs a registry with the factory that builds its grains. The kind name
    /// comes from the registry.
    pub fn new<G, F>(registry: MethodRegistry<G>, factory: F) -> Self
    where
        G: Grain,
        F: Fn(&GrainContext) -> Result<G, G::Error> + Send + Sync + 'static,
    {
        let methods = registry.methods().map(|m| (m.index(), m.name())).collect();
        Self {
            name: registry.kind(),
            methods,
            activator: Arc::new(KindActivator {
                factory: Arc::new(factory),
                registry: Arc::new(registry),
            }),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// `(index, name)` of every method, in declaration order.
    pub fn methods(&self) -> &[(MethodIndex, &'static str)] {
        &self.methods
    }

    pub(crate) fn activator(&self) -> &Arc<dyn Activator> {
        &self.activator
    }
}

impl fmt::Debug for KindRegistration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KindRegistration")
            .field("name", &self.name)
            .field("methods", &self.methods)
            .finish_non_exhaustive()
    }
}

/// Kind name → registration, frozen once the cluster starts.
#[derive(Debug, Default)]
pub(crate) struct KindTable {
    kinds: HashMap<&'static str, KindRegistration>,
}

impl KindTable {
    pub(crate) fn build(
        registrations: impl IntoIterator<Item = KindRegistration>,
    ) -> Result<Self, RegistryError> {
        let mut kinds = HashMap::new();
        for registration in registrations {
            if kinds.contains_key(registration.name()) {
                return Err(RegistryError::DuplicateKind(registration.name().to_string()));
            }
            kinds.insert(registration.name(), registration);
        }
        Ok(Self { kinds })
    }

    pub(crate) fn get(&self, kind: &str) -> Option<&KindRegistration> {
        self.kinds.get(kind)
    }

    pub(crate) fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.kinds.keys().copied()
    }
}
