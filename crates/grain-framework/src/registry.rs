//! # Method Registry
//!
//! Per kind, an ordered table from [`MethodIndex`] to the code that decodes a payload,
//! runs the matching handler on a grain and encodes the result.
//!
//! A registry is built once at startup (usually by the `registry()` function that
//! [`grain_kind!`](crate::grain_kind) generates) and is never mutated afterwards;
//! dispatchers share it through an `Arc`.
//!
//! The declaration order *is* the wire contract: the n-th declared method must carry
//! index n. [`MethodRegistryBuilder::method`] rejects anything else.

use crate::error::{CodecError, RegistryError};
use crate::grain::{Grain, GrainKind, GrainMethod, Invoke};
use crate::message::{MethodIndex, Payload};
use futures::future::BoxFuture;
use std::fmt;
use std::marker::PhantomData;

/// Why a registered method could not produce a response.
#[derive(Debug, thiserror::Error)]
pub(crate) enum InvokeError {
    #[error("malformed request payload: {0}")]
    MalformedRequest(CodecError),
    #[error("{0}")]
    Handler(String),
    #[error("response could not be encoded: {0}")]
    MalformedResponse(CodecError),
}

pub(crate) type InvokeFn<G> =
    for<'a> fn(&'a mut G, Payload) -> BoxFuture<'a, Result<Payload, InvokeError>>;

fn invoke_erased<'a, G, M>(
    grain: &'a mut G,
    payload: Payload,
) -> BoxFuture<'a, Result<Payload, InvokeError>>
where
    G: Grain,
    M: Invoke<G>,
{
    Box::pin(async move {
        let request: M::Request = payload.decode().map_err(InvokeError::MalformedRequest)?;
        let response = M::invoke(grain, request)
            .await
            .map_err(|e| InvokeError::Handler(e.to_string()))?;
        Payload::encode(&response).map_err(InvokeError::MalformedResponse)
    })
}

/// One row of a registry.
pub struct MethodEntry<G: Grain> {
    index: MethodIndex,
    name: &'static str,
    invoke: InvokeFn<G>,
}

impl<G: Grain> MethodEntry<G> {
    pub fn index(&self) -> MethodIndex {
        self.index
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub(crate) fn invoker(&self) -> InvokeFn<G> {
        self.invoke
    }
}

impl<G: Grain> fmt::Debug for MethodEntry<G> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodEntry")
            .field("index", &self.index)
            .field("name", &self.name)
            .finish()
    }
}

/// The method table of one kind, specialized for grain type `G`.
pub struct MethodRegistry<G: Grain> {
    kind: &'static str,
    entries: Vec<MethodEntry<G>>,
}

impl<G: Grain> MethodRegistry<G> {
    /// Starts a registry for kind `K`.
    pub fn builder<K: GrainKind>() -> MethodRegistryBuilder<G, K> {
        MethodRegistryBuilder {
            entries: Vec::new(),
            _kind: PhantomData,
        }
    }

    pub fn kind(&self) -> &'static str {
        self.kind
    }

    /// Looks up a method. `None` means caller and callee disagree on the kind's
    /// method table.
    pub fn get(&self, index: MethodIndex) -> Option<&MethodEntry<G>> {
        self.entries.get(usize::try_from(index.get()).ok()?)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn methods(&self) -> impl Iterator<Item = &MethodEntry<G>> {
        self.entries.iter()
    }
}

impl<G: Grain> fmt::Debug for MethodRegistry<G> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodRegistry")
            .field("kind", &self.kind)
            .field("entries", &self.entries)
            .finish()
    }
}

/// Collects methods in declaration order.
pub struct MethodRegistryBuilder<G: Grain, K: GrainKind> {
    entries: Vec<MethodEntry<G>>,
    _kind: PhantomData<fn() -> K>,
}

impl<G: Grain, K: GrainKind> MethodRegistryBuilder<G, K> {
    /// Appends method `M`. Its index must equal the number of methods declared so far.
    pub fn method<M>(mut self) -> Result<Self, RegistryError>
    where
        M: Invoke<G> + GrainMethod<Kind = K>,
    {
        let expected = MethodIndex::new(self.entries.len() as u32);
        if M::INDEX != expected {
            return Err(RegistryError::OutOfOrder {
                kind: K::NAME,
                method: M::NAME,
                expected,
                found: M::INDEX,
            });
        }
        self.entries.push(MethodEntry {
            index: M::INDEX,
            name: M::NAME,
            invoke: invoke_erased::<G, M>,
        });
        Ok(self)
    }

    pub fn build(self) -> MethodRegistry<G> {
        MethodRegistry {
            kind: K::NAME,
            entries: self.entries,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct AddRequest {
        amount: i64,
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct Total {
        value: i64,
    }

    crate::grain_kind! {
        pub trait Tally {
            0 => async fn add(AddRequest) -> Total;
            1 => async fn current(()) -> Total;
        }
    }

    // Hand-written marker that claims an index out of declaration order.
    struct Skewed;

    impl GrainMethod for Skewed {
        type Kind = TallyKind;
        type Request = ();
        type Response = Total;
        const INDEX: MethodIndex = MethodIndex::new(5);
        const NAME: &'static str = "skewed";
    }

    impl<G: Tally> Invoke<G> for Skewed {
        fn invoke(grain: &mut G, request: ()) -> BoxFuture<'_, Result<Total, G::Error>> {
            grain.current(request)
        }
    }

    #[derive(Debug, thiserror::Error)]
    #[error("tally overflow")]
    struct TallyError;

    #[derive(Default)]
    struct Counter {
        value: i64,
    }

    #[async_trait]
    impl Grain for Counter {
        type Error = TallyError;
    }

    #[async_trait]
    impl Tally for Counter {
        async fn add(&mut self, request: AddRequest) -> Result<Total, TallyError> {
            self.value = self.value.checked_add(request.amount).ok_or(TallyError)?;
            Ok(Total { value: self.value })
        }

        async fn current(&mut self, _request: ()) -> Result<Total, TallyError> {
            Ok(Total { value: self.value })
        }
    }

    #[test]
    fn test_registry_follows_declaration_order() {
        let registry = TallyKind::registry::<Counter>().unwrap();
        assert_eq!(registry.kind(), "Tally");
        assert_eq!(registry.len(), 2);

        let names: Vec<_> = registry.methods().map(|m| (m.index().get(), m.name())).collect();
        assert_eq!(names, vec![(0, "add"), (1, "current")]);
    }

    #[test]
    fn test_lookup_is_stable() {
        let registry = TallyKind::registry::<Counter>().unwrap();
        let first = registry.get(MethodIndex::new(1)).unwrap();
        let second = registry.get(MethodIndex::new(1)).unwrap();
        assert!(std::ptr::eq(first, second));
        assert_eq!(first.name(), "current");
        assert!(registry.get(MethodIndex::new(99)).is_none());
    }

    #[test]
    fn test_out_of_order_method_is_rejected() {
        let result = MethodRegistry::<Counter>::builder::<TallyKind>()
            .method::<Add>()
            .and_then(|b| b.method::<Skewed>());

        assert_eq!(
            result.err(),
            Some(RegistryError::OutOfOrder {
                kind: "Tally",
                method: "skewed",
                expected: MethodIndex::new(1),
                found: MethodIndex::new(5),
            })
        );
    }

    #[tokio::test]
    async fn test_entry_decodes_invokes_and_encodes() {
        let registry = TallyKind::registry::<Counter>().unwrap();
        let mut grain = Counter::default();
        let add = registry.get(Add::INDEX).unwrap().invoker();

        let payload = Payload::encode(&AddRequest { amount: 40 }).unwrap();
        let reply = add(&mut grain, payload).await.unwrap();
        let total: Total = reply.decode().unwrap();
        assert_eq!(total, Total { value: 40 });
        assert_eq!(grain.value, 40);
    }

    #[tokio::test]
    async fn test_entry_reports_handler_and_payload_failures() {
        let registry = TallyKind::registry::<Counter>().unwrap();
        let mut grain = Counter { value: i64::MAX };
        let add = registry.get(Add::INDEX).unwrap().invoker();

        let overflow = add(&mut grain, Payload::encode(&AddRequest { amount: 1 }).unwrap()).await;
        assert!(matches!(overflow, Err(InvokeError::Handler(ref msg)) if msg == "tally overflow"));

        let garbage = add(&mut grain, Payload::from_bytes(vec![0xc1])).await;
        assert!(matches!(garbage, Err(InvokeError::MalformedRequest(_))));
    }
}
