//! # Mock Transport & Testing Guide
//!
//! [`MockTransport`] implements [`ClusterTransport`] without activating any grain.
//! Replies are scripted up front, so code that *calls* grains can be tested against
//! outcomes that are hard to produce with a real cluster (error envelopes, odd reply
//! shapes, a node that never answers).
//!
//! ## When to use the Mock vs a real Cluster
//!
//! | Feature | MockTransport | Cluster |
//! |---------|---------------|---------|
//! | **Grain code** | Not run | Run |
//! | **Determinism** | Fully scripted | Subject to scheduler |
//! | **Failure injection** | `fail`, `never_reply`, any envelope | Only what a grain does |
//! | **Use case** | Callers and client error mapping | The grain itself, end to end |
//!
//! ## Example
//!
//! ```rust
//! use grain_framework::mock::MockTransport;
//! use grain_framework::{grain_kind, Envelope, GrainCallError};
//! use std::time::Duration;
//!
//! grain_kind! {
//!     pub trait Counter {
//!         0 => async fn increment(u64) -> u64;
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() {
//!     let mock = MockTransport::new();
//!     mock.expect_call::<Increment>("c-1").respond::<Increment>(&42).unwrap();
//!     mock.expect_call::<Increment>("c-1").reply(Envelope::error("counter is frozen"));
//!
//!     let counter: CounterClient = mock.client("c-1");
//!     let timeout = Duration::from_secs(1);
//!
//!     assert_eq!(counter.increment(&1, timeout).await.unwrap(), 42);
//!     let err = counter.increment(&1, timeout).await.unwrap_err();
//!     assert!(matches!(err, GrainCallError::Remote(msg) if msg == "counter is frozen"));
//!
//!     mock.verify();
//! }
//! ```

use crate::client_trait::KindClient;
use crate::cluster::{ClusterIdentity, ClusterTransport};
use crate::error::{CodecError, TransportError};
use crate::grain::{GrainKind, GrainMethod};
use crate::message::{Envelope, MethodIndex, RequestEnvelope};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

enum Outcome {
    Reply(Envelope),
    Fail(TransportError),
    Silent,
}

struct Expectation {
    target: ClusterIdentity,
    method: Option<MethodIndex>,
    outcome: Outcome,
}

#[derive(Default)]
struct MockState {
    expectations: VecDeque<Expectation>,
    received: Vec<(ClusterIdentity, RequestEnvelope)>,
}

/// A scripted [`ClusterTransport`]. Clones share their expectations.
#[derive(Clone, Default)]
pub struct MockTransport {
    state: Arc<Mutex<MockState>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Typed client whose calls go to this mock.
    pub fn client<C: KindClient>(&self, identity: impl Into<String>) -> C {
        C::connect(Arc::new(self.clone()), identity)
    }

    /// Expects the next request to target `target`, whatever the method.
    pub fn expect_request(&self, target: ClusterIdentity) -> ExpectationBuilder {
        ExpectationBuilder {
            target,
            method: None,
            state: self.state.clone(),
        }
    }

    /// Expects the next request to be a call to method `M` on `identity`.
    pub fn expect_call<M: GrainMethod>(&self, identity: impl Into<String>) -> ExpectationBuilder {
        ExpectationBuilder {
            target: ClusterIdentity::new(<M::Kind as GrainKind>::NAME, identity),
            method: Some(M::INDEX),
            state: self.state.clone(),
        }
    }

    /// Every request delivered so far, oldest first.
    pub fn received(&self) -> Vec<(ClusterIdentity, RequestEnvelope)> {
        self.state.lock().received.clone()
    }

    /// Panics unless every expectation was consumed.
    pub fn verify(&self) {
        let remaining = self.state.lock().expectations.len();
        if remaining > 0 {
            panic!("Not all expectations were met. {remaining} remaining");
        }
    }
}

#[async_trait]
impl ClusterTransport for MockTransport {
    async fn request(
        &self,
        target: &ClusterIdentity,
        envelope: RequestEnvelope,
        _deadline: Duration,
    ) -> Result<Envelope, TransportError> {
        let expectation = {
            let mut state = self.state.lock();
            state.received.push((target.clone(), envelope.clone()));
            state.expectations.pop_front()
        };

        let Some(expectation) = expectation else {
            panic!("Unexpected request to {target} ({})", envelope.method_index());
        };
        if expectation.target != *target {
            panic!("Expected a request to {}, got one to {target}", expectation.target);
        }
        if let Some(method) = expectation.method {
            if method != envelope.method_index() {
                panic!(
                    "Expected method {method} on {target}, got {}",
                    envelope.method_index()
                );
            }
        }

        match expectation.outcome {
            Outcome::Reply(reply) => Ok(reply),
            Outcome::Fail(error) => Err(error),
            Outcome::Silent => std::future::pending().await,
        }
    }
}

/// Completes one expectation. Dropping the builder without calling an outcome
/// method registers nothing.
pub struct ExpectationBuilder {
    target: ClusterIdentity,
    method: Option<MethodIndex>,
    state: Arc<Mutex<MockState>>,
}

impl ExpectationBuilder {
    /// Replies with `envelope`, whatever its shape.
    pub fn reply(self, envelope: Envelope) {
        self.push(Outcome::Reply(envelope));
    }

    /// Replies with a successful response of method `M`.
    pub fn respond<M: GrainMethod>(self, response: &M::Response) -> Result<(), CodecError> {
        let envelope = Envelope::response::<M>(response)?;
        self.push(Outcome::Reply(envelope));
        Ok(())
    }

    /// Fails the delivery.
    pub fn fail(self, error: TransportError) {
        self.push(Outcome::Fail(error));
    }

    /// Accepts the request and never answers, like a node that went away.
    pub fn never_reply(self) {
        self.push(Outcome::Silent);
    }

    fn push(self, outcome: Outcome) {
        self.state.lock().expectations.push_back(Expectation {
            target: self.target,
            method: self.method,
            outcome,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GrainCallError;

    crate::grain_kind! {
        pub trait Thermostat {
            0 => async fn read(()) -> f64;
            1 => async fn set(f64) -> f64;
        }
    }

    const DEADLINE: Duration = Duration::from_millis(1000);

    #[tokio::test]
    async fn test_scripted_replies_in_order() {
        let mock = MockTransport::new();
        mock.expect_call::<Read>("hall").respond::<Read>(&19.5).unwrap();
        mock.expect_call::<Set>("hall").respond::<Set>(&21.0).unwrap();

        let client: ThermostatClient = mock.client("hall");
        assert_eq!(client.read(&(), DEADLINE).await.unwrap(), 19.5);
        assert_eq!(client.set(&21.0, DEADLINE).await.unwrap(), 21.0);
        mock.verify();

        let received = mock.received();
        assert_eq!(received.len(), 2);
        assert_eq!(received[0].0, ClusterIdentity::new("Thermostat", "hall"));
        assert_eq!(received[1].1.method_index(), Set::INDEX);
    }

    #[tokio::test]
    async fn test_transport_failure_is_passed_through() {
        let mock = MockTransport::new();
        let target = ClusterIdentity::new("Thermostat", "attic");
        mock.expect_request(target.clone())
            .fail(TransportError::Unreachable(target.clone()));

        let client: ThermostatClient = mock.client("attic");
        let err = client.read(&(), DEADLINE).await.unwrap_err();
        assert!(matches!(
            err,
            GrainCallError::Transport(TransportError::Unreachable(ref t)) if *t == target
        ));
        assert_eq!(client.identity(), &target);
    }

    #[tokio::test(start_paused = true)]
    async fn test_silent_node_times_out() {
        let mock = MockTransport::new();
        mock.expect_call::<Read>("cellar").never_reply();

        let client: ThermostatClient = mock.client("cellar");
        let started = tokio::time::Instant::now();
        let err = client.read(&(), DEADLINE).await.unwrap_err();

        assert!(err.is_timeout());
        assert!(started.elapsed() >= DEADLINE);
        assert!(started.elapsed() < DEADLINE * 2);
    }

    #[tokio::test]
    #[should_panic(expected = "Not all expectations were met")]
    async fn test_verify_reports_leftovers() {
        let mock = MockTransport::new();
        mock.expect_call::<Read>("hall").reply(Envelope::error("unused"));
        mock.verify();
    }
}
