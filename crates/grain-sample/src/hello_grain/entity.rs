//! Grain implementation for the HelloGrain kind.

use super::HelloGrain;
use crate::hello_grain::HelloGrainError;
use crate::model::{
    GetCurrentStateRequest, GetCurrentStateResponse, HelloGrainState, HelloRequest, HelloResponse,
};
use async_trait::async_trait;
use grain_framework::{Grain, GrainContext};
use tracing::{debug, info};

/// One activation of a `HelloGrain`.
#[derive(Debug)]
pub struct Greeter {
    ctx: GrainContext,
    state: HelloGrainState,
}

impl Greeter {
    pub fn new(ctx: &GrainContext) -> Self {
        Self {
            ctx: ctx.clone(),
            state: HelloGrainState::default(),
        }
    }
}

#[async_trait]
impl Grain for Greeter {
    type Error = HelloGrainError;

    async fn on_started(&mut self) -> Result<(), HelloGrainError> {
        self.state = HelloGrainState::default();
        info!(identity = self.ctx.identity(), "Greeter started");
        Ok(())
    }

    async fn on_stopped(&mut self) -> Result<(), HelloGrainError> {
        info!(
            identity = self.ctx.identity(),
            greetings = self.state.greetings,
            "Greeter stopped"
        );
        Ok(())
    }
}

#[async_trait]
impl HelloGrain for Greeter {
    async fn say_hello(&mut self, request: HelloRequest) -> Result<HelloResponse, HelloGrainError> {
        if request.name.trim().is_empty() {
            return Err(HelloGrainError::EmptyName);
        }
        let name = request.name;

        self.state.greetings = self
            .state
            .greetings
            .checked_add(1)
            .ok_or(HelloGrainError::Exhausted)?;
        debug!(name = %name, greetings = self.state.greetings, "Greeting");

        let response = HelloResponse {
            message: format!("Hello {name}, pretty cool, right?"),
        };
        self.state.last_greeted = Some(name);
        Ok(response)
    }

    async fn get_current_state(
        &mut self,
        _request: GetCurrentStateRequest,
    ) -> Result<GetCurrentStateResponse, HelloGrainError> {
        Ok(GetCurrentStateResponse {
            state: self.state.clone(),
        })
    }
}
