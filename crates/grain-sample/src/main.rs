//! Starts the sample cluster member, greets `MyGrain` and prints its state.

use grain_framework::tracing::setup_tracing;
use grain_sample::lifecycle::GrainSystem;
use grain_sample::model::{GetCurrentStateRequest, HelloRequest};
use std::time::Duration;
use tracing::{error, info, Instrument};

const DEADLINE: Duration = Duration::from_millis(1000);

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    setup_tracing();

    info!("Starting application");
    let system = GrainSystem::start()?;
    let hello = system.hello_grain("MyGrain");

    let request = HelloRequest {
        name: "Proto Potato".to_string(),
    };
    let span = tracing::info_span!("greeting");
    let reply = async {
        info!("Calling say_hello");
        hello.say_hello(&request, DEADLINE).await
    }
    .instrument(span)
    .await;

    match reply {
        Ok(response) => {
            println!("{}", response.message);
            match hello
                .get_current_state(&GetCurrentStateRequest {}, DEADLINE)
                .await
            {
                Ok(current) => info!(state = ?current.state, "Current state"),
                Err(e) => error!(error = %e, "get_current_state failed"),
            }
        }
        Err(e) => error!(error = %e, "say_hello failed"),
    }

    system.shutdown().await;
    info!("Application completed successfully");
    Ok(())
}
