//! # System Lifecycle & Orchestration
//!
//! Brings a cluster member up with every sample kind registered, hands out typed
//! clients, and shuts the member down.
//!
//! ## The GrainSystem Pattern
//!
//! ```rust,ignore
//! let system = GrainSystem::start()?;
//! let hello = system.hello_grain("MyGrain");
//! let reply = hello.say_hello(&request, Duration::from_millis(1000)).await?;
//! system.shutdown().await;
//! ```
//!
//! Unlike hand-wired actors, grains need no start order: each one is activated by
//! the first call that reaches it, and a grain that calls another gets its client
//! from its `GrainContext` at that moment.
//!
//! ## Graceful Shutdown
//!
//! 1. **Stop activations** - every dispatcher runs `on_stopping` and `on_stopped`
//! 2. **Reject late calls** - requests still queued get an error envelope
//! 3. **Await completion** - `shutdown` returns once every stop hook ran

pub mod grain_system;

pub use grain_system::*;
