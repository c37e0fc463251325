//! # Grain Sample
//!
//! A small application on top of `grain_framework`.
//!
//! - **[model]**: serde request, response and state types.
//! - **[hello_grain]**: the `HelloGrain` kind and its [`Greeter`](hello_grain::Greeter) grain.
//! - **[lifecycle]**: [`GrainSystem`](lifecycle::GrainSystem), which starts the cluster member.
//!
//! See [`grain_framework::mock`] for testing callers without running grains.

pub mod hello_grain;
pub mod lifecycle;
pub mod model;
