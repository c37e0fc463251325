//! Request, response and state types of the sample kinds. Plain serde data.

pub mod hello;

pub use hello::*;
