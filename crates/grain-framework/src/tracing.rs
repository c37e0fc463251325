//! # Observability & Tracing
//!
//! Dispatchers log inside an `info_span!("grain", kind, identity)`, and client calls
//! are instrumented with `kind`, `identity` and `method`, so one request can be
//! followed from the caller into the grain:
//!
//! ```text
//! INFO Cluster member started cluster=MyCluster kinds=["HelloGrain"]
//! INFO grain: Grain activated kind="HelloGrain" identity="MyGrain" methods=2
//! INFO grain: Greeter started kind="HelloGrain" identity="MyGrain"
//! ```
//!
//! ```bash
//! RUST_LOG=info cargo run       # lifecycle only
//! RUST_LOG=debug cargo run      # every request and its payload size
//! ```

/// Installs a compact `fmt` subscriber filtered by `RUST_LOG`.
pub fn setup_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .compact()
        .init();
}
