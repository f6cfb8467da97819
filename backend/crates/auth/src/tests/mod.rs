//! Crate-level tests for the auth flow.
//!
//! - `harness.rs`   - In-memory repository, fake provider, flow fixture
//! - `reconcile.rs` - Identity reconciliation, including racing callbacks
//! - `flow.rs`      - Initiate / callback / logout through the controller
//! - `routes.rs`    - The same flows over HTTP via the router

mod routes;
