//! Application Layer
//!
//! Use cases and application services.

pub mod auth_flow;
pub mod config;
pub mod handshake;
pub mod reconcile_identity;
pub mod session_store;

// Re-exports
pub use auth_flow::{AuthFlowController, CallbackOutput, InitiateOutcome, LogoutOutput};
pub use config::AuthConfig;
pub use handshake::{CallbackParams, HandshakeStore, PendingHandshake};
pub use reconcile_identity::{ReconcileInput, ReconcileIdentityUseCase, ReconcileOutput};
pub use session_store::SessionStore;
