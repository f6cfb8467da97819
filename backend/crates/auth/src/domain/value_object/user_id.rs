//! Typed identifiers for auth entities.

pub use kernel::id::{OAuthIdentityId, UserId};
