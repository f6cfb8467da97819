//! Session State
//!
//! What a client session carries. A session is either anonymous or
//! authenticated for exactly one user; the constructors are the only
//! way to build one, so `authenticated` without a user id cannot exist.

use crate::domain::value_object::user_id::UserId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SessionState {
    user_id: Option<UserId>,
}

impl SessionState {
    /// Missing, cleared or unreadable session
    pub fn anonymous() -> Self {
        Self { user_id: None }
    }

    pub fn authenticated(user_id: UserId) -> Self {
        Self {
            user_id: Some(user_id),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.user_id.is_some()
    }

    pub fn user_id(&self) -> Option<UserId> {
        self.user_id
    }
}
