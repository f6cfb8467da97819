//! User Entity
//!
//! Local account. One row per distinct email; created on the first
//! successful provider login for that email.

use chrono::{DateTime, Utc};

use crate::domain::value_object::{email::Email, user_id::UserId};

/// User entity
#[derive(Debug, Clone)]
pub struct User {
    /// Internal UUID identifier
    pub user_id: UserId,
    /// Unique linking key across providers
    pub email: Email,
    /// Name reported by the provider at creation time
    pub display_name: Option<String>,
    /// Created timestamp
    pub created_at: DateTime<Utc>,
    /// Updated timestamp
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Create a new user
    pub fn new(email: Email, display_name: Option<String>) -> Self {
        let now = Utc::now();

        Self {
            user_id: UserId::new(),
            email,
            display_name: display_name.filter(|name| !name.trim().is_empty()),
            created_at: now,
            updated_at: now,
        }
    }
}
