//! Value Object Module

pub mod email;
pub mod identity_token;
pub mod provider_name;
pub mod user_id;
