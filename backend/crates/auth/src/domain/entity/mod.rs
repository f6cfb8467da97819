//! Entity Module

pub mod oauth_identity;
pub mod session;
pub mod user;
