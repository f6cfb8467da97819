//! Platform Crate - Technical Infrastructure
//!
//! This crate provides shared technical foundations:
//! - Cryptographic utilities (SHA-256, hex/base64 encoding, random bytes)
//! - HMAC-signed token codec for tamper-evident cookies
//! - PKCE / OAuth `state` generation
//! - Cookie building and extraction
//! - Zeroizing secret strings

pub mod cookie;
pub mod crypto;
pub mod pkce;
pub mod secret;
pub mod signing;
