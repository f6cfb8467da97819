//! Provider Name Value Object
//!
//! The `{provider}` path segment. Only names that pass validation can be
//! looked up in the provider registry.

use derive_more::Display;
use kernel::error::app_error::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

const PROVIDER_NAME_MAX_LENGTH: usize = 32;

/// Lowercase identity provider name such as `google`
#[derive(Debug, Display, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[display("{_0}")]
pub struct ProviderName(String);

impl ProviderName {
    pub fn new(name: impl Into<String>) -> AppResult<Self> {
        let name = name.into().trim().to_ascii_lowercase();

        if name.is_empty() || name.len() > PROVIDER_NAME_MAX_LENGTH {
            return Err(AppError::bad_request(format!(
                "Provider name must be 1-{} characters",
                PROVIDER_NAME_MAX_LENGTH
            )));
        }

        if !name
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '_')
        {
            return Err(AppError::bad_request("Provider name contains invalid characters"));
        }

        Ok(Self(name))
    }

    /// Create from database value (assumed already validated)
    pub fn from_db(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for ProviderName {
    type Err = AppError;

    fn from_str(s: &str) -> AppResult<Self> {
        ProviderName::new(s)
    }
}
