//! Deployment environment identifier.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Names the deployment environment a catalog entry belongs to.
///
/// Conventionally one of `dev`, `qa`, `uat`, or `prod`, but any string is
/// accepted; the engine only ever compares environments for equality.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Environment(String);

impl Environment {
    /// Creates an environment from any string-like value.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Returns the environment name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Environment {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}
