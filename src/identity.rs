use serde::{Deserialize, Serialize};
use std::fmt;

use crate::ServiceError;

/// Longest identity accepted; matches the `user_identity` column width.
pub const MAX_IDENTITY_LEN: usize = 256;

/// The authenticated caller that owns a cart, usually an email address.
///
/// Passed explicitly into every cart operation; the HTTP layer is responsible
/// for extracting it from the request.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct UserIdentity(String);

impl UserIdentity {
    pub fn new(identity: impl Into<String>) -> Result<Self, ServiceError> {
        let identity = identity.into();
        let trimmed = identity.trim();
        if trimmed.is_empty() {
            return Err(ServiceError::validation("user identity must not be empty"));
        }
        if trimmed.chars().count() > MAX_IDENTITY_LEN {
            return Err(ServiceError::validation(format!(
                "user identity must be at most {MAX_IDENTITY_LEN} characters"
            )));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for UserIdentity {
    type Error = ServiceError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<UserIdentity> for String {
    fn from(identity: UserIdentity) -> Self {
        identity.0
    }
}
