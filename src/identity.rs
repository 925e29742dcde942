//! Identity provider interface.
//!
//! The core never validates credentials itself; it consumes an
//! already-resolved user identity through [`IdentityProvider`]. The shipped
//! [`DevIdentity`] implementation decodes a deterministic dev-token format
//! and exists for local runs and tests.

use derive_more::{Display, Error};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::games::UserId;

/// Resolved user identity and display profile.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    /// Stable application user id.
    pub user_id: UserId,
    /// Account username.
    pub username: String,
    /// Display name shown to other players.
    pub display_name: String,
    /// Avatar reference, if the account has one.
    pub avatar_url: Option<String>,
}

/// Authentication errors.
#[derive(Debug, Clone, PartialEq, Eq, Display, Error)]
pub enum AuthError {
    /// No bearer credential was supplied.
    #[display("missing credentials")]
    MissingCredentials,
    /// The supplied credential could not be resolved to a user.
    #[display("invalid token")]
    InvalidToken,
}

/// Resolves a bearer credential to a stable user identity.
pub trait IdentityProvider: Send + Sync {
    /// Resolves the credential.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidToken`] if the credential does not map to
    /// a user.
    fn resolve(&self, bearer: &str) -> Result<UserProfile, AuthError>;
}

/// Development identity provider.
///
/// Tokens have the shape `<user_id>:<display name>`; the display name half
/// is optional and defaults to the id. Deterministic, so tests and local
/// clients can mint identities without an auth service.
#[derive(Debug, Clone, Copy, Default)]
pub struct DevIdentity;

impl DevIdentity {
    /// Creates the dev provider.
    pub fn new() -> Self {
        Self
    }
}

impl IdentityProvider for DevIdentity {
    #[instrument(skip(self, bearer))]
    fn resolve(&self, bearer: &str) -> Result<UserProfile, AuthError> {
        let bearer = bearer.trim();
        if bearer.is_empty() {
            return Err(AuthError::InvalidToken);
        }
        let (user_id, display_name) = match bearer.split_once(':') {
            Some((id, name)) if !id.is_empty() && !name.is_empty() => (id, name),
            Some(_) => return Err(AuthError::InvalidToken),
            None => (bearer, bearer),
        };
        debug!(user_id, "Resolved dev identity");
        Ok(UserProfile {
            user_id: user_id.to_string(),
            username: user_id.to_string(),
            display_name: display_name.to_string(),
            avatar_url: None,
        })
    }
}
