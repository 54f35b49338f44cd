use serde::Serialize;
use uuid::Uuid;

use crate::status::UserRole;
use crate::CoreError;

/// The authenticated caller of one request.
///
/// Built by the server's auth middleware from a bearer token and handed to
/// each handler explicitly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Session {
    pub user_id: Uuid,
    pub email: String,
    pub role: UserRole,
}

impl Session {
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }

    /// # Errors
    ///
    /// Returns [`CoreError::Forbidden`] unless the caller is an admin.
    pub fn require_admin(&self) -> Result<(), CoreError> {
        self.require_role(UserRole::Admin)
    }

    /// # Errors
    ///
    /// Returns [`CoreError::Forbidden`] unless the caller is an influencer.
    pub fn require_influencer(&self) -> Result<(), CoreError> {
        self.require_role(UserRole::Influencer)
    }

    fn require_role(&self, role: UserRole) -> Result<(), CoreError> {
        if self.role == role {
            Ok(())
        } else {
            Err(CoreError::Forbidden(format!(
                "this action requires the {role} role"
            )))
        }
    }
}
