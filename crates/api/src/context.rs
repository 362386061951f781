use kegtrail_auth::Role;
use kegtrail_core::UserId;

/// Principal context for a request (authenticated identity + role).
///
/// This is immutable and must be present for all routes behind the auth
/// middleware.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrincipalContext {
    user_id: UserId,
    email: String,
    role: Role,
}

impl PrincipalContext {
    pub fn new(user_id: UserId, email: String, role: Role) -> Self {
        Self {
            user_id,
            email,
            role,
        }
    }

    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn role(&self) -> Role {
        self.role
    }
}
