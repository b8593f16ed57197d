//! Role gating as a pure function of the caller's identity.

use crate::users::repo_types::Role;

/// Who may perform an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// Anyone, token or not.
    Public,
    /// Any signed-in user.
    Authenticated,
    Admin,
}

impl Access {
    /// `role` is `None` for anonymous callers.
    pub fn permits(self, role: Option<Role>) -> bool {
        match (self, role) {
            (Access::Public, _) => true,
            (Access::Authenticated, Some(_)) => true,
            (Access::Admin, Some(role)) => role.is_admin(),
            (_, None) => false,
        }
    }

    pub fn requires_identity(self) -> bool {
        !matches!(self, Access::Public)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn public_permits_everyone() {
        assert!(Access::Public.permits(None));
        assert!(Access::Public.permits(Some(Role::User)));
        assert!(Access::Public.permits(Some(Role::Admin)));
    }

    #[test]
    fn authenticated_needs_an_identity() {
        assert!(!Access::Authenticated.permits(None));
        assert!(Access::Authenticated.permits(Some(Role::User)));
        assert!(Access::Authenticated.permits(Some(Role::Admin)));
    }

    #[test]
    fn admin_needs_the_admin_role() {
        assert!(!Access::Admin.permits(None));
        assert!(!Access::Admin.permits(Some(Role::User)));
        assert!(Access::Admin.permits(Some(Role::Admin)));
    }
}
