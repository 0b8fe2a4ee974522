//! Authenticated caller resolved by the access gate.

use serde::{Deserialize, Serialize};

use crate::domain::{EmailAddress, Error, Role, UserId};

/// Identity and role of the user behind a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Principal {
    pub user_id: UserId,
    pub email: EmailAddress,
    pub role: Role,
}

impl Principal {
    /// Build a principal.
    #[must_use]
    pub const fn new(user_id: UserId, email: EmailAddress, role: Role) -> Self {
        Self {
            user_id,
            email,
            role,
        }
    }

    /// Whether the caller holds the admin role.
    #[must_use]
    pub const fn is_admin(&self) -> bool {
        self.role.is_admin()
    }

    /// Fail with `permission-denied` unless the caller is an admin.
    pub fn require_admin(&self) -> Result<(), Error> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(Error::permission_denied("administrator role required"))
        }
    }

    /// Fail with `permission-denied` unless the caller holds some role.
    pub fn require_member(&self) -> Result<(), Error> {
        match self.role {
            Role::Admin | Role::Student => Ok(()),
            Role::None => Err(Error::permission_denied("account holds no role")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ErrorCode;
    use rstest::rstest;

    fn principal(role: Role) -> Principal {
        Principal::new(
            UserId::new("u1").expect("fixture id"),
            EmailAddress::new("a@inst.edu").expect("fixture email"),
            role,
        )
    }

    #[rstest]
    #[case(Role::Admin, true, true)]
    #[case(Role::Student, false, true)]
    #[case(Role::None, false, false)]
    fn role_checks(#[case] role: Role, #[case] admin: bool, #[case] member: bool) {
        let caller = principal(role);
        assert_eq!(caller.require_admin().is_ok(), admin);
        assert_eq!(caller.require_member().is_ok(), member);
        if !admin {
            let error = caller.require_admin().expect_err("not an admin");
            assert_eq!(error.code(), ErrorCode::PermissionDenied);
        }
    }
}
