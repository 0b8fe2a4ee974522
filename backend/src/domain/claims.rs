//! Custom authorization claims mirrored into the identity provider.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::Role;

const fn is_false(flag: &bool) -> bool {
    !*flag
}

/// Role-derived claim set.
///
/// Only one flag is ever set by the synchronizer. A claim set with neither
/// flag is never stored; clearing claims stores nothing instead.
///
/// # Examples
/// ```
/// use orgreviews::domain::{CustomClaims, Role};
///
/// let claims = CustomClaims::for_role(Role::Admin).expect("admins hold claims");
/// assert!(claims.admin);
/// assert!(CustomClaims::for_role(Role::None).is_none());
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct CustomClaims {
    #[serde(default, skip_serializing_if = "is_false")]
    pub admin: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub student: bool,
}

impl CustomClaims {
    /// Claims granted to `role`, or `None` when claims must be cleared.
    #[must_use]
    pub const fn for_role(role: Role) -> Option<Self> {
        match role {
            Role::Admin => Some(Self {
                admin: true,
                student: false,
            }),
            Role::Student => Some(Self {
                admin: false,
                student: true,
            }),
            Role::None => None,
        }
    }

    /// Role these claims resolve to; `admin` wins over `student`.
    #[must_use]
    pub const fn role(&self) -> Option<Role> {
        if self.admin {
            Some(Role::Admin)
        } else if self.student {
            Some(Role::Student)
        } else {
            None
        }
    }
}

/// Provisioning lifecycle of one account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "role", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProvisioningState {
    /// No user document exists.
    Unprovisioned,
    /// A user document exists but the provider holds no matching claims.
    Provisioned(Role),
    /// The provider's claims match the document's role.
    Claimed(Role),
}

impl ProvisioningState {
    /// Derive the state from the stored role and the provider's claims.
    #[must_use]
    pub fn resolve(document_role: Option<Role>, claims: Option<CustomClaims>) -> Self {
        match document_role {
            None => Self::Unprovisioned,
            Some(role) => {
                if claims == CustomClaims::for_role(role) && claims.is_some() {
                    Self::Claimed(role)
                } else {
                    Self::Provisioned(role)
                }
            }
        }
    }
}
