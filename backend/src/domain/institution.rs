//! Institutional email domain gate.

use std::fmt;

use crate::domain::EmailAddress;

/// Default institution served by the platform.
pub const DEFAULT_INSTITUTION_DOMAIN: &str = "berkeley.edu";

/// Errors raised while parsing a configured domain.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InstitutionDomainError {
    #[error("institution domain must not be empty")]
    Empty,
    #[error("institution domain '{0}' is not a bare host name")]
    Malformed(String),
}

/// Email domain that accounts must belong to.
///
/// Matching is exact and case-insensitive; `eecs.berkeley.edu` does not match
/// `berkeley.edu`.
///
/// # Examples
/// ```
/// use orgreviews::domain::{EmailAddress, InstitutionDomain};
///
/// let domain = InstitutionDomain::new("@Berkeley.edu").expect("valid domain");
/// let ada = EmailAddress::new("ada@berkeley.edu").expect("valid email");
/// let eve = EmailAddress::new("eve@example.com").expect("valid email");
/// assert!(domain.admits(&ada));
/// assert!(!domain.admits(&eve));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstitutionDomain(String);

impl InstitutionDomain {
    /// Parse a domain, accepting an optional leading `@`.
    pub fn new(raw: impl AsRef<str>) -> Result<Self, InstitutionDomainError> {
        let trimmed = raw.as_ref().trim();
        let bare = trimmed.strip_prefix('@').unwrap_or(trimmed).to_lowercase();
        if bare.is_empty() {
            return Err(InstitutionDomainError::Empty);
        }
        if bare.contains('@')
            || bare.starts_with('.')
            || bare.ends_with('.')
            || bare.chars().any(char::is_whitespace)
        {
            return Err(InstitutionDomainError::Malformed(bare));
        }
        Ok(Self(bare))
    }

    /// Whether `email` belongs to this institution.
    #[must_use]
    pub fn admits(&self, email: &EmailAddress) -> bool {
        email.domain() == self.0
    }

    /// Domain without the leading `@`.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for InstitutionDomain {
    fn default() -> Self {
        Self(DEFAULT_INSTITUTION_DOMAIN.to_owned())
    }
}

impl fmt::Display for InstitutionDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@{}", self.0)
    }
}
