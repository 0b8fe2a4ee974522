//! Shared HTTP adapter state.
//!
//! HTTP handlers accept this state via `actix_web::web::Data` so they only
//! depend on domain ports (use-cases) and remain testable without I/O.

use std::sync::Arc;

use zeroize::Zeroizing;

use crate::domain::ports::{
    ClaimsCommand, DashboardQuery, IdentityHooks, OrganizationDirectory, ReferenceQuery,
    ReviewBoard, SessionGate, UserAdministration,
};

/// Parameter object bundling all port implementations for HTTP handlers.
#[derive(Clone)]
pub struct HttpStatePorts {
    pub hooks: Arc<dyn IdentityHooks>,
    pub gate: Arc<dyn SessionGate>,
    pub claims: Arc<dyn ClaimsCommand>,
    pub users: Arc<dyn UserAdministration>,
    pub dashboard: Arc<dyn DashboardQuery>,
    pub organizations: Arc<dyn OrganizationDirectory>,
    pub reviews: Arc<dyn ReviewBoard>,
    pub reference: Arc<dyn ReferenceQuery>,
}

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    pub hooks: Arc<dyn IdentityHooks>,
    pub gate: Arc<dyn SessionGate>,
    pub claims: Arc<dyn ClaimsCommand>,
    pub users: Arc<dyn UserAdministration>,
    pub dashboard: Arc<dyn DashboardQuery>,
    pub organizations: Arc<dyn OrganizationDirectory>,
    pub reviews: Arc<dyn ReviewBoard>,
    pub reference: Arc<dyn ReferenceQuery>,
    hook_secret: Option<Arc<Zeroizing<String>>>,
}

impl HttpState {
    /// Construct state from the port bundle and the identity hook secret.
    ///
    /// Without a secret the hook endpoints answer `unavailable`.
    #[must_use]
    pub fn new(ports: HttpStatePorts, hook_secret: Option<String>) -> Self {
        let HttpStatePorts {
            hooks,
            gate,
            claims,
            users,
            dashboard,
            organizations,
            reviews,
            reference,
        } = ports;
        Self {
            hooks,
            gate,
            claims,
            users,
            dashboard,
            organizations,
            reviews,
            reference,
            hook_secret: hook_secret
                .filter(|secret| !secret.is_empty())
                .map(|secret| Arc::new(Zeroizing::new(secret))),
        }
    }

    /// Shared secret the identity provider presents on hook calls.
    #[must_use]
    pub fn hook_secret(&self) -> Option<&str> {
        self.hook_secret.as_deref().map(|secret| secret.as_str())
    }
}
