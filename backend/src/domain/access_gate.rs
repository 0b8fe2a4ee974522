//! Access gate run when a client presents a fresh ID token.
//!
//! The gate reads the account's claims straight from the provider. When no
//! role claim is present it asks the synchronizer to assign one exactly once
//! and reads again. A second miss is terminal: the session is refused and the
//! inbound adapter signs the client out.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use tracing::{debug, info, warn};
use utoipa::ToSchema;

use crate::domain::claims_sync::map_identity_error;
use crate::domain::ports::{
    ClaimsCommand, IdToken, IdentityProvider, IdentityProviderError, SessionGate,
    VerifiedIdentity,
};
use crate::domain::{Error, ErrorCode, Principal, Role, UserId};

/// States of one gate run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GateState {
    Pending,
    Refreshing,
    AssigningClaims,
    Rechecking,
    Granted(Role),
    Denied,
}

impl GateState {
    /// Whether no further transition is possible.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Granted(_) | Self::Denied)
    }

    /// Whether the machine may move from `self` to `next`.
    #[must_use]
    pub const fn can_advance_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Refreshing | Self::Denied)
                | (Self::Refreshing, Self::Granted(_) | Self::AssigningClaims)
                | (Self::AssigningClaims, Self::Rechecking | Self::Denied)
                | (Self::Rechecking, Self::Granted(_) | Self::Denied)
        )
    }
}

/// Record of one gate run: the verified identity and every state visited.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GateRun {
    identity: VerifiedIdentity,
    transitions: Vec<GateState>,
}

impl GateRun {
    /// Start a run in [`GateState::Pending`].
    #[must_use]
    pub fn start(identity: VerifiedIdentity) -> Self {
        Self {
            identity,
            transitions: vec![GateState::Pending],
        }
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> GateState {
        self.transitions
            .last()
            .copied()
            .unwrap_or(GateState::Pending)
    }

    /// Every state visited, in order.
    #[must_use]
    pub fn transitions(&self) -> &[GateState] {
        &self.transitions
    }

    /// Identity asserted by the token.
    #[must_use]
    pub const fn identity(&self) -> &VerifiedIdentity {
        &self.identity
    }

    /// Move to `next`, rejecting transitions the machine does not allow.
    pub fn advance(&mut self, next: GateState) -> Result<(), Error> {
        let current = self.state();
        if !current.can_advance_to(next) {
            return Err(Error::internal(format!(
                "illegal access gate transition {current:?} -> {next:?}"
            )));
        }
        debug!(uid = %self.identity.uid, from = ?current, to = ?next, "access gate transition");
        self.transitions.push(next);
        Ok(())
    }

    /// Principal for a granted run.
    #[must_use]
    pub fn principal(&self) -> Option<Principal> {
        let GateState::Granted(role) = self.state() else {
            return None;
        };
        let email = self.identity.email.clone()?;
        Some(Principal::new(self.identity.uid.clone(), email, role))
    }
}

/// Domain service driving the access gate.
#[derive(Clone)]
pub struct AccessGate<P, C> {
    identity: Arc<P>,
    claims: Arc<C>,
}

impl<P, C> AccessGate<P, C> {
    /// Create a gate over the provider and the claim synchronizer.
    pub fn new(identity: Arc<P>, claims: Arc<C>) -> Self {
        Self { identity, claims }
    }
}

impl<P, C> AccessGate<P, C>
where
    P: IdentityProvider,
    C: ClaimsCommand,
{
    async fn refreshed_role(&self, uid: &UserId) -> Result<Option<Role>, Error> {
        match self.identity.custom_claims(uid).await {
            Ok(claims) => Ok(claims.and_then(|claims| claims.role())),
            Err(IdentityProviderError::UnknownAccount { .. }) => Ok(None),
            Err(error) => Err(map_identity_error(error)),
        }
    }

    fn deny(mut run: GateRun, reason: &str) -> Result<GateRun, Error> {
        warn!(uid = %run.identity.uid, reason, "access gate denied session");
        run.advance(GateState::Denied)?;
        Ok(run)
    }
}

#[async_trait]
impl<P, C> SessionGate for AccessGate<P, C>
where
    P: IdentityProvider,
    C: ClaimsCommand,
{
    async fn admit(&self, token: &IdToken) -> Result<GateRun, Error> {
        if token.is_blank() {
            return Err(Error::unauthenticated("idToken is required"));
        }
        let identity = self
            .identity
            .verify_id_token(token)
            .await
            .map_err(map_identity_error)?;
        let mut run = GateRun::start(identity);
        let Some(email) = run.identity.email.clone() else {
            return Self::deny(run, "token carries no email");
        };
        let uid = run.identity.uid.clone();

        run.advance(GateState::Refreshing)?;
        if let Some(role) = self.refreshed_role(&uid).await? {
            run.advance(GateState::Granted(role))?;
            return Ok(run);
        }

        run.advance(GateState::AssigningClaims)?;
        let caller = Principal::new(uid.clone(), email, Role::None);
        match self.claims.set_claims(&caller, &uid).await {
            Ok(claims) => info!(uid = %uid, assigned = claims.is_some(), "claims assigned"),
            Err(error)
                if matches!(
                    error.code(),
                    ErrorCode::NotFound | ErrorCode::PermissionDenied
                ) =>
            {
                return Self::deny(run, error.message());
            }
            Err(error) => return Err(error),
        }

        run.advance(GateState::Rechecking)?;
        match self.refreshed_role(&uid).await? {
            Some(role) => {
                run.advance(GateState::Granted(role))?;
                Ok(run)
            }
            None => Self::deny(run, "no role claim after assignment"),
        }
    }
}

#[cfg(test)]
#[path = "access_gate_tests.rs"]
mod tests;
