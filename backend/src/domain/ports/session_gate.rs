//! Driving port for session establishment.

use async_trait::async_trait;

use crate::domain::{Error, GateRun};

use super::IdToken;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SessionGate: Send + Sync {
    /// Run the access gate for the identity behind `token`.
    ///
    /// Token verification failures are errors; a completed run that ends in
    /// `Denied` is an `Ok` value so the caller can purge the session.
    async fn admit(&self, token: &IdToken) -> Result<GateRun, Error>;
}
