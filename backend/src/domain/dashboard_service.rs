//! Admin dashboard counters.

use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::claims_sync::map_user_error;
use crate::domain::organization_service::map_organization_error;
use crate::domain::ports::{
    DashboardQuery, OrganizationRepository, ReviewRepository, UserRepository,
};
use crate::domain::review_service::map_review_error;
use crate::domain::{AdminStatistics, Error, Principal, Role};

/// Domain service implementing [`DashboardQuery`].
#[derive(Clone)]
pub struct DashboardService<U, O, R> {
    users: Arc<U>,
    organizations: Arc<O>,
    reviews: Arc<R>,
}

impl<U, O, R> DashboardService<U, O, R> {
    /// Create the service.
    pub fn new(users: Arc<U>, organizations: Arc<O>, reviews: Arc<R>) -> Self {
        Self {
            users,
            organizations,
            reviews,
        }
    }
}

#[async_trait]
impl<U, O, R> DashboardQuery for DashboardService<U, O, R>
where
    U: UserRepository,
    O: OrganizationRepository,
    R: ReviewRepository,
{
    async fn statistics(&self, caller: &Principal) -> Result<AdminStatistics, Error> {
        caller.require_admin()?;
        let organizations = self.organizations.as_ref();
        let users = self.users.as_ref();
        let (approved, pending, reviews, students, admins) = tokio::try_join!(
            async { organizations.count(true).await.map_err(map_organization_error) },
            async { organizations.count(false).await.map_err(map_organization_error) },
            async { self.reviews.count().await.map_err(map_review_error) },
            async { users.count_by_role(Role::Student).await.map_err(map_user_error) },
            async { users.count_by_role(Role::Admin).await.map_err(map_user_error) },
        )?;
        Ok(AdminStatistics {
            approved_organizations: approved,
            pending_organizations: pending,
            reviews,
            students,
            admins,
        })
    }
}
