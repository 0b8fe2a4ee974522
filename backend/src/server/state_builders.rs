//! Builders for HTTP state ports over the configured storage and identity
//! adapters.
//!
//! Storage is PostgreSQL through Diesel when `database_url` is set and the
//! in-process [`MemoryStore`] otherwise. The identity provider follows the
//! same pattern: the reqwest adapter when credentials are configured, the
//! in-memory provider when they are not.

use std::sync::Arc;

use mockable::{Clock, DefaultClock};
use tracing::{info, warn};

use crate::domain::ports::{
    AllowListRepository, IdentityProvider, OrganizationRepository, ReferenceRepository,
    ReviewRepository, UserRepository,
};
use crate::domain::{
    AccessGate, AllowListEntry, ClaimsSynchronizer, DashboardService, EmailAddress,
    InstitutionDomain, OrganizationService, ReferenceCache, ReviewService, Role, UserAdminService,
};
use crate::inbound::http::state::{HttpState, HttpStatePorts};
use crate::outbound::identity::{HttpIdentityProvider, HttpIdentityProviderBuildError};
use crate::outbound::memory::{InMemoryIdentityProvider, MemoryStore};
use crate::outbound::persistence::{
    DbPool, DieselAllowListRepository, DieselOrganizationRepository, DieselReferenceRepository,
    DieselReviewRepository, DieselUserRepository, MigrationError, PoolConfig, PoolError,
    run_migrations,
};
use crate::settings::{AppSettings, SettingsError};

/// Failures that stop the server from starting.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error(transparent)]
    Settings(#[from] SettingsError),
    #[error(transparent)]
    Migrations(#[from] MigrationError),
    #[error(transparent)]
    Pool(#[from] PoolError),
    #[error(transparent)]
    Identity(#[from] HttpIdentityProviderBuildError),
    #[error("failed to seed bootstrap administrator: {0}")]
    Bootstrap(String),
}

/// Storage and identity adapters the services are built over.
pub struct Backends<U, A, O, V, P> {
    pub users: Arc<U>,
    pub allow_list: Arc<A>,
    pub organizations: Arc<O>,
    pub reviews: Arc<V>,
    pub references: Arc<dyn ReferenceRepository>,
    pub identity: Arc<P>,
}

/// Deployment values shared by the services.
#[derive(Clone)]
pub struct ServiceSettings {
    pub institution: InstitutionDomain,
    pub home_country: String,
    pub hook_secret: Option<String>,
    pub clock: Arc<dyn Clock>,
}

/// Wired HTTP state plus the cache the caller warms before serving.
pub struct WiredState {
    pub http_state: HttpState,
    pub reference: Arc<ReferenceCache>,
}

/// Build every domain service over `backends` and bundle them for handlers.
///
/// One [`ClaimsSynchronizer`] serves the identity hooks, the claim commands
/// used by the access gate and the user deletion cascade.
pub fn wire_http_state<U, A, O, V, P>(
    backends: Backends<U, A, O, V, P>,
    settings: ServiceSettings,
) -> WiredState
where
    U: UserRepository + 'static,
    A: AllowListRepository + 'static,
    O: OrganizationRepository + 'static,
    V: ReviewRepository + 'static,
    P: IdentityProvider + 'static,
{
    let Backends {
        users,
        allow_list,
        organizations,
        reviews,
        references,
        identity,
    } = backends;
    let ServiceSettings {
        institution,
        home_country,
        hook_secret,
        clock,
    } = settings;

    let reference = Arc::new(ReferenceCache::new(
        references,
        organizations.clone() as Arc<dyn OrganizationRepository>,
    ));
    let claims = Arc::new(ClaimsSynchronizer::new(
        users.clone(),
        allow_list.clone(),
        identity.clone(),
        institution.clone(),
        clock.clone(),
    ));
    let gate = Arc::new(AccessGate::new(identity, claims.clone()));
    let admin = Arc::new(UserAdminService::new(
        users.clone(),
        allow_list,
        claims.clone(),
        institution,
        clock.clone(),
    ));
    let dashboard = Arc::new(DashboardService::new(
        users,
        organizations.clone(),
        reviews.clone(),
    ));
    let directory = Arc::new(OrganizationService::new(
        organizations.clone(),
        reference.clone(),
        home_country,
        clock.clone(),
    ));
    let board = Arc::new(ReviewService::new(
        reviews,
        organizations,
        reference.clone(),
        clock,
    ));

    let http_state = HttpState::new(
        HttpStatePorts {
            hooks: claims.clone(),
            gate,
            claims,
            users: admin,
            dashboard,
            organizations: directory,
            reviews: board,
            reference: reference.clone(),
        },
        hook_secret,
    );
    WiredState {
        http_state,
        reference,
    }
}

/// Invite `email` as administrator unless a user with that address exists.
///
/// # Errors
/// Returns [`StartupError::Bootstrap`] when either repository fails.
pub async fn seed_bootstrap_admin<U, A>(
    users: &U,
    allow_list: &A,
    email: EmailAddress,
    clock: &dyn Clock,
) -> Result<(), StartupError>
where
    U: UserRepository,
    A: AllowListRepository,
{
    let existing = users
        .find_by_email(&email)
        .await
        .map_err(|err| StartupError::Bootstrap(err.to_string()))?;
    if existing.is_some() {
        return Ok(());
    }
    allow_list
        .upsert(&AllowListEntry {
            email: email.clone(),
            role: Role::Admin,
            name: None,
            invited_at: clock.utc(),
        })
        .await
        .map_err(|err| StartupError::Bootstrap(err.to_string()))?;
    info!(%email, "bootstrap administrator invited");
    Ok(())
}

async fn wire_with_identity<P>(
    settings: &AppSettings,
    service_settings: ServiceSettings,
    identity: Arc<P>,
) -> Result<WiredState, StartupError>
where
    P: IdentityProvider + 'static,
{
    let bootstrap = settings.bootstrap_admin()?;
    let clock = service_settings.clock.clone();

    if let Some(url) = settings.database_url() {
        run_migrations(url).await?;
        let pool = DbPool::new(PoolConfig::new(url)).await?;
        let users = Arc::new(DieselUserRepository::new(pool.clone()));
        let allow_list = Arc::new(DieselAllowListRepository::new(pool.clone()));
        if let Some(email) = bootstrap {
            seed_bootstrap_admin(users.as_ref(), allow_list.as_ref(), email, clock.as_ref())
                .await?;
        }
        info!("using PostgreSQL persistence");
        return Ok(wire_http_state(
            Backends {
                users,
                allow_list,
                organizations: Arc::new(DieselOrganizationRepository::new(pool.clone())),
                reviews: Arc::new(DieselReviewRepository::new(pool.clone())),
                references: Arc::new(DieselReferenceRepository::new(pool)),
                identity,
            },
            service_settings,
        ));
    }

    warn!("database_url not set; records are kept in memory only");
    let store = Arc::new(MemoryStore::new());
    if let Some(email) = bootstrap {
        seed_bootstrap_admin(store.as_ref(), store.as_ref(), email, clock.as_ref()).await?;
    }
    Ok(wire_http_state(
        Backends {
            users: store.clone(),
            allow_list: store.clone(),
            organizations: store.clone(),
            reviews: store.clone(),
            references: store,
            identity,
        },
        service_settings,
    ))
}

/// Build the HTTP state the server runs with.
///
/// # Errors
/// Propagates invalid settings, migration and pool failures, and identity
/// client construction errors.
pub async fn build_http_state(settings: &AppSettings) -> Result<WiredState, StartupError> {
    let service_settings = ServiceSettings {
        institution: settings.institution()?,
        home_country: settings.home_country(),
        hook_secret: settings.hook_secret(),
        clock: Arc::new(DefaultClock),
    };
    if service_settings.hook_secret.is_none() {
        warn!("hook_secret not set; identity hooks will answer 503");
    }

    match settings.identity()? {
        Some(identity) => {
            let provider =
                HttpIdentityProvider::new(&identity.base_url, identity.api_key, identity.timeout)?;
            info!(base_url = %identity.base_url, "using HTTP identity provider");
            wire_with_identity(settings, service_settings, Arc::new(provider)).await
        }
        None => {
            warn!("identity provider not configured; using the in-memory provider");
            wire_with_identity(
                settings,
                service_settings,
                Arc::new(InMemoryIdentityProvider::new()),
            )
            .await
        }
    }
}

#[cfg(test)]
mod tests {
    //! Wiring checks over the in-memory adapters.

    use super::*;
    use crate::domain::UserId;
    use crate::domain::ports::{AccountCreationEvent, IdentityHooks, ReferenceQuery};
    use crate::test_support::{fixture_clock, fixture_timestamp};
    use rstest::rstest;

    fn memory_backends(
        store: &Arc<MemoryStore>,
    ) -> Backends<MemoryStore, MemoryStore, MemoryStore, MemoryStore, InMemoryIdentityProvider>
    {
        Backends {
            users: store.clone(),
            allow_list: store.clone(),
            organizations: store.clone(),
            reviews: store.clone(),
            references: store.clone(),
            identity: Arc::new(InMemoryIdentityProvider::new()),
        }
    }

    fn service_settings(secret: Option<&str>) -> ServiceSettings {
        ServiceSettings {
            institution: InstitutionDomain::new("inst.edu").expect("domain"),
            home_country: "US".to_owned(),
            hook_secret: secret.map(str::to_owned),
            clock: fixture_clock(),
        }
    }

    #[rstest]
    #[tokio::test]
    async fn bootstrap_admin_is_invited_once() {
        let store = MemoryStore::new();
        let email = EmailAddress::new("root@inst.edu").expect("email");
        let clock = fixture_clock();

        seed_bootstrap_admin(&store, &store, email.clone(), clock.as_ref())
            .await
            .expect("seed");
        let entry = AllowListRepository::find(&store, &email)
            .await
            .expect("lookup")
            .expect("invitation stored");
        assert_eq!(entry.role, Role::Admin);
        assert_eq!(entry.invited_at, fixture_timestamp());
    }

    #[rstest]
    #[tokio::test]
    async fn bootstrap_admin_skips_existing_users() {
        let store = Arc::new(MemoryStore::new());
        let email = EmailAddress::new("root@inst.edu").expect("email");
        let wired = wire_http_state(memory_backends(&store), service_settings(None));
        store
            .upsert(&AllowListEntry {
                email: email.clone(),
                role: Role::Admin,
                name: None,
                invited_at: fixture_timestamp(),
            })
            .await
            .expect("invite");
        wired
            .http_state
            .hooks
            .on_create(AccountCreationEvent {
                email: Some(email.to_string()),
                uid: Some("uid-root".to_owned()),
                display_name: None,
            })
            .await
            .expect("provisioned");

        seed_bootstrap_admin(store.as_ref(), store.as_ref(), email.clone(), &DefaultClock)
            .await
            .expect("seed");
        assert!(AllowListRepository::find(store.as_ref(), &email).await.expect("lookup").is_none());
        assert!(
            store
                .find_by_id(&UserId::new("uid-root").expect("id"))
                .await
                .expect("lookup")
                .is_some()
        );
    }

    #[rstest]
    #[tokio::test]
    async fn wired_reference_cache_serves_snapshots() {
        let store = Arc::new(MemoryStore::new());
        let wired = wire_http_state(memory_backends(&store), service_settings(Some("s")));
        wired.reference.ensure_loaded().await;

        let snapshot = wired.http_state.reference.snapshot().await.expect("snapshot");
        assert!(!snapshot.types.is_empty());
        assert_eq!(wired.http_state.hook_secret(), Some("s"));
    }
}
