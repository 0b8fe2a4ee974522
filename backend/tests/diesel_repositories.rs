//! Diesel adapters against embedded PostgreSQL.
//!
//! Each test takes a freshly migrated database from the shared cluster and
//! drives the repositories through their ports. Tests are synchronous and
//! reuse one Tokio runtime per context so pool setup and queries share it.

#[path = "support/pg_embed.rs"]
mod pg_embed;

use chrono::{DateTime, TimeZone, Utc};
use orgreviews::domain::ports::{
    AllowListRepository, OrganizationRepository, OrganizationScope, ProvisionOutcome,
    ReferenceRepository, ReviewRepository, UserRepository,
};
use orgreviews::domain::{
    AddressInput, AllowListEntry, ContactInput, EmailAddress, OrganizationChangeSet,
    OrganizationDraft, OrganizationId, Principal, ReferenceTable, ReviewChangeSet,
    ReviewContent, ReviewDraft, Role, User, UserId,
};
use orgreviews::outbound::persistence::{
    DbPool, DieselAllowListRepository, DieselOrganizationRepository, DieselReferenceRepository,
    DieselReviewRepository, DieselUserRepository, PoolConfig,
};
use pg_embed::{handle_cluster_setup_failure, migrated_database};
use pg_embedded_setup_unpriv::TemporaryDatabase;
use rstest::{fixture, rstest};
use tokio::runtime::Runtime;

struct TestContext {
    runtime: Runtime,
    pool: DbPool,
    _database: TemporaryDatabase,
}

impl TestContext {
    fn block_on<F: std::future::Future>(&self, future: F) -> F::Output {
        assert!(
            tokio::runtime::Handle::try_current().is_err(),
            "do not block on the test runtime from inside another runtime"
        );
        self.runtime.block_on(future)
    }

    fn users(&self) -> DieselUserRepository {
        DieselUserRepository::new(self.pool.clone())
    }

    fn allow_list(&self) -> DieselAllowListRepository {
        DieselAllowListRepository::new(self.pool.clone())
    }

    fn organizations(&self) -> DieselOrganizationRepository {
        DieselOrganizationRepository::new(self.pool.clone())
    }

    fn reviews(&self) -> DieselReviewRepository {
        DieselReviewRepository::new(self.pool.clone())
    }

    fn references(&self) -> DieselReferenceRepository {
        DieselReferenceRepository::new(self.pool.clone())
    }
}

fn setup_test_context() -> Result<TestContext, String> {
    let runtime = Runtime::new().map_err(|err| err.to_string())?;
    let database = migrated_database(&runtime)?;
    let config = PoolConfig::new(database.url().to_owned())
        .with_max_size(2)
        .with_min_idle(Some(1));
    let pool = runtime
        .block_on(DbPool::new(config))
        .map_err(|err| err.to_string())?;
    Ok(TestContext {
        runtime,
        pool,
        _database: database,
    })
}

#[fixture]
fn context() -> Option<TestContext> {
    match setup_test_context() {
        Ok(context) => Some(context),
        Err(reason) => handle_cluster_setup_failure(reason),
    }
}

fn timestamp() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 2, 9, 15, 0)
        .single()
        .expect("valid fixture timestamp")
}

fn email(raw: &str) -> EmailAddress {
    EmailAddress::new(raw).expect("fixture email")
}

fn user(id: &str, address: &str, name: &str) -> User {
    User {
        id: UserId::new(id).expect("fixture id"),
        email: email(address),
        name: name.to_owned(),
        role: Role::Student,
        created_at: timestamp(),
        last_access_at: None,
        access_count: 0,
    }
}

fn invitation(address: &str, role: Role) -> AllowListEntry {
    AllowListEntry {
        email: email(address),
        role,
        name: Some("Ada Lovelace".to_owned()),
        invited_at: timestamp(),
    }
}

fn organization_draft(name: &str, contacts: &[&str]) -> OrganizationDraft {
    OrganizationDraft {
        name: name.to_owned(),
        country: Some("KE".to_owned()),
        sectors: vec!["HEA".to_owned()],
        address: Some(AddressInput {
            street: "1 Harambee Ave".to_owned(),
            city: "Nairobi".to_owned(),
            country: Some("KE".to_owned()),
            ..AddressInput::default()
        }),
        contacts: contacts
            .iter()
            .map(|contact| ContactInput {
                name: (*contact).to_owned(),
                ..ContactInput::default()
            })
            .collect(),
        ..OrganizationDraft::default()
    }
}

fn review_plan(organization: OrganizationId, author: &Principal) -> ReviewChangeSet {
    let draft = ReviewDraft {
        content: ReviewContent {
            languages: vec!["sw".to_owned()],
            ..ReviewContent::default()
        },
        address: Some(AddressInput {
            street: "2 Moi Ave".to_owned(),
            city: "Mombasa".to_owned(),
            ..AddressInput::default()
        }),
    };
    ReviewChangeSet::create(organization, author, draft, timestamp()).expect("valid draft")
}

fn author() -> Principal {
    Principal::new(
        UserId::new("uid-ada").expect("fixture id"),
        email("ada@inst.edu"),
        Role::Student,
    )
}

#[rstest]
fn migrations_seed_the_reference_tables(context: Option<TestContext>) {
    let Some(ctx) = context else {
        return;
    };

    let countries = ctx
        .block_on(ctx.references().load_table(ReferenceTable::Countries))
        .expect("load countries");
    let kenya = countries
        .iter()
        .find(|entry| entry.code == "KE")
        .expect("Kenya seeded");
    assert_eq!(kenya.name, "Kenya");

    let languages = ctx
        .block_on(ctx.references().load_table(ReferenceTable::Languages))
        .expect("load languages");
    assert!(languages.iter().any(|entry| entry.code == "sw" && entry.name == "Swahili"));
    assert!(languages.iter().all(|entry| entry.code != "KE"));
}

#[rstest]
fn provisioning_consumes_the_invitation_once(context: Option<TestContext>) {
    let Some(ctx) = context else {
        return;
    };
    let allow_list = ctx.allow_list();
    let users = ctx.users();

    ctx.block_on(allow_list.upsert(&invitation("ada@inst.edu", Role::Admin)))
        .expect("invite");
    let listed = ctx.block_on(allow_list.list()).expect("list invitations");
    assert_eq!(listed.len(), 1);

    let mut ada = user("uid-ada", "ada@inst.edu", "Ada Lovelace");
    ada.role = Role::Admin;
    let outcome = ctx.block_on(allow_list.provision(&ada)).expect("provision");
    assert_eq!(outcome, ProvisionOutcome::Provisioned(ada.clone()));
    assert!(
        ctx.block_on(allow_list.find(&ada.email))
            .expect("find invitation")
            .is_none()
    );
    let stored = ctx
        .block_on(users.find_by_email(&ada.email))
        .expect("find user")
        .expect("user stored");
    assert_eq!(stored.role, Role::Admin);

    let again = ctx.block_on(allow_list.provision(&ada)).expect("second provision");
    assert_eq!(again, ProvisionOutcome::NoInvitation);
}

#[rstest]
fn provisioning_replaces_a_stale_user_with_the_same_email(context: Option<TestContext>) {
    let Some(ctx) = context else {
        return;
    };
    let allow_list = ctx.allow_list();
    let users = ctx.users();

    ctx.block_on(allow_list.upsert(&invitation("ada@inst.edu", Role::Student)))
        .expect("invite");
    let stale = user("uid-old", "ada@inst.edu", "Ada");
    ctx.block_on(allow_list.provision(&stale)).expect("first provision");
    ctx.block_on(allow_list.upsert(&invitation("ada@inst.edu", Role::Student)))
        .expect("invite again");

    let fresh = user("uid-new", "ada@inst.edu", "Ada");
    ctx.block_on(allow_list.provision(&fresh)).expect("second provision");

    let all = ctx.block_on(users.list()).expect("list users");
    assert_eq!(all.len(), 1);
    assert_eq!(all.first().map(|u| u.id.clone()), Some(fresh.id));
}

#[rstest]
fn access_is_counted_and_stamped(context: Option<TestContext>) {
    let Some(ctx) = context else {
        return;
    };
    let allow_list = ctx.allow_list();
    let users = ctx.users();
    ctx.block_on(allow_list.upsert(&invitation("bob@inst.edu", Role::Student)))
        .expect("invite");
    let bob = user("uid-bob", "bob@inst.edu", "Bob");
    ctx.block_on(allow_list.provision(&bob)).expect("provision");

    ctx.block_on(users.record_access(&bob.id, timestamp()))
        .expect("first access");
    let updated = ctx
        .block_on(users.record_access(&bob.id, timestamp()))
        .expect("second access")
        .expect("user exists");
    assert_eq!(updated.access_count, 2);
    assert_eq!(updated.last_access_at, Some(timestamp()));

    let ghost = UserId::new("uid-ghost").expect("id");
    assert!(
        ctx.block_on(users.record_access(&ghost, timestamp()))
            .expect("missing user is a no-op")
            .is_none()
    );
}

#[rstest]
fn organization_edits_drop_removed_contacts_and_address(context: Option<TestContext>) {
    let Some(ctx) = context else {
        return;
    };
    let organizations = ctx.organizations();

    let created = OrganizationChangeSet::create(
        organization_draft("Clinic", &["Amina", "Baraka", "Chege"]),
        timestamp(),
    )
    .expect("valid draft");
    let id = created.record.organization.id;
    ctx.block_on(organizations.save(&created)).expect("save");

    let found = ctx
        .block_on(organizations.find(&id))
        .expect("find")
        .expect("present");
    let names: Vec<&str> = found.contacts.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, ["Amina", "Baraka", "Chege"]);
    assert_eq!(
        found.address.as_ref().map(|address| address.city.as_str()),
        Some("Nairobi")
    );

    let kept = found.contacts.get(1).expect("second contact").id;
    let mut edit = organization_draft("Clinic", &[]);
    edit.address = None;
    edit.contacts = vec![ContactInput {
        id: Some(kept),
        name: "Baraka Otieno".to_owned(),
        ..ContactInput::default()
    }];
    let updated = OrganizationChangeSet::update(&found, edit).expect("valid edit");
    ctx.block_on(organizations.save(&updated)).expect("save edit");

    let after = ctx
        .block_on(organizations.find(&id))
        .expect("find")
        .expect("present");
    assert!(after.address.is_none());
    assert_eq!(after.organization.address, None);
    assert_eq!(after.contacts.len(), 1);
    let contact = after.contacts.first().expect("kept contact");
    assert_eq!(contact.id, kept);
    assert_eq!(contact.name, "Baraka Otieno");
}

#[rstest]
fn edits_keep_an_approval_granted_after_the_read(context: Option<TestContext>) {
    let Some(ctx) = context else {
        return;
    };
    let organizations = ctx.organizations();

    let created = OrganizationChangeSet::create(organization_draft("Clinic", &[]), timestamp())
        .expect("valid draft");
    let id = created.record.organization.id;
    ctx.block_on(organizations.save(&created)).expect("save");
    let read = ctx
        .block_on(organizations.find(&id))
        .expect("find")
        .expect("present");
    assert!(!read.organization.approved);

    ctx.block_on(organizations.set_approval(&id, true))
        .expect("approve")
        .expect("present");
    let stale = OrganizationChangeSet::update(&read, organization_draft("Clinic renamed", &[]))
        .expect("valid edit");
    let stored = ctx.block_on(organizations.save(&stale)).expect("save edit");

    assert!(stored.approved);
    assert_eq!(stored.name, "Clinic renamed");
    assert_eq!(stored.created_at, timestamp());
    let approved = ctx
        .block_on(organizations.list(OrganizationScope::ApprovedOnly))
        .expect("list approved");
    assert_eq!(approved.len(), 1);
    assert_eq!(ctx.block_on(organizations.count(true)).expect("count"), 1);
}

#[rstest]
fn bulk_review_deletion_only_touches_one_organization(context: Option<TestContext>) {
    let Some(ctx) = context else {
        return;
    };
    let organizations = ctx.organizations();
    let reviews = ctx.reviews();
    let mut ids = Vec::new();
    for name in ["Clinic", "School"] {
        let plan = OrganizationChangeSet::create(organization_draft(name, &[]), timestamp())
            .expect("valid draft");
        ctx.block_on(organizations.save(&plan)).expect("save organization");
        ids.push(plan.record.organization.id);
    }
    let [target, other]: [OrganizationId; 2] = ids.try_into().expect("two organizations");

    for organization in [target, target, other] {
        ctx.block_on(reviews.save(&review_plan(organization, &author())))
            .expect("save review");
    }
    let listed = ctx
        .block_on(reviews.list_for_organization(&target))
        .expect("list reviews");
    assert_eq!(listed.len(), 2);
    assert!(listed.iter().all(|review| review.content.anonymous));
    let first = listed.first().expect("review");
    let record = ctx
        .block_on(reviews.find(&first.id))
        .expect("find review")
        .expect("present");
    assert_eq!(
        record.address.as_ref().map(|address| address.city.as_str()),
        Some("Mombasa")
    );
    assert_eq!(record.review.content.languages, ["sw"]);

    let removed = ctx
        .block_on(reviews.delete_for_organization(&target))
        .expect("bulk delete");
    assert_eq!(removed, 2);
    assert_eq!(ctx.block_on(reviews.count()).expect("count"), 1);
    assert!(
        ctx.block_on(reviews.list_for_organization(&target))
            .expect("list")
            .is_empty()
    );
}
