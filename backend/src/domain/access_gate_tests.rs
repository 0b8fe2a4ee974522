//! Transition coverage for the access gate.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use rstest::rstest;
use rstest_bdd_macros::{given, then, when};

use super::*;
use crate::domain::ports::{MockClaimsCommand, MockIdentityProvider};
use crate::domain::{CustomClaims, EmailAddress};

fn identity(email: Option<&str>) -> VerifiedIdentity {
    VerifiedIdentity {
        uid: UserId::new("u1").expect("fixture uid"),
        email: email.map(|raw| EmailAddress::new(raw).expect("fixture email")),
        display_name: None,
    }
}

fn provider_with(
    email: Option<&'static str>,
    claim_reads: Vec<Option<CustomClaims>>,
) -> MockIdentityProvider {
    let mut provider = MockIdentityProvider::new();
    provider
        .expect_verify_id_token()
        .returning(move |_| Ok(identity(email)));
    let reads = Arc::new(AtomicUsize::new(0));
    let expected_reads = claim_reads.len();
    provider
        .expect_custom_claims()
        .times(expected_reads)
        .returning(move |_| {
            let index = reads.fetch_add(1, Ordering::SeqCst);
            Ok(claim_reads.get(index).copied().flatten())
        });
    provider
}

fn gate(
    provider: MockIdentityProvider,
    claims: MockClaimsCommand,
) -> AccessGate<MockIdentityProvider, MockClaimsCommand> {
    AccessGate::new(Arc::new(provider), Arc::new(claims))
}

fn token() -> IdToken {
    IdToken::new("header.payload.signature")
}

#[rstest]
#[case(GateState::Pending, GateState::Refreshing, true)]
#[case(GateState::Refreshing, GateState::Granted(Role::Student), true)]
#[case(GateState::Refreshing, GateState::Denied, false)]
#[case(GateState::AssigningClaims, GateState::Granted(Role::Admin), false)]
#[case(GateState::Rechecking, GateState::Denied, true)]
#[case(GateState::Denied, GateState::Refreshing, false)]
#[case(GateState::Granted(Role::Admin), GateState::Denied, false)]
fn transition_table(#[case] from: GateState, #[case] to: GateState, #[case] legal: bool) {
    assert_eq!(from.can_advance_to(to), legal);
}

#[rstest]
fn denied_is_terminal() {
    let mut run = GateRun::start(identity(Some("a@inst.edu")));
    run.advance(GateState::Denied).expect("pending may deny");
    assert!(run.state().is_terminal());
    let error = run
        .advance(GateState::Refreshing)
        .expect_err("no transition leaves Denied");
    assert_eq!(error.code(), ErrorCode::Internal);
    assert_eq!(run.principal(), None);
}

#[rstest]
#[tokio::test]
async fn existing_claim_grants_without_assignment() {
    let provider = provider_with(Some("a@inst.edu"), vec![CustomClaims::for_role(Role::Admin)]);
    let mut claims = MockClaimsCommand::new();
    claims.expect_set_claims().never();

    let run = gate(provider, claims).admit(&token()).await.expect("gate runs");
    assert_eq!(
        run.transitions(),
        &[
            GateState::Pending,
            GateState::Refreshing,
            GateState::Granted(Role::Admin)
        ]
    );
    let principal = run.principal().expect("granted principal");
    assert!(principal.is_admin());
}

#[rstest]
#[tokio::test]
async fn missing_claim_is_assigned_once_then_granted() {
    let provider = provider_with(
        Some("a@inst.edu"),
        vec![None, CustomClaims::for_role(Role::Student)],
    );
    let mut claims = MockClaimsCommand::new();
    claims
        .expect_set_claims()
        .withf(|caller, target| caller.user_id == *target && caller.role == Role::None)
        .times(1)
        .returning(|_, _| Ok(CustomClaims::for_role(Role::Student)));

    let run = gate(provider, claims).admit(&token()).await.expect("gate runs");
    assert_eq!(
        run.transitions(),
        &[
            GateState::Pending,
            GateState::Refreshing,
            GateState::AssigningClaims,
            GateState::Rechecking,
            GateState::Granted(Role::Student)
        ]
    );
}

#[rstest]
#[tokio::test]
async fn unprovisioned_account_is_denied_without_recheck() {
    let provider = provider_with(Some("a@inst.edu"), vec![None]);
    let mut claims = MockClaimsCommand::new();
    claims
        .expect_set_claims()
        .times(1)
        .returning(|_, _| Err(Error::not_found("no user document")));

    let run = gate(provider, claims).admit(&token()).await.expect("gate runs");
    assert_eq!(run.state(), GateState::Denied);
    assert!(!run.transitions().contains(&GateState::Rechecking));
}

#[rstest]
#[tokio::test]
async fn token_without_email_is_denied() {
    let provider = provider_with(None, Vec::new());
    let mut claims = MockClaimsCommand::new();
    claims.expect_set_claims().never();

    let run = gate(provider, claims).admit(&token()).await.expect("gate runs");
    assert_eq!(run.transitions(), &[GateState::Pending, GateState::Denied]);
}

#[rstest]
#[tokio::test]
async fn invalid_tokens_are_unauthenticated() {
    let mut provider = MockIdentityProvider::new();
    provider
        .expect_verify_id_token()
        .return_once(|_| Err(IdentityProviderError::invalid_token("expired")));

    let error = gate(provider, MockClaimsCommand::new())
        .admit(&token())
        .await
        .expect_err("expired token");
    assert_eq!(error.code(), ErrorCode::Unauthenticated);
}

#[rstest]
#[tokio::test]
async fn blank_tokens_never_reach_the_provider() {
    let mut provider = MockIdentityProvider::new();
    provider.expect_verify_id_token().never();

    let error = gate(provider, MockClaimsCommand::new())
        .admit(&IdToken::new("  "))
        .await
        .expect_err("blank token");
    assert_eq!(error.code(), ErrorCode::Unauthenticated);
}

#[rstest]
#[tokio::test]
async fn provider_outage_during_assignment_is_an_error() {
    let provider = provider_with(Some("a@inst.edu"), vec![None]);
    let mut claims = MockClaimsCommand::new();
    claims
        .expect_set_claims()
        .return_once(|_, _| Err(Error::unavailable("identity provider unavailable")));

    let error = gate(provider, claims)
        .admit(&token())
        .await
        .expect_err("outage propagates");
    assert_eq!(error.code(), ErrorCode::Unavailable);
}

// Forced sign-out scenario.

#[given("an account whose claims stay empty after assignment")]
fn claims_stay_empty() -> AccessGate<MockIdentityProvider, MockClaimsCommand> {
    let provider = provider_with(Some("none@inst.edu"), vec![None, None]);
    let mut claims = MockClaimsCommand::new();
    claims
        .expect_set_claims()
        .times(1)
        .returning(|_, _| Ok(None));
    gate(provider, claims)
}

#[when("the client presents its token to the gate")]
fn client_presents_token(
    gate: &AccessGate<MockIdentityProvider, MockClaimsCommand>,
) -> Result<GateRun, Error> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("runtime")
        .block_on(gate.admit(&token()))
}

#[then("the gate ends denied after one recheck")]
fn gate_ends_denied(result: Result<GateRun, Error>) {
    let run = result.expect("gate completes");
    assert_eq!(
        run.transitions(),
        &[
            GateState::Pending,
            GateState::Refreshing,
            GateState::AssigningClaims,
            GateState::Rechecking,
            GateState::Denied
        ]
    );
    assert_eq!(run.principal(), None);
}

#[rstest]
fn empty_claims_force_sign_out() {
    let gate = claims_stay_empty();
    let result = client_presents_token(&gate);
    gate_ends_denied(result);
}
