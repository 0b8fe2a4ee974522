//! Reqwest-backed identity provider adapter.
//!
//! This adapter owns transport details only: endpoint construction, request
//! serialisation, timeout and HTTP error mapping, and JSON decoding into
//! domain identities.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;
use zeroize::Zeroizing;

use super::dto::{
    AccountDto, AccountLookupRequest, DeleteAccountRequest, ErrorEnvelope, LookupResponse,
    TokenLookupRequest, UpdateAttributesRequest, encode_claims,
};
use crate::domain::ports::{IdToken, IdentityProvider, IdentityProviderError, VerifiedIdentity};
use crate::domain::{CustomClaims, EmailAddress, UserId};

const LOOKUP_PATH: &str = "v1/accounts:lookup";
const UPDATE_PATH: &str = "v1/accounts:update";
const DELETE_PATH: &str = "v1/accounts:delete";

/// Failures raised while building the adapter.
#[derive(Debug, thiserror::Error)]
pub enum HttpIdentityProviderBuildError {
    /// The HTTP client could not be constructed.
    #[error("failed to build identity HTTP client: {0}")]
    Client(#[from] reqwest::Error),
    /// An endpoint could not be derived from the base URL.
    #[error("invalid identity endpoint: {0}")]
    Endpoint(#[from] url::ParseError),
}

/// Identity provider speaking the Identity Toolkit account REST API.
pub struct HttpIdentityProvider {
    client: Client,
    lookup: Url,
    update: Url,
    delete: Url,
    api_key: Zeroizing<String>,
}

impl HttpIdentityProvider {
    /// Build an adapter rooted at `base` with an explicit request timeout.
    ///
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed or the
    /// endpoints cannot be joined onto `base`.
    pub fn new(
        base: &Url,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, HttpIdentityProviderBuildError> {
        let client = Client::builder().timeout(timeout).build()?;
        let base = if base.path().ends_with('/') {
            base.clone()
        } else {
            let mut with_slash = base.clone();
            with_slash.set_path(&format!("{}/", base.path()));
            with_slash
        };
        Ok(Self {
            client,
            lookup: base.join(LOOKUP_PATH)?,
            update: base.join(UPDATE_PATH)?,
            delete: base.join(DELETE_PATH)?,
            api_key: Zeroizing::new(api_key.into()),
        })
    }

    async fn post<B, R>(&self, endpoint: &Url, body: &B) -> Result<R, IdentityProviderError>
    where
        B: Serialize + Sync,
        R: DeserializeOwned + Default,
    {
        let response = self
            .client
            .post(endpoint.clone())
            .query(&[("key", self.api_key.as_str())])
            .json(body)
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        let bytes = response.bytes().await.map_err(map_transport_error)?;
        if !status.is_success() {
            return Err(map_status_error(status, bytes.as_ref()));
        }
        if bytes.is_empty() {
            return Ok(R::default());
        }
        serde_json::from_slice(bytes.as_ref()).map_err(|error| {
            IdentityProviderError::transport(format!("invalid identity payload: {error}"))
        })
    }

    async fn lookup_account(&self, uid: &UserId) -> Result<AccountDto, IdentityProviderError> {
        let response: LookupResponse = self
            .post(
                &self.lookup,
                &AccountLookupRequest {
                    local_id: [uid.as_ref()],
                },
            )
            .await?;
        response
            .users
            .into_iter()
            .next()
            .ok_or_else(|| IdentityProviderError::unknown_account(uid.as_ref()))
    }
}

#[async_trait]
impl IdentityProvider for HttpIdentityProvider {
    async fn verify_id_token(
        &self,
        token: &IdToken,
    ) -> Result<VerifiedIdentity, IdentityProviderError> {
        let response: LookupResponse = self
            .post(
                &self.lookup,
                &TokenLookupRequest {
                    id_token: token.expose(),
                },
            )
            .await?;
        let account = response
            .users
            .into_iter()
            .next()
            .ok_or_else(|| IdentityProviderError::invalid_token("token names no account"))?;
        into_identity(account)
    }

    async fn custom_claims(
        &self,
        uid: &UserId,
    ) -> Result<Option<CustomClaims>, IdentityProviderError> {
        let account = self.lookup_account(uid).await?;
        account.claims().map_err(|error| {
            IdentityProviderError::transport(format!("invalid custom attributes: {error}"))
        })
    }

    async fn set_custom_claims(
        &self,
        uid: &UserId,
        claims: Option<CustomClaims>,
    ) -> Result<(), IdentityProviderError> {
        let custom_attributes = encode_claims(claims)
            .map_err(|error| IdentityProviderError::rejected(error.to_string()))?;
        let _: serde_json::Value = self
            .post(
                &self.update,
                &UpdateAttributesRequest {
                    local_id: uid.as_ref(),
                    custom_attributes,
                },
            )
            .await?;
        debug!(%uid, ?claims, "custom claims written");
        Ok(())
    }

    async fn delete_account(&self, uid: &UserId) -> Result<bool, IdentityProviderError> {
        let outcome: Result<serde_json::Value, _> = self
            .post(
                &self.delete,
                &DeleteAccountRequest {
                    local_id: uid.as_ref(),
                },
            )
            .await;
        match outcome {
            Ok(_) => Ok(true),
            Err(IdentityProviderError::UnknownAccount { .. }) => Ok(false),
            Err(error) => Err(error),
        }
    }
}

fn into_identity(account: AccountDto) -> Result<VerifiedIdentity, IdentityProviderError> {
    let uid = UserId::new(account.local_id)
        .map_err(|error| IdentityProviderError::invalid_token(error.to_string()))?;
    // An unparseable email is treated as absent; the gate then denies.
    let email = account
        .email
        .as_deref()
        .and_then(|raw| EmailAddress::new(raw).ok());
    Ok(VerifiedIdentity {
        uid,
        email,
        display_name: account.display_name,
    })
}

fn map_transport_error(error: reqwest::Error) -> IdentityProviderError {
    if error.is_timeout() {
        IdentityProviderError::transport(format!("request timed out: {error}"))
    } else {
        IdentityProviderError::transport(error.to_string())
    }
}

fn map_status_error(status: StatusCode, body: &[u8]) -> IdentityProviderError {
    let reason = serde_json::from_slice::<ErrorEnvelope>(body)
        .map(|envelope| envelope.error.message)
        .unwrap_or_default();
    let body_preview = body_preview(body);
    let message = if body_preview.is_empty() {
        format!("status {}", status.as_u16())
    } else {
        format!("status {}: {}", status.as_u16(), body_preview)
    };

    match status {
        StatusCode::BAD_REQUEST | StatusCode::NOT_FOUND if reason.starts_with("USER_NOT_FOUND") => {
            IdentityProviderError::unknown_account(message)
        }
        _ if reason.starts_with("INVALID_ID_TOKEN") || reason.starts_with("TOKEN_EXPIRED") => {
            IdentityProviderError::invalid_token(message)
        }
        StatusCode::REQUEST_TIMEOUT | StatusCode::TOO_MANY_REQUESTS => {
            IdentityProviderError::transport(message)
        }
        _ if status.is_client_error() => IdentityProviderError::rejected(message),
        _ => IdentityProviderError::transport(message),
    }
}

fn body_preview(body: &[u8]) -> String {
    const PREVIEW_CHAR_LIMIT: usize = 160;

    let compact = String::from_utf8_lossy(body)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    let preview = compact.chars().take(PREVIEW_CHAR_LIMIT).collect::<String>();
    if compact.chars().count() > PREVIEW_CHAR_LIMIT {
        format!("{preview}...")
    } else {
        preview
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for non-network identity mapping helpers.

    use super::*;
    use rstest::rstest;

    fn error_body(message: &str) -> Vec<u8> {
        serde_json::to_vec(&serde_json::json!({
            "error": { "code": 400, "message": message }
        }))
        .expect("serialisable body")
    }

    #[rstest]
    #[case::unknown_user(StatusCode::BAD_REQUEST, "USER_NOT_FOUND", "UnknownAccount")]
    #[case::unknown_user_404(StatusCode::NOT_FOUND, "USER_NOT_FOUND", "UnknownAccount")]
    #[case::bad_token(StatusCode::BAD_REQUEST, "INVALID_ID_TOKEN", "InvalidToken")]
    #[case::expired(StatusCode::BAD_REQUEST, "TOKEN_EXPIRED : stale", "InvalidToken")]
    #[case::forbidden(StatusCode::FORBIDDEN, "PERMISSION_DENIED", "Rejected")]
    #[case::throttled(StatusCode::TOO_MANY_REQUESTS, "QUOTA_EXCEEDED", "Transport")]
    #[case::server_error(StatusCode::BAD_GATEWAY, "", "Transport")]
    fn maps_http_statuses_to_expected_domain_errors(
        #[case] status: StatusCode,
        #[case] reason: &str,
        #[case] expected: &str,
    ) {
        let error = map_status_error(status, &error_body(reason));
        let matched = match expected {
            "UnknownAccount" => matches!(error, IdentityProviderError::UnknownAccount { .. }),
            "InvalidToken" => matches!(error, IdentityProviderError::InvalidToken { .. }),
            "Rejected" => matches!(error, IdentityProviderError::Rejected { .. }),
            "Transport" => matches!(error, IdentityProviderError::Transport { .. }),
            _ => false,
        };
        assert!(matched, "{status} {reason:?} mapped to {error:?}");
    }

    #[rstest]
    fn body_previews_are_truncated() {
        let body = "x".repeat(400);
        let preview = body_preview(body.as_bytes());
        assert_eq!(preview.chars().count(), 163);
        assert!(preview.ends_with("..."));
    }

    #[rstest]
    #[case("https://identity.example/")]
    #[case("https://identity.example/tenant")]
    fn endpoints_are_joined_under_the_base_path(#[case] base: &str) {
        let base = Url::parse(base).expect("valid base");
        let provider =
            HttpIdentityProvider::new(&base, "key", Duration::from_secs(1)).expect("builds");
        assert!(provider.lookup.as_str().starts_with(base.as_str().trim_end_matches('/')));
        assert!(provider.lookup.as_str().ends_with("/v1/accounts:lookup"));
        assert!(provider.delete.as_str().ends_with("/v1/accounts:delete"));
    }

    #[rstest]
    fn unusable_emails_become_absent() {
        let identity = into_identity(AccountDto {
            local_id: "uid-1".to_owned(),
            email: Some("not-an-email".to_owned()),
            display_name: Some("Ada".to_owned()),
            custom_attributes: None,
        })
        .expect("uid is valid");
        assert!(identity.email.is_none());
        assert_eq!(identity.display_name.as_deref(), Some("Ada"));
    }
}
