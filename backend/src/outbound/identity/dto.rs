//! Wire shapes of the Identity Toolkit account endpoints.

use serde::{Deserialize, Serialize};

use crate::domain::CustomClaims;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct TokenLookupRequest<'a> {
    pub(super) id_token: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct AccountLookupRequest<'a> {
    pub(super) local_id: [&'a str; 1],
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct UpdateAttributesRequest<'a> {
    pub(super) local_id: &'a str,
    /// JSON object encoded as a string; `"{}"` clears every attribute.
    pub(super) custom_attributes: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct DeleteAccountRequest<'a> {
    pub(super) local_id: &'a str,
}

#[derive(Debug, Default, Deserialize)]
pub(super) struct LookupResponse {
    #[serde(default)]
    pub(super) users: Vec<AccountDto>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct AccountDto {
    pub(super) local_id: String,
    pub(super) email: Option<String>,
    pub(super) display_name: Option<String>,
    pub(super) custom_attributes: Option<String>,
}

impl AccountDto {
    /// Decode the role-bearing claims; an empty attribute object means none.
    pub(super) fn claims(&self) -> Result<Option<CustomClaims>, serde_json::Error> {
        let Some(raw) = self.custom_attributes.as_deref() else {
            return Ok(None);
        };
        let claims: CustomClaims = serde_json::from_str(raw)?;
        Ok(claims.role().map(|_| claims))
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct ErrorEnvelope {
    pub(super) error: ErrorBody,
}

#[derive(Debug, Deserialize)]
pub(super) struct ErrorBody {
    #[serde(default)]
    pub(super) message: String,
}

pub(super) fn encode_claims(claims: Option<CustomClaims>) -> Result<String, serde_json::Error> {
    claims.map_or_else(|| Ok("{}".to_owned()), |claims| serde_json::to_string(&claims))
}
