//! Student reviews of organizations.
//!
//! Anonymous reviews keep the author's email in storage; it is stripped from
//! every read unless the reader is an administrator or the author.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::address::reconcile_address;
use crate::domain::{
    Address, AddressId, AddressInput, EmailAddress, OrganizationId, Principal, ReviewId,
};

/// Author reference stored on every review.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Reviewer {
    pub email: EmailAddress,
}

/// Review content shared by drafts and stored reviews.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct ReviewContent {
    pub cost: Option<f64>,
    pub stipend: Option<f64>,
    pub duration: Option<String>,
    /// Safety rating from 1 to 5.
    pub safety: Option<u8>,
    /// Reference code from the `regions` table.
    pub region: Option<String>,
    pub other_region: Option<String>,
    pub languages: Vec<String>,
    pub sectors: Vec<String>,
    pub other_sector: Option<String>,
    pub evaluation: Option<String>,
    pub typical_day: Option<String>,
    pub work_done: Option<String>,
    pub difficulties: Option<String>,
    pub responsiveness: Option<String>,
    pub other_comments: Option<String>,
    pub anonymous: bool,
}

impl Default for ReviewContent {
    fn default() -> Self {
        Self {
            cost: None,
            stipend: None,
            duration: None,
            safety: None,
            region: None,
            other_region: None,
            languages: Vec::new(),
            sectors: Vec::new(),
            other_sector: None,
            evaluation: None,
            typical_day: None,
            work_done: None,
            difficulties: None,
            responsiveness: None,
            other_comments: None,
            anonymous: true,
        }
    }
}

/// Validation failures for review submissions.
#[derive(Debug, Clone, PartialEq)]
pub enum ReviewValidationError {
    SafetyOutOfRange(u8),
    NegativeAmount { field: &'static str, value: f64 },
}

impl ReviewValidationError {
    /// Offending field name, as serialised on the wire.
    #[must_use]
    pub const fn field(&self) -> &'static str {
        match self {
            Self::SafetyOutOfRange(_) => "safety",
            Self::NegativeAmount { field, .. } => *field,
        }
    }
}

impl fmt::Display for ReviewValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SafetyOutOfRange(value) => {
                write!(f, "safety rating must be between 1 and 5, got {value}")
            }
            Self::NegativeAmount { field, value } => {
                write!(f, "{field} must be a non-negative amount, got {value}")
            }
        }
    }
}

impl std::error::Error for ReviewValidationError {}

impl ReviewContent {
    /// Check ratings and amounts.
    pub fn validate(&self) -> Result<(), ReviewValidationError> {
        if let Some(safety) = self.safety
            && !(1..=5).contains(&safety)
        {
            return Err(ReviewValidationError::SafetyOutOfRange(safety));
        }
        for (field, amount) in [("cost", self.cost), ("stipend", self.stipend)] {
            if let Some(value) = amount
                && (!value.is_finite() || value.is_sign_negative())
            {
                return Err(ReviewValidationError::NegativeAmount { field, value });
            }
        }
        Ok(())
    }
}

/// Review form submission.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct ReviewDraft {
    #[serde(flatten)]
    pub content: ReviewContent,
    pub address: Option<AddressInput>,
}

/// Stored review.
///
/// `reviewer` is `None` only in views redacted for the reader.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub id: ReviewId,
    pub organization: OrganizationId,
    pub reviewer: Option<Reviewer>,
    pub address: Option<AddressId>,
    pub created_at: DateTime<Utc>,
    #[serde(flatten)]
    pub content: ReviewContent,
}

impl Review {
    /// Whether `viewer` wrote this review.
    #[must_use]
    pub fn is_authored_by(&self, viewer: &Principal) -> bool {
        self.reviewer
            .as_ref()
            .is_some_and(|reviewer| reviewer.email == viewer.email)
    }

    /// View of the review as `viewer` may see it.
    #[must_use]
    pub fn redacted_for(mut self, viewer: &Principal) -> Self {
        if self.content.anonymous && !viewer.is_admin() && !self.is_authored_by(viewer) {
            self.reviewer = None;
        }
        self
    }
}

/// Review together with the address it owns.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReviewRecord {
    pub review: Review,
    pub address: Option<Address>,
}

/// Atomic write plan for one review and its address.
#[derive(Debug, Clone, PartialEq)]
pub struct ReviewChangeSet {
    pub record: ReviewRecord,
    pub removed_address: Option<AddressId>,
}

impl ReviewChangeSet {
    /// Plan a new review written by `author`.
    pub fn create(
        organization: OrganizationId,
        author: &Principal,
        draft: ReviewDraft,
        now: DateTime<Utc>,
    ) -> Result<Self, ReviewValidationError> {
        draft.content.validate()?;
        let (address, removed_address) = reconcile_address(None, draft.address);
        let review = Review {
            id: ReviewId::random(),
            organization,
            reviewer: Some(Reviewer {
                email: author.email.clone(),
            }),
            address: address.as_ref().map(|address| address.id),
            created_at: now,
            content: draft.content,
        };
        Ok(Self {
            record: ReviewRecord { review, address },
            removed_address,
        })
    }

    /// Plan an edit; authorship, organization and creation time are kept.
    pub fn update(existing: &Review, draft: ReviewDraft) -> Result<Self, ReviewValidationError> {
        draft.content.validate()?;
        let (address, removed_address) = reconcile_address(existing.address, draft.address);
        let review = Review {
            id: existing.id,
            organization: existing.organization,
            reviewer: existing.reviewer.clone(),
            address: address.as_ref().map(|address| address.id),
            created_at: existing.created_at,
            content: draft.content,
        };
        Ok(Self {
            record: ReviewRecord { review, address },
            removed_address,
        })
    }
}
