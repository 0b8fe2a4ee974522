//! Read-only reference (lookup) tables.

use std::fmt;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Placeholder label for codes with no matching reference entry.
pub const MISSING_LABEL: &str = "-";

/// The fixed set of reference tables.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum ReferenceTable {
    Affiliations,
    Countries,
    Languages,
    Regions,
    Sectors,
    Types,
}

impl ReferenceTable {
    /// Every table, in load order.
    pub const ALL: [Self; 6] = [
        Self::Countries,
        Self::Languages,
        Self::Sectors,
        Self::Types,
        Self::Regions,
        Self::Affiliations,
    ];

    /// Storage name of the table.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Affiliations => "affiliations",
            Self::Countries => "countries",
            Self::Languages => "languages",
            Self::Regions => "regions",
            Self::Sectors => "sectors",
            Self::Types => "types",
        }
    }
}

impl fmt::Display for ReferenceTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One code to display-name association.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ReferenceEntry {
    pub code: String,
    pub name: String,
}

impl ReferenceEntry {
    /// Build an entry.
    pub fn new(code: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
        }
    }
}

/// Resolve a free-text override for "Other" style labels.
///
/// When `label` names an "other" bucket and the record carries a non-blank
/// override, the override is shown instead.
///
/// # Examples
/// ```
/// use orgreviews::domain::reference::label_or_override;
///
/// assert_eq!(label_or_override("Other", Some("Beekeeping")), "Beekeeping");
/// assert_eq!(label_or_override("Health", Some("Beekeeping")), "Health");
/// assert_eq!(label_or_override("Other", Some("  ")), "Other");
/// ```
#[must_use]
pub fn label_or_override<'a>(label: &'a str, other: Option<&'a str>) -> &'a str {
    match other.map(str::trim).filter(|value| !value.is_empty()) {
        Some(value) if label.to_lowercase().contains("other") => value,
        _ => label,
    }
}
