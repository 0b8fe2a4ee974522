//! Organization directory filter.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::Organization;

/// Country code treated as domestic when none is configured.
pub const DEFAULT_HOME_COUNTRY: &str = "US";

/// Geographic bucket relative to the home country.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Area {
    Domestic,
    International,
}

/// Directory filter; unset criteria match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrganizationFilter {
    /// Case-insensitive substring of the organization name.
    pub name: Option<String>,
    pub areas: Option<HashSet<Area>>,
    pub sectors: Option<HashSet<String>>,
}

impl OrganizationFilter {
    /// Whether `organization` passes every criterion.
    ///
    /// Organizations without a country match any area and organizations
    /// without sectors match any sector selection.
    #[must_use]
    pub fn matches(&self, organization: &Organization, home_country: &str) -> bool {
        self.name_matches(organization)
            && self.area_matches(organization, home_country)
            && self.sector_matches(organization)
    }

    fn name_matches(&self, organization: &Organization) -> bool {
        let Some(needle) = self
            .name
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
        else {
            return true;
        };
        organization
            .name
            .trim()
            .to_lowercase()
            .contains(&needle.to_lowercase())
    }

    fn area_matches(&self, organization: &Organization, home_country: &str) -> bool {
        let Some(areas) = &self.areas else {
            return true;
        };
        let Some(country) = organization.country.as_deref().filter(|c| !c.is_empty()) else {
            return true;
        };
        let domestic = country.eq_ignore_ascii_case(home_country);
        (domestic && areas.contains(&Area::Domestic))
            || (!domestic && areas.contains(&Area::International))
    }

    fn sector_matches(&self, organization: &Organization) -> bool {
        let Some(sectors) = &self.sectors else {
            return true;
        };
        organization.sectors.is_empty()
            || organization
                .sectors
                .iter()
                .any(|sector| sectors.contains(sector))
    }
}

#[cfg(test)]
mod tests {
    //! Predicate coverage mirroring the student directory behaviour.
    use super::*;
    use crate::domain::OrganizationId;
    use chrono::Utc;
    use rstest::rstest;

    fn org(name: &str, country: Option<&str>, sectors: &[&str]) -> Organization {
        Organization {
            id: OrganizationId::random(),
            name: name.to_owned(),
            type_code: None,
            other_type: None,
            country: country.map(str::to_owned),
            sectors: sectors.iter().map(|s| (*s).to_owned()).collect(),
            other_sector: None,
            website: None,
            description: None,
            approved: true,
            address: None,
            contacts: Vec::new(),
            created_at: Utc::now(),
        }
    }

    fn areas(list: &[Area]) -> Option<HashSet<Area>> {
        Some(list.iter().copied().collect())
    }

    #[rstest]
    #[case(Some("clinic"), "Rural Clinic", true)]
    #[case(Some("CLINIC"), "rural clinic", true)]
    #[case(Some("school"), "Rural Clinic", false)]
    #[case(None, "Anything", true)]
    fn name_is_case_insensitive(
        #[case] needle: Option<&str>,
        #[case] name: &str,
        #[case] expected: bool,
    ) {
        let filter = OrganizationFilter {
            name: needle.map(str::to_owned),
            ..OrganizationFilter::default()
        };
        assert_eq!(filter.matches(&org(name, None, &[]), "US"), expected);
    }

    #[rstest]
    #[case(&[Area::Domestic], Some("US"), true)]
    #[case(&[Area::Domestic], Some("MX"), false)]
    #[case(&[Area::International], Some("MX"), true)]
    #[case(&[Area::International], Some("US"), false)]
    #[case(&[], Some("US"), false)]
    #[case(&[], None, true)]
    fn area_uses_home_country(
        #[case] selected: &[Area],
        #[case] country: Option<&str>,
        #[case] expected: bool,
    ) {
        let filter = OrganizationFilter {
            areas: areas(selected),
            ..OrganizationFilter::default()
        };
        assert_eq!(filter.matches(&org("Org", country, &[]), "US"), expected);
    }

    #[rstest]
    #[case(&["health"], &["health", "education"], true)]
    #[case(&["law"], &["health"], false)]
    #[case(&[], &["health"], false)]
    #[case(&["law"], &[], true)]
    fn sectors_require_intersection(
        #[case] selected: &[&str],
        #[case] org_sectors: &[&str],
        #[case] expected: bool,
    ) {
        let filter = OrganizationFilter {
            sectors: Some(selected.iter().map(|s| (*s).to_owned()).collect()),
            ..OrganizationFilter::default()
        };
        assert_eq!(filter.matches(&org("Org", None, org_sectors), "US"), expected);
    }
}
