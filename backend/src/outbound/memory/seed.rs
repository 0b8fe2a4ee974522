//! Built-in reference rows used when no database is configured.
//!
//! The same rows are inserted by the initial SQL migration.

use crate::domain::{ReferenceEntry, ReferenceTable};

const COUNTRIES: &[(&str, &str)] = &[
    ("BR", "Brazil"),
    ("CA", "Canada"),
    ("GH", "Ghana"),
    ("IN", "India"),
    ("KE", "Kenya"),
    ("MX", "Mexico"),
    ("PE", "Peru"),
    ("US", "United States"),
];

const LANGUAGES: &[(&str, &str)] = &[
    ("en", "English"),
    ("es", "Spanish"),
    ("fr", "French"),
    ("hi", "Hindi"),
    ("pt", "Portuguese"),
    ("sw", "Swahili"),
];

const SECTORS: &[(&str, &str)] = &[
    ("AGR", "Agriculture"),
    ("EDU", "Education"),
    ("ENV", "Environment"),
    ("HEA", "Health"),
    ("MIC", "Microfinance"),
    ("OTH", "Other"),
];

const TYPES: &[(&str, &str)] = &[
    ("GOV", "Government agency"),
    ("NGO", "Non-governmental organization"),
    ("SOC", "Social enterprise"),
    ("OTH", "Other"),
];

const REGIONS: &[(&str, &str)] = &[
    ("RUR", "Rural"),
    ("SUB", "Suburban"),
    ("URB", "Urban"),
    ("OTH", "Other"),
];

const AFFILIATIONS: &[(&str, &str)] = &[
    ("CLS", "Course"),
    ("FEL", "Fellowship"),
    ("IND", "Independent"),
    ("SCH", "Student group"),
];

/// Seed rows for `table`.
pub(crate) fn entries(table: ReferenceTable) -> Vec<ReferenceEntry> {
    let rows = match table {
        ReferenceTable::Countries => COUNTRIES,
        ReferenceTable::Languages => LANGUAGES,
        ReferenceTable::Sectors => SECTORS,
        ReferenceTable::Types => TYPES,
        ReferenceTable::Regions => REGIONS,
        ReferenceTable::Affiliations => AFFILIATIONS,
    };
    rows.iter()
        .map(|(code, name)| ReferenceEntry::new(*code, *name))
        .collect()
}
