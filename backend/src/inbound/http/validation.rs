//! Shared validation helpers for inbound HTTP adapters.
//!
//! Path and query values arrive as strings so malformed input is reported in
//! the common error envelope instead of actix's plain-text extractor errors.

use std::collections::HashSet;
use std::str::FromStr;

use serde_json::json;

use crate::domain::{Area, EmailAddress, Error, UserId};

/// Validation error codes carried in `details.code`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ValidationCode {
    MissingField,
    InvalidId,
    InvalidEmail,
    InvalidArea,
}

impl ValidationCode {
    const fn as_str(self) -> &'static str {
        match self {
            Self::MissingField => "missing_field",
            Self::InvalidId => "invalid_id",
            Self::InvalidEmail => "invalid_email",
            Self::InvalidArea => "invalid_area",
        }
    }
}

/// Newtype wrapper for HTTP field names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct FieldName(&'static str);

impl FieldName {
    pub(crate) const fn new(name: &'static str) -> Self {
        Self(name)
    }

    const fn as_str(self) -> &'static str {
        self.0
    }
}

fn field_error(field: FieldName, code: ValidationCode, message: String, value: &str) -> Error {
    Error::invalid_argument(message).with_details(json!({
        "field": field.as_str(),
        "value": value,
        "code": code.as_str(),
    }))
}

pub(crate) fn missing_field_error(field: FieldName) -> Error {
    let name = field.as_str();
    Error::invalid_argument(format!("missing required field: {name}")).with_details(json!({
        "field": name,
        "code": ValidationCode::MissingField.as_str(),
    }))
}

/// Parse a server-assigned record id (organization, review).
pub(crate) fn parse_record_id<T>(value: &str, field: FieldName) -> Result<T, Error>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value.trim().parse::<T>().map_err(|error| {
        field_error(field, ValidationCode::InvalidId, error.to_string(), value)
    })
}

/// Parse an identity-provider user id.
pub(crate) fn parse_user_id(value: &str, field: FieldName) -> Result<UserId, Error> {
    UserId::new(value.trim()).map_err(|error| {
        field_error(field, ValidationCode::InvalidId, error.to_string(), value)
    })
}

pub(crate) fn parse_email(value: &str, field: FieldName) -> Result<EmailAddress, Error> {
    EmailAddress::new(value).map_err(|error| {
        field_error(field, ValidationCode::InvalidEmail, error.to_string(), value)
    })
}

/// Split a comma-separated query value, dropping blanks.
///
/// `None` and a value with no entries both mean "no constraint".
pub(crate) fn parse_csv(value: Option<&str>) -> Option<HashSet<String>> {
    let entries: HashSet<String> = value?
        .split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(str::to_owned)
        .collect();
    (!entries.is_empty()).then_some(entries)
}

/// Parse a comma-separated list of [`Area`] names, case-insensitively.
pub(crate) fn parse_areas(
    value: Option<&str>,
    field: FieldName,
) -> Result<Option<HashSet<Area>>, Error> {
    let Some(entries) = parse_csv(value) else {
        return Ok(None);
    };
    entries
        .iter()
        .map(|entry| match entry.to_ascii_uppercase().as_str() {
            "DOMESTIC" => Ok(Area::Domestic),
            "INTERNATIONAL" => Ok(Area::International),
            _ => Err(field_error(
                field,
                ValidationCode::InvalidArea,
                format!("{} must be DOMESTIC or INTERNATIONAL", field.as_str()),
                entry,
            )),
        })
        .collect::<Result<HashSet<_>, _>>()
        .map(Some)
}
