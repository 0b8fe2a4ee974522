//! Application settings loaded via OrthoConfig.
//!
//! Every field can be set from the command line, a config file or an
//! `ORGREVIEWS_*` environment variable. Unset optional integrations fall back
//! to the in-process adapters.

use std::fmt;
use std::net::SocketAddr;
use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::Deserialize;
use url::Url;

use crate::domain::{
    DEFAULT_HOME_COUNTRY, DEFAULT_INSTITUTION_DOMAIN, EmailAddress, InstitutionDomain,
    InstitutionDomainError,
};

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_IDENTITY_TIMEOUT_SECS: u64 = 10;

/// Errors raised while interpreting loaded settings.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("invalid bind address {value}: {source}")]
    BindAddr {
        value: String,
        #[source]
        source: std::net::AddrParseError,
    },
    #[error("invalid institution domain: {0}")]
    Institution(#[from] InstitutionDomainError),
    #[error("invalid identity base URL {value}: {source}")]
    IdentityUrl {
        value: String,
        #[source]
        source: url::ParseError,
    },
    #[error("identity_base_url and identity_api_key must be set together")]
    PartialIdentity,
    #[error("invalid bootstrap admin email {0}")]
    BootstrapAdmin(String),
}

/// Connection details for the HTTP identity provider.
pub struct IdentitySettings<'a> {
    pub base_url: Url,
    pub api_key: &'a str,
    pub timeout: Duration,
}

/// Server settings.
#[derive(Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "ORGREVIEWS")]
pub struct AppSettings {
    /// Socket address to listen on.
    pub bind_addr: Option<String>,
    /// Email domain whose addresses may register.
    pub institution_domain: Option<String>,
    /// ISO country code treated as domestic by the directory filter.
    pub home_country: Option<String>,
    /// PostgreSQL URL; the in-memory store is used when unset.
    pub database_url: Option<String>,
    /// Identity Toolkit compatible REST root.
    pub identity_base_url: Option<String>,
    pub identity_api_key: Option<String>,
    /// Bearer secret the identity provider presents on hook calls.
    pub hook_secret: Option<String>,
    pub identity_timeout_secs: Option<u64>,
    /// Address invited as administrator at startup when no such user exists.
    pub bootstrap_admin: Option<String>,
}

impl fmt::Debug for AppSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppSettings")
            .field("bind_addr", &self.bind_addr)
            .field("institution_domain", &self.institution_domain)
            .field("home_country", &self.home_country)
            .field("database_url", &self.database_url.as_ref().map(|_| "<set>"))
            .field("identity_base_url", &self.identity_base_url)
            .field("identity_api_key", &self.identity_api_key.as_ref().map(|_| "<redacted>"))
            .field("hook_secret", &self.hook_secret.as_ref().map(|_| "<redacted>"))
            .field("identity_timeout_secs", &self.identity_timeout_secs)
            .field("bootstrap_admin", &self.bootstrap_admin)
            .finish()
    }
}

fn non_blank(value: Option<&String>) -> Option<&str> {
    value.map(|value| value.trim()).filter(|value| !value.is_empty())
}

impl AppSettings {
    /// Listen address, defaulting to `0.0.0.0:8080`.
    pub fn bind_addr(&self) -> Result<SocketAddr, SettingsError> {
        let value = non_blank(self.bind_addr.as_ref()).unwrap_or(DEFAULT_BIND_ADDR);
        value.parse().map_err(|source| SettingsError::BindAddr {
            value: value.to_owned(),
            source,
        })
    }

    pub fn institution(&self) -> Result<InstitutionDomain, SettingsError> {
        let raw = non_blank(self.institution_domain.as_ref()).unwrap_or(DEFAULT_INSTITUTION_DOMAIN);
        Ok(InstitutionDomain::new(raw)?)
    }

    #[must_use]
    pub fn home_country(&self) -> String {
        non_blank(self.home_country.as_ref())
            .unwrap_or(DEFAULT_HOME_COUNTRY)
            .to_ascii_uppercase()
    }

    #[must_use]
    pub fn database_url(&self) -> Option<&str> {
        non_blank(self.database_url.as_ref())
    }

    #[must_use]
    pub fn hook_secret(&self) -> Option<String> {
        non_blank(self.hook_secret.as_ref()).map(str::to_owned)
    }

    /// HTTP identity provider settings, or `None` for the in-memory one.
    pub fn identity(&self) -> Result<Option<IdentitySettings<'_>>, SettingsError> {
        let base = non_blank(self.identity_base_url.as_ref());
        let key = non_blank(self.identity_api_key.as_ref());
        match (base, key) {
            (None, None) => Ok(None),
            (Some(base), Some(api_key)) => {
                let base_url = Url::parse(base).map_err(|source| SettingsError::IdentityUrl {
                    value: base.to_owned(),
                    source,
                })?;
                Ok(Some(IdentitySettings {
                    base_url,
                    api_key,
                    timeout: Duration::from_secs(
                        self.identity_timeout_secs
                            .unwrap_or(DEFAULT_IDENTITY_TIMEOUT_SECS),
                    ),
                }))
            }
            _ => Err(SettingsError::PartialIdentity),
        }
    }

    pub fn bootstrap_admin(&self) -> Result<Option<EmailAddress>, SettingsError> {
        non_blank(self.bootstrap_admin.as_ref())
            .map(|raw| {
                EmailAddress::new(raw).map_err(|_| SettingsError::BootstrapAdmin(raw.to_owned()))
            })
            .transpose()
    }
}
