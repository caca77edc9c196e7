//! Service configuration.

use url::Url;

use crate::errors::ConfigError;

/// Options applied once, when the service is built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiServiceConfig {
    /// Overrides the scheme and host declared in the schema (e.g. `https://domain.tld`).
    pub base_uri: Option<String>,
    /// Validate requests before sending them. Defaults to `true`.
    pub validate_request: bool,
    /// Validate responses before denormalizing them. Defaults to `false`.
    pub validate_response: bool,
    /// Return the raw transport response instead of a resource. Defaults to `false`.
    pub return_response: bool,
}

impl Default for ApiServiceConfig {
    fn default() -> Self {
        Self {
            base_uri: None,
            validate_request: true,
            validate_response: false,
            return_response: false,
        }
    }
}

impl ApiServiceConfig {
    /// Reads `OPENAPI_SERVICE_*` variables, keeping defaults for unset ones.
    ///
    /// Set but unparsable values are rejected rather than ignored.
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let base_uri = std::env::var("OPENAPI_SERVICE_BASE_URI")
            .ok()
            .filter(|v| !v.trim().is_empty());
        let config = Self {
            base_uri,
            validate_request: env_bool("OPENAPI_SERVICE_VALIDATE_REQUEST", defaults.validate_request)?,
            validate_response: env_bool(
                "OPENAPI_SERVICE_VALIDATE_RESPONSE",
                defaults.validate_response,
            )?,
            return_response: env_bool("OPENAPI_SERVICE_RETURN_RESPONSE", defaults.return_response)?,
        };
        config.validate()?;
        Ok(config)
    }

    /// Checks that `base_uri`, when set, is an absolute URL with a host.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(uri) = &self.base_uri {
            parse_base_uri(uri)?;
        }
        Ok(())
    }
}

pub(crate) fn parse_base_uri(uri: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(uri).map_err(|e| ConfigError::InvalidBaseUri {
        uri: uri.to_string(),
        reason: e.to_string(),
    })?;
    if !url.has_host() {
        return Err(ConfigError::InvalidBaseUri {
            uri: uri.to_string(),
            reason: "missing host".to_string(),
        });
    }
    Ok(url)
}

pub(crate) fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
        }),
    }
}

fn env_bool(key: &str, default: bool) -> Result<bool, ConfigError> {
    match std::env::var(key) {
        Ok(val) => parse_bool(key, &val),
        Err(_) => Ok(default),
    }
}
