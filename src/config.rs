//! Client configuration: API key, subscription tier, endpoint and timeout.

use crate::MeteosourceError;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Version of this library.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Names of the tiers accepted by [`Tier::from_str`].
pub const TIERS_AVAILABLE: [&str; 4] = ["free", "startup", "standard", "flexi"];

pub const DEFAULT_BASE_URL: &str = "https://www.meteosource.com/api/v1/";

const ENV_API_KEY: &str = "METEOSOURCE_API_KEY";
const ENV_TIER: &str = "METEOSOURCE_TIER";
const ENV_BASE_URL: &str = "METEOSOURCE_BASE_URL";
const ENV_TIMEOUT: &str = "METEOSOURCE_TIMEOUT_SECS";

/// The subscription plan. It selects the path prefix of every endpoint.
///
/// # Examples
///
/// ```
/// use meteosource::Tier;
///
/// let tier: Tier = "startup".parse().unwrap();
/// assert_eq!(tier, Tier::Startup);
/// assert_eq!(tier.to_string(), "startup");
/// assert!("premium".parse::<Tier>().is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Free,
    Startup,
    Standard,
    Flexi,
}

impl Tier {
    pub fn path_segment(&self) -> &'static str {
        match self {
            Tier::Free => "free",
            Tier::Startup => "startup",
            Tier::Standard => "standard",
            Tier::Flexi => "flexi",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path_segment())
    }
}

impl FromStr for Tier {
    type Err = MeteosourceError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        match name {
            "free" => Ok(Tier::Free),
            "startup" => Ok(Tier::Startup),
            "standard" => Ok(Tier::Standard),
            "flexi" => Ok(Tier::Flexi),
            other => Err(MeteosourceError::Config(format!(
                "tier {other} does not exist or is not supported"
            ))),
        }
    }
}

/// Settings a [`crate::Meteosource`] client is built from.
#[derive(Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    pub api_key: String,
    /// One of [`TIERS_AVAILABLE`].
    pub tier: String,
    /// Meteosource API base URL (default: <https://www.meteosource.com/api/v1/>)
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Request timeout in seconds (default: 30)
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

const fn default_timeout() -> u64 {
    30
}

impl ClientConfig {
    pub fn new(api_key: impl Into<String>, tier: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            tier: tier.into(),
            base_url: default_base_url(),
            timeout_secs: default_timeout(),
        }
    }

    /// Reads `METEOSOURCE_API_KEY` (required), `METEOSOURCE_TIER` (default
    /// `free`), `METEOSOURCE_BASE_URL` and `METEOSOURCE_TIMEOUT_SECS`.
    pub fn from_env() -> Result<Self, MeteosourceError> {
        let api_key = std::env::var(ENV_API_KEY)
            .map_err(|_| MeteosourceError::Config(format!("{ENV_API_KEY} is not set")))?;
        let tier = std::env::var(ENV_TIER).unwrap_or_else(|_| Tier::Free.to_string());
        let mut config = Self::new(api_key, tier);
        if let Ok(base_url) = std::env::var(ENV_BASE_URL) {
            config.base_url = base_url;
        }
        if let Ok(timeout) = std::env::var(ENV_TIMEOUT) {
            config.timeout_secs = timeout.parse().map_err(|_| {
                MeteosourceError::Config(format!("{ENV_TIMEOUT} is not a number: {timeout}"))
            })?;
        }
        Ok(config)
    }

    /// Checks every field and returns the parsed tier and the normalized
    /// base URL (always ending in `/`).
    pub(crate) fn validate(&self) -> Result<(Tier, String), MeteosourceError> {
        if self.api_key.is_empty() {
            return Err(MeteosourceError::Config(
                "the api_key parameter is empty".to_string(),
            ));
        }
        let tier: Tier = self.tier.parse()?;
        if self.timeout_secs == 0 {
            return Err(MeteosourceError::Config(
                "timeout_secs must be greater than zero".to_string(),
            ));
        }

        let mut base_url = self.base_url.clone();
        if !base_url.ends_with('/') {
            base_url.push('/');
        }
        match Url::parse(&base_url) {
            Ok(url) if !url.cannot_be_a_base() => Ok((tier, base_url)),
            _ => Err(MeteosourceError::Config(format!(
                "base_url '{}' is not an absolute URL",
                self.base_url
            ))),
        }
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("api_key", &"***")
            .field("tier", &self.tier)
            .field("base_url", &self.base_url)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_listed_tier_parses() {
        for name in TIERS_AVAILABLE {
            let tier: Tier = name.parse().unwrap();
            assert_eq!(tier.path_segment(), name);
        }
    }

    #[test]
    fn test_validate_rejects_bad_settings() {
        let cases = [
            ClientConfig::new("", "free"),
            ClientConfig::new("abc", "premium"),
            ClientConfig::new("abc", "Free"),
            ClientConfig {
                base_url: "not a url".to_string(),
                ..ClientConfig::new("abc", "free")
            },
            ClientConfig {
                timeout_secs: 0,
                ..ClientConfig::new("abc", "free")
            },
        ];
        for config in cases {
            assert!(
                matches!(config.validate(), Err(MeteosourceError::Config(_))),
                "{config:?}"
            );
        }
    }

    #[test]
    fn test_validate_normalizes_base_url() {
        let config = ClientConfig {
            base_url: "http://127.0.0.1:8080/api".to_string(),
            ..ClientConfig::new("abc", "flexi")
        };
        let (tier, base_url) = config.validate().unwrap();
        assert_eq!(tier, Tier::Flexi);
        assert_eq!(base_url, "http://127.0.0.1:8080/api/");
    }

    #[test]
    fn test_deserialize_applies_defaults() {
        let config: ClientConfig =
            serde_json::from_str(r#"{"api_key": "abc", "tier": "standard"}"#).unwrap();
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.timeout_secs, 30);
    }

    #[test]
    fn test_debug_hides_api_key() {
        let rendered = format!("{:?}", ClientConfig::new("secret-key", "free"));
        assert!(!rendered.contains("secret-key"));
    }

    #[test]
    fn test_from_env() {
        std::env::set_var(ENV_API_KEY, "env-key");
        std::env::set_var(ENV_TIER, "startup");
        std::env::set_var(ENV_TIMEOUT, "5");
        let config = ClientConfig::from_env().unwrap();
        assert_eq!(config.api_key, "env-key");
        assert_eq!(config.tier, "startup");
        assert_eq!(config.timeout_secs, 5);
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        std::env::remove_var(ENV_TIMEOUT);
        std::env::remove_var(ENV_TIER);
        std::env::remove_var(ENV_API_KEY);
    }
}
