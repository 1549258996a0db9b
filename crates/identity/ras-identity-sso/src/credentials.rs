//! Credential configuration for the OAuth2 single-sign-on resolver.
//!
//! Values come either from code ([`CredentialsConfig::new`]) or from an
//! optional TOML file overlaid by `SSO_`-prefixed environment variables
//! ([`CredentialsConfig::load`]). Both paths validate eagerly, so a
//! `CredentialsConfig` in hand is always usable.

use crate::error::{OAuth2Error, OAuth2Result};
use config::{Config as ConfigBuilder, Environment, File};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use tracing::debug;
use url::Url;

pub const DEFAULT_AUTHORIZATION_ENDPOINT: &str = "https://www.facebook.com/dialog/oauth";
pub const DEFAULT_TOKEN_ENDPOINT: &str = "https://graph.facebook.com/oauth/access_token";
pub const DEFAULT_SCOPE_DELIMITER: &str = ",";
pub const DEFAULT_HTTP_TIMEOUT_SECONDS: u64 = 30;

/// Option keys the provider client interprets itself. Any other key becomes
/// an extra authorization URL parameter.
pub(crate) const AUTHORIZATION_ENDPOINT_KEY: &str = "authorization_endpoint";
pub(crate) const TOKEN_ENDPOINT_KEY: &str = "token_endpoint";
pub(crate) const SCOPE_DELIMITER_KEY: &str = "scope_delimiter";
pub(crate) const HTTP_TIMEOUT_KEY: &str = "http_timeout_seconds";
pub(crate) const CLIENT_ID_KEY: &str = "client_id";
pub(crate) const REDIRECT_URI_KEY: &str = "redirect_uri";

/// A single provider-client construction override.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientOption {
    pub key: String,
    pub value: String,
}

impl ClientOption {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }

    fn validate(&self) -> OAuth2Result<()> {
        if self.key.trim().is_empty() {
            return Err(OAuth2Error::ConfigError(
                "client option keys must not be empty".to_string(),
            ));
        }

        match self.key.as_str() {
            AUTHORIZATION_ENDPOINT_KEY | TOKEN_ENDPOINT_KEY => {
                Url::parse(&self.value).map_err(|e| {
                    OAuth2Error::ConfigError(format!("{} is not a valid URL: {}", self.key, e))
                })?;
            }
            HTTP_TIMEOUT_KEY => {
                self.value.parse::<u64>().map_err(|_| {
                    OAuth2Error::ConfigError(format!(
                        "{} must be a whole number of seconds, got '{}'",
                        HTTP_TIMEOUT_KEY, self.value
                    ))
                })?;
            }
            _ => {}
        }

        Ok(())
    }
}

#[derive(Deserialize)]
struct RawCredentialsConfig {
    #[serde(default)]
    application_id: String,
    #[serde(default)]
    application_secret: String,
    #[serde(default)]
    extra_client_options: Vec<ClientOption>,
}

/// Application credentials registered with the identity provider.
///
/// Immutable once built. The secret is redacted from `Debug` output.
#[derive(Clone, Deserialize)]
#[serde(try_from = "RawCredentialsConfig")]
pub struct CredentialsConfig {
    application_id: String,
    application_secret: String,
    extra_client_options: Vec<ClientOption>,
}

impl TryFrom<RawCredentialsConfig> for CredentialsConfig {
    type Error = OAuth2Error;

    fn try_from(raw: RawCredentialsConfig) -> OAuth2Result<Self> {
        Self::new(
            raw.application_id,
            raw.application_secret,
            raw.extra_client_options,
        )
    }
}

impl CredentialsConfig {
    pub fn new(
        application_id: impl Into<String>,
        application_secret: impl Into<String>,
        extra_client_options: Vec<ClientOption>,
    ) -> OAuth2Result<Self> {
        let application_id = application_id.into();
        let application_secret = application_secret.into();

        if application_id.trim().is_empty() {
            return Err(OAuth2Error::ConfigError(
                "application_id is required and must not be empty".to_string(),
            ));
        }
        if application_secret.trim().is_empty() {
            return Err(OAuth2Error::ConfigError(
                "application_secret is required and must not be empty".to_string(),
            ));
        }
        for option in &extra_client_options {
            option.validate()?;
        }

        Ok(Self {
            application_id,
            application_secret,
            extra_client_options,
        })
    }

    /// Load from an optional TOML file, then `SSO_*` environment variables.
    ///
    /// `SSO_APPLICATION_ID` and `SSO_APPLICATION_SECRET` override the file.
    /// Nested keys, if any, use `__` (e.g. `SSO_A__B`).
    pub fn load(path: Option<&Path>) -> OAuth2Result<Self> {
        let mut builder = ConfigBuilder::builder();

        match path {
            Some(path) if path.exists() => {
                debug!("Loading SSO credentials from {}", path.display());
                builder = builder.add_source(File::from(path));
            }
            Some(path) => {
                debug!("No config file found at {}, using environment", path.display());
            }
            None => {}
        }

        builder = builder.add_source(
            Environment::with_prefix("SSO")
                .prefix_separator("_")
                .separator("__"),
        );

        let config = builder.build()?.try_deserialize::<RawCredentialsConfig>()?;
        Self::try_from(config)
    }

    pub fn application_id(&self) -> &str {
        &self.application_id
    }

    pub fn application_secret(&self) -> &str {
        &self.application_secret
    }

    pub fn extra_client_options(&self) -> &[ClientOption] {
        &self.extra_client_options
    }

    /// Last value set for `key`, if any.
    pub(crate) fn option(&self, key: &str) -> Option<&str> {
        self.extra_client_options
            .iter()
            .rev()
            .find(|option| option.key == key)
            .map(|option| option.value.as_str())
    }

    pub fn http_timeout_seconds(&self) -> u64 {
        // Validated in `new`.
        self.option(HTTP_TIMEOUT_KEY)
            .and_then(|value| value.parse().ok())
            .unwrap_or(DEFAULT_HTTP_TIMEOUT_SECONDS)
    }
}

impl fmt::Debug for CredentialsConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialsConfig")
            .field("application_id", &self.application_id)
            .field("application_secret", &"[REDACTED]")
            .field("extra_client_options", &self.extra_client_options)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    // Loading tests read the process environment; run them one at a time.
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    #[test]
    fn test_valid_credentials() {
        let config = CredentialsConfig::new("app-id", "app-secret", vec![]).unwrap();
        assert_eq!(config.application_id(), "app-id");
        assert_eq!(config.application_secret(), "app-secret");
        assert!(config.extra_client_options().is_empty());
        assert_eq!(config.http_timeout_seconds(), DEFAULT_HTTP_TIMEOUT_SECONDS);
    }

    #[test]
    fn test_empty_credentials_rejected() {
        let cases = [("", "secret"), ("id", ""), ("  ", "secret"), ("", "")];

        for (id, secret) in cases {
            let result = CredentialsConfig::new(id, secret, vec![]);
            assert!(
                matches!(result, Err(OAuth2Error::ConfigError(_))),
                "expected config error for ({:?}, {:?})",
                id,
                secret
            );
        }
    }

    #[test]
    fn test_malformed_options_rejected() {
        let bad_url = CredentialsConfig::new(
            "id",
            "secret",
            vec![ClientOption::new("token_endpoint", "not a url")],
        );
        assert!(matches!(bad_url, Err(OAuth2Error::ConfigError(_))));

        let bad_timeout = CredentialsConfig::new(
            "id",
            "secret",
            vec![ClientOption::new("http_timeout_seconds", "soon")],
        );
        assert!(matches!(bad_timeout, Err(OAuth2Error::ConfigError(_))));

        let empty_key =
            CredentialsConfig::new("id", "secret", vec![ClientOption::new(" ", "popup")]);
        assert!(matches!(empty_key, Err(OAuth2Error::ConfigError(_))));
    }

    #[test]
    fn test_last_option_wins() {
        let config = CredentialsConfig::new(
            "id",
            "secret",
            vec![
                ClientOption::new("http_timeout_seconds", "5"),
                ClientOption::new("display", "page"),
                ClientOption::new("http_timeout_seconds", "12"),
            ],
        )
        .unwrap();

        assert_eq!(config.http_timeout_seconds(), 12);
        assert_eq!(config.option("display"), Some("page"));
        assert_eq!(config.option("missing"), None);
    }

    #[test]
    fn test_debug_redacts_secret() {
        let config = CredentialsConfig::new("app-id", "super-secret-value", vec![]).unwrap();
        let debug = format!("{:?}", config);
        assert!(debug.contains("app-id"));
        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains("super-secret-value"));
    }

    #[test]
    fn test_deserialize_validates() {
        let json = serde_json::json!({
            "application_id": "app-id",
            "application_secret": "secret",
            "extra_client_options": [
                { "key": "display", "value": "popup" }
            ]
        });
        let config: CredentialsConfig = serde_json::from_value(json).unwrap();
        assert_eq!(config.extra_client_options().len(), 1);

        let missing_secret = serde_json::json!({ "application_id": "app-id" });
        let result: Result<CredentialsConfig, _> = serde_json::from_value(missing_secret);
        assert!(result.is_err());
    }

    #[test]
    fn test_load_from_toml_file() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sso.toml");
        std::fs::write(
            &path,
            r#"
application_id = "toml-app"
application_secret = "toml-secret"

[[extra_client_options]]
key = "scope_delimiter"
value = " "
"#,
        )
        .unwrap();

        let config = CredentialsConfig::load(Some(&path)).unwrap();
        assert_eq!(config.application_id(), "toml-app");
        assert_eq!(config.option("scope_delimiter"), Some(" "));
    }

    #[test]
    fn test_load_from_environment() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());

        // SAFETY: every test touching SSO_* variables holds ENV_LOCK.
        unsafe {
            std::env::set_var("SSO_APPLICATION_ID", "env-app");
            std::env::set_var("SSO_APPLICATION_SECRET", "env-secret");
        }

        let result = CredentialsConfig::load(None);

        unsafe {
            std::env::remove_var("SSO_APPLICATION_ID");
            std::env::remove_var("SSO_APPLICATION_SECRET");
        }

        let config = result.unwrap();
        assert_eq!(config.application_id(), "env-app");
        assert_eq!(config.application_secret(), "env-secret");
    }
}
