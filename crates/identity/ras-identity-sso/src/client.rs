//! Provider client: consent URL building and the code-for-token exchange.

use crate::credentials::{
    AUTHORIZATION_ENDPOINT_KEY, CLIENT_ID_KEY, ClientOption, CredentialsConfig,
    DEFAULT_AUTHORIZATION_ENDPOINT, DEFAULT_HTTP_TIMEOUT_SECONDS, DEFAULT_SCOPE_DELIMITER,
    DEFAULT_TOKEN_ENDPOINT, HTTP_TIMEOUT_KEY, REDIRECT_URI_KEY, SCOPE_DELIMITER_KEY,
    TOKEN_ENDPOINT_KEY,
};
use crate::error::{OAuth2Error, OAuth2Result};
use crate::types::{AccessToken, TokenResponse};
use reqwest::Client;
use std::fmt;
use std::time::Duration;
use tracing::{debug, error, info, warn};
use url::Url;

/// Handle bound to one callback URI.
///
/// Built fresh for every authentication attempt. After a successful
/// exchange it carries the access token so the caller can keep talking to
/// the provider on the user's behalf.
#[derive(Clone)]
pub struct ProviderClient {
    http_client: Client,
    client_id: String,
    client_secret: String,
    redirect_uri: String,
    authorization_endpoint: String,
    token_endpoint: String,
    scope_delimiter: String,
    http_timeout: Duration,
    auth_params: Vec<(String, String)>,
    access_token: Option<AccessToken>,
}

impl ProviderClient {
    /// Bind a client to `callback_uri`.
    ///
    /// `extra_options` are applied after the required settings, in order, so
    /// later entries shadow earlier ones and the defaults. No I/O happens here.
    pub fn new(
        http_client: Client,
        application_id: &str,
        application_secret: &str,
        callback_uri: &str,
        extra_options: &[ClientOption],
    ) -> Self {
        let mut client = Self {
            http_client,
            client_id: application_id.to_string(),
            client_secret: application_secret.to_string(),
            redirect_uri: callback_uri.to_string(),
            authorization_endpoint: DEFAULT_AUTHORIZATION_ENDPOINT.to_string(),
            token_endpoint: DEFAULT_TOKEN_ENDPOINT.to_string(),
            scope_delimiter: DEFAULT_SCOPE_DELIMITER.to_string(),
            http_timeout: Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECONDS),
            auth_params: Vec::new(),
            access_token: None,
        };

        for option in extra_options {
            client.apply_option(option);
        }

        client
    }

    pub fn from_credentials(
        http_client: Client,
        credentials: &CredentialsConfig,
        callback_uri: &str,
    ) -> Self {
        Self::new(
            http_client,
            credentials.application_id(),
            credentials.application_secret(),
            callback_uri,
            credentials.extra_client_options(),
        )
    }

    fn apply_option(&mut self, option: &ClientOption) {
        let value = option.value.clone();
        match option.key.as_str() {
            AUTHORIZATION_ENDPOINT_KEY => self.authorization_endpoint = value,
            TOKEN_ENDPOINT_KEY => self.token_endpoint = value,
            SCOPE_DELIMITER_KEY => self.scope_delimiter = value,
            CLIENT_ID_KEY => self.client_id = value,
            REDIRECT_URI_KEY => self.redirect_uri = value,
            HTTP_TIMEOUT_KEY => match value.parse() {
                Ok(seconds) => self.http_timeout = Duration::from_secs(seconds),
                Err(_) => warn!("Ignoring non-numeric {} option: {}", HTTP_TIMEOUT_KEY, value),
            },
            key => {
                if let Some(existing) = self.auth_params.iter_mut().find(|(k, _)| k == key) {
                    existing.1 = value;
                } else {
                    self.auth_params.push((key.to_string(), value));
                }
            }
        }
    }

    /// Consent page URL requesting `scopes`, passed through in order.
    ///
    /// An empty scope list leaves the `scope` parameter out entirely.
    pub fn authorization_url(&self, scopes: &[String]) -> OAuth2Result<String> {
        let mut url = Url::parse(&self.authorization_endpoint)?;

        {
            let mut params = url.query_pairs_mut();
            params.append_pair("client_id", &self.client_id);
            params.append_pair("redirect_uri", &self.redirect_uri);
            params.append_pair("response_type", "code");

            if !scopes.is_empty() {
                params.append_pair("scope", &scopes.join(self.scope_delimiter.as_str()));
            }

            for (key, value) in &self.auth_params {
                params.append_pair(key, value);
            }
        }

        debug!(
            "Generated authorization URL for client {} with {} scope(s)",
            self.client_id,
            scopes.len()
        );

        Ok(url.to_string())
    }

    /// Exchange an authorization code for an access token.
    ///
    /// Uses the same `redirect_uri` the authorization URL was built with.
    pub async fn exchange_code(&mut self, code: &str) -> OAuth2Result<AccessToken> {
        let params = [
            ("grant_type", "authorization_code"),
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
            ("code", code),
            ("redirect_uri", self.redirect_uri.as_str()),
        ];

        let response = self
            .http_client
            .post(&self.token_endpoint)
            .timeout(self.http_timeout)
            .form(&params)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let message = TokenResponse::parse(&body)
                .ok()
                .and_then(|parsed| parsed.error_message())
                .unwrap_or_else(|| format!("{}: {}", status, body));
            error!("Token exchange failed: {}", message);
            return Err(OAuth2Error::TokenExchangeFailed(message));
        }

        let token = TokenResponse::parse(&body)?.into_access_token()?;

        info!("Successfully exchanged code for access token");
        self.access_token = Some(token.clone());
        Ok(token)
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    pub fn redirect_uri(&self) -> &str {
        &self.redirect_uri
    }

    pub fn authorization_endpoint(&self) -> &str {
        &self.authorization_endpoint
    }

    pub fn token_endpoint(&self) -> &str {
        &self.token_endpoint
    }

    pub fn http_timeout(&self) -> Duration {
        self.http_timeout
    }

    /// Token obtained by the last successful exchange.
    pub fn access_token(&self) -> Option<&AccessToken> {
        self.access_token.as_ref()
    }

    /// HTTP client for further provider calls made with [`Self::access_token`].
    pub fn http_client(&self) -> &Client {
        &self.http_client
    }
}

impl fmt::Debug for ProviderClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderClient")
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .field("redirect_uri", &self.redirect_uri)
            .field("authorization_endpoint", &self.authorization_endpoint)
            .field("token_endpoint", &self.token_endpoint)
            .field("scope_delimiter", &self.scope_delimiter)
            .field("http_timeout", &self.http_timeout)
            .field("auth_params", &self.auth_params)
            .field("access_token", &self.access_token)
            .finish()
    }
}
