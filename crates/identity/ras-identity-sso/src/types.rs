//! OAuth2 protocol types.

use crate::error::{OAuth2Error, OAuth2Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Per-call authentication info supplied by the caller.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthInfo {
    /// Extended permissions to request, in order. Empty requests none.
    #[serde(default)]
    pub scope: Vec<String>,
}

impl AuthInfo {
    pub fn with_scopes<I, S>(scopes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            scope: scopes.into_iter().map(Into::into).collect(),
        }
    }
}

/// Authorization request derived from one inbound request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizationRequest {
    pub callback_uri: String,
    pub requested_scopes: Vec<String>,
}

/// Bearer token issued by the provider.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken {
    token: String,
    expires_in: Option<u64>,
}

impl AccessToken {
    pub fn new(token: impl Into<String>, expires_in: Option<u64>) -> Self {
        Self {
            token: token.into(),
            expires_in,
        }
    }

    pub fn secret(&self) -> &str {
        &self.token
    }

    pub fn expires_in(&self) -> Option<u64> {
        self.expires_in
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessToken")
            .field("token", &"[REDACTED]")
            .field("expires_in", &self.expires_in)
            .finish()
    }
}

/// OAuth2 token endpoint response.
///
/// `expires` is the legacy Graph API spelling of `expires_in`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TokenResponse {
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default, alias = "expires", deserialize_with = "lenient_u64")]
    pub expires_in: Option<u64>,
    #[serde(default)]
    pub error: Option<serde_json::Value>,
    #[serde(default)]
    pub error_description: Option<String>,
}

impl TokenResponse {
    /// Parse a token endpoint body, JSON first, then form-encoded.
    pub fn parse(body: &str) -> OAuth2Result<Self> {
        let trimmed = body.trim();
        if trimmed.starts_with('{') {
            return serde_json::from_str(trimmed)
                .map_err(|e| OAuth2Error::InvalidTokenResponse(e.to_string()));
        }

        let mut response = TokenResponse::default();
        let mut recognised = false;
        for (key, value) in url::form_urlencoded::parse(trimmed.as_bytes()) {
            match key.as_ref() {
                "access_token" => response.access_token = Some(value.into_owned()),
                "token_type" => response.token_type = Some(value.into_owned()),
                "expires" | "expires_in" => response.expires_in = value.parse().ok(),
                "error" => response.error = Some(serde_json::Value::String(value.into_owned())),
                "error_description" => response.error_description = Some(value.into_owned()),
                _ => continue,
            }
            recognised = true;
        }

        if !recognised {
            return Err(OAuth2Error::InvalidTokenResponse(
                "body is neither JSON nor a form-encoded token response".to_string(),
            ));
        }

        Ok(response)
    }

    /// Provider error carried in the body, if any.
    pub fn error_message(&self) -> Option<String> {
        let error = self.error.as_ref()?;
        let message = match error {
            serde_json::Value::String(code) => code.clone(),
            // Graph API style: {"error": {"message": "...", "type": "OAuthException"}}
            serde_json::Value::Object(fields) => fields
                .get("message")
                .and_then(|m| m.as_str())
                .map(String::from)
                .unwrap_or_else(|| error.to_string()),
            other => other.to_string(),
        };

        Some(match &self.error_description {
            Some(description) => format!("{}: {}", message, description),
            None => message,
        })
    }

    /// Turn the response into a usable token, or fail verification.
    pub fn into_access_token(self) -> OAuth2Result<AccessToken> {
        if let Some(message) = self.error_message() {
            return Err(OAuth2Error::TokenExchangeFailed(message));
        }

        match self.access_token {
            Some(token) if !token.is_empty() => Ok(AccessToken::new(token, self.expires_in)),
            _ => Err(OAuth2Error::VerificationFailed),
        }
    }
}

fn lenient_u64<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumberOrString {
        Number(u64),
        String(String),
    }

    Ok(match Option::<NumberOrString>::deserialize(deserializer)? {
        Some(NumberOrString::Number(n)) => Some(n),
        Some(NumberOrString::String(s)) => s.parse().ok(),
        None => None,
    })
}
