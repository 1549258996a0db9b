//! OAuth2 credential error types.

use thiserror::Error;

pub type OAuth2Result<T> = Result<T, OAuth2Error>;

#[derive(Debug, Error)]
pub enum OAuth2Error {
    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    #[error("Failed to load configuration: {0}")]
    ConfigLoadError(#[from] config::ConfigError),

    #[error("Error validating verification code: HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Error validating verification code: token exchange failed: {0}")]
    TokenExchangeFailed(String),

    #[error("Error validating verification code: invalid token response: {0}")]
    InvalidTokenResponse(String),

    #[error("Error validating verification code: provider returned no access token")]
    VerificationFailed,

    #[error("Invalid request URI: {0}")]
    InvalidRequestUri(String),

    #[error("URL parsing error: {0}")]
    UrlError(#[from] url::ParseError),

    #[error("User store error: {0}")]
    StoreError(#[from] ras_identity_core::IdentityError),
}

impl OAuth2Error {
    /// True for every failure of the code-for-token exchange, whatever the cause.
    pub fn is_code_validation_failure(&self) -> bool {
        matches!(
            self,
            OAuth2Error::HttpError(_)
                | OAuth2Error::TokenExchangeFailed(_)
                | OAuth2Error::InvalidTokenResponse(_)
                | OAuth2Error::VerificationFailed
        )
    }
}
