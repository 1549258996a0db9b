//! OAuth2 single-sign-on credential resolver.
//!
//! Authenticates end users through a third-party identity provider's
//! authorization-code flow. A request without a `code` parameter is
//! redirected to the provider's consent page; the provider's callback carries
//! a `code`, which is exchanged for an access token and resolved to an
//! application user through a [`UserStore`].
//!
//! ```no_run
//! use ras_identity_core::InMemoryUserStore;
//! use ras_identity_sso::{
//!     AuthInfo, AuthOutcome, CredentialsConfig, OAuth2CredentialResolver, RedirectResponse,
//!     RequestUri,
//! };
//!
//! # async fn run() -> Result<(), ras_identity_sso::OAuth2Error> {
//! let credentials = CredentialsConfig::new("app-id", "app-secret", vec![])?;
//! let resolver = OAuth2CredentialResolver::new(credentials)?;
//! let store: InMemoryUserStore<String> = InMemoryUserStore::new();
//!
//! let request = RequestUri("https://app.example.com/login".to_string());
//! let mut response = RedirectResponse::new();
//! let auth_info = AuthInfo::with_scopes(["email"]);
//!
//! let result = resolver
//!     .authenticate(&request, &mut response, &store, &(), &auth_info)
//!     .await?;
//! if let AuthOutcome::Pending { redirect_url } = result.outcome {
//!     println!("send the browser to {}", redirect_url);
//! }
//! # Ok(())
//! # }
//! ```

mod client;
mod credentials;
mod error;
mod request;
mod resolver;
mod types;
mod web;


pub use client::ProviderClient;
pub use credentials::{
    ClientOption, CredentialsConfig, DEFAULT_AUTHORIZATION_ENDPOINT, DEFAULT_HTTP_TIMEOUT_SECONDS,
    DEFAULT_SCOPE_DELIMITER, DEFAULT_TOKEN_ENDPOINT,
};
pub use error::{OAuth2Error, OAuth2Result};
pub use request::{InboundRequest, OutboundResponse, RequestUri, callback_uri_from};
pub use resolver::{AuthOutcome, Authentication, CODE_PARAM, OAuth2CredentialResolver};
pub use types::{AccessToken, AuthInfo, AuthorizationRequest, TokenResponse};
pub use web::{HttpRequest, RedirectResponse};

// Re-export common types for convenience
pub use ras_identity_core::{IdentityError, LookupCriteria, UserStore};
