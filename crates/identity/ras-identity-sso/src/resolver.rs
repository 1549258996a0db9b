//! OAuth2 credential resolver driving the two-phase authorization-code flow.

use crate::client::ProviderClient;
use crate::credentials::CredentialsConfig;
use crate::error::{OAuth2Error, OAuth2Result};
use crate::request::{InboundRequest, OutboundResponse, callback_uri_from};
use crate::types::{AuthInfo, AuthorizationRequest};
use ras_identity_core::{LookupCriteria, UserStore};
use reqwest::Client;
use tracing::{debug, info, warn};

/// Query parameter the provider appends to the callback.
pub const CODE_PARAM: &str = "code";

/// Where one `authenticate` call ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthOutcome<U> {
    /// A redirect to the consent page was issued; stop handling the request.
    Pending { redirect_url: String },
    /// The store resolved the access token to a user.
    Authenticated(U),
    /// The exchange succeeded but the store knows no such user.
    Denied,
}

impl<U> AuthOutcome<U> {
    pub fn is_pending(&self) -> bool {
        matches!(self, AuthOutcome::Pending { .. })
    }

    pub fn user(self) -> Option<U> {
        match self {
            AuthOutcome::Authenticated(user) => Some(user),
            _ => None,
        }
    }
}

/// Result of a completed `authenticate` call.
///
/// `client` is the provider client bound for this call, kept for follow-up
/// provider requests. After a successful exchange it holds the access token.
#[derive(Debug)]
pub struct Authentication<U> {
    pub outcome: AuthOutcome<U>,
    pub client: ProviderClient,
}

/// Credential resolver authenticating users through an OAuth2 provider.
///
/// Holds only immutable credentials and a pooled HTTP client, so one
/// instance can serve concurrent requests.
#[derive(Clone, Debug)]
pub struct OAuth2CredentialResolver {
    credentials: CredentialsConfig,
    http_client: Client,
}

impl OAuth2CredentialResolver {
    pub fn new(credentials: CredentialsConfig) -> OAuth2Result<Self> {
        let http_client = Client::builder()
            .build()
            .map_err(|e| OAuth2Error::ConfigError(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self::with_http_client(credentials, http_client))
    }

    pub fn with_http_client(credentials: CredentialsConfig, http_client: Client) -> Self {
        info!(
            "OAuth2 credential resolver configured for application {}",
            credentials.application_id()
        );
        Self {
            credentials,
            http_client,
        }
    }

    pub fn credentials(&self) -> &CredentialsConfig {
        &self.credentials
    }

    /// Fresh provider client bound to the callback URI of `request`.
    pub fn client_for(
        &self,
        request: &(impl InboundRequest + ?Sized),
    ) -> OAuth2Result<ProviderClient> {
        let callback_uri = callback_uri_from(&request.uri())?;
        Ok(self.bind_client(&callback_uri))
    }

    fn bind_client(&self, callback_uri: &str) -> ProviderClient {
        ProviderClient::from_credentials(self.http_client.clone(), &self.credentials, callback_uri)
    }

    /// Authorization request the consent phase would issue for `request`.
    pub fn authorization_request(
        &self,
        request: &(impl InboundRequest + ?Sized),
        auth_info: &AuthInfo,
    ) -> OAuth2Result<AuthorizationRequest> {
        Ok(AuthorizationRequest {
            callback_uri: callback_uri_from(&request.uri())?,
            requested_scopes: auth_info.scope.clone(),
        })
    }

    /// Run one step of the authorization-code flow for `request`.
    ///
    /// Without a `code` parameter a redirect to the consent page is set on
    /// `response` and [`AuthOutcome::Pending`] is returned. With one, the code
    /// is exchanged and the token looked up in `store`, passing `ctx` through.
    /// Exchange failures are errors; an unknown user is [`AuthOutcome::Denied`].
    pub async fn authenticate<R, W, S, Ctx>(
        &self,
        request: &R,
        response: &mut W,
        store: &S,
        ctx: &Ctx,
        auth_info: &AuthInfo,
    ) -> OAuth2Result<Authentication<<S as UserStore<Ctx>>::User>>
    where
        R: InboundRequest + ?Sized,
        W: OutboundResponse + ?Sized,
        S: UserStore<Ctx> + ?Sized,
        Ctx: ?Sized + Sync,
    {
        let authorization = self.authorization_request(request, auth_info)?;
        let mut client = self.bind_client(&authorization.callback_uri);

        let code = request
            .query_param(CODE_PARAM)
            .filter(|code| !code.is_empty());

        let Some(code) = code else {
            let redirect_url = client.authorization_url(&authorization.requested_scopes)?;
            debug!(
                "No authorization code on {}, redirecting to consent page",
                authorization.callback_uri
            );
            response.redirect(&redirect_url);
            return Ok(Authentication {
                outcome: AuthOutcome::Pending { redirect_url },
                client,
            });
        };

        let token = match client.exchange_code(&code).await {
            Ok(token) => token,
            Err(e) => {
                warn!(
                    "Error validating verification code for {}: {}",
                    authorization.callback_uri, e
                );
                return Err(e);
            }
        };

        let criteria = LookupCriteria::token(token.secret());
        let outcome = match store.find_user(&criteria, ctx).await? {
            Some(user) => {
                info!("Resolved user for OAuth2 access token");
                AuthOutcome::Authenticated(user)
            }
            None => {
                info!("No user found for OAuth2 access token");
                AuthOutcome::Denied
            }
        };

        Ok(Authentication { outcome, client })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::RequestUri;

    #[derive(Default)]
    struct RecordingResponse {
        location: Option<String>,
    }

    impl OutboundResponse for RecordingResponse {
        fn redirect(&mut self, location: &str) {
            self.location = Some(location.to_string());
        }
    }

    fn create_test_resolver() -> OAuth2CredentialResolver {
        let credentials = CredentialsConfig::new("test_app_id", "test_secret", vec![]).unwrap();
        OAuth2CredentialResolver::new(credentials).unwrap()
    }

    #[test]
    fn test_authorization_request_strips_query() {
        let resolver = create_test_resolver();
        let request = RequestUri("https://app.example.com/login?next=%2F".to_string());
        let auth_info = AuthInfo::with_scopes(["email"]);

        let authorization = resolver
            .authorization_request(&request, &auth_info)
            .unwrap();
        assert_eq!(authorization.callback_uri, "https://app.example.com/login");
        assert_eq!(authorization.requested_scopes, vec!["email"]);

        let client = resolver.client_for(&request).unwrap();
        assert_eq!(client.redirect_uri(), "https://app.example.com/login");
    }

    #[tokio::test]
    async fn test_empty_code_treated_as_absent() {
        let resolver = create_test_resolver();
        let store: ras_identity_core::InMemoryUserStore<String> = Default::default();
        let request = RequestUri("https://app.example.com/login?code=".to_string());
        let mut response = RecordingResponse::default();

        let result = resolver
            .authenticate(&request, &mut response, &store, &(), &AuthInfo::default())
            .await
            .unwrap();

        assert!(result.outcome.is_pending());
        assert!(response.location.is_some());
    }

    #[tokio::test]
    async fn test_relative_request_uri_is_rejected() {
        let resolver = create_test_resolver();
        let store: ras_identity_core::InMemoryUserStore<String> = Default::default();
        let request = RequestUri("/login".to_string());
        let mut response = RecordingResponse::default();

        let result = resolver
            .authenticate(&request, &mut response, &store, &(), &AuthInfo::default())
            .await;

        assert!(matches!(result, Err(OAuth2Error::InvalidRequestUri(_))));
        assert!(response.location.is_none());
    }

    #[test]
    fn test_outcome_helpers() {
        let pending: AuthOutcome<String> = AuthOutcome::Pending {
            redirect_url: "https://example.com".to_string(),
        };
        assert!(pending.is_pending());
        assert_eq!(pending.user(), None);

        let authenticated = AuthOutcome::Authenticated("alice".to_string());
        assert!(!authenticated.is_pending());
        assert_eq!(authenticated.user(), Some("alice".to_string()));

        assert_eq!(AuthOutcome::<String>::Denied.user(), None);
    }
}
